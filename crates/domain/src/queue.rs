use crate::shared::entity::ID;
use crate::shared::status::{InvalidTransition, Status};
use crate::transaction::{PaymentSource, TransactionStatus};
use serde::{Deserialize, Serialize};

/// Pub/sub topics. Every topic fans out to a queue with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "events-open")]
    EventsToOpen,
    #[serde(rename = "events-close")]
    EventsToClose,
    #[serde(rename = "events-complete")]
    EventsToComplete,
    #[serde(rename = "pending-transactions")]
    PendingTransactions,
    #[serde(rename = "payment-transaction-updates")]
    PaymentTransactionUpdates,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::EventsToOpen,
        Topic::EventsToClose,
        Topic::EventsToComplete,
        Topic::PendingTransactions,
        Topic::PaymentTransactionUpdates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventsToOpen => "events-open",
            Self::EventsToClose => "events-close",
            Self::EventsToComplete => "events-complete",
            Self::PendingTransactions => "pending-transactions",
            Self::PaymentTransactionUpdates => "payment-transaction-updates",
        }
    }

    pub fn queue_name(&self) -> &'static str {
        self.as_str()
    }
}

pub fn dead_letter_queue(queue: &str) -> String {
    format!("{}.dead-letter", queue)
}

/// An update that only applies while the row is still in `from`.
/// Applying it a second time is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSwap<S> {
    pub id: ID,
    pub from: S,
    pub to: S,
}

/// What happened to a `StatusSwap` applied to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Applied,
    /// The row already moved past `from`. Duplicate or superseded message.
    Stale,
    /// The row has not reached `from` yet. The message arrived ahead of its predecessor.
    Premature,
}

impl<S: Status> StatusSwap<S> {
    pub fn new(id: ID, from: S, to: S) -> Result<Self, InvalidTransition> {
        from.transition(to)?;
        Ok(Self { id, from, to })
    }

    /// Classifies a swap that matched no row, given the status the row currently has
    pub fn unmatched_outcome(&self, current: S) -> SwapOutcome {
        if current != self.from && current.can_reach(self.from) {
            SwapOutcome::Premature
        } else {
            SwapOutcome::Stale
        }
    }
}

/// Reconciliation message for a `Transaction` sent to
/// `Topic::PaymentTransactionUpdates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub swap: StatusSwap<TransactionStatus>,
    pub source: Option<PaymentSource>,
    pub source_id: Option<String>,
    pub currency: Option<String>,
}
