use crate::shared::entity::{Entity, ID};
use crate::shared::status::Status;
use crate::status_strings;
use serde::{Deserialize, Serialize};

/// The payment provider facing record of one checkout. Correlates all the
/// `Booking`s created by that checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: ID,
    pub org_id: ID,
    pub user_id: ID,
    /// Correlation key handed to the payment provider. Unique.
    pub reference_id: ID,
    pub amount: i64,
    pub currency: String,
    pub status: TransactionStatus,
    pub source: Option<PaymentSource>,
    /// Id of the source object at the payment provider, e.g. the payment intent
    pub source_id: Option<String>,
    pub checkout_session_id: Option<String>,
    pub checkout_url: Option<String>,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    Pending,
    Processing,
    Paid,
    Canceled,
    Expired,
}

impl Status for TransactionStatus {
    const ENTITY: &'static str = "transaction";

    fn next(&self) -> &'static [Self] {
        use TransactionStatus::*;
        match self {
            Pending => &[Processing, Canceled, Expired],
            Processing => &[Paid, Canceled, Expired],
            Paid | Canceled | Expired => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Paid => "paid",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
        }
    }
}

status_strings!(
    TransactionStatus,
    [
        TransactionStatus::Pending,
        TransactionStatus::Processing,
        TransactionStatus::Paid,
        TransactionStatus::Canceled,
        TransactionStatus::Expired,
    ]
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentSource {
    PaymentIntent,
    CheckoutSession,
}

impl PaymentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentIntent => "PaymentIntent",
            Self::CheckoutSession => "CheckoutSession",
        }
    }
}

impl std::str::FromStr for PaymentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PaymentIntent" => Ok(Self::PaymentIntent),
            "CheckoutSession" => Ok(Self::CheckoutSession),
            _ => Err(format!("Unknown payment source: {}", s)),
        }
    }
}

impl Entity for Transaction {
    fn id(&self) -> &ID {
        &self.id
    }
}
