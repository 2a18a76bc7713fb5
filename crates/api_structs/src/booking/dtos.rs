use boxoffice_domain::{Booking, BookingStatus, Transaction, TransactionStatus, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingDTO {
    pub id: ID,
    pub event_id: ID,
    pub ticket_id: ID,
    pub user_id: ID,
    pub qty: i64,
    pub subtotal: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub checkout_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub transaction_id: Option<ID>,
    pub created: i64,
    pub updated: i64,
}

impl BookingDTO {
    pub fn new(booking: Booking) -> Self {
        Self {
            id: booking.id,
            event_id: booking.event_id,
            ticket_id: booking.ticket_id,
            user_id: booking.user_id,
            qty: booking.qty,
            subtotal: booking.subtotal,
            currency: booking.currency,
            status: booking.status,
            checkout_session_id: booking.checkout_session_id,
            payment_intent_id: booking.payment_intent_id,
            transaction_id: booking.transaction_id,
            created: booking.created,
            updated: booking.updated,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDTO {
    pub id: ID,
    pub reference_id: ID,
    pub amount: i64,
    pub currency: String,
    pub status: TransactionStatus,
    pub checkout_url: Option<String>,
    pub created: i64,
    pub updated: i64,
}

impl TransactionDTO {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            reference_id: transaction.reference_id,
            amount: transaction.amount,
            currency: transaction.currency,
            status: transaction.status,
            checkout_url: transaction.checkout_url,
            created: transaction.created,
            updated: transaction.updated,
        }
    }
}
