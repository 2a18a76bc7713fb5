use crate::dtos::{BookingDTO, TransactionDTO};
use boxoffice_domain::{Booking, CheckoutItem, Transaction, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsResponse {
    pub bookings: Vec<BookingDTO>,
}

impl BookingsResponse {
    pub fn new(bookings: Vec<Booking>) -> Self {
        Self {
            bookings: bookings.into_iter().map(BookingDTO::new).collect(),
        }
    }
}

pub mod checkout {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        /// Fresh id minted by the caller. Becomes the reference of the transaction.
        pub request_id: ID,
        pub items: Vec<CheckoutItem>,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub transaction: TransactionDTO,
        pub bookings: Vec<BookingDTO>,
        pub checkout_url: String,
    }

    impl APIResponse {
        pub fn new(transaction: Transaction, bookings: Vec<Booking>, checkout_url: String) -> Self {
            Self {
                transaction: TransactionDTO::new(transaction),
                bookings: bookings.into_iter().map(BookingDTO::new).collect(),
                checkout_url,
            }
        }
    }
}

pub mod resume_checkout {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub transaction_id: ID,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub checkout_url: String,
    }
}

pub mod cancel_booking {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub booking_id: ID,
    }

    pub type APIResponse = BookingsResponse;
}

pub mod cancel_bookings_by_transaction {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub transaction_id: ID,
    }

    pub type APIResponse = BookingsResponse;
}
