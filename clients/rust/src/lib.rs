mod admission;
mod base;
mod booking;
mod event;
mod status;
mod ticket;
mod webhook;

use admission::AdmissionClient;
pub(crate) use base::BaseClient;
pub use base::{APIError, APIErrorVariant, APIResponse};
use booking::BookingClient;
use event::EventClient;
pub use event::CreateEventInput;
use status::StatusClient;
use std::sync::Arc;
use ticket::TicketClient;
use webhook::WebhookClient;

pub use boxoffice_api_structs::create_ticket::RequestBody as CreateTicketInput;
pub use boxoffice_api_structs::dtos::*;
pub use boxoffice_domain::{
    BookingStatus, CheckoutItem, EventMode, EventStatus, ReservationStatus, TicketStatus,
    TransactionStatus, ID,
};

/// Boxoffice Server SDK
///
/// The SDK contains methods for interacting with the Boxoffice server
/// API. Requests are authenticated with the given bearer token.
#[derive(Clone)]
pub struct BoxofficeSDK {
    pub admission: AdmissionClient,
    pub booking: BookingClient,
    pub event: EventClient,
    pub status: StatusClient,
    pub ticket: TicketClient,
    pub webhook: WebhookClient,
}

impl BoxofficeSDK {
    pub fn new<T: Into<String>>(address: String, token: T) -> Self {
        let mut base = BaseClient::new(address);
        base.set_token(token.into());
        let base = Arc::new(base);

        Self {
            admission: AdmissionClient::new(base.clone()),
            booking: BookingClient::new(base.clone()),
            event: EventClient::new(base.clone()),
            status: StatusClient::new(base.clone()),
            ticket: TicketClient::new(base.clone()),
            webhook: WebhookClient::new(base),
        }
    }
}
