use crate::booking::{Booking, BookingStatus};
use crate::reservation::{Reservation, ReservationStatus};
use crate::shared::entity::ID;
use crate::ticket::Ticket;
use crate::transaction::{Transaction, TransactionStatus};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub ticket_id: ID,
    pub qty: i64,
}

#[derive(Error, Debug, PartialEq)]
pub enum CheckoutPlanError {
    #[error("A checkout needs at least one item")]
    Empty,
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Ticket {0} was not found")]
    TicketNotFound(ID),
    #[error("All tickets in a checkout must belong to the same event")]
    MixedEvents,
    #[error("All tickets in a checkout must have the same currency")]
    MixedCurrencies,
    #[error("Ticket {ticket_id} only has {limit} seats")]
    OverLimit { ticket_id: ID, limit: i64 },
    #[error("At most {0} seats can be booked per ticket in one checkout")]
    TooManySeats(i64),
    #[error("The total amount of the checkout is too large")]
    AmountOverflow,
}

/// All rows a checkout creates. Persisted in one transaction together with
/// the seat ledger check.
#[derive(Debug, Clone)]
pub struct CheckoutPlan {
    pub transaction: Transaction,
    pub bookings: Vec<Booking>,
    pub reservations: Vec<Reservation>,
}

/// Merges quantities of items for the same ticket. Keeps first-seen order.
/// Sums saturate at `i64::MAX`.
pub fn merge_items(items: &[CheckoutItem]) -> Vec<CheckoutItem> {
    items
        .iter()
        .map(|item| (item.ticket_id.clone(), item.qty))
        .into_group_map()
        .into_iter()
        .map(|(ticket_id, qtys)| CheckoutItem {
            ticket_id,
            qty: qtys.into_iter().fold(0, i64::saturating_add),
        })
        .sorted_by_key(|item| {
            items
                .iter()
                .position(|i| i.ticket_id == item.ticket_id)
                .unwrap_or(usize::MAX)
        })
        .collect()
}

impl CheckoutPlan {
    /// `tickets` must contain every ticket referenced by `items`. No ticket
    /// can get more than `max_seats` seats.
    pub fn build(
        items: &[CheckoutItem],
        max_seats: i64,
        tickets: &[Ticket],
        user_id: &ID,
        reference_id: &ID,
        hold_until: i64,
        now: i64,
    ) -> Result<Self, CheckoutPlanError> {
        if items.is_empty() {
            return Err(CheckoutPlanError::Empty);
        }
        if items.iter().any(|item| item.qty < 1) {
            return Err(CheckoutPlanError::InvalidQuantity);
        }
        let items = merge_items(items);

        let mut selected = Vec::with_capacity(items.len());
        for item in &items {
            match tickets.iter().find(|t| t.id == item.ticket_id) {
                Some(ticket) => selected.push((ticket, item.qty)),
                None => return Err(CheckoutPlanError::TicketNotFound(item.ticket_id.clone())),
            }
        }

        let (first, _) = selected[0];
        if selected.iter().any(|(t, _)| t.event_id != first.event_id) {
            return Err(CheckoutPlanError::MixedEvents);
        }
        if selected.iter().any(|(t, _)| t.currency != first.currency) {
            return Err(CheckoutPlanError::MixedCurrencies);
        }
        for (ticket, qty) in &selected {
            if ticket.limit > 0 && *qty > ticket.limit {
                return Err(CheckoutPlanError::OverLimit {
                    ticket_id: ticket.id.clone(),
                    limit: ticket.limit,
                });
            }
            if *qty > max_seats {
                return Err(CheckoutPlanError::TooManySeats(max_seats));
            }
        }

        let mut transaction = Transaction {
            id: Default::default(),
            // The organizer is resolved by the caller from the event
            org_id: Default::default(),
            user_id: user_id.clone(),
            reference_id: reference_id.clone(),
            amount: 0,
            currency: first.currency.clone(),
            status: TransactionStatus::Pending,
            source: None,
            source_id: None,
            checkout_session_id: None,
            checkout_url: None,
            created: now,
            updated: now,
        };

        let mut bookings = Vec::with_capacity(selected.len());
        let mut reservations = Vec::new();
        for (ticket, qty) in selected {
            let subtotal = ticket
                .price
                .checked_mul(qty)
                .ok_or(CheckoutPlanError::AmountOverflow)?;
            transaction.amount = transaction
                .amount
                .checked_add(subtotal)
                .ok_or(CheckoutPlanError::AmountOverflow)?;
            let booking = Booking {
                id: Default::default(),
                event_id: ticket.event_id.clone(),
                ticket_id: ticket.id.clone(),
                user_id: user_id.clone(),
                org_id: Default::default(),
                qty,
                subtotal,
                currency: ticket.currency.clone(),
                status: BookingStatus::Pending,
                checkout_session_id: None,
                payment_intent_id: None,
                transaction_id: Some(transaction.id.clone()),
                created: now,
                updated: now,
            };
            for _ in 0..qty {
                reservations.push(Reservation {
                    id: Default::default(),
                    booking_id: booking.id.clone(),
                    ticket_id: ticket.id.clone(),
                    event_id: ticket.event_id.clone(),
                    user_id: user_id.clone(),
                    status: ReservationStatus::Pending,
                    valid_until: hold_until,
                    created: now,
                    updated: now,
                });
            }
            bookings.push(booking);
        }

        Ok(Self {
            transaction,
            bookings,
            reservations,
        })
    }

    pub fn set_org(&mut self, org_id: &ID) {
        self.transaction.org_id = org_id.clone();
        for booking in self.bookings.iter_mut() {
            booking.org_id = org_id.clone();
        }
    }

    /// Seats requested per ticket
    pub fn quantities(&self) -> Vec<(ID, i64)> {
        self.bookings
            .iter()
            .map(|b| (b.ticket_id.clone(), b.qty))
            .collect()
    }

    pub fn event_id(&self) -> &ID {
        &self.bookings[0].event_id
    }
}
