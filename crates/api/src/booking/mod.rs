mod cancel_bookings;
pub mod checkout;
pub mod expire_pending_booking;
pub mod reconcile_transaction;
mod resume_checkout;

use actix_web::web;
use cancel_bookings::{cancel_booking_controller, cancel_bookings_by_transaction_controller};
use checkout::checkout_controller;
use resume_checkout::resume_checkout_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/checkout", web::post().to(checkout_controller));
    cfg.route(
        "/transactions/{transaction_id}/resume",
        web::post().to(resume_checkout_controller),
    );
    cfg.route(
        "/bookings/cancel",
        web::put().to(cancel_bookings_by_transaction_controller),
    );
    cfg.route(
        "/bookings/{booking_id}/cancel",
        web::put().to(cancel_booking_controller),
    );
}
