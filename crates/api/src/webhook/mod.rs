mod handle_payment_webhook;

use actix_web::web;
use handle_payment_webhook::handle_payment_webhook_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/webhooks/payments",
        web::post().to(handle_payment_webhook_controller),
    );
}
