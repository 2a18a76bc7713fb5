pub mod create_ticket;
mod get_seats;
mod transition_ticket;

use actix_web::web;
use create_ticket::create_ticket_controller;
use get_seats::get_seats_controller;
use transition_ticket::{
    archive_ticket_controller, close_ticket_controller, publish_ticket_controller,
    reopen_ticket_controller,
};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/events/{event_id}/tickets",
        web::post().to(create_ticket_controller),
    );
    cfg.route(
        "/tickets/{ticket_id}/publish",
        web::put().to(publish_ticket_controller),
    );
    cfg.route(
        "/tickets/{ticket_id}/close",
        web::put().to(close_ticket_controller),
    );
    cfg.route(
        "/tickets/{ticket_id}/reopen",
        web::put().to(reopen_ticket_controller),
    );
    cfg.route(
        "/tickets/{ticket_id}",
        web::delete().to(archive_ticket_controller),
    );
    cfg.route(
        "/tickets/{ticket_id}/seats",
        web::get().to(get_seats_controller),
    );
}
