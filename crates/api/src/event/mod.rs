mod create_event;
pub mod expire_stale_events;
mod publish_event;
mod subscribers;
pub mod update_event_status;

use actix_web::web;
use create_event::create_event_controller;
use publish_event::publish_event_controller;
use update_event_status::update_event_status_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/events", web::post().to(create_event_controller));
    cfg.route(
        "/events/{event_id}/publish",
        web::post().to(publish_event_controller),
    );
    cfg.route(
        "/events/{event_id}/status",
        web::put().to(update_event_status_controller),
    );
}
