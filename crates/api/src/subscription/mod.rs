mod subscribe;

use actix_web::web;
use subscribe::subscribe_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/events/{event_id}/subscriptions",
        web::post().to(subscribe_controller),
    );
}
