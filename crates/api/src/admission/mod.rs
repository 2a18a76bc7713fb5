mod admit;
mod get_admission_code;

use actix_web::web;
use admit::admit_controller;
use get_admission_code::get_admission_code_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/reservations/{reservation_id}/code",
        web::get().to(get_admission_code_controller),
    );
    cfg.route("/admissions", web::post().to(admit_controller));
}
