use actix_files as fs;
use actix_web::{web, HttpResponse, Responder};

use crate::models::AppState;

/// HTTP handler for the index page
pub async fn index(app_state: web::Data<AppState>) -> actix_web::Result<fs::NamedFile> {
    Ok(fs::NamedFile::open_async(app_state.config.static_dir.join("index.html")).await?)
}

/// Liveness probe
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: &std::path::Path) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(fs::Files::new("/static", static_dir));
}
