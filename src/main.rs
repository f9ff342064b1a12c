use actix_web::{web, App, HttpServer};
use log::{error, info};
use std::io;

use chess_board_app::config::Config;
use chess_board_app::models::AppState;
use chess_board_app::routes::configure_routes;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    info!("Starting chess board at http://{}", config.bind_addr);
    let bind_addr = config.bind_addr.clone();
    let static_dir = config.static_dir.clone();

    // Create shared application state
    let app_state = web::Data::new(AppState::new(config));

    // Start HTTP server
    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(app_state.clone())
            .configure(move |cfg| configure_routes(cfg, &static_dir))
    })
    .bind(bind_addr)?
    .run()
    .await
}
