//! HTTP handlers and route configuration.

mod commands;
mod health;
mod portfolio;
mod usage;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/commands/generate", web::post().to(commands::generate))
            .route("/portfolio", web::post().to(portfolio::portfolio))
            .service(
                web::scope("/usage")
                    .route("/users/{user_id}", web::get().to(usage::user_usage))
                    .route("/servers/{server_id}", web::get().to(usage::server_usage)),
            ),
    );
}
