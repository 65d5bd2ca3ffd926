//! Route configuration
//!
//! Centralized route setup extracted from main.rs. Each domain manages its
//! own scope; everything except /health and the login endpoints sits
//! behind the session gate.

use actix_web::web;

use crate::handlers;
use crate::middleware::SessionGate;

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .configure(routes::auth::configure)
        .configure(routes::researchers::configure)
        .configure(routes::patients::configure)
        .configure(routes::datasets::configure);
}

mod routes {
    use super::*;

    pub mod auth {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/auth")
                    .route("/register", web::post().to(handlers::register))
                    .route("/login", web::post().to(handlers::login))
                    .service(
                        web::scope("")
                            .wrap(SessionGate)
                            .route("/logout", web::post().to(handlers::logout)),
                    ),
            );
        }
    }

    pub mod researchers {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/researchers")
                    .wrap(SessionGate)
                    .route("/me", web::get().to(handlers::get_me)),
            );
        }
    }

    pub mod patients {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/patients")
                    .wrap(SessionGate)
                    .route("", web::post().to(handlers::create_patient))
                    .route("", web::get().to(handlers::list_patients))
                    .route("/{id}", web::get().to(handlers::get_patient))
                    .route("/{id}", web::patch().to(handlers::update_patient))
                    .route("/{id}/datasets", web::post().to(handlers::create_dataset))
                    .route("/{id}/datasets", web::get().to(handlers::list_datasets)),
            );
        }
    }

    pub mod datasets {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/datasets")
                    .wrap(SessionGate)
                    .route("/summary", web::get().to(handlers::dataset_summary)),
            );
        }
    }
}
