use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use research_service::routes::configure_routes;
use research_service::{telemetry, AppState, Settings};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let settings = Settings::from_env()?;
    let bind_address = (settings.server.host.clone(), settings.server.port);
    let allowed_origin = settings.server.allowed_origin.clone();

    tracing::info!(
        host = %bind_address.0,
        port = bind_address.1,
        env = %settings.server.app_env,
        "Starting research service"
    );

    let state = web::Data::new(AppState::initialize(settings).await?);

    HttpServer::new(move || {
        // Credentialed CORS: session cookies only cross the boundary for
        // the one configured web client origin.
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
