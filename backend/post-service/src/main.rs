use actix_web::{web, App, HttpServer};
use post_service::clients::Clients;
use post_service::middleware::JwtValidator;
use post_service::repository::Stores;
use post_service::{configure, AppState, Config};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::time::Duration;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "post_service=debug,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database.url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Database connection failed: {e}")))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migrations failed: {e}")))?;
    tracing::info!("Database migrations applied");

    let clients = Clients::http(&config)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e:#}")))?;
    let stores = Stores::postgres(pool);

    let state = web::Data::new(AppState::new(
        &stores,
        &clients,
        config.server.max_upload_bytes,
    ));
    let validator = web::Data::new(JwtValidator::new(&config.auth.jwt_secret));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("HTTP server listening on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(validator.clone())
            .wrap(TracingLogger::default())
            .configure(configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
