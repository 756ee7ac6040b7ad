use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stackswipe::ai::Assistant;
use stackswipe::auth::TokenVerifier;
use stackswipe::config::{LoggingSettings, Settings, StoreBackend};
use stackswipe::error::{json_config, query_config};
use stackswipe::routes::{self, AppState};
use stackswipe::services::{
    DataStore, DocumentClient, DocumentStore, IdentityClient, LlmClient, MessageHub, PostgresStore,
};

fn startup_error(what: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", what, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", what, e))
}

/// `RUST_LOG` wins over the configured level
fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

async fn build_store(settings: &Settings) -> io::Result<DataStore> {
    match settings.store.backend {
        StoreBackend::Relational => {
            let database = settings
                .database
                .as_ref()
                .ok_or_else(|| startup_error("Configuration error", "[database] is required for the relational backend"))?;

            let store = PostgresStore::from_settings(database)
                .await
                .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                database.max_connections.unwrap_or(10)
            );
            Ok(DataStore::Relational(store))
        }
        StoreBackend::Document => {
            let documents = settings
                .documents
                .as_ref()
                .ok_or_else(|| startup_error("Configuration error", "[documents] is required for the document backend"))?;

            let client = DocumentClient::new(documents)
                .map_err(|e| startup_error("Failed to build document client", e))?;

            info!("Document store initialized ({})", documents.endpoint);
            Ok(DataStore::Document(DocumentStore::new(client)))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);
    info!("Starting StackSwipe service...");

    let store = Arc::new(build_store(&settings).await?);

    let llm = LlmClient::new(
        settings.llm.endpoint.clone(),
        settings.llm.api_key.clone(),
        Duration::from_secs(settings.llm.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to build LLM client", e))?;

    if !llm.is_configured() {
        tracing::warn!("No LLM API key configured; AI features will use static suggestions");
    }

    let assistant = Arc::new(Assistant::new(llm, &settings.llm));

    let identity = Arc::new(
        IdentityClient::new(&settings.auth).map_err(|e| startup_error("Failed to build identity client", e))?,
    );
    let verifier = Arc::new(TokenVerifier::from_settings(&settings.auth));

    let hub = MessageHub::from_settings(&settings.realtime)
        .await
        .map_err(|e| startup_error("Failed to start realtime relay", e))?;

    let app_state = AppState {
        store,
        assistant,
        identity,
        verifier,
        hub,
        swipes: settings.swipes,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
