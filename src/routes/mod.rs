// Route exports
pub mod ai;
pub mod auth;
pub mod community;
pub mod matches;
pub mod profiles;
pub mod swipes;

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::ai::Assistant;
use crate::auth::TokenVerifier;
use crate::config::SwipeSettings;
use crate::models::HealthResponse;
use crate::services::{DataStore, IdentityClient, MessageHub};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DataStore>,
    pub assistant: Arc<Assistant>,
    pub identity: Arc<IdentityClient>,
    pub verifier: Arc<TokenVerifier>,
    pub hub: MessageHub,
    pub swipes: SwipeSettings,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(auth::configure)
            .configure(profiles::configure)
            .configure(swipes::configure)
            .configure(matches::configure)
            .configure(community::configure)
            .configure(ai::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.store.backend_name().to_string(),
        timestamp: chrono::Utc::now(),
    })
}
