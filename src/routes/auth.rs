use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::CredentialsRequest;
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/signup", web::post().to(sign_up))
        .route("/auth/login", web::post().to(sign_in))
        .route("/auth/logout", web::post().to(sign_out));
}

/// POST /api/v1/auth/signup
async fn sign_up(
    state: web::Data<AppState>,
    req: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let session = state.identity.sign_up(&req.email, &req.password).await?;
    tracing::info!("Account created for user {}", session.user.id);

    Ok(HttpResponse::Created().json(session))
}

/// POST /api/v1/auth/login
async fn sign_in(
    state: web::Data<AppState>,
    req: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = state.identity.sign_in(&req.email, &req.password).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// POST /api/v1/auth/logout
async fn sign_out(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    state.identity.sign_out(&user.token).await?;
    tracing::debug!("User {} signed out", user.id);
    Ok(HttpResponse::NoContent().finish())
}
