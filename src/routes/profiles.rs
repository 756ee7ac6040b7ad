use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::auth::AuthUser;
use crate::core::{day_start, discover, DiscoveryFilter, SwipeQuota};
use crate::error::ApiError;
use crate::models::{DiscoverQuery, DiscoverResponse, UpsertProfileRequest};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Literal segments before `{id}`
    cfg.route("/profiles/me", web::get().to(get_own_profile))
        .route("/profiles/me", web::put().to(upsert_own_profile))
        .route("/profiles/discover", web::get().to(discover_profiles))
        .route("/profiles/{id}", web::get().to(get_profile));
}

/// GET /api/v1/profiles/me
///
/// 404 means the caller has not completed onboarding.
async fn get_own_profile(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let profile = state
        .store
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /api/v1/profiles/me
async fn upsert_own_profile(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<UpsertProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Profile validation failed for {}: {:?}", user.id, errors);
        return Err(errors.into());
    }

    let profile = req.into_inner().into_profile(&user.id);
    let saved = state.store.upsert_profile(&profile).await?;

    Ok(HttpResponse::Ok().json(saved))
}

/// GET /api/v1/profiles/discover
///
/// Profiles the caller has not swiped on yet, narrowed by the optional
/// filters, plus what is left of today's swipe allowance.
async fn discover_profiles(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<DiscoverQuery>,
) -> Result<HttpResponse, ApiError> {
    let start = std::time::Instant::now();
    let filter = DiscoveryFilter::from_query(&query);

    let swiped = state.store.swiped_ids(&user.id).await?;
    let used = state.store.count_swipes_since(&user.id, day_start(Utc::now())).await?;
    let candidates = state.store.list_profiles().await?;
    let total_candidates = candidates.len();

    let profiles = discover(&user.id, &swiped, candidates, &filter);
    let quota = SwipeQuota::new(state.swipes.daily_limit, used);

    tracing::debug!(
        "Discover for {}: {} of {} profiles in {}ms",
        user.id,
        profiles.len(),
        total_candidates,
        start.elapsed().as_millis()
    );

    Ok(HttpResponse::Ok().json(DiscoverResponse {
        total_results: profiles.len(),
        profiles,
        remaining_swipes: quota.remaining(),
        daily_limit: quota.limit,
    }))
}

/// GET /api/v1/profiles/{id}
async fn get_profile(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let profile = state
        .store
        .get_profile(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {} not found", id)))?;

    Ok(HttpResponse::Ok().json(profile))
}
