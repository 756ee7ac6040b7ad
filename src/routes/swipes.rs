use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::auth::AuthUser;
use crate::core::{day_start, SwipeQuota};
use crate::error::ApiError;
use crate::models::{Swipe, SwipeRequest, SwipeResponse};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/swipes", web::post().to(record_swipe));
}

/// POST /api/v1/swipes
///
/// Request body:
/// ```json
/// { "swipedId": "string", "action": "like" }
/// ```
///
/// A like that completes a mutual pair returns the new match.
async fn record_swipe(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<SwipeRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    if req.swiped_id == user.id {
        return Err(ApiError::BadRequest("You cannot swipe on yourself".to_string()));
    }

    if state.store.get_profile(&req.swiped_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Profile {} not found", req.swiped_id)));
    }

    let now = Utc::now();
    let used = state.store.count_swipes_since(&user.id, day_start(now)).await?;
    let quota = SwipeQuota::new(state.swipes.daily_limit, used);
    if quota.exhausted() {
        tracing::info!("User {} hit the daily swipe limit", user.id);
        return Err(ApiError::TooManyRequests(format!(
            "Daily swipe limit of {} reached",
            quota.limit
        )));
    }

    let swipe = Swipe {
        swiper_id: user.id.clone(),
        swiped_id: req.swiped_id,
        action: req.action,
        created_at: now,
    };

    let new_match = state.store.record_swipe(&swipe).await?;

    tracing::debug!(
        "Swipe {} -> {} ({:?}), matched: {}",
        swipe.swiper_id,
        swipe.swiped_id,
        swipe.action,
        new_match.is_some()
    );

    Ok(HttpResponse::Ok().json(SwipeResponse {
        matched: new_match.is_some(),
        new_match,
        swipe,
        remaining_swipes: quota.after_swipe().remaining(),
    }))
}
