use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::ai::prompts;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{
    ConversationStartersRequest, PostSuggestionRequest, PostSuggestionResponse,
    RecommendationRequest, RecommendationResponse, ReplySuggestionsRequest, SuggestionsResponse,
};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ai/conversation-starters", web::post().to(conversation_starters))
        .route("/ai/reply-suggestions", web::post().to(reply_suggestions))
        .route("/ai/post-suggestions", web::post().to(post_suggestions))
        .route("/ai/recommendations", web::post().to(recommendations));
}

/// POST /api/v1/ai/conversation-starters
async fn conversation_starters(
    state: web::Data<AppState>,
    req: web::Json<ConversationStartersRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let (Some(current), Some(other)) = (req.current_user, req.other_user) else {
        return Err(ApiError::BadRequest("Missing user profiles".to_string()));
    };

    let suggestions = state
        .assistant
        .conversation_starters(&current, &other, req.conversation_type.unwrap_or_default())
        .await;

    Ok(HttpResponse::Ok().json(SuggestionsResponse { suggestions }))
}

/// POST /api/v1/ai/reply-suggestions
async fn reply_suggestions(
    state: web::Data<AppState>,
    req: web::Json<ReplySuggestionsRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let (Some(current), Some(other), Some(history)) =
        (req.current_user, req.other_user, req.message_history)
    else {
        return Err(ApiError::BadRequest("Missing required data".to_string()));
    };

    let lines = prompts::history_lines(
        history.iter().map(|entry| (entry.text.as_str(), entry.is_from_current_user)),
        &current,
        &other,
    );
    let suggestions = state.assistant.reply_suggestions(&lines, &current, &other).await;

    Ok(HttpResponse::Ok().json(SuggestionsResponse { suggestions }))
}

/// POST /api/v1/ai/post-suggestions
async fn post_suggestions(
    state: web::Data<AppState>,
    req: web::Json<PostSuggestionRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

    let category = req
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("general");

    let suggestion = state.assistant.post_suggestion(title, category).await;

    Ok(HttpResponse::Ok().json(PostSuggestionResponse { suggestion }))
}

/// POST /api/v1/ai/recommendations
///
/// Candidates are every other stored profile; the caller's own profile, when
/// present, ranks the local fallback.
async fn recommendations(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<RecommendationRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    let requester = state.store.get_profile(&user.id).await?;
    let candidates: Vec<_> = state
        .store
        .list_profiles()
        .await?
        .into_iter()
        .filter(|profile| profile.id != user.id)
        .collect();

    let recommended_profiles = state
        .assistant
        .recommendations(
            &req.networking_goals,
            req.profile_details.as_deref().unwrap_or_default(),
            requester.as_ref(),
            &candidates,
        )
        .await;

    Ok(HttpResponse::Ok().json(RecommendationResponse { recommended_profiles }))
}
