use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::core::build_threads;
use crate::error::ApiError;
use crate::models::{
    AuthorSummary, Category, Comment, CreateCommentRequest, CreatePostRequest, Post, PostListQuery,
    PostView, VoteRequest, VoteTarget,
};
use crate::routes::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/categories", web::get().to(list_categories))
        .route("/posts", web::get().to(list_posts))
        .route("/posts", web::post().to(create_post))
        .route("/posts/{id}", web::get().to(get_post))
        .route("/posts/{id}/comments", web::get().to(list_comments))
        .route("/posts/{id}/comments", web::post().to(create_comment))
        .route("/posts/{id}/vote", web::post().to(vote_on_post))
        .route("/comments/{id}/vote", web::post().to(vote_on_comment));
}

/// Author summaries for `user_ids`, keyed by id
async fn authors(state: &AppState, user_ids: impl IntoIterator<Item = String>) -> Result<HashMap<String, AuthorSummary>, ApiError> {
    let mut ids: Vec<String> = user_ids.into_iter().collect();
    ids.sort();
    ids.dedup();

    Ok(state
        .store
        .profiles_by_ids(&ids)
        .await?
        .iter()
        .map(|profile| (profile.id.clone(), profile.author_summary()))
        .collect())
}

async fn categories_by_id(state: &AppState) -> Result<HashMap<String, Category>, ApiError> {
    Ok(state
        .store
        .list_categories()
        .await?
        .into_iter()
        .map(|category| (category.id.clone(), category))
        .collect())
}

/// GET /api/v1/categories
async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let categories = state.store.list_categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}

/// GET /api/v1/posts?category=backend&limit=20&offset=0
///
/// Newest first. `category=all` or no category lists every board.
async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let posts = state.store.list_posts(query.category_filter(), limit, offset).await?;
    let authors = authors(&state, posts.iter().map(|p| p.user_id.clone())).await?;
    let categories = categories_by_id(&state).await?;

    let views: Vec<PostView> = posts
        .into_iter()
        .map(|post| PostView {
            user: authors.get(&post.user_id).cloned(),
            category_info: categories.get(&post.category).cloned(),
            user_vote: None,
            post,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// POST /api/v1/posts
async fn create_post(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    let categories = categories_by_id(&state).await?;
    let category = req.category.trim().to_string();
    if !categories.contains_key(&category) {
        return Err(ApiError::BadRequest(format!("Unknown category: {}", category)));
    }

    let now = Utc::now();
    let post = Post {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        title: req.title.trim().to_string(),
        content: req.content.trim().to_string(),
        category,
        tags: req
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
        upvotes: 0,
        comment_count: 0,
        created_at: now,
        updated_at: now,
    };

    let stored = state.store.create_post(&post).await?;
    tracing::info!("User {} created post {}", user.id, stored.id);

    Ok(HttpResponse::Created().json(stored))
}

/// GET /api/v1/posts/{id}
///
/// Signed-in callers also get their own vote on the post.
async fn get_post(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let post = state
        .store
        .get_post(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Post {} not found", id)))?;

    let user_vote = match &user {
        Some(user) => {
            state
                .store
                .user_vote(&user.id, &VoteTarget::Post(post.id.clone()))
                .await?
        }
        None => None,
    };

    let author = state.store.get_profile(&post.user_id).await?;
    let categories = categories_by_id(&state).await?;

    Ok(HttpResponse::Ok().json(PostView {
        user: author.map(|profile| profile.author_summary()),
        category_info: categories.get(&post.category).cloned(),
        user_vote,
        post,
    }))
}

/// GET /api/v1/posts/{id}/comments
async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    if state.store.get_post(&post_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Post {} not found", post_id)));
    }

    let comments = state.store.list_comments(&post_id).await?;
    let authors = authors(&state, comments.iter().map(|c| c.user_id.clone())).await?;

    Ok(HttpResponse::Ok().json(build_threads(comments, &authors)))
}

/// POST /api/v1/posts/{id}/comments
///
/// A reply's parent must be a comment on the same post.
async fn create_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let post_id = path.into_inner();
    let req = req.into_inner();

    if state.store.get_post(&post_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Post {} not found", post_id)));
    }

    let parent_comment_id = req.parent_comment_id.filter(|id| !id.trim().is_empty());
    if let Some(parent_id) = &parent_comment_id {
        match state.store.get_comment(parent_id).await? {
            Some(parent) if parent.post_id == post_id => {}
            Some(_) => {
                return Err(ApiError::BadRequest(
                    "Parent comment belongs to another post".to_string(),
                ))
            }
            None => return Err(ApiError::NotFound(format!("Comment {} not found", parent_id))),
        }
    }

    let now = Utc::now();
    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        post_id,
        user_id: user.id,
        content: req.content.trim().to_string(),
        parent_comment_id,
        upvotes: 0,
        created_at: now,
        updated_at: now,
    };

    let stored = state.store.create_comment(&comment).await?;
    Ok(HttpResponse::Created().json(stored))
}

/// POST /api/v1/posts/{id}/vote
///
/// Repeating a vote withdraws it; the opposite vote replaces it.
async fn vote_on_post(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    req: web::Json<VoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let target = VoteTarget::Post(path.into_inner());
    let tally = state.store.cast_vote(&user.id, &target, req.vote_type).await?;
    Ok(HttpResponse::Ok().json(tally))
}

/// POST /api/v1/comments/{id}/vote
async fn vote_on_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    req: web::Json<VoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let target = VoteTarget::Comment(path.into_inner());
    let tally = state.store.cast_vote(&user.id, &target, req.vote_type).await?;
    Ok(HttpResponse::Ok().json(tally))
}
