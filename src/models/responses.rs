use serde::{Deserialize, Serialize};

use crate::models::domain::{
    AuthorSummary, Category, Comment, Match, Post, Swipe, UserProfile, VoteType,
};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResponse {
    pub profiles: Vec<UserProfile>,
    pub total_results: usize,
    pub remaining_swipes: u32,
    pub daily_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResponse {
    pub swipe: Swipe,
    pub matched: bool,
    #[serde(rename = "match")]
    pub new_match: Option<Match>,
    pub remaining_swipes: u32,
}

/// A match with both participants' profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    #[serde(flatten)]
    pub record: Match,
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub user: Option<AuthorSummary>,
    #[serde(rename = "categories")]
    pub category_info: Option<Category>,
    pub user_vote: Option<VoteType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<AuthorSummary>,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSuggestionResponse {
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub recommended_profiles: Vec<String>,
}
