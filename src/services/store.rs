use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Category, Comment, Match, Message, Post, Swipe, UserProfile, VoteTally, VoteTarget, VoteType,
};
use crate::services::document_store::DocumentStore;
use crate::services::documents::DocumentError;
use crate::services::postgres::PostgresStore;

/// Errors raised by either storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Document store error: {0}")]
    Document(#[from] DocumentError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// The configured storage backend
///
/// Both variants expose the same operations with the same semantics; handlers
/// only ever see this type.
pub enum DataStore {
    Relational(PostgresStore),
    Document(DocumentStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            DataStore::Relational($store) => $call,
            DataStore::Document($store) => $call,
        }
    };
}

impl DataStore {
    pub fn backend_name(&self) -> &'static str {
        match self {
            DataStore::Relational(_) => "relational",
            DataStore::Document(_) => "document",
        }
    }

    pub async fn health_check(&self) -> Result<bool, StoreError> {
        dispatch!(self, s => s.health_check().await)
    }

    pub async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        dispatch!(self, s => s.get_profile(id).await)
    }

    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        dispatch!(self, s => s.upsert_profile(profile).await)
    }

    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        dispatch!(self, s => s.list_profiles().await)
    }

    pub async fn profiles_by_ids(&self, ids: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        dispatch!(self, s => s.profiles_by_ids(ids).await)
    }

    pub async fn swiped_ids(&self, swiper_id: &str) -> Result<Vec<String>, StoreError> {
        dispatch!(self, s => s.swiped_ids(swiper_id).await)
    }

    pub async fn count_swipes_since(&self, swiper_id: &str, since: DateTime<Utc>) -> Result<u64, StoreError> {
        dispatch!(self, s => s.count_swipes_since(swiper_id, since).await)
    }

    /// Record a swipe; returns the match when it completes a mutual like
    pub async fn record_swipe(&self, swipe: &Swipe) -> Result<Option<Match>, StoreError> {
        dispatch!(self, s => s.record_swipe(swipe).await)
    }

    pub async fn matches_for(&self, user_id: &str) -> Result<Vec<Match>, StoreError> {
        dispatch!(self, s => s.matches_for(user_id).await)
    }

    pub async fn get_match(&self, id: &str) -> Result<Option<Match>, StoreError> {
        dispatch!(self, s => s.get_match(id).await)
    }

    pub async fn list_messages(&self, match_id: &str) -> Result<Vec<Message>, StoreError> {
        dispatch!(self, s => s.list_messages(match_id).await)
    }

    pub async fn insert_message(&self, message: &Message) -> Result<Message, StoreError> {
        dispatch!(self, s => s.insert_message(message).await)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        dispatch!(self, s => s.list_categories().await)
    }

    pub async fn list_posts(&self, category: Option<&str>, limit: u32, offset: u32) -> Result<Vec<Post>, StoreError> {
        dispatch!(self, s => s.list_posts(category, limit, offset).await)
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        dispatch!(self, s => s.get_post(id).await)
    }

    pub async fn create_post(&self, post: &Post) -> Result<Post, StoreError> {
        dispatch!(self, s => s.create_post(post).await)
    }

    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        dispatch!(self, s => s.list_comments(post_id).await)
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        dispatch!(self, s => s.get_comment(id).await)
    }

    /// Store a comment and bump its post's comment counter
    pub async fn create_comment(&self, comment: &Comment) -> Result<Comment, StoreError> {
        dispatch!(self, s => s.create_comment(comment).await)
    }

    /// Apply a vote with toggle semantics and return the new tally
    pub async fn cast_vote(
        &self,
        user_id: &str,
        target: &VoteTarget,
        vote_type: VoteType,
    ) -> Result<VoteTally, StoreError> {
        dispatch!(self, s => s.cast_vote(user_id, target, vote_type).await)
    }

    pub async fn user_vote(&self, user_id: &str, target: &VoteTarget) -> Result<Option<VoteType>, StoreError> {
        dispatch!(self, s => s.user_vote(user_id, target).await)
    }
}
