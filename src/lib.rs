//! StackSwipe - networking service for developers
//!
//! Swipe-based discovery and matching, one-to-one messaging with live
//! delivery, a community board with threaded comments and votes, and
//! LLM-assisted writing with static fallbacks. Data lives in PostgreSQL or an
//! Appwrite-compatible document database, chosen by configuration.

pub mod ai;
pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{build_threads, discover, pair_id, DiscoveryFilter, SwipeQuota};
pub use crate::error::ApiError;
pub use crate::models::{Comment, Match, Message, Post, UserProfile};
pub use crate::routes::AppState;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(pair_id("b", "a"), "a_b");
        assert_eq!(SwipeQuota::new(10, 3).remaining(), 7);
    }
}
