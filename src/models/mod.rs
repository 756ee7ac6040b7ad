// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AuthorSummary, Category, Comment, ExperienceLevel, Match, Message, Post, ProfileLinks, Swipe,
    SwipeAction, UserProfile, VoteTally, VoteTarget, VoteType, NETWORKING_GOALS,
};
pub use requests::{
    ConversationStartersRequest, ConversationType, CreateCommentRequest, CreatePostRequest,
    CredentialsRequest, DiscoverQuery, HistoryEntry, PostListQuery, PostSuggestionRequest, PromptProfile,
    RecommendationRequest, ReplySuggestionsRequest, SendMessageRequest, SwipeRequest,
    UpsertProfileRequest, VoteRequest,
};
pub use responses::{
    CommentView, DiscoverResponse, ErrorResponse, HealthResponse, MatchView,
    PostSuggestionResponse, PostView, RecommendationResponse, SuggestionsResponse, SwipeResponse,
};
