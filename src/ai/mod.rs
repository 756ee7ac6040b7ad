// Generated-content features: prompts, static fallbacks, and the assistant
pub mod assistant;
pub mod fallbacks;
pub mod prompts;

pub use assistant::{parse_suggestions, Assistant};
