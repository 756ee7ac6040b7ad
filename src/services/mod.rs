// Service exports
pub mod document_store;
pub mod documents;
pub mod identity;
pub mod llm;
pub mod postgres;
pub mod realtime;
pub mod store;

pub use document_store::DocumentStore;
pub use documents::{DocumentClient, DocumentError};
pub use identity::{IdentityClient, IdentityError, Session};
pub use llm::{LlmClient, LlmError};
pub use postgres::PostgresStore;
pub use realtime::{MessageHub, RealtimeError};
pub use store::{DataStore, StoreError};
