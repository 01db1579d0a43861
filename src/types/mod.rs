// Public modules
pub mod chat_request;
pub mod chat_response;
pub mod history_response;
pub mod message;
pub mod role;

// Re-exports
pub use chat_request::ChatRequest;
pub use chat_response::ChatResponse;
pub use history_response::{HistoryEntry, HistoryResponse};
pub use message::{IMAGE_MARKER, Message};
pub use role::Role;
