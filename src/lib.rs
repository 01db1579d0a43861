// Public modules
pub mod attachment;
pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod observability;
pub mod reporter;
pub mod session_store;
pub mod types;
pub mod view;

// Re-exports
pub use attachment::ImageAttachment;
pub use client::{ChatClient, ChatTransport};
pub use config::{ApiBase, ChatArgs, ClientConfig};
pub use controller::{ChatController, FALLBACK_REPLY, SendOutcome, SendState};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use reporter::{ErrorReporter, Failure, FailureKind, LogReporter, RecordingReporter};
pub use session_store::{
    FileSessionStore, MemorySessionStore, SESSION_KEY, SessionId, SessionStore,
    get_or_create_session_id,
};
pub use types::*;
pub use view::{Bubble, BubbleStyle, ConversationView, NullRenderer, PlainTextRenderer, Renderer};
