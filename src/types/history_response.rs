use serde::{Deserialize, Serialize};

use crate::types::{Message, Role};

/// One stored turn as returned by `GET /history/{session_id}`.
///
/// The role is kept as the raw string so that unexpected roles still replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Role string as stored by the service.
    pub role: String,

    /// Turn text.
    pub content: String,
}

impl From<HistoryEntry> for Message {
    fn from(entry: HistoryEntry) -> Self {
        Message {
            role: Role::from_wire(&entry.role),
            content: entry.content,
            attached_image: None,
        }
    }
}

/// Body of a successful `GET /history/{session_id}` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryResponse {
    /// Past turns in the order the service stored them.
    pub history: Vec<HistoryEntry>,
}

impl HistoryResponse {
    /// Converts the response into conversation messages, preserving order.
    pub fn into_messages(self) -> Vec<Message> {
        self.history.into_iter().map(Message::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order_and_maps_roles() {
        let json = r#"{"history":[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]}"#;
        let parsed: HistoryResponse = serde_json::from_str(json).unwrap();
        let messages = parsed.into_messages();
        assert_eq!(
            messages,
            vec![Message::user("hi"), Message::assistant("hello")]
        );
    }

    #[test]
    fn unknown_roles_replay_as_user() {
        let json = r#"{"history":[{"role":"tool","content":"x"}]}"#;
        let parsed: HistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_messages()[0].role, Role::User);
    }

    #[test]
    fn empty_history() {
        let parsed: HistoryResponse = serde_json::from_str(r#"{"history":[]}"#).unwrap();
        assert!(parsed.into_messages().is_empty());
    }
}
