use serde::{Deserialize, Serialize};

/// Body of a `POST /chat` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// Identifier correlating this client with its server-side history.
    pub session_id: String,

    /// The trimmed text the user typed; may be empty when only an image is sent.
    pub message: String,

    /// The pending image as a data URI, serialized as `null` when absent.
    pub image_base64: Option<String>,
}

impl ChatRequest {
    /// Create a new chat request.
    pub fn new(
        session_id: impl Into<String>,
        message: impl Into<String>,
        image_base64: Option<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            image_base64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_is_explicit_null() {
        let request = ChatRequest::new("abc", "hi", None);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"session_id":"abc","message":"hi","image_base64":null}"#
        );
    }

    #[test]
    fn image_is_carried_verbatim() {
        let request = ChatRequest::new("abc", "", Some("data:image/gif;base64,R0lG".into()));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["image_base64"], "data:image/gif;base64,R0lG");
        assert_eq!(value["message"], "");
    }
}
