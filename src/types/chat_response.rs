use serde::{Deserialize, Serialize};

/// Body of a successful `POST /chat` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    /// The assistant's reply text.
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"response":"hello"}"#).unwrap();
        assert_eq!(parsed.response, "hello");
    }

    #[test]
    fn missing_response_is_an_error() {
        assert!(serde_json::from_str::<ChatResponse>(r#"{"detail":"Model failed"}"#).is_err());
    }
}
