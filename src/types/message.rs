use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Suffix appended to the echoed text of a turn that carried an image.
pub const IMAGE_MARKER: &str = "[Image]";

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Who authored the turn.
    pub role: Role,

    /// The text of the turn.
    pub content: String,

    /// Data URI of the image sent with this turn, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_image: Option<String>,
}

impl Message {
    /// Create a new user message without an image.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attached_image: None,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attached_image: None,
        }
    }

    /// Attach an encoded image to this message.
    pub fn with_image(mut self, data_uri: impl Into<String>) -> Self {
        self.attached_image = Some(data_uri.into());
        self
    }

    /// Text shown for this message in the conversation view.
    ///
    /// Image bytes are never displayed; a turn with an image shows its text
    /// followed by the image marker.
    pub fn display_text(&self) -> String {
        if self.attached_image.is_some() {
            format!("{} {IMAGE_MARKER}", self.content)
        } else {
            self.content.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_text_marks_images() {
        let plain = Message::user("hello");
        assert_eq!(plain.display_text(), "hello");

        let with_image = Message::user("look").with_image("data:image/png;base64,AAAA");
        assert_eq!(with_image.display_text(), "look [Image]");

        let image_only = Message::user("").with_image("data:image/png;base64,AAAA");
        assert_eq!(image_only.display_text(), " [Image]");
    }

    #[test]
    fn image_is_not_serialized_when_absent() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
