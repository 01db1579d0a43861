//! The rendered conversation.
//!
//! [`ConversationView`] is an ordered list of bubbles projected from the
//! conversation; it is never consulted as a source of truth. Every change is
//! forwarded to a [`Renderer`] so a front-end can draw it.

use std::io::{self, Stdout, Write};

use crate::types::{Message, Role};

/// ANSI escape code for dim text (used for the loading indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for user bubbles).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for model bubbles).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Visual style of a bubble.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BubbleStyle {
    /// Text the user sent.
    User,
    /// Text the service sent.
    Model,
}

impl From<Role> for BubbleStyle {
    fn from(role: Role) -> Self {
        match role {
            Role::Assistant => BubbleStyle::Model,
            Role::User => BubbleStyle::User,
        }
    }
}

/// One rendered turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    /// Text shown in the bubble.
    pub text: String,
    /// How the bubble is drawn.
    pub style: BubbleStyle,
}

impl Bubble {
    /// Creates a bubble.
    pub fn new(text: impl Into<String>, style: BubbleStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

impl From<&Message> for Bubble {
    fn from(message: &Message) -> Self {
        Bubble::new(message.display_text(), message.role.into())
    }
}

/// Trait for drawing the conversation.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - No output at all (tests, headless use)
pub trait Renderer: Send {
    /// Draw a newly appended bubble.
    fn render_bubble(&mut self, bubble: &Bubble);

    /// Forget everything drawn so far.
    fn clear(&mut self) {}

    /// Show the loading indicator.
    fn show_loading(&mut self) {}

    /// Hide the loading indicator.
    fn hide_loading(&mut self) {}

    /// Show the current attachment preview; `None` hides it.
    fn show_preview(&mut self, preview: Option<&str>) {
        _ = preview;
    }

    /// Print an informational message outside the conversation.
    fn print_info(&mut self, info: &str);

    /// Print an error message outside the conversation.
    fn print_error(&mut self, error: &str);
}

/// A renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render_bubble(&mut self, _: &Bubble) {}

    fn print_info(&mut self, _: &str) {}

    fn print_error(&mut self, _: &str) {}
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    loading: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            loading: false,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn erase_loading(&mut self) {
        if self.loading {
            // Return to the start of the indicator line and wipe it.
            print!("\r\x1b[2K");
            self.loading = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn render_bubble(&mut self, bubble: &Bubble) {
        self.erase_loading();
        let (label, color) = match bubble.style {
            BubbleStyle::User => ("You", ANSI_CYAN),
            BubbleStyle::Model => ("Model", ANSI_GREEN),
        };
        if self.use_color {
            println!("{ANSI_BOLD}{color}{label}:{ANSI_RESET} {}", bubble.text);
        } else {
            println!("{label}: {}", bubble.text);
        }
        self.flush();
    }

    fn clear(&mut self) {
        self.erase_loading();
        if self.use_color {
            // Clear screen and home the cursor.
            print!("\x1b[2J\x1b[H");
        }
        self.flush();
    }

    fn show_loading(&mut self) {
        if self.loading {
            return;
        }
        if self.use_color {
            print!("{ANSI_DIM}Model is typing...{ANSI_RESET}");
        } else {
            print!("Model is typing...");
        }
        self.loading = true;
        self.flush();
    }

    fn hide_loading(&mut self) {
        self.erase_loading();
        self.flush();
    }

    fn show_preview(&mut self, preview: Option<&str>) {
        if let Some(preview) = preview {
            self.erase_loading();
            if self.use_color {
                println!("{ANSI_DIM}[attached: {preview}]{ANSI_RESET}");
            } else {
                println!("[attached: {preview}]");
            }
            self.flush();
        }
    }

    fn print_info(&mut self, info: &str) {
        self.erase_loading();
        println!("{info}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.erase_loading();
        if self.use_color {
            eprintln!("{ANSI_RED}Error:{ANSI_RESET} {error}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

/// The ordered bubbles currently on screen.
pub struct ConversationView {
    bubbles: Vec<Bubble>,
    loading: bool,
    preview: Option<String>,
    renderer: Box<dyn Renderer>,
}

impl ConversationView {
    /// Creates an empty view drawing through `renderer`.
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self {
            bubbles: Vec::new(),
            loading: false,
            preview: None,
            renderer,
        }
    }

    /// Creates an empty view that draws nothing.
    pub fn headless() -> Self {
        Self::new(Box::new(NullRenderer))
    }

    /// Append a bubble to the end of the view.
    pub fn append(&mut self, bubble: Bubble) {
        self.renderer.render_bubble(&bubble);
        self.bubbles.push(bubble);
    }

    /// Append the projection of a message.
    pub fn append_message(&mut self, message: &Message) {
        self.append(Bubble::from(message));
    }

    /// Remove every bubble.
    pub fn clear(&mut self) {
        self.bubbles.clear();
        self.renderer.clear();
    }

    /// Replace the whole view with the projection of `messages`.
    pub fn replace_all(&mut self, messages: &[Message]) {
        self.clear();
        for message in messages {
            self.append_message(message);
        }
    }

    /// Show or hide the loading indicator.
    pub fn set_loading(&mut self, loading: bool) {
        if loading == self.loading {
            return;
        }
        self.loading = loading;
        if loading {
            self.renderer.show_loading();
        } else {
            self.renderer.hide_loading();
        }
    }

    /// Show a preview label for the pending attachment, or hide it.
    pub fn set_preview(&mut self, preview: Option<String>) {
        self.renderer.show_preview(preview.as_deref());
        self.preview = preview;
    }

    /// Print an informational line outside the conversation.
    pub fn info(&mut self, info: &str) {
        self.renderer.print_info(info);
    }

    /// Print an error line outside the conversation.
    pub fn error(&mut self, error: &str) {
        self.renderer.print_error(error);
    }

    /// The bubbles in display order.
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Whether the loading indicator is visible.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The visible attachment preview, if any.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Renderer for Recorder {
        fn render_bubble(&mut self, bubble: &Bubble) {
            self.0.lock().unwrap().push(format!("{:?}:{}", bubble.style, bubble.text));
        }

        fn clear(&mut self) {
            self.0.lock().unwrap().push("clear".to_string());
        }

        fn show_loading(&mut self) {
            self.0.lock().unwrap().push("loading".to_string());
        }

        fn hide_loading(&mut self) {
            self.0.lock().unwrap().push("loaded".to_string());
        }

        fn print_info(&mut self, _: &str) {}

        fn print_error(&mut self, _: &str) {}
    }

    #[test]
    fn roles_map_to_styles() {
        assert_eq!(BubbleStyle::from(Role::Assistant), BubbleStyle::Model);
        assert_eq!(BubbleStyle::from(Role::User), BubbleStyle::User);
    }

    #[test]
    fn replace_all_clears_then_renders_in_order() {
        let recorder = Recorder::default();
        let mut view = ConversationView::new(Box::new(recorder.clone()));
        view.append(Bubble::new("stale", BubbleStyle::User));
        view.replace_all(&[Message::user("hi"), Message::assistant("hello")]);

        assert_eq!(
            view.bubbles(),
            &[
                Bubble::new("hi", BubbleStyle::User),
                Bubble::new("hello", BubbleStyle::Model),
            ]
        );
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["User:stale", "clear", "User:hi", "Model:hello"]
        );
    }

    #[test]
    fn loading_toggles_once() {
        let recorder = Recorder::default();
        let mut view = ConversationView::new(Box::new(recorder.clone()));
        view.set_loading(true);
        view.set_loading(true);
        assert!(view.is_loading());
        view.set_loading(false);
        view.set_loading(false);
        assert!(!view.is_loading());
        assert_eq!(*recorder.0.lock().unwrap(), vec!["loading", "loaded"]);
    }

    #[test]
    fn image_messages_show_marker() {
        let mut view = ConversationView::headless();
        view.append_message(&Message::user("see").with_image("data:image/png;base64,AA"));
        assert_eq!(view.bubbles()[0].text, "see [Image]");
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
        assert!(PlainTextRenderer::new().use_color);
    }
}
