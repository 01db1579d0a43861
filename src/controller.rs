//! Conversation controller.
//!
//! [`ChatController`] owns everything the chat front-end mutates: the session
//! identifier, the composer (draft text, pending attachment, send control),
//! the conversation, and its view. History replay and sending are the two
//! operations that talk to the service; both absorb failures and report them
//! through the configured [`ErrorReporter`].
//!
//! Methods take `&self` so that a history replay and a send may be in flight
//! at the same time. Neither waits for the other; whichever settles first
//! renders first. Shared state is locked only between awaits.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::attachment::ImageAttachment;
use crate::client::ChatTransport;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::observability::{
    HISTORY_FAILURES, HISTORY_LOADS, HISTORY_MESSAGES, SEND_FAILURES, SEND_IMAGES, SENDS,
    SENDS_BUSY, SENDS_IGNORED, STORAGE_FAILURES,
};
use crate::reporter::{ErrorReporter, Failure, FailureKind};
use crate::session_store::{SessionStore, get_or_create_session_id};
use crate::types::{ChatRequest, Message};
use crate::view::{Bubble, ConversationView, Renderer};

/// Reply shown in place of the real one when a send fails.
pub const FALLBACK_REPLY: &str = "Server error";

/// Whether a send is in flight.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SendState {
    /// Ready to send.
    Idle,
    /// Waiting for the service to answer.
    Sending,
}

/// What a send action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send; no request was made and nothing changed.
    Ignored,
    /// Another send was in flight; nothing changed.
    Busy,
    /// The service replied with this text.
    Replied(String),
    /// The send failed and the fallback reply was shown.
    Fallback,
}

/// The input controls a user composes a message with.
#[derive(Debug, Clone)]
struct Composer {
    draft: String,
    pending: Option<ImageAttachment>,
    file_input: Option<PathBuf>,
    send_enabled: bool,
    input_focused: bool,
}

impl Default for Composer {
    fn default() -> Self {
        Self {
            draft: String::new(),
            pending: None,
            file_input: None,
            send_enabled: true,
            input_focused: true,
        }
    }
}

struct Inner {
    composer: Composer,
    conversation: Vec<Message>,
    view: ConversationView,
}

impl Inner {
    fn append(&mut self, message: Message) {
        self.view.append_message(&message);
        self.conversation.push(message);
    }
}

/// Drives one chat session against a [`ChatTransport`].
pub struct ChatController<T: ChatTransport> {
    transport: T,
    config: ClientConfig,
    session_id: String,
    session_persistent: bool,
    reporter: Arc<dyn ErrorReporter>,
    sending: AtomicBool,
    inner: Mutex<Inner>,
}

impl<T: ChatTransport> ChatController<T> {
    /// Creates a controller, resolving the session identifier from `store`.
    ///
    /// A store that cannot be used yields an identifier that lives only as
    /// long as this controller; the failure is reported, not returned.
    pub fn new(
        transport: T,
        config: ClientConfig,
        store: &dyn SessionStore,
        renderer: Box<dyn Renderer>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let session = get_or_create_session_id(store);
        let session_persistent = session.is_persistent();
        if let Some(err) = session.storage_error {
            STORAGE_FAILURES.click();
            reporter.report(&Failure::new(FailureKind::Storage, err));
        }
        Self {
            transport,
            config,
            session_id: session.id,
            session_persistent,
            reporter,
            sending: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                composer: Composer::default(),
                conversation: Vec::new(),
                view: ConversationView::new(renderer),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn report(&self, kind: FailureKind, error: crate::Error) {
        self.reporter.report(&Failure::new(kind, error));
    }

    /// The identifier sent with every request.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// False when storage was unavailable and the identifier is ephemeral.
    pub fn is_session_persistent(&self) -> bool {
        self.session_persistent
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replays the stored conversation for this session.
    ///
    /// The view is cleared first. On success every returned turn is rendered
    /// in service order and the turns are returned; on failure the view stays
    /// empty, the failure is reported, and an empty list is returned.
    pub async fn load_history(&self) -> Vec<Message> {
        HISTORY_LOADS.click();
        {
            let mut inner = self.lock();
            inner.conversation.clear();
            inner.view.clear();
        }
        match self.transport.fetch_history(&self.session_id).await {
            Ok(response) => {
                let messages = response.into_messages();
                HISTORY_MESSAGES.count(messages.len() as u64);
                let mut inner = self.lock();
                inner.view.replace_all(&messages);
                inner.conversation = messages.clone();
                messages
            }
            Err(err) => {
                HISTORY_FAILURES.click();
                self.report(FailureKind::History, err);
                Vec::new()
            }
        }
    }

    /// Stages the selected file as the pending attachment.
    ///
    /// `None` means no file was chosen and changes nothing. On success the
    /// encoded data URI is returned and the preview updated; on failure the
    /// previous attachment is kept.
    pub fn select_file(&self, file: Option<&Path>) -> Result<Option<String>> {
        let Some(path) = file else {
            return Ok(None);
        };
        let attachment = ImageAttachment::from_path(path, self.config.max_image_bytes)?;
        let data_uri = attachment.data_uri().to_string();
        self.set_attachment(attachment);
        Ok(Some(data_uri))
    }

    /// Stages an already-encoded attachment, replacing any previous one.
    pub fn set_attachment(&self, attachment: ImageAttachment) {
        let mut inner = self.lock();
        let label = attachment.path().display().to_string();
        inner.composer.file_input = Some(attachment.path().to_path_buf());
        inner.composer.pending = Some(attachment);
        inner.view.set_preview(Some(label));
    }

    /// Drops the pending attachment and resets the file input.
    pub fn clear_attachment(&self) {
        let mut inner = self.lock();
        inner.composer.pending = None;
        inner.composer.file_input = None;
        inner.view.set_preview(None);
    }

    /// Replaces the draft text.
    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock().composer.draft = text.into();
    }

    /// Types `text` into the draft and performs the send action.
    ///
    /// While another send is in flight the draft is left as it was.
    pub async fn send(&self, text: &str) -> SendOutcome {
        if self.state() == SendState::Sending {
            SENDS_BUSY.click();
            return SendOutcome::Busy;
        }
        self.set_draft(text);
        self.submit().await
    }

    /// Performs the send action on the current draft and attachment.
    ///
    /// Ignored when the trimmed draft is empty and no image is pending, and
    /// rejected while another send is in flight. Otherwise the message is
    /// echoed at once, sent, and answered by exactly one reply bubble: the
    /// service's text, or [`FALLBACK_REPLY`] on any failure. Afterwards the
    /// attachment and file input are cleared and the composer is ready again.
    pub async fn submit(&self) -> SendOutcome {
        let request = {
            let mut inner = self.lock();
            let text = inner.composer.draft.trim().to_string();
            if text.is_empty() && inner.composer.pending.is_none() {
                SENDS_IGNORED.click();
                return SendOutcome::Ignored;
            }
            if self
                .sending
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                SENDS_BUSY.click();
                return SendOutcome::Busy;
            }

            let image = inner
                .composer
                .pending
                .as_ref()
                .map(|attachment| attachment.data_uri().to_string());
            let mut outgoing = Message::user(text.clone());
            if let Some(image) = &image {
                SEND_IMAGES.click();
                outgoing = outgoing.with_image(image.clone());
            }
            inner.append(outgoing);

            inner.composer.draft.clear();
            inner.view.set_preview(None);
            inner.composer.send_enabled = false;
            if self.config.show_loading_indicator {
                inner.view.set_loading(true);
            }
            ChatRequest::new(self.session_id.clone(), text, image)
        };

        SENDS.click();
        let result = self.transport.send_message(&request).await;

        let (outcome, failure) = {
            let mut inner = self.lock();
            inner.view.set_loading(false);
            let (outcome, failure) = match result {
                Ok(response) => {
                    inner.append(Message::assistant(response.response.clone()));
                    (SendOutcome::Replied(response.response), None)
                }
                Err(err) => {
                    inner.append(Message::assistant(FALLBACK_REPLY));
                    (SendOutcome::Fallback, Some(err))
                }
            };
            inner.composer.pending = None;
            inner.composer.file_input = None;
            inner.composer.send_enabled = true;
            inner.composer.input_focused = true;
            (outcome, failure)
        };
        self.sending.store(false, Ordering::Release);

        if let Some(err) = failure {
            SEND_FAILURES.click();
            self.report(FailureKind::Send, err);
        }
        outcome
    }

    /// Whether a send is in flight.
    pub fn state(&self) -> SendState {
        if self.sending.load(Ordering::Acquire) {
            SendState::Sending
        } else {
            SendState::Idle
        }
    }

    /// The current draft text.
    pub fn draft(&self) -> String {
        self.lock().composer.draft.clone()
    }

    /// Whether an image is staged for the next send.
    pub fn has_pending_attachment(&self) -> bool {
        self.lock().composer.pending.is_some()
    }

    /// The file the file input currently holds.
    pub fn file_input(&self) -> Option<PathBuf> {
        self.lock().composer.file_input.clone()
    }

    /// Whether the send control accepts input.
    pub fn is_send_enabled(&self) -> bool {
        self.lock().composer.send_enabled
    }

    /// Whether focus sits in the text input.
    pub fn is_input_focused(&self) -> bool {
        self.lock().composer.input_focused
    }

    /// Whether the loading indicator is visible.
    pub fn is_loading(&self) -> bool {
        self.lock().view.is_loading()
    }

    /// The attachment preview currently shown.
    pub fn preview(&self) -> Option<String> {
        self.lock().view.preview().map(String::from)
    }

    /// The conversation so far, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().conversation.clone()
    }

    /// The rendered bubbles, in display order.
    pub fn bubbles(&self) -> Vec<Bubble> {
        self.lock().view.bubbles().to_vec()
    }

    /// Print an informational line through the view's renderer.
    pub fn info(&self, info: &str) {
        self.lock().view.info(info);
    }

    /// Print an error line through the view's renderer.
    pub fn error(&self, error: &str) {
        self.lock().view.error(error);
    }
}
