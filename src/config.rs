//! Configuration for the chat client.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! [`ClientConfig`] that the client, controller, and front-end read from.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;
use url::Url;

use crate::error::{Error, Result};

/// Default service location; the backend listens on port 8000.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Environment variable consulted for the shared secret.
pub const AUTH_ENV_VAR: &str = "CHATLINE_AUTH";

/// Command-line arguments for the chatline tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the chat service.
    #[arrrg(optional, "Service base URL, absolute or relative (default: http://localhost:8000)", "URL")]
    pub api_base: Option<String>,

    /// Origin that a relative base URL is resolved against.
    #[arrrg(optional, "Origin for a relative --api-base", "URL")]
    pub origin: Option<String>,

    /// Shared secret sent in the X-Auth header.
    #[arrrg(optional, "Shared secret for the X-Auth header (or CHATLINE_AUTH)", "SECRET")]
    pub auth: Option<String>,

    /// Hide the loading indicator while a reply is pending.
    #[arrrg(flag, "Do not show a loading indicator while waiting")]
    pub no_loading_indicator: bool,

    /// File holding the persisted session identifier.
    #[arrrg(optional, "Storage file (default: ~/.chatline/storage.json)", "PATH")]
    pub storage: Option<String>,

    /// Keep the session identifier in memory only.
    #[arrrg(flag, "Do not persist the session identifier")]
    pub ephemeral: bool,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Largest image accepted for attachment.
    #[arrrg(optional, "Reject images larger than this many bytes", "BYTES")]
    pub max_image_bytes: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Where the chat service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiBase {
    /// A complete URL such as a tunnel address.
    Absolute(Url),
    /// A path resolved against the origin the client was served from.
    Relative(String),
}

impl ApiBase {
    /// Classify a configured base URL.
    pub fn parse(base: &str) -> Result<Self> {
        match Url::parse(base) {
            Ok(url) => Ok(ApiBase::Absolute(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(ApiBase::Relative(base.to_string())),
            Err(err) => Err(Error::url(format!("invalid api base {base:?}: {err}"), Some(err))),
        }
    }

    /// Produce the absolute URL requests are sent to.
    ///
    /// Endpoints are appended as `{base}/chat`, so a relative base is resolved
    /// with a trailing slash: `""` names the origin root and `"."` the
    /// origin's directory.
    pub fn resolve(&self, origin: Option<&Url>) -> Result<Url> {
        match self {
            ApiBase::Absolute(url) => Ok(url.clone()),
            ApiBase::Relative(path) => {
                let Some(origin) = origin else {
                    return Err(Error::validation(
                        format!("relative api base {path:?} needs an origin"),
                        Some("origin".to_string()),
                    ));
                };
                Ok(origin.join(&format!("{path}/"))?)
            }
        }
    }
}

/// Configuration for the chat client.
///
/// The three historical front-end variants differ only in these settings:
/// whether a secret is sent, whether a loading indicator is shown, and
/// whether the base URL is absolute or relative.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL as configured, absolute or relative.
    pub api_base: String,

    /// Origin for a relative `api_base`.
    pub origin: Option<String>,

    /// Shared secret for the `X-Auth` header; `None` omits the header.
    pub auth_secret: Option<String>,

    /// Whether to show a loading indicator while a reply is pending.
    pub show_loading_indicator: bool,

    /// Storage file for the session identifier; `None` uses the default.
    pub storage_path: Option<PathBuf>,

    /// Keep the session identifier in memory only.
    pub ephemeral: bool,

    /// Request timeout; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,

    /// Largest image accepted for attachment; `None` accepts any size.
    pub max_image_bytes: Option<u64>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ClientConfig {
    /// Creates a new ClientConfig with default values.
    ///
    /// Defaults:
    /// - API base: http://localhost:8000
    /// - Auth: none
    /// - Loading indicator: shown
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            origin: None,
            auth_secret: None,
            show_loading_indicator: true,
            storage_path: None,
            ephemeral: false,
            request_timeout: None,
            max_image_bytes: None,
            use_color: true,
        }
    }

    /// Sets the API base.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the origin for a relative API base.
    pub fn with_origin(mut self, origin: Option<String>) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the shared secret.
    pub fn with_auth_secret(mut self, secret: Option<String>) -> Self {
        self.auth_secret = secret;
        self
    }

    /// Sets whether the loading indicator is shown.
    pub fn with_loading_indicator(mut self, show: bool) -> Self {
        self.show_loading_indicator = show;
        self
    }

    /// Sets the storage file.
    pub fn with_storage_path(mut self, path: Option<PathBuf>) -> Self {
        self.storage_path = path;
        self
    }

    /// Sets whether the session identifier is kept in memory only.
    pub fn with_ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the attachment size ceiling.
    pub fn with_max_image_bytes(mut self, max: Option<u64>) -> Self {
        self.max_image_bytes = max;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Fills in the secret from `CHATLINE_AUTH` when none was given.
    pub fn with_auth_from_env(mut self) -> Self {
        if self.auth_secret.is_none() {
            self.auth_secret = std::env::var(AUTH_ENV_VAR).ok().filter(|s| !s.is_empty());
        }
        self
    }

    /// Classifies `api_base`.
    pub fn api_base(&self) -> Result<ApiBase> {
        ApiBase::parse(&self.api_base)
    }

    /// Resolves `api_base` against `origin` into the URL requests go to.
    pub fn resolved_base_url(&self) -> Result<Url> {
        let origin = self.origin.as_deref().map(Url::parse).transpose()?;
        self.api_base()?.resolve(origin.as_ref())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ClientConfig {
    fn from(args: ChatArgs) -> Self {
        ClientConfig {
            api_base: args.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            origin: args.origin,
            auth_secret: args.auth,
            show_loading_indicator: !args.no_loading_indicator,
            storage_path: args.storage.map(PathBuf::from),
            ephemeral: args.ephemeral,
            request_timeout: args.timeout_secs.map(Duration::from_secs),
            max_image_bytes: args.max_image_bytes,
            use_color: !args.no_color,
        }
    }
}
