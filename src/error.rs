//! Typed errors for the asynchronous actions.
//!
//! Every variant is recovered locally: the runtime turns it into a notice and
//! the menu never propagates it to the host page.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    /// The environment refused clipboard access.
    #[error("clipboard permission denied")]
    PermissionDenied,

    /// No clipboard could be reached at all.
    #[error("clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    /// The resource could not be loaded.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The image bytes could not be decoded or re-encoded.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type ActionResult<T> = std::result::Result<T, ActionError>;
