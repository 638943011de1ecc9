//! Asynchronous side effects requested by actions

use crate::page::ElementRef;

/// Work an action hands to the runtime worker.
///
/// A task owns everything it needs, so a later activation never changes what
/// an in-flight task operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Write text to the clipboard and announce `success`
    CopyText { text: String, success: String },
    /// Read the clipboard into a field
    Paste { field: ElementRef },
    /// Fetch, watermark and save an image
    DownloadImage { src: String, file_name: String },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::CopyText { .. } => "copy-text",
            Task::Paste { .. } => "paste",
            Task::DownloadImage { .. } => "download-image",
        }
    }
}
