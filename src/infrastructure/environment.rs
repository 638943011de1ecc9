//! Host environment seen by asynchronous actions

use std::path::PathBuf;

use crate::error::ActionResult;

/// Answer of a clipboard-read permission query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    /// The user will be asked on first use
    Prompt,
    Denied,
}

impl Permission {
    pub fn allows_read(&self) -> bool {
        matches!(self, Permission::Granted | Permission::Prompt)
    }
}

/// Clipboard, network and file access used by the runtime worker
#[async_trait::async_trait]
pub trait Environment: Send + Sync + 'static {
    async fn write_clipboard(&self, text: &str) -> ActionResult<()>;

    /// Secondary copy path used when the clipboard write fails
    async fn write_clipboard_fallback(&self, text: &str) -> ActionResult<()>;

    async fn clipboard_permission(&self) -> Permission;

    async fn read_clipboard(&self) -> ActionResult<String>;

    /// Load a resource by URL
    async fn fetch(&self, url: &str) -> ActionResult<Vec<u8>>;

    /// Save a file under `name`; returns where it landed
    async fn save_file(&self, name: &str, bytes: &[u8]) -> ActionResult<PathBuf>;
}
