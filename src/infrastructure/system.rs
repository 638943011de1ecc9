//! Environment backed by the real system clipboard, network and disk

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;

use crate::error::{ActionError, ActionResult};
use crate::infrastructure::environment::{Environment, Permission};

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

pub struct SystemEnvironment {
    http: reqwest::Client,
    download_dir: PathBuf,
}

impl SystemEnvironment {
    pub fn new(download_dir: PathBuf) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("rightmenu/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { http, download_dir }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

/// OSC 52 sequence asking the terminal to set its clipboard
pub fn osc52_sequence(text: &str) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{payload}\x07")
}

fn clipboard_error(err: arboard::Error) -> ActionError {
    ActionError::ClipboardUnavailable(err.to_string())
}

fn join_error(err: tokio::task::JoinError) -> ActionError {
    ActionError::ClipboardUnavailable(format!("clipboard task failed: {err}"))
}

/// First free path for `name` inside `dir`: `x.png`, `x (1).png`, ...
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
    (1..)
        .map(|n| match &extension {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(candidate)
}

#[async_trait::async_trait]
impl Environment for SystemEnvironment {
    async fn write_clipboard(&self, text: &str) -> ActionResult<()> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new().map_err(clipboard_error)?;
            clipboard.set_text(text).map_err(clipboard_error)
        })
        .await
        .map_err(join_error)?
    }

    async fn write_clipboard_fallback(&self, text: &str) -> ActionResult<()> {
        let sequence = osc52_sequence(text);
        tokio::task::spawn_blocking(move || -> ActionResult<()> {
            let mut stdout = std::io::stdout();
            stdout.write_all(sequence.as_bytes())?;
            stdout.flush()?;
            Ok(())
        })
        .await
        .map_err(join_error)?
    }

    async fn clipboard_permission(&self) -> Permission {
        let available = tokio::task::spawn_blocking(|| arboard::Clipboard::new().is_ok())
            .await
            .unwrap_or(false);
        if available {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    async fn read_clipboard(&self) -> ActionResult<String> {
        tokio::task::spawn_blocking(|| {
            let mut clipboard = arboard::Clipboard::new().map_err(clipboard_error)?;
            clipboard.get_text().map_err(clipboard_error)
        })
        .await
        .map_err(join_error)?
    }

    async fn fetch(&self, url: &str) -> ActionResult<Vec<u8>> {
        let parsed = url::Url::parse(url).map_err(|err| ActionError::Fetch {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        match parsed.scheme() {
            "file" => {
                let path = parsed.to_file_path().map_err(|_| ActionError::Fetch {
                    url: url.to_string(),
                    reason: "not a local path".to_string(),
                })?;
                Ok(tokio::fs::read(path).await?)
            }
            "http" | "https" => {
                let response = self.http.get(parsed).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
            scheme => Err(ActionError::Fetch {
                url: url.to_string(),
                reason: format!("unsupported scheme {scheme}"),
            }),
        }
    }

    async fn save_file(&self, name: &str, bytes: &[u8]) -> ActionResult<PathBuf> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = unique_path(&self.download_dir, name);
        tokio::fs::write(&path, bytes).await?;
        log::info!("saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
