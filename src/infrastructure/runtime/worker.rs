//! Async worker - runs in the Tokio runtime and executes tasks

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::interval;

use crate::config::Messages;
use crate::core::{Notice, NoticePosition, Task};
use crate::error::{ActionError, ActionResult};
use crate::infrastructure::environment::Environment;
use crate::infrastructure::imaging::{png_file_name, watermark_png};
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent, TaskEvent};
use crate::page::ElementRef;

/// How often the worker checks for new commands
const COMMAND_POLL: Duration = Duration::from_millis(25);

/// Run the async worker loop
pub async fn run_async_worker(
    env: Arc<dyn Environment>,
    messages: Messages,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let messages = Arc::new(messages);
    let mut poll_interval = interval(COMMAND_POLL);

    loop {
        // Process commands (non-blocking)
        loop {
            match cmd_rx.try_recv() {
                Ok(RuntimeCommand::Shutdown) | Err(TryRecvError::Disconnected) => return Ok(()),
                Ok(RuntimeCommand::Run(task)) => {
                    let env = Arc::clone(&env);
                    let messages = Arc::clone(&messages);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        for event in run_task(task, env.as_ref(), &messages).await {
                            let _ = evt_tx.send(RuntimeEvent::Task(event));
                        }
                    });
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        poll_interval.tick().await;
    }
}

/// Execute one task. Success and failure both yield at least one notice.
pub async fn run_task(task: Task, env: &dyn Environment, messages: &Messages) -> Vec<TaskEvent> {
    match task {
        Task::CopyText { text, success } => vec![copy_text(env, &text, success, messages).await],
        Task::Paste { field } => paste(env, field, messages).await,
        Task::DownloadImage { src, file_name } => {
            vec![download_image(env, &src, &file_name, messages).await]
        }
    }
}

async fn copy_text(
    env: &dyn Environment,
    text: &str,
    success: String,
    messages: &Messages,
) -> TaskEvent {
    let notice = Notice::info(success).at(NoticePosition::TopRight);
    match env.write_clipboard(text).await {
        Ok(()) => TaskEvent::Notify(notice),
        Err(err) => {
            log::warn!("clipboard write failed, using fallback: {err}");
            match env.write_clipboard_fallback(text).await {
                Ok(()) => TaskEvent::Notify(notice),
                Err(err) => {
                    log::warn!("fallback copy failed: {err}");
                    TaskEvent::Notify(Notice::error(&messages.copy_failed))
                }
            }
        }
    }
}

async fn paste(env: &dyn Environment, field: ElementRef, messages: &Messages) -> Vec<TaskEvent> {
    let permission_notice =
        || TaskEvent::Notify(Notice::warn(&messages.paste_permission).at(NoticePosition::TopCenter));

    if !env.clipboard_permission().await.allows_read() {
        return vec![permission_notice()];
    }
    match env.read_clipboard().await {
        Ok(text) if text.is_empty() => {
            vec![TaskEvent::Notify(Notice::info(&messages.nothing_to_paste))]
        }
        Ok(text) => vec![TaskEvent::InsertText { field, text }],
        Err(ActionError::PermissionDenied) => vec![permission_notice()],
        Err(err) => {
            log::warn!("paste failed: {err}");
            vec![TaskEvent::Notify(Notice::error(&messages.paste_failed))]
        }
    }
}

async fn download_image(
    env: &dyn Environment,
    src: &str,
    file_name: &str,
    messages: &Messages,
) -> TaskEvent {
    match save_watermarked(env, src, file_name).await {
        Ok(path) => {
            log::info!("image {src} saved to {}", path.display());
            TaskEvent::Notify(Notice::info(&messages.download_done))
        }
        Err(err) => {
            log::warn!("image download failed: {err}");
            TaskEvent::Notify(Notice::error(&messages.download_failed))
        }
    }
}

async fn save_watermarked(
    env: &dyn Environment,
    src: &str,
    file_name: &str,
) -> ActionResult<PathBuf> {
    let bytes = env.fetch(src).await?;
    let png = watermark_png(&bytes)?;
    env.save_file(&png_file_name(file_name), &png).await
}
