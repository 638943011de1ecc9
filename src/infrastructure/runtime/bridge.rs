//! Runtime bridge - connects the sync TUI thread with the async Tokio runtime
//!
//! Actions that need the clipboard, the network or the disk are sent to a
//! worker thread running its own runtime; their results come back as events
//! the UI drains on every tick.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::config::Messages;
use crate::core::{Notice, Task};
use crate::infrastructure::environment::Environment;
use crate::infrastructure::runtime::worker::run_async_worker;
use crate::page::ElementRef;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Run a task; tasks run concurrently
    Run(Task),
    /// Shutdown the worker
    Shutdown,
}

/// Page updates produced by a finished task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Notify(Notice),
    /// Clipboard text to insert at the field's caret. The page reports
    /// success or failure once it knows whether the field still exists.
    InsertText { field: ElementRef, text: String },
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Task(TaskEvent),
    /// Error occurred
    Error { message: String },
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    pub fn new(env: Arc<dyn Environment>, messages: Messages) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        // Spawn the worker thread with its own Tokio runtime
        thread::Builder::new()
            .name("rightmenu-runtime".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(err) => {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Failed to create Tokio runtime: {err}"),
                        });
                        return;
                    }
                };
                rt.block_on(async {
                    if let Err(err) = run_async_worker(env, messages, cmd_rx, evt_tx.clone()).await
                    {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    pub fn run(&self, task: Task) -> anyhow::Result<()> {
        log::debug!("queue task {}", task.name());
        self.send(RuntimeCommand::Run(task))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
