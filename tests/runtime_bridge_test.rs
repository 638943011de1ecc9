//! Tasks round-trip through the runtime worker thread

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rightmenu::config::Messages;
use rightmenu::core::{NotifyLevel, Task};
use rightmenu::error::{ActionError, ActionResult};
use rightmenu::infrastructure::{
    Environment, Permission, RuntimeBridge, RuntimeEvent, TaskEvent,
};

#[derive(Default)]
struct MemoryEnvironment {
    clipboard: Mutex<String>,
}

#[async_trait::async_trait]
impl Environment for MemoryEnvironment {
    async fn write_clipboard(&self, text: &str) -> ActionResult<()> {
        *self.clipboard.lock().unwrap() = text.to_string();
        Ok(())
    }

    async fn write_clipboard_fallback(&self, _text: &str) -> ActionResult<()> {
        Err(ActionError::ClipboardUnavailable("none".into()))
    }

    async fn clipboard_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn read_clipboard(&self) -> ActionResult<String> {
        Ok(self.clipboard.lock().unwrap().clone())
    }

    async fn fetch(&self, url: &str) -> ActionResult<Vec<u8>> {
        Err(ActionError::Fetch {
            url: url.to_string(),
            reason: "offline".into(),
        })
    }

    async fn save_file(&self, name: &str, _bytes: &[u8]) -> ActionResult<PathBuf> {
        Ok(PathBuf::from(name))
    }
}

fn collect(bridge: &RuntimeBridge, count: usize) -> Vec<RuntimeEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while events.len() < count && Instant::now() < deadline {
        events.extend(bridge.poll_events());
        std::thread::sleep(Duration::from_millis(10));
    }
    events
}

#[test]
fn test_copy_then_paste_through_worker() {
    let env = Arc::new(MemoryEnvironment::default());
    let messages = Messages::default();
    let bridge = RuntimeBridge::new(env.clone(), messages.clone()).unwrap();

    bridge
        .run(Task::CopyText {
            text: "https://example.com/b".into(),
            success: messages.link_copied.clone(),
        })
        .unwrap();
    let events = collect(&bridge, 1);
    match &events[..] {
        [RuntimeEvent::Task(TaskEvent::Notify(notice))] => {
            assert_eq!(notice.text, messages.link_copied);
            assert_eq!(notice.level, NotifyLevel::Info);
        }
        other => panic!("unexpected events {other:?}"),
    }
    assert_eq!(*env.clipboard.lock().unwrap(), "https://example.com/b");
}

#[test]
fn test_failed_download_reports_error_notice() {
    let env = Arc::new(MemoryEnvironment::default());
    let messages = Messages::default();
    let bridge = RuntimeBridge::new(env, messages.clone()).unwrap();

    bridge
        .run(Task::DownloadImage {
            src: "https://example.com/x.png".into(),
            file_name: "x.png".into(),
        })
        .unwrap();
    let events = collect(&bridge, 1);
    assert!(matches!(
        &events[..],
        [RuntimeEvent::Task(TaskEvent::Notify(notice))]
            if notice.level == NotifyLevel::Error && notice.text == messages.download_failed
    ));
}
