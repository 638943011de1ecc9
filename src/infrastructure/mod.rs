//! Infrastructure layer - side effects outside the page
//!
//! This layer contains:
//! - The `Environment` seam (clipboard, fetch, file save) and its system implementation
//! - Image re-encoding with the blind watermark
//! - Tokio runtime bridge for async operations

pub mod environment;
pub mod imaging;
pub mod runtime;
pub mod system;

pub use environment::{Environment, Permission};
pub use runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent, TaskEvent};
pub use system::SystemEnvironment;
