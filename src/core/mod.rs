pub mod action;
pub mod binding;
pub mod context;
pub mod group;
pub mod task;

pub use action::{ActionId, Invocation, Notice, NoticePosition, NotifyLevel};
pub use binding::ActionBinding;
pub use context::{file_name_from_url, TargetContext};
pub use group::ActionGroup;
pub use task::Task;
