pub mod hover_engine;
pub mod hover_service;
pub mod launcher_state;
pub mod source_watcher;
pub mod timer;
mod r#trait;

pub use hover_service::{create_hover_service, HoverHandle};
pub use launcher_state::LauncherState;
pub use r#trait::LauncherService;
pub use source_watcher::SourceWatcher;
