pub mod config_loader;
pub mod fs_session_store;
pub mod paths;
pub mod prompt_source;
pub mod sweeper;

pub use crate::config_loader::{ConfigLoadError, ConfigLoader};
pub use crate::fs_session_store::FsSessionStore;
pub use crate::paths::SchulaufgabePaths;
pub use crate::prompt_source::{FilePromptSource, StaticPromptSource};
pub use crate::sweeper::ScratchSweeper;
