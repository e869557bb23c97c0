//! Domain types and collaborator seams for the worksheet pipeline.
//!
//! Nothing in this crate performs I/O. Filesystem, HTTP and process
//! implementations live in the infrastructure and interaction crates.

pub mod compiler;
pub mod config;
pub mod error;
pub mod inference;
pub mod markup;
pub mod observer;
pub mod session;
pub mod store;

// Re-export common error type
pub use error::{PipelineError, Result};
pub use session::{Artifact, SessionId};
