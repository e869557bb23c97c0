//! External collaborators: the Gemini inference API and the tectonic compiler.

pub mod compiler_pool;
pub mod gemini_client;
pub mod mock;
pub mod tectonic;

pub use compiler_pool::CompilerPool;
pub use gemini_client::GeminiInferenceClient;
pub use mock::{MockCompiler, MockInferenceClient};
pub use tectonic::TectonicCompiler;
