//! Application layer for Schulaufgabe.
//!
//! This crate provides the use case that coordinates the session store, the
//! inference client and the compiler to turn an uploaded worksheet photo into
//! a PDF.

pub mod session_pipeline;

pub use session_pipeline::SessionPipeline;
