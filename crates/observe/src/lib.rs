//! Logging setup shared by the workspace binaries and tests.
pub mod config;
pub mod panic_hook;
pub mod tracing;

pub use config::Config;
