//! Shared utilities for the Agora workspace.

pub mod logging;

pub use logging::{init_logging, init_test_logging, LogFormat, LoggingError};
