//! Utility functions and helpers

pub mod cmd;
pub mod retry;

pub use cmd::log_cmd;
pub use retry::{retry_with_backoff, RetryOptions};
