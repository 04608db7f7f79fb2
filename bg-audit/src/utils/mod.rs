//! Utility modules for bg-audit

pub mod http_retry;

pub use http_retry::{is_transient_status, retry_transient, RetryPolicy, Transient};
