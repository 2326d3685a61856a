//! Structured logging for the upload gateway.
//!
//! Handles subscriber setup (console or JSON, optional rolling file output)
//! and credential redaction for connection strings.

pub mod logger;
pub mod redact;

pub use logger::{init_logger, LogFormat, LogOptions};
pub use redact::redact_uri_credentials;
