//! Structured logging for DevHelper.
//!
//! Console plus rolling-file output, log redaction, and a listener that
//! records every bot state transition.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{StateEventLogger, StateLogEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
