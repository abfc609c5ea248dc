//! Structured logging for document operations
//!
//! `post_persist` and `build_setters` are bracketed by `log_op_start!` and
//! `log_op_end!` / `log_op_error!`, keyed by `op` and `document_id`. Tracker
//! internals (flag, reset, rotate, unset) log at `debug`/`trace` with the
//! attribute or storage key they touched.
//!
//! A host application installs a subscriber once:
//!
//! ```rust
//! use doctrack_core::logging_facility::{init, Profile};
//!
//! init(Profile::Production);
//! ```
//!
//! or through [`EngineConfig::init_logging`](crate::config::EngineConfig::init_logging).
//! Tests use [`init_test_capture`] and filter captured events by `op`.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
