//! Operation logging macros
//!
//! Document operations log a `start` event on entry and exactly one of
//! `end` / `end_error` on exit. The exit macros take the `Instant` captured
//! at entry and record `duration_ms` themselves.
//!
//! All paths go through `$crate`, so callers need neither `tracing` nor
//! `doctrack-core-types` in scope.

use std::time::Instant;

/// Whole milliseconds since `start`, saturating at `u64::MAX`
#[doc(hidden)]
pub fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Log the start of a document operation
///
/// ```
/// # use doctrack_core::log_op_start;
/// log_op_start!("post_persist", document_id = "d1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::EVENT_START,
            $($($field)*)?
        )
    };
}

/// Log the successful end of a document operation
///
/// ```
/// # use doctrack_core::log_op_end;
/// let start = std::time::Instant::now();
/// log_op_end!("build_setters", since = start, setters_len = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, since = $start:expr $(, $($field:tt)*)?) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::EVENT_END,
            duration_ms = $crate::logging_facility::macros::elapsed_ms($start),
            $($($field)*)?
        )
    };
}

/// Log the failed end of a document operation
///
/// `$err` is anything convertible into [`ExError`](crate::errors::ExError);
/// the event carries its kind and stable code.
///
/// ```
/// # use doctrack_core::{log_op_error, errors::DocTrackError};
/// let start = std::time::Instant::now();
/// let err = DocTrackError::IncompatibleResizableValues {
///     attribute: "tags".to_string(),
///     reason: "new value is not an array".to_string(),
/// };
/// log_op_error!("build_setters", err, since = start, document_id = "d1");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, since = $start:expr $(, $($field:tt)*)?) => {{
        let ex_err = $crate::errors::ExError::from($err);
        $crate::__private::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::EVENT_END_ERROR,
            duration_ms = $crate::logging_facility::macros::elapsed_ms($start),
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            $($($field)*)?
        )
    }};
}
