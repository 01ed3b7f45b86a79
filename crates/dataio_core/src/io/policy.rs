//! Write-failure policy and cancellation signalling.
//!
//! # Invariants
//! - Only [`DataError::is_write_failure`] errors can be downgraded to `false`.
//! - Cancellation tokens are an output signal; nothing here reads them.

use crate::io::error::{DataError, DataResult};
use log::warn;
use tokio_util::sync::CancellationToken;

/// How a writer reports medium-level write failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return the typed error to the caller.
    #[default]
    Propagate,
    /// Log the error and report `Ok(false)`.
    ReportFalse,
}

impl ErrorPolicy {
    /// Converts the outcome of one write call into the caller-facing result.
    pub fn settle(self, source: &str, outcome: DataResult<()>) -> DataResult<bool> {
        match outcome {
            Ok(()) => Ok(true),
            Err(err) if self == Self::ReportFalse && err.is_write_failure() => {
                warn!(
                    "event=write_failed module=io status=reported_false source={} error_code={} error={}",
                    source,
                    err.code(),
                    err
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

/// Cancels `cancel` when `result` is an error, then hands the result back.
pub fn cancel_on_error<T>(
    result: DataResult<T>,
    cancel: Option<&CancellationToken>,
) -> DataResult<T> {
    if result.is_err() {
        if let Some(token) = cancel {
            token.cancel();
        }
    }
    result
}

/// Like [`cancel_on_error`], but also treats `Ok(false)` as a failure.
pub fn cancel_on_failure(
    result: DataResult<bool>,
    cancel: Option<&CancellationToken>,
) -> DataResult<bool> {
    if matches!(result, Ok(false)) {
        if let Some(token) = cancel {
            token.cancel();
        }
        return result;
    }
    cancel_on_error(result, cancel)
}

pub(crate) fn join_error(err: tokio::task::JoinError) -> DataError {
    DataError::Task(err.to_string())
}
