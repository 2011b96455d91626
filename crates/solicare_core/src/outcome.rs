//! crates/solicare_core/src/outcome.rs
//!
//! The uniform result shape returned by every public service method: a status
//! drawn from a shared taxonomy, an optional payload and the error that caused a
//! failure, if any. Feature-specific statuses are plain `Status` constants.

use crate::ports::{PortError, PortResult};

/// The category a status belongs to. The web layer derives the HTTP status from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Success,
    Created,
    NotFound,
    Conflict,
    Denied,
    Unauthorized,
    Invalid,
    NotImplemented,
    Unavailable,
    Internal,
}

impl StatusKind {
    pub fn is_success(&self) -> bool {
        matches!(self, StatusKind::Success | StatusKind::Created)
    }
}

/// A feature-specific outcome: category, stable code and a human readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status {
    pub kind: StatusKind,
    pub code: &'static str,
    pub message: &'static str,
}

impl Status {
    pub const fn new(kind: StatusKind, code: &'static str, message: &'static str) -> Self {
        Self {
            kind,
            code,
            message,
        }
    }
}

pub const SUCCESS: Status = Status::new(
    StatusKind::Success,
    "COMMON200",
    "The request completed successfully.",
);
pub const NOT_FOUND: Status = Status::new(
    StatusKind::NotFound,
    "COMMON404",
    "The requested resource could not be found.",
);
pub const ERROR: Status = Status::new(
    StatusKind::Internal,
    "COMMON500",
    "An error occurred while processing the request.",
);

/// What a service method hands back to its caller.
#[derive(Debug)]
pub struct Outcome<T> {
    pub status: Status,
    pub payload: Option<T>,
    pub error: Option<PortError>,
}

impl<T> Outcome<T> {
    /// An outcome carrying a payload.
    pub fn with(status: Status, payload: T) -> Self {
        Self {
            status,
            payload: Some(payload),
            error: None,
        }
    }

    /// An outcome without a payload.
    pub fn of(status: Status) -> Self {
        Self {
            status,
            payload: None,
            error: None,
        }
    }

    /// An outcome that records the error behind it.
    pub fn failed(status: Status, error: PortError) -> Self {
        Self {
            status,
            payload: None,
            error: Some(error),
        }
    }

    /// Collapses a fallible service body into an outcome; errors become `on_error`.
    pub fn settle(result: PortResult<Outcome<T>>, on_error: Status) -> Self {
        result.unwrap_or_else(|e| Outcome::failed(on_error, e))
    }

    pub fn is_success(&self) -> bool {
        self.status.kind.is_success()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            status: self.status,
            payload: self.payload.map(f),
            error: self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_keeps_ok_outcomes_and_wraps_errors() {
        let ok: Outcome<u8> = Outcome::settle(Ok(Outcome::with(SUCCESS, 7)), ERROR);
        assert_eq!(ok.status, SUCCESS);
        assert_eq!(ok.payload, Some(7));

        let failed: Outcome<u8> =
            Outcome::settle(Err(PortError::Unexpected("db down".into())), ERROR);
        assert_eq!(failed.status, ERROR);
        assert!(!failed.is_success());
        assert_eq!(failed.error, Some(PortError::Unexpected("db down".into())));
    }

    #[test]
    fn map_preserves_status_and_error() {
        let outcome = Outcome::with(SUCCESS, 2).map(|n| n * 10);
        assert_eq!(outcome.payload, Some(20));
        assert!(outcome.is_success());
    }
}
