//! Common result and error types for the Tessel toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in Tessel), not a
/// user-facing error. Problems with the user's architecture or layout are
/// reported through each crate's own error type or as diagnostics.
pub type TesselResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in Tessel, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("node table overrun");
        assert_eq!(format!("{err}"), "internal error: node table overrun");
    }

    #[test]
    fn err_path() {
        let r: TesselResult<i32> = Err(InternalError::new("test error"));
        let err = r.err().unwrap();
        assert_eq!(err.message, "test error");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
