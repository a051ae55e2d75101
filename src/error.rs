//! Stable error codes shared by every error type in the crate.
//!
//! Hosts map these to user-facing messages (toasts) without matching on
//! `Display` text.

/// Stable machine-readable code for an error value.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for crate::doc::EditError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_ENTITY_NOT_FOUND",
            Self::ImmutableField(_) => "E_IMMUTABLE_FIELD",
            Self::Invalid(_) => "E_INVALID_EDIT",
        }
    }
}
