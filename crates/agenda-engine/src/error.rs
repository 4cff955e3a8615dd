//! Error types for agenda-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgendaError {
    /// Malformed input: bad padding, empty or non-positive slot sizes,
    /// an inverted window handed straight to the resolver, bad pagination.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller referenced something it does not own.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invite {id} has expired")]
    Expired { id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// The persistence collaborator failed; safe for the caller to retry.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AgendaError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Translate into what an unauthenticated invite viewer is allowed to see.
    ///
    /// Missing and expired invites collapse into the same
    /// [`PublicError::Unavailable`] so a viewer cannot probe which invites exist.
    pub fn public(&self) -> PublicError {
        match self {
            Self::NotFound { .. } | Self::Expired { .. } => PublicError::Unavailable,
            Self::Validation(msg) => PublicError::BadRequest(msg.clone()),
            _ => PublicError::Internal,
        }
    }
}

/// Errors as they appear outside the service boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublicError {
    #[error("invite not available")]
    Unavailable,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AgendaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_expired_look_identical_from_outside() {
        let missing = AgendaError::not_found("invite", "abc");
        let expired = AgendaError::Expired { id: "abc".into() };
        assert_eq!(missing.public(), expired.public());
        assert_eq!(missing.public().to_string(), "invite not available");
    }

    #[test]
    fn validation_detail_survives_translation() {
        let err = AgendaError::Validation("slot sizes must not be empty".into());
        assert_eq!(
            err.public(),
            PublicError::BadRequest("slot sizes must not be empty".into())
        );
    }

    #[test]
    fn authorization_failures_are_opaque() {
        let err = AgendaError::Unauthorized("source".into());
        assert_eq!(err.public(), PublicError::Internal);
    }
}
