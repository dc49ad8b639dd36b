use thiserror::Error;

/// Rejection of a malformed [`ProjectionInput`](super::ProjectionInput).
///
/// Raised before any computation starts. Numeric trouble inside the solvers
/// (log of a non-positive ratio, zero rate with zero payment) is not an error;
/// it comes back as a "never reached" value in the result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("invalid input `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl ProjectionError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidInput { field, .. } => field,
        }
    }
}
