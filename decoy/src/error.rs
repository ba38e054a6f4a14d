use std::sync::Arc;

use crate::VerificationError;

/// The single error type for all Decoy operations.
///
/// Every fallible Decoy API returns `decoy::Result<T>` (alias for
/// `Result<T, decoy::Error>`). Errors configured by a test through
/// [`Setup::throws`](crate::Setup::throws) travel as [`Error::Thrown`] and
/// reach the caller of the intercepted member untouched.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Invalid setup on '{member}': {reason}")]
    Configuration { member: String, reason: String },

    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),

    #[error("Strict mock received a call with no matching setup: {0}")]
    UnmatchedStrictCall(String),

    #[error("{0}")]
    Verification(Box<VerificationError>),

    #[error("Event '{event}' is not declared by '{capability}'")]
    UnassociatedEvent { event: String, capability: String },

    #[error("Cannot auto-mock through '{member}': {reason}")]
    NotSupportedChain { member: String, reason: String },

    #[error("{0}")]
    Thrown(#[source] Arc<dyn std::error::Error + Send + Sync>),

    #[error("Expected a value of type {expected}, found {found}")]
    ValueType {
        expected: &'static str,
        found: &'static str,
    },
}

impl Error {
    /// Wrap a user error so it can be configured as a thrown result.
    pub fn thrown(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Thrown(Arc::new(e))
    }

    pub(crate) fn configuration(member: impl ToString, reason: impl ToString) -> Self {
        Error::Configuration {
            member: member.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn not_supported_chain(member: impl ToString, reason: impl ToString) -> Self {
        Error::NotSupportedChain {
            member: member.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns the verification details if this is a verification failure.
    pub fn as_verification(&self) -> Option<&VerificationError> {
        match self {
            Error::Verification(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Configuration {
                    member: m1,
                    reason: r1,
                },
                Self::Configuration {
                    member: m2,
                    reason: r2,
                },
            ) => m1 == m2 && r1 == r2,
            (Self::UnsupportedCapability(a), Self::UnsupportedCapability(b)) => a == b,
            (Self::UnmatchedStrictCall(a), Self::UnmatchedStrictCall(b)) => a == b,
            (Self::Verification(a), Self::Verification(b)) => a == b,
            (
                Self::UnassociatedEvent {
                    event: e1,
                    capability: c1,
                },
                Self::UnassociatedEvent {
                    event: e2,
                    capability: c2,
                },
            ) => e1 == e2 && c1 == c2,
            (
                Self::NotSupportedChain {
                    member: m1,
                    reason: r1,
                },
                Self::NotSupportedChain {
                    member: m2,
                    reason: r2,
                },
            ) => m1 == m2 && r1 == r2,
            (Self::Thrown(a), Self::Thrown(b)) => Arc::ptr_eq(a, b),
            (
                Self::ValueType {
                    expected: e1,
                    found: f1,
                },
                Self::ValueType {
                    expected: e2,
                    found: f2,
                },
            ) => e1 == e2 && f1 == f2,
            _ => false,
        }
    }
}

impl Eq for Error {}

impl From<VerificationError> for Error {
    fn from(e: VerificationError) -> Self {
        Error::Verification(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn thrown_errors_compare_by_identity() {
        let a = Error::thrown(DiskFull);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Error::thrown(DiskFull));
    }

    #[test]
    fn thrown_error_displays_inner_message() {
        assert_eq!(Error::thrown(DiskFull).to_string(), "disk full");
    }

    #[test]
    fn configuration_message_names_member() {
        let e = Error::configuration("Account.Audit", "member is not overridable");
        assert_eq!(
            e.to_string(),
            "Invalid setup on 'Account.Audit': member is not overridable"
        );
    }
}
