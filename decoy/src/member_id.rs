use std::{fmt, hash::Hash, sync::Arc};

/// How a member is reached: invoked as a method, read, or written.
///
/// A property contributes two distinct identities, one per accessor, so a
/// setup on `Total` (get) never answers an assignment to `Total` (set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    Call,
    Get,
    Set,
}

impl Access {
    /// Returns `true` for method invocations.
    pub fn is_call(&self) -> bool {
        matches!(self, Access::Call)
    }

    /// Returns `true` for property reads.
    pub fn is_get(&self) -> bool {
        matches!(self, Access::Get)
    }

    /// Returns `true` for property writes.
    pub fn is_set(&self) -> bool {
        matches!(self, Access::Set)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Call => write!(f, "call"),
            Access::Get => write!(f, "get"),
            Access::Set => write!(f, "set"),
        }
    }
}

/// Identity of an intercepted member.
///
/// `MemberId` is cheap to clone. Equality compares the owning capability,
/// the member name and the [`Access`] kind, with a fast path when both ids
/// share the same allocations.
///
/// ```rust
/// use decoy::{Access, MemberId};
///
/// let add = MemberId::new("Calculator", "Add", Access::Call);
/// assert_eq!(add.to_string(), "Calculator.Add");
/// assert!(add.access().is_call());
/// ```
#[derive(Debug, Clone, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemberId {
    capability: Arc<str>,
    name: Arc<str>,
    access: Access,
}

impl MemberId {
    pub fn new(capability: &str, name: &str, access: Access) -> Self {
        Self {
            capability: Arc::from(capability),
            name: Arc::from(name),
            access,
        }
    }

    pub(crate) fn from_parts(capability: Arc<str>, name: Arc<str>, access: Access) -> Self {
        Self {
            capability,
            name,
            access,
        }
    }

    /// Name of the capability that declares this member.
    #[inline]
    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// Member name as declared.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn access(&self) -> Access {
        self.access
    }
}

impl PartialEq for MemberId {
    fn eq(&self, other: &Self) -> bool {
        self.access == other.access
            && (Arc::ptr_eq(&self.name, &other.name) || self.name == other.name)
            && (Arc::ptr_eq(&self.capability, &other.capability)
                || self.capability == other.capability)
    }
}

impl Eq for MemberId {}

impl Hash for MemberId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.capability.hash(state);
        self.name.hash(state);
        self.access.hash(state);
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.capability, self.name)
    }
}
