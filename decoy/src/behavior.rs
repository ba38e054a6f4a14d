use std::fmt;

/// What a mock does with a call no setup matches.
///
/// | Behavior | Unmatched call |
/// |----------|----------------|
/// | [`Loose`](Self::Loose) | Answered by the mock's [`DefaultValue`](crate::DefaultValue) strategy |
/// | [`Strict`](Self::Strict) | Fails with [`Error::UnmatchedStrictCall`](crate::Error::UnmatchedStrictCall) |
///
/// # Default
///
/// The default is `Loose`: tests only configure the calls they care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Behavior {
    /// Every call must match a setup, including unit-returning ones and
    /// property writes.
    Strict,

    /// Unmatched calls succeed with a default value.
    #[default]
    Loose,
}

impl Behavior {
    /// Returns `true` if this is [`Strict`](Self::Strict).
    pub fn is_strict(&self) -> bool {
        matches!(self, Behavior::Strict)
    }

    /// Returns `true` if this is [`Loose`](Self::Loose).
    pub fn is_loose(&self) -> bool {
        matches!(self, Behavior::Loose)
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Strict => write!(f, "Strict"),
            Behavior::Loose => write!(f, "Loose"),
        }
    }
}
