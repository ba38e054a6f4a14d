use std::fmt;

use uuid::Uuid;

/// Identity of one [`Mock`](crate::Mock), stable across its clones and the
/// back-reference held by its [`Substitute`](crate::Substitute).
///
/// Displays as the first eight hex digits, which is what log lines and
/// verification traversal need to tell the mocks of one test apart. The full
/// value is available through [`as_uuid`](Self::as_uuid).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MockId(u128);

impl MockId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().as_u128())
    }

    pub fn as_uuid(&self) -> Uuid {
        Uuid::from_u128(self.0)
    }

    /// Leading 32 bits, rendered as hex.
    pub fn short(&self) -> String {
        format!("{:08x}", (self.0 >> 96) as u32)
    }
}

impl fmt::Display for MockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

impl fmt::Debug for MockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MockId({})", self.as_uuid())
    }
}
