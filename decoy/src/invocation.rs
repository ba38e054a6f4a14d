use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{Expectation, MemberId, Value, call::Accessor};

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// An immutable record of one call observed by a substitute.
///
/// Sequence numbers are global, so invocations on different mocks can be
/// ordered against each other.
#[derive(Debug, Clone)]
pub struct Invocation {
    sequence: u64,
    member: MemberId,
    args: Vec<Value>,
    matched: Option<Arc<Expectation>>,
}

impl Invocation {
    pub(crate) fn new(member: MemberId, args: Vec<Value>, matched: Option<Arc<Expectation>>) -> Self {
        Self {
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            member,
            args,
            matched,
        }
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn member(&self) -> &MemberId {
        &self.member
    }

    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The setup that answered this call, if any.
    pub fn matched(&self) -> Option<&Expectation> {
        self.matched.as_deref()
    }

    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.member, Accessor(self.member.access(), &self.args))
    }
}
