use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    Error, Matcher, MemberId, Times, TypeDesc, Value, call::Segment, internal::lock,
};

pub(crate) type Producer = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;
pub(crate) type Thrower = Arc<dyn Fn(&[Value]) -> Error + Send + Sync>;
pub(crate) type Callback = Arc<dyn Fn(&[Value]) + Send + Sync>;
pub(crate) type EventArgs = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

/// Behavior pieces attached to an expectation after it is registered.
#[derive(Clone, Default)]
pub(crate) struct Behavior {
    pub(crate) returns: Option<Producer>,
    pub(crate) throws: Option<Thrower>,
    pub(crate) callbacks: Vec<Callback>,
    pub(crate) call_base: bool,
    pub(crate) raises: Vec<(Arc<str>, EventArgs)>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Verification {
    verifiable: bool,
    times: Option<Times>,
}

/// A registered call pattern together with its configured behavior.
///
/// Expectations are created by [`Mock::setup`](crate::Mock::setup) and live
/// for as long as their mock. The matched count only moves when a call is
/// dispatched to this expectation; verification scans the invocation log
/// instead and never touches it.
pub struct Expectation {
    member: MemberId,
    matchers: Vec<Matcher>,
    returns: TypeDesc,
    behavior: Mutex<Behavior>,
    verification: Mutex<Verification>,
    is_hop: bool,
    matched: AtomicUsize,
}

impl Expectation {
    pub(crate) fn new(member: MemberId, matchers: Vec<Matcher>, returns: TypeDesc) -> Self {
        Self {
            member,
            matchers,
            returns,
            behavior: Mutex::new(Behavior::default()),
            verification: Mutex::new(Verification::default()),
            is_hop: false,
            matched: AtomicUsize::new(0),
        }
    }

    /// An intermediate link of a fluent chain, answering with a child mock.
    pub(crate) fn hop(member: MemberId, matchers: Vec<Matcher>, returns: TypeDesc, child: Value) -> Self {
        let mut expectation = Self::new(member, matchers, returns);
        expectation.is_hop = true;
        expectation.update(|b| b.returns = Some(Arc::new(move |_| child.clone())));
        expectation
    }

    pub fn member(&self) -> &MemberId {
        &self.member
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Declared result type of the member this expectation answers.
    pub fn returns(&self) -> &TypeDesc {
        &self.returns
    }

    /// Returns true if `member` is this expectation's member and every
    /// matcher accepts the argument at its position.
    pub fn matches(&self, member: &MemberId, args: &[Value]) -> bool {
        self.member == *member && Matcher::all_match(&self.matchers, args)
    }

    /// Number of calls dispatched to this expectation.
    pub fn matched_count(&self) -> usize {
        self.matched.load(Ordering::Acquire)
    }

    pub fn is_verifiable(&self) -> bool {
        lock(&self.verification).verifiable
    }

    /// Count constraint given with [`Setup::verifiable_times`](crate::Setup::verifiable_times).
    pub fn times(&self) -> Option<Times> {
        lock(&self.verification).times
    }

    /// Returns true for the links a fluent setup registers on intermediate mocks.
    pub fn is_hop(&self) -> bool {
        self.is_hop
    }

    pub(crate) fn record_match(&self) {
        self.matched.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn behavior(&self) -> Behavior {
        lock(&self.behavior).clone()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut Behavior)) {
        f(&mut lock(&self.behavior));
    }

    pub(crate) fn mark_verifiable(&self, times: Option<Times>) {
        let mut verification = lock(&self.verification);
        verification.verifiable = true;
        if times.is_some() {
            verification.times = times;
        }
    }

    /// The constraint checked by aggregate verification.
    pub(crate) fn effective_times(&self) -> Times {
        self.times().unwrap_or_default()
    }

    /// Canonical rendering, e.g. `Calculator.Add(1, any)`.
    pub fn render(&self) -> String {
        Segment::render(&self.member, &self.matchers)
    }
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("call", &self.render())
            .field("matched", &self.matched_count())
            .field("times", &self.times())
            .field("is_hop", &self.is_hop)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Access;

    fn add() -> MemberId {
        MemberId::new("Calculator", "Add", Access::Call)
    }

    #[test]
    fn matches_checks_member_and_each_position() {
        let e = Expectation::new(add(), vec![Matcher::eq(1), Matcher::any()], TypeDesc::Int);
        assert!(e.matches(&add(), &[Value::from(1), Value::from(99)]));
        assert!(!e.matches(&add(), &[Value::from(2), Value::from(99)]));

        let other = MemberId::new("Calculator", "Sub", Access::Call);
        assert!(!e.matches(&other, &[Value::from(1), Value::from(99)]));
    }

    #[test]
    fn arity_mismatch_never_matches() {
        let e = Expectation::new(add(), vec![Matcher::any(), Matcher::any()], TypeDesc::Int);
        assert!(!e.matches(&add(), &[Value::from(1)]));
    }

    #[test]
    fn matching_does_not_count() {
        let e = Expectation::new(add(), vec![], TypeDesc::Int);
        assert!(e.matches(&add(), &[]));
        assert_eq!(e.matched_count(), 0);
        e.record_match();
        assert_eq!(e.matched_count(), 1);
    }

    #[test]
    fn verifiable_without_times_defaults_to_at_least_once() {
        let e = Expectation::new(add(), vec![], TypeDesc::Int);
        assert!(!e.is_verifiable());
        e.mark_verifiable(None);
        assert!(e.is_verifiable());
        assert_eq!(e.effective_times(), Times::at_least_once());

        e.mark_verifiable(Some(Times::exactly(2)));
        assert_eq!(e.effective_times(), Times::exactly(2));
    }

    #[test]
    fn hop_returns_child_value() {
        let e = Expectation::hop(add(), vec![], TypeDesc::Int, Value::from(5));
        assert!(e.is_hop());
        let returns = e.behavior().returns.expect("hop must answer");
        assert_eq!(returns(&[]), Value::from(5));
    }
}
