//! Counting logged invocations against [`Times`] policies.

use std::{collections::HashSet, fmt, panic::Location};

use crate::{
    Call, Error, Expectation, Matcher, Mock, MockId, Result, Times,
    call::Segment,
    chain::{self, Cursor},
};

/// A registered setup and the number of calls it answered, as listed in
/// verification diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    call: String,
    times: Option<Times>,
    matched: usize,
}

impl SetupReport {
    fn new(expectation: &Expectation, times: Option<Times>) -> Self {
        Self {
            call: expectation.render(),
            times,
            matched: expectation.matched_count(),
        }
    }

    /// Canonical rendering of the setup's call pattern.
    pub fn call(&self) -> &str {
        &self.call
    }

    pub fn times(&self) -> Option<Times> {
        self.times
    }

    pub fn matched(&self) -> usize {
        self.matched
    }
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.times {
            Some(times) => write!(
                f,
                "{} (expected {times}, matched {} times)",
                self.call, self.matched
            ),
            None => write!(f, "{} (matched {} times)", self.call, self.matched),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    /// A single verified call pattern fell outside its range.
    Call {
        expected: String,
        times: Times,
        actual: usize,
        setups: Vec<SetupReport>,
    },
    /// Aggregate verification found setups outside their ranges.
    Unmet(Vec<SetupReport>),
}

/// Details of a failed verification.
///
/// The reported location is the test's own `verify*` call, never a frame
/// inside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationError {
    location: &'static Location<'static>,
    message: Option<String>,
    failure: Failure,
}

impl VerificationError {
    /// Where the failing verification was requested.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Message supplied by the test, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Canonical rendering of the verified call, for single-call failures.
    pub fn expected_call(&self) -> Option<&str> {
        match &self.failure {
            Failure::Call { expected, .. } => Some(expected),
            Failure::Unmet(_) => None,
        }
    }

    /// Observed count, for single-call failures.
    pub fn actual(&self) -> Option<usize> {
        match &self.failure {
            Failure::Call { actual, .. } => Some(*actual),
            Failure::Unmet(_) => None,
        }
    }

    pub fn times(&self) -> Option<Times> {
        match &self.failure {
            Failure::Call { times, .. } => Some(*times),
            Failure::Unmet(_) => None,
        }
    }

    /// For single-call failures, every setup registered for the same member;
    /// for aggregate failures, the setups that were not satisfied.
    pub fn setups(&self) -> &[SetupReport] {
        match &self.failure {
            Failure::Call { setups, .. } | Failure::Unmet(setups) => setups,
        }
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            writeln!(f, "{message}")?;
        }
        match &self.failure {
            Failure::Call {
                expected,
                times,
                actual,
                setups,
            } => {
                writeln!(
                    f,
                    "Expected invocation on the mock {times}, but was {actual} times: {expected}"
                )?;
                if setups.is_empty() {
                    write!(f, "No setups configured.")?;
                } else {
                    write!(f, "Configured setups:")?;
                    for setup in setups {
                        write!(f, "\n  {setup}")?;
                    }
                }
            }
            Failure::Unmet(setups) => {
                write!(f, "The following setups were not matched as expected:")?;
                for setup in setups {
                    write!(f, "\n  {setup}")?;
                }
            }
        }
        write!(f, "\n  at {}", self.location)
    }
}

/// Count the calls in the resolved log that `call` matches and compare the
/// count against `times`.
pub(crate) fn verify_call(
    mock: &Mock,
    call: &Call,
    times: Times,
    message: Option<String>,
    location: &'static Location<'static>,
) -> Result {
    let (cursor, id, _) = chain::resolve_target(mock, call)?;
    let matchers = call.target().matchers();

    let (actual, setups) = match &cursor {
        Cursor::Live(target) => {
            let actual = target
                .invocations()
                .iter()
                .filter(|inv| *inv.member() == id && Matcher::all_match(matchers, inv.args()))
                .count();
            let setups = target
                .setups()
                .iter()
                .filter(|e| *e.member() == id)
                .map(|e| SetupReport::new(e, e.times()))
                .collect();
            (actual, setups)
        }
        Cursor::Absent(_) => (0, Vec::new()),
    };

    if times.is_satisfied_by(actual) {
        return Ok(());
    }
    let error = VerificationError {
        location,
        message,
        failure: Failure::Call {
            expected: Segment::render(&id, matchers),
            times,
            actual,
            setups,
        },
    };
    tracing::debug!(mock = %mock.id(), error = %error, "verification failed");
    Err(error.into())
}

/// Check the counters of every selected setup on `mock` and, recursively,
/// on its auto-created children.
pub(crate) fn verify_setups(
    mock: &Mock,
    only_verifiable: bool,
    location: &'static Location<'static>,
) -> Result {
    let mut unmet = Vec::new();
    let mut visited = HashSet::new();
    collect_unmet(mock, only_verifiable, &mut visited, &mut unmet);

    if unmet.is_empty() {
        return Ok(());
    }
    let error = VerificationError {
        location,
        message: None,
        failure: Failure::Unmet(unmet),
    };
    tracing::debug!(mock = %mock.id(), error = %error, "verification failed");
    Err(Error::from(error))
}

fn collect_unmet(
    mock: &Mock,
    only_verifiable: bool,
    visited: &mut HashSet<MockId>,
    unmet: &mut Vec<SetupReport>,
) {
    if !visited.insert(mock.id()) {
        return;
    }
    for expectation in mock.setups() {
        if expectation.is_hop() || (only_verifiable && !expectation.is_verifiable()) {
            continue;
        }
        let times = expectation.effective_times();
        if !times.is_satisfied_by(expectation.matched_count()) {
            unmet.push(SetupReport::new(&expectation, Some(times)));
        }
    }
    for child in mock.inner_mocks() {
        collect_unmet(&child, only_verifiable, visited, unmet);
    }
}
