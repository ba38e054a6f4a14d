use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, RwLock},
};

use crate::{
    Error, Expectation, Handler, Invocation, MemberId, Mock, Result, TypeDesc, Value,
    internal::{lock, read, write},
};

/// Per-mock routing state: registered expectations, the invocation log and
/// event subscriptions.
///
/// Both lists are append-only. Locks guard only the push or the snapshot
/// clone; matched behavior runs after every guard is released, so callbacks
/// may call back into the same mock.
#[derive(Default)]
pub(crate) struct Interceptor {
    expectations: RwLock<Vec<Arc<Expectation>>>,
    invocations: RwLock<Vec<Arc<Invocation>>>,
    handlers: Mutex<HashMap<Arc<str>, Vec<Handler>>>,
}

impl Interceptor {
    pub(crate) fn add_expectation(&self, expectation: Arc<Expectation>) {
        write(&self.expectations).push(expectation);
    }

    pub(crate) fn expectations(&self) -> Vec<Arc<Expectation>> {
        read(&self.expectations).clone()
    }

    pub(crate) fn invocations(&self) -> Vec<Arc<Invocation>> {
        read(&self.invocations).clone()
    }

    /// Most recently registered expectation accepting the call.
    fn find_match(&self, member: &MemberId, args: &[Value]) -> Option<Arc<Expectation>> {
        read(&self.expectations)
            .iter()
            .rev()
            .find(|e| e.matches(member, args))
            .cloned()
    }

    fn record(&self, invocation: Invocation) -> Arc<Invocation> {
        let invocation = Arc::new(invocation);
        write(&self.invocations).push(invocation.clone());
        invocation
    }

    /// Route one call from the substitute.
    pub(crate) fn intercept(
        &self,
        mock: &Mock,
        member: MemberId,
        returns: TypeDesc,
        args: Vec<Value>,
    ) -> Result<Value> {
        let matched = self.find_match(&member, &args);
        if let Some(expectation) = &matched {
            expectation.record_match();
        }
        let invocation = self.record(Invocation::new(member, args, matched.clone()));

        match matched {
            Some(expectation) => {
                tracing::trace!(
                    mock = %mock.id(),
                    call = %invocation,
                    setup = %expectation,
                    "call matched"
                );
                Self::execute(mock, &expectation, &invocation)
            }
            None => {
                tracing::trace!(mock = %mock.id(), call = %invocation, "call unmatched");
                if mock.config().behavior().is_strict() {
                    tracing::debug!(mock = %mock.id(), call = %invocation, "strict mock rejected call");
                    return Err(Error::UnmatchedStrictCall(invocation.to_string()));
                }
                if mock.config().call_base() && mock.has_base() {
                    return mock.call_base(invocation.member(), invocation.args());
                }
                mock.provide_default(invocation.member(), &returns)
            }
        }
    }

    /// Run a matched expectation's behavior: callbacks, then the configured
    /// error, then raised events, then the result.
    fn execute(mock: &Mock, expectation: &Expectation, invocation: &Invocation) -> Result<Value> {
        let behavior = expectation.behavior();
        let args = invocation.args();

        for callback in &behavior.callbacks {
            callback(args);
        }
        if let Some(throws) = &behavior.throws {
            return Err(throws(args));
        }
        for (event, event_args) in &behavior.raises {
            mock.raise(event, event_args(args))?;
        }
        if let Some(returns) = &behavior.returns {
            return Ok(returns(args));
        }
        if behavior.call_base {
            return mock.call_base(invocation.member(), args);
        }
        mock.provide_default(invocation.member(), expectation.returns())
    }

    pub(crate) fn subscribe(&self, event: Arc<str>, handler: Handler) {
        lock(&self.handlers).entry(event).or_default().push(handler);
    }

    /// Remove the most recent subscription of `handler`.
    pub(crate) fn unsubscribe(&self, event: &str, handler: &Handler) -> bool {
        let mut handlers = lock(&self.handlers);
        let Some(list) = handlers.get_mut(event) else {
            return false;
        };
        match list.iter().rposition(|h| h == handler) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Currently subscribed handlers, in subscription order.
    pub(crate) fn invocation_list(&self, event: &str) -> Vec<Handler> {
        lock(&self.handlers)
            .get(event)
            .cloned()
            .unwrap_or_default()
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("expectations.len()", &read(&self.expectations).len())
            .field("invocations.len()", &read(&self.invocations).len())
            .finish_non_exhaustive()
    }
}
