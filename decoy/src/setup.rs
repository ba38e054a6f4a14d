use std::sync::Arc;

use crate::{Error, Expectation, Mock, Times, Value};

/// Builder for the behavior of a registered setup.
///
/// Returned by [`Mock::setup`]. The expectation is already active when the
/// builder is handed out; each method attaches one more piece of behavior to
/// it and returns the builder, so configuration reads as one chain.
///
/// When a matching call arrives the pieces run in a fixed order: callbacks,
/// then the configured error, then raised events, then the result (a return
/// value, the base implementation, or the mock's default).
///
/// ```rust
/// use decoy::{Call, Capability, Mock, TypeDesc, args};
///
/// # fn main() -> decoy::Result {
/// let counter = Capability::interface("Counter").method("Next", [], TypeDesc::Int);
/// let mock = Mock::loose(counter);
///
/// let calls = std::sync::Arc::new(std::sync::atomic::AtomicI64::new(0));
/// let seen = calls.clone();
/// mock.setup(Call::method("Next"))?
///     .returns_with(move |_| (seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1).into())
///     .verifiable();
///
/// let counter = mock.object();
/// assert_eq!(counter.call_as::<i64>("Next", args![])?, 1);
/// assert_eq!(counter.call_as::<i64>("Next", args![])?, 2);
/// mock.verify()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Setup {
    mock: Mock,
    expectation: Arc<Expectation>,
}

impl Setup {
    pub(crate) fn new(mock: Mock, expectation: Arc<Expectation>) -> Self {
        Self { mock, expectation }
    }

    /// Answer matching calls with `value`.
    pub fn returns(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.expectation
            .update(|b| b.returns = Some(Arc::new(move |_| value.clone())));
        self
    }

    /// Answer matching calls with a value computed from their arguments.
    pub fn returns_with<F>(self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.expectation.update(|b| b.returns = Some(Arc::new(f)));
        self
    }

    /// Fail matching calls with `error`. Every failure carries the same
    /// [`Error::Thrown`] instance.
    pub fn throws(self, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        let error = Error::thrown(error);
        self.expectation
            .update(|b| b.throws = Some(Arc::new(move |_| error.clone())));
        self
    }

    /// Fail matching calls with an error built from their arguments.
    pub fn throws_with<F>(self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Error + Send + Sync + 'static,
    {
        self.expectation.update(|b| b.throws = Some(Arc::new(f)));
        self
    }

    /// Run `f` with the arguments of every matching call. Callbacks run in
    /// registration order, before anything else.
    pub fn callback<F>(self, f: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.expectation.update(|b| b.callbacks.push(Arc::new(f)));
        self
    }

    /// Answer matching calls from the mock's base implementation.
    pub fn call_base(self) -> Self {
        self.expectation.update(|b| b.call_base = true);
        self
    }

    /// Raise `event` with fixed arguments on every matching call.
    ///
    /// The event is checked against the mock's capabilities when the call
    /// arrives; an undeclared event fails that call with
    /// [`Error::UnassociatedEvent`].
    pub fn raises(self, event: &str, args: Vec<Value>) -> Self {
        self.raises_with(event, move |_| args.clone())
    }

    /// Raise `event` with arguments computed from the matching call's arguments.
    pub fn raises_with<F>(self, event: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
    {
        let event: Arc<str> = Arc::from(event);
        self.expectation
            .update(|b| b.raises.push((event, Arc::new(f))));
        self
    }

    /// Include this setup in [`Mock::verify`], which then requires at least
    /// one matching call.
    pub fn verifiable(self) -> Self {
        self.expectation.mark_verifiable(None);
        self
    }

    /// Include this setup in [`Mock::verify`] with an explicit count.
    pub fn verifiable_times(self, times: impl Into<Times>) -> Self {
        self.expectation.mark_verifiable(Some(times.into()));
        self
    }

    /// The registered expectation.
    pub fn expectation(&self) -> &Arc<Expectation> {
        &self.expectation
    }

    /// The mock the expectation was registered on. For chained setups this is
    /// the auto-created child, not the root.
    pub fn mock(&self) -> &Mock {
        &self.mock
    }
}
