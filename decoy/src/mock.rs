use std::{
    collections::BTreeMap,
    fmt,
    panic::Location,
    sync::{Arc, Mutex, RwLock},
};

use crate::{
    Access, Behavior, BaseImplementation, Call, Capability, Error, Expectation, Handler, Invocation,
    Matcher, Member, MemberId, MockConfig, MockId, Proxy, Result, Setup, Substitute, Times,
    TypeDesc, Value,
    call::Segment,
    chain,
    interceptor::Interceptor,
    internal::{lock, read, write},
    verification,
};

struct Capabilities {
    list: Vec<Arc<Capability>>,
    materialized: bool,
}

pub(crate) struct MockInner {
    pub(crate) id: MockId,
    config: MockConfig,
    capabilities: RwLock<Capabilities>,
    pub(crate) interceptor: Interceptor,
    inner_mocks: Mutex<BTreeMap<MemberId, Mock>>,
    base: Option<Arc<dyn BaseImplementation>>,
}

/// A test double for one or more capabilities.
///
/// A mock owns the routing state for its [`Substitute`]: the setups
/// registered with [`setup`](Self::setup), the log of every call the
/// substitute received, and the child mocks created for chained access.
///
/// `Mock` is a cheap handle; clones share the same state and compare equal.
///
/// # Example
///
/// ```rust
/// use decoy::{Call, Capability, Mock, Times, TypeDesc, args};
///
/// # fn main() -> decoy::Result {
/// let calculator = Capability::interface("Calculator")
///     .method("Add", [TypeDesc::Int, TypeDesc::Int], TypeDesc::Int);
///
/// let mock = Mock::loose(calculator);
/// mock.setup(Call::method("Add").arg(1).arg(2))?.returns(3);
///
/// let calc = mock.object();
/// assert_eq!(calc.call_as::<i32>("Add", args![1, 2])?, 3);
/// assert_eq!(calc.call_as::<i32>("Add", args![2, 2])?, 0);
///
/// mock.verify_call(Call::method("Add").arg(1).arg(2), Times::once())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Mock {
    pub(crate) inner: Arc<MockInner>,
}

impl Mock {
    /// Create a mock for `capability` with the given configuration.
    pub fn new(capability: Capability, config: MockConfig) -> Self {
        Self::build(capability, config, None)
    }

    /// Create a mock with the given behavior and otherwise default configuration.
    pub fn create(capability: Capability, behavior: Behavior) -> Self {
        Self::new(capability, MockConfig::default().with_behavior(behavior))
    }

    pub fn loose(capability: Capability) -> Self {
        Self::create(capability, Behavior::Loose)
    }

    pub fn strict(capability: Capability) -> Self {
        Self::create(capability, Behavior::Strict)
    }

    /// Create a mock for the capability a typed proxy declares.
    pub fn of<P: Proxy>(behavior: Behavior) -> Self {
        Self::create(P::capability(), behavior)
    }

    /// Create a mock backed by a real implementation, reachable through
    /// [`Setup::call_base`] and [`MockConfig::with_call_base`].
    pub fn with_base(
        capability: Capability,
        config: MockConfig,
        base: impl BaseImplementation + 'static,
    ) -> Self {
        Self::build(capability, config, Some(Arc::new(base)))
    }

    fn build(
        capability: Capability,
        config: MockConfig,
        base: Option<Arc<dyn BaseImplementation>>,
    ) -> Self {
        let id = MockId::generate();
        tracing::trace!(mock = %id, capability = %capability, behavior = %config.behavior(), "mock created");
        Self {
            inner: Arc::new(MockInner {
                id,
                config,
                capabilities: RwLock::new(Capabilities {
                    list: vec![Arc::new(capability)],
                    materialized: false,
                }),
                interceptor: Interceptor::default(),
                inner_mocks: Mutex::new(BTreeMap::new()),
                base,
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<MockInner>) -> Self {
        Self { inner }
    }

    /// The mock behind a substitute.
    pub fn get(substitute: &Substitute) -> Self {
        substitute.mock()
    }

    pub fn id(&self) -> MockId {
        self.inner.id
    }

    pub fn config(&self) -> &MockConfig {
        &self.inner.config
    }

    /// Name of the primary capability.
    pub fn name(&self) -> String {
        read(&self.inner.capabilities).list[0].name().to_string()
    }

    /// Every exposed capability, primary first.
    pub fn capabilities(&self) -> Vec<Arc<Capability>> {
        read(&self.inner.capabilities).list.clone()
    }

    pub fn implements(&self, capability: &str) -> bool {
        read(&self.inner.capabilities)
            .list
            .iter()
            .any(|c| c.name() == capability)
    }

    /// Expose an additional interface on the substitute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCapability`] if the substitute was already
    /// materialized with [`object`](Self::object), or if `capability` is not
    /// an interface.
    pub fn add_capability(&self, capability: Capability) -> Result {
        let mut capabilities = write(&self.inner.capabilities);
        if capabilities.materialized {
            return Err(Error::UnsupportedCapability(format!(
                "cannot add {} to {} mock after its object was materialized",
                capability.name(),
                capabilities.list[0].name()
            )));
        }
        if !capability.is_interface() {
            return Err(Error::UnsupportedCapability(format!(
                "{} is not an interface",
                capability.name()
            )));
        }
        if capabilities.list.iter().any(|c| c.name() == capability.name()) {
            return Ok(());
        }
        capabilities.list.push(Arc::new(capability));
        Ok(())
    }

    /// The substitute for this mock. Materializing it freezes the capability set.
    pub fn object(&self) -> Substitute {
        write(&self.inner.capabilities).materialized = true;
        Substitute {
            inner: self.inner.clone(),
        }
    }

    /// The substitute viewed through a typed proxy.
    pub fn object_as<P: Proxy>(&self) -> Result<P> {
        self.object().cast()
    }

    pub fn is_materialized(&self) -> bool {
        read(&self.inner.capabilities).materialized
    }

    /// Register a setup for `call` and return a builder for its behavior.
    ///
    /// The whole chain and its target are checked before anything changes.
    /// Each hop then gets (or reuses) an auto-created child mock, and the
    /// final segment is registered on the last one. A failed setup leaves the
    /// mock untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the target is not a member, is static or
    ///   not overridable, cannot be accessed the requested way, or the number
    ///   of argument matchers differs from the parameter count.
    /// - [`Error::NotSupportedChain`] if a hop does not return a mockable
    ///   capability.
    pub fn setup(&self, call: Call) -> Result<Setup> {
        let (_, id, returns) = chain::resolve_target(self, &call)?;
        let target = chain::resolve_for_setup(self, &call)?;
        let expectation = Arc::new(Expectation::new(id, call.target.matchers, returns));
        target.add_expectation(expectation.clone());
        tracing::debug!(mock = %target.id(), setup = %expectation, "setup registered");
        Ok(Setup::new(target, expectation))
    }

    /// Give a readable and writable property get/set tracking behavior,
    /// starting at `initial`.
    pub fn setup_property(&self, name: &str, initial: impl Into<Value>) -> Result {
        let (_, member) = self
            .find_member(name)
            .ok_or_else(|| Error::configuration(name, format!("not a member of {self}")))?;
        if !member.is_read_write() || !member.is_overridable() {
            return Err(Error::configuration(
                name,
                "only overridable read/write properties can be stubbed",
            ));
        }
        self.stub_property(name, initial.into())
    }

    /// Give every overridable read/write property of every exposed capability
    /// get/set tracking behavior, starting at the property type's default value.
    pub fn setup_all_properties(&self) -> Result {
        for capability in self.capabilities() {
            for member in capability.members() {
                if !member.is_read_write() || !member.is_overridable() {
                    continue;
                }
                let getter = capability.member_id(member, Access::Get);
                let initial = self.provide_default(&getter, &member.returns(Access::Get))?;
                self.stub_property(member.name(), initial)?;
            }
        }
        Ok(())
    }

    fn stub_property(&self, name: &str, initial: Value) -> Result {
        let slot = Arc::new(Mutex::new(initial));
        let reader = slot.clone();
        self.setup(Call::get(name))?
            .returns_with(move |_| lock(&reader).clone());
        self.setup(Call::set(name).with(Matcher::any()))?
            .callback(move |args| {
                if let Some(value) = args.first() {
                    *lock(&slot) = value.clone();
                }
            });
        Ok(())
    }

    /// Verify that `call` was received a number of times within `times`.
    ///
    /// Counts are taken from the invocation log, so verification can run in
    /// any order and any number of times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Verification`] describing the expected call, the
    /// actual count and every setup registered for the same member.
    #[track_caller]
    pub fn verify_call(&self, call: Call, times: impl Into<Times>) -> Result {
        verification::verify_call(self, &call, times.into(), None, Location::caller())
    }

    /// Like [`verify_call`](Self::verify_call), with a message prepended to
    /// the failure.
    #[track_caller]
    pub fn verify_call_with_message(
        &self,
        call: Call,
        times: impl Into<Times>,
        message: &str,
    ) -> Result {
        verification::verify_call(
            self,
            &call,
            times.into(),
            Some(message.to_string()),
            Location::caller(),
        )
    }

    /// Check every setup marked [`verifiable`](Setup::verifiable), here and in
    /// every auto-created child.
    #[track_caller]
    pub fn verify(&self) -> Result {
        verification::verify_setups(self, true, Location::caller())
    }

    /// Check every explicit setup, here and in every auto-created child.
    /// Setups without a count constraint must have matched at least once.
    #[track_caller]
    pub fn verify_all(&self) -> Result {
        verification::verify_setups(self, false, Location::caller())
    }

    /// Invoke the handlers subscribed to `event`, in subscription order.
    ///
    /// The first handler error stops the raise and is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnassociatedEvent`] if no exposed capability declares
    /// `event`.
    pub fn raise(&self, event: &str, args: Vec<Value>) -> Result {
        let event = self.declared_event(event)?;
        let handlers = self.inner.interceptor.invocation_list(&event);
        tracing::trace!(mock = %self.id(), event = %event, handlers = handlers.len(), "raising event");
        for handler in handlers {
            handler.invoke(&args)?;
        }
        Ok(())
    }

    /// Handlers currently subscribed to `event`, in subscription order.
    pub fn invocation_list(&self, event: &str) -> Vec<Handler> {
        self.inner.interceptor.invocation_list(event)
    }

    /// Snapshot of every call received, in arrival order.
    pub fn invocations(&self) -> Vec<Arc<Invocation>> {
        self.inner.interceptor.invocations()
    }

    /// Snapshot of every registered setup, in registration order.
    pub fn setups(&self) -> Vec<Arc<Expectation>> {
        self.inner.interceptor.expectations()
    }

    /// The auto-created child for `member`, if one exists.
    pub fn inner_mock(&self, member: &MemberId) -> Option<Mock> {
        lock(&self.inner.inner_mocks).get(member).cloned()
    }

    /// Every auto-created child, ordered by originating member.
    pub fn inner_mocks(&self) -> Vec<Mock> {
        lock(&self.inner.inner_mocks).values().cloned().collect()
    }

    pub(crate) fn inner_mock_or_create(&self, member: &MemberId, capability: Capability) -> Mock {
        lock(&self.inner.inner_mocks)
            .entry(member.clone())
            .or_insert_with(|| {
                let child = Mock::new(capability, self.inner.config.for_child());
                tracing::debug!(mock = %self.id(), member = %member, child = %child.id(), "auto-mocked child created");
                child
            })
            .clone()
    }

    pub(crate) fn add_expectation(&self, expectation: Arc<Expectation>) {
        self.inner.interceptor.add_expectation(expectation);
    }

    pub(crate) fn find_member(&self, name: &str) -> Option<(Arc<Capability>, Member)> {
        read(&self.inner.capabilities)
            .list
            .iter()
            .find_map(|c| c.member(name).map(|m| (c.clone(), m.clone())))
    }

    pub(crate) fn declared_event(&self, event: &str) -> Result<Arc<str>> {
        if self.capabilities().iter().any(|c| c.has_event(event)) {
            Ok(Arc::from(event))
        } else {
            Err(Error::UnassociatedEvent {
                event: event.to_string(),
                capability: self.name(),
            })
        }
    }

    pub(crate) fn has_base(&self) -> bool {
        self.inner.base.is_some()
    }

    pub(crate) fn call_base(&self, member: &MemberId, args: &[Value]) -> Result<Value> {
        match &self.inner.base {
            Some(base) => base.invoke(member, args),
            None => Err(Error::configuration(member, "no base implementation to call")),
        }
    }

    pub(crate) fn provide_default(&self, member: &MemberId, ty: &TypeDesc) -> Result<Value> {
        self.inner.config.default_value().provide(ty, member, self)
    }
}

/// Check a setup or verification target against the capability set it is
/// applied to, returning its identity and result type.
pub(crate) fn validate_target(
    find: impl Fn(&str) -> Option<(Arc<Capability>, Member)>,
    owner: &str,
    target: &Segment,
) -> Result<(MemberId, TypeDesc)> {
    let (capability, member) = find(target.name())
        .ok_or_else(|| Error::configuration(target.name(), format!("not a member of {owner}")))?;
    let id = capability.member_id(&member, target.access());

    if member.is_static() {
        return Err(Error::configuration(id, "static members cannot be intercepted"));
    }
    if !member.is_overridable() {
        return Err(Error::configuration(id, "member is not overridable"));
    }
    if !member.supports(target.access()) {
        let reason = match target.access() {
            Access::Get => "property is not readable",
            Access::Set => "property is not writable",
            Access::Call => "member is not a method",
        };
        return Err(Error::configuration(id, reason));
    }
    let params = member.params(target.access());
    if params.len() != target.matchers().len() {
        return Err(Error::configuration(
            id,
            format!(
                "expected {} arguments, got {}",
                params.len(),
                target.matchers().len()
            ),
        ));
    }
    Ok((id, member.returns(target.access())))
}

impl PartialEq for Mock {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Mock {}

impl fmt::Display for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mock", self.name())
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capabilities = read(&self.inner.capabilities);
        f.debug_struct("Mock")
            .field("id", &self.inner.id)
            .field(
                "capabilities",
                &capabilities.list.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("materialized", &capabilities.materialized)
            .field("config", &self.inner.config)
            .field("interceptor", &self.inner.interceptor)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "serde")]
impl Mock {
    /// Export registered setups, received calls and auto-created children as JSON.
    ///
    /// Values are exported in their canonical rendering, so the output is
    /// meant for inspection and tooling rather than round-tripping.
    ///
    /// # Errors
    ///
    /// Returns any serialization error produced by `serde_json`.
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export())
    }

    fn export(&self) -> MockExport {
        MockExport {
            id: self.id(),
            capabilities: self
                .capabilities()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            behavior: self.config().behavior(),
            setups: self
                .setups()
                .iter()
                .map(|e| SetupExport {
                    call: e.render(),
                    times: e.times(),
                    verifiable: e.is_verifiable(),
                    matched: e.matched_count(),
                })
                .collect(),
            invocations: self
                .invocations()
                .iter()
                .map(|i| InvocationExport {
                    sequence: i.sequence(),
                    member: i.member().clone(),
                    call: i.to_string(),
                    matched: i.matched().map(|e| e.render()),
                })
                .collect(),
            children: lock(&self.inner.inner_mocks)
                .iter()
                .map(|(member, child)| (member.to_string(), child.export()))
                .collect(),
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize)]
struct MockExport {
    id: MockId,
    capabilities: Vec<String>,
    behavior: Behavior,
    setups: Vec<SetupExport>,
    invocations: Vec<InvocationExport>,
    children: BTreeMap<String, MockExport>,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize)]
struct SetupExport {
    call: String,
    times: Option<Times>,
    verifiable: bool,
    matched: usize,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize)]
struct InvocationExport {
    sequence: u64,
    member: MemberId,
    call: String,
    matched: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{DefaultValue, args};

    #[derive(Debug, thiserror::Error)]
    #[error("division by zero")]
    struct DivideByZero;

    fn calculator() -> Capability {
        Capability::interface("Calculator")
            .method("Add", [TypeDesc::Int, TypeDesc::Int], TypeDesc::Int)
            .method("Divide", [TypeDesc::Int, TypeDesc::Int], TypeDesc::Int)
            .method("Clear", [], TypeDesc::Unit)
            .property("Total", TypeDesc::Int)
            .readonly_property("Name", TypeDesc::Str)
            .event("Overflow")
    }

    fn connection() -> Capability {
        Capability::interface("Connection")
            .method("Execute", [TypeDesc::Str], TypeDesc::Int)
            .method("Close", [], TypeDesc::Unit)
    }

    fn repository() -> Capability {
        Capability::interface("Repository")
            .readonly_property("Connection", TypeDesc::Capability(connection))
            .method("Find", [TypeDesc::Int], TypeDesc::option(TypeDesc::Str))
    }

    fn service() -> Capability {
        Capability::interface("Service")
            .readonly_property("Repository", TypeDesc::Capability(repository))
            .method("Run", [], TypeDesc::Bool)
    }

    fn account() -> Capability {
        Capability::class("Account")
            .method("Balance", [], TypeDesc::Int)
            .sealed_method("Audit", [], TypeDesc::Str)
            .static_method("Open", [], TypeDesc::Int)
    }

    #[test]
    fn configured_and_default_results() {
        let mock = Mock::loose(calculator());
        mock.setup(Call::method("Add").arg(1).arg(2)).unwrap().returns(3);

        let calc = mock.object();
        assert_eq!(calc.call("Add", args![1, 2]).unwrap(), Value::Int(3));
        assert_eq!(calc.call("Add", args![2, 2]).unwrap(), Value::Int(0));
        assert_eq!(calc.get("Name").unwrap(), Value::from(""));
        assert_eq!(calc.call("Clear", args![]).unwrap(), Value::Unit);
    }

    #[test]
    fn last_registered_setup_wins() {
        let mock = Mock::loose(calculator());
        mock.setup(Call::method("Add").with(Matcher::any()).with(Matcher::any()))
            .unwrap()
            .returns(1);
        mock.setup(Call::method("Add").arg(5).with(Matcher::any()))
            .unwrap()
            .returns(2);

        let calc = mock.object();
        assert_eq!(calc.call_as::<i64>("Add", args![5, 0]).unwrap(), 2);
        assert_eq!(calc.call_as::<i64>("Add", args![4, 0]).unwrap(), 1);

        // A later, broader setup shadows the narrower one.
        mock.setup(Call::method("Add").with(Matcher::any()).with(Matcher::any()))
            .unwrap()
            .returns(9);
        assert_eq!(calc.call_as::<i64>("Add", args![5, 0]).unwrap(), 9);
    }

    #[test]
    fn strict_mock_rejects_unmatched_calls() {
        let mock = Mock::strict(calculator());
        mock.setup(Call::method("Add").arg(1).arg(2)).unwrap().returns(3);

        let calc = mock.object();
        assert_eq!(calc.call_as::<i64>("Add", args![1, 2]).unwrap(), 3);
        let err = calc.call("Add", args![2, 2]).unwrap_err();
        assert_eq!(
            err,
            Error::UnmatchedStrictCall("Calculator.Add(2, 2)".to_string())
        );
        assert!(matches!(
            calc.call("Clear", args![]),
            Err(Error::UnmatchedStrictCall(_))
        ));
        assert!(matches!(calc.set("Total", 3), Err(Error::UnmatchedStrictCall(_))));
        // Rejected calls are still logged.
        assert_eq!(mock.invocations().len(), 4);
    }

    #[test]
    fn thrown_error_reaches_caller_unchanged() {
        let mock = Mock::loose(calculator());
        let setup = mock
            .setup(Call::method("Divide").with(Matcher::any()).arg(0))
            .unwrap()
            .throws(DivideByZero);

        let calc = mock.object();
        let first = calc.call("Divide", args![1, 0]).unwrap_err();
        let second = calc.call("Divide", args![2, 0]).unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "division by zero");
        assert_eq!(setup.expectation().matched_count(), 2);
    }

    #[test]
    fn callbacks_run_before_throw() {
        let mock = Mock::loose(calculator());
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        mock.setup(Call::method("Clear"))
            .unwrap()
            .callback(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .throws(DivideByZero);

        assert!(mock.object().call("Clear", args![]).is_err());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn setup_without_result_uses_default_provider() {
        let mock = Mock::new(
            repository(),
            MockConfig::default().with_default_value(DefaultValue::Mock),
        );
        mock.setup(Call::get("Connection")).unwrap().verifiable();

        let conn = mock.object().get("Connection").unwrap();
        let conn = conn.as_object().expect("auto-mocked connection");
        assert!(conn.implements("Connection"));
        mock.verify().unwrap();
    }

    #[test]
    fn invalid_setups_are_rejected() {
        let mock = Mock::loose(calculator());
        let err = mock.setup(Call::method("Missing")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }), "{err:?}");

        let err = mock.setup(Call::method("Add").arg(1)).unwrap_err();
        assert_eq!(
            err,
            Error::configuration("Calculator.Add", "expected 2 arguments, got 1")
        );

        let err = mock.setup(Call::set("Name").arg("x")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }), "{err:?}");

        let account = Mock::loose(account());
        assert!(matches!(
            account.setup(Call::method("Audit")),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            account.setup(Call::method("Open")),
            Err(Error::Configuration { .. })
        ));
        assert!(account.setup(Call::method("Balance")).is_ok());
    }

    #[test]
    fn verify_call_counts_matching_invocations() {
        let mock = Mock::loose(calculator());
        mock.setup(Call::method("Add").arg(1).arg(2)).unwrap().returns(3);
        mock.object().call("Add", args![1, 2]).unwrap();

        let add = || Call::method("Add").arg(1).arg(2);
        mock.verify_call(add(), Times::once()).unwrap();
        mock.verify_call(add(), 1usize).unwrap();
        mock.verify_call(Call::method("Add").arg(9).arg(9), Times::never())
            .unwrap();

        let err = mock.verify_call(add(), Times::exactly(2)).unwrap_err();
        let failure = err.as_verification().expect("verification failure");
        assert_eq!(failure.actual(), Some(1));
        assert_eq!(failure.times(), Some(Times::exactly(2)));
        assert_eq!(failure.setups().len(), 1);
        assert!(
            err.to_string()
                .contains("exactly 2 times, but was 1 times: Calculator.Add(1, 2)"),
            "{err}"
        );
        assert!(failure.location().file().ends_with("mock.rs"));
    }

    #[test]
    fn verify_call_with_message_prefixes_failure() {
        let mock = Mock::loose(calculator());
        let err = mock
            .verify_call_with_message(Call::method("Clear"), Times::once(), "clear was skipped")
            .unwrap_err();
        assert_eq!(
            err.as_verification().and_then(|v| v.message()),
            Some("clear was skipped")
        );
        assert!(err.to_string().starts_with("clear was skipped\n"));
    }

    #[test]
    fn verification_is_repeatable_and_order_independent() {
        let mock = Mock::loose(calculator());
        let calc = mock.object();
        calc.call("Add", args![1, 1]).unwrap();
        calc.set("Total", 5).unwrap();
        calc.call("Add", args![1, 1]).unwrap();

        for _ in 0..2 {
            mock.verify_call(Call::set("Total").arg(5), Times::once()).unwrap();
            mock.verify_call(Call::method("Add").arg(1).arg(1), Times::exactly(2))
                .unwrap();
            mock.verify_call(Call::get("Total"), Times::never()).unwrap();
        }
    }

    #[test]
    fn verify_covers_only_verifiable_setups() {
        let mock = Mock::loose(calculator());
        mock.setup(Call::method("Clear")).unwrap();
        mock.setup(Call::method("Add").arg(1).arg(1))
            .unwrap()
            .verifiable_times(Times::at_least(2));

        mock.object().call("Add", args![1, 1]).unwrap();
        let err = mock.verify().unwrap_err();
        assert_eq!(err.as_verification().map(|v| v.setups().len()), Some(1));

        mock.object().call("Add", args![1, 1]).unwrap();
        mock.verify().unwrap();
        assert!(mock.verify_all().is_err());
    }

    #[test]
    fn chained_setups_share_children() {
        let mock = Mock::loose(service());
        mock.setup(
            Call::get("Repository")
                .then_get("Connection")
                .then_method("Execute")
                .arg("a"),
        )
        .unwrap()
        .returns(1);
        mock.setup(
            Call::get("Repository")
                .then_get("Connection")
                .then_method("Execute")
                .arg("b"),
        )
        .unwrap()
        .returns(2);

        let conn = mock
            .object()
            .get_as::<Substitute>("Repository")
            .unwrap()
            .get_as::<Substitute>("Connection")
            .unwrap();
        assert_eq!(conn.call_as::<i64>("Execute", args!["a"]).unwrap(), 1);
        assert_eq!(conn.call_as::<i64>("Execute", args!["b"]).unwrap(), 2);
        assert_eq!(mock.inner_mocks().len(), 1);
        assert_eq!(mock.inner_mocks()[0].inner_mocks().len(), 1);
    }

    #[test]
    fn verify_all_recurses_into_children() {
        let mock = Mock::loose(service());
        mock.setup(Call::get("Repository").then_method("Find").arg(7))
            .unwrap()
            .returns("seven");

        let err = mock.verify_all().unwrap_err();
        let failure = err.as_verification().expect("verification failure");
        assert_eq!(failure.setups().len(), 1);
        assert_eq!(failure.setups()[0].call(), "Repository.Find(7)");

        let repo = mock.object().get_as::<Substitute>("Repository").unwrap();
        repo.call("Find", args![7]).unwrap();
        mock.verify_all().unwrap();
    }

    #[test]
    fn verify_through_chain() {
        let mock = Mock::loose(service());
        let find = || Call::get("Repository").then_method("Find").arg(7);

        // Nothing traversed yet: zero calls, and nothing gets created.
        mock.verify_call(find(), Times::never()).unwrap();
        assert!(mock.inner_mocks().is_empty());

        mock.setup(find()).unwrap();
        let repo = mock.object().get_as::<Substitute>("Repository").unwrap();
        repo.call("Find", args![7]).unwrap();
        repo.call("Find", args![8]).unwrap();
        mock.verify_call(find(), Times::once()).unwrap();
    }

    #[test]
    fn mock_default_is_idempotent() {
        let mock = Mock::new(
            service(),
            MockConfig::default().with_default_value(DefaultValue::Mock),
        );
        let svc = mock.object();
        let first = svc.get_as::<Substitute>("Repository").unwrap();
        let second = svc.get_as::<Substitute>("Repository").unwrap();
        assert_eq!(first, second);
        assert_eq!(mock.inner_mocks().len(), 1);
        assert!(first.mock().config().default_value().is_mock());
    }

    #[test]
    fn runtime_child_sees_later_chained_setup() {
        let mock = Mock::new(
            service(),
            MockConfig::default().with_default_value(DefaultValue::Mock),
        );
        let repo = mock.object().get_as::<Substitute>("Repository").unwrap();
        let conn = repo.get_as::<Substitute>("Connection").unwrap();

        mock.setup(
            Call::get("Repository")
                .then_get("Connection")
                .then_method("Execute")
                .arg("x"),
        )
        .unwrap()
        .returns(5);

        assert_eq!(conn.call_as::<i64>("Execute", args!["x"]).unwrap(), 5);
        assert_eq!(mock.inner_mocks(), vec![repo.mock()]);
        assert_eq!(repo.mock().inner_mocks(), vec![conn.mock()]);
    }

    #[test]
    fn chained_child_sees_direct_setup() {
        let mock = Mock::loose(service());
        mock.setup(Call::get("Repository").then_method("Find").arg(1))
            .unwrap()
            .returns("one");

        let repo = mock.object().get_as::<Substitute>("Repository").unwrap();
        repo.mock()
            .setup(Call::method("Find").arg(2))
            .unwrap()
            .returns("two");

        let again = mock.object().get_as::<Substitute>("Repository").unwrap();
        assert_eq!(again, repo);
        assert_eq!(
            again.call_as::<Option<String>>("Find", args![1]).unwrap(),
            Some("one".to_string())
        );
        assert_eq!(
            again.call_as::<Option<String>>("Find", args![2]).unwrap(),
            Some("two".to_string())
        );
        let member = MemberId::new("Service", "Repository", Access::Get);
        assert_eq!(mock.inner_mock(&member), Some(repo.mock()));
        mock.verify_call(
            Call::get("Repository").then_method("Find").arg(2),
            Times::once(),
        )
        .unwrap();
    }

    #[test]
    fn failed_chained_setup_leaves_no_trace() {
        let mock = Mock::strict(service());
        let failing = [
            Call::get("Repository").then_method("Nope"),
            Call::get("Repository").then_method("Find"),
            Call::get("Repository")
                .then_method("Find")
                .arg(1)
                .then_get("Len"),
            Call::get("Repository")
                .then_get("Connection")
                .then_method("Execute")
                .arg("x")
                .arg("y"),
        ];
        for call in failing {
            let err = mock.setup(call).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::Configuration { .. } | Error::NotSupportedChain { .. }
                ),
                "{err:?}"
            );
        }

        assert!(mock.setups().is_empty());
        assert!(mock.inner_mocks().is_empty());
        assert!(matches!(
            mock.object().get("Repository"),
            Err(Error::UnmatchedStrictCall(_))
        ));
    }

    #[test]
    fn property_stubs_track_values() {
        let mock = Mock::loose(calculator());
        mock.setup_property("Total", 10).unwrap();

        let calc = mock.object();
        assert_eq!(calc.get_as::<i64>("Total").unwrap(), 10);
        calc.set("Total", 42).unwrap();
        assert_eq!(calc.get_as::<i64>("Total").unwrap(), 42);

        assert!(matches!(
            mock.setup_property("Name", "x"),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn setup_all_properties_starts_from_defaults() {
        let mock = Mock::loose(calculator());
        mock.setup_all_properties().unwrap();

        let calc = mock.object();
        assert_eq!(calc.get_as::<i64>("Total").unwrap(), 0);
        calc.set("Total", 7).unwrap();
        assert_eq!(calc.get_as::<i64>("Total").unwrap(), 7);
    }

    #[test]
    fn events_run_in_subscription_order() {
        let mock = Mock::loose(calculator());
        let calc = mock.object();
        let order = Arc::new(Mutex::new(Vec::new()));

        let handler = |tag: &'static str| {
            let order = order.clone();
            Handler::new(move |_| {
                lock(&order).push(tag);
                Ok(())
            })
        };
        let (h1, h2, h3) = (handler("h1"), handler("h2"), handler("h3"));
        calc.subscribe("Overflow", &h1).unwrap();
        calc.subscribe("Overflow", &h2).unwrap();
        calc.subscribe("Overflow", &h3).unwrap();

        mock.raise("Overflow", args![]).unwrap();
        assert_eq!(*lock(&order), ["h1", "h2", "h3"]);

        assert!(calc.unsubscribe("Overflow", &h2).unwrap());
        lock(&order).clear();
        mock.raise("Overflow", args![]).unwrap();
        assert_eq!(*lock(&order), ["h1", "h3"]);
        assert_eq!(mock.invocation_list("Overflow"), vec![h1, h3]);
    }

    #[test]
    fn first_failing_handler_stops_raise() {
        let mock = Mock::loose(calculator());
        let calc = mock.object();
        let reached = Arc::new(AtomicUsize::new(0));
        let after = reached.clone();

        calc.subscribe("Overflow", &Handler::new(|_| Err(Error::thrown(DivideByZero))))
            .unwrap();
        calc.subscribe(
            "Overflow",
            &Handler::new(move |_| {
                after.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

        assert!(matches!(mock.raise("Overflow", args![]), Err(Error::Thrown(_))));
        assert_eq!(reached.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn undeclared_events_are_rejected() {
        let mock = Mock::loose(calculator());
        let err = mock.raise("Underflow", args![]).unwrap_err();
        assert_eq!(
            err,
            Error::UnassociatedEvent {
                event: "Underflow".to_string(),
                capability: "Calculator".to_string(),
            }
        );
        let h = Handler::new(|_| Ok(()));
        assert!(mock.object().subscribe("Underflow", &h).is_err());
    }

    #[test]
    fn setup_raises_event_before_returning() {
        let mock = Mock::loose(calculator());
        let totals = Arc::new(Mutex::new(Vec::new()));
        let sink = totals.clone();
        mock.object()
            .subscribe(
                "Overflow",
                &Handler::new(move |args| {
                    lock(&sink).extend_from_slice(args);
                    Ok(())
                }),
            )
            .unwrap();
        mock.setup(Call::method("Add").with(Matcher::any()).with(Matcher::any()))
            .unwrap()
            .raises_with("Overflow", |args| vec![args[0].clone()])
            .returns(-1);

        let result = mock.object().call("Add", args![i64::MAX, 1]).unwrap();
        assert_eq!(result, Value::Int(-1));
        assert_eq!(*lock(&totals), vec![Value::Int(i64::MAX)]);
    }

    #[test]
    fn callbacks_may_reenter_the_mock() {
        let mock = Mock::loose(calculator());
        let reentrant = mock.clone();
        mock.setup(Call::method("Clear"))
            .unwrap()
            .callback(move |_| {
                let calc = reentrant.object();
                calc.set("Total", 0).unwrap();
                reentrant
                    .setup(Call::get("Total"))
                    .unwrap()
                    .returns(0);
            });

        mock.object().call("Clear", args![]).unwrap();
        mock.verify_call(Call::set("Total").arg(0), Times::once()).unwrap();
        assert_eq!(mock.setups().len(), 2);
    }

    #[test]
    fn call_base_delegates_to_base_implementation() {
        let base = |member: &MemberId, _args: &[Value]| -> Result<Value> {
            match member.name() {
                "Balance" => Ok(Value::Int(100)),
                "Audit" => Ok(Value::from("ok")),
                _ => Ok(Value::Unit),
            }
        };
        let mock = Mock::with_base(account(), MockConfig::default(), base);
        mock.setup(Call::method("Balance")).unwrap().call_base();

        let acct = mock.object();
        assert_eq!(acct.call_as::<i64>("Balance", args![]).unwrap(), 100);
        // Sealed members bypass the interceptor entirely.
        assert_eq!(acct.call_as::<String>("Audit", args![]).unwrap(), "ok");
        assert_eq!(mock.invocations().len(), 1);
    }

    #[test]
    fn call_base_without_base_fails() {
        let mock = Mock::loose(account());
        mock.setup(Call::method("Balance")).unwrap().call_base();
        let err = mock.object().call("Balance", args![]).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
    }

    #[test]
    fn loose_call_base_applies_to_unmatched_calls() {
        let base = |_: &MemberId, _: &[Value]| -> Result<Value> { Ok(Value::Int(7)) };
        let mock = Mock::with_base(account(), MockConfig::default().with_call_base(true), base);
        assert_eq!(mock.object().call_as::<i64>("Balance", args![]).unwrap(), 7);
    }

    #[test]
    fn added_capabilities_are_exposed_until_materialized() {
        let mock = Mock::loose(calculator());
        mock.add_capability(connection()).unwrap();
        mock.add_capability(connection()).unwrap();
        assert_eq!(mock.capabilities().len(), 2);
        assert!(matches!(
            mock.add_capability(account()),
            Err(Error::UnsupportedCapability(_))
        ));

        mock.setup(Call::method("Execute").arg("ping")).unwrap().returns(1);
        let obj = mock.object();
        assert!(obj.implements("Connection"));
        assert_eq!(obj.call_as::<i64>("Execute", args!["ping"]).unwrap(), 1);

        assert!(matches!(
            mock.add_capability(repository()),
            Err(Error::UnsupportedCapability(_))
        ));
    }

    #[test]
    fn substitute_round_trips_to_its_mock() {
        let mock = Mock::loose(calculator());
        let obj = mock.object();
        assert_eq!(Mock::get(&obj), mock);
        assert_eq!(obj.mock().id(), mock.id());
        assert_eq!(obj.to_string(), "<Calculator mock>");
    }

    #[test]
    fn typed_proxy_casts() {
        struct CalculatorProxy(Substitute);

        impl Proxy for CalculatorProxy {
            fn capability() -> Capability {
                calculator()
            }

            fn from_substitute(substitute: Substitute) -> Self {
                Self(substitute)
            }
        }

        impl CalculatorProxy {
            fn add(&self, a: i64, b: i64) -> Result<i64> {
                self.0.call_as("Add", args![a, b])
            }
        }

        let mock = Mock::of::<CalculatorProxy>(Behavior::Loose);
        mock.setup(Call::method("Add").arg(2).arg(3)).unwrap().returns(5);
        let calc = mock.object_as::<CalculatorProxy>().unwrap();
        assert_eq!(calc.add(2, 3).unwrap(), 5);

        let other = Mock::loose(connection());
        assert!(matches!(
            other.object_as::<CalculatorProxy>(),
            Err(Error::UnsupportedCapability(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_calls_are_all_logged() {
        let mock = Mock::loose(calculator());
        let setup = mock
            .setup(Call::method("Add").with(Matcher::any()).with(Matcher::any()))
            .unwrap()
            .returns_with(|args| {
                let a = args[0].as_i64().unwrap_or_default();
                let b = args[1].as_i64().unwrap_or_default();
                Value::Int(a + b)
            });

        let mut tasks = Vec::new();
        for i in 0..8i64 {
            let calc = mock.object();
            tasks.push(tokio::spawn(async move {
                for j in 0..50i64 {
                    let sum = calc.call_as::<i64>("Add", args![i, j]).unwrap();
                    assert_eq!(sum, i + j);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(mock.invocations().len(), 400);
        assert_eq!(setup.expectation().matched_count(), 400);
        mock.verify_call(
            Call::method("Add").arg(3).with(Matcher::any()),
            Times::exactly(50),
        )
        .unwrap();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn exports_state_as_json() {
        let mock = Mock::loose(service());
        mock.setup(Call::get("Repository").then_method("Find").arg(1))
            .unwrap()
            .verifiable();
        mock.object().call("Run", args![]).unwrap();

        let json: serde_json::Value = serde_json::from_str(&mock.to_json().unwrap()).unwrap();
        assert_eq!(json["capabilities"][0], "Service");
        assert_eq!(json["invocations"][0]["call"], "Service.Run()");
        let child = &json["children"]["Service.Repository"];
        assert_eq!(child["setups"][0]["call"], "Repository.Find(1)");
        assert_eq!(child["setups"][0]["verifiable"], true);
    }
}
