use std::{fmt, sync::Arc};

use crate::{
    Access, Capability, Error, FromValue, Handler, MemberId, Mock, Result, Value,
    mock::MockInner,
};

/// The stand-in object handed to code under test.
///
/// A substitute forwards every member access to its mock's interceptor. It is
/// a dispatch table keyed by member name: [`call`](Self::call) for methods,
/// [`get`](Self::get) and [`set`](Self::set) for properties, and
/// [`subscribe`](Self::subscribe) / [`unsubscribe`](Self::unsubscribe) for
/// events. Typed wrappers implement [`Proxy`] on top of it.
///
/// Substitutes are cheap to clone; clones compare equal and share the same
/// mock, reachable with [`mock`](Self::mock).
#[derive(Clone)]
pub struct Substitute {
    pub(crate) inner: Arc<MockInner>,
}

impl Substitute {
    /// The mock that owns this substitute.
    pub fn mock(&self) -> Mock {
        Mock::from_inner(self.inner.clone())
    }

    /// Returns `true` if the substitute exposes the named capability.
    pub fn implements(&self, capability: &str) -> bool {
        self.mock().implements(capability)
    }

    /// Invoke a method.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.dispatch(method, Access::Call, args)
    }

    /// Invoke a method and convert the result.
    pub fn call_as<T: FromValue>(&self, method: &str, args: Vec<Value>) -> Result<T> {
        self.call(method, args).and_then(T::from_value)
    }

    /// Read a property.
    pub fn get(&self, property: &str) -> Result<Value> {
        self.dispatch(property, Access::Get, Vec::new())
    }

    /// Read a property and convert the result.
    pub fn get_as<T: FromValue>(&self, property: &str) -> Result<T> {
        self.get(property).and_then(T::from_value)
    }

    /// Write a property.
    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result {
        self.dispatch(property, Access::Set, vec![value.into()])
            .map(|_| ())
    }

    fn dispatch(&self, name: &str, access: Access, args: Vec<Value>) -> Result<Value> {
        let mock = self.mock();
        let (capability, member) = mock
            .find_member(name)
            .ok_or_else(|| Error::configuration(name, format!("not a member of {mock}")))?;
        let id = capability.member_id(&member, access);

        if !member.supports(access) {
            return Err(Error::configuration(id, format!("member does not support {access}")));
        }
        if !member.is_overridable() {
            // Not interceptable: only the real implementation can answer.
            return mock.call_base(&id, &args);
        }
        let returns = member.returns(access);
        mock.inner.interceptor.intercept(&mock, id, returns, args)
    }

    /// Attach a handler to a declared event.
    pub fn subscribe(&self, event: &str, handler: &Handler) -> Result {
        let mock = self.mock();
        let event = mock.declared_event(event)?;
        mock.inner.interceptor.subscribe(event, handler.clone());
        Ok(())
    }

    /// Detach a handler. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, event: &str, handler: &Handler) -> Result<bool> {
        let mock = self.mock();
        let event = mock.declared_event(event)?;
        Ok(mock.inner.interceptor.unsubscribe(&event, handler))
    }

    /// View this substitute through a typed proxy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCapability`] if the substitute does not
    /// expose `P`'s capability.
    pub fn cast<P: Proxy>(&self) -> Result<P> {
        let capability = P::capability();
        if !self.implements(capability.name()) {
            return Err(Error::UnsupportedCapability(format!(
                "{} does not implement {}",
                self.mock(),
                capability.name()
            )));
        }
        Ok(P::from_substitute(self.clone()))
    }
}

impl PartialEq for Substitute {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Substitute {}

impl fmt::Display for Substitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.mock())
    }
}

impl fmt::Debug for Substitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Substitute")
            .field("mock", &self.inner.id)
            .finish_non_exhaustive()
    }
}

/// A typed view over a [`Substitute`].
///
/// Implement this for a wrapper struct that also implements the trait under
/// test, forwarding each trait method to the substitute. It is the seam
/// through which a capability becomes a concrete Rust type.
///
/// # Example
///
/// ```rust
/// use decoy::{Capability, Proxy, Substitute, TypeDesc, args};
///
/// trait Greeter {
///     fn greet(&self, name: &str) -> String;
/// }
///
/// struct GreeterProxy(Substitute);
///
/// impl Proxy for GreeterProxy {
///     fn capability() -> Capability {
///         Capability::interface("Greeter").method("Greet", [TypeDesc::Str], TypeDesc::Str)
///     }
///
///     fn from_substitute(substitute: Substitute) -> Self {
///         Self(substitute)
///     }
/// }
///
/// impl Greeter for GreeterProxy {
///     fn greet(&self, name: &str) -> String {
///         self.0.call_as("Greet", args![name]).unwrap_or_default()
///     }
/// }
/// ```
pub trait Proxy: Sized {
    /// The capability this proxy implements.
    fn capability() -> Capability;

    fn from_substitute(substitute: Substitute) -> Self;
}

/// The real implementation behind a mock, used by call-base delegation.
pub trait BaseImplementation: Send + Sync {
    fn invoke(&self, member: &MemberId, args: &[Value]) -> Result<Value>;
}

impl<F> BaseImplementation for F
where
    F: Fn(&MemberId, &[Value]) -> Result<Value> + Send + Sync,
{
    fn invoke(&self, member: &MemberId, args: &[Value]) -> Result<Value> {
        self(member, args)
    }
}
