use std::{fmt, sync::Arc};

use crate::{Result, Value};

type HandlerFn = Arc<dyn Fn(&[Value]) -> Result + Send + Sync>;

/// A subscriber attached to one of a substitute's declared events.
///
/// Handlers are compared by identity: unsubscribing removes the handler
/// that shares this handler's allocation, not one with similar code.
///
/// ```rust
/// use decoy::Handler;
///
/// let h = Handler::new(|_args| Ok(()));
/// assert_eq!(h, h.clone());
/// assert_ne!(h, Handler::new(|_args| Ok(())));
/// ```
#[derive(Clone)]
pub struct Handler(HandlerFn);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the handler with the event arguments.
    pub fn invoke(&self, args: &[Value]) -> Result {
        (self.0)(args)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}
