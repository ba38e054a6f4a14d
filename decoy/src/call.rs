use std::{fmt, sync::Arc};

use crate::{Access, Matcher, MemberId, Substitute, Value};

/// One member access within a [`Call`]: a name, how it is reached, and one
/// matcher per argument.
#[derive(Debug, Clone)]
pub struct Segment {
    pub(crate) name: Arc<str>,
    pub(crate) access: Access,
    pub(crate) matchers: Vec<Matcher>,
}

impl Segment {
    fn new(name: &str, access: Access) -> Self {
        Self {
            name: Arc::from(name),
            access,
            matchers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Render against a resolved member, e.g. `Calculator.Add(1, any)`.
    pub(crate) fn render(member: &MemberId, matchers: &[Matcher]) -> String {
        format!("{member}{}", Accessor(member.access(), matchers))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, Accessor(self.access, &self.matchers))
    }
}

/// Renders the accessor part of a call: `(a, b)`, nothing, or ` = v`.
pub(crate) struct Accessor<'a, T>(pub(crate) Access, pub(crate) &'a [T]);

impl<T: fmt::Display> fmt::Display for Accessor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Access::Call => {
                write!(f, "(")?;
                for (i, m) in self.1.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{m}")?;
                }
                write!(f, ")")
            }
            Access::Get => Ok(()),
            Access::Set => match self.1 {
                [value] => write!(f, " = {value}"),
                _ => write!(f, " = ?"),
            },
        }
    }
}

/// Description of a call, used both to register setups and to verify.
///
/// `Call` is the explicit replacement for writing the call itself: the member
/// name, how it is accessed and one argument pattern per parameter.
/// Literal arguments go through [`arg`](Self::arg); wildcards and predicates
/// through [`with`](Self::with).
///
/// Chained access (`mock.Repository.Find(1)`) is written with the `then_*`
/// methods. Every segment but the last is a hop that [`Mock::setup`] resolves
/// to an auto-created child mock.
///
/// # Example
///
/// ```rust
/// use decoy::{Call, Matcher};
///
/// let add = Call::method("Add").arg(1).with(Matcher::any());
/// assert_eq!(add.to_string(), "Add(1, any)");
///
/// let total = Call::set("Total").arg(10);
/// assert_eq!(total.to_string(), "Total = 10");
///
/// let find = Call::get("Repository").then_method("Find").arg(7);
/// assert_eq!(find.to_string(), "Repository.Find(7)");
/// ```
///
/// [`Mock::setup`]: crate::Mock::setup
#[derive(Debug, Clone)]
pub struct Call {
    pub(crate) root: Option<Substitute>,
    pub(crate) hops: Vec<Segment>,
    pub(crate) target: Segment,
}

impl Call {
    fn start(name: &str, access: Access) -> Self {
        Self {
            root: None,
            hops: Vec::new(),
            target: Segment::new(name, access),
        }
    }

    /// A method invocation.
    pub fn method(name: &str) -> Self {
        Self::start(name, Access::Call)
    }

    /// A property read.
    pub fn get(name: &str) -> Self {
        Self::start(name, Access::Get)
    }

    /// A property write. Give the assigned value with [`arg`](Self::arg) or
    /// [`with`](Self::with).
    pub fn set(name: &str) -> Self {
        Self::start(name, Access::Set)
    }

    fn then(mut self, name: &str, access: Access) -> Self {
        let previous = std::mem::replace(&mut self.target, Segment::new(name, access));
        self.hops.push(previous);
        self
    }

    /// Continue the chain with a method on the result of the current segment.
    pub fn then_method(self, name: &str) -> Self {
        self.then(name, Access::Call)
    }

    /// Continue the chain with a property read on the result of the current segment.
    pub fn then_get(self, name: &str) -> Self {
        self.then(name, Access::Get)
    }

    /// Continue the chain with a property write on the result of the current segment.
    pub fn then_set(self, name: &str) -> Self {
        self.then(name, Access::Set)
    }

    /// Append a literal argument to the current segment.
    pub fn arg(self, value: impl Into<Value>) -> Self {
        self.with(Matcher::Literal(value.into()))
    }

    /// Append literal arguments to the current segment.
    pub fn args<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.target
            .matchers
            .extend(values.into_iter().map(|v| Matcher::Literal(v.into())));
        self
    }

    /// Append an argument matcher to the current segment.
    pub fn with(mut self, matcher: Matcher) -> Self {
        self.target.matchers.push(matcher);
        self
    }

    /// Root the call at an existing substitute instead of the mock it is
    /// applied to. The substitute's own mock receives the setup.
    pub fn on(mut self, instance: &Substitute) -> Self {
        self.root = Some(instance.clone());
        self
    }

    /// The final segment, the one a setup configures.
    pub fn target(&self) -> &Segment {
        &self.target
    }

    /// Intermediate segments, outermost first.
    pub fn hops(&self) -> &[Segment] {
        &self.hops
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hop in &self.hops {
            write!(f, "{hop}.")?;
        }
        write!(f, "{}", self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_attach_to_the_latest_segment() {
        let call = Call::method("Open").arg("db").then_method("Query").arg(1).arg(2);
        assert_eq!(call.hops().len(), 1);
        assert_eq!(call.hops()[0].matchers().len(), 1);
        assert_eq!(call.target().matchers().len(), 2);
        assert_eq!(call.to_string(), "Open(\"db\").Query(1, 2)");
    }

    #[test]
    fn args_accepts_iterators() {
        let call = Call::method("Sum").args([1, 2, 3]);
        assert_eq!(call.to_string(), "Sum(1, 2, 3)");
    }

    #[test]
    fn render_uses_member_identity() {
        let member = MemberId::new("Calculator", "Add", Access::Call);
        let rendered = Segment::render(&member, &[Matcher::eq(1), Matcher::eq(2)]);
        assert_eq!(rendered, "Calculator.Add(1, 2)");

        let member = MemberId::new("Calculator", "Total", Access::Get);
        assert_eq!(Segment::render(&member, &[]), "Calculator.Total");
    }
}
