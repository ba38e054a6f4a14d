//! Argument matching for setups and verification.

use std::{fmt, ops::RangeInclusive, sync::Arc};

use crate::{TypeDesc, Value};

type MatchFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Decides whether one actual argument satisfies a configured pattern.
///
/// A matcher is one of:
/// - a literal value, compared with [`Value`] equality
/// - a predicate, evaluated on every call
/// - a wildcard, optionally scoped to a declared type
///
/// Predicates must be pure: they run during dispatch and again for every
/// logged invocation each time a verification scans the log.
///
/// # Example
///
/// ```rust
/// use decoy::{Matcher, TypeDesc, Value};
///
/// assert!(Matcher::eq(3).matches(&Value::from(3)));
/// assert!(Matcher::any().matches(&Value::from("anything")));
/// assert!(!Matcher::any_of(TypeDesc::Int).matches(&Value::from("text")));
/// assert!(Matcher::with(|v| v.as_i64().is_some_and(|n| n > 10)).matches(&Value::from(11)));
/// ```
#[derive(Clone)]
pub enum Matcher {
    Literal(Value),
    Predicate { description: Arc<str>, test: MatchFn },
    Any(Option<TypeDesc>),
}

impl Matcher {
    /// Match arguments equal to `value`.
    pub fn eq(value: impl Into<Value>) -> Self {
        Matcher::Literal(value.into())
    }

    /// Match every argument.
    pub fn any() -> Self {
        Matcher::Any(None)
    }

    /// Match every argument that is an instance of `ty`.
    pub fn any_of(ty: TypeDesc) -> Self {
        Matcher::Any(Some(ty))
    }

    /// Match arguments accepted by a predicate.
    pub fn with<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::described("<predicate>", predicate)
    }

    /// Like [`with`](Self::with), rendered as `description` in diagnostics.
    pub fn described<F>(description: &str, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate {
            description: Arc::from(description),
            test: Arc::new(predicate),
        }
    }

    /// Match numeric arguments within an inclusive range. Integers compare
    /// exactly; floats compare against the bounds converted to `f64`.
    pub fn range(range: RangeInclusive<i64>) -> Self {
        let description = format!("in {}..={}", range.start(), range.end());
        Self::described(&description, move |v| match v {
            Value::Float(f) => (*range.start() as f64..=*range.end() as f64).contains(f),
            other => other.as_i64().is_some_and(|n| range.contains(&n)),
        })
    }

    /// Returns true if `actual` satisfies this matcher.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Matcher::Literal(expected) => expected == actual,
            Matcher::Predicate { test, .. } => test(actual),
            Matcher::Any(None) => true,
            Matcher::Any(Some(ty)) => ty.accepts(actual),
        }
    }

    pub(crate) fn all_match(matchers: &[Matcher], args: &[Value]) -> bool {
        matchers.len() == args.len() && matchers.iter().zip(args).all(|(m, a)| m.matches(a))
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Literal(v) => write!(f, "{v}"),
            Matcher::Predicate { description, .. } => write!(f, "{description}"),
            Matcher::Any(None) => write!(f, "any"),
            Matcher::Any(Some(ty)) => write!(f, "any::<{ty}>"),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Matcher").field(&format_args!("{self}")).finish()
    }
}

impl From<Value> for Matcher {
    fn from(value: Value) -> Self {
        Matcher::Literal(value)
    }
}
