use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{MemberId, Mock, Result, TypeDesc, Value};

/// Supplies the result of a call nothing was configured for.
///
/// Consulted by loose mocks for unmatched calls and for setups that give
/// no return value.
pub trait DefaultValueProvider: Send + Sync {
    /// Produce a value of type `ty` for `member`, called on `mock`.
    fn provide(&self, ty: &TypeDesc, member: &MemberId, mock: &Mock) -> Result<Value>;
}

/// Zero for value-like types, empty for collections, `Null` for references.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDefault;

impl EmptyDefault {
    /// The empty value of `ty`, without consulting any mock.
    pub fn value_of(ty: &TypeDesc) -> Value {
        match ty {
            TypeDesc::Unit => Value::Unit,
            TypeDesc::Bool => Value::Bool(false),
            TypeDesc::Int => Value::Int(0),
            TypeDesc::UInt => Value::UInt(0),
            TypeDesc::Float => Value::Float(0.0),
            TypeDesc::Char => Value::Char('\0'),
            TypeDesc::Str => Value::from(""),
            TypeDesc::List(_) => Value::List(Vec::new()),
            TypeDesc::Map(_) => Value::Map(BTreeMap::new()),
            TypeDesc::Option(_) | TypeDesc::Capability(_) | TypeDesc::Opaque(_) => Value::Null,
        }
    }
}

impl DefaultValueProvider for EmptyDefault {
    fn provide(&self, ty: &TypeDesc, _member: &MemberId, _mock: &Mock) -> Result<Value> {
        Ok(Self::value_of(ty))
    }
}

/// Answers capability-typed members with a child mock, everything else like
/// [`EmptyDefault`].
///
/// The child is created on first use and cached on the parent under the
/// member it came from, so repeated calls hand out the same substitute.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDefault;

impl DefaultValueProvider for MockDefault {
    fn provide(&self, ty: &TypeDesc, member: &MemberId, mock: &Mock) -> Result<Value> {
        match ty.capability() {
            Some(capability) => {
                let child = mock.inner_mock_or_create(member, capability);
                Ok(Value::Object(child.object()))
            }
            None => Ok(EmptyDefault::value_of(ty)),
        }
    }
}

/// Strategy a mock uses for calls without a configured result.
#[derive(Clone, Default)]
pub enum DefaultValue {
    /// See [`EmptyDefault`].
    #[default]
    Empty,
    /// See [`MockDefault`].
    Mock,
    Custom(Arc<dyn DefaultValueProvider>),
}

impl DefaultValue {
    pub fn custom(provider: impl DefaultValueProvider + 'static) -> Self {
        DefaultValue::Custom(Arc::new(provider))
    }

    pub(crate) fn provide(&self, ty: &TypeDesc, member: &MemberId, mock: &Mock) -> Result<Value> {
        match self {
            DefaultValue::Empty => EmptyDefault.provide(ty, member, mock),
            DefaultValue::Mock => MockDefault.provide(ty, member, mock),
            DefaultValue::Custom(provider) => provider.provide(ty, member, mock),
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, DefaultValue::Mock)
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Empty => write!(f, "Empty"),
            DefaultValue::Mock => write!(f, "Mock"),
            DefaultValue::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
