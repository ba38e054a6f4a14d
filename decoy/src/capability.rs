use std::{fmt, sync::Arc};

use crate::{Access, MemberId, TypeDesc};

/// Whether a capability is a pure interface or a class-like type.
///
/// Only interfaces can be added to a mock after creation
/// (see [`Mock::add_capability`](crate::Mock::add_capability)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CapabilityKind {
    #[default]
    Interface,
    Class,
}

/// Shape of a declared member.
#[derive(Debug, Clone)]
pub enum MemberKind {
    Method {
        params: Vec<TypeDesc>,
        returns: TypeDesc,
    },
    Property {
        ty: TypeDesc,
        readable: bool,
        writable: bool,
    },
    /// A plain data field. Never interceptable.
    Field { ty: TypeDesc },
}

/// One entry of a capability's member registry.
#[derive(Debug, Clone)]
pub struct Member {
    name: Arc<str>,
    kind: MemberKind,
    overridable: bool,
    is_static: bool,
}

impl Member {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    /// Returns `true` if a substitute can intercept this member.
    pub fn is_overridable(&self) -> bool {
        self.overridable && !self.is_static && !matches!(self.kind, MemberKind::Field { .. })
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Returns `true` for readable and writable properties.
    pub fn is_read_write(&self) -> bool {
        matches!(
            self.kind,
            MemberKind::Property {
                readable: true,
                writable: true,
                ..
            }
        )
    }

    /// Declared parameter types for the given access.
    pub fn params(&self, access: Access) -> Vec<TypeDesc> {
        match (&self.kind, access) {
            (MemberKind::Method { params, .. }, _) => params.clone(),
            (MemberKind::Property { ty, .. } | MemberKind::Field { ty }, Access::Set) => {
                vec![ty.clone()]
            }
            _ => Vec::new(),
        }
    }

    /// Declared result type for the given access.
    pub fn returns(&self, access: Access) -> TypeDesc {
        match (&self.kind, access) {
            (MemberKind::Method { returns, .. }, _) => returns.clone(),
            (_, Access::Set) => TypeDesc::Unit,
            (MemberKind::Property { ty, .. } | MemberKind::Field { ty }, _) => ty.clone(),
        }
    }

    /// Returns `true` if the member can be reached with `access`.
    pub fn supports(&self, access: Access) -> bool {
        match (&self.kind, access) {
            (MemberKind::Method { .. }, Access::Call) => true,
            (MemberKind::Property { readable, .. }, Access::Get) => *readable,
            (MemberKind::Property { writable, .. }, Access::Set) => *writable,
            (MemberKind::Field { .. }, Access::Get | Access::Set) => true,
            _ => false,
        }
    }
}

/// A declared set of members that a mock can stand in for.
///
/// The registry is supplied up front rather than discovered by reflection:
/// every method, property, field and event a substitute may receive is
/// listed here.
///
/// # Example
///
/// ```rust
/// use decoy::{Capability, TypeDesc};
///
/// let calculator = Capability::interface("Calculator")
///     .method("Add", [TypeDesc::Int, TypeDesc::Int], TypeDesc::Int)
///     .property("Total", TypeDesc::Int)
///     .event("Overflowed");
///
/// assert_eq!(calculator.name(), "Calculator");
/// assert!(calculator.member("Add").is_some());
/// assert!(calculator.has_event("Overflowed"));
/// ```
#[derive(Debug, Clone)]
pub struct Capability {
    name: Arc<str>,
    kind: CapabilityKind,
    members: Vec<Member>,
    events: Vec<Arc<str>>,
}

impl Capability {
    /// Start declaring an interface capability.
    pub fn interface(name: &str) -> Self {
        Self::new(name, CapabilityKind::Interface)
    }

    /// Start declaring a class-like capability. Members default to overridable;
    /// use [`sealed_method`](Self::sealed_method) and friends for the rest.
    pub fn class(name: &str) -> Self {
        Self::new(name, CapabilityKind::Class)
    }

    fn new(name: &str, kind: CapabilityKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            members: Vec::new(),
            events: Vec::new(),
        }
    }

    fn push(mut self, name: &str, kind: MemberKind, overridable: bool, is_static: bool) -> Self {
        self.members.push(Member {
            name: Arc::from(name),
            kind,
            overridable,
            is_static,
        });
        self
    }

    pub fn method(self, name: &str, params: impl Into<Vec<TypeDesc>>, returns: TypeDesc) -> Self {
        let kind = MemberKind::Method {
            params: params.into(),
            returns,
        };
        self.push(name, kind, true, false)
    }

    /// A method the substitute cannot override.
    pub fn sealed_method(
        self,
        name: &str,
        params: impl Into<Vec<TypeDesc>>,
        returns: TypeDesc,
    ) -> Self {
        let kind = MemberKind::Method {
            params: params.into(),
            returns,
        };
        self.push(name, kind, false, false)
    }

    pub fn static_method(
        self,
        name: &str,
        params: impl Into<Vec<TypeDesc>>,
        returns: TypeDesc,
    ) -> Self {
        let kind = MemberKind::Method {
            params: params.into(),
            returns,
        };
        self.push(name, kind, false, true)
    }

    /// A readable and writable property.
    pub fn property(self, name: &str, ty: TypeDesc) -> Self {
        self.property_with(name, ty, true, true)
    }

    pub fn readonly_property(self, name: &str, ty: TypeDesc) -> Self {
        self.property_with(name, ty, true, false)
    }

    pub fn writeonly_property(self, name: &str, ty: TypeDesc) -> Self {
        self.property_with(name, ty, false, true)
    }

    fn property_with(self, name: &str, ty: TypeDesc, readable: bool, writable: bool) -> Self {
        let kind = MemberKind::Property {
            ty,
            readable,
            writable,
        };
        self.push(name, kind, true, false)
    }

    pub fn field(self, name: &str, ty: TypeDesc) -> Self {
        self.push(name, MemberKind::Field { ty }, false, false)
    }

    pub fn event(mut self, name: &str) -> Self {
        self.events.push(Arc::from(name));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == CapabilityKind::Interface
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| &*m.name == name)
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| &**e == name)
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| &**e)
    }

    pub(crate) fn member_id(&self, member: &Member, access: Access) -> MemberId {
        MemberId::from_parts(self.name.clone(), member.name.clone(), access)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
