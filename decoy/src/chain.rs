//! Resolution of chained member access into per-hop child mocks.
//!
//! `Call::get("Repository").then_method("Find")` applied to a root mock
//! walks `Repository` first: the hop must return a mockable capability, and
//! the root caches one child mock for it. `Find` is then configured on that
//! child. Walking the same prefix again reuses the cached children, so every
//! setup through `Repository` lands on the same interceptor.

use std::sync::Arc;

use crate::{
    Access, Call, Capability, Error, Expectation, Member, MemberId, Mock, Result, TypeDesc, Value,
    call::Segment,
    mock::validate_target,
};

/// Where a walk currently stands.
pub(crate) enum Cursor {
    /// A live mock.
    Live(Mock),
    /// A hop that was never traversed: no child exists yet, only its capability.
    Absent(Capability),
}

impl Cursor {
    pub(crate) fn find_member(&self, name: &str) -> Option<(Arc<Capability>, Member)> {
        match self {
            Cursor::Live(mock) => mock.find_member(name),
            Cursor::Absent(capability) => capability
                .member(name)
                .map(|m| (Arc::new(capability.clone()), m.clone())),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Cursor::Live(mock) => mock.to_string(),
            Cursor::Absent(capability) => capability.name().to_string(),
        }
    }
}

/// A hop checked against the current capability set.
struct ResolvedHop {
    id: MemberId,
    returns: TypeDesc,
    child: Capability,
}

fn resolve_hop(cursor: &Cursor, hop: &Segment) -> Result<ResolvedHop> {
    let (capability, member) = cursor
        .find_member(hop.name())
        .ok_or_else(|| Error::configuration(hop.name(), format!("not a member of {}", cursor.describe())))?;
    let id = capability.member_id(&member, hop.access());

    if !member.is_overridable() {
        return Err(Error::not_supported_chain(id, "member is not overridable"));
    }
    if hop.access() == Access::Set || !member.supports(hop.access()) {
        return Err(Error::not_supported_chain(id, "hop must read a value"));
    }
    let params = member.params(hop.access());
    if params.len() != hop.matchers().len() {
        return Err(Error::configuration(
            id,
            format!("expected {} arguments, got {}", params.len(), hop.matchers().len()),
        ));
    }
    let returns = member.returns(hop.access());
    let child = returns.capability().ok_or_else(|| {
        Error::not_supported_chain(&id, format!("returns {returns}, which is not a mockable capability"))
    })?;
    Ok(ResolvedHop { id, returns, child })
}

fn start(mock: &Mock, call: &Call) -> Mock {
    // A call rooted at a captured instance goes straight to that instance's mock.
    match &call.root {
        Some(instance) => instance.mock(),
        None => mock.clone(),
    }
}

/// Check every hop and the target of `call` without creating anything.
///
/// Returns where the walk ends and the target's identity and result type.
pub(crate) fn resolve_target(mock: &Mock, call: &Call) -> Result<(Cursor, MemberId, TypeDesc)> {
    let cursor = resolve_for_lookup(mock, call)?;
    let (id, returns) = validate_target(
        |name| cursor.find_member(name),
        &cursor.describe(),
        call.target(),
    )?;
    Ok((cursor, id, returns))
}

/// Walk every hop of `call`, creating and caching children as needed, and
/// register a hop expectation on each parent answering with its child.
///
/// Callers run [`resolve_target`] first, so a chain that fails part-way
/// leaves no children or hop expectations behind.
pub(crate) fn resolve_for_setup(mock: &Mock, call: &Call) -> Result<Mock> {
    let mut current = start(mock, call);
    for hop in call.hops() {
        let resolved = resolve_hop(&Cursor::Live(current.clone()), hop)?;
        let child = current.inner_mock_or_create(&resolved.id, resolved.child);
        let link = Expectation::hop(
            resolved.id,
            hop.matchers().to_vec(),
            resolved.returns,
            Value::Object(child.object()),
        );
        current.add_expectation(Arc::new(link));
        current = child;
    }
    Ok(current)
}

/// Walk every hop of `call` without creating anything. Untraversed hops
/// yield [`Cursor::Absent`], whose log is empty by definition.
pub(crate) fn resolve_for_lookup(mock: &Mock, call: &Call) -> Result<Cursor> {
    let mut cursor = Cursor::Live(start(mock, call));
    for hop in call.hops() {
        let resolved = resolve_hop(&cursor, hop)?;
        cursor = match &cursor {
            Cursor::Live(current) => match current.inner_mock(&resolved.id) {
                Some(child) => Cursor::Live(child),
                None => Cursor::Absent(resolved.child),
            },
            Cursor::Absent(_) => Cursor::Absent(resolved.child),
        };
    }
    Ok(cursor)
}
