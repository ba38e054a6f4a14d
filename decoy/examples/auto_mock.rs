//! Auto-Mock Example
//!
//! A `Service` exposes a `Repository`, which exposes a `Connection`. One
//! chained setup configures the whole path: intermediate mocks are created on
//! the fly and reused by every later setup that walks the same prefix.
//!
//! The example also shows recursive verification across those children and
//! events raised from a setup.

use std::sync::{Arc, Mutex};

use decoy::*;

fn connection() -> Capability {
    Capability::interface("Connection")
        .method("Execute", [TypeDesc::Str], TypeDesc::Int)
        .event("Closed")
}

fn repository() -> Capability {
    Capability::interface("Repository")
        .readonly_property("Connection", TypeDesc::Capability(connection))
        .method("Find", [TypeDesc::Int], TypeDesc::option(TypeDesc::Str))
}

fn service() -> Capability {
    Capability::interface("Service")
        .readonly_property("Repository", TypeDesc::Capability(repository))
        .property("Retries", TypeDesc::Int)
}

fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mock = Mock::new(
        service(),
        MockConfig::default().with_default_value(DefaultValue::Mock),
    );
    mock.setup_all_properties()?;

    mock.setup(Call::get("Repository").then_method("Find").arg(7))?
        .returns("seven")
        .verifiable();
    mock.setup(
        Call::get("Repository")
            .then_get("Connection")
            .then_method("Execute")
            .with(Matcher::described("a DELETE statement", |v| {
                v.as_str().is_some_and(|s| s.starts_with("DELETE"))
            })),
    )?
    .raises("Closed", args![])
    .returns(-1);

    let closed = Arc::new(Mutex::new(0));
    let counter = closed.clone();
    let svc = mock.object();
    let repo = svc.get_as::<Substitute>("Repository")?;
    let conn = repo.get_as::<Substitute>("Connection")?;
    conn.subscribe(
        "Closed",
        &Handler::new(move |_| {
            if let Ok(mut n) = counter.lock() {
                *n += 1;
            }
            Ok(())
        }),
    )?;

    println!("Find(7) = {:?}", repo.call_as::<Option<String>>("Find", args![7])?);
    println!("Find(8) = {:?}", repo.call_as::<Option<String>>("Find", args![8])?);
    println!("Execute = {}", conn.call("Execute", args!["DELETE FROM users"])?);
    println!("Execute = {}", conn.call("Execute", args!["SELECT 1"])?);
    println!("Closed raised {:?} times", closed.lock().map(|n| *n).unwrap_or_default());

    svc.set("Retries", 3)?;
    println!("Retries = {}", svc.get("Retries")?);

    // Walking the same prefix twice yields the same child.
    assert_eq!(repo, svc.get_as::<Substitute>("Repository")?);
    println!("children of the root: {}", mock.inner_mocks().len());

    mock.verify()?;
    mock.verify_call(
        Call::get("Repository").then_get("Connection").then_method("Execute").with(Matcher::any()),
        Times::exactly(2),
    )?;

    // Every setup, including the one on the connection, has matched.
    match mock.verify_all() {
        Ok(()) => println!("all setups satisfied"),
        Err(e) => println!("{e}"),
    }

    Ok(())
}
