//! Calculator Example
//!
//! Mocks a `Calculator` capability behind a typed proxy and exercises it from
//! a small piece of "production" code.
//!
//! Demonstrates:
//! - literal and predicate argument matchers
//! - loose defaults vs. strict rejection
//! - thrown errors and callbacks
//! - verification with `Times`
//!
//! Run with `RUST_LOG=decoy=trace` to see every intercepted call.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use decoy::*;
use tracing_subscriber::EnvFilter;

trait Calculator {
    fn add(&self, a: i64, b: i64) -> Result<i64>;
    fn divide(&self, a: i64, b: i64) -> Result<i64>;
}

/// Typed view over the substitute.
struct CalculatorProxy(Substitute);

impl Proxy for CalculatorProxy {
    fn capability() -> Capability {
        Capability::interface("Calculator")
            .method("Add", [TypeDesc::Int, TypeDesc::Int], TypeDesc::Int)
            .method("Divide", [TypeDesc::Int, TypeDesc::Int], TypeDesc::Int)
    }

    fn from_substitute(substitute: Substitute) -> Self {
        Self(substitute)
    }
}

impl Calculator for CalculatorProxy {
    fn add(&self, a: i64, b: i64) -> Result<i64> {
        self.0.call_as("Add", args![a, b])
    }

    fn divide(&self, a: i64, b: i64) -> Result<i64> {
        self.0.call_as("Divide", args![a, b])
    }
}

/// Code under test: averages a list through the calculator.
fn average(calc: &impl Calculator, values: &[i64]) -> Result<i64> {
    let mut sum = 0;
    for v in values {
        sum = calc.add(sum, *v)?;
    }
    calc.divide(sum, values.len() as i64)
}

#[derive(Debug, thiserror::Error)]
#[error("division by zero")]
struct DivideByZero;

fn main() -> Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Loose mock: anything unconfigured answers with zero.
    let mock = Mock::of::<CalculatorProxy>(Behavior::Loose);
    let adds = Arc::new(AtomicUsize::new(0));
    let counter = adds.clone();
    mock.setup(Call::method("Add").with(Matcher::any()).with(Matcher::any()))?
        .returns_with(|args| {
            let a = args[0].as_i64().unwrap_or_default();
            let b = args[1].as_i64().unwrap_or_default();
            Value::Int(a + b)
        })
        .callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    mock.setup(Call::method("Divide").with(Matcher::any()).with(Matcher::any()))?
        .returns_with(|args| {
            let a = args[0].as_i64().unwrap_or_default();
            let b = args[1].as_i64().unwrap_or(1);
            Value::Int(a / b)
        });
    mock.setup(Call::method("Divide").with(Matcher::any()).arg(0))?
        .throws(DivideByZero);

    let calc = mock.object_as::<CalculatorProxy>()?;
    println!("average = {}", average(&calc, &[2, 4, 6])?);
    println!("average of nothing = {:?}", average(&calc, &[]).err());
    println!("Add was called {} times", adds.load(Ordering::SeqCst));

    mock.verify_call(Call::method("Add").with(Matcher::any()).with(Matcher::any()), 3usize)?;
    mock.verify_call(
        Call::method("Divide").with(Matcher::range(1..=i64::MAX)).with(Matcher::any()),
        Times::once(),
    )?;

    // Verification failures carry the expected call, the count and the setups.
    if let Err(e) = mock.verify_call(Call::method("Add").arg(0).arg(2), Times::exactly(2)) {
        println!("\n{e}\n");
    }

    // Strict mock: unconfigured calls fail loudly.
    let strict = Mock::of::<CalculatorProxy>(Behavior::Strict);
    strict.setup(Call::method("Add").arg(1).arg(1))?.returns(2);
    let calc = strict.object_as::<CalculatorProxy>()?;
    println!("1 + 1 = {}", calc.add(1, 1)?);
    match calc.add(2, 2) {
        Ok(v) => println!("unexpected: {v}"),
        Err(e) => println!("strict: {e}"),
    }

    Ok(())
}
