#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Decoy
//!
//! An interception and expectation engine for dynamic test doubles.
//!
//! Decoy builds a stand-in object for a declared capability (an interface or
//! an overridable class), routes every member access on it through a
//! per-mock interceptor, answers with configured behavior or sensible
//! defaults, logs every call, and verifies afterwards that the code under
//! test made the calls it was expected to make.
//!
//! ## Quick Start
//!
//! ```rust
//! use decoy::{Call, Capability, Matcher, Mock, Times, TypeDesc, args};
//!
//! # fn main() -> decoy::Result {
//! let calculator = Capability::interface("Calculator")
//!     .method("Add", [TypeDesc::Int, TypeDesc::Int], TypeDesc::Int)
//!     .property("Total", TypeDesc::Int);
//!
//! let mock = Mock::loose(calculator);
//! mock.setup(Call::method("Add").arg(1).arg(2))?.returns(3);
//! mock.setup(Call::method("Add").with(Matcher::range(100..=200)).with(Matcher::any()))?
//!     .returns(-1);
//!
//! let calc = mock.object();
//! assert_eq!(calc.call_as::<i32>("Add", args![1, 2])?, 3);
//! assert_eq!(calc.call_as::<i32>("Add", args![150, 7])?, -1);
//! assert_eq!(calc.call_as::<i32>("Add", args![2, 2])?, 0);
//!
//! mock.verify_call(Call::method("Add").arg(1).arg(2), Times::once())?;
//! mock.verify_call(Call::method("Add").arg(9).arg(9), Times::never())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Capability`] | Declared members and events of an interface or class |
//! | [`Mock`] | Owns setups, the invocation log and auto-created children |
//! | [`Substitute`] | The stand-in object handed to code under test |
//! | [`Call`] | Description of a call, used for setup and verification |
//! | [`Matcher`] | Argument pattern: literal, predicate or wildcard |
//! | [`Setup`] | Builder for the behavior of a registered expectation |
//! | [`Times`] | Inclusive call-count range used by verification |
//! | [`DefaultValue`] | Strategy for results nothing was configured for |
//! | [`Value`] | Dynamic value passed through the interceptor |
//!
//! ## Behavior
//!
//! A [`Behavior::Loose`] mock answers unconfigured calls from its
//! [`DefaultValue`] strategy. A [`Behavior::Strict`] mock fails them with
//! [`Error::UnmatchedStrictCall`]. When several setups match the same call,
//! the one registered last answers.
//!
//! ## Chained Setups
//!
//! A [`Call`] with several segments configures a path through auto-created
//! child mocks:
//!
//! ```rust
//! use decoy::{Call, Capability, Mock, TypeDesc, args};
//!
//! fn connection() -> Capability {
//!     Capability::interface("Connection").method("Execute", [TypeDesc::Str], TypeDesc::Int)
//! }
//!
//! # fn main() -> decoy::Result {
//! let service = Capability::interface("Service")
//!     .readonly_property("Connection", TypeDesc::Capability(connection));
//!
//! let mock = Mock::loose(service);
//! mock.setup(Call::get("Connection").then_method("Execute").arg("ping"))?.returns(1);
//!
//! let conn = mock.object().get_as::<decoy::Substitute>("Connection")?;
//! assert_eq!(conn.call_as::<i64>("Execute", args!["ping"])?, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Decoy emits [`tracing`] events: `trace` for every intercepted call and
//! raised event, `debug` for registered setups, auto-created children,
//! strict rejections and failed verifications. Install any subscriber to see
//! them.
//!
//! ## Features
//!
//! - **`serde`** - Serialization of identifiers and policies, and JSON export
//!   of a mock's state (`Mock::to_json()`)
//!
//! ## Examples
//!
//! See the [`examples/`](https://github.com/decoy-rs/decoy/tree/main/decoy/examples) directory:
//!
//! - `calculator.rs` - Setups, defaults, strict mode and verification
//! - `auto_mock.rs` - Chained setups, recursive verification and events

mod behavior;
mod call;
mod capability;
mod chain;
mod default_value;
mod error;
mod event;
mod expectation;
mod interceptor;
mod invocation;
mod matcher;
mod member_id;
mod mock;
mod mock_config;
mod mock_id;
mod setup;
mod substitute;
mod times;
mod type_desc;
mod value;
mod verification;

mod internal;

pub use behavior::Behavior;
pub use call::{Call, Segment};
pub use capability::{Capability, CapabilityKind, Member, MemberKind};
pub use default_value::{DefaultValue, DefaultValueProvider, EmptyDefault, MockDefault};
pub use error::Error;
pub use event::Handler;
pub use expectation::Expectation;
pub use invocation::Invocation;
pub use matcher::Matcher;
pub use member_id::{Access, MemberId};
pub use mock::Mock;
pub use mock_config::MockConfig;
pub use mock_id::MockId;
pub use setup::Setup;
pub use substitute::{BaseImplementation, Proxy, Substitute};
pub use times::Times;
pub use type_desc::TypeDesc;
pub use value::{FromValue, Opaque, Value};
pub use verification::{SetupReport, VerificationError};

/// Convenience alias for `Result<T, decoy::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
