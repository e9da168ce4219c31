#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

//! The per-test module runtime.
//!
//! Answers "when test code asks for module X, what code actually runs?"
//! and supplies an isolated, mockable require graph to one test file:
//!
//! - Module and mock registries with two-phase registration, so
//!   circular requires observe partial exports
//! - A mock-decision policy (explicit flags, automocking, unmock lists,
//!   transitive suppression across flat installs)
//! - Automock synthesis from the real module's shape, evaluated in an
//!   isolated registry world
//! - A per-module require and a fluent control surface handed to every
//!   executing module
//!
//! The haste index, the source transformer, and the sandbox host are
//! consumed through traits; shipped defaults make the crate testable on
//! its own.

pub mod environment;
pub mod error;
pub mod mock;
pub mod module;
pub mod require;
mod runtime;
pub mod surface;
pub mod transform;
pub mod value;

pub use environment::{CountingTimers, Environment, FakeTimers, TestEnvironment};
pub use error::RuntimeError;
pub use mock::{MockMetadata, ModuleMocker};
pub use module::{ModuleHandle, ModuleRecord};
pub use require::Require;
pub use runtime::{MockFactory, MockOptions, RequireOptions, Runtime, RuntimeConfig};
pub use surface::Surface;
pub use transform::{
    CompiledModule, ScriptedTransformer, TransformError, TransformOptions, Transformer, WrapperFn,
    WrapperScope,
};
pub use value::{JsFunction, NativeFn, Value};
