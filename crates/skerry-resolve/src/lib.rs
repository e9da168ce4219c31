#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! Layered module resolution for skerry.
//!
//! Reconciles three naming regimes, in priority order:
//!
//! - A pre-indexed haste map (flat name → canonical path)
//! - Standard node-style resolution (extension probing, directory
//!   resolution, `node_modules` ancestor walk)
//! - A user-supplied regex rewrite table for mock lookups

pub mod config;
pub mod error;
pub mod haste;
pub mod node_resolution;
mod resolver;

pub use config::{NameMapperEntry, ResolverConfig};
pub use error::ResolveError;
pub use haste::{HasteEntry, HasteMap, HasteModuleType, GENERIC_PLATFORM, NATIVE_PLATFORM};
pub use resolver::{ResolveModuleOptions, Resolver};
