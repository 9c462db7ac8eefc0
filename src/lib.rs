//! Resolves Ingress annotations and a global configuration map into a typed
//! reverse-proxy configuration model.
//!
//! Resolution runs bottom-up:
//!
//! 1. [`ParameterSet::from_global`] layers the global configuration map over
//!    the built-in defaults.
//! 2. [`ingress::generate_ingress_config`] resolves one resource's annotations
//!    over that base and synthesizes its upstreams, servers and locations.
//! 3. [`ingress::generate_mergeable_config`] composes a master with its
//!    minions into a single server.
//!
//! Nothing here performs I/O. Invalid values fall back to the inherited value
//! and are reported through [`Warnings`].

pub mod annotations;
pub mod cmd;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ingress;
pub mod logging;
pub mod model;
pub mod params;
pub mod parse;
pub mod snapshot;

pub use diagnostics::{Warning, Warnings};
pub use params::{Capabilities, ParameterSet};
