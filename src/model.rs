//! The synthesized configuration handed to the renderer.
//!
//! Everything here is fully resolved. A renderer reads these types without
//! any further conditional logic.

mod server;
mod upstream;

pub use server::*;
pub use upstream::*;

use std::collections::BTreeMap;

use serde::Serialize;

/// Identity of the resource a configuration (or a location) originates from.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressMeta {
    pub name: String,
    pub namespace: String,
    pub annotations: BTreeMap<String, String>,
}

impl IngressMeta {
    /// `<namespace>/<name>`
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// The output of one synthesis call.
///
/// For a master with minions there is exactly one server whose locations
/// and health checks are the concatenation of every minion's.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressConfig {
    pub upstreams: Vec<Upstream>,
    pub servers: Vec<Server>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<String>,
    /// Upstream connections present the mesh client certificate.
    pub spiffe_client_certs: bool,
    pub ingress: IngressMeta,
}
