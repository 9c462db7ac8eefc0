use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Features of the target proxy and controller deployment that gate
    /// which annotations are honored and which upstream fields are produced.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capabilities: u8 {
        /// Commercial edition: health checks, JWT, sticky cookies, upstream queues.
        const PLUS = 1;
        /// A DNS resolver is configured, so externally named services can be resolved.
        const RESOLVER = 1 << 1;
        /// A wildcard TLS certificate is available.
        const WILDCARD_TLS = 1 << 2;
        const INTERNAL_ROUTES = 1 << 3;
        const LATENCY_METRICS = 1 << 4;
        /// Deployed inside a service mesh: upstream traffic uses mesh client certificates.
        const SERVICE_MESH = 1 << 5;
        const TLS_PASSTHROUGH = 1 << 6;
        /// The App Protect module is loaded.
        const APP_PROTECT = 1 << 7;
    }
}

impl Capabilities {
    pub fn is_plus(self) -> bool {
        self.contains(Self::PLUS)
    }
}
