use std::collections::{BTreeMap, BTreeSet};

use crate::{
    diagnostics::Warnings,
    params::Capabilities,
    parse::{parse_comma_list, parse_rewrite, parse_sticky_service, ServiceDirective},
};

use super::{GRPC_SERVICES, REWRITES, SSL_SERVICES, STICKY_COOKIE_SERVICES, WEBSOCKET_SERVICES};

/// Per-service directives declared on one Ingress, keyed by service name.
///
/// Services missing from a set or map get the negative default.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceDirectives {
    pub websocket: BTreeSet<String>,
    pub ssl: BTreeSet<String>,
    pub grpc: BTreeSet<String>,
    pub rewrites: BTreeMap<String, String>,
    pub sticky_cookies: BTreeMap<String, String>,
}

impl ServiceDirectives {
    pub fn from_annotations(
        annotations: &BTreeMap<String, String>,
        capabilities: Capabilities,
        resource: &str,
        warnings: &mut Warnings,
    ) -> Self {
        let services = |key: &str| -> BTreeSet<String> {
            annotations
                .get(key)
                .map(|value| parse_comma_list(value).into_iter().collect())
                .unwrap_or_default()
        };

        let sticky_cookies = if capabilities.is_plus() {
            directive_map(
                annotations,
                STICKY_COOKIE_SERVICES,
                parse_sticky_service,
                resource,
                warnings,
            )
        } else {
            BTreeMap::new()
        };

        Self {
            websocket: services(WEBSOCKET_SERVICES),
            ssl: services(SSL_SERVICES),
            grpc: services(GRPC_SERVICES),
            rewrites: directive_map(annotations, REWRITES, parse_rewrite, resource, warnings),
            sticky_cookies,
        }
    }

    pub fn is_websocket(&self, service: &str) -> bool {
        self.websocket.contains(service)
    }

    pub fn is_ssl(&self, service: &str) -> bool {
        self.ssl.contains(service)
    }

    pub fn is_grpc(&self, service: &str) -> bool {
        self.grpc.contains(service)
    }

    pub fn rewrite(&self, service: &str) -> Option<&str> {
        self.rewrites.get(service).map(String::as_str)
    }

    pub fn sticky_cookie(&self, service: &str) -> Option<&str> {
        self.sticky_cookies.get(service).map(String::as_str)
    }
}

/// Parses a `;` separated list of service directives. A malformed entry is
/// skipped as a whole; a later entry for the same service replaces an earlier one.
fn directive_map(
    annotations: &BTreeMap<String, String>,
    key: &str,
    parse: fn(&str) -> Result<ServiceDirective, crate::error::ParseError>,
    resource: &str,
    warnings: &mut Warnings,
) -> BTreeMap<String, String> {
    let Some(value) = annotations.get(key) else {
        return BTreeMap::new();
    };

    let mut directives = BTreeMap::new();

    for declaration in value.split(';').filter(|d| !d.trim().is_empty()) {
        match parse(declaration) {
            Ok(ServiceDirective {
                service_name,
                payload,
            }) => {
                directives.insert(service_name, payload);
            }
            Err(err) => warnings.push(resource, format!("{key} contains {err}, ignoring")),
        }
    }

    directives
}
