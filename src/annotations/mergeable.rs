//! Which annotations a master or a minion Ingress may carry, and which
//! master annotations flow down into its minions.

use std::collections::BTreeMap;

use super::{GRPC_SERVICES, REWRITES, SSL_SERVICES, STICKY_COOKIE_SERVICES, WEBSOCKET_SERVICES};

/// Location scoped annotations. A master owns no locations.
const MASTER_DENYLIST: &[&str] = &[
    REWRITES,
    SSL_SERVICES,
    GRPC_SERVICES,
    WEBSOCKET_SERVICES,
    STICKY_COOKIE_SERVICES,
    "nginx.com/health-checks",
    "nginx.com/health-checks-mandatory",
    "nginx.com/health-checks-mandatory-queue",
];

/// Server scoped annotations. Only the master configures the shared server.
const MINION_DENYLIST: &[&str] = &[
    "nginx.org/proxy-hide-headers",
    "nginx.org/proxy-pass-headers",
    "nginx.org/redirect-to-https",
    "ingress.kubernetes.io/ssl-redirect",
    "nginx.org/hsts",
    "nginx.org/hsts-max-age",
    "nginx.org/hsts-include-subdomains",
    "nginx.org/hsts-behind-proxy",
    "nginx.org/server-tokens",
    "nginx.org/listen-ports",
    "nginx.org/listen-ports-ssl",
    "nginx.org/server-snippets",
];

/// Master annotations a minion inherits unless it declares them itself.
const MINION_INHERITANCE_LIST: &[&str] = &[
    "nginx.org/proxy-connect-timeout",
    "nginx.org/proxy-read-timeout",
    "nginx.org/proxy-send-timeout",
    "nginx.org/client-max-body-size",
    "nginx.org/proxy-buffering",
    "nginx.org/proxy-buffers",
    "nginx.org/proxy-buffer-size",
    "nginx.org/proxy-max-temp-file-size",
    "nginx.org/upstream-zone-size",
    "nginx.org/location-snippets",
    "nginx.org/lb-method",
    "nginx.org/keepalive",
    "nginx.org/max-fails",
    "nginx.org/max-conns",
    "nginx.org/fail-timeout",
];

pub fn is_master_allowed(key: &str) -> bool {
    !MASTER_DENYLIST.contains(&key)
}

pub fn is_minion_allowed(key: &str) -> bool {
    !MINION_DENYLIST.contains(&key)
}

pub fn is_inherited_by_minion(key: &str) -> bool {
    MINION_INHERITANCE_LIST.contains(&key)
}

/// The allowed annotations and the keys that were dropped, in key order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilteredAnnotations {
    pub annotations: BTreeMap<String, String>,
    pub removed: Vec<String>,
}

fn filter_annotations(
    annotations: &BTreeMap<String, String>,
    is_allowed: impl Fn(&str) -> bool,
) -> FilteredAnnotations {
    let (allowed, removed): (BTreeMap<_, _>, BTreeMap<_, _>) = annotations
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(key, _)| is_allowed(key.as_str()));

    FilteredAnnotations {
        annotations: allowed,
        removed: removed.into_keys().collect(),
    }
}

/// Drops the annotations a master Ingress must not declare.
pub fn filter_master_annotations(annotations: &BTreeMap<String, String>) -> FilteredAnnotations {
    filter_annotations(annotations, is_master_allowed)
}

/// Drops the annotations a minion Ingress must not declare.
pub fn filter_minion_annotations(annotations: &BTreeMap<String, String>) -> FilteredAnnotations {
    filter_annotations(annotations, is_minion_allowed)
}

/// Returns the minion annotations extended with the inheritable master
/// annotations the minion does not declare. Minion values always win.
pub fn merge_master_annotations_into_minion(
    minion: &BTreeMap<String, String>,
    master: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = minion.clone();

    for (key, value) in master {
        if is_inherited_by_minion(key) && !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}
