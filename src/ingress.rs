//! Configuration synthesis for a single Ingress resource.
//!
//! [`generate_ingress_config`] resolves the resource's annotations over the
//! effective base parameters and builds the upstreams, servers and locations
//! the renderer consumes. [`mergeable`] composes a master with its minions.

mod jwt;
pub mod mergeable;
mod tls;
mod upstream;

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::{
    core::v1::Probe,
    networking::v1::{Ingress, IngressBackend},
};
use kube::ResourceExt;
use serde::Deserialize;

use crate::{
    annotations::{resolve_annotations, service::ServiceDirectives, GRPC_SERVICES},
    diagnostics::Warnings,
    model::{IngressConfig, IngressMeta, Location, Server},
    params::{Capabilities, ParameterSet},
};

use self::upstream::ServiceBackend;

pub use self::mergeable::{generate_mergeable_config, MergeableIngresses};

pub const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";
pub const SECRET_TYPE_JWK: &str = "nginx.org/jwk";

pub const APP_PROTECT_POLICY_KEY: &str = "policy";
pub const APP_PROTECT_LOG_CONF_KEY: &str = "logconf";

const PATH_TYPE_EXACT: &str = "Exact";

/// Already resolved location of a referenced secret.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    #[serde(rename = "type")]
    pub secret_type: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl SecretReference {
    pub fn is_valid(&self, secret_type: &str) -> bool {
        self.error.is_none() && self.secret_type == secret_type
    }
}

/// An Ingress together with the snapshots of everything it references.
///
/// `endpoints` and `health_checks` are keyed by `<service>:<port>`, where
/// port is the backend's port number or port name.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressEx {
    pub ingress: Ingress,
    #[serde(default)]
    pub endpoints: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub health_checks: BTreeMap<String, Probe>,
    #[serde(default)]
    pub external_name_services: BTreeSet<String>,
    #[serde(default)]
    pub valid_hosts: BTreeSet<String>,
    #[serde(default)]
    pub valid_minion_paths: BTreeSet<String>,
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretReference>,
    /// Compiled App Protect bundles keyed by [`APP_PROTECT_POLICY_KEY`] and
    /// [`APP_PROTECT_LOG_CONF_KEY`].
    #[serde(default)]
    pub app_protect_resources: BTreeMap<String, String>,
}

impl IngressEx {
    pub fn meta(&self) -> IngressMeta {
        IngressMeta {
            name: self.ingress.name_any(),
            namespace: self.ingress.namespace().unwrap_or_default(),
            annotations: self.ingress.annotations().clone(),
        }
    }

    fn default_backend(&self) -> Option<&IngressBackend> {
        self.ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.default_backend.as_ref())
    }
}

/// The view of an [`IngressEx`] one synthesis pass works on.
///
/// Composition replaces the annotations or strips the server-only parts
/// without touching the caller's resource.
struct Declaration<'a> {
    ing_ex: &'a IngressEx,
    meta: IngressMeta,
    default_backend: Option<&'a IngressBackend>,
    app_protect_resources: Option<&'a BTreeMap<String, String>>,
}

impl<'a> Declaration<'a> {
    fn new(ing_ex: &'a IngressEx) -> Self {
        Self {
            ing_ex,
            meta: ing_ex.meta(),
            default_backend: ing_ex.default_backend(),
            app_protect_resources: Some(&ing_ex.app_protect_resources),
        }
    }

    fn with_annotations(mut self, annotations: BTreeMap<String, String>) -> Self {
        self.meta.annotations = annotations;
        self
    }

    /// A minion contributes no default backend and no App Protect bundles.
    fn as_minion(mut self) -> Self {
        self.default_backend = None;
        self.app_protect_resources = None;
        self
    }
}

/// Everything resolved once per resource and shared by its servers.
struct Synthesis<'a> {
    ing_ex: &'a IngressEx,
    meta: &'a IngressMeta,
    resource: String,
    params: ParameterSet,
    services: ServiceDirectives,
    capabilities: Capabilities,
    app_protect_resources: Option<&'a BTreeMap<String, String>>,
}

/// Synthesizes the configuration of one Ingress.
///
/// With `is_minion` only pre-validated paths are routed and token auth is
/// attached to each location instead of the server.
pub fn generate_ingress_config(
    ing_ex: &IngressEx,
    base: &ParameterSet,
    is_minion: bool,
    capabilities: Capabilities,
    warnings: &mut Warnings,
) -> IngressConfig {
    synthesize(
        Declaration::new(ing_ex),
        base,
        is_minion,
        capabilities,
        warnings,
    )
}

fn synthesize(
    declaration: Declaration,
    base: &ParameterSet,
    is_minion: bool,
    capabilities: Capabilities,
    warnings: &mut Warnings,
) -> IngressConfig {
    let Declaration {
        ing_ex,
        meta,
        default_backend,
        app_protect_resources,
    } = declaration;

    let resource = meta.key();

    let params = resolve_annotations(&meta.annotations, base, capabilities, &resource, warnings);

    let mut services =
        ServiceDirectives::from_annotations(&meta.annotations, capabilities, &resource, warnings);

    if !services.grpc.is_empty() && !params.http2 {
        warnings.push(
            &resource,
            format!("{GRPC_SERVICES} requires http2, ignoring"),
        );
        services.grpc.clear();
    }

    let synthesis = Synthesis {
        ing_ex,
        meta: &meta,
        resource,
        params,
        services,
        capabilities,
        app_protect_resources,
    };

    let mut upstreams = BTreeMap::new();

    let default_backend =
        default_backend.and_then(|backend| synthesis.service_backend(backend, warnings));

    if let Some(backend) = &default_backend {
        let name = synthesis.upstream_name("", backend);
        let upstream = synthesis.build_upstream(&name, backend, warnings);
        upstreams.insert(name, upstream);
    }

    let mut servers = Vec::new();

    let rules = ing_ex
        .ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_deref())
        .unwrap_or_default();

    for rule in rules {
        let host = rule.host.as_deref().unwrap_or_default();

        if !ing_ex.valid_hosts.contains(host) {
            continue;
        }

        let mut server = synthesis.server(host, warnings);

        let jwt = synthesis.jwt_auth(warnings);

        if !is_minion {
            if let Some((auth, redirect)) = &jwt {
                server.jwt_auth = Some(auth.clone());
                server.jwt_redirect_locations.extend(redirect.clone());
            }
        }

        let paths = rule
            .http
            .as_ref()
            .map(|http| http.paths.as_slice())
            .unwrap_or_default();

        let mut routed_services = Vec::new();
        let mut has_root_location = false;

        for path in paths {
            let raw_path = path.path.as_deref().unwrap_or_default();

            if is_minion && !ing_ex.valid_minion_paths.contains(raw_path) {
                continue;
            }

            let Some(backend) = synthesis.service_backend(&path.backend, warnings) else {
                continue;
            };

            let name = synthesis.upstream_name(host, &backend);

            if let Some(health_check) = synthesis.health_check(&name, &backend) {
                server.health_checks.insert(name.clone(), health_check);
            }

            if !upstreams.contains_key(&name) {
                let upstream = synthesis.build_upstream(&name, &backend, warnings);
                upstreams.insert(name.clone(), upstream);
            }

            let mut location = synthesis.location(
                location_path(raw_path, &path.path_type),
                &name,
                &backend.service,
            );

            if is_minion {
                if let Some((auth, redirect)) = &jwt {
                    location.jwt_auth = Some(auth.clone());
                    server.jwt_redirect_locations.extend(redirect.clone());
                }
            }

            if location.path == "/" {
                has_root_location = true;
            }

            routed_services.push(backend.service);
            server.locations.push(location);
        }

        if let Some(backend) = default_backend.as_ref().filter(|_| !has_root_location) {
            let name = synthesis.upstream_name("", backend);

            server
                .locations
                .push(synthesis.location("/".into(), &name, &backend.service));

            if let Some(health_check) = synthesis.health_check(&name, backend) {
                server.health_checks.insert(name, health_check);
            }

            routed_services.push(backend.service.clone());
        }

        server.grpc_only = !routed_services.is_empty()
            && routed_services
                .iter()
                .all(|service| synthesis.services.is_grpc(service));

        servers.push(server);
    }

    let params = &synthesis.params;

    let keepalive = (params.keepalive > 0).then(|| params.keepalive.to_string());
    let spiffe_client_certs = spiffe_client_certs(params, capabilities);

    IngressConfig {
        upstreams: upstreams.into_values().collect(),
        servers,
        keepalive,
        spiffe_client_certs,
        ingress: meta,
    }
}

/// Inside a mesh, upstream connections use the mesh client certificate
/// unless the resource serves the mesh certificates itself.
fn spiffe_client_certs(params: &ParameterSet, capabilities: Capabilities) -> bool {
    capabilities.contains(Capabilities::SERVICE_MESH) && !params.spiffe_server_certs
}

/// An exact path type becomes an exact match location. An empty path is the root.
fn location_path(path: &str, path_type: &str) -> String {
    let path = if path.is_empty() { "/" } else { path };

    if path_type == PATH_TYPE_EXACT {
        format!("= {path}")
    } else {
        path.to_string()
    }
}

impl Synthesis<'_> {
    fn server(&self, host: &str, warnings: &mut Warnings) -> Server {
        let params = &self.params;

        let tls_entries = self
            .ing_ex
            .ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.tls.as_deref())
            .unwrap_or_default();

        Server {
            name: host.to_string(),
            status_zone: host.to_string(),
            server_tokens: params.server_tokens.clone(),
            server_snippets: params.server_snippets.clone(),
            http2: params.http2,
            redirect_to_https: params.redirect_to_https,
            ssl_redirect: params.ssl_redirect,
            proxy_protocol: params.proxy_protocol,
            ports: params.ports.clone(),
            ssl_ports: params.ssl_ports.clone(),
            hsts: params.hsts,
            hsts_max_age: params.hsts_max_age,
            hsts_include_subdomains: params.hsts_include_subdomains,
            hsts_behind_proxy: params.hsts_behind_proxy,
            real_ip_header: params.real_ip_header.clone(),
            set_real_ip_from: params.set_real_ip_from.clone(),
            real_ip_recursive: params.real_ip_recursive,
            proxy_hide_headers: params.proxy_hide_headers.clone(),
            proxy_pass_headers: params.proxy_pass_headers.clone(),
            tls: self.server_tls(host, tls_entries, warnings),
            spiffe_certs: params.spiffe_server_certs,
            tls_passthrough: self.capabilities.contains(Capabilities::TLS_PASSTHROUGH),
            app_protect_enable: params.app_protect_enable,
            app_protect_log_enable: params.app_protect_log_enable,
            app_protect_policy: self.app_protect_resource(APP_PROTECT_POLICY_KEY),
            app_protect_log_conf: self.app_protect_resource(APP_PROTECT_LOG_CONF_KEY),
            ..Default::default()
        }
    }

    fn app_protect_resource(&self, key: &str) -> Option<String> {
        if !self.capabilities.contains(Capabilities::APP_PROTECT) {
            return None;
        }

        self.app_protect_resources
            .and_then(|resources| resources.get(key))
            .cloned()
    }

    fn location(&self, path: String, upstream: &str, service: &str) -> Location {
        let params = &self.params;

        Location {
            path,
            upstream: upstream.to_string(),
            service_name: service.to_string(),
            proxy_connect_timeout: params.proxy_connect_timeout.clone(),
            proxy_read_timeout: params.proxy_read_timeout.clone(),
            proxy_send_timeout: params.proxy_send_timeout.clone(),
            client_max_body_size: params.client_max_body_size.clone(),
            websocket: self.services.is_websocket(service),
            rewrite: self.services.rewrite(service).map(ToString::to_string),
            ssl: self.services.is_ssl(service)
                || spiffe_client_certs(params, self.capabilities),
            grpc: self.services.is_grpc(service),
            proxy_ssl_name: format!("{service}.{}.svc", self.meta.namespace),
            proxy_buffering: params.proxy_buffering,
            proxy_buffers: params.proxy_buffers.clone(),
            proxy_buffer_size: params.proxy_buffer_size.clone(),
            proxy_max_temp_file_size: params.proxy_max_temp_file_size.clone(),
            location_snippets: params.location_snippets.clone(),
            jwt_auth: None,
            minion_ingress: None,
        }
    }

    fn service_backend(
        &self,
        backend: &IngressBackend,
        warnings: &mut Warnings,
    ) -> Option<ServiceBackend> {
        let backend = ServiceBackend::from_backend(backend);

        if backend.is_none() {
            warnings.push(
                &self.resource,
                "only service backends are supported, ignoring the backend",
            );
        }

        backend
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::model::{HealthCheck, Upstream, UpstreamLabels, UpstreamServer};

    use super::*;

    fn ingress_ex(yaml: &str) -> IngressEx {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn cafe() -> IngressEx {
        ingress_ex(indoc! {r#"
            ingress:
              metadata:
                name: cafe-ingress
                namespace: default
                annotations:
                  nginx.org/client-max-body-size: "16M"
              spec:
                rules:
                  - host: cafe.example.com
                    http:
                      paths:
                        - path: /
                          pathType: Prefix
                          backend:
                            service:
                              name: tea-svc
                              port:
                                number: 80
            endpoints:
              "tea-svc:80":
                - "10.0.0.1:8080"
            validHosts:
              - cafe.example.com
        "#})
    }

    fn generate(ing_ex: &IngressEx, capabilities: Capabilities) -> (IngressConfig, Warnings) {
        let mut warnings = Warnings::new();
        let config = generate_ingress_config(
            ing_ex,
            &ParameterSet::default(),
            false,
            capabilities,
            &mut warnings,
        );
        (config, warnings)
    }

    #[test]
    fn annotation_override_reaches_the_location() {
        let (config, warnings) = generate(&cafe(), Capabilities::empty());

        assert_eq!(config.servers.len(), 1);

        let server = &config.servers[0];

        assert_eq!(server.name, "cafe.example.com");
        assert_eq!(server.locations.len(), 1);
        assert_eq!(server.locations[0].path, "/");
        assert_eq!(server.locations[0].client_max_body_size, "16M");
        assert!(server.health_checks.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn oss_upstream_from_endpoints() {
        let (config, _) = generate(&cafe(), Capabilities::empty());

        assert_eq!(
            config.upstreams,
            vec![Upstream {
                name: "default-cafe-ingress-cafe.example.com-tea-svc-80".into(),
                servers: vec![UpstreamServer {
                    address: "10.0.0.1".into(),
                    port: "8080".into(),
                    max_fails: 1,
                    max_conns: 0,
                    fail_timeout: "10s".into(),
                    slow_start: None,
                    resolve: false,
                }],
                sticky_cookie: None,
                lb_method: "random two least_conn".into(),
                zone_size: "256k".into(),
                queue: 0,
                queue_timeout: 0,
                labels: None,
            }]
        );
    }

    #[test]
    fn oss_upstream_without_endpoints_keeps_the_placeholder_server() {
        let mut ing_ex = cafe();
        ing_ex.endpoints.clear();

        let (config, _) = generate(&ing_ex, Capabilities::empty());

        assert_eq!(
            config.upstreams[0].servers,
            vec![UpstreamServer::placeholder()]
        );
    }

    #[test]
    fn plus_upstream_carries_labels() {
        let (config, _) = generate(&cafe(), Capabilities::PLUS);

        assert_eq!(
            config.upstreams[0].labels,
            Some(UpstreamLabels {
                service: "tea-svc".into(),
                resource_type: "ingress".into(),
                resource_name: "cafe-ingress".into(),
                resource_namespace: "default".into(),
            })
        );
    }

    #[test]
    fn synthesis_is_deterministic() {
        let ing_ex = ingress_ex(indoc! {r#"
            ingress:
              metadata:
                name: cafe-ingress
                namespace: default
              spec:
                rules:
                  - host: cafe.example.com
                    http:
                      paths:
                        - path: /tea
                          pathType: Prefix
                          backend:
                            service:
                              name: tea-svc
                              port:
                                number: 80
                        - path: /coffee
                          pathType: Prefix
                          backend:
                            service:
                              name: coffee-svc
                              port:
                                name: http
                        - path: /tea/green
                          pathType: Prefix
                          backend:
                            service:
                              name: tea-svc
                              port:
                                number: 80
            validHosts:
              - cafe.example.com
        "#});

        let (first, _) = generate(&ing_ex, Capabilities::empty());
        let (second, _) = generate(&ing_ex, Capabilities::empty());

        let names: Vec<&str> = first.upstreams.iter().map(|u| u.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "default-cafe-ingress-cafe.example.com-coffee-svc-http",
                "default-cafe-ingress-cafe.example.com-tea-svc-80",
            ]
        );
        assert_eq!(first, second);

        let paths: Vec<&str> = first.servers[0]
            .locations
            .iter()
            .map(|l| l.path.as_str())
            .collect();

        assert_eq!(paths, vec!["/tea", "/coffee", "/tea/green"]);
    }

    #[test]
    fn invalid_hosts_are_skipped() {
        let mut ing_ex = cafe();
        ing_ex.valid_hosts.clear();

        let (config, _) = generate(&ing_ex, Capabilities::empty());

        assert!(config.servers.is_empty());
        assert!(config.upstreams.is_empty());
    }

    #[rstest]
    #[case("/tea", "Prefix", "/tea")]
    #[case("/tea", "ImplementationSpecific", "/tea")]
    #[case("/tea", "Exact", "= /tea")]
    #[case("", "Prefix", "/")]
    #[case("", "Exact", "= /")]
    fn paths(#[case] path: &str, #[case] path_type: &str, #[case] expected: &str) {
        assert_eq!(location_path(path, path_type), expected);
    }

    fn with_default_backend() -> IngressEx {
        ingress_ex(indoc! {r#"
            ingress:
              metadata:
                name: cafe-ingress
                namespace: default
                annotations:
                  nginx.org/grpc-services: "grpc-svc"
                  nginx.org/http2: "true"
              spec:
                defaultBackend:
                  service:
                    name: grpc-svc
                    port:
                      number: 50051
                rules:
                  - host: cafe.example.com
                    http:
                      paths:
                        - path: /helloworld.Greeter
                          pathType: Prefix
                          backend:
                            service:
                              name: grpc-svc
                              port:
                                number: 50051
            validHosts:
              - cafe.example.com
        "#})
    }

    #[test]
    fn default_backend_becomes_the_implicit_root_location() {
        let (config, _) = generate(&with_default_backend(), Capabilities::empty());

        let server = &config.servers[0];
        let paths: Vec<&str> = server.locations.iter().map(|l| l.path.as_str()).collect();

        assert_eq!(paths, vec!["/helloworld.Greeter", "/"]);
        assert_eq!(
            server.locations[1].upstream,
            "default-cafe-ingress--grpc-svc-50051"
        );
        assert_eq!(
            config
                .upstreams
                .iter()
                .map(|u| u.name.as_str())
                .collect::<Vec<_>>(),
            vec![
                "default-cafe-ingress--grpc-svc-50051",
                "default-cafe-ingress-cafe.example.com-grpc-svc-50051",
            ]
        );
        assert!(server.grpc_only);
        assert!(server.locations.iter().all(|l| l.grpc));
    }

    #[test]
    fn grpc_without_http2_is_disabled() {
        let mut ing_ex = with_default_backend();
        ing_ex
            .ingress
            .annotations_mut()
            .remove("nginx.org/http2");

        let (config, warnings) = generate(&ing_ex, Capabilities::empty());

        let server = &config.servers[0];

        assert!(!server.grpc_only);
        assert!(server.locations.iter().all(|l| !l.grpc));
        assert!(warnings.mentions("nginx.org/grpc-services"));
    }

    #[test]
    fn mixed_services_are_not_grpc_only() {
        let ing_ex = ingress_ex(indoc! {r#"
            ingress:
              metadata:
                name: cafe-ingress
                namespace: default
                annotations:
                  nginx.org/grpc-services: "grpc-svc"
                  nginx.org/http2: "true"
              spec:
                rules:
                  - host: cafe.example.com
                    http:
                      paths:
                        - path: /grpc
                          pathType: Prefix
                          backend:
                            service:
                              name: grpc-svc
                              port:
                                number: 50051
                        - path: /tea
                          pathType: Prefix
                          backend:
                            service:
                              name: tea-svc
                              port:
                                number: 80
            validHosts:
              - cafe.example.com
        "#});

        let (config, _) = generate(&ing_ex, Capabilities::empty());

        assert!(!config.servers[0].grpc_only);
        assert!(config.servers[0].locations[0].grpc);
        assert!(!config.servers[0].locations[1].grpc);
    }

    #[test]
    fn service_directives_reach_locations() {
        let ing_ex = ingress_ex(indoc! {r#"
            ingress:
              metadata:
                name: cafe-ingress
                namespace: default
                annotations:
                  nginx.org/rewrites: "serviceName=tea-svc rewrite=/"
                  nginx.org/websocket-services: "tea-svc"
                  nginx.org/ssl-services: "tea-svc"
              spec:
                rules:
                  - host: cafe.example.com
                    http:
                      paths:
                        - path: /tea
                          pathType: Prefix
                          backend:
                            service:
                              name: tea-svc
                              port:
                                number: 80
                        - path: /coffee
                          pathType: Prefix
                          backend:
                            service:
                              name: coffee-svc
                              port:
                                number: 80
            validHosts:
              - cafe.example.com
        "#});

        let (config, _) = generate(&ing_ex, Capabilities::empty());

        let tea = &config.servers[0].locations[0];
        let coffee = &config.servers[0].locations[1];

        assert_eq!(tea.rewrite.as_deref(), Some("/"));
        assert!(tea.websocket);
        assert!(tea.ssl);
        assert_eq!(tea.proxy_ssl_name, "tea-svc.default.svc");
        assert_eq!(coffee.rewrite, None);
        assert!(!coffee.websocket);
        assert!(!coffee.ssl);
    }

    #[test]
    fn keepalive_is_rendered_when_positive() {
        let mut ing_ex = cafe();
        ing_ex
            .ingress
            .annotations_mut()
            .insert("nginx.org/keepalive".into(), "32".into());

        let (with, _) = generate(&ing_ex, Capabilities::empty());
        let (without, _) = generate(&cafe(), Capabilities::empty());

        assert_eq!(with.keepalive.as_deref(), Some("32"));
        assert_eq!(without.keepalive, None);
    }

    fn with_health_checks() -> IngressEx {
        ingress_ex(indoc! {r#"
            ingress:
              metadata:
                name: cafe-ingress
                namespace: default
                annotations:
                  nginx.com/health-checks: "true"
                  nginx.com/health-checks-mandatory: "true"
                  nginx.com/health-checks-mandatory-queue: "10"
              spec:
                rules:
                  - host: cafe.example.com
                    http:
                      paths:
                        - path: /tea
                          pathType: Prefix
                          backend:
                            service:
                              name: tea-svc
                              port:
                                number: 80
            healthChecks:
              "tea-svc:80":
                failureThreshold: 2
                periodSeconds: 5
                timeoutSeconds: 3
                httpGet:
                  path: /healthz
                  port: 8080
                  scheme: HTTPS
                  httpHeaders:
                    - name: Host
                      value: tea.example.com
            validHosts:
              - cafe.example.com
        "#})
    }

    #[test]
    fn health_checks_and_queue_on_plus() {
        let (config, _) = generate(&with_health_checks(), Capabilities::PLUS);

        let name = "default-cafe-ingress-cafe.example.com-tea-svc-80";

        assert_eq!(
            config.servers[0].health_checks,
            BTreeMap::from([(
                name.to_string(),
                HealthCheck {
                    upstream_name: name.into(),
                    uri: "/healthz".into(),
                    scheme: "https".into(),
                    headers: BTreeMap::from([("Host".into(), "tea.example.com".into())]),
                    fails: 2,
                    interval: 5,
                    passes: 1,
                    timeout_seconds: 3,
                    mandatory: true,
                }
            )])
        );
        assert_eq!(config.upstreams[0].queue, 10);
        assert_eq!(config.upstreams[0].queue_timeout, 3);
        assert!(config.upstreams[0].servers.is_empty());
    }

    #[test]
    fn health_checks_are_ignored_without_plus() {
        let (config, _) = generate(&with_health_checks(), Capabilities::empty());

        assert!(config.servers[0].health_checks.is_empty());
        assert_eq!(config.upstreams[0].queue, 0);
        assert_eq!(config.upstreams[0].queue_timeout, 0);
    }

    #[test]
    fn minion_mode_routes_only_validated_paths() {
        let ing_ex = ingress_ex(indoc! {r#"
            ingress:
              metadata:
                name: tea-minion
                namespace: default
              spec:
                rules:
                  - host: cafe.example.com
                    http:
                      paths:
                        - path: /tea
                          pathType: Prefix
                          backend:
                            service:
                              name: tea-svc
                              port:
                                number: 80
                        - path: /coffee
                          pathType: Prefix
                          backend:
                            service:
                              name: coffee-svc
                              port:
                                number: 80
            validHosts:
              - cafe.example.com
            validMinionPaths:
              - /tea
        "#});

        let config = generate_ingress_config(
            &ing_ex,
            &ParameterSet::default(),
            true,
            Capabilities::empty(),
            &mut Warnings::new(),
        );

        let paths: Vec<&str> = config.servers[0]
            .locations
            .iter()
            .map(|l| l.path.as_str())
            .collect();

        assert_eq!(paths, vec!["/tea"]);
        assert_eq!(config.upstreams.len(), 1);
    }

    #[test]
    fn resource_backends_are_skipped_with_a_warning() {
        let ing_ex = ingress_ex(indoc! {r#"
            ingress:
              metadata:
                name: cafe-ingress
                namespace: default
              spec:
                rules:
                  - host: cafe.example.com
                    http:
                      paths:
                        - path: /static
                          pathType: Prefix
                          backend:
                            resource:
                              apiGroup: k8s.example.com
                              kind: StorageBucket
                              name: static-assets
            validHosts:
              - cafe.example.com
        "#});

        let (config, warnings) = generate(&ing_ex, Capabilities::empty());

        assert!(config.servers[0].locations.is_empty());
        assert!(config.upstreams.is_empty());
        assert!(warnings.mentions("only service backends"));
    }

    fn annotate(ing_ex: &mut IngressEx, annotations: &[(&str, &str)]) {
        ing_ex
            .ingress
            .metadata
            .annotations
            .get_or_insert_with(Default::default)
            .extend(
                annotations
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string())),
            );
    }

    #[test]
    fn plus_upstream_settings_from_annotations() {
        let mut ing_ex = cafe();
        annotate(
            &mut ing_ex,
            &[
                (
                    "nginx.com/sticky-cookie-services",
                    "serviceName=tea-svc srv_id expires=1h",
                ),
                ("nginx.com/slow-start", "30s"),
                ("nginx.org/lb-method", "least_time header"),
            ],
        );

        let (config, warnings) = generate(&ing_ex, Capabilities::PLUS);

        let upstream = &config.upstreams[0];

        assert_eq!(upstream.sticky_cookie.as_deref(), Some("srv_id expires=1h"));
        assert_eq!(upstream.lb_method, "least_time header");
        assert_eq!(upstream.servers[0].slow_start.as_deref(), Some("30s"));
        assert!(warnings.is_empty());
    }

    #[rstest]
    #[case::outside_the_mesh(Capabilities::INTERNAL_ROUTES, "false", (false, false, false))]
    #[case::mesh_client_certs(
        Capabilities::SERVICE_MESH | Capabilities::INTERNAL_ROUTES,
        "false",
        (true, true, false)
    )]
    #[case::internal_route(
        Capabilities::SERVICE_MESH | Capabilities::INTERNAL_ROUTES,
        "true",
        (false, false, true)
    )]
    fn service_mesh_certificates(
        #[case] capabilities: Capabilities,
        #[case] internal_route: &str,
        #[case] expected: (bool, bool, bool),
    ) {
        let mut ing_ex = cafe();
        annotate(&mut ing_ex, &[("nsm.nginx.com/internal-route", internal_route)]);

        let (config, _) = generate(&ing_ex, capabilities);

        let server = &config.servers[0];

        assert_eq!(
            (
                server.locations[0].ssl,
                config.spiffe_client_certs,
                server.spiffe_certs
            ),
            expected
        );
    }

    #[test]
    fn ssl_services_stay_ssl_for_internal_routes() {
        let mut ing_ex = cafe();
        annotate(
            &mut ing_ex,
            &[
                ("nsm.nginx.com/internal-route", "true"),
                ("nginx.org/ssl-services", "tea-svc"),
            ],
        );

        let (config, _) = generate(
            &ing_ex,
            Capabilities::SERVICE_MESH | Capabilities::INTERNAL_ROUTES,
        );

        assert!(config.servers[0].locations[0].ssl);
        assert!(!config.spiffe_client_certs);
    }

    fn with_app_protect() -> IngressEx {
        let mut ing_ex = cafe();
        annotate(
            &mut ing_ex,
            &[
                ("appprotect.f5.com/app-protect-enable", "true"),
                ("appprotect.f5.com/app-protect-security-log-enable", "true"),
            ],
        );
        ing_ex.app_protect_resources = BTreeMap::from([
            (
                APP_PROTECT_POLICY_KEY.to_string(),
                "/etc/nginx/waf/default_dataguard-alarm".to_string(),
            ),
            (
                APP_PROTECT_LOG_CONF_KEY.to_string(),
                "/etc/nginx/waf/default_logconf syslog:server=127.0.0.1:514".to_string(),
            ),
        ]);
        ing_ex
    }

    #[test]
    fn app_protect_and_tls_passthrough_reach_the_server() {
        let (config, _) = generate(
            &with_app_protect(),
            Capabilities::APP_PROTECT | Capabilities::TLS_PASSTHROUGH,
        );

        let server = &config.servers[0];

        assert!(server.tls_passthrough);
        assert_eq!(server.app_protect_enable, Some(true));
        assert_eq!(server.app_protect_log_enable, Some(true));
        assert_eq!(
            server.app_protect_policy.as_deref(),
            Some("/etc/nginx/waf/default_dataguard-alarm")
        );
        assert_eq!(
            server.app_protect_log_conf.as_deref(),
            Some("/etc/nginx/waf/default_logconf syslog:server=127.0.0.1:514")
        );
    }

    #[test]
    fn app_protect_is_ignored_without_the_module() {
        let (config, _) = generate(&with_app_protect(), Capabilities::empty());

        let server = &config.servers[0];

        assert!(!server.tls_passthrough);
        assert_eq!(server.app_protect_enable, None);
        assert_eq!(server.app_protect_policy, None);
        assert_eq!(server.app_protect_log_conf, None);
    }

    #[test]
    fn minion_token_auth_is_resolved_once_per_server() {
        let mut ing_ex = ingress_ex(indoc! {r#"
            ingress:
              metadata:
                name: tea-minion
                namespace: default
              spec:
                rules:
                  - host: cafe.example.com
                    http:
                      paths:
                        - path: /tea
                          pathType: Prefix
                          backend:
                            service:
                              name: tea-svc
                              port:
                                number: 80
                        - path: /green-tea
                          pathType: Prefix
                          backend:
                            service:
                              name: tea-svc
                              port:
                                number: 80
            validHosts:
              - cafe.example.com
            validMinionPaths:
              - /tea
              - /green-tea
            secrets:
              cafe-jwk:
                type: nginx.org/jwk
                path: /etc/nginx/secrets/default-cafe-jwk
                error: "secret is missing the jwk key"
        "#});
        annotate(
            &mut ing_ex,
            &[
                ("nginx.com/jwt-key", "cafe-jwk"),
                ("nginx.com/jwt-login-url", "https://login.example.com"),
            ],
        );

        let mut warnings = Warnings::new();
        let config = generate_ingress_config(
            &ing_ex,
            &ParameterSet::default(),
            true,
            Capabilities::PLUS,
            &mut warnings,
        );

        let server = &config.servers[0];

        assert_eq!(warnings.len(), 1);
        assert!(warnings.mentions("JWK secret cafe-jwk is invalid"));
        assert!(server
            .locations
            .iter()
            .all(|l| l.jwt_auth.as_ref().map(|auth| auth.key.as_str())
                == Some("/etc/nginx/secrets/default-cafe-jwk")));
        assert_eq!(server.jwt_redirect_locations.len(), 2);
    }
}
