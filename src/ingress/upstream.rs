use k8s_openapi::api::{core::v1::Probe, networking::v1::IngressBackend};

use crate::{
    diagnostics::Warnings,
    logger,
    model::{HealthCheck, Upstream, UpstreamLabels, UpstreamServer},
    params::Capabilities,
};

use super::Synthesis;

const RESOURCE_TYPE: &str = "ingress";

// Kubernetes probe defaults
const DEFAULT_FAILURE_THRESHOLD: i32 = 3;
const DEFAULT_PERIOD_SECONDS: i32 = 10;
const DEFAULT_SUCCESS_THRESHOLD: i32 = 1;
const DEFAULT_TIMEOUT_SECONDS: i32 = 1;
const DEFAULT_SCHEME: &str = "http";

/// A backend that routes to a service port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ServiceBackend {
    pub service: String,
    /// Port number, or port name when the backend refers to a named port.
    pub port: String,
}

impl ServiceBackend {
    /// `None` for resource backends.
    pub fn from_backend(backend: &IngressBackend) -> Option<Self> {
        let service = backend.service.as_ref()?;

        let port = service
            .port
            .as_ref()
            .and_then(|port| {
                port.number
                    .map(|number| number.to_string())
                    .or_else(|| port.name.clone())
            })
            .unwrap_or_default();

        Some(Self {
            service: service.name.clone(),
            port,
        })
    }

    /// Key into the endpoint and probe snapshots.
    pub fn key(&self) -> String {
        format!("{}:{}", self.service, self.port)
    }
}

impl Synthesis<'_> {
    /// `<namespace>-<name>-<host>-<service>-<port>`. The default backend uses an empty host.
    pub(super) fn upstream_name(&self, host: &str, backend: &ServiceBackend) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.meta.namespace, self.meta.name, host, backend.service, backend.port
        )
    }

    pub(super) fn build_upstream(
        &self,
        name: &str,
        backend: &ServiceBackend,
        warnings: &mut Warnings,
    ) -> Upstream {
        let params = &self.params;
        let is_plus = self.capabilities.is_plus();

        let labels = UpstreamLabels {
            service: backend.service.clone(),
            resource_type: RESOURCE_TYPE.into(),
            resource_name: self.meta.name.clone(),
            resource_namespace: self.meta.namespace.clone(),
        };

        let mut upstream = Upstream {
            name: name.to_string(),
            lb_method: params.lb_method.clone(),
            zone_size: params.upstream_zone_size.clone(),
            ..Default::default()
        };

        if is_plus {
            let (queue, timeout) = self.queue(backend);

            upstream.sticky_cookie = self
                .services
                .sticky_cookie(&backend.service)
                .map(ToString::to_string);
            upstream.queue = queue;
            upstream.queue_timeout = timeout;
            upstream.labels = Some(labels);
        } else {
            upstream.servers = vec![UpstreamServer::placeholder()];

            if self.capabilities.contains(Capabilities::LATENCY_METRICS) {
                upstream.labels = Some(labels);
            }
        }

        let servers = self.upstream_servers(backend, warnings);

        if !servers.is_empty() {
            upstream.servers = servers;
        }

        logger!(
            debug,
            "{}: upstream {} with {} server(s)",
            self.resource,
            upstream.name,
            upstream.servers.len()
        );

        upstream
    }

    fn upstream_servers(
        &self,
        backend: &ServiceBackend,
        warnings: &mut Warnings,
    ) -> Vec<UpstreamServer> {
        let Some(endpoints) = self.ing_ex.endpoints.get(&backend.key()) else {
            return Vec::new();
        };

        let resolve = self
            .ing_ex
            .external_name_services
            .contains(&backend.service);

        if resolve && !self.capabilities.contains(Capabilities::RESOLVER) {
            warnings.push(
                &self.resource,
                format!(
                    "a resolver must be configured for ExternalName service {}, no upstream servers will be created",
                    backend.service
                ),
            );
            return Vec::new();
        }

        let params = &self.params;

        endpoints
            .iter()
            .filter_map(|endpoint| {
                let Some((address, port)) = endpoint.rsplit_once(':') else {
                    warnings.push(
                        &self.resource,
                        format!("endpoint {endpoint} of service {} has no port, ignoring", backend.service),
                    );
                    return None;
                };

                Some(UpstreamServer {
                    address: address.to_string(),
                    port: port.to_string(),
                    max_fails: params.max_fails,
                    max_conns: params.max_conns,
                    fail_timeout: params.fail_timeout.clone(),
                    slow_start: params.slow_start.clone(),
                    resolve,
                })
            })
            .collect()
    }

    /// Mandatory health checks start unhealthy; a queue holds requests
    /// until the first check passes.
    fn queue(&self, backend: &ServiceBackend) -> (i64, i64) {
        let params = &self.params;

        if !(params.health_check_enabled
            && params.health_check_mandatory
            && params.health_check_mandatory_queue > 0)
        {
            return (0, 0);
        }

        match self.ing_ex.health_checks.get(&backend.key()) {
            Some(probe) => (
                params.health_check_mandatory_queue,
                i64::from(probe.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
            ),
            None => (0, 0),
        }
    }

    /// Only when health checks are enabled and the service has a probe.
    pub(super) fn health_check(&self, name: &str, backend: &ServiceBackend) -> Option<HealthCheck> {
        if !self.params.health_check_enabled {
            return None;
        }

        self.ing_ex
            .health_checks
            .get(&backend.key())
            .map(|probe| health_check(probe, name, self.params.health_check_mandatory))
    }
}

fn health_check(probe: &Probe, upstream_name: &str, mandatory: bool) -> HealthCheck {
    let http_get = probe.http_get.as_ref();

    HealthCheck {
        upstream_name: upstream_name.to_string(),
        uri: http_get
            .and_then(|action| action.path.clone())
            .unwrap_or_default(),
        scheme: http_get
            .and_then(|action| action.scheme.as_deref())
            .unwrap_or(DEFAULT_SCHEME)
            .to_lowercase(),
        headers: http_get
            .and_then(|action| action.http_headers.as_ref())
            .map(|headers| {
                headers
                    .iter()
                    .map(|header| (header.name.clone(), header.value.clone()))
                    .collect()
            })
            .unwrap_or_default(),
        fails: probe.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD),
        interval: probe.period_seconds.unwrap_or(DEFAULT_PERIOD_SECONDS),
        passes: probe.success_threshold.unwrap_or(DEFAULT_SUCCESS_THRESHOLD),
        timeout_seconds: i64::from(probe.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
        mandatory,
    }
}
