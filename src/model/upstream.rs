use serde::Serialize;

/// A named pool of backend endpoints for one (host, service, port).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    pub name: String,
    pub servers: Vec<UpstreamServer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticky_cookie: Option<String>,
    /// Empty means the proxy's default (round robin).
    pub lb_method: String,
    pub zone_size: String,
    /// Zero means no queuing.
    pub queue: i64,
    pub queue_timeout: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<UpstreamLabels>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamServer {
    pub address: String,
    pub port: String,
    pub max_fails: u32,
    pub max_conns: u32,
    pub fail_timeout: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow_start: Option<String>,
    pub resolve: bool,
}

impl UpstreamServer {
    /// Placeholder member of an OSS upstream that has no endpoints yet.
    pub fn placeholder() -> Self {
        Self {
            address: "127.0.0.1".into(),
            port: "8181".into(),
            max_fails: 1,
            max_conns: 0,
            fail_timeout: "10s".into(),
            slow_start: None,
            resolve: false,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamLabels {
    pub service: String,
    pub resource_type: String,
    pub resource_name: String,
    pub resource_namespace: String,
}
