use std::collections::BTreeMap;

use serde::Serialize;

use super::IngressMeta;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub name: String,
    pub status_zone: String,

    pub server_tokens: String,
    pub server_snippets: Vec<String>,
    pub http2: bool,
    pub redirect_to_https: bool,
    pub ssl_redirect: bool,
    pub proxy_protocol: bool,
    pub ports: Vec<u16>,
    pub ssl_ports: Vec<u16>,

    pub hsts: bool,
    pub hsts_max_age: i64,
    pub hsts_include_subdomains: bool,
    pub hsts_behind_proxy: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_ip_header: Option<String>,
    pub set_real_ip_from: Vec<String>,
    pub real_ip_recursive: bool,

    pub proxy_hide_headers: Vec<String>,
    pub proxy_pass_headers: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<ServerTls>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_auth: Option<JwtAuth>,
    pub jwt_redirect_locations: Vec<JwtRedirectLocation>,

    pub spiffe_certs: bool,
    pub grpc_only: bool,
    pub tls_passthrough: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_protect_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_protect_log_enable: Option<bool>,
    /// Path of the compiled policy bundle. Only a master or a plain Ingress carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_protect_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_protect_log_conf: Option<String>,

    pub locations: Vec<Location>,
    /// Keyed by upstream name.
    pub health_checks: BTreeMap<String, HealthCheck>,
}

/// Certificate binding of a TLS-enabled server.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTls {
    pub certificate: String,
    pub certificate_key: String,
    /// Set only for the placeholder certificate so the handshake always fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciphers: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub path: String,
    /// Name of the upstream this location proxies to.
    pub upstream: String,
    pub service_name: String,

    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub client_max_body_size: String,

    pub websocket: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
    pub ssl: bool,
    pub grpc: bool,
    pub proxy_ssl_name: String,

    pub proxy_buffering: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_buffers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_buffer_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_max_temp_file_size: Option<String>,

    pub location_snippets: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_auth: Option<JwtAuth>,
    /// The minion a composite location was contributed by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minion_ingress: Option<IngressMeta>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub upstream_name: String,
    pub uri: String,
    pub scheme: String,
    pub headers: BTreeMap<String, String>,
    pub fails: i32,
    pub interval: i32,
    pub passes: i32,
    pub timeout_seconds: i64,
    pub mandatory: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtAuth {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_location_name: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtRedirectLocation {
    pub name: String,
    pub login_url: String,
}
