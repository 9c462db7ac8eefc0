//! The resolved, typed configuration of a single Ingress resource.

mod capabilities;

pub use capabilities::Capabilities;

use serde::{Deserialize, Serialize};

/// Fully resolved configuration parameters.
///
/// Every field always holds a valid value: either the built-in default, a
/// value inherited from the global configuration, or a successfully parsed
/// annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    pub server_tokens: String,
    pub server_snippets: Vec<String>,
    pub location_snippets: Vec<String>,

    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub proxy_hide_headers: Vec<String>,
    pub proxy_pass_headers: Vec<String>,
    pub proxy_protocol: bool,
    pub client_max_body_size: String,

    pub proxy_buffering: bool,
    pub proxy_buffers: Option<String>,
    pub proxy_buffer_size: Option<String>,
    pub proxy_max_temp_file_size: Option<String>,

    pub http2: bool,
    pub redirect_to_https: bool,
    pub ssl_redirect: bool,
    pub ports: Vec<u16>,
    pub ssl_ports: Vec<u16>,

    pub hsts: bool,
    pub hsts_max_age: i64,
    pub hsts_include_subdomains: bool,
    pub hsts_behind_proxy: bool,

    pub real_ip_header: Option<String>,
    pub set_real_ip_from: Vec<String>,
    pub real_ip_recursive: bool,

    pub lb_method: String,
    pub upstream_zone_size: String,
    pub max_fails: u32,
    pub max_conns: u32,
    pub fail_timeout: String,
    pub slow_start: Option<String>,
    pub keepalive: u32,

    pub health_check_enabled: bool,
    pub health_check_mandatory: bool,
    pub health_check_mandatory_queue: i64,

    pub jwt_key: Option<String>,
    pub jwt_realm: Option<String>,
    pub jwt_token: Option<String>,
    pub jwt_login_url: Option<String>,

    pub spiffe_server_certs: bool,

    /// `None` leaves the module's own default in place.
    pub app_protect_enable: Option<bool>,
    pub app_protect_log_enable: Option<bool>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            server_tokens: "on".into(),
            server_snippets: Vec::new(),
            location_snippets: Vec::new(),
            proxy_connect_timeout: "60s".into(),
            proxy_read_timeout: "60s".into(),
            proxy_send_timeout: "60s".into(),
            proxy_hide_headers: Vec::new(),
            proxy_pass_headers: Vec::new(),
            proxy_protocol: false,
            client_max_body_size: "1m".into(),
            proxy_buffering: true,
            proxy_buffers: None,
            proxy_buffer_size: None,
            proxy_max_temp_file_size: None,
            http2: false,
            redirect_to_https: false,
            ssl_redirect: true,
            ports: vec![80],
            ssl_ports: vec![443],
            hsts: false,
            hsts_max_age: 2_592_000,
            hsts_include_subdomains: false,
            hsts_behind_proxy: false,
            real_ip_header: None,
            set_real_ip_from: Vec::new(),
            real_ip_recursive: false,
            lb_method: "random two least_conn".into(),
            upstream_zone_size: "256k".into(),
            max_fails: 1,
            max_conns: 0,
            fail_timeout: "10s".into(),
            slow_start: None,
            keepalive: 0,
            health_check_enabled: false,
            health_check_mandatory: false,
            health_check_mandatory_queue: 0,
            jwt_key: None,
            jwt_realm: None,
            jwt_token: None,
            jwt_login_url: None,
            spiffe_server_certs: false,
            app_protect_enable: None,
            app_protect_log_enable: None,
        }
    }
}
