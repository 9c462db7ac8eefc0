//! Annotation and global configuration resolution.
//!
//! Every recognized setting is a [`Setting`] variant. A variant knows its
//! annotation key, its global configuration map key, the capability it
//! requires and how to parse and apply a raw value onto a [`ParameterSet`].
//! Resolution is fail-open: a value that does not parse leaves the inherited
//! value in place and records a warning.

pub mod mergeable;
pub mod service;

use std::collections::BTreeMap;

use strum::{EnumIter, IntoEnumIterator};

use crate::{
    diagnostics::Warnings,
    error::ParseError,
    logger,
    params::{Capabilities, ParameterSet},
    parse::{
        parse_bool, parse_comma_list, parse_int64, parse_lb_method, parse_lines,
        parse_non_negative_int, parse_offset, parse_ports, parse_proxy_buffers_spec, parse_size,
        parse_time,
    },
};

pub const MERGEABLE_INGRESS_TYPE: &str = "nginx.org/mergeable-ingress-type";

pub const REWRITES: &str = "nginx.org/rewrites";
pub const SSL_SERVICES: &str = "nginx.org/ssl-services";
pub const GRPC_SERVICES: &str = "nginx.org/grpc-services";
pub const WEBSOCKET_SERVICES: &str = "nginx.org/websocket-services";
pub const STICKY_COOKIE_SERVICES: &str = "nginx.com/sticky-cookie-services";

/// Where raw values come from. Annotations are prefixed, global keys are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Annotations,
    Global,
}

impl Layer {
    pub fn key(self, setting: Setting) -> Option<&'static str> {
        match self {
            Layer::Annotations => setting.annotation(),
            Layer::Global => setting.global_key(),
        }
    }
}

/// The closed set of scalar settings carried by [`ParameterSet`].
///
/// Variants are resolved in declaration order, which matters for settings
/// that depend on an earlier one (mandatory health checks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Setting {
    LbMethod,
    HealthChecks,
    HealthChecksMandatory,
    HealthChecksMandatoryQueue,
    SlowStart,
    ServerTokens,
    ServerSnippets,
    LocationSnippets,
    ProxyConnectTimeout,
    ProxyReadTimeout,
    ProxySendTimeout,
    ProxyHideHeaders,
    ProxyPassHeaders,
    ProxyProtocol,
    ClientMaxBodySize,
    RedirectToHttps,
    SslRedirect,
    Http2,
    ProxyBuffering,
    ProxyBuffers,
    ProxyBufferSize,
    ProxyMaxTempFileSize,
    ListenPorts,
    ListenPortsSsl,
    RealIpHeader,
    SetRealIpFrom,
    RealIpRecursive,
    Keepalive,
    MaxFails,
    MaxConns,
    FailTimeout,
    UpstreamZoneSize,
    JwtKey,
    JwtRealm,
    JwtToken,
    JwtLoginUrl,
    InternalRoute,
    AppProtectEnable,
    AppProtectLogEnable,
}

impl Setting {
    pub const fn annotation(&self) -> Option<&'static str> {
        let key = match self {
            Setting::LbMethod => "nginx.org/lb-method",
            Setting::HealthChecks => "nginx.com/health-checks",
            Setting::HealthChecksMandatory => "nginx.com/health-checks-mandatory",
            Setting::HealthChecksMandatoryQueue => "nginx.com/health-checks-mandatory-queue",
            Setting::SlowStart => "nginx.com/slow-start",
            Setting::ServerTokens => "nginx.org/server-tokens",
            Setting::ServerSnippets => "nginx.org/server-snippets",
            Setting::LocationSnippets => "nginx.org/location-snippets",
            Setting::ProxyConnectTimeout => "nginx.org/proxy-connect-timeout",
            Setting::ProxyReadTimeout => "nginx.org/proxy-read-timeout",
            Setting::ProxySendTimeout => "nginx.org/proxy-send-timeout",
            Setting::ProxyHideHeaders => "nginx.org/proxy-hide-headers",
            Setting::ProxyPassHeaders => "nginx.org/proxy-pass-headers",
            Setting::ClientMaxBodySize => "nginx.org/client-max-body-size",
            Setting::RedirectToHttps => "nginx.org/redirect-to-https",
            Setting::SslRedirect => "ingress.kubernetes.io/ssl-redirect",
            Setting::Http2 => "nginx.org/http2",
            Setting::ProxyBuffering => "nginx.org/proxy-buffering",
            Setting::ProxyBuffers => "nginx.org/proxy-buffers",
            Setting::ProxyBufferSize => "nginx.org/proxy-buffer-size",
            Setting::ProxyMaxTempFileSize => "nginx.org/proxy-max-temp-file-size",
            Setting::ListenPorts => "nginx.org/listen-ports",
            Setting::ListenPortsSsl => "nginx.org/listen-ports-ssl",
            Setting::Keepalive => "nginx.org/keepalive",
            Setting::MaxFails => "nginx.org/max-fails",
            Setting::MaxConns => "nginx.org/max-conns",
            Setting::FailTimeout => "nginx.org/fail-timeout",
            Setting::UpstreamZoneSize => "nginx.org/upstream-zone-size",
            Setting::JwtKey => "nginx.com/jwt-key",
            Setting::JwtRealm => "nginx.com/jwt-realm",
            Setting::JwtToken => "nginx.com/jwt-token",
            Setting::JwtLoginUrl => "nginx.com/jwt-login-url",
            Setting::InternalRoute => "nsm.nginx.com/internal-route",
            Setting::AppProtectEnable => "appprotect.f5.com/app-protect-enable",
            Setting::AppProtectLogEnable => "appprotect.f5.com/app-protect-security-log-enable",
            Setting::ProxyProtocol
            | Setting::RealIpHeader
            | Setting::SetRealIpFrom
            | Setting::RealIpRecursive => return None,
        };

        Some(key)
    }

    pub const fn global_key(&self) -> Option<&'static str> {
        let key = match self {
            Setting::LbMethod => "lb-method",
            Setting::ServerTokens => "server-tokens",
            Setting::ServerSnippets => "server-snippets",
            Setting::LocationSnippets => "location-snippets",
            Setting::ProxyConnectTimeout => "proxy-connect-timeout",
            Setting::ProxyReadTimeout => "proxy-read-timeout",
            Setting::ProxySendTimeout => "proxy-send-timeout",
            Setting::ProxyHideHeaders => "proxy-hide-headers",
            Setting::ProxyPassHeaders => "proxy-pass-headers",
            Setting::ProxyProtocol => "proxy-protocol",
            Setting::ClientMaxBodySize => "client-max-body-size",
            Setting::RedirectToHttps => "redirect-to-https",
            Setting::SslRedirect => "ssl-redirect",
            Setting::Http2 => "http2",
            Setting::ProxyBuffering => "proxy-buffering",
            Setting::ProxyBuffers => "proxy-buffers",
            Setting::ProxyBufferSize => "proxy-buffer-size",
            Setting::ProxyMaxTempFileSize => "proxy-max-temp-file-size",
            Setting::RealIpHeader => "real-ip-header",
            Setting::SetRealIpFrom => "set-real-ip-from",
            Setting::RealIpRecursive => "real-ip-recursive",
            Setting::Keepalive => "keepalive",
            Setting::MaxFails => "max-fails",
            Setting::MaxConns => "max-conns",
            Setting::FailTimeout => "fail-timeout",
            Setting::UpstreamZoneSize => "upstream-zone-size",
            Setting::HealthChecks
            | Setting::HealthChecksMandatory
            | Setting::HealthChecksMandatoryQueue
            | Setting::SlowStart
            | Setting::ListenPorts
            | Setting::ListenPortsSsl
            | Setting::JwtKey
            | Setting::JwtRealm
            | Setting::JwtToken
            | Setting::JwtLoginUrl
            | Setting::InternalRoute
            | Setting::AppProtectEnable
            | Setting::AppProtectLogEnable => return None,
        };

        Some(key)
    }

    /// The capability the target must have for this setting to be honored.
    pub const fn required_capability(&self) -> Option<Capabilities> {
        match self {
            Setting::HealthChecks
            | Setting::HealthChecksMandatory
            | Setting::HealthChecksMandatoryQueue
            | Setting::SlowStart
            | Setting::JwtKey
            | Setting::JwtRealm
            | Setting::JwtToken
            | Setting::JwtLoginUrl => Some(Capabilities::PLUS),
            Setting::InternalRoute => Some(Capabilities::INTERNAL_ROUTES),
            Setting::AppProtectEnable | Setting::AppProtectLogEnable => {
                Some(Capabilities::APP_PROTECT)
            }
            _ => None,
        }
    }

    /// Whether a previously resolved setting enables this one.
    fn is_applicable(&self, params: &ParameterSet) -> bool {
        match self {
            Setting::HealthChecksMandatory => params.health_check_enabled,
            Setting::HealthChecksMandatoryQueue => params.health_check_mandatory,
            _ => true,
        }
    }

    /// Parses `value` and writes it into `params`. On error `params` is untouched.
    pub fn apply(
        &self,
        value: &str,
        params: &mut ParameterSet,
        capabilities: Capabilities,
    ) -> Result<(), ParseError> {
        match self {
            Setting::LbMethod => {
                params.lb_method = parse_lb_method(value, capabilities.is_plus())?
            }
            Setting::HealthChecks => params.health_check_enabled = parse_bool(value)?,
            Setting::HealthChecksMandatory => params.health_check_mandatory = parse_bool(value)?,
            Setting::HealthChecksMandatoryQueue => {
                params.health_check_mandatory_queue = parse_int64(value)?
            }
            Setting::SlowStart => params.slow_start = Some(parse_time(value)?),
            Setting::ServerTokens => {
                params.server_tokens = if capabilities.is_plus() {
                    value.to_string()
                } else if parse_bool(value)? {
                    "on".to_string()
                } else {
                    "off".to_string()
                }
            }
            Setting::ServerSnippets => params.server_snippets = parse_lines(value),
            Setting::LocationSnippets => params.location_snippets = parse_lines(value),
            Setting::ProxyConnectTimeout => params.proxy_connect_timeout = parse_time(value)?,
            Setting::ProxyReadTimeout => params.proxy_read_timeout = parse_time(value)?,
            Setting::ProxySendTimeout => params.proxy_send_timeout = parse_time(value)?,
            Setting::ProxyHideHeaders => params.proxy_hide_headers = parse_comma_list(value),
            Setting::ProxyPassHeaders => params.proxy_pass_headers = parse_comma_list(value),
            Setting::ProxyProtocol => params.proxy_protocol = parse_bool(value)?,
            Setting::ClientMaxBodySize => params.client_max_body_size = parse_offset(value)?,
            Setting::RedirectToHttps => params.redirect_to_https = parse_bool(value)?,
            Setting::SslRedirect => params.ssl_redirect = parse_bool(value)?,
            Setting::Http2 => params.http2 = parse_bool(value)?,
            Setting::ProxyBuffering => params.proxy_buffering = parse_bool(value)?,
            Setting::ProxyBuffers => params.proxy_buffers = Some(parse_proxy_buffers_spec(value)?),
            Setting::ProxyBufferSize => params.proxy_buffer_size = Some(parse_size(value)?),
            Setting::ProxyMaxTempFileSize => {
                params.proxy_max_temp_file_size = Some(parse_size(value)?)
            }
            Setting::ListenPorts => params.ports = parse_ports(value)?,
            Setting::ListenPortsSsl => params.ssl_ports = parse_ports(value)?,
            Setting::RealIpHeader => params.real_ip_header = Some(value.to_string()),
            Setting::SetRealIpFrom => params.set_real_ip_from = parse_comma_list(value),
            Setting::RealIpRecursive => params.real_ip_recursive = parse_bool(value)?,
            Setting::Keepalive => params.keepalive = parse_non_negative_int(value)?,
            Setting::MaxFails => params.max_fails = parse_non_negative_int(value)?,
            Setting::MaxConns => params.max_conns = parse_non_negative_int(value)?,
            Setting::FailTimeout => params.fail_timeout = parse_time(value)?,
            Setting::UpstreamZoneSize => params.upstream_zone_size = parse_size(value)?,
            Setting::JwtKey => params.jwt_key = Some(value.to_string()),
            Setting::JwtRealm => params.jwt_realm = Some(value.to_string()),
            Setting::JwtToken => params.jwt_token = Some(value.to_string()),
            Setting::JwtLoginUrl => params.jwt_login_url = Some(value.to_string()),
            Setting::InternalRoute => params.spiffe_server_certs = parse_bool(value)?,
            Setting::AppProtectEnable => params.app_protect_enable = Some(parse_bool(value)?),
            Setting::AppProtectLogEnable => {
                params.app_protect_log_enable = Some(parse_bool(value)?)
            }
        }

        Ok(())
    }
}

/// The HSTS keys are applied together: if any present key is invalid none of them is.
struct HstsKeys {
    hsts: &'static str,
    max_age: &'static str,
    include_subdomains: &'static str,
    behind_proxy: &'static str,
}

impl HstsKeys {
    const fn of(layer: Layer) -> Self {
        match layer {
            Layer::Annotations => Self {
                hsts: "nginx.org/hsts",
                max_age: "nginx.org/hsts-max-age",
                include_subdomains: "nginx.org/hsts-include-subdomains",
                behind_proxy: "nginx.org/hsts-behind-proxy",
            },
            Layer::Global => Self {
                hsts: "hsts",
                max_age: "hsts-max-age",
                include_subdomains: "hsts-include-subdomains",
                behind_proxy: "hsts-behind-proxy",
            },
        }
    }
}

fn resolve_hsts(
    source: &BTreeMap<String, String>,
    params: &mut ParameterSet,
    layer: Layer,
    resource: &str,
    warnings: &mut Warnings,
) {
    let keys = HstsKeys::of(layer);

    let Some(raw) = source.get(keys.hsts) else {
        return;
    };

    let hsts = match parse_bool(raw) {
        Ok(hsts) => hsts,
        Err(err) => {
            warnings.push(resource, format!("{}: {err}, ignoring", keys.hsts));
            return;
        }
    };

    let mut resolved = params.clone();
    let mut failed = false;

    if let Some(raw) = source.get(keys.max_age) {
        match parse_int64(raw) {
            Ok(max_age) => resolved.hsts_max_age = max_age,
            Err(err) => {
                warnings.push(resource, format!("{}: {err}", keys.max_age));
                failed = true;
            }
        }
    }

    for (key, field) in [
        (keys.include_subdomains, &mut resolved.hsts_include_subdomains),
        (keys.behind_proxy, &mut resolved.hsts_behind_proxy),
    ] {
        let Some(raw) = source.get(key) else {
            continue;
        };

        match parse_bool(raw) {
            Ok(value) => *field = value,
            Err(err) => {
                warnings.push(resource, format!("{key}: {err}"));
                failed = true;
            }
        }
    }

    if failed {
        warnings.push(
            resource,
            "there are configuration issues with hsts settings, skipping all hsts settings",
        );
        return;
    }

    resolved.hsts = hsts;
    *params = resolved;
}

/// Resolves `source` over `base`.
///
/// Keys missing from `source`, keys whose capability is not available and
/// values that fail validation all leave the corresponding `base` value in
/// place. `resource` names the origin in warnings.
pub fn resolve(
    source: &BTreeMap<String, String>,
    base: &ParameterSet,
    capabilities: Capabilities,
    layer: Layer,
    resource: &str,
    warnings: &mut Warnings,
) -> ParameterSet {
    let mut params = base.clone();

    for setting in Setting::iter() {
        let Some(key) = layer.key(setting) else {
            continue;
        };

        let Some(value) = source.get(key) else {
            continue;
        };

        if let Some(required) = setting.required_capability() {
            if !capabilities.contains(required) {
                logger!(debug, "{resource}: {key} requires {required:?}, ignoring");
                continue;
            }
        }

        if !setting.is_applicable(&params) {
            continue;
        }

        if let Err(err) = setting.apply(value, &mut params, capabilities) {
            warnings.push(resource, format!("{key}: {err}, using the inherited value"));
        }
    }

    resolve_hsts(source, &mut params, layer, resource, warnings);

    params
}

/// Resolves a resource's annotations over the effective base parameters.
pub fn resolve_annotations(
    annotations: &BTreeMap<String, String>,
    base: &ParameterSet,
    capabilities: Capabilities,
    resource: &str,
    warnings: &mut Warnings,
) -> ParameterSet {
    resolve(
        annotations,
        base,
        capabilities,
        Layer::Annotations,
        resource,
        warnings,
    )
}

impl ParameterSet {
    /// Layers the global configuration map over the built-in defaults.
    pub fn from_global(
        data: &BTreeMap<String, String>,
        capabilities: Capabilities,
        warnings: &mut Warnings,
    ) -> Self {
        resolve(
            data,
            &ParameterSet::default(),
            capabilities,
            Layer::Global,
            "global",
            warnings,
        )
    }
}
