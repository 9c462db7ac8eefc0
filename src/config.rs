use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::params::Capabilities;

#[derive(Debug, Default)]
pub enum ConfigLoadOption {
    #[default]
    Default,

    Path(PathBuf),
}

/// What the target proxy supports.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CapabilityConfig {
    pub plus: bool,
    pub resolver: bool,
    pub wildcard_tls: bool,
    pub internal_routes: bool,
    pub latency_metrics: bool,
    pub service_mesh: bool,
    pub tls_passthrough: bool,
    pub app_protect: bool,
}

impl From<&CapabilityConfig> for Capabilities {
    fn from(config: &CapabilityConfig) -> Self {
        let mut capabilities = Capabilities::empty();

        capabilities.set(Capabilities::PLUS, config.plus);
        capabilities.set(Capabilities::RESOLVER, config.resolver);
        capabilities.set(Capabilities::WILDCARD_TLS, config.wildcard_tls);
        capabilities.set(Capabilities::INTERNAL_ROUTES, config.internal_routes);
        capabilities.set(Capabilities::LATENCY_METRICS, config.latency_metrics);
        capabilities.set(Capabilities::SERVICE_MESH, config.service_mesh);
        capabilities.set(Capabilities::TLS_PASSTHROUGH, config.tls_passthrough);
        capabilities.set(Capabilities::APP_PROTECT, config.app_protect);

        capabilities
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub capabilities: CapabilityConfig,
    /// The global configuration map, layered under every resource's annotations.
    #[serde(default)]
    pub global: BTreeMap<String, String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(option: ConfigLoadOption) -> Result<Self> {
        let config = Self::figment(option).extract()?;

        Ok(config)
    }

    fn figment(option: ConfigLoadOption) -> Figment {
        let figment = Figment::new();

        match option {
            ConfigLoadOption::Default => figment.merge(Serialized::defaults(Self::default())),
            ConfigLoadOption::Path(path) => figment
                .merge(Serialized::defaults(Self::default()))
                .merge(Yaml::file(path)),
        }
        .merge(Env::prefixed("INGRESS_SYNTH_").split("__"))
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from(&self.capabilities)
    }
}
