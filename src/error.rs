pub use anyhow::{anyhow, Result};

use thiserror::Error as TError;

/// Format errors raised while parsing annotation and global configuration values.
///
/// These never abort resolution. Callers fall back to the inherited value and
/// report the error as a warning.
#[derive(Debug, Clone, PartialEq, Eq, TError)]
pub enum ParseError {
    #[error("invalid {directive} declaration: {value:?}")]
    Directive {
        directive: &'static str,
        value: String,
    },
    #[error("invalid time string: {0:?}")]
    Time(String),
    #[error("invalid size offset: {0:?}")]
    Offset(String),
    #[error("invalid size: {0:?}")]
    Size(String),
    #[error("invalid proxy buffers string: {0:?}")]
    ProxyBuffers(String),
    #[error("invalid non-negative integer: {0:?}")]
    NonNegativeInt(String),
    #[error("invalid integer: {0:?}")]
    Int(String),
    #[error("invalid boolean: {0:?}")]
    Bool(String),
    #[error("invalid load balancing method: {0:?}")]
    LbMethod(String),
    #[error("invalid port list: {0:?}")]
    Ports(String),
}

#[derive(Debug, TError)]
pub enum SnapshotError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
