//! Non-blocking diagnostics reported while resolving and synthesizing.
//!
//! Nothing recorded here changes the produced configuration. Warnings are a
//! side channel for the caller to log or surface on the resource.

use serde::Serialize;

use crate::logger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// `<namespace>/<name>` of the originating resource, or `global` for the
    /// global configuration map.
    pub resource: String,
    pub message: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resource: impl Into<String>, message: impl Into<String>) {
        let warning = Warning {
            resource: resource.into(),
            message: message.into(),
        };

        logger!(warn, "{}: {}", warning.resource, warning.message);

        self.items.push(warning);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if any warning message contains `pattern`.
    pub fn mentions(&self, pattern: &str) -> bool {
        self.items.iter().any(|w| w.message.contains(pattern))
    }
}
