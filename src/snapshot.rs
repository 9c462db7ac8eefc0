//! The binary's input: an Ingress and optional minions, with every
//! referenced resource already resolved.

use std::{
    io::{self, Read},
    path::Path,
};

use kube::ResourceExt;
use serde::Deserialize;

use crate::{
    annotations::MERGEABLE_INGRESS_TYPE,
    diagnostics::Warnings,
    error::SnapshotError,
    ingress::{generate_ingress_config, generate_mergeable_config, IngressEx, MergeableIngresses},
    model::IngressConfig,
    params::{Capabilities, ParameterSet},
};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Snapshot {
    pub ingress: IngressEx,
    #[serde(default)]
    pub minions: Vec<IngressEx>,
}

impl Snapshot {
    /// Reads a YAML (or JSON) snapshot. `-` reads stdin.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(path)?
        };

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, SnapshotError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn is_master(&self) -> bool {
        !self.minions.is_empty()
            || self
                .ingress
                .ingress
                .annotations()
                .get(MERGEABLE_INGRESS_TYPE)
                .is_some_and(|value| value == "master")
    }

    pub fn generate(
        self,
        base: &ParameterSet,
        capabilities: Capabilities,
        warnings: &mut Warnings,
    ) -> IngressConfig {
        if self.is_master() {
            let mergeable = MergeableIngresses {
                master: self.ingress,
                minions: self.minions,
            };

            generate_mergeable_config(&mergeable, base, capabilities, warnings)
        } else {
            generate_ingress_config(&self.ingress, base, false, capabilities, warnings)
        }
    }
}
