//! Composition of a master Ingress and its minions into a single server.
//!
//! The master contributes the server-level settings and its upstreams.
//! Each minion contributes locations, upstreams, health checks and token
//! auth redirect locations, appended in minion order.

use serde::Deserialize;

use crate::{
    annotations::{
        mergeable::{
            filter_master_annotations, filter_minion_annotations,
            merge_master_annotations_into_minion,
        },
        MERGEABLE_INGRESS_TYPE,
    },
    diagnostics::Warnings,
    model::IngressConfig,
    params::{Capabilities, ParameterSet},
};

use super::{spiffe_client_certs, synthesize, Declaration, IngressEx};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MergeableIngresses {
    pub master: IngressEx,
    #[serde(default)]
    pub minions: Vec<IngressEx>,
}

pub fn generate_mergeable_config(
    mergeable: &MergeableIngresses,
    base: &ParameterSet,
    capabilities: Capabilities,
    warnings: &mut Warnings,
) -> IngressConfig {
    let master = &mergeable.master;
    let master_meta = master.meta();

    let filtered = filter_master_annotations(&master_meta.annotations);
    if !filtered.removed.is_empty() {
        warnings.push(
            master_meta.key(),
            format!(
                "{MERGEABLE_INGRESS_TYPE} master cannot contain {}, ignoring",
                filtered.removed.join(",")
            ),
        );
    }

    let master_annotations = filtered.annotations;

    let master_config = synthesize(
        Declaration::new(master).with_annotations(master_annotations.clone()),
        base,
        false,
        capabilities,
        warnings,
    );

    let IngressConfig {
        mut upstreams,
        servers,
        keepalive,
        ingress,
        ..
    } = master_config;

    let spiffe_client_certs = spiffe_client_certs(base, capabilities);

    let Some(mut server) = servers.into_iter().next() else {
        warnings.push(
            master_meta.key(),
            "master has no valid host, no server will be created",
        );
        return IngressConfig {
            upstreams,
            servers: Vec::new(),
            keepalive,
            spiffe_client_certs,
            ingress,
        };
    };

    server.locations.clear();

    for minion in &mergeable.minions {
        let minion_meta = minion.meta();

        let merged =
            merge_master_annotations_into_minion(&minion_meta.annotations, &master_annotations);

        let filtered = filter_minion_annotations(&merged);
        if !filtered.removed.is_empty() {
            warnings.push(
                minion_meta.key(),
                format!(
                    "{MERGEABLE_INGRESS_TYPE} minion cannot contain {}, ignoring",
                    filtered.removed.join(",")
                ),
            );
        }

        let minion_config = synthesize(
            Declaration::new(minion)
                .with_annotations(filtered.annotations)
                .as_minion(),
            base,
            true,
            capabilities,
            warnings,
        );

        for minion_server in minion_config.servers {
            server
                .locations
                .extend(minion_server.locations.into_iter().map(|mut location| {
                    location.minion_ingress = Some(minion_config.ingress.clone());
                    location
                }));

            server.health_checks.extend(minion_server.health_checks);

            server
                .jwt_redirect_locations
                .extend(minion_server.jwt_redirect_locations);
        }

        upstreams.extend(minion_config.upstreams);
    }

    IngressConfig {
        upstreams,
        servers: vec![server],
        keepalive,
        spiffe_client_certs,
        ingress,
    }
}
