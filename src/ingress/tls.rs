use k8s_openapi::api::networking::v1::IngressTLS;

use crate::{diagnostics::Warnings, model::ServerTls, params::Capabilities};

use super::{Synthesis, SECRET_TYPE_TLS};

/// Certificate that fails every handshake.
const PEM_FOR_MISSING_SECRET: &str = "/etc/nginx/secrets/default";
const PEM_FOR_WILDCARD_SECRET: &str = "/etc/nginx/secrets/wildcard";

const CIPHERS_FOR_MISSING_SECRET: &str = "NULL";

impl Synthesis<'_> {
    /// `None` unless a TLS entry lists `host`. The last matching entry wins.
    pub(super) fn server_tls(
        &self,
        host: &str,
        entries: &[IngressTLS],
        warnings: &mut Warnings,
    ) -> Option<ServerTls> {
        let entry = entries.iter().rev().find(|entry| {
            entry
                .hosts
                .as_ref()
                .is_some_and(|hosts| hosts.iter().any(|h| h == host))
        })?;

        let secret_name = entry.secret_name.as_deref().filter(|name| !name.is_empty());

        let pem = match secret_name {
            Some(name) => self.tls_secret_path(name, warnings),
            None if self.capabilities.contains(Capabilities::WILDCARD_TLS) => {
                PEM_FOR_WILDCARD_SECRET.to_string()
            }
            None => {
                warnings.push(
                    &self.resource,
                    format!("no TLS secret and no wildcard certificate for host {host}"),
                );
                PEM_FOR_MISSING_SECRET.to_string()
            }
        };

        let ciphers =
            (pem == PEM_FOR_MISSING_SECRET).then(|| CIPHERS_FOR_MISSING_SECRET.to_string());

        Some(ServerTls {
            certificate: pem.clone(),
            certificate_key: pem,
            ciphers,
        })
    }

    fn tls_secret_path(&self, name: &str, warnings: &mut Warnings) -> String {
        match self.ing_ex.secrets.get(name) {
            Some(secret) if secret.is_valid(SECRET_TYPE_TLS) => secret.path.clone(),
            Some(secret) => {
                let reason = secret.error.clone().unwrap_or_else(|| {
                    format!("type {} is not {SECRET_TYPE_TLS}", secret.secret_type)
                });
                warnings.push(&self.resource, format!("TLS secret {name} is invalid: {reason}"));
                PEM_FOR_MISSING_SECRET.to_string()
            }
            None => {
                warnings.push(&self.resource, format!("TLS secret {name} is not resolved"));
                PEM_FOR_MISSING_SECRET.to_string()
            }
        }
    }
}
