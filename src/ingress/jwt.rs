use crate::{
    diagnostics::Warnings,
    model::{JwtAuth, JwtRedirectLocation},
};

use super::{Synthesis, SECRET_TYPE_JWK};

impl Synthesis<'_> {
    /// Token auth when a JWK secret is configured.
    ///
    /// The key path is used even when the secret is invalid or of another
    /// type, so the proxy rejects requests at runtime instead of serving
    /// them unauthenticated.
    pub(super) fn jwt_auth(
        &self,
        warnings: &mut Warnings,
    ) -> Option<(JwtAuth, Option<JwtRedirectLocation>)> {
        let params = &self.params;
        let key_name = params.jwt_key.as_deref()?;

        let key = match self.ing_ex.secrets.get(key_name) {
            Some(secret) => {
                if let Some(err) = &secret.error {
                    warnings.push(&self.resource, format!("JWK secret {key_name} is invalid: {err}"));
                } else if secret.secret_type != SECRET_TYPE_JWK {
                    warnings.push(
                        &self.resource,
                        format!(
                            "JWK secret {key_name} is of type {}, expected {SECRET_TYPE_JWK}",
                            secret.secret_type
                        ),
                    );
                }
                secret.path.clone()
            }
            None => {
                warnings.push(&self.resource, format!("JWK secret {key_name} is not resolved"));
                String::new()
            }
        };

        let mut auth = JwtAuth {
            key,
            realm: params.jwt_realm.clone(),
            token: params.jwt_token.clone(),
            redirect_location_name: None,
        };

        let redirect = params.jwt_login_url.as_ref().map(|login_url| {
            let name = self.redirect_location_name();
            auth.redirect_location_name = Some(name.clone());
            JwtRedirectLocation {
                name,
                login_url: login_url.clone(),
            }
        });

        Some((auth, redirect))
    }

    fn redirect_location_name(&self) -> String {
        format!("@login_url_{}-{}", self.meta.namespace, self.meta.name)
    }
}
