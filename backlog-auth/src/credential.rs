//! The five credential strategies.
//!
//! Strategy selection is explicit: callers construct the [`Credential`]
//! variant they want and resolve it into a connection. Each variant
//! carries exactly the inputs its flow needs and validates them before
//! any network activity.

use backlog_core::Error;

use crate::assertion::ClientCertificate;
use crate::broker::{TokenBroker, DEVOPS_RESOURCE, DEVOPS_SCOPE};
use crate::connection::AuthScheme;

// ============================================================================
// Credential
// ============================================================================

/// A credential strategy, one variant per authentication flow.
///
/// The delegated-token and username/password variants are wrapped without
/// network validation; their validity is discovered on first real use of
/// the resulting connection. The managed-identity and service-principal
/// variants make exactly one token-acquisition call per resolution, with
/// no process-wide caching.
#[derive(Clone)]
pub enum Credential {
    /// Token from the hosting platform's identity service. A `client_id`
    /// selects a user-assigned identity.
    ManagedIdentity {
        /// User-assigned identity client id, or `None` for system-assigned.
        client_id: Option<String>,
    },
    /// Caller-supplied bearer token, wrapped as-is.
    DelegatedToken {
        /// The bearer token.
        access_token: String,
    },
    /// Interactive credentials. Discouraged, retained for legacy
    /// compatibility.
    UsernamePassword {
        /// Account username.
        username: String,
        /// Account password.
        password: String,
    },
    /// Confidential client authenticated by a private-key certificate.
    ServicePrincipalCertificate {
        /// Application (client) id.
        client_id: String,
        /// Directory (tenant) id.
        tenant_id: String,
        /// Certificate with its private key.
        certificate: ClientCertificate,
    },
    /// Confidential client authenticated by a shared secret.
    ServicePrincipalSecret {
        /// Application (client) id.
        client_id: String,
        /// Directory (tenant) id.
        tenant_id: String,
        /// The shared secret.
        client_secret: String,
    },
}

impl Credential {
    /// Short strategy name for log lines.
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::ManagedIdentity { .. } => "managed_identity",
            Self::DelegatedToken { .. } => "delegated_token",
            Self::UsernamePassword { .. } => "username_password",
            Self::ServicePrincipalCertificate { .. } => "service_principal_certificate",
            Self::ServicePrincipalSecret { .. } => "service_principal_secret",
        }
    }

    /// Checks this credential's preconditions. Fails with
    /// `InvalidArgument` on any blank required field or an empty
    /// certificate, before any network activity.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Self::ManagedIdentity { client_id } => {
                if let Some(id) = client_id {
                    require(id, "managed identity client ID")?;
                }
            }
            Self::DelegatedToken { access_token } => {
                require(access_token, "access token")?;
            }
            Self::UsernamePassword { username, password } => {
                require(username, "username")?;
                require(password, "password")?;
            }
            Self::ServicePrincipalCertificate {
                client_id,
                tenant_id,
                certificate,
            } => {
                require(client_id, "client ID")?;
                require(tenant_id, "tenant ID")?;
                if certificate.is_empty() {
                    return Err(Error::invalid_argument("certificate cannot be empty"));
                }
            }
            Self::ServicePrincipalSecret {
                client_id,
                tenant_id,
                client_secret,
            } => {
                require(client_id, "client ID")?;
                require(tenant_id, "tenant ID")?;
                require(client_secret, "client secret")?;
            }
        }
        Ok(())
    }

    /// Auth material for the strategies that never touch the network.
    pub(crate) fn offline_auth(&self) -> Option<AuthScheme> {
        match self {
            Self::DelegatedToken { access_token } => {
                Some(AuthScheme::Bearer(access_token.clone()))
            }
            Self::UsernamePassword { username, password } => Some(AuthScheme::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    /// Acquires the auth material for this credential, calling the broker
    /// where the flow requires a token. Broker failures classify as
    /// `AuthenticationFailed` wrapping the cause; they never surface as
    /// raw transport errors.
    pub(crate) async fn acquire(&self, broker: &dyn TokenBroker) -> Result<AuthScheme, Error> {
        match self {
            Self::ManagedIdentity { client_id } => {
                let token = broker
                    .managed_identity_token(DEVOPS_RESOURCE, client_id.as_deref())
                    .await
                    .map_err(|e| {
                        Error::authentication("failed to authenticate with managed identity", &e)
                    })?;
                Ok(AuthScheme::Bearer(token))
            }
            Self::ServicePrincipalCertificate {
                client_id,
                tenant_id,
                certificate,
            } => {
                let token = broker
                    .client_certificate_token(tenant_id, client_id, certificate, DEVOPS_SCOPE)
                    .await
                    .map_err(|e| {
                        Error::authentication("failed to authenticate service principal", &e)
                    })?;
                Ok(AuthScheme::Bearer(token))
            }
            Self::ServicePrincipalSecret {
                client_id,
                tenant_id,
                client_secret,
            } => {
                let token = broker
                    .client_secret_token(tenant_id, client_id, client_secret, DEVOPS_SCOPE)
                    .await
                    .map_err(|e| {
                        Error::authentication(
                            "failed to authenticate service principal with secret",
                            &e,
                        )
                    })?;
                Ok(AuthScheme::Bearer(token))
            }
            Self::DelegatedToken { .. } | Self::UsernamePassword { .. } => self
                .offline_auth()
                .ok_or_else(|| Error::invalid_argument("credential has no auth material")),
        }
    }
}

// Secret material never reaches log output through Debug.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManagedIdentity { client_id } => f
                .debug_struct("Credential::ManagedIdentity")
                .field("client_id", client_id)
                .finish(),
            Self::DelegatedToken { .. } => f.write_str("Credential::DelegatedToken(<redacted>)"),
            Self::UsernamePassword { username, .. } => f
                .debug_struct("Credential::UsernamePassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::ServicePrincipalCertificate {
                client_id,
                tenant_id,
                ..
            } => f
                .debug_struct("Credential::ServicePrincipalCertificate")
                .field("client_id", client_id)
                .field("tenant_id", tenant_id)
                .finish(),
            Self::ServicePrincipalSecret {
                client_id,
                tenant_id,
                ..
            } => f
                .debug_struct("Credential::ServicePrincipalSecret")
                .field("client_id", client_id)
                .field("tenant_id", tenant_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

fn require(value: &str, what: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        Err(Error::invalid_argument(format!("{what} cannot be blank")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::error::TokenError;
    use async_trait::async_trait;
    use backlog_core::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Broker that records how many token calls were made.
    #[derive(Default)]
    struct CountingBroker {
        calls: AtomicUsize,
        deny: bool,
    }

    #[async_trait]
    impl TokenBroker for CountingBroker {
        async fn managed_identity_token(
            &self,
            _resource: &str,
            _client_id: Option<&str>,
        ) -> Result<String, TokenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.deny {
                Err(TokenError::Denied {
                    code: "invalid_client".into(),
                    description: "identity endpoint said no".into(),
                })
            } else {
                Ok("mi-token".into())
            }
        }

        async fn client_secret_token(
            &self,
            _tenant_id: &str,
            _client_id: &str,
            _client_secret: &str,
            _scope: &str,
        ) -> Result<String, TokenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("secret-token".into())
        }

        async fn client_certificate_token(
            &self,
            _tenant_id: &str,
            _client_id: &str,
            _certificate: &ClientCertificate,
            _scope: &str,
        ) -> Result<String, TokenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("cert-token".into())
        }
    }

    const ORG: &str = "https://dev.azure.com/contoso";

    #[tokio::test]
    async fn test_blank_fields_fail_before_any_broker_call() {
        let broker = CountingBroker::default();
        let blanks: Vec<Credential> = vec![
            Credential::DelegatedToken {
                access_token: "  ".into(),
            },
            Credential::UsernamePassword {
                username: String::new(),
                password: "pw".into(),
            },
            Credential::UsernamePassword {
                username: "user".into(),
                password: String::new(),
            },
            Credential::ManagedIdentity {
                client_id: Some("  ".into()),
            },
            Credential::ServicePrincipalSecret {
                client_id: String::new(),
                tenant_id: "tenant".into(),
                client_secret: "secret".into(),
            },
            Credential::ServicePrincipalSecret {
                client_id: "client".into(),
                tenant_id: " ".into(),
                client_secret: "secret".into(),
            },
            Credential::ServicePrincipalSecret {
                client_id: "client".into(),
                tenant_id: "tenant".into(),
                client_secret: String::new(),
            },
            Credential::ServicePrincipalCertificate {
                client_id: "client".into(),
                tenant_id: "tenant".into(),
                certificate: ClientCertificate::from_der(Vec::new(), Vec::new()),
            },
        ];

        for credential in blanks {
            let err = Connection::resolve_with(ORG, &credential, &broker)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{credential:?}");
        }
        assert_eq!(broker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_managed_identity_acquires_bearer_token() {
        let broker = CountingBroker::default();
        let credential = Credential::ManagedIdentity { client_id: None };
        let conn = Connection::resolve_with(ORG, &credential, &broker)
            .await
            .unwrap();
        assert_eq!(conn.authorization_header(), "Bearer mi-token");
        assert_eq!(broker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_denied_token_classifies_as_authentication_failed() {
        let broker = CountingBroker {
            deny: true,
            ..CountingBroker::default()
        };
        let credential = Credential::ManagedIdentity { client_id: None };
        let err = Connection::resolve_with(ORG, &credential, &broker)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert!(err.to_string().contains("identity endpoint said no"));
    }

    #[tokio::test]
    async fn test_service_principal_secret_acquires_token() {
        let broker = CountingBroker::default();
        let credential = Credential::ServicePrincipalSecret {
            client_id: "client".into(),
            tenant_id: "tenant".into(),
            client_secret: "shhh".into(),
        };
        let conn = Connection::resolve_with(ORG, &credential, &broker)
            .await
            .unwrap();
        assert_eq!(conn.authorization_header(), "Bearer secret-token");
    }

    #[tokio::test]
    async fn test_each_resolution_acquires_a_fresh_token() {
        let broker = CountingBroker::default();
        let credential = Credential::ManagedIdentity { client_id: None };
        for _ in 0..3 {
            Connection::resolve_with(ORG, &credential, &broker)
                .await
                .unwrap();
        }
        assert_eq!(broker.calls.load(Ordering::SeqCst), 3);
    }
}
