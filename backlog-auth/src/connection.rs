//! The authenticated connection handle.
//!
//! A [`Connection`] binds an endpoint URL to opaque auth material. It is
//! immutable once constructed and single-owner: the service facade that
//! receives it keeps it for its own lifetime and releases it on drop.

use std::fmt;
use std::future::Future;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::OnceCell;
use url::Url;

use backlog_core::{Error, Identity};

use crate::broker::{EntraTokenBroker, TokenBroker};
use crate::credential::Credential;

// ============================================================================
// Auth Scheme
// ============================================================================

/// The auth material carried by a connection.
#[derive(Clone)]
pub enum AuthScheme {
    /// OAuth bearer token (managed identity, delegated, service principal).
    Bearer(String),
    /// Basic credentials, legacy username/password path.
    Basic {
        /// Account username.
        username: String,
        /// Account password.
        password: String,
    },
}

impl AuthScheme {
    /// Renders the `Authorization` header value for this scheme.
    pub fn header_value(&self) -> String {
        match self {
            Self::Bearer(token) => format!("Bearer {token}"),
            Self::Basic { username, password } => {
                let encoded = BASE64.encode(format!("{username}:{password}"));
                format!("Basic {encoded}")
            }
        }
    }
}

// Secrets never reach log output through Debug.
impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("AuthScheme::Bearer(<redacted>)"),
            Self::Basic { username, .. } => f
                .debug_struct("AuthScheme::Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

// ============================================================================
// Connection
// ============================================================================

/// An authenticated session bound to a backend endpoint.
///
/// Produced by one of the five credential strategies, consumed by the
/// retrieval pipeline. The resolved principal is populated lazily on
/// first use; credential resolution itself never asks the backend who
/// the caller is.
#[derive(Debug)]
pub struct Connection {
    endpoint: Url,
    auth: AuthScheme,
    identity: OnceCell<Identity>,
}

impl Connection {
    pub(crate) fn new(endpoint: Url, auth: AuthScheme) -> Self {
        Self {
            endpoint,
            auth,
            identity: OnceCell::new(),
        }
    }

    /// The backend endpoint this connection is bound to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Renders the `Authorization` header value.
    pub fn authorization_header(&self) -> String {
        self.auth.header_value()
    }

    /// The auth scheme in use.
    pub fn auth_scheme(&self) -> &AuthScheme {
        &self.auth
    }

    /// The resolved principal, if it has been looked up already.
    pub fn cached_identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    /// Returns the resolved principal, running `resolve` at most once to
    /// populate it. A failed resolution leaves the cell empty so a later
    /// call may retry.
    pub async fn identity<E, F, Fut>(&self, resolve: F) -> Result<&Identity, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Identity, E>>,
    {
        self.identity.get_or_try_init(resolve).await
    }

    // ------------------------------------------------------------------
    // Resolution entry points, one per strategy
    // ------------------------------------------------------------------

    /// Wraps a caller-supplied bearer token. No network activity; token
    /// validity is discovered on first real use of the connection.
    pub fn delegated_token(endpoint_url: &str, access_token: &str) -> Result<Self, Error> {
        Self::resolve_offline(
            endpoint_url,
            Credential::DelegatedToken {
                access_token: access_token.to_owned(),
            },
        )
    }

    /// Wraps interactive credentials. Legacy path, not validated eagerly.
    pub fn username_password(
        endpoint_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, Error> {
        Self::resolve_offline(
            endpoint_url,
            Credential::UsernamePassword {
                username: username.to_owned(),
                password: password.to_owned(),
            },
        )
    }

    /// Acquires a token from the hosting platform's identity service.
    /// `client_id` selects a user-assigned identity; `None` uses the
    /// system-assigned one.
    pub async fn managed_identity(
        endpoint_url: &str,
        client_id: Option<&str>,
    ) -> Result<Self, Error> {
        let credential = Credential::ManagedIdentity {
            client_id: client_id.map(str::to_owned),
        };
        Self::resolve_with(endpoint_url, &credential, &Self::default_broker()?).await
    }

    /// Acquires a token as a confidential client authenticated by a
    /// private-key certificate.
    pub async fn service_principal_certificate(
        endpoint_url: &str,
        client_id: &str,
        tenant_id: &str,
        certificate: crate::assertion::ClientCertificate,
    ) -> Result<Self, Error> {
        let credential = Credential::ServicePrincipalCertificate {
            client_id: client_id.to_owned(),
            tenant_id: tenant_id.to_owned(),
            certificate,
        };
        Self::resolve_with(endpoint_url, &credential, &Self::default_broker()?).await
    }

    /// Acquires a token as a confidential client authenticated by a
    /// shared secret.
    pub async fn service_principal_secret(
        endpoint_url: &str,
        client_id: &str,
        tenant_id: &str,
        client_secret: &str,
    ) -> Result<Self, Error> {
        let credential = Credential::ServicePrincipalSecret {
            client_id: client_id.to_owned(),
            tenant_id: tenant_id.to_owned(),
            client_secret: client_secret.to_owned(),
        };
        Self::resolve_with(endpoint_url, &credential, &Self::default_broker()?).await
    }

    /// Resolves a credential against the default Entra ID broker.
    pub async fn resolve(endpoint_url: &str, credential: &Credential) -> Result<Self, Error> {
        Self::resolve_with(endpoint_url, credential, &Self::default_broker()?).await
    }

    /// Resolves a credential against an explicit token broker.
    ///
    /// Input validation happens before the broker is touched: a blank or
    /// malformed endpoint, or a credential failing its own preconditions,
    /// fails with `InvalidArgument` and performs no network call. Broker
    /// failures classify as `AuthenticationFailed` wrapping the cause.
    pub async fn resolve_with(
        endpoint_url: &str,
        credential: &Credential,
        broker: &dyn TokenBroker,
    ) -> Result<Self, Error> {
        let endpoint = parse_endpoint(endpoint_url)?;
        credential.validate()?;
        let auth = credential.acquire(broker).await?;
        tracing::debug!(endpoint = %endpoint, strategy = credential.strategy_name(), "resolved connection");
        Ok(Self::new(endpoint, auth))
    }

    fn resolve_offline(endpoint_url: &str, credential: Credential) -> Result<Self, Error> {
        let endpoint = parse_endpoint(endpoint_url)?;
        credential.validate()?;
        let auth = credential
            .offline_auth()
            .ok_or_else(|| Error::invalid_argument("credential requires token acquisition"))?;
        Ok(Self::new(endpoint, auth))
    }

    fn default_broker() -> Result<EntraTokenBroker, Error> {
        EntraTokenBroker::new()
            .map_err(|e| Error::authentication("failed to construct token client", &e))
    }
}

/// Parses and validates the endpoint URL argument shared by all
/// strategies.
fn parse_endpoint(endpoint_url: &str) -> Result<Url, Error> {
    if endpoint_url.trim().is_empty() {
        return Err(Error::invalid_argument(
            "organization URL cannot be blank",
        ));
    }
    Url::parse(endpoint_url)
        .map_err(|e| Error::invalid_argument(format!("organization URL is not a valid URL: {e}")))
}
