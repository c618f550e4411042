//! Token acquisition against the platform identity services.
//!
//! [`TokenBroker`] is the seam the credential strategies call through;
//! [`EntraTokenBroker`] is the real implementation, speaking to the
//! instance metadata service (managed identity) and the Entra ID token
//! endpoint (service principals).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::assertion::{signed_client_assertion, ClientCertificate};
use crate::error::TokenError;

// ============================================================================
// Constants
// ============================================================================

/// Resource identifier of Azure DevOps, used for managed-identity tokens.
pub const DEVOPS_RESOURCE: &str = "https://app.vssps.visualstudio.com";

/// OAuth scope of Azure DevOps, used for client-credentials tokens.
pub const DEVOPS_SCOPE: &str = "https://app.vssps.visualstudio.com/.default";

/// Instance metadata service token endpoint (link-local, Azure hosts only).
const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

/// IMDS API version.
const IMDS_API_VERSION: &str = "2019-08-01";

/// Entra ID authority base.
const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// `client_assertion_type` value for certificate-backed requests.
const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Token Broker Trait
// ============================================================================

/// Token-acquisition capability, one operation per flow that needs one.
///
/// Implementations must be safe to call from multiple call sites
/// concurrently: every call is an independent token request with no
/// shared mutable state and no cross-call caching.
#[async_trait]
pub trait TokenBroker: Send + Sync {
    /// Requests a token from the hosting platform's identity service for
    /// `resource`, on behalf of the user-assigned identity `client_id`
    /// when present, otherwise the system-assigned one.
    async fn managed_identity_token(
        &self,
        resource: &str,
        client_id: Option<&str>,
    ) -> Result<String, TokenError>;

    /// Requests a client-credentials token authenticated by a shared
    /// secret.
    async fn client_secret_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        scope: &str,
    ) -> Result<String, TokenError>;

    /// Requests a client-credentials token authenticated by a signed
    /// client assertion.
    async fn client_certificate_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        certificate: &ClientCertificate,
        scope: &str,
    ) -> Result<String, TokenError>;
}

// ============================================================================
// Wire Shapes
// ============================================================================

/// Successful token response (IMDS and Entra ID use the same field).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Error body returned by the identity services.
#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

// ============================================================================
// Entra Token Broker
// ============================================================================

/// Reqwest-backed [`TokenBroker`] for Azure-hosted identity services.
#[derive(Debug, Clone)]
pub struct EntraTokenBroker {
    http: Client,
    imds_endpoint: String,
    authority: String,
}

impl EntraTokenBroker {
    /// Creates a broker against the public Azure endpoints.
    pub fn new() -> Result<Self, TokenError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("backlog-auth/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            imds_endpoint: IMDS_TOKEN_ENDPOINT.to_owned(),
            authority: DEFAULT_AUTHORITY.to_owned(),
        })
    }

    /// Overrides the identity-service endpoints (sovereign clouds, tests).
    pub fn with_endpoints(
        mut self,
        imds_endpoint: impl Into<String>,
        authority: impl Into<String>,
    ) -> Self {
        self.imds_endpoint = imds_endpoint.into();
        self.authority = authority.into();
        self
    }

    fn token_endpoint(&self, tenant_id: &str) -> String {
        format!("{}/{tenant_id}/oauth2/v2.0/token", self.authority)
    }

    /// Sends a client-credentials form and interprets the response.
    async fn request_client_credentials_token(
        &self,
        tenant_id: &str,
        form: &[(&str, &str)],
    ) -> Result<String, TokenError> {
        let endpoint = self.token_endpoint(tenant_id);
        debug!(endpoint = %endpoint, "requesting client-credentials token");

        let response = self.http.post(&endpoint).form(form).send().await?;
        interpret_token_response(response).await
    }
}

#[async_trait]
impl TokenBroker for EntraTokenBroker {
    async fn managed_identity_token(
        &self,
        resource: &str,
        client_id: Option<&str>,
    ) -> Result<String, TokenError> {
        let mut query = vec![
            ("api-version", IMDS_API_VERSION),
            ("resource", resource),
        ];
        if let Some(id) = client_id {
            query.push(("client_id", id));
        }

        debug!(resource = %resource, user_assigned = client_id.is_some(), "requesting managed identity token");
        let response = self
            .http
            .get(&self.imds_endpoint)
            .header("Metadata", "true")
            .query(&query)
            .send()
            .await?;
        interpret_token_response(response).await
    }

    async fn client_secret_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        scope: &str,
    ) -> Result<String, TokenError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("scope", scope),
        ];
        self.request_client_credentials_token(tenant_id, &form)
            .await
    }

    async fn client_certificate_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        certificate: &ClientCertificate,
        scope: &str,
    ) -> Result<String, TokenError> {
        let audience = self.token_endpoint(tenant_id);
        let assertion = signed_client_assertion(certificate, client_id, &audience)?;
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_assertion_type", CLIENT_ASSERTION_TYPE),
            ("client_assertion", assertion.as_str()),
            ("scope", scope),
        ];
        self.request_client_credentials_token(tenant_id, &form)
            .await
    }
}

/// Maps an identity-service HTTP response to a bearer token or a
/// classified [`TokenError`].
async fn interpret_token_response(response: reqwest::Response) -> Result<String, TokenError> {
    let status = response.status();
    if status.is_success() {
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::MalformedResponse(e.to_string()))?;
        if body.access_token.is_empty() {
            return Err(TokenError::MalformedResponse(
                "empty access_token in response".into(),
            ));
        }
        return Ok(body.access_token);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<IdentityErrorBody>(&body) {
        Ok(IdentityErrorBody {
            error: Some(code),
            error_description,
        }) => {
            warn!(status = %status, code = %code, "token request denied");
            Err(TokenError::Denied {
                code,
                description: error_description.unwrap_or_default(),
            })
        }
        _ => Err(TokenError::MalformedResponse(format!(
            "status {status} with unrecognized body"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_endpoint_shape() {
        let broker = EntraTokenBroker::new().unwrap();
        assert_eq!(
            broker.token_endpoint("my-tenant"),
            "https://login.microsoftonline.com/my-tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_endpoint_overrides() {
        let broker = EntraTokenBroker::new()
            .unwrap()
            .with_endpoints("http://127.0.0.1:9000/token", "https://login.example");
        assert_eq!(broker.token_endpoint("t"), "https://login.example/t/oauth2/v2.0/token");
        assert_eq!(broker.imds_endpoint, "http://127.0.0.1:9000/token");
    }

    #[test]
    fn test_error_body_parses_aadsts_shape() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret"}"#;
        let parsed: IdentityErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.as_deref(), Some("invalid_client"));
        assert!(parsed.error_description.unwrap().contains("AADSTS7000215"));
    }
}
