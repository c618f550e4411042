//! Signed client assertions for the certificate flow.
//!
//! A confidential client proving itself with a certificate sends the
//! token endpoint a short-lived JWT (`client_assertion`) signed with the
//! certificate's private key:
//!
//! ```text
//! header: {"alg": "RS256", "typ": "JWT", "x5t": <b64url sha1(cert DER)>}
//! claims: {"aud": <token endpoint>, "iss": <client id>, "sub": <client id>,
//!          "jti": <random>, "iat"/"nbf": now, "exp": now + 10 min}
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64URL;
use chrono::Utc;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, signature};
use std::fmt;

use crate::error::TokenError;

/// Assertion lifetime in seconds.
const ASSERTION_TTL_SECS: i64 = 600;

// ============================================================================
// Client Certificate
// ============================================================================

/// A service-principal certificate with its private key.
///
/// Both parts are DER: the certificate itself (for the `x5t` thumbprint)
/// and the PKCS#8 private key (for signing).
#[derive(Clone)]
pub struct ClientCertificate {
    certificate_der: Vec<u8>,
    private_key_pkcs8: Vec<u8>,
}

impl ClientCertificate {
    /// Wraps DER-encoded certificate and PKCS#8 private-key bytes.
    pub fn from_der(certificate_der: Vec<u8>, private_key_pkcs8: Vec<u8>) -> Self {
        Self {
            certificate_der,
            private_key_pkcs8,
        }
    }

    /// True when either part is missing. An empty certificate fails
    /// validation before any token request is attempted.
    pub fn is_empty(&self) -> bool {
        self.certificate_der.is_empty() || self.private_key_pkcs8.is_empty()
    }

    /// The `x5t` header value: base64url of the SHA-1 over the
    /// certificate DER.
    pub(crate) fn thumbprint_x5t(&self) -> String {
        let sha1 = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &self.certificate_der);
        B64URL.encode(sha1.as_ref())
    }
}

// Key material never reaches log output through Debug.
impl fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("certificate_der_len", &self.certificate_der.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Assertion Construction
// ============================================================================

/// Builds and signs the `client_assertion` JWT for a token request
/// against `audience` (the tenant's token endpoint).
pub(crate) fn signed_client_assertion(
    certificate: &ClientCertificate,
    client_id: &str,
    audience: &str,
) -> Result<String, TokenError> {
    let header = serde_json::json!({
        "alg": "RS256",
        "typ": "JWT",
        "x5t": certificate.thumbprint_x5t(),
    });

    let now = Utc::now().timestamp();
    let claims = serde_json::json!({
        "aud": audience,
        "iss": client_id,
        "sub": client_id,
        "jti": random_jti()?,
        "iat": now,
        "nbf": now,
        "exp": now + ASSERTION_TTL_SECS,
    });

    let signing_input = format!(
        "{}.{}",
        B64URL.encode(header.to_string()),
        B64URL.encode(claims.to_string())
    );

    let key_pair = signature::RsaKeyPair::from_pkcs8(&certificate.private_key_pkcs8)
        .map_err(|e| TokenError::Assertion(format!("rejected private key: {e}")))?;

    let rng = SystemRandom::new();
    let mut sig = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &signature::RSA_PKCS1_SHA256,
            &rng,
            signing_input.as_bytes(),
            &mut sig,
        )
        .map_err(|_| TokenError::Assertion("signing failed".into()))?;

    Ok(format!("{signing_input}.{}", B64URL.encode(&sig)))
}

fn random_jti() -> Result<String, TokenError> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| TokenError::Assertion("random generator unavailable".into()))?;
    Ok(B64URL.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbprint_is_deterministic_base64url() {
        let cert = ClientCertificate::from_der(vec![1, 2, 3], vec![9]);
        let a = cert.thumbprint_x5t();
        let b = cert.thumbprint_x5t();
        assert_eq!(a, b);
        // base64url alphabet, no padding
        assert!(!a.contains('='));
        assert!(!a.contains('+'));
        assert!(!a.contains('/'));
    }

    #[test]
    fn test_empty_certificate_detected() {
        assert!(ClientCertificate::from_der(Vec::new(), vec![1]).is_empty());
        assert!(ClientCertificate::from_der(vec![1], Vec::new()).is_empty());
        assert!(!ClientCertificate::from_der(vec![1], vec![1]).is_empty());
    }

    #[test]
    fn test_garbage_key_rejected_as_assertion_error() {
        let cert = ClientCertificate::from_der(vec![1, 2, 3], vec![4, 5, 6]);
        let err = signed_client_assertion(&cert, "client", "https://aud").unwrap_err();
        assert!(matches!(err, TokenError::Assertion(_)));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let cert = ClientCertificate::from_der(vec![1], vec![0xAA, 0xBB]);
        let rendered = format!("{cert:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("170")); // 0xAA
    }
}
