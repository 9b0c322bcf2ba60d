//! ID-token construction and signing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use op_crypto::{JwsAlgorithm, JwsCodec};

use crate::claims::IdTokenClaims;
use crate::config::ProviderConfig;
use crate::error::{OidcError, OidcResult};

/// Builds and signs ID tokens for the configured issuer.
pub struct IdTokenBuilder {
    issuer: String,
    lifetime_seconds: i64,
    algorithm: JwsAlgorithm,
    codec: JwsCodec,
}

impl IdTokenBuilder {
    /// Creates a builder from the server configuration.
    #[must_use]
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            lifetime_seconds: config.id_token_lifetime,
            algorithm: config.algorithm,
            codec: config.codec(),
        }
    }

    /// Builds the claim set for one issuance.
    ///
    /// `auth_time` is the session's authentication time, never the
    /// issuance time. `at_hash` is set iff `access_token` accompanies the
    /// ID token in the same response.
    #[must_use]
    pub fn build(
        &self,
        client_id: &str,
        subject: &str,
        auth_time: DateTime<Utc>,
        nonce: Option<&str>,
        access_token: Option<&str>,
    ) -> IdTokenClaims {
        let expires_at = Utc::now() + Duration::seconds(self.lifetime_seconds);
        let mut claims = IdTokenClaims::new(self.issuer.clone(), subject, client_id, expires_at)
            .with_auth_time(auth_time.timestamp());

        if let Some(nonce) = nonce {
            claims = claims.with_nonce(nonce);
        }
        if let Some(access_token) = access_token {
            claims = claims.with_at_hash(self.compute_at_hash(access_token));
        }

        claims
    }

    /// Signs a claim set into compact JWS form.
    ///
    /// # Errors
    ///
    /// `server_error` when signing fails.
    pub fn sign(&self, claims: &IdTokenClaims) -> OidcResult<String> {
        self.codec
            .encode(claims)
            .map_err(|e| OidcError::ServerError(format!("token signing failed: {e}")))
    }

    /// Builds and signs in one step.
    ///
    /// # Errors
    ///
    /// `server_error` when signing fails.
    pub fn issue(
        &self,
        client_id: &str,
        subject: &str,
        auth_time: DateTime<Utc>,
        nonce: Option<&str>,
        access_token: Option<&str>,
    ) -> OidcResult<String> {
        let claims = self.build(client_id, subject, auth_time, nonce, access_token);
        self.sign(&claims)
    }

    /// Computes the `at_hash` claim value.
    ///
    /// Left half of the configured digest of the access-token value,
    /// base64url-encoded without padding.
    fn compute_at_hash(&self, access_token: &str) -> String {
        let digest = op_crypto::hash(self.algorithm.hash_algorithm(), access_token.as_bytes());
        let half = &digest[..digest.len() / 2];
        URL_SAFE_NO_PAD.encode(half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> IdTokenBuilder {
        IdTokenBuilder::new(&ProviderConfig::default())
    }

    #[test]
    fn at_hash_present_iff_access_token_present() {
        let b = builder();

        let with = b.build("consumer-id", "alice", Utc::now(), None, Some("token-value"));
        assert!(with.at_hash.is_some());

        let without = b.build("consumer-id", "alice", Utc::now(), None, None);
        assert!(without.at_hash.is_none());
    }

    #[test]
    fn at_hash_is_half_digest_base64url() {
        let b = builder();
        let claims = b.build("consumer-id", "alice", Utc::now(), None, Some("token-value"));
        let at_hash = claims.at_hash.unwrap();

        // SHA-384 halves to 24 bytes, 32 chars of unpadded base64url.
        assert_eq!(at_hash.len(), 32);
        assert!(!at_hash.contains('='));
        assert!(
            at_hash
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn auth_time_is_session_time_not_issuance_time() {
        let b = builder();
        let auth_time = Utc::now() - chrono::Duration::seconds(120);

        let claims = b.build("consumer-id", "alice", auth_time, None, None);
        assert_eq!(claims.auth_time, Some(auth_time.timestamp()));
        assert!(claims.iat > auth_time.timestamp());
    }

    #[test]
    fn nonce_is_echoed() {
        let b = builder();
        let claims = b.build("consumer-id", "alice", Utc::now(), Some("1234565635"), None);
        assert_eq!(claims.nonce.as_deref(), Some("1234565635"));
    }

    #[test]
    fn signed_token_verifies_with_the_configured_codec() {
        let config = ProviderConfig::default();
        let b = IdTokenBuilder::new(&config);

        let token = b
            .issue("consumer-id", "alice", Utc::now(), Some("n1"), None)
            .unwrap();

        let claims: IdTokenClaims = config.codec().verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.aud, "consumer-id");
        assert_eq!(claims.nonce.as_deref(), Some("n1"));
    }

    #[test]
    fn unsigned_mode_produces_empty_signature() {
        let config = ProviderConfig {
            algorithm: JwsAlgorithm::None,
            ..ProviderConfig::default()
        };
        let b = IdTokenBuilder::new(&config);

        let token = b.issue("consumer-id", "alice", Utc::now(), None, None).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[2].is_empty());
    }
}
