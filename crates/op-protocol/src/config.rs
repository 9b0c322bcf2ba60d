//! Server configuration.

use op_crypto::{JwsAlgorithm, JwsCodec};
use serde::{Deserialize, Serialize};

/// Configuration for the authorization-server core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Issuer URL, stamped into ID tokens.
    pub issuer: String,

    /// Authorization-code lifetime in seconds.
    pub authorization_code_lifetime: i64,

    /// Pending-consent lifetime in seconds.
    pub pending_authorization_lifetime: i64,

    /// Access-token lifetime in seconds.
    pub access_token_lifetime: i64,

    /// Refresh-token lifetime in seconds.
    pub refresh_token_lifetime: i64,

    /// ID-token lifetime in seconds.
    pub id_token_lifetime: i64,

    /// ID-token signing algorithm. The unsigned variant is for restricted
    /// test and interop configurations only.
    pub algorithm: JwsAlgorithm,

    /// HMAC signing secret.
    pub signing_secret: String,
}

impl ProviderConfig {
    /// Builds the JWS codec for the configured algorithm and secret.
    #[must_use]
    pub fn codec(&self) -> JwsCodec {
        JwsCodec::new(self.algorithm, self.signing_secret.as_bytes().to_vec())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            authorization_code_lifetime: 600,
            pending_authorization_lifetime: 600,
            access_token_lifetime: 3600,
            refresh_token_lifetime: 7200,
            id_token_lifetime: 300,
            algorithm: JwsAlgorithm::Hs384,
            signing_secret: "dev-secret-do-not-deploy".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_signs_tokens() {
        let config = ProviderConfig::default();
        assert!(config.algorithm.is_signed());
        assert!(config.authorization_code_lifetime <= 600);
    }

    #[test]
    fn codec_uses_configured_algorithm() {
        let config = ProviderConfig {
            algorithm: JwsAlgorithm::None,
            ..ProviderConfig::default()
        };
        assert_eq!(config.codec().algorithm(), JwsAlgorithm::None);
    }
}
