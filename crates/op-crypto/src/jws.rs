//! Compact JWS encoding and verification.
//!
//! The codec signs a serde claim set into the compact `header.payload.sig`
//! form and verifies it back. The algorithm comes from server
//! configuration; the unsigned `none` variant produces an empty signature
//! segment and is implemented here directly because the underlying JWT
//! library refuses `alg=none` by construction.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::algorithm::JwsAlgorithm;

/// Error type for JWS operations.
#[derive(Debug, Error)]
pub enum JwsError {
    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Signature or claim verification failed.
    #[error("verification failed: {0}")]
    Verification(String),

    /// The token is not well-formed compact JWS.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token's algorithm does not match the configured one.
    #[error("algorithm mismatch: expected {expected}, found {found}")]
    AlgorithmMismatch {
        /// Configured algorithm name.
        expected: String,
        /// Algorithm name found in the token header.
        found: String,
    },
}

/// Compact JWS codec bound to a configured algorithm and key.
pub struct JwsCodec {
    algorithm: JwsAlgorithm,
    secret: Vec<u8>,
}

impl std::fmt::Debug for JwsCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwsCodec")
            .field("algorithm", &self.algorithm)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl JwsCodec {
    /// Creates a codec for the given algorithm and HMAC secret.
    ///
    /// The secret is ignored under [`JwsAlgorithm::None`].
    pub fn new(algorithm: JwsAlgorithm, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            secret: secret.into(),
        }
    }

    /// Creates an unsigned codec. Restricted test/interop use.
    #[must_use]
    pub const fn unsigned() -> Self {
        Self {
            algorithm: JwsAlgorithm::None,
            secret: Vec::new(),
        }
    }

    /// Returns the configured algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> JwsAlgorithm {
        self.algorithm
    }

    /// Encodes a claim set into compact JWS form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or signing fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwsError> {
        match self.jwt_algorithm() {
            Some(alg) => {
                let header = Header::new(alg);
                encode(&header, claims, &EncodingKey::from_secret(&self.secret))
                    .map_err(|e| JwsError::Signing(e.to_string()))
            }
            None => Self::encode_unsigned(claims),
        }
    }

    /// Verifies a compact JWS and decodes its claim set.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, the algorithm does not
    /// match the configured one, or the signature is invalid.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwsError> {
        match self.jwt_algorithm() {
            Some(alg) => {
                let mut validation = Validation::new(alg);
                validation.validate_aud = false;

                let data = decode::<T>(token, &DecodingKey::from_secret(&self.secret), &validation)
                    .map_err(|e| JwsError::Verification(e.to_string()))?;
                Ok(data.claims)
            }
            None => Self::decode_unsigned(token),
        }
    }

    fn jwt_algorithm(&self) -> Option<Algorithm> {
        match self.algorithm {
            JwsAlgorithm::Hs384 => Some(Algorithm::HS384),
            JwsAlgorithm::Hs512 => Some(Algorithm::HS512),
            JwsAlgorithm::None => None,
        }
    }

    fn encode_unsigned<T: Serialize>(claims: &T) -> Result<String, JwsError> {
        let header = serde_json::json!({ "alg": "none", "typ": "JWT" });
        let header = serde_json::to_vec(&header).map_err(|e| JwsError::Signing(e.to_string()))?;
        let payload = serde_json::to_vec(claims).map_err(|e| JwsError::Signing(e.to_string()))?;

        Ok(format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        ))
    }

    fn decode_unsigned<T: DeserializeOwned>(token: &str) -> Result<T, JwsError> {
        let mut parts = token.split('.');
        let (header, payload, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s)) if parts.next().is_none() => (h, p, s),
            _ => return Err(JwsError::Malformed("expected three segments".to_string())),
        };

        if !signature.is_empty() {
            return Err(JwsError::Malformed(
                "unsigned token carries a signature".to_string(),
            ));
        }

        let header = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|e| JwsError::Malformed(e.to_string()))?;
        let header: serde_json::Value =
            serde_json::from_slice(&header).map_err(|e| JwsError::Malformed(e.to_string()))?;

        let found = header.get("alg").and_then(|a| a.as_str()).unwrap_or("");
        if found != "none" {
            return Err(JwsError::AlgorithmMismatch {
                expected: "none".to_string(),
                found: found.to_string(),
            });
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| JwsError::Malformed(e.to_string()))?;
        serde_json::from_slice(&payload).map_err(|e| JwsError::Verification(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        sub: String,
        exp: i64,
    }

    fn claims() -> TestClaims {
        TestClaims {
            sub: "alice".to_string(),
            // Far enough in the future for expiry validation to pass.
            exp: 32_503_680_000,
        }
    }

    #[test]
    fn hs384_round_trip() {
        let codec = JwsCodec::new(JwsAlgorithm::Hs384, b"test-secret".to_vec());
        let token = codec.encode(&claims()).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded: TestClaims = codec.verify(&token).unwrap();
        assert_eq!(decoded, claims());
    }

    #[test]
    fn hs512_round_trip() {
        let codec = JwsCodec::new(JwsAlgorithm::Hs512, b"test-secret".to_vec());
        let token = codec.encode(&claims()).unwrap();
        let decoded: TestClaims = codec.verify(&token).unwrap();
        assert_eq!(decoded, claims());
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let codec = JwsCodec::new(JwsAlgorithm::Hs384, b"test-secret".to_vec());
        let token = codec.encode(&claims()).unwrap();

        let other = JwsCodec::new(JwsAlgorithm::Hs384, b"other-secret".to_vec());
        assert!(other.verify::<TestClaims>(&token).is_err());
    }

    #[test]
    fn unsigned_token_has_empty_signature_segment() {
        let codec = JwsCodec::unsigned();
        let token = codec.encode(&claims()).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[2].is_empty());

        let decoded: TestClaims = codec.verify(&token).unwrap();
        assert_eq!(decoded, claims());
    }

    #[test]
    fn unsigned_codec_rejects_signed_token() {
        let signed = JwsCodec::new(JwsAlgorithm::Hs384, b"test-secret".to_vec());
        let token = signed.encode(&claims()).unwrap();

        let codec = JwsCodec::unsigned();
        assert!(codec.verify::<TestClaims>(&token).is_err());
    }

    #[test]
    fn signed_codec_rejects_unsigned_token() {
        let unsigned = JwsCodec::unsigned();
        let token = unsigned.encode(&claims()).unwrap();

        let codec = JwsCodec::new(JwsAlgorithm::Hs384, b"test-secret".to_vec());
        assert!(codec.verify::<TestClaims>(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let codec = JwsCodec::unsigned();
        assert!(codec.verify::<TestClaims>("not-a-jws").is_err());
        assert!(codec.verify::<TestClaims>("a.b").is_err());
    }
}
