//! JWS algorithm definitions.
//!
//! The server signs ID tokens with an HMAC algorithm selected by
//! configuration. An explicit unsigned mode (`alg=none`) exists for
//! restricted test and interop configurations; it is never the default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for algorithm selection.
#[derive(Debug, Error)]
pub enum AlgorithmError {
    /// Unknown or unsupported JWA algorithm name.
    #[error("unknown algorithm: {0}")]
    Unknown(String),
}

/// Hash algorithms used for `at_hash` computation and stored-value hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-384.
    #[serde(rename = "SHA384")]
    Sha384,

    /// SHA-512.
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// Returns the digest length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// JWS signing algorithms accepted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JwsAlgorithm {
    /// HMAC with SHA-384.
    #[serde(rename = "HS384")]
    #[default]
    Hs384,

    /// HMAC with SHA-512.
    #[serde(rename = "HS512")]
    Hs512,

    /// Unsigned (plaintext) JWS. Restricted configurations only.
    #[serde(rename = "none")]
    None,
}

impl JwsAlgorithm {
    /// Returns the JWA algorithm name.
    #[must_use]
    pub const fn jwa_name(self) -> &'static str {
        match self {
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
            Self::None => "none",
        }
    }

    /// Returns whether tokens produced under this algorithm carry a signature.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the digest paired with this algorithm.
    ///
    /// The unsigned mode keeps the SHA-384 pairing so derived claims such
    /// as `at_hash` have the same shape across configurations.
    #[must_use]
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            Self::Hs384 | Self::None => HashAlgorithm::Sha384,
            Self::Hs512 => HashAlgorithm::Sha512,
        }
    }

    /// Parses a JWA algorithm name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not one of the accepted algorithms.
    pub fn from_jwa(name: &str) -> Result<Self, AlgorithmError> {
        match name {
            "HS384" => Ok(Self::Hs384),
            "HS512" => Ok(Self::Hs512),
            "none" => Ok(Self::None),
            _ => Err(AlgorithmError::Unknown(name.to_string())),
        }
    }
}
