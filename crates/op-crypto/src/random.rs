//! Cryptographically secure random value generation.
//!
//! Covers the opaque secrets this server hands out: authorization codes,
//! access and refresh token values, and the authenticity token bound to a
//! pending consent.

use rand::Rng;
use rand::distr::{Alphanumeric, SampleString};

/// Generates a cryptographically secure random byte array.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates a cryptographically secure alphanumeric string.
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    Alphanumeric.sample_string(&mut rng, len)
}

/// Generates an authorization-code value.
///
/// 32 alphanumeric characters carry about 190 bits of entropy, above the
/// 128-bit minimum RFC 6749 recommends for guessing resistance.
#[must_use]
pub fn generate_code() -> String {
    random_alphanumeric(32)
}

/// Generates an opaque access- or refresh-token value.
#[must_use]
pub fn generate_token_value() -> String {
    random_alphanumeric(32)
}

/// Generates the authenticity token bound to a pending consent step.
#[must_use]
pub fn generate_authenticity_token() -> String {
    random_alphanumeric(32)
}
