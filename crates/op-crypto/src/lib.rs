//! # op-crypto
//!
//! Cryptographic primitives for the authorization-server core.
//!
//! ## Modules
//!
//! - [`algorithm`] - JWS signing algorithms and digest selection
//! - [`hash`] - SHA-384 / SHA-512 digests
//! - [`jws`] - compact JWS encoding and verification
//! - [`random`] - secure random values for codes and tokens

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod hash;
pub mod jws;
pub mod random;

pub use algorithm::{AlgorithmError, HashAlgorithm, JwsAlgorithm};
pub use hash::{hash, sha384, sha512};
pub use jws::{JwsCodec, JwsError};
