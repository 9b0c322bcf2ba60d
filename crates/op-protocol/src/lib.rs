//! # op-protocol
//!
//! OAuth 2.0 / `OpenID` Connect authorization-server core.
//!
//! The core is transport-agnostic: it receives already-parsed request
//! parameters together with an authenticated [`op_model::SessionContext`]
//! and returns structured decisions (consent prompts, redirect
//! descriptors, token responses, errors). HTTP handling, TLS, cookies,
//! and user authentication belong to the host.
//!
//! ## Modules
//!
//! - [`claims`] - ID-token and userinfo claim sets, token responses
//! - [`config`] - server configuration
//! - [`consent`] - anti-forgery-bound consent gate
//! - [`endpoints`] - authorization, token, and userinfo orchestration
//! - [`error`] - protocol error types following RFC 6749 / OIDC Core
//! - [`factory`] - access- and refresh-token issuance and rotation
//! - [`id_token`] - ID-token construction and signing
//! - [`request`] - request types for the logical endpoints
//! - [`store`] - grant state store with single-use consumption
//! - [`types`] - response types, grant types, prompts
//! - [`validator`] - authorization-request validation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod claims;
pub mod config;
pub mod consent;
pub mod endpoints;
pub mod error;
pub mod factory;
pub mod id_token;
pub mod request;
pub mod store;
pub mod types;
pub mod validator;

pub use claims::{IdTokenClaims, TokenResponse, UserInfoClaims};
pub use config::ProviderConfig;
pub use consent::{ConsentGate, ConsentPrompt};
pub use endpoints::{
    AuthorizationEndpoint, AuthorizeOutcome, RedirectDescriptor, TokenEndpoint, UserInfoEndpoint,
};
pub use error::{ErrorResponse, OidcError, OidcResult};
pub use factory::{IssuedAccessToken, IssuedRefreshToken, TokenFactory};
pub use id_token::IdTokenBuilder;
pub use request::{AuthorizationRequest, Decision, DecisionRequest, TokenRequest};
pub use store::{
    AccessToken, AuthCodeParams, AuthorizationCode, ConsentGrant, GrantStateStore,
    InMemoryGrantStore, PendingAuthorization, RefreshToken,
};
pub use types::{GrantType, Prompt, ResponseMode, ResponseType, ResponseTypes};
pub use validator::{ValidatedRequest, validate, validate_redirect_uri};
