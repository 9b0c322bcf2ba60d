//! Request types for the logical endpoints.
//!
//! These carry already-parsed parameters; the transport layer is expected
//! to have done query/form decoding before calling into the core.

use serde::{Deserialize, Serialize};

use crate::types::scopes;

/// Authorization endpoint request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Client ID (required).
    pub client_id: String,

    /// Redirect URI. Must match a registered URI exactly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Requested scope (space-delimited).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Response type combination (required, space-delimited).
    pub response_type: String,

    /// State parameter, echoed verbatim in responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Nonce. Mandatory for implicit OIDC flows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Prompt values (space-delimited).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Maximum acceptable authentication age in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
}

impl AuthorizationRequest {
    /// Returns the requested scope tokens.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_ref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Checks whether the `openid` scope is requested.
    #[must_use]
    pub fn is_oidc_request(&self) -> bool {
        self.scopes().contains(&scopes::OPENID)
    }
}

/// The user's consent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The user approved the request.
    Allow,
    /// The user rejected the request.
    Deny,
}

/// Consent decision callback.
///
/// Submitted by the caller after rendering the consent prompt. The fields
/// echo the pending authorization and are verified against it; the
/// authenticity token binds the callback to the session that saw the
/// prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Anti-forgery token from the consent prompt.
    pub authenticity_token: String,

    /// Client ID of the pending authorization.
    pub client_id: String,

    /// Redirect URI of the pending authorization.
    pub redirect_uri: String,

    /// Scope of the pending authorization.
    pub scope: String,

    /// Response type of the pending authorization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,

    /// Nonce of the pending authorization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// The decision itself.
    pub decision: Decision,
}

/// Token endpoint request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Grant type (required).
    pub grant_type: String,

    /// Authorization code (for the `authorization_code` grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Redirect URI (for the `authorization_code` grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Refresh token (for the `refresh_token` grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Requested scope. On refresh, must not widen the original grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Client ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Client secret (confidential clients).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}
