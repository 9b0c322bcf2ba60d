//! Protocol error types.
//!
//! Implements OAuth 2.0 and `OpenID` Connect error responses as defined in
//! RFC 6749 and `OpenID` Connect Core 1.0.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol errors produced by the authorization-server core.
#[derive(Debug, Error)]
pub enum OidcError {
    /// Invalid request parameters.
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// Client authentication failed.
    #[error("invalid_client: {0}")]
    InvalidClient(String),

    /// Invalid, expired, or already-consumed authorization grant.
    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    /// Client is not authorized for this response type or grant type.
    #[error("unauthorized_client: {0}")]
    UnauthorizedClient(String),

    /// Unsupported grant type.
    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantType(String),

    /// Unsupported response type.
    #[error("unsupported_response_type: {0}")]
    UnsupportedResponseType(String),

    /// Invalid or widened scope.
    #[error("invalid_scope: {0}")]
    InvalidScope(String),

    /// Access denied by the resource owner or by policy.
    #[error("access_denied: {0}")]
    AccessDenied(String),

    /// Bad, expired, or superseded bearer token.
    #[error("invalid_token: {0}")]
    InvalidToken(String),

    /// Re-authentication is required.
    #[error("login_required")]
    LoginRequired,

    /// User interaction is required but the request forbids it.
    #[error("interaction_required")]
    InteractionRequired,

    /// Unexpected internal fault.
    #[error("server_error: {0}")]
    ServerError(String),
}

impl OidcError {
    /// Returns the OAuth 2.0 error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnauthorizedClient(_) => "unauthorized_client",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::UnsupportedResponseType(_) => "unsupported_response_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::AccessDenied(_) => "access_denied",
            Self::InvalidToken(_) => "invalid_token",
            Self::LoginRequired => "login_required",
            Self::InteractionRequired => "interaction_required",
            Self::ServerError(_) => "server_error",
        }
    }

    /// Returns the conventional HTTP status for this error at the boundary.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidGrant(_)
            | Self::InvalidScope(_)
            | Self::UnsupportedGrantType(_)
            | Self::UnsupportedResponseType(_)
            | Self::LoginRequired
            | Self::InteractionRequired => 400,
            Self::InvalidClient(_) | Self::InvalidToken(_) => 401,
            Self::AccessDenied(_) | Self::UnauthorizedClient(_) => 403,
            Self::ServerError(_) => 500,
        }
    }

    /// Creates a serializable error response body.
    #[must_use]
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_code().to_string(),
            error_description: Some(self.to_string()),
            error_uri: None,
        }
    }
}

/// OAuth 2.0 error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// URI with more information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

/// Result type for protocol operations.
pub type OidcResult<T> = Result<T, OidcError>;
