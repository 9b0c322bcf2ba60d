//! Common protocol types.
//!
//! Implements the shared vocabulary of OAuth 2.0 and `OpenID` Connect:
//! response types and their flow classification, grant types, prompt
//! values, and the redirect response mode.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// OAuth 2.0 grant types supported at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantType {
    /// Authorization code grant (RFC 6749 Section 4.1).
    #[serde(rename = "authorization_code")]
    AuthorizationCode,

    /// Refresh token grant (RFC 6749 Section 6).
    #[serde(rename = "refresh_token")]
    RefreshToken,
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        };
        write!(f, "{s}")
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "refresh_token" => Ok(Self::RefreshToken),
            _ => Err(format!("unknown grant type: {s}")),
        }
    }
}

/// Individual OAuth 2.0 / OIDC response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseType {
    /// Authorization code response.
    #[serde(rename = "code")]
    Code,

    /// Implicit grant access token.
    #[serde(rename = "token")]
    Token,

    /// `OpenID` Connect ID token.
    #[serde(rename = "id_token")]
    IdToken,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Code => "code",
            Self::Token => "token",
            Self::IdToken => "id_token",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "token" => Ok(Self::Token),
            "id_token" => Ok(Self::IdToken),
            _ => Err(format!("unknown response type: {s}")),
        }
    }
}

/// A requested combination of response types (space-delimited on the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTypes(
    /// The requested response types.
    pub HashSet<ResponseType>,
);

impl ResponseTypes {
    /// Checks whether the combination contains a given response type.
    #[must_use]
    pub fn contains(&self, rt: ResponseType) -> bool {
        self.0.contains(&rt)
    }

    /// Checks if this is the plain authorization-code flow.
    #[must_use]
    pub fn is_code_flow(&self) -> bool {
        self.0.contains(&ResponseType::Code) && self.0.len() == 1
    }

    /// Checks if this is an implicit flow (tokens, no code).
    #[must_use]
    pub fn is_implicit_flow(&self) -> bool {
        !self.0.contains(&ResponseType::Code)
            && (self.0.contains(&ResponseType::Token) || self.0.contains(&ResponseType::IdToken))
    }

    /// Checks if this is a hybrid flow (code plus front-channel tokens).
    #[must_use]
    pub fn is_hybrid_flow(&self) -> bool {
        self.0.contains(&ResponseType::Code)
            && (self.0.contains(&ResponseType::Token) || self.0.contains(&ResponseType::IdToken))
    }

    /// Whether an ID token is delivered on the front channel, making the
    /// response fragment material.
    #[must_use]
    pub fn is_front_channel(&self) -> bool {
        self.0.contains(&ResponseType::Token) || self.0.contains(&ResponseType::IdToken)
    }
}

impl FromStr for ResponseTypes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut types = HashSet::new();
        for part in s.split_whitespace() {
            types.insert(ResponseType::from_str(part)?);
        }
        if types.is_empty() {
            return Err("empty response_type".to_string());
        }
        Ok(Self(types))
    }
}

/// OIDC prompt values.
///
/// Parsing is strict: an unrecognized prompt token is a request error, not
/// something to drop silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    /// No UI may be displayed.
    None,

    /// Force re-authentication.
    Login,

    /// Force the consent screen.
    Consent,

    /// Force account selection.
    SelectAccount,
}

impl FromStr for Prompt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "login" => Ok(Self::Login),
            "consent" => Ok(Self::Consent),
            "select_account" => Ok(Self::SelectAccount),
            _ => Err(format!("unknown prompt value: {s}")),
        }
    }
}

/// How redirect parameters are delivered to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Query-string parameters (code flow).
    #[default]
    Query,

    /// Fragment parameters (implicit and hybrid flows). The fragment is
    /// not sent to servers on follow-up navigation, which keeps tokens out
    /// of passive logs.
    Fragment,
}

/// Standard OIDC scopes.
pub mod scopes {
    /// `OpenID` Connect scope. Gates ID-token issuance.
    pub const OPENID: &str = "openid";
}
