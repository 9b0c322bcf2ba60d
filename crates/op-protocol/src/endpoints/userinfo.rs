//! Userinfo endpoint logic.
//!
//! Validates a bearer access token by store lookup and returns the claims
//! tied to it. No issuance side effects.

use std::sync::Arc;

use crate::claims::UserInfoClaims;
use crate::error::{OidcError, OidcResult};
use crate::store::GrantStateStore;

/// Resolves bearer tokens into userinfo claims.
pub struct UserInfoEndpoint<S> {
    store: Arc<S>,
}

impl<S: GrantStateStore> UserInfoEndpoint<S> {
    /// Creates the endpoint logic over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the claims for a bearer access token.
    ///
    /// # Errors
    ///
    /// `invalid_token` (401 mapping) when the token is absent, expired, or
    /// superseded by rotation.
    pub async fn claims(&self, bearer_token: &str) -> OidcResult<UserInfoClaims> {
        if bearer_token.is_empty() {
            return Err(OidcError::InvalidToken("empty token".to_string()));
        }

        let token = self
            .store
            .get_access(bearer_token)
            .await?
            .ok_or_else(|| OidcError::InvalidToken("unknown access token".to_string()))?;

        if token.is_expired() {
            return Err(OidcError::InvalidToken(
                "access token has expired".to_string(),
            ));
        }
        if token.revoked {
            return Err(OidcError::InvalidToken(
                "access token has been superseded".to_string(),
            ));
        }

        Ok(UserInfoClaims {
            sub: token.subject,
            aud: token.client_id,
            scope: Some(token.scope),
        })
    }
}
