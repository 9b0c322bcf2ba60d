//! Token endpoint logic.
//!
//! Authenticates the client, then redeems either an authorization code or
//! a refresh token. Codes are single-use; refresh tokens rotate on every
//! redemption, invalidating the redeemed generation and the access tokens
//! it minted.

use std::collections::HashSet;
use std::sync::Arc;

use op_model::{Client, ClientRegistry};

use crate::claims::TokenResponse;
use crate::config::ProviderConfig;
use crate::error::{OidcError, OidcResult};
use crate::factory::TokenFactory;
use crate::id_token::IdTokenBuilder;
use crate::request::TokenRequest;
use crate::store::GrantStateStore;
use crate::types::{GrantType, scopes};

/// Orchestrates grant redemption at the token endpoint.
pub struct TokenEndpoint<S> {
    registry: ClientRegistry,
    store: Arc<S>,
    factory: TokenFactory<S>,
    id_tokens: IdTokenBuilder,
}

impl<S: GrantStateStore> TokenEndpoint<S> {
    /// Creates the endpoint logic over a registry, store, and config.
    pub fn new(registry: ClientRegistry, store: Arc<S>, config: &ProviderConfig) -> Self {
        Self {
            factory: TokenFactory::new(Arc::clone(&store), config),
            id_tokens: IdTokenBuilder::new(config),
            registry,
            store,
        }
    }

    /// Handles a token request.
    ///
    /// # Errors
    ///
    /// `unsupported_grant_type`, `invalid_client`, `unauthorized_client`,
    /// `invalid_request`, `invalid_grant`, or `invalid_scope` per the
    /// failing step.
    pub async fn token(&self, request: &TokenRequest) -> OidcResult<TokenResponse> {
        let grant_type: GrantType = request
            .grant_type
            .parse()
            .map_err(|_| OidcError::UnsupportedGrantType(request.grant_type.clone()))?;

        let client = self.authenticate_client(request)?;

        if !client.allows_grant_type(&grant_type.to_string()) {
            return Err(OidcError::UnauthorizedClient(
                "grant type is not registered for this client".to_string(),
            ));
        }

        match grant_type {
            GrantType::AuthorizationCode => self.authorization_code_grant(&client, request).await,
            GrantType::RefreshToken => self.refresh_token_grant(&client, request).await,
        }
    }

    /// Resolves and authenticates the requesting client.
    fn authenticate_client(&self, request: &TokenRequest) -> OidcResult<Arc<Client>> {
        let client_id = request
            .client_id
            .as_deref()
            .ok_or_else(|| OidcError::InvalidClient("client authentication required".to_string()))?;

        let client = self
            .registry
            .get(client_id)
            .ok_or_else(|| OidcError::InvalidClient("unknown client".to_string()))?;

        if !client.verify_secret(request.client_secret.as_deref()) {
            tracing::warn!(client_id = %client_id, "client authentication failed");
            return Err(OidcError::InvalidClient(
                "client authentication failed".to_string(),
            ));
        }

        Ok(client)
    }

    async fn authorization_code_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> OidcResult<TokenResponse> {
        let code = request
            .code
            .as_deref()
            .ok_or_else(|| OidcError::InvalidRequest("code is required".to_string()))?;
        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .ok_or_else(|| OidcError::InvalidRequest("redirect_uri is required".to_string()))?;

        let stored = self.store.consume_code(code, &client.client_id).await?;

        if stored.redirect_uri != redirect_uri {
            return Err(OidcError::InvalidGrant(
                "redirect_uri does not match the authorization request".to_string(),
            ));
        }

        let refresh = self
            .factory
            .issue_refresh_token(
                &client.client_id,
                &stored.subject,
                &stored.scope,
                stored.auth_time,
                stored.nonce.as_deref(),
                None,
            )
            .await?;
        let access = self
            .factory
            .issue_access_token(
                &client.client_id,
                &stored.subject,
                &stored.scope,
                Some(refresh.lineage),
            )
            .await?;

        let id_token = if has_openid_scope(&stored.scope) {
            Some(self.id_tokens.issue(
                &client.client_id,
                &stored.subject,
                stored.auth_time,
                stored.nonce.as_deref(),
                Some(&access.value),
            )?)
        } else {
            None
        };

        tracing::debug!(
            client_id = %client.client_id,
            subject = %stored.subject,
            "authorization code redeemed"
        );

        Ok(TokenResponse {
            access_token: access.value,
            token_type: "Bearer".to_string(),
            expires_in: access.expires_in,
            refresh_token: Some(refresh.value),
            id_token,
            scope: Some(stored.scope),
        })
    }

    async fn refresh_token_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> OidcResult<TokenResponse> {
        let value = request
            .refresh_token
            .as_deref()
            .ok_or_else(|| OidcError::InvalidRequest("refresh_token is required".to_string()))?;

        let consumed = self.store.consume_refresh(value, &client.client_id).await?;

        // The refreshed scope may narrow the original grant, never widen it.
        let scope = match request.scope.as_deref() {
            Some(requested) => {
                let original: HashSet<&str> = consumed.scope.split_whitespace().collect();
                if !requested
                    .split_whitespace()
                    .all(|token| original.contains(token))
                {
                    return Err(OidcError::InvalidScope(
                        "requested scope exceeds the original grant".to_string(),
                    ));
                }
                requested.to_string()
            }
            None => consumed.scope.clone(),
        };

        let refresh = self
            .factory
            .issue_refresh_token(
                &client.client_id,
                &consumed.subject,
                &scope,
                consumed.auth_time,
                consumed.nonce.as_deref(),
                Some(&consumed),
            )
            .await?;
        let access = self
            .factory
            .issue_access_token(
                &client.client_id,
                &consumed.subject,
                &scope,
                Some(refresh.lineage),
            )
            .await?;

        // The updated ID token keeps the original authentication time;
        // refreshing is not re-authentication.
        let id_token = if has_openid_scope(&scope) {
            Some(self.id_tokens.issue(
                &client.client_id,
                &consumed.subject,
                consumed.auth_time,
                consumed.nonce.as_deref(),
                Some(&access.value),
            )?)
        } else {
            None
        };

        tracing::debug!(
            client_id = %client.client_id,
            subject = %consumed.subject,
            generation = refresh.generation,
            "refresh token rotated"
        );

        Ok(TokenResponse {
            access_token: access.value,
            token_type: "Bearer".to_string(),
            expires_in: access.expires_in,
            refresh_token: Some(refresh.value),
            id_token,
            scope: Some(scope),
        })
    }
}

fn has_openid_scope(scope: &str) -> bool {
    scope.split_whitespace().any(|token| token == scopes::OPENID)
}
