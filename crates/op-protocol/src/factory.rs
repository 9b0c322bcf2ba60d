//! Access- and refresh-token issuance.
//!
//! Tokens are opaque random values resolved through the store. Refresh
//! tokens rotate: redeeming generation N mints generation N+1 on the same
//! lineage and revokes the lineage's earlier access tokens, so a
//! rotated-away access token stops working at the userinfo endpoint.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::error::OidcResult;
use crate::store::{AccessToken, GrantStateStore, RefreshToken, hash_value};

/// A freshly minted access token.
#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    /// The opaque token value handed to the client.
    pub value: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// A freshly minted refresh token.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    /// The opaque token value handed to the client.
    pub value: String,
    /// Rotation lineage the token belongs to.
    pub lineage: Uuid,
    /// Rotation generation.
    pub generation: u32,
}

/// Mints and rotates tokens against the grant state store.
pub struct TokenFactory<S> {
    store: Arc<S>,
    access_token_lifetime: i64,
    refresh_token_lifetime: i64,
}

impl<S: GrantStateStore> TokenFactory<S> {
    /// Creates a factory over the given store and configuration.
    pub fn new(store: Arc<S>, config: &ProviderConfig) -> Self {
        Self {
            store,
            access_token_lifetime: config.access_token_lifetime,
            refresh_token_lifetime: config.refresh_token_lifetime,
        }
    }

    /// Mints and stores an access token.
    ///
    /// `lineage` links the token to the refresh lineage that produced it,
    /// so a later rotation can revoke it.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn issue_access_token(
        &self,
        client_id: &str,
        subject: &str,
        scope: &str,
        lineage: Option<Uuid>,
    ) -> OidcResult<IssuedAccessToken> {
        let value = op_crypto::random::generate_token_value();

        self.store
            .put_access(AccessToken {
                token_hash: hash_value(&value),
                client_id: client_id.to_string(),
                subject: subject.to_string(),
                scope: scope.to_string(),
                lineage,
                expires_at: Utc::now() + Duration::seconds(self.access_token_lifetime),
                revoked: false,
            })
            .await?;

        Ok(IssuedAccessToken {
            value,
            expires_in: self.access_token_lifetime,
        })
    }

    /// Mints and stores a refresh token.
    ///
    /// With `prior` set this is a rotation: the new token takes the same
    /// lineage at `prior.generation + 1`, and the lineage's outstanding
    /// access tokens are revoked. Without it a new lineage starts at
    /// generation 0.
    ///
    /// The caller must have consumed `prior` through the store already;
    /// the factory never re-validates it.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn issue_refresh_token(
        &self,
        client_id: &str,
        subject: &str,
        scope: &str,
        auth_time: DateTime<Utc>,
        nonce: Option<&str>,
        prior: Option<&RefreshToken>,
    ) -> OidcResult<IssuedRefreshToken> {
        let (lineage, generation) = match prior {
            Some(prior) => {
                self.store.revoke_access_lineage(prior.lineage).await?;
                (prior.lineage, prior.generation + 1)
            }
            None => (Uuid::now_v7(), 0),
        };

        let value = op_crypto::random::generate_token_value();

        self.store
            .put_refresh(RefreshToken {
                token_hash: hash_value(&value),
                client_id: client_id.to_string(),
                subject: subject.to_string(),
                scope: scope.to_string(),
                lineage,
                generation,
                auth_time,
                nonce: nonce.map(ToString::to_string),
                expires_at: Utc::now() + Duration::seconds(self.refresh_token_lifetime),
                consumed: false,
            })
            .await?;

        Ok(IssuedRefreshToken {
            value,
            lineage,
            generation,
        })
    }
}
