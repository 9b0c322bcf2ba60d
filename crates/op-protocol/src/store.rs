//! Grant state store.
//!
//! Holds the server-side state of in-flight exchanges: pending consent
//! authorizations, authorization codes, refresh tokens, access tokens, and
//! remembered consent grants. Values handed to clients are secrets in
//! transit, so entries are keyed by a SHA-384 hash of the wire value
//! rather than the value itself.
//!
//! Single-use consumption is an atomic compare-and-invalidate: concurrent
//! redemption attempts on the same value race to exactly one success, and
//! every loser observes `invalid_grant`. Expired entries read as absent no
//! matter what their flags say.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{OidcError, OidcResult};
use crate::request::AuthorizationRequest;

/// Hashes a wire value for storage lookup.
#[must_use]
pub fn hash_value(value: &str) -> String {
    URL_SAFE_NO_PAD.encode(op_crypto::sha384(value.as_bytes()))
}

/// Parameters for creating a stored authorization code.
pub struct AuthCodeParams {
    /// The raw code value handed to the client.
    pub code: String,
    /// Client the code was issued to.
    pub client_id: String,
    /// Authenticated subject.
    pub subject: String,
    /// Redirect URI recorded at issuance; re-checked at redemption.
    pub redirect_uri: String,
    /// Granted scope.
    pub scope: String,
    /// Nonce from the authorization request.
    pub nonce: Option<String>,
    /// Authentication time of the session that granted the code.
    pub auth_time: DateTime<Utc>,
    /// Lifetime in seconds.
    pub ttl_seconds: i64,
}

/// A stored authorization code. Single-use.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    /// Hash of the code value (storage key).
    pub code_hash: String,
    /// Client the code was issued to.
    pub client_id: String,
    /// Authenticated subject.
    pub subject: String,
    /// Redirect URI recorded at issuance.
    pub redirect_uri: String,
    /// Granted scope.
    pub scope: String,
    /// Nonce carried over to the ID token minted at redemption.
    pub nonce: Option<String>,
    /// Authentication time carried over to the ID token.
    pub auth_time: DateTime<Utc>,
    /// When the code was created.
    pub created_at: DateTime<Utc>,
    /// When the code expires.
    pub expires_at: DateTime<Utc>,
    /// Whether the code has been redeemed.
    pub consumed: bool,
}

impl AuthorizationCode {
    /// Creates a stored code from issuance parameters.
    #[must_use]
    pub fn new(params: AuthCodeParams) -> Self {
        let now = Utc::now();
        Self {
            code_hash: hash_value(&params.code),
            client_id: params.client_id,
            subject: params.subject,
            redirect_uri: params.redirect_uri,
            scope: params.scope,
            nonce: params.nonce,
            auth_time: params.auth_time,
            created_at: now,
            expires_at: now + Duration::seconds(params.ttl_seconds),
            consumed: false,
        }
    }

    /// Checks if the code has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// A stored refresh token.
///
/// Tokens of one lineage form a rotation chain; exactly one generation is
/// live at a time.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Hash of the token value (storage key).
    pub token_hash: String,
    /// Client the token was issued to.
    pub client_id: String,
    /// Authenticated subject.
    pub subject: String,
    /// Granted scope.
    pub scope: String,
    /// Rotation lineage this token belongs to.
    pub lineage: Uuid,
    /// Rotation generation, strictly increasing per lineage.
    pub generation: u32,
    /// Authentication time of the original grant, preserved across
    /// rotations.
    pub auth_time: DateTime<Utc>,
    /// Nonce of the original authorization request.
    pub nonce: Option<String>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// Whether the token has been redeemed.
    pub consumed: bool,
}

impl RefreshToken {
    /// Checks if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// A stored access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Hash of the token value (storage key).
    pub token_hash: String,
    /// Client the token was issued to.
    pub client_id: String,
    /// Authenticated subject.
    pub subject: String,
    /// Granted scope.
    pub scope: String,
    /// Refresh lineage that minted this token, when one exists. Rotation
    /// revokes the lineage's earlier access tokens.
    pub lineage: Option<Uuid>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// Whether the token has been revoked (superseded by rotation).
    pub revoked: bool,
}

impl AccessToken {
    /// Checks if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// A pending authorization awaiting the user's consent decision.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    /// Hash of the anti-forgery token (storage key).
    pub token_hash: String,
    /// The validated authorization request.
    pub request: AuthorizationRequest,
    /// Authenticated subject the prompt was shown to.
    pub subject: String,
    /// Authentication time of the subject's session.
    pub auth_time: DateTime<Utc>,
    /// When the pending entry expires.
    pub expires_at: DateTime<Utc>,
}

impl PendingAuthorization {
    /// Creates a pending authorization bound to an anti-forgery token.
    #[must_use]
    pub fn new(
        authenticity_token: &str,
        request: AuthorizationRequest,
        subject: impl Into<String>,
        auth_time: DateTime<Utc>,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            token_hash: hash_value(authenticity_token),
            request,
            subject: subject.into(),
            auth_time,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
        }
    }

    /// Checks if the pending entry has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// A remembered consent decision for a client/subject pair.
#[derive(Debug, Clone)]
pub struct ConsentGrant {
    /// Client the consent applies to.
    pub client_id: String,
    /// Subject who granted it.
    pub subject: String,
    /// Scopes covered by the grant.
    pub scopes: HashSet<String>,
    /// When the consent was recorded.
    pub granted_at: DateTime<Utc>,
}

/// Store contract for in-flight grant state.
///
/// `consume_*` and `take_*` must be linearizable compare-and-invalidate
/// operations, never read-then-write.
#[async_trait]
pub trait GrantStateStore: Send + Sync {
    /// Stores an authorization code.
    async fn put_code(&self, code: AuthorizationCode) -> OidcResult<()>;

    /// Atomically consumes an authorization code.
    ///
    /// Exactly one concurrent caller succeeds for a given value; all
    /// others, and any later attempt, fail with `invalid_grant`.
    async fn consume_code(&self, value: &str, client_id: &str) -> OidcResult<AuthorizationCode>;

    /// Stores a refresh token.
    async fn put_refresh(&self, token: RefreshToken) -> OidcResult<()>;

    /// Atomically consumes a refresh token. Same semantics as
    /// [`Self::consume_code`].
    async fn consume_refresh(&self, value: &str, client_id: &str) -> OidcResult<RefreshToken>;

    /// Stores an access token.
    async fn put_access(&self, token: AccessToken) -> OidcResult<()>;

    /// Looks up an access token by its wire value.
    async fn get_access(&self, value: &str) -> OidcResult<Option<AccessToken>>;

    /// Revokes every access token of a refresh lineage. Returns the number
    /// of tokens revoked.
    async fn revoke_access_lineage(&self, lineage: Uuid) -> OidcResult<u64>;

    /// Stores a pending authorization under its anti-forgery token.
    async fn put_pending(&self, pending: PendingAuthorization) -> OidcResult<()>;

    /// Atomically removes and returns a pending authorization. Absent or
    /// expired entries return `None`.
    async fn take_pending(
        &self,
        authenticity_token: &str,
    ) -> OidcResult<Option<PendingAuthorization>>;

    /// Records a consent decision for a client/subject pair, merging with
    /// any earlier grant.
    async fn record_consent(&self, grant: ConsentGrant) -> OidcResult<()>;

    /// Checks whether a remembered consent covers every token of `scope`.
    async fn has_consent(&self, client_id: &str, subject: &str, scope: &str) -> OidcResult<bool>;

    /// Drops expired codes, tokens, and pending entries. Returns the
    /// number of entries removed.
    async fn purge_expired(&self) -> OidcResult<u64>;
}

/// In-memory grant state store.
///
/// Suitable for a single instance and for tests. Consumption takes the
/// write lock for the whole check-and-mark step, which makes single-use
/// redemption linearizable.
#[derive(Default)]
pub struct InMemoryGrantStore {
    codes: RwLock<HashMap<String, AuthorizationCode>>,
    refresh_tokens: RwLock<HashMap<String, RefreshToken>>,
    access_tokens: RwLock<HashMap<String, AccessToken>>,
    pending: RwLock<HashMap<String, PendingAuthorization>>,
    consents: RwLock<HashMap<(String, String), ConsentGrant>>,
}

impl InMemoryGrantStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrantStateStore for InMemoryGrantStore {
    async fn put_code(&self, code: AuthorizationCode) -> OidcResult<()> {
        self.codes
            .write()
            .await
            .insert(code.code_hash.clone(), code);
        Ok(())
    }

    async fn consume_code(&self, value: &str, client_id: &str) -> OidcResult<AuthorizationCode> {
        let hash = hash_value(value);
        let mut codes = self.codes.write().await;

        let entry = codes
            .get_mut(&hash)
            .ok_or_else(|| OidcError::InvalidGrant("invalid authorization code".to_string()))?;

        if entry.is_expired() {
            codes.remove(&hash);
            return Err(OidcError::InvalidGrant(
                "invalid authorization code".to_string(),
            ));
        }
        if entry.consumed {
            return Err(OidcError::InvalidGrant(
                "authorization code has already been used".to_string(),
            ));
        }
        if entry.client_id != client_id {
            return Err(OidcError::InvalidGrant(
                "authorization code was not issued to this client".to_string(),
            ));
        }

        entry.consumed = true;
        Ok(entry.clone())
    }

    async fn put_refresh(&self, token: RefreshToken) -> OidcResult<()> {
        self.refresh_tokens
            .write()
            .await
            .insert(token.token_hash.clone(), token);
        Ok(())
    }

    async fn consume_refresh(&self, value: &str, client_id: &str) -> OidcResult<RefreshToken> {
        let hash = hash_value(value);
        let mut tokens = self.refresh_tokens.write().await;

        let entry = tokens
            .get_mut(&hash)
            .ok_or_else(|| OidcError::InvalidGrant("invalid refresh token".to_string()))?;

        if entry.is_expired() {
            tokens.remove(&hash);
            return Err(OidcError::InvalidGrant("invalid refresh token".to_string()));
        }
        if entry.consumed {
            return Err(OidcError::InvalidGrant(
                "refresh token has already been used".to_string(),
            ));
        }
        if entry.client_id != client_id {
            return Err(OidcError::InvalidGrant(
                "refresh token was not issued to this client".to_string(),
            ));
        }

        entry.consumed = true;
        Ok(entry.clone())
    }

    async fn put_access(&self, token: AccessToken) -> OidcResult<()> {
        self.access_tokens
            .write()
            .await
            .insert(token.token_hash.clone(), token);
        Ok(())
    }

    async fn get_access(&self, value: &str) -> OidcResult<Option<AccessToken>> {
        let hash = hash_value(value);
        Ok(self.access_tokens.read().await.get(&hash).cloned())
    }

    async fn revoke_access_lineage(&self, lineage: Uuid) -> OidcResult<u64> {
        let mut tokens = self.access_tokens.write().await;
        let mut revoked = 0;
        for token in tokens.values_mut() {
            if token.lineage == Some(lineage) && !token.revoked {
                token.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn put_pending(&self, pending: PendingAuthorization) -> OidcResult<()> {
        self.pending
            .write()
            .await
            .insert(pending.token_hash.clone(), pending);
        Ok(())
    }

    async fn take_pending(
        &self,
        authenticity_token: &str,
    ) -> OidcResult<Option<PendingAuthorization>> {
        let hash = hash_value(authenticity_token);
        let entry = self.pending.write().await.remove(&hash);
        Ok(entry.filter(|p| !p.is_expired()))
    }

    async fn record_consent(&self, grant: ConsentGrant) -> OidcResult<()> {
        let key = (grant.client_id.clone(), grant.subject.clone());
        let mut consents = self.consents.write().await;
        match consents.get_mut(&key) {
            Some(existing) => {
                existing.scopes.extend(grant.scopes);
                existing.granted_at = grant.granted_at;
            }
            None => {
                consents.insert(key, grant);
            }
        }
        Ok(())
    }

    async fn has_consent(&self, client_id: &str, subject: &str, scope: &str) -> OidcResult<bool> {
        let consents = self.consents.read().await;
        let Some(grant) = consents.get(&(client_id.to_string(), subject.to_string())) else {
            return Ok(false);
        };
        Ok(scope
            .split_whitespace()
            .all(|token| grant.scopes.contains(token)))
    }

    async fn purge_expired(&self) -> OidcResult<u64> {
        let now = Utc::now();
        let mut removed = 0u64;

        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, c| c.expires_at > now);
        removed += (before - codes.len()) as u64;
        drop(codes);

        let mut refresh = self.refresh_tokens.write().await;
        let before = refresh.len();
        refresh.retain(|_, t| t.expires_at > now);
        removed += (before - refresh.len()) as u64;
        drop(refresh);

        let mut access = self.access_tokens.write().await;
        let before = access.len();
        access.retain(|_, t| t.expires_at > now);
        removed += (before - access.len()) as u64;
        drop(access);

        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|_, p| p.expires_at > now);
        removed += (before - pending.len()) as u64;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_code(code: &str, ttl_seconds: i64) -> AuthorizationCode {
        AuthorizationCode::new(AuthCodeParams {
            code: code.to_string(),
            client_id: "consumer-id".to_string(),
            subject: "alice".to_string(),
            redirect_uri: "http://www.blah.apache.org".to_string(),
            scope: "openid".to_string(),
            nonce: None,
            auth_time: Utc::now(),
            ttl_seconds,
        })
    }

    fn test_refresh(value: &str, generation: u32) -> RefreshToken {
        RefreshToken {
            token_hash: hash_value(value),
            client_id: "consumer-id".to_string(),
            subject: "alice".to_string(),
            scope: "openid".to_string(),
            lineage: Uuid::now_v7(),
            generation,
            auth_time: Utc::now(),
            nonce: None,
            expires_at: Utc::now() + Duration::seconds(600),
            consumed: false,
        }
    }

    #[tokio::test]
    async fn code_round_trip_and_single_use() {
        let store = InMemoryGrantStore::new();
        store.put_code(test_code("first-code", 600)).await.unwrap();

        let consumed = store.consume_code("first-code", "consumer-id").await.unwrap();
        assert_eq!(consumed.subject, "alice");

        let again = store.consume_code("first-code", "consumer-id").await;
        assert!(matches!(again, Err(OidcError::InvalidGrant(_))));
    }

    #[tokio::test]
    async fn expired_code_reads_as_absent() {
        let store = InMemoryGrantStore::new();
        store.put_code(test_code("stale-code", -1)).await.unwrap();

        let result = store.consume_code("stale-code", "consumer-id").await;
        assert!(matches!(result, Err(OidcError::InvalidGrant(_))));
    }

    #[tokio::test]
    async fn code_is_bound_to_issuing_client() {
        let store = InMemoryGrantStore::new();
        store.put_code(test_code("bound-code", 600)).await.unwrap();

        let result = store.consume_code("bound-code", "other-client").await;
        assert!(matches!(result, Err(OidcError::InvalidGrant(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_code_redemption_has_one_winner() {
        let store = Arc::new(InMemoryGrantStore::new());
        store.put_code(test_code("racy-code", 600)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.consume_code("racy-code", "consumer-id").await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn refresh_token_single_use() {
        let store = InMemoryGrantStore::new();
        store.put_refresh(test_refresh("refresh-0", 0)).await.unwrap();

        let consumed = store
            .consume_refresh("refresh-0", "consumer-id")
            .await
            .unwrap();
        assert_eq!(consumed.generation, 0);

        let again = store.consume_refresh("refresh-0", "consumer-id").await;
        assert!(matches!(again, Err(OidcError::InvalidGrant(_))));
    }

    #[tokio::test]
    async fn lineage_revocation_marks_all_access_tokens() {
        let store = InMemoryGrantStore::new();
        let lineage = Uuid::now_v7();

        store
            .put_access(AccessToken {
                token_hash: hash_value("at-one"),
                client_id: "consumer-id".to_string(),
                subject: "alice".to_string(),
                scope: "openid".to_string(),
                lineage: Some(lineage),
                expires_at: Utc::now() + Duration::seconds(600),
                revoked: false,
            })
            .await
            .unwrap();
        store
            .put_access(AccessToken {
                token_hash: hash_value("at-other"),
                client_id: "consumer-id".to_string(),
                subject: "alice".to_string(),
                scope: "openid".to_string(),
                lineage: None,
                expires_at: Utc::now() + Duration::seconds(600),
                revoked: false,
            })
            .await
            .unwrap();

        assert_eq!(store.revoke_access_lineage(lineage).await.unwrap(), 1);
        assert!(store.get_access("at-one").await.unwrap().unwrap().revoked);
        assert!(!store.get_access("at-other").await.unwrap().unwrap().revoked);
    }

    #[tokio::test]
    async fn pending_authorization_is_single_use() {
        let store = InMemoryGrantStore::new();
        let request = AuthorizationRequest {
            client_id: "consumer-id".to_string(),
            redirect_uri: Some("http://www.blah.apache.org".to_string()),
            scope: Some("openid".to_string()),
            response_type: "code".to_string(),
            state: None,
            nonce: None,
            prompt: None,
            max_age: None,
        };

        store
            .put_pending(PendingAuthorization::new(
                "csrf-token",
                request,
                "alice",
                Utc::now(),
                600,
            ))
            .await
            .unwrap();

        assert!(store.take_pending("csrf-token").await.unwrap().is_some());
        assert!(store.take_pending("csrf-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn consent_is_remembered_and_merged() {
        let store = InMemoryGrantStore::new();

        store
            .record_consent(ConsentGrant {
                client_id: "consumer-id".to_string(),
                subject: "alice".to_string(),
                scopes: HashSet::from(["openid".to_string()]),
                granted_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(store.has_consent("consumer-id", "alice", "openid").await.unwrap());
        assert!(!store.has_consent("consumer-id", "alice", "openid profile").await.unwrap());
        assert!(!store.has_consent("consumer-id", "bob", "openid").await.unwrap());

        store
            .record_consent(ConsentGrant {
                client_id: "consumer-id".to_string(),
                subject: "alice".to_string(),
                scopes: HashSet::from(["profile".to_string()]),
                granted_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(store.has_consent("consumer-id", "alice", "openid profile").await.unwrap());
    }

    #[tokio::test]
    async fn purge_removes_only_expired_entries() {
        let store = InMemoryGrantStore::new();
        store.put_code(test_code("fresh", 600)).await.unwrap();
        store.put_code(test_code("stale", -1)).await.unwrap();
        store.put_refresh(test_refresh("live", 0)).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store.consume_code("fresh", "consumer-id").await.is_ok());
    }
}
