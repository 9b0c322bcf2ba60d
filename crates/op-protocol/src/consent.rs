//! Consent gate.
//!
//! When interactive consent is required, the gate parks the validated
//! authorization request in the store, bound to the session's anti-forgery
//! token, and hands the caller a prompt to render. The decision callback
//! redeems the pending entry exactly once. A mismatched, foreign, or
//! expired token fails closed, never open.

use std::sync::Arc;

use op_model::SessionContext;

use crate::error::{OidcError, OidcResult};
use crate::request::AuthorizationRequest;
use crate::store::{GrantStateStore, PendingAuthorization};

/// Data the caller needs to render the consent prompt.
///
/// Echoes the pending request so the decision form can post it back.
#[derive(Debug, Clone)]
pub struct ConsentPrompt {
    /// Anti-forgery token the decision callback must return.
    pub authenticity_token: String,
    /// Client requesting authorization.
    pub client_id: String,
    /// Redirect URI of the pending request.
    pub redirect_uri: String,
    /// Proposed scope.
    pub scope: String,
    /// Response type of the pending request.
    pub response_type: String,
    /// State of the pending request.
    pub state: Option<String>,
    /// Nonce of the pending request.
    pub nonce: Option<String>,
}

/// Issues and redeems pending consent authorizations.
pub struct ConsentGate<S> {
    store: Arc<S>,
    lifetime_seconds: i64,
}

impl<S: GrantStateStore> ConsentGate<S> {
    /// Creates a gate over the given store with the given pending-entry
    /// lifetime.
    pub fn new(store: Arc<S>, lifetime_seconds: i64) -> Self {
        Self {
            store,
            lifetime_seconds,
        }
    }

    /// Parks a validated request and returns the prompt to render.
    ///
    /// The pending entry is bound to the session's anti-forgery token, so
    /// only the session that saw the prompt can answer it.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn issue(
        &self,
        request: &AuthorizationRequest,
        session: &SessionContext,
    ) -> OidcResult<ConsentPrompt> {
        let pending = PendingAuthorization::new(
            &session.authenticity_token,
            request.clone(),
            &session.subject,
            session.auth_time,
            self.lifetime_seconds,
        );
        self.store.put_pending(pending).await?;

        Ok(ConsentPrompt {
            authenticity_token: session.authenticity_token.clone(),
            client_id: request.client_id.clone(),
            redirect_uri: request.redirect_uri.clone().unwrap_or_default(),
            scope: request.scope.clone().unwrap_or_default(),
            response_type: request.response_type.clone(),
            state: request.state.clone(),
            nonce: request.nonce.clone(),
        })
    }

    /// Redeems the decision callback's anti-forgery token.
    ///
    /// # Errors
    ///
    /// `access_denied` when the token does not belong to the session or no
    /// live pending entry exists for it.
    pub async fn redeem(
        &self,
        authenticity_token: &str,
        session: &SessionContext,
    ) -> OidcResult<PendingAuthorization> {
        if authenticity_token != session.authenticity_token {
            tracing::warn!("consent decision with foreign authenticity token");
            return Err(OidcError::AccessDenied(
                "authenticity token mismatch".to_string(),
            ));
        }

        self.store
            .take_pending(authenticity_token)
            .await?
            .ok_or_else(|| {
                OidcError::AccessDenied("no pending authorization for this token".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryGrantStore;
    use chrono::Utc;

    fn request() -> AuthorizationRequest {
        AuthorizationRequest {
            client_id: "consumer-id".to_string(),
            redirect_uri: Some("http://www.blah.apache.org".to_string()),
            scope: Some("openid".to_string()),
            response_type: "id_token".to_string(),
            state: Some("xyz".to_string()),
            nonce: Some("1234565635".to_string()),
            prompt: None,
            max_age: None,
        }
    }

    fn session() -> SessionContext {
        SessionContext::new("alice", Utc::now(), op_crypto::random::generate_authenticity_token())
    }

    #[tokio::test]
    async fn issue_then_redeem() {
        let gate = ConsentGate::new(Arc::new(InMemoryGrantStore::new()), 600);
        let session = session();

        let prompt = gate.issue(&request(), &session).await.unwrap();
        assert_eq!(prompt.authenticity_token, session.authenticity_token);
        assert_eq!(prompt.client_id, "consumer-id");
        assert_eq!(prompt.nonce.as_deref(), Some("1234565635"));

        let pending = gate
            .redeem(&prompt.authenticity_token, &session)
            .await
            .unwrap();
        assert_eq!(pending.subject, "alice");
        assert_eq!(pending.request.response_type, "id_token");
    }

    #[tokio::test]
    async fn foreign_token_fails_closed() {
        let gate = ConsentGate::new(Arc::new(InMemoryGrantStore::new()), 600);
        let session = session();
        gate.issue(&request(), &session).await.unwrap();

        let result = gate.redeem("forged-token", &session).await;
        assert!(matches!(result, Err(OidcError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn redeem_is_single_use() {
        let gate = ConsentGate::new(Arc::new(InMemoryGrantStore::new()), 600);
        let session = session();
        gate.issue(&request(), &session).await.unwrap();

        assert!(gate.redeem(&session.authenticity_token, &session).await.is_ok());
        assert!(matches!(
            gate.redeem(&session.authenticity_token, &session).await,
            Err(OidcError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn expired_pending_entry_fails_closed() {
        let gate = ConsentGate::new(Arc::new(InMemoryGrantStore::new()), -1);
        let session = session();
        gate.issue(&request(), &session).await.unwrap();

        assert!(matches!(
            gate.redeem(&session.authenticity_token, &session).await,
            Err(OidcError::AccessDenied(_))
        ));
    }
}
