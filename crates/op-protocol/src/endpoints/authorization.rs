//! Authorization endpoint logic.
//!
//! Drives the authorization state machine: validate the request, run the
//! consent step when needed, then issue the response for the requested
//! flow. The code flow delivers parameters in the redirect query; implicit
//! and hybrid responses go in the fragment, which follow-up navigation
//! does not send back to servers.
//!
//! Failures found before the redirect URI is established are returned
//! inline; anything later is delivered as an error redirect carrying the
//! error code and the request's `state`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use op_model::{Client, ClientRegistry, SessionContext};
use url::Url;

use crate::config::ProviderConfig;
use crate::consent::{ConsentGate, ConsentPrompt};
use crate::error::{OidcError, OidcResult};
use crate::factory::TokenFactory;
use crate::id_token::IdTokenBuilder;
use crate::request::{AuthorizationRequest, Decision, DecisionRequest};
use crate::store::{AuthCodeParams, AuthorizationCode, ConsentGrant, GrantStateStore};
use crate::types::{Prompt, ResponseMode, ResponseType, ResponseTypes};
use crate::validator;

/// A redirect the host should send the user agent to.
#[derive(Debug, Clone)]
pub struct RedirectDescriptor {
    /// The validated redirect target.
    pub target_uri: String,

    /// Parameters to deliver.
    pub params: Vec<(String, String)>,

    /// Whether the parameters travel in the query or the fragment.
    pub mode: ResponseMode,
}

impl RedirectDescriptor {
    /// Looks up a parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether this redirect delivers an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.param("error").is_some()
    }

    /// Renders the full redirect location.
    #[must_use]
    pub fn location(&self) -> String {
        let encoded: String = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        if let Ok(mut url) = Url::parse(&self.target_uri) {
            match self.mode {
                ResponseMode::Query => {
                    url.query_pairs_mut().extend_pairs(
                        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                    );
                }
                ResponseMode::Fragment => {
                    url.set_fragment(Some(&encoded));
                }
            }
            return url.to_string();
        }

        // Registered URIs normally parse; fall back to plain joining.
        match self.mode {
            ResponseMode::Query => {
                let separator = if self.target_uri.contains('?') { "&" } else { "?" };
                format!("{}{separator}{encoded}", self.target_uri)
            }
            ResponseMode::Fragment => format!("{}#{encoded}", self.target_uri),
        }
    }
}

/// Outcome of the authorize step.
#[derive(Debug, Clone)]
pub enum AuthorizeOutcome {
    /// Interactive consent is required; render the prompt.
    Consent(ConsentPrompt),

    /// The exchange is settled; redirect the user agent.
    Redirect(RedirectDescriptor),
}

/// Orchestrates the `authorize` and `decision` steps.
pub struct AuthorizationEndpoint<S> {
    registry: ClientRegistry,
    store: Arc<S>,
    consent: ConsentGate<S>,
    factory: TokenFactory<S>,
    id_tokens: IdTokenBuilder,
    code_lifetime: i64,
}

impl<S: GrantStateStore> AuthorizationEndpoint<S> {
    /// Creates the endpoint logic over a registry, store, and config.
    pub fn new(registry: ClientRegistry, store: Arc<S>, config: &ProviderConfig) -> Self {
        Self {
            consent: ConsentGate::new(Arc::clone(&store), config.pending_authorization_lifetime),
            factory: TokenFactory::new(Arc::clone(&store), config),
            id_tokens: IdTokenBuilder::new(config),
            code_lifetime: config.authorization_code_lifetime,
            registry,
            store,
        }
    }

    /// Handles an inbound authorization request.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for failures that may not be redirected (unknown
    /// client, unestablished redirect URI). Validation failures after the
    /// redirect URI is established come back as an error redirect.
    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
        session: &SessionContext,
    ) -> OidcResult<AuthorizeOutcome> {
        let client = self
            .registry
            .get(&request.client_id)
            .ok_or_else(|| OidcError::InvalidRequest("unknown client".to_string()))?;

        // Everything after this line may report errors via redirect.
        let redirect_uri = validator::validate_redirect_uri(request, &client)?;
        let mode = response_mode_for(&request.response_type);

        let scope = request.scope.as_deref().unwrap_or_default();
        let prior_consent = self
            .store
            .has_consent(&request.client_id, &session.subject, scope)
            .await?;

        let validated = match validator::validate(request, &client, session, prior_consent) {
            Ok(validated) => validated,
            Err(err) => {
                tracing::warn!(
                    client_id = %request.client_id,
                    error = %err.error_code(),
                    "authorization request rejected"
                );
                return Ok(AuthorizeOutcome::Redirect(error_redirect(
                    &redirect_uri,
                    &err,
                    request.state.as_deref(),
                    mode,
                )));
            }
        };

        let force_consent = validated.prompts.contains(&Prompt::Consent);
        if force_consent || (client.consent_required && !prior_consent) {
            let prompt = self.consent.issue(request, session).await?;
            return Ok(AuthorizeOutcome::Consent(prompt));
        }

        let redirect = match self
            .issue(
                &client,
                request,
                &validated.response_types,
                &session.subject,
                session.auth_time,
                redirect_uri.clone(),
                mode,
            )
            .await
        {
            Ok(redirect) => redirect,
            Err(err) => error_redirect(&redirect_uri, &err, request.state.as_deref(), mode),
        };
        Ok(AuthorizeOutcome::Redirect(redirect))
    }

    /// Handles the consent decision callback.
    ///
    /// # Errors
    ///
    /// `access_denied` when the anti-forgery token or the echoed request
    /// fields do not match the pending authorization. These are returned
    /// inline: a forged callback earns no redirect.
    pub async fn decision(
        &self,
        decision: &DecisionRequest,
        session: &SessionContext,
    ) -> OidcResult<RedirectDescriptor> {
        let pending = self
            .consent
            .redeem(&decision.authenticity_token, session)
            .await?;
        let request = &pending.request;

        let redirect_uri = request.redirect_uri.clone().unwrap_or_default();
        if decision.client_id != request.client_id
            || decision.redirect_uri != redirect_uri
            || decision.scope != request.scope.clone().unwrap_or_default()
        {
            tracing::warn!(
                client_id = %decision.client_id,
                "consent decision does not match the pending authorization"
            );
            return Err(OidcError::AccessDenied(
                "decision does not match the pending authorization".to_string(),
            ));
        }

        let client = self
            .registry
            .get(&request.client_id)
            .ok_or_else(|| OidcError::AccessDenied("unknown client".to_string()))?;

        let mode = response_mode_for(&request.response_type);

        if decision.decision == Decision::Deny {
            tracing::debug!(client_id = %request.client_id, "authorization denied by user");
            return Ok(error_redirect(
                &redirect_uri,
                &OidcError::AccessDenied("the user denied the request".to_string()),
                request.state.as_deref(),
                mode,
            ));
        }

        let scope = request.scope.clone().unwrap_or_default();
        self.store
            .record_consent(ConsentGrant {
                client_id: request.client_id.clone(),
                subject: pending.subject.clone(),
                scopes: scope.split_whitespace().map(ToString::to_string).collect::<HashSet<_>>(),
                granted_at: Utc::now(),
            })
            .await?;

        let response_types: ResponseTypes = request
            .response_type
            .parse()
            .map_err(|_| OidcError::ServerError("pending request is corrupt".to_string()))?;

        match self
            .issue(
                &client,
                request,
                &response_types,
                &pending.subject,
                pending.auth_time,
                redirect_uri.clone(),
                mode,
            )
            .await
        {
            Ok(redirect) => Ok(redirect),
            Err(err) => Ok(error_redirect(
                &redirect_uri,
                &err,
                request.state.as_deref(),
                mode,
            )),
        }
    }

    /// Issues the response for a granted authorization.
    #[allow(clippy::too_many_arguments)]
    async fn issue(
        &self,
        client: &Client,
        request: &AuthorizationRequest,
        response_types: &ResponseTypes,
        subject: &str,
        auth_time: DateTime<Utc>,
        redirect_uri: String,
        mode: ResponseMode,
    ) -> OidcResult<RedirectDescriptor> {
        let scope = request.scope.clone().unwrap_or_default();
        let mut params: Vec<(String, String)> = Vec::new();

        if response_types.contains(ResponseType::Code) {
            let code = op_crypto::random::generate_code();
            self.store
                .put_code(AuthorizationCode::new(AuthCodeParams {
                    code: code.clone(),
                    client_id: client.client_id.clone(),
                    subject: subject.to_string(),
                    redirect_uri: redirect_uri.clone(),
                    scope: scope.clone(),
                    nonce: request.nonce.clone(),
                    auth_time,
                    ttl_seconds: self.code_lifetime,
                }))
                .await?;
            params.push(("code".to_string(), code));
        }

        let access_token = if response_types.contains(ResponseType::Token) {
            let issued = self
                .factory
                .issue_access_token(&client.client_id, subject, &scope, None)
                .await?;
            params.push(("access_token".to_string(), issued.value.clone()));
            params.push(("token_type".to_string(), "Bearer".to_string()));
            params.push(("expires_in".to_string(), issued.expires_in.to_string()));
            Some(issued.value)
        } else {
            None
        };

        if response_types.contains(ResponseType::IdToken) {
            let id_token = self.id_tokens.issue(
                &client.client_id,
                subject,
                auth_time,
                request.nonce.as_deref(),
                access_token.as_deref(),
            )?;
            params.push(("id_token".to_string(), id_token));
        }

        if let Some(state) = &request.state {
            params.push(("state".to_string(), state.clone()));
        }

        tracing::debug!(
            client_id = %client.client_id,
            subject = %subject,
            response_type = %request.response_type,
            "authorization issued"
        );

        Ok(RedirectDescriptor {
            target_uri: redirect_uri,
            params,
            mode,
        })
    }
}

/// Query for the plain code flow, fragment for anything front-channel.
fn response_mode_for(response_type: &str) -> ResponseMode {
    response_type
        .parse::<ResponseTypes>()
        .map(|rt| {
            if rt.is_front_channel() {
                ResponseMode::Fragment
            } else {
                ResponseMode::Query
            }
        })
        .unwrap_or_default()
}

/// Builds an error redirect carrying the error code and `state`.
fn error_redirect(
    redirect_uri: &str,
    error: &OidcError,
    state: Option<&str>,
    mode: ResponseMode,
) -> RedirectDescriptor {
    let mut params = vec![
        ("error".to_string(), error.error_code().to_string()),
        ("error_description".to_string(), error.to_string()),
    ];
    if let Some(state) = state {
        params.push(("state".to_string(), state.to_string()));
    }

    RedirectDescriptor {
        target_uri: redirect_uri.to_string(),
        params,
        mode,
    }
}
