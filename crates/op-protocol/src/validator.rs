//! Authorization-request validation.
//!
//! Pure functions of the request, the resolved client, and the session
//! context. No side effects; each check fails with its own error kind so
//! callers can report precisely.
//!
//! The redirect-URI check stands apart: until it passes, nothing may be
//! delivered by redirect, so its failure is always surfaced inline.

use std::str::FromStr;

use op_model::{Client, SessionContext};

use crate::error::{OidcError, OidcResult};
use crate::request::AuthorizationRequest;
use crate::types::{Prompt, ResponseType, ResponseTypes};

/// Outcome of a successful validation: the parsed pieces of the request
/// the issuance path needs.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// Parsed response-type combination.
    pub response_types: ResponseTypes,
    /// Parsed prompt values.
    pub prompts: Vec<Prompt>,
    /// The granted scope.
    pub scope: String,
}

/// Establishes the redirect URI for the exchange.
///
/// # Errors
///
/// `invalid_request` when the URI is missing or does not exactly match a
/// registered one. This failure must be reported inline, never by
/// redirecting to the unverified URI.
pub fn validate_redirect_uri(
    request: &AuthorizationRequest,
    client: &Client,
) -> OidcResult<String> {
    let redirect_uri = request
        .redirect_uri
        .as_deref()
        .ok_or_else(|| OidcError::InvalidRequest("redirect_uri is required".to_string()))?;

    if !client.allows_redirect_uri(redirect_uri) {
        return Err(OidcError::InvalidRequest(
            "redirect_uri is not registered for this client".to_string(),
        ));
    }

    Ok(redirect_uri.to_string())
}

/// Validates an authorization request against the client registration and
/// the session.
///
/// `prior_consent` tells the validator whether a remembered consent grant
/// already covers the requested scope; it feeds the `prompt=none`
/// interaction check.
///
/// # Errors
///
/// One distinct error kind per failed check; see the module documentation
/// and the error type.
pub fn validate(
    request: &AuthorizationRequest,
    client: &Client,
    session: &SessionContext,
    prior_consent: bool,
) -> OidcResult<ValidatedRequest> {
    // Scope must be present and within the client's registration.
    let scope = request
        .scope
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| OidcError::InvalidRequest("scope is required".to_string()))?;

    if !client.allows_scope(scope) {
        return Err(OidcError::InvalidScope(
            "requested scope exceeds the client registration".to_string(),
        ));
    }

    // Response type must parse and must be registered for the client.
    let response_types = ResponseTypes::from_str(&request.response_type)
        .map_err(|_| OidcError::UnsupportedResponseType(request.response_type.clone()))?;

    if !client.allows_response_type(&request.response_type) {
        return Err(OidcError::UnauthorizedClient(
            "response_type is not registered for this client".to_string(),
        ));
    }

    // Prompt values are parsed strictly; an unknown token is an error.
    let prompts = parse_prompts(request)?;
    if prompts.contains(&Prompt::None) && prompts.len() > 1 {
        return Err(OidcError::InvalidRequest(
            "prompt=none cannot be combined with other prompt values".to_string(),
        ));
    }

    // Pure implicit OIDC flow requires a nonce to bind the ID token to
    // this request.
    if response_types.contains(ResponseType::IdToken) && !response_types.contains(ResponseType::Code)
    {
        let nonce_present = request.nonce.as_deref().is_some_and(|n| !n.is_empty());
        if !nonce_present {
            return Err(OidcError::InvalidRequest(
                "nonce is required for the implicit flow".to_string(),
            ));
        }
    }

    // A stale session cannot satisfy max_age; the caller must
    // re-authenticate the subject before retrying.
    if let Some(max_age) = request.max_age {
        if !session.is_fresh(max_age) {
            return Err(OidcError::LoginRequired);
        }
    }

    // prompt=login forces re-authentication, which the core cannot
    // perform itself.
    if prompts.contains(&Prompt::Login) {
        return Err(OidcError::LoginRequired);
    }

    // prompt=none forbids interaction, so consent must already be settled.
    if prompts.contains(&Prompt::None) && client.consent_required && !prior_consent {
        return Err(OidcError::InteractionRequired);
    }

    Ok(ValidatedRequest {
        response_types,
        prompts,
        scope: scope.to_string(),
    })
}

fn parse_prompts(request: &AuthorizationRequest) -> OidcResult<Vec<Prompt>> {
    request
        .prompt
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(|token| {
            Prompt::from_str(token).map_err(|e| OidcError::InvalidRequest(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn client() -> Client {
        Client::new("consumer-id")
            .with_secret("this-is-a-secret")
            .with_redirect_uri("http://www.blah.apache.org")
            .with_response_type("code")
            .with_response_type("id_token")
            .with_response_type("token id_token")
            .with_response_type("code id_token")
            .with_scope("openid")
            .with_scope("profile")
    }

    fn session() -> SessionContext {
        SessionContext::new("alice", Utc::now(), "session-token")
    }

    fn request(response_type: &str) -> AuthorizationRequest {
        AuthorizationRequest {
            client_id: "consumer-id".to_string(),
            redirect_uri: Some("http://www.blah.apache.org".to_string()),
            scope: Some("openid".to_string()),
            response_type: response_type.to_string(),
            state: None,
            nonce: None,
            prompt: None,
            max_age: None,
        }
    }

    #[test]
    fn redirect_uri_must_be_registered() {
        let mut req = request("code");
        req.redirect_uri = Some("http://evil.example.com".to_string());
        assert!(matches!(
            validate_redirect_uri(&req, &client()),
            Err(OidcError::InvalidRequest(_))
        ));

        req.redirect_uri = None;
        assert!(matches!(
            validate_redirect_uri(&req, &client()),
            Err(OidcError::InvalidRequest(_))
        ));

        assert_eq!(
            validate_redirect_uri(&request("code"), &client()).unwrap(),
            "http://www.blah.apache.org"
        );
    }

    #[test]
    fn unknown_response_type_is_unsupported() {
        let req = request("banana");
        assert!(matches!(
            validate(&req, &client(), &session(), false),
            Err(OidcError::UnsupportedResponseType(_))
        ));
    }

    #[test]
    fn unregistered_response_type_is_unauthorized() {
        let mut c = client();
        c.response_types.remove("token id_token");
        let mut req = request("token id_token");
        req.nonce = Some("n-0S6_WzA2Mj".to_string());

        assert!(matches!(
            validate(&req, &c, &session(), false),
            Err(OidcError::UnauthorizedClient(_))
        ));
    }

    #[test]
    fn scope_is_required_and_bounded() {
        let mut req = request("code");
        req.scope = None;
        assert!(matches!(
            validate(&req, &client(), &session(), false),
            Err(OidcError::InvalidRequest(_))
        ));

        let mut req = request("code");
        req.scope = Some("openid admin".to_string());
        assert!(matches!(
            validate(&req, &client(), &session(), false),
            Err(OidcError::InvalidScope(_))
        ));
    }

    #[test]
    fn unknown_prompt_value_is_rejected() {
        let mut req = request("code");
        req.prompt = Some("banana".to_string());
        assert!(matches!(
            validate(&req, &client(), &session(), false),
            Err(OidcError::InvalidRequest(_))
        ));
    }

    #[test]
    fn prompt_none_cannot_combine() {
        let mut req = request("id_token");
        req.nonce = Some("1234565635".to_string());
        req.prompt = Some("none login".to_string());

        assert!(matches!(
            validate(&req, &client(), &session(), false),
            Err(OidcError::InvalidRequest(_))
        ));
    }

    #[test]
    fn implicit_flow_requires_nonce() {
        let req = request("id_token");
        assert!(matches!(
            validate(&req, &client(), &session(), false),
            Err(OidcError::InvalidRequest(_))
        ));

        let mut req = request("id_token");
        req.nonce = Some(String::new());
        assert!(matches!(
            validate(&req, &client(), &session(), false),
            Err(OidcError::InvalidRequest(_))
        ));

        let mut req = request("id_token");
        req.nonce = Some("1234565635".to_string());
        assert!(validate(&req, &client(), &session(), false).is_ok());
    }

    #[test]
    fn code_and_hybrid_flows_do_not_require_nonce() {
        assert!(validate(&request("code"), &client(), &session(), false).is_ok());
        // The code leg of the hybrid flow binds the exchange instead.
        assert!(validate(&request("code id_token"), &client(), &session(), false).is_ok());
    }

    #[test]
    fn stale_session_fails_max_age() {
        let stale = SessionContext::new("alice", Utc::now() - Duration::seconds(900), "tok");
        let mut req = request("code");
        req.max_age = Some(300);

        assert!(matches!(
            validate(&req, &client(), &stale, false),
            Err(OidcError::LoginRequired)
        ));

        let fresh = session();
        assert!(validate(&req, &client(), &fresh, false).is_ok());
    }

    #[test]
    fn prompt_login_signals_reauthentication() {
        let mut req = request("code");
        req.prompt = Some("login".to_string());
        assert!(matches!(
            validate(&req, &client(), &session(), false),
            Err(OidcError::LoginRequired)
        ));
    }

    #[test]
    fn prompt_none_requires_settled_consent() {
        let mut req = request("code");
        req.prompt = Some("none".to_string());

        assert!(matches!(
            validate(&req, &client(), &session(), false),
            Err(OidcError::InteractionRequired)
        ));
        assert!(validate(&req, &client(), &session(), true).is_ok());

        let trusted = client().with_consent_required(false);
        assert!(validate(&req, &trusted, &session(), false).is_ok());
    }

    #[test]
    fn validated_request_carries_parsed_pieces() {
        let mut req = request("token id_token");
        req.nonce = Some("1234565635".to_string());
        req.scope = Some("openid profile".to_string());

        let validated = validate(&req, &client(), &session(), false).unwrap();
        assert!(validated.response_types.is_implicit_flow());
        assert_eq!(validated.scope, "openid profile");
        assert!(validated.prompts.is_empty());
    }
}
