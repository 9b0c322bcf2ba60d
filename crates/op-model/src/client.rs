//! Client domain model.
//!
//! Clients represent applications that request authentication and
//! authorization from the server. A client record is immutable once loaded
//! into the registry.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A registered OAuth 2.0 / OIDC client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier (OAuth `client_id`).
    pub client_id: String,

    /// Display name.
    pub name: Option<String>,

    /// Whether the client is enabled.
    pub enabled: bool,

    /// Client secret. `None` marks a public client.
    pub secret: Option<String>,

    /// Registered redirect URIs. Matched exactly, never by prefix.
    pub redirect_uris: HashSet<String>,

    /// Registered `response_type` combinations, space-delimited as they
    /// appear on the wire (`"code"`, `"id_token"`, `"token id_token"`).
    pub response_types: HashSet<String>,

    /// Allowed grant types at the token endpoint.
    pub grant_types: HashSet<String>,

    /// Scopes the client may request.
    pub scopes: HashSet<String>,

    /// Whether issuance requires an interactive consent decision even when
    /// a prior grant exists.
    pub consent_required: bool,
}

impl Client {
    /// Creates a new client with the given client ID.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            name: None,
            enabled: true,
            secret: None,
            redirect_uris: HashSet::new(),
            response_types: HashSet::new(),
            grant_types: HashSet::new(),
            scopes: HashSet::new(),
            consent_required: true,
        }
    }

    /// Sets the client secret (confidential client).
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Registers a redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uris.insert(uri.into());
        self
    }

    /// Registers a `response_type` combination.
    #[must_use]
    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_types.insert(response_type.into());
        self
    }

    /// Registers a grant type.
    #[must_use]
    pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_types.insert(grant_type.into());
        self
    }

    /// Registers an allowed scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.insert(scope.into());
        self
    }

    /// Sets whether interactive consent is required.
    #[must_use]
    pub const fn with_consent_required(mut self, required: bool) -> Self {
        self.consent_required = required;
        self
    }

    /// Verifies a presented client secret.
    ///
    /// Public clients (no registered secret) accept any presentation;
    /// confidential clients require an exact match.
    #[must_use]
    pub fn verify_secret(&self, presented: Option<&str>) -> bool {
        match (&self.secret, presented) {
            (Some(expected), Some(given)) => expected == given,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Checks a redirect URI against the registered set. Exact match only.
    #[must_use]
    pub fn allows_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.contains(uri)
    }

    /// Checks whether a requested `response_type` combination is registered.
    ///
    /// Combinations are compared as token sets, so `"token id_token"` and
    /// `"id_token token"` are the same registration.
    #[must_use]
    pub fn allows_response_type(&self, requested: &str) -> bool {
        let requested: HashSet<&str> = requested.split_whitespace().collect();
        if requested.is_empty() {
            return false;
        }
        self.response_types
            .iter()
            .any(|registered| registered.split_whitespace().collect::<HashSet<&str>>() == requested)
    }

    /// Checks whether a grant type is registered for this client.
    #[must_use]
    pub fn allows_grant_type(&self, grant_type: &str) -> bool {
        self.grant_types.contains(grant_type)
    }

    /// Checks whether every token of a space-delimited scope is registered.
    #[must_use]
    pub fn allows_scope(&self, scope: &str) -> bool {
        scope
            .split_whitespace()
            .all(|token| self.scopes.contains(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new("consumer-id")
            .with_secret("this-is-a-secret")
            .with_redirect_uri("http://www.blah.apache.org")
            .with_response_type("code")
            .with_response_type("token id_token")
            .with_grant_type("authorization_code")
            .with_scope("openid")
            .with_scope("profile")
    }

    #[test]
    fn secret_verification() {
        let c = client();
        assert!(c.verify_secret(Some("this-is-a-secret")));
        assert!(!c.verify_secret(Some("wrong")));
        assert!(!c.verify_secret(None));

        let public = Client::new("spa");
        assert!(public.verify_secret(None));
    }

    #[test]
    fn redirect_uri_is_exact_match() {
        let c = client();
        assert!(c.allows_redirect_uri("http://www.blah.apache.org"));
        assert!(!c.allows_redirect_uri("http://www.blah.apache.org/"));
        assert!(!c.allows_redirect_uri("http://www.blah.apache.org/path"));
    }

    #[test]
    fn response_type_combinations_compare_as_sets() {
        let c = client();
        assert!(c.allows_response_type("code"));
        assert!(c.allows_response_type("token id_token"));
        assert!(c.allows_response_type("id_token token"));
        assert!(!c.allows_response_type("id_token"));
        assert!(!c.allows_response_type(""));
    }

    #[test]
    fn scope_subset_check() {
        let c = client();
        assert!(c.allows_scope("openid"));
        assert!(c.allows_scope("openid profile"));
        assert!(!c.allows_scope("openid admin"));
    }
}
