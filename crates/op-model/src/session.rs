//! Authenticated-session context.
//!
//! The core never authenticates users and never consults ambient session
//! state. The caller authenticates the subject, then passes this context
//! into every authorization call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Context of an already-authenticated session, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Authenticated subject identifier.
    pub subject: String,

    /// When the subject authenticated. Ends up as the `auth_time` claim.
    pub auth_time: DateTime<Utc>,

    /// Anti-forgery token the caller bound to this session's consent step.
    pub authenticity_token: String,
}

impl SessionContext {
    /// Creates a new session context.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        auth_time: DateTime<Utc>,
        authenticity_token: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            auth_time,
            authenticity_token: authenticity_token.into(),
        }
    }

    /// Seconds elapsed since authentication.
    #[must_use]
    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.auth_time).num_seconds()
    }

    /// Whether the session satisfies a `max_age` constraint in seconds.
    #[must_use]
    pub fn is_fresh(&self, max_age: i64) -> bool {
        self.age_seconds() <= max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_session_satisfies_max_age() {
        let session = SessionContext::new("alice", Utc::now(), "tok");
        assert!(session.is_fresh(300));
    }

    #[test]
    fn stale_session_fails_max_age() {
        let session = SessionContext::new("alice", Utc::now() - Duration::seconds(600), "tok");
        assert!(!session.is_fresh(300));
        assert!(session.age_seconds() >= 600);
    }
}
