use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Actor;

pub const SESSION_VERSION: u32 = 1;

/// A logged-in session: bearer token plus the actor it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub version: u32,
    pub api_url: String,
    pub token: String,
    pub actor: Actor,
    pub saved_at: DateTime<Utc>,
}

impl Session {
    pub fn new(api_url: &str, token: String, actor: Actor) -> Self {
        Self {
            version: SESSION_VERSION,
            api_url: api_url.to_string(),
            token,
            actor,
            saved_at: Utc::now(),
        }
    }

    /// Tokens are only sent to the server that issued them.
    pub fn matches_api(&self, api_url: &str) -> bool {
        self.api_url.trim_end_matches('/') == api_url.trim().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn actor() -> Actor {
        Actor {
            id: 1,
            email: "admin@example.org".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_new_session_version() {
        let session = Session::new("http://localhost:3000/api", "t".to_string(), actor());
        assert_eq!(session.version, SESSION_VERSION);
    }

    #[test]
    fn test_matches_api_ignores_trailing_slash() {
        let session = Session::new("http://localhost:3000/api/", "t".to_string(), actor());
        assert!(session.matches_api("http://localhost:3000/api"));
        assert!(!session.matches_api("https://other.example.org/api"));
    }
}
