pub mod prompt;

use std::path::Path;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::model::Actor;
use crate::session::{clear_session, save_session, Session};

/// Environment variable name for providing a bearer token without logging in
pub const ENV_TOKEN_VAR: &str = "FORESTRY_RATING_TOKEN";

pub use prompt::{login_interactive, prompt_for_login, register_interactive};

/// Check for a token in the FORESTRY_RATING_TOKEN environment variable.
/// Returns Some(token) if the env var is set and non-empty, None otherwise.
pub fn get_token_from_env() -> Option<String> {
    normalize_token(std::env::var(ENV_TOKEN_VAR).ok())
}

fn normalize_token(raw: Option<String>) -> Option<String> {
    raw.map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

/// Pick the token to send: the environment wins over a stored session, and a
/// session is only used against the server it was issued by.
pub fn resolve_token(session: Option<&Session>, api_url: &str) -> Option<String> {
    pick_token(get_token_from_env(), session, api_url)
}

fn pick_token(env_token: Option<String>, session: Option<&Session>, api_url: &str) -> Option<String> {
    env_token.or_else(|| {
        session
            .filter(|s| s.matches_api(api_url))
            .map(|s| s.token.clone())
    })
}

/// Settle who we act as from the server's answer to `/me`.
///
/// `stored` is the session whose token was sent, if the token came from one.
/// A rejected token ends that session and leaves us anonymous. A changed role
/// or email is written back to it. Other failures propagate.
pub fn settle_actor(
    checked: Result<Actor, ApiError>,
    stored: Option<(&Path, Session)>,
) -> Result<Option<Actor>, ApiError> {
    match checked {
        Ok(actor) => {
            if let Some((path, mut session)) = stored {
                if session.actor != actor {
                    debug!(user = %actor.email, "refreshing stored session");
                    session.actor = actor.clone();
                    if let Err(e) = save_session(path, &session) {
                        warn!("could not update stored session: {:#}", e);
                    }
                }
            }
            Ok(Some(actor))
        }
        Err(e) if e.is_auth() => {
            warn!("token rejected ({}), continuing without login", e);
            if let Some((path, _)) = stored {
                if let Err(e) = clear_session(path) {
                    warn!("could not remove stored session: {:#}", e);
                }
            }
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
