//! Authorization redirect.

use tracing::{debug, info};

use super::OAuthError;
use super::state::StateGenerator;
use crate::config::BungieConfig;
use crate::storage::Session;

/// Build the authorize URL for an authorization-code login.
///
/// Parameters are emitted in a fixed order: `client_id`, `response_type`,
/// `state`.
pub fn build_authorize_url(auth_url: &str, client_id: &str, state: &str) -> String {
    format!(
        "{}?client_id={}&response_type=code&state={}",
        auth_url,
        urlencoding::encode(client_id),
        urlencoding::encode(state),
    )
}

/// An outbound authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Where the user's browser should be sent.
    pub url: String,
    /// The state token stored for this request.
    pub state: String,
}

/// Starts a login by issuing a state token and building the authorize URL.
#[derive(Debug, Clone)]
pub struct RedirectDispatcher {
    auth_url: String,
    client_id: String,
    generator: StateGenerator,
}

impl RedirectDispatcher {
    pub fn new(config: &BungieConfig) -> Self {
        Self {
            auth_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            generator: StateGenerator,
        }
    }

    /// Issue and store a state token, then return the authorize URL.
    ///
    /// The state is in session storage before the URL is handed out, so the
    /// callback can always find it.
    pub fn dispatch(&self, session: &Session) -> Result<AuthorizationRequest, OAuthError> {
        let state = self.generator.issue(session)?;
        debug!("Stored login state token");

        let url = build_authorize_url(&self.auth_url, &self.client_id, &state);
        info!(client_id = %self.client_id, "Dispatching authorization redirect");

        Ok(AuthorizationRequest { url, state })
    }
}
