//! Redirect-back handling.
//!
//! The authorize endpoint sends the browser back with `code` and `state`
//! (or `error` and `error_description`). The handler validates the state
//! before anything else; a mismatch stops the login with no exchange.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};

use super::OAuthError;
use super::state::states_match;
use super::token::{CredentialBundle, TokenExchangeClient};
use crate::bungie::{PipelineError, ProfilePipeline, ProfileSnapshot};
use crate::storage::Session;

/// Query parameters of a redirect back from the authorize endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse from a raw query string (without the leading `?`).
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            slot.get_or_insert_with(|| value.into_owned());
        }
        params
    }

    /// The authorization code, if one was returned. An empty value counts
    /// as absent.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref().filter(|c| !c.is_empty())
    }

    /// The provider-reported error, if any. An empty value counts as absent.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Result of handling a page load.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// No `code` in the query; an ordinary page load.
    NotACallback,
    /// Token exchanged. The profile run may still have failed.
    Completed {
        credentials: CredentialBundle,
        profile: Result<ProfileSnapshot, PipelineError>,
    },
    /// Login halted before or during the exchange.
    Failed(OAuthError),
}

/// Validates callbacks and drives the exchange and the first profile run.
#[derive(Debug, Clone)]
pub struct CallbackHandler {
    exchange: TokenExchangeClient,
    pipeline: Arc<ProfilePipeline>,
}

impl CallbackHandler {
    pub fn new(exchange: TokenExchangeClient, pipeline: Arc<ProfilePipeline>) -> Self {
        Self { exchange, pipeline }
    }

    /// Handle the query of a page load.
    ///
    /// The stored state is consumed on every callback, whatever the result,
    /// so a replayed callback always fails.
    pub async fn handle(&self, params: &CallbackParams, session: &Session) -> CallbackOutcome {
        if let Some(err) = params.error() {
            if let Err(e) = session.take_state() {
                return CallbackOutcome::Failed(e.into());
            }
            warn!(
                error = %err,
                description = ?params.error_description,
                "Authorization denied by provider"
            );
            return CallbackOutcome::Failed(OAuthError::Denied {
                error: err.to_string(),
                description: params.error_description.clone(),
            });
        }

        let Some(code) = params.code() else {
            return CallbackOutcome::NotACallback;
        };

        let stored = match session.take_state() {
            Ok(stored) => stored,
            Err(e) => return CallbackOutcome::Failed(e.into()),
        };

        if !states_match(stored.as_deref(), params.state.as_deref()) {
            error!(
                stored_present = stored.is_some(),
                returned_present = params.state.is_some(),
                "State token mismatch, refusing token exchange"
            );
            return CallbackOutcome::Failed(OAuthError::StateMismatch);
        }

        let credentials = match self.exchange.exchange(code, session).await {
            Ok(bundle) => bundle,
            Err(e) => {
                error!(error = %e, "Token exchange failed");
                return CallbackOutcome::Failed(e);
            }
        };
        info!(membership_id = %credentials.membership_id, "Login completed");

        let profile = self.pipeline.run(session).await;
        CallbackOutcome::Completed {
            credentials,
            profile,
        }
    }
}
