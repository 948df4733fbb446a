//! Bungie.net OAuth 2.0 authorization-code login.
//!
//! - [`state`] - state token generation and comparison
//! - [`redirect`] - authorize URL construction ([`RedirectDispatcher`])
//! - [`callback`] - callback validation and follow-up ([`CallbackHandler`])
//! - [`token`] - code exchange and the stored [`CredentialBundle`]

pub mod callback;
pub mod redirect;
pub mod state;
pub mod token;

pub use callback::{CallbackHandler, CallbackOutcome, CallbackParams};
pub use redirect::{AuthorizationRequest, RedirectDispatcher, build_authorize_url};
pub use state::{STATE_LENGTH, StateGenerator, generate_state, states_match};
pub use token::{CredentialBundle, TokenExchangeClient};

use crate::storage::StorageError;

/// Errors that can occur during login.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Returned state does not match the stored one, or none was stored.
    #[error("State token mismatch")]
    StateMismatch,

    /// The user or provider refused authorization on the consent screen.
    #[error("Authorization denied: {error}")]
    Denied {
        error: String,
        description: Option<String>,
    },

    /// The token endpoint returned an `error` object.
    #[error("Token exchange rejected: {error}")]
    Provider {
        error: String,
        description: Option<String>,
    },

    /// The token endpoint body matched neither known shape.
    #[error("Failed to decode token response: {0}")]
    Decode(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Session or credential storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl OAuthError {
    /// Human-readable detail from the provider, if any.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Denied { description, .. } | Self::Provider { description, .. } => {
                description.as_deref()
            }
            _ => None,
        }
    }
}
