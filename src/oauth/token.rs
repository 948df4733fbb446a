//! Authorization code exchange.
//!
//! Bungie.net's token endpoint takes a form-encoded body and answers either
//! with a token grant or with an `{error, error_description}` object. Public
//! clients send no secret.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::OAuthError;
use crate::config::BungieConfig;
use crate::net::HttpClient;
use crate::storage::{ACCESS_TOKEN_KEY, EXPIRES_IN_KEY, MEMBERSHIP_ID_KEY, Session, StorageError};

/// Credentials obtained from a successful code exchange.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CredentialBundle {
    pub access_token: String,
    /// Token lifetime in seconds, as reported by the provider. Not enforced.
    pub expires_in: u64,
    pub membership_id: String,
}

impl std::fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("access_token", &"********")
            .field("expires_in", &self.expires_in)
            .field("membership_id", &self.membership_id)
            .finish()
    }
}

impl CredentialBundle {
    /// Write each field under its own key in persistent storage,
    /// overwriting the previous login.
    pub fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let store = session.persistent();
        store.set(ACCESS_TOKEN_KEY, &self.access_token)?;
        store.set(EXPIRES_IN_KEY, &self.expires_in.to_string())?;
        store.set(MEMBERSHIP_ID_KEY, &self.membership_id)?;
        Ok(())
    }

    /// Read a complete bundle back from persistent storage.
    ///
    /// Returns `None` if any field is missing. An unparsable lifetime reads
    /// as zero.
    pub fn load(session: &Session) -> Result<Option<Self>, StorageError> {
        let store = session.persistent();
        let (Some(access_token), Some(expires_in), Some(membership_id)) = (
            store.get(ACCESS_TOKEN_KEY)?,
            store.get(EXPIRES_IN_KEY)?,
            store.get(MEMBERSHIP_ID_KEY)?,
        ) else {
            return Ok(None);
        };
        Ok(Some(Self {
            access_token,
            expires_in: expires_in.parse().unwrap_or_default(),
            membership_id,
        }))
    }
}

/// Grant returned by the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    membership_id: String,
}

/// Error returned by the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Either shape of a token endpoint body. An `error` field wins.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenEndpointResponse {
    Failure(TokenErrorResponse),
    Granted(TokenResponse),
}

/// Exchanges authorization codes for access tokens.
#[derive(Debug, Clone)]
pub struct TokenExchangeClient {
    http: HttpClient,
    token_url: String,
    client_id: String,
}

impl TokenExchangeClient {
    pub fn new(http: HttpClient, config: &BungieConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
        }
    }

    /// Exchange `code` for a [`CredentialBundle`] and persist it.
    ///
    /// Nothing is written unless the provider returned a grant.
    pub async fn exchange(
        &self,
        code: &str,
        session: &Session,
    ) -> Result<CredentialBundle, OAuthError> {
        debug!("Exchanging authorization code");

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
        ];

        let response = self
            .http
            .inner()
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Token request failed"))?;

        let status = response.status();
        let body = response.text().await?;

        let decoded = serde_json::from_str::<TokenEndpointResponse>(&body).map_err(|e| {
            error!(status = status.as_u16(), error = %e, "Undecodable token response");
            OAuthError::Decode(format!("HTTP {}: {}", status.as_u16(), e))
        })?;

        let grant = match decoded {
            TokenEndpointResponse::Failure(err) => {
                warn!(
                    error = %err.error,
                    description = ?err.error_description,
                    "Token exchange rejected"
                );
                return Err(OAuthError::Provider {
                    error: err.error,
                    description: err.error_description,
                });
            }
            TokenEndpointResponse::Granted(grant) => grant,
        };

        let bundle = CredentialBundle {
            access_token: grant.access_token,
            expires_in: grant.expires_in,
            membership_id: grant.membership_id,
        };
        bundle.persist(session)?;

        debug!(
            membership_id = %bundle.membership_id,
            expires_in = bundle.expires_in,
            "Token exchange successful"
        );
        Ok(bundle)
    }
}
