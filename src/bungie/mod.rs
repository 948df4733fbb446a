//! Bungie.net Platform API client and the login-to-profile pipeline.
//!
//! - [`BungieClient`] - typed access to the two Platform endpoints
//! - [`ProfilePipeline`] - membership resolution followed by the profile fetch
//! - [`types`] - envelope and payload schemas

pub mod pipeline;
pub mod types;

pub use pipeline::{PipelineState, ProfilePipeline};
pub use types::{
    BungieEnvelope, BungieMembershipType, CharacterClass, DestinyMembership, MembershipRecord,
    ProfileSnapshot, UserMembershipData,
};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::BungieConfig;
use crate::net::HttpClient;
use crate::storage::StorageError;

/// Membership type wildcard accepted by `GetMembershipsById`.
pub const MEMBERSHIP_TYPE_ALL: i32 = -1;

/// Profile components requested: profile inventories, character
/// inventories, character equipment.
pub const PROFILE_COMPONENTS: [u16; 3] = [102, 201, 205];

/// Header carrying the application API key.
const API_KEY_HEADER: &str = "X-API-Key";

// =============================================================================
// PipelineError
// =============================================================================

/// Errors that end a profile retrieval run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No access token or membership id in persistent storage.
    #[error("Not signed in: no stored credentials")]
    MissingCredentials,

    /// The API answered with a non-success status.
    #[error("{operation} failed with HTTP {status}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The account has no linked Destiny profiles.
    #[error("No linked Destiny profiles")]
    NoLinkedProfiles,

    /// A success response without the expected payload.
    #[error("{0} response carried no Response payload")]
    MalformedResponse(&'static str),

    /// The body was not the expected JSON.
    #[error("Failed to decode {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// Upstream HTTP status, if the error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

// =============================================================================
// BungieClient
// =============================================================================

/// Client for the Platform API endpoints the pipeline uses.
#[derive(Debug, Clone)]
pub struct BungieClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl BungieClient {
    pub fn new(http: HttpClient, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(http: HttpClient, config: &BungieConfig) -> Self {
        Self::new(http, &config.api_key, &config.api_base_url)
    }

    /// `GET /User/GetMembershipsById/{membership_id}/-1/`
    pub async fn get_memberships_by_id(
        &self,
        access_token: &str,
        membership_id: &str,
    ) -> Result<BungieEnvelope<UserMembershipData>, PipelineError> {
        let url = format!(
            "{}/User/GetMembershipsById/{}/{}/",
            self.base_url,
            urlencoding::encode(membership_id),
            MEMBERSHIP_TYPE_ALL
        );
        self.get("GetMembershipsById", &url, access_token).await
    }

    /// `GET /Destiny2/{membership_type}/Profile/{membership_id}/?components=...`
    pub async fn get_profile(
        &self,
        access_token: &str,
        membership: &MembershipRecord,
        components: &[u16],
    ) -> Result<BungieEnvelope<serde_json::Value>, PipelineError> {
        let components = components
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/Destiny2/{}/Profile/{}/?components={}",
            self.base_url,
            membership.membership_type,
            urlencoding::encode(&membership.membership_id),
            components
        );
        self.get("GetProfile", &url, access_token).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        access_token: &str,
    ) -> Result<BungieEnvelope<T>, PipelineError> {
        debug!(%operation, %url, "Platform request");
        let response = self
            .http
            .inner()
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .inspect_err(|e| error!(%operation, error = %e, "Platform request failed"))?;

        Self::read_envelope(operation, response).await
    }

    /// Read a response body exactly once, as text. Non-success bodies are
    /// never decoded.
    async fn read_envelope<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<BungieEnvelope<T>, PipelineError> {
        let status: StatusCode = response.status();

        if !status.is_success() {
            let body = response.text().await?;
            error!(
                %operation,
                status = status.as_u16(),
                body = %body,
                "Platform API error response"
            );
            return Err(PipelineError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(%operation, error = %e, "Undecodable Platform response");
            PipelineError::Decode {
                operation,
                message: e.to_string(),
            }
        })
    }
}
