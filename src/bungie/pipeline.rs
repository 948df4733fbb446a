//! Profile retrieval pipeline.
//!
//! Two strictly sequential calls: resolve the signed-in account's Destiny
//! memberships, then fetch the profile of the first one. Each run reads the
//! stored credentials once and derives the membership afresh.

use std::fmt;
use std::sync::RwLock;

use tracing::{debug, error, info, warn};

use super::types::{MembershipRecord, ProfileSnapshot};
use super::{BungieClient, PROFILE_COMPONENTS, PipelineError};
use crate::storage::Session;

/// Stage a pipeline run has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    ResolvingMembership,
    FetchingProfile,
    Completed,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::ResolvingMembership => "resolving_membership",
            Self::FetchingProfile => "fetching_profile",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Membership lookup followed by profile fetch.
///
/// Runs may overlap. Intermediate stages are logged, never stored, and
/// `last_state` holds the outcome of whichever run finished last.
pub struct ProfilePipeline {
    client: BungieClient,
    last_state: RwLock<PipelineState>,
}

impl fmt::Debug for ProfilePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilePipeline")
            .field("client", &self.client)
            .field("last_state", &self.last_state())
            .finish()
    }
}

impl ProfilePipeline {
    pub fn new(client: BungieClient) -> Self {
        Self {
            client,
            last_state: RwLock::new(PipelineState::Idle),
        }
    }

    /// Outcome of the most recently finished run: `Idle` before any run,
    /// then `Completed` or `Failed`.
    pub fn last_state(&self) -> PipelineState {
        *self.last_state.read().expect("lock poisoned")
    }

    fn transition(&self, state: PipelineState) {
        debug!(%state, "Pipeline transition");
    }

    fn finish(&self, state: PipelineState) {
        self.transition(state);
        *self.last_state.write().expect("lock poisoned") = state;
    }

    /// Run the pipeline against the credentials stored in `session`.
    ///
    /// No request is made without stored credentials. Every failure ends the
    /// run; nothing is retried.
    pub async fn run(&self, session: &Session) -> Result<ProfileSnapshot, PipelineError> {
        let result = self.run_inner(session).await;
        match &result {
            Ok(_) => self.finish(PipelineState::Completed),
            Err(e) => {
                error!(error = %e, "Profile retrieval failed");
                self.finish(PipelineState::Failed);
            }
        }
        result
    }

    async fn run_inner(&self, session: &Session) -> Result<ProfileSnapshot, PipelineError> {
        let (Some(access_token), Some(membership_id)) =
            (session.access_token()?, session.membership_id()?)
        else {
            return Err(PipelineError::MissingCredentials);
        };

        self.transition(PipelineState::ResolvingMembership);
        let membership = self.resolve_membership(&access_token, &membership_id).await?;

        self.transition(PipelineState::FetchingProfile);
        let envelope = self
            .client
            .get_profile(&access_token, &membership, &PROFILE_COMPONENTS)
            .await?;
        let Some(response) = envelope.response else {
            warn!(
                error_code = envelope.error_code,
                error_status = ?envelope.error_status,
                message = ?envelope.message,
                "Profile response carried no payload"
            );
            return Err(PipelineError::MalformedResponse("GetProfile"));
        };

        info!(
            membership_type = %membership.membership_type,
            membership_id = %membership.membership_id,
            "Profile retrieved"
        );
        Ok(ProfileSnapshot { response })
    }

    /// Resolve the first linked Destiny membership of `membership_id`.
    async fn resolve_membership(
        &self,
        access_token: &str,
        membership_id: &str,
    ) -> Result<MembershipRecord, PipelineError> {
        let envelope = self
            .client
            .get_memberships_by_id(access_token, membership_id)
            .await?;

        let Some(data) = envelope.response else {
            warn!(
                error_code = envelope.error_code,
                error_status = ?envelope.error_status,
                message = ?envelope.message,
                "Membership response carried no payload"
            );
            return Err(PipelineError::NoLinkedProfiles);
        };
        let first = data
            .destiny_memberships
            .into_iter()
            .next()
            .ok_or(PipelineError::NoLinkedProfiles)?;

        let record = MembershipRecord::from(first);
        debug!(
            membership_type = %record.membership_type,
            membership_id = %record.membership_id,
            "Resolved Destiny membership"
        );
        Ok(record)
    }
}
