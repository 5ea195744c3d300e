//! In-process server surface for [`ActiveTeamMirror`](active_context_client::ActiveTeamMirror).

use async_trait::async_trait;

use active_context_api::SetActiveTeamRequest;
use active_context_client::{ClientError, TeamSessionApi, TeamSummary};
use active_context_core::{AuthTeam, ContextError, DatabaseAdapter};

use crate::core::ActiveContext;

/// [`TeamSessionApi`] that calls an [`ActiveContext`] directly on behalf of
/// one session token. Server errors surface as [`ClientError::Status`].
pub struct LocalTeamSessionApi<DB: DatabaseAdapter> {
    context: ActiveContext<DB>,
    token: String,
}

impl<DB: DatabaseAdapter> LocalTeamSessionApi<DB> {
    pub fn new(context: ActiveContext<DB>, token: impl Into<String>) -> Self {
        Self {
            context,
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

fn to_client_error(err: ContextError) -> ClientError {
    ClientError::Status {
        status: err.status_code(),
        message: err.public_message(),
    }
}

#[async_trait]
impl<DB: DatabaseAdapter> TeamSessionApi for LocalTeamSessionApi<DB> {
    async fn list_teams(&self, organization_id: &str) -> Result<Vec<TeamSummary>, ClientError> {
        let teams = self
            .context
            .list_organization_teams(&self.token, Some(organization_id))
            .await
            .map_err(to_client_error)?;

        Ok(teams
            .iter()
            .map(|team| TeamSummary {
                id: team.id().to_string(),
                name: team.name().to_string(),
                organization_id: team.organization_id().to_string(),
            })
            .collect())
    }

    async fn set_active_team(&self, team_id: Option<&str>) -> Result<(), ClientError> {
        let body = SetActiveTeamRequest {
            team_id: team_id.map(str::to_string),
        };
        self.context
            .set_active_team(&self.token, &body)
            .await
            .map_err(to_client_error)?;
        Ok(())
    }
}
