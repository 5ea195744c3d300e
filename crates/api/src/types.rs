use serde::{Deserialize, Serialize};

use active_context_core::entity::{AuthOrganization, AuthTeam};

/// Organization detail record exposed on a populated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveOrganization {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
}

impl ActiveOrganization {
    pub fn from_entity(org: &impl AuthOrganization) -> Self {
        Self {
            id: org.id().to_string(),
            name: org.name().to_string(),
            slug: org.slug().to_string(),
            logo: org.logo().map(str::to_string),
        }
    }
}

/// Team detail record exposed on a populated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTeam {
    pub id: String,
    pub name: String,
    pub organization_id: String,
}

impl ActiveTeam {
    pub fn from_entity(team: &impl AuthTeam) -> Self {
        Self {
            id: team.id().to_string(),
            name: team.name().to_string(),
            organization_id: team.organization_id().to_string(),
        }
    }
}

/// Output of the resolver.
///
/// When both fields are set, `active_team.organization_id` equals
/// `active_organization.id`. A team is never present without an
/// organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedContext {
    pub active_organization: Option<ActiveOrganization>,
    pub active_team: Option<ActiveTeam>,
}

impl ResolvedContext {
    pub fn organization_id(&self) -> Option<&str> {
        self.active_organization.as_ref().map(|o| o.id.as_str())
    }

    pub fn team_id(&self) -> Option<&str> {
        self.active_team.as_ref().map(|t| t.id.as_str())
    }
}

/// A stored session with the resolved context merged in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedSession<S> {
    #[serde(flatten)]
    pub session: S,
    pub active_organization: Option<ActiveOrganization>,
    pub active_team: Option<ActiveTeam>,
}

/// Payload returned by the custom-session hook.
#[derive(Debug, Clone, Serialize)]
pub struct SessionPayload<U, S> {
    pub user: U,
    pub session: PopulatedSession<S>,
}

impl<U, S> SessionPayload<U, S> {
    pub fn context(&self) -> ResolvedContext {
        ResolvedContext {
            active_organization: self.session.active_organization.clone(),
            active_team: self.session.active_team.clone(),
        }
    }
}

/// Set active organization request.
///
/// Both fields absent clears the active organization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveOrganizationRequest {
    pub organization_id: Option<String>,
    pub organization_slug: Option<String>,
}

/// Set active team request. `teamId: null` clears the active team.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveTeamRequest {
    pub team_id: Option<String>,
}
