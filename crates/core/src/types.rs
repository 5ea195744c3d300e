use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export organization types
pub use super::types_org::{
    CreateMember, CreateOrganization, CreateTeam, CreateTeamMember, Invitation, InvitationStatus,
    Member, MemberRole, Organization, Team, TeamMember,
};

/// Core user type.
///
/// Only the fields the active-context layer reads are modelled here; the
/// remaining user lifecycle belongs to the authentication framework.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Session record carrying the persisted active-context ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    pub token: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "activeOrganizationId")]
    pub active_organization_id: Option<String>,
    #[serde(rename = "activeTeamId")]
    pub active_team_id: Option<String>,
    // Keep active field for internal use but don't serialize
    #[serde(skip)]
    pub active: bool,
}

/// User creation data
#[derive(Debug, Clone, Default)]
pub struct CreateUser {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl CreateUser {
    pub fn new() -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Session creation data
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub active_organization_id: Option<String>,
    pub active_team_id: Option<String>,
}

impl CreateSession {
    pub fn new(user_id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            expires_at,
            active_organization_id: None,
            active_team_id: None,
        }
    }

    pub fn with_active_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.active_organization_id = Some(organization_id.into());
        self
    }

    pub fn with_active_team(mut self, team_id: impl Into<String>) -> Self {
        self.active_team_id = Some(team_id.into());
        self
    }
}
