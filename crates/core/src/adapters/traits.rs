use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entity::{
    AuthMember, AuthOrganization, AuthSession, AuthTeam, AuthTeamMember, AuthUser,
};
use crate::error::ContextResult;
use crate::types::{
    CreateMember, CreateOrganization, CreateSession, CreateTeam, CreateTeamMember, CreateUser,
};

/// User persistence operations.
#[async_trait]
pub trait UserOps: Send + Sync + 'static {
    type User: AuthUser;

    async fn create_user(&self, user: CreateUser) -> ContextResult<Self::User>;
    async fn get_user_by_id(&self, id: &str) -> ContextResult<Option<Self::User>>;
}

/// Session persistence operations.
#[async_trait]
pub trait SessionOps: Send + Sync + 'static {
    type Session: AuthSession;

    async fn create_session(&self, session: CreateSession) -> ContextResult<Self::Session>;
    async fn get_session(&self, token: &str) -> ContextResult<Option<Self::Session>>;
    async fn update_session_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> ContextResult<()>;
    async fn delete_session(&self, token: &str) -> ContextResult<()>;
    /// Write both active ids in one update.
    async fn update_session_active_context(
        &self,
        token: &str,
        organization_id: Option<&str>,
        team_id: Option<&str>,
    ) -> ContextResult<Self::Session>;
}

/// Organization persistence operations.
#[async_trait]
pub trait OrganizationOps: Send + Sync + 'static {
    type Organization: AuthOrganization;

    async fn create_organization(
        &self,
        org: CreateOrganization,
    ) -> ContextResult<Self::Organization>;
    async fn get_organization_by_id(&self, id: &str) -> ContextResult<Option<Self::Organization>>;
    async fn get_organization_by_slug(
        &self,
        slug: &str,
    ) -> ContextResult<Option<Self::Organization>>;
    async fn delete_organization(&self, id: &str) -> ContextResult<()>;
}

/// Organization member persistence operations.
#[async_trait]
pub trait MemberOps: Send + Sync + 'static {
    type Member: AuthMember;

    /// Fails with `Conflict` when the (organization, user) pair already exists.
    async fn create_member(&self, member: CreateMember) -> ContextResult<Self::Member>;
    async fn get_member(
        &self,
        organization_id: &str,
        user_id: &str,
    ) -> ContextResult<Option<Self::Member>>;
    /// All memberships of a user, in the adapter's default order.
    async fn list_user_memberships(&self, user_id: &str) -> ContextResult<Vec<Self::Member>>;
    /// Fails with `BadRequest` when it would demote the last owner.
    async fn update_member_role(&self, member_id: &str, role: &str)
    -> ContextResult<Self::Member>;
    /// Fails with `BadRequest` when it would remove the last owner.
    async fn delete_member(&self, member_id: &str) -> ContextResult<()>;
    async fn count_organization_owners(&self, organization_id: &str) -> ContextResult<usize>;
}

/// Team persistence operations.
#[async_trait]
pub trait TeamOps: Send + Sync + 'static {
    type Team: AuthTeam;

    async fn create_team(&self, team: CreateTeam) -> ContextResult<Self::Team>;
    async fn get_team_by_id(&self, id: &str) -> ContextResult<Option<Self::Team>>;
    /// Teams of an organization, oldest first.
    async fn list_organization_teams(
        &self,
        organization_id: &str,
    ) -> ContextResult<Vec<Self::Team>>;
    async fn delete_team(&self, id: &str) -> ContextResult<()>;
}

/// Team membership persistence operations.
#[async_trait]
pub trait TeamMemberOps: Send + Sync + 'static {
    type TeamMember: AuthTeamMember;

    /// Fails with `Conflict` when the (team, user) pair already exists.
    async fn create_team_member(
        &self,
        member: CreateTeamMember,
    ) -> ContextResult<Self::TeamMember>;
    async fn get_team_member(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> ContextResult<Option<Self::TeamMember>>;
    /// All team memberships of a user, in the adapter's default order.
    async fn list_user_team_memberships(
        &self,
        user_id: &str,
    ) -> ContextResult<Vec<Self::TeamMember>>;
}

