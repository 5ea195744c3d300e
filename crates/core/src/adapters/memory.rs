use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::entity::{
    AuthMember, AuthOrganization, AuthSession, AuthTeam, AuthTeamMember, AuthUser,
};
use crate::error::{ContextError, ContextResult};
use crate::types::{
    CreateMember, CreateOrganization, CreateSession, CreateTeam, CreateTeamMember, CreateUser,
    Member, MemberRole, Organization, Session, Team, TeamMember, User,
};

pub use super::memory_traits::{
    MemoryMember, MemoryOrganization, MemorySession, MemoryTeam, MemoryTeamMember, MemoryUser,
};

use super::traits::{MemberOps, OrganizationOps, SessionOps, TeamMemberOps, TeamOps, UserOps};

/// In-memory database adapter for testing and development.
///
/// Generic over entity types. Use the default type parameters for the
/// built-in types, or supply your own structs implementing the `Memory*`
/// traits.
///
/// Membership tables are kept in insertion order, which is the order
/// [`SelectionOrder::Storage`](crate::config::SelectionOrder::Storage)
/// observes.
///
/// ```rust,ignore
/// let adapter = MemoryDatabaseAdapter::new();
///
/// let adapter = MemoryDatabaseAdapter::<MyUser, MySession, MyOrg, MyMember,
///     MyTeam, MyTeamMember>::default();
/// ```
pub struct MemoryDatabaseAdapter<
    U = User,
    S = Session,
    O = Organization,
    M = Member,
    T = Team,
    TM = TeamMember,
> {
    users: Arc<Mutex<HashMap<String, U>>>,
    sessions: Arc<Mutex<HashMap<String, S>>>,
    organizations: Arc<Mutex<HashMap<String, O>>>,
    slug_index: Arc<Mutex<HashMap<String, String>>>,
    members: Arc<Mutex<Vec<M>>>,
    teams: Arc<Mutex<Vec<T>>>,
    team_members: Arc<Mutex<Vec<TM>>>,
}

/// Constructor for the default (built-in) entity types.
/// Use `Default::default()` for custom type parameterizations.
impl MemoryDatabaseAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<U, S, O, M, T, TM> Default for MemoryDatabaseAdapter<U, S, O, M, T, TM> {
    fn default() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            organizations: Arc::new(Mutex::new(HashMap::new())),
            slug_index: Arc::new(Mutex::new(HashMap::new())),
            members: Arc::new(Mutex::new(Vec::new())),
            teams: Arc::new(Mutex::new(Vec::new())),
            team_members: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<U, S, O, M, T, TM> Clone for MemoryDatabaseAdapter<U, S, O, M, T, TM> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            sessions: Arc::clone(&self.sessions),
            organizations: Arc::clone(&self.organizations),
            slug_index: Arc::clone(&self.slug_index),
            members: Arc::clone(&self.members),
            teams: Arc::clone(&self.teams),
            team_members: Arc::clone(&self.team_members),
        }
    }
}

fn lock<T>(table: &Mutex<T>) -> ContextResult<MutexGuard<'_, T>> {
    table
        .lock()
        .map_err(|_| ContextError::internal("in-memory table lock poisoned"))
}

fn is_owner<M: MemoryMember>(member: &M) -> bool {
    MemberRole::holds(member.role(), MemberRole::Owner)
}

// -- UserOps --

#[async_trait]
impl<U, S, O, M, T, TM> UserOps for MemoryDatabaseAdapter<U, S, O, M, T, TM>
where
    U: MemoryUser,
    S: MemorySession,
    O: MemoryOrganization,
    M: MemoryMember,
    T: MemoryTeam,
    TM: MemoryTeamMember,
{
    type User = U;

    async fn create_user(&self, create_user: CreateUser) -> ContextResult<U> {
        let mut users = lock(&self.users)?;

        let id = create_user
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if users.contains_key(&id) {
            return Err(ContextError::conflict("A user with this id already exists"));
        }
        if let Some(email) = &create_user.email
            && users.values().any(|u| u.email() == Some(email.as_str()))
        {
            return Err(ContextError::conflict("A user with this email already exists"));
        }

        let user = U::from_create(id.clone(), &create_user, Utc::now());
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> ContextResult<Option<U>> {
        Ok(lock(&self.users)?.get(id).cloned())
    }
}

// -- SessionOps --

#[async_trait]
impl<U, S, O, M, T, TM> SessionOps for MemoryDatabaseAdapter<U, S, O, M, T, TM>
where
    U: MemoryUser,
    S: MemorySession,
    O: MemoryOrganization,
    M: MemoryMember,
    T: MemoryTeam,
    TM: MemoryTeamMember,
{
    type Session = S;

    async fn create_session(&self, create_session: CreateSession) -> ContextResult<S> {
        let mut sessions = lock(&self.sessions)?;

        let id = Uuid::new_v4().to_string();
        let token = format!("session_{}", Uuid::new_v4());
        let session = S::from_create(id, token.clone(), &create_session, Utc::now());

        sessions.insert(token, session.clone());
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> ContextResult<Option<S>> {
        Ok(lock(&self.sessions)?.get(token).cloned())
    }

    async fn update_session_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> ContextResult<()> {
        let mut sessions = lock(&self.sessions)?;
        if let Some(session) = sessions.get_mut(token) {
            session.set_expires_at(expires_at);
            session.set_updated_at(Utc::now());
        }
        Ok(())
    }

    async fn delete_session(&self, token: &str) -> ContextResult<()> {
        lock(&self.sessions)?.remove(token);
        Ok(())
    }


    async fn update_session_active_context(
        &self,
        token: &str,
        organization_id: Option<&str>,
        team_id: Option<&str>,
    ) -> ContextResult<S> {
        let mut sessions = lock(&self.sessions)?;
        let session = sessions
            .get_mut(token)
            .ok_or(ContextError::SessionNotFound)?;
        session.set_active_organization_id(organization_id.map(str::to_string));
        session.set_active_team_id(team_id.map(str::to_string));
        session.set_updated_at(Utc::now());
        Ok(session.clone())
    }
}

// -- OrganizationOps --

#[async_trait]
impl<U, S, O, M, T, TM> OrganizationOps for MemoryDatabaseAdapter<U, S, O, M, T, TM>
where
    U: MemoryUser,
    S: MemorySession,
    O: MemoryOrganization,
    M: MemoryMember,
    T: MemoryTeam,
    TM: MemoryTeamMember,
{
    type Organization = O;

    async fn create_organization(&self, create_org: CreateOrganization) -> ContextResult<O> {
        let mut organizations = lock(&self.organizations)?;
        let mut slug_index = lock(&self.slug_index)?;

        if slug_index.contains_key(&create_org.slug) {
            return Err(ContextError::conflict("Organization slug already exists"));
        }

        let id = create_org
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let organization = O::from_create(id.clone(), &create_org, Utc::now());

        organizations.insert(id.clone(), organization.clone());
        slug_index.insert(create_org.slug, id);

        Ok(organization)
    }

    async fn get_organization_by_id(&self, id: &str) -> ContextResult<Option<O>> {
        Ok(lock(&self.organizations)?.get(id).cloned())
    }

    async fn get_organization_by_slug(&self, slug: &str) -> ContextResult<Option<O>> {
        let org_id = lock(&self.slug_index)?.get(slug).cloned();
        match org_id {
            Some(id) => Ok(lock(&self.organizations)?.get(&id).cloned()),
            None => Ok(None),
        }
    }

    async fn delete_organization(&self, id: &str) -> ContextResult<()> {
        if let Some(org) = lock(&self.organizations)?.remove(id) {
            lock(&self.slug_index)?.remove(org.slug());
        }

        let mut teams = lock(&self.teams)?;
        let removed: Vec<String> = teams
            .iter()
            .filter(|t| t.organization_id() == id)
            .map(|t| t.id().to_string())
            .collect();
        teams.retain(|t| t.organization_id() != id);
        drop(teams);

        lock(&self.team_members)?.retain(|tm| !removed.iter().any(|t| t == tm.team_id()));
        lock(&self.members)?.retain(|m| m.organization_id() != id);

        Ok(())
    }
}

// -- MemberOps --

#[async_trait]
impl<U, S, O, M, T, TM> MemberOps for MemoryDatabaseAdapter<U, S, O, M, T, TM>
where
    U: MemoryUser,
    S: MemorySession,
    O: MemoryOrganization,
    M: MemoryMember,
    T: MemoryTeam,
    TM: MemoryTeamMember,
{
    type Member = M;

    async fn create_member(&self, create_member: CreateMember) -> ContextResult<M> {
        if !lock(&self.organizations)?.contains_key(&create_member.organization_id) {
            return Err(ContextError::not_found("Organization not found"));
        }

        let mut members = lock(&self.members)?;

        let exists = members.iter().any(|m| {
            m.organization_id() == create_member.organization_id
                && m.user_id() == create_member.user_id
        });
        if exists {
            return Err(ContextError::conflict(
                "User is already a member of this organization",
            ));
        }

        let id = Uuid::new_v4().to_string();
        let member = M::from_create(id, &create_member, Utc::now());

        members.push(member.clone());
        Ok(member)
    }

    async fn get_member(&self, organization_id: &str, user_id: &str) -> ContextResult<Option<M>> {
        Ok(lock(&self.members)?
            .iter()
            .find(|m| m.organization_id() == organization_id && m.user_id() == user_id)
            .cloned())
    }

    async fn list_user_memberships(&self, user_id: &str) -> ContextResult<Vec<M>> {
        Ok(lock(&self.members)?
            .iter()
            .filter(|m| m.user_id() == user_id)
            .cloned()
            .collect())
    }


    async fn update_member_role(&self, member_id: &str, role: &str) -> ContextResult<M> {
        let mut members = lock(&self.members)?;

        let index = members
            .iter()
            .position(|m| m.id() == member_id)
            .ok_or_else(|| ContextError::not_found("Member not found"))?;

        let demotes_owner =
            is_owner(&members[index]) && !MemberRole::holds(role, MemberRole::Owner);
        if demotes_owner {
            let org_id = members[index].organization_id().to_string();
            let owners = members
                .iter()
                .filter(|m| m.organization_id() == org_id && is_owner(*m))
                .count();
            if owners <= 1 {
                return Err(ContextError::bad_request(
                    "Cannot demote the last owner of an organization",
                ));
            }
        }

        members[index].set_role(role.to_string());
        Ok(members[index].clone())
    }

    async fn delete_member(&self, member_id: &str) -> ContextResult<()> {
        let mut members = lock(&self.members)?;

        let Some(index) = members.iter().position(|m| m.id() == member_id) else {
            return Ok(());
        };

        if is_owner(&members[index]) {
            let org_id = members[index].organization_id().to_string();
            let owners = members
                .iter()
                .filter(|m| m.organization_id() == org_id && is_owner(*m))
                .count();
            if owners <= 1 {
                return Err(ContextError::bad_request(
                    "Cannot remove the last owner of an organization",
                ));
            }
        }

        members.remove(index);
        Ok(())
    }

    async fn count_organization_owners(&self, organization_id: &str) -> ContextResult<usize> {
        Ok(lock(&self.members)?
            .iter()
            .filter(|m| m.organization_id() == organization_id && is_owner(*m))
            .count())
    }
}

// -- TeamOps --

#[async_trait]
impl<U, S, O, M, T, TM> TeamOps for MemoryDatabaseAdapter<U, S, O, M, T, TM>
where
    U: MemoryUser,
    S: MemorySession,
    O: MemoryOrganization,
    M: MemoryMember,
    T: MemoryTeam,
    TM: MemoryTeamMember,
{
    type Team = T;

    async fn create_team(&self, create_team: CreateTeam) -> ContextResult<T> {
        if !lock(&self.organizations)?.contains_key(&create_team.organization_id) {
            return Err(ContextError::not_found("Organization not found"));
        }

        let mut teams = lock(&self.teams)?;
        let id = create_team
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if teams.iter().any(|t| t.id() == id) {
            return Err(ContextError::conflict("A team with this id already exists"));
        }

        let team = T::from_create(id, &create_team, Utc::now());
        teams.push(team.clone());
        Ok(team)
    }

    async fn get_team_by_id(&self, id: &str) -> ContextResult<Option<T>> {
        Ok(lock(&self.teams)?.iter().find(|t| t.id() == id).cloned())
    }

    async fn list_organization_teams(&self, organization_id: &str) -> ContextResult<Vec<T>> {
        let mut teams: Vec<T> = lock(&self.teams)?
            .iter()
            .filter(|t| t.organization_id() == organization_id)
            .cloned()
            .collect();
        teams.sort_by_key(|t| t.created_at());
        Ok(teams)
    }

    async fn delete_team(&self, id: &str) -> ContextResult<()> {
        lock(&self.teams)?.retain(|t| t.id() != id);
        lock(&self.team_members)?.retain(|tm| tm.team_id() != id);
        Ok(())
    }
}

// -- TeamMemberOps --

#[async_trait]
impl<U, S, O, M, T, TM> TeamMemberOps for MemoryDatabaseAdapter<U, S, O, M, T, TM>
where
    U: MemoryUser,
    S: MemorySession,
    O: MemoryOrganization,
    M: MemoryMember,
    T: MemoryTeam,
    TM: MemoryTeamMember,
{
    type TeamMember = TM;

    async fn create_team_member(&self, create: CreateTeamMember) -> ContextResult<TM> {
        if !lock(&self.teams)?.iter().any(|t| t.id() == create.team_id) {
            return Err(ContextError::not_found("Team not found"));
        }

        let mut team_members = lock(&self.team_members)?;
        let exists = team_members
            .iter()
            .any(|tm| tm.team_id() == create.team_id && tm.user_id() == create.user_id);
        if exists {
            return Err(ContextError::conflict("User is already a member of this team"));
        }

        let id = Uuid::new_v4().to_string();
        let team_member = TM::from_create(id, &create, Utc::now());
        team_members.push(team_member.clone());
        Ok(team_member)
    }

    async fn get_team_member(&self, team_id: &str, user_id: &str) -> ContextResult<Option<TM>> {
        Ok(lock(&self.team_members)?
            .iter()
            .find(|tm| tm.team_id() == team_id && tm.user_id() == user_id)
            .cloned())
    }

    async fn list_user_team_memberships(&self, user_id: &str) -> ContextResult<Vec<TM>> {
        Ok(lock(&self.team_members)?
            .iter()
            .filter(|tm| tm.user_id() == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn org_with_owner(db: &MemoryDatabaseAdapter, slug: &str, owner: &str) -> Organization {
        let org = db
            .create_organization(CreateOrganization::new(slug, slug))
            .await
            .unwrap();
        db.create_member(CreateMember::new(&org.id, owner, MemberRole::Owner))
            .await
            .unwrap();
        org
    }

    #[tokio::test]
    async fn test_memberships_keep_insertion_order() {
        let db = MemoryDatabaseAdapter::new();
        let b = org_with_owner(&db, "b", "someone").await;
        let a = org_with_owner(&db, "a", "someone-else").await;

        db.create_member(CreateMember::new(&b.id, "u1", MemberRole::Member))
            .await
            .unwrap();
        db.create_member(CreateMember::new(&a.id, "u1", MemberRole::Member))
            .await
            .unwrap();

        let orgs: Vec<String> = db
            .list_user_memberships("u1")
            .await
            .unwrap()
            .iter()
            .map(|m| m.organization_id().to_string())
            .collect();
        assert_eq!(orgs, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_duplicate_membership_conflicts() {
        let db = MemoryDatabaseAdapter::new();
        let org = org_with_owner(&db, "acme", "u1").await;

        let err = db
            .create_member(CreateMember::new(&org.id, "u1", MemberRole::Admin))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);

        let team = db.create_team(CreateTeam::new(&org.id, "core")).await.unwrap();
        db.create_team_member(CreateTeamMember::new(&team.id, "u1"))
            .await
            .unwrap();
        let err = db
            .create_team_member(CreateTeamMember::new(&team.id, "u1"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_last_owner_is_protected() {
        let db = MemoryDatabaseAdapter::new();
        let org = org_with_owner(&db, "acme", "u1").await;
        let owner = db.get_member(&org.id, "u1").await.unwrap().unwrap();

        assert!(db.update_member_role(&owner.id, "admin").await.is_err());
        assert!(db.delete_member(&owner.id).await.is_err());

        let second = db
            .create_member(CreateMember::new(&org.id, "u2", MemberRole::Owner))
            .await
            .unwrap();
        db.update_member_role(&owner.id, "admin").await.unwrap();
        assert_eq!(db.count_organization_owners(&org.id).await.unwrap(), 1);
        assert!(db.delete_member(&second.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_organization_cascades() {
        let db = MemoryDatabaseAdapter::new();
        let org = org_with_owner(&db, "acme", "u1").await;
        let team = db.create_team(CreateTeam::new(&org.id, "core")).await.unwrap();
        db.create_team_member(CreateTeamMember::new(&team.id, "u1"))
            .await
            .unwrap();

        db.delete_organization(&org.id).await.unwrap();

        assert!(db.get_organization_by_slug("acme").await.unwrap().is_none());
        assert!(db.get_team_by_id(team.id()).await.unwrap().is_none());
        assert!(db.list_user_memberships("u1").await.unwrap().is_empty());
        assert!(db.list_user_team_memberships("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_session_active_context() {
        let db = MemoryDatabaseAdapter::new();
        let session = db
            .create_session(CreateSession::new("u1", Utc::now() + Duration::hours(1)))
            .await
            .unwrap();

        let updated = db
            .update_session_active_context(session.token(), Some("org"), Some("team"))
            .await
            .unwrap();
        assert_eq!(updated.active_organization_id(), Some("org"));
        assert_eq!(updated.active_team_id(), Some("team"));

        let cleared = db
            .update_session_active_context(session.token(), Some("org"), None)
            .await
            .unwrap();
        assert_eq!(cleared.active_organization_id(), Some("org"));
        assert_eq!(cleared.active_team_id(), None);

        let err = db
            .update_session_active_context("missing", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::SessionNotFound));
    }
}
