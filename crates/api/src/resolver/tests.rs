use super::*;
use active_context_core::adapters::{
    MemberOps, MemoryDatabaseAdapter, OrganizationOps, SessionOps, TeamMemberOps, TeamOps,
    UserOps,
};
use active_context_core::config::SelectionOrder;
use active_context_core::error::{ContextError, DatabaseError};
use active_context_core::logger::Logger;
use active_context_core::types::{
    CreateMember, CreateOrganization, CreateSession, CreateTeam, CreateTeamMember, CreateUser,
    Member, MemberRole, Organization, Session, Team, TeamMember, User,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingLogger {
    warnings: Mutex<Vec<String>>,
}

impl Logger for RecordingLogger {
    fn info(&self, _message: &str) {}
    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
    fn error(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
}

struct Fixture {
    db: MemoryDatabaseAdapter,
    user: User,
}

impl Fixture {
    async fn new() -> Self {
        let db = MemoryDatabaseAdapter::new();
        let user = db
            .create_user(CreateUser::new().with_id("u1").with_email("u1@example.com"))
            .await
            .unwrap();
        Self { db, user }
    }

    async fn org(&self, id: &str) -> Organization {
        self.db
            .create_organization(CreateOrganization::new(id, id).with_id(id))
            .await
            .unwrap()
    }

    async fn join(&self, org: &str, role: MemberRole) -> Member {
        self.db
            .create_member(CreateMember::new(org, &self.user.id, role))
            .await
            .unwrap()
    }

    async fn team(&self, org: &str, id: &str) -> Team {
        self.db
            .create_team(CreateTeam::new(org, id).with_id(id))
            .await
            .unwrap()
    }

    async fn join_team(&self, team: &str) -> TeamMember {
        self.db
            .create_team_member(CreateTeamMember::new(team, &self.user.id))
            .await
            .unwrap()
    }

    async fn session(&self, org: Option<&str>, team: Option<&str>) -> Session {
        let mut create = CreateSession::new(&self.user.id, Utc::now() + Duration::hours(1));
        if let Some(org) = org {
            create = create.with_active_organization(org);
        }
        if let Some(team) = team {
            create = create.with_active_team(team);
        }
        self.db.create_session(create).await.unwrap()
    }

    async fn resolve(&self, session: &Session, config: &ContextConfig) -> ResolvedContext {
        resolve_active_context(&self.user, session, &self.db, config).await
    }
}

#[tokio::test]
async fn test_single_org_without_teams() {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.join("org_a", MemberRole::Member).await;

    let session = fx.session(None, None).await;
    let resolved = fx.resolve(&session, &ContextConfig::default()).await;

    assert_eq!(resolved.organization_id(), Some("org_a"));
    assert_eq!(resolved.active_team, None);
}

#[tokio::test]
async fn test_single_org_single_team() {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.join("org_a", MemberRole::Member).await;
    fx.team("org_a", "t1").await;
    fx.join_team("t1").await;

    let session = fx.session(None, None).await;
    let resolved = fx.resolve(&session, &ContextConfig::default()).await;

    assert_eq!(resolved.organization_id(), Some("org_a"));
    let team = resolved.active_team.unwrap();
    assert_eq!(team.id, "t1");
    assert_eq!(team.organization_id, "org_a");
}

#[tokio::test]
async fn test_no_memberships_resolves_to_nulls() {
    let fx = Fixture::new().await;
    let session = fx.session(None, None).await;

    let resolved = fx.resolve(&session, &ContextConfig::default()).await;
    assert_eq!(resolved, ResolvedContext::default());
}

#[tokio::test]
async fn test_first_membership_wins_with_teams_disabled() {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.org("org_b").await;
    fx.join("org_a", MemberRole::Owner).await;
    fx.join("org_b", MemberRole::Member).await;

    let config = ContextConfig::new().teams_enabled(false);
    let session = fx.session(None, None).await;
    let resolved = fx.resolve(&session, &config).await;

    assert_eq!(resolved.organization_id(), Some("org_a"));
    assert_eq!(resolved.active_team, None);
}

#[tokio::test]
async fn test_team_only_adopts_owning_org() {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.join("org_a", MemberRole::Member).await;
    fx.team("org_a", "t1").await;
    fx.join_team("t1").await;

    let session = fx.session(None, Some("t1")).await;
    let resolved = fx.resolve(&session, &ContextConfig::default()).await;

    assert_eq!(resolved.organization_id(), Some("org_a"));
    assert_eq!(resolved.team_id(), Some("t1"));

    // Re-resolving the filled-in pair is a fixed point.
    let filled = fx.session(Some("org_a"), Some("t1")).await;
    assert_eq!(fx.resolve(&filled, &ContextConfig::default()).await, resolved);
}

#[tokio::test]
async fn test_picks_the_team_the_user_joined() {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.join("org_a", MemberRole::Member).await;
    fx.team("org_a", "t1").await;
    fx.team("org_a", "t2").await;
    fx.join_team("t2").await;

    let session = fx.session(Some("org_a"), None).await;
    let resolved = fx.resolve(&session, &ContextConfig::default()).await;

    assert_eq!(resolved.team_id(), Some("t2"));
}

#[tokio::test]
async fn test_team_from_other_org_is_ignored() {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.org("org_b").await;
    fx.join("org_a", MemberRole::Member).await;
    fx.join("org_b", MemberRole::Member).await;
    fx.team("org_b", "tb").await;
    fx.join_team("tb").await;

    let session = fx.session(Some("org_a"), None).await;
    let resolved = fx.resolve(&session, &ContextConfig::default()).await;

    assert_eq!(resolved.organization_id(), Some("org_a"));
    assert_eq!(resolved.active_team, None);

    // Mismatched pair stored on the session.
    let session = fx.session(Some("org_a"), Some("tb")).await;
    let resolved = fx.resolve(&session, &ContextConfig::default()).await;
    assert_eq!(resolved.organization_id(), Some("org_a"));
    assert_eq!(resolved.active_team, None);
}

#[tokio::test]
async fn test_non_member_org_leaks_nothing() {
    let fx = Fixture::new().await;
    fx.org("foreign").await;
    fx.team("foreign", "ft").await;
    // Team row without an organization membership.
    fx.join_team("ft").await;

    let session = fx.session(Some("foreign"), None).await;
    let resolved = fx.resolve(&session, &ContextConfig::default()).await;

    assert_eq!(resolved, ResolvedContext::default());
}

#[tokio::test]
async fn test_deleted_references_resolve_to_null() {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.join("org_a", MemberRole::Owner).await;
    fx.team("org_a", "t1").await;
    fx.join_team("t1").await;

    let session = fx.session(Some("org_a"), Some("t1")).await;
    fx.db.delete_team("t1").await.unwrap();
    let resolved = fx.resolve(&session, &ContextConfig::default()).await;
    assert_eq!(resolved.organization_id(), Some("org_a"));
    assert_eq!(resolved.active_team, None);

    fx.db.delete_organization("org_a").await.unwrap();
    let resolved = fx.resolve(&session, &ContextConfig::default()).await;
    assert_eq!(resolved, ResolvedContext::default());

    let dangling = fx.session(None, Some("gone")).await;
    let resolved = fx.resolve(&dangling, &ContextConfig::default()).await;
    assert_eq!(resolved, ResolvedContext::default());
}

#[tokio::test]
async fn test_teams_disabled_ignores_stored_team() {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.join("org_a", MemberRole::Member).await;
    fx.team("org_a", "t1").await;
    fx.join_team("t1").await;

    let config = ContextConfig::new().teams_enabled(false);
    let session = fx.session(None, Some("t1")).await;
    let resolved = fx.resolve(&session, &config).await;

    assert_eq!(resolved.organization_id(), Some("org_a"));
    assert_eq!(resolved.active_team, None);
}

#[tokio::test]
async fn test_selection_order_is_configurable() {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.org("org_b").await;
    fx.join("org_a", MemberRole::Member).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    fx.join("org_b", MemberRole::Member).await;

    let session = fx.session(None, None).await;

    let oldest = fx.resolve(&session, &ContextConfig::default()).await;
    assert_eq!(oldest.organization_id(), Some("org_a"));

    let newest = ContextConfig::new().selection_order(SelectionOrder::NewestFirst);
    assert_eq!(
        fx.resolve(&session, &newest).await.organization_id(),
        Some("org_b")
    );
}

// -- Failure handling --

/// Wraps the memory adapter and fails the lookups selected by `fail`.
struct FlakyStore {
    inner: MemoryDatabaseAdapter,
    fail: &'static [&'static str],
    calls: AtomicUsize,
}

impl FlakyStore {
    fn check(&self, op: &str) -> ContextResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.contains(&op) {
            return Err(ContextError::from(DatabaseError::Connection(format!(
                "{} unavailable",
                op
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationOps for FlakyStore {
    type Organization = Organization;

    async fn create_organization(&self, org: CreateOrganization) -> ContextResult<Organization> {
        self.inner.create_organization(org).await
    }
    async fn get_organization_by_id(&self, id: &str) -> ContextResult<Option<Organization>> {
        self.check("get_organization_by_id")?;
        self.inner.get_organization_by_id(id).await
    }
    async fn get_organization_by_slug(&self, slug: &str) -> ContextResult<Option<Organization>> {
        self.inner.get_organization_by_slug(slug).await
    }
    async fn delete_organization(&self, id: &str) -> ContextResult<()> {
        self.inner.delete_organization(id).await
    }
}

#[async_trait]
impl MemberOps for FlakyStore {
    type Member = Member;

    async fn create_member(&self, member: CreateMember) -> ContextResult<Member> {
        self.inner.create_member(member).await
    }
    async fn get_member(&self, org: &str, user: &str) -> ContextResult<Option<Member>> {
        self.check("get_member")?;
        self.inner.get_member(org, user).await
    }
    async fn list_user_memberships(&self, user_id: &str) -> ContextResult<Vec<Member>> {
        self.check("list_user_memberships")?;
        self.inner.list_user_memberships(user_id).await
    }
    async fn update_member_role(&self, id: &str, role: &str) -> ContextResult<Member> {
        self.inner.update_member_role(id, role).await
    }
    async fn delete_member(&self, id: &str) -> ContextResult<()> {
        self.inner.delete_member(id).await
    }
    async fn count_organization_owners(&self, org: &str) -> ContextResult<usize> {
        self.inner.count_organization_owners(org).await
    }
}

#[async_trait]
impl TeamOps for FlakyStore {
    type Team = Team;

    async fn create_team(&self, team: CreateTeam) -> ContextResult<Team> {
        self.inner.create_team(team).await
    }
    async fn get_team_by_id(&self, id: &str) -> ContextResult<Option<Team>> {
        self.check("get_team_by_id")?;
        self.inner.get_team_by_id(id).await
    }
    async fn list_organization_teams(&self, org: &str) -> ContextResult<Vec<Team>> {
        self.check("list_organization_teams")?;
        self.inner.list_organization_teams(org).await
    }
    async fn delete_team(&self, id: &str) -> ContextResult<()> {
        self.inner.delete_team(id).await
    }
}

#[async_trait]
impl TeamMemberOps for FlakyStore {
    type TeamMember = TeamMember;

    async fn create_team_member(&self, member: CreateTeamMember) -> ContextResult<TeamMember> {
        self.inner.create_team_member(member).await
    }
    async fn get_team_member(&self, team: &str, user: &str) -> ContextResult<Option<TeamMember>> {
        self.check("get_team_member")?;
        self.inner.get_team_member(team, user).await
    }
    async fn list_user_team_memberships(&self, user: &str) -> ContextResult<Vec<TeamMember>> {
        self.check("list_user_team_memberships")?;
        self.inner.list_user_team_memberships(user).await
    }
}

async fn flaky(fail: &'static [&'static str]) -> (FlakyStore, User, Session) {
    let fx = Fixture::new().await;
    fx.org("org_a").await;
    fx.join("org_a", MemberRole::Owner).await;
    fx.team("org_a", "t1").await;
    fx.join_team("t1").await;
    let session = fx.session(None, None).await;

    let store = FlakyStore {
        inner: fx.db,
        fail,
        calls: AtomicUsize::new(0),
    };
    (store, fx.user, session)
}

#[tokio::test]
async fn test_failed_team_lookup_keeps_organization() {
    let (store, user, session) = flaky(&["list_user_team_memberships"]).await;
    let logger = Arc::new(RecordingLogger::default());
    let config = ContextConfig::new().logger(logger.clone());

    let resolved = resolve_active_context(&user, &session, &store, &config).await;

    assert_eq!(resolved.organization_id(), Some("org_a"));
    assert_eq!(resolved.active_team, None);
    let warnings = logger.warnings.lock().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("team membership"));
}

#[tokio::test]
async fn test_failed_membership_listing_yields_empty_context() {
    let (store, user, session) = flaky(&["list_user_memberships"]).await;
    let logger = Arc::new(RecordingLogger::default());
    let config = ContextConfig::new().logger(logger.clone());

    let resolved = resolve_active_context(&user, &session, &store, &config).await;

    assert_eq!(resolved, ResolvedContext::default());
    assert_eq!(logger.warnings.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_organization_lookup_drops_team() {
    let (store, user, session) = flaky(&["get_organization_by_id"]).await;
    let config = ContextConfig::new().logger(Arc::new(RecordingLogger::default()));

    let resolved = resolve_active_context(&user, &session, &store, &config).await;

    // The team needs a resolved organization to be kept.
    assert_eq!(resolved, ResolvedContext::default());
    assert!(store.calls.load(Ordering::SeqCst) > 0);
}

#[test]
fn test_or_null_passes_through_success() {
    let logger = RecordingLogger::default();
    assert_eq!(or_null(Ok(Some(3)), &logger, "x"), Some(3));
    assert_eq!(or_null::<u8>(Ok(None), &logger, "x"), None);
    assert!(logger.warnings.lock().unwrap().is_empty());

    let failed: ContextResult<Option<u8>> = Err(ContextError::internal("boom"));
    assert_eq!(or_null(failed, &logger, "organization"), None);
    assert!(logger.warnings.lock().unwrap()[0].contains("organization"));
}
