#![allow(dead_code)]

use active_context::adapters::MemoryDatabaseAdapter;
use active_context::{
    ActiveContext, ContextBuilder, ContextConfig, CreateMember, CreateOrganization,
    CreateSession, CreateTeam, CreateTeamMember, CreateUser, MemberOps, MemberRole,
    OrganizationOps, SessionOps, TeamMemberOps, TeamOps, User, UserOps,
};
use chrono::{Duration, Utc};

pub struct TestApp {
    pub context: ActiveContext<MemoryDatabaseAdapter>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    pub fn with_config(config: ContextConfig) -> Self {
        let context = ContextBuilder::new(config)
            .database(MemoryDatabaseAdapter::new())
            .build()
            .expect("test config is valid");
        Self { context }
    }

    pub fn db(&self) -> &MemoryDatabaseAdapter {
        self.context.database()
    }

    pub async fn user(&self, id: &str) -> User {
        self.db()
            .create_user(CreateUser::new().with_id(id).with_email(format!("{id}@example.com")))
            .await
            .unwrap()
    }

    pub async fn org(&self, id: &str) {
        self.db()
            .create_organization(CreateOrganization::new(id, id).with_id(id))
            .await
            .unwrap();
    }

    pub async fn member(&self, org: &str, user: &str, role: MemberRole) {
        self.db()
            .create_member(CreateMember::new(org, user, role))
            .await
            .unwrap();
    }

    pub async fn team(&self, org: &str, id: &str) {
        self.db()
            .create_team(CreateTeam::new(org, id).with_id(id))
            .await
            .unwrap();
    }

    pub async fn join_team(&self, team: &str, user: &str) {
        self.db()
            .create_team_member(CreateTeamMember::new(team, user))
            .await
            .unwrap();
    }

    /// Open a session for `user` with the given stored active ids. Returns its token.
    pub async fn session(&self, user: &str, org: Option<&str>, team: Option<&str>) -> String {
        let mut create = CreateSession::new(user, Utc::now() + Duration::hours(1));
        if let Some(org) = org {
            create = create.with_active_organization(org);
        }
        if let Some(team) = team {
            create = create.with_active_team(team);
        }
        self.db().create_session(create).await.unwrap().token
    }

    /// `(organization id, team id)` as resolved for `token`.
    pub async fn resolved(&self, token: &str) -> (Option<String>, Option<String>) {
        let payload = self
            .context
            .get_session(token)
            .await
            .unwrap()
            .expect("session exists");
        let context = payload.context();
        (
            context.organization_id().map(str::to_string),
            context.team_id().map(str::to_string),
        )
    }
}

pub fn ids(org: Option<&str>, team: Option<&str>) -> (Option<String>, Option<String>) {
    (org.map(str::to_string), team.map(str::to_string))
}
