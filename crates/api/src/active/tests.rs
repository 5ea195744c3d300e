use super::*;
use active_context_core::adapters::{
    MemberOps, MemoryDatabaseAdapter, SessionOps, TeamMemberOps, TeamOps, UserOps,
};
use active_context_core::config::ContextConfig;
use active_context_core::types::{
    CreateSession, CreateTeam, CreateTeamMember, CreateUser, Session, User,
};
use chrono::{Duration, Utc};
use std::sync::Arc;

fn create_test_context(config: ContextConfig) -> ApiContext<MemoryDatabaseAdapter> {
    ApiContext::new(Arc::new(config), Arc::new(MemoryDatabaseAdapter::new()))
}

async fn create_user_with_session(
    ctx: &ApiContext<MemoryDatabaseAdapter>,
    id: &str,
) -> (User, Session) {
    let user = ctx
        .database
        .create_user(CreateUser::new().with_id(id))
        .await
        .unwrap();
    let session = ctx
        .database
        .create_session(CreateSession::new(id, Utc::now() + Duration::hours(24)))
        .await
        .unwrap();
    (user, session)
}

/// Two organizations: `acme` owned by u1 with teams `core` and `web`,
/// `globex` owned by u2 with team `ops`. u1 is on `core` only.
async fn seed(ctx: &ApiContext<MemoryDatabaseAdapter>) -> (User, Session) {
    let (u1, s1) = create_user_with_session(ctx, "u1").await;
    let (u2, _) = create_user_with_session(ctx, "u2").await;

    create_organization(
        CreateOrganization::new("Acme", "acme").with_id("acme"),
        &u1,
        ctx,
    )
    .await
    .unwrap();
    create_organization(
        CreateOrganization::new("Globex", "globex").with_id("globex"),
        &u2,
        ctx,
    )
    .await
    .unwrap();

    for (org, team) in [("acme", "core"), ("acme", "web"), ("globex", "ops")] {
        ctx.database
            .create_team(CreateTeam::new(org, team).with_id(team))
            .await
            .unwrap();
    }
    ctx.database
        .create_team_member(CreateTeamMember::new("core", "u1"))
        .await
        .unwrap();
    ctx.database
        .create_team_member(CreateTeamMember::new("ops", "u2"))
        .await
        .unwrap();

    (u1, s1)
}

fn org_request(id: Option<&str>) -> SetActiveOrganizationRequest {
    SetActiveOrganizationRequest {
        organization_id: id.map(str::to_string),
        organization_slug: None,
    }
}

fn team_request(id: Option<&str>) -> SetActiveTeamRequest {
    SetActiveTeamRequest {
        team_id: id.map(str::to_string),
    }
}

#[tokio::test]
async fn test_create_organization_grants_owner() {
    let ctx = create_test_context(ContextConfig::default());
    let (user, _) = seed(&ctx).await;

    let member = ctx.database.get_member("acme", &user.id).await.unwrap().unwrap();
    assert_eq!(member.role, "owner");
    assert_eq!(ctx.database.count_organization_owners("acme").await.unwrap(), 1);
}

#[tokio::test]
async fn test_set_active_organization_requires_membership() {
    let ctx = create_test_context(ContextConfig::default());
    let (user, session) = seed(&ctx).await;

    let err = set_active_organization(&org_request(Some("globex")), &user, &session, &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    let updated = set_active_organization(&org_request(Some("acme")), &user, &session, &ctx)
        .await
        .unwrap();
    assert_eq!(updated.active_organization_id.as_deref(), Some("acme"));
}

#[tokio::test]
async fn test_set_active_organization_by_slug() {
    let ctx = create_test_context(ContextConfig::default());
    let (user, session) = seed(&ctx).await;

    let body = SetActiveOrganizationRequest {
        organization_id: None,
        organization_slug: Some("acme".into()),
    };
    let updated = set_active_organization(&body, &user, &session, &ctx)
        .await
        .unwrap();
    assert_eq!(updated.active_organization_id.as_deref(), Some("acme"));

    let body = SetActiveOrganizationRequest {
        organization_id: None,
        organization_slug: Some("missing".into()),
    };
    let err = set_active_organization(&body, &user, &session, &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_switching_organization_drops_foreign_team() {
    let ctx = create_test_context(ContextConfig::default());
    let (user, session) = seed(&ctx).await;
    ctx.database
        .create_member(CreateMember::new("globex", "u1", MemberRole::Member))
        .await
        .unwrap();

    let session = set_active_team(&team_request(Some("core")), &user, &session, &ctx)
        .await
        .unwrap();
    assert_eq!(session.active_team_id.as_deref(), Some("core"));

    // Same organization keeps the team.
    let session = set_active_organization(&org_request(Some("acme")), &user, &session, &ctx)
        .await
        .unwrap();
    assert_eq!(session.active_team_id.as_deref(), Some("core"));

    let session = set_active_organization(&org_request(Some("globex")), &user, &session, &ctx)
        .await
        .unwrap();
    assert_eq!(session.active_organization_id.as_deref(), Some("globex"));
    assert_eq!(session.active_team_id, None);

    let cleared = set_active_organization(&org_request(None), &user, &session, &ctx)
        .await
        .unwrap();
    assert_eq!(cleared.active_organization_id, None);
    assert_eq!(cleared.active_team_id, None);
}

#[tokio::test]
async fn test_set_active_team_writes_both_ids() {
    let ctx = create_test_context(ContextConfig::default());
    let (user, session) = seed(&ctx).await;

    let updated = set_active_team(&team_request(Some("core")), &user, &session, &ctx)
        .await
        .unwrap();
    assert_eq!(updated.active_organization_id.as_deref(), Some("acme"));
    assert_eq!(updated.active_team_id.as_deref(), Some("core"));

    let cleared = set_active_team(&team_request(None), &user, &updated, &ctx)
        .await
        .unwrap();
    assert_eq!(cleared.active_organization_id.as_deref(), Some("acme"));
    assert_eq!(cleared.active_team_id, None);
}

#[tokio::test]
async fn test_set_active_team_rejections() {
    let ctx = create_test_context(ContextConfig::default());
    let (user, session) = seed(&ctx).await;

    let missing = set_active_team(&team_request(Some("nope")), &user, &session, &ctx)
        .await
        .unwrap_err();
    assert_eq!(missing.status_code(), 404);

    // Member of acme but not of the web team.
    let not_on_team = set_active_team(&team_request(Some("web")), &user, &session, &ctx)
        .await
        .unwrap_err();
    assert_eq!(not_on_team.status_code(), 403);

    // Team in an organization the user does not belong to.
    let foreign = set_active_team(&team_request(Some("ops")), &user, &session, &ctx)
        .await
        .unwrap_err();
    assert_eq!(foreign.status_code(), 403);

    let stored = ctx.database.get_session(&session.token).await.unwrap().unwrap();
    assert_eq!(stored.active_team_id, None);
}

#[tokio::test]
async fn test_set_active_team_when_teams_disabled() {
    let ctx = create_test_context(ContextConfig::new().teams_enabled(false));
    let (user, session) = seed(&ctx).await;

    let err = set_active_team(&team_request(Some("core")), &user, &session, &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_list_organization_teams() {
    let ctx = create_test_context(ContextConfig::default());
    let (user, session) = seed(&ctx).await;

    let teams = list_organization_teams(Some("acme"), &user, &session, &ctx)
        .await
        .unwrap();
    let ids: Vec<&str> = teams.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["core", "web"]);

    let err = list_organization_teams(Some("globex"), &user, &session, &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    // No explicit id and nothing active on the session.
    let err = list_organization_teams(None, &user, &session, &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_list_user_teams() {
    let ctx = create_test_context(ContextConfig::default());
    let (user, _) = seed(&ctx).await;

    let teams = list_user_teams(&user, &ctx).await.unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].id, "core");
}

#[tokio::test]
async fn test_remove_last_team_when_disallowed() {
    let ctx = create_test_context(ContextConfig::new().allow_removing_all_teams(false));
    let (user, _) = seed(&ctx).await;

    remove_team("web", &user, &ctx).await.unwrap();
    let err = remove_team("core", &user, &ctx).await.unwrap_err();
    assert_eq!(err.status_code(), 400);

    let err = remove_team("ops", &user, &ctx).await.unwrap_err();
    assert_eq!(err.status_code(), 403);
}
