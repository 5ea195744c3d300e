//! Explicit "set active" actions and the team listings they rely on.
//!
//! These are the only operations that write active ids to a session.

use active_context_core::adapters::DatabaseAdapter;
use active_context_core::entity::{
    AuthMember, AuthOrganization, AuthSession, AuthTeam, AuthTeamMember, AuthUser,
};
use active_context_core::error::{ContextError, ContextResult};
use active_context_core::types::{CreateMember, CreateOrganization, MemberRole};

use crate::context::ApiContext;
use crate::types::{SetActiveOrganizationRequest, SetActiveTeamRequest};

#[cfg(test)]
mod tests;

/// Resolve an organization id from an explicit id, a slug, or the session.
pub(crate) async fn resolve_organization_id<DB: DatabaseAdapter>(
    org_id: Option<&str>,
    org_slug: Option<&str>,
    session: &DB::Session,
    ctx: &ApiContext<DB>,
) -> ContextResult<String> {
    if let Some(id) = org_id {
        return Ok(id.to_string());
    }

    if let Some(slug) = org_slug {
        if let Some(org) = ctx.database.get_organization_by_slug(slug).await? {
            return Ok(org.id().to_string());
        }
        return Err(ContextError::not_found("Organization not found"));
    }

    session
        .active_organization_id()
        .map(|s| s.to_string())
        .ok_or_else(|| ContextError::bad_request("No active organization"))
}

async fn require_membership<DB: DatabaseAdapter>(
    organization_id: &str,
    user: &DB::User,
    ctx: &ApiContext<DB>,
) -> ContextResult<DB::Member> {
    ctx.database
        .get_member(organization_id, user.id())
        .await?
        .ok_or_else(|| ContextError::forbidden("Not a member of this organization"))
}

fn require_teams<DB: DatabaseAdapter>(ctx: &ApiContext<DB>) -> ContextResult<()> {
    if ctx.config.teams.enabled {
        Ok(())
    } else {
        Err(ContextError::bad_request("Teams are not enabled"))
    }
}

/// Create an organization with `user` as its owner.
pub async fn create_organization<DB: DatabaseAdapter>(
    data: CreateOrganization,
    user: &DB::User,
    ctx: &ApiContext<DB>,
) -> ContextResult<(DB::Organization, DB::Member)> {
    let organization = ctx.database.create_organization(data).await?;
    let member = ctx
        .database
        .create_member(CreateMember::new(
            organization.id(),
            user.id(),
            MemberRole::Owner,
        ))
        .await?;

    tracing::debug!(
        organization_id = organization.id(),
        user_id = user.id(),
        "organization created"
    );
    Ok((organization, member))
}

/// Switch the session's active organization.
///
/// The stored team is kept only when it belongs to the new organization.
/// A request naming no organization clears both ids.
pub async fn set_active_organization<DB: DatabaseAdapter>(
    body: &SetActiveOrganizationRequest,
    user: &DB::User,
    session: &DB::Session,
    ctx: &ApiContext<DB>,
) -> ContextResult<DB::Session> {
    if body.organization_id.is_none() && body.organization_slug.is_none() {
        return ctx
            .database
            .update_session_active_context(session.token(), None, None)
            .await;
    }

    let org_id = resolve_organization_id(
        body.organization_id.as_deref(),
        body.organization_slug.as_deref(),
        session,
        ctx,
    )
    .await?;
    require_membership(&org_id, user, ctx).await?;

    let team_id = match session.active_team_id() {
        Some(tid) => ctx
            .database
            .get_team_by_id(tid)
            .await?
            .filter(|team| team.organization_id() == org_id)
            .map(|team| team.id().to_string()),
        None => None,
    };

    ctx.database
        .update_session_active_context(session.token(), Some(&org_id), team_id.as_deref())
        .await
}

/// Set or clear the session's active team.
///
/// Setting a team also sets its organization as active.
pub async fn set_active_team<DB: DatabaseAdapter>(
    body: &SetActiveTeamRequest,
    user: &DB::User,
    session: &DB::Session,
    ctx: &ApiContext<DB>,
) -> ContextResult<DB::Session> {
    require_teams(ctx)?;

    let Some(team_id) = body.team_id.as_deref() else {
        return ctx
            .database
            .update_session_active_context(session.token(), session.active_organization_id(), None)
            .await;
    };

    let team = ctx
        .database
        .get_team_by_id(team_id)
        .await?
        .ok_or_else(|| ContextError::not_found("Team not found"))?;

    require_membership(team.organization_id(), user, ctx).await?;
    ctx.database
        .get_team_member(team.id(), user.id())
        .await?
        .ok_or_else(|| ContextError::forbidden("Not a member of this team"))?;

    ctx.database
        .update_session_active_context(
            session.token(),
            Some(team.organization_id()),
            Some(team.id()),
        )
        .await
}

/// Teams of an organization the user belongs to, oldest first.
///
/// Falls back to the session's active organization when none is given.
pub async fn list_organization_teams<DB: DatabaseAdapter>(
    organization_id: Option<&str>,
    user: &DB::User,
    session: &DB::Session,
    ctx: &ApiContext<DB>,
) -> ContextResult<Vec<DB::Team>> {
    require_teams(ctx)?;

    let org_id = resolve_organization_id(organization_id, None, session, ctx).await?;
    require_membership(&org_id, user, ctx).await?;

    ctx.database.list_organization_teams(&org_id).await
}

/// Every team the user holds a team membership for.
pub async fn list_user_teams<DB: DatabaseAdapter>(
    user: &DB::User,
    ctx: &ApiContext<DB>,
) -> ContextResult<Vec<DB::Team>> {
    require_teams(ctx)?;

    let memberships = ctx.database.list_user_team_memberships(user.id()).await?;
    let mut teams = Vec::with_capacity(memberships.len());
    for membership in &memberships {
        if let Some(team) = ctx.database.get_team_by_id(membership.team_id()).await? {
            teams.push(team);
        }
    }
    Ok(teams)
}

/// Remove a team. Requires the owner or admin role in its organization.
pub async fn remove_team<DB: DatabaseAdapter>(
    team_id: &str,
    user: &DB::User,
    ctx: &ApiContext<DB>,
) -> ContextResult<()> {
    require_teams(ctx)?;

    let team = ctx
        .database
        .get_team_by_id(team_id)
        .await?
        .ok_or_else(|| ContextError::not_found("Team not found"))?;

    let member = require_membership(team.organization_id(), user, ctx).await?;
    let roles = MemberRole::parse_all(member.role());
    if !roles.contains(&MemberRole::Owner) && !roles.contains(&MemberRole::Admin) {
        return Err(ContextError::forbidden(
            "Only owners and admins can remove teams",
        ));
    }

    if !ctx.config.teams.allow_removing_all_teams {
        let remaining = ctx
            .database
            .list_organization_teams(team.organization_id())
            .await?
            .len();
        if remaining <= 1 {
            return Err(ContextError::bad_request(
                "Cannot remove the last team of an organization",
            ));
        }
    }

    ctx.database.delete_team(team.id()).await
}
