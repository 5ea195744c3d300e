//! Active-context resolution.
//!
//! Given a user and the active ids stored on their session, decide which
//! organization and team are active for this request. Missing ids are
//! backfilled from the user's memberships and every result is checked
//! against those memberships before it is returned.
//!
//! Precedence, first match wins:
//!
//! 1. team set, organization unset: the team's organization is adopted;
//! 2. organization set, team unset: the first team in that organization the
//!    user holds a team membership for is adopted;
//! 3. neither set: the first organization membership is adopted, then the
//!    team is looked up as in 2.
//!
//! A failed lookup never aborts resolution. It is logged at `warn` and the
//! affected field is treated as absent.

use std::collections::HashSet;

use active_context_core::adapters::ContextStore;
use active_context_core::config::ContextConfig;
use active_context_core::entity::{AuthMember, AuthSession, AuthTeam, AuthTeamMember, AuthUser};
use active_context_core::error::ContextResult;
use active_context_core::logger::Logger;

use crate::types::{ActiveOrganization, ActiveTeam, ResolvedContext};

#[cfg(test)]
mod tests;

/// Collapse a failed lookup into "not found", logging the failure.
pub fn or_null<T>(result: ContextResult<Option<T>>, logger: &dyn Logger, step: &str) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(err) => {
            logger.warn(&format!("active-context {} lookup failed: {}", step, err));
            None
        }
    }
}

/// List variant of [`or_null`]: a failed listing becomes an empty list.
pub fn or_empty<T>(result: ContextResult<Vec<T>>, logger: &dyn Logger, step: &str) -> Vec<T> {
    or_null(result.map(Some), logger, step).unwrap_or_default()
}

/// Resolve the active organization and team for `session`.
///
/// Read-only: the backfilled ids are not written back to the session.
pub async fn resolve_active_context<DB: ContextStore>(
    user: &impl AuthUser,
    session: &impl AuthSession,
    store: &DB,
    config: &ContextConfig,
) -> ResolvedContext {
    let logger = config.logger.as_ref();
    let user_id = user.id();
    let teams_enabled = config.teams.enabled;

    let mut organization_id = session.active_organization_id().map(str::to_string);
    let mut team_id = session
        .active_team_id()
        .filter(|_| teams_enabled)
        .map(str::to_string);
    let mut team: Option<DB::Team> = None;

    match (organization_id.is_some(), team_id.is_some()) {
        (false, true) => {
            if let Some(tid) = team_id.as_deref() {
                team = or_null(store.get_team_by_id(tid).await, logger, "team");
            }
            organization_id = team.as_ref().map(|t| t.organization_id().to_string());
        }
        (true, false) if teams_enabled => {
            if let Some(oid) = organization_id.as_deref() {
                team_id = first_team_in_organization(store, user_id, oid, config).await;
            }
        }
        (false, false) => {
            organization_id = first_organization(store, user_id, config).await;
            if teams_enabled && let Some(oid) = organization_id.as_deref() {
                team_id = first_team_in_organization(store, user_id, oid, config).await;
            }
        }
        _ => {}
    }

    let active_organization = match organization_id.as_deref() {
        Some(oid) => resolve_organization(store, user_id, oid, logger).await,
        None => None,
    };

    let active_team = match (&active_organization, team_id.as_deref()) {
        (Some(org), Some(tid)) if teams_enabled => {
            let team = match team {
                Some(team) if team.id() == tid => Some(team),
                _ => or_null(store.get_team_by_id(tid).await, logger, "team"),
            };
            resolve_team(store, user_id, &org.id, team, logger).await
        }
        _ => None,
    };

    ResolvedContext {
        active_organization,
        active_team,
    }
}

/// The user's first organization membership under the configured ordering.
async fn first_organization<DB: ContextStore>(
    store: &DB,
    user_id: &str,
    config: &ContextConfig,
) -> Option<String> {
    let logger = config.logger.as_ref();
    let mut memberships = or_empty(
        store.list_user_memberships(user_id).await,
        logger,
        "organization membership",
    );
    memberships.retain(|m| !m.organization_id().is_empty());
    config
        .selection_order
        .arrange(&mut memberships, |m| m.created_at());

    memberships
        .first()
        .map(|m| m.organization_id().to_string())
}

/// The first team in `organization_id` the user holds a team membership for.
async fn first_team_in_organization<DB: ContextStore>(
    store: &DB,
    user_id: &str,
    organization_id: &str,
    config: &ContextConfig,
) -> Option<String> {
    let logger = config.logger.as_ref();

    let mut memberships = or_empty(
        store.list_user_team_memberships(user_id).await,
        logger,
        "team membership",
    );
    if memberships.is_empty() {
        return None;
    }

    let org_teams: HashSet<String> = or_empty(
        store.list_organization_teams(organization_id).await,
        logger,
        "organization teams",
    )
    .iter()
    .map(|t| t.id().to_string())
    .collect();

    memberships.retain(|tm| org_teams.contains(tm.team_id()));
    config
        .selection_order
        .arrange(&mut memberships, |tm| tm.created_at());

    memberships.first().map(|tm| tm.team_id().to_string())
}

async fn resolve_organization<DB: ContextStore>(
    store: &DB,
    user_id: &str,
    organization_id: &str,
    logger: &dyn Logger,
) -> Option<ActiveOrganization> {
    let member = or_null(
        store.get_member(organization_id, user_id).await,
        logger,
        "organization membership",
    );
    if member.is_none() {
        logger.debug(&format!(
            "user {} is not a member of organization {}",
            user_id, organization_id
        ));
        return None;
    }

    or_null(
        store.get_organization_by_id(organization_id).await,
        logger,
        "organization",
    )
    .map(|org| ActiveOrganization::from_entity(&org))
}

async fn resolve_team<DB: ContextStore>(
    store: &DB,
    user_id: &str,
    organization_id: &str,
    team: Option<DB::Team>,
    logger: &dyn Logger,
) -> Option<ActiveTeam> {
    let team = team?;

    if team.organization_id() != organization_id {
        logger.debug(&format!(
            "team {} does not belong to organization {}",
            team.id(),
            organization_id
        ));
        return None;
    }

    or_null(
        store.get_team_member(team.id(), user_id).await,
        logger,
        "team membership",
    )?;

    Some(ActiveTeam::from_entity(&team))
}
