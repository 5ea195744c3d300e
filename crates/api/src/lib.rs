//! # Active Context API
//!
//! The active-context resolver, the custom-session hook that runs it on
//! every session read, and the explicit set-active actions.

pub mod active;
pub mod context;
pub mod resolver;
pub mod session;
pub mod types;

pub use active::{
    create_organization, list_organization_teams, list_user_teams, remove_team,
    set_active_organization, set_active_team,
};
pub use context::ApiContext;
pub use resolver::{or_empty, or_null, resolve_active_context};
pub use session::{SessionMaterializer, populate_custom_session};
pub use types::{
    ActiveOrganization, ActiveTeam, PopulatedSession, ResolvedContext, SessionPayload,
    SetActiveOrganizationRequest, SetActiveTeamRequest,
};
