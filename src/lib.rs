//! # Active Context
//!
//! Resolves which organization and team are active for a multi-tenant
//! session, and keeps a client-side team selection in step with it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use active_context::{ContextBuilder, ContextConfig, SelectionOrder};
//! use active_context::adapters::MemoryDatabaseAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ContextConfig::new().selection_order(SelectionOrder::OldestFirst);
//!
//!     let context = ContextBuilder::new(config)
//!         .database(MemoryDatabaseAdapter::new())
//!         .build()?;
//!
//!     if let Some(payload) = context.get_session("session-token").await? {
//!         println!("{:?}", payload.context());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod core;

pub use active_context_core as types_mod;
pub use active_context_core::{
    ContextConfig, ContextError, ContextResult, ContextStore, CreateMember, CreateOrganization,
    CreateSession, CreateTeam, CreateTeamMember, CreateUser, DatabaseAdapter, DatabaseError,
    Invitation, InvitationStatus, Logger, Member, MemberOps, MemberRole, Organization,
    OrganizationOps, SelectionOrder, Session, SessionConfig, SessionOps, Team, TeamConfig,
    TeamMember, TeamMemberOps, TeamOps, TracingLogger, User, UserOps,
};

pub use active_context_core::entity::{
    AuthInvitation, AuthMember, AuthOrganization, AuthSession, AuthTeam, AuthTeamMember, AuthUser,
};

pub mod types {
    pub use active_context_api::types::*;
    pub use active_context_core::types::*;
}

pub mod adapters {
    pub use active_context_core::adapters::*;
}

pub use active_context_api::{
    ActiveOrganization, ActiveTeam, ApiContext, PopulatedSession, ResolvedContext,
    SessionMaterializer, SessionPayload, SetActiveOrganizationRequest, SetActiveTeamRequest,
    active, or_empty, or_null, populate_custom_session, resolve_active_context,
};

pub use active_context_client::{
    ActiveTeamMirror, ClientError, FileSelectionStore, MemorySelectionStore, SelectionStore,
    TeamSessionApi, TeamSummary,
};
#[cfg(feature = "http")]
pub use active_context_client::{HttpOptions, HttpTeamSessionApi};

pub use client::LocalTeamSessionApi;
pub use self::core::{ActiveContext, ContextBuilder, TypedContextBuilder};
