//! # Active Context Core
//!
//! Core abstractions for active-context resolution: entity traits,
//! persistence adapters, configuration, logging and error handling.

pub mod adapters;
pub mod config;
pub mod entity;
pub mod error;
pub mod logger;
pub mod types;
pub mod types_impls;
pub mod types_org;

// Re-export commonly used items
pub use adapters::{
    ContextStore, DatabaseAdapter, MemberOps, MemoryDatabaseAdapter, MemoryMember,
    MemoryOrganization, MemorySession, MemoryTeam, MemoryTeamMember, MemoryUser, OrganizationOps,
    SessionOps, TeamMemberOps, TeamOps, UserOps,
};
#[cfg(feature = "sqlx-postgres")]
pub use adapters::{PoolConfig, SqlxAdapter, SqlxEntity};
pub use config::{ContextConfig, SelectionOrder, SessionConfig, TeamConfig};
pub use entity::{
    AuthInvitation, AuthMember, AuthOrganization, AuthSession, AuthTeam, AuthTeamMember, AuthUser,
};
pub use error::{ContextError, ContextResult, DatabaseError};
pub use logger::{Logger, TracingLogger};
pub use types::{
    CreateMember, CreateOrganization, CreateSession, CreateTeam, CreateTeamMember, CreateUser,
    Invitation, InvitationStatus, Member, MemberRole, Organization, Session, Team, TeamMember, User,
};
