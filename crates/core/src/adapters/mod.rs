pub mod database;
pub mod memory;
mod memory_traits;
mod traits;

pub use database::{
    ContextStore, DatabaseAdapter, MemberOps, OrganizationOps, SessionOps, TeamMemberOps,
    TeamOps, UserOps,
};
pub use memory::{
    MemoryDatabaseAdapter, MemoryMember, MemoryOrganization, MemorySession, MemoryTeam,
    MemoryTeamMember, MemoryUser,
};

#[cfg(feature = "sqlx-postgres")]
pub use database::sqlx_adapter::{PoolConfig, PoolStats, SqlxAdapter, SqlxEntity};
