//! Client-side mirror of the active team.
//!
//! [`ActiveTeamMirror`] keeps a locally held team selection consistent with
//! a remembered choice and with the server session whenever the active
//! organization changes. The server is reached through [`TeamSessionApi`];
//! with the `http` feature, [`HttpTeamSessionApi`] implements it over
//! `reqwest`.

pub mod api;
pub mod error;
pub mod mirror;
pub mod storage;

pub use api::{TeamSessionApi, TeamSummary};
#[cfg(feature = "http")]
pub use api::{HttpOptions, HttpTeamSessionApi};
pub use error::ClientError;
pub use mirror::ActiveTeamMirror;
pub use storage::{FileSelectionStore, MemorySelectionStore, SelectionStore};
