//! Entity traits for active-context.
//!
//! The resolver and adapters access entity fields through these getters, so
//! callers can bring their own entity structs with custom field names and
//! extra columns. The built-in types in [`crate::types`] implement all of
//! them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::InvitationStatus;

/// The account a session belongs to. Only `id` is read by the resolver.
pub trait AuthUser: Clone + Send + Sync + Serialize + std::fmt::Debug + 'static {
    fn id(&self) -> &str;
    fn email(&self) -> Option<&str>;
    fn name(&self) -> Option<&str>;
    fn image(&self) -> Option<&str>;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// A stored session and the active ids it carries.
pub trait AuthSession: Clone + Send + Sync + Serialize + std::fmt::Debug + 'static {
    fn id(&self) -> &str;
    fn token(&self) -> &str;
    fn user_id(&self) -> &str;
    fn expires_at(&self) -> DateTime<Utc>;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn active_organization_id(&self) -> Option<&str>;
    fn active_team_id(&self) -> Option<&str>;
    fn active(&self) -> bool;
}

/// An organization; `slug` is unique.
pub trait AuthOrganization: Clone + Send + Sync + Serialize + std::fmt::Debug + 'static {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn slug(&self) -> &str;
    fn logo(&self) -> Option<&str>;
    fn metadata(&self) -> Option<&serde_json::Value>;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// One (user, organization) membership with its role string.
pub trait AuthMember: Clone + Send + Sync + Serialize + std::fmt::Debug + 'static {
    fn id(&self) -> &str;
    fn organization_id(&self) -> &str;
    fn user_id(&self) -> &str;
    fn role(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

/// A team. Always owned by exactly one organization.
pub trait AuthTeam: Clone + Send + Sync + Serialize + std::fmt::Debug + 'static {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn organization_id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// One (user, team) membership row.
pub trait AuthTeamMember: Clone + Send + Sync + Serialize + std::fmt::Debug + 'static {
    fn id(&self) -> &str;
    fn team_id(&self) -> &str;
    fn user_id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

pub trait AuthInvitation: Clone + Send + Sync + Serialize + std::fmt::Debug + 'static {
    fn id(&self) -> &str;
    fn organization_id(&self) -> &str;
    fn email(&self) -> &str;
    fn role(&self) -> &str;
    fn team_id(&self) -> Option<&str>;
    fn status(&self) -> &InvitationStatus;
    fn inviter_id(&self) -> &str;
    fn expires_at(&self) -> DateTime<Utc>;
    fn created_at(&self) -> DateTime<Utc>;

    /// Check if the invitation is still pending and not past its expiry.
    fn is_pending(&self) -> bool {
        self.effective_status() == InvitationStatus::Pending
    }

    /// Status as observed now, reporting `Expired` for stale pending rows.
    fn effective_status(&self) -> InvitationStatus {
        self.status().effective(self.expires_at(), Utc::now())
    }
}
