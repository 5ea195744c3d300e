use chrono::{DateTime, Utc};

use crate::entity::{
    AuthMember, AuthOrganization, AuthSession, AuthTeam, AuthTeamMember, AuthUser,
};
use crate::types::{
    CreateMember, CreateOrganization, CreateSession, CreateTeam, CreateTeamMember, CreateUser,
    Member, Organization, Session, Team, TeamMember, User,
};

/// Construction for user entities stored in memory.
pub trait MemoryUser: AuthUser {
    fn from_create(id: String, create: &CreateUser, now: DateTime<Utc>) -> Self;
}

/// Construction and mutation for session entities stored in memory.
pub trait MemorySession: AuthSession {
    /// Construct a new session from creation data.
    fn from_create(id: String, token: String, create: &CreateSession, now: DateTime<Utc>) -> Self;
    fn set_expires_at(&mut self, at: DateTime<Utc>);
    fn set_active_organization_id(&mut self, org_id: Option<String>);
    fn set_active_team_id(&mut self, team_id: Option<String>);
    fn set_updated_at(&mut self, at: DateTime<Utc>);
}

/// Construction for organization entities stored in memory.
pub trait MemoryOrganization: AuthOrganization {
    fn from_create(id: String, create: &CreateOrganization, now: DateTime<Utc>) -> Self;
}

/// Construction and mutation for member entities stored in memory.
pub trait MemoryMember: AuthMember {
    fn from_create(id: String, create: &CreateMember, now: DateTime<Utc>) -> Self;
    fn set_role(&mut self, role: String);
}

/// Construction for team entities stored in memory.
pub trait MemoryTeam: AuthTeam {
    fn from_create(id: String, create: &CreateTeam, now: DateTime<Utc>) -> Self;
}

/// Construction for team membership entities stored in memory.
pub trait MemoryTeamMember: AuthTeamMember {
    fn from_create(id: String, create: &CreateTeamMember, now: DateTime<Utc>) -> Self;
}

// -- Built-in types --

impl MemoryUser for User {
    fn from_create(id: String, create: &CreateUser, now: DateTime<Utc>) -> Self {
        User {
            id,
            name: create.name.clone(),
            email: create.email.clone(),
            image: create.image.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl MemorySession for Session {
    fn from_create(id: String, token: String, create: &CreateSession, now: DateTime<Utc>) -> Self {
        Session {
            id,
            token,
            expires_at: create.expires_at,
            created_at: now,
            updated_at: now,
            user_id: create.user_id.clone(),
            active_organization_id: create.active_organization_id.clone(),
            active_team_id: create.active_team_id.clone(),
            active: true,
        }
    }

    fn set_expires_at(&mut self, at: DateTime<Utc>) {
        self.expires_at = at;
    }

    fn set_active_organization_id(&mut self, org_id: Option<String>) {
        self.active_organization_id = org_id;
    }

    fn set_active_team_id(&mut self, team_id: Option<String>) {
        self.active_team_id = team_id;
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

impl MemoryOrganization for Organization {
    fn from_create(id: String, create: &CreateOrganization, now: DateTime<Utc>) -> Self {
        Organization {
            id,
            name: create.name.clone(),
            slug: create.slug.clone(),
            logo: create.logo.clone(),
            metadata: create.metadata.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl MemoryMember for Member {
    fn from_create(id: String, create: &CreateMember, now: DateTime<Utc>) -> Self {
        Member {
            id,
            organization_id: create.organization_id.clone(),
            user_id: create.user_id.clone(),
            role: create.role.clone(),
            created_at: now,
        }
    }

    fn set_role(&mut self, role: String) {
        self.role = role;
    }
}

impl MemoryTeam for Team {
    fn from_create(id: String, create: &CreateTeam, now: DateTime<Utc>) -> Self {
        Team {
            id,
            name: create.name.clone(),
            organization_id: create.organization_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl MemoryTeamMember for TeamMember {
    fn from_create(id: String, create: &CreateTeamMember, now: DateTime<Utc>) -> Self {
        TeamMember {
            id,
            team_id: create.team_id.clone(),
            user_id: create.user_id.clone(),
            created_at: now,
        }
    }
}
