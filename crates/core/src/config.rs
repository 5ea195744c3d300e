use crate::error::ContextError;
use crate::logger::{Logger, TracingLogger};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Main configuration for active-context resolution.
#[derive(Clone)]
pub struct ContextConfig {
    /// How "first" is defined when the resolver has to pick a membership.
    ///
    /// Applied both to organization memberships (no active organization) and
    /// to team memberships inside the active organization.
    pub selection_order: SelectionOrder,

    /// Team feature configuration
    pub teams: TeamConfig,

    /// Session configuration
    pub session: SessionConfig,

    /// Logger implementation for resolver diagnostics.
    ///
    /// Defaults to a [`TracingLogger`](crate::logger::TracingLogger).
    pub logger: Arc<dyn Logger>,
}

/// Ordering used to pick the "first" organization or team membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionOrder {
    /// Whatever order the adapter returns rows in.
    Storage,
    /// Oldest membership first. Ties keep storage order.
    #[default]
    OldestFirst,
    /// Newest membership first. Ties keep storage order.
    NewestFirst,
}

impl SelectionOrder {
    /// Reorder `items` in place according to this ordering.
    pub fn arrange<T, F>(&self, items: &mut [T], created_at: F)
    where
        F: Fn(&T) -> DateTime<Utc>,
    {
        match self {
            Self::Storage => {}
            // sort_by is stable, so equal timestamps stay in storage order
            Self::OldestFirst => items.sort_by(|a, b| created_at(a).cmp(&created_at(b))),
            Self::NewestFirst => items.sort_by(|a, b| created_at(b).cmp(&created_at(a))),
        }
    }
}

/// Team feature configuration
#[derive(Debug, Clone)]
pub struct TeamConfig {
    /// Whether teams exist for this deployment. When disabled the resolver
    /// never reports an active team.
    pub enabled: bool,

    /// Whether the last team of an organization may be removed.
    pub allow_removing_all_teams: bool,
}

/// Session-specific configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session expiration duration
    pub expires_in: Duration,

    /// Extend the session expiry on every successful read
    pub update_age: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            selection_order: SelectionOrder::default(),
            teams: TeamConfig::default(),
            session: SessionConfig::default(),
            logger: Arc::new(TracingLogger),
        }
    }
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_removing_all_teams: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expires_in: Duration::hours(24 * 7), // 7 days
            update_age: false,
        }
    }
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ordering used to pick the first membership.
    pub fn selection_order(mut self, order: SelectionOrder) -> Self {
        self.selection_order = order;
        self
    }

    /// Enable or disable teams.
    pub fn teams_enabled(mut self, enabled: bool) -> Self {
        self.teams.enabled = enabled;
        self
    }

    /// Allow or refuse removing the last team of an organization.
    pub fn allow_removing_all_teams(mut self, allow: bool) -> Self {
        self.teams.allow_removing_all_teams = allow;
        self
    }

    /// Set the session expiration duration.
    pub fn session_expires_in(mut self, duration: Duration) -> Self {
        self.session.expires_in = duration;
        self
    }

    /// Extend the session expiry on every read.
    pub fn session_update_age(mut self, update_age: bool) -> Self {
        self.session.update_age = update_age;
        self
    }

    /// Set a custom logger implementation.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn validate(&self) -> Result<(), ContextError> {
        if self.session.expires_in <= Duration::zero() {
            return Err(ContextError::config(
                "Session lifetime must be a positive duration",
            ));
        }

        Ok(())
    }
}
