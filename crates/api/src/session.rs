use chrono::Utc;
use std::sync::Arc;

use active_context_core::adapters::{ContextStore, DatabaseAdapter};
use active_context_core::config::ContextConfig;
use active_context_core::entity::{AuthSession, AuthUser};
use active_context_core::error::ContextResult;
use active_context_core::types::CreateSession;

use crate::resolver::resolve_active_context;
use crate::types::{PopulatedSession, SessionPayload};

/// Custom-session hook: merge the resolved active context into a session.
///
/// Never fails. Lookup failures surface as `null` fields on the payload.
pub async fn populate_custom_session<U, S, DB>(
    user: U,
    session: S,
    store: &DB,
    config: &ContextConfig,
) -> SessionPayload<U, S>
where
    U: AuthUser,
    S: AuthSession,
    DB: ContextStore,
{
    let resolved = resolve_active_context(&user, &session, store, config).await;

    SessionPayload {
        user,
        session: PopulatedSession {
            session,
            active_organization: resolved.active_organization,
            active_team: resolved.active_team,
        },
    }
}

/// Loads sessions by token and materializes them through the hook.
pub struct SessionMaterializer<DB: DatabaseAdapter> {
    config: Arc<ContextConfig>,
    database: Arc<DB>,
}

impl<DB: DatabaseAdapter> SessionMaterializer<DB> {
    pub fn new(config: Arc<ContextConfig>, database: Arc<DB>) -> Self {
        Self { config, database }
    }

    /// Create a new session for a user using the configured lifetime.
    pub async fn create_session(&self, user: &impl AuthUser) -> ContextResult<DB::Session> {
        let expires_at = Utc::now() + self.config.session.expires_in;
        self.database
            .create_session(CreateSession::new(user.id(), expires_at))
            .await
    }

    /// Load a live session and its user, without resolving the context.
    pub async fn load(&self, token: &str) -> ContextResult<Option<(DB::User, DB::Session)>> {
        let Some(session) = self.database.get_session(token).await? else {
            return Ok(None);
        };

        if session.expires_at() < Utc::now() || !session.active() {
            // Session expired or inactive - delete it
            self.database.delete_session(token).await?;
            return Ok(None);
        }

        if self.config.session.update_age {
            let new_expires_at = Utc::now() + self.config.session.expires_in;
            if let Err(err) = self
                .database
                .update_session_expiry(token, new_expires_at)
                .await
            {
                tracing::warn!(error = %err, "failed to extend session expiry");
            }
        }

        let Some(user) = self.database.get_user_by_id(session.user_id()).await? else {
            tracing::debug!(user_id = session.user_id(), "session user no longer exists");
            return Ok(None);
        };

        Ok(Some((user, session)))
    }

    /// Get a populated session by token.
    pub async fn get_session(
        &self,
        token: &str,
    ) -> ContextResult<Option<SessionPayload<DB::User, DB::Session>>> {
        let Some((user, session)) = self.load(token).await? else {
            return Ok(None);
        };

        let payload =
            populate_custom_session(user, session, self.database.as_ref(), &self.config).await;
        Ok(Some(payload))
    }

    /// Delete a session
    pub async fn delete_session(&self, token: &str) -> ContextResult<()> {
        self.database.delete_session(token).await
    }
}
