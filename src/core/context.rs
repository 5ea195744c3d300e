use std::sync::Arc;

use active_context_api::{
    ApiContext, ResolvedContext, SessionMaterializer, SessionPayload,
    SetActiveOrganizationRequest, SetActiveTeamRequest, active, populate_custom_session,
    resolve_active_context,
};
use active_context_core::{
    ContextConfig, ContextError, ContextResult, CreateOrganization, DatabaseAdapter,
};

/// An active-context instance, generic over the database adapter.
///
/// Token-based entry points load the session first and fail with
/// [`ContextError::SessionNotFound`] when it is missing or expired.
pub struct ActiveContext<DB: DatabaseAdapter> {
    config: Arc<ContextConfig>,
    database: Arc<DB>,
    context: ApiContext<DB>,
    sessions: SessionMaterializer<DB>,
}

/// Initial builder. Call `.database(adapter)` to obtain a [`TypedContextBuilder`].
pub struct ContextBuilder {
    config: ContextConfig,
}

/// Typed builder returned by [`ContextBuilder::database`].
pub struct TypedContextBuilder<DB: DatabaseAdapter> {
    config: ContextConfig,
    database: Arc<DB>,
}

impl ContextBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Set the database adapter, returning a [`TypedContextBuilder`].
    pub fn database<DB: DatabaseAdapter>(self, database: DB) -> TypedContextBuilder<DB> {
        TypedContextBuilder {
            config: self.config,
            database: Arc::new(database),
        }
    }

    /// Use an adapter that is already shared elsewhere.
    pub fn shared_database<DB: DatabaseAdapter>(
        self,
        database: Arc<DB>,
    ) -> TypedContextBuilder<DB> {
        TypedContextBuilder {
            config: self.config,
            database,
        }
    }
}

impl<DB: DatabaseAdapter> TypedContextBuilder<DB> {
    /// Validate the configuration and build the instance.
    pub fn build(self) -> ContextResult<ActiveContext<DB>> {
        self.config.validate()?;

        let config = Arc::new(self.config);
        let database = self.database;
        let context = ApiContext::new(config.clone(), database.clone());
        let sessions = context.session_materializer();

        tracing::debug!(
            teams_enabled = config.teams.enabled,
            selection_order = ?config.selection_order,
            "active context ready"
        );

        Ok(ActiveContext {
            config,
            database,
            context,
            sessions,
        })
    }
}

impl<DB: DatabaseAdapter> ActiveContext<DB> {
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn database(&self) -> &Arc<DB> {
        &self.database
    }

    /// Shared state for calling the actions in [`active_context_api::active`] directly.
    pub fn api_context(&self) -> &ApiContext<DB> {
        &self.context
    }

    pub fn session_materializer(&self) -> &SessionMaterializer<DB> {
        &self.sessions
    }

    /// Start a session for `user` with the configured lifetime.
    pub async fn create_session(&self, user: &DB::User) -> ContextResult<DB::Session> {
        self.sessions.create_session(user).await
    }

    /// Load a session and merge its resolved active context.
    pub async fn get_session(
        &self,
        token: &str,
    ) -> ContextResult<Option<SessionPayload<DB::User, DB::Session>>> {
        self.sessions.get_session(token).await
    }

    /// Resolve without loading anything but membership data.
    pub async fn resolve(&self, user: &DB::User, session: &DB::Session) -> ResolvedContext {
        resolve_active_context(user, session, self.database.as_ref(), &self.config).await
    }

    pub async fn sign_out(&self, token: &str) -> ContextResult<()> {
        self.sessions.delete_session(token).await
    }

    /// Switch the active organization of the session behind `token`.
    pub async fn set_active_organization(
        &self,
        token: &str,
        body: &SetActiveOrganizationRequest,
    ) -> ContextResult<SessionPayload<DB::User, DB::Session>> {
        let (user, session) = self.authenticate(token).await?;
        let session =
            active::set_active_organization(body, &user, &session, &self.context).await?;
        Ok(self.populate(user, session).await)
    }

    /// Set or clear the active team of the session behind `token`.
    pub async fn set_active_team(
        &self,
        token: &str,
        body: &SetActiveTeamRequest,
    ) -> ContextResult<SessionPayload<DB::User, DB::Session>> {
        let (user, session) = self.authenticate(token).await?;
        let session = active::set_active_team(body, &user, &session, &self.context).await?;
        Ok(self.populate(user, session).await)
    }

    /// Teams of `organization_id`, or of the session's active organization.
    pub async fn list_organization_teams(
        &self,
        token: &str,
        organization_id: Option<&str>,
    ) -> ContextResult<Vec<DB::Team>> {
        let (user, session) = self.authenticate(token).await?;
        active::list_organization_teams(organization_id, &user, &session, &self.context).await
    }

    pub async fn list_user_teams(&self, token: &str) -> ContextResult<Vec<DB::Team>> {
        let (user, _) = self.authenticate(token).await?;
        active::list_user_teams(&user, &self.context).await
    }

    /// Create an organization owned by the session's user.
    pub async fn create_organization(
        &self,
        token: &str,
        data: CreateOrganization,
    ) -> ContextResult<(DB::Organization, DB::Member)> {
        let (user, _) = self.authenticate(token).await?;
        active::create_organization(data, &user, &self.context).await
    }

    pub async fn remove_team(&self, token: &str, team_id: &str) -> ContextResult<()> {
        let (user, _) = self.authenticate(token).await?;
        active::remove_team(team_id, &user, &self.context).await
    }

    async fn authenticate(&self, token: &str) -> ContextResult<(DB::User, DB::Session)> {
        self.sessions
            .load(token)
            .await?
            .ok_or(ContextError::SessionNotFound)
    }

    async fn populate(
        &self,
        user: DB::User,
        session: DB::Session,
    ) -> SessionPayload<DB::User, DB::Session> {
        populate_custom_session(user, session, self.database.as_ref(), &self.config).await
    }
}

impl<DB: DatabaseAdapter> Clone for ActiveContext<DB> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            database: self.database.clone(),
            context: self.context.clone(),
            sessions: self.context.session_materializer(),
        }
    }
}
