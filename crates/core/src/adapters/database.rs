pub use super::traits::{MemberOps, OrganizationOps, SessionOps, TeamMemberOps, TeamOps, UserOps};

/// Database adapter trait for persistence.
///
/// Combines all entity-specific operation traits. Any type that implements
/// all sub-traits automatically implements `DatabaseAdapter`.
pub trait DatabaseAdapter:
    UserOps + SessionOps + OrganizationOps + MemberOps + TeamOps + TeamMemberOps
{
}

impl<T> DatabaseAdapter for T where
    T: UserOps + SessionOps + OrganizationOps + MemberOps + TeamOps + TeamMemberOps
{
}

/// The read set the active-context resolver needs.
///
/// Narrower than [`DatabaseAdapter`] so the resolver can run against a
/// read replica or a test double that only knows about memberships.
pub trait ContextStore: OrganizationOps + MemberOps + TeamOps + TeamMemberOps {}

impl<T> ContextStore for T where T: OrganizationOps + MemberOps + TeamOps + TeamMemberOps {}

#[cfg(feature = "sqlx-postgres")]
pub mod sqlx_adapter {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use crate::entity::{
        AuthMember, AuthOrganization, AuthSession, AuthTeam, AuthTeamMember, AuthUser,
    };
    use crate::error::{ContextError, ContextResult};
    use crate::types::{
        CreateMember, CreateOrganization, CreateSession, CreateTeam, CreateTeamMember, CreateUser,
        Member, MemberRole, Organization, Session, Team, TeamMember, User,
    };
    use sqlx::PgPool;
    use sqlx::postgres::PgRow;
    use std::marker::PhantomData;
    use uuid::Uuid;

    /// Blanket trait combining all bounds needed for SQLx-based entity types.
    ///
    /// Any type that implements `sqlx::FromRow` plus the standard marker traits
    /// automatically satisfies this bound.
    pub trait SqlxEntity:
        for<'r> sqlx::FromRow<'r, PgRow> + Send + Sync + Unpin + Clone + 'static
    {
    }

    impl<T> SqlxEntity for T where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Sync + Unpin + Clone + 'static
    {
    }

    type SqlxAdapterEntities<U, S, O, M, T, TM> = (U, S, O, M, T, TM);

    /// PostgreSQL database adapter via SQLx.
    ///
    /// Listing queries order by `created_at ASC`, which is the default order
    /// the resolver sees under `SelectionOrder::Storage`.
    pub struct SqlxAdapter<
        U = User,
        S = Session,
        O = Organization,
        M = Member,
        T = Team,
        TM = TeamMember,
    > {
        pool: PgPool,
        #[allow(clippy::type_complexity)]
        _phantom: PhantomData<SqlxAdapterEntities<U, S, O, M, T, TM>>,
    }

    /// Constructors for the default (built-in) entity types.
    impl SqlxAdapter {
        pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
            let pool = PgPool::connect(database_url).await?;
            Ok(Self {
                pool,
                _phantom: PhantomData,
            })
        }

        pub async fn with_config(
            database_url: &str,
            config: PoolConfig,
        ) -> Result<Self, sqlx::Error> {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(config.acquire_timeout)
                .idle_timeout(config.idle_timeout)
                .max_lifetime(config.max_lifetime)
                .connect(database_url)
                .await?;
            Ok(Self {
                pool,
                _phantom: PhantomData,
            })
        }
    }

    /// Methods available for all type parameterizations.
    impl<U, S, O, M, T, TM> SqlxAdapter<U, S, O, M, T, TM> {
        pub fn from_pool(pool: PgPool) -> Self {
            Self {
                pool,
                _phantom: PhantomData,
            }
        }

        pub async fn test_connection(&self) -> Result<(), sqlx::Error> {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        }

        pub fn pool_stats(&self) -> PoolStats {
            PoolStats {
                size: self.pool.size(),
                idle: self.pool.num_idle(),
            }
        }

        pub async fn close(&self) {
            self.pool.close().await;
        }
    }

    #[derive(Debug, Clone)]
    pub struct PoolConfig {
        pub max_connections: u32,
        pub min_connections: u32,
        pub acquire_timeout: std::time::Duration,
        pub idle_timeout: Option<std::time::Duration>,
        pub max_lifetime: Option<std::time::Duration>,
    }

    impl Default for PoolConfig {
        fn default() -> Self {
            Self {
                max_connections: 10,
                min_connections: 0,
                acquire_timeout: std::time::Duration::from_secs(30),
                idle_timeout: Some(std::time::Duration::from_secs(600)),
                max_lifetime: Some(std::time::Duration::from_secs(1800)),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct PoolStats {
        pub size: u32,
        pub idle: usize,
    }

    /// Map a unique violation to `Conflict`, everything else to a database error.
    fn unique_or(err: sqlx::Error, message: &str) -> ContextError {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return ContextError::conflict(message);
        }
        ContextError::from(err)
    }

    const OWNER_COUNT_SQL: &str = "SELECT COUNT(*) FROM member WHERE organization_id = $1 \
         AND $2 = ANY(string_to_array(replace(role, ' ', ''), ','))";

    // -- UserOps --

    #[async_trait]
    impl<U, S, O, M, T, TM> UserOps for SqlxAdapter<U, S, O, M, T, TM>
    where
        U: AuthUser + SqlxEntity,
        S: AuthSession + SqlxEntity,
        O: AuthOrganization + SqlxEntity,
        M: AuthMember + SqlxEntity,
        T: AuthTeam + SqlxEntity,
        TM: AuthTeamMember + SqlxEntity,
    {
        type User = U;

        async fn create_user(&self, create_user: CreateUser) -> ContextResult<U> {
            let id = create_user.id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let now = Utc::now();

            sqlx::query_as::<_, U>(
                r#"
                INSERT INTO users (id, email, name, image, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(&id)
            .bind(&create_user.email)
            .bind(&create_user.name)
            .bind(&create_user.image)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_or(e, "A user with this email already exists"))
        }

        async fn get_user_by_id(&self, id: &str) -> ContextResult<Option<U>> {
            let user = sqlx::query_as::<_, U>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(user)
        }
    }

    // -- SessionOps --

    #[async_trait]
    impl<U, S, O, M, T, TM> SessionOps for SqlxAdapter<U, S, O, M, T, TM>
    where
        U: AuthUser + SqlxEntity,
        S: AuthSession + SqlxEntity,
        O: AuthOrganization + SqlxEntity,
        M: AuthMember + SqlxEntity,
        T: AuthTeam + SqlxEntity,
        TM: AuthTeamMember + SqlxEntity,
    {
        type Session = S;

        async fn create_session(&self, create_session: CreateSession) -> ContextResult<S> {
            let id = Uuid::new_v4().to_string();
            let token = format!("session_{}", Uuid::new_v4());
            let now = Utc::now();

            let session = sqlx::query_as::<_, S>(
                r#"
                INSERT INTO sessions (id, user_id, token, expires_at, created_at, updated_at,
                                      active_organization_id, active_team_id, active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
                "#,
            )
            .bind(&id)
            .bind(&create_session.user_id)
            .bind(&token)
            .bind(create_session.expires_at)
            .bind(now)
            .bind(now)
            .bind(&create_session.active_organization_id)
            .bind(&create_session.active_team_id)
            .bind(true)
            .fetch_one(&self.pool)
            .await?;

            Ok(session)
        }

        async fn get_session(&self, token: &str) -> ContextResult<Option<S>> {
            let session = sqlx::query_as::<_, S>("SELECT * FROM sessions WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
            Ok(session)
        }

        async fn update_session_expiry(
            &self,
            token: &str,
            expires_at: DateTime<Utc>,
        ) -> ContextResult<()> {
            sqlx::query(
                "UPDATE sessions SET expires_at = $1, updated_at = NOW() WHERE token = $2 AND active = true",
            )
            .bind(expires_at)
            .bind(token)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn delete_session(&self, token: &str) -> ContextResult<()> {
            sqlx::query("DELETE FROM sessions WHERE token = $1")
                .bind(token)
                .execute(&self.pool)
                .await?;
            Ok(())
        }


        async fn update_session_active_context(
            &self,
            token: &str,
            organization_id: Option<&str>,
            team_id: Option<&str>,
        ) -> ContextResult<S> {
            sqlx::query_as::<_, S>(
                "UPDATE sessions SET active_organization_id = $1, active_team_id = $2, updated_at = NOW() WHERE token = $3 AND active = true RETURNING *",
            )
            .bind(organization_id)
            .bind(team_id)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ContextError::SessionNotFound)
        }
    }

    // -- OrganizationOps --

    #[async_trait]
    impl<U, S, O, M, T, TM> OrganizationOps for SqlxAdapter<U, S, O, M, T, TM>
    where
        U: AuthUser + SqlxEntity,
        S: AuthSession + SqlxEntity,
        O: AuthOrganization + SqlxEntity,
        M: AuthMember + SqlxEntity,
        T: AuthTeam + SqlxEntity,
        TM: AuthTeamMember + SqlxEntity,
    {
        type Organization = O;

        async fn create_organization(&self, create_org: CreateOrganization) -> ContextResult<O> {
            let id = create_org.id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let now = Utc::now();

            sqlx::query_as::<_, O>(
                r#"
                INSERT INTO organization (id, name, slug, logo, metadata, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(&id)
            .bind(&create_org.name)
            .bind(&create_org.slug)
            .bind(&create_org.logo)
            .bind(create_org.metadata.map(sqlx::types::Json))
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_or(e, "Organization slug already exists"))
        }

        async fn get_organization_by_id(&self, id: &str) -> ContextResult<Option<O>> {
            let organization = sqlx::query_as::<_, O>("SELECT * FROM organization WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(organization)
        }

        async fn get_organization_by_slug(&self, slug: &str) -> ContextResult<Option<O>> {
            let organization = sqlx::query_as::<_, O>("SELECT * FROM organization WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
            Ok(organization)
        }

        async fn delete_organization(&self, id: &str) -> ContextResult<()> {
            // member, team and team_member rows cascade
            sqlx::query("DELETE FROM organization WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }
    }

    // -- MemberOps --

    #[async_trait]
    impl<U, S, O, M, T, TM> MemberOps for SqlxAdapter<U, S, O, M, T, TM>
    where
        U: AuthUser + SqlxEntity,
        S: AuthSession + SqlxEntity,
        O: AuthOrganization + SqlxEntity,
        M: AuthMember + SqlxEntity,
        T: AuthTeam + SqlxEntity,
        TM: AuthTeamMember + SqlxEntity,
    {
        type Member = M;

        async fn create_member(&self, create_member: CreateMember) -> ContextResult<M> {
            let id = Uuid::new_v4().to_string();
            let now = Utc::now();

            sqlx::query_as::<_, M>(
                r#"
                INSERT INTO member (id, organization_id, user_id, role, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(&id)
            .bind(&create_member.organization_id)
            .bind(&create_member.user_id)
            .bind(&create_member.role)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_or(e, "User is already a member of this organization"))
        }

        async fn get_member(
            &self,
            organization_id: &str,
            user_id: &str,
        ) -> ContextResult<Option<M>> {
            let member = sqlx::query_as::<_, M>(
                "SELECT * FROM member WHERE organization_id = $1 AND user_id = $2",
            )
            .bind(organization_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(member)
        }

        async fn list_user_memberships(&self, user_id: &str) -> ContextResult<Vec<M>> {
            let members = sqlx::query_as::<_, M>(
                "SELECT * FROM member WHERE user_id = $1 ORDER BY created_at ASC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(members)
        }


        async fn update_member_role(&self, member_id: &str, role: &str) -> ContextResult<M> {
            let mut tx = self.pool.begin().await?;

            let current = sqlx::query_as::<_, M>("SELECT * FROM member WHERE id = $1 FOR UPDATE")
                .bind(member_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ContextError::not_found("Member not found"))?;

            if MemberRole::holds(current.role(), MemberRole::Owner)
                && !MemberRole::holds(role, MemberRole::Owner)
            {
                let owners: i64 = sqlx::query_scalar(OWNER_COUNT_SQL)
                    .bind(current.organization_id())
                    .bind(MemberRole::Owner.as_str())
                    .fetch_one(&mut *tx)
                    .await?;
                if owners <= 1 {
                    return Err(ContextError::bad_request(
                        "Cannot demote the last owner of an organization",
                    ));
                }
            }

            let member =
                sqlx::query_as::<_, M>("UPDATE member SET role = $1 WHERE id = $2 RETURNING *")
                    .bind(role)
                    .bind(member_id)
                    .fetch_one(&mut *tx)
                    .await?;
            tx.commit().await?;
            Ok(member)
        }

        async fn delete_member(&self, member_id: &str) -> ContextResult<()> {
            let mut tx = self.pool.begin().await?;

            let Some(current) =
                sqlx::query_as::<_, M>("SELECT * FROM member WHERE id = $1 FOR UPDATE")
                    .bind(member_id)
                    .fetch_optional(&mut *tx)
                    .await?
            else {
                return Ok(());
            };

            if MemberRole::holds(current.role(), MemberRole::Owner) {
                let owners: i64 = sqlx::query_scalar(OWNER_COUNT_SQL)
                    .bind(current.organization_id())
                    .bind(MemberRole::Owner.as_str())
                    .fetch_one(&mut *tx)
                    .await?;
                if owners <= 1 {
                    return Err(ContextError::bad_request(
                        "Cannot remove the last owner of an organization",
                    ));
                }
            }

            sqlx::query("DELETE FROM member WHERE id = $1")
                .bind(member_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(())
        }

        async fn count_organization_owners(&self, organization_id: &str) -> ContextResult<usize> {
            let count: i64 = sqlx::query_scalar(OWNER_COUNT_SQL)
                .bind(organization_id)
                .bind(MemberRole::Owner.as_str())
                .fetch_one(&self.pool)
                .await?;
            Ok(count as usize)
        }
    }

    // -- TeamOps --

    #[async_trait]
    impl<U, S, O, M, T, TM> TeamOps for SqlxAdapter<U, S, O, M, T, TM>
    where
        U: AuthUser + SqlxEntity,
        S: AuthSession + SqlxEntity,
        O: AuthOrganization + SqlxEntity,
        M: AuthMember + SqlxEntity,
        T: AuthTeam + SqlxEntity,
        TM: AuthTeamMember + SqlxEntity,
    {
        type Team = T;

        async fn create_team(&self, create_team: CreateTeam) -> ContextResult<T> {
            let id = create_team.id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let now = Utc::now();

            let team = sqlx::query_as::<_, T>(
                r#"
                INSERT INTO team (id, name, organization_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(&id)
            .bind(&create_team.name)
            .bind(&create_team.organization_id)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
            Ok(team)
        }

        async fn get_team_by_id(&self, id: &str) -> ContextResult<Option<T>> {
            let team = sqlx::query_as::<_, T>("SELECT * FROM team WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(team)
        }

        async fn list_organization_teams(&self, organization_id: &str) -> ContextResult<Vec<T>> {
            let teams = sqlx::query_as::<_, T>(
                "SELECT * FROM team WHERE organization_id = $1 ORDER BY created_at ASC",
            )
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(teams)
        }

        async fn delete_team(&self, id: &str) -> ContextResult<()> {
            sqlx::query("DELETE FROM team WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }
    }

    // -- TeamMemberOps --

    #[async_trait]
    impl<U, S, O, M, T, TM> TeamMemberOps for SqlxAdapter<U, S, O, M, T, TM>
    where
        U: AuthUser + SqlxEntity,
        S: AuthSession + SqlxEntity,
        O: AuthOrganization + SqlxEntity,
        M: AuthMember + SqlxEntity,
        T: AuthTeam + SqlxEntity,
        TM: AuthTeamMember + SqlxEntity,
    {
        type TeamMember = TM;

        async fn create_team_member(&self, create: CreateTeamMember) -> ContextResult<TM> {
            let id = Uuid::new_v4().to_string();

            sqlx::query_as::<_, TM>(
                r#"
                INSERT INTO team_member (id, team_id, user_id, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(&id)
            .bind(&create.team_id)
            .bind(&create.user_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_or(e, "User is already a member of this team"))
        }

        async fn get_team_member(
            &self,
            team_id: &str,
            user_id: &str,
        ) -> ContextResult<Option<TM>> {
            let row = sqlx::query_as::<_, TM>(
                "SELECT * FROM team_member WHERE team_id = $1 AND user_id = $2",
            )
            .bind(team_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn list_user_team_memberships(&self, user_id: &str) -> ContextResult<Vec<TM>> {
            let rows = sqlx::query_as::<_, TM>(
                "SELECT * FROM team_member WHERE user_id = $1 ORDER BY created_at ASC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }
}
