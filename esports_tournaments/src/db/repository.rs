//! Repository trait definitions for testability and dependency injection.
//!
//! This module provides trait-based abstractions over database operations,
//! enabling better testing through in-memory implementations and dependency
//! injection. The PostgreSQL implementations live alongside the traits.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::auth::{AuthError, AuthResult, NewUser, Role, UnknownVariant, User, UserCredentials};
use crate::tournament::{
    NewTournamentRecord, Tournament, TournamentId, TournamentResult, TournamentStatus,
    TournamentType, TournamentUpdate,
};

/// Trait for user/credential store operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create_user(&self, new_user: &NewUser) -> AuthResult<User>;

    /// Find user and password hash by username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserCredentials>>;

    /// Find user by email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: i64) -> AuthResult<Option<User>>;
}

/// Trait for tournament storage
///
/// Reads outside a transaction are served directly; every write goes through
/// a [`TournamentTransaction`] obtained from [`TournamentRepository::begin`].
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Enriched tournaments, newest first
    async fn list_page(&self, skip: i64, limit: i64) -> TournamentResult<Vec<Tournament>>;

    /// Enriched tournament by ID
    async fn get_by_id(&self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

    /// Open a transaction scope
    async fn begin(&self) -> TournamentResult<Box<dyn TournamentTransaction>>;

    /// Check the backing store is reachable
    async fn ping(&self) -> TournamentResult<()>;
}

/// Atomic unit of work against tournament storage.
///
/// Dropping a transaction without committing discards its changes.
#[async_trait]
pub trait TournamentTransaction: Send {
    /// Insert a tournament, returning its generated ID
    async fn insert(&mut self, record: &NewTournamentRecord) -> TournamentResult<TournamentId>;

    /// Enriched tournament by ID, seeing this transaction's own writes
    async fn get_by_id(&mut self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

    /// Apply the present fields of `changes` if the stored version still equals
    /// `expected_version`. Returns `false` when no row matched.
    async fn update(
        &mut self,
        id: TournamentId,
        expected_version: i32,
        changes: &TournamentUpdate,
    ) -> TournamentResult<bool>;

    /// Delete a tournament. Returns `false` when no row matched.
    async fn delete(&mut self, id: TournamentId) -> TournamentResult<bool>;

    async fn commit(self: Box<Self>) -> TournamentResult<()>;

    async fn rollback(self: Box<Self>) -> TournamentResult<()>;
}

fn decode_error(e: UnknownVariant) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}

/// Default PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            role: role.parse::<Role>().map_err(decode_error)?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        })
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, new_user: &NewUser) -> AuthResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, role, is_active, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(Self::user_from_row(&row)?),
            // Lost a race with a concurrent registration
            Err(sqlx::Error::Database(db_err)) => match db_err.constraint() {
                Some("users_username_key") => Err(AuthError::UsernameTaken),
                Some("users_email_key") => Err(AuthError::EmailTaken),
                _ => Err(AuthError::Database(sqlx::Error::Database(db_err))),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserCredentials>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, role, is_active, created_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(UserCredentials {
                user: Self::user_from_row(&r)?,
                password_hash: r.try_get("password_hash")?,
            })),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, role, is_active, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::user_from_row).transpose()?)
    }

    async fn find_by_id(&self, user_id: i64) -> AuthResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, role, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::user_from_row).transpose()?)
    }
}

/// Enriched projection shared by every tournament read
const TOURNAMENT_SELECT: &str = r#"
    SELECT t.id, t.name, t.description, t.tournament_type, t.status, t.rules, t.max_teams,
           t.registration_deadline, t.start_date, t.end_date, t.created_by,
           t.created_at, t.updated_at, t.version,
           u.username AS organizer_name,
           COUNT(DISTINCT tt.team_id) AS registered_teams
    FROM tournaments t
    LEFT JOIN users u ON t.created_by = u.id
    LEFT JOIN tournament_teams tt ON t.id = tt.tournament_id
"#;

fn tournament_from_row(row: &PgRow) -> Result<Tournament, sqlx::Error> {
    let tournament_type: String = row.try_get("tournament_type")?;
    let status: String = row.try_get("status")?;

    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        tournament_type: tournament_type
            .parse::<TournamentType>()
            .map_err(decode_error)?,
        status: status.parse::<TournamentStatus>().map_err(decode_error)?,
        rules: row.try_get("rules")?,
        max_teams: row.try_get("max_teams")?,
        registration_deadline: row
            .try_get::<NaiveDateTime, _>("registration_deadline")?
            .and_utc(),
        start_date: row.try_get::<NaiveDateTime, _>("start_date")?.and_utc(),
        end_date: row.try_get::<NaiveDateTime, _>("end_date")?.and_utc(),
        created_by: row.try_get("created_by")?,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        updated_at: row.try_get::<NaiveDateTime, _>("updated_at")?.and_utc(),
        version: row.try_get("version")?,
        organizer_name: row.try_get("organizer_name")?,
        registered_teams: row.try_get("registered_teams")?,
    })
}

fn by_id_query() -> String {
    format!("{TOURNAMENT_SELECT} WHERE t.id = $1 GROUP BY t.id, u.username")
}

/// Default PostgreSQL implementation of `TournamentRepository`
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn list_page(&self, skip: i64, limit: i64) -> TournamentResult<Vec<Tournament>> {
        let sql = format!(
            "{TOURNAMENT_SELECT} GROUP BY t.id, u.username
             ORDER BY t.created_at DESC, t.id DESC
             LIMIT $1 OFFSET $2"
        );

        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(tournament_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_by_id(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let sql = by_id_query();
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(tournament_from_row).transpose()?)
    }

    async fn begin(&self) -> TournamentResult<Box<dyn TournamentTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTournamentTransaction { tx }))
    }

    async fn ping(&self) -> TournamentResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// PostgreSQL transaction scope
pub struct PgTournamentTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TournamentTransaction for PgTournamentTransaction {
    async fn insert(&mut self, record: &NewTournamentRecord) -> TournamentResult<TournamentId> {
        let row = sqlx::query(
            r#"
            INSERT INTO tournaments (
                name, description, tournament_type, status, rules,
                max_teams, registration_deadline, start_date, end_date, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.tournament_type.as_str())
        .bind(record.status.as_str())
        .bind(&record.rules)
        .bind(record.max_teams)
        .bind(record.registration_deadline.naive_utc())
        .bind(record.start_date.naive_utc())
        .bind(record.end_date.naive_utc())
        .bind(record.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn get_by_id(&mut self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let sql = by_id_query();
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.as_ref().map(tournament_from_row).transpose()?)
    }

    async fn update(
        &mut self,
        id: TournamentId,
        expected_version: i32,
        changes: &TournamentUpdate,
    ) -> TournamentResult<bool> {
        // Absent fields bind NULL and keep the stored column
        let result = sqlx::query(
            r#"
            UPDATE tournaments SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                rules = COALESCE($5, rules),
                max_teams = COALESCE($6, max_teams),
                registration_deadline = COALESCE($7, registration_deadline),
                start_date = COALESCE($8, start_date),
                end_date = COALESCE($9, end_date),
                status = COALESCE($10, status),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.rules)
        .bind(changes.max_teams)
        .bind(changes.registration_deadline.map(|d| d.naive_utc()))
        .bind(changes.start_date.map(|d| d.naive_utc()))
        .bind(changes.end_date.map(|d| d.naive_utc()))
        .bind(changes.status.map(|s| s.as_str()))
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&mut self, id: TournamentId) -> TournamentResult<bool> {
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> TournamentResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> TournamentResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
