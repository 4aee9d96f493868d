//! In-memory repositories.
//!
//! Used by the unit and HTTP tests, and handy for running the server without
//! PostgreSQL. Transactions stage their writes and publish them on commit.
//! A commit is refused when a row it touches was changed by another
//! transaction after it was first read, mirroring the version guard of the
//! PostgreSQL repository.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::repository::{TournamentRepository, TournamentTransaction, UserRepository};
use crate::auth::{AuthError, AuthResult, NewUser, User, UserCredentials, UserId};
use crate::tournament::{
    NewTournamentRecord, Tournament, TournamentError, TournamentId, TournamentResult,
    TournamentUpdate,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct UserTable {
    rows: BTreeMap<UserId, UserCredentials>,
    next_id: i64,
}

/// In-memory credential store
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<UserTable>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a user with a known password hash
    pub fn with_user(self, user: User, password_hash: &str) -> Self {
        {
            let mut table = lock(&self.users);
            table.next_id = table.next_id.max(user.id);
            table.rows.insert(
                user.id,
                UserCredentials {
                    user,
                    password_hash: password_hash.to_string(),
                },
            );
        }
        self
    }

    pub fn set_active(&self, user_id: UserId, is_active: bool) {
        if let Some(row) = lock(&self.users).rows.get_mut(&user_id) {
            row.user.is_active = is_active;
        }
    }

    fn username_of(&self, user_id: UserId) -> Option<String> {
        lock(&self.users)
            .rows
            .get(&user_id)
            .map(|row| row.user.username.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, new_user: &NewUser) -> AuthResult<User> {
        let mut table = lock(&self.users);

        if table
            .rows
            .values()
            .any(|row| row.user.username == new_user.username)
        {
            return Err(AuthError::UsernameTaken);
        }
        if table.rows.values().any(|row| row.user.email == new_user.email) {
            return Err(AuthError::EmailTaken);
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            role: new_user.role,
            is_active: true,
            created_at: Utc::now(),
        };
        table.rows.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: new_user.password_hash.clone(),
            },
        );

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserCredentials>> {
        Ok(lock(&self.users)
            .rows
            .values()
            .find(|row| row.user.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(lock(&self.users)
            .rows
            .values()
            .find(|row| row.user.email == email)
            .map(|row| row.user.clone()))
    }

    async fn find_by_id(&self, user_id: i64) -> AuthResult<Option<User>> {
        Ok(lock(&self.users)
            .rows
            .get(&user_id)
            .map(|row| row.user.clone()))
    }
}

#[derive(Default)]
struct TournamentTable {
    rows: BTreeMap<TournamentId, Tournament>,
    team_counts: HashMap<TournamentId, i64>,
    next_id: i64,
}

/// In-memory tournament store
#[derive(Clone, Default)]
pub struct InMemoryTournamentRepository {
    users: InMemoryUserRepository,
    table: Arc<Mutex<TournamentTable>>,
    fail_next_write: Arc<AtomicBool>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryTournamentRepository {
    /// Organizer names are resolved against `users`
    pub fn new(users: InMemoryUserRepository) -> Self {
        Self {
            users,
            ..Default::default()
        }
    }

    /// Stand-in for team registrations, which live outside this service
    pub fn set_registered_teams(&self, id: TournamentId, count: i64) {
        lock(&self.table).team_counts.insert(id, count);
    }

    /// Make the next insert, update or delete fail with a storage error
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Make the next commit fail with a storage error, publishing nothing
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of committed tournaments
    pub fn len(&self) -> usize {
        lock(&self.table).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_write(&self) -> TournamentResult<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(TournamentError::Database(sqlx::Error::Protocol(
                "injected write failure".to_string(),
            )));
        }
        Ok(())
    }

    fn enrich(&self, mut tournament: Tournament, team_counts: &HashMap<TournamentId, i64>) -> Tournament {
        tournament.organizer_name = self.users.username_of(tournament.created_by);
        tournament.registered_teams = team_counts.get(&tournament.id).copied().unwrap_or(0);
        tournament
    }

    fn committed(&self, id: TournamentId) -> Option<Tournament> {
        let table = lock(&self.table);
        table
            .rows
            .get(&id)
            .cloned()
            .map(|t| self.enrich(t, &table.team_counts))
    }
}

#[async_trait]
impl TournamentRepository for InMemoryTournamentRepository {
    async fn list_page(&self, skip: i64, limit: i64) -> TournamentResult<Vec<Tournament>> {
        let table = lock(&self.table);
        let mut rows: Vec<&Tournament> = table.rows.values().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|t| self.enrich(t.clone(), &table.team_counts))
            .collect())
    }

    async fn get_by_id(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        Ok(self.committed(id))
    }

    async fn begin(&self) -> TournamentResult<Box<dyn TournamentTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            repo: self.clone(),
            staged: BTreeMap::new(),
            base_versions: HashMap::new(),
        }))
    }

    async fn ping(&self) -> TournamentResult<()> {
        Ok(())
    }
}

/// Staged writes; `None` marks a deletion
struct InMemoryTransaction {
    repo: InMemoryTournamentRepository,
    staged: BTreeMap<TournamentId, Option<Tournament>>,
    /// Committed version of every existing row this transaction changed
    base_versions: HashMap<TournamentId, i32>,
}

impl InMemoryTransaction {
    fn current(&self, id: TournamentId) -> Option<Tournament> {
        match self.staged.get(&id) {
            Some(staged) => staged.clone(),
            None => lock(&self.repo.table).rows.get(&id).cloned(),
        }
    }

    fn stage(&mut self, id: TournamentId, row: Option<Tournament>) {
        if !self.staged.contains_key(&id) {
            if let Some(committed) = lock(&self.repo.table).rows.get(&id) {
                self.base_versions.insert(id, committed.version);
            }
        }
        self.staged.insert(id, row);
    }
}

#[async_trait]
impl TournamentTransaction for InMemoryTransaction {
    async fn insert(&mut self, record: &NewTournamentRecord) -> TournamentResult<TournamentId> {
        self.repo.check_write()?;

        let id = {
            let mut table = lock(&self.repo.table);
            table.next_id += 1;
            table.next_id
        };
        let now = Utc::now();
        let tournament = Tournament {
            id,
            name: record.name.clone(),
            description: record.description.clone(),
            tournament_type: record.tournament_type,
            status: record.status,
            rules: record.rules.clone(),
            max_teams: record.max_teams,
            registration_deadline: record.registration_deadline,
            start_date: record.start_date,
            end_date: record.end_date,
            created_by: record.created_by,
            created_at: now,
            updated_at: now,
            version: 1,
            organizer_name: None,
            registered_teams: 0,
        };
        self.staged.insert(id, Some(tournament));

        Ok(id)
    }

    async fn get_by_id(&mut self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let team_counts = lock(&self.repo.table).team_counts.clone();
        Ok(self
            .current(id)
            .map(|t| self.repo.enrich(t, &team_counts)))
    }

    async fn update(
        &mut self,
        id: TournamentId,
        expected_version: i32,
        changes: &TournamentUpdate,
    ) -> TournamentResult<bool> {
        self.repo.check_write()?;

        let Some(current) = self.current(id) else {
            return Ok(false);
        };
        if current.version != expected_version {
            return Ok(false);
        }

        let mut updated = changes.apply_to(&current);
        updated.version += 1;
        updated.updated_at = Utc::now();
        self.stage(id, Some(updated));

        Ok(true)
    }

    async fn delete(&mut self, id: TournamentId) -> TournamentResult<bool> {
        self.repo.check_write()?;

        if self.current(id).is_none() {
            return Ok(false);
        }
        self.stage(id, None);

        Ok(true)
    }

    async fn commit(self: Box<Self>) -> TournamentResult<()> {
        if self.repo.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(TournamentError::Database(sqlx::Error::Protocol(
                "injected commit failure".to_string(),
            )));
        }

        let mut table = lock(&self.repo.table);
        for (&id, &expected) in &self.base_versions {
            match table.rows.get(&id) {
                Some(row) if row.version == expected => {}
                Some(row) => {
                    return Err(TournamentError::VersionConflict {
                        expected,
                        actual: row.version,
                    });
                }
                None => return Err(TournamentError::NotFound(id)),
            }
        }

        for (id, staged) in self.staged {
            match staged {
                Some(tournament) => {
                    table.rows.insert(id, tournament);
                }
                None => {
                    table.rows.remove(&id);
                    table.team_counts.remove(&id);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> TournamentResult<()> {
        Ok(())
    }
}
