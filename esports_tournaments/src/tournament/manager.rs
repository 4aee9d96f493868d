//! Tournament lifecycle orchestration.
//!
//! Every mutating operation runs inside one repository transaction: fetch,
//! authorize, validate, write, re-read, commit. Any failure rolls back.

use super::{
    errors::{TournamentError, TournamentResult},
    models::{
        NewTournament, NewTournamentRecord, Tournament, TournamentId, TournamentSettings,
        TournamentStatus, TournamentUpdate,
    },
    policy::{Operation, authorize},
    validation::{validate_new, validate_update},
};
use crate::auth::Actor;
use crate::db::{TournamentRepository, TournamentTransaction};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    repository: Arc<dyn TournamentRepository>,
    settings: TournamentSettings,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(repository: Arc<dyn TournamentRepository>, settings: TournamentSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn settings(&self) -> &TournamentSettings {
        &self.settings
    }

    /// List tournaments, newest first.
    ///
    /// `skip` below zero is treated as zero and `limit` is clamped to
    /// `[1, max_page_size]`.
    pub async fn list(&self, skip: i64, limit: i64) -> TournamentResult<Vec<Tournament>> {
        let (skip, limit) = self.settings.page(skip, limit);
        self.repository.list_page(skip, limit).await
    }

    /// Get a single tournament
    pub async fn get(&self, id: TournamentId) -> TournamentResult<Tournament> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(TournamentError::NotFound(id))
    }

    /// Create a tournament owned by `actor`.
    ///
    /// The stored status is always `registration` and the owner is always the
    /// actor, whatever the payload says.
    ///
    /// # Errors
    ///
    /// * `TournamentError::PermissionDenied` - Actor is a player
    /// * `TournamentError::Validation` - Payload violates an invariant
    /// * `TournamentError::Persistence` - The write failed and was rolled back
    pub async fn create(
        &self,
        actor: &Actor,
        payload: NewTournament,
    ) -> TournamentResult<Tournament> {
        self.check_access(actor, Operation::Create, None)?;
        validate_new(&payload, Utc::now())?;

        if payload
            .status
            .is_some_and(|status| status != TournamentStatus::Registration)
        {
            debug!("Ignoring client-supplied status on create by user {}", actor.id);
        }
        if payload.created_by.is_some_and(|owner| owner != actor.id) {
            debug!("Ignoring client-supplied owner on create by user {}", actor.id);
        }
        let record = NewTournamentRecord::from_payload(payload, actor.id);

        let mut tx = self
            .repository
            .begin()
            .await
            .map_err(TournamentError::into_write_failure)?;
        let result = insert_in(tx.as_mut(), &record).await;
        let tournament = finish(tx, result)
            .await
            .map_err(TournamentError::into_write_failure)?;

        info!(
            "Tournament {} '{}' created by user {}",
            tournament.id, tournament.name, actor.id
        );
        Ok(tournament)
    }

    /// Apply a partial update.
    ///
    /// An update with no fields returns the stored record untouched. The write
    /// is guarded by `expected_version`, or by the version read inside the
    /// transaction when the caller does not send one.
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotFound` - No such tournament
    /// * `TournamentError::PermissionDenied` - Actor neither owns it nor is an admin
    /// * `TournamentError::VersionConflict` - Stored version differs from the expected one
    /// * `TournamentError::Validation` - Merged record violates an invariant
    pub async fn update(
        &self,
        actor: &Actor,
        id: TournamentId,
        update: TournamentUpdate,
    ) -> TournamentResult<Tournament> {
        let mut tx = self.repository.begin().await?;
        let result = self.update_in(tx.as_mut(), actor, id, &update).await;
        let tournament = finish(tx, result).await?;

        if !update.is_empty() {
            info!(
                "Tournament {} updated by user {} (version {})",
                id, actor.id, tournament.version
            );
        }
        Ok(tournament)
    }

    /// Delete a tournament and its team registrations
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotFound` - No such tournament
    /// * `TournamentError::PermissionDenied` - Actor neither owns it nor is an admin
    pub async fn delete(&self, actor: &Actor, id: TournamentId) -> TournamentResult<()> {
        let mut tx = self.repository.begin().await?;
        let result = self.delete_in(tx.as_mut(), actor, id).await;
        finish(tx, result).await?;

        info!("Tournament {} deleted by user {}", id, actor.id);
        Ok(())
    }

    /// Check that the backing store is reachable
    pub async fn health_check(&self) -> TournamentResult<()> {
        self.repository.ping().await
    }

    async fn update_in(
        &self,
        tx: &mut dyn TournamentTransaction,
        actor: &Actor,
        id: TournamentId,
        update: &TournamentUpdate,
    ) -> TournamentResult<Tournament> {
        let current = fetch(tx, id).await?;
        self.check_access(
            actor,
            Operation::Update {
                owner: current.created_by,
            },
            Some(id),
        )?;

        if update.is_empty() {
            return Ok(current);
        }

        let expected = update.expected_version.unwrap_or(current.version);
        if expected != current.version {
            return Err(TournamentError::VersionConflict {
                expected,
                actual: current.version,
            });
        }

        validate_update(&current, update, Utc::now())?;

        let applied = tx
            .update(id, expected, update)
            .await
            .map_err(TournamentError::into_write_failure)?;
        if !applied {
            // Changed by a concurrent writer after our read
            let actual = fetch(tx, id).await?.version;
            return Err(TournamentError::VersionConflict { expected, actual });
        }

        fetch(tx, id).await
    }

    async fn delete_in(
        &self,
        tx: &mut dyn TournamentTransaction,
        actor: &Actor,
        id: TournamentId,
    ) -> TournamentResult<()> {
        let current = fetch(tx, id).await?;
        self.check_access(
            actor,
            Operation::Delete {
                owner: current.created_by,
            },
            Some(id),
        )?;

        let deleted = tx
            .delete(id)
            .await
            .map_err(TournamentError::into_write_failure)?;
        if !deleted {
            return Err(TournamentError::NotFound(id));
        }
        Ok(())
    }

    fn check_access(
        &self,
        actor: &Actor,
        operation: Operation,
        id: Option<TournamentId>,
    ) -> TournamentResult<()> {
        authorize(actor, operation).map_err(|denied| {
            match id {
                Some(id) => warn!(
                    "User {} ({}) denied {} on tournament {}: {}",
                    actor.id,
                    actor.role,
                    operation.name(),
                    id,
                    denied
                ),
                None => warn!(
                    "User {} ({}) denied {}: {}",
                    actor.id,
                    actor.role,
                    operation.name(),
                    denied
                ),
            }
            TournamentError::from(denied)
        })
    }
}

async fn fetch(tx: &mut dyn TournamentTransaction, id: TournamentId) -> TournamentResult<Tournament> {
    tx.get_by_id(id)
        .await?
        .ok_or(TournamentError::NotFound(id))
}

async fn insert_in(
    tx: &mut dyn TournamentTransaction,
    record: &NewTournamentRecord,
) -> TournamentResult<Tournament> {
    let id = tx.insert(record).await?;
    tx.get_by_id(id).await?.ok_or_else(|| {
        TournamentError::Persistence(format!("tournament {id} missing after insert"))
    })
}

/// Commit on success, roll back on failure
async fn finish<T>(
    tx: Box<dyn TournamentTransaction>,
    result: TournamentResult<T>,
) -> TournamentResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(TournamentError::into_write_failure)?;
            Ok(value)
        }
        Err(e) => {
            warn!("Rolling back tournament transaction: {}", e);
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::memory::InMemoryTournamentRepository;
    use crate::tournament::{TournamentType, ValidationError};
    use chrono::Duration;

    const ORGANIZER: Actor = Actor { id: 1, role: Role::Organizer };
    const PLAYER: Actor = Actor { id: 2, role: Role::Player };
    const OTHER_ORGANIZER: Actor = Actor { id: 9, role: Role::Organizer };
    const ADMIN: Actor = Actor { id: 100, role: Role::Admin };

    fn setup() -> (TournamentManager, InMemoryTournamentRepository) {
        let repo = InMemoryTournamentRepository::default();
        let manager = TournamentManager::new(Arc::new(repo.clone()), TournamentSettings::default());
        (manager, repo)
    }

    fn cup() -> NewTournament {
        let now = Utc::now();
        NewTournament {
            name: "Cup".to_string(),
            description: Some("Weekend cup".to_string()),
            tournament_type: TournamentType::SingleElimination,
            rules: Some("Best of three".to_string()),
            max_teams: 8,
            registration_deadline: now + Duration::days(1),
            start_date: now + Duration::days(2),
            end_date: now + Duration::days(3),
            status: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_organizer_creates_tournament_in_registration() {
        let (manager, _) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();

        assert_eq!(created.status, TournamentStatus::Registration);
        assert_eq!(created.created_by, 1);
        assert_eq!(created.version, 1);
        assert_eq!(created.registered_teams, 0);
    }

    #[tokio::test]
    async fn test_client_status_and_owner_are_ignored() {
        let (manager, _) = setup();
        let mut payload = cup();
        payload.status = Some(TournamentStatus::Completed);
        payload.created_by = Some(ADMIN.id);

        let created = manager.create(&ORGANIZER, payload).await.unwrap();
        assert_eq!(created.status, TournamentStatus::Registration);
        assert_eq!(created.created_by, ORGANIZER.id);
    }

    #[tokio::test]
    async fn test_odd_max_teams_rejected() {
        let (manager, repo) = setup();
        let mut payload = cup();
        payload.max_teams = 7;

        let err = manager.create(&ORGANIZER, payload).await.unwrap_err();
        assert!(matches!(
            err,
            TournamentError::Validation(ValidationError::MaxTeamsOdd(7))
        ));
        assert!(err.to_string().contains("must be even"));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_player_cannot_create() {
        let (manager, repo) = setup();
        let err = manager.create(&PLAYER, cup()).await.unwrap_err();

        assert!(matches!(err, TournamentError::PermissionDenied(_)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_tournament() {
        let (manager, _) = setup();
        let err = manager.get(404).await.unwrap_err();
        assert!(matches!(err, TournamentError::NotFound(404)));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_may_update() {
        let (manager, _) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();
        let rename = TournamentUpdate {
            name: Some("Spring Cup".to_string()),
            ..Default::default()
        };

        let err = manager
            .update(&OTHER_ORGANIZER, created.id, rename.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::PermissionDenied(_)));

        let updated = manager.update(&ADMIN, created.id, rename).await.unwrap();
        assert_eq!(updated.name, "Spring Cup");
        assert_eq!(updated.version, 2);
        assert_eq!(updated.created_by, ORGANIZER.id);
    }

    #[tokio::test]
    async fn test_player_non_owner_cannot_update_or_delete() {
        let (manager, _) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();

        let update = TournamentUpdate {
            max_teams: Some(16),
            ..Default::default()
        };
        assert!(matches!(
            manager.update(&PLAYER, created.id, update).await,
            Err(TournamentError::PermissionDenied(_))
        ));
        assert!(matches!(
            manager.delete(&PLAYER, created.id).await,
            Err(TournamentError::PermissionDenied(_))
        ));
        assert_eq!(manager.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_not_found_precedes_permission() {
        let (manager, _) = setup();
        let update = TournamentUpdate {
            name: Some("Anything".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            manager.update(&PLAYER, 77, update).await,
            Err(TournamentError::NotFound(77))
        ));
        assert!(matches!(
            manager.delete(&PLAYER, 77).await,
            Err(TournamentError::NotFound(77))
        ));
    }

    #[tokio::test]
    async fn test_empty_update_returns_record_unchanged() {
        let (manager, _) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();

        let same = manager
            .update(&ORGANIZER, created.id, TournamentUpdate::default())
            .await
            .unwrap();
        assert_eq!(same, created);
        assert_eq!(manager.get(created.id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_create_then_get_matches_payload() {
        let (manager, _) = setup();
        let payload = cup();
        let created = manager.create(&ORGANIZER, payload.clone()).await.unwrap();
        let fetched = manager.get(created.id).await.unwrap();

        assert_eq!(fetched.name, payload.name);
        assert_eq!(fetched.description, payload.description);
        assert_eq!(fetched.tournament_type, payload.tournament_type);
        assert_eq!(fetched.rules, payload.rules);
        assert_eq!(fetched.max_teams, payload.max_teams);
        assert_eq!(fetched.registration_deadline, payload.registration_deadline);
        assert_eq!(fetched.start_date, payload.start_date);
        assert_eq!(fetched.end_date, payload.end_date);
    }

    #[tokio::test]
    async fn test_long_tournament_rejected() {
        let (manager, _) = setup();
        let mut payload = cup();
        payload.end_date = payload.start_date + Duration::days(31);

        let err = manager.create(&ORGANIZER, payload).await.unwrap_err();
        assert!(matches!(
            err,
            TournamentError::Validation(ValidationError::DurationTooLong { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_validates_merged_schedule() {
        let (manager, _) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();

        // New start lands after the stored end date
        let update = TournamentUpdate {
            start_date: Some(created.end_date + Duration::hours(1)),
            ..Default::default()
        };
        let err = manager.update(&ORGANIZER, created.id, update).await.unwrap_err();
        assert!(matches!(
            err,
            TournamentError::Validation(ValidationError::EndNotAfterStart)
        ));
    }

    #[tokio::test]
    async fn test_max_teams_cannot_drop_below_registrations() {
        let (manager, repo) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();
        repo.set_registered_teams(created.id, 6);

        let update = TournamentUpdate {
            max_teams: Some(4),
            ..Default::default()
        };
        let err = manager.update(&ORGANIZER, created.id, update).await.unwrap_err();
        assert!(matches!(
            err,
            TournamentError::Validation(ValidationError::MaxTeamsBelowRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_status_follows_lifecycle() {
        let (manager, _) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();
        let set_status = |status| TournamentUpdate {
            status: Some(status),
            ..Default::default()
        };

        let err = manager
            .update(&ORGANIZER, created.id, set_status(TournamentStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TournamentError::Validation(ValidationError::IllegalTransition { .. })
        ));

        let started = manager
            .update(&ORGANIZER, created.id, set_status(TournamentStatus::InProgress))
            .await
            .unwrap();
        assert_eq!(started.status, TournamentStatus::InProgress);

        let cancelled = manager
            .update(&ORGANIZER, created.id, set_status(TournamentStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.status, TournamentStatus::Cancelled);

        let err = manager
            .update(&ADMIN, created.id, set_status(TournamentStatus::Registration))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TournamentError::Validation(ValidationError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let (manager, _) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();

        let first = TournamentUpdate {
            name: Some("First".to_string()),
            expected_version: Some(created.version),
            ..Default::default()
        };
        let second = TournamentUpdate {
            name: Some("Second".to_string()),
            expected_version: Some(created.version),
            ..Default::default()
        };

        manager.update(&ORGANIZER, created.id, first).await.unwrap();
        let err = manager.update(&ADMIN, created.id, second).await.unwrap_err();
        assert!(matches!(
            err,
            TournamentError::VersionConflict {
                expected: 1,
                actual: 2
            }
        ));
        assert_eq!(manager.get(created.id).await.unwrap().name, "First");
    }

    #[tokio::test]
    async fn test_failed_insert_persists_nothing() {
        let (manager, repo) = setup();
        repo.fail_next_write();

        let err = manager.create(&ORGANIZER, cup()).await.unwrap_err();
        assert!(matches!(err, TournamentError::Persistence(_)));
        assert!(err.is_validation_class());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_leaves_record_intact() {
        let (manager, repo) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();
        repo.fail_next_write();

        let update = TournamentUpdate {
            name: Some("Lost".to_string()),
            ..Default::default()
        };
        let err = manager.update(&ORGANIZER, created.id, update).await.unwrap_err();
        assert!(matches!(err, TournamentError::Persistence(_)));
        assert_eq!(manager.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_failed_commit_on_update_is_persistence() {
        let (manager, repo) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();
        repo.fail_next_commit();

        let update = TournamentUpdate {
            name: Some("Lost".to_string()),
            ..Default::default()
        };
        let err = manager.update(&ORGANIZER, created.id, update).await.unwrap_err();
        assert!(matches!(err, TournamentError::Persistence(_)));
        assert!(err.is_validation_class());
        assert_eq!(manager.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_failed_commit_on_delete_is_persistence() {
        let (manager, repo) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();
        repo.fail_next_commit();

        let err = manager.delete(&ORGANIZER, created.id).await.unwrap_err();
        assert!(matches!(err, TournamentError::Persistence(_)));
        assert_eq!(manager.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_failed_commit_on_create_persists_nothing() {
        let (manager, repo) = setup();
        repo.fail_next_commit();

        let err = manager.create(&ORGANIZER, cup()).await.unwrap_err();
        assert!(matches!(err, TournamentError::Persistence(_)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_owner_deletes_tournament() {
        let (manager, _) = setup();
        let created = manager.create(&ORGANIZER, cup()).await.unwrap();

        manager.delete(&ORGANIZER, created.id).await.unwrap();
        assert!(matches!(
            manager.get(created.id).await,
            Err(TournamentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_clamps_paging() {
        let (manager, _) = setup();
        for _ in 0..3 {
            manager.create(&ORGANIZER, cup()).await.unwrap();
        }

        let all = manager.list(-5, 1000).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id > w[1].id));

        let one = manager.list(0, 0).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].id, all[0].id);
    }

    #[tokio::test]
    async fn test_health_check() {
        let (manager, _) = setup();
        assert!(manager.health_check().await.is_ok());
    }
}
