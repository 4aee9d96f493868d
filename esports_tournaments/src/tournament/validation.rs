//! Field and cross-field validation for tournament payloads.
//!
//! Every check is a pure function of its inputs. The current time is passed
//! in explicitly so callers (and tests) control the clock.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::models::{NewTournament, Tournament, TournamentStatus, TournamentUpdate};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const RULES_MAX_CHARS: usize = 5000;
pub const MIN_TEAMS: i32 = 2;
pub const MAX_TEAMS: i32 = 64;
pub const MAX_DURATION_DAYS: i64 = 30;

/// A violated tournament invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name must be between {min} and {max} characters, got {actual}")]
    NameLength { min: usize, max: usize, actual: usize },

    #[error("Description must be at most {max} characters, got {actual}")]
    DescriptionTooLong { max: usize, actual: usize },

    #[error("Rules must be at most {max} characters, got {actual}")]
    RulesTooLong { max: usize, actual: usize },

    #[error("max_teams must be between {min} and {max}, got {actual}")]
    MaxTeamsOutOfRange { min: i32, max: i32, actual: i32 },

    #[error("max_teams must be even, got {0}")]
    MaxTeamsOdd(i32),

    #[error("max_teams cannot be lower than the {registered} teams already registered")]
    MaxTeamsBelowRegistered { requested: i32, registered: i64 },

    #[error("Registration deadline must be in the future")]
    DeadlineNotInFuture,

    #[error("Start date must be after the registration deadline")]
    StartNotAfterDeadline,

    #[error("End date must be after the start date")]
    EndNotAfterStart,

    #[error("Tournament cannot last more than {max_days} days")]
    DurationTooLong { max_days: i64 },

    #[error("Cannot change status from {from} to {to}")]
    IllegalTransition {
        from: TournamentStatus,
        to: TournamentStatus,
    },
}

pub type ValidationResult = Result<(), ValidationError>;

/// Validate a complete create payload.
pub fn validate_new(payload: &NewTournament, now: DateTime<Utc>) -> ValidationResult {
    check_name(&payload.name)?;
    if let Some(description) = &payload.description {
        check_description(description)?;
    }
    if let Some(rules) = &payload.rules {
        check_rules(rules)?;
    }
    check_max_teams(payload.max_teams)?;
    check_deadline_in_future(payload.registration_deadline, now)?;
    check_schedule(
        payload.registration_deadline,
        payload.start_date,
        payload.end_date,
    )
}

/// Validate a partial update against the stored record.
///
/// Only fields present in `update` are checked. Date ordering is evaluated on
/// the merged view so that unspecified dates keep their stored values. The
/// deadline is only required to lie in the future when it is itself submitted.
pub fn validate_update(
    current: &Tournament,
    update: &TournamentUpdate,
    now: DateTime<Utc>,
) -> ValidationResult {
    if let Some(name) = &update.name {
        check_name(name)?;
    }
    if let Some(description) = &update.description {
        check_description(description)?;
    }
    if let Some(rules) = &update.rules {
        check_rules(rules)?;
    }
    if let Some(max_teams) = update.max_teams {
        check_max_teams(max_teams)?;
        if i64::from(max_teams) < current.registered_teams {
            return Err(ValidationError::MaxTeamsBelowRegistered {
                requested: max_teams,
                registered: current.registered_teams,
            });
        }
    }

    if update.touches_schedule() {
        if let Some(deadline) = update.registration_deadline {
            check_deadline_in_future(deadline, now)?;
        }
        check_schedule(
            update
                .registration_deadline
                .unwrap_or(current.registration_deadline),
            update.start_date.unwrap_or(current.start_date),
            update.end_date.unwrap_or(current.end_date),
        )?;
    }

    if let Some(next) = update.status {
        if !current.status.can_transition_to(next) {
            return Err(ValidationError::IllegalTransition {
                from: current.status,
                to: next,
            });
        }
    }

    Ok(())
}

fn check_name(name: &str) -> ValidationResult {
    let actual = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&actual) {
        return Err(ValidationError::NameLength {
            min: NAME_MIN_CHARS,
            max: NAME_MAX_CHARS,
            actual,
        });
    }
    Ok(())
}

fn check_description(description: &str) -> ValidationResult {
    let actual = description.chars().count();
    if actual > DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            max: DESCRIPTION_MAX_CHARS,
            actual,
        });
    }
    Ok(())
}

fn check_rules(rules: &str) -> ValidationResult {
    let actual = rules.chars().count();
    if actual > RULES_MAX_CHARS {
        return Err(ValidationError::RulesTooLong {
            max: RULES_MAX_CHARS,
            actual,
        });
    }
    Ok(())
}

fn check_max_teams(max_teams: i32) -> ValidationResult {
    if !(MIN_TEAMS..=MAX_TEAMS).contains(&max_teams) {
        return Err(ValidationError::MaxTeamsOutOfRange {
            min: MIN_TEAMS,
            max: MAX_TEAMS,
            actual: max_teams,
        });
    }
    if max_teams % 2 != 0 {
        return Err(ValidationError::MaxTeamsOdd(max_teams));
    }
    Ok(())
}

fn check_deadline_in_future(deadline: DateTime<Utc>, now: DateTime<Utc>) -> ValidationResult {
    if deadline <= now {
        return Err(ValidationError::DeadlineNotInFuture);
    }
    Ok(())
}

fn check_schedule(
    deadline: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ValidationResult {
    if start <= deadline {
        return Err(ValidationError::StartNotAfterDeadline);
    }
    if end <= start {
        return Err(ValidationError::EndNotAfterStart);
    }
    if end - start > Duration::days(MAX_DURATION_DAYS) {
        return Err(ValidationError::DurationTooLong {
            max_days: MAX_DURATION_DAYS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::TournamentType;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn payload() -> NewTournament {
        let t = now();
        NewTournament {
            name: "Cup".to_string(),
            description: None,
            tournament_type: TournamentType::SingleElimination,
            rules: None,
            max_teams: 8,
            registration_deadline: t + Duration::days(1),
            start_date: t + Duration::days(2),
            end_date: t + Duration::days(3),
            status: None,
            created_by: None,
        }
    }

    fn stored() -> Tournament {
        let t = now();
        Tournament {
            id: 1,
            name: "Cup".to_string(),
            description: None,
            tournament_type: TournamentType::SingleElimination,
            status: TournamentStatus::Registration,
            rules: None,
            max_teams: 8,
            registration_deadline: t + Duration::days(1),
            start_date: t + Duration::days(2),
            end_date: t + Duration::days(3),
            created_by: 1,
            created_at: t,
            updated_at: t,
            version: 1,
            organizer_name: None,
            registered_teams: 0,
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        assert_eq!(validate_new(&payload(), now()), Ok(()));
    }

    #[test]
    fn test_odd_max_teams_rejected() {
        let mut p = payload();
        p.max_teams = 7;
        let err = validate_new(&p, now()).unwrap_err();
        assert_eq!(err, ValidationError::MaxTeamsOdd(7));
        assert!(err.to_string().contains("must be even"));
    }

    #[test]
    fn test_max_teams_bounds() {
        for bad in [0, 1, 66, -2] {
            let mut p = payload();
            p.max_teams = bad;
            assert!(
                matches!(
                    validate_new(&p, now()),
                    Err(ValidationError::MaxTeamsOutOfRange { .. })
                ),
                "max_teams {bad} should be out of range"
            );
        }
        for good in [2, 64] {
            let mut p = payload();
            p.max_teams = good;
            assert_eq!(validate_new(&p, now()), Ok(()));
        }
    }

    #[test]
    fn test_name_length_counts_characters() {
        let mut p = payload();
        p.name = "ab".to_string();
        assert!(matches!(
            validate_new(&p, now()),
            Err(ValidationError::NameLength { actual: 2, .. })
        ));

        // Three multi-byte characters are still three characters
        p.name = "ЧМП".to_string();
        assert_eq!(validate_new(&p, now()), Ok(()));

        p.name = "x".repeat(101);
        assert!(validate_new(&p, now()).is_err());
    }

    #[test]
    fn test_description_and_rules_limits() {
        let mut p = payload();
        p.description = Some("d".repeat(1000));
        p.rules = Some("r".repeat(5000));
        assert_eq!(validate_new(&p, now()), Ok(()));

        p.description = Some("d".repeat(1001));
        assert!(matches!(
            validate_new(&p, now()),
            Err(ValidationError::DescriptionTooLong { .. })
        ));

        p.description = None;
        p.rules = Some("r".repeat(5001));
        assert!(matches!(
            validate_new(&p, now()),
            Err(ValidationError::RulesTooLong { .. })
        ));
    }

    #[test]
    fn test_deadline_must_be_in_future() {
        let mut p = payload();
        p.registration_deadline = now();
        assert_eq!(
            validate_new(&p, now()),
            Err(ValidationError::DeadlineNotInFuture)
        );
    }

    #[test]
    fn test_start_must_follow_deadline() {
        let mut p = payload();
        p.start_date = p.registration_deadline;
        assert_eq!(
            validate_new(&p, now()),
            Err(ValidationError::StartNotAfterDeadline)
        );
    }

    #[test]
    fn test_end_must_follow_start() {
        let mut p = payload();
        p.end_date = p.start_date - Duration::hours(1);
        assert_eq!(validate_new(&p, now()), Err(ValidationError::EndNotAfterStart));
    }

    #[test]
    fn test_duration_limit_is_inclusive() {
        let mut p = payload();
        p.end_date = p.start_date + Duration::days(30);
        assert_eq!(validate_new(&p, now()), Ok(()));

        p.end_date = p.start_date + Duration::days(30) + Duration::seconds(1);
        assert_eq!(
            validate_new(&p, now()),
            Err(ValidationError::DurationTooLong { max_days: 30 })
        );
    }

    #[test]
    fn test_update_uses_stored_dates_for_ordering() {
        let current = stored();
        // New start is before the stored deadline
        let update = TournamentUpdate {
            start_date: Some(current.registration_deadline - Duration::hours(1)),
            ..Default::default()
        };
        assert_eq!(
            validate_update(&current, &update, now()),
            Err(ValidationError::StartNotAfterDeadline)
        );

        // Moving the end date far out breaks the duration rule against the stored start
        let update = TournamentUpdate {
            end_date: Some(current.start_date + Duration::days(31)),
            ..Default::default()
        };
        assert_eq!(
            validate_update(&current, &update, now()),
            Err(ValidationError::DurationTooLong { max_days: 30 })
        );
    }

    #[test]
    fn test_update_without_deadline_skips_future_check() {
        let mut current = stored();
        // Registration already closed
        current.registration_deadline = now() - Duration::days(1);
        current.start_date = now() + Duration::hours(1);
        current.end_date = now() + Duration::days(2);

        let update = TournamentUpdate {
            end_date: Some(now() + Duration::days(3)),
            ..Default::default()
        };
        assert_eq!(validate_update(&current, &update, now()), Ok(()));

        let update = TournamentUpdate {
            registration_deadline: Some(now() - Duration::hours(2)),
            ..Default::default()
        };
        assert_eq!(
            validate_update(&current, &update, now()),
            Err(ValidationError::DeadlineNotInFuture)
        );
    }

    #[test]
    fn test_update_checks_only_present_fields() {
        let mut current = stored();
        // Stored name would fail today's rules, but it is not being touched
        current.name = "ab".to_string();
        let update = TournamentUpdate {
            max_teams: Some(16),
            ..Default::default()
        };
        assert_eq!(validate_update(&current, &update, now()), Ok(()));

        let update = TournamentUpdate {
            max_teams: Some(9),
            ..Default::default()
        };
        assert_eq!(
            validate_update(&current, &update, now()),
            Err(ValidationError::MaxTeamsOdd(9))
        );
    }

    #[test]
    fn test_update_cannot_shrink_below_registered_teams() {
        let mut current = stored();
        current.registered_teams = 6;
        let update = TournamentUpdate {
            max_teams: Some(4),
            ..Default::default()
        };
        assert!(matches!(
            validate_update(&current, &update, now()),
            Err(ValidationError::MaxTeamsBelowRegistered { registered: 6, .. })
        ));
    }

    #[test]
    fn test_update_rejects_illegal_transition() {
        let current = stored();
        let update = TournamentUpdate {
            status: Some(TournamentStatus::Draft),
            ..Default::default()
        };
        assert_eq!(
            validate_update(&current, &update, now()),
            Err(ValidationError::IllegalTransition {
                from: TournamentStatus::Registration,
                to: TournamentStatus::Draft,
            })
        );

        let update = TournamentUpdate {
            status: Some(TournamentStatus::InProgress),
            ..Default::default()
        };
        assert_eq!(validate_update(&current, &update, now()), Ok(()));
    }
}
