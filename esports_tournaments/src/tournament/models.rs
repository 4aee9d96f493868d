//! Tournament data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::auth::{UnknownVariant, UserId};

/// Tournament ID type
pub type TournamentId = i64;

/// Bracket format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentType {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
}

impl TournamentType {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentType::SingleElimination => "single_elimination",
            TournamentType::DoubleElimination => "double_elimination",
            TournamentType::RoundRobin => "round_robin",
        }
    }
}

impl fmt::Display for TournamentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_elimination" => Ok(TournamentType::SingleElimination),
            "double_elimination" => Ok(TournamentType::DoubleElimination),
            "round_robin" => Ok(TournamentType::RoundRobin),
            other => Err(UnknownVariant {
                kind: "tournament type",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status
///
/// ```text
/// Draft -> Registration -> InProgress -> Completed
///   \__________\_______________\______-> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Draft,
    Registration,
    InProgress,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentStatus::Draft => "draft",
            TournamentStatus::Registration => "registration",
            TournamentStatus::InProgress => "in_progress",
            TournamentStatus::Completed => "completed",
            TournamentStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled tournaments never change status again
    pub fn is_terminal(self) -> bool {
        matches!(self, TournamentStatus::Completed | TournamentStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    ///
    /// Re-submitting the current status is accepted as a no-op.
    pub fn can_transition_to(self, next: TournamentStatus) -> bool {
        use TournamentStatus::*;

        if self == next {
            return true;
        }

        match (self, next) {
            (Draft, Registration) | (Registration, InProgress) | (InProgress, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TournamentStatus::Draft),
            "registration" => Ok(TournamentStatus::Registration),
            "in_progress" => Ok(TournamentStatus::InProgress),
            "completed" => Ok(TournamentStatus::Completed),
            "cancelled" => Ok(TournamentStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "tournament status",
                value: other.to_string(),
            }),
        }
    }
}

/// Stored tournament enriched with organizer name and registered team count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub tournament_type: TournamentType,
    pub status: TournamentStatus,
    pub rules: Option<String>,
    pub max_teams: i32,
    pub registration_deadline: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every successful update
    pub version: i32,
    pub organizer_name: Option<String>,
    pub registered_teams: i64,
}

/// Client payload for creating a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub tournament_type: TournamentType,
    #[serde(default)]
    pub rules: Option<String>,
    pub max_teams: i32,
    pub registration_deadline: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Accepted for compatibility, always replaced with `Registration`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TournamentStatus>,
    /// Accepted for compatibility, always replaced with the creating actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

/// Row written by the repository on create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTournamentRecord {
    pub name: String,
    pub description: Option<String>,
    pub tournament_type: TournamentType,
    pub status: TournamentStatus,
    pub rules: Option<String>,
    pub max_teams: i32,
    pub registration_deadline: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_by: UserId,
}

impl NewTournamentRecord {
    /// Build the stored row, forcing the server-controlled fields
    pub fn from_payload(payload: NewTournament, created_by: UserId) -> Self {
        Self {
            name: payload.name,
            description: payload.description,
            tournament_type: payload.tournament_type,
            status: TournamentStatus::Registration,
            rules: payload.rules,
            max_teams: payload.max_teams,
            registration_deadline: payload.registration_deadline,
            start_date: payload.start_date,
            end_date: payload.end_date,
            created_by,
        }
    }
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rules: Option<String>,
    pub max_teams: Option<i32>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<TournamentStatus>,
    /// Version the client last saw; the update is rejected if it is stale
    pub expected_version: Option<i32>,
}

impl TournamentUpdate {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.rules.is_none()
            && self.max_teams.is_none()
            && self.registration_deadline.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.status.is_none()
    }

    pub fn touches_schedule(&self) -> bool {
        self.registration_deadline.is_some() || self.start_date.is_some() || self.end_date.is_some()
    }

    /// Overlay the present fields onto `current`
    pub fn apply_to(&self, current: &Tournament) -> Tournament {
        let mut merged = current.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = Some(description.clone());
        }
        if let Some(rules) = &self.rules {
            merged.rules = Some(rules.clone());
        }
        if let Some(max_teams) = self.max_teams {
            merged.max_teams = max_teams;
        }
        if let Some(deadline) = self.registration_deadline {
            merged.registration_deadline = deadline;
        }
        if let Some(start) = self.start_date {
            merged.start_date = start;
        }
        if let Some(end) = self.end_date {
            merged.end_date = end;
        }
        if let Some(status) = self.status {
            merged.status = status;
        }
        merged
    }
}

/// Listing configuration for the tournament manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentSettings {
    /// Page size used when the caller does not pass a usable limit
    pub default_page_size: i64,
    /// Upper bound for any requested page size
    pub max_page_size: i64,
}

impl TournamentSettings {
    /// Normalize caller-supplied pagination into `(skip, limit)`
    pub fn page(&self, skip: i64, limit: i64) -> (i64, i64) {
        (skip.max(0), limit.clamp(1, self.max_page_size.max(1)))
    }
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}
