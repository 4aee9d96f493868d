//! Tournament API handlers.
//!
//! Listing and reading are public. Create, update and delete run on behalf of
//! the authenticated [`Actor`] injected by the auth middleware.

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use esports_tournaments::{
    auth::Actor,
    tournament::{NewTournament, Tournament, TournamentError, TournamentId, TournamentUpdate},
};
use serde::Deserialize;

use super::{
    AppState,
    errors::{ApiResult, tournament_error},
    extract::{ApiJson, ApiPath, ApiQuery},
    request_id::RequestId,
};
use crate::{logging, metrics};

/// Pagination query for the list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Record the outcome of a mutating call and convert its error
fn finish<T>(
    operation: &'static str,
    actor: &Actor,
    request_id: &RequestId,
    result: Result<T, TournamentError>,
) -> ApiResult<T> {
    match result {
        Ok(value) => {
            metrics::tournament_operations_total(operation, "ok");
            Ok(value)
        }
        Err(e) => {
            let outcome = match &e {
                TournamentError::NotFound(_) => "not_found",
                TournamentError::PermissionDenied(_) => "denied",
                TournamentError::Validation(_) => "invalid",
                TournamentError::VersionConflict { .. } => "conflict",
                TournamentError::Persistence(_) | TournamentError::Database(_) => "error",
            };
            metrics::tournament_operations_total(operation, outcome);
            if matches!(e, TournamentError::PermissionDenied(_)) {
                logging::log_security_event(
                    "permission_denied",
                    Some(actor.id),
                    Some(request_id.as_str()),
                    &e.to_string(),
                );
            }
            Err(tournament_error(e))
        }
    }
}

/// List tournaments, newest first.
///
/// `skip` defaults to 0 and `limit` to the configured page size; both are
/// clamped rather than rejected.
pub async fn list_tournaments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<Tournament>>> {
    let manager = &state.tournament_manager;
    let skip = query.skip.unwrap_or(0);
    let limit = query
        .limit
        .unwrap_or(manager.settings().default_page_size);

    manager
        .list(skip, limit)
        .await
        .map(Json)
        .map_err(tournament_error)
}

/// Get a single tournament.
///
/// # Errors
///
/// - `404 Not Found`: No tournament with this id
pub async fn get_tournament(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    state
        .tournament_manager
        .get(id)
        .await
        .map(Json)
        .map_err(tournament_error)
}

/// Create a tournament owned by the caller.
///
/// Any `status` or `created_by` in the body is ignored.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is a player
/// - `422 Unprocessable Entity`: Payload violates a tournament rule
/// - `400 Bad Request`: The write failed
pub async fn create_tournament(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    request_id: RequestId,
    ApiJson(payload): ApiJson<NewTournament>,
) -> ApiResult<(StatusCode, Json<Tournament>)> {
    let result = state.tournament_manager.create(&actor, payload).await;
    let tournament = finish("create", &actor, &request_id, result)?;
    Ok((StatusCode::CREATED, Json(tournament)))
}

/// Partially update a tournament.
///
/// Send `expected_version` to fail with `409 Conflict` instead of overwriting
/// a concurrent change.
///
/// # Errors
///
/// - `404 Not Found`: No tournament with this id
/// - `403 Forbidden`: Caller neither owns the tournament nor is an admin
/// - `409 Conflict`: Version mismatch
/// - `422 Unprocessable Entity`: Resulting record violates a tournament rule
pub async fn update_tournament(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    request_id: RequestId,
    ApiPath(id): ApiPath<TournamentId>,
    ApiJson(update): ApiJson<TournamentUpdate>,
) -> ApiResult<Json<Tournament>> {
    let result = state.tournament_manager.update(&actor, id, update).await;
    finish("update", &actor, &request_id, result).map(Json)
}

/// Delete a tournament.
///
/// # Errors
///
/// - `404 Not Found`: No tournament with this id
/// - `403 Forbidden`: Caller neither owns the tournament nor is an admin
pub async fn delete_tournament(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    request_id: RequestId,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<StatusCode> {
    let result = state.tournament_manager.delete(&actor, id).await;
    finish("delete", &actor, &request_id, result)?;
    Ok(StatusCode::NO_CONTENT)
}
