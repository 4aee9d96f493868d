//! Request extractors that reject with the API error body.
//!
//! Axum's stock `Json`, `Path` and `Query` extractors answer malformed input
//! with plain text. These wrappers keep their status codes but send
//! `{"error": "..."}` like every other failure.

use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use esports_tournaments::auth::LoginRequest;
use serde::de::DeserializeOwned;

use super::errors::{ApiError, error_response};

/// JSON request body
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| error_response(rejection.status(), rejection.body_text()))
    }
}

/// Path parameters
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection| error_response(rejection.status(), rejection.body_text()))
    }
}

/// Query string
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| error_response(rejection.status(), rejection.body_text()))
    }
}

/// Login credentials sent either as JSON or as an OAuth2 password form
/// (`application/x-www-form-urlencoded`).
///
/// Extra form fields such as `grant_type` and `scope` are ignored.
#[derive(Debug)]
pub struct LoginCredentials(pub LoginRequest);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
}

impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map(|Form(login)| Self(login))
                .map_err(|rejection| error_response(rejection.status(), rejection.body_text()))
        } else {
            let ApiJson(login) = ApiJson::<LoginRequest>::from_request(req, state).await?;
            Ok(Self(login))
        }
    }
}
