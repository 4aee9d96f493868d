//! Authentication module providing registration, login and bearer tokens.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - JWT access tokens carrying the user's role
//! - Role-tagged accounts (admin, organizer, player)
//!
//! ## Example
//!
//! ```no_run
//! use esports_tournaments::auth::{AuthConfig, AuthManager, RegisterRequest};
//! use esports_tournaments::db::{Database, PgUserRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(PgUserRepository::new(db.pool().clone())),
//!         AuthConfig::new("jwt_secret".to_string(), "secret_pepper".to_string()),
//!     );
//!
//!     let request = RegisterRequest {
//!         username: "player1".to_string(),
//!         email: "player@example.com".to_string(),
//!         password: "SecurePass123".to_string(),
//!     };
//!
//!     let user = auth.register(request).await?;
//!     println!("Registered user: {}", user.username);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{
    AccessToken, AccessTokenClaims, Actor, AuthConfig, LoginRequest, NewUser, RegisterRequest,
    Role, SeedAccounts, UnknownVariant, User, UserCredentials, UserId,
};
