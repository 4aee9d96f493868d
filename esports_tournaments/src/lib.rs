//! # Esports Tournaments
//!
//! Tournament lifecycle management for esports events: accounts with roles,
//! bearer-token authentication and tournament CRUD guarded by validation and
//! access-control rules.
//!
//! ## Architecture
//!
//! A tournament moves through a forward-only lifecycle:
//!
//! - **Draft**: Not yet open
//! - **Registration**: Accepting teams (every new tournament starts here)
//! - **InProgress**: Matches are being played
//! - **Completed**: Finished (terminal)
//! - **Cancelled**: Reachable from any non-terminal state (terminal)
//!
//! ## Core Modules
//!
//! - [`auth`]: Registration, login, password hashing and JWT access tokens
//! - [`db`]: Connection pool, migrations and repository implementations
//! - [`tournament`]: Validation engine, access policy and lifecycle orchestrator
//!
//! ## Example
//!
//! ```
//! use esports_tournaments::auth::{Actor, Role};
//! use esports_tournaments::tournament::{Operation, authorize};
//!
//! let player = Actor::new(7, Role::Player);
//! assert!(authorize(&player, Operation::Read).is_ok());
//! assert!(authorize(&player, Operation::Create).is_err());
//! ```

/// Accounts, credentials and access tokens.
pub mod auth;

/// Database access and repositories.
pub mod db;

/// Tournament domain logic.
pub mod tournament;

pub use auth::{Actor, AuthManager, Role};
pub use tournament::{Tournament, TournamentError, TournamentManager, TournamentStatus};
