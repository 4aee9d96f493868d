//! Tournament module: lifecycle, validation and access control.
//!
//! This module provides:
//! - Tournament creation, partial updates and deletion
//! - Field and schedule validation
//! - Role and ownership based access control
//! - A forward-only status lifecycle with optimistic versioning
//!
//! ## Example
//!
//! ```no_run
//! use esports_tournaments::auth::{Actor, Role};
//! use esports_tournaments::db::{Database, PgTournamentRepository};
//! use esports_tournaments::tournament::{TournamentManager, TournamentSettings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let manager = TournamentManager::new(
//!         Arc::new(PgTournamentRepository::new(db.pool().clone())),
//!         TournamentSettings::default(),
//!     );
//!
//!     for tournament in manager.list(0, 10).await? {
//!         println!("{} ({})", tournament.name, tournament.status);
//!     }
//!
//!     let admin = Actor::new(1, Role::Admin);
//!     manager.delete(&admin, 42).await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod policy;
pub mod validation;

pub use errors::{TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    NewTournament, NewTournamentRecord, Tournament, TournamentId, TournamentSettings,
    TournamentStatus, TournamentType, TournamentUpdate,
};
pub use policy::{AccessDenied, Operation, authorize};
pub use validation::{ValidationError, validate_new, validate_update};
