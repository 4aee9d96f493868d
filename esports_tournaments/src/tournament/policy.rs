//! Access control for tournament operations.

use thiserror::Error;

use crate::auth::{Actor, Role, UserId};

/// Operation being attempted, carrying the owner where ownership matters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update { owner: UserId },
    Delete { owner: UserId },
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update { .. } => "update",
            Operation::Delete { .. } => "delete",
        }
    }
}

/// Denied access decision
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("Role {0} cannot create tournaments")]
    RoleCannotCreate(Role),

    #[error("Only the organizer or an admin may {0} this tournament")]
    NotOwner(&'static str),
}

/// Decide whether `actor` may perform `operation`.
pub fn authorize(actor: &Actor, operation: Operation) -> Result<(), AccessDenied> {
    match operation {
        Operation::Read => Ok(()),
        Operation::Create => match actor.role {
            Role::Admin | Role::Organizer => Ok(()),
            Role::Player => Err(AccessDenied::RoleCannotCreate(actor.role)),
        },
        Operation::Update { owner } | Operation::Delete { owner } => {
            let permitted = match actor.role {
                Role::Admin => true,
                Role::Organizer | Role::Player => actor.id == owner,
            };
            if permitted {
                Ok(())
            } else {
                Err(AccessDenied::NotOwner(operation.name()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Actor = Actor { id: 100, role: Role::Admin };
    const ORGANIZER: Actor = Actor { id: 1, role: Role::Organizer };
    const OTHER_ORGANIZER: Actor = Actor { id: 9, role: Role::Organizer };
    const PLAYER: Actor = Actor { id: 2, role: Role::Player };

    #[test]
    fn test_create_requires_admin_or_organizer() {
        assert!(authorize(&ADMIN, Operation::Create).is_ok());
        assert!(authorize(&ORGANIZER, Operation::Create).is_ok());
        assert_eq!(
            authorize(&PLAYER, Operation::Create),
            Err(AccessDenied::RoleCannotCreate(Role::Player))
        );
    }

    #[test]
    fn test_read_always_permitted() {
        for actor in [ADMIN, ORGANIZER, PLAYER] {
            assert!(authorize(&actor, Operation::Read).is_ok());
        }
    }

    #[test]
    fn test_owner_may_update_and_delete() {
        let owner = ORGANIZER.id;
        assert!(authorize(&ORGANIZER, Operation::Update { owner }).is_ok());
        assert!(authorize(&ORGANIZER, Operation::Delete { owner }).is_ok());
    }

    #[test]
    fn test_admin_may_update_and_delete_anything() {
        let owner = ORGANIZER.id;
        assert!(authorize(&ADMIN, Operation::Update { owner }).is_ok());
        assert!(authorize(&ADMIN, Operation::Delete { owner }).is_ok());
    }

    #[test]
    fn test_non_owner_denied() {
        let owner = ORGANIZER.id;
        for actor in [OTHER_ORGANIZER, PLAYER] {
            assert_eq!(
                authorize(&actor, Operation::Update { owner }),
                Err(AccessDenied::NotOwner("update"))
            );
            assert_eq!(
                authorize(&actor, Operation::Delete { owner }),
                Err(AccessDenied::NotOwner("delete"))
            );
        }
    }

    #[test]
    fn test_player_owning_a_tournament_may_manage_it() {
        // Ownership wins even for a demoted account
        let owner = PLAYER.id;
        assert!(authorize(&PLAYER, Operation::Update { owner }).is_ok());
    }
}
