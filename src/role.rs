use serde::{Deserialize, Serialize};
use crate::action::Action;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
}

pub static ROLE_VARIANTS: [Role; 5] = [
    Role::Duke,
    Role::Assassin,
    Role::Captain,
    Role::Ambassador,
    Role::Contessa,
];

pub const COPIES_PER_ROLE: usize = 3;

// every card in play, deck and hands combined
pub const DECK_SIZE: usize = ROLE_VARIANTS.len() * COPIES_PER_ROLE;

impl Role {
    /// The primary action holding this role justifies, if any.
    pub fn action(self) -> Option<Action> {
        match self {
            Role::Duke => Some(Action::Tax),
            Role::Assassin => Some(Action::Assassinate),
            Role::Captain => Some(Action::Steal),
            Role::Ambassador => Some(Action::Exchange),
            Role::Contessa => None,
        }
    }

    /// Whether a claim of this role may block `action`.
    pub fn counters(self, action: Action) -> bool {
        action.counter_roles().contains(&self)
    }
}
