use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::role::Role;

/// A move declared by the current player on their turn.
///
/// Targets are supplied separately when declaring, so the same value is used
/// for legality queries and for the history log.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    Income,
    ForeignAid,
    Coup,
    Tax,
    Assassinate,
    Steal,
    Exchange,
}

pub static ACTION_VARIANTS: [Action; 7] = [
    Action::Income,
    Action::ForeignAid,
    Action::Coup,
    Action::Tax,
    Action::Assassinate,
    Action::Steal,
    Action::Exchange,
];

pub const COUP_COST: u8 = 7;
pub const ASSASSINATE_COST: u8 = 3;
pub const FORCED_COUP_COINS: u8 = 10;

impl Action {
    /// The role a player implicitly claims by declaring this action.
    pub fn claim(self) -> Option<Role> {
        match self {
            Action::Tax => Some(Role::Duke),
            Action::Assassinate => Some(Role::Assassin),
            Action::Steal => Some(Role::Captain),
            Action::Exchange => Some(Role::Ambassador),
            Action::Income | Action::ForeignAid | Action::Coup => None,
        }
    }

    /// Roles that may be claimed to block this action.
    pub fn counter_roles(self) -> &'static [Role] {
        match self {
            Action::ForeignAid => &[Role::Duke],
            Action::Assassinate => &[Role::Contessa],
            Action::Steal => &[Role::Captain, Role::Ambassador],
            _ => &[],
        }
    }

    pub fn requires_target(self) -> bool {
        matches!(self, Action::Coup | Action::Assassinate | Action::Steal)
    }

    pub fn cost(self) -> u8 {
        match self {
            Action::Coup => COUP_COST,
            Action::Assassinate => ASSASSINATE_COST,
            _ => 0,
        }
    }

    // income and coup just happen, there's nothing to respond to
    pub fn is_unopposable(self) -> bool {
        self.claim().is_none() && self.counter_roles().is_empty()
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Income => f.write_str("income"),
            Action::ForeignAid => f.write_str("foreign aid"),
            Action::Coup => f.write_str("coup"),
            Action::Tax => f.write_str("tax"),
            Action::Assassinate => f.write_str("assassinate"),
            Action::Steal => f.write_str("steal"),
            Action::Exchange => f.write_str("exchange"),
        }
    }
}
