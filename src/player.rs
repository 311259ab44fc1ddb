use crate::role::Role;

pub const STARTING_COINS: u8 = 2;
pub const STARTING_HAND: usize = 2;

/// Per-seat state. Only the engine mutates players.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub(crate) id: usize,
    pub(crate) coins: u8,
    pub(crate) hand: Vec<Role>,
}

impl Player {
    pub(crate) fn new(id: usize, hand: Vec<Role>) -> Self {
        Self {
            id,
            coins: STARTING_COINS,
            hand,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn coins(&self) -> u8 {
        self.coins
    }

    pub fn hand(&self) -> &[Role] {
        &self.hand
    }

    // a player with no influence left is out for good
    pub fn is_alive(&self) -> bool {
        !self.hand.is_empty()
    }

    pub fn holds(&self, role: Role) -> bool {
        self.hand.contains(&role)
    }

    /// Removes one copy of `role`, returns false if it isn't held.
    pub(crate) fn remove(&mut self, role: Role) -> bool {
        match self.hand.iter().position(|&card| card == role) {
            Some(idx) => {
                self.hand.remove(idx);
                true
            }
            None => false,
        }
    }
}
