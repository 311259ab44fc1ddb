use rand::seq::SliceRandom;
use rand::Rng;
use crate::error::{CoupError, Result};
use crate::role::{Role, COPIES_PER_ROLE, ROLE_VARIANTS};

/// The court deck. Order only matters as the result of the last shuffle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Role>,
}

impl Deck {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards: Vec<Role> = ROLE_VARIANTS.iter()
            .flat_map(|&card| std::iter::repeat(card).take(COPIES_PER_ROLE))
            .collect();

        cards.shuffle(rng);

        Self { cards }
    }

    pub fn draw(&mut self) -> Result<Role> {
        self.cards.pop().ok_or(CoupError::EmptyDeck)
    }

    pub fn return_and_shuffle<R: Rng + ?Sized>(&mut self, card: Role, rng: &mut R) {
        self.cards.push(card);
        self.cards.shuffle(rng);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn count(&self, role: Role) -> usize {
        self.cards.iter().filter(|&&card| card == role).count()
    }

    // pulls a specific card out, for arranging hands in tests
    #[cfg(test)]
    pub(crate) fn take(&mut self, role: Role) -> bool {
        match self.cards.iter().position(|&card| card == role) {
            Some(idx) => {
                self.cards.remove(idx);
                true
            }
            None => false,
        }
    }
}
