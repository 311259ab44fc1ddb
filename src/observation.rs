use serde::Serialize;
use crate::history::History;
use crate::role::Role;
use crate::Phase;

/// What every player can see about a seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicPlayer {
    pub id: usize,
    pub coins: u8,
    pub hand_size: usize,
    pub alive: bool,
}

/// The game from the perspective of one player: public state plus their
/// own hand, never anyone else's.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub viewer: usize,
    pub current_player: usize,
    pub phase: Phase,
    pub players: Vec<PublicPlayer>,
    pub hand: Vec<Role>,
    pub deck_size: usize,
    pub history: History,
    pub winner: Option<usize>,
}
