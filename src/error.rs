use serde::Serialize;
use thiserror::Error;
use crate::action::Action;
use crate::role::Role;
use crate::Phase;

/// Why a declared target was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TargetError {
    Missing,
    Unexpected,
    OutOfRange,
    SelfTarget,
    Dead,
    NoCoins,
}

#[derive(Debug, Error)]
pub enum CoupError {
    #[error("{action} is not a legal action for player {player}")]
    IllegalAction { player: usize, action: Action },

    #[error("invalid target {target:?} for {action}: {reason:?}")]
    InvalidTarget {
        action: Action,
        target: Option<usize>,
        reason: TargetError,
    },

    #[error("{role:?} cannot block {action}")]
    IllegalCounter { action: Action, role: Role },

    #[error("player {got} responded out of turn, waiting on player {expected}")]
    OutOfTurnResponse { expected: usize, got: usize },

    #[error("expected phase {expected:?}, engine is in {actual:?}")]
    InvalidPhase { expected: Phase, actual: Phase },

    #[error("deck is empty")]
    EmptyDeck,

    #[error("game is over, player {winner} won")]
    GameOver { winner: usize },

    #[error("unknown player {0}")]
    UnknownPlayer(usize),

    #[error("a game needs 2 to 6 players, got {0}")]
    InvalidPlayerCount(usize),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoupError>;
