use serde::{Deserialize, Serialize};
use crate::error::{CoupError, Result};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub players: u8,
    /// Seed for the deck shuffles, random when absent.
    pub seed: Option<u64>,
    /// Print every engine event to stderr as a json line.
    pub trace: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: 4,
            seed: None,
            trace: false,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `COUP_PLAYERS`, `COUP_SEED` and `COUP_TRACE`, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(players) = std::env::var("COUP_PLAYERS").ok().and_then(|v| v.parse().ok()) {
            config.players = players;
        }
        if let Some(seed) = std::env::var("COUP_SEED").ok().and_then(|v| v.parse().ok()) {
            config.seed = Some(seed);
        }
        if let Ok(trace) = std::env::var("COUP_TRACE") {
            config.trace = matches!(trace.as_str(), "1" | "true" | "yes");
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        let players = self.players as usize;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
            return Err(CoupError::InvalidPlayerCount(players));
        }
        Ok(())
    }
}
