//! Append-only record of finished action cycles.
//!
//! Everything in here is public information: declared actions, claims,
//! who challenged or blocked, and which cards were turned face up.

use std::io::Write;
use serde::Serialize;
use crate::action::Action;
use crate::role::Role;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The action's effect was applied.
    Resolved,
    /// The actor was caught bluffing, nothing happened.
    Refuted,
    /// A counter stood, nothing happened.
    Blocked,
    /// Someone was eliminated mid-cycle and only one player is left.
    GameOver,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChallengeRecord {
    pub challenger: usize,
    pub claimant: usize,
    pub role: Role,
    // true when the claimant really held the role
    pub upheld: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CounterRecord {
    pub counteractor: usize,
    pub role: Role,
    pub challenge: Option<ChallengeRecord>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Loss {
    pub player: usize,
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub turn: usize,
    pub actor: usize,
    pub action: Action,
    pub target: Option<usize>,
    pub challenge: Option<ChallengeRecord>,
    pub counter: Option<CounterRecord>,
    pub losses: Vec<Loss>,
    pub outcome: Outcome,
}

// one flat csv row per entry
#[derive(Serialize)]
struct Row {
    turn: usize,
    actor: usize,
    action: Action,
    target: Option<usize>,
    challenger: Option<usize>,
    challenge_upheld: Option<bool>,
    counteractor: Option<usize>,
    counter_role: Option<Role>,
    counter_challenger: Option<usize>,
    counter_upheld: Option<bool>,
    losses: String,
    outcome: Outcome,
}

impl From<&HistoryEntry> for Row {
    fn from(entry: &HistoryEntry) -> Self {
        let counter_challenge = entry.counter.and_then(|counter| counter.challenge);

        Row {
            turn: entry.turn,
            actor: entry.actor,
            action: entry.action,
            target: entry.target,
            challenger: entry.challenge.map(|c| c.challenger),
            challenge_upheld: entry.challenge.map(|c| c.upheld),
            counteractor: entry.counter.map(|c| c.counteractor),
            counter_role: entry.counter.map(|c| c.role),
            counter_challenger: counter_challenge.map(|c| c.challenger),
            counter_upheld: counter_challenge.map(|c| c.upheld),
            losses: entry.losses
                .iter()
                .map(|loss| format!("{}:{:?}", loss.player, loss.role))
                .collect::<Vec<String>>()
                .join(" "),
            outcome: entry.outcome,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub(crate) fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for entry in &self.entries {
            writer.serialize(Row::from(entry))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
