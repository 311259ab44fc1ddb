pub mod action;
pub mod config;
pub mod deck;
pub mod error;
pub mod history;
pub mod observation;
pub mod player;
pub mod role;

pub use action::Action;
pub use config::GameConfig;
pub use deck::Deck;
pub use error::{CoupError, Result, TargetError};
pub use history::{ChallengeRecord, CounterRecord, History, HistoryEntry, Loss, Outcome};
pub use observation::{Observation, PublicPlayer};
pub use player::Player;
pub use role::Role;

use std::fmt::{Debug, Formatter};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::Serialize;
use serde_json::{json, Value};
use crate::action::{ACTION_VARIANTS, ASSASSINATE_COST, COUP_COST, FORCED_COUP_COINS};
use crate::config::{MAX_PLAYERS, MIN_PLAYERS};
use crate::player::STARTING_HAND;

// cards an ambassador draws before choosing what to keep
const EXCHANGE_DRAW: usize = 2;
const MAX_STEAL: u8 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    AwaitingDeclaration,
    Challenging,
    Countering,
    CounterChallenging,
    GameOver,
}

// responders for one sub-phase, asked in order until someone doesn't pass
#[derive(Clone, Debug, PartialEq, Eq)]
struct Polling {
    responders: Vec<usize>,
    cursor: usize,
}

impl Polling {
    fn new(responders: Vec<usize>) -> Option<Self> {
        if responders.is_empty() {
            None
        } else {
            Some(Self { responders, cursor: 0 })
        }
    }

    fn responder(&self) -> usize {
        self.responders[self.cursor]
    }

    // false once everyone has passed
    fn pass(&mut self) -> bool {
        self.cursor += 1;
        self.cursor < self.responders.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    AwaitingDeclaration,
    // claimant, claimed role
    Challenging { polling: Polling, claimant: usize, role: Role },
    Countering { polling: Polling, action: Action },
    // counteractor, claimed role
    CounterChallenging { polling: Polling, claimant: usize, role: Role },
    // winner
    Halted(usize),
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            State::AwaitingDeclaration => Phase::AwaitingDeclaration,
            State::Challenging { .. } => Phase::Challenging,
            State::Countering { .. } => Phase::Countering,
            State::CounterChallenging { .. } => Phase::CounterChallenging,
            State::Halted(_) => Phase::GameOver,
        }
    }
}

// the declaration being resolved and everything that happened to it so far
#[derive(Clone, Debug, PartialEq, Eq)]
struct Cycle {
    actor: usize,
    action: Action,
    target: Option<usize>,
    challenge: Option<ChallengeRecord>,
    counter: Option<CounterRecord>,
    losses: Vec<Loss>,
}

/// Who acts next and what they may declare.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CycleStart {
    pub actor: usize,
    pub legal_actions: Vec<Action>,
}

/// What the engine needs next after accepting a decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Transition {
    AwaitingChallenge { responder: usize, claimant: usize, role: Role },
    AwaitingCounter { responder: usize, action: Action, roles: Vec<Role> },
    AwaitingCounterChallenge { responder: usize, counteractor: usize, role: Role },
    CycleEnded { outcome: Outcome, next_actor: Option<usize>, winner: Option<usize> },
}

/// Picks which card a player gives up when losing influence with two
/// different cards in hand. Returning a role not in `hand` falls back to a
/// random pick.
pub type DiscardChooser = Box<dyn FnMut(usize, &[Role]) -> Role + Send>;

pub struct Coup<R = Pcg64> {
    turn: usize,
    current_player_idx: usize,
    deck: Deck,
    players: Vec<Player>,

    state: State,
    cycle: Option<Cycle>,
    history: History,

    rng: R,
    discard_chooser: Option<DiscardChooser>,
    trace: bool,
}

impl<R> Debug for Coup<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(format!("T {} | P {} | {:?}\n", self.turn, self.current_player_idx, self.state.phase()).as_str())?;
        for player in &self.players {
            f.write_str(format!("\tP {}: ${} | {:?}\n", player.id, player.coins, player.hand).as_str())?;
        }
        Ok(())
    }
}

impl Coup<Pcg64> {
    pub fn from_config(config: &GameConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };

        let mut game = Coup::new(config.players as usize, rng)?;
        game.trace = config.trace;
        Ok(game)
    }

    pub fn seeded(num_players: usize, seed: u64) -> Result<Self> {
        Coup::new(num_players, Pcg64::seed_from_u64(seed))
    }
}

impl<R: Rng> Coup<R> {
    /// Deals a new game. All shuffling for the rest of the game goes
    /// through `rng`.
    pub fn new(num_players: usize, mut rng: R) -> Result<Self> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(CoupError::InvalidPlayerCount(num_players));
        }

        let mut deck = Deck::new(&mut rng);

        let players = (0..num_players)
            .map(|id| {
                let hand = (0..STARTING_HAND)
                    .map(|_| deck.draw())
                    .collect::<Result<Vec<Role>>>()?;
                Ok(Player::new(id, hand))
            })
            .collect::<Result<Vec<Player>>>()?;

        Ok(Self {
            turn: 0,
            current_player_idx: 0,
            deck,
            players,
            state: State::AwaitingDeclaration,
            cycle: None,
            history: History::default(),
            rng,
            discard_chooser: None,
            trace: false,
        })
    }

    pub fn set_discard_chooser<F>(&mut self, chooser: F)
    where
        F: FnMut(usize, &[Role]) -> Role + Send + 'static,
    {
        self.discard_chooser = Some(Box::new(chooser));
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn current_player(&self) -> usize {
        self.current_player_idx
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_idx: usize) -> Option<&Player> {
        self.players.get(player_idx)
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Legal declarations for a player, depending only on their coins and
    /// who else is still holding coins. Dead or unknown players get nothing.
    pub fn legal_actions(&self, player_idx: usize) -> Vec<Action> {
        let Some(player) = self.players.get(player_idx) else {
            return vec![];
        };

        if !player.is_alive() {
            return vec![];
        }

        // forced coup at $10+
        if player.coins >= FORCED_COUP_COINS {
            return vec![Action::Coup];
        }

        let mut actions = Vec::with_capacity(ACTION_VARIANTS.len());
        actions.push(Action::Income);
        actions.push(Action::ForeignAid);

        if player.coins >= COUP_COST {
            actions.push(Action::Coup);
        }

        actions.push(Action::Tax);

        if player.coins >= ASSASSINATE_COST {
            actions.push(Action::Assassinate);
        }

        // you can't steal from someone with $0
        if self.other_player_indexes(player_idx).iter().any(|&idx| self.players[idx].coins > 0) {
            actions.push(Action::Steal);
        }

        actions.push(Action::Exchange);

        actions
    }

    /// Players `player_idx` could legally aim `action` at, nearest seat first.
    pub fn legal_targets(&self, player_idx: usize, action: Action) -> Vec<usize> {
        if !action.requires_target() || player_idx >= self.players.len() {
            return vec![];
        }

        self.other_player_indexes(player_idx)
            .into_iter()
            .filter(|&idx| action != Action::Steal || self.players[idx].coins > 0)
            .collect()
    }

    pub fn begin_cycle(&self) -> Result<CycleStart> {
        self.expect_declaration()?;

        Ok(CycleStart {
            actor: self.current_player_idx,
            legal_actions: self.legal_actions(self.current_player_idx),
        })
    }

    pub fn declare(&mut self, action: Action, target: Option<usize>) -> Result<Transition> {
        self.expect_declaration()?;

        let actor = self.current_player_idx;
        if !self.legal_actions(actor).contains(&action) {
            return Err(CoupError::IllegalAction { player: actor, action });
        }
        self.validate_target(actor, action, target)?;

        self.log("declare", || json!({ "actor": actor, "action": action, "target": target }));

        self.cycle = Some(Cycle {
            actor,
            action,
            target,
            challenge: None,
            counter: None,
            losses: vec![],
        });

        self.enter_challenging()
    }

    pub fn respond_challenge(&mut self, responder: usize, challenge: bool) -> Result<Transition> {
        let (expected, claimant, role) = match &self.state {
            State::Challenging { polling, claimant, role } => (polling.responder(), *claimant, *role),
            _ => return Err(self.wrong_phase(Phase::Challenging)),
        };
        if responder != expected {
            return Err(CoupError::OutOfTurnResponse { expected, got: responder });
        }

        self.log("challenge", || json!({ "responder": responder, "challenge": challenge }));

        if !challenge {
            return match self.next_responder() {
                Some(responder) => Ok(Transition::AwaitingChallenge { responder, claimant, role }),
                None => self.enter_countering(),
            };
        }

        let upheld = self.reveal(claimant, responder, role)?;
        self.cycle_mut().challenge = Some(ChallengeRecord {
            challenger: responder,
            claimant,
            role,
            upheld,
        });

        if let Some(transition) = self.halt_if_over() {
            return Ok(transition);
        }

        if upheld {
            self.enter_countering()
        } else {
            Ok(self.end_cycle(Outcome::Refuted))
        }
    }

    pub fn respond_counter(&mut self, responder: usize, counter: Option<Role>) -> Result<Transition> {
        let (expected, action) = match &self.state {
            State::Countering { polling, action } => (polling.responder(), *action),
            _ => return Err(self.wrong_phase(Phase::Countering)),
        };
        if responder != expected {
            return Err(CoupError::OutOfTurnResponse { expected, got: responder });
        }
        if let Some(role) = counter {
            if !role.counters(action) {
                return Err(CoupError::IllegalCounter { action, role });
            }
        }

        self.log("counter", || json!({ "responder": responder, "role": counter }));

        match counter {
            None => match self.next_responder() {
                Some(responder) => Ok(Transition::AwaitingCounter {
                    responder,
                    action,
                    roles: action.counter_roles().to_vec(),
                }),
                None => self.resolve(),
            },
            Some(role) => {
                // first block locks in, nobody else gets asked
                self.cycle_mut().counter = Some(CounterRecord {
                    counteractor: responder,
                    role,
                    challenge: None,
                });
                Ok(self.enter_counter_challenging(responder, role))
            }
        }
    }

    pub fn respond_counter_challenge(&mut self, responder: usize, challenge: bool) -> Result<Transition> {
        let (expected, claimant, role) = match &self.state {
            State::CounterChallenging { polling, claimant, role } => (polling.responder(), *claimant, *role),
            _ => return Err(self.wrong_phase(Phase::CounterChallenging)),
        };
        if responder != expected {
            return Err(CoupError::OutOfTurnResponse { expected, got: responder });
        }

        self.log("counter_challenge", || json!({ "responder": responder, "challenge": challenge }));

        if !challenge {
            return match self.next_responder() {
                Some(responder) => Ok(Transition::AwaitingCounterChallenge {
                    responder,
                    counteractor: claimant,
                    role,
                }),
                None => Ok(self.end_cycle(Outcome::Blocked)),
            };
        }

        let upheld = self.reveal(claimant, responder, role)?;
        if let Some(counter) = self.cycle_mut().counter.as_mut() {
            counter.challenge = Some(ChallengeRecord {
                challenger: responder,
                claimant,
                role,
                upheld,
            });
        }

        if let Some(transition) = self.halt_if_over() {
            return Ok(transition);
        }

        if upheld {
            Ok(self.end_cycle(Outcome::Blocked))
        } else {
            self.resolve()
        }
    }

    /// The decision the engine is currently waiting on, if any.
    pub fn pending(&self) -> Option<Transition> {
        match &self.state {
            State::Challenging { polling, claimant, role } => Some(Transition::AwaitingChallenge {
                responder: polling.responder(),
                claimant: *claimant,
                role: *role,
            }),
            State::Countering { polling, action } => Some(Transition::AwaitingCounter {
                responder: polling.responder(),
                action: *action,
                roles: action.counter_roles().to_vec(),
            }),
            State::CounterChallenging { polling, claimant, role } => Some(Transition::AwaitingCounterChallenge {
                responder: polling.responder(),
                counteractor: *claimant,
                role: *role,
            }),
            State::AwaitingDeclaration | State::Halted(_) => None,
        }
    }

    pub fn observe(&self, player_idx: usize) -> Result<Observation> {
        let viewer = self.players.get(player_idx).ok_or(CoupError::UnknownPlayer(player_idx))?;

        Ok(Observation {
            viewer: player_idx,
            current_player: self.current_player_idx,
            phase: self.phase(),
            players: self.players
                .iter()
                .map(|player| PublicPlayer {
                    id: player.id,
                    coins: player.coins,
                    hand_size: player.hand.len(),
                    alive: player.is_alive(),
                })
                .collect(),
            hand: viewer.hand.clone(),
            deck_size: self.deck.len(),
            history: self.history.clone(),
            winner: self.winner(),
        })
    }

    pub fn winner(&self) -> Option<usize> {
        let mut alive = self.players.iter().filter(|player| player.is_alive());

        match (alive.next(), alive.next()) {
            (Some(player), None) => Some(player.id),
            _ => None,
        }
    }

    fn expect_declaration(&self) -> Result<()> {
        match self.state {
            State::AwaitingDeclaration => Ok(()),
            State::Halted(winner) => Err(CoupError::GameOver { winner }),
            _ => Err(self.wrong_phase(Phase::AwaitingDeclaration)),
        }
    }

    fn wrong_phase(&self, expected: Phase) -> CoupError {
        CoupError::InvalidPhase {
            expected,
            actual: self.phase(),
        }
    }

    fn validate_target(&self, actor: usize, action: Action, target: Option<usize>) -> Result<()> {
        let reason = match (action.requires_target(), target) {
            (false, None) => return Ok(()),
            (false, Some(_)) => TargetError::Unexpected,
            (true, None) => TargetError::Missing,
            (true, Some(idx)) if idx >= self.players.len() => TargetError::OutOfRange,
            (true, Some(idx)) if idx == actor => TargetError::SelfTarget,
            (true, Some(idx)) if !self.players[idx].is_alive() => TargetError::Dead,
            (true, Some(idx)) if action == Action::Steal && self.players[idx].coins == 0 => TargetError::NoCoins,
            (true, Some(_)) => return Ok(()),
        };

        Err(CoupError::InvalidTarget { action, target, reason })
    }

    fn cycle(&self) -> &Cycle {
        self.cycle.as_ref().expect("a declaration must be pending at this point")
    }

    fn cycle_mut(&mut self) -> &mut Cycle {
        self.cycle.as_mut().expect("a declaration must be pending at this point")
    }

    fn enter_challenging(&mut self) -> Result<Transition> {
        let Cycle { actor, action, .. } = *self.cycle();

        // income and coup are not proposals, they just happen
        if action.is_unopposable() {
            return self.resolve();
        }

        if let Some(role) = action.claim() {
            if let Some(polling) = Polling::new(self.other_player_indexes(actor)) {
                let responder = polling.responder();
                self.state = State::Challenging { polling, claimant: actor, role };
                return Ok(Transition::AwaitingChallenge { responder, claimant: actor, role });
            }
        }

        self.enter_countering()
    }

    fn enter_countering(&mut self) -> Result<Transition> {
        let Cycle { actor, action, target, .. } = *self.cycle();

        let responders = match action {
            Action::ForeignAid => self.other_player_indexes(actor),
            // only the target may block, and only while they're still in the game
            Action::Steal | Action::Assassinate => target
                .filter(|&idx| self.players[idx].is_alive())
                .into_iter()
                .collect(),
            _ => vec![],
        };

        match Polling::new(responders) {
            Some(polling) => {
                let responder = polling.responder();
                self.state = State::Countering { polling, action };
                Ok(Transition::AwaitingCounter {
                    responder,
                    action,
                    roles: action.counter_roles().to_vec(),
                })
            }
            None => self.resolve(),
        }
    }

    fn enter_counter_challenging(&mut self, counteractor: usize, role: Role) -> Transition {
        let actor = self.cycle().actor;

        // same seat order as challenges, starting with the actor
        let responders: Vec<usize> = Some(actor)
            .filter(|&idx| self.players[idx].is_alive())
            .into_iter()
            .chain(self.other_player_indexes(actor))
            .filter(|&idx| idx != counteractor)
            .collect();

        match Polling::new(responders) {
            Some(polling) => {
                let responder = polling.responder();
                self.state = State::CounterChallenging { polling, claimant: counteractor, role };
                Transition::AwaitingCounterChallenge { responder, counteractor, role }
            }
            None => self.end_cycle(Outcome::Blocked),
        }
    }

    fn next_responder(&mut self) -> Option<usize> {
        match &mut self.state {
            State::Challenging { polling, .. }
            | State::Countering { polling, .. }
            | State::CounterChallenging { polling, .. } => {
                if polling.pass() {
                    Some(polling.responder())
                } else {
                    None
                }
            }
            State::AwaitingDeclaration | State::Halted(_) => None,
        }
    }

    /// Settles a challenge against `claimant`'s claim of `role`. Returns true
    /// when the claim holds up.
    fn reveal(&mut self, claimant: usize, challenger: usize, role: Role) -> Result<bool> {
        if !self.players[claimant].holds(role) {
            self.lose_influence(claimant);
            return Ok(false);
        }

        self.lose_influence(challenger);

        // the proven card goes back and gets replaced
        self.players[claimant].remove(role);
        self.deck.return_and_shuffle(role, &mut self.rng);
        let replacement = self.deck.draw()?;
        self.players[claimant].hand.push(replacement);

        Ok(true)
    }

    fn lose_influence(&mut self, player_idx: usize) {
        let hand = self.players[player_idx].hand.clone();

        let lost = match hand.as_slice() {
            [] => return,
            [only] => *only,
            [first, second] if first == second => *first,
            _ => {
                let chosen = self.discard_chooser
                    .as_mut()
                    .map(|choose| choose(player_idx, &hand))
                    .filter(|role| hand.contains(role));

                match chosen {
                    Some(role) => role,
                    None => hand[self.rng.gen_range(0..hand.len())],
                }
            }
        };

        self.players[player_idx].remove(lost);
        if let Some(cycle) = self.cycle.as_mut() {
            cycle.losses.push(Loss { player: player_idx, role: lost });
        }
        self.deck.return_and_shuffle(lost, &mut self.rng);

        self.log("lose", || json!({
            "player": player_idx,
            "role": lost,
            "eliminated": hand.len() == 1,
        }));
    }

    fn halt_if_over(&mut self) -> Option<Transition> {
        if self.winner().is_some() {
            Some(self.end_cycle(Outcome::GameOver))
        } else {
            None
        }
    }

    fn resolve(&mut self) -> Result<Transition> {
        let Cycle { actor, action, target, .. } = *self.cycle();

        self.players[actor].coins -= action.cost();

        match action {
            Action::Income => {
                self.players[actor].coins += 1;
            }
            Action::ForeignAid => {
                self.players[actor].coins += 2;
            }
            Action::Tax => {
                self.players[actor].coins += 3;
            }
            Action::Coup | Action::Assassinate => {
                // target could already be dead from losing a challenge
                if let Some(target) = target {
                    self.lose_influence(target);
                }
            }
            Action::Steal => {
                if let Some(target) = target.filter(|&idx| self.players[idx].is_alive()) {
                    let amount = self.players[target].coins.min(MAX_STEAL);
                    self.players[target].coins -= amount;
                    self.players[actor].coins += amount;
                }
            }
            Action::Exchange => {
                self.exchange(actor)?;
            }
        }

        Ok(self.end_cycle(Outcome::Resolved))
    }

    fn exchange(&mut self, player_idx: usize) -> Result<()> {
        let keep = self.players[player_idx].hand.len();

        let mut combined = Vec::with_capacity(keep + EXCHANGE_DRAW);
        for _ in 0..EXCHANGE_DRAW {
            combined.push(self.deck.draw()?);
        }
        combined.append(&mut self.players[player_idx].hand);
        combined.shuffle(&mut self.rng);

        for card in combined.split_off(keep) {
            self.deck.return_and_shuffle(card, &mut self.rng);
        }
        self.players[player_idx].hand = combined;

        Ok(())
    }

    fn end_cycle(&mut self, outcome: Outcome) -> Transition {
        if let Some(cycle) = self.cycle.take() {
            self.history.push(HistoryEntry {
                turn: self.turn,
                actor: cycle.actor,
                action: cycle.action,
                target: cycle.target,
                challenge: cycle.challenge,
                counter: cycle.counter,
                losses: cycle.losses,
                outcome,
            });
        }

        // player's turn is over
        self.turn += 1;

        let winner = self.winner();
        let next_actor = match winner {
            Some(winner) => {
                self.state = State::Halted(winner);
                None
            }
            None => {
                self.current_player_idx = self.next_living_player();
                self.state = State::AwaitingDeclaration;
                Some(self.current_player_idx)
            }
        };

        self.log("cycle", || json!({ "outcome": outcome, "next_actor": next_actor, "winner": winner }));

        Transition::CycleEnded { outcome, next_actor, winner }
    }

    fn log(&self, event: &str, fields: impl FnOnce() -> Value) {
        if self.trace {
            eprintln!("{}", json!({ "turn": self.turn, "event": event, "fields": fields() }));
        }
    }

    // living opponents in seat order, starting after `exclude_idx`
    fn other_player_indexes(&self, exclude_idx: usize) -> Vec<usize> {
        (1..self.players.len())
            .map(|n| (exclude_idx + n) % self.players.len())
            .filter(|&player_idx| self.players[player_idx].is_alive())
            .collect()
    }

    fn next_living_player(&self) -> usize {
        let num_players = self.players.len();

        (1..=num_players)
            .map(|n| (self.current_player_idx + n) % num_players)
            .find(|&idx| self.players[idx].is_alive())
            .unwrap_or(self.current_player_idx)
    }
}

#[cfg(test)]
impl<R: Rng> Coup<R> {
    // puts every hand back in the deck, then deals exactly these hands
    fn deal(&mut self, hands: &[&[Role]]) {
        assert_eq!(hands.len(), self.players.len());

        for player_idx in 0..self.players.len() {
            for card in std::mem::take(&mut self.players[player_idx].hand) {
                self.deck.return_and_shuffle(card, &mut self.rng);
            }
        }

        for (player_idx, hand) in hands.iter().enumerate() {
            for &role in hand.iter() {
                assert!(self.deck.take(role), "no {:?} left in the deck", role);
                self.players[player_idx].hand.push(role);
            }
        }
    }

    fn cards_in_play(&self) -> usize {
        self.deck.len() + self.players.iter().map(|player| player.hand.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use crate::action::Action::{Assassinate, Coup as CoupAction, Exchange, ForeignAid, Income, Steal, Tax};
    use crate::role::Role::{Ambassador, Assassin, Captain, Contessa, Duke};
    use crate::role::DECK_SIZE;
    use std::sync::{Arc, Mutex};
    use crate::{Coup, CoupError, GameConfig, Outcome, Phase, TargetError, Transition};

    fn game(num_players: usize) -> Coup {
        Coup::seeded(num_players, 42).unwrap()
    }

    fn ended(outcome: Outcome, next_actor: Option<usize>, winner: Option<usize>) -> Transition {
        Transition::CycleEnded { outcome, next_actor, winner }
    }

    #[test]
    fn new_game() {
        let coup = game(4);

        assert_eq!(coup.current_player(), 0);
        assert_eq!(coup.phase(), Phase::AwaitingDeclaration);
        assert_eq!(coup.deck_len(), DECK_SIZE - 8);
        for player in coup.players() {
            assert_eq!(player.coins(), 2);
            assert_eq!(player.hand().len(), 2);
        }

        assert!(matches!(Coup::seeded(1, 0), Err(CoupError::InvalidPlayerCount(1))));
        assert!(matches!(Coup::seeded(7, 0), Err(CoupError::InvalidPlayerCount(7))));
    }

    #[test]
    fn from_config() {
        let config = GameConfig { players: 3, seed: Some(42), trace: true };
        let mut coup = Coup::from_config(&config).unwrap();
        assert_eq!(coup.players(), game(3).players());

        // tracing only prints
        coup.declare(Income, None).unwrap();
        assert_eq!(coup.players[0].coins(), 3);

        let config = GameConfig { players: 9, ..GameConfig::default() };
        assert!(matches!(Coup::from_config(&config), Err(CoupError::InvalidPlayerCount(9))));
    }

    #[test]
    fn same_seed_same_game() {
        let a = game(5);
        let b = game(5);
        assert_eq!(a.players(), b.players());
    }

    #[test]
    fn scenario_a_coup() {
        let mut coup = game(2);
        coup.deal(&[&[Duke, Captain], &[Contessa, Assassin]]);
        coup.players[0].coins = 7;

        assert!(coup.begin_cycle().unwrap().legal_actions.contains(&CoupAction));

        let transition = coup.declare(CoupAction, Some(1)).unwrap();
        assert_eq!(transition, ended(Outcome::Resolved, Some(1), None));

        assert_eq!(coup.players[0].coins(), 0);
        assert_eq!(coup.players[1].hand().len(), 1);

        let entry = coup.history().last().unwrap();
        assert_eq!(entry.challenge, None);
        assert_eq!(entry.counter, None);
        assert_eq!(entry.losses.len(), 1);
        assert_eq!(entry.losses[0].player, 1);
        assert_eq!(coup.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn scenario_b_failed_challenge() {
        let mut coup = game(2);
        coup.deal(&[&[Duke, Captain], &[Contessa, Assassin]]);

        let transition = coup.declare(Tax, None).unwrap();
        assert_eq!(transition, Transition::AwaitingChallenge { responder: 1, claimant: 0, role: Duke });

        // tax can't be blocked, so it resolves straight away
        let transition = coup.respond_challenge(1, true).unwrap();
        assert_eq!(transition, ended(Outcome::Resolved, Some(1), None));

        assert_eq!(coup.players[1].hand().len(), 1);
        assert_eq!(coup.players[0].hand().len(), 2);
        assert!(coup.players[0].holds(Captain));
        assert_eq!(coup.players[0].coins(), 5);

        let challenge = coup.history().last().unwrap().challenge.unwrap();
        assert!(challenge.upheld);
        assert_eq!(challenge.challenger, 1);
        assert_eq!(coup.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn scenario_c_caught_bluffing() {
        let mut coup = game(2);
        coup.deal(&[&[Captain, Contessa], &[Duke, Assassin]]);

        coup.declare(Tax, None).unwrap();
        let transition = coup.respond_challenge(1, true).unwrap();

        assert_eq!(transition, ended(Outcome::Refuted, Some(1), None));
        assert_eq!(coup.players[0].hand().len(), 1);
        assert_eq!(coup.players[0].coins(), 2);
        assert_eq!(coup.players[1].hand().len(), 2);
    }

    #[test]
    fn scenario_d_foreign_aid_blocked() {
        let mut coup = game(2);
        coup.deal(&[&[Captain, Contessa], &[Assassin, Ambassador]]);

        // nothing to challenge, straight to counters
        let transition = coup.declare(ForeignAid, None).unwrap();
        assert_eq!(transition, Transition::AwaitingCounter { responder: 1, action: ForeignAid, roles: vec![Duke] });

        let transition = coup.respond_counter(1, Some(Duke)).unwrap();
        assert_eq!(transition, Transition::AwaitingCounterChallenge { responder: 0, counteractor: 1, role: Duke });

        let transition = coup.respond_counter_challenge(0, false).unwrap();
        assert_eq!(transition, ended(Outcome::Blocked, Some(1), None));

        assert_eq!(coup.players[0].coins(), 2);
        assert_eq!(coup.history().last().unwrap().counter.unwrap().role, Duke);
    }

    #[test]
    fn scenario_e_forced_coup() {
        let mut coup = game(3);
        coup.players[0].coins = 10;

        assert_eq!(coup.legal_actions(0), vec![CoupAction]);
        assert!(matches!(
            coup.declare(Tax, None),
            Err(CoupError::IllegalAction { player: 0, action: Tax })
        ));
        assert_eq!(coup.phase(), Phase::AwaitingDeclaration);
    }

    #[test]
    fn scenario_f_steal_one_coin() {
        let mut coup = game(2);
        coup.deal(&[&[Captain, Duke], &[Contessa, Assassin]]);
        coup.players[1].coins = 1;

        coup.declare(Steal, Some(1)).unwrap();
        let transition = coup.respond_challenge(1, false).unwrap();
        assert_eq!(transition, Transition::AwaitingCounter {
            responder: 1,
            action: Steal,
            roles: vec![Captain, Ambassador],
        });

        let transition = coup.respond_counter(1, None).unwrap();
        assert_eq!(transition, ended(Outcome::Resolved, Some(1), None));

        assert_eq!(coup.players[0].coins(), 3);
        assert_eq!(coup.players[1].coins(), 0);
    }

    #[test]
    fn legality_thresholds() {
        let mut coup = game(3);

        assert_eq!(coup.legal_actions(0), vec![Income, ForeignAid, Tax, Steal, Exchange]);

        coup.players[0].coins = 3;
        assert!(coup.legal_actions(0).contains(&Assassinate));
        assert!(!coup.legal_actions(0).contains(&CoupAction));

        coup.players[0].coins = 7;
        assert!(coup.legal_actions(0).contains(&CoupAction));

        // nobody to steal from
        coup.players[1].coins = 0;
        coup.players[2].coins = 0;
        assert!(!coup.legal_actions(0).contains(&Steal));

        // dead and unknown players can't do anything
        coup.players[2].hand.clear();
        assert!(coup.legal_actions(2).is_empty());
        assert!(coup.legal_actions(9).is_empty());
    }

    #[test]
    fn legal_targets() {
        let mut coup = game(4);
        coup.players[2].coins = 0;
        coup.players[3].hand.clear();

        assert_eq!(coup.legal_targets(0, CoupAction), vec![1, 2]);
        assert_eq!(coup.legal_targets(0, Steal), vec![1]);
        assert!(coup.legal_targets(0, Tax).is_empty());
        assert_eq!(coup.legal_targets(1, Assassinate), vec![2, 0]);
    }

    #[test]
    fn invalid_targets() {
        let mut coup = game(3);
        coup.players[0].coins = 7;
        coup.players[1].coins = 0;
        coup.players[2].hand.clear();

        let reason = |result: crate::Result<Transition>| match result {
            Err(CoupError::InvalidTarget { reason, .. }) => reason,
            other => panic!("expected an invalid target, got {:?}", other),
        };

        assert_eq!(reason(coup.declare(CoupAction, None)), TargetError::Missing);
        assert_eq!(reason(coup.declare(CoupAction, Some(0))), TargetError::SelfTarget);
        assert_eq!(reason(coup.declare(CoupAction, Some(2))), TargetError::Dead);
        assert_eq!(reason(coup.declare(CoupAction, Some(5))), TargetError::OutOfRange);
        assert_eq!(reason(coup.declare(Tax, Some(1))), TargetError::Unexpected);

        // rejections never touch the game
        assert_eq!(coup.phase(), Phase::AwaitingDeclaration);
        assert_eq!(coup.players[0].coins(), 7);
        assert!(coup.history().is_empty());
    }

    #[test]
    fn steal_needs_coins() {
        let mut coup = game(3);
        coup.players[1].coins = 0;

        assert!(matches!(
            coup.declare(Steal, Some(1)),
            Err(CoupError::InvalidTarget { reason: TargetError::NoCoins, .. })
        ));
        assert!(coup.declare(Steal, Some(2)).is_ok());
    }

    #[test]
    fn responders_polled_in_seat_order() {
        let mut coup = game(4);
        coup.current_player_idx = 2;

        assert_eq!(coup.declare(Tax, None).unwrap(), Transition::AwaitingChallenge { responder: 3, claimant: 2, role: Duke });

        // player 1 is not next
        assert!(matches!(
            coup.respond_challenge(1, false),
            Err(CoupError::OutOfTurnResponse { expected: 3, got: 1 })
        ));
        assert_eq!(coup.pending(), Some(Transition::AwaitingChallenge { responder: 3, claimant: 2, role: Duke }));

        assert_eq!(coup.respond_challenge(3, false).unwrap(), Transition::AwaitingChallenge { responder: 0, claimant: 2, role: Duke });
        assert_eq!(coup.respond_challenge(0, false).unwrap(), Transition::AwaitingChallenge { responder: 1, claimant: 2, role: Duke });
        assert_eq!(coup.respond_challenge(1, false).unwrap(), ended(Outcome::Resolved, Some(3), None));

        assert_eq!(coup.players[2].coins(), 5);
    }

    #[test]
    fn wrong_phase() {
        let mut coup = game(3);

        assert!(matches!(
            coup.respond_challenge(1, true),
            Err(CoupError::InvalidPhase { expected: Phase::Challenging, actual: Phase::AwaitingDeclaration })
        ));

        coup.declare(Tax, None).unwrap();

        assert!(matches!(
            coup.respond_counter(1, Some(Duke)),
            Err(CoupError::InvalidPhase { expected: Phase::Countering, actual: Phase::Challenging })
        ));
        assert!(matches!(
            coup.begin_cycle(),
            Err(CoupError::InvalidPhase { expected: Phase::AwaitingDeclaration, .. })
        ));
        assert!(matches!(coup.declare(Income, None), Err(CoupError::InvalidPhase { .. })));
    }

    #[test]
    fn illegal_counter_role() {
        let mut coup = game(3);

        coup.declare(ForeignAid, None).unwrap();
        assert!(matches!(
            coup.respond_counter(1, Some(Contessa)),
            Err(CoupError::IllegalCounter { action: ForeignAid, role: Contessa })
        ));

        // any other player can block foreign aid
        assert_eq!(coup.respond_counter(1, None).unwrap(), Transition::AwaitingCounter { responder: 2, action: ForeignAid, roles: vec![Duke] });
        coup.respond_counter(2, None).unwrap();
        assert_eq!(coup.players[0].coins(), 4);
    }

    #[test]
    fn counter_challenge_order_starts_with_actor() {
        let mut coup = game(4);

        coup.declare(ForeignAid, None).unwrap();
        coup.respond_counter(1, None).unwrap();

        let transition = coup.respond_counter(2, Some(Duke)).unwrap();
        assert_eq!(transition, Transition::AwaitingCounterChallenge { responder: 0, counteractor: 2, role: Duke });

        assert!(matches!(
            coup.respond_counter_challenge(1, false),
            Err(CoupError::OutOfTurnResponse { expected: 0, got: 1 })
        ));

        assert_eq!(coup.respond_counter_challenge(0, false).unwrap(), Transition::AwaitingCounterChallenge { responder: 1, counteractor: 2, role: Duke });
        assert_eq!(coup.respond_counter_challenge(1, false).unwrap(), Transition::AwaitingCounterChallenge { responder: 3, counteractor: 2, role: Duke });
        assert_eq!(coup.respond_counter_challenge(3, false).unwrap(), ended(Outcome::Blocked, Some(1), None));
    }

    #[test]
    fn counter_challenge_from_next_seat() {
        let mut coup = game(3);

        coup.declare(ForeignAid, None).unwrap();
        let transition = coup.respond_counter(1, Some(Duke)).unwrap();
        assert_eq!(transition, Transition::AwaitingCounterChallenge { responder: 0, counteractor: 1, role: Duke });

        assert_eq!(coup.respond_counter_challenge(0, false).unwrap(), Transition::AwaitingCounterChallenge { responder: 2, counteractor: 1, role: Duke });
    }

    #[test]
    fn assassinate_blocked_by_real_contessa() {
        let mut coup = game(2);
        coup.deal(&[&[Assassin, Duke], &[Contessa, Captain]]);
        coup.players[0].coins = 3;

        coup.declare(Assassinate, Some(1)).unwrap();
        coup.respond_challenge(1, false).unwrap();
        coup.respond_counter(1, Some(Contessa)).unwrap();

        // the actor calls the block and is wrong
        let transition = coup.respond_counter_challenge(0, true).unwrap();
        assert_eq!(transition, ended(Outcome::Blocked, Some(1), None));

        assert_eq!(coup.players[0].hand().len(), 1);
        assert_eq!(coup.players[1].hand().len(), 2);
        // the cost is only paid when the assassination goes through
        assert_eq!(coup.players[0].coins(), 3);
        assert_eq!(coup.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn double_assassinate() {
        let mut coup = game(2);
        coup.deal(&[&[Assassin, Duke], &[Duke, Captain]]);
        coup.players[0].coins = 3;

        coup.declare(Assassinate, Some(1)).unwrap();
        coup.respond_challenge(1, false).unwrap();

        // p1 bluffs a contessa
        coup.respond_counter(1, Some(Contessa)).unwrap();

        // p0 calls it, p1 loses a card for the bluff and another to the assassin
        let transition = coup.respond_counter_challenge(0, true).unwrap();
        assert_eq!(transition, ended(Outcome::Resolved, None, Some(0)));

        assert!(!coup.players[1].is_alive());
        assert_eq!(coup.players[0].coins(), 0);
        assert_eq!(coup.winner(), Some(0));
        assert_eq!(coup.phase(), Phase::GameOver);
        assert_eq!(coup.history().last().unwrap().losses.len(), 2);

        assert!(matches!(coup.begin_cycle(), Err(CoupError::GameOver { winner: 0 })));
        assert!(matches!(coup.declare(Income, None), Err(CoupError::GameOver { winner: 0 })));
    }

    #[test]
    fn target_dies_to_challenge_before_assassination() {
        let mut coup = game(3);
        coup.deal(&[&[Assassin, Duke], &[Captain], &[Contessa, Ambassador]]);
        coup.players[0].coins = 3;

        coup.declare(Assassinate, Some(1)).unwrap();

        // p1 challenges and is out, nobody is left to block
        let transition = coup.respond_challenge(1, true).unwrap();
        assert_eq!(transition, ended(Outcome::Resolved, Some(2), None));

        assert!(!coup.players[1].is_alive());
        assert_eq!(coup.players[0].coins(), 0);
        assert_eq!(coup.players[0].hand().len(), 2);
        assert_eq!(coup.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn no_steal_from_target_killed_by_challenge() {
        let mut coup = game(3);
        coup.deal(&[&[Captain, Duke], &[Contessa], &[Assassin, Ambassador]]);

        coup.declare(Steal, Some(1)).unwrap();

        // p1 calls the captain, loses their last card, and keeps their coins
        let transition = coup.respond_challenge(1, true).unwrap();
        assert_eq!(transition, ended(Outcome::Resolved, Some(2), None));

        assert!(!coup.players[1].is_alive());
        assert_eq!(coup.players[0].coins(), 2);
        assert_eq!(coup.players[1].coins(), 2);
        assert_eq!(coup.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn lost_cards_go_back_to_the_deck() {
        let mut coup = game(2);
        coup.deal(&[&[Duke, Captain], &[Contessa, Assassin]]);
        coup.players[0].coins = 7;

        let deck_before = coup.deck_len();
        coup.declare(CoupAction, Some(1)).unwrap();

        let lost = coup.history().last().unwrap().losses[0].role;
        assert_eq!(coup.deck_len(), deck_before + 1);
        assert!(coup.deck.count(lost) >= 1);
        assert_eq!(coup.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn game_ends_mid_cycle() {
        let mut coup = game(2);
        coup.deal(&[&[Duke, Captain], &[Contessa]]);

        coup.declare(Tax, None).unwrap();
        let transition = coup.respond_challenge(1, true).unwrap();

        assert_eq!(transition, ended(Outcome::GameOver, None, Some(0)));
        // tax never happens, the game is already decided
        assert_eq!(coup.players[0].coins(), 2);
        assert_eq!(coup.pending(), None);
        assert!(matches!(coup.respond_challenge(1, true), Err(CoupError::InvalidPhase { .. })));
    }

    #[test]
    fn exchange_keeps_hand_size() {
        let mut coup = game(3);
        coup.deal(&[&[Ambassador, Duke], &[Contessa, Captain], &[Assassin]]);

        coup.current_player_idx = 2;
        coup.declare(Exchange, None).unwrap();
        coup.respond_challenge(0, false).unwrap();
        let transition = coup.respond_challenge(1, false).unwrap();

        assert_eq!(transition, ended(Outcome::Resolved, Some(0), None));
        assert_eq!(coup.players[2].hand().len(), 1);
        assert_eq!(coup.cards_in_play(), DECK_SIZE);

        coup.declare(Exchange, None).unwrap();
        coup.respond_challenge(1, false).unwrap();
        coup.respond_challenge(2, false).unwrap();

        assert_eq!(coup.players[0].hand().len(), 2);
        assert_eq!(coup.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn reveal_swaps_proven_card() {
        let mut coup = game(2);

        for _ in 0..5 {
            coup.deal(&[&[Duke, Duke], &[Contessa, Captain]]);
            assert!(coup.reveal(0, 1, Duke).unwrap());
            assert_eq!(coup.players[0].hand().len(), 2);
            assert_eq!(coup.players[1].hand().len(), 1);
            assert_eq!(coup.cards_in_play(), DECK_SIZE);
        }

        coup.deal(&[&[Duke, Duke], &[Contessa, Captain]]);
        assert!(!coup.reveal(1, 0, Duke).unwrap());
        assert_eq!(coup.players[1].hand().len(), 1);
        assert_eq!(coup.players[0].hand(), &[Duke, Duke]);
    }

    #[test]
    fn discard_chooser_is_respected() {
        let mut coup = game(2);
        coup.deal(&[&[Duke, Captain], &[Duke, Contessa]]);
        coup.set_discard_chooser(|_, _| Contessa);
        coup.players[0].coins = 7;

        coup.declare(CoupAction, Some(1)).unwrap();
        assert_eq!(coup.players[1].hand(), &[Duke]);

        // a choice that isn't in the hand falls back to a random card
        let mut coup = game(2);
        coup.deal(&[&[Duke, Captain], &[Duke, Captain]]);
        coup.set_discard_chooser(|_, _| Ambassador);
        coup.players[0].coins = 7;

        coup.declare(CoupAction, Some(1)).unwrap();
        assert_eq!(coup.players[1].hand().len(), 1);
    }

    #[test]
    fn discard_chooser_keeps_state() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);

        let mut coup = game(3);
        coup.deal(&[&[Duke, Captain], &[Duke, Contessa], &[Assassin, Captain]]);
        coup.set_discard_chooser(move |player_idx, hand| {
            seen.lock().unwrap().push(player_idx);
            hand[hand.len() - 1]
        });
        coup.players[0].coins = 14;

        coup.declare(CoupAction, Some(1)).unwrap();
        assert_eq!(coup.players[1].hand(), &[Duke]);

        coup.current_player_idx = 0;
        coup.declare(CoupAction, Some(2)).unwrap();
        assert_eq!(coup.players[2].hand(), &[Assassin]);

        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn rotation_skips_dead_players() {
        let mut coup = game(3);
        coup.deal(&[&[Duke, Captain], &[Contessa], &[Assassin, Ambassador]]);
        coup.players[0].coins = 7;

        assert_eq!(coup.next_living_player(), 1);

        coup.declare(CoupAction, Some(1)).unwrap();
        assert!(!coup.players[1].is_alive());
        assert_eq!(coup.current_player(), 2);

        coup.declare(Income, None).unwrap();
        assert_eq!(coup.current_player(), 0);
    }

    #[test]
    fn other_players() {
        let coup = game(4);
        assert_eq!(coup.other_player_indexes(0), vec![1, 2, 3]);
        assert_eq!(coup.other_player_indexes(1), vec![2, 3, 0]);

        let mut coup = game(3);
        assert_eq!(coup.other_player_indexes(1), vec![2, 0]);

        coup.players[2].hand.clear();
        assert_eq!(coup.other_player_indexes(1), vec![0]);
    }

    #[test]
    fn observation_hides_other_hands() {
        let mut coup = game(3);
        coup.deal(&[&[Duke, Captain], &[Contessa, Assassin], &[Ambassador, Duke]]);
        coup.declare(Income, None).unwrap();

        let observation = coup.observe(1).unwrap();
        assert_eq!(observation.hand, vec![Contessa, Assassin]);
        assert_eq!(observation.players[0].coins, 3);
        assert_eq!(observation.players[2].hand_size, 2);
        assert_eq!(observation.current_player, 1);
        assert_eq!(observation.history.len(), 1);

        let json = serde_json::to_string(&observation).unwrap();
        assert!(!json.contains("Ambassador"));

        assert!(matches!(coup.observe(3), Err(CoupError::UnknownPlayer(3))));
    }

    #[test]
    fn begin_cycle_reports_actor() {
        let mut coup = game(3);
        coup.declare(Income, None).unwrap();

        let start = coup.begin_cycle().unwrap();
        assert_eq!(start.actor, 1);
        assert_eq!(start.legal_actions, coup.legal_actions(1));
    }
}
