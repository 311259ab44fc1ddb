use std::error::Error;
use std::io;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use coup_engine::{Coup, CoupError, GameConfig, Transition};

// how often a random player calls a bluff or blocks
const CHALLENGE_CHANCE: f64 = 0.3;
const COUNTER_CHANCE: f64 = 0.3;

// keeps the driver's choices independent from the engine's shuffles
const DRIVER_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

fn play<R: Rng>(game: &mut Coup, rng: &mut R) -> Result<usize, CoupError> {
    loop {
        let start = match game.begin_cycle() {
            Ok(start) => start,
            Err(CoupError::GameOver { winner }) => return Ok(winner),
            Err(err) => return Err(err),
        };

        let action = start.legal_actions[rng.gen_range(0..start.legal_actions.len())];
        let targets = game.legal_targets(start.actor, action);
        let target = if targets.is_empty() {
            None
        } else {
            Some(targets[rng.gen_range(0..targets.len())])
        };

        let mut transition = game.declare(action, target)?;
        loop {
            transition = match transition {
                Transition::AwaitingChallenge { responder, .. } => {
                    game.respond_challenge(responder, rng.gen_bool(CHALLENGE_CHANCE))?
                }
                Transition::AwaitingCounter { responder, roles, .. } => {
                    let counter = if rng.gen_bool(COUNTER_CHANCE) {
                        Some(roles[rng.gen_range(0..roles.len())])
                    } else {
                        None
                    };
                    game.respond_counter(responder, counter)?
                }
                Transition::AwaitingCounterChallenge { responder, .. } => {
                    game.respond_counter_challenge(responder, rng.gen_bool(CHALLENGE_CHANCE))?
                }
                Transition::CycleEnded { .. } => break,
            };
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => GameConfig::from_env(),
    };

    let mut game = Coup::from_config(&config)?;
    let mut rng = match config.seed {
        Some(seed) => Pcg64::seed_from_u64(seed ^ DRIVER_SEED_SALT),
        None => Pcg64::from_entropy(),
    };

    let winner = play(&mut game, &mut rng)?;
    eprintln!("game over after {} turns, winner is player {winner}", game.turn());

    game.history().write_csv(io::stdout())?;

    Ok(())
}
