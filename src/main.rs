//! Multipong headless runner
//!
//! Plays one match to completion without a renderer and prints the result
//! as JSON. Usage: `multipong [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
use std::error::Error;

#[cfg(not(target_arch = "wasm32"))]
use multipong::sim::{CountdownTick, Difficulty, FrameInput, MatchState, PlayerId};
#[cfg(not(target_arch = "wasm32"))]
use multipong::{MatchSettings, Mode};

/// Ten simulated minutes at 60 fps
#[cfg(not(target_arch = "wasm32"))]
const MAX_FRAMES: u64 = 60 * 60 * 10;

#[cfg(not(target_arch = "wasm32"))]
fn default_settings() -> MatchSettings {
    [
        (PlayerId::P1, Difficulty::Normal),
        (PlayerId::P2, Difficulty::Hard),
        (PlayerId::P3, Difficulty::Easy),
        (PlayerId::P4, Difficulty::SuperEasy),
    ]
    .into_iter()
    .fold(MatchSettings::new(Mode::FourPlayer), |s, (id, d)| s.with_ai(id, d))
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => MatchSettings::load(&path)?,
        None => default_settings(),
    };
    let seed = match args.next() {
        Some(s) => s.parse::<u64>()?,
        None => 42,
    };
    log::info!("Multipong {} starting with seed {}", settings.mode.as_str(), seed);

    let mut state = MatchState::new(settings, seed);
    while state.countdown_tick() != CountdownTick::Started {}

    let input = FrameInput::new();
    for _ in 0..MAX_FRAMES {
        if let Some(result) = state.update(&input) {
            println!("{}", result.to_json_pretty()?);
            return Ok(());
        }
    }

    Err(format!(
        "match {} undecided after {} frames ({} paddles left)",
        state.game_id(),
        MAX_FRAMES,
        state.active_count()
    )
    .into())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is driven by the host page on the web
}
