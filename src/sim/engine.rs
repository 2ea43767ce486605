//! Generic game state machine
//!
//! `Engine` owns one run of a game: the current state snapshot, the seeded
//! RNG, the held-input set and the score callback. Each tick derives a new
//! snapshot from the previous one and swaps it in wholesale.
//!
//! Lifecycle: `NotStarted --confirm--> Playing --lives==0--> GameOver`,
//! and `GameOver --confirm--> NotStarted` (restart re-arms, it does not
//! auto-start).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::input::InputTracker;
use super::rng::SeededRandom;
use crate::renderer::Surface;

/// Coarse lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    NotStarted,
    Playing,
    GameOver,
}

/// Things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Score changed; carries the new cumulative score
    Scored { score: u32 },
    /// A life was lost; carries lives remaining
    LifeLost { lives: u32 },
    /// Run ended with the final score
    GameOver { score: u32 },
}

/// Read access every game state exposes to the engine
pub trait Snapshot: Clone + fmt::Debug + Serialize {
    fn phase(&self) -> Phase;
    fn score(&self) -> u32;
    fn lives(&self) -> u32;
    /// Copy of this snapshot in another phase
    fn with_phase(&self, phase: Phase) -> Self;
}

/// Rules of one game variant.
///
/// `step` is only called while the snapshot is `Playing` and must return a
/// new snapshot rather than mutate the previous one.
pub trait Game {
    type State: Snapshot;

    fn name(&self) -> &'static str;

    /// Fresh snapshot in `NotStarted`
    fn initial_state(&self) -> Self::State;

    /// Snapshot that begins play, given the input held when the run starts
    fn start(&self, state: &Self::State, _input: &InputTracker) -> Self::State {
        state.with_phase(Phase::Playing)
    }

    /// Advance one tick
    fn step(
        &self,
        prev: &Self::State,
        input: &InputTracker,
        rng: &mut SeededRandom,
        events: &mut Vec<GameEvent>,
    ) -> Self::State;

    /// Paint the snapshot. Must not change anything.
    fn render(&self, state: &Self::State, seed: &str, surface: &mut dyn Surface);

    /// Demo mode: set held actions the way a simple bot would play
    fn autopilot(&self, _state: &Self::State, _input: &mut InputTracker) {}
}

/// Score-change notification; called once per scoring event
pub type ScoreCallback = Box<dyn FnMut(u32)>;

/// One running instance of a game
pub struct Engine<G: Game> {
    game: G,
    rng: SeededRandom,
    input: InputTracker,
    state: G::State,
    ticks: u64,
    events: Vec<GameEvent>,
    on_score_change: Option<ScoreCallback>,
}

impl<G: Game> Engine<G> {
    pub fn new(game: G, seed: &str) -> Self {
        let state = game.initial_state();
        Self {
            game,
            rng: SeededRandom::new(seed),
            input: InputTracker::new(),
            state,
            ticks: 0,
            events: Vec::new(),
            on_score_change: None,
        }
    }

    /// Attach a score-change listener (builder form)
    pub fn with_score_callback(mut self, callback: impl FnMut(u32) + 'static) -> Self {
        self.on_score_change = Some(Box::new(callback));
        self
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn state(&self) -> &G::State {
        &self.state
    }

    /// Events produced by the most recent tick
    pub fn last_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Run one simulation tick. No-op unless playing.
    pub fn step(&mut self) {
        if self.state.phase() != Phase::Playing {
            return;
        }

        self.events.clear();
        let next = self
            .game
            .step(&self.state, &self.input, &mut self.rng, &mut self.events);
        self.state = next;
        self.ticks += 1;

        for event in &self.events {
            match *event {
                GameEvent::Scored { score } => {
                    log::debug!("{}: score {}", self.game.name(), score);
                    if let Some(callback) = self.on_score_change.as_mut() {
                        callback(score);
                    }
                }
                GameEvent::LifeLost { lives } => {
                    log::debug!("{}: life lost, {} left", self.game.name(), lives);
                }
                GameEvent::GameOver { score } => {
                    log::info!(
                        "{} over after {} ticks, final score {} (seed {:?})",
                        self.game.name(),
                        self.ticks,
                        score,
                        self.rng.seed()
                    );
                }
            }
        }
    }

    /// Start from `NotStarted`, restart from `GameOver`, ignored while playing.
    ///
    /// Returns the phase after the action.
    pub fn press_confirm(&mut self) -> Phase {
        match self.state.phase() {
            Phase::NotStarted => {
                log::info!("{} started (seed {:?})", self.game.name(), self.rng.seed());
                self.state = self.game.start(&self.state, &self.input);
            }
            Phase::GameOver => self.reset(),
            Phase::Playing => {}
        }
        self.state.phase()
    }

    /// Throw the run away and re-arm from the same seed
    pub fn reset(&mut self) {
        self.state = self.game.initial_state();
        self.rng.reseed();
        self.input.clear();
        self.events.clear();
        self.ticks = 0;
        log::info!("{} restarted (seed {:?})", self.game.name(), self.rng.seed());
    }
}

/// Object-safe view of an engine so one driver serves every game
pub trait Arcade {
    fn name(&self) -> &'static str;
    fn seed(&self) -> &str;
    fn phase(&self) -> Phase;
    fn score(&self) -> u32;
    fn lives(&self) -> u32;
    fn ticks(&self) -> u64;
    fn input(&self) -> &InputTracker;
    fn input_mut(&mut self) -> &mut InputTracker;
    fn tick(&mut self);
    fn confirm(&mut self) -> Phase;
    fn restart(&mut self);
    fn render(&self, surface: &mut dyn Surface);
    fn set_score_callback(&mut self, callback: ScoreCallback);
    /// Let the game's bot choose this tick's held actions
    fn autopilot(&mut self);
    /// Current snapshot as JSON, for replay comparison and debugging
    fn snapshot_json(&self) -> String;
}

impl<G: Game> Arcade for Engine<G> {
    fn name(&self) -> &'static str {
        self.game.name()
    }

    fn seed(&self) -> &str {
        self.rng.seed()
    }

    fn phase(&self) -> Phase {
        self.state.phase()
    }

    fn score(&self) -> u32 {
        self.state.score()
    }

    fn lives(&self) -> u32 {
        self.state.lives()
    }

    fn ticks(&self) -> u64 {
        self.ticks
    }

    fn input(&self) -> &InputTracker {
        &self.input
    }

    fn input_mut(&mut self) -> &mut InputTracker {
        &mut self.input
    }

    fn tick(&mut self) {
        self.step();
    }

    fn confirm(&mut self) -> Phase {
        self.press_confirm()
    }

    fn restart(&mut self) {
        self.reset();
    }

    fn render(&self, surface: &mut dyn Surface) {
        self.game.render(&self.state, self.rng.seed(), surface);
    }

    fn set_score_callback(&mut self, callback: ScoreCallback) {
        self.on_score_change = Some(callback);
    }

    fn autopilot(&mut self) {
        self.game.autopilot(&self.state, &mut self.input);
    }

    fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.state).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::games::Catch;
    use crate::sim::Action;

    fn run_until_over(engine: &mut Engine<Catch>) {
        for _ in 0..100_000 {
            engine.tick();
            if engine.phase() == Phase::GameOver {
                return;
            }
        }
        panic!("run never ended");
    }

    #[test]
    fn test_ticks_ignored_until_started() {
        let mut engine = Engine::new(Catch::default(), "404");
        let before = engine.snapshot_json();
        for _ in 0..10 {
            engine.tick();
        }
        assert_eq!(engine.phase(), Phase::NotStarted);
        assert_eq!(engine.ticks(), 0);
        assert_eq!(engine.snapshot_json(), before);
    }

    #[test]
    fn test_confirm_cycles_phases() {
        let mut engine = Engine::new(Catch::default(), "404");
        assert_eq!(engine.confirm(), Phase::Playing);
        // Ignored while playing
        assert_eq!(engine.confirm(), Phase::Playing);

        run_until_over(&mut engine);
        assert_eq!(engine.lives(), 0);
        let ticks = engine.ticks();
        engine.tick();
        assert_eq!(engine.ticks(), ticks, "game over is frozen");

        assert_eq!(engine.confirm(), Phase::NotStarted);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.ticks(), 0);
    }

    #[test]
    fn test_restart_replays_identically() {
        let mut engine = Engine::new(Catch::default(), "replay");
        engine.confirm();
        run_until_over(&mut engine);
        let first = (engine.ticks(), engine.score(), engine.snapshot_json());

        engine.confirm();
        engine.confirm();
        run_until_over(&mut engine);
        assert_eq!((engine.ticks(), engine.score(), engine.snapshot_json()), first);
    }

    #[test]
    fn test_restart_clears_held_input() {
        let mut engine = Engine::new(Catch::default(), "404");
        engine.input_mut().activate(Action::MoveLeft);
        engine.restart();
        assert!(!engine.input().is_active(Action::MoveLeft));
    }

    #[test]
    fn test_score_callback_sees_every_increase() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut engine = Engine::new(Catch::default(), "404")
            .with_score_callback(move |score| sink.borrow_mut().push(score));
        engine.confirm();
        for _ in 0..5_000 {
            engine.autopilot();
            engine.tick();
        }

        let seen = seen.borrow();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(seen.last().copied(), Some(engine.score()));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let run = |seed: &str| {
            let mut engine = Engine::new(Catch::default(), seed);
            engine.confirm();
            for _ in 0..300 {
                engine.tick();
            }
            engine.snapshot_json()
        };
        assert_eq!(run("a"), run("a"));
        assert_ne!(run("a"), run("b"));
    }
}
