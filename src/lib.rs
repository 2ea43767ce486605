//! Arcade Engine - seed-driven mini-games for embedding in a web page
//!
//! Core modules:
//! - `sim`: Deterministic simulation core (RNG, input, collision, state machine)
//! - `games`: Game variants built on the simulation core (catch, snake, pong, ...)
//! - `renderer`: Paint commands and the drawing surface abstraction
//! - `driver`: Frame loop that ticks then renders once per display refresh
//! - `platform`: Browser bindings (canvas, input listeners, animation frames)
//! - `config`: Data-driven engine configuration

pub mod config;
pub mod driver;
pub mod games;
pub mod platform;
pub mod renderer;
pub mod sim;

pub use config::{ConfigError, EngineConfig, GameKind};
pub use driver::{FrameLoop, FrameOutcome, ScoreQueue};
pub use sim::{Action, Arcade, Engine, Game, InputTracker, Phase, SeededRandom};

/// Engine-wide constants
pub mod consts {
    /// Seed used when none is supplied
    pub const DEFAULT_SEED: &str = "404";

    /// Nominal display refresh rate the per-tick constants are tuned for.
    /// Ticks are not delta-time corrected.
    pub const NOMINAL_TICK_HZ: u32 = 60;

    /// Lives every multi-life variant starts with
    pub const STARTING_LIVES: u32 = 3;

    /// Points awarded for a single catch/hit/pass
    pub const FIXED_REWARD: u32 = 10;
}

/// Build a boxed engine for the configured game variant.
pub fn build(config: &EngineConfig) -> Box<dyn Arcade> {
    use games::{Breakout, Catch, Flappy, Pong, Snake};

    log::info!("Building {:?} engine with seed {:?}", config.game, config.seed);
    match config.game {
        GameKind::Catch => Box::new(Engine::new(Catch::new(config.catch.clone()), &config.seed)),
        GameKind::Snake => Box::new(Engine::new(Snake::new(config.snake.clone()), &config.seed)),
        GameKind::Pong => Box::new(Engine::new(Pong::new(config.pong.clone()), &config.seed)),
        GameKind::Breakout => Box::new(Engine::new(
            Breakout::new(config.breakout.clone()),
            &config.seed,
        )),
        GameKind::Flappy => Box::new(Engine::new(Flappy::new(config.flappy.clone()), &config.seed)),
    }
}
