//! Engine configuration
//!
//! Parsed from a JSON object handed over by the host page. Every field is
//! optional; missing fields take their defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::DEFAULT_SEED;
use crate::games::{BreakoutTuning, CatchTuning, FlappyTuning, PongTuning, SnakeTuning};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown game kind: {0:?}")]
    UnknownGame(String),
}

/// Which game variant to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    #[default]
    Catch,
    Snake,
    Pong,
    Breakout,
    Flappy,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        GameKind::Catch,
        GameKind::Snake,
        GameKind::Pong,
        GameKind::Breakout,
        GameKind::Flappy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Catch => "catch",
            GameKind::Snake => "snake",
            GameKind::Pong => "pong",
            GameKind::Breakout => "breakout",
            GameKind::Flappy => "flappy",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownGame(s.to_owned()))
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root of every random decision in a run
    pub seed: String,
    pub game: GameKind,
    /// Tear the widget down this long after mounting (browser only)
    pub auto_close_ms: Option<u32>,

    pub catch: CatchTuning,
    pub snake: SnakeTuning,
    pub pong: PongTuning,
    pub breakout: BreakoutTuning,
    pub flappy: FlappyTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED.to_owned(),
            game: GameKind::default(),
            auto_close_ms: None,
            catch: CatchTuning::default(),
            snake: SnakeTuning::default(),
            pong: PongTuning::default(),
            breakout: BreakoutTuning::default(),
            flappy: FlappyTuning::default(),
        }
    }
}

impl EngineConfig {
    /// Default config for a game with a seed
    pub fn new(game: GameKind, seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            game,
            ..Self::default()
        }
    }

    /// Parse from JSON; an empty or whitespace-only string means defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Playfield size of the configured game, used to size the surface
    pub fn playfield(&self) -> (f32, f32) {
        match self.game {
            GameKind::Catch => (self.catch.width, self.catch.height),
            GameKind::Snake => (
                self.snake.cols as f32 * self.snake.cell,
                self.snake.rows as f32 * self.snake.cell,
            ),
            GameKind::Pong => (self.pong.width, self.pong.height),
            GameKind::Breakout => (self.breakout.width, self.breakout.height),
            GameKind::Flappy => (self.flappy.width, self.flappy.height),
        }
    }
}
