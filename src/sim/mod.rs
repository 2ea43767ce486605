//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Constant per-tick increments (no delta-time)
//! - String-seeded RNG only
//! - Input read once per tick from the held-action set
//! - No platform dependencies

pub mod collision;
pub mod engine;
pub mod input;
pub mod rng;

pub use collision::{
    Rect, clamp_span, is_below, is_within_horizontal_bounds, is_within_vertical_bounds, overlaps,
};
pub use engine::{Arcade, Engine, Game, GameEvent, Phase, ScoreCallback, Snapshot};
pub use input::{Action, InputTracker, is_text_entry};
pub use rng::SeededRandom;
