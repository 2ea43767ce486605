//! Game variants
//!
//! Every variant plugs into the same `Engine` skeleton and differs only in
//! its state shape, per-tick rules and painting.

pub mod breakout;
pub mod catch;
pub mod flappy;
pub mod pong;
pub mod snake;

pub use breakout::{Breakout, BreakoutState, BreakoutTuning};
pub use catch::{Catch, CatchState, CatchTuning, Entity};
pub use flappy::{Flappy, FlappyState, FlappyTuning};
pub use pong::{Pong, PongState, PongTuning};
pub use snake::{Snake, SnakeState, SnakeTuning};
