//! Breakout: bounce a ball off a paddle into a wall of bricks
//!
//! The wall is laid out on the first tick of a run and again whenever it is
//! cleared. At most one brick breaks per tick, checked in layout order.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{FIXED_REWARD, STARTING_LIVES};
use crate::renderer::{Surface, overlay, palette};
use crate::sim::{
    Action, Game, GameEvent, InputTracker, Phase, Rect, SeededRandom, Snapshot, clamp_span,
    is_below, overlaps,
};

/// Widest launch angle off vertical (radians)
const MAX_LAUNCH_ANGLE: f32 = 0.7;
/// Paddle-edge deflection off vertical (radians)
const MAX_BOUNCE_ANGLE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutTuning {
    pub width: f32,
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_y: f32,
    pub paddle_speed: f32,
    pub ball_size: f32,
    pub base_ball_speed: f32,
    pub max_ball_speed: f32,
    pub ball_speed_increment: f32,
    pub speed_score_divisor: f32,
    pub brick_rows: u32,
    pub brick_cols: u32,
    pub brick_height: f32,
    pub brick_gap: f32,
    /// Top of the first brick row
    pub brick_top: f32,
    pub reward: u32,
    pub starting_lives: u32,
}

impl Default for BreakoutTuning {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 360.0,
            paddle_width: 72.0,
            paddle_height: 10.0,
            paddle_y: 335.0,
            paddle_speed: 7.0,
            ball_size: 8.0,
            base_ball_speed: 3.5,
            max_ball_speed: 7.0,
            ball_speed_increment: 0.25,
            speed_score_divisor: 100.0,
            brick_rows: 5,
            brick_cols: 8,
            brick_height: 16.0,
            brick_gap: 4.0,
            brick_top: 40.0,
            reward: FIXED_REWARD,
            starting_lives: STARTING_LIVES,
        }
    }
}

impl BreakoutTuning {
    pub fn ball_speed_for(&self, score: u32) -> f32 {
        let divisor = self.speed_score_divisor.max(f32::EPSILON);
        (self.base_ball_speed + (score as f32 / divisor) * self.ball_speed_increment)
            .min(self.max_ball_speed)
    }

    pub fn paddle_rect(&self, x: f32) -> Rect {
        Rect::new(x, self.paddle_y, self.paddle_width, self.paddle_height)
    }

    fn ball_rect(&self, pos: Vec2) -> Rect {
        Rect::new(pos.x, pos.y, self.ball_size, self.ball_size)
    }

    /// Ball resting on the paddle's center
    fn ball_on_paddle(&self, paddle_x: f32) -> Vec2 {
        Vec2::new(
            paddle_x + (self.paddle_width - self.ball_size) / 2.0,
            self.paddle_y - self.ball_size - 1.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub rect: Rect,
    pub variant: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutState {
    pub paddle_x: f32,
    pub ball_pos: Vec2,
    /// Unit direction; magnitude comes from the score
    pub ball_dir: Vec2,
    pub serving: bool,
    /// In layout order
    pub bricks: Vec<Brick>,
    /// Walls laid out so far
    pub wave: u32,
    pub score: u32,
    pub lives: u32,
    pub phase: Phase,
}

impl Snapshot for BreakoutState {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn lives(&self) -> u32 {
        self.lives
    }

    fn with_phase(&self, phase: Phase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Breakout {
    pub tuning: BreakoutTuning,
}

impl Breakout {
    pub fn new(tuning: BreakoutTuning) -> Self {
        Self { tuning }
    }

    /// Fresh wall; each brick draws its visual variant from the seed
    fn lay_out_wall(&self, rng: &mut SeededRandom) -> Vec<Brick> {
        let t = &self.tuning;
        let cols = t.brick_cols.max(1);
        let brick_width = (t.width - t.brick_gap * (cols as f32 + 1.0)) / cols as f32;
        let mut bricks = Vec::with_capacity((t.brick_rows * cols) as usize);
        for row in 0..t.brick_rows {
            for col in 0..cols {
                let x = t.brick_gap + col as f32 * (brick_width + t.brick_gap);
                let y = t.brick_top + row as f32 * (t.brick_height + t.brick_gap);
                bricks.push(Brick {
                    rect: Rect::new(x, y, brick_width, t.brick_height),
                    variant: rng.next_index(palette::VARIANTS.len()) as u8,
                });
            }
        }
        bricks
    }
}

impl Game for Breakout {
    type State = BreakoutState;

    fn name(&self) -> &'static str {
        "breakout"
    }

    fn initial_state(&self) -> BreakoutState {
        let t = &self.tuning;
        let paddle_x = (t.width - t.paddle_width).max(0.0) / 2.0;
        BreakoutState {
            paddle_x,
            ball_pos: t.ball_on_paddle(paddle_x),
            ball_dir: Vec2::ZERO,
            serving: true,
            bricks: Vec::new(),
            wave: 0,
            score: 0,
            lives: t.starting_lives,
            phase: Phase::NotStarted,
        }
    }

    fn step(
        &self,
        prev: &BreakoutState,
        input: &InputTracker,
        rng: &mut SeededRandom,
        events: &mut Vec<GameEvent>,
    ) -> BreakoutState {
        let t = &self.tuning;
        let mut next = prev.clone();

        if input.is_active(Action::MoveLeft) {
            next.paddle_x = (next.paddle_x - t.paddle_speed).max(0.0);
        }
        if input.is_active(Action::MoveRight) {
            next.paddle_x += t.paddle_speed;
        }
        next.paddle_x = clamp_span(next.paddle_x, t.paddle_width, t.width);

        if next.bricks.is_empty() {
            next.bricks = self.lay_out_wall(rng);
            next.wave += 1;
            next.serving = true;
            log::debug!("breakout wave {}", next.wave);
        }

        if next.serving {
            let angle = (rng.next() as f32 * 2.0 - 1.0) * MAX_LAUNCH_ANGLE;
            next.ball_pos = t.ball_on_paddle(next.paddle_x);
            next.ball_dir = Vec2::new(angle.sin(), -angle.cos());
            next.serving = false;
            return next;
        }

        next.ball_pos += next.ball_dir * t.ball_speed_for(prev.score);

        // Side and top walls
        if next.ball_pos.x < 0.0 {
            next.ball_pos.x = 0.0;
            next.ball_dir.x = next.ball_dir.x.abs();
        } else if next.ball_pos.x + t.ball_size > t.width {
            next.ball_pos.x = t.width - t.ball_size;
            next.ball_dir.x = -next.ball_dir.x.abs();
        }
        if next.ball_pos.y < 0.0 {
            next.ball_pos.y = 0.0;
            next.ball_dir.y = next.ball_dir.y.abs();
        }

        let ball = t.ball_rect(next.ball_pos);
        let paddle = t.paddle_rect(next.paddle_x);

        if next.ball_dir.y > 0.0 && overlaps(&ball, &paddle) {
            let offset =
                ((ball.center().x - paddle.center().x) / (paddle.size.x / 2.0)).clamp(-1.0, 1.0);
            let angle = offset * MAX_BOUNCE_ANGLE;
            next.ball_dir = Vec2::new(angle.sin(), -angle.cos());
            next.ball_pos.y = paddle.top() - t.ball_size;
        } else if let Some(hit) = next.bricks.iter().position(|b| overlaps(&ball, &b.rect)) {
            next.bricks.remove(hit);
            next.ball_dir.y = -next.ball_dir.y;
            next.score += t.reward;
            events.push(GameEvent::Scored { score: next.score });
        } else if is_below(&ball, t.height) {
            next.lives = next.lives.saturating_sub(1);
            next.serving = true;
            events.push(GameEvent::LifeLost { lives: next.lives });
            if next.lives == 0 {
                next.phase = Phase::GameOver;
                events.push(GameEvent::GameOver { score: next.score });
            }
        }
        next
    }

    fn render(&self, state: &BreakoutState, seed: &str, surface: &mut dyn Surface) {
        let t = &self.tuning;
        surface.clear(palette::BACKGROUND);
        for brick in &state.bricks {
            surface.fill_rect(brick.rect, palette::variant(brick.variant));
        }
        surface.fill_rect(t.paddle_rect(state.paddle_x), palette::PLAYER);
        surface.fill_rect(t.ball_rect(state.ball_pos), palette::BALL);
        overlay::hud(surface, state.score, Some(state.lives));
        overlay::phase_overlay(surface, "Breakout", state.phase, state.score, seed);
    }

    /// Keep the paddle under the ball
    fn autopilot(&self, state: &BreakoutState, input: &mut InputTracker) {
        let t = &self.tuning;
        let target = state.ball_pos.x + t.ball_size / 2.0;
        let center = state.paddle_x + t.paddle_width / 2.0;
        input.deactivate(Action::MoveLeft);
        input.deactivate(Action::MoveRight);
        if target < center - t.paddle_speed {
            input.activate(Action::MoveLeft);
        } else if target > center + t.paddle_speed {
            input.activate(Action::MoveRight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Arcade, Engine};

    fn started(game: &Breakout) -> BreakoutState {
        let mut rng = SeededRandom::new("bricks");
        let mut events = Vec::new();
        let state = game.initial_state().with_phase(Phase::Playing);
        game.step(&state, &InputTracker::new(), &mut rng, &mut events)
    }

    #[test]
    fn test_first_tick_lays_out_wall_and_serves() {
        let game = Breakout::default();
        let state = started(&game);
        assert_eq!(state.bricks.len(), 40);
        assert_eq!(state.wave, 1);
        assert!(!state.serving);
        assert!(state.ball_dir.y < 0.0);
        for brick in &state.bricks {
            assert!(brick.rect.left() >= 0.0);
            assert!(brick.rect.right() <= game.tuning.width + 1e-3);
        }
    }

    #[test]
    fn test_brick_hit_scores_and_reflects() {
        let game = Breakout::default();
        let mut state = started(&game);
        let target = state.bricks[state.bricks.len() - 1].rect;
        state.ball_pos = Vec2::new(target.left() + 4.0, target.bottom() + 2.0);
        state.ball_dir = Vec2::new(0.0, -1.0);
        let before = state.bricks.len();

        let mut rng = SeededRandom::new("bricks");
        let mut events = Vec::new();
        let next = game.step(&state, &InputTracker::new(), &mut rng, &mut events);
        assert_eq!(next.bricks.len(), before - 1);
        assert_eq!(next.score, 10);
        assert!(next.ball_dir.y > 0.0);
    }

    #[test]
    fn test_clearing_wall_lays_out_next_wave() {
        let game = Breakout::default();
        let mut state = started(&game);
        let last = state.bricks[state.bricks.len() - 1];
        state.bricks = vec![last];
        state.ball_pos = Vec2::new(last.rect.left() + 4.0, last.rect.bottom() + 2.0);
        state.ball_dir = Vec2::new(0.0, -1.0);

        let mut rng = SeededRandom::new("bricks");
        let mut events = Vec::new();
        let cleared = game.step(&state, &InputTracker::new(), &mut rng, &mut events);
        assert!(cleared.bricks.is_empty());
        assert_eq!(cleared.wave, 1);

        let next = game.step(&cleared, &InputTracker::new(), &mut rng, &mut events);
        assert_eq!(next.wave, 2);
        assert_eq!(next.bricks.len(), 40);
        assert_eq!(next.score, 10);
        assert_eq!(next.lives, game.tuning.starting_lives);
        assert!(!next.serving);
        assert!(next.ball_dir.y < 0.0);
        assert_eq!(next.phase, Phase::Playing);
    }

    #[test]
    fn test_drop_costs_life() {
        let game = Breakout::default();
        let mut state = started(&game);
        state.paddle_x = 0.0;
        state.ball_pos = Vec2::new(400.0, game.tuning.height - 1.0);
        state.ball_dir = Vec2::new(0.0, 1.0);

        let mut rng = SeededRandom::new("bricks");
        let mut events = Vec::new();
        let next = game.step(&state, &InputTracker::new(), &mut rng, &mut events);
        assert_eq!(next.lives, 2);
        assert!(next.serving);
        assert_eq!(events, vec![GameEvent::LifeLost { lives: 2 }]);
    }

    #[test]
    fn test_paddle_bounce() {
        let game = Breakout::default();
        let mut state = started(&game);
        let t = &game.tuning;
        state.ball_pos = Vec2::new(
            state.paddle_x + t.paddle_width / 2.0 - t.ball_size / 2.0,
            t.paddle_y - t.ball_size - 1.0,
        );
        state.ball_dir = Vec2::new(0.0, 1.0);

        let mut rng = SeededRandom::new("bricks");
        let mut events = Vec::new();
        let next = game.step(&state, &InputTracker::new(), &mut rng, &mut events);
        assert!(next.ball_dir.y < 0.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_autopilot_breaks_bricks() {
        let mut engine = Engine::new(Breakout::default(), "404");
        engine.confirm();
        for _ in 0..3000 {
            engine.autopilot();
            engine.tick();
        }
        assert!(engine.score() > 0);
    }
}
