//! Pong: player on the left, CPU on the right
//!
//! Returning the ball scores, letting it past the left edge costs a life,
//! getting it past the CPU scores a point bonus. Ball speed follows score.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{FIXED_REWARD, STARTING_LIVES};
use crate::renderer::{Surface, overlay, palette};
use crate::sim::{
    Action, Game, GameEvent, InputTracker, Phase, Rect, SeededRandom, Snapshot, clamp_span,
    overlaps,
};

/// Widest serve angle off horizontal (radians)
const MAX_SERVE_ANGLE: f32 = 0.5;
/// How far off-center hits bend the return (radians at the paddle tip)
const MAX_RETURN_ANGLE: f32 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PongTuning {
    pub width: f32,
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Gap between each paddle and its edge
    pub paddle_margin: f32,
    pub paddle_speed: f32,
    pub cpu_speed: f32,
    pub ball_size: f32,
    pub base_ball_speed: f32,
    pub max_ball_speed: f32,
    pub ball_speed_increment: f32,
    pub speed_score_divisor: f32,
    pub return_reward: u32,
    pub point_reward: u32,
    pub starting_lives: u32,
}

impl Default for PongTuning {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 360.0,
            paddle_width: 10.0,
            paddle_height: 70.0,
            paddle_margin: 16.0,
            paddle_speed: 6.0,
            cpu_speed: 4.0,
            ball_size: 10.0,
            base_ball_speed: 4.0,
            max_ball_speed: 9.0,
            ball_speed_increment: 0.5,
            speed_score_divisor: 50.0,
            return_reward: FIXED_REWARD,
            point_reward: 5 * FIXED_REWARD,
            starting_lives: STARTING_LIVES,
        }
    }
}

impl PongTuning {
    pub fn ball_speed_for(&self, score: u32) -> f32 {
        let divisor = self.speed_score_divisor.max(f32::EPSILON);
        (self.base_ball_speed + (score as f32 / divisor) * self.ball_speed_increment)
            .min(self.max_ball_speed)
    }

    pub fn player_rect(&self, y: f32) -> Rect {
        Rect::new(self.paddle_margin, y, self.paddle_width, self.paddle_height)
    }

    pub fn cpu_rect(&self, y: f32) -> Rect {
        Rect::new(
            self.width - self.paddle_margin - self.paddle_width,
            y,
            self.paddle_width,
            self.paddle_height,
        )
    }

    fn ball_rect(&self, pos: Vec2) -> Rect {
        Rect::new(pos.x, pos.y, self.ball_size, self.ball_size)
    }

    fn center_ball(&self) -> Vec2 {
        Vec2::new(
            (self.width - self.ball_size) / 2.0,
            (self.height - self.ball_size) / 2.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PongState {
    pub player_y: f32,
    pub cpu_y: f32,
    /// Top-left of the ball
    pub ball_pos: Vec2,
    /// Unit direction; magnitude comes from the score
    pub ball_dir: Vec2,
    /// Ball waits at center and is served next tick
    pub serving: bool,
    pub score: u32,
    pub lives: u32,
    pub phase: Phase,
}

impl Snapshot for PongState {
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
pub struct Pong {
    pub tuning: PongTuning,
}

impl Pong {
    pub fn new(tuning: PongTuning) -> Self {
        Self { tuning }
    }

    /// Seeded serve: random side, random angle within the serve cone
    fn serve(&self, rng: &mut SeededRandom) -> Vec2 {
        let toward_player = rng.next() < 0.5;
        let angle = (rng.next() as f32 * 2.0 - 1.0) * MAX_SERVE_ANGLE;
        let x = if toward_player { -angle.cos() } else { angle.cos() };
        Vec2::new(x, angle.sin())
    }

    /// Outgoing direction after a paddle hit, bent by where it hit
    fn return_dir(&self, ball: &Rect, paddle: &Rect, going_right: bool) -> Vec2 {
        let offset =
            ((ball.center().y - paddle.center().y) / (paddle.size.y / 2.0)).clamp(-1.0, 1.0);
        let angle = offset * MAX_RETURN_ANGLE;
        let x = if going_right { angle.cos() } else { -angle.cos() };
        Vec2::new(x, angle.sin())
    }
}

impl Game for Pong {
    type State = PongState;

    fn name(&self) -> &'static str {
        "pong"
    }

    fn initial_state(&self) -> PongState {
        let t = &self.tuning;
        let mid = (t.height - t.paddle_height) / 2.0;
        PongState {
            player_y: mid,
            cpu_y: mid,
            ball_pos: t.center_ball(),
            ball_dir: Vec2::ZERO,
            serving: true,
            score: 0,
            lives: t.starting_lives,
            phase: Phase::NotStarted,
        }
    }

    fn step(
        &self,
        prev: &PongState,
        input: &InputTracker,
        rng: &mut SeededRandom,
        events: &mut Vec<GameEvent>,
    ) -> PongState {
        let t = &self.tuning;
        let mut next = prev.clone();

        // Player: up then down, each applied
        if input.is_active(Action::MoveUp) {
            next.player_y -= t.paddle_speed;
        }
        if input.is_active(Action::MoveDown) {
            next.player_y += t.paddle_speed;
        }
        next.player_y = clamp_span(next.player_y, t.paddle_height, t.height);

        // CPU tracks the ball at a capped speed
        let cpu_center = prev.cpu_y + t.paddle_height / 2.0;
        let ball_center = prev.ball_pos.y + t.ball_size / 2.0;
        next.cpu_y += (ball_center - cpu_center).clamp(-t.cpu_speed, t.cpu_speed);
        next.cpu_y = clamp_span(next.cpu_y, t.paddle_height, t.height);

        if prev.serving {
            next.ball_pos = t.center_ball();
            next.ball_dir = self.serve(rng);
            next.serving = false;
            return next;
        }

        next.ball_pos += next.ball_dir * t.ball_speed_for(prev.score);

        // Top and bottom walls
        if next.ball_pos.y < 0.0 {
            next.ball_pos.y = 0.0;
            next.ball_dir.y = next.ball_dir.y.abs();
        } else if next.ball_pos.y + t.ball_size > t.height {
            next.ball_pos.y = t.height - t.ball_size;
            next.ball_dir.y = -next.ball_dir.y.abs();
        }

        let ball = t.ball_rect(next.ball_pos);
        let player = t.player_rect(next.player_y);
        let cpu = t.cpu_rect(next.cpu_y);

        if next.ball_dir.x < 0.0 && overlaps(&ball, &player) {
            next.ball_dir = self.return_dir(&ball, &player, true);
            next.ball_pos.x = player.right();
            next.score += t.return_reward;
            events.push(GameEvent::Scored { score: next.score });
        } else if next.ball_dir.x > 0.0 && overlaps(&ball, &cpu) {
            next.ball_dir = self.return_dir(&ball, &cpu, false);
            next.ball_pos.x = cpu.left() - t.ball_size;
        } else if ball.right() < 0.0 {
            next.lives = next.lives.saturating_sub(1);
            next.serving = true;
            events.push(GameEvent::LifeLost { lives: next.lives });
        } else if ball.left() > t.width {
            next.score += t.point_reward;
            next.serving = true;
            events.push(GameEvent::Scored { score: next.score });
        }

        if next.lives == 0 {
            next.phase = Phase::GameOver;
            events.push(GameEvent::GameOver { score: next.score });
        }
        next
    }

    fn render(&self, state: &PongState, seed: &str, surface: &mut dyn Surface) {
        let t = &self.tuning;
        surface.clear(palette::BACKGROUND);
        surface.fill_rect(t.player_rect(state.player_y), palette::PLAYER);
        surface.fill_rect(t.cpu_rect(state.cpu_y), palette::OPPONENT);
        surface.fill_rect(t.ball_rect(state.ball_pos), palette::BALL);
        overlay::hud(surface, state.score, Some(state.lives));
        overlay::phase_overlay(surface, "Pong", state.phase, state.score, seed);
    }

    /// Keep the paddle centered on the ball
    fn autopilot(&self, state: &PongState, input: &mut InputTracker) {
        let t = &self.tuning;
        let target = state.ball_pos.y + t.ball_size / 2.0;
        let center = state.player_y + t.paddle_height / 2.0;
        input.deactivate(Action::MoveUp);
        input.deactivate(Action::MoveDown);
        if target < center - t.paddle_speed {
            input.activate(Action::MoveUp);
        } else if target > center + t.paddle_speed {
            input.activate(Action::MoveDown);
        }
    }
}
