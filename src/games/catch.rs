//! Catch: steer a paddle to catch falling objects
//!
//! Per tick: move the paddle, maybe spawn, advance and resolve every falling
//! entity in one pass, recompute fall speed from score, then check for the
//! end of the run.
//!
//! Two tie-breaks are deliberate and covered by tests:
//! - Holding left and right together applies both moves in that order
//!   (left clamp first, then right clamp). Mid-field they cancel out; pinned
//!   at the left wall the right move wins.
//! - An entity that both overlaps the paddle and has dropped past the
//!   playfield bottom in the same tick is caught, not missed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{FIXED_REWARD, STARTING_LIVES};
use crate::renderer::{Surface, overlay, palette};
use crate::sim::{
    Action, Game, GameEvent, InputTracker, Phase, Rect, SeededRandom, Snapshot, clamp_span,
    is_below, overlaps,
};

/// Catch balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchTuning {
    pub width: f32,
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Top edge of the paddle
    pub paddle_y: f32,
    /// Horizontal paddle movement per tick
    pub paddle_speed: f32,
    /// Falling objects are `entity_size` squares
    pub entity_size: f32,
    pub base_fall_speed: f32,
    pub max_fall_speed: f32,
    /// Fall speed gained per `speed_score_divisor` points
    pub fall_speed_increment: f32,
    pub speed_score_divisor: f32,
    pub base_spawn_interval: u32,
    pub min_spawn_interval: u32,
    /// Every this many points shaves one tick off the spawn interval
    pub spawn_score_divisor: u32,
    pub reward: u32,
    pub starting_lives: u32,
    /// Number of visual variants drawn from the palette
    pub variants: u8,
}

impl Default for CatchTuning {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 360.0,
            paddle_width: 80.0,
            paddle_height: 12.0,
            paddle_y: 330.0,
            paddle_speed: 6.0,
            entity_size: 20.0,
            base_fall_speed: 2.0,
            max_fall_speed: 8.0,
            fall_speed_increment: 0.5,
            speed_score_divisor: 50.0,
            base_spawn_interval: 60,
            min_spawn_interval: 20,
            spawn_score_divisor: 10,
            reward: FIXED_REWARD,
            starting_lives: STARTING_LIVES,
            variants: palette::VARIANTS.len() as u8,
        }
    }
}

impl CatchTuning {
    /// Fall speed as a pure function of score, capped at `max_fall_speed`
    pub fn fall_speed_for(&self, score: u32) -> f32 {
        let divisor = self.speed_score_divisor.max(f32::EPSILON);
        let speed = self.base_fall_speed + (score as f32 / divisor) * self.fall_speed_increment;
        speed.min(self.max_fall_speed)
    }

    /// Ticks between spawns, shrinking with score down to `min_spawn_interval`
    pub fn spawn_interval_for(&self, score: u32) -> u32 {
        let shaved = score / self.spawn_score_divisor.max(1);
        self.base_spawn_interval
            .saturating_sub(shaved)
            .max(self.min_spawn_interval)
            .max(1)
    }

    /// Rightmost legal paddle position
    pub fn paddle_max_x(&self) -> f32 {
        (self.width - self.paddle_width).max(0.0)
    }

    pub fn paddle_rect(&self, paddle_x: f32) -> Rect {
        Rect::new(paddle_x, self.paddle_y, self.paddle_width, self.paddle_height)
    }
}

/// A falling object; compared structurally, it has no identity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Top-left corner
    pub pos: Vec2,
    /// Index into the visual palette
    pub variant: u8,
}

impl Entity {
    pub fn rect(&self, size: f32) -> Rect {
        Rect::new(self.pos.x, self.pos.y, size, size)
    }
}

/// One catch snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchState {
    pub paddle_x: f32,
    /// In spawn order
    pub entities: Vec<Entity>,
    pub score: u32,
    /// Signed so every miss is counted even past zero
    pub lives: i32,
    pub fall_speed: f32,
    /// Ticks since the last spawn
    pub spawn_timer: u32,
    pub phase: Phase,
}

impl Snapshot for CatchState {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn lives(&self) -> u32 {
        self.lives.max(0) as u32
    }

    fn with_phase(&self, phase: Phase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }
}

/// The catch game rules
#[derive(Debug, Clone, Default)]
pub struct Catch {
    pub tuning: CatchTuning,
}

impl Catch {
    pub fn new(tuning: CatchTuning) -> Self {
        Self { tuning }
    }

    /// Apply held directions: left first, then right, each with its own clamp
    fn move_paddle(&self, paddle_x: f32, input: &InputTracker) -> f32 {
        let t = &self.tuning;
        let mut x = paddle_x;
        if input.is_active(Action::MoveLeft) {
            x = (x - t.paddle_speed).max(0.0);
        }
        if input.is_active(Action::MoveRight) {
            x = (x + t.paddle_speed).min(t.paddle_max_x());
        }
        clamp_span(x, t.paddle_width, t.width)
    }
}

impl Game for Catch {
    type State = CatchState;

    fn name(&self) -> &'static str {
        "catch"
    }

    fn initial_state(&self) -> CatchState {
        let t = &self.tuning;
        CatchState {
            paddle_x: t.paddle_max_x() / 2.0,
            entities: Vec::new(),
            score: 0,
            lives: t.starting_lives as i32,
            fall_speed: t.fall_speed_for(0),
            spawn_timer: 0,
            phase: Phase::NotStarted,
        }
    }

    fn step(
        &self,
        prev: &CatchState,
        input: &InputTracker,
        rng: &mut SeededRandom,
        events: &mut Vec<GameEvent>,
    ) -> CatchState {
        let t = &self.tuning;

        // 1. Paddle
        let paddle_x = self.move_paddle(prev.paddle_x, input);
        let paddle = t.paddle_rect(paddle_x);

        // 2. Spawn
        let mut spawn_timer = prev.spawn_timer + 1;
        let mut spawned = None;
        if spawn_timer >= t.spawn_interval_for(prev.score) {
            spawn_timer = 0;
            let x = rng.next_below(f64::from(t.width - t.entity_size)) as f32;
            let variant = rng.next_index(usize::from(t.variants)) as u8;
            spawned = Some(Entity {
                pos: Vec2::new(x, -t.entity_size),
                variant,
            });
        }

        // 3. Advance and resolve, catch before miss
        let mut score = prev.score;
        let mut lives = prev.lives;
        let mut entities = Vec::with_capacity(prev.entities.len() + 1);
        for entity in prev.entities.iter().chain(spawned.iter()) {
            let moved = Entity {
                pos: entity.pos + Vec2::new(0.0, prev.fall_speed),
                variant: entity.variant,
            };
            let rect = moved.rect(t.entity_size);
            if overlaps(&rect, &paddle) {
                score += t.reward;
                events.push(GameEvent::Scored { score });
            } else if is_below(&rect, t.height) {
                lives -= 1;
                events.push(GameEvent::LifeLost {
                    lives: lives.max(0) as u32,
                });
            } else {
                entities.push(moved);
            }
        }

        // 4. Difficulty from the current score
        let fall_speed = t.fall_speed_for(score);

        // 5. Terminal check
        let phase = if lives <= 0 {
            events.push(GameEvent::GameOver { score });
            Phase::GameOver
        } else {
            prev.phase
        };

        CatchState {
            paddle_x,
            entities,
            score,
            lives,
            fall_speed,
            spawn_timer,
            phase,
        }
    }

    fn render(&self, state: &CatchState, seed: &str, surface: &mut dyn Surface) {
        let t = &self.tuning;
        surface.clear(palette::BACKGROUND);
        surface.fill_rect(t.paddle_rect(state.paddle_x), palette::PLAYER);
        for entity in &state.entities {
            surface.fill_rect(entity.rect(t.entity_size), palette::variant(entity.variant));
        }
        overlay::hud(surface, state.score, Some(state.lives()));
        overlay::phase_overlay(surface, "Catch", state.phase, state.score, seed);
    }

    /// Chase the lowest falling object
    fn autopilot(&self, state: &CatchState, input: &mut InputTracker) {
        let t = &self.tuning;
        let target = state
            .entities
            .iter()
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|e| e.pos.x + t.entity_size / 2.0);
        let center = state.paddle_x + t.paddle_width / 2.0;

        input.deactivate(Action::MoveLeft);
        input.deactivate(Action::MoveRight);
        if let Some(target) = target {
            if target < center - t.paddle_speed {
                input.activate(Action::MoveLeft);
            } else if target > center + t.paddle_speed {
                input.activate(Action::MoveRight);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use proptest::prelude::*;

    use super::*;
    use crate::renderer::PaintList;
    use crate::sim::{Arcade, Engine};

    fn playing(game: &Catch) -> CatchState {
        game.initial_state().with_phase(Phase::Playing)
    }

    fn step(
        game: &Catch,
        state: &CatchState,
        input: &InputTracker,
    ) -> (CatchState, Vec<GameEvent>) {
        let mut rng = SeededRandom::new("404");
        let mut events = Vec::new();
        let next = game.step(state, input, &mut rng, &mut events);
        (next, events)
    }

    #[test]
    fn test_initial_state() {
        let game = Catch::default();
        let state = game.initial_state();
        assert_eq!(state.phase, Phase::NotStarted);
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 3);
        assert!(state.entities.is_empty());
        assert_eq!(state.paddle_x, 200.0);
        assert_eq!(state.fall_speed, 2.0);
    }

    #[test]
    fn test_first_spawn_interval_with_no_input() {
        let game = Catch::default();
        let mut engine = Engine::new(game.clone(), "404");
        engine.press_confirm();
        for _ in 0..game.tuning.base_spawn_interval {
            engine.step();
        }
        let state = engine.state();
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 3);
        assert_eq!(state.entities.len(), 1);
        assert_eq!(state.spawn_timer, 0);
    }

    #[test]
    fn test_spawn_position_in_bounds() {
        let game = Catch::default();
        let mut engine = Engine::new(game.clone(), "bounds");
        engine.press_confirm();
        for _ in 0..600 {
            engine.step();
            for e in &engine.state().entities {
                assert!(e.pos.x >= 0.0);
                assert!(e.pos.x <= game.tuning.width - game.tuning.entity_size);
                assert_eq!(e.pos.x, e.pos.x.floor());
                assert!(e.variant < game.tuning.variants);
            }
        }
    }

    #[test]
    fn test_catch_on_touching_edge() {
        let game = Catch::default();
        let mut state = playing(&game);
        state.paddle_x = 200.0;
        // Right edge lands exactly on the paddle's left edge
        state.entities = vec![Entity {
            pos: Vec2::new(180.0, 318.0),
            variant: 0,
        }];

        let (next, events) = step(&game, &state, &InputTracker::new());
        assert_eq!(next.score, 10);
        assert!(next.entities.is_empty());
        assert_eq!(events, vec![GameEvent::Scored { score: 10 }]);
    }

    #[test]
    fn test_just_outside_edge_is_not_caught() {
        let game = Catch::default();
        let mut state = playing(&game);
        state.paddle_x = 200.0;
        state.entities = vec![Entity {
            pos: Vec2::new(179.5, 318.0),
            variant: 0,
        }];

        let (next, events) = step(&game, &state, &InputTracker::new());
        assert_eq!(next.score, 0);
        assert_eq!(next.entities.len(), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn test_catch_wins_over_miss() {
        // Paddle sits below the playfield bottom, so one entity can be both
        // past the bottom and on the paddle's top edge in the same tick.
        let game = Catch::new(CatchTuning {
            height: 100.0,
            paddle_y: 101.0,
            ..CatchTuning::default()
        });
        let mut state = playing(&game);
        state.paddle_x = 0.0;
        state.entities = vec![Entity {
            pos: Vec2::new(10.0, 99.0),
            variant: 2,
        }];

        let (next, events) = step(&game, &state, &InputTracker::new());
        assert_eq!(next.score, 10);
        assert_eq!(next.lives, 3);
        assert_eq!(events, vec![GameEvent::Scored { score: 10 }]);
    }

    #[test]
    fn test_three_misses_end_the_run() {
        let game = Catch::default();
        let mut state = playing(&game);
        state.paddle_x = game.tuning.paddle_max_x();
        state.entities = [359.0, 350.0, 340.0]
            .into_iter()
            .map(|y| Entity {
                pos: Vec2::new(0.0, y),
                variant: 0,
            })
            .collect();

        let input = InputTracker::new();
        let mut miss_ticks = Vec::new();
        for tick in 1..=20 {
            let (next, events) = step(&game, &state, &input);
            if events.iter().any(|e| matches!(e, GameEvent::LifeLost { .. })) {
                miss_ticks.push(tick);
            }
            state = next;
            if state.phase == Phase::GameOver {
                break;
            }
        }

        assert_eq!(miss_ticks, vec![1, 6, 11]);
        assert_eq!(state.lives, 0);
        assert_eq!(state.score, 0);
        assert_eq!(state.phase, Phase::GameOver);
    }

    #[test]
    fn test_opposing_directions_cancel_mid_field() {
        let game = Catch::default();
        let state = playing(&game);
        let mut input = InputTracker::new();
        input.activate(Action::MoveLeft);
        input.activate(Action::MoveRight);

        let (next, _) = step(&game, &state, &input);
        assert_eq!(next.paddle_x, state.paddle_x);
    }

    #[test]
    fn test_opposing_directions_at_left_wall() {
        let game = Catch::default();
        let mut state = playing(&game);
        state.paddle_x = 0.0;
        let mut input = InputTracker::new();
        input.activate(Action::MoveLeft);
        input.activate(Action::MoveRight);

        // Left clamps to 0, then right applies in full
        let (next, _) = step(&game, &state, &input);
        assert_eq!(next.paddle_x, game.tuning.paddle_speed);
    }

    #[test]
    fn test_difficulty_curve() {
        let t = CatchTuning::default();
        assert_eq!(t.fall_speed_for(0), 2.0);
        assert_eq!(t.fall_speed_for(100), 3.0);
        assert_eq!(t.fall_speed_for(100_000), t.max_fall_speed);

        assert_eq!(t.spawn_interval_for(0), 60);
        assert_eq!(t.spawn_interval_for(100), 50);
        assert_eq!(t.spawn_interval_for(10_000), 20);
    }

    #[test]
    fn test_game_over_freezes_engine() {
        let game = Catch::default();
        let mut engine = Engine::new(game, "404");
        engine.press_confirm();
        // No input: everything falls past the paddle eventually
        while engine.phase() != Phase::GameOver {
            engine.step();
            assert!(engine.ticks() < 10_000);
        }
        let frozen = engine.state().clone();
        engine.input_mut().activate(Action::MoveLeft);
        for _ in 0..100 {
            engine.step();
        }
        assert_eq!(engine.state(), &frozen);
    }

    #[test]
    fn test_restart_replays_seed() {
        let mut engine = Engine::new(Catch::default(), "replay");
        engine.press_confirm();
        let mut first = Vec::new();
        while engine.phase() != Phase::GameOver {
            engine.step();
            first.push(engine.state().entities.clone());
        }

        assert_eq!(engine.press_confirm(), Phase::NotStarted);
        assert_eq!(engine.state(), &Catch::default().initial_state());
        assert_eq!(engine.press_confirm(), Phase::Playing);

        for expected in &first {
            engine.step();
            assert_eq!(&engine.state().entities, expected);
        }
        assert_eq!(engine.phase(), Phase::GameOver);
    }

    #[test]
    fn test_score_callback_sees_every_catch() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let game = Catch::default();
        let mut engine = Engine::new(game.clone(), "404")
            .with_score_callback(move |s| sink.borrow_mut().push(s));
        engine.press_confirm();

        for _ in 0..3000 {
            let mut input = *engine.input();
            game.autopilot(engine.state(), &mut input);
            *engine.input_mut() = input;
            engine.step();
        }

        let seen = seen.borrow();
        assert!(!seen.is_empty());
        let expected: Vec<u32> = (1..=seen.len() as u32).map(|n| n * 10).collect();
        assert_eq!(*seen, expected);
        assert_eq!(*seen.last().unwrap_or(&0), engine.state().score);
    }

    #[test]
    fn test_render_before_first_tick() {
        let engine = Engine::new(Catch::default(), "404");
        let before = engine.state().clone();
        let mut list = PaintList::new(480.0, 360.0);
        engine.render(&mut list);

        assert_eq!(engine.state(), &before);
        assert!(list.has_text("Catch"));
        assert!(list.has_text("to start"));
        assert_eq!(list.rects_with(palette::PLAYER).len(), 1);
    }

    #[test]
    fn test_render_game_over_shows_seed() {
        let game = Catch::default();
        let mut state = playing(&game);
        state.phase = Phase::GameOver;
        state.score = 70;
        let mut list = PaintList::new(480.0, 360.0);
        game.render(&state, "my-seed", &mut list);
        assert!(list.has_text("Final score: 70"));
        assert!(list.has_text("Seed: my-seed"));
    }

    fn action_trace() -> impl Strategy<Value = Vec<(bool, bool)>> {
        prop::collection::vec((any::<bool>(), any::<bool>()), 1..400)
    }

    fn run_trace(seed: &str, trace: &[(bool, bool)]) -> Vec<CatchState> {
        let mut engine = Engine::new(Catch::default(), seed);
        engine.press_confirm();
        let mut states = Vec::with_capacity(trace.len());
        for &(left, right) in trace {
            let input = engine.input_mut();
            input.clear();
            if left {
                input.activate(Action::MoveLeft);
            }
            if right {
                input.activate(Action::MoveRight);
            }
            engine.step();
            states.push(engine.state().clone());
        }
        states
    }

    proptest! {
        #[test]
        fn prop_same_seed_same_run(seed in "[a-z0-9]{0,8}", trace in action_trace()) {
            let a = run_trace(&seed, &trace);
            let b = run_trace(&seed, &trace);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_paddle_stays_in_bounds(trace in action_trace()) {
            let t = CatchTuning::default();
            for state in run_trace("clamp", &trace) {
                prop_assert!(state.paddle_x >= 0.0);
                prop_assert!(state.paddle_x <= t.width - t.paddle_width);
            }
        }

        #[test]
        fn prop_fall_speed_monotonic(a in 0u32..100_000, b in 0u32..100_000) {
            let t = CatchTuning::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(t.fall_speed_for(lo) <= t.fall_speed_for(hi));
            prop_assert!(t.fall_speed_for(hi) <= t.max_fall_speed);
            prop_assert!(t.spawn_interval_for(lo) >= t.spawn_interval_for(hi));
        }

        #[test]
        fn prop_every_removed_entity_is_accounted(seed in "[a-z]{1,6}", trace in action_trace()) {
            let game = Catch::default();
            let mut engine = Engine::new(game, &seed);
            engine.press_confirm();
            for &(left, right) in &trace {
                let prev = engine.state().clone();
                let input = engine.input_mut();
                input.clear();
                if left {
                    input.activate(Action::MoveLeft);
                }
                if right {
                    input.activate(Action::MoveRight);
                }
                engine.step();
                let next = engine.state();
                if prev.phase != Phase::Playing {
                    prop_assert_eq!(next, &prev);
                    continue;
                }
                let spawned = usize::from(next.spawn_timer == 0);
                let removed = prev.entities.len() + spawned - next.entities.len();
                let caught = ((next.score - prev.score) / 10) as usize;
                let missed = (prev.lives - next.lives) as usize;
                prop_assert_eq!(removed, caught + missed);
            }
        }
    }
}
