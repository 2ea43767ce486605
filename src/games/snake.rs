//! Snake: grid movement, food growth, wall and self collision
//!
//! Direction changes are buffered from held input every tick and applied on
//! the next move. When several directions are held the first one in
//! up/down/left/right order that is not a reversal wins.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::FIXED_REWARD;
use crate::renderer::{Surface, overlay, palette};
use crate::sim::{Action, Game, GameEvent, InputTracker, Phase, Rect, SeededRandom, Snapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeTuning {
    pub cols: i32,
    pub rows: i32,
    /// Pixel size of one cell
    pub cell: f32,
    pub start_length: usize,
    /// Ticks per move at score 0
    pub base_move_interval: u32,
    pub min_move_interval: u32,
    /// Every this many points the snake moves one tick sooner
    pub speed_score_divisor: u32,
    pub reward: u32,
}

impl Default for SnakeTuning {
    fn default() -> Self {
        Self {
            cols: 24,
            rows: 18,
            cell: 20.0,
            start_length: 3,
            base_move_interval: 8,
            min_move_interval: 3,
            speed_score_divisor: 50,
            reward: FIXED_REWARD,
        }
    }
}

impl SnakeTuning {
    pub fn move_interval_for(&self, score: u32) -> u32 {
        let shaved = score / self.speed_score_divisor.max(1);
        self.base_move_interval
            .saturating_sub(shaved)
            .max(self.min_move_interval)
            .max(1)
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        (0..self.cols).contains(&cell.x) && (0..self.rows).contains(&cell.y)
    }

    fn cell_rect(&self, cell: IVec2) -> Rect {
        Rect::new(
            cell.x as f32 * self.cell + 1.0,
            cell.y as f32 * self.cell + 1.0,
            self.cell - 2.0,
            self.cell - 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    fn action(self) -> Action {
        match self {
            Direction::Up => Action::MoveUp,
            Direction::Down => Action::MoveDown,
            Direction::Left => Action::MoveLeft,
            Direction::Right => Action::MoveRight,
        }
    }

    const ORDER: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeState {
    /// Head first
    pub body: Vec<IVec2>,
    pub direction: Direction,
    /// Applied on the next move
    pub pending: Direction,
    /// Placed on the first tick of a run
    pub food: Option<IVec2>,
    pub move_timer: u32,
    pub score: u32,
    pub lives: u32,
    pub phase: Phase,
}

impl Snapshot for SnakeState {
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
pub struct Snake {
    pub tuning: SnakeTuning,
}

impl Snake {
    pub fn new(tuning: SnakeTuning) -> Self {
        Self { tuning }
    }

    /// Seeded pick among cells the snake does not occupy
    fn place_food(&self, body: &[IVec2], rng: &mut SeededRandom) -> Option<IVec2> {
        let t = &self.tuning;
        let free: Vec<IVec2> = (0..t.rows)
            .flat_map(|y| (0..t.cols).map(move |x| IVec2::new(x, y)))
            .filter(|cell| !body.contains(cell))
            .collect();
        if free.is_empty() {
            return None;
        }
        Some(free[rng.random_range(0..free.len())])
    }
}

impl Game for Snake {
    type State = SnakeState;

    fn name(&self) -> &'static str {
        "snake"
    }

    fn initial_state(&self) -> SnakeState {
        let t = &self.tuning;
        let head = IVec2::new(t.cols / 2, t.rows / 2);
        let length = t.start_length.clamp(1, (t.cols / 2).max(1) as usize);
        SnakeState {
            body: (0..length as i32).map(|i| head - IVec2::new(i, 0)).collect(),
            direction: Direction::Right,
            pending: Direction::Right,
            food: None,
            move_timer: 0,
            score: 0,
            lives: 1,
            phase: Phase::NotStarted,
        }
    }

    fn step(
        &self,
        prev: &SnakeState,
        input: &InputTracker,
        rng: &mut SeededRandom,
        events: &mut Vec<GameEvent>,
    ) -> SnakeState {
        let t = &self.tuning;
        let mut next = prev.clone();

        if next.food.is_none() {
            next.food = self.place_food(&next.body, rng);
        }

        if let Some(dir) = Direction::ORDER
            .into_iter()
            .find(|d| input.is_active(d.action()) && *d != prev.direction.opposite())
        {
            next.pending = dir;
        }

        next.move_timer += 1;
        if next.move_timer < t.move_interval_for(prev.score) {
            return next;
        }
        next.move_timer = 0;

        if next.pending != prev.direction.opposite() {
            next.direction = next.pending;
        }
        let head = next.body[0] + next.direction.delta();
        let eating = next.food == Some(head);
        let body_hit = if eating {
            next.body.contains(&head)
        } else {
            next.body[..next.body.len() - 1].contains(&head)
        };

        if !t.contains(head) || body_hit {
            next.lives = 0;
            next.phase = Phase::GameOver;
            events.push(GameEvent::LifeLost { lives: 0 });
            events.push(GameEvent::GameOver { score: next.score });
            return next;
        }

        next.body.insert(0, head);
        if eating {
            next.score += t.reward;
            events.push(GameEvent::Scored { score: next.score });
            next.food = self.place_food(&next.body, rng);
            if next.food.is_none() {
                // Board full
                next.phase = Phase::GameOver;
                events.push(GameEvent::GameOver { score: next.score });
            }
        } else {
            next.body.pop();
        }
        next
    }

    fn render(&self, state: &SnakeState, seed: &str, surface: &mut dyn Surface) {
        surface.clear(palette::BACKGROUND);
        if let Some(food) = state.food {
            surface.fill_rect(self.tuning.cell_rect(food), palette::FOOD);
        }
        for cell in &state.body {
            surface.fill_rect(self.tuning.cell_rect(*cell), palette::PLAYER);
        }
        overlay::hud(surface, state.score, None);
        overlay::phase_overlay(surface, "Snake", state.phase, state.score, seed);
    }

    /// Greedy walk toward the food, skipping moves into walls or the body
    fn autopilot(&self, state: &SnakeState, input: &mut InputTracker) {
        for dir in Direction::ORDER {
            input.deactivate(dir.action());
        }
        let Some(food) = state.food else { return };
        let head = state.body[0];
        let gap = food - head;

        let mut candidates = Vec::with_capacity(4);
        if gap.y < 0 {
            candidates.push(Direction::Up);
        }
        if gap.y > 0 {
            candidates.push(Direction::Down);
        }
        if gap.x < 0 {
            candidates.push(Direction::Left);
        }
        if gap.x > 0 {
            candidates.push(Direction::Right);
        }
        candidates.extend(Direction::ORDER);

        let safe = candidates.into_iter().find(|d| {
            let cell = head + d.delta();
            *d != state.direction.opposite()
                && self.tuning.contains(cell)
                && !state.body[..state.body.len() - 1].contains(&cell)
        });
        if let Some(dir) = safe {
            input.activate(dir.action());
        }
    }
}
