//! Frame driver
//!
//! Pure scheduling: once per display refresh, tick the engine if it is
//! playing, then paint. The platform owns the actual repeating callback and
//! calls `FrameLoop::frame` from it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::renderer::Surface;
use crate::sim::{Arcade, Phase, ScoreCallback};

/// What a frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Loop is stopped; nothing happened
    Skipped,
    /// Not playing; the frozen state was painted
    Rendered,
    /// One tick ran, then the new state was painted
    Ticked,
}

/// Start/stop state of the frame loop plus a frame counter
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    running: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("frame loop started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("frame loop stopped after {} frames", self.frames);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames processed while running
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame
    pub fn frame(&mut self, arcade: &mut dyn Arcade, surface: &mut dyn Surface) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Skipped;
        }
        self.frames += 1;

        let outcome = if arcade.phase() == Phase::Playing {
            arcade.tick();
            FrameOutcome::Ticked
        } else {
            FrameOutcome::Rendered
        };
        surface.begin_frame();
        arcade.render(surface);
        outcome
    }
}

/// Score changes staged during a frame.
///
/// The engine's callback only records; the host delivers the scores with
/// `drain` once it no longer holds the engine, so a listener may read or
/// tear down the game without re-entering it mid-tick.
#[derive(Debug, Clone, Default)]
pub struct ScoreQueue {
    pending: Rc<RefCell<Vec<u32>>>,
}

impl ScoreQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback to hand to `Arcade::set_score_callback`
    pub fn sink(&self) -> ScoreCallback {
        let pending = self.pending.clone();
        Box::new(move |score| pending.borrow_mut().push(score))
    }

    /// Take every staged score, oldest first
    pub fn drain(&self) -> Vec<u32> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

/// Drive an engine for `frames` frames without a display, painting into
/// `surface` each frame. Used by the native runner.
pub fn run_headless(
    arcade: &mut dyn Arcade,
    surface: &mut dyn Surface,
    frames: u64,
    autopilot: bool,
) -> u64 {
    let mut frame_loop = FrameLoop::new();
    frame_loop.start();
    let mut ticks = 0;
    for _ in 0..frames {
        if autopilot {
            arcade.autopilot();
        }
        if frame_loop.frame(arcade, surface) == FrameOutcome::Ticked {
            ticks += 1;
        }
        if arcade.phase() == Phase::GameOver {
            break;
        }
    }
    frame_loop.stop();
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::Catch;
    use crate::renderer::PaintList;
    use crate::sim::Engine;

    #[test]
    fn test_stopped_loop_does_nothing() {
        let mut engine = Engine::new(Catch::default(), "404");
        engine.confirm();
        let mut surface = PaintList::new(480.0, 360.0);
        let mut frame_loop = FrameLoop::new();

        assert_eq!(frame_loop.frame(&mut engine, &mut surface), FrameOutcome::Skipped);
        assert_eq!(engine.ticks(), 0);
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn test_not_started_renders_only() {
        let mut engine = Engine::new(Catch::default(), "404");
        let mut surface = PaintList::new(480.0, 360.0);
        let mut frame_loop = FrameLoop::new();
        frame_loop.start();

        assert_eq!(frame_loop.frame(&mut engine, &mut surface), FrameOutcome::Rendered);
        assert_eq!(engine.ticks(), 0);
        assert!(surface.has_text("to start"));
    }

    #[test]
    fn test_playing_ticks_then_renders() {
        let mut engine = Engine::new(Catch::default(), "404");
        engine.confirm();
        let mut surface = PaintList::new(480.0, 360.0);
        let mut frame_loop = FrameLoop::new();
        frame_loop.start();

        for _ in 0..5 {
            assert_eq!(frame_loop.frame(&mut engine, &mut surface), FrameOutcome::Ticked);
        }
        assert_eq!(engine.ticks(), 5);
        assert_eq!(frame_loop.frames(), 5);

        frame_loop.stop();
        assert!(!frame_loop.is_running());
        assert_eq!(frame_loop.frame(&mut engine, &mut surface), FrameOutcome::Skipped);
        assert_eq!(engine.ticks(), 5);
    }

    #[test]
    fn test_headless_runs_to_game_over() {
        let mut engine = Engine::new(Catch::default(), "404");
        engine.confirm();
        let mut surface = PaintList::new(480.0, 360.0);
        let ticks = run_headless(&mut engine, &mut surface, 100_000, false);
        assert_eq!(engine.phase(), Phase::GameOver);
        assert_eq!(ticks, engine.ticks());
        assert!(surface.has_text("Game Over"));
    }

    #[test]
    fn test_score_queue_delivers_after_frame() {
        let queue = ScoreQueue::new();
        let engine = Rc::new(RefCell::new(Engine::new(Catch::default(), "404")));
        engine.borrow_mut().set_score_callback(queue.sink());
        engine.borrow_mut().confirm();

        let mut surface = PaintList::new(480.0, 360.0);
        let mut frame_loop = FrameLoop::new();
        frame_loop.start();

        let mut delivered = Vec::new();
        for _ in 0..5_000 {
            {
                let mut e = engine.borrow_mut();
                e.autopilot();
                frame_loop.frame(&mut *e, &mut surface);
            }
            // The engine is free again, so a listener can read it
            for score in queue.drain() {
                assert!(engine.try_borrow().is_ok_and(|e| e.score() >= score));
                delivered.push(score);
            }
        }

        assert!(!delivered.is_empty());
        assert!(queue.is_empty());
        assert_eq!(delivered.last().copied(), Some(engine.borrow().score()));
    }
}
