//! HUD and lifecycle overlays shared by every game

use glam::Vec2;

use super::palette;
use super::surface::{Surface, TextAlign, TextStyle};
use crate::sim::{Phase, Rect};

const HUD_SIZE: f32 = 16.0;
const HUD_MARGIN: f32 = 10.0;
const TITLE_SIZE: f32 = 28.0;
const BODY_SIZE: f32 = 16.0;

/// Score top-left, lives top-right (lives hidden for single-life games)
pub fn hud(surface: &mut dyn Surface, score: u32, lives: Option<u32>) {
    let size = surface.size();
    surface.fill_text(
        &format!("Score: {score}"),
        Vec2::new(HUD_MARGIN, HUD_MARGIN + HUD_SIZE),
        TextStyle::new(HUD_SIZE, palette::HUD_TEXT, TextAlign::Left),
    );
    if let Some(lives) = lives {
        surface.fill_text(
            &format!("Lives: {lives}"),
            Vec2::new(size.x - HUD_MARGIN, HUD_MARGIN + HUD_SIZE),
            TextStyle::new(HUD_SIZE, palette::HUD_TEXT, TextAlign::Right),
        );
    }
}

/// Dim the playfield and print a title with some lines under it
fn panel(surface: &mut dyn Surface, title: &str, lines: &[String]) {
    let size = surface.size();
    surface.fill_rect(Rect::new(0.0, 0.0, size.x, size.y), palette::OVERLAY_SCRIM);

    let center_x = size.x / 2.0;
    let mut y = size.y / 2.0 - (lines.len() as f32 * BODY_SIZE) / 2.0;
    surface.fill_text(
        title,
        Vec2::new(center_x, y),
        TextStyle::new(TITLE_SIZE, palette::OVERLAY_TITLE, TextAlign::Center),
    );
    for line in lines {
        y += BODY_SIZE * 1.6;
        surface.fill_text(
            line,
            Vec2::new(center_x, y),
            TextStyle::new(BODY_SIZE, palette::OVERLAY_TEXT, TextAlign::Center),
        );
    }
}

/// Start or game-over overlay for the phase; nothing while playing
pub fn phase_overlay(surface: &mut dyn Surface, title: &str, phase: Phase, score: u32, seed: &str) {
    match phase {
        Phase::NotStarted => panel(
            surface,
            title,
            &["Press Space or tap to start".to_owned()],
        ),
        Phase::GameOver => panel(
            surface,
            "Game Over",
            &[
                format!("Final score: {score}"),
                format!("Seed: {seed}"),
                "Press Space or tap to restart".to_owned(),
            ],
        ),
        Phase::Playing => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::PaintList;

    #[test]
    fn test_not_started_overlay() {
        let mut list = PaintList::new(400.0, 300.0);
        phase_overlay(&mut list, "Catch", Phase::NotStarted, 0, "404");
        assert!(list.has_text("Catch"));
        assert!(list.has_text("to start"));
    }

    #[test]
    fn test_game_over_overlay_shows_score_and_seed() {
        let mut list = PaintList::new(400.0, 300.0);
        phase_overlay(&mut list, "Catch", Phase::GameOver, 120, "abc");
        assert!(list.has_text("Final score: 120"));
        assert!(list.has_text("Seed: abc"));
    }

    #[test]
    fn test_playing_draws_nothing() {
        let mut list = PaintList::new(400.0, 300.0);
        phase_overlay(&mut list, "Catch", Phase::Playing, 0, "404");
        assert!(list.commands().is_empty());
    }

    #[test]
    fn test_hud_lives_optional() {
        let mut list = PaintList::new(400.0, 300.0);
        hud(&mut list, 30, None);
        assert!(list.has_text("Score: 30"));
        assert!(!list.has_text("Lives"));
        hud(&mut list, 30, Some(2));
        assert!(list.has_text("Lives: 2"));
    }
}
