//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};
use tint_tap_core::BossCue;
use tint_tap_rendering::{GameStatus, Hud};

/// Buttons pressed on the HUD during the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct HudPanelResult {
    /// Whether the submit button was pressed.
    pub(crate) commit: bool,
    /// Whether the new-game button was pressed.
    pub(crate) restart: bool,
}

/// Layout and data for the HUD panel.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HudPanelContext<'a> {
    /// Top-left corner of the panel in screen coordinates.
    pub(crate) origin: Vec2,
    /// Panel dimensions in screen space.
    pub(crate) size: Vec2,
    /// Background colour of the panel window.
    pub(crate) background: Color,
    /// Values to display.
    pub(crate) hud: &'a Hud,
}

/// Renders the HUD labels and buttons for the current frame.
pub(crate) fn draw_hud_panel(ui: &mut Ui, context: HudPanelContext<'_>) -> HudPanelResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 12.0, 12.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 2.0, 2.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(70, 70, 70, 255))
        .color_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_clicked(Color::from_rgba(56, 56, 56, 255))
        .margin(RectOffset::new(8.0, 8.0, 4.0, 4.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let hud = context.hud;
    let mut result = HudPanelResult::default();
    let _ = ui.window(hash!("hud_panel"), context.origin, context.size, |ui| {
        for line in status_lines(hud) {
            ui.label(None, line.as_str());
        }

        if hud.status == GameStatus::Playing {
            result.commit = ui.button(None, "Submit");
            ui.same_line(0.0);
        }
        result.restart = ui.button(None, "New game");
    });

    ui.pop_skin();

    result
}

fn status_lines(hud: &Hud) -> Vec<String> {
    match hud.status {
        GameStatus::Ready => vec![
            hud.banner.to_string(),
            format!("Best score: {}", hud.best_score),
            "Press R or New game to begin.".to_string(),
        ],
        GameStatus::Playing => {
            let mut lines = vec![
                format!("Level {} / {}", hud.level, hud.max_level),
                format!(
                    "Score {}   Best {}   Lives {}",
                    hud.score, hud.best_score, hud.lives
                ),
                format!("Bonus time {}s", hud.remaining_seconds()),
            ];
            if !hud.active_gimmicks.is_empty() {
                let names: Vec<&str> = hud.active_gimmicks.iter().map(|kind| kind.name()).collect();
                lines.push(format!("Gimmicks: {}", names.join(", ")));
            }
            if hud.boss_visible {
                lines.push(format!("Boss: {}", boss_pose(hud.boss_cue)));
            }
            lines
        }
        GameStatus::Won => vec![
            format!("Every level cleared! Final score {}", hud.score),
            format!("Best score: {}", hud.best_score),
        ],
        GameStatus::Lost => vec![
            format!("Out of lives on level {}. Final score {}", hud.level, hud.score),
            format!("Best score: {}", hud.best_score),
        ],
    }
}

fn boss_pose(cue: Option<BossCue>) -> &'static str {
    match cue {
        Some(BossCue::Wave) => "waving",
        Some(BossCue::Point) => "pointing",
        Some(BossCue::Rotate) => "spinning",
        Some(BossCue::Bounce) => "bouncing",
        None => "watching",
    }
}
