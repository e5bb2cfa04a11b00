#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Tint Tap.
//!
//! Macroquad is used without its default `audio` feature so the adapter builds
//! without native ALSA development libraries. All `macroquad::ui` calls live in
//! the local `ui` module.

mod ui;

use self::ui::{draw_hud_panel, HudPanelContext, HudPanelResult};
use anyhow::Result;
use glam::Vec2;
use macroquad::{
    color::WHITE,
    input::{
        is_key_down, is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton,
    },
    math::Vec2 as MacroquadVec2,
};
use std::time::Duration;
use tint_tap_core::GimmickKind;
use tint_tap_rendering::{DevAction, FrameInput, Presentation, RenderingBackend, Scene};

/// Height of the HUD strip above the grid, in screen pixels.
const HUD_HEIGHT: f32 = 168.0;
/// Empty border kept around the grid, in screen pixels.
const SCREEN_MARGIN: f32 = 24.0;
/// Outline thickness of selected tiles, in screen pixels.
const SELECTION_OUTLINE: f32 = 4.0;

/// Tracks HUD-sourced interactions so they can be merged with physical input on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct HudInputState {
    commit_latched: bool,
    restart_latched: bool,
}

impl HudInputState {
    /// Returns whether the HUD requested a commit and clears the latch so the
    /// action fires only once.
    pub fn take_commit(&mut self) -> bool {
        let latched = self.commit_latched;
        self.commit_latched = false;
        latched
    }

    /// Records that the submit button was pressed this frame.
    pub fn register_commit(&mut self) {
        self.commit_latched = true;
    }

    /// Returns whether the HUD requested a new game and clears the latch.
    pub fn take_restart(&mut self) -> bool {
        let latched = self.restart_latched;
        self.restart_latched = false;
        latched
    }

    /// Records that the new-game button was pressed this frame.
    pub fn register_restart(&mut self) {
        self.restart_latched = true;
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the game loop.
    quit_requested: bool,
    /// `Enter` or `Space` submits the selection.
    commit: bool,
    /// `R` starts a new game.
    restart: bool,
    /// Level and gimmick shortcuts, only polled with dev keys enabled.
    dev: Option<DevAction>,
}

impl KeyboardShortcuts {
    fn poll(dev_keys: bool) -> Self {
        let quit_requested = is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q);
        let commit = is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::Space);
        let restart = is_key_pressed(KeyCode::R);
        let dev = if dev_keys { poll_dev_action() } else { None };

        Self {
            quit_requested,
            commit,
            restart,
            dev,
        }
    }
}

const GIMMICK_KEYS: [KeyCode; 4] = [KeyCode::Key1, KeyCode::Key2, KeyCode::Key3, KeyCode::Key4];

fn poll_dev_action() -> Option<DevAction> {
    if is_key_pressed(KeyCode::LeftBracket) {
        return Some(DevAction::PreviousLevel);
    }
    if is_key_pressed(KeyCode::RightBracket) {
        return Some(DevAction::NextLevel);
    }

    let shift = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);
    GIMMICK_KEYS
        .into_iter()
        .zip(GimmickKind::ALL)
        .find(|(key, _)| is_key_pressed(*key))
        .map(|(_, kind)| gimmick_action(kind, shift))
}

fn gimmick_action(kind: GimmickKind, execute: bool) -> DevAction {
    if execute {
        DevAction::ExecuteGimmick(kind)
    } else {
        DevAction::ToggleGimmick(kind)
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    dev_keys: bool,
}

impl MacroquadBackend {
    /// Returns a backend with developer shortcuts disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures whether level and gimmick shortcuts are forwarded.
    #[must_use]
    pub fn with_dev_keys(mut self, enabled: bool) -> Self {
        self.dev_keys = enabled;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self { dev_keys } = self;
        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let config = macroquad::window::Conf {
            window_title,
            window_width: 720,
            window_height: 900,
            ..macroquad::window::Conf::default()
        };

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let panel_background = to_macroquad_color(clear_color.lighten(0.12));
            let mut hud_input = HudInputState::default();

            loop {
                let keyboard = KeyboardShortcuts::poll(dev_keys);
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let metrics_before = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                let frame_input = gather_frame_input(&metrics_before, keyboard, &mut hud_input);

                update_scene(frame_dt, frame_input, &mut scene);

                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                draw_tiles(&scene, &metrics);

                let HudPanelResult { commit, restart } = {
                    let mut hud_ui = macroquad::ui::root_ui();
                    draw_hud_panel(
                        &mut hud_ui,
                        HudPanelContext {
                            origin: MacroquadVec2::new(0.0, 0.0),
                            size: MacroquadVec2::new(screen_width, HUD_HEIGHT),
                            background: panel_background,
                            hud: &scene.hud,
                        },
                    )
                };
                if commit {
                    hud_input.register_commit();
                }
                if restart {
                    hud_input.register_restart();
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Maps presented grid space onto the screen area below the HUD.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    origin: Vec2,
    bounds_min: Vec2,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let (bounds_min, bounds_max) = scene.bounds();
        let size = bounds_max - bounds_min;
        let available = Vec2::new(
            screen_width - 2.0 * SCREEN_MARGIN,
            screen_height - HUD_HEIGHT - 2.0 * SCREEN_MARGIN,
        )
        .max(Vec2::ZERO);
        let scale = if size.x <= f32::EPSILON || size.y <= f32::EPSILON {
            1.0
        } else {
            (available.x / size.x).min(available.y / size.y)
        };

        let scaled = size * scale;
        let origin = Vec2::new(
            (screen_width - scaled.x) * 0.5,
            HUD_HEIGHT + (screen_height - HUD_HEIGHT - scaled.y) * 0.5,
        );

        Self {
            scale,
            origin,
            bounds_min,
        }
    }

    fn to_screen(&self, point: Vec2) -> Vec2 {
        self.origin + (point - self.bounds_min) * self.scale
    }

    fn to_grid(&self, screen: Vec2) -> Option<Vec2> {
        if self.scale <= f32::EPSILON {
            return None;
        }
        Some((screen - self.origin) / self.scale + self.bounds_min)
    }
}

fn gather_frame_input(
    metrics: &SceneMetrics,
    keyboard: KeyboardShortcuts,
    hud_input: &mut HudInputState,
) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    let clicked = is_mouse_button_pressed(MouseButton::Left);
    gather_frame_input_from_observations(
        metrics,
        Vec2::new(cursor_x, cursor_y),
        clicked,
        keyboard,
        hud_input.take_commit(),
        hud_input.take_restart(),
    )
}

fn gather_frame_input_from_observations(
    metrics: &SceneMetrics,
    cursor_position: Vec2,
    clicked: bool,
    keyboard: KeyboardShortcuts,
    ui_commit: bool,
    ui_restart: bool,
) -> FrameInput {
    let tap = if clicked && cursor_position.y >= HUD_HEIGHT {
        metrics.to_grid(cursor_position)
    } else {
        None
    };

    FrameInput {
        tap,
        commit: keyboard.commit || ui_commit,
        restart: keyboard.restart || ui_restart,
        dev: keyboard.dev,
    }
}

fn draw_tiles(scene: &Scene, metrics: &SceneMetrics) {
    let side = scene.tile_grid.tile_length * metrics.scale;
    for (slot, tile) in scene.tiles.iter().enumerate() {
        if !tile.visible {
            continue;
        }
        let Some(center) = scene.tile_center(slot) else {
            continue;
        };
        let corner = metrics.to_screen(center) - Vec2::splat(side * 0.5);
        macroquad::shapes::draw_rectangle(
            corner.x,
            corner.y,
            side,
            side,
            to_macroquad_color(tile.color),
        );
        if tile.selected {
            macroquad::shapes::draw_rectangle_lines(
                corner.x,
                corner.y,
                side,
                side,
                SELECTION_OUTLINE,
                WHITE,
            );
        }
    }
}

fn to_macroquad_color(color: tint_tap_rendering::Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_tap_core::{CellIndex, GridDimensions, GridTransform, Level};
    use tint_tap_rendering::{Color, GameStatus, Hud, SceneTile, TileGridPresentation};

    fn scene(transform: GridTransform) -> Scene {
        let dimensions = GridDimensions::new(3, 3);
        let tile_grid = TileGridPresentation::new(dimensions, 10.0, 0.0).expect("valid grid");
        let tiles = (0..dimensions.tile_count())
            .map(|index| SceneTile {
                cell: CellIndex::new(index),
                color: Color::from_rgb_u8(0, 0, 0),
                visible: true,
                selected: false,
            })
            .collect();
        let hud = Hud {
            banner: "",
            status: GameStatus::Playing,
            level: Level::FIRST,
            max_level: Level::new(100),
            score: 0,
            best_score: 0,
            lives: 3,
            remaining: Duration::ZERO,
            active_gimmicks: Vec::new(),
            boss_visible: false,
            boss_cue: None,
        };
        Scene::new(tile_grid, tiles, transform, hud)
    }

    #[test]
    fn scene_metrics_center_the_grid_below_the_hud() {
        let scene = scene(GridTransform::IDENTITY);
        let metrics = SceneMetrics::from_scene(&scene, 400.0, 600.0);

        let top_left = metrics.to_screen(Vec2::ZERO);
        let bottom_right = metrics.to_screen(Vec2::splat(30.0));
        assert!(top_left.y >= HUD_HEIGHT);
        assert!((top_left.x - (400.0 - bottom_right.x)).abs() < 1e-3);
        assert!((bottom_right.x - top_left.x - (400.0 - 2.0 * SCREEN_MARGIN)).abs() < 1e-3);
    }

    #[test]
    fn clicks_map_back_to_the_tile_under_the_cursor() {
        let scene = scene(GridTransform::new(90, None));
        let metrics = SceneMetrics::from_scene(&scene, 400.0, 600.0);
        let screen = metrics.to_screen(scene.tile_center(0).expect("slot exists"));

        let input = gather_frame_input_from_observations(
            &metrics,
            screen,
            true,
            KeyboardShortcuts::default(),
            false,
            false,
        );

        let tap = input.tap.expect("click inside the grid area");
        assert_eq!(scene.cell_at(tap), Some(CellIndex::new(0)));
    }

    #[test]
    fn clicks_on_the_hud_strip_are_not_taps() {
        let scene = scene(GridTransform::IDENTITY);
        let metrics = SceneMetrics::from_scene(&scene, 400.0, 600.0);

        let input = gather_frame_input_from_observations(
            &metrics,
            Vec2::new(200.0, HUD_HEIGHT * 0.5),
            true,
            KeyboardShortcuts::default(),
            true,
            false,
        );

        assert_eq!(input.tap, None);
        assert!(input.commit);
        assert!(!input.restart);
    }

    #[test]
    fn shift_turns_gimmick_keys_into_executions() {
        assert_eq!(
            gimmick_action(GimmickKind::Mirror, true),
            DevAction::ExecuteGimmick(GimmickKind::Mirror)
        );
        assert_eq!(
            gimmick_action(GimmickKind::Hide, false),
            DevAction::ToggleGimmick(GimmickKind::Hide)
        );
    }
}
