#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Tint Tap adapters.

use anyhow::Result as AnyResult;
use glam::{Affine2, Vec2};
use std::{error::Error, f32::consts::PI, fmt, time::Duration};
use tint_tap_core::{
    BossCue, CellIndex, FlipAxis, GimmickKind, GridDimensions, GridTransform, Level, Rgb,
};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a different opacity.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Self::from_rgb_u8(rgb.red(), rgb.green(), rgb.blue())
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Developer shortcuts forwarded by adapters running in dev mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DevAction {
    /// Jump one level back.
    PreviousLevel,
    /// Jump one level forward.
    NextLevel,
    /// Activate the gimmick when idle, deactivate it when active.
    ToggleGimmick(GimmickKind),
    /// Run one execution of the gimmick immediately.
    ExecuteGimmick(GimmickKind),
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Tap position in grid-local units, when the player clicked this frame.
    pub tap: Option<Vec2>,
    /// Whether the player asked to submit the current selection.
    pub commit: bool,
    /// Whether the player asked for a new game.
    pub restart: bool,
    /// Developer shortcut pressed this frame.
    pub dev: Option<DevAction>,
}

/// Untransformed layout of the tile grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Columns and rows of the grid.
    pub dimensions: GridDimensions,
    /// Side length of a single tile expressed in grid-local units.
    pub tile_length: f32,
    /// Space between neighbouring tiles.
    pub gap: f32,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when the tile length is not positive or the gap is negative.
    pub fn new(
        dimensions: GridDimensions,
        tile_length: f32,
        gap: f32,
    ) -> std::result::Result<Self, RenderingError> {
        if !(tile_length.is_finite() && tile_length > 0.0) {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }
        if !(gap.is_finite() && gap >= 0.0) {
            return Err(RenderingError::InvalidGap { gap });
        }

        Ok(Self {
            dimensions,
            tile_length,
            gap,
        })
    }

    /// Distance between the origins of neighbouring tiles.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.tile_length + self.gap
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub fn width(&self) -> f32 {
        span(self.dimensions.columns(), self.tile_length, self.gap)
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub fn height(&self) -> f32 {
        span(self.dimensions.rows(), self.tile_length, self.gap)
    }

    /// Center of the untransformed grid.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width(), self.height()) * 0.5
    }

    /// Center of a slot before the grid transform is applied.
    #[must_use]
    pub fn slot_center(&self, slot: usize) -> Vec2 {
        let (column, row) = self.dimensions.position_of(slot);
        let half = self.tile_length * 0.5;
        Vec2::new(
            column as f32 * self.pitch() + half,
            row as f32 * self.pitch() + half,
        )
    }

    /// Slot covering an untransformed point. Gaps between tiles hit nothing.
    #[must_use]
    pub fn slot_at(&self, point: Vec2) -> Option<usize> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let pitch = self.pitch();
        let column = (point.x / pitch).floor();
        let row = (point.y / pitch).floor();
        if point.x - column * pitch > self.tile_length || point.y - row * pitch > self.tile_length {
            return None;
        }
        let (column, row) = (column as u32, row as u32);
        if column >= self.dimensions.columns() || row >= self.dimensions.rows() {
            return None;
        }
        Some(self.dimensions.slot_of(column, row))
    }
}

fn span(count: u32, tile_length: f32, gap: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    count as f32 * tile_length + (count - 1) as f32 * gap
}

/// Single tile drawn at a presentation slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneTile {
    /// Stable cell the tile represents.
    pub cell: CellIndex,
    /// Fill color.
    pub color: Color,
    /// Whether the tile is painted. Hidden tiles still accept taps.
    pub visible: bool,
    /// Whether the player has marked the tile.
    pub selected: bool,
}

/// Coarse game state shown by the HUD.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    /// No game has started yet.
    Ready,
    /// A level is being played.
    Playing,
    /// Every level was solved.
    Won,
    /// The player ran out of lives.
    Lost,
}

/// Heads-up display content.
#[derive(Clone, Debug, PartialEq)]
pub struct Hud {
    /// Banner shown before the first game.
    pub banner: &'static str,
    /// Current game state.
    pub status: GameStatus,
    /// Level being played.
    pub level: Level,
    /// Final level of the game.
    pub max_level: Level,
    /// Running score.
    pub score: u64,
    /// Highest known score.
    pub best_score: u64,
    /// Remaining lives.
    pub lives: u32,
    /// Time left on the bonus clock.
    pub remaining: Duration,
    /// Gimmicks perturbing the grid, oldest first.
    pub active_gimmicks: Vec<GimmickKind>,
    /// Whether the boss character is on screen.
    pub boss_visible: bool,
    /// Animation of the most recent gimmick execution.
    pub boss_cue: Option<BossCue>,
}

impl Hud {
    /// Remaining bonus time in whole seconds, rounded up.
    #[must_use]
    pub fn remaining_seconds(&self) -> u64 {
        let millis = self.remaining.as_millis();
        ((millis + 999) / 1_000) as u64
    }
}

/// Scene description combining the tile grid, its transform and the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Layout of the grid before the transform.
    pub tile_grid: TileGridPresentation,
    /// Tiles in presentation order; index `i` is drawn at slot `i`.
    pub tiles: Vec<SceneTile>,
    /// Rotation and flip applied to the whole grid.
    pub transform: GridTransform,
    /// Heads-up display content.
    pub hud: Hud,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        tile_grid: TileGridPresentation,
        tiles: Vec<SceneTile>,
        transform: GridTransform,
        hud: Hud,
    ) -> Self {
        Self {
            tile_grid,
            tiles,
            transform,
            hud,
        }
    }

    /// Affine map from untransformed grid space to presented grid space.
    ///
    /// The flip is applied first, then the rotation, both around the grid center.
    #[must_use]
    pub fn grid_affine(&self) -> Affine2 {
        let center = self.tile_grid.center();
        let flip = match self.transform.flip() {
            Some(FlipAxis::Horizontal) => Vec2::new(-1.0, 1.0),
            Some(FlipAxis::Vertical) => Vec2::new(1.0, -1.0),
            None => Vec2::ONE,
        };
        let angle = f32::from(self.transform.rotation_degrees()) * PI / 180.0;

        Affine2::from_translation(center)
            * Affine2::from_angle(angle)
            * Affine2::from_scale(flip)
            * Affine2::from_translation(-center)
    }

    /// Presented center of a slot.
    #[must_use]
    pub fn tile_center(&self, slot: usize) -> Option<Vec2> {
        if slot >= self.tiles.len() {
            return None;
        }
        Some(
            self.grid_affine()
                .transform_point2(self.tile_grid.slot_center(slot)),
        )
    }

    /// Slot drawn under a presented point.
    #[must_use]
    pub fn slot_at(&self, point: Vec2) -> Option<usize> {
        let local = self.grid_affine().inverse().transform_point2(point);
        self.tile_grid
            .slot_at(local)
            .filter(|slot| *slot < self.tiles.len())
    }

    /// Stable cell drawn under a presented point.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> Option<CellIndex> {
        self.slot_at(point).map(|slot| self.tiles[slot].cell)
    }

    /// Axis-aligned bounds of the presented grid as `(min, max)`.
    #[must_use]
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let affine = self.grid_affine();
        let size = Vec2::new(self.tile_grid.width(), self.tile_grid.height());
        let corners = [
            Vec2::ZERO,
            Vec2::new(size.x, 0.0),
            Vec2::new(0.0, size.y),
            size,
        ]
        .map(|corner| affine.transform_point2(corner));

        corners.iter().skip(1).fold(
            (corners[0], corners[0]),
            |(min, max), corner| (min.min(*corner), max.max(*corner)),
        )
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Tint Tap scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and refreshes the scene before it is
    /// drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive, finite side length.
    InvalidTileLength {
        /// Provided length that failed validation.
        tile_length: f32,
    },
    /// Gaps must be finite and not negative.
    InvalidGap {
        /// Provided gap that failed validation.
        gap: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileLength { tile_length } => {
                write!(f, "tile_length must be positive (received {tile_length})")
            }
            Self::InvalidGap { gap } => {
                write!(f, "gap must not be negative (received {gap})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(columns: u32, rows: u32, transform: GridTransform) -> Scene {
        let dimensions = GridDimensions::new(columns, rows);
        let tile_grid = TileGridPresentation::new(dimensions, 10.0, 0.0).expect("valid grid");
        let tiles = (0..dimensions.tile_count())
            .map(|index| SceneTile {
                cell: CellIndex::new(index),
                color: Color::from_rgb_u8(10, 20, 30),
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
            remaining: Duration::from_millis(9_100),
            active_gimmicks: Vec::new(),
            boss_visible: false,
            boss_cue: None,
        };
        Scene::new(tile_grid, tiles, transform, hud)
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn tile_grid_rejects_degenerate_lengths() {
        let dimensions = GridDimensions::new(3, 3);
        assert!(matches!(
            TileGridPresentation::new(dimensions, 0.0, 1.0),
            Err(RenderingError::InvalidTileLength { .. })
        ));
        assert!(matches!(
            TileGridPresentation::new(dimensions, 8.0, -1.0),
            Err(RenderingError::InvalidGap { .. })
        ));
    }

    #[test]
    fn gaps_between_tiles_hit_nothing() {
        let grid = TileGridPresentation::new(GridDimensions::new(2, 2), 10.0, 2.0)
            .expect("valid grid");

        assert_eq!(grid.width(), 22.0);
        assert_eq!(grid.slot_at(Vec2::new(5.0, 5.0)), Some(0));
        assert_eq!(grid.slot_at(Vec2::new(11.0, 5.0)), None);
        assert_eq!(grid.slot_at(Vec2::new(13.0, 15.0)), Some(3));
        assert_eq!(grid.slot_at(Vec2::new(23.0, 5.0)), None);
    }

    #[test]
    fn quarter_turn_moves_the_first_slot_to_the_top_right() {
        let scene = scene(3, 3, GridTransform::new(90, None));

        let center = scene.tile_center(0).expect("slot exists");
        assert!(close(center, Vec2::new(25.0, 5.0)), "{center:?}");
        assert_eq!(scene.cell_at(Vec2::new(25.0, 5.0)), Some(CellIndex::new(0)));
        assert_eq!(scene.cell_at(Vec2::new(5.0, 5.0)), Some(CellIndex::new(6)));
    }

    #[test]
    fn horizontal_flip_mirrors_columns() {
        let scene = scene(3, 3, GridTransform::new(0, Some(FlipAxis::Horizontal)));

        assert_eq!(scene.cell_at(Vec2::new(5.0, 5.0)), Some(CellIndex::new(2)));
        assert_eq!(scene.cell_at(Vec2::new(15.0, 25.0)), Some(CellIndex::new(7)));
    }

    #[test]
    fn hit_testing_follows_tiles_under_every_transform() {
        for degrees in [0, 90, 180, 270] {
            for flip in [None, Some(FlipAxis::Horizontal), Some(FlipAxis::Vertical)] {
                let scene = scene(4, 2, GridTransform::new(degrees, flip));
                for slot in 0..scene.tiles.len() {
                    let center = scene.tile_center(slot).expect("slot exists");
                    assert_eq!(scene.slot_at(center), Some(slot), "{degrees} {flip:?}");
                }
            }
        }
    }

    #[test]
    fn bounds_swap_under_a_quarter_turn() {
        let scene = scene(4, 2, GridTransform::new(270, None));
        let (min, max) = scene.bounds();

        assert!(close(max - min, Vec2::new(20.0, 40.0)), "{min:?} {max:?}");
        assert!(close((min + max) * 0.5, Vec2::new(20.0, 10.0)));
    }

    #[test]
    fn remaining_seconds_round_up() {
        assert_eq!(scene(1, 1, GridTransform::IDENTITY).hud.remaining_seconds(), 10);
    }
}
