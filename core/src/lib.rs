#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tint Tap engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Gimmicks perturb the presented grid through the
//! [`GridView`] trait and keep their timers in a cancelable [`Scheduler`].

use std::{collections::BTreeSet, fmt, time::Duration};

use serde::{Deserialize, Serialize};

mod clock;
mod config;
mod grid;
mod range;
mod scheduler;

pub use clock::{Clock, ManualClock};
pub use config::{
    BossConfig, ColorConfig, ConfigError, DeltaStep, DifficultyConfig, GameConfig,
    GimmickConfig, GimmickEngineConfig, GimmickRange, GridStep, OddTileStep, OneOrMany,
    ScoringConfig, TimeBonusConfig, TimingConfig, FALLBACK_GRID, FALLBACK_ODD_COUNT,
};
pub use grid::{GridView, GridViewError, PresentedGrid};
pub use range::{find_for_level, LevelRange, RangeError, Ranged};
pub use scheduler::{Scheduler, TaskHandle};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tint Tap.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Resets the session to level one with a full set of lives.
    StartGame,
    /// Installs a freshly generated level as the current puzzle.
    InstallLevel {
        /// Descriptor produced by the level generator.
        descriptor: LevelDescriptor,
    },
    /// Flips the selection state of a single tile.
    ToggleTile {
        /// Stable index of the tile the player clicked.
        cell: CellIndex,
    },
    /// Submits the current selection as the player's answer.
    CommitSelection,
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of wall time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Developer shortcut that abandons the current level and requests another.
    JumpToLevel {
        /// Level the session should load next.
        level: Level,
    },
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a new game began.
    GameStarted {
        /// Lives granted to the player for the new game.
        lives: u32,
    },
    /// Requests that a level be generated and installed.
    LevelRequested {
        /// Level that should be generated.
        level: Level,
    },
    /// Confirms that a level was installed and is now playable.
    LevelLoaded {
        /// Level that became current.
        level: Level,
        /// Grid layout of the installed level.
        dimensions: GridDimensions,
        /// Number of odd tiles hidden in the grid.
        odd_count: u32,
    },
    /// Reports that the player toggled a tile.
    TileSelectionChanged {
        /// Tile whose selection state changed.
        cell: CellIndex,
        /// Whether the tile is selected after the toggle.
        selected: bool,
    },
    /// Reports a commit attempt without any selected tiles.
    SelectionEmpty,
    /// Confirms that the committed selection matched the odd tiles exactly.
    AnswerCorrect {
        /// Level that was solved.
        level: Level,
        /// Score awarded for the level.
        breakdown: ScoreBreakdown,
        /// Session score after the award.
        score: u64,
    },
    /// Confirms that the committed selection did not match the odd tiles.
    AnswerWrong {
        /// Level that was failed.
        level: Level,
        /// Session score after the penalty.
        score: u64,
    },
    /// Reports that the player lost a life.
    LifeLost {
        /// Lives that remain after the loss.
        lives_remaining: u32,
    },
    /// Announces that the player solved the final level.
    GameWon {
        /// Final session score.
        score: u64,
    },
    /// Announces that the player ran out of lives.
    GameLost {
        /// Final session score.
        score: u64,
        /// Level the player was playing when the last life was lost.
        level: Level,
    },
    /// Reports that the session score surpassed the previous best.
    BestScoreRaised {
        /// New best score.
        best: u64,
    },
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
        /// Session time after the tick.
        now: Duration,
    },
    /// Periodic countdown report for the current level's bonus clock.
    CountdownTicked {
        /// Bonus time left for the current level.
        remaining: Duration,
    },
    /// Reports that the bonus clock of the current level ran out.
    CountdownExpired {
        /// Level whose bonus clock expired.
        level: Level,
    },
    /// Confirms that a gimmick became active.
    GimmickActivated {
        /// Gimmick that activated.
        kind: GimmickKind,
        /// Level that was current when the gimmick activated.
        level: Level,
    },
    /// Reports a single gimmick tick that touched the grid.
    GimmickExecuted {
        /// Gimmick that executed.
        kind: GimmickKind,
        /// Boss animation accompanying the execution.
        cue: BossCue,
    },
    /// Confirms that a gimmick was deactivated and its grid changes reverted.
    GimmickDeactivated {
        /// Gimmick that deactivated.
        kind: GimmickKind,
    },
    /// Reports that the boss character appeared or disappeared.
    BossVisibilityChanged {
        /// Whether the boss is visible after the change.
        visible: bool,
    },
    /// Reports that the presentation order of the grid changed.
    GridOrderChanged,
    /// Reports the full set of tiles that are currently hidden.
    TileVisibilityChanged {
        /// Tiles that are invisible after the change.
        hidden: Vec<CellIndex>,
    },
    /// Reports that the rotation or flip applied to the grid changed.
    GridTransformChanged {
        /// Transform applied to the grid after the change.
        transform: GridTransform,
    },
}

/// One-based level number.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Level(u32);

impl Level {
    /// First level of every game.
    pub const FIRST: Self = Self(1);

    /// Creates a level, lifting zero to the first level.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        if value == 0 {
            Self::FIRST
        } else {
            Self(value)
        }
    }

    /// Retrieves the numeric level.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Level that follows this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Level that precedes this one, never below the first level.
    #[must_use]
    pub const fn previous(&self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable row-major index of a tile assigned when its level is generated.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CellIndex(u32);

impl CellIndex {
    /// Creates a new cell index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Column and row counts of a tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    columns: u32,
    rows: u32,
}

impl GridDimensions {
    /// Creates grid dimensions, lifting zero extents to one.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns: if columns == 0 { 1 } else { columns },
            rows: if rows == 0 { 1 } else { rows },
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of tiles in the grid.
    #[must_use]
    pub const fn tile_count(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }

    /// Column and row of the provided row-major slot.
    #[must_use]
    pub const fn position_of(&self, slot: usize) -> (u32, u32) {
        let slot = slot as u32;
        (slot % self.columns, slot / self.columns)
    }

    /// Row-major slot of the provided column and row.
    #[must_use]
    pub const fn slot_of(&self, column: u32, row: u32) -> usize {
        (row * self.columns + column) as usize
    }
}

/// Eight-bit red, green and blue channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    /// Creates a color from its three channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red channel.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green channel.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue channel.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Reads the provided channel.
    #[must_use]
    pub const fn channel(&self, channel: ColorChannel) -> u8 {
        match channel {
            ColorChannel::Red => self.red,
            ColorChannel::Green => self.green,
            ColorChannel::Blue => self.blue,
        }
    }

    /// Copy of this color with a single channel replaced.
    #[must_use]
    pub const fn with_channel(self, channel: ColorChannel, value: u8) -> Self {
        match channel {
            ColorChannel::Red => Self { red: value, ..self },
            ColorChannel::Green => Self {
                green: value,
                ..self
            },
            ColorChannel::Blue => Self {
                blue: value,
                ..self
            },
        }
    }
}

/// Individual channel of an [`Rgb`] color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorChannel {
    /// Red channel.
    #[serde(rename = "r")]
    Red,
    /// Green channel.
    #[serde(rename = "g")]
    Green,
    /// Blue channel.
    #[serde(rename = "b")]
    Blue,
}

impl ColorChannel {
    /// Every channel in red, green, blue order.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];
}

/// Complete description of a generated level.
///
/// Descriptors are created fresh on every level load and never mutated once
/// installed. Tile colors are derived from the odd set so the two can never
/// disagree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    level: Level,
    dimensions: GridDimensions,
    base_color: Rgb,
    odd_color: Rgb,
    odd_cells: BTreeSet<CellIndex>,
    delta: u32,
}

impl LevelDescriptor {
    /// Assembles a descriptor from generated parts.
    #[must_use]
    pub fn new(
        level: Level,
        dimensions: GridDimensions,
        base_color: Rgb,
        odd_color: Rgb,
        odd_cells: BTreeSet<CellIndex>,
        delta: u32,
    ) -> Self {
        Self {
            level,
            dimensions,
            base_color,
            odd_color,
            odd_cells,
            delta,
        }
    }

    /// Level the descriptor was generated for.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Grid layout of the level.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Color shared by every regular tile.
    #[must_use]
    pub const fn base_color(&self) -> Rgb {
        self.base_color
    }

    /// Color shared by every odd tile.
    #[must_use]
    pub const fn odd_color(&self) -> Rgb {
        self.odd_color
    }

    /// Indices of the odd tiles.
    #[must_use]
    pub fn odd_cells(&self) -> &BTreeSet<CellIndex> {
        &self.odd_cells
    }

    /// Channel delta the odd color was derived with.
    #[must_use]
    pub const fn delta(&self) -> u32 {
        self.delta
    }

    /// Reports whether the provided cell is an odd tile.
    #[must_use]
    pub fn is_odd(&self, cell: CellIndex) -> bool {
        self.odd_cells.contains(&cell)
    }

    /// Color of the provided cell, or `None` outside the grid.
    #[must_use]
    pub fn color_of(&self, cell: CellIndex) -> Option<Rgb> {
        if cell.get() >= self.dimensions.tile_count() {
            return None;
        }
        if self.is_odd(cell) {
            Some(self.odd_color)
        } else {
            Some(self.base_color)
        }
    }

    /// Every cell of the grid in index order.
    pub fn cells(&self) -> impl Iterator<Item = CellIndex> {
        (0..self.dimensions.tile_count()).map(CellIndex::new)
    }

    /// Tile colors in index order.
    #[must_use]
    pub fn tile_colors(&self) -> Vec<Rgb> {
        self.cells()
            .map(|cell| {
                if self.is_odd(cell) {
                    self.odd_color
                } else {
                    self.base_color
                }
            })
            .collect()
    }
}

/// Score awarded for solving a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Flat award that grows with the level number.
    pub base_score: u64,
    /// Award for the number of odd tiles in the level.
    pub odd_bonus: u64,
    /// Award for bonus time left on the clock.
    pub time_bonus: u64,
    /// Sum of every component.
    pub total_score: u64,
}

/// Enumerates the gimmicks that may perturb the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GimmickKind {
    /// Permutes the presentation order of tiles.
    Shuffle,
    /// Makes a random subset of tiles transparent.
    Hide,
    /// Rotates the whole grid.
    Rotation,
    /// Flips the whole grid along an axis for a short while.
    Mirror,
}

impl GimmickKind {
    /// Every gimmick in registry order.
    pub const ALL: [Self; 4] = [Self::Shuffle, Self::Hide, Self::Rotation, Self::Mirror];

    /// Registry name used in configuration files.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Shuffle => "shuffle",
            Self::Hide => "hide",
            Self::Rotation => "rotation",
            Self::Mirror => "mirror",
        }
    }

    /// Resolves a registry name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Boss animation that accompanies every execution of the gimmick.
    #[must_use]
    pub const fn cue(&self) -> BossCue {
        match self {
            Self::Shuffle => BossCue::Wave,
            Self::Hide => BossCue::Point,
            Self::Rotation => BossCue::Rotate,
            Self::Mirror => BossCue::Bounce,
        }
    }
}

impl fmt::Display for GimmickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Animation the boss character plays alongside a gimmick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BossCue {
    /// Waves while tiles are shuffled.
    Wave,
    /// Points at the grid while tiles are hidden.
    Point,
    /// Spins while the grid rotates.
    Rotate,
    /// Bounces while the grid is mirrored.
    Bounce,
}

/// Controls how aggressively the shuffle gimmick permutes tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleIntensity {
    /// Shuffles a single row.
    Easy,
    /// Shuffles an adjacent pair of rows or columns.
    #[default]
    Medium,
    /// Shuffles every tile.
    Hard,
}

/// Axis along which the mirror gimmick flips the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipAxis {
    /// Mirrors columns left to right.
    Horizontal,
    /// Mirrors rows top to bottom.
    Vertical,
}

/// Rotation and flip applied to the presented grid as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridTransform {
    rotation_degrees: u16,
    flip: Option<FlipAxis>,
}

impl GridTransform {
    /// Transform that leaves the grid untouched.
    pub const IDENTITY: Self = Self {
        rotation_degrees: 0,
        flip: None,
    };

    /// Creates a transform, normalizing the rotation into `[0, 360)`.
    #[must_use]
    pub const fn new(rotation_degrees: u16, flip: Option<FlipAxis>) -> Self {
        Self {
            rotation_degrees: rotation_degrees % 360,
            flip,
        }
    }

    /// Clockwise rotation in degrees.
    #[must_use]
    pub const fn rotation_degrees(&self) -> u16 {
        self.rotation_degrees
    }

    /// Active flip, if any.
    #[must_use]
    pub const fn flip(&self) -> Option<FlipAxis> {
        self.flip
    }

    /// Copy of this transform rotated further by the provided angle.
    #[must_use]
    pub const fn rotated_by(self, degrees: u16) -> Self {
        Self::new(
            ((self.rotation_degrees as u32 + degrees as u32) % 360) as u16,
            self.flip,
        )
    }

    /// Copy of this transform with its rotation replaced.
    #[must_use]
    pub const fn with_rotation(self, degrees: u16) -> Self {
        Self::new(degrees, self.flip)
    }

    /// Copy of this transform with its flip replaced.
    #[must_use]
    pub const fn with_flip(self, flip: Option<FlipAxis>) -> Self {
        Self {
            rotation_degrees: self.rotation_degrees,
            flip,
        }
    }

    /// Reports whether the transform leaves the grid untouched.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.rotation_degrees == 0 && self.flip.is_none()
    }
}

impl Default for GridTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn level_descriptor_round_trips_through_bincode() {
        let odd_cells = [CellIndex::new(2), CellIndex::new(7)].into_iter().collect();
        let descriptor = LevelDescriptor::new(
            Level::new(24),
            GridDimensions::new(5, 5),
            Rgb::new(120, 80, 200),
            Rgb::new(140, 74, 197),
            odd_cells,
            29,
        );
        assert_round_trip(&descriptor);
    }

    #[test]
    fn descriptor_colors_follow_the_odd_set() {
        let odd_cells = [CellIndex::new(4)].into_iter().collect();
        let base = Rgb::new(10, 20, 30);
        let odd = Rgb::new(40, 20, 30);
        let descriptor = LevelDescriptor::new(
            Level::FIRST,
            GridDimensions::new(3, 3),
            base,
            odd,
            odd_cells,
            30,
        );

        let colors = descriptor.tile_colors();
        assert_eq!(colors.len(), 9);
        assert_eq!(colors[4], odd);
        assert_eq!(colors.iter().filter(|color| **color == base).count(), 8);
        assert_eq!(descriptor.color_of(CellIndex::new(9)), None);
    }

    #[test]
    fn level_zero_is_lifted_to_first_level() {
        assert_eq!(Level::new(0), Level::FIRST);
        assert_eq!(Level::FIRST.previous(), Level::FIRST);
        assert_eq!(Level::new(7).next().get(), 8);
    }

    #[test]
    fn gimmick_names_resolve_in_both_directions() {
        for kind in GimmickKind::ALL {
            assert_eq!(GimmickKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(GimmickKind::from_name("spin"), None);
    }

    #[test]
    fn rotation_accumulates_modulo_full_turn() {
        let transform = GridTransform::IDENTITY
            .rotated_by(270)
            .rotated_by(180)
            .with_flip(Some(FlipAxis::Vertical));
        assert_eq!(transform.rotation_degrees(), 90);
        assert_eq!(transform.flip(), Some(FlipAxis::Vertical));
        assert!(!transform.is_identity());
    }

    #[test]
    fn grid_positions_are_row_major() {
        let dimensions = GridDimensions::new(4, 3);
        assert_eq!(dimensions.tile_count(), 12);
        assert_eq!(dimensions.position_of(6), (2, 1));
        assert_eq!(dimensions.slot_of(2, 1), 6);
    }
}
