#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level-indexed difficulty lookups.

use tint_tap_core::{find_for_level, DifficultyConfig, GridDimensions, Level};

pub use tint_tap_core::{FALLBACK_GRID, FALLBACK_ODD_COUNT};

/// Delta used when the delta schedule is empty.
pub const FALLBACK_DELTA: u32 = 30;

/// Difficulty parameters resolved for a single level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DifficultyTier {
    /// Level the tier was resolved for.
    pub level: Level,
    /// Channel delta between base and odd colors.
    pub delta: u32,
    /// Number of odd tiles.
    pub odd_count: u32,
    /// Grid layout.
    pub dimensions: GridDimensions,
}

/// Read-only view over the difficulty tables of a configuration.
///
/// Every lookup takes the first range containing the level. Levels outside
/// every range use the last entry's terminal value, and an empty table falls
/// back to a fixed constant.
#[derive(Clone, Copy, Debug)]
pub struct DifficultySchedule<'a> {
    config: &'a DifficultyConfig,
}

impl<'a> DifficultySchedule<'a> {
    /// Wraps the difficulty tables.
    #[must_use]
    pub const fn new(config: &'a DifficultyConfig) -> Self {
        Self { config }
    }

    /// Channel delta for the level, interpolated linearly across its range and rounded.
    #[must_use]
    pub fn delta_for(&self, level: Level) -> u32 {
        let schedule = &self.config.delta_schedule;
        match find_for_level(schedule, level) {
            Some(step) if step.range.is_single_point() => step.end,
            Some(step) => {
                let t = step.range.progress(level);
                let start = f64::from(step.start);
                let end = f64::from(step.end);
                (start + (end - start) * t).round().max(0.0) as u32
            }
            None => schedule.last().map_or(FALLBACK_DELTA, |step| step.end),
        }
    }

    /// Number of odd tiles for the level.
    #[must_use]
    pub fn odd_count_for(&self, level: Level) -> u32 {
        self.config.odd_count_at(level)
    }

    /// Grid layout for the level.
    #[must_use]
    pub fn grid_for(&self, level: Level) -> GridDimensions {
        self.config.grid_at(level)
    }

    /// Resolves every parameter for the level.
    #[must_use]
    pub fn tier(&self, level: Level) -> DifficultyTier {
        DifficultyTier {
            level,
            delta: self.delta_for(level),
            odd_count: self.odd_count_for(level),
            dimensions: self.grid_for(level),
        }
    }
}
