#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level generation system that turns level requests into installable puzzles.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tint_tap_core::{CellIndex, Command, Event, GameConfig, Level, LevelDescriptor};
use tint_tap_system_color::{odd_color_from, random_base_color};
use tint_tap_system_difficulty::DifficultySchedule;

/// Failures raised when a level cannot be generated from its tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The tier asks for at least as many odd tiles as the grid holds.
    #[error("level {level} asks for {odd_count} odd tiles in a grid of {tile_count}")]
    TooManyOddTiles {
        /// Level being generated.
        level: Level,
        /// Odd tiles requested by the schedule.
        odd_count: u32,
        /// Tiles available in the grid.
        tile_count: u32,
    },
    /// The tier asks for no odd tiles, leaving the puzzle unsolvable.
    #[error("level {level} asks for zero odd tiles")]
    NoOddTiles {
        /// Level being generated.
        level: Level,
    },
}

/// Generates a complete level descriptor.
///
/// Odd cells are sampled uniformly without replacement. The odd count must
/// leave at least one regular tile.
pub fn generate_level<R: Rng + ?Sized>(
    level: Level,
    config: &GameConfig,
    rng: &mut R,
) -> Result<LevelDescriptor, GenerationError> {
    let tier = DifficultySchedule::new(&config.difficulty).tier(level);
    let tile_count = tier.dimensions.tile_count();
    if tier.odd_count == 0 {
        return Err(GenerationError::NoOddTiles { level });
    }
    if tier.odd_count >= tile_count {
        return Err(GenerationError::TooManyOddTiles {
            level,
            odd_count: tier.odd_count,
            tile_count,
        });
    }

    let base_color = random_base_color(&config.color, rng);
    let odd_color = odd_color_from(base_color, tier.delta, &config.color, rng);

    let mut odd_cells = BTreeSet::new();
    while odd_cells.len() < tier.odd_count as usize {
        let _ = odd_cells.insert(CellIndex::new(rng.gen_range(0..tile_count)));
    }

    tracing::debug!(
        level = level.get(),
        columns = tier.dimensions.columns(),
        rows = tier.dimensions.rows(),
        delta = tier.delta,
        odd_count = tier.odd_count,
        "generated level"
    );

    Ok(LevelDescriptor::new(
        level,
        tier.dimensions,
        base_color,
        odd_color,
        odd_cells,
        tier.delta,
    ))
}

/// Pure system that answers level requests with freshly generated levels.
#[derive(Debug)]
pub struct LevelGeneration {
    rng: ChaCha8Rng,
}

impl LevelGeneration {
    /// Creates the system with a deterministic random stream.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Consumes level requests and emits one install command per request.
    pub fn handle(
        &mut self,
        events: &[Event],
        config: &GameConfig,
        out: &mut Vec<Command>,
    ) -> Result<(), GenerationError> {
        for event in events {
            if let Event::LevelRequested { level } = event {
                let descriptor = generate_level(*level, config, &mut self.rng)?;
                out.push(Command::InstallLevel { descriptor });
            }
        }
        Ok(())
    }
}
