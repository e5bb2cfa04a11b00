//! Game configuration schema, TOML loading and validation.

use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    find_for_level, ColorChannel, FlipAxis, GridDimensions, Level, LevelRange, Ranged,
    ShuffleIntensity,
};

/// Odd-tile count used when the odd-tile schedule is empty.
pub const FALLBACK_ODD_COUNT: u32 = 1;
/// Grid used when the grid schedule is empty.
pub const FALLBACK_GRID: GridDimensions = GridDimensions::new(3, 3);

/// Failures raised while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {}", path.display())]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid TOML or does not match the schema.
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
    /// The luminance window is empty or leaves the channel range.
    #[error("base luma clamp [{min}, {max}] must satisfy 0 <= min <= max <= 255")]
    InvalidLumaClamp {
        /// Lower luminance bound.
        min: f64,
        /// Upper luminance bound.
        max: f64,
    },
    /// The gimmick trigger probability is not a probability.
    #[error("gimmick trigger probability {0} lies outside [0, 1]")]
    InvalidProbability(f64),
    /// The bonus clock is negative or not finite.
    #[error("bonus clock of {0} seconds must be finite and non-negative")]
    InvalidBonusClock(f64),
    /// A grid schedule entry describes an empty grid.
    #[error("grid schedule entry for levels [{start}, {end}] has zero columns or rows")]
    EmptyGrid {
        /// First level of the offending entry.
        start: u32,
        /// Last level of the offending entry.
        end: u32,
    },
    /// A level would have no odd tile or no even tile.
    #[error("level {level} asks for {odd_count} odd tiles on a grid of {tiles}")]
    UnplayableLevel {
        /// First offending level.
        level: u32,
        /// Odd tiles the schedule resolves for the level.
        odd_count: u32,
        /// Tiles in the level's grid.
        tiles: u32,
    },
    /// `channels_to_vary` is present but lists no channel.
    #[error("channels_to_vary must name at least one channel")]
    NoChannelsToVary,
    /// A gimmick parameter is negative, zero or not finite.
    #[error("gimmick `{gimmick}` has an invalid `{parameter}`")]
    InvalidGimmickParameter {
        /// Registry name of the gimmick.
        gimmick: String,
        /// Name of the rejected parameter.
        parameter: &'static str,
    },
    /// The countdown would never tick.
    #[error("tick rate must be at least 1 Hz")]
    ZeroTickRate,
    /// The game would end before it starts.
    #[error("max level must be at least 1")]
    ZeroMaxLevel,
    /// The game would be lost before it starts.
    #[error("lives must be at least 1")]
    ZeroLives,
}

/// Complete tuning of a Tint Tap session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Final level; solving it wins the game.
    pub max_level: u32,
    /// Lives granted at the start of every game.
    pub lives: u32,
    /// Per-level bonus clock.
    pub timing: TimingConfig,
    /// Base and odd color generation.
    pub color: ColorConfig,
    /// Score awards and penalties.
    pub scoring: ScoringConfig,
    /// Level-indexed difficulty tables.
    pub difficulty: DifficultyConfig,
    /// Gimmick scheduling and per-gimmick tiers.
    pub gimmicks: GimmickEngineConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_level: 100,
            lives: 3,
            timing: TimingConfig::default(),
            color: ColorConfig::default(),
            scoring: ScoringConfig::default(),
            difficulty: DifficultyConfig::default(),
            gimmicks: GimmickEngineConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parses and validates a TOML document. Missing sections keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), max_level = config.max_level, "loaded configuration");
        Ok(config)
    }

    /// Checks cross-field constraints the schema cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_level == 0 {
            return Err(ConfigError::ZeroMaxLevel);
        }
        if self.lives == 0 {
            return Err(ConfigError::ZeroLives);
        }
        if self.timing.tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        let budget = self.timing.bonus_clock_per_level_sec;
        if !budget.is_finite() || budget < 0.0 {
            return Err(ConfigError::InvalidBonusClock(budget));
        }

        let [min, max] = self.color.base_luma_clamp;
        if !(0.0..=255.0).contains(&min) || !(0.0..=255.0).contains(&max) || min > max {
            return Err(ConfigError::InvalidLumaClamp { min, max });
        }

        if self
            .color
            .channels_to_vary
            .as_ref()
            .is_some_and(Vec::is_empty)
        {
            return Err(ConfigError::NoChannelsToVary);
        }

        if let Some(step) = self
            .difficulty
            .grid_schedule
            .iter()
            .find(|step| step.cols == 0 || step.rows == 0)
        {
            return Err(ConfigError::EmptyGrid {
                start: step.range.start(),
                end: step.range.end(),
            });
        }

        self.difficulty.check_playable(self.max_level)?;

        let probability = self.gimmicks.probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::InvalidProbability(probability));
        }

        for gimmick in &self.gimmicks.registry {
            for range in &gimmick.ranges {
                let invalid = |value: Option<f64>| value.is_some_and(|v| !v.is_finite() || v <= 0.0);
                let parameter = if invalid(range.interval) {
                    Some("interval")
                } else if invalid(range.speed) {
                    Some("speed")
                } else if range.count.is_some_and(|[low, high]| low > high) {
                    Some("count")
                } else {
                    None
                };
                if let Some(parameter) = parameter {
                    return Err(ConfigError::InvalidGimmickParameter {
                        gimmick: gimmick.name.clone(),
                        parameter,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Per-level bonus clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds of bonus time granted for every level.
    pub bonus_clock_per_level_sec: f64,
    /// Countdown reports per second.
    pub tick_hz: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            bonus_clock_per_level_sec: 10.0,
            tick_hz: 10,
        }
    }
}

/// Color generation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Inclusive luminance window base colors are drawn from.
    pub base_luma_clamp: [f64; 2],
    /// Channels the odd color may differ in; every channel when absent; must not be empty.
    pub channels_to_vary: Option<Vec<ColorChannel>>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            base_luma_clamp: [60.0, 200.0],
            channels_to_vary: None,
        }
    }
}

/// Score awards and penalties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Award for solving level one.
    pub base_per_level: u64,
    /// Additional award per level beyond the first.
    pub level_increment: u64,
    /// Award per odd tile in the solved level.
    pub per_odd_tile_bonus: u64,
    /// Award for unused bonus time.
    pub time_bonus: TimeBonusConfig,
    /// Points deducted for a wrong answer; zero disables the penalty.
    pub wrong_penalty: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_per_level: 100,
            level_increment: 10,
            per_odd_tile_bonus: 50,
            time_bonus: TimeBonusConfig::default(),
            wrong_penalty: 50,
        }
    }
}

/// Award for unused bonus time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBonusConfig {
    /// Whether unused time earns points.
    pub enabled: bool,
    /// Points per remaining second.
    pub per_second: f64,
    /// Upper bound of the award.
    pub cap: u64,
}

impl Default for TimeBonusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_second: 10.0,
            cap: 100,
        }
    }
}

/// Level-indexed difficulty tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Color delta interpolated across each range.
    pub delta_schedule: Vec<DeltaStep>,
    /// Number of odd tiles per range.
    pub odd_tile_schedule: Vec<OddTileStep>,
    /// Grid layout per range.
    pub grid_schedule: Vec<GridStep>,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        let span = LevelRange::from_trusted;
        Self {
            delta_schedule: vec![
                DeltaStep { range: span(1, 10), start: 60, end: 40 },
                DeltaStep { range: span(11, 30), start: 40, end: 25 },
                DeltaStep { range: span(31, 60), start: 25, end: 15 },
                DeltaStep { range: span(61, 100), start: 15, end: 8 },
            ],
            odd_tile_schedule: vec![
                OddTileStep { range: span(1, 20), count: 1 },
                OddTileStep { range: span(21, 50), count: 2 },
                OddTileStep { range: span(51, 100), count: 3 },
            ],
            grid_schedule: vec![
                GridStep { range: span(1, 5), cols: 3, rows: 3 },
                GridStep { range: span(6, 15), cols: 4, rows: 4 },
                GridStep { range: span(16, 30), cols: 5, rows: 5 },
                GridStep { range: span(31, 60), cols: 6, rows: 6 },
                GridStep { range: span(61, 100), cols: 7, rows: 7 },
            ],
        }
    }
}

impl DifficultyConfig {
    /// Odd tiles for the level: the first matching range, else the last
    /// entry, else [`FALLBACK_ODD_COUNT`].
    #[must_use]
    pub fn odd_count_at(&self, level: Level) -> u32 {
        let schedule = &self.odd_tile_schedule;
        find_for_level(schedule, level)
            .or_else(|| schedule.last())
            .map_or(FALLBACK_ODD_COUNT, |step| step.count)
    }

    /// Grid for the level: the first matching range, else the last entry,
    /// else [`FALLBACK_GRID`].
    #[must_use]
    pub fn grid_at(&self, level: Level) -> GridDimensions {
        let schedule = &self.grid_schedule;
        find_for_level(schedule, level)
            .or_else(|| schedule.last())
            .map_or(FALLBACK_GRID, |step| GridDimensions::new(step.cols, step.rows))
    }

    /// Rejects schedules where some level up to `max_level` cannot be generated.
    ///
    /// Both lookups are constant between range boundaries, so only the first
    /// level of each segment is checked.
    fn check_playable(&self, max_level: u32) -> Result<(), ConfigError> {
        let bounds = self
            .odd_tile_schedule
            .iter()
            .map(|step| step.range)
            .chain(self.grid_schedule.iter().map(|step| step.range));
        let mut levels = vec![1];
        for range in bounds {
            levels.push(range.start());
            levels.push(range.end().saturating_add(1));
        }
        levels.retain(|level| *level <= max_level);
        levels.sort_unstable();
        levels.dedup();

        for level in levels {
            let odd_count = self.odd_count_at(Level::new(level));
            let tiles = self.grid_at(Level::new(level)).tile_count();
            if odd_count == 0 || odd_count >= tiles {
                return Err(ConfigError::UnplayableLevel {
                    level,
                    odd_count,
                    tiles,
                });
            }
        }
        Ok(())
    }
}

/// Color delta interpolated from `start` to `end` across `range`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaStep {
    /// Levels the step covers.
    pub range: LevelRange,
    /// Delta at the first level of the range.
    pub start: u32,
    /// Delta at the last level of the range.
    pub end: u32,
}

impl Ranged for DeltaStep {
    fn levels(&self) -> LevelRange {
        self.range
    }
}

/// Number of odd tiles across `range`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddTileStep {
    /// Levels the step covers.
    pub range: LevelRange,
    /// Odd tiles per level.
    pub count: u32,
}

impl Ranged for OddTileStep {
    fn levels(&self) -> LevelRange {
        self.range
    }
}

/// Grid layout across `range`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridStep {
    /// Levels the step covers.
    pub range: LevelRange,
    /// Columns per level.
    pub cols: u32,
    /// Rows per level.
    pub rows: u32,
}

impl Ranged for GridStep {
    fn levels(&self) -> LevelRange {
        self.range
    }
}

/// Gimmick scheduling policy and registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimmickEngineConfig {
    /// Master switch; a disabled engine never activates anything.
    pub enabled: bool,
    /// First level at which gimmicks may trigger.
    pub start_level: u32,
    /// Chance of a trigger attempt on a level transition before the boss phase.
    pub probability: f64,
    /// Whether at most one gimmick may be active at a time.
    pub single_active: bool,
    /// Boss phase settings.
    pub boss: BossConfig,
    /// Gimmicks available to the engine, in registry order.
    pub registry: Vec<GimmickConfig>,
}

impl Default for GimmickEngineConfig {
    fn default() -> Self {
        let span = LevelRange::from_trusted;
        Self {
            enabled: true,
            start_level: 20,
            probability: 0.3,
            single_active: true,
            boss: BossConfig::default(),
            registry: vec![
                GimmickConfig::new(
                    "shuffle",
                    vec![
                        GimmickRange {
                            interval: Some(10.0),
                            intensity: Some(ShuffleIntensity::Easy),
                            ..GimmickRange::covering(span(20, 39))
                        },
                        GimmickRange {
                            interval: Some(8.0),
                            intensity: Some(ShuffleIntensity::Medium),
                            ..GimmickRange::covering(span(40, 69))
                        },
                        GimmickRange {
                            interval: Some(6.0),
                            intensity: Some(ShuffleIntensity::Hard),
                            ..GimmickRange::covering(span(70, 100))
                        },
                    ],
                ),
                GimmickConfig::new(
                    "hide",
                    vec![
                        GimmickRange {
                            interval: Some(15.0),
                            count: Some([1, 3]),
                            ..GimmickRange::covering(span(20, 49))
                        },
                        GimmickRange {
                            interval: Some(10.0),
                            count: Some([2, 5]),
                            ..GimmickRange::covering(span(50, 100))
                        },
                    ],
                ),
                GimmickConfig::new(
                    "rotation",
                    vec![
                        GimmickRange {
                            angle: Some(OneOrMany::Many(vec![90])),
                            speed: Some(1.0),
                            ..GimmickRange::covering(span(20, 59))
                        },
                        GimmickRange {
                            angle: Some(OneOrMany::Many(vec![90, 180, 270])),
                            speed: Some(1.5),
                            ..GimmickRange::covering(span(60, 100))
                        },
                    ],
                ),
                GimmickConfig::new(
                    "mirror",
                    vec![
                        GimmickRange {
                            direction: Some(OneOrMany::One(FlipAxis::Horizontal)),
                            duration: Some(2_000),
                            frequency: Some(1),
                            ..GimmickRange::covering(span(20, 59))
                        },
                        GimmickRange {
                            direction: Some(OneOrMany::Many(vec![
                                FlipAxis::Horizontal,
                                FlipAxis::Vertical,
                            ])),
                            duration: Some(3_000),
                            frequency: Some(2),
                            ..GimmickRange::covering(span(60, 100))
                        },
                    ],
                ),
            ],
        }
    }
}

/// Boss phase settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// First level of the boss phase, where every transition attempts a trigger.
    pub start_level: u32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self { start_level: 80 }
    }
}

/// Registry entry for a single gimmick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GimmickConfig {
    /// Registry name; unknown names are skipped when the engine is built.
    pub name: String,
    /// Whether the engine may choose the gimmick.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Level-indexed parameter tiers.
    #[serde(default)]
    pub ranges: Vec<GimmickRange>,
}

impl GimmickConfig {
    /// Creates an enabled registry entry.
    #[must_use]
    pub fn new(name: impl Into<String>, ranges: Vec<GimmickRange>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            ranges,
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Parameter tier of a gimmick for a span of levels.
///
/// Each gimmick reads only the parameters it understands; absent values fall
/// back to that gimmick's defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GimmickRange {
    /// Levels the tier covers.
    pub range: LevelRange,
    /// Seconds between executions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
    /// Shuffle strength.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<ShuffleIntensity>,
    /// Inclusive bounds on the number of hidden tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<[u32; 2]>,
    /// Rotation angles in degrees to choose from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<OneOrMany<u16>>,
    /// Rotation speed multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Mirror axes to choose from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<OneOrMany<FlipAxis>>,
    /// Milliseconds a mirror flip lasts before reverting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Mirror executions per activation; above one the flip repeats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
}

impl GimmickRange {
    /// Tier covering `range` with every parameter left to its default.
    #[must_use]
    pub const fn covering(range: LevelRange) -> Self {
        Self {
            range,
            interval: None,
            intensity: None,
            count: None,
            angle: None,
            speed: None,
            direction: None,
            duration: None,
            frequency: None,
        }
    }
}

impl Ranged for GimmickRange {
    fn levels(&self) -> LevelRange {
        self.range
    }
}

/// Configuration value written either as a scalar or as an array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single value.
    One(T),
    /// A list of values.
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// Values as a list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}
