#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gimmick engine that perturbs the presented grid as levels progress.
//!
//! The engine reacts to world events. Every level transition may activate a
//! gimmick, session time drives the periodic executions, and game boundaries
//! reset everything. Gimmicks only ever touch the grid through
//! [`GridView`], so cell indices, selection and the solution stay intact.

use std::time::Duration;

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tint_tap_core::{
    find_for_level, Event, GimmickConfig, GimmickEngineConfig, GimmickKind, GimmickRange,
    GridView, Level, Scheduler, TaskHandle,
};

mod hide;
mod mirror;
mod rotation;
mod shuffle;
mod stage;

use hide::Hide;
use mirror::Mirror;
use rotation::Rotation;
use shuffle::Shuffle;
use stage::{Stage, Timer, TimerTask};

/// Lifecycle of a single registered gimmick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GimmickState {
    /// Registered but not touching the grid.
    Idle,
    /// Executing on its schedule.
    Active,
}

#[derive(Debug)]
enum Behavior {
    Shuffle(Shuffle),
    Hide(Hide),
    Rotation(Rotation),
    Mirror(Mirror),
}

impl Behavior {
    fn for_kind(kind: GimmickKind) -> Self {
        match kind {
            GimmickKind::Shuffle => Self::Shuffle(Shuffle::default()),
            GimmickKind::Hide => Self::Hide(Hide::default()),
            GimmickKind::Rotation => Self::Rotation(Rotation),
            GimmickKind::Mirror => Self::Mirror(Mirror::default()),
        }
    }

    fn period(&self, tier: Option<&GimmickRange>) -> Option<Duration> {
        match self {
            Self::Shuffle(_) => Shuffle::period(tier),
            Self::Hide(_) => Hide::period(tier),
            Self::Rotation(_) => Rotation::period(tier),
            Self::Mirror(_) => Mirror::period(tier),
        }
    }

    /// Shuffle waits for its first interval; every other gimmick strikes at once.
    fn executes_on_activate(&self) -> bool {
        !matches!(self, Self::Shuffle(_))
    }

    fn execute(&mut self, stage: &mut Stage<'_>, tier: Option<&GimmickRange>) -> bool {
        match self {
            Self::Shuffle(shuffle) => shuffle.execute(stage, tier),
            Self::Hide(hide) => hide.execute(stage, tier),
            Self::Rotation(rotation) => rotation.execute(stage, tier),
            Self::Mirror(mirror) => mirror.execute(stage, tier),
        }
    }

    fn revert(&mut self, stage: &mut Stage<'_>) {
        if let Self::Mirror(mirror) = self {
            mirror.revert(stage);
        }
    }

    fn deactivate(&mut self, stage: &mut Stage<'_>) {
        match self {
            Self::Shuffle(shuffle) => shuffle.deactivate(stage),
            Self::Hide(hide) => hide.deactivate(stage),
            Self::Rotation(rotation) => rotation.deactivate(stage),
            Self::Mirror(mirror) => mirror.deactivate(stage),
        }
    }

    /// Drops bookkeeping tied to tiles that were just replaced by a new level.
    fn forget_grid(&mut self) {
        match self {
            Self::Shuffle(shuffle) => shuffle.forget_grid(),
            Self::Hide(hide) => hide.forget_grid(),
            Self::Rotation(_) | Self::Mirror(_) => {}
        }
    }
}

#[derive(Debug)]
struct Entry {
    kind: GimmickKind,
    enabled: bool,
    ranges: Vec<GimmickRange>,
    state: GimmickState,
    interval: Option<TaskHandle>,
    behavior: Behavior,
}

impl Entry {
    fn new(kind: GimmickKind, config: &GimmickConfig) -> Self {
        Self {
            kind,
            enabled: config.enabled,
            ranges: config.ranges.clone(),
            state: GimmickState::Idle,
            interval: None,
            behavior: Behavior::for_kind(kind),
        }
    }

    /// First tier whose range contains the level, else the last tier.
    fn tier(&self, level: Level) -> Option<&GimmickRange> {
        find_for_level(&self.ranges, level).or_else(|| self.ranges.last())
    }
}

/// Schedules, runs and reverts gimmicks.
#[derive(Debug)]
pub struct GimmickEngine {
    enabled: bool,
    start_level: Level,
    probability: f64,
    single_active: bool,
    boss_start_level: Level,
    registry: Vec<Entry>,
    active: Vec<GimmickKind>,
    timers: Scheduler<Timer>,
    rng: ChaCha8Rng,
    now: Duration,
    level: Level,
    boss_visible: bool,
}

impl GimmickEngine {
    /// Builds the registry from configuration. Unknown and duplicate names are skipped.
    #[must_use]
    pub fn new(config: &GimmickEngineConfig, seed: u64) -> Self {
        let mut registry: Vec<Entry> = Vec::new();
        for gimmick in &config.registry {
            match GimmickKind::from_name(&gimmick.name) {
                None => {
                    tracing::warn!(name = %gimmick.name, "skipping unknown gimmick");
                }
                Some(kind) if registry.iter().any(|entry| entry.kind == kind) => {
                    tracing::warn!(name = %gimmick.name, "skipping duplicate gimmick");
                }
                Some(kind) => registry.push(Entry::new(kind, gimmick)),
            }
        }

        Self {
            enabled: config.enabled,
            start_level: Level::new(config.start_level),
            probability: config.probability.clamp(0.0, 1.0),
            single_active: config.single_active,
            boss_start_level: Level::new(config.boss.start_level),
            registry,
            active: Vec::new(),
            timers: Scheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            now: Duration::ZERO,
            level: Level::FIRST,
            boss_visible: false,
        }
    }

    /// Reacts to world events: time drives timers, level loads drive triggers.
    pub fn handle(&mut self, events: &[Event], grid: &mut dyn GridView, out: &mut Vec<Event>) {
        for event in events {
            match event {
                Event::TimeAdvanced { now, .. } => self.advance(*now, grid, out),
                Event::LevelLoaded { level, .. } => self.on_level_change(*level, grid, out),
                Event::GameStarted { .. } | Event::GameWon { .. } | Event::GameLost { .. } => {
                    self.reset(grid, out);
                }
                _ => {}
            }
        }
    }

    /// Applies the trigger policy for a freshly loaded level.
    ///
    /// The grid is assumed to hold the new level's tiles already.
    pub fn on_level_change(&mut self, level: Level, grid: &mut dyn GridView, out: &mut Vec<Event>) {
        self.level = level;
        for entry in &mut self.registry {
            if entry.state == GimmickState::Active {
                entry.behavior.forget_grid();
            }
        }

        if !self.enabled || level < self.start_level {
            self.deactivate_all(grid, out);
            self.set_boss_visible(false, out);
            return;
        }

        self.rearm_active();

        if level >= self.boss_start_level {
            self.set_boss_visible(true, out);
            let _ = self.trigger_random(grid, out);
        } else if self.rng.gen_bool(self.probability) {
            let _ = self.trigger_random(grid, out);
        }
    }

    /// Activates a random enabled idle gimmick, respecting the single-active policy.
    pub fn trigger_random(&mut self, grid: &mut dyn GridView, out: &mut Vec<Event>) -> Option<GimmickKind> {
        if self.single_active && !self.active.is_empty() {
            return None;
        }
        let candidates: Vec<usize> = self
            .registry
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.enabled && entry.state == GimmickState::Idle)
            .map(|(index, _)| index)
            .collect();
        let index = *candidates.choose(&mut self.rng)?;
        self.start(index, grid, out);
        Some(self.registry[index].kind)
    }

    /// Activates a specific gimmick, replacing the active one under the single-active policy.
    ///
    /// Returns `false` when the gimmick is not registered or already active.
    pub fn activate(&mut self, kind: GimmickKind, grid: &mut dyn GridView, out: &mut Vec<Event>) -> bool {
        let Some(index) = self.index_of(kind) else {
            return false;
        };
        if self.registry[index].state == GimmickState::Active {
            return false;
        }
        if self.single_active {
            self.deactivate_all(grid, out);
        }
        self.start(index, grid, out);
        true
    }

    /// Deactivates a specific gimmick and reverts its grid changes.
    ///
    /// Returns `false` when the gimmick is not registered or already idle.
    pub fn deactivate(&mut self, kind: GimmickKind, grid: &mut dyn GridView, out: &mut Vec<Event>) -> bool {
        let Some(index) = self.index_of(kind) else {
            return false;
        };
        if self.registry[index].state == GimmickState::Idle {
            return false;
        }
        self.stop(index, grid, out);
        true
    }

    /// Deactivates every active gimmick, most recent first.
    pub fn deactivate_all(&mut self, grid: &mut dyn GridView, out: &mut Vec<Event>) {
        while let Some(kind) = self.active.last().copied() {
            if let Some(index) = self.index_of(kind) {
                self.stop(index, grid, out);
            } else {
                let _ = self.active.pop();
            }
        }
    }

    /// Returns the engine to its initial state for a new or finished game.
    pub fn reset(&mut self, grid: &mut dyn GridView, out: &mut Vec<Event>) {
        self.deactivate_all(grid, out);
        self.timers.clear();
        self.set_boss_visible(false, out);
        self.level = Level::FIRST;
    }

    /// Runs one execution immediately, activating the gimmick first when idle.
    ///
    /// Returns `false` when the gimmick is not registered.
    pub fn execute_now(&mut self, kind: GimmickKind, grid: &mut dyn GridView, out: &mut Vec<Event>) -> bool {
        let Some(index) = self.index_of(kind) else {
            return false;
        };
        let struck_on_activation = self.registry[index].behavior.executes_on_activate();
        let activated = self.activate(kind, grid, out);
        if !activated || !struck_on_activation {
            self.execute(index, grid, out);
        }
        true
    }

    /// Feeds session time to the gimmick timers.
    pub fn advance(&mut self, now: Duration, grid: &mut dyn GridView, out: &mut Vec<Event>) {
        let target = self.now.max(now);
        while let Some(deadline) = self.timers.next_deadline().filter(|due| *due <= target) {
            self.now = self.now.max(deadline);
            let Some((_, timer)) = self.timers.pop_due(self.now) else {
                break;
            };
            let Some(index) = self.index_of(timer.kind) else {
                continue;
            };
            if self.registry[index].state != GimmickState::Active {
                continue;
            }
            tracing::trace!(kind = %timer.kind, task = ?timer.task, "gimmick timer fired");
            match timer.task {
                TimerTask::Interval => self.execute(index, grid, out),
                TimerTask::Revert => {
                    let Self {
                        registry,
                        timers,
                        rng,
                        now,
                        ..
                    } = self;
                    let mut stage = Stage {
                        grid: &mut *grid,
                        timers,
                        rng,
                        out: &mut *out,
                        now: *now,
                    };
                    registry[index].behavior.revert(&mut stage);
                }
            }
        }
        self.now = target;
    }

    /// Most recently activated gimmick that is still active.
    #[must_use]
    pub fn active(&self) -> Option<GimmickKind> {
        self.active.last().copied()
    }

    /// Every active gimmick in activation order.
    #[must_use]
    pub fn active_gimmicks(&self) -> &[GimmickKind] {
        &self.active
    }

    /// Every registered gimmick in registry order.
    #[must_use]
    pub fn registered(&self) -> Vec<GimmickKind> {
        self.registry.iter().map(|entry| entry.kind).collect()
    }

    /// Lifecycle state of a registered gimmick.
    #[must_use]
    pub fn state_of(&self, kind: GimmickKind) -> Option<GimmickState> {
        self.index_of(kind).map(|index| self.registry[index].state)
    }

    /// Parameter tier a gimmick would use at the provided level.
    #[must_use]
    pub fn difficulty_for(&self, kind: GimmickKind, level: Level) -> Option<&GimmickRange> {
        self.index_of(kind)
            .and_then(|index| self.registry[index].tier(level))
    }

    /// Reports whether the boss character is shown.
    #[must_use]
    pub fn boss_visible(&self) -> bool {
        self.boss_visible
    }

    /// Level of the most recent transition.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Number of pending gimmick timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn index_of(&self, kind: GimmickKind) -> Option<usize> {
        self.registry.iter().position(|entry| entry.kind == kind)
    }

    fn start(&mut self, index: usize, grid: &mut dyn GridView, out: &mut Vec<Event>) {
        let level = self.level;
        let now = self.now;
        let entry = &mut self.registry[index];
        entry.state = GimmickState::Active;
        let kind = entry.kind;
        if let Some(period) = entry.behavior.period(entry.tier(level)) {
            if let Some(stale) = entry.interval.take() {
                let _ = self.timers.cancel(stale);
            }
            entry.interval = Some(self.timers.schedule_repeating(
                now,
                period,
                Timer {
                    kind,
                    task: TimerTask::Interval,
                },
            ));
        }
        let execute_now = entry.behavior.executes_on_activate();
        self.active.push(kind);

        tracing::info!(%kind, level = level.get(), "gimmick activated");
        out.push(Event::GimmickActivated { kind, level });
        self.set_boss_visible(true, out);

        if execute_now {
            self.execute(index, grid, out);
        }
    }

    fn execute(&mut self, index: usize, grid: &mut dyn GridView, out: &mut Vec<Event>) {
        let Self {
            registry,
            timers,
            rng,
            now,
            level,
            ..
        } = self;
        let entry = &mut registry[index];
        let tier = find_for_level(&entry.ranges, *level).or_else(|| entry.ranges.last());
        let mut stage = Stage {
            grid,
            timers,
            rng,
            out: &mut *out,
            now: *now,
        };
        if entry.behavior.execute(&mut stage, tier) {
            out.push(Event::GimmickExecuted {
                kind: entry.kind,
                cue: entry.kind.cue(),
            });
        }
    }

    fn stop(&mut self, index: usize, grid: &mut dyn GridView, out: &mut Vec<Event>) {
        let Self {
            registry,
            timers,
            rng,
            now,
            active,
            ..
        } = self;
        let entry = &mut registry[index];
        if let Some(handle) = entry.interval.take() {
            let _ = timers.cancel(handle);
        }
        let mut stage = Stage {
            grid,
            timers,
            rng,
            out: &mut *out,
            now: *now,
        };
        entry.behavior.deactivate(&mut stage);
        entry.state = GimmickState::Idle;
        active.retain(|kind| *kind != entry.kind);

        tracing::info!(kind = %entry.kind, "gimmick deactivated");
        out.push(Event::GimmickDeactivated { kind: entry.kind });
    }

    /// Re-arms the interval of every active gimmick with the current level's tier.
    fn rearm_active(&mut self) {
        let level = self.level;
        let now = self.now;
        for entry in &mut self.registry {
            if entry.state != GimmickState::Active {
                continue;
            }
            if let Some(handle) = entry.interval.take() {
                let _ = self.timers.cancel(handle);
            }
            let kind = entry.kind;
            entry.interval = entry.behavior.period(entry.tier(level)).map(|period| {
                self.timers.schedule_repeating(
                    now,
                    period,
                    Timer {
                        kind,
                        task: TimerTask::Interval,
                    },
                )
            });
        }
    }

    fn set_boss_visible(&mut self, visible: bool, out: &mut Vec<Event>) {
        if self.boss_visible != visible {
            self.boss_visible = visible;
            out.push(Event::BossVisibilityChanged { visible });
        }
    }
}
