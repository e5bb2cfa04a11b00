#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game session orchestration for Tint Tap.
//!
//! A [`Session`] owns the authoritative world, the presented grid and every
//! system. Adapters submit commands; the session applies each one, lets the
//! systems react to the resulting events and keeps applying the commands they
//! emit until nothing is left, returning the full event log of the exchange.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use thiserror::Error;
use tint_tap_core::{
    Clock, Command, Event, GameConfig, GimmickKind, GridView, Level, PresentedGrid,
};
use tint_tap_system_gimmicks::{GimmickEngine, GimmickState};
use tint_tap_system_level_generation::{GenerationError, LevelGeneration};
use tint_tap_world::{self as world, query, World};

mod seeds;

/// Failures that abort a command exchange.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A requested level could not be generated.
    ///
    /// Configurations that pass [`GameConfig::validate`] never produce this.
    #[error("failed to generate the requested level")]
    Generation {
        /// Generator failure.
        #[source]
        source: GenerationError,
        /// Events the exchange produced before the failure, in order.
        events: Vec<Event>,
    },
}

/// Wall clock backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose origin is the moment of creation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A single player's game, from start through any number of restarts.
#[derive(Debug)]
pub struct Session<C: Clock> {
    config: GameConfig,
    world: World,
    grid: PresentedGrid,
    level_generation: LevelGeneration,
    gimmicks: GimmickEngine,
    clock: C,
    last_pump: Duration,
}

impl<C: Clock> Session<C> {
    /// Creates a session. Equal seeds replay identical games for identical input.
    #[must_use]
    pub fn new(config: GameConfig, seed: u64, best_score: u64, clock: C) -> Self {
        let level_seed = seeds::derive_labeled_seed(seed, seeds::LEVEL_STREAM);
        let gimmick_seed = seeds::derive_labeled_seed(seed, seeds::GIMMICK_STREAM);
        let last_pump = clock.now();
        Self {
            world: World::new(&config, best_score),
            grid: PresentedGrid::new(),
            level_generation: LevelGeneration::new(level_seed),
            gimmicks: GimmickEngine::new(&config.gimmicks, gimmick_seed),
            config,
            clock,
            last_pump,
        }
    }

    /// Applies a command and every command the systems emit in response.
    pub fn submit(&mut self, command: Command) -> Result<Vec<Event>, SessionError> {
        let mut pending = VecDeque::from([command]);
        let mut log = Vec::new();

        while let Some(command) = pending.pop_front() {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);
            self.sync_grid(&events);

            let mut reactions = Vec::new();
            self.gimmicks.handle(&events, &mut self.grid, &mut reactions);

            let mut commands = Vec::new();
            let generated = self
                .level_generation
                .handle(&events, &self.config, &mut commands);
            pending.extend(commands);

            log.extend(events);
            log.extend(reactions);
            if let Err(source) = generated {
                tracing::error!(%source, "level generation failed");
                return Err(SessionError::Generation {
                    source,
                    events: log,
                });
            }
        }

        Ok(log)
    }

    /// Advances the session by the time the clock moved since the last pump.
    pub fn pump(&mut self) -> Result<Vec<Event>, SessionError> {
        let now = self.clock.now();
        let dt = now.saturating_sub(self.last_pump);
        self.last_pump = now;
        if dt.is_zero() {
            return Ok(Vec::new());
        }
        self.submit(Command::Tick { dt })
    }

    /// Starts a new game.
    pub fn start(&mut self) -> Result<Vec<Event>, SessionError> {
        self.submit(Command::StartGame)
    }

    /// Toggles the tile drawn in the provided presentation slot.
    pub fn toggle_slot(&mut self, slot: usize) -> Result<Vec<Event>, SessionError> {
        match self.grid.cells_in_order().get(slot) {
            Some(cell) => self.submit(Command::ToggleTile { cell: *cell }),
            None => Ok(Vec::new()),
        }
    }

    /// Jumps straight to a level, abandoning the current one.
    pub fn jump_to_level(&mut self, level: Level) -> Result<Vec<Event>, SessionError> {
        self.submit(Command::JumpToLevel { level })
    }

    /// Activates the gimmick when idle and deactivates it when active.
    pub fn toggle_gimmick(&mut self, kind: GimmickKind) -> Vec<Event> {
        let mut out = Vec::new();
        match self.gimmicks.state_of(kind) {
            Some(GimmickState::Idle) => {
                let _ = self.gimmicks.activate(kind, &mut self.grid, &mut out);
            }
            Some(GimmickState::Active) => {
                let _ = self.gimmicks.deactivate(kind, &mut self.grid, &mut out);
            }
            None => {
                tracing::warn!(%kind, "gimmick is not registered");
            }
        }
        out
    }

    /// Runs one execution of the gimmick right away.
    pub fn execute_gimmick(&mut self, kind: GimmickKind) -> Vec<Event> {
        let mut out = Vec::new();
        if !self.gimmicks.execute_now(kind, &mut self.grid, &mut out) {
            tracing::warn!(%kind, "gimmick is not registered");
        }
        out
    }

    /// Tuning the session runs with.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Authoritative game state, read through [`tint_tap_world::query`].
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Grid as currently presented, including gimmick perturbations.
    #[must_use]
    pub fn grid(&self) -> &PresentedGrid {
        &self.grid
    }

    /// Gimmick engine state.
    #[must_use]
    pub fn gimmicks(&self) -> &GimmickEngine {
        &self.gimmicks
    }

    /// Clock driving the session.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable clock access, for clocks that are moved by hand.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn sync_grid(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::GameStarted { .. } | Event::LevelRequested { .. } => self.grid.unmount(),
                Event::LevelLoaded { .. } => {
                    if let Some(descriptor) = query::descriptor(&self.world) {
                        self.grid.mount(descriptor);
                    }
                }
                _ => {}
            }
        }
    }
}
