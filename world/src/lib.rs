#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Tint Tap.

use std::{collections::BTreeSet, time::Duration};

use tint_tap_core::{
    CellIndex, Command, Event, GameConfig, Level, LevelDescriptor, ScoringConfig, WELCOME_BANNER,
};
use tint_tap_system_scoring::{apply_wrong_penalty, score_for_level};

mod countdown;

use countdown::Countdown;

/// Lifecycle of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No game has started yet.
    Ready,
    /// A level is being played or generated.
    Playing,
    /// The final level was solved.
    Won,
    /// Every life was lost.
    Lost,
}

impl Phase {
    /// Reports whether the game reached an end state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Debug)]
struct Rules {
    max_level: Level,
    lives: u32,
    scoring: ScoringConfig,
}

/// Represents the authoritative Tint Tap session state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    rules: Rules,
    phase: Phase,
    level: Level,
    score: u64,
    best_score: u64,
    lives: u32,
    selection: BTreeSet<CellIndex>,
    descriptor: Option<LevelDescriptor>,
    countdown: Countdown,
    now: Duration,
}

impl World {
    /// Creates a world awaiting its first game.
    ///
    /// `best_score` seeds the persisted high score that later games compete with.
    #[must_use]
    pub fn new(config: &GameConfig, best_score: u64) -> Self {
        let budget = Duration::from_secs_f64(config.timing.bonus_clock_per_level_sec.max(0.0));
        Self {
            banner: WELCOME_BANNER,
            rules: Rules {
                max_level: Level::new(config.max_level),
                lives: config.lives.max(1),
                scoring: config.scoring.clone(),
            },
            phase: Phase::Ready,
            level: Level::FIRST,
            score: 0,
            best_score,
            lives: config.lives.max(1),
            selection: BTreeSet::new(),
            descriptor: None,
            countdown: Countdown::new(budget, config.timing.tick_hz),
            now: Duration::ZERO,
        }
    }

    fn request_level(&mut self, level: Level, out_events: &mut Vec<Event>) {
        self.countdown.cancel();
        self.selection.clear();
        self.descriptor = None;
        self.level = level;
        out_events.push(Event::LevelRequested { level });
    }

    fn finish(&mut self, phase: Phase, out_events: &mut Vec<Event>) {
        self.countdown.cancel();
        self.selection.clear();
        self.phase = phase;
        match phase {
            Phase::Won => out_events.push(Event::GameWon { score: self.score }),
            Phase::Lost => out_events.push(Event::GameLost {
                score: self.score,
                level: self.level,
            }),
            Phase::Ready | Phase::Playing => {}
        }
        tracing::info!(?phase, score = self.score, level = self.level.get(), "game finished");

        if self.score > self.best_score {
            self.best_score = self.score;
            out_events.push(Event::BestScoreRaised {
                best: self.best_score,
            });
        }
    }

    fn commit(&mut self, out_events: &mut Vec<Event>) {
        let Some(descriptor) = self.descriptor.as_ref() else {
            return;
        };
        if self.selection.is_empty() {
            out_events.push(Event::SelectionEmpty);
            return;
        }

        if &self.selection == descriptor.odd_cells() {
            let breakdown = score_for_level(
                &self.rules.scoring,
                self.level,
                descriptor.odd_cells().len() as u32,
                self.countdown.elapsed(self.now),
                self.countdown.budget(),
            );
            self.score = self.score.saturating_add(breakdown.total_score);
            out_events.push(Event::AnswerCorrect {
                level: self.level,
                breakdown,
                score: self.score,
            });

            let next = self.level.next();
            if next > self.rules.max_level {
                self.finish(Phase::Won, out_events);
            } else {
                self.request_level(next, out_events);
            }
        } else {
            self.lives = self.lives.saturating_sub(1);
            self.score = apply_wrong_penalty(&self.rules.scoring, self.score);
            out_events.push(Event::AnswerWrong {
                level: self.level,
                score: self.score,
            });
            out_events.push(Event::LifeLost {
                lives_remaining: self.lives,
            });

            if self.lives == 0 {
                self.finish(Phase::Lost, out_events);
            } else {
                self.request_level(self.level, out_events);
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartGame => {
            world.countdown.cancel();
            world.phase = Phase::Playing;
            world.score = 0;
            world.lives = world.rules.lives;
            out_events.push(Event::GameStarted { lives: world.lives });
            world.request_level(Level::FIRST, out_events);
        }
        Command::InstallLevel { descriptor } => {
            if world.phase != Phase::Playing || descriptor.level() != world.level {
                return;
            }
            world.countdown.start(world.now);
            world.selection.clear();
            out_events.push(Event::LevelLoaded {
                level: descriptor.level(),
                dimensions: descriptor.dimensions(),
                odd_count: descriptor.odd_cells().len() as u32,
            });
            world.descriptor = Some(descriptor);
        }
        Command::ToggleTile { cell } => {
            if world.phase != Phase::Playing {
                return;
            }
            let Some(descriptor) = world.descriptor.as_ref() else {
                return;
            };
            if cell.get() >= descriptor.dimensions().tile_count() {
                return;
            }
            let selected = if world.selection.remove(&cell) {
                false
            } else {
                world.selection.insert(cell)
            };
            out_events.push(Event::TileSelectionChanged { cell, selected });
        }
        Command::CommitSelection => {
            if world.phase == Phase::Playing {
                world.commit(out_events);
            }
        }
        Command::Tick { dt } => {
            world.now = world.now.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt, now: world.now });
            if world.phase == Phase::Playing {
                world.countdown.advance(world.now, world.level, out_events);
            }
        }
        Command::JumpToLevel { level } => {
            if world.phase != Phase::Playing {
                return;
            }
            let level = level.min(world.rules.max_level);
            world.request_level(level, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::{collections::BTreeSet, time::Duration};

    use super::{Phase, World};
    use tint_tap_core::{CellIndex, Level, LevelDescriptor};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Level being played, or the level that ended the game.
    #[must_use]
    pub fn level(world: &World) -> Level {
        world.level
    }

    /// Final level of the game.
    #[must_use]
    pub fn max_level(world: &World) -> Level {
        world.rules.max_level
    }

    /// Session score.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.score
    }

    /// Highest score seen, including the one the world was created with.
    #[must_use]
    pub fn best_score(world: &World) -> u64 {
        world.best_score
    }

    /// Lives left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Tiles the player selected in the current level.
    #[must_use]
    pub fn selection(world: &World) -> &BTreeSet<CellIndex> {
        &world.selection
    }

    /// Reports whether the tile is selected.
    #[must_use]
    pub fn is_selected(world: &World, cell: CellIndex) -> bool {
        world.selection.contains(&cell)
    }

    /// Installed level, if any.
    #[must_use]
    pub fn descriptor(world: &World) -> Option<&LevelDescriptor> {
        world.descriptor.as_ref()
    }

    /// Session time.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Bonus time left in the current level.
    #[must_use]
    pub fn remaining_time(world: &World) -> Duration {
        if world.countdown.is_running() {
            world.countdown.remaining(world.now)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_tap_core::{GridDimensions, Rgb, ScoreBreakdown};

    fn config() -> GameConfig {
        GameConfig {
            max_level: 3,
            ..GameConfig::default()
        }
    }

    fn descriptor(level: Level, odd: &[u32]) -> LevelDescriptor {
        LevelDescriptor::new(
            level,
            GridDimensions::new(3, 3),
            Rgb::new(100, 100, 100),
            Rgb::new(140, 100, 100),
            odd.iter().copied().map(CellIndex::new).collect(),
            40,
        )
    }

    fn started(config: &GameConfig) -> World {
        let mut world = World::new(config, 0);
        let mut events = Vec::new();
        apply(&mut world, Command::StartGame, &mut events);
        let _ = install(&mut world, &[4]);
        world
    }

    fn install(world: &mut World, odd: &[u32]) -> Vec<Event> {
        let mut events = Vec::new();
        let level = query::level(world);
        apply(
            world,
            Command::InstallLevel {
                descriptor: descriptor(level, odd),
            },
            &mut events,
        );
        events
    }

    fn toggle(world: &mut World, cell: u32) {
        let mut events = Vec::new();
        apply(
            world,
            Command::ToggleTile {
                cell: CellIndex::new(cell),
            },
            &mut events,
        );
    }

    fn commit(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::CommitSelection, &mut events);
        events
    }

    fn tick(world: &mut World, millis: u64) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn start_game_requests_the_first_level() {
        let mut world = World::new(&config(), 0);
        let mut events = Vec::new();

        apply(&mut world, Command::StartGame, &mut events);

        assert_eq!(
            events,
            vec![
                Event::GameStarted { lives: 3 },
                Event::LevelRequested {
                    level: Level::FIRST
                },
            ]
        );
        assert_eq!(query::phase(&world), Phase::Playing);
    }

    #[test]
    fn stale_install_is_ignored() {
        let mut world = World::new(&config(), 0);
        let mut events = Vec::new();
        apply(&mut world, Command::StartGame, &mut events);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::InstallLevel {
                descriptor: descriptor(Level::new(2), &[0]),
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert!(query::descriptor(&world).is_none());
    }

    #[test]
    fn empty_commit_reports_without_penalty() {
        let mut world = started(&config());

        assert_eq!(commit(&mut world), vec![Event::SelectionEmpty]);
        assert_eq!(query::lives(&world), 3);
        assert_eq!(query::level(&world), Level::FIRST);
    }

    #[test]
    fn toggling_twice_deselects() {
        let mut world = started(&config());
        toggle(&mut world, 2);
        assert!(query::is_selected(&world, CellIndex::new(2)));
        toggle(&mut world, 2);
        assert!(query::selection(&world).is_empty());
        toggle(&mut world, 42);
        assert!(query::selection(&world).is_empty());
    }

    #[test]
    fn correct_answer_scores_and_advances() {
        let mut world = started(&config());
        let _ = tick(&mut world, 4_000);
        toggle(&mut world, 4);

        let events = commit(&mut world);

        let expected = ScoreBreakdown {
            base_score: 100,
            odd_bonus: 50,
            time_bonus: 60,
            total_score: 210,
        };
        assert_eq!(
            events,
            vec![
                Event::AnswerCorrect {
                    level: Level::FIRST,
                    breakdown: expected,
                    score: 210,
                },
                Event::LevelRequested {
                    level: Level::new(2)
                },
            ]
        );
        assert!(query::selection(&world).is_empty());
        assert_eq!(query::remaining_time(&world), Duration::ZERO);
    }

    #[test]
    fn superset_selection_is_wrong() {
        let mut world = started(&config());
        toggle(&mut world, 4);
        toggle(&mut world, 0);

        let events = commit(&mut world);

        assert!(events.contains(&Event::LifeLost { lives_remaining: 2 }));
        assert!(events.contains(&Event::LevelRequested {
            level: Level::FIRST
        }));
        assert_eq!(query::score(&world), 0);
    }

    #[test]
    fn last_life_ends_the_game_and_raises_best_score() {
        let config = GameConfig {
            lives: 1,
            ..config()
        };
        let mut world = started(&config);
        toggle(&mut world, 4);
        let _ = commit(&mut world);
        let _ = install(&mut world, &[1]);
        toggle(&mut world, 0);

        let events = commit(&mut world);

        assert_eq!(query::phase(&world), Phase::Lost);
        assert!(events.contains(&Event::GameLost {
            score: query::score(&world),
            level: Level::new(2),
        }));
        assert!(events.contains(&Event::BestScoreRaised {
            best: query::score(&world)
        }));
        assert!(commit(&mut world).is_empty());
    }

    #[test]
    fn clearing_the_final_level_wins_exactly_once() {
        let mut world = started(&config());
        let mut outcomes = Vec::new();
        for _ in 0..3 {
            toggle(&mut world, 4);
            outcomes.extend(commit(&mut world));
            let _ = install(&mut world, &[4]);
        }
        toggle(&mut world, 4);
        outcomes.extend(commit(&mut world));

        let wins = outcomes
            .iter()
            .filter(|event| matches!(event, Event::GameWon { .. }))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(query::phase(&world), Phase::Won);
    }

    #[test]
    fn countdown_ticks_and_expires_once() {
        let mut world = started(&config());

        let events = tick(&mut world, 250);
        let ticks = events
            .iter()
            .filter(|event| matches!(event, Event::CountdownTicked { .. }))
            .count();
        assert_eq!(ticks, 2);
        assert_eq!(query::remaining_time(&world), Duration::from_millis(9_750));

        let events = tick(&mut world, 20_000);
        let expiries = events
            .iter()
            .filter(|event| matches!(event, Event::CountdownExpired { .. }))
            .count();
        assert_eq!(expiries, 1);
        assert!(tick(&mut world, 1_000)
            .iter()
            .all(|event| matches!(event, Event::TimeAdvanced { .. })));
        assert_eq!(query::phase(&world), Phase::Playing);
    }

    #[test]
    fn jump_clamps_to_the_final_level() {
        let mut world = started(&config());
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::JumpToLevel {
                level: Level::new(50),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::LevelRequested {
                level: Level::new(3)
            }]
        );
        assert!(query::descriptor(&world).is_none());
    }

    #[test]
    fn welcome_banner_is_exposed() {
        let world = World::new(&config(), 0);
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
    }
}
