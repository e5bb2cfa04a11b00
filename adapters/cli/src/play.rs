use anyhow::Result;
use tint_tap_core::{BossCue, Clock, Command, Event, GameConfig, GridDimensions, GridView};
use tint_tap_rendering::{
    Color, DevAction, FrameInput, GameStatus, Hud, Presentation, RenderingBackend, Scene,
    SceneTile, TileGridPresentation,
};
use tint_tap_session::{MonotonicClock, Session};
use tint_tap_world::{query, Phase};

use crate::best_score::BestScoreFile;

const TILE_LENGTH: f32 = 64.0;
const TILE_GAP: f32 = 6.0;
const CLEAR_COLOR: Color = Color::from_rgb_u8(24, 26, 32);
const EMPTY_GRID: GridDimensions = GridDimensions::new(3, 3);

/// Frame-by-frame driver translating adapter input into session commands.
#[derive(Debug)]
pub(crate) struct PlayLoop<C: Clock> {
    session: Session<C>,
    best_score_file: Option<BestScoreFile>,
    boss_cue: Option<BossCue>,
}

impl<C: Clock> PlayLoop<C> {
    pub(crate) fn new(session: Session<C>, best_score_file: Option<BestScoreFile>) -> Self {
        Self {
            session,
            best_score_file,
            boss_cue: None,
        }
    }

    /// Applies one frame of input against the scene the player was looking at.
    pub(crate) fn frame(&mut self, input: FrameInput, shown: &Scene) -> Result<Vec<Event>> {
        let mut events = self.session.pump()?;

        if input.restart {
            events.extend(self.session.start()?);
        }
        if let Some(slot) = input.tap.and_then(|point| shown.slot_at(point)) {
            events.extend(self.session.toggle_slot(slot)?);
        }
        if input.commit {
            events.extend(self.session.submit(Command::CommitSelection)?);
        }
        if let Some(action) = input.dev {
            events.extend(self.dev_action(action)?);
        }

        self.observe(&events);
        Ok(events)
    }

    fn dev_action(&mut self, action: DevAction) -> Result<Vec<Event>> {
        let level = query::level(self.session.world());
        let events = match action {
            DevAction::PreviousLevel => self.session.jump_to_level(level.previous())?,
            DevAction::NextLevel => self.session.jump_to_level(level.next())?,
            DevAction::ToggleGimmick(kind) => self.session.toggle_gimmick(kind),
            DevAction::ExecuteGimmick(kind) => self.session.execute_gimmick(kind),
        };
        tracing::debug!(?action, "dev action applied");
        Ok(events)
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::GimmickExecuted { cue, .. } => self.boss_cue = Some(*cue),
                Event::BossVisibilityChanged { visible: false } => self.boss_cue = None,
                Event::BestScoreRaised { best } => self.persist(*best),
                _ => {}
            }
        }
    }

    fn persist(&self, best: u64) {
        let Some(file) = &self.best_score_file else {
            return;
        };
        match file.store(best) {
            Ok(()) => tracing::info!(best, path = %file.path().display(), "best score saved"),
            Err(error) => tracing::warn!(error = %format!("{error:#}"), "could not save the best score"),
        }
    }

    /// Snapshot of the session as the backend should draw it.
    pub(crate) fn scene(&self) -> Result<Scene> {
        let world = self.session.world();
        let grid = self.session.grid();
        let gimmicks = self.session.gimmicks();

        let dimensions = grid.dimensions().unwrap_or(EMPTY_GRID);
        let tile_grid = TileGridPresentation::new(dimensions, TILE_LENGTH, TILE_GAP)?;
        let tiles = grid
            .cells_in_order()
            .into_iter()
            .filter_map(|cell| {
                grid.color_of(cell).map(|color| SceneTile {
                    cell,
                    color: Color::from(color),
                    visible: grid.is_visible(cell),
                    selected: query::is_selected(world, cell),
                })
            })
            .collect();

        let hud = Hud {
            banner: query::welcome_banner(world),
            status: status_of(query::phase(world)),
            level: query::level(world),
            max_level: query::max_level(world),
            score: query::score(world),
            best_score: query::best_score(world),
            lives: query::lives(world),
            remaining: query::remaining_time(world),
            active_gimmicks: gimmicks.active_gimmicks().to_vec(),
            boss_visible: gimmicks.boss_visible(),
            boss_cue: self.boss_cue,
        };

        Ok(Scene::new(tile_grid, tiles, grid.transform(), hud))
    }
}

fn status_of(phase: Phase) -> GameStatus {
    match phase {
        Phase::Ready => GameStatus::Ready,
        Phase::Playing => GameStatus::Playing,
        Phase::Won => GameStatus::Won,
        Phase::Lost => GameStatus::Lost,
    }
}

/// Opens the game window and plays until the player quits.
pub(crate) fn run<B: RenderingBackend>(
    backend: B,
    config: GameConfig,
    seed: u64,
    best_score_file: Option<BestScoreFile>,
) -> Result<()> {
    let best_score = match &best_score_file {
        Some(file) => {
            let best = file.load()?;
            tracing::info!(best, path = %file.path().display(), "loaded best score");
            best
        }
        None => 0,
    };
    tracing::info!(seed, max_level = config.max_level, "starting session");

    let session = Session::new(config, seed, best_score, MonotonicClock::new());
    let mut play = PlayLoop::new(session, best_score_file);
    let presentation = Presentation::new("Tint Tap", CLEAR_COLOR, play.scene()?);

    backend.run(presentation, move |_frame_dt, input, scene| {
        let refreshed = play.frame(input, scene).and_then(|_| play.scene());
        match refreshed {
            Ok(next) => *scene = next,
            Err(error) => tracing::error!(error = %format!("{error:#}"), "frame update failed"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_tap_core::{GimmickKind, Level, ManualClock};

    fn play_loop(config: GameConfig) -> PlayLoop<ManualClock> {
        PlayLoop::new(Session::new(config, 5, 0, ManualClock::new()), None)
    }

    fn quiet() -> GameConfig {
        let mut config = GameConfig::default();
        config.gimmicks.enabled = false;
        config
    }

    fn restart(play: &mut PlayLoop<ManualClock>) -> Scene {
        let shown = play.scene().expect("scene");
        let _ = play
            .frame(
                FrameInput {
                    restart: true,
                    ..FrameInput::default()
                },
                &shown,
            )
            .expect("restart");
        play.scene().expect("scene")
    }

    #[test]
    fn ready_scene_has_no_tiles() {
        let play = play_loop(quiet());
        let scene = play.scene().expect("scene");

        assert_eq!(scene.hud.status, GameStatus::Ready);
        assert!(scene.tiles.is_empty());
        assert_eq!(scene.hud.banner, "Welcome to Tint Tap.");
    }

    #[test]
    fn tapping_a_tile_center_selects_that_tile() {
        let mut play = play_loop(quiet());
        let scene = restart(&mut play);
        assert_eq!(scene.tiles.len(), 9);

        let tap = scene.tile_center(4).expect("slot exists");
        let events = play
            .frame(
                FrameInput {
                    tap: Some(tap),
                    ..FrameInput::default()
                },
                &scene,
            )
            .expect("tap");

        let cell = scene.tiles[4].cell;
        assert!(events.contains(&Event::TileSelectionChanged {
            cell,
            selected: true
        }));
        assert!(play.scene().expect("scene").tiles[4].selected);
    }

    #[test]
    fn committing_the_odd_tiles_advances_the_level() {
        let mut play = play_loop(quiet());
        let mut scene = restart(&mut play);

        let odd: Vec<usize> = {
            let descriptor = query::descriptor(play.session.world()).expect("installed");
            scene
                .tiles
                .iter()
                .enumerate()
                .filter(|(_, tile)| descriptor.is_odd(tile.cell))
                .map(|(slot, _)| slot)
                .collect()
        };
        for slot in odd {
            let input = FrameInput {
                tap: scene.tile_center(slot),
                ..FrameInput::default()
            };
            let _ = play.frame(input, &scene).expect("tap");
            scene = play.scene().expect("scene");
        }
        let input = FrameInput {
            commit: true,
            ..FrameInput::default()
        };
        let _ = play.frame(input, &scene).expect("commit");

        let scene = play.scene().expect("scene");
        assert_eq!(scene.hud.level, Level::new(2));
        assert!(scene.hud.score > 0);
        assert!(scene.tiles.iter().all(|tile| !tile.selected));
    }

    #[test]
    fn dev_actions_jump_levels_and_drive_gimmicks() {
        let mut play = play_loop(quiet());
        let scene = restart(&mut play);

        let input = FrameInput {
            dev: Some(DevAction::NextLevel),
            ..FrameInput::default()
        };
        let _ = play.frame(input, &scene).expect("next level");
        assert_eq!(query::level(play.session.world()), Level::new(2));

        let input = FrameInput {
            dev: Some(DevAction::ExecuteGimmick(GimmickKind::Mirror)),
            ..FrameInput::default()
        };
        let _ = play.frame(input, &scene).expect("mirror");
        let scene = play.scene().expect("scene");
        assert!(scene.transform.flip().is_some());
        assert_eq!(scene.hud.boss_cue, Some(GimmickKind::Mirror.cue()));
        assert_eq!(scene.hud.active_gimmicks, vec![GimmickKind::Mirror]);
    }

    #[test]
    fn frames_pump_the_clock() {
        let mut play = play_loop(quiet());
        let scene = restart(&mut play);

        play.session
            .clock_mut()
            .advance(std::time::Duration::from_secs(3));
        let events = play.frame(FrameInput::default(), &scene).expect("frame");

        assert!(matches!(events[0], Event::TimeAdvanced { .. }));
        assert_eq!(play.scene().expect("scene").hud.remaining_seconds(), 7);
    }
}
