use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tint_tap_core::{
    CellIndex, Command, Event, GameConfig, GridStep, Level, LevelRange, OddTileStep,
};
use tint_tap_system_difficulty::DifficultySchedule;
use tint_tap_system_level_generation::{generate_level, GenerationError, LevelGeneration};

#[test]
fn generated_levels_match_their_tier() {
    let config = GameConfig::default();
    let schedule = DifficultySchedule::new(&config.difficulty);
    let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);

    for level in 1..=config.max_level {
        let level = Level::new(level);
        let tier = schedule.tier(level);
        let descriptor = generate_level(level, &config, &mut rng).expect("level generates");

        assert_eq!(descriptor.dimensions(), tier.dimensions);
        assert_eq!(descriptor.odd_cells().len(), tier.odd_count as usize);
        assert!(descriptor
            .odd_cells()
            .iter()
            .all(|cell| cell.get() < tier.dimensions.tile_count()));

        let colors = descriptor.tile_colors();
        for cell in descriptor.cells() {
            let expected = if descriptor.is_odd(cell) {
                descriptor.odd_color()
            } else {
                descriptor.base_color()
            };
            assert_eq!(colors[cell.get() as usize], expected);
        }
    }
}

#[test]
fn overfull_odd_count_fails_fast() {
    let mut config = GameConfig::default();
    config.difficulty.grid_schedule = vec![GridStep {
        range: LevelRange::new(1, 100).expect("valid range"),
        cols: 2,
        rows: 2,
    }];
    config.difficulty.odd_tile_schedule = vec![OddTileStep {
        range: LevelRange::new(1, 100).expect("valid range"),
        count: 4,
    }];
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    assert_eq!(
        generate_level(Level::new(3), &config, &mut rng),
        Err(GenerationError::TooManyOddTiles {
            level: Level::new(3),
            odd_count: 4,
            tile_count: 4,
        })
    );
}

#[test]
fn zero_odd_tiles_is_rejected() {
    let mut config = GameConfig::default();
    config.difficulty.odd_tile_schedule = vec![OddTileStep {
        range: LevelRange::new(1, 100).expect("valid range"),
        count: 0,
    }];
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    assert_eq!(
        generate_level(Level::FIRST, &config, &mut rng),
        Err(GenerationError::NoOddTiles {
            level: Level::FIRST
        })
    );
}

#[test]
fn nearly_full_grid_still_terminates() {
    let mut config = GameConfig::default();
    config.difficulty.odd_tile_schedule = vec![OddTileStep {
        range: LevelRange::new(1, 5).expect("valid range"),
        count: 8,
    }];
    let mut rng = ChaCha8Rng::seed_from_u64(77);

    let descriptor = generate_level(Level::FIRST, &config, &mut rng).expect("level generates");
    assert_eq!(descriptor.odd_cells().len(), 8);
    let regular: Vec<CellIndex> = descriptor.cells().filter(|c| !descriptor.is_odd(*c)).collect();
    assert_eq!(regular.len(), 1);
}

#[test]
fn system_answers_each_request_with_an_install() {
    let config = GameConfig::default();
    let mut system = LevelGeneration::new(42);
    let mut commands = Vec::new();

    system
        .handle(
            &[
                Event::GameStarted { lives: 3 },
                Event::LevelRequested { level: Level::new(4) },
                Event::SelectionEmpty,
                Event::LevelRequested { level: Level::new(5) },
            ],
            &config,
            &mut commands,
        )
        .expect("levels generate");

    let levels: Vec<u32> = commands
        .iter()
        .map(|command| match command {
            Command::InstallLevel { descriptor } => descriptor.level().get(),
            other => panic!("unexpected command {other:?}"),
        })
        .collect();
    assert_eq!(levels, vec![4, 5]);
}

#[test]
fn identical_seeds_generate_identical_levels() {
    let config = GameConfig::default();
    let mut first = LevelGeneration::new(9);
    let mut second = LevelGeneration::new(9);
    let request = [Event::LevelRequested { level: Level::new(33) }];

    let mut left = Vec::new();
    let mut right = Vec::new();
    first.handle(&request, &config, &mut left).expect("generates");
    second.handle(&request, &config, &mut right).expect("generates");

    assert_eq!(left, right);
}
