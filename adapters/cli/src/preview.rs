use std::fmt::Write as _;

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tint_tap_core::{GameConfig, Level, LevelDescriptor, Rgb};
use tint_tap_system_color::to_css_color;
use tint_tap_system_difficulty::DifficultySchedule;
use tint_tap_system_level_generation::generate_level;

/// Generates one level and renders it as ANSI true-color blocks.
pub(crate) fn render_level(config: &GameConfig, level: Level, seed: u64) -> Result<String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let descriptor = generate_level(level, config, &mut rng)?;
    Ok(render_descriptor(&descriptor))
}

fn render_descriptor(descriptor: &LevelDescriptor) -> String {
    let dimensions = descriptor.dimensions();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Level {}: {}x{} grid, delta {}",
        descriptor.level(),
        dimensions.columns(),
        dimensions.rows(),
        descriptor.delta()
    );
    let _ = writeln!(
        out,
        "base {}  odd {}",
        to_css_color(descriptor.base_color()),
        to_css_color(descriptor.odd_color())
    );

    let colors = descriptor.tile_colors();
    for row in colors.chunks(dimensions.columns() as usize) {
        for color in row {
            out.push_str(&swatch(*color));
        }
        out.push('\n');
    }

    let odd: Vec<String> = descriptor
        .odd_cells()
        .iter()
        .map(|cell| cell.get().to_string())
        .collect();
    let _ = writeln!(out, "odd cells: {}", odd.join(", "));
    out
}

fn swatch(color: Rgb) -> String {
    format!(
        "\x1b[48;2;{};{};{}m    \x1b[0m",
        color.red(),
        color.green(),
        color.blue()
    )
}

/// Tabulates the difficulty tiers for an inclusive level span.
pub(crate) fn render_schedule(config: &GameConfig, from: Level, to: Level) -> String {
    let schedule = DifficultySchedule::new(&config.difficulty);
    let mut out = String::from("level  delta  odd  grid\n");
    for level in from.get()..=to.get() {
        let tier = schedule.tier(Level::new(level));
        let _ = writeln!(
            out,
            "{:>5}  {:>5}  {:>3}  {}x{}",
            tier.level.get(),
            tier.delta,
            tier.odd_count,
            tier.dimensions.columns(),
            tier.dimensions.rows()
        );
    }
    out
}
