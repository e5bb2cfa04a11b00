#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Score awards for solved levels and penalties for wrong answers.

use std::time::Duration;

use tint_tap_core::{Level, ScoreBreakdown, ScoringConfig};

/// Computes the award for solving `level` with `odd_count` odd tiles.
///
/// The time bonus pays for every second left of `budget` after `elapsed`,
/// rounded and capped.
#[must_use]
pub fn score_for_level(
    config: &ScoringConfig,
    level: Level,
    odd_count: u32,
    elapsed: Duration,
    budget: Duration,
) -> ScoreBreakdown {
    let base_score = config
        .base_per_level
        .saturating_add(config.level_increment.saturating_mul(u64::from(level.get() - 1)));
    let odd_bonus = u64::from(odd_count).saturating_mul(config.per_odd_tile_bonus);
    let time_bonus = time_bonus(config, elapsed, budget);

    ScoreBreakdown {
        base_score,
        odd_bonus,
        time_bonus,
        total_score: base_score.saturating_add(odd_bonus).saturating_add(time_bonus),
    }
}

/// Score left after a wrong answer. A zero penalty leaves the score untouched.
#[must_use]
pub fn apply_wrong_penalty(config: &ScoringConfig, score: u64) -> u64 {
    score.saturating_sub(config.wrong_penalty)
}

fn time_bonus(config: &ScoringConfig, elapsed: Duration, budget: Duration) -> u64 {
    let bonus = &config.time_bonus;
    if !bonus.enabled {
        return 0;
    }
    let remaining = budget.saturating_sub(elapsed).as_secs_f64();
    let earned = (remaining * bonus.per_second).round().max(0.0) as u64;
    earned.min(bonus.cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_tap_core::TimeBonusConfig;

    fn seconds(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    #[test]
    fn first_level_pays_base_plus_odd_bonus() {
        let config = ScoringConfig::default();
        let breakdown = score_for_level(&config, Level::FIRST, 1, seconds(10.0), seconds(10.0));
        assert_eq!(breakdown.base_score, 100);
        assert_eq!(breakdown.odd_bonus, 50);
        assert_eq!(breakdown.time_bonus, 0);
        assert_eq!(breakdown.total_score, 150);
    }

    #[test]
    fn base_grows_with_level() {
        let config = ScoringConfig::default();
        let breakdown = score_for_level(&config, Level::new(11), 2, seconds(20.0), seconds(10.0));
        assert_eq!(breakdown.base_score, 200);
        assert_eq!(breakdown.odd_bonus, 100);
    }

    #[test]
    fn time_bonus_rounds_and_caps() {
        let config = ScoringConfig {
            time_bonus: TimeBonusConfig {
                enabled: true,
                per_second: 10.0,
                cap: 60,
            },
            ..ScoringConfig::default()
        };
        let quick = score_for_level(&config, Level::FIRST, 1, seconds(1.0), seconds(10.0));
        assert_eq!(quick.time_bonus, 60);

        let slower = score_for_level(&config, Level::FIRST, 1, seconds(5.46), seconds(10.0));
        assert_eq!(slower.time_bonus, 45);
    }

    #[test]
    fn disabled_time_bonus_pays_nothing() {
        let mut config = ScoringConfig::default();
        config.time_bonus.enabled = false;
        let breakdown = score_for_level(&config, Level::FIRST, 1, Duration::ZERO, seconds(10.0));
        assert_eq!(breakdown.time_bonus, 0);
    }

    #[test]
    fn penalty_floors_at_zero() {
        let config = ScoringConfig::default();
        assert_eq!(apply_wrong_penalty(&config, 180), 130);
        assert_eq!(apply_wrong_penalty(&config, 20), 0);

        let lenient = ScoringConfig {
            wrong_penalty: 0,
            ..ScoringConfig::default()
        };
        assert_eq!(apply_wrong_penalty(&lenient, 20), 20);
    }
}
