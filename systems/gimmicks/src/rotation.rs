use std::time::Duration;

use rand::seq::SliceRandom;
use tint_tap_core::{Event, GimmickRange};

use crate::stage::Stage;

const DEFAULT_ANGLE: u16 = 90;
const DEFAULT_SPEED: f64 = 1.0;
const MIN_PERIOD_SECS: f64 = 2.0;
const BASE_PERIOD_SECS: f64 = 10.0;

/// Rotates the whole grid by a random configured angle, cumulatively.
#[derive(Debug, Default)]
pub(crate) struct Rotation;

impl Rotation {
    /// Faster rotations tick more often, but never more than every two seconds.
    pub(crate) fn period(tier: Option<&GimmickRange>) -> Option<Duration> {
        let speed = tier
            .and_then(|t| t.speed)
            .filter(|speed| speed.is_finite() && *speed > 0.0)
            .unwrap_or(DEFAULT_SPEED);
        Some(Duration::from_secs_f64((BASE_PERIOD_SECS / speed).max(MIN_PERIOD_SECS)))
    }

    pub(crate) fn execute(&mut self, stage: &mut Stage<'_>, tier: Option<&GimmickRange>) -> bool {
        if stage.grid.dimensions().is_none() {
            return false;
        }
        let angles = tier
            .and_then(|t| t.angle.as_ref())
            .map(|angle| angle.to_vec())
            .unwrap_or_default();
        let angle = angles
            .choose(&mut *stage.rng)
            .copied()
            .unwrap_or(DEFAULT_ANGLE);

        let transform = stage.grid.transform().rotated_by(angle);
        stage.grid.set_transform(transform);
        stage.out.push(Event::GridTransformChanged { transform });
        true
    }

    pub(crate) fn deactivate(&mut self, stage: &mut Stage<'_>) {
        let current = stage.grid.transform();
        if current.rotation_degrees() == 0 {
            return;
        }
        let transform = current.with_rotation(0);
        stage.grid.set_transform(transform);
        stage.out.push(Event::GridTransformChanged { transform });
    }
}
