use std::time::Duration;

use rand::{seq::SliceRandom, Rng};
use tint_tap_core::{CellIndex, Event, GimmickRange};

use crate::stage::{seconds, Stage};

const DEFAULT_INTERVAL_SECS: f64 = 15.0;
const DEFAULT_COUNT: [u32; 2] = [1, 5];

/// Turns a random subset of tiles transparent. Hidden tiles stay clickable.
#[derive(Debug, Default)]
pub(crate) struct Hide {
    hidden: Vec<CellIndex>,
}

impl Hide {
    pub(crate) fn period(tier: Option<&GimmickRange>) -> Option<Duration> {
        seconds(tier.and_then(|t| t.interval).unwrap_or(DEFAULT_INTERVAL_SECS))
    }

    pub(crate) fn execute(&mut self, stage: &mut Stage<'_>, tier: Option<&GimmickRange>) -> bool {
        if stage.grid.dimensions().is_none() {
            return false;
        }
        self.restore(stage);

        let cells = stage.grid.cells_in_order();
        let [low, high] = tier.and_then(|t| t.count).unwrap_or(DEFAULT_COUNT);
        let drawn = stage.rng.gen_range(low.min(high)..=high.max(low)) as usize;
        let count = drawn.min(cells.len());

        self.hidden = cells
            .choose_multiple(&mut *stage.rng, count)
            .copied()
            .collect();
        self.hidden.sort();
        for cell in &self.hidden {
            stage.grid.set_visible(*cell, false);
        }
        stage.out.push(Event::TileVisibilityChanged {
            hidden: self.hidden.clone(),
        });
        true
    }

    pub(crate) fn deactivate(&mut self, stage: &mut Stage<'_>) {
        if self.hidden.is_empty() {
            return;
        }
        self.restore(stage);
        stage.out.push(Event::TileVisibilityChanged { hidden: Vec::new() });
    }

    pub(crate) fn forget_grid(&mut self) {
        self.hidden.clear();
    }

    fn restore(&mut self, stage: &mut Stage<'_>) {
        for cell in self.hidden.drain(..) {
            stage.grid.set_visible(cell, true);
        }
    }
}
