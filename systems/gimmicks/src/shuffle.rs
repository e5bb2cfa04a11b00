use std::{collections::BTreeSet, time::Duration};

use rand::{seq::SliceRandom, Rng};
use tint_tap_core::{CellIndex, Event, GimmickRange, GridView, Rgb, ShuffleIntensity};

use crate::stage::{seconds, Stage};

const DEFAULT_INTERVAL_SECS: f64 = 10.0;

/// Shuffles drawn before giving up on a permutation that changes the colors.
const SHUFFLE_ATTEMPTS: usize = 16;

/// Permutes the presentation order of tiles without touching cell indices.
#[derive(Debug, Default)]
pub(crate) struct Shuffle {
    baseline: Option<Vec<CellIndex>>,
}

impl Shuffle {
    pub(crate) fn period(tier: Option<&GimmickRange>) -> Option<Duration> {
        seconds(tier.and_then(|t| t.interval).unwrap_or(DEFAULT_INTERVAL_SECS))
    }

    pub(crate) fn execute(&mut self, stage: &mut Stage<'_>, tier: Option<&GimmickRange>) -> bool {
        let Some(dimensions) = stage.grid.dimensions() else {
            return false;
        };
        let order = stage.grid.cells_in_order();
        if order.is_empty() {
            return false;
        }

        let columns = dimensions.columns() as usize;
        let rows = dimensions.rows() as usize;
        let row = |r: usize| (r * columns..(r + 1) * columns).collect::<Vec<usize>>();
        let column = |c: usize| (0..rows).map(|r| r * columns + c).collect::<Vec<usize>>();
        let varied = |slots: &[usize]| distinct_colors(&*stage.grid, &order, slots) > 1;

        let intensity = tier.and_then(|t| t.intensity).unwrap_or_default();
        let lines: Vec<Vec<usize>> = match intensity {
            ShuffleIntensity::Easy => {
                let candidates: Vec<Vec<usize>> = (0..rows).map(row).filter(|l| varied(l)).collect();
                match candidates.choose(&mut *stage.rng) {
                    Some(line) => vec![line.clone()],
                    None => return false,
                }
            }
            ShuffleIntensity::Medium => {
                let by_rows = stage.rng.gen_bool(0.5);
                let count = if by_rows { rows } else { columns };
                let line = |i: usize| if by_rows { row(i) } else { column(i) };
                let pairs: Vec<(Vec<usize>, Vec<usize>)> = (1..count)
                    .map(|i| (line(i - 1), line(i)))
                    .filter(|(a, b)| {
                        let union: Vec<usize> = a.iter().chain(b).copied().collect();
                        varied(&union)
                    })
                    .collect();
                match pairs.choose(&mut *stage.rng) {
                    Some((first, second)) => vec![first.clone(), second.clone()],
                    None => return false,
                }
            }
            ShuffleIntensity::Hard => {
                let all: Vec<usize> = (0..order.len()).collect();
                if !varied(&all) {
                    return false;
                }
                vec![all]
            }
        };

        let Some(next) = permute(&*stage.grid, &order, &lines, &mut *stage.rng) else {
            return false;
        };
        if let Err(error) = stage.grid.reorder(&next) {
            tracing::warn!(%error, "shuffle produced an order the grid rejected");
            return false;
        }
        if self.baseline.is_none() {
            self.baseline = Some(order);
        }
        stage.out.push(Event::GridOrderChanged);
        true
    }

    /// Restores the order the current grid had before the first shuffle.
    pub(crate) fn deactivate(&mut self, stage: &mut Stage<'_>) {
        let Some(baseline) = self.baseline.take() else {
            return;
        };
        if stage.grid.cells_in_order() == baseline {
            return;
        }
        if stage.grid.reorder(&baseline).is_ok() {
            stage.out.push(Event::GridOrderChanged);
        }
    }

    pub(crate) fn forget_grid(&mut self) {
        self.baseline = None;
    }
}

fn distinct_colors(grid: &dyn GridView, order: &[CellIndex], slots: &[usize]) -> usize {
    slots
        .iter()
        .filter_map(|slot| order.get(*slot))
        .filter_map(|cell| grid.color_of(*cell))
        .collect::<BTreeSet<Rgb>>()
        .len()
}

/// Shuffles each line within itself until the sequence of colors changes.
fn permute<R: Rng + ?Sized>(
    grid: &dyn GridView,
    order: &[CellIndex],
    lines: &[Vec<usize>],
    rng: &mut R,
) -> Option<Vec<CellIndex>> {
    let colors = |cells: &[CellIndex]| -> Vec<Option<Rgb>> {
        cells.iter().map(|cell| grid.color_of(*cell)).collect()
    };
    let before = colors(order);

    for _ in 0..SHUFFLE_ATTEMPTS {
        let mut next = order.to_vec();
        for line in lines {
            let mut cells: Vec<CellIndex> = line.iter().map(|slot| next[*slot]).collect();
            cells.shuffle(rng);
            for (slot, cell) in line.iter().zip(cells) {
                next[*slot] = cell;
            }
        }
        if colors(&next) != before {
            return Some(next);
        }
    }
    None
}
