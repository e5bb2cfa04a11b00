use std::collections::BTreeSet;

use thiserror::Error;

use crate::{CellIndex, GridDimensions, GridTransform, LevelDescriptor, Rgb};

/// Presentation surface that gimmicks perturb.
///
/// Every operation is safe to call while no grid is rendered: readers return
/// `None` or empty collections and writers do nothing.
pub trait GridView {
    /// Layout of the rendered grid, if any.
    fn dimensions(&self) -> Option<GridDimensions>;

    /// Cells in the order they are currently drawn, one per slot.
    fn cells_in_order(&self) -> Vec<CellIndex>;

    /// Color of the provided cell.
    fn color_of(&self, cell: CellIndex) -> Option<Rgb>;

    /// Reports whether the cell is drawn opaque.
    fn is_visible(&self, cell: CellIndex) -> bool;

    /// Shows or hides a cell. Hidden cells keep receiving clicks.
    fn set_visible(&mut self, cell: CellIndex, visible: bool);

    /// Replaces the presentation order.
    fn reorder(&mut self, order: &[CellIndex]) -> Result<(), GridViewError>;

    /// Rotation and flip applied to the grid as a whole.
    fn transform(&self) -> GridTransform;

    /// Replaces the rotation and flip applied to the grid.
    fn set_transform(&mut self, transform: GridTransform);

    /// Colors of the cells in presentation order.
    fn colors_in_order(&self) -> Vec<Rgb> {
        self.cells_in_order()
            .into_iter()
            .filter_map(|cell| self.color_of(cell))
            .collect()
    }
}

/// Failures reported by [`GridView::reorder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridViewError {
    /// No grid is rendered.
    #[error("no grid is mounted")]
    NotMounted,
    /// The order does not list every cell exactly once.
    #[error("presentation order must list each of the {expected} cells exactly once")]
    NotAPermutation {
        /// Number of cells the grid holds.
        expected: u32,
    },
}

#[derive(Debug)]
struct MountedGrid {
    dimensions: GridDimensions,
    colors: Vec<Rgb>,
    order: Vec<CellIndex>,
    hidden: BTreeSet<CellIndex>,
}

/// In-memory [`GridView`] backed by the installed level descriptor.
///
/// The transform belongs to the grid container and survives remounting,
/// while order and visibility start fresh with every level.
#[derive(Debug, Default)]
pub struct PresentedGrid {
    mounted: Option<MountedGrid>,
    transform: GridTransform,
}

impl PresentedGrid {
    /// Creates a presentation with no grid rendered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders the tiles of a freshly installed level in index order.
    pub fn mount(&mut self, descriptor: &LevelDescriptor) {
        self.mounted = Some(MountedGrid {
            dimensions: descriptor.dimensions(),
            colors: descriptor.tile_colors(),
            order: descriptor.cells().collect(),
            hidden: BTreeSet::new(),
        });
    }

    /// Removes the rendered tiles.
    pub fn unmount(&mut self) {
        self.mounted = None;
    }

    /// Reports whether a grid is rendered.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Cells that are currently transparent.
    #[must_use]
    pub fn hidden_cells(&self) -> Vec<CellIndex> {
        self.mounted
            .as_ref()
            .map(|grid| grid.hidden.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl GridView for PresentedGrid {
    fn dimensions(&self) -> Option<GridDimensions> {
        self.mounted.as_ref().map(|grid| grid.dimensions)
    }

    fn cells_in_order(&self) -> Vec<CellIndex> {
        self.mounted
            .as_ref()
            .map(|grid| grid.order.clone())
            .unwrap_or_default()
    }

    fn color_of(&self, cell: CellIndex) -> Option<Rgb> {
        let grid = self.mounted.as_ref()?;
        grid.colors.get(cell.get() as usize).copied()
    }

    fn is_visible(&self, cell: CellIndex) -> bool {
        self.mounted
            .as_ref()
            .map_or(false, |grid| !grid.hidden.contains(&cell))
    }

    fn set_visible(&mut self, cell: CellIndex, visible: bool) {
        let Some(grid) = self.mounted.as_mut() else {
            return;
        };
        if cell.get() >= grid.dimensions.tile_count() {
            return;
        }
        if visible {
            let _ = grid.hidden.remove(&cell);
        } else {
            let _ = grid.hidden.insert(cell);
        }
    }

    fn reorder(&mut self, order: &[CellIndex]) -> Result<(), GridViewError> {
        let grid = self.mounted.as_mut().ok_or(GridViewError::NotMounted)?;
        let expected = grid.dimensions.tile_count();
        let distinct: BTreeSet<CellIndex> = order.iter().copied().collect();
        let in_bounds = distinct.iter().all(|cell| cell.get() < expected);
        if order.len() != expected as usize || distinct.len() != order.len() || !in_bounds {
            return Err(GridViewError::NotAPermutation { expected });
        }
        grid.order = order.to_vec();
        Ok(())
    }

    fn transform(&self) -> GridTransform {
        self.transform
    }

    fn set_transform(&mut self, transform: GridTransform) {
        self.transform = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlipAxis, Level};

    fn descriptor() -> LevelDescriptor {
        LevelDescriptor::new(
            Level::FIRST,
            GridDimensions::new(2, 2),
            Rgb::new(100, 100, 100),
            Rgb::new(130, 100, 100),
            [CellIndex::new(3)].into_iter().collect(),
            30,
        )
    }

    #[test]
    fn unmounted_grid_ignores_writes() {
        let mut grid = PresentedGrid::new();
        grid.set_visible(CellIndex::new(0), false);
        assert_eq!(grid.dimensions(), None);
        assert!(grid.cells_in_order().is_empty());
        assert_eq!(
            grid.reorder(&[CellIndex::new(0)]),
            Err(GridViewError::NotMounted)
        );
    }

    #[test]
    fn reorder_rejects_duplicates_and_strangers() {
        let mut grid = PresentedGrid::new();
        grid.mount(&descriptor());
        let duplicate = [0, 0, 1, 2].map(CellIndex::new);
        let stranger = [0, 1, 2, 4].map(CellIndex::new);
        assert!(grid.reorder(&duplicate).is_err());
        assert!(grid.reorder(&stranger).is_err());

        let reversed = [3, 2, 1, 0].map(CellIndex::new);
        grid.reorder(&reversed).expect("valid permutation");
        assert_eq!(grid.cells_in_order(), reversed.to_vec());
        assert_eq!(grid.colors_in_order()[0], Rgb::new(130, 100, 100));
    }

    #[test]
    fn remount_keeps_transform_but_resets_tiles() {
        let mut grid = PresentedGrid::new();
        grid.mount(&descriptor());
        grid.set_visible(CellIndex::new(1), false);
        grid.set_transform(GridTransform::new(90, Some(FlipAxis::Horizontal)));
        assert_eq!(grid.hidden_cells(), vec![CellIndex::new(1)]);

        grid.mount(&descriptor());
        assert!(grid.hidden_cells().is_empty());
        assert_eq!(grid.transform().rotation_degrees(), 90);
    }
}
