use serde::{Deserialize, Serialize};

use crate::{tones::CATALOG_LEN, Result, ToneMemoryError};

/// Grid shapes indexed by `pair_count - 1`.
///
/// Five, seven and eleven pairs have no rectangle of their own and reuse the
/// next larger shape; the surplus cells stay empty.
const SIZES: [(usize, usize); CATALOG_LEN] = [
    (1, 2),
    (2, 2),
    (2, 3),
    (2, 4),
    (3, 4),
    (3, 4),
    (4, 4),
    (4, 4),
    (3, 6),
    (4, 5),
    (4, 6),
    (4, 6),
];

/// Rows and columns of the card grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: usize,
    pub columns: usize,
}

impl GridSize {
    pub fn cell_count(&self) -> usize {
        self.rows * self.columns
    }

    /// Number of grid cells left empty when `pair_count` pairs are laid out.
    pub fn slack(&self, pair_count: usize) -> usize {
        self.cell_count().saturating_sub(pair_count * 2)
    }

    /// Row-major card index of a grid cell.
    pub fn card_index(&self, row: usize, column: usize) -> usize {
        self.columns * row + column
    }

    /// Walks the grid row by row, yielding the card index for each cell or
    /// `None` when the cell lies beyond the last of `card_count` cards.
    pub fn cells(&self, card_count: usize) -> impl Iterator<Item = Option<usize>> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.columns).map(move |column| {
                let index = self.card_index(row, column);
                (index < card_count).then_some(index)
            })
        })
    }
}

/// Maps a pair count in `1..=12` to its fixed grid shape.
pub fn size_for(pair_count: usize) -> Result<GridSize> {
    let (rows, columns) = pair_count
        .checked_sub(1)
        .and_then(|idx| SIZES.get(idx))
        .copied()
        .ok_or(ToneMemoryError::Configuration { pair_count })?;
    Ok(GridSize { rows, columns })
}
