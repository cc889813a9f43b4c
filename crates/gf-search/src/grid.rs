//! Cartesian enumeration of a hyperparameter grid.

use gf_types::{HyperparameterGrid, ParamSet};

/// Lazily walks every point of a grid, last axis fastest.
///
/// A grid with no axes has exactly one (empty) point; a grid with an empty
/// axis has none.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    grid: &'a HyperparameterGrid,
    cursor: Vec<usize>,
    remaining: usize,
}

impl<'a> Combinations<'a> {
    pub fn new(grid: &'a HyperparameterGrid) -> Self {
        Self {
            grid,
            cursor: vec![0; grid.axes.len()],
            remaining: grid.combination_count().unwrap_or(usize::MAX),
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = ParamSet;

    fn next(&mut self) -> Option<ParamSet> {
        if self.remaining == 0 {
            return None;
        }

        let combo = self
            .grid
            .axes
            .iter()
            .zip(&self.cursor)
            .map(|(axis, &pos)| (axis.name.clone(), axis.values[pos].clone()))
            .collect();
        self.remaining -= 1;

        // Odometer step: bump the last axis, carry leftwards.
        for (axis, pos) in self.grid.axes.iter().zip(self.cursor.iter_mut()).rev() {
            *pos += 1;
            if *pos < axis.values.len() {
                break;
            }
            *pos = 0;
        }

        Some(combo)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Enumerate every combination of `grid` in order.
pub fn combinations(grid: &HyperparameterGrid) -> Combinations<'_> {
    Combinations::new(grid)
}
