//! Insertion of rectilinear arrays.

use orange_ir::{Label, RectArrayInput};
use orange_math::Axis;

use super::{UniverseInserter, UniverseLabels};
use crate::data::{RectArrayRecord, UnivType};
use crate::error::{OrangeError, Result};
use crate::id::UnivId;

/// Validate an array and convert it to a [`RectArrayRecord`].
pub(crate) struct RectArrayInserter<'a> {
    univ: &'a mut UniverseInserter,
}

impl<'a> RectArrayInserter<'a> {
    pub fn new(univ: &'a mut UniverseInserter) -> Self {
        Self { univ }
    }

    /// Insert an array, returning its universe id.
    pub fn insert(&mut self, input: RectArrayInput) -> Result<UnivId> {
        let RectArrayInput {
            label,
            mut grid,
            daughters,
        } = input;

        for (ax, g) in grid.iter().enumerate() {
            let axis = Axis::ALL[ax].to_char();
            let reason = if g.len() < 2 {
                format!("grid along {axis} needs at least two planes")
            } else if !g.windows(2).all(|w| w[0] < w[1]) {
                format!("grid along {axis} is not sorted")
            } else {
                continue;
            };
            return Err(OrangeError::InvalidRectArray {
                label: label.to_string(),
                reason,
            });
        }

        let dims = grid.each_ref().map(|g| g.len() - 1);
        let num_cells: usize = dims.iter().product();
        if daughters.len() != num_cells {
            return Err(OrangeError::DaughterCountMismatch {
                label: label.to_string(),
                expected: num_cells,
                actual: daughters.len(),
            });
        }

        // The array fills all space
        for g in grid.iter_mut() {
            let last = g.len() - 1;
            g[0] = f64::NEG_INFINITY;
            g[last] = f64::INFINITY;
        }

        let mut surface_offsets = [0; 4];
        for ax in 0..3 {
            surface_offsets[ax + 1] = surface_offsets[ax] + grid[ax].len();
        }

        let daughters = daughters
            .into_iter()
            .map(|d| self.univ.insert_daughter(&label, d))
            .collect::<Result<Vec<_>>>()?;

        let mut volume_labels = Vec::with_capacity(num_cells);
        for i in 0..dims[0] {
            for j in 0..dims[1] {
                for k in 0..dims[2] {
                    volume_labels.push(Label::new(format!("{{{i},{j},{k}}}"), &label.name));
                }
            }
        }
        let mut surface_labels = Vec::with_capacity(surface_offsets[3]);
        for (ax, g) in grid.iter().enumerate() {
            let axis = Axis::ALL[ax].to_char();
            for idx in 0..g.len() {
                surface_labels.push(Label::new(format!("{{{axis},{idx}}}"), &label.name));
            }
        }

        let data = &mut self.univ.data;
        data.rect_arrays.push(RectArrayRecord {
            grid,
            daughters,
            surface_offsets,
        });
        let index = data.rect_arrays.len() - 1;
        Ok(self.univ.push_universe(
            UnivType::RectArray,
            index,
            label,
            UniverseLabels {
                surfaces: surface_labels,
                volumes: volume_labels,
                instance_ids: vec![None; num_cells],
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OrangeOptions;
    use orange_ir::DaughterInput;
    use orange_math::Tolerance;

    fn inserter() -> UniverseInserter {
        UniverseInserter::new(OrangeOptions::default(), Tolerance::default(), 2)
    }

    fn array() -> RectArrayInput {
        RectArrayInput {
            label: "arr".into(),
            grid: [vec![0.0, 1.0, 2.0], vec![-1.0, 1.0], vec![0.0, 3.0]],
            daughters: vec![DaughterInput::new(1, Default::default()); 2],
        }
    }

    #[test]
    fn test_insert() {
        let mut univ = inserter();
        RectArrayInserter::new(&mut univ).insert(array()).unwrap();

        let rec = &univ.data.rect_arrays[0];
        assert_eq!(rec.grid[0], vec![f64::NEG_INFINITY, 1.0, f64::INFINITY]);
        assert_eq!(rec.surface_offsets, [0, 3, 5, 7]);
        assert_eq!(rec.daughters.len(), 2);
        assert_eq!(univ.data.volume_labels[1], Label::new("{1,0,0}", "arr"));
        assert_eq!(univ.data.surface_labels[4], Label::new("{y,1}", "arr"));
        assert_eq!(univ.data.num_volumes, vec![2]);
    }

    #[test]
    fn test_invalid() {
        let mut bad = array();
        bad.grid[1] = vec![1.0];
        let err = RectArrayInserter::new(&mut inserter()).insert(bad).unwrap_err();
        assert!(err.to_string().contains("at least two"));

        let mut bad = array();
        bad.grid[2] = vec![3.0, 0.0];
        let err = RectArrayInserter::new(&mut inserter()).insert(bad).unwrap_err();
        assert!(err.to_string().contains("not sorted"));

        let mut bad = array();
        bad.daughters.pop();
        let err = RectArrayInserter::new(&mut inserter()).insert(bad).unwrap_err();
        assert!(matches!(
            err,
            OrangeError::DaughterCountMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }
}
