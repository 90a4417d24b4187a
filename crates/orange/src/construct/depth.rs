//! Universe nesting depth.

use orange_ir::Label;

use crate::error::{OrangeError, Result};
use crate::id::UnivId;

/// Maximum number of levels below a universe, counting itself.
///
/// A universe that (indirectly) contains itself is an error.
#[derive(Debug)]
pub(crate) struct DepthCalculator<'a> {
    children: &'a [Vec<UnivId>],
    labels: &'a [Label],
    depths: Vec<Option<usize>>,
    visiting: Vec<bool>,
}

impl<'a> DepthCalculator<'a> {
    pub fn new(children: &'a [Vec<UnivId>], labels: &'a [Label]) -> Self {
        Self {
            children,
            labels,
            depths: vec![None; children.len()],
            visiting: vec![false; children.len()],
        }
    }

    /// Depth of the tree rooted at `univ`.
    pub fn calc(&mut self, univ: UnivId) -> Result<usize> {
        let u = univ.get();
        if let Some(depth) = self.depths[u] {
            return Ok(depth);
        }
        if self.visiting[u] {
            return Err(OrangeError::InvalidDaughter {
                label: self.labels[u].to_string(),
                universe: univ.unchecked_get(),
                reason: "universe contains itself".into(),
            });
        }

        self.visiting[u] = true;
        let mut max_child = 0;
        for &child in &self.children[u] {
            max_child = max_child.max(self.calc(child)?);
        }
        self.visiting[u] = false;

        let depth = max_child + 1;
        self.depths[u] = Some(depth);
        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[u32]) -> Vec<UnivId> {
        v.iter().map(|&i| UnivId::new(i)).collect()
    }

    #[test]
    fn test_depth() {
        let labels: Vec<Label> = ["a", "b", "c", "d"].map(Label::from).to_vec();
        let children = vec![ids(&[1, 2]), ids(&[3]), ids(&[]), ids(&[])];
        let mut calc = DepthCalculator::new(&children, &labels);
        assert_eq!(calc.calc(UnivId::new(0)).unwrap(), 3);
        assert_eq!(calc.calc(UnivId::new(2)).unwrap(), 1);
    }

    #[test]
    fn test_cycle() {
        let labels: Vec<Label> = ["a", "b", "c"].map(Label::from).to_vec();
        let children = vec![ids(&[1]), ids(&[2]), ids(&[1])];
        let err = DepthCalculator::new(&children, &labels)
            .calc(UnivId::new(0))
            .unwrap_err();
        assert!(err.to_string().contains("contains itself"));
    }
}
