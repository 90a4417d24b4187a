//! Exact deduplication of transforms.

use std::collections::HashMap;

use orange_math::VariantTransform;

use crate::id::TransformId;

/// Store transforms, reusing the id of a bitwise-identical one.
#[derive(Debug, Default)]
pub(crate) struct TransformInserter {
    transforms: Vec<VariantTransform>,
    ids: HashMap<Vec<u64>, TransformId>,
}

impl TransformInserter {
    /// Insert a transform, returning its id.
    pub fn insert(&mut self, transform: VariantTransform) -> TransformId {
        let next_id = TransformId::from_usize(self.transforms.len());
        let id = *self.ids.entry(key(&transform)).or_insert(next_id);
        if id == next_id {
            self.transforms.push(transform);
        }
        id
    }

    pub fn into_transforms(self) -> Vec<VariantTransform> {
        self.transforms
    }
}

fn key(transform: &VariantTransform) -> Vec<u64> {
    match transform {
        VariantTransform::NoTransformation => vec![0],
        VariantTransform::Translation { translation } => {
            std::iter::once(1).chain(translation.iter().map(|v| v.to_bits())).collect()
        }
        VariantTransform::Transformation {
            rotation,
            translation,
        } => std::iter::once(2)
            .chain(rotation.iter().chain(translation.iter()).map(|v| v.to_bits()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orange_math::{Axis, Real3};

    #[test]
    fn test_dedup() {
        let mut ins = TransformInserter::default();
        let a = ins.insert(VariantTransform::identity());
        let b = ins.insert(VariantTransform::translation(1.0, 2.0, 3.0));
        let c = ins.insert(VariantTransform::rotation(Axis::Z, 0.5, Real3::zeros()));
        assert_eq!(ins.insert(VariantTransform::identity()), a);
        assert_eq!(ins.insert(VariantTransform::translation(1.0, 2.0, 3.0)), b);
        assert_ne!(ins.insert(VariantTransform::translation(1.0, 2.0, 3.5)), b);
        assert_eq!(
            ins.insert(VariantTransform::rotation(Axis::Z, 0.5, Real3::zeros())),
            c
        );
        assert_eq!(ins.into_transforms().len(), 4);
    }
}
