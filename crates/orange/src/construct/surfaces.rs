//! Exact deduplication of surfaces within a unit.

use std::collections::HashMap;

use orange_geom::{Surface, SurfaceType, VariantSurface};
use orange_ir::Label;

use crate::id::LocalSurfaceId;

/// Unique surfaces and the mapping from input indices.
#[derive(Debug, Default)]
pub(crate) struct UniqueSurfaces {
    pub surfaces: Vec<VariantSurface>,
    pub labels: Vec<Label>,
    /// New id for each input surface.
    pub remap: Vec<LocalSurfaceId>,
}

/// Collapse bitwise-identical surfaces onto their first occurrence.
///
/// Surfaces without a label get an empty name. Every label's extension is
/// the unit name.
pub(crate) fn dedup_surfaces(
    surfaces: Vec<VariantSurface>,
    labels: &[Label],
    unit_name: &str,
) -> UniqueSurfaces {
    let mut result = UniqueSurfaces::default();
    let mut ids: HashMap<(SurfaceType, Vec<u64>), LocalSurfaceId> = HashMap::new();

    for (i, surface) in surfaces.into_iter().enumerate() {
        let key = (
            surface.surface_type(),
            surface.data().iter().map(|v| v.to_bits()).collect(),
        );
        let next_id = LocalSurfaceId::from_usize(result.surfaces.len());
        let id = *ids.entry(key).or_insert(next_id);
        if id == next_id {
            let name = labels.get(i).map(|l| l.name.clone()).unwrap_or_default();
            result.surfaces.push(surface);
            result.labels.push(Label::new(name, unit_name));
        }
        result.remap.push(id);
    }

    let num_dupes = result.remap.len() - result.surfaces.len();
    if num_dupes > 0 {
        tracing::debug!(unit = unit_name, count = num_dupes, "merged duplicate surfaces");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use orange_geom::{PlaneAligned, SphereCentered};
    use orange_math::Axis;

    #[test]
    fn test_dedup() {
        let surfaces: Vec<VariantSurface> = vec![
            PlaneAligned::new(Axis::X, 1.0).into(),
            SphereCentered::new(2.0).into(),
            PlaneAligned::new(Axis::Y, 1.0).into(),
            PlaneAligned::new(Axis::X, 1.0).into(),
        ];
        let labels = vec![Label::from("a"), Label::from("b")];
        let unique = dedup_surfaces(surfaces, &labels, "u");
        assert_eq!(unique.surfaces.len(), 3);
        let remap: Vec<usize> = unique.remap.iter().map(|s| s.get()).collect();
        assert_eq!(remap, vec![0, 1, 2, 0]);
        assert_eq!(unique.labels[0], Label::new("a", "u"));
        assert_eq!(unique.labels[2], Label::new("", "u"));
    }
}
