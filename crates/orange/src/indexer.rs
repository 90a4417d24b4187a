//! Conversion between universe-local and global surface/volume ids.

use serde::{Deserialize, Serialize};

use crate::id::{LocalSurfaceId, LocalVolumeId, SurfaceId, UnivId, VolumeId};

/// Prefix sums of the number of surfaces and volumes in each universe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseIndexer {
    surfaces: Vec<usize>,
    volumes: Vec<usize>,
}

impl UniverseIndexer {
    /// Build from per-universe counts.
    pub fn new(num_surfaces: &[usize], num_volumes: &[usize]) -> Self {
        debug_assert_eq!(num_surfaces.len(), num_volumes.len());
        fn prefix(counts: &[usize]) -> Vec<usize> {
            let mut result = Vec::with_capacity(counts.len() + 1);
            let mut total = 0;
            result.push(total);
            for &c in counts {
                total += c;
                result.push(total);
            }
            result
        }
        Self {
            surfaces: prefix(num_surfaces),
            volumes: prefix(num_volumes),
        }
    }

    /// Number of universes.
    pub fn num_universes(&self) -> usize {
        self.volumes.len().saturating_sub(1)
    }

    /// Total number of surfaces.
    pub fn num_surfaces(&self) -> usize {
        self.surfaces.last().copied().unwrap_or(0)
    }

    /// Total number of volumes.
    pub fn num_volumes(&self) -> usize {
        self.volumes.last().copied().unwrap_or(0)
    }

    /// Number of surfaces in one universe.
    pub fn num_local_surfaces(&self, univ: UnivId) -> usize {
        self.surfaces[univ.get() + 1] - self.surfaces[univ.get()]
    }

    /// Number of volumes in one universe.
    pub fn num_local_volumes(&self, univ: UnivId) -> usize {
        self.volumes[univ.get() + 1] - self.volumes[univ.get()]
    }

    /// Global id of a local surface.
    pub fn global_surface(&self, univ: UnivId, local: LocalSurfaceId) -> SurfaceId {
        debug_assert!(local.get() < self.num_local_surfaces(univ));
        SurfaceId::from_usize(self.surfaces[univ.get()] + local.get())
    }

    /// Global id of a local volume.
    pub fn global_volume(&self, univ: UnivId, local: LocalVolumeId) -> VolumeId {
        debug_assert!(local.get() < self.num_local_volumes(univ));
        VolumeId::from_usize(self.volumes[univ.get()] + local.get())
    }

    /// Universe and local id of a global surface.
    pub fn local_surface(&self, id: SurfaceId) -> (UnivId, LocalSurfaceId) {
        let (univ, local) = find_local(&self.surfaces, id.get());
        (univ, LocalSurfaceId::from_usize(local))
    }

    /// Universe and local id of a global volume.
    pub fn local_volume(&self, id: VolumeId) -> (UnivId, LocalVolumeId) {
        let (univ, local) = find_local(&self.volumes, id.get());
        (univ, LocalVolumeId::from_usize(local))
    }
}

// Universes with zero items share an offset with their successor, so take
// the last offset not greater than the index.
fn find_local(offsets: &[usize], index: usize) -> (UnivId, usize) {
    debug_assert!(index < offsets.last().copied().unwrap_or(0));
    let univ = offsets.partition_point(|&off| off <= index) - 1;
    (UnivId::from_usize(univ), index - offsets[univ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing() {
        let ui = UniverseIndexer::new(&[4, 1, 0, 1], &[2, 1, 3, 1]);
        assert_eq!(ui.num_universes(), 4);
        assert_eq!(ui.num_surfaces(), 6);
        assert_eq!(ui.num_volumes(), 7);
        assert_eq!(ui.num_local_surfaces(UnivId::new(2)), 0);

        assert_eq!(
            ui.global_surface(UnivId::new(1), LocalSurfaceId::new(0)),
            SurfaceId::new(4)
        );
        assert_eq!(
            ui.global_volume(UnivId::new(2), LocalVolumeId::new(2)),
            VolumeId::new(5)
        );

        assert_eq!(
            ui.local_surface(SurfaceId::new(5)),
            (UnivId::new(3), LocalSurfaceId::new(0))
        );
        assert_eq!(
            ui.local_volume(VolumeId::new(3)),
            (UnivId::new(2), LocalVolumeId::new(0))
        );
        assert_eq!(
            ui.local_volume(VolumeId::new(1)),
            (UnivId::new(0), LocalVolumeId::new(1))
        );
    }

    #[test]
    fn test_round_trip() {
        let ui = UniverseIndexer::new(&[3, 0, 2], &[1, 4, 2]);
        for v in 0..ui.num_volumes() {
            let (univ, local) = ui.local_volume(VolumeId::from_usize(v));
            assert_eq!(ui.global_volume(univ, local).get(), v);
        }
        for s in 0..ui.num_surfaces() {
            let (univ, local) = ui.local_surface(SurfaceId::from_usize(s));
            assert_eq!(ui.global_surface(univ, local).get(), s);
        }
    }
}
