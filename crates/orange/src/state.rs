//! Per-track navigation state.
//!
//! State is stored as flat arrays so that one allocation serves every
//! track: rows of `(slot, level)` for positions, directions, volumes and
//! universes, and one entry per slot for everything else. A
//! [`OrangeTrackView`](crate::OrangeTrackView) reads and writes a single
//! slot.

use orange_geom::Sense;
use orange_math::{Real3, NO_INTERSECTION};

use crate::id::{FaceId, LocalSurfaceId, LocalVolumeId, TrackSlotId, UnivId, UnivLevelId};
use crate::params::OrangeParams;
use crate::univ::TempScratch;

/// Whether a track on a boundary is still leaving its volume.
///
/// Changing direction while on a boundary can turn a pending crossing
/// back into the current volume; crossing is then a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundaryResult {
    /// A crossing is pending: the track is heading out of its volume.
    Exiting,
    /// No crossing is pending: the track is heading into its volume.
    #[default]
    Reentrant,
}

impl BoundaryResult {
    /// The other value.
    pub fn flip(self) -> Self {
        match self {
            Self::Exiting => Self::Reentrant,
            Self::Reentrant => Self::Exiting,
        }
    }
}

/// Result of a step search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Propagation {
    /// Distance to the boundary or to the step limit.
    pub distance: f64,
    /// Whether the distance ends on a boundary.
    pub boundary: bool,
}

/// Storage for all tracks.
#[derive(Debug, Clone)]
pub struct OrangeStateData {
    num_tracks: usize,
    max_depth: usize,
    max_faces: usize,
    max_isect: usize,

    // Per slot and level
    pub(crate) pos: Vec<Real3>,
    pub(crate) dir: Vec<Real3>,
    pub(crate) vol: Vec<LocalVolumeId>,
    pub(crate) univ: Vec<UnivId>,

    // Per slot
    pub(crate) level: Vec<UnivLevelId>,
    pub(crate) surface_level: Vec<UnivLevelId>,
    pub(crate) surf: Vec<LocalSurfaceId>,
    pub(crate) sense: Vec<Sense>,
    pub(crate) boundary: Vec<BoundaryResult>,
    pub(crate) next_step: Vec<f64>,
    pub(crate) next_surf: Vec<LocalSurfaceId>,
    pub(crate) next_sense: Vec<Sense>,
    pub(crate) next_level: Vec<UnivLevelId>,
    pub(crate) failed: Vec<bool>,

    // Scratch
    temp_sense: Vec<Sense>,
    temp_isect: Vec<(f64, FaceId)>,
}

impl OrangeStateData {
    /// Allocate state for a number of tracks.
    pub fn new(params: &OrangeParams, num_tracks: usize) -> Self {
        debug_assert!(num_tracks > 0);
        let scalars = params.scalars();
        let max_depth = scalars.max_depth.max(1);
        let rows = num_tracks * max_depth;
        Self {
            num_tracks,
            max_depth,
            max_faces: scalars.max_faces,
            max_isect: scalars.max_intersections,
            pos: vec![Real3::zeros(); rows],
            dir: vec![Real3::zeros(); rows],
            vol: vec![LocalVolumeId::null(); rows],
            univ: vec![UnivId::null(); rows],
            level: vec![UnivLevelId::null(); num_tracks],
            surface_level: vec![UnivLevelId::null(); num_tracks],
            surf: vec![LocalSurfaceId::null(); num_tracks],
            sense: vec![Sense::Outside; num_tracks],
            boundary: vec![BoundaryResult::default(); num_tracks],
            next_step: vec![0.0; num_tracks],
            next_surf: vec![LocalSurfaceId::null(); num_tracks],
            next_sense: vec![Sense::Outside; num_tracks],
            next_level: vec![UnivLevelId::null(); num_tracks],
            failed: vec![false; num_tracks],
            temp_sense: vec![Sense::Outside; num_tracks * scalars.max_faces],
            temp_isect: vec![(NO_INTERSECTION, FaceId::null()); num_tracks * scalars.max_intersections],
        }
    }

    /// Number of track slots.
    pub fn size(&self) -> usize {
        self.num_tracks
    }

    /// Number of levels per slot.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Row of a slot and level.
    #[inline]
    pub(crate) fn index(&self, slot: TrackSlotId, level: UnivLevelId) -> usize {
        debug_assert!(slot.get() < self.num_tracks);
        debug_assert!(level.get() < self.max_depth, "level exceeds geometry depth");
        slot.get() * self.max_depth + level.get()
    }

    /// Scratch space of a slot.
    pub fn temp_scratch(&mut self, slot: TrackSlotId) -> TempScratch<'_> {
        let s = slot.get();
        debug_assert!(s < self.num_tracks);
        let senses = &mut self.temp_sense[s * self.max_faces..(s + 1) * self.max_faces];
        let isect = &mut self.temp_isect[s * self.max_isect..(s + 1) * self.max_isect];
        TempScratch { senses, isect }
    }
}
