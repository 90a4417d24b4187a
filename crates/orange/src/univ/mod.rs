//! Per-universe trackers.
//!
//! A tracker answers geometric questions inside a single universe, in that
//! universe's local coordinates: which volume contains a point, where a ray
//! leaves the current volume, which volume lies across a surface, and how
//! far the nearest boundary is. The track view composes them across levels.
//!
//! Trackers are selected by universe type through the closed [`Tracker`]
//! enum rather than a trait object.

use orange_geom::Sense;
use orange_math::{Real3, NO_INTERSECTION};

use crate::data::UnivType;
use crate::id::{
    DaughterId, FaceId, LocalSurfaceId, LocalVolumeId, RectArrayId, SimpleUnitId, UnivId,
};
use crate::params::OrangeParams;

pub mod logic_eval;
mod rect_array;
mod simple;

pub use rect_array::RectArrayTracker;
pub use simple::SimpleUnitTracker;

/// A local surface and the sense of a point on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnLocalSurface {
    /// Surface the point is on.
    pub id: LocalSurfaceId,
    /// Logical side of the surface.
    pub sense: Sense,
}

impl OnLocalSurface {
    /// Create from a surface and sense.
    pub fn new(id: LocalSurfaceId, sense: Sense) -> Self {
        Self { id, sense }
    }
}

/// Per-track scratch space for intersection queries.
///
/// Contents are meaningless between calls.
#[derive(Debug)]
pub struct TempScratch<'a> {
    /// Face senses of the volume being tested.
    pub senses: &'a mut [Sense],
    /// Valid crossing distances and their faces.
    pub isect: &'a mut [(f64, FaceId)],
}

/// Local position and logical state of a track in one universe.
#[derive(Debug)]
pub struct LocalState<'a> {
    /// Position in the universe's frame.
    pub pos: Real3,
    /// Direction in the universe's frame.
    pub dir: Real3,
    /// Current volume, unknown when initializing.
    pub volume: Option<LocalVolumeId>,
    /// Surface the track is on, if any.
    pub surface: Option<OnLocalSurface>,
    /// Scratch space.
    pub temp: TempScratch<'a>,
}

/// Result of locating a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Initialization {
    /// Volume containing the point, if found.
    pub volume: Option<LocalVolumeId>,
    /// Surface the point is on, if any.
    pub surface: Option<OnLocalSurface>,
}

/// Nearest boundary crossing along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Crossed surface and its *pre*-crossing sense, if any.
    pub surface: Option<OnLocalSurface>,
    /// Distance to the crossing.
    pub distance: f64,
}

impl Intersection {
    /// A crossing at a distance.
    pub fn new(surface: OnLocalSurface, distance: f64) -> Self {
        Self {
            surface: Some(surface),
            distance,
        }
    }

    /// No crossing.
    pub fn none() -> Self {
        Self {
            surface: None,
            distance: NO_INTERSECTION,
        }
    }

    /// Whether a surface is crossed.
    pub fn is_hit(&self) -> bool {
        self.surface.is_some()
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Self::none()
    }
}

/// Tracker for any universe type.
#[derive(Debug, Clone, Copy)]
pub enum Tracker<'a> {
    /// CSG unit.
    Simple(SimpleUnitTracker<'a>),
    /// Voxel array.
    RectArray(RectArrayTracker<'a>),
}

macro_rules! dispatch {
    ($self:ident, $t:ident => $e:expr) => {
        match $self {
            Tracker::Simple($t) => $e,
            Tracker::RectArray($t) => $e,
        }
    };
}

impl<'a> Tracker<'a> {
    /// Tracker for a universe.
    pub fn new(params: &'a OrangeParams, univ: UnivId) -> Self {
        let index = params.univ_index(univ);
        match params.univ_type(univ) {
            UnivType::Simple => {
                Tracker::Simple(SimpleUnitTracker::new(params, SimpleUnitId::from_usize(index)))
            }
            UnivType::RectArray => {
                Tracker::RectArray(RectArrayTracker::new(params, RectArrayId::from_usize(index)))
            }
        }
    }

    /// Number of local volumes.
    pub fn num_volumes(&self) -> usize {
        dispatch!(self, t => t.num_volumes())
    }

    /// Number of local surfaces.
    pub fn num_surfaces(&self) -> usize {
        dispatch!(self, t => t.num_surfaces())
    }

    /// Daughter universe embedded in a volume.
    pub fn daughter(&self, vol: LocalVolumeId) -> Option<DaughterId> {
        dispatch!(self, t => t.daughter(vol))
    }

    /// Find the volume containing a point.
    pub fn initialize(&self, state: &mut LocalState<'_>) -> Initialization {
        dispatch!(self, t => t.initialize(state))
    }

    /// Find the volume across the current surface.
    pub fn cross_boundary(&self, state: &mut LocalState<'_>) -> Initialization {
        dispatch!(self, t => t.cross_boundary(state))
    }

    /// Nearest exiting crossing at any distance.
    pub fn intersect(&self, state: &mut LocalState<'_>) -> Intersection {
        dispatch!(self, t => t.intersect(state))
    }

    /// Nearest exiting crossing no further than `max_dist`.
    ///
    /// Without a crossing the distance is `max_dist`.
    pub fn intersect_max(&self, state: &mut LocalState<'_>, max_dist: f64) -> Intersection {
        dispatch!(self, t => t.intersect_max(state, max_dist))
    }

    /// Lower bound on the distance to the volume boundary.
    pub fn safety(&self, pos: &Real3, vol: LocalVolumeId) -> f64 {
        dispatch!(self, t => t.safety(pos, vol))
    }

    /// Surface normal at a point.
    pub fn normal(&self, pos: &Real3, surf: LocalSurfaceId) -> Real3 {
        dispatch!(self, t => t.normal(pos, surf))
    }
}
