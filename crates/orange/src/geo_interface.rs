//! Navigation interface shared by geometry implementations.

use orange_math::Real3;

use crate::id::{TrackSlotId, UnivLevelId, VolumeId, VolumeInstanceId};
use crate::state::Propagation;

/// Starting point of a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTrackInitializer {
    /// Global position; ignored when copying from a parent.
    pub pos: Real3,
    /// Global unit direction.
    pub dir: Real3,
    /// Slot whose state is copied instead of locating `pos`.
    pub parent: Option<TrackSlotId>,
}

impl GeoTrackInitializer {
    /// Locate a new track at a point.
    pub fn new(pos: Real3, dir: Real3) -> Self {
        Self {
            pos,
            dir,
            parent: None,
        }
    }

    /// Start a secondary at its parent's location with a new direction.
    pub fn from_parent(parent: TrackSlotId, dir: Real3) -> Self {
        Self {
            pos: Real3::zeros(),
            dir,
            parent: Some(parent),
        }
    }
}

/// Operations a transport loop needs from the geometry.
///
/// A caller alternates step searches with moves:
///
/// ```ignore
/// let step = geo.find_next_step();
/// if step.boundary {
///     geo.move_to_boundary();
///     geo.cross_boundary();
/// } else {
///     geo.move_internal(step.distance);
/// }
/// ```
pub trait GeoTrackInterface {
    /// Start a track.
    fn assign(&mut self, init: &GeoTrackInitializer);

    /// Global position.
    fn pos(&self) -> Real3;

    /// Global direction.
    fn dir(&self) -> Real3;

    /// Current volume.
    fn volume_id(&self) -> VolumeId;

    /// Placement of the current volume.
    fn volume_instance_id(&self) -> Option<VolumeInstanceId>;

    /// Depth in the universe hierarchy.
    fn level(&self) -> UnivLevelId;

    /// Whether the track has left the world.
    fn is_outside(&self) -> bool;

    /// Whether the track is on a surface.
    fn is_on_boundary(&self) -> bool;

    /// Whether the geometry could not locate the track.
    fn failed(&self) -> bool;

    /// Distance to the next boundary.
    fn find_next_step(&mut self) -> Propagation;

    /// Distance to the next boundary or `max_step`, whichever is smaller.
    fn find_next_step_max(&mut self, max_step: f64) -> Propagation;

    /// Distance in any direction that is guaranteed boundary-free.
    fn find_safety(&self) -> f64;

    /// Safety distance capped at `max_step`.
    fn find_safety_max(&self, max_step: f64) -> f64;

    /// Move to the boundary found by the step search.
    fn move_to_boundary(&mut self);

    /// Move part of the way to the next boundary.
    fn move_internal(&mut self, dist: f64);

    /// Move to a nearby point in the current volume.
    fn move_internal_to(&mut self, pos: &Real3);

    /// Enter the volume across the current surface.
    fn cross_boundary(&mut self);

    /// Change direction.
    fn set_dir(&mut self, newdir: &Real3);

    /// Surface normal pointing out of the current volume.
    fn normal(&self) -> Real3;
}
