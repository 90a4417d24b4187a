#![warn(missing_docs)]

//! ORANGE: Oak Ridge Advanced Nested Geometry Engine.
//!
//! Navigation of particle tracks through constructive solid geometry.
//! Volumes are boolean combinations of the half-spaces of analytic
//! surfaces, grouped into universes that can be placed inside the
//! volumes of other universes. A track view finds the distance to the
//! next boundary, moves to it, and determines the volume on the other
//! side, without ever tessellating the geometry.
//!
//! # Architecture
//!
//! - [`OrangeParams`] - immutable navigation tables built from input
//! - [`OrangeStateData`] - per-track mutable state for many tracks
//! - [`OrangeTrackView`] - the navigation operations for one track
//! - [`univ`] - per-universe trackers for CSG units and rect arrays
//! - [`bih`] - bounding interval hierarchy for point and ray queries
//!
//! # Example
//!
//! ```ignore
//! use orange::{GeoTrackInitializer, OrangeParams, OrangeStateData, OrangeTrackView};
//! use orange::id::TrackSlotId;
//! use orange_math::Real3;
//!
//! let params = OrangeParams::from_json(&std::fs::read_to_string("geo.json")?)?;
//! let mut states = OrangeStateData::new(&params, 1);
//! let mut geo = OrangeTrackView::new(&params, &mut states, TrackSlotId::new(0));
//! geo.assign(&GeoTrackInitializer::new(Real3::zeros(), Real3::x()));
//!
//! while !geo.is_outside() {
//!     let step = geo.find_next_step_max(10.0);
//!     if step.boundary {
//!         geo.move_to_boundary();
//!         geo.cross_boundary();
//!     } else {
//!         geo.move_internal(step.distance);
//!     }
//! }
//! ```

pub mod bih;
mod construct;
pub mod data;
mod error;
mod geo_interface;
pub mod id;
pub mod indexer;
pub mod label;
mod level;
mod options;
mod params;
mod state;
mod track_view;
pub mod univ;

pub use error::{OrangeError, Result};
pub use geo_interface::{GeoTrackInitializer, GeoTrackInterface};
pub use id::{SurfaceId, TrackSlotId, UnivId, UnivLevelId, VolumeId, VolumeInstanceId};
pub use label::{Label, LabelIdMultiMap};
pub use level::LevelStateAccessor;
pub use options::OrangeOptions;
pub use params::OrangeParams;
pub use state::{BoundaryResult, OrangeStateData, Propagation};
pub use track_view::OrangeTrackView;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_safety() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OrangeParams>();
        assert_send_sync::<OrangeStateData>();
    }
}
