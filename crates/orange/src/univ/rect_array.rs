//! Tracking inside a rectilinear array of cells.

use orange_geom::Sense;
use orange_math::{Axis, Real3, NO_INTERSECTION};

use super::{Initialization, Intersection, LocalState, OnLocalSurface};
use crate::data::RectArrayRecord;
use crate::id::{DaughterId, LocalSurfaceId, LocalVolumeId, RectArrayId};
use crate::params::OrangeParams;

/// Find cells and crossings in a rectilinear grid.
///
/// Every cell is filled by a daughter universe. The first and last planes
/// along each axis are infinite, so the array covers all of space.
#[derive(Debug, Clone, Copy)]
pub struct RectArrayTracker<'a> {
    record: &'a RectArrayRecord,
}

impl<'a> RectArrayTracker<'a> {
    /// Tracker for an array.
    pub fn new(params: &'a OrangeParams, id: RectArrayId) -> Self {
        Self {
            record: params.rect_array(id),
        }
    }

    /// Number of cells.
    pub fn num_volumes(&self) -> usize {
        self.record.num_volumes()
    }

    /// Number of grid planes.
    pub fn num_surfaces(&self) -> usize {
        self.record.num_surfaces()
    }

    /// Daughter filling a cell.
    pub fn daughter(&self, vol: LocalVolumeId) -> Option<DaughterId> {
        Some(self.record.daughters[vol.get()])
    }

    /// Find the cell containing a point.
    ///
    /// A point exactly on an interior grid plane is not located.
    pub fn initialize(&self, state: &mut LocalState<'_>) -> Initialization {
        debug_assert!(state.volume.is_none() && state.surface.is_none());

        let mut ijk = [0; 3];
        for ax in 0..3 {
            let grid = &self.record.grid[ax];
            let pos = state.pos[ax];
            let index = grid.partition_point(|&g| g <= pos).saturating_sub(1);
            if index > 0 && grid[index] == pos {
                return Initialization {
                    volume: None,
                    surface: Some(OnLocalSurface::new(
                        self.record.surface_id(ax, index),
                        Sense::Outside,
                    )),
                };
            }
            ijk[ax] = index.min(grid.len() - 2);
        }
        Initialization {
            volume: Some(self.record.volume_id(ijk)),
            surface: None,
        }
    }

    /// Move to the adjacent cell across the current plane.
    pub fn cross_boundary(&self, state: &mut LocalState<'_>) -> Initialization {
        let (Some(volume), Some(surface)) = (state.volume, state.surface) else {
            debug_assert!(false, "crossing requires a volume and surface");
            return Initialization::default();
        };

        let (ax, plane) = self.record.surface_axis_index(surface.id);
        let mut ijk = self.record.volume_ijk(volume);
        let cell = match surface.sense {
            Sense::Outside => Some(plane),
            Sense::Inside => plane.checked_sub(1),
        };
        let volume = match cell {
            Some(c) if c < self.record.dims()[ax] => {
                ijk[ax] = c;
                Some(self.record.volume_id(ijk))
            }
            _ => None,
        };
        Initialization {
            volume,
            surface: Some(surface),
        }
    }

    /// Distance to the nearest cell wall.
    pub fn intersect(&self, state: &mut LocalState<'_>) -> Intersection {
        self.intersect_impl(state, NO_INTERSECTION)
    }

    /// Distance to the nearest cell wall, up to a maximum.
    pub fn intersect_max(&self, state: &mut LocalState<'_>, max_dist: f64) -> Intersection {
        debug_assert!(max_dist > 0.0);
        let mut result = self.intersect_impl(state, max_dist);
        if !result.is_hit() {
            result.distance = max_dist;
        }
        result
    }

    /// Exact distance to the nearest cell wall.
    pub fn safety(&self, pos: &Real3, vol: LocalVolumeId) -> f64 {
        let ijk = self.record.volume_ijk(vol);
        let mut result = f64::INFINITY;
        for ax in 0..3 {
            let grid = &self.record.grid[ax];
            result = result
                .min(pos[ax] - grid[ijk[ax]])
                .min(grid[ijk[ax] + 1] - pos[ax]);
        }
        result.max(0.0)
    }

    /// Normal of a grid plane.
    pub fn normal(&self, _pos: &Real3, surf: LocalSurfaceId) -> Real3 {
        let (ax, _) = self.record.surface_axis_index(surf);
        Axis::ALL[ax].unit()
    }

    fn intersect_impl(&self, state: &LocalState<'_>, max_dist: f64) -> Intersection {
        let Some(volume) = state.volume else {
            debug_assert!(false, "intersection requires a volume");
            return Intersection::none();
        };
        let ijk = self.record.volume_ijk(volume);

        let mut result = Intersection::none();
        for ax in 0..3 {
            let dir = state.dir[ax];
            if dir == 0.0 {
                continue;
            }
            let (plane, sense) = if dir > 0.0 {
                (ijk[ax] + 1, Sense::Inside)
            } else {
                (ijk[ax], Sense::Outside)
            };
            let surface = self.record.surface_id(ax, plane);
            if state.surface.is_some_and(|s| s.id == surface) {
                continue;
            }
            let target = self.record.grid[ax][plane];
            if target.is_infinite() {
                continue;
            }
            let dist = ((target - state.pos[ax]) / dir).max(0.0);
            if dist < result.distance && dist <= max_dist {
                result = Intersection::new(OnLocalSurface::new(surface, sense), dist);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{TrackSlotId, UnivId};
    use crate::state::OrangeStateData;
    use crate::univ::Tracker;
    use approx::assert_relative_eq;
    use orange_ir::{DaughterInput, OrangeInput, RectArrayInput, UnitInput, VolumeInput, ZOrder};

    /// 2x1x3 array of empty units with planes at integers
    fn params() -> OrangeParams {
        let world = UnitInput {
            label: "world".into(),
            volumes: vec![VolumeInput::new("world", vec![], "*")
                .unwrap()
                .with_zorder(ZOrder::Exterior)],
            daughter_map: [(0, DaughterInput::new(1, Default::default()))].into_iter().collect(),
            ..Default::default()
        };
        let array = RectArrayInput {
            label: "arr".into(),
            grid: [
                vec![0.0, 1.0, 2.0],
                vec![0.0, 1.0],
                vec![0.0, 1.0, 2.0, 3.0],
            ],
            daughters: vec![DaughterInput::new(2, Default::default()); 6],
        };
        let fill = UnitInput {
            label: "fill".into(),
            volumes: vec![VolumeInput::new("fill", vec![], "*").unwrap()],
            ..Default::default()
        };
        OrangeParams::from_input(OrangeInput {
            universes: vec![world.into(), array.into(), fill.into()],
            ..Default::default()
        })
        .unwrap()
    }

    fn local<'t>(states: &'t mut OrangeStateData, pos: Real3, dir: Real3) -> LocalState<'t> {
        LocalState {
            pos,
            dir,
            volume: None,
            surface: None,
            temp: states.temp_scratch(TrackSlotId::new(0)),
        }
    }

    #[test]
    fn test_initialize() {
        let params = params();
        let mut states = OrangeStateData::new(&params, 1);
        let tracker = Tracker::new(&params, UnivId::new(1));
        assert_eq!(tracker.num_volumes(), 6);
        assert_eq!(tracker.num_surfaces(), 3 + 2 + 4);

        let init = tracker.initialize(&mut local(&mut states, Real3::new(1.5, 0.5, 2.5), Real3::x()));
        assert_eq!(init.volume, Some(LocalVolumeId::new(5)));

        // Beyond the outer planes
        let init = tracker.initialize(&mut local(&mut states, Real3::new(-3.0, 5.0, 9.0), Real3::x()));
        assert_eq!(init.volume, Some(LocalVolumeId::new(2)));

        let init = tracker.initialize(&mut local(&mut states, Real3::new(1.0, 0.5, 0.5), Real3::x()));
        assert_eq!(init.volume, None);
        assert!(init.surface.is_some());
    }

    #[test]
    fn test_intersect_and_cross() {
        let params = params();
        let mut states = OrangeStateData::new(&params, 1);
        let tracker = Tracker::new(&params, UnivId::new(1));

        let dir = Real3::new(1.0, 0.0, 1.0).normalize();
        let mut state = local(&mut states, Real3::new(0.5, 0.5, 0.25), dir);
        state.volume = Some(LocalVolumeId::new(0));
        let isect = tracker.intersect(&mut state);
        assert_relative_eq!(isect.distance, 0.5 * 2.0_f64.sqrt(), epsilon = 1e-12);
        let surface = isect.surface.unwrap();
        assert_eq!(surface.sense, Sense::Inside);
        assert_relative_eq!(tracker.normal(&state.pos, surface.id), Real3::x());

        // Cross the x plane into cell (1, 0, 0)
        state.pos += dir * isect.distance;
        state.surface = Some(OnLocalSurface::new(surface.id, surface.sense.flip()));
        let init = tracker.cross_boundary(&mut state);
        assert_eq!(init.volume, Some(LocalVolumeId::new(3)));

        // Back the other way
        state.surface = Some(OnLocalSurface::new(surface.id, Sense::Inside));
        state.volume = Some(LocalVolumeId::new(3));
        let init = tracker.cross_boundary(&mut state);
        assert_eq!(init.volume, Some(LocalVolumeId::new(0)));

        // Leaving through an infinite plane never happens
        let mut state = local(&mut states, Real3::new(1.5, 0.5, 2.5), Real3::x());
        state.volume = Some(LocalVolumeId::new(5));
        assert!(!tracker.intersect(&mut state).is_hit());
        assert_eq!(tracker.intersect_max(&mut state, 2.0).distance, 2.0);
    }

    #[test]
    fn test_safety() {
        let params = params();
        let tracker = Tracker::new(&params, UnivId::new(1));
        assert_relative_eq!(
            tracker.safety(&Real3::new(0.5, 0.75, 1.4), LocalVolumeId::new(1)),
            0.4
        );
        // Unbounded along y
        assert_relative_eq!(
            tracker.safety(&Real3::new(1.75, 100.0, 5.0), LocalVolumeId::new(5)),
            0.75
        );
        assert_eq!(
            tracker.daughter(LocalVolumeId::new(4)),
            Some(DaughterId::new(5))
        );
    }
}
