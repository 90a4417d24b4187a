//! Tracking inside a CSG unit.

use orange_geom::{Sense, SignedSense, Surface, SurfaceState};
use orange_math::{Real3, NO_INTERSECTION};

use super::logic_eval::evaluate;
use super::{Initialization, Intersection, LocalState, OnLocalSurface, TempScratch};
use crate::bih::{BihEnclosingFinder, BihIntersectingFinder};
use crate::data::{SimpleUnitRecord, VolumeRecord};
use crate::id::{DaughterId, FaceId, LocalSurfaceId, LocalVolumeId, SimpleUnitId};
use crate::params::OrangeParams;

/// Find volumes and crossings in a unit of CSG volumes.
///
/// Point location goes through the BIH; boundary crossing only tests the
/// volumes connected to the crossed surface. Volumes with internal
/// surfaces are tracked by stepping through every face crossing in order
/// until the volume's logic changes.
#[derive(Debug, Clone, Copy)]
pub struct SimpleUnitTracker<'a> {
    params: &'a OrangeParams,
    unit: &'a SimpleUnitRecord,
}

impl<'a> SimpleUnitTracker<'a> {
    /// Tracker for a unit.
    pub fn new(params: &'a OrangeParams, id: SimpleUnitId) -> Self {
        Self {
            params,
            unit: params.simple_unit(id),
        }
    }

    /// Number of local volumes.
    pub fn num_volumes(&self) -> usize {
        self.unit.volumes.len()
    }

    /// Number of local surfaces.
    pub fn num_surfaces(&self) -> usize {
        self.unit.surfaces.len()
    }

    /// Unit record.
    pub fn unit_record(&self) -> &'a SimpleUnitRecord {
        self.unit
    }

    /// Daughter universe embedded in a volume.
    pub fn daughter(&self, vol: LocalVolumeId) -> Option<DaughterId> {
        self.unit.volume(vol).daughter_id
    }

    /// Find the local volume from a position.
    ///
    /// A point exactly on a face of the volume containing it is not
    /// located: the result has no volume and reports the surface.
    pub fn initialize(&self, state: &mut LocalState<'_>) -> Initialization {
        debug_assert!(state.volume.is_none() && state.surface.is_none());

        let pos = state.pos;
        let mut on_face = None;
        let found = BihEnclosingFinder::new(&self.unit.bih_tree).find(&pos, |id| {
            on_face = None;
            self.is_inside(id, &pos, None, &mut on_face)
        });

        match (found, on_face) {
            (Some(_), Some(surf)) => Initialization {
                volume: None,
                surface: Some(OnLocalSurface::new(surf, SignedSense::On.to_sense())),
            },
            (Some(volume), None) => Initialization {
                volume: Some(volume),
                surface: None,
            },
            (None, _) => Initialization {
                volume: self.unit.background,
                surface: None,
            },
        }
    }

    /// Find the volume on the other side of the current surface.
    ///
    /// The state's surface sense must already be the post-crossing sense.
    pub fn cross_boundary(&self, state: &mut LocalState<'_>) -> Initialization {
        let (Some(current), Some(surface)) = (state.volume, state.surface) else {
            debug_assert!(false, "crossing requires a volume and surface");
            return Initialization::default();
        };

        let pos = state.pos;
        let mut on_face = None;
        let mut is_inside = |id: LocalVolumeId| {
            id != current && self.is_inside(id, &pos, Some(surface), &mut on_face)
        };

        let neighbors = &self.unit.connectivity[surface.id.get()];
        let found = if neighbors.len() < 3 {
            neighbors.iter().copied().find(|&id| is_inside(id))
        } else {
            BihEnclosingFinder::new(&self.unit.bih_tree).find(&pos, is_inside)
        };

        Initialization {
            volume: found.or(self.unit.background),
            surface: Some(surface),
        }
    }

    /// Distance to the nearest exiting face.
    pub fn intersect(&self, state: &mut LocalState<'_>) -> Intersection {
        self.intersect_impl(state, NO_INTERSECTION)
    }

    /// Distance to the nearest exiting face, up to a maximum.
    pub fn intersect_max(&self, state: &mut LocalState<'_>, max_dist: f64) -> Intersection {
        debug_assert!(max_dist > 0.0);
        let mut result = self.intersect_impl(state, max_dist);
        if !result.is_hit() {
            result.distance = max_dist;
        }
        result
    }

    /// Closest distance to a boundary in any direction.
    ///
    /// Volumes whose faces don't all support an exact distance use their
    /// inner bounding zone if the point is in it, and zero otherwise.
    pub fn safety(&self, pos: &Real3, vol_id: LocalVolumeId) -> f64 {
        let vol = self.unit.volume(vol_id);
        if vol.is_implicit() {
            return self.background_safety(pos);
        }
        if !vol.flags.supports_simple_safety() {
            return self.obz_safety(pos, vol);
        }

        let result = vol
            .faces
            .iter()
            .map(|&s| self.unit.surface(s).calc_safety(pos).unwrap_or(0.0))
            .fold(f64::INFINITY, f64::min);
        debug_assert!(result >= 0.0);
        result.max(0.0)
    }

    /// Outward normal of a surface.
    pub fn normal(&self, pos: &Real3, surf: LocalSurfaceId) -> Real3 {
        self.unit.surface(surf).calc_normal(pos)
    }

    //// HELPERS ////

    /// Evaluate a volume's logic at a point.
    ///
    /// `fixed` overrides the sense of one surface. A face the point lies
    /// exactly on counts as outside and is saved in `on_face`.
    fn is_inside(
        &self,
        id: LocalVolumeId,
        pos: &Real3,
        fixed: Option<OnLocalSurface>,
        on_face: &mut Option<LocalSurfaceId>,
    ) -> bool {
        let vol = self.unit.volume(id);
        if let Some(obz_id) = vol.obz_id {
            let obz = self.params.obz(obz_id);
            let local = self.params.transform(obz.trans_id).transform_down(pos);
            if obz.is_outside_outer(&local) {
                return false;
            }
        }
        evaluate(&vol.logic, |face| {
            let surf = vol.get_surface(face);
            if let Some(fixed) = fixed.filter(|f| f.id == surf) {
                return fixed.sense == Sense::Outside;
            }
            match self.unit.surface(surf).calc_sense(pos) {
                SignedSense::On => {
                    on_face.get_or_insert(surf);
                    true
                }
                ss => ss == SignedSense::Outside,
            }
        })
    }

    fn intersect_impl(&self, state: &mut LocalState<'_>, max_dist: f64) -> Intersection {
        let Some(vol_id) = state.volume else {
            debug_assert!(false, "intersection requires a volume");
            return Intersection::none();
        };
        let vol = self.unit.volume(vol_id);
        if vol.is_implicit() {
            return self.background_intersect(state, max_dist);
        }

        let on_face = state.surface.and_then(|s| vol.find_face(s.id));
        let num_isect = self.calc_intersections(vol, state, on_face, max_dist);
        if num_isect == 0 {
            return Intersection::none();
        }
        if vol.flags.simple_intersection() {
            return self.simple_intersect(vol, state, num_isect);
        }
        self.complex_intersect(
            vol,
            &state.pos,
            state.surface,
            &mut state.temp,
            num_isect,
            Sense::Outside,
            NO_INTERSECTION,
        )
    }

    /// Save valid crossing distances of every face; return their count.
    fn calc_intersections(
        &self,
        vol: &VolumeRecord,
        state: &mut LocalState<'_>,
        on_face: Option<usize>,
        max_dist: f64,
    ) -> usize {
        let mut count = 0;
        for (face, &surf) in vol.faces.iter().enumerate() {
            let on_surface = if on_face == Some(face) {
                SurfaceState::On
            } else {
                SurfaceState::Off
            };
            let dists =
                self.unit
                    .surface(surf)
                    .calc_intersections(&state.pos, &state.dir, on_surface);
            for d in dists {
                if !(d < NO_INTERSECTION && d <= max_dist) {
                    continue;
                }
                debug_assert!(count < state.temp.isect.len(), "too many intersections");
                if let Some(slot) = state.temp.isect.get_mut(count) {
                    *slot = (d, FaceId::from_usize(face));
                    count += 1;
                }
            }
        }
        count
    }

    /// Nearest crossing of a volume without internal surfaces.
    fn simple_intersect(
        &self,
        vol: &VolumeRecord,
        state: &LocalState<'_>,
        num_isect: usize,
    ) -> Intersection {
        let nearest = state.temp.isect[..num_isect]
            .iter()
            .min_by(|a, b| a.0.total_cmp(&b.0));
        let Some(&(distance, face)) = nearest else {
            return Intersection::none();
        };

        let surface = vol.get_surface(face.get());
        let sense = match state.surface {
            // Leaving through the far side of the surface we're on
            Some(s) if s.id == surface => s.sense,
            _ => {
                let ss = self.unit.surface(surface).calc_sense(&state.pos);
                debug_assert!(ss != SignedSense::On);
                ss.to_sense()
            }
        };
        Intersection::new(OnLocalSurface::new(surface, sense), distance)
    }

    /// Step through sorted crossings until the volume's logic reaches the
    /// target: outside when leaving a volume, inside when entering one.
    #[allow(clippy::too_many_arguments)]
    fn complex_intersect(
        &self,
        vol: &VolumeRecord,
        pos: &Real3,
        surface: Option<OnLocalSurface>,
        temp: &mut TempScratch<'_>,
        num_isect: usize,
        target: Sense,
        max_search_dist: f64,
    ) -> Intersection {
        let TempScratch { senses, isect } = temp;
        let isect = &mut isect[..num_isect];
        isect.sort_by(|a, b| a.0.total_cmp(&b.0));

        let senses = &mut senses[..vol.num_faces()];
        for (face, sense) in senses.iter_mut().enumerate() {
            let surf = vol.get_surface(face);
            *sense = match surface {
                Some(s) if s.id == surf => s.sense,
                _ => self.unit.surface(surf).calc_sense(pos).to_sense(),
            };
        }

        let want_inside = target == Sense::Inside;
        let is_inside = |senses: &[Sense]| evaluate(&vol.logic, |f| senses[f] == Sense::Outside);
        if is_inside(senses) == want_inside {
            // Already on the target side
            return Intersection::none();
        }

        for &(distance, face) in isect.iter() {
            if distance >= max_search_dist {
                return Intersection::none();
            }
            let pre_sense = senses[face.get()];
            senses[face.get()] = pre_sense.flip();
            if is_inside(senses) == want_inside {
                debug_assert!(distance > 0.0 && distance.is_finite());
                return Intersection::new(
                    OnLocalSurface::new(vol.get_surface(face.get()), pre_sense),
                    distance,
                );
            }
        }
        Intersection::none()
    }

    /// Nearest entry into any other volume from the background.
    fn background_intersect(&self, state: &mut LocalState<'_>, max_dist: f64) -> Intersection {
        let pos = state.pos;
        let dir = state.dir;
        let surface = state.surface;

        let found = BihIntersectingFinder::new(&self.unit.bih_tree).find(
            &pos,
            &dir,
            max_dist,
            |vol_id, max_search| {
                let vol = self.unit.volume(vol_id);
                let on_face = surface.and_then(|s| vol.find_face(s.id));
                let num_isect = self.calc_intersections(vol, state, on_face, max_dist);
                if num_isect == 0 {
                    return None;
                }
                let isect = self.complex_intersect(
                    vol,
                    &pos,
                    surface,
                    &mut state.temp,
                    num_isect,
                    Sense::Inside,
                    max_search,
                );
                isect.surface.map(|s| (isect.distance, s))
            },
        );

        match found {
            Some((distance, s)) => Intersection::new(s, distance),
            None => Intersection::none(),
        }
    }

    /// Safety of the implicit background volume.
    fn background_safety(&self, pos: &Real3) -> f64 {
        let mut result = f64::INFINITY;
        for s in &self.unit.surfaces {
            match s.calc_safety(pos) {
                Some(d) => result = result.min(d),
                None => return 0.0,
            }
        }
        result.max(0.0)
    }

    /// Safety from the inner oriented bounding box.
    fn obz_safety(&self, pos: &Real3, vol: &VolumeRecord) -> f64 {
        let Some(obz_id) = vol.obz_id else {
            return 0.0;
        };
        let obz = self.params.obz(obz_id);
        let local = self.params.transform(obz.trans_id).transform_down(pos);
        obz.inner_safety(&local).unwrap_or(0.0)
    }
}
