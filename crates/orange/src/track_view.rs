//! Navigation of a single track through nested universes.
//!
//! A track's position is stored at every level of the universe hierarchy
//! it is in, each in that universe's local frame. Step searches query
//! every level and keep the nearest boundary; crossings happen at the
//! level that owns the crossed surface and then descend into any daughter
//! universes of the new volume.
//!
//! The call protocol is: assign, then repeatedly find a step, move
//! (internally or to the boundary), and cross if on a boundary. Direction
//! changes may happen at any point; a change on a boundary that turns the
//! track back into its volume makes the next crossing a no-op.

use orange_geom::Sense;
use orange_math::{axpy, is_soft_unit_vector, Real3, VariantTransform};

use crate::geo_interface::{GeoTrackInitializer, GeoTrackInterface};
use crate::id::{
    LocalSurfaceId, LocalVolumeId, SurfaceId, TrackSlotId, UnivId, UnivLevelId, VolumeId,
    VolumeInstanceId,
};
use crate::level::LevelStateAccessor;
use crate::params::OrangeParams;
use crate::state::{BoundaryResult, OrangeStateData, Propagation};
use crate::univ::{LocalState, OnLocalSurface, Tracker};

/// Navigator for the track in one state slot.
#[derive(Debug)]
pub struct OrangeTrackView<'a> {
    params: &'a OrangeParams,
    states: &'a mut OrangeStateData,
    slot: TrackSlotId,
}

impl<'a> OrangeTrackView<'a> {
    /// View a slot of the state.
    pub fn new(params: &'a OrangeParams, states: &'a mut OrangeStateData, slot: TrackSlotId) -> Self {
        debug_assert!(slot.get() < states.size());
        Self {
            params,
            states,
            slot,
        }
    }

    /// Start a track at a position or from another track.
    pub fn assign(&mut self, init: &GeoTrackInitializer) {
        debug_assert!(is_soft_unit_vector(&init.dir));
        match init.parent {
            Some(parent) => self.assign_from_parent(parent, &init.dir),
            None => self.initialize(&init.pos, &init.dir),
        }
    }

    //// ACCESSORS ////

    /// Global position.
    pub fn pos(&self) -> Real3 {
        self.states.pos[self.index(UnivLevelId::new(0))]
    }

    /// Global direction.
    pub fn dir(&self) -> Real3 {
        self.states.dir[self.index(UnivLevelId::new(0))]
    }

    /// Deepest level of the track.
    pub fn level(&self) -> UnivLevelId {
        self.states.level[self.slot.get()]
    }

    /// Universe at the deepest level.
    pub fn univ_id(&self) -> UnivId {
        self.states.univ[self.index(self.level())]
    }

    /// Global id of the volume at the deepest level.
    pub fn volume_id(&self) -> VolumeId {
        self.global_volume(self.level())
    }

    /// Placement id of the current volume, or of the nearest ancestor
    /// volume that has one.
    pub fn volume_instance_id(&self) -> Option<VolumeInstanceId> {
        let mut level = self.level();
        loop {
            let id = self.params.volume_instance_id(self.global_volume(level));
            if id.is_some() || level.get() == 0 {
                return id;
            }
            level.decrement();
        }
    }

    /// Placement ids of the volume at each level, null past the deepest.
    pub fn volume_instance_ids(&self, ids: &mut [VolumeInstanceId]) {
        let num_levels = self.level().get() + 1;
        for (lev, id) in ids.iter_mut().enumerate() {
            *id = if lev < num_levels {
                let vol = self.global_volume(UnivLevelId::from_usize(lev));
                self.params.volume_instance_id(vol).unwrap_or_default()
            } else {
                VolumeInstanceId::null()
            };
        }
    }

    /// Whether the track is in the exterior of the root universe.
    pub fn is_outside(&self) -> bool {
        self.states.vol[self.index(UnivLevelId::new(0))] == LocalVolumeId::new(0)
    }

    /// Whether the track is on a surface.
    pub fn is_on_boundary(&self) -> bool {
        self.surface_level().is_some()
    }

    /// Whether navigation failed to resolve a volume.
    pub fn failed(&self) -> bool {
        self.states.failed[self.slot.get()]
    }

    /// Global id of the surface the track is on.
    pub fn surface_id(&self) -> Option<SurfaceId> {
        let level = self.surface_level()?;
        let surf = self.states.surf[self.slot.get()];
        Some(self.global_surface(level, surf))
    }

    /// Global id of the surface found by the last step search.
    pub fn next_surface_id(&self) -> Option<SurfaceId> {
        let s = self.slot.get();
        let surf = self.states.next_surf[s].valid()?;
        Some(self.global_surface(self.states.next_level[s], surf))
    }

    /// Whether a step search result is cached.
    pub fn has_next_step(&self) -> bool {
        self.states.next_step[self.slot.get()] != 0.0
    }

    /// Whether the cached step ends on a surface.
    pub fn has_next_surface(&self) -> bool {
        self.states.next_surf[self.slot.get()].is_valid()
    }

    //// OPERATIONS ////

    /// Distance to the next boundary.
    pub fn find_next_step(&mut self) -> Propagation {
        if let Some(result) = self.pending_crossing() {
            return result;
        }
        if self.has_next_step() && self.has_next_surface() {
            return self.cached_step();
        }
        self.find_next_step_impl(None)
    }

    /// Distance to the next boundary, up to a maximum step.
    ///
    /// If no boundary is closer, the distance is exactly `max_step`.
    pub fn find_next_step_max(&mut self, max_step: f64) -> Propagation {
        debug_assert!(max_step > 0.0);
        if let Some(result) = self.pending_crossing() {
            return result;
        }
        if self.has_next_step() {
            let next_step = self.states.next_step[self.slot.get()];
            if next_step > max_step {
                return Propagation {
                    distance: max_step,
                    boundary: false,
                };
            }
            if self.has_next_surface() {
                return self.cached_step();
            }
        }
        self.find_next_step_impl(Some(max_step))
    }

    /// Lower bound on the distance to any boundary.
    pub fn find_safety(&self) -> f64 {
        debug_assert!(!self.is_on_boundary(), "safety is zero on a boundary");
        let mut result = f64::INFINITY;
        for lev in 0..=self.level().get() {
            let level = UnivLevelId::from_usize(lev);
            let idx = self.index(level);
            let tracker = Tracker::new(self.params, self.states.univ[idx]);
            result = result.min(tracker.safety(&self.states.pos[idx], self.states.vol[idx]));
        }
        result
    }

    /// Lower bound on the distance to any boundary, up to a maximum.
    pub fn find_safety_max(&self, max_step: f64) -> f64 {
        debug_assert!(max_step > 0.0);
        self.find_safety().min(max_step)
    }

    /// Move to the boundary found by the last step search.
    pub fn move_to_boundary(&mut self) {
        debug_assert!(self.has_next_step(), "no step was found");
        debug_assert!(self.has_next_surface(), "step does not end on a boundary");

        let s = self.slot.get();
        let dist = self.states.next_step[s];
        self.axpy_levels(dist);

        self.states.surface_level[s] = self.states.next_level[s];
        self.states.surf[s] = self.states.next_surf[s];
        self.states.sense[s] = self.states.next_sense[s];
        self.states.boundary[s] = BoundaryResult::Exiting;
        self.clear_next();
    }

    /// Move a distance shorter than the last step.
    pub fn move_internal(&mut self, dist: f64) {
        debug_assert!(self.has_next_step(), "no step was found");
        debug_assert!(dist > 0.0 && dist <= self.states.next_step[self.slot.get()]);

        self.axpy_levels(dist);
        self.states.next_step[self.slot.get()] -= dist;
        self.clear_surface();
    }

    /// Move to a nearby point in the same volume.
    pub fn move_internal_to(&mut self, pos: &Real3) {
        let mut pos = *pos;
        let level = self.level();
        for lev in 0..=level.get() {
            let level_id = UnivLevelId::from_usize(lev);
            self.lsa(level_id).set_pos(pos);
            if level_id < level {
                if let Some(t) = self.daughter_transform(level_id) {
                    pos = t.transform_down(&pos);
                }
            }
        }
        self.clear_surface();
        self.clear_next();
    }

    /// Cross the surface the track is on.
    ///
    /// This does nothing if the direction was changed back into the
    /// current volume since moving to the boundary.
    pub fn cross_boundary(&mut self) {
        debug_assert!(self.is_on_boundary(), "not on a boundary");
        debug_assert!(!self.has_next_step(), "a step is pending");

        let s = self.slot.get();
        if self.states.boundary[s] == BoundaryResult::Reentrant {
            return;
        }
        let Some(mut level) = self.surface_level() else {
            return;
        };

        let sense = self.states.sense[s].flip();
        self.states.sense[s] = sense;
        self.states.boundary[s] = BoundaryResult::Reentrant;

        let surface = OnLocalSurface::new(self.states.surf[s], sense);
        let univ = self.states.univ[self.index(level)];
        let mut tracker = Tracker::new(self.params, univ);
        let init = tracker.cross_boundary(&mut self.local_state(level, Some(surface)));
        let mut vol = match init.volume {
            Some(vol) => vol,
            None => {
                self.report_failure(level, Failure::Crossing(surface));
                LocalVolumeId::new(0)
            }
        };
        self.lsa(level).set_vol(vol);

        // Enter daughter universes of the new volume; earlier failures of
        // this track don't stop the descent
        let mut crossing_failed = init.volume.is_none();
        while !crossing_failed {
            let Some(daughter_id) = tracker.daughter(vol) else {
                break;
            };
            let daughter = self.params.daughter(daughter_id);
            let transform = self.params.transform(daughter.trans_id);
            let parent = self.lsa(level);
            let pos = transform.transform_down(&parent.pos());
            let dir = transform.rotate_down(&parent.dir());

            level.increment();
            tracker = Tracker::new(self.params, daughter.univ_id);
            let init = tracker.initialize(&mut self.local_state_at(pos, dir, None));
            vol = init.volume.unwrap_or(LocalVolumeId::new(0));

            let mut lsa = self.lsa(level);
            lsa.set_pos(pos);
            lsa.set_dir(dir);
            lsa.set_vol(vol);
            lsa.set_univ(daughter.univ_id);

            if init.volume.is_none() {
                self.report_failure(level, Failure::from(init.surface));
                crossing_failed = true;
            }
        }
        self.states.level[s] = level;
    }

    /// Change direction.
    ///
    /// On a boundary, turning from heading out of the volume to heading
    /// into it (or back) toggles whether a crossing is pending.
    pub fn set_dir(&mut self, newdir: &Real3) {
        debug_assert!(is_soft_unit_vector(newdir));

        if self.is_on_boundary() {
            let normal = self.geo_normal();
            let old_dir = self.dir();
            if (normal.dot(newdir) >= 0.0) != (normal.dot(&old_dir) >= 0.0) {
                let s = self.slot.get();
                self.states.boundary[s] = self.states.boundary[s].flip();
            }
        }

        self.set_dir_levels(newdir);
        self.clear_next();
    }

    /// Normal of the current surface pointing out of the current volume.
    pub fn normal(&self) -> Real3 {
        let normal = self.geo_normal();
        match self.states.sense[self.slot.get()] {
            Sense::Inside => normal,
            Sense::Outside => -normal,
        }
    }

    //// HELPERS ////

    fn index(&self, level: UnivLevelId) -> usize {
        self.states.index(self.slot, level)
    }

    fn lsa(&mut self, level: UnivLevelId) -> LevelStateAccessor<'_> {
        LevelStateAccessor::new(self.states, self.slot, level)
    }

    fn surface_level(&self) -> Option<UnivLevelId> {
        self.states.surface_level[self.slot.get()].valid()
    }

    fn global_volume(&self, level: UnivLevelId) -> VolumeId {
        let idx = self.index(level);
        self.params
            .univ_indexer()
            .global_volume(self.states.univ[idx], self.states.vol[idx])
    }

    fn global_surface(&self, level: UnivLevelId, surf: LocalSurfaceId) -> SurfaceId {
        let univ = self.states.univ[self.index(level)];
        self.params.univ_indexer().global_surface(univ, surf)
    }

    /// Transform from the daughter below `level` up into `level`.
    fn daughter_transform(&self, level: UnivLevelId) -> Option<&'a VariantTransform> {
        let idx = self.index(level);
        let tracker = Tracker::new(self.params, self.states.univ[idx]);
        let daughter = self.params.daughter(tracker.daughter(self.states.vol[idx])?);
        Some(self.params.transform(daughter.trans_id))
    }

    /// Local state of a level, with the track's surface if it is there.
    fn local_state(
        &mut self,
        level: UnivLevelId,
        surface: Option<OnLocalSurface>,
    ) -> LocalState<'_> {
        let idx = self.index(level);
        LocalState {
            pos: self.states.pos[idx],
            dir: self.states.dir[idx],
            volume: self.states.vol[idx].valid(),
            surface,
            temp: self.states.temp_scratch(self.slot),
        }
    }

    /// Local state for locating a point.
    fn local_state_at(&mut self, pos: Real3, dir: Real3, volume: Option<LocalVolumeId>) -> LocalState<'_> {
        LocalState {
            pos,
            dir,
            volume,
            surface: None,
            temp: self.states.temp_scratch(self.slot),
        }
    }

    fn on_local_surface(&self, level: UnivLevelId) -> Option<OnLocalSurface> {
        let s = self.slot.get();
        (self.surface_level() == Some(level))
            .then(|| OnLocalSurface::new(self.states.surf[s], self.states.sense[s]))
    }

    fn initialize(&mut self, pos: &Real3, dir: &Real3) {
        let s = self.slot.get();
        self.states.failed[s] = false;

        let mut pos = *pos;
        let mut dir = *dir;
        let mut level = UnivLevelId::new(0);
        let mut univ = UnivId::new(0);
        loop {
            let tracker = Tracker::new(self.params, univ);
            let init = tracker.initialize(&mut self.local_state_at(pos, dir, None));
            let vol = init.volume.unwrap_or(LocalVolumeId::new(0));

            let mut lsa = self.lsa(level);
            lsa.set_pos(pos);
            lsa.set_dir(dir);
            lsa.set_vol(vol);
            lsa.set_univ(univ);

            if init.volume.is_none() {
                self.report_failure(level, Failure::from(init.surface));
                break;
            }
            let Some(daughter_id) = tracker.daughter(vol) else {
                break;
            };
            let daughter = self.params.daughter(daughter_id);
            let transform = self.params.transform(daughter.trans_id);
            pos = transform.transform_down(&pos);
            dir = transform.rotate_down(&dir);
            univ = daughter.univ_id;
            level.increment();
        }

        self.states.level[s] = level;
        self.states.sense[s] = Sense::Outside;
        self.clear_surface();
        self.clear_next();
    }

    fn assign_from_parent(&mut self, parent: TrackSlotId, dir: &Real3) {
        let s = self.slot.get();
        let p = parent.get();
        if parent != self.slot {
            let states = &mut *self.states;
            states.level[s] = states.level[p];
            states.surface_level[s] = states.surface_level[p];
            states.surf[s] = states.surf[p];
            states.sense[s] = states.sense[p];
            states.boundary[s] = states.boundary[p];
            for lev in 0..=states.level[s].get() {
                let level = UnivLevelId::from_usize(lev);
                let src = states.index(parent, level);
                let dst = states.index(self.slot, level);
                states.pos[dst] = states.pos[src];
                states.dir[dst] = states.dir[src];
                states.vol[dst] = states.vol[src];
                states.univ[dst] = states.univ[src];
            }
        }
        self.states.failed[s] = false;
        self.clear_next();
        self.set_dir_levels(dir);
    }

    /// Store a global direction at every level.
    fn set_dir_levels(&mut self, dir: &Real3) {
        let mut dir = *dir;
        let level = self.level();
        for lev in 0..=level.get() {
            let level_id = UnivLevelId::from_usize(lev);
            self.lsa(level_id).set_dir(dir);
            if level_id < level {
                if let Some(t) = self.daughter_transform(level_id) {
                    dir = t.rotate_down(&dir);
                }
            }
        }
    }

    /// A zero-length step when a crossing is pending.
    fn pending_crossing(&self) -> Option<Propagation> {
        let pending = self.is_on_boundary()
            && self.states.boundary[self.slot.get()] == BoundaryResult::Exiting;
        pending.then_some(Propagation {
            distance: 0.0,
            boundary: true,
        })
    }

    fn cached_step(&self) -> Propagation {
        Propagation {
            distance: self.states.next_step[self.slot.get()],
            boundary: self.has_next_surface(),
        }
    }

    /// Nearest boundary over all levels; shallower levels win ties.
    fn find_next_step_impl(&mut self, max_step: Option<f64>) -> Propagation {
        let level = self.level();

        let mut best_level = UnivLevelId::new(0);
        let mut best = {
            let tracker = Tracker::new(self.params, self.states.univ[self.index(best_level)]);
            let surface = self.on_local_surface(best_level);
            let mut local = self.local_state(best_level, surface);
            match max_step {
                Some(max) => tracker.intersect_max(&mut local, max),
                None => tracker.intersect(&mut local),
            }
        };

        for lev in 1..=level.get() {
            let level_id = UnivLevelId::from_usize(lev);
            let tracker = Tracker::new(self.params, self.states.univ[self.index(level_id)]);
            let surface = self.on_local_surface(level_id);
            let isect = tracker.intersect_max(&mut self.local_state(level_id, surface), best.distance);
            if isect.distance < best.distance {
                best = isect;
                best_level = level_id;
            }
        }

        let s = self.slot.get();
        self.states.next_step[s] = best.distance;
        match best.surface {
            Some(surface) => {
                self.states.next_surf[s] = surface.id;
                self.states.next_sense[s] = surface.sense;
                self.states.next_level[s] = best_level;
            }
            None => {
                self.states.next_surf[s] = LocalSurfaceId::null();
                self.states.next_level[s] = UnivLevelId::null();
            }
        }

        Propagation {
            distance: best.distance,
            boundary: best.surface.is_some(),
        }
    }

    /// Outward normal of the current surface in the global frame.
    fn geo_normal(&self) -> Real3 {
        debug_assert!(self.is_on_boundary(), "not on a boundary");
        let level = self.states.surface_level[self.slot.get()];
        let idx = self.index(level);
        let tracker = Tracker::new(self.params, self.states.univ[idx]);
        let mut normal = tracker.normal(&self.states.pos[idx], self.states.surf[self.slot.get()]);
        for lev in (0..level.get()).rev() {
            if let Some(t) = self.daughter_transform(UnivLevelId::from_usize(lev)) {
                normal = t.rotate_up(&normal);
            }
        }
        normal
    }

    fn axpy_levels(&mut self, dist: f64) {
        for lev in 0..=self.level().get() {
            let idx = self.index(UnivLevelId::from_usize(lev));
            let dir = self.states.dir[idx];
            axpy(dist, &dir, &mut self.states.pos[idx]);
        }
    }

    fn clear_surface(&mut self) {
        let s = self.slot.get();
        self.states.surface_level[s] = UnivLevelId::null();
        self.states.surf[s] = LocalSurfaceId::null();
        self.states.boundary[s] = BoundaryResult::Reentrant;
    }

    fn clear_next(&mut self) {
        let s = self.slot.get();
        self.states.next_step[s] = 0.0;
        self.states.next_surf[s] = LocalSurfaceId::null();
        self.states.next_level[s] = UnivLevelId::null();
    }

    /// Flag the track as failed and log if under the limit.
    ///
    /// The level's local state must already hold the failed position.
    fn report_failure(&mut self, level: UnivLevelId, failure: Failure) {
        self.states.failed[self.slot.get()] = true;
        if !self.params.record_failure() {
            return;
        }
        let idx = self.index(level);
        let univ = self.states.univ[idx];
        let pos = self.states.pos[idx];
        let dir = self.states.dir[idx];
        let universe = self.params.univ_labels().get(univ);
        let surface_label = |s: OnLocalSurface| {
            let id = self.params.univ_indexer().global_surface(univ, s.id);
            self.params.surface_labels().get(id)
        };
        match failure {
            Failure::OnSurface(s) => tracing::error!(
                %universe,
                level = level.get(),
                surface = %surface_label(s),
                pos = ?pos.as_slice(),
                "failed to initialize track: started on a surface"
            ),
            Failure::NoVolume => tracing::error!(
                %universe,
                level = level.get(),
                pos = ?pos.as_slice(),
                "failed to initialize track: could not find associated volume"
            ),
            Failure::Crossing(s) => tracing::error!(
                %universe,
                level = level.get(),
                surface = %surface_label(s),
                sense = ?s.sense,
                pos = ?pos.as_slice(),
                dir = ?dir.as_slice(),
                "track failed to cross local surface"
            ),
        }
    }
}

/// Why a level's volume could not be found.
#[derive(Debug, Clone, Copy)]
enum Failure {
    /// The point lies exactly on a face of its volume.
    OnSurface(OnLocalSurface),
    /// No volume contains the point.
    NoVolume,
    /// No volume lies on the far side of the crossed surface.
    Crossing(OnLocalSurface),
}

impl From<Option<OnLocalSurface>> for Failure {
    fn from(surface: Option<OnLocalSurface>) -> Self {
        surface.map_or(Failure::NoVolume, Failure::OnSurface)
    }
}

impl GeoTrackInterface for OrangeTrackView<'_> {
    fn assign(&mut self, init: &GeoTrackInitializer) {
        OrangeTrackView::assign(self, init)
    }

    fn pos(&self) -> Real3 {
        OrangeTrackView::pos(self)
    }

    fn dir(&self) -> Real3 {
        OrangeTrackView::dir(self)
    }

    fn volume_id(&self) -> VolumeId {
        OrangeTrackView::volume_id(self)
    }

    fn volume_instance_id(&self) -> Option<VolumeInstanceId> {
        OrangeTrackView::volume_instance_id(self)
    }

    fn level(&self) -> UnivLevelId {
        OrangeTrackView::level(self)
    }

    fn is_outside(&self) -> bool {
        OrangeTrackView::is_outside(self)
    }

    fn is_on_boundary(&self) -> bool {
        OrangeTrackView::is_on_boundary(self)
    }

    fn failed(&self) -> bool {
        OrangeTrackView::failed(self)
    }

    fn find_next_step(&mut self) -> Propagation {
        OrangeTrackView::find_next_step(self)
    }

    fn find_next_step_max(&mut self, max_step: f64) -> Propagation {
        OrangeTrackView::find_next_step_max(self, max_step)
    }

    fn find_safety(&self) -> f64 {
        OrangeTrackView::find_safety(self)
    }

    fn find_safety_max(&self, max_step: f64) -> f64 {
        OrangeTrackView::find_safety_max(self, max_step)
    }

    fn move_to_boundary(&mut self) {
        OrangeTrackView::move_to_boundary(self)
    }

    fn move_internal(&mut self, dist: f64) {
        OrangeTrackView::move_internal(self, dist)
    }

    fn move_internal_to(&mut self, pos: &Real3) {
        OrangeTrackView::move_internal_to(self, pos)
    }

    fn cross_boundary(&mut self) {
        OrangeTrackView::cross_boundary(self)
    }

    fn set_dir(&mut self, newdir: &Real3) {
        OrangeTrackView::set_dir(self, newdir)
    }

    fn normal(&self) -> Real3 {
        OrangeTrackView::normal(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use orange_geom::SphereCentered;
    use orange_ir::{DaughterInput, OrangeInput, UnitInput, VolumeInput, ZOrder};
    use orange_math::{BoundingBox, VariantTransform};

    /// Sphere of radius 1.5 at the origin.
    fn sphere() -> OrangeParams {
        let unit = UnitInput {
            label: "sphere".into(),
            surfaces: vec![SphereCentered::new(1.5).into()],
            volumes: vec![
                VolumeInput::new("outside", vec![0], "0")
                    .unwrap()
                    .with_zorder(ZOrder::Exterior),
                VolumeInput::new("inside", vec![0], "0 ~").unwrap(),
            ],
            ..Default::default()
        };
        OrangeParams::from_input(OrangeInput {
            universes: vec![unit.into()],
            ..Default::default()
        })
        .unwrap()
    }

    /// Unit ball placed at x=1 inside a sphere of radius 10.
    fn nested() -> OrangeParams {
        let outer = UnitInput {
            label: "outer".into(),
            surfaces: vec![SphereCentered::new(10.0).into()],
            volumes: vec![
                VolumeInput::new("ext", vec![0], "0")
                    .unwrap()
                    .with_zorder(ZOrder::Exterior),
                VolumeInput::new("world", vec![0], "0 ~")
                    .unwrap()
                    .with_bbox(BoundingBox::new(Real3::repeat(-10.0), Real3::repeat(10.0))),
            ],
            daughter_map: [(1, DaughterInput::new(1, VariantTransform::translation(1.0, 0.0, 0.0)))]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let inner = UnitInput {
            label: "inner".into(),
            surfaces: vec![SphereCentered::new(1.0).into()],
            volumes: vec![
                VolumeInput::new("fill", vec![0], "0").unwrap(),
                VolumeInput {
                    instance_id: Some(7),
                    ..VolumeInput::new("ball", vec![0], "0 ~").unwrap()
                },
            ],
            ..Default::default()
        };
        OrangeParams::from_input(OrangeInput {
            universes: vec![outer.into(), inner.into()],
            ..Default::default()
        })
        .unwrap()
    }

    fn slot(i: u32) -> TrackSlotId {
        TrackSlotId::new(i)
    }

    #[test]
    fn test_initialize() {
        let params = sphere();
        let mut states = OrangeStateData::new(&params, 2);
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(1));
        geo.assign(&GeoTrackInitializer::new(Real3::new(0.5, 0.0, 0.0), Real3::x()));

        assert_eq!(geo.volume_id(), VolumeId::new(1));
        assert_eq!(geo.level(), UnivLevelId::new(0));
        assert_eq!(geo.pos(), Real3::new(0.5, 0.0, 0.0));
        assert_eq!(geo.dir(), Real3::x());
        assert!(!geo.is_outside());
        assert!(!geo.is_on_boundary());
        assert!(!geo.failed());
        assert!(!geo.has_next_step());
        assert_eq!(geo.surface_id(), None);
        assert_relative_eq!(geo.find_safety(), 1.0, epsilon = 1e-12);

        geo.assign(&GeoTrackInitializer::new(Real3::new(2.0, 0.0, 0.0), Real3::x()));
        assert!(geo.is_outside());
        assert_eq!(geo.volume_id(), VolumeId::new(0));
    }

    #[test]
    fn test_start_on_surface() {
        let params = sphere();
        let mut states = OrangeStateData::new(&params, 1);
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(0));
        geo.assign(&GeoTrackInitializer::new(Real3::new(1.5, 0.0, 0.0), Real3::y()));
        assert!(geo.failed());
        assert!(geo.is_outside());
        assert_eq!(params.num_failures(), 1);

        // A later successful initialization clears the flag
        geo.assign(&GeoTrackInitializer::new(Real3::zeros(), Real3::y()));
        assert!(!geo.failed());
    }

    #[test]
    fn test_cross_out() {
        let params = sphere();
        let mut states = OrangeStateData::new(&params, 1);
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(0));
        geo.assign(&GeoTrackInitializer::new(Real3::new(0.5, 0.0, 0.0), Real3::x()));

        let step = geo.find_next_step();
        assert_relative_eq!(step.distance, 1.0, epsilon = 1e-12);
        assert!(step.boundary);
        assert_eq!(geo.next_surface_id(), Some(SurfaceId::new(0)));

        geo.move_to_boundary();
        assert!(geo.is_on_boundary());
        assert_eq!(geo.surface_id(), Some(SurfaceId::new(0)));
        assert_relative_eq!(geo.pos(), Real3::new(1.5, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(geo.normal(), Real3::x(), epsilon = 1e-12);

        // A crossing is pending
        assert_eq!(
            geo.find_next_step(),
            Propagation {
                distance: 0.0,
                boundary: true
            }
        );
        geo.cross_boundary();
        assert!(geo.is_outside());
        assert!(geo.is_on_boundary());
        assert_relative_eq!(geo.normal(), -Real3::x(), epsilon = 1e-12);

        let step = geo.find_next_step();
        assert!(!step.boundary);
        assert_eq!(step.distance, f64::INFINITY);
    }

    #[test]
    fn test_reentrant_scatter() {
        let params = sphere();
        let mut states = OrangeStateData::new(&params, 1);
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(0));
        geo.assign(&GeoTrackInitializer::new(Real3::new(1.49, 0.0, 0.0), Real3::y()));

        let step = geo.find_next_step();
        assert_relative_eq!(step.distance, 0.17291616465790594, epsilon = 1e-10);
        geo.move_to_boundary();

        // Turn back into the sphere: crossing does nothing
        geo.set_dir(&-Real3::x());
        geo.cross_boundary();
        assert_eq!(geo.volume_id(), VolumeId::new(1));
        assert!(geo.is_on_boundary());

        let step = geo.find_next_step();
        assert!(step.boundary);
        assert_relative_eq!(step.distance, 2.98, epsilon = 1e-10);
    }

    #[test]
    fn test_set_dir_toggles() {
        let params = sphere();
        let mut states = OrangeStateData::new(&params, 1);
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(0));
        geo.assign(&GeoTrackInitializer::new(Real3::new(1.49, 0.0, 0.0), Real3::y()));
        geo.find_next_step();
        geo.move_to_boundary();

        // Still heading out
        geo.set_dir(&Real3::x());
        assert_eq!(geo.find_next_step().distance, 0.0);

        // In, then out again
        geo.set_dir(&-Real3::y());
        geo.set_dir(&Real3::y());
        assert_eq!(geo.find_next_step().distance, 0.0);
        geo.cross_boundary();
        assert!(geo.is_outside());

        // Outside, turning back in makes the crossing pending again
        geo.set_dir(&-Real3::x());
        assert_eq!(geo.find_next_step().distance, 0.0);
        geo.cross_boundary();
        assert_eq!(geo.volume_id(), VolumeId::new(1));
    }

    #[test]
    fn test_limited_step() {
        let params = sphere();
        let mut states = OrangeStateData::new(&params, 1);
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(0));
        geo.assign(&GeoTrackInitializer::new(Real3::zeros(), Real3::x()));

        let step = geo.find_next_step_max(0.25);
        assert_eq!(
            step,
            Propagation {
                distance: 0.25,
                boundary: false
            }
        );
        geo.move_internal(0.25);
        assert_relative_eq!(geo.pos(), Real3::new(0.25, 0.0, 0.0));

        let step = geo.find_next_step();
        assert_relative_eq!(step.distance, 1.25, epsilon = 1e-12);

        // Cached distance is reused and truncated
        let step = geo.find_next_step_max(0.5);
        assert_eq!(step.distance, 0.5);
        assert!(!step.boundary);
        let step = geo.find_next_step_max(2.0);
        assert!(step.boundary);
        assert_relative_eq!(step.distance, 1.25, epsilon = 1e-12);

        geo.move_internal(0.5);
        let step = geo.find_next_step();
        assert_relative_eq!(step.distance, 0.75, epsilon = 1e-12);
        assert_relative_eq!(geo.find_safety_max(0.1), 0.1);
        assert_relative_eq!(geo.find_safety(), 0.75, epsilon = 1e-12);

        geo.move_internal_to(&Real3::new(0.0, 0.0, 1.0));
        assert!(!geo.has_next_step());
        assert_relative_eq!(geo.find_safety(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_nested() {
        let params = nested();
        let mut states = OrangeStateData::new(&params, 1);
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(0));
        geo.assign(&GeoTrackInitializer::new(Real3::new(-5.0, 0.0, 0.0), Real3::x()));

        assert_eq!(geo.level(), UnivLevelId::new(1));
        assert_eq!(geo.univ_id(), UnivId::new(1));
        assert_eq!(geo.volume_id(), VolumeId::new(2));
        assert_eq!(geo.volume_instance_id(), None);
        assert_relative_eq!(geo.find_safety(), 5.0, epsilon = 1e-12);

        // Into the ball
        let step = geo.find_next_step();
        assert_relative_eq!(step.distance, 5.0, epsilon = 1e-12);
        assert_eq!(geo.next_surface_id(), Some(SurfaceId::new(1)));
        geo.move_to_boundary();
        assert_relative_eq!(geo.normal(), Real3::x(), epsilon = 1e-12);
        geo.cross_boundary();
        assert_eq!(geo.volume_id(), VolumeId::new(3));
        assert_eq!(geo.volume_instance_id(), Some(VolumeInstanceId::new(7)));
        assert_relative_eq!(geo.normal(), -Real3::x(), epsilon = 1e-12);

        let mut ids = [VolumeInstanceId::new(0); 3];
        geo.volume_instance_ids(&mut ids);
        assert_eq!(ids, [VolumeInstanceId::null(), VolumeInstanceId::new(7), VolumeInstanceId::null()]);

        // Through the ball
        let step = geo.find_next_step();
        assert_relative_eq!(step.distance, 2.0, epsilon = 1e-12);
        geo.move_to_boundary();
        geo.cross_boundary();
        assert_eq!(geo.volume_id(), VolumeId::new(2));
        assert_relative_eq!(geo.pos(), Real3::new(2.0, 0.0, 0.0), epsilon = 1e-12);

        // Out of the world through the parent's surface
        let step = geo.find_next_step();
        assert_relative_eq!(step.distance, 8.0, epsilon = 1e-12);
        assert_eq!(geo.next_surface_id(), Some(SurfaceId::new(0)));
        geo.move_to_boundary();
        geo.cross_boundary();
        assert!(geo.is_outside());
        assert_eq!(geo.level(), UnivLevelId::new(0));
        assert_eq!(geo.volume_id(), VolumeId::new(0));
    }

    #[test]
    fn test_move_internal_to_nested() {
        let params = nested();
        let mut states = OrangeStateData::new(&params, 1);
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(0));
        geo.assign(&GeoTrackInitializer::new(Real3::new(1.0, 0.0, 0.0), Real3::y()));
        assert_eq!(geo.volume_id(), VolumeId::new(3));

        geo.move_internal_to(&Real3::new(1.5, 0.0, 0.0));
        assert_eq!(geo.pos(), Real3::new(1.5, 0.0, 0.0));
        assert_relative_eq!(geo.find_safety(), 0.5, epsilon = 1e-12);
        let step = geo.find_next_step();
        assert_relative_eq!(step.distance, 0.75f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_assign_from_parent() {
        let params = nested();
        let mut states = OrangeStateData::new(&params, 2);
        {
            let mut geo = OrangeTrackView::new(&params, &mut states, slot(0));
            geo.assign(&GeoTrackInitializer::new(Real3::new(-5.0, 0.0, 0.0), Real3::x()));
            geo.find_next_step();
            geo.move_to_boundary();
        }
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(1));
        geo.assign(&GeoTrackInitializer::from_parent(slot(0), -Real3::x()));
        assert_eq!(geo.level(), UnivLevelId::new(1));
        assert_eq!(geo.volume_id(), VolumeId::new(2));
        assert_eq!(geo.surface_id(), Some(SurfaceId::new(1)));
        assert_eq!(geo.dir(), -Real3::x());
        assert!(!geo.has_next_step());

        // The parent is still pending a crossing; the copy inherited it
        assert_eq!(geo.find_next_step().distance, 0.0);

        let mut parent = OrangeTrackView::new(&params, &mut states, slot(0));
        assert_eq!(parent.dir(), Real3::x());
        parent.cross_boundary();
        assert_eq!(parent.volume_id(), VolumeId::new(3));
    }

    #[test]
    fn test_secondary_clears_failure() {
        let params = nested();
        let mut states = OrangeStateData::new(&params, 2);
        {
            // On the ball's surface
            let mut geo = OrangeTrackView::new(&params, &mut states, slot(0));
            geo.assign(&GeoTrackInitializer::new(Real3::zeros(), Real3::x()));
            assert!(geo.failed());
            assert_eq!(geo.volume_id(), VolumeId::new(2));
        }
        let mut geo = OrangeTrackView::new(&params, &mut states, slot(1));
        geo.assign(&GeoTrackInitializer::from_parent(slot(0), -Real3::x()));
        assert!(!geo.failed());
        assert_eq!(geo.level(), UnivLevelId::new(1));
        assert_eq!(geo.volume_id(), VolumeId::new(2));
    }
}
