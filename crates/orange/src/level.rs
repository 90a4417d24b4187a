//! Access to one level of one track's state.

use orange_math::Real3;

use crate::id::{LocalVolumeId, TrackSlotId, UnivId, UnivLevelId};
use crate::state::OrangeStateData;

/// Read and write the row of a track at one universe level.
#[derive(Debug)]
pub struct LevelStateAccessor<'a> {
    states: &'a mut OrangeStateData,
    slot: TrackSlotId,
    index: usize,
}

impl<'a> LevelStateAccessor<'a> {
    /// Bind to a slot and level.
    pub fn new(states: &'a mut OrangeStateData, slot: TrackSlotId, level: UnivLevelId) -> Self {
        let index = states.index(slot, level);
        Self {
            states,
            slot,
            index,
        }
    }

    /// Local position.
    pub fn pos(&self) -> Real3 {
        self.states.pos[self.index]
    }

    /// Local direction.
    pub fn dir(&self) -> Real3 {
        self.states.dir[self.index]
    }

    /// Local volume.
    pub fn vol(&self) -> LocalVolumeId {
        self.states.vol[self.index]
    }

    /// Universe at this level.
    pub fn univ(&self) -> UnivId {
        self.states.univ[self.index]
    }

    /// Set the local position.
    pub fn set_pos(&mut self, pos: Real3) {
        self.states.pos[self.index] = pos;
    }

    /// Set the local direction.
    pub fn set_dir(&mut self, dir: Real3) {
        self.states.dir[self.index] = dir;
    }

    /// Set the local volume.
    pub fn set_vol(&mut self, vol: LocalVolumeId) {
        self.states.vol[self.index] = vol;
    }

    /// Set the universe.
    pub fn set_univ(&mut self, univ: UnivId) {
        self.states.univ[self.index] = univ;
    }

    /// Copy another level of the same track into this one.
    pub fn copy_from(&mut self, level: UnivLevelId) {
        let src = self.states.index(self.slot, level);
        debug_assert_ne!(src, self.index, "cannot copy a level onto itself");
        let states = &mut *self.states;
        states.pos[self.index] = states.pos[src];
        states.dir[self.index] = states.dir[src];
        states.vol[self.index] = states.vol[src];
        states.univ[self.index] = states.univ[src];
    }
}
