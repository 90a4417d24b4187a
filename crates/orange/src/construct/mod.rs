//! Conversion of construction input into navigation tables.
//!
//! Universes are inserted in input order by [`UnitInserter`] and
//! [`RectArrayInserter`], which validate each definition and append its
//! records to a shared [`UniverseInserter`]. Nothing here is used after
//! the params are built.

use orange_ir::{DaughterInput, Label};
use orange_math::{BoundingBox, Tolerance, VariantTransform};

use crate::data::{Daughter, ObzRecord, RectArrayRecord, Scalars, SimpleUnitRecord, UnivType};
use crate::error::{OrangeError, Result};
use crate::id::{DaughterId, TransformId, UnivId, VolumeInstanceId};
use crate::options::OrangeOptions;

mod depth;
mod rect_array;
mod surfaces;
mod transforms;
mod unit;

pub(crate) use rect_array::RectArrayInserter;
pub(crate) use unit::UnitInserter;

use depth::DepthCalculator;
use transforms::TransformInserter;

/// Everything accumulated while inserting universes.
#[derive(Debug, Default)]
pub(crate) struct ParamsData {
    pub scalars: Scalars,
    pub univ_types: Vec<UnivType>,
    pub univ_indices: Vec<usize>,
    pub simple_units: Vec<SimpleUnitRecord>,
    pub rect_arrays: Vec<RectArrayRecord>,
    pub transforms: Vec<VariantTransform>,
    pub daughters: Vec<Daughter>,
    pub obz_records: Vec<ObzRecord>,
    pub num_surfaces: Vec<usize>,
    pub num_volumes: Vec<usize>,
    pub univ_labels: Vec<Label>,
    pub surface_labels: Vec<Label>,
    pub volume_labels: Vec<Label>,
    pub volume_instance_ids: Vec<Option<VolumeInstanceId>>,
    pub bbox: BoundingBox,
}

/// Labels and placement ids of a universe's local entities.
#[derive(Debug, Default)]
pub(crate) struct UniverseLabels {
    pub surfaces: Vec<Label>,
    pub volumes: Vec<Label>,
    pub instance_ids: Vec<Option<VolumeInstanceId>>,
}

/// Shared accumulator for all universe inserters.
#[derive(Debug)]
pub(crate) struct UniverseInserter {
    pub options: OrangeOptions,
    pub tol: Tolerance,
    pub data: ParamsData,
    num_universes: usize,
    transforms: TransformInserter,
    children: Vec<Vec<UnivId>>,
    pending_children: Vec<UnivId>,
}

impl UniverseInserter {
    /// Prepare to insert a known number of universes.
    pub fn new(options: OrangeOptions, tol: Tolerance, num_universes: usize) -> Self {
        let data = ParamsData {
            scalars: Scalars {
                tol,
                ..Default::default()
            },
            bbox: BoundingBox::from_infinite(),
            ..Default::default()
        };
        Self {
            options,
            tol,
            data,
            num_universes,
            transforms: TransformInserter::default(),
            children: Vec::with_capacity(num_universes),
            pending_children: Vec::new(),
        }
    }

    /// Id that the next inserted universe will get.
    pub fn next_univ_id(&self) -> UnivId {
        UnivId::from_usize(self.data.univ_types.len())
    }

    /// Deduplicate and store a transform.
    pub fn insert_transform(&mut self, transform: VariantTransform) -> TransformId {
        self.transforms.insert(transform)
    }

    /// Store a placement of a universe inside the universe being built.
    pub fn insert_daughter(&mut self, parent: &Label, input: DaughterInput) -> Result<DaughterId> {
        let universe = input.universe;
        let reason = if universe as usize >= self.num_universes {
            Some("no such universe")
        } else if universe == 0 {
            Some("the root universe cannot be placed")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(OrangeError::InvalidDaughter {
                label: parent.to_string(),
                universe,
                reason: reason.into(),
            });
        }

        let univ_id = UnivId::new(universe);
        let trans_id = self.transforms.insert(input.transform);
        self.data.daughters.push(Daughter { univ_id, trans_id });
        self.pending_children.push(univ_id);
        Ok(DaughterId::from_usize(self.data.daughters.len() - 1))
    }

    /// Register a completed universe and its local labels.
    pub fn push_universe(
        &mut self,
        univ_type: UnivType,
        index: usize,
        label: Label,
        labels: UniverseLabels,
    ) -> UnivId {
        debug_assert_eq!(labels.volumes.len(), labels.instance_ids.len());
        let id = self.next_univ_id();
        self.data.univ_types.push(univ_type);
        self.data.univ_indices.push(index);
        self.data.univ_labels.push(label);
        self.data.num_surfaces.push(labels.surfaces.len());
        self.data.num_volumes.push(labels.volumes.len());
        self.data.surface_labels.extend(labels.surfaces);
        self.data.volume_labels.extend(labels.volumes);
        self.data.volume_instance_ids.extend(labels.instance_ids);

        let mut children = std::mem::take(&mut self.pending_children);
        children.sort();
        children.dedup();
        self.children.push(children);
        id
    }

    /// Compute the nesting depth and return the finished tables.
    pub fn finish(mut self) -> Result<ParamsData> {
        debug_assert_eq!(self.children.len(), self.num_universes);
        let depth = DepthCalculator::new(&self.children, &self.data.univ_labels)
            .calc(UnivId::new(0))?;
        self.data.scalars.max_depth = depth;
        self.data.transforms = self.transforms.into_transforms();
        Ok(self.data)
    }
}
