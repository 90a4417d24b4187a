//! Immutable navigation tables for a whole geometry.

use std::sync::atomic::{AtomicUsize, Ordering};

use orange_ir::logic::convert_logic;
use orange_ir::LogicNotation;
use orange_ir::{OrangeInput, VariantUniverseInput};
use orange_math::{BoundingBox, VariantTransform};

use crate::construct::{ParamsData, RectArrayInserter, UnitInserter, UniverseInserter};
use crate::data::{
    Daughter, ObzRecord, RectArrayRecord, Scalars, SimpleUnitRecord, UnivType,
};
use crate::error::{OrangeError, Result};
use crate::id::{
    DaughterId, ObzId, RectArrayId, SimpleUnitId, SurfaceTag, TransformId, UnivId, UnivTag,
    VolumeId, VolumeInstanceId, VolumeTag,
};
use crate::indexer::UniverseIndexer;
use crate::label::LabelIdMultiMap;
use crate::options::OrangeOptions;

/// Navigation tables built from an [`OrangeInput`].
///
/// Params are constructed once and then shared read-only by any number of
/// track views. The only interior mutability is the counter that limits
/// how many navigation failures are logged.
#[derive(Debug)]
pub struct OrangeParams {
    scalars: Scalars,
    univ_types: Vec<UnivType>,
    univ_indices: Vec<usize>,
    simple_units: Vec<SimpleUnitRecord>,
    rect_arrays: Vec<RectArrayRecord>,
    transforms: Vec<VariantTransform>,
    daughters: Vec<Daughter>,
    obz_records: Vec<ObzRecord>,
    univ_indexer: UniverseIndexer,
    volume_instance_ids: Vec<Option<VolumeInstanceId>>,
    univ_labels: LabelIdMultiMap<UnivTag>,
    surface_labels: LabelIdMultiMap<SurfaceTag>,
    volume_labels: LabelIdMultiMap<VolumeTag>,
    bbox: BoundingBox,
    options: OrangeOptions,
    failure_count: AtomicUsize,
}

impl OrangeParams {
    /// Build with default options.
    pub fn from_input(input: OrangeInput) -> Result<Self> {
        Self::with_options(input, OrangeOptions::default())
    }

    /// Build from a JSON construction input with default options.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_input(OrangeInput::from_json(json)?)
    }

    /// Build with explicit options.
    pub fn with_options(mut input: OrangeInput, options: OrangeOptions) -> Result<Self> {
        options.validate()?;
        if input.universes.is_empty() {
            return Err(OrangeError::InvalidInput("no universes were defined".into()));
        }
        let tol = match options.tolerance {
            Some(tol) => tol,
            None if input.tol.is_valid() => input.tol,
            None => {
                return Err(OrangeError::InvalidTolerance {
                    rel: input.tol.rel,
                    abs: input.tol.abs,
                })
            }
        };
        if !matches!(input.universes[0], VariantUniverseInput::Unit(_)) {
            return Err(OrangeError::RootNotUnit);
        }
        convert_logic(&mut input, LogicNotation::Postfix)?;

        let mut univ = UniverseInserter::new(options, tol, input.universes.len());
        for u in input.universes {
            match u {
                VariantUniverseInput::Unit(unit) => UnitInserter::new(&mut univ).insert(unit)?,
                VariantUniverseInput::RectArray(arr) => {
                    RectArrayInserter::new(&mut univ).insert(arr)?
                }
            };
        }
        let options = univ.options.clone();
        let params = Self::from_data(univ.finish()?, options);

        tracing::info!(
            universes = params.num_universes(),
            volumes = params.num_volumes(),
            surfaces = params.univ_indexer.num_surfaces(),
            depth = params.scalars.max_depth,
            "built ORANGE geometry"
        );
        Ok(params)
    }

    fn from_data(data: ParamsData, options: OrangeOptions) -> Self {
        let ParamsData {
            scalars,
            univ_types,
            univ_indices,
            simple_units,
            rect_arrays,
            transforms,
            daughters,
            obz_records,
            num_surfaces,
            num_volumes,
            univ_labels,
            surface_labels,
            volume_labels,
            volume_instance_ids,
            bbox,
        } = data;

        Self {
            scalars,
            univ_types,
            univ_indices,
            simple_units,
            rect_arrays,
            transforms,
            daughters,
            obz_records,
            univ_indexer: UniverseIndexer::new(&num_surfaces, &num_volumes),
            volume_instance_ids,
            univ_labels: LabelIdMultiMap::new("universe", univ_labels),
            surface_labels: LabelIdMultiMap::new("surface", surface_labels),
            volume_labels: LabelIdMultiMap::new("volume", volume_labels),
            bbox,
            options,
            failure_count: AtomicUsize::new(0),
        }
    }

    /// Geometry-wide limits.
    pub fn scalars(&self) -> &Scalars {
        &self.scalars
    }

    /// Options used to build the geometry.
    pub fn options(&self) -> &OrangeOptions {
        &self.options
    }

    /// Outer bounding box of the root universe.
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Number of universes.
    pub fn num_universes(&self) -> usize {
        self.univ_types.len()
    }

    /// Number of volumes over all universes.
    pub fn num_volumes(&self) -> usize {
        self.univ_indexer.num_volumes()
    }

    /// Maximum nesting depth.
    pub fn max_depth(&self) -> usize {
        self.scalars.max_depth
    }

    /// Kind of a universe.
    pub fn univ_type(&self, id: UnivId) -> UnivType {
        self.univ_types[id.get()]
    }

    /// Index of a universe in its type's table.
    pub fn univ_index(&self, id: UnivId) -> usize {
        self.univ_indices[id.get()]
    }

    /// CSG unit record.
    pub fn simple_unit(&self, id: SimpleUnitId) -> &SimpleUnitRecord {
        &self.simple_units[id.get()]
    }

    /// Rect array record.
    pub fn rect_array(&self, id: RectArrayId) -> &RectArrayRecord {
        &self.rect_arrays[id.get()]
    }

    /// Stored transform.
    pub fn transform(&self, id: TransformId) -> &VariantTransform {
        &self.transforms[id.get()]
    }

    /// Daughter placement.
    pub fn daughter(&self, id: DaughterId) -> &Daughter {
        &self.daughters[id.get()]
    }

    /// Oriented bounding zone.
    pub fn obz(&self, id: ObzId) -> &ObzRecord {
        &self.obz_records[id.get()]
    }

    /// Local-to-global id mapping.
    pub fn univ_indexer(&self) -> &UniverseIndexer {
        &self.univ_indexer
    }

    /// Placement id of a volume, if it has one.
    pub fn volume_instance_id(&self, id: VolumeId) -> Option<VolumeInstanceId> {
        self.volume_instance_ids[id.get()]
    }

    /// Universe labels.
    pub fn univ_labels(&self) -> &LabelIdMultiMap<UnivTag> {
        &self.univ_labels
    }

    /// Global surface labels.
    pub fn surface_labels(&self) -> &LabelIdMultiMap<SurfaceTag> {
        &self.surface_labels
    }

    /// Global volume labels.
    pub fn volume_labels(&self) -> &LabelIdMultiMap<VolumeTag> {
        &self.volume_labels
    }

    /// Count a navigation failure; returns whether it should be logged.
    pub fn record_failure(&self) -> bool {
        let count = self.failure_count.fetch_add(1, Ordering::Relaxed);
        count < self.options.max_failure_logs
    }

    /// Number of navigation failures so far.
    pub fn num_failures(&self) -> usize {
        self.failure_count.load(Ordering::Relaxed)
    }
}
