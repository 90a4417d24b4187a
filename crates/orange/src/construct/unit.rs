//! Insertion of CSG units.

use orange_geom::Surface;
use orange_ir::logic::{self, LogicInt, MAX_LOGIC_DEPTH, NOWHERE_LOGIC};
use orange_ir::{Label, ObzInput, UnitInput, VolumeFlags, VolumeInput, ZOrder};
use orange_math::{BoundingBox, Tolerance};

use super::surfaces::{dedup_surfaces, UniqueSurfaces};
use super::{UniverseInserter, UniverseLabels};
use crate::bih::BihBuilder;
use crate::data::{ObzRecord, SimpleUnitRecord, UnivType, VolumeRecord};
use crate::error::{OrangeError, Result};
use crate::id::{LocalSurfaceId, LocalVolumeId, ObzId, UnivId, VolumeInstanceId};

/// Validate a unit and convert it to a [`SimpleUnitRecord`].
pub(crate) struct UnitInserter<'a> {
    univ: &'a mut UniverseInserter,
}

impl<'a> UnitInserter<'a> {
    pub fn new(univ: &'a mut UniverseInserter) -> Self {
        Self { univ }
    }

    /// Insert a unit, returning its universe id.
    pub fn insert(&mut self, input: UnitInput) -> Result<UnivId> {
        let UnitInput {
            label,
            surfaces,
            surface_labels,
            volumes,
            bbox,
            daughter_map,
            local_parent_map,
            background,
        } = input;

        if volumes.is_empty() {
            return Err(OrangeError::InvalidInput(format!(
                "unit '{label}' has no volumes"
            )));
        }
        let num_input_surfaces = surfaces.len();
        let unique = dedup_surfaces(surfaces, &surface_labels, &label.name);

        let background_id = check_zorder(&label, &volumes, background.as_ref())?;

        // Volume records
        let mut records = Vec::with_capacity(volumes.len());
        for vol in &volumes {
            let record = self.build_volume(&label, vol, &unique, num_input_surfaces)?;
            records.push(record);
        }

        // Bounding boxes, bumped outward; implicit volumes are not searched
        let bump = Tolerance {
            rel: 2.0 * self.univ.tol.rel,
            abs: 2.0 * self.univ.tol.abs,
        };
        let mut bboxes = Vec::with_capacity(volumes.len());
        let mut bad_bboxes = Vec::new();
        for (i, (vol, rec)) in volumes.iter().zip(&records).enumerate() {
            if rec.is_implicit() {
                bboxes.push(None);
                continue;
            }
            match vol.bbox {
                None => bboxes.push(Some(BoundingBox::from_infinite())),
                Some(b) if b.is_null() || b.is_half_infinite() => {
                    bad_bboxes.push(format!("{i}='{}': {b:?}", vol.label));
                    bboxes.push(None);
                }
                Some(b) => bboxes.push(Some(b.bumped(&bump))),
            }
        }
        if !bad_bboxes.is_empty() {
            return Err(OrangeError::InvalidBoundingBoxes {
                unit: label.to_string(),
                details: bad_bboxes.join(", "),
            });
        }

        // Oriented bounding zones
        for (vol, rec) in volumes.iter().zip(records.iter_mut()) {
            if let Some(obz) = &vol.obz {
                rec.obz_id = Some(self.insert_obz(&label, &vol.label, obz)?);
            }
        }

        // Daughters
        for (&vol_idx, daughter) in &daughter_map {
            let Some(rec) = records.get_mut(vol_idx as usize) else {
                return Err(OrangeError::InvalidInput(format!(
                    "daughter volume {vol_idx} out of range in unit '{label}'"
                )));
            };
            rec.daughter_id = Some(self.univ.insert_daughter(&label, daughter.clone())?);
            rec.flags |= VolumeFlags::EMBEDDED_UNIVERSE;
        }

        let parents = build_parents(&label, records.len(), &local_parent_map)?;

        // Connectivity of explicit volumes
        let mut connectivity = vec![Vec::new(); unique.surfaces.len()];
        for (i, rec) in records.iter().enumerate() {
            if rec.is_implicit() {
                continue;
            }
            for &f in &rec.faces {
                connectivity[f.get()].push(LocalVolumeId::from_usize(i));
            }
        }

        let bih_tree = BihBuilder::new(self.univ.options.bih_max_leaf_size).build(&bboxes);
        let simple_safety = records
            .iter()
            .skip(1)
            .all(|r| r.flags.supports_simple_safety());

        // Labels
        let mut volume_labels: Vec<Label> = volumes
            .iter()
            .map(|v| {
                let mut l = v.label.clone();
                if l.ext.is_empty() {
                    l.ext = label.name.clone();
                }
                l
            })
            .collect();
        if let (Some(bg), Some(bg_label)) = (background_id, background.and_then(|b| b.label)) {
            volume_labels[bg.get()] = bg_label;
        }
        let instance_ids = volumes
            .iter()
            .map(|v| v.instance_id.map(VolumeInstanceId::new))
            .collect();

        let id = self.univ.next_univ_id();
        if id.get() == 0 {
            self.univ.data.bbox = bbox.unwrap_or_else(BoundingBox::from_infinite);
        }

        let UniqueSurfaces {
            surfaces,
            labels: surface_labels,
            ..
        } = unique;
        let data = &mut self.univ.data;
        data.simple_units.push(SimpleUnitRecord {
            surfaces,
            volumes: records,
            connectivity,
            bih_tree,
            background: background_id,
            simple_safety,
            parents,
        });
        let index = data.simple_units.len() - 1;
        Ok(self.univ.push_universe(
            UnivType::Simple,
            index,
            label,
            UniverseLabels {
                surfaces: surface_labels,
                volumes: volume_labels,
                instance_ids,
            },
        ))
    }

    /// Validate a volume and remap its faces onto unique surfaces.
    fn build_volume(
        &mut self,
        unit: &Label,
        vol: &VolumeInput,
        unique: &UniqueSurfaces,
        num_input_surfaces: usize,
    ) -> Result<VolumeRecord> {
        let invalid = |reason: &str| OrangeError::InvalidVolume {
            unit: unit.to_string(),
            label: vol.label.to_string(),
            reason: reason.into(),
        };

        if !vol.is_valid() {
            return Err(invalid("missing logic or z-order"));
        }
        if !vol.faces.windows(2).all(|w| w[0] < w[1]) {
            return Err(invalid("faces are not sorted and unique"));
        }
        if vol.faces.iter().any(|&f| f as usize >= num_input_surfaces) {
            return Err(invalid("face refers to a nonexistent surface"));
        }
        if vol
            .logic
            .iter()
            .any(|&t| !logic::is_operator_token(t) && t as usize >= vol.faces.len())
        {
            return Err(invalid("logic refers to a nonexistent face"));
        }

        let depth = logic::calc_depth(&vol.logic).map_err(|_| OrangeError::UnbalancedLogic {
            label: vol.label.to_string(),
        })?;
        if depth > MAX_LOGIC_DEPTH {
            return Err(OrangeError::LogicTooDeep {
                label: vol.label.to_string(),
                depth,
                max: MAX_LOGIC_DEPTH,
            });
        }

        // Duplicate surfaces may merge faces
        let mapped: Vec<LocalSurfaceId> =
            vol.faces.iter().map(|&f| unique.remap[f as usize]).collect();
        let mut faces = mapped.clone();
        faces.sort();
        faces.dedup();
        let logic: Vec<LogicInt> = vol
            .logic
            .iter()
            .map(|&t| {
                if logic::is_operator_token(t) {
                    return t;
                }
                let surf = mapped[t as usize];
                faces.partition_point(|&f| f < surf) as LogicInt
            })
            .collect();

        let mut flags = vol.flags;
        let is_implicit = flags.contains(VolumeFlags::IMPLICIT_VOL);
        let surface_types = faces.iter().map(|f| unique.surfaces[f.get()].surface_type());
        if surface_types.clone().all(|t| t.simple_safety()) {
            flags |= VolumeFlags::SIMPLE_SAFETY;
        }
        let max_intersections = if is_implicit {
            0
        } else {
            surface_types.map(|t| t.num_intersections()).sum()
        };

        let options = &self.univ.options;
        if faces.len() > options.max_faces || max_intersections > options.max_intersections {
            tracing::error!(
                volume = %vol.label,
                unit = %unit,
                faces = faces.len(),
                intersections = max_intersections,
                max_faces = options.max_faces,
                max_intersections = options.max_intersections,
                "volume exceeds face or intersection limits; replacing with empty logic"
            );
            return Ok(VolumeRecord {
                faces: Vec::new(),
                logic: NOWHERE_LOGIC.to_vec(),
                max_intersections: 0,
                flags: VolumeFlags::IMPLICIT_VOL | VolumeFlags::SIMPLE_SAFETY,
                daughter_id: None,
                obz_id: None,
            });
        }

        let scalars = &mut self.univ.data.scalars;
        scalars.max_faces = scalars.max_faces.max(faces.len());
        scalars.max_intersections = scalars.max_intersections.max(max_intersections);
        scalars.max_logic_depth = scalars.max_logic_depth.max(depth);

        Ok(VolumeRecord {
            faces,
            logic,
            max_intersections,
            flags,
            daughter_id: None,
            obz_id: None,
        })
    }

    /// Store an oriented bounding zone with tolerance-adjusted boxes.
    fn insert_obz(&mut self, unit: &Label, vol: &Label, obz: &ObzInput) -> Result<ObzId> {
        if !obz.is_valid() {
            return Err(OrangeError::InvalidVolume {
                unit: unit.to_string(),
                label: vol.to_string(),
                reason: "invalid oriented bounding zone".into(),
            });
        }

        let abs = self.univ.tol.abs;
        let half = |b: &BoundingBox| (b.upper - b.lower) / 2.0;
        let inner_hw = half(&obz.inner).map(|w| (w - abs).max(0.0));
        let outer_hw = half(&obz.outer).map(|w| w + abs);

        let trans_id = self.univ.insert_transform(obz.transform.clone());
        let records = &mut self.univ.data.obz_records;
        records.push(ObzRecord {
            half_widths: [inner_hw, outer_hw],
            offsets: [obz.inner.center(), obz.outer.center()],
            trans_id,
        });
        Ok(ObzId::from_usize(records.len() - 1))
    }
}

/// Check exterior and background placement; return the background volume.
fn check_zorder(
    unit: &Label,
    volumes: &[VolumeInput],
    background: Option<&orange_ir::BackgroundInput>,
) -> Result<Option<LocalVolumeId>> {
    let bad = |reason: String| OrangeError::BadZOrder {
        unit: unit.to_string(),
        reason,
    };

    if let Some(i) = volumes
        .iter()
        .skip(1)
        .position(|v| v.zorder == ZOrder::Exterior)
    {
        return Err(bad(format!(
            "exterior volume '{}' must be the first volume",
            volumes[i + 1].label
        )));
    }

    let last = volumes.len() - 1;
    if let Some(i) = volumes[..last]
        .iter()
        .position(|v| v.zorder == ZOrder::Background)
    {
        return Err(bad(format!(
            "background volume '{}' must be the last volume",
            volumes[i].label
        )));
    }

    let bg = &volumes[last];
    let result = if bg.zorder == ZOrder::Background {
        if bg.logic != NOWHERE_LOGIC {
            return Err(bad(format!("background volume '{}' must have nowhere logic", bg.label)));
        }
        if bg.bbox.is_some() || bg.obz.is_some() {
            return Err(bad(format!("background volume '{}' cannot be bounded", bg.label)));
        }
        if !bg.flags.contains(VolumeFlags::IMPLICIT_VOL) {
            return Err(bad(format!("background volume '{}' must be implicit", bg.label)));
        }
        Some(LocalVolumeId::from_usize(last))
    } else {
        None
    };

    if let Some(b) = background {
        if result.map(|v| v.unchecked_get()) != Some(b.volume) {
            return Err(bad(format!(
                "background annotation refers to volume {} which is not a background volume",
                b.volume
            )));
        }
    }
    Ok(result)
}

/// Structural parent of each volume, rejecting cycles.
fn build_parents(
    unit: &Label,
    num_volumes: usize,
    parent_map: &std::collections::BTreeMap<u32, u32>,
) -> Result<Vec<Option<LocalVolumeId>>> {
    let invalid = |reason: String| OrangeError::InvalidInput(format!("unit '{unit}': {reason}"));

    let mut parents = vec![None; num_volumes];
    for (&child, &parent) in parent_map {
        if child as usize >= num_volumes || parent as usize >= num_volumes {
            return Err(invalid(format!("local parent {child} -> {parent} out of range")));
        }
        parents[child as usize] = Some(LocalVolumeId::new(parent));
    }

    for start in 0..num_volumes {
        let mut cur = parents[start];
        let mut steps = 0;
        while let Some(p) = cur {
            steps += 1;
            if steps > num_volumes {
                return Err(invalid(format!("local parent of volume {start} is cyclic")));
            }
            cur = parents[p.get()];
        }
    }
    Ok(parents)
}
