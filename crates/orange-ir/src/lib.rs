#![warn(missing_docs)]

//! Construction input for the ORANGE navigation core.
//!
//! This crate defines the declarative description of a geometry that the
//! `orange` crate turns into flattened navigation tables: a list of
//! universes (CSG units or rectangular voxel arrays), each with its own
//! surfaces, volumes and daughter placements.
//!
//! The input is plain data: serde serializes it to and from JSON, and the
//! [`logic`] module converts volume definitions between infix and postfix
//! token streams.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod error;
pub mod label;
pub mod logic;
pub mod types;

pub use error::{IrError, Result};
pub use label::Label;
pub use logic::LogicInt;
pub use orange_geom::VariantSurface;
pub use orange_math::{BoundingBox, Tolerance, VariantTransform};
pub use types::{LogicNotation, VolumeFlags, ZOrder};

/// Any surface accepted in a unit definition.
pub type SurfaceInput = VariantSurface;

/// Placement of a daughter universe inside its parent.
pub type TransformInput = VariantTransform;

/// Two nested boxes in a rotated frame that bound a volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObzInput {
    /// Box entirely inside the volume.
    pub inner: BoundingBox,
    /// Box entirely enclosing the volume.
    pub outer: BoundingBox,
    /// Map from the box frame to the unit frame.
    #[serde(default)]
    pub transform: TransformInput,
}

impl ObzInput {
    /// Whether both boxes are finite and nested.
    pub fn is_valid(&self) -> bool {
        !self.inner.is_null()
            && !self.outer.is_null()
            && self.inner.is_finite()
            && self.outer.is_finite()
            && (0..3).all(|ax| {
                self.outer.lower[ax] <= self.inner.lower[ax]
                    && self.inner.upper[ax] <= self.outer.upper[ax]
            })
    }
}

/// A single volume in a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeInput {
    /// Volume name; the unit label is used as the extension if empty.
    #[serde(default)]
    pub label: Label,
    /// Placement identifier reported by the track view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u32>,
    /// Sorted local surface indices bounding this volume.
    pub faces: Vec<u32>,
    /// Logic over indices into `faces`.
    pub logic: Vec<LogicInt>,
    /// Axis-aligned bounding box; infinite if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    /// Oriented bounding zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obz: Option<ObzInput>,
    /// Tracking flags.
    #[serde(default)]
    pub flags: VolumeFlags,
    /// Masking priority.
    #[serde(default)]
    pub zorder: ZOrder,
}

impl VolumeInput {
    /// Create a material volume from faces and a logic string.
    pub fn new(label: impl Into<Label>, faces: Vec<u32>, logic: &str) -> Result<Self> {
        Ok(Self {
            label: label.into(),
            faces,
            logic: logic::parse_logic(logic)?,
            zorder: ZOrder::Media,
            ..Default::default()
        })
    }

    /// Set the bounding box.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Set the masking priority.
    pub fn with_zorder(mut self, zorder: ZOrder) -> Self {
        self.zorder = zorder;
        self
    }

    /// Add tracking flags.
    pub fn with_flags(mut self, flags: VolumeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Whether the definition can be inserted.
    pub fn is_valid(&self) -> bool {
        (!self.logic.is_empty() || self.flags.contains(VolumeFlags::IMPLICIT_VOL))
            && self.zorder != ZOrder::Invalid
    }
}

/// A universe placed inside a parent volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaughterInput {
    /// Index of the daughter universe.
    pub universe: u32,
    /// Daughter-to-parent transform.
    #[serde(default)]
    pub transform: TransformInput,
}

impl DaughterInput {
    /// Place a universe with a transform.
    pub fn new(universe: u32, transform: TransformInput) -> Self {
        Self {
            universe,
            transform,
        }
    }
}

/// Metadata for the implicit volume that fills unclaimed space in a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundInput {
    /// Local index of the background volume; must be the last volume.
    pub volume: u32,
    /// Label overriding the volume's own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
}

/// A CSG universe: surfaces and the volumes built from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitInput {
    /// Universe name.
    #[serde(default)]
    pub label: Label,
    /// Surfaces referenced by volume faces.
    pub surfaces: Vec<SurfaceInput>,
    /// Optional names for each surface.
    #[serde(default)]
    pub surface_labels: Vec<Label>,
    /// Volumes; index zero is the exterior.
    pub volumes: Vec<VolumeInput>,
    /// Outer bounding box of the whole unit; infinite if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    /// Volumes filled by daughter universes.
    #[serde(default)]
    pub daughter_map: BTreeMap<u32, DaughterInput>,
    /// Structural nesting of volumes inside other local volumes.
    #[serde(default)]
    pub local_parent_map: BTreeMap<u32, u32>,
    /// Implicit background volume, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundInput>,
}

impl UnitInput {
    /// Whether the definition can be inserted.
    pub fn is_valid(&self) -> bool {
        !self.volumes.is_empty()
    }
}

/// A universe made of a rectilinear grid of daughter placements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RectArrayInput {
    /// Universe name.
    #[serde(default)]
    pub label: Label,
    /// Grid plane positions along x, y and z.
    pub grid: [Vec<f64>; 3],
    /// One daughter per cell, ordered with z varying fastest.
    pub daughters: Vec<DaughterInput>,
}

impl RectArrayInput {
    /// Whether the definition can be inserted.
    pub fn is_valid(&self) -> bool {
        !self.daughters.is_empty() && self.grid.iter().all(|g| g.len() >= 2)
    }

    /// Number of cells implied by the grid.
    pub fn num_cells(&self) -> usize {
        self.grid.iter().map(|g| g.len().saturating_sub(1)).product()
    }
}

/// Any universe definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantUniverseInput {
    /// CSG unit.
    Unit(UnitInput),
    /// Voxel array.
    RectArray(RectArrayInput),
}

impl VariantUniverseInput {
    /// Universe name.
    pub fn label(&self) -> &Label {
        match self {
            Self::Unit(u) => &u.label,
            Self::RectArray(r) => &r.label,
        }
    }
}

impl From<UnitInput> for VariantUniverseInput {
    fn from(u: UnitInput) -> Self {
        Self::Unit(u)
    }
}

impl From<RectArrayInput> for VariantUniverseInput {
    fn from(r: RectArrayInput) -> Self {
        Self::RectArray(r)
    }
}

/// A complete geometry definition.
///
/// The first universe is the root and must be a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrangeInput {
    /// Universes, root first.
    pub universes: Vec<VariantUniverseInput>,
    /// Construction and tracking tolerance.
    #[serde(default)]
    pub tol: Tolerance,
    /// Notation used by every volume's logic.
    #[serde(default)]
    pub logic: LogicNotation,
}

impl OrangeInput {
    /// Whether the definition can be built.
    pub fn is_valid(&self) -> bool {
        !self.universes.is_empty() && self.tol.is_valid()
    }

    /// Iterate mutably over the CSG units.
    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut UnitInput> {
        self.universes.iter_mut().filter_map(|u| match u {
            VariantUniverseInput::Unit(unit) => Some(unit),
            VariantUniverseInput::RectArray(_) => None,
        })
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orange_geom::{PlaneAligned, SphereCentered};
    use orange_math::{Axis, Real3};

    fn two_volume() -> OrangeInput {
        let unit = UnitInput {
            label: "two".into(),
            surfaces: vec![SphereCentered::new(1.5).into()],
            volumes: vec![
                VolumeInput::new("outside", vec![0], "0")
                    .unwrap()
                    .with_zorder(ZOrder::Exterior),
                VolumeInput::new("inside", vec![0], "0 ~")
                    .unwrap()
                    .with_bbox(BoundingBox::new(Real3::repeat(-1.5), Real3::repeat(1.5))),
            ],
            ..Default::default()
        };
        OrangeInput {
            universes: vec![unit.into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_volume_builder() {
        let v = VolumeInput::new("v", vec![0, 1], "0 ~ 1 &").unwrap();
        assert_eq!(v.logic, vec![0, logic::NOT, 1, logic::AND]);
        assert_eq!(v.zorder, ZOrder::Media);
        assert!(v.is_valid());
        assert!(v.bbox.is_none());

        assert!(VolumeInput::new("v", vec![], "0 ?").is_err());
        assert!(!VolumeInput::default().is_valid());
    }

    #[test]
    fn test_obz_valid() {
        let obz = ObzInput {
            inner: BoundingBox::new(Real3::repeat(-1.0), Real3::repeat(1.0)),
            outer: BoundingBox::new(Real3::repeat(-2.0), Real3::repeat(2.0)),
            transform: TransformInput::default(),
        };
        assert!(obz.is_valid());

        let swapped = ObzInput {
            inner: obz.outer,
            outer: obz.inner,
            ..obz.clone()
        };
        assert!(!swapped.is_valid());
    }

    #[test]
    fn test_rect_array_cells() {
        let ra = RectArrayInput {
            label: "arr".into(),
            grid: [vec![0.0, 1.0, 2.0], vec![0.0, 1.0], vec![-1.0, 0.0, 1.0, 2.0]],
            daughters: vec![DaughterInput::default(); 6],
        };
        assert_eq!(ra.num_cells(), 6);
        assert!(ra.is_valid());
    }

    #[test]
    fn test_json_round_trip() {
        let mut input = two_volume();
        input.universes.push(
            RectArrayInput {
                label: "arr".into(),
                grid: [vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]],
                daughters: vec![DaughterInput::new(0, TransformInput::translation(1.0, 0.0, 0.0))],
            }
            .into(),
        );
        if let VariantUniverseInput::Unit(u) = &mut input.universes[0] {
            u.surfaces.push(PlaneAligned::new(Axis::X, 0.0).into());
            u.daughter_map.insert(1, DaughterInput::new(1, TransformInput::identity()));
        }

        let json = input.to_json().unwrap();
        assert!(json.contains("\"type\": \"rect_array\""));
        let back = OrangeInput::from_json(&json).unwrap();
        assert_eq!(back, input);
        assert_eq!(back.universes[1].label().name, "arr");
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "universes": [{
                "type": "unit",
                "surfaces": [{"type": "sphere_centered", "radius_sq": 1.0}],
                "volumes": [
                    {"faces": [0], "logic": [0], "zorder": "exterior"}
                ]
            }]
        }"#;
        let input = OrangeInput::from_json(json).unwrap();
        assert!(input.is_valid());
        assert_eq!(input.logic, LogicNotation::Postfix);
        let VariantUniverseInput::Unit(u) = &input.universes[0] else {
            panic!("expected unit");
        };
        assert!(u.bbox.is_none());
        assert!(u.background.is_none());
        assert_eq!(u.volumes[0].flags, VolumeFlags::empty());

        assert!(matches!(OrangeInput::from_json("{"), Err(IrError::Json(_))));
    }
}
