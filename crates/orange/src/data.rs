//! Flattened, read-only navigation tables.
//!
//! These records are produced once by the inserters in [`crate::construct`]
//! and never change afterward. Everything is addressed by opaque ids so
//! that the tables can be stored as plain vectors.

use serde::{Deserialize, Serialize};

use orange_geom::VariantSurface;
use orange_ir::{LogicInt, VolumeFlags};
use orange_math::{Real3, Tolerance};

use crate::bih::BihTree;
use crate::id::{DaughterId, LocalSurfaceId, LocalVolumeId, ObzId, TransformId, UnivId};

/// Kind of universe, selecting the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnivType {
    /// CSG unit.
    Simple,
    /// Rectilinear voxel array.
    RectArray,
}

/// A single volume in a CSG unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeRecord {
    /// Sorted local surfaces bounding this volume.
    pub faces: Vec<LocalSurfaceId>,
    /// Postfix logic over indices into `faces`.
    pub logic: Vec<LogicInt>,
    /// Upper bound on ray crossings with the faces.
    pub max_intersections: usize,
    /// Algorithm selection flags.
    pub flags: VolumeFlags,
    /// Embedded universe, if any.
    pub daughter_id: Option<DaughterId>,
    /// Oriented bounding zone, if any.
    pub obz_id: Option<ObzId>,
}

impl VolumeRecord {
    /// Position of a surface in the face list.
    pub fn find_face(&self, surface: LocalSurfaceId) -> Option<usize> {
        self.faces.binary_search(&surface).ok()
    }

    /// Surface for a face index.
    pub fn get_surface(&self, face: usize) -> LocalSurfaceId {
        self.faces[face]
    }

    /// Number of faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Whether the volume is only reachable as a fallback.
    pub fn is_implicit(&self) -> bool {
        self.flags.contains(VolumeFlags::IMPLICIT_VOL)
    }
}

/// A CSG universe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimpleUnitRecord {
    /// Local surfaces.
    pub surfaces: Vec<VariantSurface>,
    /// Local volumes; index zero is the exterior.
    pub volumes: Vec<VolumeRecord>,
    /// For each surface, the non-implicit volumes that use it as a face.
    pub connectivity: Vec<Vec<LocalVolumeId>>,
    /// Acceleration structure over volume bounding boxes.
    pub bih_tree: BihTree,
    /// Volume that fills space not claimed by any other.
    pub background: Option<LocalVolumeId>,
    /// Whether every volume but the exterior supports simple safety.
    pub simple_safety: bool,
    /// Structural parent of each volume inside the unit.
    pub parents: Vec<Option<LocalVolumeId>>,
}

impl SimpleUnitRecord {
    /// Volume record.
    pub fn volume(&self, id: LocalVolumeId) -> &VolumeRecord {
        &self.volumes[id.get()]
    }

    /// Surface definition.
    pub fn surface(&self, id: LocalSurfaceId) -> &VariantSurface {
        &self.surfaces[id.get()]
    }

    /// Number of structural ancestors of a volume.
    pub fn local_depth(&self, id: LocalVolumeId) -> usize {
        let mut depth = 0;
        let mut cur = self.parents[id.get()];
        while let Some(p) = cur {
            depth += 1;
            cur = self.parents[p.get()];
        }
        depth
    }
}

/// A rectilinear grid of daughter cells.
///
/// Local surfaces are the grid planes, numbered x first, then y, then z.
/// Local volumes are cells ordered with z varying fastest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RectArrayRecord {
    /// Grid plane positions; the outermost planes are infinite.
    pub grid: [Vec<f64>; 3],
    /// Daughter placement for each cell.
    pub daughters: Vec<DaughterId>,
    /// First local surface of each axis, plus the total.
    pub surface_offsets: [usize; 4],
}

impl RectArrayRecord {
    /// Number of cells along each axis.
    pub fn dims(&self) -> [usize; 3] {
        [
            self.grid[0].len() - 1,
            self.grid[1].len() - 1,
            self.grid[2].len() - 1,
        ]
    }

    /// Number of cells.
    pub fn num_volumes(&self) -> usize {
        self.dims().iter().product()
    }

    /// Number of grid planes.
    pub fn num_surfaces(&self) -> usize {
        self.surface_offsets[3]
    }

    /// Cell index from per-axis indices.
    pub fn volume_id(&self, ijk: [usize; 3]) -> LocalVolumeId {
        let [_, ny, nz] = self.dims();
        LocalVolumeId::from_usize((ijk[0] * ny + ijk[1]) * nz + ijk[2])
    }

    /// Per-axis indices of a cell.
    pub fn volume_ijk(&self, id: LocalVolumeId) -> [usize; 3] {
        let [_, ny, nz] = self.dims();
        let v = id.get();
        [v / (ny * nz), (v / nz) % ny, v % nz]
    }

    /// Local surface for a grid plane.
    pub fn surface_id(&self, axis: usize, index: usize) -> LocalSurfaceId {
        LocalSurfaceId::from_usize(self.surface_offsets[axis] + index)
    }

    /// Axis and plane index of a local surface.
    pub fn surface_axis_index(&self, id: LocalSurfaceId) -> (usize, usize) {
        let s = id.get();
        let axis = self.surface_offsets[1..].partition_point(|&off| off <= s);
        (axis, s - self.surface_offsets[axis])
    }
}

/// Placement of a universe inside a parent volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Daughter {
    /// Embedded universe.
    pub univ_id: UnivId,
    /// Daughter-to-parent transform.
    pub trans_id: TransformId,
}

/// Oriented bounding zone: nested boxes in a rotated frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObzRecord {
    /// Half widths of the inner and outer boxes.
    pub half_widths: [Real3; 2],
    /// Centers of the inner and outer boxes in the box frame.
    pub offsets: [Real3; 2],
    /// Box frame to unit frame.
    pub trans_id: TransformId,
}

impl ObzRecord {
    /// Index of the inner box.
    pub const INNER: usize = 0;
    /// Index of the outer box.
    pub const OUTER: usize = 1;

    /// Distance from a box-frame point to the surface of the inner box.
    ///
    /// Returns `None` if the point is not inside the inner box.
    pub fn inner_safety(&self, pos: &Real3) -> Option<f64> {
        let rel = pos - self.offsets[Self::INNER];
        let hw = &self.half_widths[Self::INNER];
        let mut result = f64::INFINITY;
        for ax in 0..3 {
            let dist = hw[ax] - rel[ax].abs();
            if dist < 0.0 {
                return None;
            }
            result = result.min(dist);
        }
        Some(result)
    }

    /// Whether a box-frame point is beyond the outer box, and therefore
    /// outside the volume.
    pub fn is_outside_outer(&self, pos: &Real3) -> bool {
        let rel = pos - self.offsets[Self::OUTER];
        let hw = &self.half_widths[Self::OUTER];
        (0..3).any(|ax| rel[ax].abs() > hw[ax])
    }
}

/// Geometry-wide limits used to size per-track state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scalars {
    /// Maximum universe nesting depth (number of levels).
    pub max_depth: usize,
    /// Maximum number of faces in any volume.
    pub max_faces: usize,
    /// Maximum number of intersections in any volume.
    pub max_intersections: usize,
    /// Maximum logic stack depth.
    pub max_logic_depth: usize,
    /// Construction and tracking tolerance.
    pub tol: Tolerance,
}

impl Default for Scalars {
    fn default() -> Self {
        Self {
            max_depth: 0,
            max_faces: 1,
            max_intersections: 1,
            max_logic_depth: 0,
            tol: Tolerance::default(),
        }
    }
}
