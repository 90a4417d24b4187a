//! Small enums and flag sets shared by construction and navigation.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Masking priority of a volume.
///
/// Higher values win when regions overlap during conversion; the
/// navigation core only cares about `Background` and `Exterior`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ZOrder {
    /// Unset.
    #[default]
    Invalid,
    /// Implicit fill for space not claimed by any other volume.
    Background,
    /// Material-filled region.
    Media,
    /// Region filled by a voxel array.
    Array,
    /// Region filled by a daughter universe.
    Hole,
    /// Implicit boundary of a daughter universe.
    ImplicitExterior,
    /// Explicit exterior of the root universe.
    Exterior,
}

impl ZOrder {
    /// Single-character code.
    pub fn to_char(self) -> char {
        match self {
            ZOrder::Invalid => '!',
            ZOrder::Background => 'B',
            ZOrder::Media => 'M',
            ZOrder::Array => 'A',
            ZOrder::Hole => 'H',
            ZOrder::ImplicitExterior => 'x',
            ZOrder::Exterior => 'X',
        }
    }
}

/// Notation of logic token streams in construction input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicNotation {
    /// Reverse Polish notation, evaluated directly by the trackers.
    #[default]
    Postfix,
    /// Conventional notation with parentheses.
    Infix,
}

bitflags! {
    /// Properties of a volume that select tracking algorithms.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct VolumeFlags: u32 {
        /// Crossing a face may leave the track in the same volume.
        const INTERNAL_SURFACES = 1;
        /// Not reachable through the BIH; found only as a fallback.
        const IMPLICIT_VOL = 1 << 1;
        /// Every face supports an exact distance calculation.
        const SIMPLE_SAFETY = 1 << 2;
        /// The volume is filled by a daughter universe.
        const EMBEDDED_UNIVERSE = 1 << 3;
    }
}

impl VolumeFlags {
    /// Whether the nearest face crossing is always the volume boundary.
    pub fn simple_intersection(self) -> bool {
        !self.intersects(Self::INTERNAL_SURFACES | Self::IMPLICIT_VOL)
    }

    /// Whether a minimum over face distances is a valid safety distance.
    pub fn supports_simple_safety(self) -> bool {
        self.contains(Self::IMPLICIT_VOL)
            || (self.contains(Self::SIMPLE_SAFETY) && !self.contains(Self::INTERNAL_SURFACES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zorder() {
        assert_eq!(ZOrder::default(), ZOrder::Invalid);
        assert_eq!(ZOrder::Exterior.to_char(), 'X');
        assert!(ZOrder::Exterior > ZOrder::Media);
        let json = serde_json::to_string(&ZOrder::ImplicitExterior).unwrap();
        assert_eq!(json, "\"implicit_exterior\"");
    }

    #[test]
    fn test_flags() {
        let f = VolumeFlags::SIMPLE_SAFETY;
        assert!(f.simple_intersection());
        assert!(f.supports_simple_safety());

        let f = VolumeFlags::SIMPLE_SAFETY | VolumeFlags::INTERNAL_SURFACES;
        assert!(!f.simple_intersection());
        assert!(!f.supports_simple_safety());

        let f = VolumeFlags::IMPLICIT_VOL;
        assert!(!f.simple_intersection());
        assert!(f.supports_simple_safety());
        assert_eq!(f.bits(), 2);
    }
}
