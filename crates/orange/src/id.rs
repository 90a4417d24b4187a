//! Strongly typed indices.
//!
//! Every table in the navigation data is indexed by its own id type so that
//! a surface index can never be used to look up a volume. An id wraps a
//! `u32`; the maximum value is reserved as the "null" sentinel, which is
//! also the default.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Add, Sub};

/// A type-safe index into a table of `Tag` items.
pub struct OpaqueId<Tag> {
    value: u32,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> OpaqueId<Tag> {
    const NULL: u32 = u32::MAX;

    /// Create from an index; the index must not be the sentinel.
    #[inline]
    pub fn new(value: u32) -> Self {
        debug_assert!(value != Self::NULL, "opaque id out of range");
        Self {
            value,
            _tag: PhantomData,
        }
    }

    /// Create from a `usize` index.
    #[inline]
    pub fn from_usize(value: usize) -> Self {
        debug_assert!(value < Self::NULL as usize, "opaque id out of range");
        Self::new(value as u32)
    }

    /// The null id.
    #[inline]
    pub const fn null() -> Self {
        Self {
            value: Self::NULL,
            _tag: PhantomData,
        }
    }

    /// Whether the id refers to an item.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.value != Self::NULL
    }

    /// Index value; the id must be valid.
    #[inline]
    pub fn get(self) -> usize {
        debug_assert!(self.is_valid(), "dereferenced a null opaque id");
        self.value as usize
    }

    /// Raw value, including the sentinel.
    #[inline]
    pub fn unchecked_get(self) -> u32 {
        self.value
    }

    /// `Some(self)` if valid.
    #[inline]
    pub fn valid(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }

    /// Advance to the next index.
    #[inline]
    pub fn increment(&mut self) {
        *self = *self + 1;
    }

    /// Step back to the previous index.
    #[inline]
    pub fn decrement(&mut self) {
        *self = *self - 1;
    }
}

impl<Tag> Clone for OpaqueId<Tag> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag> Copy for OpaqueId<Tag> {}

impl<Tag> Default for OpaqueId<Tag> {
    fn default() -> Self {
        Self::null()
    }
}

impl<Tag> PartialEq for OpaqueId<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<Tag> Eq for OpaqueId<Tag> {}

impl<Tag> PartialOrd for OpaqueId<Tag> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Tag> Ord for OpaqueId<Tag> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<Tag> Hash for OpaqueId<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<Tag> Add<usize> for OpaqueId<Tag> {
    type Output = Self;

    fn add(self, rhs: usize) -> Self {
        Self::from_usize(self.get() + rhs)
    }
}

impl<Tag> Sub<usize> for OpaqueId<Tag> {
    type Output = Self;

    fn sub(self, rhs: usize) -> Self {
        debug_assert!(rhs <= self.get(), "opaque id underflow");
        Self::from_usize(self.get() - rhs)
    }
}

impl<Tag> Sub for OpaqueId<Tag> {
    type Output = isize;

    fn sub(self, rhs: Self) -> isize {
        self.get() as isize - rhs.get() as isize
    }
}

impl<Tag> fmt::Debug for OpaqueId<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<Tag> fmt::Display for OpaqueId<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.value)
        } else {
            f.write_str("<null>")
        }
    }
}

impl<Tag> Serialize for OpaqueId<Tag> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.valid().map(|id| id.value).serialize(serializer)
    }
}

impl<'de, Tag> Deserialize<'de> for OpaqueId<Tag> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<u32>::deserialize(deserializer)? {
            Some(Self::NULL) => Err(serde::de::Error::custom("opaque id out of range")),
            Some(v) => Ok(Self::new(v)),
            None => Ok(Self::null()),
        }
    }
}

macro_rules! define_ids {
    ($($(#[$meta:meta])* $name:ident => $tag:ident;)*) => {
        $(
            #[doc(hidden)]
            #[derive(Debug)]
            pub enum $tag {}

            $(#[$meta])*
            pub type $name = OpaqueId<$tag>;
        )*
    };
}

define_ids! {
    /// Global implementation volume.
    VolumeId => VolumeTag;
    /// Placement of a volume reported to the caller.
    VolumeInstanceId => VolumeInstanceTag;
    /// Global surface.
    SurfaceId => SurfaceTag;
    /// Volume within a universe.
    LocalVolumeId => LocalVolumeTag;
    /// Surface within a universe.
    LocalSurfaceId => LocalSurfaceTag;
    /// Index into a volume's sorted face list.
    FaceId => FaceTag;
    /// Universe.
    UnivId => UnivTag;
    /// CSG unit record.
    SimpleUnitId => SimpleUnitTag;
    /// Rect array record.
    RectArrayId => RectArrayTag;
    /// Stored transform.
    TransformId => TransformTag;
    /// Daughter placement.
    DaughterId => DaughterTag;
    /// Depth in the universe hierarchy of a track.
    UnivLevelId => UnivLevelTag;
    /// Row of per-track state.
    TrackSlotId => TrackSlotTag;
    /// BIH tree node.
    BihNodeId => BihNodeTag;
    /// Oriented bounding zone record.
    ObzId => ObzTag;
}
