//! Declarative markers attached to entity types and their members.
//!
//! A `CollectionMarker` describes the collection an entity type lives in.
//! `FieldMarker`s describe indexes on members and transformations applied
//! to member values before saving. Markers are plain data: they are usually
//! emitted by `#[derive(Entity)]`, but can be declared by hand through the
//! `Schema` builder too.

use crate::literal::{ IndexOrder, GeospatialKind };

/// Collection-level settings of an entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionMarker {
    /// Explicit collection name. Blank or absent means "derive the name
    /// by pluralizing the type name".
    pub name: Option<String>,
    /// Whether `created_at` and `updated_at` are maintained on save.
    pub track_timestamps: bool,
}

impl CollectionMarker {
    /// A marker with an explicit collection name.
    pub fn named<S: Into<String>>(name: S) -> Self {
        CollectionMarker {
            name: Some(name.into()),
            track_timestamps: false,
        }
    }

    /// Builder-style setter for timestamp tracking.
    pub fn track_timestamps(mut self, track: bool) -> Self {
        self.track_timestamps = track;
        self
    }
}

/// A unique, ascending index on one member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueIndex {
    /// Skip documents which lack the member.
    pub sparse: bool,
    /// Index name; MongoDB picks one if absent.
    pub name: Option<String>,
}

/// A non-unique index on one member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleFieldIndex {
    /// Direction (or hashing) of the key.
    pub order: IndexOrder,
    /// Skip documents which lack the member.
    pub sparse: bool,
    /// Index name; MongoDB picks one if absent.
    pub name: Option<String>,
}

/// A geospatial index on one member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeospatialIndex {
    /// Planar or spherical geometry.
    pub kind: GeospatialKind,
    /// Index name; MongoDB picks one if absent.
    pub name: Option<String>,
}

/// One key of a multi-member index. Members whose markers share the same
/// `name` make up a single index, keyed in member declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundIndex {
    /// Grouping key, also used as the name of the resulting index.
    pub name: String,
    /// Direction (or hashing) of this member's key.
    pub order: IndexOrder,
}

/// Lowercase the string value of the member before saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lowercase;

/// Uppercase the string value of the member before saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uppercase;

/// Any marker that can be attached to a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMarker {
    /// See `UniqueIndex`.
    UniqueIndex(UniqueIndex),
    /// See `SingleFieldIndex`.
    SingleFieldIndex(SingleFieldIndex),
    /// See `GeospatialIndex`.
    GeospatialIndex(GeospatialIndex),
    /// See `CompoundIndex`.
    CompoundIndex(CompoundIndex),
    /// See `Lowercase`.
    Lowercase(Lowercase),
    /// See `Uppercase`.
    Uppercase(Uppercase),
}

/// Implemented by every concrete marker type, so that members can be
/// scanned for one kind of marker at a time.
pub trait Marker: Into<FieldMarker> {
    /// Returns the marker if it is of this kind.
    fn extract(marker: &FieldMarker) -> Option<&Self>;
}

/// `From` and `Marker` boilerplate for each variant of `FieldMarker`.
macro_rules! impl_marker {
    ($($variant:ident,)*) => {$(
        impl From<$variant> for FieldMarker {
            fn from(marker: $variant) -> Self {
                FieldMarker::$variant(marker)
            }
        }

        impl Marker for $variant {
            fn extract(marker: &FieldMarker) -> Option<&Self> {
                match *marker {
                    FieldMarker::$variant(ref marker) => Some(marker),
                    _ => None,
                }
            }
        }
    )*}
}

impl_marker! {
    UniqueIndex,
    SingleFieldIndex,
    GeospatialIndex,
    CompoundIndex,
    Lowercase,
    Uppercase,
}
