//! The Guava prelude provides re-exports of the most commonly used traits
//! and types for convenience, including ones from crates `bson` and `mongodb`.

pub use crate::{
    db::{ Odm, ConnectOptions },
    coll::Collection,
    cursor::Cursor,
    entity::{ Entity, Timestamps },
    schema::{ Schema, Member, MemberDescriptor, TypeDescriptor },
    marker::{
        CollectionMarker, UniqueIndex, SingleFieldIndex, GeospatialIndex,
        CompoundIndex, Lowercase, Uppercase,
    },
    registry::Registry,
    ops::*,
    literal::{ IndexType, Order, IndexOrder, GeospatialKind },
    error::ErrorExt,
    error::Error as GuavaError,
    error::ErrorKind as GuavaErrorKind,
    error::Result as GuavaResult,
};
pub use bson::{ Bson, Document, oid::ObjectId, doc, bson };
pub use mongodb::{
    Client,
    Database,
    IndexModel,
    options::{ FindOptions, CountOptions, DeleteOptions, ReplaceOptions, IndexOptions },
};
