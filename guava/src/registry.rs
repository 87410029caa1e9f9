//! Per-type memo of everything derived from an entity's markers.

use std::any::TypeId;
use std::future::Future;
use std::sync::Arc;
use dashmap::{ DashMap, DashSet };
use tracing::{ debug, trace };
use crate::{
    entity::Entity,
    schema::{ Schema, TypeDescriptor },
    naming::resolve_collection_name,
    error::Result,
};

/// Concurrent, type-keyed cache of marker tables, collection names,
/// timestamp policies and the "indexes already declared" flags.
///
/// Every getter is safe to call concurrently. Two threads racing on the
/// first access to a type may both compute the value; both results are
/// equal, and the later one is kept. The index gate is best-effort in the
/// same way: racing first accesses may each declare the indexes, but once
/// a declaration is observed to have succeeded, no further one happens.
#[derive(Debug, Default)]
pub struct Registry {
    /// Marker tables.
    schemas: DashMap<TypeId, Arc<Schema>>,
    /// Resolved collection names.
    names: DashMap<TypeId, Arc<str>>,
    /// Timestamp policies.
    tracking: DashMap<TypeId, bool>,
    /// Types whose indexes have been declared.
    indexed: DashSet<TypeId>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The marker table of `T`, computed by `T::schema()` on first use.
    pub fn schema<T: Entity>(&self) -> Arc<Schema> {
        let key = TypeId::of::<T>();

        if let Some(schema) = self.schemas.get(&key) {
            return Arc::clone(schema.value());
        }

        let schema = Arc::new(T::schema());
        self.schemas.insert(key, Arc::clone(&schema));
        schema
    }

    /// The collection name of the type `schema` describes. Failures are
    /// not cached: a later call tries again.
    pub fn collection_name(&self, schema: &Schema) -> Result<Arc<str>> {
        let ty = schema.type_descriptor();

        if let Some(name) = self.names.get(&ty.id()) {
            trace!(entity = %ty, name = &**name.value(), "collection name cache hit");
            return Ok(Arc::clone(name.value()));
        }

        let name: Arc<str> = resolve_collection_name(schema)?.into();
        debug!(entity = %ty, name = &*name, "resolved collection name");
        self.names.insert(ty.id(), Arc::clone(&name));

        Ok(name)
    }

    /// Whether saving entities of the type `schema` describes maintains
    /// their timestamps. `false` without a collection marker.
    pub fn tracks_timestamps(&self, schema: &Schema) -> bool {
        let id = schema.type_descriptor().id();

        if let Some(track) = self.tracking.get(&id) {
            return *track;
        }

        let track = schema
            .collection_marker()
            .map_or(false, |marker| marker.track_timestamps);

        self.tracking.insert(id, track);
        track
    }

    /// Whether the indexes of the described type have been declared.
    pub fn indexes_ensured(&self, ty: &TypeDescriptor) -> bool {
        self.indexed.contains(&ty.id())
    }

    /// Runs `ensure` unless it has already succeeded for `ty`.
    /// The type is only marked as indexed if `ensure` succeeds.
    pub fn ensure_indexes_once<F>(&self, ty: &TypeDescriptor, ensure: F) -> Result<()>
        where F: FnOnce() -> Result<()>
    {
        if self.indexes_ensured(ty) {
            trace!(entity = %ty, "indexes already declared");
            return Ok(());
        }

        ensure()?;
        self.indexed.insert(ty.id());

        Ok(())
    }

    /// The asynchronous counterpart of `ensure_indexes_once()`.
    pub async fn ensure_indexes_once_async<F, Fut>(&self, ty: &TypeDescriptor, ensure: F) -> Result<()>
        where F: FnOnce() -> Fut,
              Fut: Future<Output = Result<()>>,
    {
        if self.indexes_ensured(ty) {
            trace!(entity = %ty, "indexes already declared");
            return Ok(());
        }

        ensure().await?;
        self.indexed.insert(ty.id());

        Ok(())
    }

    /// Forgets everything. Meant for test isolation.
    pub fn reset(&self) {
        self.schemas.clear();
        self.names.clear();
        self.tracking.clear();
        self.indexed.clear();
        debug!("metadata registry reset");
    }
}
