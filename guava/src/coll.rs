//! A MongoDB collection of a single homogeneous entity type.

use std::fmt;
use std::sync::Arc;
use std::marker::PhantomData;
use bson::Document;
use mongodb::{
    Client,
    Namespace,
    error::{ Error as MongoError, ErrorKind as MongoErrorKind },
    options::{ WriteModel, ReplaceOneModel },
};
use tracing::debug;
use crate::{
    cursor::Cursor,
    entity::Entity,
    registry::Registry,
    transform::prepare_for_save,
    ops::*,
    bsn::*,
    error::{ Result, ResultExt },
};

/// A statically-typed (homogeneous) MongoDB collection.
pub struct Collection<T: Entity> {
    /// The backing MongoDB collection.
    inner: mongodb::Collection<Document>,
    /// The client, for bulk writes.
    client: Client,
    /// Marker tables and timestamp policies.
    registry: Arc<Registry>,
    /// Just here so that the type parameter is used.
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Collection<T> {
    /// Wraps a driver collection. Indexes are not declared here.
    pub(crate) fn new(inner: mongodb::Collection<Document>, client: Client, registry: Arc<Registry>) -> Self {
        Collection {
            inner,
            client,
            registry,
            _marker: PhantomData,
        }
    }

    /// The name of the collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Deletes the collection.
    pub async fn drop(&self) -> Result<()> {
        self.inner
            .drop()
            .await
            .chain(|| format!("can't drop collection `{}`", self.name()))
    }

    /// Returns the number of documents matching the query criteria.
    pub async fn count<Q: Count<T>>(&self, query: Q) -> Result<usize> {
        let n = self.inner
            .count_documents(query.filter())
            .with_options(Q::options())
            .await
            .chain(|| format!("error in {}::count({:#?})", self.name(), query))?;

        usize::try_from(n).chain("# of counted documents")
    }

    /// Returns `true` if at least one document matches the query criteria.
    pub async fn exists<Q: Query<T>>(&self, query: Q) -> Result<bool> {
        let mut options = find_one_options(Q::options());
        options.projection = Some(bson::doc! { "_id": 1 });

        self.inner
            .find_one(query.filter())
            .with_options(options)
            .await
            .map(|document| document.is_some())
            .chain(|| format!("error in {}::exists({:#?})", self.name(), query))
    }

    /// Retrieves the entity with the specified `_id`, if it exists.
    pub async fn find_by_id(&self, id: &T::Id) -> Result<Option<T>> {
        self.find_one(id_filter(id)?).await
    }

    /// Retrieves a single entity satisfying the query, if one exists.
    pub async fn find_one<Q: Query<T>>(&self, query: Q) -> Result<Option<T>> {
        self.inner
            .find_one(query.filter())
            .with_options(find_one_options(Q::options()))
            .await
            .chain(|| format!("error in {}::find_one({:#?})", self.name(), query))?
            .map(deserialize_document)
            .transpose()
    }

    /// Streams all entities satisfying the query.
    pub async fn find_many<Q: Query<T>>(&self, query: Q) -> Result<Cursor<T>> {
        self.inner
            .find(query.filter())
            .with_options(Q::options())
            .await
            .map(Cursor::new)
            .chain(|| format!("error in {}::find_many({:#?})", self.name(), query))
    }

    /// Retrieves all entities satisfying the query at once.
    pub async fn find<Q: Query<T>>(&self, query: Q) -> Result<Vec<T>> {
        self.find_many(query).await?.collect_all().await
    }

    /// Deletes the entity with the specified `_id`. Returns `true` if it
    /// was found and deleted.
    pub async fn remove_by_id(&self, id: &T::Id) -> Result<bool> {
        self.remove_one(id_filter(id)?).await
    }

    /// Deletes one document. Returns `true` if one was found and deleted.
    pub async fn remove_one<Q: Delete<T>>(&self, query: Q) -> Result<bool> {
        self.inner
            .delete_one(query.filter())
            .with_options(Q::options())
            .await
            .map(|result| result.deleted_count > 0)
            .chain(|| format!("error in {}::remove_one({:#?})", self.name(), query))
    }

    /// Deletes many documents. Returns the number of deleted documents.
    pub async fn remove<Q: Delete<T>>(&self, query: Q) -> Result<usize> {
        let result = self.inner
            .delete_many(query.filter())
            .with_options(Q::options())
            .await
            .chain(|| format!("error in {}::remove({:#?})", self.name(), query))?;

        usize::try_from(result.deleted_count).chain("# of deleted documents")
    }

    /// Inserts or replaces the entity, keyed by its `_id`.
    ///
    /// Timestamps are maintained if the entity type tracks them, case
    /// transformations are applied to the stored document, and the
    /// `pre_save()` and `post_save()` hooks run around the write.
    pub async fn save(&self, entity: &mut T) -> Result<()> {
        let document = prepare_for_save(&self.registry, entity)?;
        let filter = id_filter(entity.id())?;

        self.inner
            .replace_one(filter, document)
            .with_options(T::replace_options())
            .await
            .chain(|| format!("error in {}::save({:?})", self.name(), entity.id()))?;

        entity.post_save();
        debug!(collection = self.name(), id = ?entity.id(), "saved entity");

        Ok(())
    }

    /// Inserts or replaces many entities in a single unordered bulk write.
    /// An empty slice costs no round trip. Servers older than MongoDB 8.0
    /// can't do bulk writes across a client; there, the entities are saved
    /// one by one, as `save_each()` does.
    pub async fn save_all(&self, entities: &mut [T]) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }

        let replacements = prepare_replacements(&self.registry, entities)?;
        let models = replace_models::<T>(&self.inner.namespace(), &replacements);

        match self.client.bulk_write(models).ordered(false).await {
            Ok(_) => {}
            Err(error) if bulk_write_unsupported(&error) => {
                debug!(collection = self.name(), "bulk write unsupported, replacing one by one");
                self.replace_each(replacements).await?;
            }
            Err(error) => {
                return Err(error).chain(|| format!("error in {}::save_all()", self.name()));
            }
        }

        entities.iter_mut().for_each(T::post_save);
        debug!(collection = self.name(), count = entities.len(), "saved entities");

        Ok(())
    }

    /// Inserts or replaces many entities, one round trip each.
    pub async fn save_each(&self, entities: &mut [T]) -> Result<()> {
        let replacements = prepare_replacements(&self.registry, entities)?;

        self.replace_each(replacements).await?;
        entities.iter_mut().for_each(T::post_save);

        Ok(())
    }

    /// Writes prepared replacements one at a time, in order.
    async fn replace_each(&self, replacements: Vec<Replacement>) -> Result<()> {
        for Replacement { filter, document } in replacements {
            self.inner
                .replace_one(filter, document)
                .with_options(T::replace_options())
                .await
                .chain(|| format!("error in {}::save_each()", self.name()))?;
        }

        Ok(())
    }
}

/// An entity prepared for saving: the filter matching its `_id`, and the
/// document replacing the stored one.
#[derive(Debug, Clone)]
pub(crate) struct Replacement {
    /// `{ "_id": ... }`.
    pub(crate) filter: Document,
    /// The transformed, serialized entity.
    pub(crate) document: Document,
}

/// Prepares each entity for saving, in order.
pub(crate) fn prepare_replacements<T: Entity>(
    registry: &Registry,
    entities: &mut [T],
) -> Result<Vec<Replacement>> {
    entities
        .iter_mut()
        .map(|entity| {
            let document = prepare_for_save(registry, entity)?;
            let filter = id_filter(entity.id())?;
            Ok(Replacement { filter, document })
        })
        .collect()
}

/// One replacement model per prepared entity, upserting if the entity
/// type's replace options say so.
pub(crate) fn replace_models<T: Entity>(namespace: &Namespace, replacements: &[Replacement]) -> Vec<WriteModel> {
    let upsert = T::replace_options().upsert.unwrap_or(false);

    replacements
        .iter()
        .map(|replacement| WriteModel::ReplaceOne(
            ReplaceOneModel::builder()
                .namespace(namespace.clone())
                .filter(replacement.filter.clone())
                .replacement(replacement.document.clone())
                .upsert(upsert)
                .build()
        ))
        .collect()
}

/// `CommandNotFound`, as reported by servers which predate a command.
const COMMAND_NOT_FOUND: i32 = 59;

/// Whether a failed `Client::bulk_write()` means the server can't do bulk
/// writes at all. Nothing has been written in that case.
pub(crate) fn bulk_write_unsupported(error: &MongoError) -> bool {
    match *error.kind {
        MongoErrorKind::IncompatibleServer { .. } => true,
        MongoErrorKind::Command(ref command) => command.code == COMMAND_NOT_FOUND,
        _ => false,
    }
}

impl<T: Entity> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Collection {
            inner: self.inner.clone(),
            client: self.client.clone(),
            registry: Arc::clone(&self.registry),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Collection<{}>({})", std::any::type_name::<T>(), self.name())
    }
}
