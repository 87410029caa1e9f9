//! The blocking front end, on top of `mongodb::sync`. It mirrors the
//! non-blocking `Odm`, `Collection` and `Cursor` one to one.

use std::fmt;
use std::sync::Arc;
use std::marker::PhantomData;
use bson::Document;
use mongodb::{
    sync::{ Client, Database },
    options::ClientOptions,
};
use serde::Deserialize;
use tracing::{ debug, info };
use crate::{
    db::{ ConnectOptions, ConnectionState },
    coll::{ Replacement, prepare_replacements, replace_models, bulk_write_unsupported },
    entity::Entity,
    registry::Registry,
    index::ensure_indexes,
    transform::prepare_for_save,
    ops::*,
    bsn::*,
    error::{ Result, ResultExt },
};

/// A blocking handle to a MongoDB database.
#[derive(Debug, Default)]
pub struct Odm {
    /// The client, database and registry in use.
    state: ConnectionState<Client, Database>,
}

impl Odm {
    /// A handle which is not yet connected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects to the database named in `uri`.
    pub fn connect(&self, uri: &str) -> Result<()> {
        self.connect_with(uri, ConnectOptions::default())
    }

    /// Connects to a database with additional settings. Replaces any
    /// existing connection, along with its registry.
    pub fn connect_with(&self, uri: &str, options: ConnectOptions) -> Result<()> {
        let parsed = ClientOptions::parse(uri)
            .run()
            .chain("can't parse connection string")?;
        let (client_options, database_name) = options.configure(parsed)?;
        let client = Client::with_options(client_options).chain("can't create client")?;

        self.attach(client, &database_name);
        Ok(())
    }

    /// Uses an existing client. Replaces any existing connection, along
    /// with its registry.
    pub fn attach(&self, client: Client, database_name: &str) {
        let database = client.database(database_name);
        self.state.replace(client, database);
        info!(database = database_name, "connected");
    }

    /// Forgets the connection and its registry.
    pub fn disconnect(&self) {
        if let Some(connection) = self.state.take() {
            info!(database = connection.database.name(), "disconnected");
        }
    }

    /// Whether `connect()` or `attach()` has happened since the last
    /// `disconnect()`.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// The underlying MongoDB database.
    pub fn database(&self) -> Result<Database> {
        self.state.get().map(|connection| connection.database.clone())
    }

    /// The registry of the current connection.
    pub fn registry(&self) -> Result<Arc<Registry>> {
        self.state.registry()
    }

    /// The name of the collection storing entities of type `T`.
    pub fn collection_name<T: Entity>(&self) -> Result<Arc<str>> {
        self.state.collection_name::<T>()
    }

    /// The collection of `T`. Declares the indexes of `T` the first time
    /// this succeeds on the current connection.
    pub fn collection<T: Entity>(&self) -> Result<Collection<T>> {
        let connection = self.state.get()?;
        let registry = &connection.registry;
        let schema = registry.schema::<T>();
        let name = registry.collection_name(&schema)?;
        let inner = connection.database.collection::<Document>(&name);

        registry
            .ensure_indexes_once(schema.type_descriptor(), || ensure_indexes(&inner, &schema))
            .chain(|| format!("can't declare indexes on `{}`", name))?;

        Ok(Collection {
            inner,
            client: connection.client.clone(),
            registry: Arc::clone(registry),
            _marker: PhantomData,
        })
    }
}

/// A statically-typed (homogeneous) MongoDB collection, blocking flavor.
pub struct Collection<T: Entity> {
    /// The backing MongoDB collection.
    inner: mongodb::sync::Collection<Document>,
    /// The client, for bulk writes.
    client: Client,
    /// Marker tables and timestamp policies.
    registry: Arc<Registry>,
    /// Just here so that the type parameter is used.
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Collection<T> {
    /// The name of the collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Deletes the collection.
    pub fn drop(&self) -> Result<()> {
        self.inner
            .drop()
            .run()
            .chain(|| format!("can't drop collection `{}`", self.name()))
    }

    /// Returns the number of documents matching the query criteria.
    pub fn count<Q: Count<T>>(&self, query: Q) -> Result<usize> {
        let n = self.inner
            .count_documents(query.filter())
            .with_options(Q::options())
            .run()
            .chain(|| format!("error in {}::count({:#?})", self.name(), query))?;

        usize::try_from(n).chain("# of counted documents")
    }

    /// Returns `true` if at least one document matches the query criteria.
    pub fn exists<Q: Query<T>>(&self, query: Q) -> Result<bool> {
        let mut options = find_one_options(Q::options());
        options.projection = Some(bson::doc! { "_id": 1 });

        self.inner
            .find_one(query.filter())
            .with_options(options)
            .run()
            .map(|document| document.is_some())
            .chain(|| format!("error in {}::exists({:#?})", self.name(), query))
    }

    /// Retrieves the entity with the specified `_id`, if it exists.
    pub fn find_by_id(&self, id: &T::Id) -> Result<Option<T>> {
        self.find_one(id_filter(id)?)
    }

    /// Retrieves a single entity satisfying the query, if one exists.
    pub fn find_one<Q: Query<T>>(&self, query: Q) -> Result<Option<T>> {
        self.inner
            .find_one(query.filter())
            .with_options(find_one_options(Q::options()))
            .run()
            .chain(|| format!("error in {}::find_one({:#?})", self.name(), query))?
            .map(deserialize_document)
            .transpose()
    }

    /// Iterates over all entities satisfying the query.
    pub fn find_many<Q: Query<T>>(&self, query: Q) -> Result<Cursor<T>> {
        self.inner
            .find(query.filter())
            .with_options(Q::options())
            .run()
            .map(Cursor::new)
            .chain(|| format!("error in {}::find_many({:#?})", self.name(), query))
    }

    /// Retrieves all entities satisfying the query at once.
    pub fn find<Q: Query<T>>(&self, query: Q) -> Result<Vec<T>> {
        self.find_many(query)?.collect()
    }

    /// Deletes the entity with the specified `_id`. Returns `true` if it
    /// was found and deleted.
    pub fn remove_by_id(&self, id: &T::Id) -> Result<bool> {
        self.remove_one(id_filter(id)?)
    }

    /// Deletes one document. Returns `true` if one was found and deleted.
    pub fn remove_one<Q: Delete<T>>(&self, query: Q) -> Result<bool> {
        self.inner
            .delete_one(query.filter())
            .with_options(Q::options())
            .run()
            .map(|result| result.deleted_count > 0)
            .chain(|| format!("error in {}::remove_one({:#?})", self.name(), query))
    }

    /// Deletes many documents. Returns the number of deleted documents.
    pub fn remove<Q: Delete<T>>(&self, query: Q) -> Result<usize> {
        let result = self.inner
            .delete_many(query.filter())
            .with_options(Q::options())
            .run()
            .chain(|| format!("error in {}::remove({:#?})", self.name(), query))?;

        usize::try_from(result.deleted_count).chain("# of deleted documents")
    }

    /// Inserts or replaces the entity, keyed by its `_id`. See the
    /// non-blocking `Collection::save()` for what happens around the write.
    pub fn save(&self, entity: &mut T) -> Result<()> {
        let document = prepare_for_save(&self.registry, entity)?;
        let filter = id_filter(entity.id())?;

        self.inner
            .replace_one(filter, document)
            .with_options(T::replace_options())
            .run()
            .chain(|| format!("error in {}::save({:?})", self.name(), entity.id()))?;

        entity.post_save();
        debug!(collection = self.name(), id = ?entity.id(), "saved entity");

        Ok(())
    }

    /// Inserts or replaces many entities in a single unordered bulk write,
    /// or one by one on servers older than MongoDB 8.0.
    pub fn save_all(&self, entities: &mut [T]) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }

        let replacements = prepare_replacements(&self.registry, entities)?;
        let models = replace_models::<T>(&self.inner.namespace(), &replacements);

        match self.client.bulk_write(models).ordered(false).run() {
            Ok(_) => {}
            Err(error) if bulk_write_unsupported(&error) => {
                debug!(collection = self.name(), "bulk write unsupported, replacing one by one");
                self.replace_each(replacements)?;
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
    pub fn save_each(&self, entities: &mut [T]) -> Result<()> {
        let replacements = prepare_replacements(&self.registry, entities)?;

        self.replace_each(replacements)?;
        entities.iter_mut().for_each(T::post_save);

        Ok(())
    }

    /// Writes prepared replacements one at a time, in order.
    fn replace_each(&self, replacements: Vec<Replacement>) -> Result<()> {
        for Replacement { filter, document } in replacements {
            self.inner
                .replace_one(filter, document)
                .with_options(T::replace_options())
                .run()
                .chain(|| format!("error in {}::save_each()", self.name()))?;
        }

        Ok(())
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

/// A typed iterator over a blocking MongoDB cursor.
pub struct Cursor<T> {
    /// The underlying MongoDB cursor.
    inner: mongodb::sync::Cursor<Document>,
    /// Just here so that the type parameter is used.
    _marker: PhantomData<fn() -> T>,
}

impl<T> Cursor<T> where T: for<'a> Deserialize<'a> {
    /// Wraps an untyped MongoDB cursor.
    fn new(inner: mongodb::sync::Cursor<Document>) -> Self {
        Cursor {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<T> Iterator for Cursor<T> where T: for<'a> Deserialize<'a> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|result| {
            result
                .chain("can't step Cursor")
                .and_then(deserialize_document)
        })
    }
}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Cursor<{}>", std::any::type_name::<T>())
    }
}
