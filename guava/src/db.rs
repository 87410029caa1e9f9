//! The connection handle: a MongoDB database plus the registry of
//! everything derived from the entity types stored in it.

use std::sync::Arc;
use std::time::Duration;
use bson::Document;
use parking_lot::RwLock;
use mongodb::{ Client, Database, options::ClientOptions };
use tracing::info;
use crate::{
    coll::Collection,
    entity::Entity,
    registry::Registry,
    index::ensure_indexes_async,
    error::{ Error, ErrorKind, Result, ResultExt },
};

/// Connection settings applied on top of those parsed from the URI.
/// `None` leaves the driver's (or the URI's) setting alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Application name reported to the server.
    pub app_name: Option<String>,
    /// Minimum number of pooled connections.
    pub min_pool_size: Option<u32>,
    /// Maximum number of pooled connections.
    pub max_pool_size: Option<u32>,
    /// Timeout for establishing a single connection.
    pub connect_timeout: Option<Duration>,
    /// Timeout for selecting a suitable server.
    pub server_selection_timeout: Option<Duration>,
    /// Database to use instead of the one named in the URI, unless blank.
    pub database: Option<String>,
}

impl ConnectOptions {
    /// Overwrites the corresponding client options.
    pub(crate) fn apply_to(&self, options: &mut ClientOptions) {
        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(min) = self.min_pool_size {
            options.min_pool_size = Some(min);
        }
        if let Some(max) = self.max_pool_size {
            options.max_pool_size = Some(max);
        }
        if let Some(timeout) = self.connect_timeout {
            options.connect_timeout = Some(timeout);
        }
        if let Some(timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(timeout);
        }
    }

    /// The database to connect to: the override if any, otherwise the
    /// default database of the connection string.
    pub(crate) fn database_name(&self, options: &ClientOptions) -> Result<String> {
        let non_blank = |name: &&String| !name.trim().is_empty();

        self.database
            .as_ref()
            .filter(non_blank)
            .or_else(|| options.default_database.as_ref().filter(non_blank))
            .cloned()
            .ok_or_else(|| Error::configuration(
                "the connection string doesn't name a database and none was given"
            ))
    }

    /// Applies these settings to the options parsed from a connection
    /// string, and picks the database. Shared by both front ends.
    pub(crate) fn configure(&self, mut options: ClientOptions) -> Result<(ClientOptions, String)> {
        self.apply_to(&mut options);
        let database_name = self.database_name(&options)?;
        Ok((options, database_name))
    }
}

/// What a live connection owns, generic over the flavor of the driver.
#[derive(Debug)]
pub(crate) struct Connection<C, D> {
    /// The client, also used for bulk writes.
    pub(crate) client: C,
    /// The database all entity collections live in.
    pub(crate) database: D,
    /// Metadata derived from the entity types, discarded on disconnect.
    pub(crate) registry: Arc<Registry>,
}

/// The connection of a handle; `None` while disconnected.
#[derive(Debug)]
pub(crate) struct ConnectionState<C, D>(RwLock<Option<Arc<Connection<C, D>>>>);

impl<C, D> Default for ConnectionState<C, D> {
    fn default() -> Self {
        ConnectionState(RwLock::new(None))
    }
}

impl<C, D> ConnectionState<C, D> {
    /// Replaces the current connection, if any, with a fresh registry.
    pub(crate) fn replace(&self, client: C, database: D) {
        let connection = Connection {
            client,
            database,
            registry: Arc::new(Registry::new()),
        };

        *self.0.write() = Some(Arc::new(connection));
    }

    /// Forgets the current connection.
    pub(crate) fn take(&self) -> Option<Arc<Connection<C, D>>> {
        self.0.write().take()
    }

    /// Whether there is a connection.
    pub(crate) fn is_connected(&self) -> bool {
        self.0.read().is_some()
    }

    /// The current connection, or a `NotConnected` error.
    pub(crate) fn get(&self) -> Result<Arc<Connection<C, D>>> {
        self.0.read().as_ref().map(Arc::clone).ok_or_else(not_connected)
    }

    /// The registry of the current connection.
    pub(crate) fn registry(&self) -> Result<Arc<Registry>> {
        self.get().map(|connection| Arc::clone(&connection.registry))
    }

    /// The collection name of `T`, resolved through the registry.
    pub(crate) fn collection_name<T: Entity>(&self) -> Result<Arc<str>> {
        let registry = self.registry()?;
        let schema = registry.schema::<T>();
        registry.collection_name(&schema)
    }
}

/// The error returned by every operation needing a connection.
fn not_connected() -> Error {
    Error::new(ErrorKind::NotConnected, "not connected to a database")
}

/// A non-blocking handle to a MongoDB database.
///
/// ```no_run
/// # use guava::prelude::*;
/// # async fn run() -> GuavaResult<()> {
/// let odm = Odm::new();
/// odm.connect("mongodb://localhost:27017/shop").await?;
/// assert!(odm.is_connected());
/// # Ok(())
/// # }
/// ```
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
    pub async fn connect(&self, uri: &str) -> Result<()> {
        self.connect_with(uri, ConnectOptions::default()).await
    }

    /// Connects to a database with additional settings. Replaces any
    /// existing connection, along with its registry.
    pub async fn connect_with(&self, uri: &str, options: ConnectOptions) -> Result<()> {
        let parsed = ClientOptions::parse(uri)
            .await
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

    /// Forgets the connection and its registry. Collections obtained
    /// earlier stay usable.
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
    pub async fn collection<T: Entity>(&self) -> Result<Collection<T>> {
        let connection = self.state.get()?;
        let registry = &connection.registry;
        let schema = registry.schema::<T>();
        let name = registry.collection_name(&schema)?;
        let inner = connection.database.collection::<Document>(&name);

        registry
            .ensure_indexes_once_async(schema.type_descriptor(), || {
                ensure_indexes_async(&inner, &schema)
            })
            .await
            .chain(|| format!("can't declare indexes on `{}`", name))?;

        Ok(Collection::new(inner, connection.client.clone(), Arc::clone(registry)))
    }
}
