//! Building index declarations from member markers, and handing them to
//! MongoDB.

use async_trait::async_trait;
use bson::{ Bson, Document };
use mongodb::{ IndexModel, options::IndexOptions };
use tracing::{ debug, warn };
use crate::{
    schema::Schema,
    literal::{ IndexType, Order },
    marker::{ UniqueIndex, SingleFieldIndex, GeospatialIndex, CompoundIndex },
    error::Result,
};

/// Options of a single index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSpecOptions {
    /// Reject duplicate keys.
    pub unique: Option<bool>,
    /// Skip documents lacking the indexed member(s).
    pub sparse: Option<bool>,
    /// Index name; MongoDB picks one if absent.
    pub name: Option<String>,
}

/// A fully resolved index declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSpec {
    /// Indexed document keys and their types, in key order.
    pub keys: Vec<(String, IndexType)>,
    /// Uniqueness, sparseness and name.
    pub options: IndexSpecOptions,
}

impl IndexSpec {
    /// A single-key index.
    fn single(key: &str, index_type: IndexType, options: IndexSpecOptions) -> Self {
        IndexSpec {
            keys: vec![(key.to_owned(), index_type)],
            options,
        }
    }

    /// The key specification document, e.g. `{ "name": 1, "age": -1 }`.
    pub fn keys_document(&self) -> Document {
        self.keys
            .iter()
            .map(|(key, index_type)| (key.clone(), Bson::from(*index_type)))
            .collect()
    }

    /// Converts the declaration into the driver's representation.
    pub fn to_model(&self) -> IndexModel {
        let mut options = IndexOptions::default();
        options.unique = self.options.unique;
        options.sparse = self.options.sparse;
        options.name = self.options.name.clone();

        let mut model = IndexModel::default();
        model.keys = self.keys_document();
        model.options = Some(options);
        model
    }
}

/// The indexes of one entity type, grouped by the kind of marker
/// they originate from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPlan {
    /// One ascending, unique index per `UniqueIndex` member.
    unique: Vec<IndexSpec>,
    /// One index per `SingleFieldIndex` member.
    single_field: Vec<IndexSpec>,
    /// One index per `GeospatialIndex` member.
    geospatial: Vec<IndexSpec>,
    /// One index per distinct `CompoundIndex` name.
    compound: Vec<IndexSpec>,
}

impl IndexPlan {
    /// Computes every index declared by the markers of `schema`.
    /// Deterministic: the same schema always yields an equal plan.
    pub fn build(schema: &Schema) -> Self {
        IndexPlan {
            unique: unique_indexes(schema),
            single_field: single_field_indexes(schema),
            geospatial: geospatial_indexes(schema),
            compound: compound_indexes(schema),
        }
    }

    /// Indexes from `UniqueIndex` markers.
    pub fn unique(&self) -> &[IndexSpec] {
        &self.unique
    }

    /// Indexes from `SingleFieldIndex` markers.
    pub fn single_field(&self) -> &[IndexSpec] {
        &self.single_field
    }

    /// Indexes from `GeospatialIndex` markers.
    pub fn geospatial(&self) -> &[IndexSpec] {
        &self.geospatial
    }

    /// Indexes from `CompoundIndex` markers.
    pub fn compound(&self) -> &[IndexSpec] {
        &self.compound
    }

    /// The non-empty groups of indexes, each of which is declared
    /// to MongoDB in one round trip.
    pub fn passes(&self) -> impl Iterator<Item = &[IndexSpec]> {
        [&self.unique, &self.single_field, &self.geospatial, &self.compound]
            .into_iter()
            .map(Vec::as_slice)
            .filter(|pass| !pass.is_empty())
    }

    /// Total number of indexes.
    pub fn len(&self) -> usize {
        self.passes().map(<[IndexSpec]>::len).sum()
    }

    /// Whether the markers declare no index at all.
    pub fn is_empty(&self) -> bool {
        self.passes().next().is_none()
    }
}

/// The unique pass.
fn unique_indexes(schema: &Schema) -> Vec<IndexSpec> {
    schema
        .members_with::<UniqueIndex>()
        .into_iter()
        .map(|(marker, member)| IndexSpec::single(
            member.name(),
            IndexType::Ordered(Order::Ascending),
            IndexSpecOptions {
                unique: Some(true),
                sparse: Some(marker.sparse),
                name: marker.name.clone(),
            },
        ))
        .collect()
}

/// The single-field pass.
fn single_field_indexes(schema: &Schema) -> Vec<IndexSpec> {
    schema
        .members_with::<SingleFieldIndex>()
        .into_iter()
        .map(|(marker, member)| IndexSpec::single(
            member.name(),
            marker.order.into(),
            IndexSpecOptions {
                unique: None,
                sparse: Some(marker.sparse),
                name: marker.name.clone(),
            },
        ))
        .collect()
}

/// The geospatial pass.
fn geospatial_indexes(schema: &Schema) -> Vec<IndexSpec> {
    schema
        .members_with::<GeospatialIndex>()
        .into_iter()
        .map(|(marker, member)| IndexSpec::single(
            member.name(),
            marker.kind.into(),
            IndexSpecOptions {
                name: marker.name.clone(),
                ..Default::default()
            },
        ))
        .collect()
}

/// The compound pass. Groups appear in the order of their first member;
/// keys within a group follow member declaration order.
fn compound_indexes(schema: &Schema) -> Vec<IndexSpec> {
    let mut groups: Vec<IndexSpec> = Vec::new();

    for (marker, member) in schema.members_with::<CompoundIndex>() {
        if marker.name.trim().is_empty() {
            warn!(
                entity = %schema.type_descriptor(),
                member = member.name(),
                "compound index marker without a name is ignored"
            );
            continue;
        }

        let key = (member.name().to_owned(), marker.order.into());
        let group = groups
            .iter_mut()
            .find(|spec| spec.options.name.as_deref() == Some(marker.name.as_str()));

        match group {
            Some(spec) => spec.keys.push(key),
            None => groups.push(IndexSpec {
                keys: vec![key],
                options: IndexSpecOptions {
                    name: Some(marker.name.clone()),
                    ..Default::default()
                },
            }),
        }
    }

    groups
}

/// Something indexes can be declared on, synchronously.
pub trait IndexSink {
    /// Creates the given indexes in a single round trip.
    fn declare_indexes(&self, specs: &[IndexSpec]) -> Result<()>;
}

/// Something indexes can be declared on, asynchronously.
#[async_trait]
pub trait AsyncIndexSink: Sync {
    /// Creates the given indexes in a single round trip.
    async fn declare_indexes(&self, specs: &[IndexSpec]) -> Result<()>;
}

#[cfg(feature = "sync")]
impl IndexSink for mongodb::sync::Collection<Document> {
    fn declare_indexes(&self, specs: &[IndexSpec]) -> Result<()> {
        self.create_indexes(specs.iter().map(IndexSpec::to_model)).run()?;
        Ok(())
    }
}

#[async_trait]
impl AsyncIndexSink for mongodb::Collection<Document> {
    async fn declare_indexes(&self, specs: &[IndexSpec]) -> Result<()> {
        let models: Vec<IndexModel> = specs.iter().map(IndexSpec::to_model).collect();
        self.create_indexes(models).await?;
        Ok(())
    }
}

/// Declares every index of `schema` on `sink`. Each non-empty pass costs
/// one call; a schema without index markers costs none.
pub fn ensure_indexes<S: IndexSink + ?Sized>(sink: &S, schema: &Schema) -> Result<()> {
    let plan = IndexPlan::build(schema);

    for pass in plan.passes() {
        sink.declare_indexes(pass)?;
    }

    debug!(entity = %schema.type_descriptor(), count = plan.len(), "declared indexes");

    Ok(())
}

/// The asynchronous counterpart of `ensure_indexes()`.
pub async fn ensure_indexes_async<S: AsyncIndexSink + ?Sized>(sink: &S, schema: &Schema) -> Result<()> {
    let plan = IndexPlan::build(schema);

    for pass in plan.passes() {
        sink.declare_indexes(pass).await?;
    }

    debug!(entity = %schema.type_descriptor(), count = plan.len(), "declared indexes");

    Ok(())
}
