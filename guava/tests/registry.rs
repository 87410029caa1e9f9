//! The per-type metadata cache together with index declaration, against
//! in-memory sinks that record what would have been sent to MongoDB.

use std::sync::Arc;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::thread;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_derive::{ Serialize, Deserialize };
use guava_derive::Entity;
use guava::prelude::*;
use guava::index::{ IndexSpec, IndexSink, AsyncIndexSink, ensure_indexes, ensure_indexes_async };

/// Remembers every batch of declared indexes. Fails on demand.
#[derive(Debug, Default)]
struct RecordingSink {
    batches: Mutex<Vec<Vec<IndexSpec>>>,
    failing: AtomicBool,
}

impl RecordingSink {
    fn failing() -> Self {
        RecordingSink {
            failing: AtomicBool::new(true),
            ..Default::default()
        }
    }

    fn record(&self, specs: &[IndexSpec]) -> GuavaResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GuavaError::new(GuavaErrorKind::MongoDbError, "index creation refused"));
        }

        self.batches.lock().push(specs.to_vec());
        Ok(())
    }

    fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    fn key_names(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .iter()
            .map(|batch| batch.iter().flat_map(|spec| spec.keys.iter().map(|(key, _)| key.clone())).collect())
            .collect()
    }
}

impl IndexSink for RecordingSink {
    fn declare_indexes(&self, specs: &[IndexSpec]) -> GuavaResult<()> {
        self.record(specs)
    }
}

#[async_trait]
impl AsyncIndexSink for RecordingSink {
    async fn declare_indexes(&self, specs: &[IndexSpec]) -> GuavaResult<()> {
        self.record(specs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Entity)]
#[collection(track_timestamps)]
struct Shop {
    _id: ObjectId,
    #[unique_index]
    slug: String,
    #[single_field_index(order = "descending")]
    rating: f64,
    #[geospatial_index]
    location: Vec<f64>,
    #[compound_index(name = "by_city")]
    country: String,
    #[compound_index(name = "by_city")]
    city: String,
    #[serde(flatten)]
    #[timestamps]
    timestamps: Timestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize, Entity)]
struct Note {
    _id: u64,
    #[lowercase]
    text: String,
}

#[test]
fn each_index_kind_is_one_batch() {
    let sink = RecordingSink::default();

    ensure_indexes(&sink, &Shop::schema()).unwrap();

    assert_eq!(sink.key_names(), [
        vec!["slug".to_owned()],
        vec!["rating".to_owned()],
        vec!["location".to_owned()],
        vec!["country".to_owned(), "city".to_owned()],
    ]);
}

#[test]
fn entities_without_indexes_cost_nothing() {
    let sink = RecordingSink::default();

    ensure_indexes(&sink, &Note::schema()).unwrap();

    assert_eq!(sink.batch_count(), 0);
}

#[test]
fn indexes_are_declared_once_per_registry() {
    let registry = Registry::new();
    let sink = RecordingSink::default();
    let schema = registry.schema::<Shop>();

    for _ in 0..3 {
        registry
            .ensure_indexes_once(schema.type_descriptor(), || ensure_indexes(&sink, &schema))
            .unwrap();
    }

    assert_eq!(sink.batch_count(), 4);
    assert!(registry.indexes_ensured(schema.type_descriptor()));

    registry.reset();
    assert!(!registry.indexes_ensured(schema.type_descriptor()));
}

#[test]
fn failed_declarations_are_retried() {
    let registry = Registry::new();
    let sink = RecordingSink::failing();
    let schema = registry.schema::<Shop>();

    let error = registry
        .ensure_indexes_once(schema.type_descriptor(), || ensure_indexes(&sink, &schema))
        .unwrap_err();

    assert_eq!(error.kind(), GuavaErrorKind::MongoDbError);
    assert!(!registry.indexes_ensured(schema.type_descriptor()));

    sink.failing.store(false, Ordering::SeqCst);
    registry
        .ensure_indexes_once(schema.type_descriptor(), || ensure_indexes(&sink, &schema))
        .unwrap();

    assert_eq!(sink.batch_count(), 4);
    assert!(registry.indexes_ensured(schema.type_descriptor()));
}

#[tokio::test]
async fn async_declarations_share_the_gate() {
    let registry = Registry::new();
    let sink = RecordingSink::default();
    let schema = registry.schema::<Shop>();

    registry
        .ensure_indexes_once_async(schema.type_descriptor(), || ensure_indexes_async(&sink, &schema))
        .await
        .unwrap();

    // the blocking flavor sees the flag set by the async one
    registry
        .ensure_indexes_once(schema.type_descriptor(), || ensure_indexes(&sink, &schema))
        .unwrap();

    assert_eq!(sink.batch_count(), 4);
}

#[test]
fn derived_metadata_is_stable_across_threads() {
    let registry = Arc::new(Registry::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);

            thread::spawn(move || {
                let schema = registry.schema::<Shop>();
                let name = registry.collection_name(&schema).unwrap();
                let tracked = registry.tracks_timestamps(&schema);
                (name.to_string(), tracked)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (String::from("shops"), true));
    }

    let note = registry.schema::<Note>();
    assert_eq!(&*registry.collection_name(&note).unwrap(), "notes");
    assert!(!registry.tracks_timestamps(&note));
}

#[test]
fn timestamp_policy_is_memoized_per_type() {
    let registry = Registry::new();
    let tracked = Shop::schema();
    let forged = Schema::of::<Shop>();

    assert!(registry.tracks_timestamps(&tracked));
    assert!(registry.tracks_timestamps(&forged));
}
