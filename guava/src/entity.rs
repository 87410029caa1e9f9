//! An entity is a top-level document, the direct member of a collection.

use std::fmt::Debug;
use serde::{ Serialize, Deserialize };
use bson::DateTime;
use mongodb::options::{ FindOptions, CountOptions, DeleteOptions, ReplaceOptions };
use crate::schema::Schema;

/// Implemented by top-level (direct collection member) documents only.
/// These types always have an `_id` field and a marker table describing
/// their collection, indexes and save-time transformations.
///
/// Usually derived with `#[derive(Entity)]` from `guava_derive`, but all
/// methods except `id()` have sensible defaults, so implementing it by
/// hand is straightforward:
///
/// ```
/// # use serde_derive::{ Serialize, Deserialize };
/// # use guava::prelude::*;
/// #
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Job {
///     #[serde(rename = "_id")]
///     id: ObjectId,
///     description: String,
/// }
///
/// impl Entity for Job {
///     type Id = ObjectId;
///
///     fn id(&self) -> &ObjectId {
///         &self.id
///     }
///
///     fn schema() -> Schema {
///         Schema::of::<Self>()
///             .member(Member::of::<String>("description").marker(Lowercase))
///     }
/// }
/// ```
pub trait Entity: Serialize + for<'a> Deserialize<'a> + 'static {
    /// The type of the unique IDs of the entity. A good default choice
    /// is `ObjectId`.
    type Id: Debug + Serialize + for<'a> Deserialize<'a>;

    /// Returns the unique ID, as serialized under the `_id` key.
    fn id(&self) -> &Self::Id;

    /// Returns the marker table of the entity type. Without markers the
    /// collection name is derived from the type name, timestamps are not
    /// tracked, and no indexes are declared.
    fn schema() -> Schema {
        Schema::of::<Self>()
    }

    /// The creation and modification times, if the entity keeps them.
    fn timestamps(&self) -> Option<&Timestamps> {
        None
    }

    /// Mutable access to the creation and modification times. Must return
    /// `Some` if the collection marker asks for timestamp tracking.
    fn timestamps_mut(&mut self) -> Option<&mut Timestamps> {
        None
    }

    /// Lowercases and uppercases the members marked so, in place. The
    /// derive macro implements it for `#[lowercase]` and `#[uppercase]`
    /// fields. Without it, only the stored document is transformed.
    fn normalize_case(&mut self) {}

    /// Called right before the entity is serialized and saved, after the
    /// timestamps are updated and the case of the members is normalized.
    fn pre_save(&mut self) {}

    /// Called right after the entity has been saved successfully.
    fn post_save(&mut self) {}

    /// Options for a regular query.
    fn query_options() -> FindOptions {
        Default::default()
    }

    /// Options for a count-only query.
    fn count_options() -> CountOptions {
        Default::default()
    }

    /// Options for a delete operation.
    fn delete_options() -> DeleteOptions {
        Default::default()
    }

    /// Options for saving, which always upserts by `_id`. Setting `upsert`
    /// to anything but `true` makes saving a new entity a no-op.
    fn replace_options() -> ReplaceOptions {
        let mut options = ReplaceOptions::default();
        options.upsert = Some(true);
        options
    }
}

/// Creation and last modification time of an entity. Embed it with
/// `#[serde(flatten)]` to store the two fields at the top level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// When the entity was first saved.
    #[serde(default)]
    pub created_at: Option<DateTime>,
    /// When the entity was last saved.
    #[serde(default)]
    pub updated_at: Option<DateTime>,
}

impl Timestamps {
    /// Stamps a save happening at `now`: sets `created_at` unless it is
    /// already set, and always sets `updated_at`.
    pub fn touch(&mut self, now: DateTime) {
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }
}
