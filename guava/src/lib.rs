//! # Guava: the declarative MongoDB entity mapper
//!
//! This library lets MongoDB users store statically-typed domain model
//! objects, with the collection name, the indexes, and a couple of
//! save-time transformations all declared right on the entity type.
//!
//! ### The Prelude
//!
//! The most useful types from Guava as well as the `mongodb` and `bson`
//! crates are publicly re-exported under the module [`prelude`](prelude/index.html):
//!
//! ```rust
//! use guava::prelude::*;
//! use guava_derive::Entity;
//! ```
//!
//! ### Entities
//!
//! An entity is a `Serialize + Deserialize` type with a field serialized
//! under the `_id` key. The [`Entity`](entity/trait.Entity.html) trait
//! captures this, along with a marker table (a [`Schema`](schema/struct.Schema.html))
//! describing where and how the entity is stored. Deriving it is the
//! most convenient way:
//!
//! ```
//! # use serde_derive::{ Serialize, Deserialize };
//! # use guava::prelude::*;
//! # use guava_derive::Entity;
//! #
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! #[collection(track_timestamps)]
//! struct Category {
//!     #[serde(rename = "_id")]
//!     id: ObjectId,
//!     #[unique_index(sparse)]
//!     #[lowercase]
//!     slug: String,
//!     #[compound_index(name = "by_parent", order = "ascending")]
//!     parent: Option<ObjectId>,
//!     #[compound_index(name = "by_parent", order = "descending")]
//!     rank: i32,
//!     #[serde(flatten)]
//!     #[timestamps]
//!     timestamps: Timestamps,
//! }
//!
//! let odm = Odm::new();
//! # let _ = &odm;
//! // once connected, `odm.collection_name::<Category>()` is "categories"
//! ```
//!
//! The attributes understood by the derive macro are:
//! * `#[collection(name = "...", track_timestamps)]` on the type. Without
//!   an explicit, non-blank name, the collection is named after the type:
//!   pluralized, lowercased, with whitespace runs replaced by underscores.
//!   With `track_timestamps`, saving sets `created_at` once and
//!   `updated_at` every time, which requires a `#[timestamps]` field.
//! * `#[unique_index(sparse, name = "...")]`,
//!   `#[single_field_index(order = "ascending" | "descending" | "hashed", sparse, name = "...")]`,
//!   `#[geospatial_index(kind = "2d" | "2dsphere", name = "...")]` and
//!   `#[compound_index(name = "...", order = "...")]` on fields. Compound
//!   markers sharing a name make up one index, keyed in field order.
//! * `#[lowercase]` and `#[uppercase]` on string fields: the stored value
//!   is transformed, the entity itself is not.
//!
//! Member names follow `#[serde(rename)]` and `#[serde(rename_all)]`.
//! Skipped and flattened fields are not members, so putting markers on
//! them is a compile error. The one exception is `#[timestamps]`, which
//! usually sits on a flattened field.
//!
//! ### Connections and Collections
//!
//! An [`Odm`](db/struct.Odm.html) owns a database handle and a
//! [`Registry`](registry/struct.Registry.html) of everything derived from
//! entity types. Asking it for the collection of a type declares the
//! indexes of that type once per connection:
//!
//! ```no_run
//! # use serde_derive::{ Serialize, Deserialize };
//! # use guava::prelude::*;
//! # use guava_derive::Entity;
//! #
//! # #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! # struct User {
//! #     #[serde(rename = "_id")]
//! #     id: ObjectId,
//! #     #[lowercase]
//! #     email: String,
//! # }
//! #
//! # async fn run() -> GuavaResult<()> {
//! let odm = Odm::new();
//! odm.connect("mongodb://localhost:27017/app").await?;
//!
//! let users: Collection<User> = odm.collection().await?;
//! let mut alice = User { id: ObjectId::new(), email: String::from("Alice@Example.com") };
//!
//! users.save(&mut alice).await?;
//!
//! let found = users.find_one(doc!{ "email": "alice@example.com" }).await?;
//! assert_eq!(found.map(|user| user.id), Some(alice.id));
//! # Ok(())
//! # }
//! ```
//!
//! The blocking flavor of the same API lives in the [`sync`](sync/index.html)
//! module.
//!
//! ### Crate Features
//!
//! * `sync` (default): enables the blocking front end via `mongodb/sync`.

#![doc(html_root_url = "https://docs.rs/guava/0.1.0")]
#![warn(missing_debug_implementations, missing_copy_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unstable_features,
        anonymous_parameters, bare_trait_objects,
        unused_import_braces, unused_qualifications, missing_docs)]
#![allow(clippy::single_match, clippy::match_same_arms, clippy::match_ref_pats,
         clippy::clone_on_ref_ptr, clippy::needless_pass_by_value)]
#![warn(clippy::used_underscore_binding,
        clippy::similar_names,
        clippy::missing_docs_in_private_items,
        clippy::non_ascii_literal, clippy::unicode_not_nfc,
        clippy::unwrap_used, clippy::expect_used,
        clippy::shadow_unrelated,
        clippy::int_plus_one, clippy::string_add_assign, clippy::if_not_else,
        clippy::invalid_upcast_comparisons,
        clippy::cast_precision_loss, clippy::cast_lossless,
        clippy::cast_possible_wrap, clippy::cast_possible_truncation,
        clippy::mut_mut, clippy::items_after_statements,
        clippy::print_stdout, clippy::mem_forget, clippy::maybe_infinite_iter)]

#[macro_use]
extern crate serde_derive;

pub mod db;
pub mod coll;
pub mod cursor;
pub mod entity;
pub mod schema;
pub mod marker;
pub mod naming;
pub mod plural;
pub mod index;
pub mod registry;
pub mod transform;
pub mod ops;
pub mod literal;
pub mod error;
pub mod prelude;

#[cfg(feature = "sync")]
pub mod sync;

mod bsn;
