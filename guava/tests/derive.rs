use std::any::TypeId;
use serde_derive::{ Serialize, Deserialize };
use guava_derive::Entity;
use guava::prelude::*;
use guava::index::{ IndexPlan, IndexSpec, IndexSpecOptions };
use guava::naming::resolve_collection_name;

/// This could have been a function, but making it a macro results in the
/// error messages pointing to the actual line number of the invocation,
/// which is much better in a test suite.
macro_rules! assert_entity_impl {
    (Entity: $Entity:ty, Id: $Id:ty, name: $name:expr, members: [$($member:expr),*]) => {
        let schema = <$Entity as Entity>::schema();
        let members: Vec<&str> = schema
            .members()
            .iter()
            .map(|member| member.descriptor().name())
            .collect();
        let expected: &[&str] = &[$($member),*];

        assert_eq!(TypeId::of::<<$Entity as Entity>::Id>(), TypeId::of::<$Id>());
        assert_eq!(resolve_collection_name(&schema).unwrap(), $name);
        assert_eq!(members, expected);
    }
}

#[test]
fn entity_simple() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    struct Simple {
        _id: ObjectId,
    }

    assert_entity_impl!(Entity: Simple, Id: ObjectId, name: "simples", members: ["_id"]);
}

#[test]
fn entity_names_are_pluralized() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    struct Category {
        _id: u32,
        title: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    struct Mouse {
        _id: u32,
    }

    assert_entity_impl!(Entity: Category, Id: u32, name: "categories", members: ["_id", "title"]);
    assert_entity_impl!(Entity: Mouse, Id: u32, name: "mice", members: ["_id"]);
}

#[test]
fn entity_explicit_collection_name() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    #[collection(name = "  Order Lines ")]
    struct OrderLine {
        _id: i64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    #[collection(name = "   ")]
    struct Fox {
        _id: i64,
    }

    assert_entity_impl!(Entity: OrderLine, Id: i64, name: "order_lines", members: ["_id"]);
    assert_entity_impl!(Entity: Fox, Id: i64, name: "foxes", members: ["_id"]);
}

#[test]
fn entity_renamed_type() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    #[serde(rename = "Person")]
    struct Original {
        _id: ObjectId,
        other_field: Vec<String>,
    }

    assert_entity_impl!(Entity: Original, Id: ObjectId, name: "persons", members: ["_id", "other_field"]);
}

#[test]
fn entity_renamed_id_field() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    struct Bar {
        #[serde(rename = "_id")]
        qux: String,
    }

    let bar = Bar { qux: String::from("the id") };

    assert_entity_impl!(Entity: Bar, Id: String, name: "bars", members: ["_id"]);
    assert_eq!(bar.id(), "the id");
}

#[test]
fn entity_rename_all_fields() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    #[serde(rename_all = "camelCase")]
    struct Renaming {
        #[serde(rename = "_id")]
        wat_bar: u64,
        lol_foo: String,
        #[serde(rename = "explicit")]
        not_camel: bool,
    }

    assert_entity_impl!(
        Entity: Renaming,
        Id: u64,
        name: "renamings",
        members: ["_id", "lolFoo", "explicit"]
    );
}

#[test]
fn entity_skipped_and_flattened_fields_are_not_members() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    struct Skippy {
        _id: u16,
        #[serde(skip)]
        unimportant: Vec<u8>,
        #[serde(skip_serializing, default)]
        dont_care: String,
        #[serde(flatten)]
        #[timestamps]
        timestamps: Timestamps,
        kept: Option<String>,
    }

    let mut skippy = Skippy {
        _id: 7,
        unimportant: vec![1, 2, 3],
        dont_care: String::new(),
        timestamps: Timestamps::default(),
        kept: None,
    };

    assert_entity_impl!(Entity: Skippy, Id: u16, name: "skippies", members: ["_id", "kept"]);
    assert_eq!(skippy.timestamps(), Some(&Timestamps::default()));

    skippy.timestamps_mut().unwrap().touch(bson::DateTime::from_millis(5));
    assert_eq!(skippy.timestamps.created_at, Some(bson::DateTime::from_millis(5)));
}

#[test]
fn entity_without_timestamps_field_has_none() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    struct Plain {
        _id: u8,
    }

    let mut plain = Plain { _id: 0 };

    assert!(plain.timestamps().is_none());
    assert!(plain.timestamps_mut().is_none());
}

#[test]
fn entity_collection_marker() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    #[collection(name = "journal", track_timestamps)]
    struct Entry {
        _id: ObjectId,
        #[serde(flatten)]
        #[timestamps]
        stamps: Timestamps,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    #[collection(track_timestamps = false)]
    struct Untracked {
        _id: ObjectId,
    }

    assert_eq!(Entry::schema().collection_marker(), Some(&CollectionMarker {
        name: Some(String::from("journal")),
        track_timestamps: true,
    }));
    assert_eq!(Untracked::schema().collection_marker(), Some(&CollectionMarker::default()));
}

#[derive(Debug, Clone, Serialize, Deserialize, Entity)]
struct Place {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[unique_index(sparse, name = "unique_name")]
    #[lowercase]
    name: String,
    #[single_field_index(order = "Descending", name = "single_age")]
    age: i32,
    #[single_field_index(order = "hashed")]
    owner: String,
    #[geospatial_index(kind = "2d", name = "geo_location")]
    location: Vec<f64>,
    #[compound_index(name = "compound_idx")]
    category: String,
    #[uppercase]
    code: Option<String>,
    #[compound_index(name = "compound_idx", order = "descending")]
    created: i64,
}

#[test]
fn entity_field_markers() {
    let schema = Place::schema();

    assert_eq!(schema.members_with::<UniqueIndex>(), [(
        &UniqueIndex { sparse: true, name: Some(String::from("unique_name")) },
        schema.members()[1].descriptor(),
    )]);
    assert_eq!(schema.members_with::<Lowercase>()[0].1.name(), "name");
    assert_eq!(schema.members_with::<Uppercase>()[0].1.name(), "code");
    assert_eq!(schema.members_with::<GeospatialIndex>()[0].0.kind, GeospatialKind::TwoD);
    assert_eq!(schema.members()[1].markers().len(), 2);

    let code = &schema.members()[6];
    assert!(code.descriptor().declared_type().is_text());
    assert!(!schema.members()[2].descriptor().declared_type().is_text());
}

#[test]
fn entity_index_plan() {
    let plan = IndexPlan::build(&Place::schema());

    assert_eq!(plan.unique(), [IndexSpec {
        keys: vec![(String::from("name"), IndexType::Ordered(Order::Ascending))],
        options: IndexSpecOptions {
            unique: Some(true),
            sparse: Some(true),
            name: Some(String::from("unique_name")),
        },
    }]);

    let model: IndexModel = plan.unique()[0].to_model();
    assert_eq!(model.keys, doc!{ "name": 1 });
    assert_eq!(model.options.and_then(|options| options.name).as_deref(), Some("unique_name"));

    let single: Vec<_> = plan.single_field().iter().map(|spec| spec.keys_document()).collect();
    assert_eq!(single, [doc!{ "age": -1 }, doc!{ "owner": "hashed" }]);

    assert_eq!(plan.geospatial()[0].keys_document(), doc!{ "location": "2d" });
    assert_eq!(plan.geospatial()[0].options.name.as_deref(), Some("geo_location"));

    assert_eq!(plan.compound().len(), 1);
    assert_eq!(plan.compound()[0].keys_document(), doc!{ "category": 1, "created": -1 });
    assert_eq!(plan.compound()[0].options.name.as_deref(), Some("compound_idx"));
}

#[test]
fn entity_case_is_normalized_before_saving() {
    let mut place = Place {
        id: ObjectId::new(),
        name: String::from("Corvin Köz"),
        age: 3,
        owner: String::from("Bob"),
        location: vec![19.07, 47.49],
        category: String::from("Park"),
        code: Some(String::from("hu-bp")),
        created: 0,
    };
    let document = guava::transform::prepare_for_save(&Registry::new(), &mut place).unwrap();

    assert_eq!(place.name, "corvin köz");
    assert_eq!(place.code.as_deref(), Some("HU-BP"));
    assert_eq!(place.owner, "Bob");
    assert_eq!(document.get_str("name").unwrap(), "corvin köz");
    assert_eq!(document.get_str("code").unwrap(), "HU-BP");

    let mut unnamed = Place { code: None, ..place };
    unnamed.normalize_case();
    assert_eq!(unnamed.code, None);
}

fn newest_first() -> FindOptions {
    let mut options = FindOptions::default();
    options.sort = Some(doc!{ "created": -1 });
    options
}

fn never_upsert() -> ReplaceOptions {
    let mut options = ReplaceOptions::default();
    options.upsert = Some(false);
    options
}

#[test]
fn entity_options() {
    #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
    #[options(query_options = "newest_first", replace_options = "never_upsert")]
    struct Post {
        _id: ObjectId,
        created: i64,
    }

    assert_eq!(Post::query_options().sort, Some(doc!{ "created": -1 }));
    assert_eq!(Post::replace_options().upsert, Some(false));
    assert_eq!(Post::count_options().limit, None);
}
