//! Turning an entity into the document that gets saved: timestamps,
//! case normalization, the pre-save hook and serialization.

use std::borrow::Cow;
use bson::{ Bson, Document, DateTime };
use crate::{
    entity::Entity,
    schema::Schema,
    marker::{ Lowercase, Uppercase },
    registry::Registry,
    bsn::serialize_document,
    error::{ Error, Result },
};

/// A string value that can be lowercased or uppercased in place. Used by
/// the derived `Entity::normalize_case()` on `#[lowercase]` and
/// `#[uppercase]` fields.
pub trait CaseTransform {
    /// Replaces the value with its lowercase version.
    fn make_lowercase(&mut self);

    /// Replaces the value with its uppercase version.
    fn make_uppercase(&mut self);
}

impl CaseTransform for String {
    fn make_lowercase(&mut self) {
        *self = self.to_lowercase();
    }

    fn make_uppercase(&mut self) {
        *self = self.to_uppercase();
    }
}

impl CaseTransform for Box<str> {
    fn make_lowercase(&mut self) {
        *self = self.to_lowercase().into_boxed_str();
    }

    fn make_uppercase(&mut self) {
        *self = self.to_uppercase().into_boxed_str();
    }
}

impl CaseTransform for Cow<'static, str> {
    fn make_lowercase(&mut self) {
        *self = Cow::Owned(self.to_lowercase());
    }

    fn make_uppercase(&mut self) {
        *self = Cow::Owned(self.to_uppercase());
    }
}

/// `None` is left alone.
impl<T: CaseTransform> CaseTransform for Option<T> {
    fn make_lowercase(&mut self) {
        if let Some(value) = self.as_mut() {
            value.make_lowercase();
        }
    }

    fn make_uppercase(&mut self) {
        if let Some(value) = self.as_mut() {
            value.make_uppercase();
        }
    }
}

/// Checks that case transformation markers sit on string members only.
pub fn validate_case_markers(schema: &Schema) -> Result<()> {
    let lowercase = schema.members_with::<Lowercase>().into_iter().map(|(_, member)| (member, "lowercase"));
    let uppercase = schema.members_with::<Uppercase>().into_iter().map(|(_, member)| (member, "uppercase"));

    for (member, marker) in lowercase.chain(uppercase) {
        if !member.declared_type().is_text() {
            return Err(Error::configuration(format!(
                "`{}` marker on member `{}` of `{}`, which is a `{}`, not a string",
                marker,
                member.name(),
                schema.type_descriptor(),
                member.declared_type(),
            )));
        }
    }

    Ok(())
}

/// Lowercases and uppercases the marked string values of `document`.
/// Missing and `null` values are left alone. Covers entities whose
/// `normalize_case()` is not implemented.
pub fn apply_case_markers(schema: &Schema, document: &mut Document) -> Result<()> {
    validate_case_markers(schema)?;

    for (_, member) in schema.members_with::<Lowercase>() {
        if let Some(Bson::String(value)) = document.get_mut(member.name()) {
            *value = value.to_lowercase();
        }
    }

    for (_, member) in schema.members_with::<Uppercase>() {
        if let Some(Bson::String(value)) = document.get_mut(member.name()) {
            *value = value.to_uppercase();
        }
    }

    Ok(())
}

/// Sets `created_at` (if unset) and `updated_at` to `now`.
pub fn touch_timestamps<T: Entity>(entity: &mut T, now: DateTime) -> Result<()> {
    match entity.timestamps_mut() {
        Some(timestamps) => {
            timestamps.touch(now);
            Ok(())
        }
        None => Err(Error::configuration(format!(
            "`{}` tracks timestamps but has no `Timestamps` to update",
            std::any::type_name::<T>()
        ))),
    }
}

/// Prepares `entity` for saving and returns the document to be written.
///
/// In order: the case markers are validated, the timestamps are updated
/// if the type tracks them, the marked members are lowercased or
/// uppercased, `pre_save()` is called, and the entity is serialized.
/// The case transformations are applied to the document once more, so
/// values changed by `pre_save()` are stored normalized as well.
pub fn prepare_for_save<T: Entity>(registry: &Registry, entity: &mut T) -> Result<Document> {
    let schema = registry.schema::<T>();

    validate_case_markers(&schema)?;

    if registry.tracks_timestamps(&schema) {
        touch_timestamps(entity, DateTime::now())?;
    }

    entity.normalize_case();
    entity.pre_save();

    let mut document = serialize_document(entity)?;
    apply_case_markers(&schema, &mut document)?;

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use crate::entity::Timestamps;
    use crate::schema::Member;
    use crate::marker::CollectionMarker;
    use crate::error::{ ErrorExt, ErrorKind };

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct AttributedClass {
        #[serde(rename = "_id")]
        id: i32,
        name: Option<String>,
        sku: String,
        age: i32,
        #[serde(flatten)]
        timestamps: Timestamps,
        #[serde(skip)]
        hooks: Vec<&'static str>,
        #[serde(skip)]
        name_in_pre_save: Option<String>,
    }

    impl Entity for AttributedClass {
        type Id = i32;

        fn id(&self) -> &i32 {
            &self.id
        }

        fn schema() -> Schema {
            Schema::of::<Self>()
                .collection(CollectionMarker::default().track_timestamps(true))
                .member(Member::of::<Option<String>>("name").marker(Lowercase))
                .member(Member::of::<String>("sku").marker(Uppercase))
                .member(Member::of::<i32>("age"))
        }

        fn timestamps_mut(&mut self) -> Option<&mut Timestamps> {
            Some(&mut self.timestamps)
        }

        fn normalize_case(&mut self) {
            self.hooks.push("normalize_case");
            self.name.make_lowercase();
            self.sku.make_uppercase();
        }

        fn pre_save(&mut self) {
            self.hooks.push("pre_save");
            self.name_in_pre_save = self.name.clone();
            self.sku.push_str("-x");
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct HandWritten {
        #[serde(rename = "_id")]
        id: i32,
        code: Box<str>,
    }

    impl Entity for HandWritten {
        type Id = i32;

        fn id(&self) -> &i32 {
            &self.id
        }

        fn schema() -> Schema {
            Schema::of::<Self>().member(Member::of::<Box<str>>("code").marker(Uppercase))
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Untracked {
        #[serde(rename = "_id")]
        id: i32,
    }

    impl Entity for Untracked {
        type Id = i32;

        fn id(&self) -> &i32 {
            &self.id
        }

        fn schema() -> Schema {
            Schema::of::<Self>().collection(CollectionMarker::default().track_timestamps(true))
        }
    }

    struct BadMarker;

    fn attributed(name: Option<&str>) -> AttributedClass {
        AttributedClass {
            id: 1,
            name: name.map(Into::into),
            sku: String::from("ab-12"),
            age: 42,
            timestamps: Timestamps::default(),
            hooks: Vec::new(),
            name_in_pre_save: None,
        }
    }

    #[test]
    fn saving_transforms_stamps_and_runs_hook() {
        let registry = Registry::new();
        let mut entity = attributed(Some("John DOE"));
        let document = prepare_for_save(&registry, &mut entity).unwrap();

        assert_eq!(document.get_str("name").unwrap(), "john doe");
        assert_eq!(document.get_str("sku").unwrap(), "AB-12-X");
        assert_eq!(document.get_i32("age").unwrap(), 42);
        assert_eq!(entity.hooks, ["normalize_case", "pre_save"]);

        let created_at = entity.timestamps.created_at.unwrap();
        assert_eq!(entity.timestamps.updated_at, Some(created_at));
        assert_eq!(document.get_datetime("created_at").unwrap(), &created_at);

        // the hook sees, and the entity keeps, the normalized values
        assert_eq!(entity.name_in_pre_save.as_deref(), Some("john doe"));
        assert_eq!(entity.name.as_deref(), Some("john doe"));
        assert_eq!(entity.sku, "AB-12-x");
    }

    #[test]
    fn document_is_transformed_without_normalize_case() {
        let registry = Registry::new();
        let mut entity = HandWritten { id: 3, code: "hu-bp".into() };
        let document = prepare_for_save(&registry, &mut entity).unwrap();

        assert_eq!(document.get_str("code").unwrap(), "HU-BP");
        assert_eq!(&*entity.code, "hu-bp");
    }

    #[test]
    fn case_transform_leaves_none_alone() {
        let mut missing: Option<String> = None;
        missing.make_uppercase();
        assert_eq!(missing, None);

        let mut title = Some(Cow::Borrowed("Grüße"));
        title.make_uppercase();
        assert_eq!(title.as_deref(), Some("GRÜSSE"));

        let mut code = Box::<str>::from("HU");
        code.make_lowercase();
        assert_eq!(&*code, "hu");
    }

    #[test]
    fn second_save_keeps_creation_time() {
        let registry = Registry::new();
        let mut entity = attributed(None);
        let created_at = DateTime::from_millis(0);
        entity.timestamps.created_at = Some(created_at);

        prepare_for_save(&registry, &mut entity).unwrap();

        assert_eq!(entity.timestamps.created_at, Some(created_at));
        assert!(entity.timestamps.updated_at.unwrap() > created_at);
    }

    #[test]
    fn null_strings_stay_null() {
        let registry = Registry::new();
        let document = prepare_for_save(&registry, &mut attributed(None)).unwrap();

        assert_eq!(document.get("name"), Some(&Bson::Null));
    }

    #[test]
    fn case_marker_on_non_string_is_a_configuration_error() {
        let schema = Schema::of::<BadMarker>()
            .member(Member::of::<String>("name").marker(Uppercase))
            .member(Member::of::<i32>("age").marker(Lowercase));
        let mut document = doc! { "name": "x", "age": 3 };

        let error = apply_case_markers(&schema, &mut document).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(error.message().contains("`age`"));
        assert_eq!(document, doc! { "name": "x", "age": 3 });
    }

    #[test]
    fn tracking_without_timestamps_is_a_configuration_error() {
        let registry = Registry::new();
        let error = prepare_for_save(&registry, &mut Untracked { id: 7 }).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Configuration);
    }
}
