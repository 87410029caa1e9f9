//! Deriving collection names from entity types.

use crate::{
    schema::Schema,
    plural::pluralize,
    error::{ Error, Result },
};

/// Resolves the name of the collection an entity type lives in.
///
/// An explicit, non-blank name in the collection marker wins; otherwise the
/// bare type name is pluralized. Either way, the result is normalized by
/// `normalize_collection_name()`.
///
/// ```
/// # use guava::schema::Schema;
/// # use guava::marker::CollectionMarker;
/// # use guava::naming::resolve_collection_name;
/// #
/// struct Category;
/// struct Order;
///
/// assert_eq!(resolve_collection_name(&Schema::of::<Category>()).unwrap(), "categories");
///
/// let schema = Schema::of::<Order>().collection(CollectionMarker::named("  Orders  "));
/// assert_eq!(resolve_collection_name(&schema).unwrap(), "orders");
/// ```
pub fn resolve_collection_name(schema: &Schema) -> Result<String> {
    let explicit = schema
        .collection_marker()
        .and_then(|marker| marker.name.as_deref())
        .filter(|name| !name.trim().is_empty());

    let name = match explicit {
        Some(name) => normalize_collection_name(name),
        None => normalize_collection_name(&pluralize(schema.type_descriptor().name())),
    };

    if name.is_empty() {
        Err(Error::configuration(format!(
            "type `{}` yields an empty collection name",
            schema.type_descriptor()
        )))
    } else {
        Ok(name)
    }
}

/// Trims, lowercases, and replaces every internal run of whitespace
/// with a single underscore.
pub fn normalize_collection_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeDescriptor;
    use crate::marker::CollectionMarker;
    use crate::error::{ ErrorExt, ErrorKind };

    struct User;
    struct Mouse;
    struct Thing;

    #[test]
    fn derived_names_are_lowercase_plurals() {
        assert_eq!(resolve_collection_name(&Schema::of::<User>()).unwrap(), "users");
        assert_eq!(resolve_collection_name(&Schema::of::<Mouse>()).unwrap(), "mice");
    }

    #[test]
    fn derived_name_matches_normalized_plural() {
        for &name in &["Box", "Order Line", "Leaf", "Xyz"] {
            let ty = TypeDescriptor::of::<Thing>().with_name(name);
            let expected = normalize_collection_name(&pluralize(name));
            assert_eq!(resolve_collection_name(&Schema::for_type(ty)).unwrap(), expected);
        }
    }

    #[test]
    fn explicit_names_are_normalized() {
        let schema = Schema::of::<Thing>().collection(CollectionMarker::named("Order \t Lines"));
        assert_eq!(resolve_collection_name(&schema).unwrap(), "order_lines");

        let schema = Schema::of::<Thing>().collection(CollectionMarker::named("custom_users"));
        assert_eq!(resolve_collection_name(&schema).unwrap(), "custom_users");
    }

    #[test]
    fn blank_explicit_name_falls_back_to_type_name() {
        let schema = Schema::of::<User>().collection(CollectionMarker::named("   "));
        assert_eq!(resolve_collection_name(&schema).unwrap(), "users");

        let schema = Schema::of::<User>().collection(CollectionMarker::default());
        assert_eq!(resolve_collection_name(&schema).unwrap(), "users");
    }

    #[test]
    fn blank_type_name_is_a_configuration_error() {
        let schema = Schema::for_type(TypeDescriptor::of::<Thing>().with_name(" "));
        let error = resolve_collection_name(&schema).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }
}
