//! The marker table of an entity type.
//!
//! A `Schema` records, for one entity type, its optional collection marker
//! and the markers on each of its members, in declaration order. It is what
//! the naming, indexing and save-time transformation logic reads.
//!
//! ```
//! # use guava::schema::{ Schema, Member };
//! # use guava::marker::*;
//! # use guava::literal::IndexOrder;
//! #
//! struct Customer;
//!
//! let schema = Schema::of::<Customer>()
//!     .collection(CollectionMarker::default().track_timestamps(true))
//!     .member(Member::of::<String>("email").marker(UniqueIndex::default()).marker(Lowercase))
//!     .member(Member::of::<i32>("age").marker(SingleFieldIndex {
//!         order: IndexOrder::Descending,
//!         ..Default::default()
//!     }));
//!
//! assert_eq!(schema.type_descriptor().name(), "Customer");
//! assert_eq!(schema.members_with::<UniqueIndex>().len(), 1);
//! assert_eq!(schema.members_with::<Lowercase>()[0].1.name(), "email");
//! ```

use std::fmt;
use std::hash::{ Hash, Hasher };
use std::any::{ TypeId, type_name };
use std::borrow::Cow;
use std::mem::discriminant;
use crate::marker::{ Marker, FieldMarker, CollectionMarker };

/// Identifies a concrete type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Identity of the type.
    id: TypeId,
    /// Fully-qualified name, as reported by the compiler.
    full_name: &'static str,
    /// Bare name, without module path or generic arguments.
    name: Cow<'static, str>,
}

impl TypeDescriptor {
    /// Describes the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full_name = type_name::<T>();

        TypeDescriptor {
            id: TypeId::of::<T>(),
            full_name,
            name: Cow::Borrowed(bare_type_name(full_name)),
        }
    }

    /// Overrides the bare name, e.g. for types whose Rust name differs
    /// from the name they should be known by in the database.
    pub fn with_name<S: Into<Cow<'static, str>>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// The identity of the described type.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully-qualified name of the type.
    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    /// The bare name of the type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether values of this type serialize as (possibly absent) strings.
    pub fn is_text(&self) -> bool {
        [
            TypeId::of::<String>(),
            TypeId::of::<&'static str>(),
            TypeId::of::<Box<str>>(),
            TypeId::of::<Cow<'static, str>>(),
            TypeId::of::<Option<String>>(),
            TypeId::of::<Option<&'static str>>(),
            TypeId::of::<Option<Box<str>>>(),
            TypeId::of::<Option<Cow<'static, str>>>(),
        ].contains(&self.id)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.full_name)
    }
}

/// `my_crate::model::Page<my_crate::model::User>` -> `Page`.
fn bare_type_name(full_name: &str) -> &str {
    let path = full_name.split('<').next().unwrap_or(full_name);
    path.rsplit("::").next().unwrap_or(path)
}

/// A member (struct field) of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    /// The key under which the member is stored in the document.
    name: Cow<'static, str>,
    /// The declared Rust type of the member.
    declared_type: TypeDescriptor,
}

impl MemberDescriptor {
    /// Describes a member of type `F` stored under the key `name`.
    pub fn of<F: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        MemberDescriptor {
            name: name.into(),
            declared_type: TypeDescriptor::of::<F>(),
        }
    }

    /// The document key of the member.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type of the member.
    pub fn declared_type(&self) -> &TypeDescriptor {
        &self.declared_type
    }
}

/// A member together with the markers attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Name and type.
    descriptor: MemberDescriptor,
    /// At most one marker of each kind.
    markers: Vec<FieldMarker>,
}

impl Member {
    /// A member of type `F` stored under the key `name`, without markers.
    pub fn of<F: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Member {
            descriptor: MemberDescriptor::of::<F>(name),
            markers: Vec::new(),
        }
    }

    /// Attaches a marker. A marker of the same kind attached earlier
    /// is replaced.
    pub fn marker<M: Into<FieldMarker>>(mut self, marker: M) -> Self {
        let marker = marker.into();
        let kind = discriminant(&marker);

        match self.markers.iter_mut().find(|m| discriminant(&**m) == kind) {
            Some(existing) => *existing = marker,
            None => self.markers.push(marker),
        }

        self
    }

    /// Name and type of the member.
    pub fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }

    /// All markers of the member.
    pub fn markers(&self) -> &[FieldMarker] {
        &self.markers
    }

    /// The marker of kind `M`, if any.
    pub fn find<M: Marker>(&self) -> Option<&M> {
        self.markers.iter().find_map(M::extract)
    }
}

/// The marker table of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// The entity type.
    ty: TypeDescriptor,
    /// Collection-level settings.
    collection: Option<CollectionMarker>,
    /// Members in declaration order.
    members: Vec<Member>,
}

impl Schema {
    /// An empty marker table for the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::for_type(TypeDescriptor::of::<T>())
    }

    /// An empty marker table for the described type.
    pub fn for_type(ty: TypeDescriptor) -> Self {
        Schema {
            ty,
            collection: None,
            members: Vec::new(),
        }
    }

    /// Sets the collection marker.
    pub fn collection(mut self, marker: CollectionMarker) -> Self {
        self.collection = Some(marker);
        self
    }

    /// Appends a member. Members keep the order in which they are added.
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// The entity type this schema describes.
    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// The collection marker, if any.
    pub fn collection_marker(&self) -> Option<&CollectionMarker> {
        self.collection.as_ref()
    }

    /// All members, in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Every member carrying a marker of kind `M`, paired with that marker,
    /// in declaration order.
    pub fn members_with<M: Marker>(&self) -> Vec<(&M, &MemberDescriptor)> {
        self.members
            .iter()
            .filter_map(|member| member.find::<M>().map(|marker| (marker, &member.descriptor)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::*;
    use crate::literal::IndexOrder;

    #[allow(dead_code)]
    struct Wrapper<T>(T);

    #[test]
    fn bare_names_strip_paths_and_generics() {
        assert_eq!(TypeDescriptor::of::<String>().name(), "String");
        assert_eq!(TypeDescriptor::of::<Wrapper<Vec<u8>>>().name(), "Wrapper");
        assert_eq!(TypeDescriptor::of::<i32>().name(), "i32");
        assert_eq!(TypeDescriptor::of::<u8>().with_name("Byte").name(), "Byte");
    }

    #[test]
    fn type_descriptors_compare_by_identity() {
        let renamed = TypeDescriptor::of::<String>().with_name("Text");
        assert_eq!(renamed, TypeDescriptor::of::<String>());
        assert_ne!(renamed, TypeDescriptor::of::<str>());
    }

    #[test]
    fn string_like_types_are_text() {
        assert!(TypeDescriptor::of::<String>().is_text());
        assert!(TypeDescriptor::of::<Option<String>>().is_text());
        assert!(TypeDescriptor::of::<Cow<'static, str>>().is_text());
        assert!(!TypeDescriptor::of::<i32>().is_text());
        assert!(!TypeDescriptor::of::<Vec<String>>().is_text());
    }

    #[test]
    fn later_marker_of_same_kind_replaces_earlier_one() {
        let member = Member::of::<i32>("age")
            .marker(SingleFieldIndex::default())
            .marker(Lowercase)
            .marker(SingleFieldIndex { order: IndexOrder::Hashed, ..Default::default() });

        assert_eq!(member.markers().len(), 2);
        assert_eq!(member.find::<SingleFieldIndex>().map(|m| m.order), Some(IndexOrder::Hashed));
        assert!(member.find::<Uppercase>().is_none());
    }

    #[test]
    fn typed_scan_keeps_declaration_order() {
        let schema = Schema::of::<Wrapper<()>>()
            .member(Member::of::<String>("b").marker(Uppercase))
            .member(Member::of::<String>("c"))
            .member(Member::of::<String>("a").marker(Uppercase).marker(UniqueIndex::default()));

        let names: Vec<_> = schema
            .members_with::<Uppercase>()
            .into_iter()
            .map(|(_, member)| member.name())
            .collect();

        assert_eq!(names, ["b", "a"]);
        assert_eq!(schema.members_with::<UniqueIndex>().len(), 1);
        assert!(schema.members_with::<GeospatialIndex>().is_empty());
        assert!(schema.collection_marker().is_none());
    }
}
