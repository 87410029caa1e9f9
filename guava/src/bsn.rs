//! BSON serialization and deserialization helpers.

use serde::{ Serialize, Deserialize };
use bson::{ Bson, Document, document::ValueAccessError };
use crate::error::{ Error, Result, ResultExt };

/// Methods for dynamically type-checking BSON.
pub trait BsonExt: Sized {
    /// Ensures that the BSON value is a `Document` and unwraps it.
    fn try_into_doc(self) -> Result<Document>;
}

impl BsonExt for Bson {
    fn try_into_doc(self) -> Result<Document> {
        match self {
            Bson::Document(doc) => Ok(doc),
            value => Err(Error::with_cause(
                format!("expected Document, got {:?}", value.element_type()),
                ValueAccessError::UnexpectedType,
            ))
        }
    }
}

/// Creates a BSON `Document` out of a serializable value. Integers that
/// don't fit an `i64` are rejected rather than truncated.
pub fn serialize_document<T: Serialize + ?Sized>(value: &T) -> Result<Document> {
    bson::to_bson(value)
        .chain("can't serialize value")
        .and_then(BsonExt::try_into_doc)
}

/// Creates a strongly-typed value out of a BSON `Document`.
pub fn deserialize_document<T>(document: Document) -> Result<T>
    where T: for<'a> Deserialize<'a>
{
    bson::from_document(document).chain(|| format!(
        "can't deserialize `{}`", std::any::type_name::<T>()
    ))
}

/// The `_id` of an entity as a filter document.
pub fn id_filter<I: Serialize + ?Sized>(id: &I) -> Result<Document> {
    let id = bson::to_bson(id).map_err(|error| Error::with_cause("can't serialize `_id`", error))?;
    Ok(bson::doc! { "_id": id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{ bson, doc };
    use crate::error::{ ErrorExt, ErrorKind };

    #[test]
    fn bson_ext_try_into_doc() -> Result<()> {
        let doc = bson!({ "foo": "bar", "qux": 2.5 });
        let other = bson!([{ "key": "value" }, false, null]);

        assert_eq!(doc.try_into_doc()?, doc!{ "foo": "bar", "qux": 2.5 });
        assert_eq!(other.try_into_doc().unwrap_err().kind(), ErrorKind::IllTypedDocumentField);

        Ok(())
    }

    #[test]
    fn serialize_one_document() -> Result<()> {
        #[derive(Serialize)]
        struct Number { value: u64 }

        let good = Number { value: i64::MAX as u64 };
        let bad_64 = Number { value: i64::MAX as u64 + 1 };
        let bad_nodoc: i64 = 0;

        assert_eq!(serialize_document(&good)?, doc!{ "value": i64::MAX });
        assert_eq!(serialize_document(&bad_64).unwrap_err().kind(), ErrorKind::BsonEncoding);
        assert!(serialize_document(&bad_nodoc)
                .unwrap_err()
                .to_string()
                .contains("expected Document, got Int64"));

        Ok(())
    }

    #[test]
    fn deserialize_reports_the_target_type() {
        #[derive(Debug, Deserialize)]
        struct Named { #[allow(dead_code)] name: String }

        let error = deserialize_document::<Named>(doc! { "name": 1 }).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BsonDecoding);
        assert!(error.message().contains("Named"));
    }

    #[test]
    fn id_filters_wrap_the_serialized_id() -> Result<()> {
        assert_eq!(id_filter(&42_i32)?, doc! { "_id": 42 });
        assert_eq!(id_filter("abc")?, doc! { "_id": "abc" });
        Ok(())
    }
}
