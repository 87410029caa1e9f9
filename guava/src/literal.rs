//! Index orders and index key types, as declared on entity members and as
//! sent to MongoDB.

use std::fmt;
use std::str::FromStr;
use bson::Bson;
use serde::ser::{ Serialize, Serializer };
use crate::error::{ Error, Result };

/// Ordering of a single key inside an index or a sort specification.
/// ```
/// # use bson::doc;
/// # use guava::literal::Order;
/// #
/// let sorting = doc! {
///     "_id": Order::Ascending,
///     "zip": Order::Descending,
/// };
/// assert_eq!(sorting, doc!{
///     "_id":  1,
///     "zip": -1,
/// });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Order {
    /// Order smaller values first.
    #[default]
    Ascending  =  1,
    /// Order greater values first.
    Descending = -1,
}

impl From<Order> for Bson {
    fn from(order: Order) -> Self {
        Bson::Int32(order as _)
    }
}

impl Serialize for Order {
    fn serialize<S: Serializer>(&self, ser: S) -> std::result::Result<S::Ok, S::Error> {
        ser.serialize_i32(*self as _)
    }
}

/// The type of a single key in an index, as understood by MongoDB.
/// ```
/// # use bson::doc;
/// # use guava::literal::{ IndexType, Order };
/// #
/// let patient_index = doc!{
///     "body.mass": IndexType::Ordered(Order::Ascending),
///     "birth_date.year": IndexType::Ordered(Order::Descending),
///     "insurance_id": IndexType::Hashed,
///     "address_gps_coords": IndexType::Geo2DSphere,
/// };
/// assert_eq!(patient_index, doc!{
///     "body.mass": 1,
///     "birth_date.year": -1,
///     "insurance_id": "hashed",
///     "address_gps_coords": "2dsphere",
/// });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// An ordered index field.
    Ordered(Order),
    /// Hashed index for hash-based sharding and equality lookups.
    Hashed,
    /// 2D geospatial index with planar (Euclidean) geometry.
    Geo2D,
    /// 2D geospatial index with spherical geometry.
    Geo2DSphere,
}

impl From<IndexType> for Bson {
    fn from(index_type: IndexType) -> Self {
        match index_type {
            IndexType::Ordered(order) => Bson::from(order),
            IndexType::Hashed         => Bson::from("hashed"),
            IndexType::Geo2D          => Bson::from("2d"),
            IndexType::Geo2DSphere    => Bson::from("2dsphere"),
        }
    }
}

impl Serialize for IndexType {
    fn serialize<S: Serializer>(&self, ser: S) -> std::result::Result<S::Ok, S::Error> {
        Bson::from(*self).serialize(ser)
    }
}

/// Direction of a single-field or compound index key, as declared by a
/// member marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexOrder {
    /// Smaller values first.
    #[default]
    Ascending,
    /// Greater values first.
    Descending,
    /// Hashed key, no ordering.
    Hashed,
}

impl IndexOrder {
    /// The textual form accepted by `FromStr`.
    pub fn as_str(self) -> &'static str {
        match self {
            IndexOrder::Ascending  => "ascending",
            IndexOrder::Descending => "descending",
            IndexOrder::Hashed     => "hashed",
        }
    }
}

impl From<IndexOrder> for IndexType {
    fn from(order: IndexOrder) -> Self {
        match order {
            IndexOrder::Ascending  => IndexType::Ordered(Order::Ascending),
            IndexOrder::Descending => IndexType::Ordered(Order::Descending),
            IndexOrder::Hashed     => IndexType::Hashed,
        }
    }
}

/// Case-insensitive; rejects anything but the three known orders.
/// ```
/// # use guava::literal::IndexOrder;
/// # use guava::error::{ ErrorExt, ErrorKind };
/// #
/// assert_eq!("Descending".parse::<IndexOrder>().unwrap(), IndexOrder::Descending);
/// assert_eq!("hashed".parse::<IndexOrder>().unwrap(), IndexOrder::Hashed);
/// assert_eq!("sideways".parse::<IndexOrder>().unwrap_err().kind(),
///            ErrorKind::Configuration);
/// ```
impl FromStr for IndexOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [IndexOrder::Ascending, IndexOrder::Descending, IndexOrder::Hashed]
            .iter()
            .copied()
            .find(|order| order.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::configuration(format!("unknown index order `{}`", s)))
    }
}

impl fmt::Display for IndexOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry of a geospatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeospatialKind {
    /// Legacy coordinate pairs on a flat plane.
    TwoD,
    /// GeoJSON objects on an earth-like sphere.
    #[default]
    TwoDSphere,
}

impl GeospatialKind {
    /// The textual form accepted by `FromStr`, identical to the one MongoDB uses.
    pub fn as_str(self) -> &'static str {
        match self {
            GeospatialKind::TwoD       => "2d",
            GeospatialKind::TwoDSphere => "2dsphere",
        }
    }
}

impl From<GeospatialKind> for IndexType {
    fn from(kind: GeospatialKind) -> Self {
        match kind {
            GeospatialKind::TwoD       => IndexType::Geo2D,
            GeospatialKind::TwoDSphere => IndexType::Geo2DSphere,
        }
    }
}

impl FromStr for GeospatialKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2d"       => Ok(GeospatialKind::TwoD),
            "2dsphere" => Ok(GeospatialKind::TwoDSphere),
            _ => Err(Error::configuration(format!("unknown geospatial index kind `{}`", s))),
        }
    }
}

impl fmt::Display for GeospatialKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
