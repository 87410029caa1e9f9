//! Typed filters for querying, counting and removing entities.

use std::fmt::Debug;
use bson::Document;
use mongodb::options::{ FindOptions, FindOneOptions, CountOptions, DeleteOptions };
use crate::entity::Entity;

/// A counting-only query.
pub trait Count<T: Entity>: Debug {
    /// Filter for this query. Defaults to an empty filter,
    /// yielding the number of *all* documents in the collection.
    fn filter(&self) -> Document {
        Default::default()
    }

    /// Options for this query.
    fn options() -> CountOptions {
        T::count_options()
    }
}

/// A regular query (`find_one()` or `find_many()`) operation.
pub trait Query<T: Entity>: Debug {
    /// Filter for restricting returned values. Defaults to an empty filter,
    /// resulting in *all* documents of the collection being returned.
    fn filter(&self) -> Document {
        Default::default()
    }

    /// Options for this query.
    fn options() -> FindOptions {
        T::query_options()
    }
}

/// A deletion / removal operation.
pub trait Delete<T: Entity>: Debug {
    /// Filter for restricting documents to delete.
    fn filter(&self) -> Document;

    /// Options for this deletion operation.
    fn options() -> DeleteOptions {
        T::delete_options()
    }
}

/// The subset of the find options that makes sense for `find_one()`.
pub fn find_one_options(options: FindOptions) -> FindOneOptions {
    let mut one = FindOneOptions::default();
    one.sort = options.sort;
    one.projection = options.projection;
    one.skip = options.skip;
    one.collation = options.collation;
    one.hint = options.hint;
    one.max_time = options.max_time;
    one
}

/////////////////////////////////////////////
// Blanket and convenience implementations //
/////////////////////////////////////////////

impl<T: Entity> Count<T> for Document {
    fn filter(&self) -> Document {
        self.clone()
    }
}

impl<T: Entity> Query<T> for Document {
    fn filter(&self) -> Document {
        self.clone()
    }
}

impl<T: Entity> Delete<T> for Document {
    fn filter(&self) -> Document {
        self.clone()
    }
}

impl<T: Entity, Q: Count<T>> Count<T> for &Q {
    fn filter(&self) -> Document {
        (**self).filter()
    }

    fn options() -> CountOptions {
        Q::options()
    }
}

impl<T: Entity, Q: Query<T>> Query<T> for &Q {
    fn filter(&self) -> Document {
        (**self).filter()
    }

    fn options() -> FindOptions {
        Q::options()
    }
}

impl<T: Entity, Q: Delete<T>> Delete<T> for &Q {
    fn filter(&self) -> Document {
        (**self).filter()
    }

    fn options() -> DeleteOptions {
        Q::options()
    }
}
