//! Typed, generic wrapper around MongoDB `Cursor`s.

use std::fmt;
use std::pin::Pin;
use std::marker::PhantomData;
use std::task::{ Context, Poll };
use futures::stream::{ Stream, StreamExt, BoxStream, TryStreamExt };
use serde::Deserialize;
use bson::Document;
use crate::{
    bsn::deserialize_document,
    error::{ Result, ResultExt },
};

/// A typed stream of entities over a MongoDB cursor.
pub struct Cursor<T> {
    /// The underlying MongoDB cursor.
    inner: BoxStream<'static, mongodb::error::Result<Document>>,
    /// Just here so that the type parameter is used.
    _marker: PhantomData<fn() -> T>,
}

impl<T> Cursor<T> where T: for<'a> Deserialize<'a> {
    /// Wraps an untyped MongoDB cursor.
    pub(crate) fn new(inner: mongodb::Cursor<Document>) -> Self {
        Cursor {
            inner: inner.boxed(),
            _marker: PhantomData,
        }
    }

    /// Reads every remaining entity.
    pub async fn collect_all(self) -> Result<Vec<T>> {
        self.try_collect().await
    }
}

impl<T> Stream for Cursor<T> where T: for<'a> Deserialize<'a> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx).map(|next| next.map(|result| {
            result
                .chain("can't step Cursor")
                .and_then(deserialize_document)
        }))
    }
}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Cursor<{}>", std::any::type_name::<T>())
    }
}
