//! Transformer implementations for the conduitweld library.
//!
//! This module provides concrete leaf transformers built from closures,
//! covering the common per-item shapes: one-to-one, one-to-many and
//! filtering.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::core::error::Result;
use crate::core::traits::Transform;

/// A transformer that maps each item using a function.
pub struct MapTransformer<F, T, U> {
    f: F,
    _phantom: PhantomData<fn(T) -> U>,
}

impl<F, T, U> MapTransformer<F, T, U> {
    /// Create a new map transformer
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, U> Transform for MapTransformer<F, T, U>
where
    F: Fn(T) -> U + Send + Sync + 'static,
    T: Send + 'static,
    U: Send + 'static,
{
    type Input = T;
    type Output = U;

    fn transform(&self, item: T) -> Result<Vec<U>> {
        Ok(vec![(self.f)(item)])
    }
}

/// A transformer that maps each item using a fallible function.
///
/// A failure is emitted in place of the item and does not stop the
/// pipeline; it is up to whoever drains the pipeline to decide.
pub struct TryMapTransformer<F, T, U> {
    f: F,
    _phantom: PhantomData<fn(T) -> U>,
}

impl<F, T, U> TryMapTransformer<F, T, U> {
    /// Create a new fallible map transformer
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, U> Transform for TryMapTransformer<F, T, U>
where
    F: Fn(T) -> Result<U> + Send + Sync + 'static,
    T: Send + 'static,
    U: Send + 'static,
{
    type Input = T;
    type Output = U;

    fn transform(&self, item: T) -> Result<Vec<U>> {
        Ok(vec![(self.f)(item)?])
    }
}

/// A transformer that expands each item into any number of items.
pub struct FlatMapTransformer<F, T, U> {
    f: F,
    _phantom: PhantomData<fn(T) -> U>,
}

impl<F, T, U> FlatMapTransformer<F, T, U> {
    /// Create a new flat-map transformer
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, U, I> Transform for FlatMapTransformer<F, T, U>
where
    F: Fn(T) -> I + Send + Sync + 'static,
    I: IntoIterator<Item = U>,
    T: Send + 'static,
    U: Send + 'static,
{
    type Input = T;
    type Output = U;

    fn transform(&self, item: T) -> Result<Vec<U>> {
        Ok((self.f)(item).into_iter().collect())
    }
}

/// A transformer that only passes items satisfying a predicate.
pub struct FilterTransformer<F, T> {
    predicate: F,
    _phantom: PhantomData<fn(T) -> T>,
}

impl<F, T> FilterTransformer<F, T> {
    /// Create a new filter transformer
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _phantom: PhantomData,
        }
    }
}

impl<F, T> Transform for FilterTransformer<F, T>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
    T: Send + 'static,
{
    type Input = T;
    type Output = T;

    fn transform(&self, item: T) -> Result<Vec<T>> {
        if (self.predicate)(&item) {
            Ok(vec![item])
        } else {
            Ok(vec![])
        }
    }
}

/// A transformer that delays each item.
///
/// The asynchronous path suspends; the synchronous path blocks the thread.
pub struct DelayTransformer<T> {
    delay: Duration,
    _phantom: PhantomData<fn(T) -> T>,
}

impl<T> DelayTransformer<T> {
    /// Create a new delay transformer
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Transform for DelayTransformer<T> {
    type Input = T;
    type Output = T;

    fn transform(&self, item: T) -> Result<Vec<T>> {
        std::thread::sleep(self.delay);
        Ok(vec![item])
    }

    async fn atransform(&self, item: T) -> Result<Vec<T>> {
        sleep(self.delay).await;
        Ok(vec![item])
    }
}
