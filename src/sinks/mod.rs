//! Consumer implementations for the conduitweld library.
//!
//! This module provides concrete consumers that drain a pipeline into a
//! final result.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::traits::Consume;

/// A consumer that collects every item into a vector.
pub struct CollectConsumer<T> {
    items: Vec<T>,
}

impl<T> CollectConsumer<T> {
    /// Create a new collecting consumer
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Default for CollectConsumer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Consume for CollectConsumer<T> {
    type Input = T;
    type Output = Vec<T>;

    async fn write_batch(&mut self, items: Vec<T>) -> Result<()> {
        self.items.extend(items);
        Ok(())
    }

    async fn finish(&mut self) -> Result<Vec<T>> {
        Ok(std::mem::take(&mut self.items))
    }
}

/// A consumer that counts items
pub struct CountConsumer<T> {
    count: usize,
    _phantom: PhantomData<fn(T)>,
}

impl<T> CountConsumer<T> {
    /// Create a new counting consumer
    pub fn new() -> Self {
        Self {
            count: 0,
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for CountConsumer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Consume for CountConsumer<T> {
    type Input = T;
    type Output = usize;

    async fn write_batch(&mut self, items: Vec<T>) -> Result<()> {
        self.count += items.len();
        Ok(())
    }

    async fn finish(&mut self) -> Result<usize> {
        Ok(self.count)
    }
}

/// A consumer that hands each batch to a function and returns nothing.
pub struct FnConsumer<F, T> {
    f: F,
    _phantom: PhantomData<fn(T)>,
}

impl<F, T> FnConsumer<F, T> {
    /// Create a consumer from a function
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T> Consume for FnConsumer<F, T>
where
    F: FnMut(Vec<T>) -> Result<()> + Send,
    T: Send + 'static,
{
    type Input = T;
    type Output = ();

    async fn write_batch(&mut self, items: Vec<T>) -> Result<()> {
        (self.f)(items)
    }

    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
