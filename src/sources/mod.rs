//! Producer implementations for the conduitweld library.
//!
//! This module provides concrete leaf producers that generate data for
//! pipelines. All of them start a fresh sequence on every call to
//! `produce`, so they can feed any number of concurrent branches.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::StreamExt;

use crate::core::error::Result;
use crate::core::traits::{Produce, ProductStream, Products};
use crate::core::types::TypeTag;

/// A producer that replays a fixed list of items
pub struct IterProducer<T> {
    items: Arc<[T]>,
}

impl<T> IterProducer<T> {
    /// Create a new replaying producer
    pub fn new<I: IntoIterator<Item = T>>(items: I) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Get the number of items replayed per run
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the producer replays nothing
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone + Send + Sync + 'static> Produce for IterProducer<T> {
    type Product = T;

    fn produce(&self) -> Products<T> {
        let items = Arc::clone(&self.items);
        Box::new((0..items.len()).map(move |i| Ok(items[i].clone())))
    }
}

/// A producer that generates numbers from a range
pub struct RangeProducer {
    range: Range<i64>,
}

impl RangeProducer {
    /// Create a new range producer
    pub fn new(range: Range<i64>) -> Self {
        Self { range }
    }
}

impl Produce for RangeProducer {
    type Product = i64;

    fn produce(&self) -> Products<i64> {
        Box::new(self.range.clone().map(Ok))
    }
}

/// A producer that repeats a single value
pub struct RepeatProducer<T> {
    value: T,
    count: Option<usize>,
}

impl<T: Clone> RepeatProducer<T> {
    /// Create a producer that repeats a value indefinitely
    pub fn new(value: T) -> Self {
        Self { value, count: None }
    }

    /// Create a producer that repeats a value n times
    pub fn times(value: T, count: usize) -> Self {
        Self {
            value,
            count: Some(count),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Produce for RepeatProducer<T> {
    type Product = T;

    fn produce(&self) -> Products<T> {
        let items = std::iter::repeat(self.value.clone()).map(Ok);
        match self.count {
            Some(count) => Box::new(items.take(count)),
            None => Box::new(items),
        }
    }
}

/// A producer created from a function returning the items of one run
pub struct FnProducer<F> {
    f: F,
    name: Option<String>,
}

impl<F> FnProducer<F> {
    pub fn new(f: F) -> Self {
        Self { f, name: None }
    }

    /// Name the producer in topologies and expressions
    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<F, I, T> Produce for FnProducer<F>
where
    F: Fn() -> I + Send + Sync + 'static,
    I: IntoIterator<Item = Result<T>>,
    I::IntoIter: Send + 'static,
    T: Send + 'static,
{
    type Product = T;

    fn name(&self) -> String {
        self.name.as_deref().unwrap_or("FnProducer").to_string()
    }

    fn produce(&self) -> Products<T> {
        Box::new((self.f)().into_iter())
    }
}

/// A producer that paces another producer's items at a fixed interval.
///
/// The asynchronous path suspends between items, so concurrent branches
/// interleave while it waits; the synchronous path blocks the calling
/// thread instead.
pub struct IntervalProducer<P> {
    inner: P,
    interval: Duration,
}

impl<P> IntervalProducer<P> {
    /// Create a new interval producer
    pub fn new(inner: P, interval: Duration) -> Self {
        Self { inner, interval }
    }
}

impl<P: Produce> Produce for IntervalProducer<P> {
    type Product = P::Product;

    fn name(&self) -> String {
        self.inner.name()
    }

    fn product_type(&self) -> TypeTag {
        self.inner.product_type()
    }

    fn produce(&self) -> Products<P::Product> {
        let interval = self.interval;
        let pause = move |_: &Result<P::Product>| std::thread::sleep(interval);
        Box::new(self.inner.produce().inspect(pause))
    }

    fn aproduce(&self) -> ProductStream<P::Product> {
        let interval = self.interval;
        self.inner
            .aproduce()
            .then(move |item| async move {
                tokio::time::sleep(interval).await;
                item
            })
            .boxed()
    }
}

/// A producer created from a function returning a stream, for producers
/// backed by asynchronous I/O.
pub struct AsyncFnProducer<F> {
    f: F,
}

impl<F> AsyncFnProducer<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, S, T> Produce for AsyncFnProducer<F>
where
    F: Fn() -> S + Send + Sync + 'static,
    S: futures::Stream<Item = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    type Product = T;

    /// Drives the stream to completion on the calling thread.
    fn produce(&self) -> Products<T> {
        Box::new(futures::executor::block_on_stream((self.f)().boxed()))
    }

    fn aproduce(&self) -> ProductStream<T> {
        (self.f)().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::util::try_stream_into_vec;
    use futures::stream;

    #[test]
    fn test_iter_producer_replays() {
        let producer = IterProducer::new(vec!["a", "b"]);
        assert_eq!(producer.len(), 2);
        for _ in 0..2 {
            let items: Result<Vec<_>> = producer.produce().collect();
            assert_eq!(items.unwrap(), vec!["a", "b"]);
        }
    }

    #[test]
    fn test_range_and_repeat() {
        let items: Result<Vec<_>> = RangeProducer::new(0..3).produce().collect();
        assert_eq!(items.unwrap(), vec![0, 1, 2]);

        let items: Result<Vec<_>> = RepeatProducer::times('x', 3).produce().collect();
        assert_eq!(items.unwrap(), vec!['x', 'x', 'x']);

        let first: Vec<_> = RepeatProducer::new(7).produce().take(5).collect();
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_fn_producer_name() {
        let producer = FnProducer::new(|| vec![Ok::<_, Error>(1)]).named("ones");
        assert_eq!(producer.name(), "ones");
    }

    #[tokio::test]
    async fn test_interval_producer_async() {
        let producer = IntervalProducer::new(RangeProducer::new(0..3), Duration::from_millis(1));
        let items = try_stream_into_vec(producer.aproduce()).await.unwrap();
        assert_eq!(items, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_async_fn_producer() {
        let producer = AsyncFnProducer::new(|| stream::iter(vec![Ok::<_, Error>(1), Ok(2)]));
        let items = try_stream_into_vec(producer.aproduce()).await.unwrap();
        assert_eq!(items, vec![1, 2]);

        let items: Result<Vec<_>> = producer.produce().collect();
        assert_eq!(items.unwrap(), vec![1, 2]);
    }
}
