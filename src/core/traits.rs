//! Leaf stage traits.
//!
//! These are the extension points of the system: user code implements
//! [`Produce`] to create items from scratch, [`Transform`] to expand each
//! upstream item into zero or more downstream items, and [`Consume`] to drain
//! a finished pipeline into a result. Leaves are wrapped into
//! [`Producer`](crate::producer::Producer) and
//! [`Transformer`](crate::transformer::Transformer) conduits, which the
//! composition methods then combine into larger pipelines.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::core::error::Result;
use crate::core::types::TypeTag;
use crate::util::short_type_name;

/// A lazy, synchronous sequence of items.
///
/// Each item is a `Result` so that leaf failures travel to whoever drives the
/// iteration without being swallowed by intermediate stages.
pub type Products<T> = Box<dyn Iterator<Item = Result<T>> + Send>;

/// The asynchronous counterpart of [`Products`].
pub type ProductStream<T> = BoxStream<'static, Result<T>>;

/// A leaf stage that generates items with no upstream.
///
/// Every call to [`produce`](Produce::produce) should start a fresh sequence:
/// concurrent branches that share this producer as their upstream invoke it
/// once per branch.
///
/// # Examples
///
/// ```rust
/// use conduitweld::core::{Produce, Products};
///
/// struct Countdown(u32);
///
/// impl Produce for Countdown {
///     type Product = u32;
///
///     fn produce(&self) -> Products<u32> {
///         Box::new((0..self.0).rev().map(Ok))
///     }
/// }
/// ```
pub trait Produce: Send + Sync + 'static {
    /// The type of items this producer generates
    type Product: Send + 'static;

    /// Display name used in topologies and expressions
    fn name(&self) -> String {
        short_type_name::<Self>()
    }

    /// Semantic type of the generated items
    fn product_type(&self) -> TypeTag {
        TypeTag::of::<Self::Product>()
    }

    /// Generate new products.
    fn produce(&self) -> Products<Self::Product>;

    /// Generate new products asynchronously.
    ///
    /// By default, replays [`produce`](Produce::produce). That replay is not
    /// guaranteed to be non-blocking; producers that do real asynchronous
    /// I/O should override this method.
    fn aproduce(&self) -> ProductStream<Self::Product> {
        stream::iter(self.produce()).boxed()
    }
}

/// A leaf stage that expands each upstream item into zero or more items.
///
/// Transformations should not keep state across calls that callers could
/// observe, since the same transformer may run once per concurrent branch.
///
/// # Examples
///
/// ```rust
/// use conduitweld::core::{Result, Transform};
///
/// struct Twice;
///
/// impl Transform for Twice {
///     type Input = i32;
///     type Output = i32;
///
///     fn transform(&self, item: i32) -> Result<Vec<i32>> {
///         Ok(vec![item, item])
///     }
/// }
/// ```
#[async_trait]
pub trait Transform: Send + Sync + 'static {
    /// The type of items this transformer accepts
    type Input: Send + 'static;
    /// The type of items this transformer produces
    type Output: Send + 'static;

    /// Display name used in topologies and expressions
    fn name(&self) -> String {
        short_type_name::<Self>()
    }

    /// Semantic type of the accepted items
    fn input_type(&self) -> TypeTag {
        TypeTag::of::<Self::Input>()
    }

    /// Semantic type of the generated items
    fn product_type(&self) -> TypeTag {
        TypeTag::of::<Self::Output>()
    }

    /// Generate new products from one upstream product.
    fn transform(&self, item: Self::Input) -> Result<Vec<Self::Output>>;

    /// Generate new products asynchronously.
    ///
    /// By default, defers to [`transform`](Transform::transform).
    async fn atransform(&self, item: Self::Input) -> Result<Vec<Self::Output>> {
        self.transform(item)
    }
}

/// A terminal stage that drains a pipeline into a single result.
///
/// Consumers are batch-first: a [`Flow`](crate::flow::Flow) hands them items
/// in batches and calls [`finish`](Consume::finish) once the upstream is
/// exhausted.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use conduitweld::core::{Consume, Result};
///
/// struct Sum(i64);
///
/// #[async_trait]
/// impl Consume for Sum {
///     type Input = i64;
///     type Output = i64;
///
///     async fn write_batch(&mut self, items: Vec<i64>) -> Result<()> {
///         self.0 += items.iter().sum::<i64>();
///         Ok(())
///     }
///
///     async fn finish(&mut self) -> Result<i64> {
///         Ok(self.0)
///     }
/// }
/// ```
#[async_trait]
pub trait Consume: Send {
    /// The type of items this consumer accepts
    type Input: Send + 'static;
    /// The result of draining the pipeline
    type Output: Send;

    /// Display name used in topologies and expressions
    fn name(&self) -> String {
        short_type_name::<Self>()
    }

    /// Semantic type of the accepted items
    fn input_type(&self) -> TypeTag {
        TypeTag::of::<Self::Input>()
    }

    /// Process a batch of items.
    async fn write_batch(&mut self, items: Vec<Self::Input>) -> Result<()>;

    /// Called when the upstream is exhausted; returns the final result.
    async fn finish(&mut self) -> Result<Self::Output>;
}
