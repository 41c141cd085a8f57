//! # Composable, type-tagged data pipelines
//!
//! This crate builds pipelines out of three kinds of leaf stages and two
//! composition operators, then executes them either synchronously or
//! asynchronously.
//!
//! ## Core Concepts
//!
//! - **Producer**: Generates a fresh sequence of items every time it runs
//! - **Transformer**: Maps each upstream item to zero or more items
//! - **Consumer**: Drains a pipeline into a final result
//! - **Chaining** (`then`): Feeds one conduit's items into the next
//! - **Grouping** (`with_branch`): Runs branches concurrently over the same
//!   upstream and unions their outputs
//! - **Flow**: A producer capped by a consumer
//!
//! Every composition also describes itself as a graph of leaf conduits
//! ([`Topology`](conduit::Topology)) and as a symbolic
//! [`Expression`](conduit::Expression).
//!
//! ## Example
//!
//! ```rust
//! use conduitweld::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let numbers = Producer::new(RangeProducer::new(1..4));
//!     let doubled = Transformer::new(MapTransformer::new(|x: i64| x * 2));
//!     let negated = Transformer::new(MapTransformer::new(|x: i64| -x));
//!
//!     let pipeline = numbers.then(doubled.with_branch(negated)?);
//!     assert_eq!(
//!         pipeline.to_expression().to_string(),
//!         "RangeProducer >> (MapTransformer & MapTransformer)"
//!     );
//!
//!     let mut items = pipeline.into_flow(CollectConsumer::new()).run().await?;
//!     items.sort();
//!     assert_eq!(items, vec![-3, -2, -1, 2, 4, 6]);
//!     Ok(())
//! }
//! ```

pub mod conduit;
pub mod core;
pub mod flow;
pub mod processors;
pub mod producer;
pub mod sinks;
pub mod sources;
pub mod transformer;
pub mod util;

// Re-export commonly used items
pub mod prelude {
    pub use crate::conduit::{
        Conduit, ConduitId, ConduitKind, ConduitRef, Connection, Expression, Processor, Source,
        Topology,
    };
    pub use crate::core::{
        Consume, Error, IntoError, Produce, ProductStream, Products, Result, Transform,
        TypeHierarchy, TypeLattice, TypeTag,
    };
    pub use crate::flow::{Flow, FlowConfig};
    pub use crate::processors::*;
    pub use crate::producer::Producer;
    pub use crate::sinks::*;
    pub use crate::sources::*;
    pub use crate::transformer::{Passthrough, Transformer};
}

// Re-export main error type
pub use crate::core::{Error, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
