//! Flow execution.
//!
//! A [`Flow`] caps a producer with a consumer. Running it drains every final
//! conduit of the producer into the consumer, in batches, and returns the
//! consumer's result. Errors raised by any stage or by the consumer end the
//! run and are returned unchanged.

use std::time::Duration;

use futures::executor::block_on;
use futures::stream::StreamExt;
use tracing::debug;

use crate::conduit::{
    Conduit, ConduitId, ConduitKind, ConduitRef, Connection, Expression, Source, Topology,
};
use crate::core::error::{Error, Result};
use crate::core::traits::Consume;
use crate::core::types::TypeTag;
use crate::producer::Producer;

/// Configuration for flow execution
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Number of items handed to the consumer at once
    pub batch_size: usize,
    /// Maximum time to wait for the next item on the async path
    pub operation_timeout: Option<Duration>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            operation_timeout: None,
        }
    }
}

/// A producer capped by a consumer.
///
/// # Examples
///
/// ```rust
/// use conduitweld::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let squares = Producer::new(RangeProducer::new(1..4))
///         .then(Transformer::new(MapTransformer::new(|x: i64| x * x)));
///
///     let items = squares.into_flow(CollectConsumer::new()).batch_size(2).run().await?;
///     assert_eq!(items, vec![1, 4, 9]);
///     Ok(())
/// }
/// ```
pub struct Flow<T, C> {
    producer: Producer<T>,
    consumer: C,
    consumer_id: ConduitId,
    config: FlowConfig,
}

impl<T, C> Flow<T, C>
where
    T: Send + 'static,
    C: Consume<Input = T>,
{
    /// Create a new flow
    pub fn new(producer: Producer<T>, consumer: C) -> Self {
        Self {
            producer,
            consumer,
            consumer_id: ConduitId::next(),
            config: FlowConfig::default(),
        }
    }

    /// Set the consumer batch size
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size.max(1);
        self
    }

    /// Set the timeout for each async pull
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = Some(timeout);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: FlowConfig) -> Self {
        self.config = FlowConfig {
            batch_size: config.batch_size.max(1),
            ..config
        };
        self
    }

    pub fn producer(&self) -> &Producer<T> {
        &self.producer
    }

    fn consumer_ref(&self) -> ConduitRef {
        ConduitRef::new(
            self.consumer_id,
            self.consumer.name(),
            ConduitKind::Consumer,
            Some(self.consumer.input_type()),
            TypeTag::of::<C::Output>(),
        )
    }

    /// All edges of the flow: the producer's own connections, then one edge
    /// from every final conduit into the consumer
    pub fn connections(&self) -> Vec<Connection> {
        let consumer = self.consumer_ref();
        let mut connections = self.producer.connections(&[]);
        connections.extend(
            self.producer
                .final_conduits()
                .into_iter()
                .map(|from| Connection::new(from, consumer.clone())),
        );
        connections
    }

    /// The rendered graph of the flow; a flow has no isolated conduits
    pub fn topology(&self) -> Topology {
        Topology {
            connections: self.connections(),
            isolated: Vec::new(),
        }
    }

    pub fn to_expression(&self) -> Expression {
        self.producer
            .to_expression()
            .then(Expression::atom(self.consumer.name()))
    }

    /// Run the flow asynchronously, merging concurrent branches as they
    /// become ready.
    pub async fn run(self) -> Result<C::Output> {
        debug!(flow = %self.to_expression(), "running flow");
        let Flow {
            producer,
            mut consumer,
            config,
            ..
        } = self;

        let mut products = producer.aproduce();
        let mut batch = Vec::with_capacity(config.batch_size);
        let mut total = 0usize;

        loop {
            let next = match config.operation_timeout {
                Some(limit) => {
                    let pulled = tokio::time::timeout(limit, products.next()).await;
                    pulled.map_err(|_| timeout_error(limit))?
                }
                None => products.next().await,
            };
            let item = match next {
                Some(item) => item?,
                None => break,
            };

            batch.push(item);
            total += 1;
            if batch.len() >= config.batch_size {
                consumer.write_batch(std::mem::take(&mut batch)).await?;
            }
        }

        if !batch.is_empty() {
            consumer.write_batch(batch).await?;
        }
        let output = consumer.finish().await?;
        debug!(items = total, "flow finished");
        Ok(output)
    }

    /// Run the flow synchronously: concurrent branches run one after the
    /// other, in enumeration order.
    ///
    /// Consumer calls are driven to completion on the calling thread, so
    /// consumers relying on a tokio runtime must be run with
    /// [`run`](Flow::run) instead. The operation timeout does not apply.
    pub fn run_sync(self) -> Result<C::Output> {
        debug!(flow = %self.to_expression(), "running flow synchronously");
        let Flow {
            producer,
            mut consumer,
            config,
            ..
        } = self;

        let mut batch = Vec::with_capacity(config.batch_size);
        let mut total = 0usize;

        for item in producer.produce() {
            batch.push(item?);
            total += 1;
            if batch.len() >= config.batch_size {
                let full = std::mem::take(&mut batch);
                block_on(consumer.write_batch(full))?;
            }
        }

        if !batch.is_empty() {
            block_on(consumer.write_batch(batch))?;
        }
        let output = block_on(consumer.finish())?;
        debug!(items = total, "flow finished");
        Ok(output)
    }
}

/// Timeout error carrying the limit in whole milliseconds, saturating at
/// `u64::MAX`
fn timeout_error(limit: Duration) -> Error {
    Error::timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
}
