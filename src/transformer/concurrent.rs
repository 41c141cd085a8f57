//! Concurrent groups of transformer branches over one shared upstream.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{debug, trace};

use crate::conduit::concurrent::{self, Member};
use crate::conduit::{Conduit, ConduitRef, Connection, Expression, Processor};
use crate::core::error::Result;
use crate::core::traits::{ProductStream, Products};
use crate::core::types::TypeTag;
use crate::producer::{concatenate, merge, Producer};
use crate::transformer::{Node, Transformer, TransformerNode};
use crate::util::try_stream_into_vec;

/// One branch of a transformer group.
pub(crate) enum Branch<I, O> {
    Stage(Transformer<I, O>),
    /// Re-emits the upstream unchanged. Only constructible when `I == O`,
    /// which the function pointer witnesses.
    Passthrough(fn(Producer<I>) -> Producer<O>),
}

impl<T: Send + 'static> Branch<T, T> {
    pub(crate) fn passthrough() -> Self {
        fn identity<T>(source: Producer<T>) -> Producer<T> {
            source
        }
        Branch::Passthrough(identity::<T>)
    }
}

impl<I, O> Clone for Branch<I, O> {
    fn clone(&self) -> Self {
        match self {
            Branch::Stage(transformer) => Branch::Stage(transformer.clone()),
            Branch::Passthrough(forward) => Branch::Passthrough(*forward),
        }
    }
}

/// The serial producers for every path from `source` through `branches`.
fn fan_out<I, O>(branches: &[Branch<I, O>], source: &Producer<I>) -> Vec<Producer<O>>
where
    I: Send + 'static,
    O: Send + 'static,
{
    branches
        .iter()
        .flat_map(|branch| match branch {
            Branch::Stage(transformer) => transformer.concurrent_producers(source),
            Branch::Passthrough(forward) => source
                .concurrent_producers()
                .into_iter()
                .map(*forward)
                .collect(),
        })
        .collect()
}

/// Materialise `input`, then run it through every branch one after the
/// other.
fn replay<I, O>(branches: &[Branch<I, O>], input: Products<I>) -> Products<O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    match input.collect::<Result<Vec<I>>>() {
        Ok(items) => {
            trace!(items = items.len(), "materialised upstream for fan-out");
            concatenate(fan_out(branches, &Producer::from_items(items)))
        }
        Err(e) => Box::new(std::iter::once(Err(e))),
    }
}

/// Transformer branches that all receive the same upstream items.
///
/// Every branch consumes the upstream independently, so the group first
/// materialises the upstream into a replayable producer and then runs one
/// serial path per branch over it.
pub(crate) struct TransformerGroup<I, O> {
    branches: Vec<Branch<I, O>>,
    input_type: TypeTag,
    product_type: TypeTag,
}

impl<I, O> TransformerGroup<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    pub(crate) fn new(
        branches: Vec<Branch<I, O>>,
        input_type: TypeTag,
        product_type: TypeTag,
    ) -> Self {
        let group = Self {
            branches,
            input_type,
            product_type,
        };
        debug!(
            group = %group.to_expression(),
            input_type = %group.input_type,
            product_type = %group.product_type,
            "grouped transformers"
        );
        group
    }

    pub(crate) fn into_transformer(self) -> Transformer<I, O> {
        Transformer {
            node: Node::Group(Arc::new(self)),
        }
    }

    fn as_members(&self) -> Vec<Member<'_>> {
        self.branches
            .iter()
            .map(|branch| match branch {
                Branch::Stage(transformer) => Member::Conduit(transformer),
                Branch::Passthrough(_) => Member::Passthrough,
            })
            .collect()
    }
}

impl<I, O> Conduit for TransformerGroup<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    fn is_chained(&self) -> bool {
        false
    }

    fn is_serial(&self) -> bool {
        false
    }

    fn has_passthrough(&self) -> bool {
        concurrent::has_passthrough(&self.as_members())
    }

    fn input_type(&self) -> Option<TypeTag> {
        Some(self.input_type.clone())
    }

    fn product_type(&self) -> TypeTag {
        self.product_type.clone()
    }

    fn final_conduits(&self) -> Vec<ConduitRef> {
        concurrent::final_conduits(&self.as_members())
    }

    fn connections(&self, ingoing: &[ConduitRef]) -> Vec<Connection> {
        concurrent::connections(&self.as_members(), ingoing)
    }

    fn isolated_conduits(&self) -> Vec<ConduitRef> {
        concurrent::isolated_conduits(&self.as_members())
    }

    fn to_expression(&self) -> Expression {
        concurrent::to_expression(&self.as_members())
    }
}

impl<I, O> Processor<I, O> for TransformerGroup<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    fn process(&self, input: Products<I>) -> Products<O> {
        let branches = self.branches.clone();
        let mut pending = Some(input);
        // materialised on the first pull
        let upstream = std::iter::from_fn(move || pending.take());
        Box::new(upstream.flat_map(move |input| replay(&branches, input)))
    }

    fn aprocess(&self, input: ProductStream<I>) -> ProductStream<O> {
        let branches = self.branches.clone();
        stream::once(try_stream_into_vec(input))
            .flat_map(move |materialized| match materialized {
                Ok(items) => {
                    trace!(items = items.len(), "materialised upstream for fan-out");
                    merge(fan_out(&branches, &Producer::from_items(items)))
                }
                Err(e) => stream::once(future::ready(Err(e))).boxed(),
            })
            .boxed()
    }
}

impl<I, O> TransformerNode<I, O> for TransformerGroup<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    fn concurrent_producers(&self, source: &Producer<I>) -> Vec<Producer<O>> {
        fan_out(&self.branches, source)
    }

    fn final_conduit(&self) -> Option<ConduitRef> {
        None
    }

    fn chained_conduits(&self) -> Option<Vec<ConduitRef>> {
        None
    }
}
