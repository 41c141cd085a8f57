//! Two transformers in sequence.

use crate::conduit::{chained, Conduit, ConduitRef, Connection, Expression, Processor};
use crate::core::traits::{ProductStream, Products};
use crate::core::types::TypeTag;
use crate::producer::Producer;
use crate::transformer::{Transformer, TransformerNode};

/// `first >> second`, where `second` processes the output of `first`.
pub(crate) struct TransformerChain<I, M, O> {
    first: Transformer<I, M>,
    second: Transformer<M, O>,
}

impl<I, M, O> TransformerChain<I, M, O>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
{
    pub(crate) fn new(first: Transformer<I, M>, second: Transformer<M, O>) -> Self {
        chained::log_chained(&first, &second);
        Self { first, second }
    }
}

impl<I, M, O> Conduit for TransformerChain<I, M, O>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
{
    fn is_chained(&self) -> bool {
        true
    }

    fn is_serial(&self) -> bool {
        chained::is_serial(&self.first, &self.second)
    }

    fn has_passthrough(&self) -> bool {
        chained::has_passthrough(&self.first, &self.second)
    }

    fn input_type(&self) -> Option<TypeTag> {
        self.first.input_type()
    }

    fn product_type(&self) -> TypeTag {
        self.second.product_type()
    }

    fn final_conduits(&self) -> Vec<ConduitRef> {
        chained::final_conduits(&self.first, &self.second)
    }

    fn connections(&self, ingoing: &[ConduitRef]) -> Vec<Connection> {
        chained::connections(&self.first, &self.second, ingoing)
    }

    fn isolated_conduits(&self) -> Vec<ConduitRef> {
        Vec::new()
    }

    fn to_expression(&self) -> Expression {
        chained::to_expression(&self.first, &self.second)
    }
}

impl<I, M, O> Processor<I, O> for TransformerChain<I, M, O>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
{
    fn process(&self, input: Products<I>) -> Products<O> {
        self.second.process(self.first.process(input))
    }

    fn aprocess(&self, input: ProductStream<I>) -> ProductStream<O> {
        self.second.aprocess(self.first.aprocess(input))
    }
}

impl<I, M, O> TransformerNode<I, O> for TransformerChain<I, M, O>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
{
    fn concurrent_producers(&self, source: &Producer<I>) -> Vec<Producer<O>> {
        self.first
            .concurrent_producers(source)
            .iter()
            .flat_map(|producer| self.second.concurrent_producers(producer))
            .collect()
    }

    fn final_conduit(&self) -> Option<ConduitRef> {
        if self.is_serial() {
            self.second.final_conduit()
        } else {
            None
        }
    }

    fn chained_conduits(&self) -> Option<Vec<ConduitRef>> {
        if !self.is_serial() {
            return None;
        }
        let upstream = self.first.chained_conduits();
        let downstream = self.second.chained_conduits();
        chained::chained_conduits(upstream, downstream)
    }
}
