//! A producer followed by a transformer.

use crate::conduit::{chained, Conduit, ConduitRef, Connection, Expression, Processor, Source};
use crate::core::traits::{ProductStream, Products};
use crate::core::types::TypeTag;
use crate::producer::{concatenate, merge, Producer, ProducerNode};
use crate::transformer::Transformer;

/// `source >> transformer`, emitting the transformer's products.
///
/// When both halves are serial, items stream straight through the
/// transformer. Otherwise the chain runs as the set of serial paths returned
/// by [`concurrent_producers`](ProducerNode::concurrent_producers), each of
/// which invokes its own copy of the upstream.
pub(crate) struct ProducerChain<U, T> {
    source: Producer<U>,
    transformer: Transformer<U, T>,
}

impl<U: Send + 'static, T: Send + 'static> ProducerChain<U, T> {
    pub(crate) fn new(source: Producer<U>, transformer: Transformer<U, T>) -> Self {
        chained::log_chained(&source, &transformer);
        Self {
            source,
            transformer,
        }
    }
}

impl<U: Send + 'static, T: Send + 'static> Conduit for ProducerChain<U, T> {
    fn is_chained(&self) -> bool {
        true
    }

    fn is_serial(&self) -> bool {
        chained::is_serial(&self.source, &self.transformer)
    }

    fn has_passthrough(&self) -> bool {
        chained::has_passthrough(&self.source, &self.transformer)
    }

    fn input_type(&self) -> Option<TypeTag> {
        None
    }

    fn product_type(&self) -> TypeTag {
        self.transformer.product_type()
    }

    fn final_conduits(&self) -> Vec<ConduitRef> {
        chained::final_conduits(&self.source, &self.transformer)
    }

    fn connections(&self, ingoing: &[ConduitRef]) -> Vec<Connection> {
        chained::connections(&self.source, &self.transformer, ingoing)
    }

    fn isolated_conduits(&self) -> Vec<ConduitRef> {
        // a chain always has at least one connection
        Vec::new()
    }

    fn to_expression(&self) -> Expression {
        chained::to_expression(&self.source, &self.transformer)
    }
}

impl<U: Send + 'static, T: Send + 'static> Source<T> for ProducerChain<U, T> {
    fn produce(&self) -> Products<T> {
        if self.is_serial() {
            self.transformer.process(self.source.produce())
        } else {
            concatenate(self.concurrent_producers())
        }
    }

    fn aproduce(&self) -> ProductStream<T> {
        if self.is_serial() {
            self.transformer.aprocess(self.source.aproduce())
        } else {
            merge(self.concurrent_producers())
        }
    }
}

impl<U: Send + 'static, T: Send + 'static> ProducerNode<T> for ProducerChain<U, T> {
    fn concurrent_producers(&self) -> Vec<Producer<T>> {
        self.source
            .concurrent_producers()
            .iter()
            .flat_map(|producer| self.transformer.concurrent_producers(producer))
            .collect()
    }

    fn final_conduit(&self) -> Option<ConduitRef> {
        if self.is_serial() {
            self.transformer.final_conduit()
        } else {
            None
        }
    }

    fn chained_conduits(&self) -> Option<Vec<ConduitRef>> {
        if !self.is_serial() {
            return None;
        }
        chained::chained_conduits(
            self.source.chained_conduits(),
            self.transformer.chained_conduits(),
        )
    }
}
