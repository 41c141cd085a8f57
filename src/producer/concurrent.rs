//! Groups of producers and the two ways of running serial producers side by
//! side.

use futures::stream::{self, StreamExt};
use tracing::trace;

use crate::conduit::concurrent::{self, Member};
use crate::conduit::{Conduit, ConduitRef, Connection, Expression, Source};
use crate::core::traits::{ProductStream, Products};
use crate::core::types::TypeTag;
use crate::producer::{Producer, ProducerNode};

/// Run producers one after the other, in enumeration order.
pub(crate) fn concatenate<T: Send + 'static>(producers: Vec<Producer<T>>) -> Products<T> {
    trace!(branches = producers.len(), "concatenating producers");
    Box::new(producers.into_iter().flat_map(|member| member.produce()))
}

/// Run producers concurrently, delivering items as soon as any branch has
/// one ready.
pub(crate) fn merge<T: Send + 'static>(producers: Vec<Producer<T>>) -> ProductStream<T> {
    trace!(branches = producers.len(), "merging producers");
    let streams = producers.iter().map(|member| member.aproduce());
    stream::select_all(streams).boxed()
}

/// Two or more producers whose outputs are merged into one.
pub(crate) struct ProducerGroup<T> {
    members: Vec<Producer<T>>,
    product_type: TypeTag,
}

impl<T: Send + 'static> ProducerGroup<T> {
    pub(crate) fn new(members: Vec<Producer<T>>, product_type: TypeTag) -> Self {
        Self {
            members,
            product_type,
        }
    }

    pub(crate) fn members(&self) -> &[Producer<T>] {
        &self.members
    }

    fn as_members(&self) -> Vec<Member<'_>> {
        self.members
            .iter()
            .map(|member| Member::Conduit(member))
            .collect()
    }
}

impl<T: Send + 'static> Conduit for ProducerGroup<T> {
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
        None
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

impl<T: Send + 'static> Source<T> for ProducerGroup<T> {
    fn produce(&self) -> Products<T> {
        concatenate(self.concurrent_producers())
    }

    fn aproduce(&self) -> ProductStream<T> {
        merge(self.concurrent_producers())
    }
}

impl<T: Send + 'static> ProducerNode<T> for ProducerGroup<T> {
    fn concurrent_producers(&self) -> Vec<Producer<T>> {
        self.members
            .iter()
            .flat_map(Producer::concurrent_producers)
            .collect()
    }

    fn final_conduit(&self) -> Option<ConduitRef> {
        None
    }

    fn chained_conduits(&self) -> Option<Vec<ConduitRef>> {
        None
    }
}
