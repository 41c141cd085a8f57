//! Producers: conduits that emit items with no upstream.
//!
//! A [`Producer`] is one of three node kinds:
//!
//! - a **leaf** wrapping a user [`Produce`] implementation,
//! - a **chain** of a producer followed by a transformer ([`Producer::then`]),
//! - a **group** of producers whose outputs are merged
//!   ([`Producer::with_branch`]).
//!
//! # Sync and async execution of groups
//!
//! Synchronous production of a group concatenates its members' sequences in
//! enumeration order: there is no concurrency primitive on the synchronous
//! path. Asynchronous production interleaves them, delivering whichever
//! branch is ready first. Pipelines may rely on the concatenation order of
//! the synchronous path.

mod chained;
mod concurrent;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::conduit::{Conduit, ConduitId, ConduitKind, ConduitRef, Connection, Expression, Source};
use crate::core::traits::{Consume, Produce, ProductStream, Products};
use crate::core::types::{TypeHierarchy, TypeLattice, TypeTag};
use crate::flow::Flow;
use crate::sources::IterProducer;
use crate::transformer::Transformer;

use chained::ProducerChain;
use concurrent::ProducerGroup;

pub(crate) use concurrent::{concatenate, merge};

/// Internal interface of composite producer nodes, hiding the intermediate
/// item type of a chain.
pub(crate) trait ProducerNode<T>: Source<T> {
    /// The serial producers that together emit this node's products
    fn concurrent_producers(&self) -> Vec<Producer<T>>;

    fn final_conduit(&self) -> Option<ConduitRef>;

    fn chained_conduits(&self) -> Option<Vec<ConduitRef>>;
}

enum Node<T> {
    Leaf {
        id: ConduitId,
        stage: Arc<dyn Produce<Product = T>>,
    },
    Chain(Arc<dyn ProducerNode<T>>),
    Group(Arc<ProducerGroup<T>>),
}

/// A conduit that emits items of type `T` with no upstream.
///
/// Producers are immutable values; composing them builds new producers and
/// cloning one is cheap.
///
/// # Examples
///
/// ```rust
/// use conduitweld::prelude::*;
///
/// let numbers = Producer::from_items(vec![1, 2]).with_branch(Producer::from_items(vec![3, 4]));
/// let items: Result<Vec<i32>> = numbers.produce().collect();
/// assert_eq!(items.unwrap(), vec![1, 2, 3, 4]);
/// ```
pub struct Producer<T> {
    node: Node<T>,
}

impl<T: Send + 'static> Producer<T> {
    /// Wrap a leaf producer
    pub fn new<P: Produce<Product = T>>(stage: P) -> Self {
        Self {
            node: Node::Leaf {
                id: ConduitId::next(),
                stage: Arc::new(stage),
            },
        }
    }

    /// A producer replaying the given items on every run
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Clone + Sync,
    {
        Self::new(IterProducer::new(items))
    }

    /// Chain a transformer after this producer (`self >> transformer`)
    pub fn then<O: Send + 'static>(self, transformer: Transformer<T, O>) -> Producer<O> {
        Producer {
            node: Node::Chain(Arc::new(ProducerChain::new(self, transformer))),
        }
    }

    /// Group this producer concurrently with another (`self & other`), using
    /// the nominal type lattice
    pub fn with_branch(self, other: Producer<T>) -> Producer<T> {
        self.with_branch_in(other, &TypeHierarchy::default())
    }

    /// Group this producer concurrently with another; the group's product
    /// type is the common ancestor of both product types in `lattice`
    pub fn with_branch_in(self, other: Producer<T>, lattice: &dyn TypeLattice) -> Producer<T> {
        let product_type = crate::conduit::concurrent::widen(lattice, &self, &other);
        debug!(
            left = %self.to_expression(),
            right = %other.to_expression(),
            %product_type,
            "grouped producers"
        );
        let mut members = self.into_members();
        members.extend(other.into_members());
        Producer {
            node: Node::Group(Arc::new(ProducerGroup::new(members, product_type))),
        }
    }

    /// Cap this producer with a consumer
    pub fn into_flow<C>(self, consumer: C) -> Flow<T, C>
    where
        C: Consume<Input = T>,
    {
        Flow::new(self, consumer)
    }

    /// The serial producers that make up this (potentially composite)
    /// producer; a serial producer yields only itself
    pub fn concurrent_producers(&self) -> Vec<Producer<T>> {
        if self.is_serial() {
            return vec![self.clone()];
        }
        match &self.node {
            Node::Leaf { .. } => vec![self.clone()],
            Node::Chain(chain) => chain.concurrent_producers(),
            Node::Group(group) => group.concurrent_producers(),
        }
    }

    /// The last stage of a serial producer
    pub fn final_conduit(&self) -> Option<ConduitRef> {
        match &self.node {
            Node::Leaf { id, stage } => Some(leaf_ref(*id, stage.as_ref())),
            Node::Chain(chain) => chain.final_conduit(),
            Node::Group(_) => None,
        }
    }

    /// The ordered stages of a serial producer, upstream first
    pub fn chained_conduits(&self) -> Option<Vec<ConduitRef>> {
        match &self.node {
            Node::Leaf { id, stage } => Some(vec![leaf_ref(*id, stage.as_ref())]),
            Node::Chain(chain) => chain.chained_conduits(),
            Node::Group(_) => None,
        }
    }

    fn into_members(self) -> Vec<Producer<T>> {
        match self.node {
            Node::Group(group) => group.members().to_vec(),
            node => vec![Producer { node }],
        }
    }
}

fn leaf_ref<T: Send + 'static>(id: ConduitId, stage: &dyn Produce<Product = T>) -> ConduitRef {
    ConduitRef::new(
        id,
        stage.name(),
        ConduitKind::Producer,
        None,
        stage.product_type(),
    )
}

impl<T: Send + 'static> Conduit for Producer<T> {
    fn is_chained(&self) -> bool {
        match &self.node {
            Node::Leaf { .. } | Node::Group(_) => false,
            Node::Chain(chain) => chain.is_chained(),
        }
    }

    fn is_serial(&self) -> bool {
        match &self.node {
            Node::Leaf { .. } => true,
            Node::Chain(chain) => chain.is_serial(),
            Node::Group(_) => false,
        }
    }

    fn has_passthrough(&self) -> bool {
        match &self.node {
            Node::Leaf { .. } => false,
            Node::Chain(chain) => chain.has_passthrough(),
            Node::Group(group) => group.has_passthrough(),
        }
    }

    fn input_type(&self) -> Option<TypeTag> {
        None
    }

    fn product_type(&self) -> TypeTag {
        match &self.node {
            Node::Leaf { stage, .. } => stage.product_type(),
            Node::Chain(chain) => chain.product_type(),
            Node::Group(group) => group.product_type(),
        }
    }

    fn final_conduits(&self) -> Vec<ConduitRef> {
        match &self.node {
            Node::Leaf { id, stage } => vec![leaf_ref(*id, stage.as_ref())],
            Node::Chain(chain) => chain.final_conduits(),
            Node::Group(group) => group.final_conduits(),
        }
    }

    fn connections(&self, ingoing: &[ConduitRef]) -> Vec<Connection> {
        match &self.node {
            Node::Leaf { id, stage } => {
                let this = leaf_ref(*id, stage.as_ref());
                ingoing
                    .iter()
                    .map(|from| Connection::new(from.clone(), this.clone()))
                    .collect()
            }
            Node::Chain(chain) => chain.connections(ingoing),
            Node::Group(group) => group.connections(ingoing),
        }
    }

    fn isolated_conduits(&self) -> Vec<ConduitRef> {
        match &self.node {
            Node::Leaf { id, stage } => vec![leaf_ref(*id, stage.as_ref())],
            Node::Chain(chain) => chain.isolated_conduits(),
            Node::Group(group) => group.isolated_conduits(),
        }
    }

    fn to_expression(&self) -> Expression {
        match &self.node {
            Node::Leaf { stage, .. } => Expression::atom(stage.name()),
            Node::Chain(chain) => chain.to_expression(),
            Node::Group(group) => group.to_expression(),
        }
    }
}

impl<T: Send + 'static> Source<T> for Producer<T> {
    fn produce(&self) -> Products<T> {
        match &self.node {
            Node::Leaf { stage, .. } => stage.produce(),
            Node::Chain(chain) => chain.produce(),
            Node::Group(group) => group.produce(),
        }
    }

    fn aproduce(&self) -> ProductStream<T> {
        match &self.node {
            Node::Leaf { stage, .. } => stage.aproduce(),
            Node::Chain(chain) => chain.aproduce(),
            Node::Group(group) => group.aproduce(),
        }
    }
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        let node = match &self.node {
            Node::Leaf { id, stage } => Node::Leaf {
                id: *id,
                stage: Arc::clone(stage),
            },
            Node::Chain(chain) => Node::Chain(Arc::clone(chain)),
            Node::Group(group) => Node::Group(Arc::clone(group)),
        };
        Self { node }
    }
}

impl<T: Send + 'static> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Producer")
            .field(&format_args!("{}", self.to_expression()))
            .finish()
    }
}
