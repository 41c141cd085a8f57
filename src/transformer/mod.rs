//! Transformers: conduits that turn an upstream item sequence into a
//! downstream one.
//!
//! Like producers, a [`Transformer`] is a leaf, a chain of two transformers
//! ([`Transformer::then`]) or a group of concurrent branches
//! ([`Transformer::with_branch`]). A group may also contain a
//! [`Passthrough`] branch that re-emits the group's input unchanged.

mod chained;
mod concurrent;

use std::fmt;
use std::sync::Arc;

use futures::stream::StreamExt;

use crate::conduit::{
    concurrent as rules, Conduit, ConduitId, ConduitKind, ConduitRef, Connection, Expression,
    Processor,
};
use crate::core::error::Result;
use crate::core::traits::{ProductStream, Products, Transform};
use crate::core::types::{TypeHierarchy, TypeLattice, TypeTag};
use crate::producer::Producer;
use crate::util::expand;

use chained::TransformerChain;
use concurrent::{Branch, TransformerGroup};

/// Internal interface of composite transformer nodes, hiding the
/// intermediate item type of a chain and the `Clone` bound a group needs.
pub(crate) trait TransformerNode<I, O>: Processor<I, O> {
    /// Serial producers which, run concurrently, produce everything this
    /// node would produce from `source`
    fn concurrent_producers(&self, source: &Producer<I>) -> Vec<Producer<O>>;

    fn final_conduit(&self) -> Option<ConduitRef>;

    fn chained_conduits(&self) -> Option<Vec<ConduitRef>>;
}

enum Node<I, O> {
    Leaf {
        id: ConduitId,
        stage: Arc<dyn Transform<Input = I, Output = O>>,
    },
    Chain(Arc<dyn TransformerNode<I, O>>),
    Group(Arc<dyn TransformerNode<I, O>>),
}

/// A conduit that maps items of type `I` to items of type `O`.
///
/// A transformer is a [`Processor`] only: it never emits items without an
/// upstream, so it does not implement [`Source`](crate::conduit::Source).
/// Chain it after a [`Producer`] to obtain one.
///
/// # Examples
///
/// ```rust
/// use conduitweld::prelude::*;
///
/// let double = Transformer::new(FlatMapTransformer::new(|x: i32| vec![x, x]));
/// let doubled = Producer::from_items(vec![1, 2]).then(double);
/// let items: Result<Vec<i32>> = doubled.produce().collect();
/// assert_eq!(items.unwrap(), vec![1, 1, 2, 2]);
/// ```
///
/// A transformer on its own cannot produce:
///
/// ```rust,compile_fail
/// use conduitweld::prelude::*;
///
/// let double = Transformer::new(MapTransformer::new(|x: i32| x * 2));
/// let _ = double.produce();
/// ```
pub struct Transformer<I, O> {
    node: Node<I, O>,
}

impl<I: Send + 'static, O: Send + 'static> Transformer<I, O> {
    /// Wrap a leaf transformer
    pub fn new<X: Transform<Input = I, Output = O>>(stage: X) -> Self {
        Self {
            node: Node::Leaf {
                id: ConduitId::next(),
                stage: Arc::new(stage),
            },
        }
    }

    /// Chain another transformer after this one (`self >> next`)
    pub fn then<P: Send + 'static>(self, next: Transformer<O, P>) -> Transformer<I, P> {
        Transformer {
            node: Node::Chain(Arc::new(TransformerChain::new(self, next))),
        }
    }

    /// Group this transformer concurrently with another (`self & other`),
    /// using the nominal type lattice
    pub fn with_branch(self, other: Self) -> Result<Self>
    where
        I: Clone + Sync,
    {
        self.with_branch_in(other, &TypeHierarchy::default())
    }

    /// Group this transformer concurrently with another.
    ///
    /// The group accepts the common descendant of both input types and
    /// emits the common ancestor of both product types. Fails if the input
    /// types have no common descendant in `lattice`.
    pub fn with_branch_in(self, other: Self, lattice: &dyn TypeLattice) -> Result<Self>
    where
        I: Clone + Sync,
    {
        let input_type = rules::narrow(lattice, &self, &other)?;
        let product_type = rules::widen(lattice, &self, &other);
        let group = TransformerGroup::new(
            vec![Branch::Stage(self), Branch::Stage(other)],
            input_type,
            product_type,
        );
        Ok(group.into_transformer())
    }

    /// Serial producers which, run concurrently, produce all transformed
    /// products of `source`: one per path through `source` and this
    /// transformer
    pub fn concurrent_producers(&self, source: &Producer<I>) -> Vec<Producer<O>> {
        match &self.node {
            Node::Chain(node) | Node::Group(node) if !node.is_serial() => {
                node.concurrent_producers(source)
            }
            _ => source
                .concurrent_producers()
                .into_iter()
                .map(|path| path.then(self.clone()))
                .collect(),
        }
    }

    /// The last stage of a serial transformer
    pub fn final_conduit(&self) -> Option<ConduitRef> {
        match &self.node {
            Node::Leaf { id, stage } => Some(leaf_ref(*id, stage.as_ref())),
            Node::Chain(node) | Node::Group(node) => node.final_conduit(),
        }
    }

    /// The ordered stages of a serial transformer, upstream first
    pub fn chained_conduits(&self) -> Option<Vec<ConduitRef>> {
        match &self.node {
            Node::Leaf { id, stage } => Some(vec![leaf_ref(*id, stage.as_ref())]),
            Node::Chain(node) | Node::Group(node) => node.chained_conduits(),
        }
    }

    fn input_tag(&self) -> TypeTag {
        match &self.node {
            Node::Leaf { stage, .. } => stage.input_type(),
            Node::Chain(node) | Node::Group(node) => {
                node.input_type().unwrap_or_else(TypeTag::any)
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Transformer<T, T> {
    /// Group this transformer with a [`Passthrough`] (`self & Passthrough`),
    /// using the nominal type lattice
    pub fn with_passthrough(self) -> Result<Self> {
        self.with_passthrough_in(&TypeHierarchy::default())
    }

    /// Group this transformer with a [`Passthrough`].
    ///
    /// Fails unless this transformer's input type is a subtype of its
    /// product type in `lattice`.
    pub fn with_passthrough_in(self, lattice: &dyn TypeLattice) -> Result<Self> {
        rules::validate_passthrough(&self, lattice)?;
        let input_type = self.input_tag();
        let product_type = self.product_type();
        let group = TransformerGroup::new(
            vec![Branch::Stage(self), Branch::passthrough()],
            input_type,
            product_type,
        );
        Ok(group.into_transformer())
    }
}

fn leaf_ref<I: Send + 'static, O: Send + 'static>(
    id: ConduitId,
    stage: &dyn Transform<Input = I, Output = O>,
) -> ConduitRef {
    ConduitRef::new(
        id,
        stage.name(),
        ConduitKind::Transformer,
        Some(stage.input_type()),
        stage.product_type(),
    )
}

impl<I: Send + 'static, O: Send + 'static> Conduit for Transformer<I, O> {
    fn is_chained(&self) -> bool {
        match &self.node {
            Node::Leaf { .. } => false,
            Node::Chain(node) | Node::Group(node) => node.is_chained(),
        }
    }

    fn is_serial(&self) -> bool {
        match &self.node {
            Node::Leaf { .. } => true,
            Node::Chain(node) | Node::Group(node) => node.is_serial(),
        }
    }

    fn has_passthrough(&self) -> bool {
        match &self.node {
            Node::Leaf { .. } => false,
            Node::Chain(node) | Node::Group(node) => node.has_passthrough(),
        }
    }

    fn input_type(&self) -> Option<TypeTag> {
        Some(self.input_tag())
    }

    fn product_type(&self) -> TypeTag {
        match &self.node {
            Node::Leaf { stage, .. } => stage.product_type(),
            Node::Chain(node) | Node::Group(node) => node.product_type(),
        }
    }

    fn final_conduits(&self) -> Vec<ConduitRef> {
        match &self.node {
            Node::Leaf { id, stage } => vec![leaf_ref(*id, stage.as_ref())],
            Node::Chain(node) | Node::Group(node) => node.final_conduits(),
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
            Node::Chain(node) | Node::Group(node) => node.connections(ingoing),
        }
    }

    fn isolated_conduits(&self) -> Vec<ConduitRef> {
        match &self.node {
            Node::Leaf { id, stage } => vec![leaf_ref(*id, stage.as_ref())],
            Node::Chain(node) | Node::Group(node) => node.isolated_conduits(),
        }
    }

    fn to_expression(&self) -> Expression {
        match &self.node {
            Node::Leaf { stage, .. } => Expression::atom(stage.name()),
            Node::Chain(node) | Node::Group(node) => node.to_expression(),
        }
    }
}

impl<I: Send + 'static, O: Send + 'static> Processor<I, O> for Transformer<I, O> {
    /// Flattens the per-item expansions of every upstream item, preserving
    /// upstream order.
    fn process(&self, input: Products<I>) -> Products<O> {
        match &self.node {
            Node::Leaf { stage, .. } => {
                let stage = Arc::clone(stage);
                let outcomes = input.map(move |item| stage.transform(item?));
                Box::new(outcomes.flat_map(expand))
            }
            Node::Chain(node) | Node::Group(node) => node.process(input),
        }
    }

    fn aprocess(&self, input: ProductStream<I>) -> ProductStream<O> {
        match &self.node {
            Node::Leaf { stage, .. } => {
                let stage = Arc::clone(stage);
                input
                    .then(move |item| {
                        let stage = Arc::clone(&stage);
                        async move {
                            match item {
                                Ok(item) => stage.atransform(item).await,
                                Err(e) => Err(e),
                            }
                        }
                    })
                    .flat_map(|outcome| futures::stream::iter(expand(outcome)))
                    .boxed()
            }
            Node::Chain(node) | Node::Group(node) => node.aprocess(input),
        }
    }
}

impl<I, O> Clone for Transformer<I, O> {
    fn clone(&self) -> Self {
        let node = match &self.node {
            Node::Leaf { id, stage } => Node::Leaf {
                id: *id,
                stage: Arc::clone(stage),
            },
            Node::Chain(node) => Node::Chain(Arc::clone(node)),
            Node::Group(node) => Node::Group(Arc::clone(node)),
        };
        Self { node }
    }
}

impl<I: Send + 'static, O: Send + 'static> fmt::Debug for Transformer<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transformer")
            .field(&format_args!("{}", self.to_expression()))
            .finish()
    }
}

/// Marker for a branch that forwards a group's input unchanged.
///
/// A passthrough is not a conduit of its own: it only exists inside a
/// concurrent group, and only alongside a transformer whose input type is a
/// subtype of its product type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Passthrough;

impl Passthrough {
    /// `Passthrough & transformer`, using the nominal type lattice
    pub fn with_branch<T>(self, transformer: Transformer<T, T>) -> Result<Transformer<T, T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.with_branch_in(transformer, &TypeHierarchy::default())
    }

    /// `Passthrough & transformer`; the passthrough is enumerated first
    pub fn with_branch_in<T>(
        self,
        transformer: Transformer<T, T>,
        lattice: &dyn TypeLattice,
    ) -> Result<Transformer<T, T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        rules::validate_passthrough(&transformer, lattice)?;
        let input_type = transformer.input_tag();
        let product_type = transformer.product_type();
        let group = TransformerGroup::new(
            vec![Branch::passthrough(), Branch::Stage(transformer)],
            input_type,
            product_type,
        );
        Ok(group.into_transformer())
    }
}
