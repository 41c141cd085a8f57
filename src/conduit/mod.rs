//! Conduit capabilities and graph introspection.
//!
//! A conduit is any node of a pipeline's composition tree: a leaf stage, a
//! sequential chain of two conduits, or a concurrent group of branches. The
//! tree is immutable once built, so every query here is a pure walk over it
//! and can be repeated at will; edges are derived on demand rather than
//! stored.

pub mod chained;
pub mod concurrent;
pub mod expression;

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::core::traits::{ProductStream, Products};
use crate::core::types::TypeTag;

pub use expression::Expression;

/// A node in the pipeline composition tree.
pub trait Conduit: Send + Sync {
    /// `true` if this conduit is the sequential composition of two conduits
    fn is_chained(&self) -> bool;

    /// `true` if items flow through this conduit along a single path, with no
    /// concurrent group anywhere inside it
    fn is_serial(&self) -> bool;

    /// `true` if raw input items reach this conduit's output unchanged along
    /// at least one path
    fn has_passthrough(&self) -> bool {
        false
    }

    /// Semantic type of accepted items; `None` for producers
    fn input_type(&self) -> Option<TypeTag>;

    /// Semantic type of emitted items
    fn product_type(&self) -> TypeTag;

    /// The leaf conduits whose output leaves this conduit
    fn final_conduits(&self) -> Vec<ConduitRef>;

    /// All directed edges inside this conduit, plus the edges from each of
    /// the `ingoing` conduits into this conduit's entry points
    fn connections(&self, ingoing: &[ConduitRef]) -> Vec<Connection>;

    /// Leaf conduits that take part in no connection
    fn isolated_conduits(&self) -> Vec<ConduitRef>;

    /// Symbolic rendering of how this conduit was composed
    fn to_expression(&self) -> Expression;
}

/// A conduit that can emit items.
pub trait Source<T>: Conduit {
    /// Emit items synchronously; each pull blocks until an item is ready.
    fn produce(&self) -> Products<T>;

    /// Emit items asynchronously; each pull may suspend the calling task.
    fn aproduce(&self) -> ProductStream<T>;
}

/// A conduit that maps an upstream item sequence to a downstream one.
pub trait Processor<I, O>: Conduit {
    /// Process an upstream sequence synchronously.
    fn process(&self, input: Products<I>) -> Products<O>;

    /// Process an upstream sequence asynchronously.
    fn aprocess(&self, input: ProductStream<I>) -> ProductStream<O>;
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a leaf conduit, assigned when the leaf is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConduitId(u64);

impl ConduitId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConduitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The role a leaf conduit plays in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConduitKind {
    Producer,
    Transformer,
    Consumer,
}

/// Snapshot description of a leaf conduit.
///
/// Two references are equal iff they denote the same leaf, regardless of
/// the descriptive fields.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConduitRef {
    pub id: ConduitId,
    pub name: String,
    pub kind: ConduitKind,
    pub input_type: Option<TypeTag>,
    pub product_type: TypeTag,
}

impl ConduitRef {
    pub(crate) fn new(
        id: ConduitId,
        name: String,
        kind: ConduitKind,
        input_type: Option<TypeTag>,
        product_type: TypeTag,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            input_type,
            product_type,
        }
    }
}

impl PartialEq for ConduitRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConduitRef {}

impl Hash for ConduitRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ConduitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.id)
    }
}

/// A directed edge between two leaf conduits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connection {
    pub from: ConduitRef,
    pub to: ConduitRef,
}

impl Connection {
    pub fn new(from: ConduitRef, to: ConduitRef) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// The rendered graph of a conduit: every edge plus every lone leaf.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Topology {
    pub connections: Vec<Connection>,
    pub isolated: Vec<ConduitRef>,
}

impl Topology {
    /// Walk a conduit with no ingoing edges
    pub fn of(conduit: &dyn Conduit) -> Self {
        Self {
            connections: conduit.connections(&[]),
            isolated: conduit.isolated_conduits(),
        }
    }

    /// Every leaf in the graph, in order of first appearance
    pub fn nodes(&self) -> Vec<ConduitRef> {
        let mut seen = HashSet::new();
        self.connections
            .iter()
            .flat_map(|c| [&c.from, &c.to])
            .chain(self.isolated.iter())
            .filter(|node| seen.insert(node.id))
            .cloned()
            .collect()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for connection in &self.connections {
            writeln!(f, "{connection}")?;
        }
        for node in &self.isolated {
            writeln!(f, "{node}")?;
        }
        Ok(())
    }
}
