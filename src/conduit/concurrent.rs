//! Rules shared by concurrent groups of producers or transformers.
//!
//! A group is not itself a chain: its graph is the union of its members'
//! graphs, enumerated in the order the members were added.

use tracing::warn;

use crate::conduit::{Conduit, ConduitRef, Connection, Expression};
use crate::core::error::{Error, Result};
use crate::core::types::{TypeLattice, TypeTag};

/// One branch of a concurrent group.
#[derive(Clone, Copy)]
pub(crate) enum Member<'a> {
    Conduit(&'a dyn Conduit),
    Passthrough,
}

pub(crate) fn final_conduits(members: &[Member<'_>]) -> Vec<ConduitRef> {
    members
        .iter()
        .flat_map(|member| match member {
            Member::Conduit(conduit) => conduit.final_conduits(),
            Member::Passthrough => Vec::new(),
        })
        .collect()
}

pub(crate) fn connections(members: &[Member<'_>], ingoing: &[ConduitRef]) -> Vec<Connection> {
    members
        .iter()
        .flat_map(|member| match member {
            Member::Conduit(conduit) => conduit.connections(ingoing),
            Member::Passthrough => Vec::new(),
        })
        .collect()
}

pub(crate) fn isolated_conduits(members: &[Member<'_>]) -> Vec<ConduitRef> {
    members
        .iter()
        .flat_map(|member| match member {
            Member::Conduit(conduit) => conduit.isolated_conduits(),
            Member::Passthrough => Vec::new(),
        })
        .collect()
}

pub(crate) fn has_passthrough(members: &[Member<'_>]) -> bool {
    members.iter().any(|member| match member {
        Member::Conduit(conduit) => conduit.has_passthrough(),
        Member::Passthrough => true,
    })
}

pub(crate) fn to_expression(members: &[Member<'_>]) -> Expression {
    members
        .iter()
        .map(|member| match member {
            Member::Conduit(conduit) => conduit.to_expression(),
            Member::Passthrough => Expression::atom("passthrough"),
        })
        .reduce(Expression::and)
        .unwrap_or_else(|| Expression::Group(Vec::new()))
}

/// Product type of a group: the common ancestor of its members' products.
pub(crate) fn widen(
    lattice: &dyn TypeLattice,
    left: &dyn Conduit,
    right: &dyn Conduit,
) -> TypeTag {
    let products = [left.product_type(), right.product_type()];
    lattice.common_ancestor(&products)
}

/// Input type of a group: the common descendant of its members' inputs.
pub(crate) fn narrow(
    lattice: &dyn TypeLattice,
    left: &dyn Conduit,
    right: &dyn Conduit,
) -> Result<TypeTag> {
    let tags: Vec<TypeTag> = [left.input_type(), right.input_type()]
        .into_iter()
        .flatten()
        .collect();
    lattice.common_descendant(&tags)
}

/// Check that `conduit` may run side by side with a passthrough: items
/// passed through unchanged must be valid products, so its input type has
/// to be a subtype of its product type.
pub(crate) fn validate_passthrough(
    conduit: &dyn Conduit,
    lattice: &dyn TypeLattice,
) -> Result<()> {
    let product = conduit.product_type();
    let input = conduit.input_type().unwrap_or_else(|| product.clone());
    if lattice.is_subtype(&input, &product) {
        return Ok(());
    }

    let conduit = conduit.to_expression().to_string();
    warn!(%conduit, %input, %product, "rejected concurrent passthrough");
    Err(Error::PassthroughType {
        conduit,
        input,
        product,
    })
}
