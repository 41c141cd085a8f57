//! Rules shared by every sequential composition of a source and a processor.
//!
//! Producer chains and transformer chains differ in how they execute, but
//! they expose their graph in the same way: the source comes first, and the
//! processor consumes the source's final conduits.

use tracing::debug;

use crate::conduit::{Conduit, ConduitRef, Connection, Expression};

/// Final conduits of `source >> processor`.
///
/// If the processor passes raw items through, the source's finals remain
/// terminal outputs and are yielded first.
pub(crate) fn final_conduits(source: &dyn Conduit, processor: &dyn Conduit) -> Vec<ConduitRef> {
    let mut finals = Vec::new();
    if processor.has_passthrough() {
        finals.extend(source.final_conduits());
    }
    finals.extend(processor.final_conduits());
    finals
}

/// Connections of `source >> processor` given the conduits feeding it.
pub(crate) fn connections(
    source: &dyn Conduit,
    processor: &dyn Conduit,
    ingoing: &[ConduitRef],
) -> Vec<Connection> {
    let mut connections = source.connections(ingoing);

    let mut feeding = source.final_conduits();
    // edges that bypass the source feed the processor directly
    if source.has_passthrough() {
        feeding.extend_from_slice(ingoing);
    }

    connections.extend(processor.connections(&feeding));
    connections
}

/// A chain passes raw items through only if both halves do.
pub(crate) fn has_passthrough(source: &dyn Conduit, processor: &dyn Conduit) -> bool {
    source.has_passthrough() && processor.has_passthrough()
}

pub(crate) fn is_serial(source: &dyn Conduit, processor: &dyn Conduit) -> bool {
    source.is_serial() && processor.is_serial()
}

pub(crate) fn to_expression(source: &dyn Conduit, processor: &dyn Conduit) -> Expression {
    source.to_expression().then(processor.to_expression())
}

/// Ordered stage list of a serial chain: the source's stages followed by
/// the processor's.
pub(crate) fn chained_conduits(
    source_stages: Option<Vec<ConduitRef>>,
    processor_stages: Option<Vec<ConduitRef>>,
) -> Option<Vec<ConduitRef>> {
    let mut stages = source_stages?;
    stages.extend(processor_stages?);
    Some(stages)
}

pub(crate) fn log_chained(source: &dyn Conduit, processor: &dyn Conduit) {
    debug!(
        source = %source.to_expression(),
        processor = %processor.to_expression(),
        product_type = %processor.product_type(),
        "chained conduits"
    );
}
