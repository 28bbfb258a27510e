#![forbid(unsafe_code)]

//! Object and association queries.
//!
//! Every query is a method on [`Session`](crate::Session) and runs against the
//! session's current snapshot. Results are copied out of the backend before
//! the call returns.
//!
//! Association listings share one ordering policy: descending timestamp, with
//! equal timestamps kept in the order the backend enumerated the edges. The
//! timestamp is the association's own property unless the schema asks
//! `neighbors_by_type` to sort by the destination node instead.

mod assoc_ops;
mod object_ops;
mod order;

use serde::Serialize;

use crate::backend::ReadTxn;
use crate::session::Session;
use crate::types::{AssocType, EdgeHandle, NodeId, PropValue, Result, TaoError, VertexHandle};

/// A directed, typed, timestamped association copied out of the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Assoc {
    /// Source node.
    pub src: NodeId,
    /// Association type.
    pub atype: AssocType,
    /// Destination node.
    pub dst: NodeId,
    /// Association timestamp.
    pub timestamp: i64,
}

impl Session {
    /// Resolves an application id to a vertex in the current snapshot.
    ///
    /// Ids that fall outside the backend id space cannot name a vertex and
    /// are reported as not found.
    fn vertex_for(&self, txn: &dyn ReadTxn, id: NodeId) -> Result<VertexHandle> {
        let Ok(vertex) = self.ids().to_vertex(id) else {
            return Err(TaoError::NotFound(id));
        };
        txn.vertex(vertex)?.ok_or(TaoError::NotFound(id))
    }

    fn node_of(&self, txn: &dyn ReadTxn, vertex: VertexHandle) -> Result<NodeId> {
        self.ids().to_node(txn.vertex_id(vertex)?)
    }

    fn edge_timestamp(&self, txn: &dyn ReadTxn, edge: EdgeHandle) -> Result<i64> {
        let key = &self.config().schema.timestamp_key;
        let value = txn.edge_property(edge, key)?;
        timestamp_value(value.as_ref())
            .ok_or_else(|| TaoError::backend(format!("edge {} has no integer {key}", edge.0)))
    }

    fn vertex_timestamp(&self, txn: &dyn ReadTxn, vertex: VertexHandle) -> Result<i64> {
        let key = &self.config().schema.timestamp_key;
        let value = txn.vertex_property(vertex, key)?;
        timestamp_value(value.as_ref())
            .ok_or_else(|| TaoError::backend(format!("vertex {} has no integer {key}", vertex.0)))
    }

    /// Resolves `atype` and then `id`, returning the source vertex and its
    /// outgoing `atype` edges in backend enumeration order.
    fn typed_out_edges(
        &self,
        txn: &dyn ReadTxn,
        id: NodeId,
        atype: AssocType,
    ) -> Result<(VertexHandle, Vec<EdgeHandle>)> {
        let label = self.type_table().resolve(atype)?;
        let node = self.vertex_for(txn, id)?;
        let edges = txn.out_edges(node, Some(label))?;
        Ok((node, edges))
    }

    /// Copies `edges` out as associations, keeping their order.
    fn typed_assocs(
        &self,
        txn: &dyn ReadTxn,
        id: NodeId,
        atype: AssocType,
        (node, edges): (VertexHandle, Vec<EdgeHandle>),
    ) -> Result<Vec<Assoc>> {
        let mut assocs = Vec::with_capacity(edges.len());
        for edge in edges {
            let dst = txn.edge_other_vertex(edge, node)?;
            assocs.push(Assoc {
                src: id,
                atype,
                dst: self.node_of(txn, dst)?,
                timestamp: self.edge_timestamp(txn, edge)?,
            });
        }
        Ok(assocs)
    }
}

/// Integer timestamps are taken as-is; string attributes must parse as `i64`.
fn timestamp_value(value: Option<&PropValue>) -> Option<i64> {
    match value? {
        PropValue::Int(v) => Some(*v),
        PropValue::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}
