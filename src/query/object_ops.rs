use rustc_hash::FxHashSet;
use tracing::trace;

use crate::config::ObjectAttrs;
use crate::session::Session;
use crate::types::{NodeId, PropValue, Result};

impl Session {
    /// Returns every attribute of a node as strings.
    ///
    /// With [`ObjectAttrs::Indexed`] the result has exactly `property_total`
    /// entries in index order, absent attributes reading as empty strings.
    /// With [`ObjectAttrs::PropertyKeys`] it holds every property the vertex
    /// carries, in backend key order.
    pub fn obj_get(&self, id: NodeId) -> Result<Vec<String>> {
        trace!(%id, "query.obj_get");
        let txn = self.txn()?;
        let node = self.vertex_for(txn, id)?;
        let schema = &self.config().schema;
        match schema.object_attrs {
            ObjectAttrs::Indexed => (0..schema.property_total)
                .map(|idx| -> Result<String> {
                    let value = txn.vertex_property(node, &schema.attr_key(idx))?;
                    Ok(value.map(|v| v.to_string()).unwrap_or_default())
                })
                .collect(),
            ObjectAttrs::PropertyKeys => {
                let keys = txn.vertex_property_keys(node)?;
                let mut values = Vec::with_capacity(keys.len());
                for key in keys {
                    if let Some(value) = txn.vertex_property(node, &key)? {
                        values.push(value.to_string());
                    }
                }
                Ok(values)
            }
        }
    }

    /// Destinations of every outgoing edge, in backend enumeration order.
    pub fn neighbors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        trace!(%id, "query.neighbors");
        let txn = self.txn()?;
        let node = self.vertex_for(txn, id)?;
        txn.out_edges(node, None)?
            .into_iter()
            .map(|edge| {
                let other = txn.edge_other_vertex(edge, node)?;
                self.node_of(txn, other)
            })
            .collect()
    }

    /// Destinations of outgoing edges whose attribute `attr_idx` equals `value`.
    pub fn neighbors_by_attribute(
        &self,
        id: NodeId,
        attr_idx: u32,
        value: &str,
    ) -> Result<Vec<NodeId>> {
        trace!(%id, attr_idx, value, "query.neighbors_by_attribute");
        let txn = self.txn()?;
        let node = self.vertex_for(txn, id)?;
        let key = self.config().schema.attr_key(attr_idx);
        let mut result = Vec::new();
        for edge in txn.out_edges(node, None)? {
            let other = txn.edge_other_vertex(edge, node)?;
            if let Some(PropValue::Str(found)) = txn.vertex_property(other, &key)? {
                if found == value {
                    result.push(self.node_of(txn, other)?);
                }
            }
        }
        Ok(result)
    }

    /// Nodes whose attribute `attr_idx` equals `value`, via the attribute index.
    pub fn find_nodes_by_attribute(&self, attr_idx: u32, value: &str) -> Result<FxHashSet<NodeId>> {
        trace!(attr_idx, value, "query.find_nodes_by_attribute");
        let txn = self.txn()?;
        let key = self.config().schema.attr_key(attr_idx);
        txn.lookup_by_attribute(&key, value)?
            .into_iter()
            .map(|vertex| self.node_of(txn, vertex))
            .collect()
    }

    /// Nodes matching both attribute predicates.
    pub fn find_nodes_by_attributes(
        &self,
        (attr_idx1, value1): (u32, &str),
        (attr_idx2, value2): (u32, &str),
    ) -> Result<FxHashSet<NodeId>> {
        let mut first = self.find_nodes_by_attribute(attr_idx1, value1)?;
        if first.is_empty() {
            return Ok(first);
        }
        let second = self.find_nodes_by_attribute(attr_idx2, value2)?;
        first.retain(|id| second.contains(id));
        Ok(first)
    }
}
