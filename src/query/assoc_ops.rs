use rustc_hash::FxHashSet;
use tracing::trace;

use super::order::{sort_recent_first, window, within};
use super::Assoc;
use crate::config::NeighborSortKey;
use crate::session::Session;
use crate::types::{AssocType, NodeId, Result};

impl Session {
    /// Destinations of outgoing `atype` associations, most recent first.
    ///
    /// The sort key is the association timestamp, or the destination node's
    /// timestamp attribute when the schema selects [`NeighborSortKey::Destination`].
    pub fn neighbors_by_type(&self, id: NodeId, atype: AssocType) -> Result<Vec<NodeId>> {
        trace!(%id, %atype, "query.neighbors_by_type");
        let txn = self.txn()?;
        let typed = self.typed_out_edges(txn, id, atype)?;
        let mut keyed = match self.config().schema.neighbor_sort {
            NeighborSortKey::Association => self
                .typed_assocs(txn, id, atype, typed)?
                .into_iter()
                .map(|assoc| (assoc.timestamp, assoc.dst))
                .collect::<Vec<_>>(),
            NeighborSortKey::Destination => {
                let (node, edges) = typed;
                let mut keyed = Vec::with_capacity(edges.len());
                for edge in edges {
                    let dst = txn.edge_other_vertex(edge, node)?;
                    keyed.push((self.vertex_timestamp(txn, dst)?, self.node_of(txn, dst)?));
                }
                keyed
            }
        };
        sort_recent_first(&mut keyed, |(timestamp, _)| *timestamp);
        Ok(keyed.into_iter().map(|(_, dst)| dst).collect())
    }

    /// Window `[offset, offset + length)` of the `atype` associations, most recent first.
    ///
    /// Returns an empty list when `offset` is negative or not below the
    /// association count.
    pub fn assoc_range(
        &self,
        id: NodeId,
        atype: AssocType,
        offset: i64,
        length: usize,
    ) -> Result<Vec<Assoc>> {
        trace!(%id, %atype, offset, length, "query.assoc_range");
        let txn = self.txn()?;
        let typed = self.typed_out_edges(txn, id, atype)?;
        let past_end = usize::try_from(offset).map_or(true, |start| start >= typed.1.len());
        if length == 0 || past_end {
            return Ok(Vec::new());
        }
        let mut assocs = self.typed_assocs(txn, id, atype, typed)?;
        sort_recent_first(&mut assocs, |assoc| assoc.timestamp);
        Ok(window(assocs, offset, length))
    }

    /// `atype` associations to any of `dst_ids` with timestamp in `[low, high]`,
    /// most recent first.
    pub fn assoc_get(
        &self,
        id: NodeId,
        atype: AssocType,
        dst_ids: &FxHashSet<NodeId>,
        low: i64,
        high: i64,
    ) -> Result<Vec<Assoc>> {
        trace!(%id, %atype, dsts = dst_ids.len(), low, high, "query.assoc_get");
        let txn = self.txn()?;
        let typed = self.typed_out_edges(txn, id, atype)?;
        if low > high || dst_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut assocs = self.typed_assocs(txn, id, atype, typed)?;
        assocs.retain(|assoc| dst_ids.contains(&assoc.dst));
        within(&mut assocs, low, high, |assoc| assoc.timestamp);
        sort_recent_first(&mut assocs, |assoc| assoc.timestamp);
        Ok(assocs)
    }

    /// Number of outgoing `atype` associations.
    pub fn assoc_count(&self, id: NodeId, atype: AssocType) -> Result<u64> {
        trace!(%id, %atype, "query.assoc_count");
        let (_, edges) = self.typed_out_edges(self.txn()?, id, atype)?;
        Ok(edges.len() as u64)
    }

    /// At most `limit` `atype` associations with timestamp in `[low, high]`,
    /// most recent first.
    pub fn assoc_time_range(
        &self,
        id: NodeId,
        atype: AssocType,
        low: i64,
        high: i64,
        limit: usize,
    ) -> Result<Vec<Assoc>> {
        trace!(%id, %atype, low, high, limit, "query.assoc_time_range");
        let txn = self.txn()?;
        let typed = self.typed_out_edges(txn, id, atype)?;
        if low > high || limit == 0 {
            return Ok(Vec::new());
        }
        let mut assocs = self.typed_assocs(txn, id, atype, typed)?;
        within(&mut assocs, low, high, |assoc| assoc.timestamp);
        sort_recent_first(&mut assocs, |assoc| assoc.timestamp);
        assocs.truncate(limit);
        Ok(assocs)
    }
}
