#![forbid(unsafe_code)]

//! Backend adapter contract consumed by sessions and queries.
//!
//! The query layer never talks to storage directly. It sees a [`Backend`]
//! that can start read-only transactions and resolve edge labels, and a
//! [`ReadTxn`] that enumerates vertices, edges and properties inside one
//! consistent snapshot. Handles returned by a transaction are only valid
//! while that transaction is alive.

pub mod memory;
mod metrics;

pub use metrics::{default_metrics, BackendMetrics, CounterMetrics, MetricsSnapshot, NoopMetrics};

use crate::types::{EdgeHandle, LabelHandle, PropValue, Result, VertexHandle, VertexId};

/// Iterator over handles produced by a full scan.
pub type HandleIter<'a, T> = Box<dyn Iterator<Item = Result<T>> + 'a>;

/// A connected graph backend.
pub trait Backend: Send + Sync {
    /// Starts a read-only transaction pinned to the latest committed version.
    fn begin_read(&self) -> Result<Box<dyn ReadTxn>>;

    /// Resolves an edge label by name, returning `None` when it is not defined.
    fn resolve_edge_label(&self, name: &str) -> Result<Option<LabelHandle>>;

    /// Releases the backend. Later transactions fail.
    fn shutdown(&self) -> Result<()>;
}

/// A read-only transaction over one snapshot of the backend.
pub trait ReadTxn: Send {
    /// Version of the snapshot this transaction observes.
    fn version(&self) -> u64;

    /// Looks up a vertex by its backend id.
    fn vertex(&self, id: VertexId) -> Result<Option<VertexHandle>>;

    /// Returns the backend id of a vertex handle.
    fn vertex_id(&self, vertex: VertexHandle) -> Result<VertexId>;

    /// Reads one vertex property.
    fn vertex_property(&self, vertex: VertexHandle, key: &str) -> Result<Option<PropValue>>;

    /// Lists the property keys carried by a vertex, in backend order.
    fn vertex_property_keys(&self, vertex: VertexHandle) -> Result<Vec<String>>;

    /// Enumerates outgoing edges, optionally restricted to one label.
    fn out_edges(
        &self,
        vertex: VertexHandle,
        label: Option<LabelHandle>,
    ) -> Result<Vec<EdgeHandle>>;

    /// Returns the endpoint of `edge` that is not `from`.
    fn edge_other_vertex(&self, edge: EdgeHandle, from: VertexHandle) -> Result<VertexHandle>;

    /// Returns the `(source, destination)` endpoints of an edge.
    fn edge_endpoints(&self, edge: EdgeHandle) -> Result<(VertexHandle, VertexHandle)>;

    /// Returns the label of an edge.
    fn edge_label(&self, edge: EdgeHandle) -> Result<LabelHandle>;

    /// Reads one edge property.
    fn edge_property(&self, edge: EdgeHandle, key: &str) -> Result<Option<PropValue>>;

    /// Lists the property keys carried by an edge, in backend order.
    fn edge_property_keys(&self, edge: EdgeHandle) -> Result<Vec<String>>;

    /// Exact-match lookup through the attribute index.
    fn lookup_by_attribute(&self, key: &str, value: &str) -> Result<Vec<VertexHandle>>;

    /// Scans every vertex visible in the snapshot.
    fn scan_vertices(&self) -> HandleIter<'_, VertexHandle>;

    /// Scans every edge visible in the snapshot.
    fn scan_edges(&self) -> HandleIter<'_, EdgeHandle>;

    /// Commits the transaction. Read-only commits only release resources.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Drops the transaction without committing.
    fn discard(self: Box<Self>);
}
