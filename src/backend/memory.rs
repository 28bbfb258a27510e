//! In-memory multi-version backend.
//!
//! Every committed write produces a new immutable [`GraphState`] behind an
//! [`Arc`]. A read transaction pins the state that was current when it began,
//! so it keeps observing the same version no matter how many writers commit
//! afterwards. Only a new transaction sees newer data.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::metrics::{default_metrics, BackendMetrics};
use super::{Backend, HandleIter, ReadTxn};
use crate::types::{
    EdgeHandle, EdgeId, LabelHandle, PropValue, Result, TaoError, VertexHandle, VertexId,
};

#[derive(Clone, Debug, Default)]
struct VertexRow {
    props: Vec<(String, PropValue)>,
    out: Vec<u64>,
}

#[derive(Clone, Debug)]
struct EdgeRow {
    label: u64,
    src: u64,
    dst: u64,
    props: Vec<(String, PropValue)>,
}

#[derive(Clone, Debug, Default)]
struct GraphState {
    version: u64,
    vertices: BTreeMap<u64, VertexRow>,
    edges: BTreeMap<u64, EdgeRow>,
    labels: Vec<String>,
    label_index: FxHashMap<String, u64>,
    attr_index: FxHashMap<String, FxHashMap<String, Vec<u64>>>,
    next_edge_id: u64,
}

impl GraphState {
    fn vertex_row(&self, vertex: VertexHandle) -> Result<&VertexRow> {
        self.vertices
            .get(&vertex.0)
            .ok_or_else(|| TaoError::backend(format!("stale vertex handle {}", vertex.0)))
    }

    fn edge_row(&self, edge: EdgeHandle) -> Result<&EdgeRow> {
        self.edges
            .get(&edge.0)
            .ok_or_else(|| TaoError::backend(format!("stale edge handle {}", edge.0)))
    }
}

/// Graph backend held entirely in memory.
pub struct MemBackend {
    current: RwLock<Arc<GraphState>>,
    write_lock: Mutex<()>,
    closed: AtomicBool,
    metrics: Arc<dyn BackendMetrics>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemBackend {
    /// Creates an empty backend at version 0.
    pub fn new() -> Self {
        Self::with_metrics(default_metrics())
    }

    /// Creates an empty backend that reports to `metrics`.
    pub fn with_metrics(metrics: Arc<dyn BackendMetrics>) -> Self {
        Self {
            current: RwLock::new(Arc::new(GraphState::default())),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            metrics,
        }
    }

    /// Latest committed version.
    pub fn version(&self) -> u64 {
        self.current.read().version
    }

    /// Starts a write batch. Writers are serialized; readers are never blocked.
    pub fn writer(&self) -> Result<MemWriter<'_>> {
        self.ensure_open()?;
        let guard = self.write_lock.lock();
        let state = GraphState::clone(&**self.current.read());
        Ok(MemWriter {
            backend: self,
            _guard: guard,
            state,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(TaoError::backend("backend is shut down"))
        } else {
            Ok(())
        }
    }
}

impl Backend for MemBackend {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn>> {
        self.ensure_open()?;
        let state = Arc::clone(&*self.current.read());
        trace!(version = state.version, "mem.begin_read");
        self.metrics.read_begun();
        Ok(Box::new(MemReadTxn {
            state,
            metrics: Arc::clone(&self.metrics),
            committed: false,
        }))
    }

    fn resolve_edge_label(&self, name: &str) -> Result<Option<LabelHandle>> {
        self.ensure_open()?;
        let state = self.current.read();
        let found = state.label_index.get(name).copied().map(LabelHandle);
        self.metrics.label_resolved(found.is_some());
        Ok(found)
    }

    fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(TaoError::backend("backend already shut down"));
        }
        debug!(version = self.version(), "mem.shutdown");
        Ok(())
    }
}

/// Serialized write batch against a [`MemBackend`].
///
/// Changes become visible to new read transactions only after [`MemWriter::commit`].
pub struct MemWriter<'a> {
    backend: &'a MemBackend,
    _guard: MutexGuard<'a, ()>,
    state: GraphState,
}

impl<'a> MemWriter<'a> {
    /// Defines an edge label, returning the existing handle if already defined.
    pub fn define_label(&mut self, name: &str) -> LabelHandle {
        if let Some(idx) = self.state.label_index.get(name) {
            return LabelHandle(*idx);
        }
        let idx = self.state.labels.len() as u64;
        self.state.labels.push(name.to_owned());
        self.state.label_index.insert(name.to_owned(), idx);
        LabelHandle(idx)
    }

    /// Inserts a vertex. String properties are added to the attribute index.
    pub fn add_vertex(&mut self, id: VertexId, props: Vec<(String, PropValue)>) -> Result<()> {
        if self.state.vertices.contains_key(&id.0) {
            return Err(TaoError::backend(format!("vertex {id} already exists")));
        }
        for (key, value) in &props {
            if let PropValue::Str(s) = value {
                self.state
                    .attr_index
                    .entry(key.clone())
                    .or_default()
                    .entry(s.clone())
                    .or_default()
                    .push(id.0);
            }
        }
        self.state.vertices.insert(
            id.0,
            VertexRow {
                props,
                out: Vec::new(),
            },
        );
        Ok(())
    }

    /// Inserts a directed edge between two existing vertices.
    pub fn add_edge(
        &mut self,
        src: VertexId,
        dst: VertexId,
        label: LabelHandle,
        props: Vec<(String, PropValue)>,
    ) -> Result<EdgeId> {
        if label.0 as usize >= self.state.labels.len() {
            return Err(TaoError::backend(format!("label {} is not defined", label.0)));
        }
        if !self.state.vertices.contains_key(&dst.0) {
            return Err(TaoError::backend(format!("edge target {dst} missing")));
        }
        let edge_id = self.state.next_edge_id;
        let row = self
            .state
            .vertices
            .get_mut(&src.0)
            .ok_or_else(|| TaoError::backend(format!("edge source {src} missing")))?;
        row.out.push(edge_id);
        self.state.edges.insert(
            edge_id,
            EdgeRow {
                label: label.0,
                src: src.0,
                dst: dst.0,
                props,
            },
        );
        self.state.next_edge_id += 1;
        Ok(EdgeId(edge_id))
    }

    /// Publishes the batch as a new version and returns that version.
    pub fn commit(mut self) -> Result<u64> {
        self.backend.ensure_open()?;
        let mut current = self.backend.current.write();
        self.state.version = current.version + 1;
        let version = self.state.version;
        debug!(
            version,
            vertices = self.state.vertices.len(),
            edges = self.state.edges.len(),
            "mem.commit"
        );
        *current = Arc::new(self.state);
        Ok(version)
    }
}

struct MemReadTxn {
    state: Arc<GraphState>,
    metrics: Arc<dyn BackendMetrics>,
    committed: bool,
}

impl ReadTxn for MemReadTxn {
    fn version(&self) -> u64 {
        self.state.version
    }

    fn vertex(&self, id: VertexId) -> Result<Option<VertexHandle>> {
        Ok(self
            .state
            .vertices
            .contains_key(&id.0)
            .then_some(VertexHandle(id.0)))
    }

    fn vertex_id(&self, vertex: VertexHandle) -> Result<VertexId> {
        self.state.vertex_row(vertex)?;
        Ok(VertexId(vertex.0))
    }

    fn vertex_property(&self, vertex: VertexHandle, key: &str) -> Result<Option<PropValue>> {
        let row = self.state.vertex_row(vertex)?;
        Ok(lookup_prop(&row.props, key))
    }

    fn vertex_property_keys(&self, vertex: VertexHandle) -> Result<Vec<String>> {
        let row = self.state.vertex_row(vertex)?;
        Ok(row.props.iter().map(|(key, _)| key.clone()).collect())
    }

    fn out_edges(
        &self,
        vertex: VertexHandle,
        label: Option<LabelHandle>,
    ) -> Result<Vec<EdgeHandle>> {
        let row = self.state.vertex_row(vertex)?;
        self.metrics.adjacency_scan(label.is_some());
        let mut out = Vec::with_capacity(row.out.len());
        for edge_id in &row.out {
            let edge = self.state.edge_row(EdgeHandle(*edge_id))?;
            if label.map_or(true, |l| l.0 == edge.label) {
                out.push(EdgeHandle(*edge_id));
            }
        }
        Ok(out)
    }

    fn edge_other_vertex(&self, edge: EdgeHandle, from: VertexHandle) -> Result<VertexHandle> {
        let row = self.state.edge_row(edge)?;
        if row.src == from.0 {
            Ok(VertexHandle(row.dst))
        } else if row.dst == from.0 {
            Ok(VertexHandle(row.src))
        } else {
            Err(TaoError::backend(format!(
                "vertex {} is not an endpoint of edge {}",
                from.0, edge.0
            )))
        }
    }

    fn edge_endpoints(&self, edge: EdgeHandle) -> Result<(VertexHandle, VertexHandle)> {
        let row = self.state.edge_row(edge)?;
        Ok((VertexHandle(row.src), VertexHandle(row.dst)))
    }

    fn edge_label(&self, edge: EdgeHandle) -> Result<LabelHandle> {
        Ok(LabelHandle(self.state.edge_row(edge)?.label))
    }

    fn edge_property(&self, edge: EdgeHandle, key: &str) -> Result<Option<PropValue>> {
        let row = self.state.edge_row(edge)?;
        Ok(lookup_prop(&row.props, key))
    }

    fn edge_property_keys(&self, edge: EdgeHandle) -> Result<Vec<String>> {
        let row = self.state.edge_row(edge)?;
        Ok(row.props.iter().map(|(key, _)| key.clone()).collect())
    }

    fn lookup_by_attribute(&self, key: &str, value: &str) -> Result<Vec<VertexHandle>> {
        self.metrics.index_lookup();
        Ok(self
            .state
            .attr_index
            .get(key)
            .and_then(|values| values.get(value))
            .map(|ids| ids.iter().map(|id| VertexHandle(*id)).collect())
            .unwrap_or_default())
    }

    fn scan_vertices(&self) -> HandleIter<'_, VertexHandle> {
        Box::new(self.state.vertices.keys().map(|id| Ok(VertexHandle(*id))))
    }

    fn scan_edges(&self) -> HandleIter<'_, EdgeHandle> {
        Box::new(self.state.edges.keys().map(|id| Ok(EdgeHandle(*id))))
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.committed = true;
        self.metrics.read_committed();
        Ok(())
    }

    fn discard(self: Box<Self>) {}
}

impl Drop for MemReadTxn {
    fn drop(&mut self) {
        if !self.committed {
            self.metrics.read_discarded();
        }
    }
}

fn lookup_prop(props: &[(String, PropValue)], key: &str) -> Option<PropValue> {
    props
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, value)| value.clone())
}
