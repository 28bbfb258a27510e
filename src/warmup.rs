#![forbid(unsafe_code)]

//! Full-graph warmup scan.
//!
//! Touches every vertex and then every edge so the backend pulls the whole
//! graph into working memory. The session snapshot is renewed before the
//! vertex pass, between the passes, and after the edge pass so no single
//! transaction accumulates both working sets.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::WarmupConfig;
use crate::session::Session;
use crate::types::{Result, TaoError};

/// Which pass a progress report belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WarmupPhase {
    /// Vertex pass.
    Nodes,
    /// Edge pass.
    Edges,
}

impl fmt::Display for WarmupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarmupPhase::Nodes => write!(f, "nodes"),
            WarmupPhase::Edges => write!(f, "edges"),
        }
    }
}

/// Progress callback invoked every `progress_interval` units.
pub type ProgressFn<'a> = Box<dyn FnMut(WarmupPhase, u64) + 'a>;

/// Warmup settings.
pub struct WarmupOptions<'a> {
    /// Units between progress reports; must be positive.
    pub progress_interval: u64,
    /// Optional observer for progress reports.
    pub on_progress: Option<ProgressFn<'a>>,
}

impl Default for WarmupOptions<'_> {
    fn default() -> Self {
        Self::from_config(&WarmupConfig::default())
    }
}

impl<'a> WarmupOptions<'a> {
    /// Options matching a [`WarmupConfig`].
    pub fn from_config(config: &WarmupConfig) -> Self {
        Self {
            progress_interval: config.progress_interval,
            on_progress: None,
        }
    }

    /// Installs a progress observer.
    pub fn on_progress(mut self, f: impl FnMut(WarmupPhase, u64) + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    fn tick(&mut self, phase: WarmupPhase, count: u64) {
        if count % self.progress_interval != 0 {
            return;
        }
        info!("processed {count} {phase}");
        if let Some(f) = self.on_progress.as_mut() {
            f(phase, count);
        }
    }
}

/// Totals gathered by a warmup run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct WarmupReport {
    /// Vertices visited.
    pub nodes: u64,
    /// Edges visited in the edge pass.
    pub edges: u64,
    /// Vertex properties read.
    pub node_properties: u64,
    /// Edge properties read.
    pub edge_properties: u64,
    /// Wall-clock duration of both passes.
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Scans every vertex and edge visible to `session`, renewing its snapshot
/// around each pass.
///
/// Options are taken by value because the progress observer is `FnMut`.
/// A zero `progress_interval` is a configuration error, as it is in
/// [`WarmupConfig`].
pub fn warmup(session: &mut Session, mut options: WarmupOptions<'_>) -> Result<WarmupReport> {
    if options.progress_interval == 0 {
        return Err(TaoError::config("warmup progress_interval must be positive"));
    }
    let start = Instant::now();
    let mut report = WarmupReport::default();

    session.renew()?;
    {
        let txn = session.txn()?;
        for vertex in txn.scan_vertices() {
            let vertex = vertex?;
            txn.vertex_id(vertex)?;
            for key in txn.vertex_property_keys(vertex)? {
                txn.vertex_property(vertex, &key)?;
                report.node_properties += 1;
            }
            for edge in txn.out_edges(vertex, None)? {
                txn.edge_other_vertex(edge, vertex)?;
            }
            report.nodes += 1;
            options.tick(WarmupPhase::Nodes, report.nodes);
        }
    }
    debug!(nodes = report.nodes, "warmup.nodes_done");

    session.renew()?;
    {
        let txn = session.txn()?;
        for edge in txn.scan_edges() {
            let edge = edge?;
            txn.edge_label(edge)?;
            txn.edge_endpoints(edge)?;
            for key in txn.edge_property_keys(edge)? {
                txn.edge_property(edge, &key)?;
                report.edge_properties += 1;
            }
            report.edges += 1;
            options.tick(WarmupPhase::Edges, report.edges);
        }
    }
    debug!(edges = report.edges, "warmup.edges_done");

    session.renew()?;
    report.elapsed = start.elapsed();
    info!(
        nodes = report.nodes,
        edges = report.edges,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "warmup complete"
    );
    Ok(report)
}
