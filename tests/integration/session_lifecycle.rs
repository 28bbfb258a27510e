#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use tao_assoc::backend::memory::MemBackend;
use tao_assoc::backend::{Backend, CounterMetrics};
use tao_assoc::types::{PropValue, VertexId};
use tao_assoc::{
    warmup, AssocType, Connection, ErrorKind, NodeId, Result, TaoConfig, WarmupOptions,
};

fn stamped(ts: i64) -> Vec<(String, PropValue)> {
    vec![("timestamp".to_string(), PropValue::Int(ts))]
}

/// Zero-offset graph with node 0 linked to node 1 at t=10.
fn seeded(metrics: Arc<CounterMetrics>) -> Result<Arc<MemBackend>> {
    let backend = Arc::new(MemBackend::with_metrics(metrics));
    let mut w = backend.writer()?;
    let label = w.define_label("0");
    w.add_vertex(VertexId(0), Vec::new())?;
    w.add_vertex(VertexId(1), Vec::new())?;
    w.add_vertex(VertexId(2), Vec::new())?;
    w.add_edge(VertexId(0), VertexId(1), label, stamped(10))?;
    w.commit()?;
    Ok(backend)
}

fn config() -> TaoConfig {
    TaoConfig::default().zero_indexed(false)
}

#[test]
fn renewal_makes_later_commits_visible() -> Result<()> {
    let backend = seeded(CounterMetrics::shared())?;
    let conn = Connection::with_backend(backend.clone(), config())?;
    let mut session = conn.session()?;
    let before = session.snapshot_version()?;
    assert_eq!(session.assoc_count(NodeId(0), AssocType(0))?, 1);

    let mut w = backend.writer()?;
    let label = w.define_label("0");
    w.add_edge(VertexId(0), VertexId(2), label, stamped(20))?;
    w.commit()?;

    // The pinned snapshot does not see the new association.
    assert_eq!(session.assoc_count(NodeId(0), AssocType(0))?, 1);

    session.renew()?;
    assert_eq!(session.renewals(), 1);
    assert!(session.snapshot_version()? > before);
    assert_eq!(
        session.neighbors_by_type(NodeId(0), AssocType(0))?,
        vec![NodeId(2), NodeId(1)]
    );
    session.close()
}

#[test]
fn results_survive_renewal() -> Result<()> {
    let backend = seeded(CounterMetrics::shared())?;
    let conn = Connection::with_backend(backend, config())?;
    let mut session = conn.session()?;
    let assocs = session.assoc_range(NodeId(0), AssocType(0), 0, 10)?;
    session.renew()?;
    session.renew()?;
    assert_eq!(assocs.len(), 1);
    assert_eq!(assocs[0].dst, NodeId(1));
    assert_eq!(assocs[0].timestamp, 10);
    session.close()
}

#[test]
fn concurrent_sessions_share_one_backend() -> Result<()> {
    let backend = seeded(CounterMetrics::shared())?;
    let connects = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connects);
    let conn = Connection::new(
        move |_: &TaoConfig| -> Result<Arc<dyn Backend>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(backend.clone() as Arc<dyn Backend>)
        },
        config(),
    )?;

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| -> Result<u64> {
                    let session = conn.session()?;
                    let count = session.assoc_count(NodeId(0), AssocType(0))?;
                    session.close()?;
                    Ok(count)
                })
            })
            .collect();
        for handle in handles {
            let count = handle.join().expect("session thread panicked");
            assert_eq!(count.ok(), Some(1));
        }
    });

    assert_eq!(connects.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn dropped_sessions_release_their_snapshot() -> Result<()> {
    let metrics = CounterMetrics::shared();
    let backend = seeded(metrics.clone())?;
    let conn = Connection::with_backend(backend, config())?;
    {
        let session = conn.session()?;
        assert_eq!(metrics.snapshot().open_reads(), 1);
        drop(session);
    }
    let snap = metrics.snapshot();
    assert_eq!(snap.open_reads(), 0);
    assert_eq!(snap.reads_discarded, 1);

    conn.session()?.close()?;
    assert_eq!(metrics.snapshot().reads_committed, 1);
    Ok(())
}

#[test]
fn shutdown_fails_later_sessions_and_renewals() -> Result<()> {
    let backend = seeded(CounterMetrics::shared())?;
    let conn = Connection::with_backend(backend, config())?;
    let mut session = conn.session()?;
    conn.shutdown()?;

    let err = session.renew().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    let err = session.assoc_count(NodeId(0), AssocType(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(conn.session().is_err());
    Ok(())
}

#[test]
fn warmup_renews_and_counts_the_graph() -> Result<()> {
    let metrics = CounterMetrics::shared();
    let backend = seeded(metrics.clone())?;
    let conn = Connection::with_backend(backend, config())?;
    let mut session = conn.session()?;
    let report = warmup(&mut session, WarmupOptions::default())?;
    assert_eq!(report.nodes, 3);
    assert_eq!(report.edges, 1);
    assert_eq!(session.renewals(), 3);
    session.close()?;
    assert_eq!(metrics.snapshot().open_reads(), 0);
    Ok(())
}
