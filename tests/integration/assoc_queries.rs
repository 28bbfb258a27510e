//! End-to-end association and object queries against the in-memory backend.
//!
//! The fixture mirrors a small social graph: node 1 follows nodes 2, 3 and 4
//! (association type 0) at timestamps 100, 300 and 200, and likes node 5
//! (association type 1). Application ids are zero-indexed, so every backend
//! vertex id is shifted by one.

#![allow(missing_docs)]

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tao_assoc::backend::memory::MemBackend;
use tao_assoc::types::{PropValue, VertexId};
use tao_assoc::{AssocType, Connection, ErrorKind, NodeId, Result, TaoConfig, TaoError};

const FOLLOWS: AssocType = AssocType(0);
const LIKES: AssocType = AssocType(1);

fn props(pairs: &[(&str, &str)]) -> Vec<(String, PropValue)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), PropValue::from(*v)))
        .collect()
}

fn stamped(ts: i64) -> Vec<(String, PropValue)> {
    vec![("timestamp".to_string(), PropValue::Int(ts))]
}

fn vertex(id: u64) -> VertexId {
    VertexId(id + 1)
}

fn social_graph() -> Result<Connection> {
    let backend = Arc::new(MemBackend::new());
    let mut w = backend.writer()?;
    let follows = w.define_label("0");
    let likes = w.define_label("1");
    w.add_vertex(vertex(1), props(&[("attr0", "ada"), ("attr1", "london")]))?;
    w.add_vertex(vertex(2), props(&[("attr0", "grace"), ("attr1", "nyc")]))?;
    w.add_vertex(vertex(3), props(&[("attr0", "alan"), ("attr1", "london")]))?;
    w.add_vertex(vertex(4), props(&[("attr0", "edsger"), ("attr1", "london")]))?;
    w.add_vertex(vertex(5), props(&[("attr0", "post")]))?;
    w.add_edge(vertex(1), vertex(2), follows, stamped(100))?;
    w.add_edge(vertex(1), vertex(3), follows, stamped(300))?;
    w.add_edge(vertex(1), vertex(4), follows, stamped(200))?;
    w.add_edge(vertex(1), vertex(5), likes, stamped(250))?;
    w.commit()?;
    Connection::with_backend(backend, TaoConfig::default().property_total(2))
}

fn dsts(assocs: &[tao_assoc::Assoc]) -> Vec<u64> {
    assocs.iter().map(|a| a.dst.0).collect()
}

#[test]
fn typed_neighbors_are_most_recent_first() -> Result<()> {
    let conn = social_graph()?;
    let session = conn.session()?;
    assert_eq!(
        session.neighbors_by_type(NodeId(1), FOLLOWS)?,
        vec![NodeId(3), NodeId(4), NodeId(2)]
    );
    assert_eq!(session.neighbors_by_type(NodeId(1), LIKES)?, vec![NodeId(5)]);
    assert!(session.neighbors_by_type(NodeId(2), FOLLOWS)?.is_empty());
    session.close()
}

#[test]
fn range_count_and_time_range() -> Result<()> {
    let conn = social_graph()?;
    let session = conn.session()?;

    assert_eq!(dsts(&session.assoc_range(NodeId(1), FOLLOWS, 1, 2)?), vec![4, 2]);
    assert!(session.assoc_range(NodeId(1), FOLLOWS, 3, 5)?.is_empty());
    assert_eq!(session.assoc_count(NodeId(1), FOLLOWS)?, 3);
    assert_eq!(session.assoc_count(NodeId(1), LIKES)?, 1);
    assert_eq!(
        dsts(&session.assoc_time_range(NodeId(1), FOLLOWS, 150, 250, 10)?),
        vec![4]
    );
    assert!(session
        .assoc_time_range(NodeId(1), FOLLOWS, 250, 150, 10)?
        .is_empty());

    let wanted: FxHashSet<NodeId> = [NodeId(2), NodeId(4)].into_iter().collect();
    assert_eq!(
        dsts(&session.assoc_get(NodeId(1), FOLLOWS, &wanted, 0, 1000)?),
        vec![4, 2]
    );
    session.close()
}

#[test]
fn object_reads_and_attribute_lookups() -> Result<()> {
    let conn = social_graph()?;
    let session = conn.session()?;

    assert_eq!(session.obj_get(NodeId(1))?, vec!["ada", "london"]);
    assert_eq!(session.obj_get(NodeId(5))?, vec!["post", ""]);
    assert_eq!(
        session.neighbors(NodeId(1))?,
        vec![NodeId(2), NodeId(3), NodeId(4), NodeId(5)]
    );
    assert_eq!(
        session.neighbors_by_attribute(NodeId(1), 1, "london")?,
        vec![NodeId(3), NodeId(4)]
    );

    let londoners = session.find_nodes_by_attribute(1, "london")?;
    let expected: FxHashSet<NodeId> = [NodeId(1), NodeId(3), NodeId(4)].into_iter().collect();
    assert_eq!(londoners, expected);
    let alan = session.find_nodes_by_attributes((1, "london"), (0, "alan"))?;
    assert_eq!(alan, [NodeId(3)].into_iter().collect::<FxHashSet<_>>());
    assert!(session.find_nodes_by_attribute(1, "paris")?.is_empty());
    session.close()
}

#[test]
fn unknown_node_and_atype_are_reported() -> Result<()> {
    let conn = social_graph()?;
    let session = conn.session()?;

    let err = session.obj_get(NodeId(42)).unwrap_err();
    assert!(matches!(err, TaoError::NotFound(NodeId(42))));
    assert_eq!(
        session.assoc_range(NodeId(42), FOLLOWS, 0, 1).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let err = session.assoc_count(NodeId(1), AssocType(2)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(conn.type_table()?.len(), 2);
    session.close()
}
