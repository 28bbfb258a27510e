#![allow(missing_docs)]

use std::sync::Arc;

use proptest::prelude::*;
use rustc_hash::FxHashSet;
use tao_assoc::backend::memory::MemBackend;
use tao_assoc::types::{PropValue, VertexId};
use tao_assoc::{Assoc, AssocType, Connection, NodeId, TaoConfig};

const DESTS: u64 = 12;
const ATYPE: AssocType = AssocType(0);

/// Node 0 carries one association per `(dst, timestamp)` entry, in order.
/// Every node `1..=DESTS` has two attributes drawn from `attrs`.
fn build(edges: &[(u64, i64)], attrs: &[(u8, u8)]) -> Connection {
    let backend = Arc::new(MemBackend::new());
    let mut w = backend.writer().expect("writer");
    let label = w.define_label("0");
    w.add_vertex(VertexId(0), Vec::new()).expect("source");
    for id in 1..=DESTS {
        let (a, b) = attrs[(id as usize - 1) % attrs.len()];
        w.add_vertex(
            VertexId(id),
            vec![
                ("attr0".to_string(), PropValue::from(format!("a{a}"))),
                ("attr1".to_string(), PropValue::from(format!("b{b}"))),
            ],
        )
        .expect("vertex");
    }
    for (dst, ts) in edges {
        w.add_edge(
            VertexId(0),
            VertexId(*dst),
            label,
            vec![("timestamp".to_string(), PropValue::Int(*ts))],
        )
        .expect("edge");
    }
    w.commit().expect("commit");
    Connection::with_backend(backend, TaoConfig::default().zero_indexed(false)).expect("connect")
}

/// Stable descending sort of the inserted edges: the reference ordering.
fn model(edges: &[(u64, i64)]) -> Vec<(u64, i64)> {
    let mut sorted = edges.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

fn pairs(assocs: &[Assoc]) -> Vec<(u64, i64)> {
    assocs.iter().map(|a| (a.dst.0, a.timestamp)).collect()
}

fn arb_edges() -> impl Strategy<Value = Vec<(u64, i64)>> {
    // Narrow timestamp range so ties are common.
    prop::collection::vec((1..=DESTS, 0i64..20), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn full_range_is_stably_sorted_recent_first(edges in arb_edges()) {
        let conn = build(&edges, &[(0, 0)]);
        let session = conn.session().expect("session");
        let all = session.assoc_range(NodeId(0), ATYPE, 0, usize::MAX).expect("range");
        prop_assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        prop_assert_eq!(pairs(&all), model(&edges));
        prop_assert_eq!(
            session.assoc_count(NodeId(0), ATYPE).expect("count"),
            edges.len() as u64
        );
        let typed = session.neighbors_by_type(NodeId(0), ATYPE).expect("typed");
        prop_assert_eq!(typed, all.iter().map(|a| a.dst).collect::<Vec<_>>());
    }

    #[test]
    fn window_is_a_slice_of_the_full_range(
        edges in arb_edges(),
        offset in -3i64..45,
        length in 0usize..20,
    ) {
        let conn = build(&edges, &[(0, 0)]);
        let session = conn.session().expect("session");
        let full = model(&edges);
        let window = session.assoc_range(NodeId(0), ATYPE, offset, length).expect("range");
        if offset < 0 || offset as usize >= full.len() {
            prop_assert!(window.is_empty());
        } else {
            let start = offset as usize;
            let end = (start + length).min(full.len());
            prop_assert_eq!(pairs(&window), full[start..end].to_vec());
        }
    }

    #[test]
    fn time_range_is_a_filtered_prefix(
        edges in arb_edges(),
        low in -2i64..22,
        high in -2i64..22,
        limit in 0usize..50,
    ) {
        let conn = build(&edges, &[(0, 0)]);
        let session = conn.session().expect("session");
        let hits = session
            .assoc_time_range(NodeId(0), ATYPE, low, high, limit)
            .expect("time range");
        if low > high {
            prop_assert!(hits.is_empty());
        }
        let expected: Vec<(u64, i64)> = model(&edges)
            .into_iter()
            .filter(|(_, ts)| low <= *ts && *ts <= high)
            .take(limit)
            .collect();
        prop_assert_eq!(pairs(&hits), expected);
    }

    #[test]
    fn assoc_get_filters_destinations_and_interval(
        edges in arb_edges(),
        wanted in prop::collection::vec(1..=DESTS, 0..6),
        low in 0i64..20,
        high in 0i64..20,
    ) {
        let conn = build(&edges, &[(0, 0)]);
        let session = conn.session().expect("session");
        let wanted: FxHashSet<NodeId> = wanted.into_iter().map(NodeId).collect();
        let got = session
            .assoc_get(NodeId(0), ATYPE, &wanted, low, high)
            .expect("assoc get");
        let expected: Vec<(u64, i64)> = model(&edges)
            .into_iter()
            .filter(|(dst, ts)| wanted.contains(&NodeId(*dst)) && low <= *ts && *ts <= high)
            .collect();
        prop_assert_eq!(pairs(&got), expected);
    }

    #[test]
    fn two_predicate_lookup_is_an_intersection(
        attrs in prop::collection::vec((0u8..3, 0u8..3), 1..8),
        a in 0u8..3,
        b in 0u8..3,
    ) {
        let conn = build(&[], &attrs);
        let session = conn.session().expect("session");
        let (va, vb) = (format!("a{a}"), format!("b{b}"));
        let first = session.find_nodes_by_attribute(0, &va).expect("first");
        let second = session.find_nodes_by_attribute(1, &vb).expect("second");
        let both = session
            .find_nodes_by_attributes((0, va.as_str()), (1, vb.as_str()))
            .expect("both");
        let expected: FxHashSet<NodeId> = first.intersection(&second).copied().collect();
        prop_assert_eq!(both, expected);
    }
}
