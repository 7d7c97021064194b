// Tests for link graph construction

use linkrank_core::graph::{EdgeKind, GraphEdge, LinkGraph, NodeKind};
use linkrank_scanner::result::PageRecord;
use std::collections::HashSet;

fn record(url: &str, internal: &[&str], external: &[&str]) -> PageRecord {
    let mut record = PageRecord::new(url.to_string());
    record.internal_links = internal.iter().map(|s| s.to_string()).collect();
    record.external_links = external.iter().map(|s| s.to_string()).collect();
    record
}

fn edge_set(graph: &LinkGraph) -> HashSet<GraphEdge> {
    graph.edges().collect()
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_single_page_graph() {
    let graph = LinkGraph::from_records(&[record("https://a.test/", &[], &[])]);

    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.kind_of("https://a.test/"), Some(NodeKind::Page));
}

#[test]
fn test_internal_fan_out_graph() {
    let records = vec![
        record("https://a.test/", &["https://a.test/b", "https://a.test/c"], &[]),
        record("https://a.test/b", &[], &[]),
        record("https://a.test/c", &[], &[]),
    ];
    let graph = LinkGraph::from_records(&records);

    assert_eq!(graph.node_count(), 3);
    assert!(graph.nodes().all(|n| n.kind == NodeKind::Page));
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(
        graph.edge_kind("https://a.test/", "https://a.test/b"),
        Some(EdgeKind::Internal)
    );
    assert_eq!(
        graph.edge_kind("https://a.test/", "https://a.test/c"),
        Some(EdgeKind::Internal)
    );
}

#[test]
fn test_external_target_graph() {
    let records = vec![record("https://a.test/", &[], &["https://x.test/"])];
    let graph = LinkGraph::from_records(&records);

    assert_eq!(graph.kind_of("https://x.test/"), Some(NodeKind::External));
    assert_eq!(
        graph.edge_kind("https://a.test/", "https://x.test/"),
        Some(EdgeKind::External)
    );
    assert_eq!(graph.out_degree("https://x.test/"), 0);
}

#[test]
fn test_uncrawled_internal_target_is_page() {
    // Budget ran out before /later was visited
    let records = vec![record("https://a.test/", &["https://a.test/later"], &[])];
    let graph = LinkGraph::from_records(&records);

    assert_eq!(graph.kind_of("https://a.test/later"), Some(NodeKind::Page));
}

// ============================================================================
// Property Tests
// ============================================================================

#[test]
fn test_rebuild_yields_identical_graph() {
    let records = vec![
        record(
            "https://a.test/",
            &["https://a.test/b", "https://a.test/c"],
            &["https://x.test/", "https://y.test/"],
        ),
        record("https://a.test/b", &["https://a.test/", "https://a.test/c"], &["https://x.test/"]),
        record("https://a.test/c", &["https://a.test/c"], &[]),
    ];

    let first = LinkGraph::from_records(&records);
    let second = LinkGraph::from_records(&records);

    let first_nodes: Vec<_> = first.nodes().cloned().collect();
    let second_nodes: Vec<_> = second.nodes().cloned().collect();
    assert_eq!(first_nodes, second_nodes);
    assert_eq!(edge_set(&first), edge_set(&second));
    assert_eq!(first.stats(), second.stats());
}

#[test]
fn test_no_duplicate_nodes() {
    let records = vec![
        record("https://a.test/", &["https://a.test/b"], &["https://x.test/"]),
        record("https://a.test/b", &["https://a.test/"], &["https://x.test/"]),
    ];
    let graph = LinkGraph::from_records(&records);

    let urls: HashSet<&str> = graph.nodes().map(|n| n.url.as_str()).collect();
    assert_eq!(urls.len(), graph.node_count());
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.in_degree("https://x.test/"), 2);
}

#[test]
fn test_stats_split_edges_by_kind() {
    let records = vec![
        record("https://a.test/", &["https://a.test/b"], &["https://x.test/", "https://y.test/"]),
        record("https://a.test/b", &["https://a.test/"], &[]),
    ];
    let stats = LinkGraph::from_records(&records).stats();

    assert_eq!(stats.total_nodes, 4);
    assert_eq!(stats.total_edges, 4);
    assert_eq!(stats.internal_edges, 2);
    assert_eq!(stats.external_edges, 2);
    assert_eq!(stats.internal_edges + stats.external_edges, stats.total_edges);
}
