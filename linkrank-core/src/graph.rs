// Directed link graph built from crawl records

use linkrank_scanner::result::PageRecord;
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Crawled, or the target of an internal link
    Page,
    /// Only ever seen as the target of an external link
    External,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Page => "page",
            NodeKind::External => "external",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Internal,
    External,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Internal => "internal",
            EdgeKind::External => "external",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub url: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub internal_edges: usize,
    pub external_edges: usize,
    pub page_nodes: usize,
    pub external_nodes: usize,
}

/// Hyperlink graph over every URL seen during a crawl.
///
/// Built once by [`LinkGraph::from_records`] and read-only afterwards. Node
/// indices are dense (`0..node_count`) in insertion order, which the ranking
/// algorithms rely on to keep scores in plain vectors.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    graph: DiGraph<GraphNode, EdgeKind>,
    index: HashMap<String, NodeIndex>,
}

impl LinkGraph {
    pub fn from_records(records: &[PageRecord]) -> Self {
        let mut builder = GraphBuilder::default();
        for record in records {
            builder.add_record(record);
        }
        builder.finish()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, url: &str) -> Option<&GraphNode> {
        self.index.get(url).map(|idx| &self.graph[*idx])
    }

    pub fn kind_of(&self, url: &str) -> Option<NodeKind> {
        self.node(url).map(|node| node.kind)
    }

    pub fn edge_kind(&self, from: &str, to: &str) -> Option<EdgeKind> {
        let from = *self.index.get(from)?;
        let to = *self.index.get(to)?;
        self.graph.find_edge(from, to).map(|e| self.graph[e])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = GraphEdge> + '_ {
        self.graph.edge_references().map(|e| GraphEdge {
            from: self.graph[e.source()].url.clone(),
            to: self.graph[e.target()].url.clone(),
            kind: *e.weight(),
        })
    }

    pub fn out_degree(&self, url: &str) -> usize {
        self.degree(url, Direction::Outgoing)
    }

    pub fn in_degree(&self, url: &str) -> usize {
        self.degree(url, Direction::Incoming)
    }

    fn degree(&self, url: &str, direction: Direction) -> usize {
        self.index
            .get(url)
            .map(|idx| self.graph.neighbors_directed(*idx, direction).count())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> GraphStats {
        let internal_edges = self
            .graph
            .edge_weights()
            .filter(|kind| **kind == EdgeKind::Internal)
            .count();
        let page_nodes = self
            .graph
            .node_weights()
            .filter(|node| node.kind == NodeKind::Page)
            .count();

        GraphStats {
            total_nodes: self.graph.node_count(),
            total_edges: self.graph.edge_count(),
            internal_edges,
            external_edges: self.graph.edge_count() - internal_edges,
            page_nodes,
            external_nodes: self.graph.node_count() - page_nodes,
        }
    }

    pub(crate) fn inner(&self) -> &DiGraph<GraphNode, EdgeKind> {
        &self.graph
    }
}

#[derive(Default)]
struct GraphBuilder {
    graph: DiGraph<GraphNode, EdgeKind>,
    index: HashMap<String, NodeIndex>,
}

impl GraphBuilder {
    fn add_record(&mut self, record: &PageRecord) {
        let source = self.ensure_page(&record.url);

        for link in &record.internal_links {
            let target = self.ensure_page(link);
            self.add_edge(source, target, EdgeKind::Internal);
        }

        for link in &record.external_links {
            let target = self.ensure_external(link);
            self.add_edge(source, target, EdgeKind::External);
        }
    }

    /// Insert as `Page`, promoting an existing `External` node.
    fn ensure_page(&mut self, url: &str) -> NodeIndex {
        let idx = self.ensure_node(url, NodeKind::Page);
        self.graph[idx].kind = NodeKind::Page;
        idx
    }

    /// Insert as `External` only if absent; never downgrades a `Page`.
    fn ensure_external(&mut self, url: &str) -> NodeIndex {
        self.ensure_node(url, NodeKind::External)
    }

    fn ensure_node(&mut self, url: &str, kind: NodeKind) -> NodeIndex {
        if let Some(idx) = self.index.get(url) {
            return *idx;
        }
        let idx = self.graph.add_node(GraphNode {
            url: url.to_string(),
            kind,
        });
        self.index.insert(url.to_string(), idx);
        idx
    }

    /// The first recorded kind of an edge wins.
    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) -> EdgeIndex {
        match self.graph.find_edge(from, to) {
            Some(existing) => existing,
            None => self.graph.add_edge(from, to, kind),
        }
    }

    fn finish(self) -> LinkGraph {
        LinkGraph {
            graph: self.graph,
            index: self.index,
        }
    }
}
