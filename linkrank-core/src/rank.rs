// PageRank and HITS over a LinkGraph

use crate::graph::LinkGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    #[error("Invalid ranking configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    pub damping: f64,
    /// L1 change between iterations below which a run has converged
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

impl RankConfig {
    pub fn validate(&self) -> Result<(), RankError> {
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(RankError::InvalidConfig(format!(
                "damping must be within [0, 1], got {}",
                self.damping
            )));
        }
        if !(self.tolerance > 0.0) {
            return Err(RankError::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(RankError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRankResult {
    pub scores: HashMap<String, f64>,
    pub iterations: usize,
    /// False when the iteration cap or a cancellation ended the run first
    pub converged: bool,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitsResult {
    pub hubs: HashMap<String, f64>,
    pub authorities: HashMap<String, f64>,
    pub iterations: usize,
    pub converged: bool,
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub pagerank: PageRankResult,
    pub hits: HitsResult,
}

/// Adjacency lists over dense node indices.
struct Adjacency {
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
}

impl Adjacency {
    fn of(graph: &LinkGraph) -> Self {
        let inner = graph.inner();
        let n = inner.node_count();
        let mut incoming = vec![Vec::new(); n];
        let mut outgoing = vec![Vec::new(); n];

        for edge in inner.edge_references() {
            let (from, to) = (edge.source().index(), edge.target().index());
            outgoing[from].push(to);
            incoming[to].push(from);
        }

        Self { incoming, outgoing }
    }

    fn len(&self) -> usize {
        self.outgoing.len()
    }
}

pub struct Ranker {
    config: RankConfig,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl Ranker {
    pub fn new(config: RankConfig) -> Result<Self, RankError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel_flag: None,
        })
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Run PageRank and HITS side by side.
    pub fn rank(&self, graph: &LinkGraph) -> RankOutcome {
        let adjacency = Adjacency::of(graph);

        thread::scope(|scope| {
            let pagerank = scope.spawn(|| self.pagerank_with(graph, &adjacency));
            let hits = self.hits_with(graph, &adjacency);
            let pagerank = pagerank
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            RankOutcome { pagerank, hits }
        })
    }

    pub fn pagerank(&self, graph: &LinkGraph) -> PageRankResult {
        self.pagerank_with(graph, &Adjacency::of(graph))
    }

    pub fn hits(&self, graph: &LinkGraph) -> HitsResult {
        self.hits_with(graph, &Adjacency::of(graph))
    }

    fn pagerank_with(&self, graph: &LinkGraph, adjacency: &Adjacency) -> PageRankResult {
        let n = adjacency.len();
        if n == 0 {
            return PageRankResult {
                scores: HashMap::new(),
                iterations: 0,
                converged: true,
                cancelled: false,
            };
        }

        let d = self.config.damping;
        let nf = n as f64;
        let out_degree: Vec<usize> = adjacency.outgoing.iter().map(Vec::len).collect();

        let mut scores = vec![1.0 / nf; n];
        let mut iterations = 0;
        let mut converged = false;
        let mut cancelled = false;

        while iterations < self.config.max_iterations {
            if self.is_cancelled() {
                debug!("PageRank cancelled after {} iterations", iterations);
                cancelled = true;
                break;
            }
            iterations += 1;

            // Dangling nodes spread their mass evenly over every node
            let dangling_mass: f64 = (0..n)
                .filter(|&u| out_degree[u] == 0)
                .map(|u| scores[u])
                .sum();
            let floor = (1.0 - d) / nf + d * dangling_mass / nf;

            let next: Vec<f64> = adjacency
                .incoming
                .iter()
                .map(|sources| {
                    let inbound: f64 = sources
                        .iter()
                        .map(|&u| scores[u] / out_degree[u] as f64)
                        .sum();
                    floor + d * inbound
                })
                .collect();

            let delta = l1_distance(&next, &scores);
            scores = next;
            debug!("PageRank iteration {}: delta {:.3e}", iterations, delta);

            if delta < self.config.tolerance {
                converged = true;
                break;
            }
        }

        if !converged && !cancelled {
            warn!(
                "PageRank did not converge within {} iterations",
                iterations
            );
        }

        PageRankResult {
            scores: by_url(graph, scores),
            iterations,
            converged,
            cancelled,
        }
    }

    fn hits_with(&self, graph: &LinkGraph, adjacency: &Adjacency) -> HitsResult {
        let n = adjacency.len();
        // Start from the all-ones vector scaled to unit length
        let mut hubs = vec![1.0; n];
        l2_normalize(&mut hubs);
        let mut authorities = hubs.clone();
        let mut iterations = 0;
        let mut converged = n == 0;
        let mut cancelled = false;

        while !converged && iterations < self.config.max_iterations {
            if self.is_cancelled() {
                debug!("HITS cancelled after {} iterations", iterations);
                cancelled = true;
                break;
            }
            iterations += 1;

            let mut next_authorities: Vec<f64> = adjacency
                .incoming
                .iter()
                .map(|sources| sources.iter().map(|&u| hubs[u]).sum())
                .collect();
            // Hubs read the authorities computed in this same iteration
            let mut next_hubs: Vec<f64> = adjacency
                .outgoing
                .iter()
                .map(|targets| targets.iter().map(|&w| next_authorities[w]).sum())
                .collect();

            l2_normalize(&mut next_authorities);
            l2_normalize(&mut next_hubs);

            let authority_delta = l1_distance(&next_authorities, &authorities);
            let hub_delta = l1_distance(&next_hubs, &hubs);
            authorities = next_authorities;
            hubs = next_hubs;
            debug!(
                "HITS iteration {}: authority delta {:.3e}, hub delta {:.3e}",
                iterations, authority_delta, hub_delta
            );

            converged =
                authority_delta < self.config.tolerance && hub_delta < self.config.tolerance;
        }

        if !converged && !cancelled {
            warn!("HITS did not converge within {} iterations", iterations);
        }

        HitsResult {
            hubs: by_url(graph, hubs),
            authorities: by_url(graph, authorities),
            iterations,
            converged,
            cancelled,
        }
    }
}

pub fn pagerank(graph: &LinkGraph, config: RankConfig) -> Result<PageRankResult, RankError> {
    Ok(Ranker::new(config)?.pagerank(graph))
}

pub fn hits(graph: &LinkGraph, config: RankConfig) -> Result<HitsResult, RankError> {
    Ok(Ranker::new(config)?.hits(graph))
}

pub fn rank_graph(graph: &LinkGraph, config: RankConfig) -> Result<RankOutcome, RankError> {
    Ok(Ranker::new(config)?.rank(graph))
}

fn by_url(graph: &LinkGraph, values: Vec<f64>) -> HashMap<String, f64> {
    graph
        .nodes()
        .map(|node| node.url.clone())
        .zip(values)
        .collect()
}

fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// A zero vector is left untouched.
fn l2_normalize(values: &mut [f64]) {
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        values.iter_mut().for_each(|v| *v /= norm);
    }
}
