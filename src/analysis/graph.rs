//! Trigger chain discovery
//!
//! Builds a directed graph from qualifying trigger relations and enumerates
//! simple paths through it. Habits are mapped to dense integer indices and
//! the adjacency is kept as per-node edge lists.
//!
//! ```text
//! relations ──filter──▶ TriggerGraph ──DFS (bounded)──▶ paths ──▶ HabitChain[]
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::{chain_id, input_reference_time};
use crate::config::AnalysisConfig;
use crate::model::{Habit, HabitChain, HabitRelation, RelationType};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    target: usize,
    confidence: f64,
}

/// Fixed-width bitset over node indices
#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeSet {
    words: Vec<u64>,
}

impl NodeSet {
    fn with_capacity(n: usize) -> Self {
        Self {
            words: vec![0; n.div_ceil(64)],
        }
    }

    fn insert(&mut self, idx: usize) {
        self.words[idx / 64] |= 1u64 << (idx % 64);
    }

    fn remove(&mut self, idx: usize) {
        self.words[idx / 64] &= !(1u64 << (idx % 64));
    }

    fn contains(&self, idx: usize) -> bool {
        self.words[idx / 64] & (1u64 << (idx % 64)) != 0
    }

    fn is_subset(&self, other: &NodeSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(mine, theirs)| mine & !theirs == 0)
    }
}

/// Directed graph of trigger relations over a habit roster
#[derive(Debug, Clone)]
pub struct TriggerGraph<'a> {
    nodes: Vec<&'a Habit>,
    index: HashMap<&'a str, usize>,
    adjacency: Vec<Vec<Edge>>,
}

impl<'a> TriggerGraph<'a> {
    /// Build the graph from relations that qualify as trigger edges
    ///
    /// Relations naming habits outside the roster, and self-relations, are
    /// skipped. Repeated edges keep the highest confidence.
    pub fn build(habits: &'a [Habit], relations: &[HabitRelation], min_confidence: f64) -> Self {
        let mut nodes = Vec::with_capacity(habits.len());
        let mut index = HashMap::with_capacity(habits.len());
        for habit in habits {
            if !index.contains_key(habit.id.as_str()) {
                index.insert(habit.id.as_str(), nodes.len());
                nodes.push(habit);
            }
        }

        let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); nodes.len()];
        for relation in relations
            .iter()
            .filter(|r| r.qualifies(RelationType::Trigger, min_confidence))
        {
            let (Some(&from), Some(&to)) = (
                index.get(relation.source_habit_id.as_str()),
                index.get(relation.target_habit_id.as_str()),
            ) else {
                tracing::warn!(
                    source = %relation.source_habit_id,
                    target = %relation.target_habit_id,
                    "Skipping trigger relation with unknown habit"
                );
                continue;
            };
            if from == to {
                continue;
            }

            let edges = &mut adjacency[from];
            match edges.iter().position(|e| e.target == to) {
                Some(pos) => edges[pos].confidence = edges[pos].confidence.max(relation.confidence),
                None => edges.push(Edge {
                    target: to,
                    confidence: relation.confidence,
                }),
            }
        }

        Self {
            nodes,
            index,
            adjacency,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn node_index(&self, habit_id: &str) -> Option<usize> {
        self.index.get(habit_id).copied()
    }

    pub fn habit(&self, idx: usize) -> Option<&'a Habit> {
        self.nodes.get(idx).copied()
    }

    /// Successor indices of a node, in edge insertion order
    pub fn successors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency
            .get(idx)
            .into_iter()
            .flatten()
            .map(|edge| edge.target)
    }

    /// Confidence of the edge `from -> to`, if present
    pub fn edge_confidence(&self, from: usize, to: usize) -> Option<f64> {
        self.adjacency
            .get(from)?
            .iter()
            .find(|edge| edge.target == to)
            .map(|edge| edge.confidence)
    }

    /// Enumerate candidate chain paths
    ///
    /// Runs an explicit-stack DFS from every node not reached by an earlier
    /// search. A path is a sequence of distinct nodes no longer than
    /// `max_len`; once it has at least `min_len` nodes it is emitted, unless
    /// its node set is contained in the node set of an already emitted path.
    /// The search stops once `max_paths` paths have been emitted.
    pub fn chain_paths(&self, min_len: usize, max_len: usize, max_paths: usize) -> Vec<Vec<usize>> {
        let n = self.nodes.len();
        let mut visited = vec![false; n];
        let mut emitted: Vec<NodeSet> = Vec::new();
        let mut paths = Vec::new();

        if max_len == 0 || max_paths == 0 {
            return paths;
        }

        'search: for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;

            let mut path = vec![start];
            let mut cursors = vec![0usize];
            let mut on_path = NodeSet::with_capacity(n);
            on_path.insert(start);

            while let Some(&node) = path.last() {
                let depth = path.len() - 1;
                let next = self.adjacency[node].get(cursors[depth]).map(|e| e.target);

                let Some(next) = next else {
                    // Exhausted this node's edges, backtrack
                    on_path.remove(node);
                    path.pop();
                    cursors.pop();
                    continue;
                };
                cursors[depth] += 1;

                if on_path.contains(next) || path.len() >= max_len {
                    continue;
                }

                visited[next] = true;
                on_path.insert(next);
                path.push(next);
                cursors.push(0);

                if path.len() >= min_len && !emitted.iter().any(|used| on_path.is_subset(used)) {
                    emitted.push(on_path.clone());
                    paths.push(path.clone());

                    if paths.len() >= max_paths {
                        tracing::warn!(max_paths, "Trigger chain limit reached, stopping search");
                        break 'search;
                    }
                }
            }
        }

        paths
    }

    /// Turn a path of node indices into a chain
    ///
    /// First and last habits are mandatory. An interior habit is optional
    /// when both its incoming and outgoing edges are below
    /// `optional_threshold`.
    pub fn materialize(
        &self,
        path: &[usize],
        optional_threshold: f64,
        created_at: DateTime<Utc>,
    ) -> Option<HabitChain> {
        let first = self.habit(*path.first()?)?;
        let ids: Vec<&str> = path
            .iter()
            .map(|&idx| self.habit(idx).map(|h| h.id.as_str()))
            .collect::<Option<_>>()?;
        let names: Vec<&str> = path
            .iter()
            .filter_map(|&idx| self.habit(idx).map(|h| h.name.as_str()))
            .collect();

        let mut chain = HabitChain::new(format!("{} routine", first.name), first.frequency.clone())
            .id(chain_id(RelationType::Trigger, &ids))
            .description(format!("Trigger chain: {}", names.join(" → ")))
            .created_at(created_at);

        let last = path.len() - 1;
        for (pos, (&idx, id)) in path.iter().zip(&ids).enumerate() {
            let is_optional = pos != 0
                && pos != last
                && self
                    .edge_confidence(path[pos - 1], idx)
                    .is_some_and(|c| c < optional_threshold)
                && self
                    .edge_confidence(idx, path[pos + 1])
                    .is_some_and(|c| c < optional_threshold);
            chain = chain.with_habit(*id, is_optional);
        }

        Some(chain)
    }
}

/// Discover trigger chains with default thresholds
pub fn discover_trigger_chains(habits: &[Habit], relations: &[HabitRelation]) -> Vec<HabitChain> {
    discover_trigger_chains_with(
        habits,
        relations,
        &AnalysisConfig::default(),
        input_reference_time(habits, &[]),
    )
}

/// Discover trigger chains
pub fn discover_trigger_chains_with(
    habits: &[Habit],
    relations: &[HabitRelation],
    config: &AnalysisConfig,
    created_at: DateTime<Utc>,
) -> Vec<HabitChain> {
    let graph = TriggerGraph::build(habits, relations, config.chain_min_confidence);
    if graph.edge_count() == 0 {
        return Vec::new();
    }

    let chains: Vec<HabitChain> = graph
        .chain_paths(
            config.min_chain_length,
            config.max_chain_length,
            config.max_trigger_chains,
        )
        .iter()
        .filter_map(|path| graph.materialize(path, config.optional_edge_threshold, created_at))
        .collect();

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        chains = chains.len(),
        "Discovered trigger chains"
    );

    chains
}
