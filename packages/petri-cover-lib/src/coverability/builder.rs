use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::{CoverabilityConfig, PruningPolicy},
    coverability::{CoverabilityNode, CoverabilityTree, NodeIndex, NodeKind},
    error::PetriError,
    firing::FiringEngine,
    net::{
        PetriNet,
        entity::{PlaceId, TransitionId},
        marking::{Marking, TokenCount},
    },
};

/// The different ways building a coverability tree can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplorationError {
    /// We ran out of time.
    #[error("Coverability tree construction timed out")]
    Timeout,
    /// The tree grew beyond the configured number of nodes.
    #[error("Coverability tree exceeded {limit} nodes")]
    MaxNodesReached { limit: u64 },
    #[error(transparent)]
    Net(#[from] PetriError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverabilityStatistics {
    pub node_count: u64,
    pub duplicate_count: u64,
    pub dead_count: u64,
    pub max_depth: u64,
    pub time: std::time::Duration,
}

impl CoverabilityStatistics {
    fn from_nodes(nodes: &[CoverabilityNode], time: std::time::Duration) -> Self {
        let mut statistics = CoverabilityStatistics {
            node_count: nodes.len() as u64,
            time,
            ..Default::default()
        };

        for node in nodes {
            match node.kind {
                NodeKind::Duplicate { .. } => statistics.duplicate_count += 1,
                NodeKind::Dead => statistics.dead_count += 1,
                NodeKind::Interior => {}
            }
            statistics.max_depth = statistics.max_depth.max(node.depth as u64);
        }

        statistics
    }
}

/// Applies the omega acceleration to the successor marking `marking`.
///
/// For every marking on the path from the root to the parent (root first)
/// that `marking` strictly covers, every place where `marking` is larger is
/// set to omega. This is repeated until nothing changes, since a new omega can
/// make `marking` cover an ancestor it did not cover before.
pub fn accelerate<'a, I>(mut marking: Marking, path: I) -> Marking
where
    I: IntoIterator<Item = &'a Marking>,
    I::IntoIter: Clone,
{
    let path = path.into_iter();

    loop {
        let mut changed = false;

        for ancestor in path.clone() {
            if !marking.strictly_covers(ancestor) {
                continue;
            }

            for place in PlaceId::iter_places(marking.dimension()) {
                let tokens = marking.get(place);
                if !tokens.is_infinite() && tokens > ancestor.get(place) {
                    marking.set(place, TokenCount::Infinite);
                    changed = true;
                }
            }
        }

        if !changed {
            return marking;
        }
    }
}

/// One entry of the exploration stack: a node that is being expanded and the
/// next transition to try on it.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeIndex,
    next_transition: usize,
}

/// Builds Karp-Miller coverability trees for a net.
///
/// Exploration is depth first with an explicit stack instead of recursion.
/// The stack always holds exactly the path from the root to the node that is
/// currently expanded, so it doubles as the ancestor list for acceleration and
/// for [PruningPolicy::AncestorOnly].
#[derive(Debug)]
pub struct CoverabilityTreeBuilder<'n> {
    engine: FiringEngine<'n>,
    config: CoverabilityConfig,
    build_start_time: Option<std::time::Instant>,
}

impl<'n> CoverabilityTreeBuilder<'n> {
    pub fn new(net: &'n PetriNet, config: CoverabilityConfig) -> Self {
        CoverabilityTreeBuilder {
            engine: net.engine(),
            config,
            build_start_time: None,
        }
    }

    pub fn build(&mut self, initial_marking: &Marking) -> Result<CoverabilityTree, ExplorationError> {
        let net = self.engine.net();
        net.check_dimension(initial_marking)?;

        self.build_start_time = Some(std::time::Instant::now());
        self.print_start_banner(initial_marking);

        let nodes = self.explore(initial_marking)?;
        let statistics =
            CoverabilityStatistics::from_nodes(&nodes, self.get_build_time().unwrap_or_default());

        let tree = CoverabilityTree::new(
            net.place_names().map(str::to_string).collect(),
            net.transition_names().map(str::to_string).collect(),
            *self.config.get_pruning(),
            nodes,
            statistics,
        );
        self.print_end_banner(&tree);

        Ok(tree)
    }

    fn explore(&self, initial_marking: &Marking) -> Result<Vec<CoverabilityNode>, ExplorationError> {
        let transition_count = self.engine.net().transition_count();
        let pruning = *self.config.get_pruning();

        let root = NodeIndex::new(0);
        let mut nodes = vec![CoverabilityNode::root(initial_marking.clone())];
        let mut seen = HashMap::new();
        if pruning == PruningPolicy::GlobalSeen {
            seen.insert(initial_marking.clone(), root);
        }

        let mut stack = vec![Frame {
            node: root,
            next_transition: 0,
        }];

        while let Some(&Frame {
            node,
            next_transition,
        }) = stack.last()
        {
            if next_transition == transition_count {
                stack.pop();
                if nodes[node.to_usize()].children.is_empty() {
                    nodes[node.to_usize()].kind = NodeKind::Dead;
                }
                continue;
            }

            let top = stack.len() - 1;
            stack[top].next_transition += 1;

            self.max_time_reached()?;

            let transition = TransitionId::new(next_transition as u32);
            let successor = match self.engine.fire(&nodes[node.to_usize()].marking, transition) {
                Ok(m) => m,
                Err(e) if e.is_not_enabled() => {
                    tracing::trace!(node = %node, "{}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let marking = accelerate(
                successor,
                stack.iter().map(|f| &nodes[f.node.to_usize()].marking),
            );

            let duplicate_of = match pruning {
                PruningPolicy::AncestorOnly => stack
                    .iter()
                    .map(|f| f.node)
                    .find(|n| nodes[n.to_usize()].marking == marking),
                PruningPolicy::GlobalSeen => seen.get(&marking).copied(),
            };

            self.max_nodes_reached(nodes.len())?;

            let child = NodeIndex::new(nodes.len());
            tracing::debug!(
                node = %child,
                parent = %node,
                transition = %self.engine.net().transition_name(transition),
                marking = %marking,
                duplicate_of = ?duplicate_of,
                "New node"
            );

            if duplicate_of.is_none() {
                if pruning == PruningPolicy::GlobalSeen {
                    seen.insert(marking.clone(), child);
                }
                stack.push(Frame {
                    node: child,
                    next_transition: 0,
                });
            }

            let depth = nodes[node.to_usize()].depth + 1;
            nodes.push(CoverabilityNode::child(
                node,
                depth,
                transition,
                marking,
                duplicate_of,
            ));
            nodes[node.to_usize()].children.push(child);
        }

        Ok(nodes)
    }

    /// Checks if the node limit has been reached.
    /// If so, returns an `Err` value.
    fn max_nodes_reached(&self, node_count: usize) -> Result<(), ExplorationError> {
        if let Some(limit) = *self.config.get_max_nodes()
            && node_count as u64 >= limit
        {
            return Err(ExplorationError::MaxNodesReached { limit });
        }

        Ok(())
    }

    /// Checks if the time limit has been reached.
    /// If so, returns an `Err` value.
    fn max_time_reached(&self) -> Result<(), ExplorationError> {
        if let Some(t) = self.get_build_time()
            && let Some(max_time) = self.config.get_timeout()
            && &t > max_time
        {
            return Err(ExplorationError::Timeout);
        }

        Ok(())
    }

    fn get_build_time(&self) -> Option<std::time::Duration> {
        self.build_start_time.map(|x| x.elapsed())
    }

    fn print_start_banner(&self, initial_marking: &Marking) {
        let net = self.engine.net();
        tracing::info!(
            net = %net.name(),
            places = %net.place_count(),
            transitions = %net.transition_count(),
            initial = %initial_marking,
            pruning = ?self.config.get_pruning(),
            "Coverability Info"
        );
    }

    fn print_end_banner(&self, tree: &CoverabilityTree) {
        let statistics = tree.statistics();
        tracing::info!(
            nodes = %statistics.node_count,
            duplicates = %statistics.duplicate_count,
            dead = %statistics.dead_count,
            max_depth = %statistics.max_depth,
            bounded = %tree.is_bounded(),
            time = ?statistics.time,
            "Result"
        );
    }
}

#[test]
fn test_accelerate_strict_increase() {
    let root: Marking = vec![1, 0].into();
    let successor: Marking = vec![1, 1].into();

    let accelerated = accelerate(successor, [&root]);
    assert_eq!(
        accelerated,
        Marking::from(vec![TokenCount::Finite(1), TokenCount::Infinite])
    );
}

#[test]
fn test_accelerate_needs_covering() {
    // tokens moved from the first place to the second, nothing grew
    let root: Marking = vec![1, 0].into();
    let successor: Marking = vec![0, 1].into();

    assert_eq!(accelerate(successor.clone(), [&root]), successor);
}

#[test]
fn test_accelerate_equal_is_not_increase() {
    let root: Marking = vec![2, 3].into();
    assert_eq!(accelerate(root.clone(), [&root]), root);
}

#[test]
fn test_accelerate_reaches_fixpoint() {
    // (1 1 1) does not cover (0 2 0) until (0 0 1) has turned the second
    // place into omega.
    let a: Marking = vec![0, 2, 0].into();
    let b: Marking = vec![0, 0, 1].into();
    let successor: Marking = vec![1, 1, 1].into();

    let accelerated = accelerate(successor, [&a, &b]);
    assert_eq!(
        accelerated,
        Marking::from(vec![
            TokenCount::Infinite,
            TokenCount::Infinite,
            TokenCount::Infinite
        ])
    );
}
