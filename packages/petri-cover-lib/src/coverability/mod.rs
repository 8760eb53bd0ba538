use serde::{Deserialize, Serialize};

use crate::{
    config::PruningPolicy,
    coverability::builder::CoverabilityStatistics,
    error::{PetriError, PetriResult},
    net::{
        entity::{PlaceId, TransitionId},
        marking::{Marking, TokenCount},
    },
};

pub mod builder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex {
    index: u32,
}

impl NodeIndex {
    pub fn new(index: usize) -> Self {
        NodeIndex {
            index: index as u32,
        }
    }

    pub fn to_usize(&self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The node was expanded and has at least one child.
    Interior,
    /// The node's marking was already present (see [PruningPolicy]), so it
    /// was not expanded.
    Duplicate { of: NodeIndex },
    /// No transition is enabled in the node's marking.
    Dead,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverabilityNode {
    transition: Option<TransitionId>,
    marking: Marking,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    kind: NodeKind,
    depth: usize,
}

impl CoverabilityNode {
    pub(crate) fn root(marking: Marking) -> Self {
        CoverabilityNode {
            transition: None,
            marking,
            parent: None,
            children: vec![],
            kind: NodeKind::Interior,
            depth: 0,
        }
    }

    pub(crate) fn child(
        parent: NodeIndex,
        depth: usize,
        transition: TransitionId,
        marking: Marking,
        duplicate_of: Option<NodeIndex>,
    ) -> Self {
        CoverabilityNode {
            transition: Some(transition),
            marking,
            parent: Some(parent),
            children: vec![],
            kind: match duplicate_of {
                Some(of) => NodeKind::Duplicate { of },
                None => NodeKind::Interior,
            },
            depth,
        }
    }

    /// The transition fired to get here from the parent. `None` for the root.
    pub fn transition(&self) -> Option<TransitionId> {
        self.transition
    }

    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A Karp-Miller coverability tree.
///
/// Nodes live in a flat arena in the order they were created, which is a
/// depth-first pre-order with children in transition declaration order. The
/// root always has index 0. Parents are referenced by index only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverabilityTree {
    place_names: Vec<String>,
    transition_names: Vec<String>,
    pruning: PruningPolicy,
    nodes: Vec<CoverabilityNode>,
    statistics: CoverabilityStatistics,
}

impl CoverabilityTree {
    pub(crate) fn new(
        place_names: Vec<String>,
        transition_names: Vec<String>,
        pruning: PruningPolicy,
        nodes: Vec<CoverabilityNode>,
        statistics: CoverabilityStatistics,
    ) -> Self {
        debug_assert!(!nodes.is_empty(), "A tree always has a root");
        CoverabilityTree {
            place_names,
            transition_names,
            pruning,
            nodes,
            statistics,
        }
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex::new(0)
    }

    pub fn node(&self, index: NodeIndex) -> &CoverabilityNode {
        &self.nodes[index.to_usize()]
    }

    pub fn nodes(&self) -> &[CoverabilityNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &CoverabilityNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex::new(i), node))
    }

    pub fn children(&self, index: NodeIndex) -> &[NodeIndex] {
        self.node(index).children()
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.node(index).parent()
    }

    pub fn pruning(&self) -> PruningPolicy {
        self.pruning
    }

    pub fn statistics(&self) -> &CoverabilityStatistics {
        &self.statistics
    }

    pub fn place_names(&self) -> &[String] {
        &self.place_names
    }

    pub fn transition_name(&self, transition: TransitionId) -> &str {
        &self.transition_names[transition.to_usize()]
    }

    /// Walks from `index` up to the root, starting with `index` itself.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(Some(index), |i| self.parent(*i))
    }

    /// The transitions fired on the way from the root to `index`.
    pub fn path_to(&self, index: NodeIndex) -> Vec<&str> {
        let mut path: Vec<&str> = self
            .ancestors(index)
            .filter_map(|i| self.node(i).transition())
            .map(|t| self.transition_name(t))
            .collect();
        path.reverse();
        path
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(i, _)| i)
    }

    /// Places that hold omega in at least one node.
    pub fn unbounded_places(&self) -> Vec<&str> {
        PlaceId::iter_places(self.place_names.len())
            .filter(|p| self.nodes.iter().any(|n| n.marking.get(*p).is_infinite()))
            .map(|p| self.place_names[p.to_usize()].as_str())
            .collect()
    }

    pub fn is_bounded(&self) -> bool {
        self.nodes.iter().all(|n| !n.marking.has_infinite())
    }

    /// The largest token count `place` takes in any node.
    pub fn place_bound(&self, place: &str) -> PetriResult<TokenCount> {
        let index = self
            .place_names
            .iter()
            .position(|name| name == place)
            .ok_or_else(|| PetriError::unknown(place))?;

        Ok(self
            .nodes
            .iter()
            .map(|n| n.marking[index])
            .max()
            .unwrap_or_default())
    }

    /// Returns a node whose marking is greater or equal to `marking` in every
    /// place, if there is one. Such a node exists iff `marking` is coverable
    /// from the root marking.
    pub fn covering_node(&self, marking: &Marking) -> Option<NodeIndex> {
        self.iter()
            .find(|(_, node)| node.marking.covers(marking))
            .map(|(i, _)| i)
    }

    pub fn covers(&self, marking: &Marking) -> bool {
        self.covering_node(marking).is_some()
    }

    /// Transitions that label at least one edge, in declaration order.
    pub fn fired_transitions(&self) -> Vec<&str> {
        self.transitions_by_usage(true)
    }

    /// Transitions that can never fire from the root marking.
    pub fn dead_transitions(&self) -> Vec<&str> {
        self.transitions_by_usage(false)
    }

    fn transitions_by_usage(&self, used: bool) -> Vec<&str> {
        let mut fired = vec![false; self.transition_names.len()];
        for t in self.nodes.iter().filter_map(|n| n.transition) {
            fired[t.to_usize()] = true;
        }

        self.transition_names
            .iter()
            .zip(fired)
            .filter(|(_, f)| *f == used)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn dead_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.iter()
            .filter(|(_, node)| node.kind == NodeKind::Dead)
            .map(|(i, _)| i)
    }

    /// Whether the tree holds a node in which no transition is enabled.
    pub fn has_deadlock(&self) -> bool {
        self.dead_nodes().next().is_some()
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
