use serde::{Deserialize, Serialize};

use crate::net::marking::TokenCount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId {
    index: u32,
}

impl PlaceId {
    pub fn new(index: u32) -> Self {
        PlaceId { index }
    }

    pub fn iter_places(place_count: usize) -> impl Iterator<Item = PlaceId> {
        (0..place_count).map(|i| PlaceId::new(i as u32))
    }

    pub fn to_usize(&self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}", self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId {
    index: u32,
}

impl TransitionId {
    pub fn new(index: u32) -> Self {
        TransitionId { index }
    }

    pub fn iter_transitions(transition_count: usize) -> impl Iterator<Item = TransitionId> {
        (0..transition_count).map(|i| TransitionId::new(i as u32))
    }

    pub fn to_usize(&self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for TransitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.index)
    }
}

/// A named node of the net. Places carry their initial token count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    Place { name: String, tokens: TokenCount },
    Transition { name: String },
}

impl Entity {
    pub fn place(name: impl Into<String>, tokens: impl Into<TokenCount>) -> Self {
        Entity::Place {
            name: name.into(),
            tokens: tokens.into(),
        }
    }

    pub fn transition(name: impl Into<String>) -> Self {
        Entity::Transition { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Place { name, .. } | Entity::Transition { name } => name,
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Place { name, tokens } => write!(f, "{}: {}", name, tokens),
            Entity::Transition { name } => write!(f, "{}", name),
        }
    }
}

/// The result of resolving a name against the declared entities of a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Place(PlaceId),
    Transition(TransitionId),
}
