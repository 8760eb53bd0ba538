use std::ops::Index;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::net::entity::PlaceId;

/// Number of tokens on a place. `Infinite` is the Karp-Miller omega: it
/// absorbs every addition and subtraction and is greater than every finite
/// count. The derived order relies on `Finite` being declared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenCount {
    Finite(u32),
    Infinite,
}

impl TokenCount {
    pub const ZERO: TokenCount = TokenCount::Finite(0);

    pub fn is_infinite(&self) -> bool {
        matches!(self, TokenCount::Infinite)
    }

    pub fn finite(&self) -> Option<u32> {
        match self {
            TokenCount::Finite(n) => Some(*n),
            TokenCount::Infinite => None,
        }
    }

    /// Whether `weight` tokens can be taken from this count.
    pub fn can_consume(&self, weight: u32) -> bool {
        match self {
            TokenCount::Finite(n) => *n >= weight,
            TokenCount::Infinite => true,
        }
    }

    /// Returns `None` if the result would be negative.
    pub fn checked_sub(self, weight: u32) -> Option<TokenCount> {
        match self {
            TokenCount::Finite(n) => n.checked_sub(weight).map(TokenCount::Finite),
            TokenCount::Infinite => Some(TokenCount::Infinite),
        }
    }

    /// Returns `None` if a finite count overflows.
    pub fn checked_add(self, weight: u32) -> Option<TokenCount> {
        match self {
            TokenCount::Finite(n) => n.checked_add(weight).map(TokenCount::Finite),
            TokenCount::Infinite => Some(TokenCount::Infinite),
        }
    }
}

impl Default for TokenCount {
    fn default() -> Self {
        TokenCount::ZERO
    }
}

impl From<u32> for TokenCount {
    fn from(n: u32) -> Self {
        TokenCount::Finite(n)
    }
}

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenCount::Finite(n) => write!(f, "{}", n),
            TokenCount::Infinite => write!(f, "Ω"),
        }
    }
}

/// Token counts of all places of a net, in place declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marking {
    values: Box<[TokenCount]>,
}

impl Marking {
    pub fn new(values: Box<[TokenCount]>) -> Self {
        Marking { values }
    }

    pub fn zero(dimension: usize) -> Self {
        Marking {
            values: vec![TokenCount::ZERO; dimension].into_boxed_slice(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TokenCount> {
        self.values.iter()
    }

    pub fn get(&self, place: PlaceId) -> TokenCount {
        self.values[place.to_usize()]
    }

    pub fn set(&mut self, place: PlaceId, tokens: TokenCount) {
        self.values[place.to_usize()] = tokens;
    }

    /// Checks whether `self` is greater or equal to `other` in every place.
    pub fn covers(&self, other: &Marking) -> bool {
        debug_assert_eq!(
            self.dimension(),
            other.dimension(),
            "Markings must have the same dimension"
        );
        self.values.iter().zip(other.values.iter()).all(|(a, b)| a >= b)
    }

    /// Checks whether `self` covers `other` and differs from it somewhere.
    pub fn strictly_covers(&self, other: &Marking) -> bool {
        self.covers(other) && self != other
    }

    pub fn has_infinite(&self) -> bool {
        self.values.iter().any(TokenCount::is_infinite)
    }

    pub fn infinite_places(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.values
            .iter()
            .positions(TokenCount::is_infinite)
            .map(|i| PlaceId::new(i as u32))
    }
}

impl From<Box<[TokenCount]>> for Marking {
    fn from(values: Box<[TokenCount]>) -> Self {
        Marking::new(values)
    }
}

impl From<Vec<TokenCount>> for Marking {
    fn from(values: Vec<TokenCount>) -> Self {
        Marking::new(values.into_boxed_slice())
    }
}

impl From<Vec<u32>> for Marking {
    fn from(values: Vec<u32>) -> Self {
        values.into_iter().map(TokenCount::Finite).collect()
    }
}

impl From<&[u32]> for Marking {
    fn from(values: &[u32]) -> Self {
        values.iter().copied().map(TokenCount::Finite).collect()
    }
}

impl FromIterator<TokenCount> for Marking {
    fn from_iter<T: IntoIterator<Item = TokenCount>>(iter: T) -> Self {
        let values: Vec<TokenCount> = iter.into_iter().collect();
        Marking::new(values.into_boxed_slice())
    }
}

impl Index<PlaceId> for Marking {
    type Output = TokenCount;

    fn index(&self, index: PlaceId) -> &Self::Output {
        &self.values[index.to_usize()]
    }
}

impl Index<usize> for Marking {
    type Output = TokenCount;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl std::fmt::Display for Marking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.values.iter().join(" "))
    }
}

#[test]
fn test_token_count_order() {
    assert!(TokenCount::Finite(3) < TokenCount::Finite(4));
    assert!(TokenCount::Finite(u32::MAX) < TokenCount::Infinite);
    assert_eq!(TokenCount::Infinite, TokenCount::Infinite);
    assert!(!(TokenCount::Infinite > TokenCount::Infinite));
}

#[test]
fn test_token_count_arithmetic() {
    assert_eq!(TokenCount::Finite(2).checked_sub(3), None);
    assert_eq!(TokenCount::Finite(5).checked_sub(3), Some(TokenCount::Finite(2)));
    assert_eq!(TokenCount::Infinite.checked_sub(100), Some(TokenCount::Infinite));
    assert_eq!(TokenCount::Infinite.checked_add(1), Some(TokenCount::Infinite));
    assert_eq!(TokenCount::Finite(u32::MAX).checked_add(1), None);
}

#[test]
fn test_marking_covers() {
    let a: Marking = vec![1, 0, 2].into();
    let b: Marking = vec![1, 1, 2].into();
    let c = Marking::from(vec![
        TokenCount::Infinite,
        TokenCount::Finite(0),
        TokenCount::Finite(2),
    ]);

    assert!(b.covers(&a));
    assert!(b.strictly_covers(&a));
    assert!(!a.strictly_covers(&a));
    assert!(a.covers(&a));
    assert!(c.covers(&a));
    assert!(!c.covers(&b));
    assert_eq!(c.infinite_places().collect::<Vec<_>>(), vec![PlaceId::new(0)]);
    assert_eq!(c.to_string(), "(Ω 0 2)");
}
