use serde::{Deserialize, Serialize};

use crate::net::entity::PlaceId;

/// The arcs of one transition. Each entry is `(weight, place)`; a place
/// occurs at most once per list, repeated arcs are summed into its weight.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionArcs {
    consumes: Vec<(u32, PlaceId)>,
    produces: Vec<(u32, PlaceId)>,
}

impl TransitionArcs {
    /// Returns `None` if summing repeated arcs overflows a weight.
    pub fn new(consumes: Vec<(u32, PlaceId)>, produces: Vec<(u32, PlaceId)>) -> Option<Self> {
        let mut arcs = Self::default();
        for (weight, place) in consumes {
            arcs.add_consumed(place, weight)?;
        }
        for (weight, place) in produces {
            arcs.add_produced(place, weight)?;
        }
        Some(arcs)
    }

    pub fn consumes(&self) -> &[(u32, PlaceId)] {
        &self.consumes
    }

    pub fn produces(&self) -> &[(u32, PlaceId)] {
        &self.produces
    }

    /// Adds an input arc and returns the summed weight of `place`, or `None`
    /// on overflow. The arcs are unchanged in that case.
    pub fn add_consumed(&mut self, place: PlaceId, weight: u32) -> Option<u32> {
        add_weight(&mut self.consumes, place, weight)
    }

    pub fn add_produced(&mut self, place: PlaceId, weight: u32) -> Option<u32> {
        add_weight(&mut self.produces, place, weight)
    }

    pub fn consumed_weight(&self, place: PlaceId) -> u32 {
        find_weight(&self.consumes, place)
    }

    pub fn produced_weight(&self, place: PlaceId) -> u32 {
        find_weight(&self.produces, place)
    }

    /// The net change a single firing causes on `place`.
    pub fn effect(&self, place: PlaceId) -> i64 {
        self.produced_weight(place) as i64 - self.consumed_weight(place) as i64
    }
}

fn add_weight(arcs: &mut Vec<(u32, PlaceId)>, place: PlaceId, weight: u32) -> Option<u32> {
    match arcs.iter_mut().find(|(_, p)| *p == place) {
        Some((w, _)) => {
            *w = w.checked_add(weight)?;
            Some(*w)
        }
        None => {
            arcs.push((weight, place));
            Some(weight)
        }
    }
}

fn find_weight(arcs: &[(u32, PlaceId)], place: PlaceId) -> u32 {
    arcs.iter()
        .find(|(_, p)| *p == place)
        .map(|(w, _)| *w)
        .unwrap_or(0)
}

#[test]
fn test_repeated_arcs_are_summed() {
    let p0 = PlaceId::new(0);
    let p1 = PlaceId::new(1);
    let arcs = TransitionArcs::new(vec![(1, p0)], vec![(1, p0), (1, p1), (1, p0)]).unwrap();

    assert_eq!(arcs.consumes(), &[(1, p0)]);
    assert_eq!(arcs.produces(), &[(2, p0), (1, p1)]);
    assert_eq!(arcs.effect(p0), 1);
    assert_eq!(arcs.effect(p1), 1);
    assert_eq!(arcs.consumed_weight(p1), 0);
}

#[test]
fn test_weight_overflow_is_rejected() {
    let p0 = PlaceId::new(0);
    let mut arcs = TransitionArcs::default();

    assert_eq!(arcs.add_produced(p0, u32::MAX), Some(u32::MAX));
    assert_eq!(arcs.add_produced(p0, 1), None);
    assert_eq!(arcs.produced_weight(p0), u32::MAX);
    assert!(TransitionArcs::new(vec![(u32::MAX, p0), (2, p0)], vec![]).is_none());
}
