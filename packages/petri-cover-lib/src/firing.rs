use serde::{Deserialize, Serialize};

use crate::{
    error::{PetriError, PetriResult},
    net::{PetriNet, entity::TransitionId, marking::Marking},
};

/// Result of firing a sequence of transitions.
///
/// On failure, `marking` is the marking right before the first transition
/// that was not enabled, and `applied` holds the transitions fired before it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiringOutcome {
    pub success: bool,
    pub marking: Marking,
    pub applied: Vec<String>,
}

impl FiringOutcome {
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

/// Fires transitions of a net on markings passed in by the caller. The engine
/// never mutates its input: every successful firing returns a new marking.
#[derive(Clone, Copy, Debug)]
pub struct FiringEngine<'n> {
    net: &'n PetriNet,
}

impl<'n> FiringEngine<'n> {
    pub fn new(net: &'n PetriNet) -> Self {
        FiringEngine { net }
    }

    pub fn net(&self) -> &'n PetriNet {
        self.net
    }

    /// A transition is enabled if every place it consumes from holds at least
    /// the arc weight, or omega.
    ///
    /// Panics if `marking` does not have one entry per place of the net.
    pub fn is_enabled(&self, marking: &Marking, transition: TransitionId) -> bool {
        assert_eq!(
            marking.dimension(),
            self.net.place_count(),
            "Marking dimension does not match the net"
        );
        self.net
            .arcs(transition)
            .consumes()
            .iter()
            .all(|(weight, place)| marking.get(*place).can_consume(*weight))
    }

    /// Panics if `marking` does not have one entry per place of the net.
    pub fn enabled_transitions<'m>(
        &self,
        marking: &'m Marking,
    ) -> impl Iterator<Item = TransitionId> + use<'n, 'm> {
        let engine = *self;
        TransitionId::iter_transitions(self.net.transition_count())
            .filter(move |t| engine.is_enabled(marking, *t))
    }

    /// Fires `transition` on `marking`. Either every consumed place is
    /// decremented and every produced place incremented, or an error is
    /// returned and nothing happened.
    pub fn fire(&self, marking: &Marking, transition: TransitionId) -> PetriResult<Marking> {
        self.net.check_dimension(marking)?;

        let arcs = self.net.arcs(transition);
        let mut next = marking.clone();

        for &(weight, place) in arcs.consumes() {
            let tokens = next.get(place);
            let Some(remaining) = tokens.checked_sub(weight) else {
                return Err(PetriError::InsufficientTokens {
                    transition: self.net.transition_name(transition).to_string(),
                    place: self.net.place_name(place).to_string(),
                    required: weight,
                    available: tokens.finite().unwrap_or_default(),
                });
            };
            next.set(place, remaining);
        }

        for &(weight, place) in arcs.produces() {
            let Some(sum) = next.get(place).checked_add(weight) else {
                return Err(PetriError::TokenOverflow {
                    transition: self.net.transition_name(transition).to_string(),
                    place: self.net.place_name(place).to_string(),
                });
            };
            next.set(place, sum);
        }

        Ok(next)
    }

    pub fn fire_by_name(&self, marking: &Marking, transition: &str) -> PetriResult<Marking> {
        self.fire(marking, self.net.transition_id(transition)?)
    }

    /// Fires `transitions` in order starting at `marking` and stops at the
    /// first one that is not enabled.
    ///
    /// All names are resolved before anything fires, so an unknown name fails
    /// the whole call with [PetriError::UnknownEntity].
    pub fn fire_sequence<S: AsRef<str>>(
        &self,
        marking: &Marking,
        transitions: &[S],
    ) -> PetriResult<FiringOutcome> {
        self.net.check_dimension(marking)?;

        let ids = transitions
            .iter()
            .map(|name| self.net.transition_id(name.as_ref()))
            .collect::<PetriResult<Vec<_>>>()?;

        let mut current = marking.clone();
        let mut applied = Vec::with_capacity(ids.len());

        for (step, id) in ids.into_iter().enumerate() {
            match self.fire(&current, id) {
                Ok(next) => {
                    tracing::trace!(
                        step = %(step + 1),
                        transition = %self.net.transition_name(id),
                        marking = %next,
                        "Fired"
                    );
                    current = next;
                    applied.push(self.net.transition_name(id).to_string());
                }
                Err(e) if e.is_not_enabled() => {
                    tracing::debug!(step = %(step + 1), "Sequence stopped: {}", e);
                    return Ok(FiringOutcome {
                        success: false,
                        marking: current,
                        applied,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(FiringOutcome {
            success: true,
            marking: current,
            applied,
        })
    }
}
