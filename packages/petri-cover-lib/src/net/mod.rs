use hashbrown::HashMap;

use crate::{
    config::CoverabilityConfig,
    coverability::{CoverabilityTree, builder::CoverabilityTreeBuilder},
    error::{PetriError, PetriResult},
    firing::{FiringEngine, FiringOutcome},
    net::{
        entity::{Entity, EntityRef, PlaceId, TransitionId},
        marking::{Marking, TokenCount},
        rules::{Rule, build_incidence, parse_rule_block},
        transition::TransitionArcs,
    },
};

pub mod definition;
pub mod entity;
pub mod marking;
pub mod rules;
pub mod transition;

/// A place/transition net built from textual arc rules, together with its
/// current marking.
///
/// The incidence map is derived once, when the net is constructed, and never
/// changes afterwards. Only the marking is mutable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PetriNet {
    name: String,
    place_names: Vec<String>,
    transition_names: Vec<String>,
    names: HashMap<String, EntityRef>,
    rules: Vec<String>,
    incidence: Vec<TransitionArcs>,
    initial_marking: Marking,
    marking: Marking,
}

impl PetriNet {
    /// Builds a net from `(place, initial tokens)` pairs, transition names and
    /// rule lines. Every rule item may also hold several lines.
    ///
    /// Fails on the first malformed rule, unknown name or duplicate name.
    pub fn new<P, S, T, R>(
        name: impl Into<String>,
        places: P,
        transitions: T,
        rules: R,
    ) -> PetriResult<Self>
    where
        P: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let entities = places
            .into_iter()
            .map(|(name, tokens)| Entity::place(name, tokens))
            .chain(transitions.into_iter().map(Entity::transition));

        Self::from_entities(name, entities, rules)
    }

    /// Builds a net from a list of entities. Places and transitions keep their
    /// relative order, which is the order of markings and of exploration.
    pub fn from_entities<E, R>(name: impl Into<String>, entities: E, rules: R) -> PetriResult<Self>
    where
        E: IntoIterator<Item = Entity>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let mut place_names = vec![];
        let mut transition_names = vec![];
        let mut initial = vec![];
        let mut names = HashMap::new();

        for entity in entities {
            let entity_ref = match &entity {
                Entity::Place { tokens, .. } => {
                    initial.push(*tokens);
                    EntityRef::Place(PlaceId::new(place_names.len() as u32))
                }
                Entity::Transition { .. } => {
                    EntityRef::Transition(TransitionId::new(transition_names.len() as u32))
                }
            };

            if names.insert(entity.name().to_string(), entity_ref).is_some() {
                return Err(PetriError::DuplicateName {
                    name: entity.name().to_string(),
                });
            }

            match entity {
                Entity::Place { name, .. } => place_names.push(name),
                Entity::Transition { name } => transition_names.push(name),
            }
        }

        let rule_texts: Vec<String> = rules
            .into_iter()
            .map(|r| r.as_ref().to_string())
            .collect();
        let parsed: Vec<Rule<'_>> = rule_texts
            .iter()
            .map(|text| parse_rule_block(text))
            .collect::<PetriResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        let incidence = build_incidence(&parsed, transition_names.len(), |n| {
            names.get(n).copied()
        })?;
        let rules = parsed.iter().map(|r| r.line.to_string()).collect();
        let initial_marking = Marking::from(initial);

        let net = PetriNet {
            name: name.into(),
            place_names,
            transition_names,
            names,
            rules,
            incidence,
            marking: initial_marking.clone(),
            initial_marking,
        };

        tracing::debug!(
            net = %net.name,
            places = %net.place_count(),
            transitions = %net.transition_count(),
            initial = %net.initial_marking,
            "Constructed Petri net"
        );

        Ok(net)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn place_count(&self) -> usize {
        self.place_names.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transition_names.len()
    }

    pub fn place_names(&self) -> impl Iterator<Item = &str> {
        self.place_names.iter().map(String::as_str)
    }

    pub fn transition_names(&self) -> impl Iterator<Item = &str> {
        self.transition_names.iter().map(String::as_str)
    }

    pub fn place_name(&self, place: PlaceId) -> &str {
        &self.place_names[place.to_usize()]
    }

    pub fn transition_name(&self, transition: TransitionId) -> &str {
        &self.transition_names[transition.to_usize()]
    }

    /// The rule lines this net was built from, one rule per entry.
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn resolve(&self, name: &str) -> Option<EntityRef> {
        self.names.get(name).copied()
    }

    pub fn place_id(&self, name: &str) -> PetriResult<PlaceId> {
        match self.resolve(name) {
            Some(EntityRef::Place(p)) => Ok(p),
            _ => Err(PetriError::unknown(name)),
        }
    }

    pub fn transition_id(&self, name: &str) -> PetriResult<TransitionId> {
        match self.resolve(name) {
            Some(EntityRef::Transition(t)) => Ok(t),
            _ => Err(PetriError::unknown(name)),
        }
    }

    pub fn arcs(&self, transition: TransitionId) -> &TransitionArcs {
        &self.incidence[transition.to_usize()]
    }

    pub fn iter_transitions(&self) -> impl Iterator<Item = (TransitionId, &TransitionArcs)> {
        self.incidence
            .iter()
            .enumerate()
            .map(|(i, arcs)| (TransitionId::new(i as u32), arcs))
    }

    /// All places with their current tokens, followed by all transitions.
    pub fn entities(&self) -> Vec<Entity> {
        self.place_names
            .iter()
            .zip(self.marking.iter())
            .map(|(name, tokens)| Entity::place(name.clone(), *tokens))
            .chain(self.transition_names.iter().cloned().map(Entity::transition))
            .collect()
    }

    pub fn initial_marking(&self) -> &Marking {
        &self.initial_marking
    }

    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    pub fn set_marking(&mut self, marking: Marking) -> PetriResult<()> {
        self.check_dimension(&marking)?;
        self.marking = marking;
        Ok(())
    }

    /// Puts the net back into its initial marking.
    pub fn reset(&mut self) {
        self.marking = self.initial_marking.clone();
    }

    pub fn tokens(&self, place: &str) -> PetriResult<TokenCount> {
        Ok(self.marking.get(self.place_id(place)?))
    }

    pub fn set_tokens(&mut self, place: &str, tokens: impl Into<TokenCount>) -> PetriResult<()> {
        let id = self.place_id(place)?;
        self.marking.set(id, tokens.into());
        Ok(())
    }

    pub(crate) fn check_dimension(&self, marking: &Marking) -> PetriResult<()> {
        if marking.dimension() != self.place_count() {
            return Err(PetriError::MarkingDimensionMismatch {
                expected: self.place_count(),
                actual: marking.dimension(),
            });
        }
        Ok(())
    }

    pub fn engine(&self) -> FiringEngine<'_> {
        FiringEngine::new(self)
    }

    pub fn is_enabled(&self, transition: &str) -> PetriResult<bool> {
        let id = self.transition_id(transition)?;
        Ok(self.engine().is_enabled(&self.marking, id))
    }

    /// Fires a single transition on the current marking. On error the
    /// marking is unchanged.
    pub fn fire(&mut self, transition: &str) -> PetriResult<()> {
        let id = self.transition_id(transition)?;
        self.marking = self.engine().fire(&self.marking, id)?;
        Ok(())
    }

    /// Fires `transitions` in order, starting from the current marking, and
    /// moves the net to the marking reached before the first disabled
    /// transition (or after the last one).
    pub fn fire_sequence<S: AsRef<str>>(&mut self, transitions: &[S]) -> PetriResult<FiringOutcome> {
        let outcome = self.engine().fire_sequence(&self.marking, transitions)?;
        self.marking = outcome.marking.clone();
        Ok(outcome)
    }

    pub fn build_coverability_tree(
        &self,
        initial_marking: &Marking,
        config: CoverabilityConfig,
    ) -> Result<CoverabilityTree, crate::coverability::builder::ExplorationError> {
        CoverabilityTreeBuilder::new(self, config).build(initial_marking)
    }
}

impl std::fmt::Display for PetriNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        for (name, tokens) in self.place_names.iter().zip(self.marking.iter()) {
            writeln!(f, "  {}: {}", name, tokens)?;
        }
        for rule in &self.rules {
            writeln!(f, "  {}", rule)?;
        }
        Ok(())
    }
}
