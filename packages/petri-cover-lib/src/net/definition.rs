use serde::{Deserialize, Serialize};

use crate::{
    error::PetriError,
    net::{PetriNet, marking::TokenCount},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDefinition {
    pub name: String,
    #[serde(default)]
    pub tokens: u32,
}

/// Plain description of a net: what a caller hands over to construct one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDefinition {
    pub name: String,
    pub places: Vec<PlaceDefinition>,
    pub transitions: Vec<String>,
    pub rules: Vec<String>,
}

impl NetDefinition {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build(self) -> Result<PetriNet, PetriError> {
        PetriNet::try_from(self)
    }
}

impl TryFrom<NetDefinition> for PetriNet {
    type Error = PetriError;

    fn try_from(definition: NetDefinition) -> Result<Self, Self::Error> {
        PetriNet::new(
            definition.name,
            definition.places.into_iter().map(|p| (p.name, p.tokens)),
            definition.transitions,
            definition.rules,
        )
    }
}

impl PetriNet {
    /// Describes this net with its current marking as the initial one.
    /// Places holding omega can not be described and yield `None`.
    pub fn to_definition(&self) -> Option<NetDefinition> {
        let places = self
            .place_names()
            .zip(self.marking().iter())
            .map(|(name, tokens)| match tokens {
                TokenCount::Finite(n) => Some(PlaceDefinition {
                    name: name.to_string(),
                    tokens: *n,
                }),
                TokenCount::Infinite => None,
            })
            .collect::<Option<Vec<_>>>()?;

        Some(NetDefinition {
            name: self.name().to_string(),
            places,
            transitions: self.transition_names().map(str::to_string).collect(),
            rules: self.rules().to_vec(),
        })
    }
}
