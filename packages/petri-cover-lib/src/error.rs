use thiserror::Error;

/// Errors raised while building a net or firing its transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PetriError {
    /// A rule line does not match `name -> entries`.
    #[error("Malformed rule '{line}': {reason}")]
    MalformedRule { line: String, reason: String },
    /// A rule or firing request mentions a name that was never declared.
    #[error("Can not find entity '{name}'")]
    UnknownEntity { name: String },
    #[error("Name '{name}' is declared more than once")]
    DuplicateName { name: String },
    /// The transition is not enabled. The marking was left unchanged.
    #[error(
        "Transition '{transition}' needs {required} tokens from '{place}', but only {available} are present"
    )]
    InsufficientTokens {
        transition: String,
        place: String,
        required: u32,
        available: u32,
    },
    #[error("Firing '{transition}' overflows the token count of '{place}'")]
    TokenOverflow { transition: String, place: String },
    #[error("Marking has {actual} entries, but the net has {expected} places")]
    MarkingDimensionMismatch { expected: usize, actual: usize },
}

impl PetriError {
    pub fn malformed(line: &str, reason: impl Into<String>) -> Self {
        PetriError::MalformedRule {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unknown(name: &str) -> Self {
        PetriError::UnknownEntity {
            name: name.to_string(),
        }
    }

    /// Whether this error only says that a transition could not fire.
    pub fn is_not_enabled(&self) -> bool {
        matches!(self, PetriError::InsufficientTokens { .. })
    }
}

pub type PetriResult<T> = Result<T, PetriError>;
