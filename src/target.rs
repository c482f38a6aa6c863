//! Target password, pre-encoded against an alphabet.

use std::fmt;

use crate::alphabet::Alphabet;

/// Error encoding a target password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// Character that no candidate can ever contain
    UnknownCharacter { character: char, position: usize },
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::UnknownCharacter { character, position } => write!(
                f,
                "Target character '{}' at position {} is not in the alphabet",
                character, position
            ),
        }
    }
}

impl std::error::Error for TargetError {}

/// Password being searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    text: String,
    indices: Vec<u32>,
}

impl Target {
    /// Encode `text` as indices into `alphabet`.
    pub fn new(text: &str, alphabet: &Alphabet) -> Result<Self, TargetError> {
        let indices = text
            .chars()
            .enumerate()
            .map(|(position, character)| {
                alphabet
                    .index_of(character)
                    .ok_or(TargetError::UnknownCharacter { character, position })
            })
            .collect::<Result<Vec<u32>, _>>()?;

        Ok(Self {
            text: text.to_string(),
            indices,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Password length in characters.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether a candidate's indices equal the target.
    #[inline]
    pub fn matches(&self, candidate: &[u32]) -> bool {
        candidate == self.indices.as_slice()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
