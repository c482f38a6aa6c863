//! Character sets that map generator output to printable passwords.
//!
//! An alphabet is the ordered concatenation of character classes. Index `i`
//! drawn by a generator selects `chars[i]`, so the order is part of the
//! password format: two alphabets with the same characters in a different
//! order produce different passwords for the same seed.

use std::fmt;

pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";

/// All 32 ASCII punctuation characters, in ASCII order.
pub const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Symbol class of the classic password tool (29 characters, its own order).
pub const CLASSIC_SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:'\",.<>?/";

/// Errors building an alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlphabetError {
    /// No characters at all
    Empty,
    /// A character appears more than once
    Duplicate(char),
}

impl fmt::Display for AlphabetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlphabetError::Empty => write!(f, "Alphabet must contain at least one character"),
            AlphabetError::Duplicate(c) => write!(f, "Alphabet contains '{}' more than once", c),
        }
    }
}

impl std::error::Error for AlphabetError {}

/// Ordered, immutable set of password characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet from the characters of `s`, in order.
    pub fn new(s: &str) -> Result<Self, AlphabetError> {
        let chars: Vec<char> = s.chars().collect();

        if chars.is_empty() {
            return Err(AlphabetError::Empty);
        }

        for (i, c) in chars.iter().enumerate() {
            if chars[..i].contains(c) {
                return Err(AlphabetError::Duplicate(*c));
            }
        }

        Ok(Self { chars })
    }

    /// Lowercase, uppercase, digits and all ASCII punctuation (94 characters).
    pub fn printable() -> Self {
        Self::from_classes(&[LOWERCASE, UPPERCASE, DIGITS, PUNCTUATION])
    }

    /// Lowercase, uppercase, digits and the classic tool's symbols (91 characters).
    pub fn classic() -> Self {
        Self::from_classes(&[LOWERCASE, UPPERCASE, DIGITS, CLASSIC_SYMBOLS])
    }

    fn from_classes(classes: &[&str]) -> Self {
        Self {
            chars: classes.iter().flat_map(|class| class.chars()).collect(),
        }
    }

    /// Parse an alphabet name (`printable`, `classic`) or a literal character set.
    pub fn from_spec(s: &str) -> Result<Self, AlphabetError> {
        match s {
            "printable" => Ok(Self::printable()),
            "classic" => Ok(Self::classic()),
            custom => Self::new(custom),
        }
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always false; an alphabet is never empty.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Size as the bound used for index draws.
    pub fn size(&self) -> u32 {
        self.chars.len() as u32
    }

    /// Character at `index`. Panics when out of range.
    pub fn char_at(&self, index: u32) -> char {
        self.chars[index as usize]
    }

    /// Position of `c`, if it belongs to the alphabet.
    pub fn index_of(&self, c: char) -> Option<u32> {
        self.chars.iter().position(|&x| x == c).map(|i| i as u32)
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    /// Render a sequence of indices as a string.
    pub fn render(&self, indices: &[u32]) -> String {
        indices.iter().map(|&i| self.char_at(i)).collect()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::printable()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
