//! Playable letters
//!
//! The static fingerspelling alphabet: A-Y without J. J and Z are traced in
//! the air and cannot be read from a single frame.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::GameError;

/// Every playable symbol, in draw order
pub const ALPHABET: &[u8] = b"ABCDEFGHIKLMNOPQRSTUVWXY";

/// One symbol of the playable alphabet (always uppercase)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Letter(u8);

impl Letter {
    /// Parse a classifier label. Case-insensitive, surrounding whitespace ignored.
    pub fn parse(label: &str) -> Result<Self, GameError> {
        let malformed = || GameError::MalformedPrediction {
            label: label.to_string(),
        };

        let trimmed = label.trim();
        let mut chars = trimmed.chars();
        let c = chars.next().ok_or_else(malformed)?;
        if chars.next().is_some() || !c.is_ascii() {
            return Err(malformed());
        }

        let upper = c.to_ascii_uppercase() as u8;
        if ALPHABET.contains(&upper) {
            Ok(Self(upper))
        } else {
            Err(malformed())
        }
    }

    /// Draw a letter uniformly from the alphabet
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(ALPHABET[rng.gen_range(0..ALPHABET.len())])
    }

    /// All playable letters
    pub fn all() -> impl Iterator<Item = Letter> {
        ALPHABET.iter().map(|&b| Letter(b))
    }

    pub fn as_char(&self) -> char {
        self.0 as char
    }

    /// Case-insensitive comparison against a raw label
    pub fn matches(&self, label: &str) -> bool {
        Letter::parse(label).map(|l| l == *self).unwrap_or(false)
    }
}

impl TryFrom<String> for Letter {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Letter::parse(&value)
    }
}

impl From<Letter> for String {
    fn from(letter: Letter) -> Self {
        letter.as_char().to_string()
    }
}

impl std::fmt::Display for Letter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
