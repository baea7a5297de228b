//! Search string generation.
//!
//! The register offers no listing endpoint, so every vessel is reached through
//! short substring searches. Every ordered pair of alphabet characters is
//! searched as-is and once more with each separator between the two.

use std::collections::BTreeSet;

use crate::models::{AlphabetConfig, Variation};

/// Ordered alphabet plus separator characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
    separators: Vec<char>,
}

impl Alphabet {
    /// Concatenate the given character sets in order.
    ///
    /// Repeated characters keep their first position only.
    pub fn new<I, S>(sets: I, separators: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut chars = Vec::new();
        for set in sets {
            for c in set.as_ref().chars() {
                if !chars.contains(&c) {
                    chars.push(c);
                }
            }
        }

        let mut seps = Vec::new();
        for c in separators.chars() {
            if !seps.contains(&c) {
                seps.push(c);
            }
        }

        Self {
            chars,
            separators: seps,
        }
    }

    pub fn from_config(config: &AlphabetConfig) -> Self {
        Self::new(&config.sets, &config.separators)
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn separators(&self) -> &[char] {
        &self.separators
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Number of variations [`Alphabet::variations`] yields.
    pub fn variation_count(&self) -> usize {
        self.chars.len() * self.chars.len() * (1 + self.separators.len())
    }

    pub fn variations(&self) -> Vec<Variation> {
        generate(&self.chars, &self.separators)
    }
}

/// Build the sorted set of all `c1 c2` and `c1 s c2` strings.
pub fn generate(alphabet: &[char], separators: &[char]) -> Vec<Variation> {
    let mut result = BTreeSet::new();

    for &first in alphabet {
        for &second in alphabet {
            result.insert(String::from_iter([first, second]));

            for &sep in separators {
                result.insert(String::from_iter([first, sep, second]));
            }
        }
    }

    log::debug!(
        "Generated {} variations from {} characters and {} separators",
        result.len(),
        alphabet.len(),
        separators.len()
    );

    result.into_iter().map(Variation::new).collect()
}
