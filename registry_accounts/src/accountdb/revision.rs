use std::fmt;

use crate::digest::content_hash;

/// Parsed revision token `<number>-<hash>`
///
/// `number` is positive and grows by one per accepted update; `hash` is the
/// MD5 of the content written with that revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    number: u64,
    hash: String,
}

impl Revision {
    /// Parse the integer before the first `-`. Zero, empty or non-numeric prefixes are rejected.
    pub fn parse(token: &str) -> Option<Self> {
        let (prefix, hash) = token.split_once('-').unwrap_or((token, ""));
        let number = prefix.trim().parse::<u64>().ok().filter(|n| *n > 0)?;

        Some(Self {
            number,
            hash: hash.to_string(),
        })
    }

    /// First revision for newly created content
    pub fn initial(content: &str) -> Self {
        Self {
            number: 1,
            hash: content_hash(content),
        }
    }

    /// Revision following this one for `content`; `None` once the counter is exhausted
    pub fn next(&self, content: &str) -> Option<Self> {
        Some(Self {
            number: self.number.checked_add(1)?,
            hash: content_hash(content),
        })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.number, self.hash)
    }
}
