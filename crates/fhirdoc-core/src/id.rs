//! Resource identifiers.
//!
//! Identifiers are numeric and assigned by the server. The logical id that
//! appears in URLs and in the `id` element is the decimal rendering of a
//! [`ResourceId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("Resource id must not be empty")]
    Empty,
    #[error("Resource id '{0}' is not numeric")]
    NotNumeric(String),
    #[error("Resource id '{0}' is out of range")]
    OutOfRange(String),
}

/// Numeric logical id of a stored resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(u64);

impl ResourceId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        // u64::from_str would accept a leading '+'
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::NotNumeric(s.to_string()));
        }
        s.parse::<u64>()
            .map(ResourceId)
            .map_err(|_| IdError::OutOfRange(s.to_string()))
    }
}

/// Monotonic id allocator. Ids start at 1 and are never handed out twice.
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> ResourceId {
        ResourceId(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// The id the next call to [`IdSequence::next_id`] will return.
    pub fn peek(&self) -> ResourceId {
        ResourceId(self.next.load(Ordering::SeqCst))
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn parses_decimal_ids() {
        assert_eq!("1".parse::<ResourceId>().unwrap(), ResourceId::new(1));
        assert_eq!("007".parse::<ResourceId>().unwrap(), ResourceId::new(7));
        assert_eq!(ResourceId::new(42).to_string(), "42");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!("".parse::<ResourceId>().unwrap_err(), IdError::Empty);
        assert_eq!(
            "abc".parse::<ResourceId>().unwrap_err(),
            IdError::NotNumeric("abc".into())
        );
        assert!(matches!(
            "+1".parse::<ResourceId>(),
            Err(IdError::NotNumeric(_))
        ));
        assert!(matches!(
            "-1".parse::<ResourceId>(),
            Err(IdError::NotNumeric(_))
        ));
        assert!(matches!(
            "99999999999999999999999".parse::<ResourceId>(),
            Err(IdError::OutOfRange(_))
        ));
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&ResourceId::new(5)).unwrap();
        assert_eq!(json, "5");
    }

    #[test]
    fn sequence_is_monotonic() {
        let seq = IdSequence::new();
        assert_eq!(seq.peek(), ResourceId::new(1));
        assert_eq!(seq.next_id(), ResourceId::new(1));
        assert_eq!(seq.next_id(), ResourceId::new(2));
        assert_eq!(seq.peek(), ResourceId::new(3));
    }

    #[test]
    fn sequence_never_repeats_across_threads() {
        let seq = Arc::new(IdSequence::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let seq = seq.clone();
                std::thread::spawn(move || (0..250).map(|_| seq.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<ResourceId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }
}
