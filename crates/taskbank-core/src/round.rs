//! Ledger rounds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A confirmed ledger round. Monotonic; used as the ordering key for history.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Round(pub u64);

impl Round {
    /// The raw round number.
    pub fn get(self) -> u64 {
        self.0
    }

    /// The round `n` rounds after this one, saturating.
    pub fn plus(self, n: u64) -> Round {
        Round(self.0.saturating_add(n))
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Round {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
