//! # MicroAlgo Amounts
//!
//! All amounts are carried as integer microAlgos. Display units (ALGO) are
//! a fixed scale of 1,000,000 applied only at the edges:
//!
//! - [`MicroAlgos::to_algos_string`] formats exactly, six fractional digits.
//! - [`MicroAlgos::from_algos_str`] parses user input exactly; digits beyond
//!   the sixth are rounded half-up.

use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of microAlgos in one ALGO.
pub const MICROALGOS_PER_ALGO: u64 = 1_000_000;

const FRACTION_DIGITS: usize = 6;

/// An amount in microAlgos.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MicroAlgos(pub u64);

impl MicroAlgos {
    /// Zero microAlgos.
    pub const ZERO: MicroAlgos = MicroAlgos(0);

    /// Build from a whole number of ALGO, rejecting overflow.
    pub fn from_algos(algos: u64) -> Option<Self> {
        algos.checked_mul(MICROALGOS_PER_ALGO).map(Self)
    }

    /// The raw microAlgo count.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Whether this is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(self, rhs: MicroAlgos) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, rhs: MicroAlgos) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Whole ALGO part.
    pub fn whole_algos(self) -> u64 {
        self.0 / MICROALGOS_PER_ALGO
    }

    /// Exact display form with six fractional digits, e.g. `150.000000`.
    pub fn to_algos_string(self) -> String {
        format!(
            "{}.{:06}",
            self.0 / MICROALGOS_PER_ALGO,
            self.0 % MICROALGOS_PER_ALGO
        )
    }

    /// Display form with two fractional digits, rounded half-up, used for
    /// balance columns and pool totals.
    pub fn to_algos_string_2dp(self) -> String {
        let cents = (self.0 as u128 + 5_000) / 10_000;
        format!("{}.{:02}", cents / 100, cents % 100)
    }

    /// Parse a non-negative decimal ALGO amount into microAlgos.
    pub fn from_algos_str(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        let invalid = |reason: &str| ValidationError::InvalidAmount {
            value: input.to_string(),
            reason: reason.to_string(),
        };

        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("empty"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("expected digits with an optional decimal point"));
        }

        let overflow = || ValidationError::AmountOverflow(input.to_string());

        let whole_value: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };

        let kept = &fraction[..fraction.len().min(FRACTION_DIGITS)];
        let mut fraction_value: u64 = 0;
        for b in kept.bytes() {
            fraction_value = fraction_value * 10 + u64::from(b - b'0');
        }
        for _ in kept.len()..FRACTION_DIGITS {
            fraction_value *= 10;
        }
        let round_up = fraction
            .as_bytes()
            .get(FRACTION_DIGITS)
            .is_some_and(|b| *b >= b'5');

        whole_value
            .checked_mul(MICROALGOS_PER_ALGO)
            .and_then(|v| v.checked_add(fraction_value))
            .and_then(|v| v.checked_add(u64::from(round_up)))
            .map(Self)
            .ok_or_else(overflow)
    }
}

impl fmt::Display for MicroAlgos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ALGO", self.to_algos_string())
    }
}

impl FromStr for MicroAlgos {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_algos_str(s)
    }
}

impl From<u64> for MicroAlgos {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Saturating sum; pool totals are display-only.
impl Sum for MicroAlgos {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| Self(acc.0.saturating_add(x.0)))
    }
}

impl<'a> Sum<&'a MicroAlgos> for MicroAlgos {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
