//! Sum-coded answer masks.
//!
//! A sum-coded answer is the sum of the option values a student marked, each
//! option being one of the binary weights 1, 2, 4, 8 and 16. The sum is
//! therefore a 5-bit mask in `0..=31`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Option weights of a sum-coded question, in ascending order.
pub const OPTION_WEIGHTS: [u8; 5] = [1, 2, 4, 8, 16];

/// Largest valid answer sum (all five options marked).
pub const MAX_MASK: u8 = 31;

/// A validated answer sum in `0..=31`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct AnswerMask(u8);

impl AnswerMask {
    /// The empty answer: no option marked.
    pub const EMPTY: AnswerMask = AnswerMask(0);

    /// Build a mask, rejecting values above 31.
    pub fn new(value: u8) -> Option<Self> {
        (value <= MAX_MASK).then_some(Self(value))
    }

    /// Build a mask from any stored integer, mapping out-of-range values to
    /// the empty mask.
    pub fn from_raw_lossy(value: u32) -> Self {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .unwrap_or(Self::EMPTY)
    }

    /// Build a mask from a set of option weights. Values that are not option
    /// weights are ignored.
    pub fn from_options(options: &[u8]) -> Self {
        let value = OPTION_WEIGHTS
            .iter()
            .filter(|w| options.contains(w))
            .fold(0u8, |acc, w| acc | w);
        Self(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the given option weight is marked.
    pub fn contains(self, weight: u8) -> bool {
        self.0 & weight == weight
    }

    /// Decompose into the marked option weights, ascending.
    pub fn options(self) -> Vec<u8> {
        OPTION_WEIGHTS
            .iter()
            .copied()
            .filter(|&w| self.contains(w))
            .collect()
    }

    /// Number of marked options.
    pub fn option_count(self) -> u32 {
        self.0.count_ones()
    }
}

impl fmt::Display for AnswerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for AnswerMask {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("answer {value} is outside 0..={MAX_MASK}"))
    }
}

impl From<AnswerMask> for u8 {
    fn from(mask: AnswerMask) -> Self {
        mask.0
    }
}

impl FromStr for AnswerMask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid answer: '{}'", s.trim()))?;
        Self::try_from(value)
    }
}
