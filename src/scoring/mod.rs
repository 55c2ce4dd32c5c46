//! Heuristic member credit scoring.

pub mod assembler;
pub mod factors;
pub mod scorer;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{LendingError, Result};

pub use assembler::{score_member, FactorAssembler, InMemoryDirectory, LoanSummary, MemberDirectory, MemberRecords};
pub use factors::{CreditScoreFactors, LoanRecord, SavingsRecord};
pub use scorer::{compute_score, CreditScorer, ScoreBreakdown};

/// integer credit score on the 300 to 850 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CreditScore(u32);

impl CreditScore {
    pub const MIN: u32 = 300;
    pub const MAX: u32 = 850;
    pub const NEUTRAL: u32 = 500;

    pub fn new(value: u32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(LendingError::InvalidCreditScore {
                value,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(CreditScore(value))
    }

    /// default stand-in when a member's history cannot be resolved
    pub fn neutral() -> Self {
        CreditScore(Self::NEUTRAL)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CreditScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for CreditScore {
    type Error = LendingError;

    fn try_from(value: u32) -> Result<Self> {
        CreditScore::new(value)
    }
}

impl From<CreditScore> for u32 {
    fn from(score: CreditScore) -> u32 {
        score.0
    }
}
