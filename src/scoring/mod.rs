//! Risk scoring
//!
//! Maps a per-severity tally to an integer risk score in `0..=10`.
//!
//! # Scoring Formula
//!
//! ```text
//! points = 4 × HIGH + 2 × MEDIUM + 1 × LOW
//! raw    = min(points / 24 × 10, 10)
//! score  = round(raw)
//! ```
//!
//! The ceiling of 24 points means six HIGH findings (or any equivalent mix)
//! already saturate the score.
//!
//! # Rounding
//!
//! `raw` lands exactly on `.5` for some tallies (e.g. 6 points → 2.5). The
//! tie-break is configurable:
//!
//! - `half-up` (default): 2.5 → 3
//! - `half-even`: 2.5 → 2, 7.5 → 8 (banker's rounding, matches older reports)
//!
//! The computation is done in integers so ties are detected exactly.

use crate::models::ScoreTally;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Points at which the score saturates
pub const SCORE_CEILING_POINTS: u64 = 24;

/// Highest possible score
pub const MAX_SCORE: u8 = 10;

/// How to round a score that falls exactly halfway between two integers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    #[default]
    HalfUp,
    HalfEven,
}

impl FromStr for RoundingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "half-up" => Ok(RoundingMode::HalfUp),
            "half-even" | "bankers" => Ok(RoundingMode::HalfEven),
            _ => Err(anyhow::anyhow!(
                "Unknown rounding mode '{}'. Valid modes: half-up, half-even",
                s
            )),
        }
    }
}

impl std::fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundingMode::HalfUp => write!(f, "half-up"),
            RoundingMode::HalfEven => write!(f, "half-even"),
        }
    }
}

/// Converts tallies into 0-10 risk scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scorer {
    rounding: RoundingMode,
}

impl Scorer {
    pub fn new(rounding: RoundingMode) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    pub fn score(&self, tally: &ScoreTally) -> u8 {
        let points = tally.points();
        if points >= SCORE_CEILING_POINTS {
            return MAX_SCORE;
        }

        // raw = points * 10 / 24, as quotient + remainder
        let numerator = points * u64::from(MAX_SCORE);
        let quotient = numerator / SCORE_CEILING_POINTS;
        let twice_remainder = 2 * (numerator % SCORE_CEILING_POINTS);

        let round_up = match self.rounding {
            RoundingMode::HalfUp => twice_remainder >= SCORE_CEILING_POINTS,
            RoundingMode::HalfEven => {
                twice_remainder > SCORE_CEILING_POINTS
                    || (twice_remainder == SCORE_CEILING_POINTS && quotient % 2 == 1)
            }
        };

        let rounded = if round_up { quotient + 1 } else { quotient };
        rounded.min(u64::from(MAX_SCORE)) as u8
    }

    /// Unrounded score, for explanations
    pub fn raw_score(&self, tally: &ScoreTally) -> f64 {
        let raw = tally.points() as f64 / SCORE_CEILING_POINTS as f64 * f64::from(MAX_SCORE);
        raw.min(f64::from(MAX_SCORE))
    }
}
