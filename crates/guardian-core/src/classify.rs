//! Recommendation classifier
//!
//! Maps a risk score onto the three approval outcomes. Boundaries are
//! inclusive at the lower end of each band:
//! `[0, manual_review)` approve, `[manual_review, auto_reject)` review,
//! `[auto_reject, 100]` reject.

use crate::error::{Error, Result};
use crate::models::Recommendation;
use crate::policy::Thresholds;
use crate::rules::MAX_SCORE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classifier {
    thresholds: Thresholds,
}

impl Classifier {
    /// Build a classifier, rejecting inverted or out-of-range cutoffs
    pub fn new(thresholds: Thresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Classify a score
    ///
    /// Scores above 100 are an upstream bug and are reported, not clamped.
    pub fn classify(&self, score: u32) -> Result<Recommendation> {
        if score > MAX_SCORE {
            return Err(Error::InvalidInput(format!(
                "risk score {} is outside 0-{}",
                score, MAX_SCORE
            )));
        }

        Ok(if score >= self.thresholds.auto_reject {
            Recommendation::AutoReject
        } else if score >= self.thresholds.manual_review {
            Recommendation::ManualReview
        } else {
            Recommendation::AutoApprove
        })
    }
}
