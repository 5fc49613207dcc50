//! Report relevance and vote scoring.
//!
//! The score shrinks the observed like ratio toward a prior, weighting the
//! observation by `total / (total + min)`, then rescales `[0, 1]` to
//! `[-1, 1]`. The relevance timestamp keeps a report live for as long as it
//! keeps receiving positive reactions.

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;

/// Score and relevance timestamp written back after a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportScore {
    /// Smoothed score in [-1, 1].
    pub score: f64,
    /// Unix seconds; later of creation and the latest positive reaction.
    pub relevant_at: i64,
}

/// One reaction to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub positive: bool,
    /// Unix seconds.
    pub date: i64,
}

/// Aggregate of all reactions on one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTally {
    pub likes: u32,
    pub dislikes: u32,
    /// Unix seconds of the most recent positive reaction.
    pub latest_positive: Option<i64>,
}

impl ReactionTally {
    pub fn from_reactions<'a>(reactions: impl IntoIterator<Item = &'a Reaction>) -> Self {
        reactions.into_iter().fold(Self::default(), |mut tally, r| {
            if r.positive {
                tally.likes += 1;
                tally.latest_positive = Some(tally.latest_positive.map_or(r.date, |d| d.max(r.date)));
            } else {
                tally.dislikes += 1;
            }
            tally
        })
    }

    pub fn total(&self) -> u32 {
        self.likes + self.dislikes
    }
}

/// Vote-smoothing model.
#[derive(Debug, Clone, Copy)]
pub struct ScoringModel {
    minimum_votes: u32,
    mean: f64,
}

impl ScoringModel {
    pub fn new(minimum_votes: u32, mean: f64) -> Self {
        Self {
            minimum_votes,
            mean,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.minimum_votes, config.mean)
    }

    /// Score of a report with no usable evidence.
    pub fn prior(&self) -> f64 {
        2.0 * self.mean - 1.0
    }

    /// Smoothed score for `likes` out of `total` reactions.
    pub fn score(&self, likes: u32, total: u32) -> f64 {
        if total == 0 || total < self.minimum_votes {
            return self.prior();
        }
        let likes = likes.min(total) as f64;
        let total = total as f64;
        let min = self.minimum_votes as f64;

        let relative = likes / total;
        let shifted = (total / (total + min)) * relative + (min / (total + min)) * self.mean;
        (2.0 * shifted - 1.0).clamp(-1.0, 1.0)
    }

    /// Recompute score and relevance timestamp for a report.
    pub fn recompute(&self, created_at: i64, tally: &ReactionTally) -> ReportScore {
        ReportScore {
            score: self.score(tally.likes, tally.total()),
            relevant_at: relevance_timestamp(created_at, tally.latest_positive),
        }
    }
}

/// Later of the creation time and the latest positive reaction.
pub fn relevance_timestamp(created_at: i64, latest_positive: Option<i64>) -> i64 {
    latest_positive.map_or(created_at, |t| t.max(created_at))
}

/// Whether a report is still live at `now` given a window in seconds.
pub fn is_live(relevant_at: i64, now: i64, window_secs: i64) -> bool {
    now - relevant_at < window_secs
}
