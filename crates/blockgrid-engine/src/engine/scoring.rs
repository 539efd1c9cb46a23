use serde::{Deserialize, Serialize};

use crate::EngineConfig;

/// Score, level, multiplier and the countdown length derived from the level.
///
/// The values move together: `level` is always `score / points_per_level`
/// and `countdown_delay_ms` always follows `level`, so the whole tuple is a
/// pure function of the previous tuple and each placement's clear result.
///
/// # Example
///
/// ```
/// use blockgrid_engine::{EngineConfig, ScoreState};
///
/// let config = EngineConfig::default();
/// let state = ScoreState::new(&config);
///
/// // One row of five cells on an empty multiplier
/// let update = state.apply_clear(&config, 1, 5);
/// assert_eq!(update.points, 50);
/// assert_eq!(update.state.multiplier(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    score: u64,
    level: u64,
    multiplier: u64,
    countdown_delay_ms: u64,
}

/// Result of applying one placement to a [`ScoreState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub state: ScoreState,
    pub points: u64,
    pub level_changed: bool,
}

impl ScoreState {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::from_score(config, 0)
    }

    /// Builds the state a game would be in with `score` points and a fresh
    /// multiplier.
    #[must_use]
    pub fn from_score(config: &EngineConfig, score: u64) -> Self {
        let level = score / config.points_per_level;
        Self {
            score,
            level,
            multiplier: 1,
            countdown_delay_ms: config.countdown_delay_ms(level),
        }
    }

    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub const fn level(&self) -> u64 {
        self.level
    }

    #[must_use]
    pub const fn multiplier(&self) -> u64 {
        self.multiplier
    }

    #[must_use]
    pub const fn countdown_delay_ms(&self) -> u64 {
        self.countdown_delay_ms
    }

    /// Applies the result of clear detection after a successful placement.
    ///
    /// Points are `lines * blocks * points_per_block * multiplier`. The
    /// multiplier then grows by one if anything was cleared and resets to one
    /// otherwise. Level and countdown length are recomputed last.
    #[must_use]
    pub fn apply_clear(self, config: &EngineConfig, lines: usize, blocks: usize) -> ScoreUpdate {
        let points = (lines as u64)
            .saturating_mul(blocks as u64)
            .saturating_mul(config.points_per_block)
            .saturating_mul(self.multiplier);
        let score = self.score.saturating_add(points);
        let multiplier = if lines > 0 { self.multiplier + 1 } else { 1 };

        let level = score / config.points_per_level;
        let level_changed = level != self.level;
        let countdown_delay_ms = if level_changed {
            config.countdown_delay_ms(level)
        } else {
            self.countdown_delay_ms
        };

        ScoreUpdate {
            state: Self {
                score,
                level,
                multiplier,
                countdown_delay_ms,
            },
            points,
            level_changed,
        }
    }

    /// Drops the multiplier back to one, as after a forced life loss.
    pub fn reset_multiplier(&mut self) {
        self.multiplier = 1;
    }
}
