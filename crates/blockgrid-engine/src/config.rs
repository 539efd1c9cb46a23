//! Tunable game rules.
//!
//! Every field has a default matching the standard game (5×5 board, three
//! lives, a 12 second countdown shrinking by half a second per level down to
//! 2.5 seconds), so a partial JSON document only needs the values it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Rules and dimensions used to build an [`Engine`](crate::Engine).
///
/// # Example
///
/// ```
/// use blockgrid_engine::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{ "initial_lives": 5 }"#).unwrap();
/// assert_eq!(config.initial_lives, 5);
/// assert_eq!(config.cols, 5);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cols: usize,
    pub rows: usize,
    pub initial_lives: u32,
    pub base_delay_ms: u64,
    pub delay_step_ms: u64,
    pub min_delay_ms: u64,
    pub points_per_level: u64,
    pub points_per_block: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cols: 5,
            rows: 5,
            initial_lives: 3,
            base_delay_ms: 12_000,
            delay_step_ms: 500,
            min_delay_ms: 2_500,
            points_per_level: 1_000,
            points_per_block: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("board must be at least 3x3, got {cols}x{rows}")]
    BoardTooSmall { cols: usize, rows: usize },
    #[display("board must be square, got {cols}x{rows}")]
    NonSquareBoard { cols: usize, rows: usize },
    #[display("initial lives must be at least 1")]
    NoLives,
    #[display("points per level must be at least 1")]
    ZeroPointsPerLevel,
    #[display("minimum delay {min_ms}ms exceeds base delay {base_ms}ms")]
    DelayFloorAboveBase { min_ms: u64, base_ms: u64 },
}

impl EngineConfig {
    /// Checks the invariants the engine relies on.
    ///
    /// Clear detection treats rows and columns symmetrically, so only square
    /// boards are accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Self { cols, rows, .. } = *self;
        if cols < 3 || rows < 3 {
            return Err(ConfigError::BoardTooSmall { cols, rows });
        }
        if cols != rows {
            return Err(ConfigError::NonSquareBoard { cols, rows });
        }
        if self.initial_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        if self.points_per_level == 0 {
            return Err(ConfigError::ZeroPointsPerLevel);
        }
        if self.min_delay_ms > self.base_delay_ms {
            return Err(ConfigError::DelayFloorAboveBase {
                min_ms: self.min_delay_ms,
                base_ms: self.base_delay_ms,
            });
        }
        Ok(())
    }

    /// Countdown length in milliseconds for the given level.
    #[must_use]
    pub fn countdown_delay_ms(&self, level: u64) -> u64 {
        self.base_delay_ms
            .saturating_sub(self.delay_step_ms.saturating_mul(level))
            .max(self.min_delay_ms)
    }

    #[must_use]
    pub fn countdown_delay(&self, level: u64) -> Duration {
        Duration::from_millis(self.countdown_delay_ms(level))
    }

    /// Returns a copy with every countdown length divided by `factor`.
    ///
    /// Used to run sessions faster than real time; lengths never drop below
    /// one millisecond.
    #[must_use]
    pub fn time_scaled(&self, factor: u64) -> Self {
        let factor = factor.max(1);
        let scale = |ms: u64| (ms / factor).max(1);
        Self {
            base_delay_ms: scale(self.base_delay_ms),
            delay_step_ms: self.delay_step_ms / factor,
            min_delay_ms: scale(self.min_delay_ms),
            ..self.clone()
        }
    }
}
