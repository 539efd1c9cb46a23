use serde::{Deserialize, Serialize};

use crate::engine::piece_generator::PieceSeed;

/// Running totals for one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    placements: u64,
    lines_cleared: u64,
    blocks_cleared: u64,
    forced_life_losses: u64,
    rejected_placements: u64,
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            placements: 0,
            lines_cleared: 0,
            blocks_cleared: 0,
            forced_life_losses: 0,
            rejected_placements: 0,
        }
    }

    /// Number of pieces placed on the board.
    #[must_use]
    pub const fn placements(&self) -> u64 {
        self.placements
    }

    #[must_use]
    pub const fn lines_cleared(&self) -> u64 {
        self.lines_cleared
    }

    #[must_use]
    pub const fn blocks_cleared(&self) -> u64 {
        self.blocks_cleared
    }

    /// Number of lives lost to the countdown.
    #[must_use]
    pub const fn forced_life_losses(&self) -> u64 {
        self.forced_life_losses
    }

    #[must_use]
    pub const fn rejected_placements(&self) -> u64 {
        self.rejected_placements
    }

    pub(crate) fn record_placement(&mut self, lines: usize, blocks: usize) {
        self.placements += 1;
        self.lines_cleared += lines as u64;
        self.blocks_cleared += blocks as u64;
    }

    pub(crate) fn record_rejection(&mut self) {
        self.rejected_placements += 1;
    }

    pub(crate) fn record_life_loss(&mut self) {
        self.forced_life_losses += 1;
    }
}

/// Final or intermediate state of a game, ready to hand to a persistence
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub seed: PieceSeed,
    pub score: u64,
    pub level: u64,
    pub lives: u32,
    pub multiplier: u64,
    pub game_over: bool,
    pub stats: GameStats,
}
