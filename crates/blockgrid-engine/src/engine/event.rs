use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::{board::CellCoord, piece::Piece};

/// Notifications emitted by the [`Engine`](crate::Engine) for its
/// collaborators (display, audio, persistence).
///
/// Events are queued in the order they happen and drained with
/// [`Engine::drain_events`](crate::Engine::drain_events).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The current piece was spawned, advanced, rotated or swapped.
    CurrentPieceChanged { piece: Piece },
    /// The following piece was spawned, advanced or swapped.
    FollowingPieceChanged { piece: Piece },
    /// Full lines were removed from the board. The board is already cleared.
    LinesCleared { cells: BTreeSet<CellCoord> },
    LevelChanged { level: u64 },
    /// The countdown was (re)started.
    ///
    /// Also emitted once with `lives_remaining == 0` when the game ends; that
    /// countdown is never actually started.
    CountdownArmed { delay_ms: u64, lives_remaining: u32 },
    GameOver { score: u64 },
}
