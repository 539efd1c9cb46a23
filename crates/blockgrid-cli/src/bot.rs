//! Greedy one-step player used by the headless and live modes.
//!
//! Every rotation of both the current and the following piece is tried at
//! every anchor. Each candidate is scored on a scratch copy of the board and
//! the best one wins:
//!
//! 1. points the placement would clear (`lines * blocks`)
//! 2. how close the remaining rows and columns are to full (sum of squared
//!    fill counts)
//! 3. turns without a swap, then fewer rotations
//!
//! Nothing looks further ahead than the current turn.

use blockgrid_engine::{
    Board, CommandError, Engine, Piece, PlacementOutcome, SessionCommand, detect_full_lines,
};

/// A complete action for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TurnPlan {
    pub(crate) use_swap: bool,
    pub(crate) quarter_turns: i32,
    pub(crate) x: usize,
    pub(crate) y: usize,
}

impl TurnPlan {
    /// Commands that carry out this plan through a session.
    pub(crate) fn commands(&self) -> Vec<SessionCommand> {
        let mut commands = Vec::with_capacity(3);
        if self.use_swap {
            commands.push(SessionCommand::Swap);
        }
        if self.quarter_turns != 0 {
            commands.push(SessionCommand::Rotate(self.quarter_turns));
        }
        commands.push(SessionCommand::Place {
            x: self.x,
            y: self.y,
        });
        commands
    }

    /// Applies this plan directly to an engine.
    pub(crate) fn apply(&self, engine: &mut Engine) -> Result<PlacementOutcome, CommandError> {
        if self.use_swap {
            engine.swap_current()?;
        }
        if self.quarter_turns != 0 {
            engine.rotate_current(self.quarter_turns)?;
        }
        engine.attempt_placement(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PlanScore {
    points: usize,
    fill: usize,
    no_swap: bool,
    fewer_turns: i32,
}

/// Picks the best plan for the engine's current turn.
///
/// Returns `None` when neither piece fits anywhere.
pub(crate) fn select_best_turn(engine: &Engine) -> Option<TurnPlan> {
    let board = engine.board();
    let candidates = [
        (false, engine.current_piece()?),
        (true, engine.following_piece()?),
    ];

    let mut best: Option<(PlanScore, TurnPlan)> = None;
    for (use_swap, piece) in candidates {
        for quarter_turns in 0..4 {
            let piece = piece.rotated(quarter_turns);
            for y in 0..board.rows() {
                for x in 0..board.cols() {
                    let Some(score) = score_placement(board, piece, x, y) else {
                        continue;
                    };
                    let score = PlanScore {
                        no_swap: !use_swap,
                        fewer_turns: -quarter_turns,
                        ..score
                    };
                    if best.is_none_or(|(best_score, _)| score > best_score) {
                        let plan = TurnPlan {
                            use_swap,
                            quarter_turns,
                            x,
                            y,
                        };
                        best = Some((score, plan));
                    }
                }
            }
        }
    }

    best.map(|(_, plan)| plan)
}

fn score_placement(board: &Board, piece: Piece, x: usize, y: usize) -> Option<PlanScore> {
    let mut board = board.clone();
    board.place(piece, x, y).ok()?;
    let clear = detect_full_lines(&board);
    board.clear(&clear.cells).ok()?;

    let columns = (0..board.cols()).map(|x| board.column_fill(x));
    let rows = (0..board.rows()).map(|y| board.row_fill(y));
    let fill = columns.chain(rows).map(|n| n * n).sum();

    Some(PlanScore {
        points: clear.lines * clear.blocks(),
        fill,
        no_swap: true,
        fewer_turns: 0,
    })
}
