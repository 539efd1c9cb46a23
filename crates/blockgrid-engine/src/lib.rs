//! Rules engine for a single-player grid-placement puzzle.
//!
//! The player holds a current and a following piece and places the current
//! one onto a square board. Completed rows and columns are cleared, the score
//! grows under a multiplier, and a level-dependent countdown costs a life
//! whenever the player takes too long.
//!
//! - [`core`] - board and piece catalog (pure data)
//! - [`engine`] - placement/scoring state machine, countdown scheduler and
//!   the session driver that serialises every mutation onto one thread
//! - [`config`] - tunable rules

pub use self::{config::*, core::*, engine::*};

pub mod config;
pub mod core;
pub mod engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("piece colliding with occupied cell or board edge")]
pub struct PieceCollisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("cell ({x}, {y}) is outside the {cols}x{rows} board")]
pub struct OutOfBoundsError {
    pub x: usize,
    pub y: usize,
    pub cols: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("piece index {index} is outside the catalog")]
pub struct InvalidPieceIndexError {
    pub index: usize,
}

/// Reasons a command sent to the [`Engine`] has no effect.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::Error,
    derive_more::IsVariant,
)]
pub enum CommandError {
    #[display("piece does not fit at the requested position")]
    PlacementRejected,
    #[display("game has not been started")]
    NotStarted,
    #[display("game has already been started")]
    AlreadyStarted,
    #[display("game is over")]
    SessionEnded,
}
