//! Game rules and the machinery that drives them.
//!
//! - [`Engine`] - placement, clearing, scoring, lives and the piece queue
//! - [`ScoreState`] - score, level, multiplier and countdown length
//! - [`detect_full_lines`] - finds full rows and columns
//! - [`PieceGenerator`] - seeded uniform piece draws
//! - [`Countdown`] - single-shot timers ([`ThreadCountdown`], [`ManualCountdown`])
//! - [`GameSession`] - runs an engine from a command channel on one thread
//! - [`GameEvent`] - notifications for display and audio collaborators
//!
//! # Game Flow
//!
//! 1. [`Engine::start`] spawns the current and following pieces and arms the
//!    countdown
//! 2. The player rotates or swaps the current piece and picks a cell
//! 3. A successful placement clears full lines, scores them, advances the
//!    pieces and re-arms the countdown
//! 4. If the countdown runs out first, a life is lost and the current piece is
//!    discarded
//! 5. The game ends when the last life is lost
//!
//! Headless callers drive the engine directly with a [`ManualCountdown`];
//! interactive ones hand it to a [`GameSession`].

pub use self::{
    countdown::*, event::*, game::*, game_stats::*, line_clear::*, piece_generator::*,
    scoring::*, session::*,
};

mod countdown;
mod event;
mod game;
mod game_stats;
mod line_clear;
mod piece_generator;
mod scoring;
mod session;
