use std::collections::VecDeque;

use log::{debug, info, trace};

use crate::{
    CommandError, ConfigError, EngineConfig,
    core::{board::Board, piece::Piece},
};

use super::{
    countdown::{Countdown, CountdownExpired, CountdownTicket},
    event::GameEvent,
    game_stats::{GameStats, GameSummary},
    line_clear::{self, LineClear},
    piece_generator::{PieceGenerator, PieceSeed},
    scoring::ScoreState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum EngineState {
    /// Created, waiting for [`Engine::start`].
    Ready,
    Running,
    /// Terminal: every command is rejected.
    GameOver,
}

/// Result of a successful placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementOutcome {
    pub lines_cleared: usize,
    pub blocks_cleared: usize,
    pub points: u64,
    pub level_changed: bool,
}

/// What a countdown expiry did to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum ExpiryOutcome {
    /// A life was lost and the countdown re-armed.
    LifeLost { lives_remaining: u32 },
    /// The last life was lost.
    GameOver,
    /// The notification belongs to a countdown that was already replaced.
    Stale,
}

/// The placement/clear/scoring state machine.
///
/// The engine owns the board, the current and following pieces, the score
/// state and the countdown. All methods run on the caller's thread; expiry
/// notifications from the countdown must be passed back in through
/// [`countdown_expired`](Self::countdown_expired) on the same thread.
///
/// # Example
///
/// ```
/// use blockgrid_engine::{Engine, EngineConfig, ManualCountdown};
///
/// let countdown = ManualCountdown::new();
/// let mut engine = Engine::new(EngineConfig::default(), Box::new(countdown.clone())).unwrap();
/// engine.start().unwrap();
///
/// if let Some(&(x, y)) = engine.valid_placements().first() {
///     engine.attempt_placement(x, y).unwrap();
/// }
///
/// // Player took too long
/// let expired = countdown.expire().unwrap();
/// engine.countdown_expired(expired).unwrap();
/// assert_eq!(engine.lives(), 2);
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    board: Board,
    state: EngineState,
    current: Option<Piece>,
    following: Option<Piece>,
    scores: ScoreState,
    lives: u32,
    generator: PieceGenerator,
    countdown: Box<dyn Countdown>,
    armed: Option<CountdownTicket>,
    next_ticket: CountdownTicket,
    events: VecDeque<GameEvent>,
    stats: GameStats,
}

impl Engine {
    /// Creates an engine with a random piece seed.
    pub fn new(config: EngineConfig, countdown: Box<dyn Countdown>) -> Result<Self, ConfigError> {
        Self::with_generator(config, PieceGenerator::new(), countdown)
    }

    /// Like [`Self::new`], but with a fixed seed for a reproducible piece
    /// sequence.
    pub fn with_seed(
        config: EngineConfig,
        seed: PieceSeed,
        countdown: Box<dyn Countdown>,
    ) -> Result<Self, ConfigError> {
        Self::with_generator(config, PieceGenerator::with_seed(seed), countdown)
    }

    fn with_generator(
        config: EngineConfig,
        generator: PieceGenerator,
        countdown: Box<dyn Countdown>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            board: Board::new(config.cols, config.rows),
            state: EngineState::Ready,
            current: None,
            following: None,
            scores: ScoreState::new(&config),
            lives: config.initial_lives,
            generator,
            countdown,
            armed: None,
            next_ticket: CountdownTicket::FIRST,
            events: VecDeque::new(),
            stats: GameStats::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[must_use]
    pub fn current_piece(&self) -> Option<Piece> {
        self.current
    }

    #[must_use]
    pub fn following_piece(&self) -> Option<Piece> {
        self.following
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.scores.score()
    }

    #[must_use]
    pub fn level(&self) -> u64 {
        self.scores.level()
    }

    #[must_use]
    pub fn multiplier(&self) -> u64 {
        self.scores.multiplier()
    }

    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[must_use]
    pub fn countdown_delay_ms(&self) -> u64 {
        self.scores.countdown_delay_ms()
    }

    /// Ticket of the pending countdown.
    ///
    /// Changes whenever a new turn starts; `None` before start and after
    /// game over.
    #[must_use]
    pub fn armed_ticket(&self) -> Option<CountdownTicket> {
        self.armed
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.generator.seed()
    }

    #[must_use]
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            seed: self.seed(),
            score: self.score(),
            level: self.level(),
            lives: self.lives,
            multiplier: self.multiplier(),
            game_over: self.state.is_game_over(),
            stats: self.stats.clone(),
        }
    }

    /// Removes and returns every queued event, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    /// Lists every anchor at which the current piece fits, row by row.
    ///
    /// Empty unless the game is running.
    #[must_use]
    pub fn valid_placements(&self) -> Vec<(usize, usize)> {
        let Some(piece) = self.current.filter(|_| self.state.is_running()) else {
            return vec![];
        };
        (0..self.board.rows())
            .flat_map(|y| (0..self.board.cols()).map(move |x| (x, y)))
            .filter(|&(x, y)| self.board.can_place(piece, x, y))
            .collect()
    }

    /// Spawns the first two pieces and arms the countdown.
    pub fn start(&mut self) -> Result<(), CommandError> {
        match self.state {
            EngineState::Ready => {}
            EngineState::Running => return Err(CommandError::AlreadyStarted),
            EngineState::GameOver => return Err(CommandError::SessionEnded),
        }
        info!(
            "starting {}x{} game with seed {:?}",
            self.board.cols(),
            self.board.rows(),
            self.generator.seed()
        );
        self.state = EngineState::Running;
        self.current = Some(self.generator.next_piece());
        self.following = Some(self.generator.next_piece());
        self.emit_current();
        self.emit_following();
        self.arm_countdown();
        Ok(())
    }

    fn running_piece(&self) -> Result<Piece, CommandError> {
        match (self.state, self.current) {
            (EngineState::Running, Some(piece)) => Ok(piece),
            (EngineState::GameOver, _) => Err(CommandError::SessionEnded),
            _ => Err(CommandError::NotStarted),
        }
    }

    /// Places the current piece with its centre at `(x, y)`.
    ///
    /// On success, full lines are cleared, the score state is updated, the
    /// pieces advance and the countdown restarts. A rejected placement
    /// changes nothing.
    ///
    /// # Panics
    ///
    /// Panics if clear detection reports a cell outside the board, which
    /// would leave the board and the emitted event out of step.
    pub fn attempt_placement(
        &mut self,
        x: usize,
        y: usize,
    ) -> Result<PlacementOutcome, CommandError> {
        let piece = self.running_piece()?;
        if self.board.place(piece, x, y).is_err() {
            trace!("rejected {piece} at ({x}, {y})");
            self.stats.record_rejection();
            return Err(CommandError::PlacementRejected);
        }
        debug!("placed {piece} at ({x}, {y})");

        let clear = line_clear::detect_full_lines(&self.board);
        self.clear_lines(&clear);

        let update = self
            .scores
            .apply_clear(&self.config, clear.lines, clear.blocks());
        self.scores = update.state;
        self.stats.record_placement(clear.lines, clear.blocks());
        if update.level_changed {
            debug!(
                "level {} reached, countdown now {}ms",
                self.scores.level(),
                self.scores.countdown_delay_ms()
            );
            self.events.push_back(GameEvent::LevelChanged {
                level: self.scores.level(),
            });
        }

        self.advance_pieces();
        self.arm_countdown();

        Ok(PlacementOutcome {
            lines_cleared: clear.lines,
            blocks_cleared: clear.blocks(),
            points: update.points,
            level_changed: update.level_changed,
        })
    }

    fn clear_lines(&mut self, clear: &LineClear) {
        if clear.is_empty() {
            return;
        }
        debug!(
            "clearing {} lines ({} blocks)",
            clear.lines,
            clear.blocks()
        );
        self.board
            .clear(&clear.cells)
            .expect("detected lines should lie inside the board");
        self.events.push_back(GameEvent::LinesCleared {
            cells: clear.cells.clone(),
        });
    }

    /// Rotates the current piece by `quarter_turns` clockwise quarter turns.
    ///
    /// Does not restart the countdown.
    pub fn rotate_current(&mut self, quarter_turns: i32) -> Result<(), CommandError> {
        let piece = self.running_piece()?;
        self.current = Some(piece.rotated(quarter_turns));
        self.emit_current();
        Ok(())
    }

    /// Exchanges the current and following pieces without drawing a new one.
    pub fn swap_current(&mut self) -> Result<(), CommandError> {
        self.running_piece()?;
        std::mem::swap(&mut self.current, &mut self.following);
        self.emit_current();
        self.emit_following();
        Ok(())
    }

    /// Handles a countdown running out: one life is lost and the current
    /// piece is discarded.
    ///
    /// Notifications for a countdown that has since been re-armed are
    /// ignored.
    pub fn countdown_expired(
        &mut self,
        expired: CountdownExpired,
    ) -> Result<ExpiryOutcome, CommandError> {
        self.running_piece()?;
        if self.armed != Some(expired.ticket) {
            trace!("ignoring stale countdown {}", expired.ticket);
            return Ok(ExpiryOutcome::Stale);
        }
        self.armed = None;

        self.lives = self.lives.saturating_sub(1);
        self.stats.record_life_loss();
        self.advance_pieces();
        self.scores.reset_multiplier();
        debug!("countdown expired, {} lives left", self.lives);

        if self.lives > 0 {
            self.arm_countdown();
            return Ok(ExpiryOutcome::LifeLost {
                lives_remaining: self.lives,
            });
        }

        self.state = EngineState::GameOver;
        self.countdown.cancel();
        self.events.push_back(GameEvent::CountdownArmed {
            delay_ms: self.scores.countdown_delay_ms(),
            lives_remaining: 0,
        });
        self.events.push_back(GameEvent::GameOver {
            score: self.scores.score(),
        });
        info!("game over with score {}", self.scores.score());
        Ok(ExpiryOutcome::GameOver)
    }

    fn advance_pieces(&mut self) {
        let next = self.generator.next_piece();
        self.current = self.following.replace(next);
        self.emit_current();
        self.emit_following();
    }

    fn arm_countdown(&mut self) {
        let ticket = self.next_ticket;
        self.next_ticket = ticket.next();
        self.armed = Some(ticket);
        let delay_ms = self.scores.countdown_delay_ms();
        debug!("arming countdown {ticket} for {delay_ms}ms");
        self.countdown
            .arm(ticket, self.config.countdown_delay(self.scores.level()));
        self.events.push_back(GameEvent::CountdownArmed {
            delay_ms,
            lives_remaining: self.lives,
        });
    }

    fn emit_current(&mut self) {
        if let Some(piece) = self.current {
            self.events
                .push_back(GameEvent::CurrentPieceChanged { piece });
        }
    }

    fn emit_following(&mut self) {
        if let Some(piece) = self.following {
            self.events
                .push_back(GameEvent::FollowingPieceChanged { piece });
        }
    }
}
