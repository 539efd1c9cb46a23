use std::io;

use crossbeam_channel::{Receiver, select};
use log::{debug, info};

use crate::{CommandError, ConfigError, EngineConfig};

use super::{
    countdown::{CountdownExpired, CountdownTicket, ThreadCountdown},
    event::GameEvent,
    game::Engine,
    game_stats::GameSummary,
    piece_generator::{PieceGenerator, PieceSeed},
};

/// A player action delivered to a running [`GameSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Place { x: usize, y: usize },
    Rotate(i32),
    Swap,
}

/// A command bound to the turn it was issued for.
///
/// The turn is identified by [`Engine::armed_ticket`]. If that turn has
/// already ended when the command arrives, the command is dropped instead of
/// being applied to the next piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnCommand {
    pub ticket: Option<CountdownTicket>,
    pub command: SessionCommand,
}

impl TurnCommand {
    #[must_use]
    pub const fn for_turn(ticket: CountdownTicket, command: SessionCommand) -> Self {
        Self {
            ticket: Some(ticket),
            command,
        }
    }
}

impl From<SessionCommand> for TurnCommand {
    fn from(command: SessionCommand) -> Self {
        Self {
            ticket: None,
            command,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SessionError {
    #[display("invalid engine config")]
    Config(#[error(source)] ConfigError),
    #[display("failed to start countdown worker")]
    Spawn(#[error(source)] io::Error),
}

/// Drives an [`Engine`] from a command channel and a [`ThreadCountdown`].
///
/// Player commands and countdown expiries are both consumed on the thread
/// that calls [`run`](Self::run), so the engine is only ever mutated from one
/// place.
#[derive(Debug)]
pub struct GameSession {
    engine: Engine,
    expirations: Receiver<CountdownExpired>,
}

impl GameSession {
    /// Builds a session whose countdown runs on a worker thread.
    ///
    /// A random seed is used when `seed` is `None`.
    pub fn threaded(config: EngineConfig, seed: Option<PieceSeed>) -> Result<Self, SessionError> {
        let (countdown, expirations) = ThreadCountdown::spawn()?;
        let seed = seed.unwrap_or_else(|| PieceGenerator::new().seed());
        let engine = Engine::with_seed(config, seed, Box::new(countdown))?;
        Ok(Self {
            engine,
            expirations,
        })
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Starts the game and processes input until it ends.
    ///
    /// Every event is passed to `on_event` together with the engine state
    /// right after the command that produced it. Rejected commands are
    /// logged and otherwise ignored.
    ///
    /// Commands are either plain [`SessionCommand`]s or [`TurnCommand`]s;
    /// the latter are dropped once their turn is over.
    ///
    /// Returns when the game is over or when the command channel is closed,
    /// whichever happens first.
    pub fn run<C, F>(
        self,
        commands: &Receiver<C>,
        mut on_event: F,
    ) -> Result<GameSummary, CommandError>
    where
        C: Into<TurnCommand>,
        F: FnMut(&Engine, GameEvent),
    {
        let Self {
            mut engine,
            expirations,
        } = self;

        engine.start()?;
        flush_events(&mut engine, &mut on_event);

        while engine.state().is_running() {
            select! {
                recv(commands) -> command => {
                    let Ok(command) = command else {
                        info!("command channel closed, leaving session");
                        break;
                    };
                    let TurnCommand { ticket, command } = command.into();
                    if ticket.is_some_and(|t| engine.armed_ticket() != Some(t)) {
                        debug!("dropping {command:?} issued for an earlier turn");
                    } else if let Err(e) = apply_command(&mut engine, command) {
                        debug!("{command:?} rejected: {e}");
                    }
                }
                recv(expirations) -> expired => {
                    let Ok(expired) = expired else {
                        info!("countdown worker stopped, leaving session");
                        break;
                    };
                    engine.countdown_expired(expired)?;
                }
            }
            flush_events(&mut engine, &mut on_event);
        }

        Ok(engine.summary())
    }
}

fn apply_command(engine: &mut Engine, command: SessionCommand) -> Result<(), CommandError> {
    match command {
        SessionCommand::Place { x, y } => engine.attempt_placement(x, y).map(|_| ()),
        SessionCommand::Rotate(quarter_turns) => engine.rotate_current(quarter_turns),
        SessionCommand::Swap => engine.swap_current(),
    }
}

fn flush_events<F>(engine: &mut Engine, on_event: &mut F)
where
    F: FnMut(&Engine, GameEvent),
{
    let events = engine.drain_events().collect::<Vec<_>>();
    for event in events {
        on_event(engine, event);
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    fn fast_config(initial_lives: u32) -> EngineConfig {
        EngineConfig {
            initial_lives,
            base_delay_ms: 20,
            delay_step_ms: 0,
            min_delay_ms: 20,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = EngineConfig {
            initial_lives: 0,
            ..EngineConfig::default()
        };
        let err = GameSession::threaded(config, None).unwrap_err();
        assert!(matches!(err, SessionError::Config(ConfigError::NoLives)));
    }

    #[test]
    fn test_countdown_runs_game_to_the_end() {
        let session = GameSession::threaded(fast_config(2), Some(PieceSeed::from_u128(1))).unwrap();
        let (_commands_tx, commands) = crossbeam_channel::unbounded::<SessionCommand>();

        let mut events = vec![];
        let summary = session
            .run(&commands, |_, event| events.push(event))
            .unwrap();

        assert!(summary.game_over);
        assert_eq!(summary.lives, 0);
        assert_eq!(summary.stats.forced_life_losses(), 2);
        assert_eq!(events.last(), Some(&GameEvent::GameOver { score: 0 }));
    }

    #[test]
    fn test_closed_command_channel_ends_session() {
        let session = GameSession::threaded(EngineConfig::default(), None).unwrap();
        let (commands_tx, commands) = crossbeam_channel::unbounded();
        commands_tx.send(SessionCommand::Swap).unwrap();
        commands_tx.send(SessionCommand::Rotate(1)).unwrap();
        drop(commands_tx);

        let mut events = vec![];
        let summary = session
            .run(&commands, |_, event| events.push(event))
            .unwrap();

        assert!(!summary.game_over);
        assert_eq!(summary.lives, 3);
        // start: current, following, armed; swap: current, following; rotate: current
        assert_eq!(events.len(), 6);
        assert!(events[5].is_current_piece_changed());
    }

    #[test]
    fn test_commands_are_applied_in_order() {
        let session = GameSession::threaded(EngineConfig::default(), Some(PieceSeed::from_u128(9)))
            .unwrap();
        assert_eq!(session.engine().config(), &EngineConfig::default());

        let (commands_tx, commands) = crossbeam_channel::unbounded();
        let sender = thread::spawn(move || {
            for _ in 0..4 {
                commands_tx.send(SessionCommand::Rotate(1)).unwrap();
                thread::sleep(Duration::from_millis(1));
            }
        });

        let mut rotations = vec![];
        let summary = session
            .run(&commands, |engine, event| {
                if let GameEvent::CurrentPieceChanged { piece } = event {
                    assert_eq!(engine.current_piece(), Some(piece));
                    rotations.push(piece);
                }
            })
            .unwrap();
        sender.join().unwrap();

        // Initial spawn plus four quarter turns back to the spawn orientation
        assert_eq!(rotations.len(), 5);
        assert_eq!(rotations[0], rotations[4]);
        assert_eq!(rotations[1], rotations[0].rotated(1));
        assert!(!summary.game_over);
    }

    #[test]
    fn test_rejected_placement_keeps_session_alive() {
        let session = GameSession::threaded(EngineConfig::default(), None).unwrap();
        let (commands_tx, commands) = crossbeam_channel::unbounded();
        commands_tx
            .send(SessionCommand::Place { x: 99, y: 99 })
            .unwrap();
        drop(commands_tx);

        let summary = session.run(&commands, |_, _| {}).unwrap();
        assert_eq!(summary.stats.rejected_placements(), 1);
        assert_eq!(summary.stats.placements(), 0);
        assert_eq!(summary.score, 0);
    }

    #[test]
    fn test_placements_reach_the_board() {
        let session = GameSession::threaded(EngineConfig::default(), Some(PieceSeed::from_u128(3)))
            .unwrap();
        let (commands_tx, commands) = crossbeam_channel::unbounded();
        // Every piece fits centred on an empty 5x5 board
        commands_tx.send(SessionCommand::Place { x: 2, y: 2 }).unwrap();
        drop(commands_tx);

        let mut placed = None;
        let summary = session
            .run(&commands, |engine, event| {
                if event.is_current_piece_changed() && engine.stats().placements() == 1 {
                    placed = Some(engine.board().clone());
                }
            })
            .unwrap();

        assert_eq!(summary.stats.placements(), 1);
        assert!(!placed.unwrap().is_empty());
    }

    #[test]
    fn test_commands_for_finished_turn_are_dropped() {
        let session = GameSession::threaded(EngineConfig::default(), Some(PieceSeed::from_u128(4)))
            .unwrap();
        let (commands_tx, commands) = crossbeam_channel::unbounded();
        let first_turn = CountdownTicket::FIRST;
        let centre = SessionCommand::Place { x: 2, y: 2 };
        // Not started yet
        commands_tx
            .send(TurnCommand::for_turn(first_turn.next(), centre))
            .unwrap();
        // Current turn
        commands_tx
            .send(TurnCommand::for_turn(first_turn, centre))
            .unwrap();
        // The placement above ended the first turn
        commands_tx
            .send(TurnCommand::for_turn(first_turn, SessionCommand::Swap))
            .unwrap();
        commands_tx
            .send(TurnCommand::for_turn(first_turn, centre))
            .unwrap();
        drop(commands_tx);

        let mut following_changes = 0;
        let summary = session
            .run(&commands, |_, event| {
                if event.is_following_piece_changed() {
                    following_changes += 1;
                }
            })
            .unwrap();

        assert_eq!(summary.stats.placements(), 1);
        assert_eq!(summary.stats.rejected_placements(), 0);
        // Start and the one placement; the stale swap never ran
        assert_eq!(following_changes, 2);
    }
}
