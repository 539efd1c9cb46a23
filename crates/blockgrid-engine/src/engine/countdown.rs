//! Single-shot countdown timers.
//!
//! The [`Engine`](crate::Engine) arms a countdown after every turn. When it
//! runs out, the timer hands a [`CountdownExpired`] notification back to the
//! thread that owns the engine, which feeds it to
//! [`Engine::countdown_expired`](crate::Engine::countdown_expired). Timers
//! never touch engine state themselves.
//!
//! - [`ThreadCountdown`] waits on a dedicated worker thread and delivers
//!   notifications over a channel.
//! - [`ManualCountdown`] only records what was armed; the owner decides when
//!   it expires. Used by headless simulation and tests.

use std::{
    fmt, io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};

/// Identifies one arming of a countdown.
///
/// Tickets increase with every arm, so a notification carrying an older
/// ticket belongs to a countdown that has since been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CountdownTicket(u64);

impl CountdownTicket {
    pub const FIRST: Self = Self(0);

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CountdownTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notification that the countdown armed with `ticket` ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownExpired {
    pub ticket: CountdownTicket,
}

/// A single-shot timer owned by the engine.
///
/// Arming replaces whatever was pending; at most one countdown is outstanding.
pub trait Countdown: fmt::Debug + Send {
    fn arm(&mut self, ticket: CountdownTicket, delay: Duration);
    fn cancel(&mut self);
}

enum TimerCommand {
    Arm {
        ticket: CountdownTicket,
        delay: Duration,
    },
    Cancel,
    Shutdown,
}

/// Countdown backed by a worker thread.
///
/// The worker sleeps until the pending deadline or the next command,
/// whichever comes first. Dropping the countdown stops the worker.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use blockgrid_engine::{Countdown as _, CountdownTicket, ThreadCountdown};
///
/// let (mut countdown, expirations) = ThreadCountdown::spawn().unwrap();
/// countdown.arm(CountdownTicket::FIRST, Duration::from_millis(5));
///
/// let expired = expirations.recv_timeout(Duration::from_secs(5)).unwrap();
/// assert_eq!(expired.ticket, CountdownTicket::FIRST);
/// ```
pub struct ThreadCountdown {
    commands: Sender<TimerCommand>,
    worker: Option<JoinHandle<()>>,
}

impl fmt::Debug for ThreadCountdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadCountdown")
            .field("running", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}

impl ThreadCountdown {
    /// Starts the worker thread.
    ///
    /// Returns the countdown and the receiving end of its expiry
    /// notifications.
    pub fn spawn() -> io::Result<(Self, Receiver<CountdownExpired>)> {
        let (commands, command_rx) = crossbeam_channel::unbounded();
        let (expired_tx, expired_rx) = crossbeam_channel::unbounded();
        let worker = thread::Builder::new()
            .name("countdown".into())
            .spawn(move || run_timer(&command_rx, &expired_tx))?;
        let countdown = Self {
            commands,
            worker: Some(worker),
        };
        Ok((countdown, expired_rx))
    }

    fn send(&self, command: TimerCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("countdown worker has stopped");
        }
    }
}

impl Countdown for ThreadCountdown {
    fn arm(&mut self, ticket: CountdownTicket, delay: Duration) {
        self.send(TimerCommand::Arm { ticket, delay });
    }

    fn cancel(&mut self) {
        self.send(TimerCommand::Cancel);
    }
}

impl Drop for ThreadCountdown {
    fn drop(&mut self) {
        let _ = self.commands.send(TimerCommand::Shutdown);
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::error!("countdown worker panicked");
        }
    }
}

fn run_timer(commands: &Receiver<TimerCommand>, expired: &Sender<CountdownExpired>) {
    let mut pending: Option<(CountdownTicket, Instant)> = None;
    loop {
        let command = match pending {
            Some((ticket, deadline)) => match commands.recv_deadline(deadline) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => {
                    pending = None;
                    log::trace!("countdown {ticket} expired");
                    if expired.send(CountdownExpired { ticket }).is_err() {
                        return;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match commands.recv() {
                Ok(command) => command,
                Err(_) => return,
            },
        };

        match command {
            TimerCommand::Arm { ticket, delay } => {
                pending = Some((ticket, Instant::now() + delay));
            }
            TimerCommand::Cancel => pending = None,
            TimerCommand::Shutdown => return,
        }
    }
}

/// A countdown as recorded by [`ManualCountdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedCountdown {
    pub ticket: CountdownTicket,
    pub delay: Duration,
}

#[derive(Debug, Default)]
struct ManualState {
    armed: Option<ArmedCountdown>,
    arm_count: usize,
}

/// Countdown that never fires on its own.
///
/// Clones share state, so a caller can keep one handle while the engine owns
/// another and expire the pending countdown whenever it chooses.
#[derive(Debug, Clone, Default)]
pub struct ManualCountdown {
    state: Arc<Mutex<ManualState>>,
}

impl ManualCountdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the pending countdown, if any.
    #[must_use]
    pub fn armed(&self) -> Option<ArmedCountdown> {
        self.lock().armed
    }

    /// Number of times the countdown has been armed.
    #[must_use]
    pub fn arm_count(&self) -> usize {
        self.lock().arm_count
    }

    /// Ends the pending countdown and returns its expiry notification.
    ///
    /// Returns `None` when nothing is armed.
    #[must_use]
    pub fn expire(&self) -> Option<CountdownExpired> {
        self.lock()
            .armed
            .take()
            .map(|armed| CountdownExpired {
                ticket: armed.ticket,
            })
    }
}

impl Countdown for ManualCountdown {
    fn arm(&mut self, ticket: CountdownTicket, delay: Duration) {
        let mut state = self.lock();
        state.armed = Some(ArmedCountdown { ticket, delay });
        state.arm_count += 1;
    }

    fn cancel(&mut self) {
        self.lock().armed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_ticket_ordering() {
        let first = CountdownTicket::FIRST;
        assert!(first.next() > first);
        assert_eq!(first.next().to_string(), "#1");
    }

    #[test]
    fn test_thread_countdown_fires_once() {
        let (mut countdown, expirations) = ThreadCountdown::spawn().unwrap();
        let ticket = CountdownTicket::FIRST.next();
        countdown.arm(ticket, Duration::from_millis(10));

        let expired = expirations.recv_timeout(WAIT).unwrap();
        assert_eq!(expired.ticket, ticket);
        assert!(
            expirations
                .recv_timeout(Duration::from_millis(100))
                .is_err()
        );
    }

    #[test]
    fn test_thread_countdown_rearm_replaces_pending() {
        let (mut countdown, expirations) = ThreadCountdown::spawn().unwrap();
        let first = CountdownTicket::FIRST;
        let second = first.next();
        countdown.arm(first, Duration::from_millis(300));
        countdown.arm(second, Duration::from_millis(10));

        let expired = expirations.recv_timeout(WAIT).unwrap();
        assert_eq!(expired.ticket, second);
        assert!(
            expirations
                .recv_timeout(Duration::from_millis(600))
                .is_err()
        );
    }

    #[test]
    fn test_thread_countdown_cancel() {
        let (mut countdown, expirations) = ThreadCountdown::spawn().unwrap();
        countdown.arm(CountdownTicket::FIRST, Duration::from_millis(50));
        countdown.cancel();
        assert!(
            expirations
                .recv_timeout(Duration::from_millis(300))
                .is_err()
        );
    }

    #[test]
    fn test_thread_countdown_drop_closes_channel() {
        let (countdown, expirations) = ThreadCountdown::spawn().unwrap();
        drop(countdown);
        assert_eq!(
            expirations.recv_timeout(WAIT),
            Err(RecvTimeoutError::Disconnected)
        );
    }

    #[test]
    fn test_manual_countdown_records_and_expires() {
        let handle = ManualCountdown::new();
        let mut countdown = handle.clone();
        assert!(handle.armed().is_none());
        assert!(handle.expire().is_none());

        let ticket = CountdownTicket::FIRST;
        countdown.arm(ticket, Duration::from_millis(12_000));
        assert_eq!(
            handle.armed(),
            Some(ArmedCountdown {
                ticket,
                delay: Duration::from_millis(12_000),
            })
        );
        assert_eq!(handle.arm_count(), 1);

        assert_eq!(handle.expire(), Some(CountdownExpired { ticket }));
        assert!(handle.armed().is_none());
    }

    #[test]
    fn test_manual_countdown_cancel() {
        let handle = ManualCountdown::new();
        let mut countdown = handle.clone();
        countdown.arm(CountdownTicket::FIRST, Duration::from_secs(1));
        countdown.cancel();
        assert!(handle.expire().is_none());
        assert_eq!(handle.arm_count(), 1);
    }
}
