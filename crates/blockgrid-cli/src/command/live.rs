use std::{path::PathBuf, thread, time::Duration};

use anyhow::Context;
use blockgrid_engine::{Engine, GameEvent, GameSession, PieceSeed, TurnCommand};
use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use log::{error, info};
use serde::Serialize;

use crate::{
    bot,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct LiveArg {
    /// Piece seed in hex; random when omitted
    #[arg(long, value_parser = util::parse_seed)]
    seed: Option<PieceSeed>,
    /// Engine config file (JSON); defaults are used for missing fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Divide every countdown length by this factor
    #[arg(long, default_value_t = 1)]
    time_scale: u64,
    /// How long the bot waits before acting on a new turn, in milliseconds
    #[arg(long, default_value_t = 300)]
    think_ms: u64,
    /// Stop playing after this many placements and let the countdown run out
    #[arg(long, default_value_t = 50)]
    max_placements: u64,
    /// Output file path for the event stream and final summary
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EventLine<'a> {
    at: DateTime<Utc>,
    score: u64,
    level: u64,
    lives: u32,
    #[serde(flatten)]
    event: &'a GameEvent,
}

pub(crate) fn run(arg: &LiveArg) -> anyhow::Result<()> {
    let LiveArg {
        seed,
        config,
        time_scale,
        think_ms,
        max_placements,
        output,
    } = arg;

    let config = util::load_config(config.as_deref())?.time_scaled(*time_scale);
    let session =
        GameSession::threaded(config, *seed).context("Failed to start game session")?;
    info!("playing with seed {:?}", session.engine().seed());

    let mut output = Output::from_output_path(output.clone())?;
    let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
    let think = Duration::from_millis(*think_ms);

    let summary = session.run(&commands_rx, |engine, event| {
        let line = EventLine {
            at: Utc::now(),
            score: engine.score(),
            level: engine.level(),
            lives: engine.lives(),
            event: &event,
        };
        if let Err(e) = output.write_json_line(&line) {
            error!("{e:#}");
        }

        let new_turn = matches!(
            event,
            GameEvent::CountdownArmed { lives_remaining, .. } if lives_remaining > 0
        );
        if new_turn && engine.stats().placements() < *max_placements {
            play_turn(engine, &commands_tx, think);
        }
    })?;

    output.write_json(&summary)?;
    Ok(())
}

/// Plans a turn now and submits it from a helper thread after `think`.
///
/// The countdown keeps running while the bot "thinks", so a long enough delay
/// costs a life. Commands are bound to the turn they were planned for and the
/// session drops them if that turn has already ended.
fn play_turn(engine: &Engine, commands: &Sender<TurnCommand>, think: Duration) {
    let Some(plan) = plan_turn(engine) else {
        info!("no piece fits, waiting for the countdown");
        return;
    };
    let commands = commands.clone();
    thread::spawn(move || {
        thread::sleep(think);
        for command in plan {
            // The session is gone once the game has ended
            if commands.send(command).is_err() {
                return;
            }
        }
    });
}

fn plan_turn(engine: &Engine) -> Option<Vec<TurnCommand>> {
    let ticket = engine.armed_ticket()?;
    let plan = bot::select_best_turn(engine)?;
    let commands = plan
        .commands()
        .into_iter()
        .map(|command| TurnCommand::for_turn(ticket, command))
        .collect();
    Some(commands)
}
