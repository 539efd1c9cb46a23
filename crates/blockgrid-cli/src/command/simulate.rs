use std::path::PathBuf;

use anyhow::Context;
use blockgrid_engine::{Engine, EngineConfig, GameSummary, ManualCountdown, PieceSeed};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng as _;
use serde::Serialize;

use crate::{
    bot,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,
    /// Seed of the first game in hex; each later game uses the next value
    #[arg(long, value_parser = util::parse_seed)]
    seed: Option<PieceSeed>,
    /// Engine config file (JSON); defaults are used for missing fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop a game after this many turns even if lives remain
    #[arg(long, default_value_t = 1000)]
    max_turns: usize,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct SimulationReport {
    started_at: DateTime<Utc>,
    config: EngineConfig,
    max_turns: usize,
    mean_score: f64,
    best_score: u64,
    finished_games: usize,
    games: Vec<GameSummary>,
}

impl SimulationReport {
    #[expect(clippy::cast_precision_loss)]
    fn new(
        started_at: DateTime<Utc>,
        config: EngineConfig,
        max_turns: usize,
        games: Vec<GameSummary>,
    ) -> Self {
        let total = games.iter().map(|g| g.score).sum::<u64>();
        let mean_score = if games.is_empty() {
            0.0
        } else {
            total as f64 / games.len() as f64
        };
        Self {
            started_at,
            config,
            max_turns,
            mean_score,
            best_score: games.iter().map(|g| g.score).max().unwrap_or(0),
            finished_games: games.iter().filter(|g| g.game_over).count(),
            games,
        }
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        games,
        seed,
        config,
        max_turns,
        output,
    } = arg;

    let config = util::load_config(config.as_deref())?;
    let first_seed = seed.unwrap_or_else(|| rand::rng().random());
    let started_at = Utc::now();

    let summaries = game_seeds(first_seed, *games)
        .enumerate()
        .map(|(i, seed)| {
            let summary = play_game(&config, seed, *max_turns)
                .with_context(|| format!("Game {i} failed"))?;
            info!(
                "game {}/{}: score {}, level {}, {} placements",
                i + 1,
                games,
                summary.score,
                summary.level,
                summary.stats.placements()
            );
            Ok(summary)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let report = SimulationReport::new(started_at, config, *max_turns, summaries);
    Output::save_json(&report, output.clone())?;
    Ok(())
}

fn game_seeds(first: PieceSeed, count: usize) -> impl Iterator<Item = PieceSeed> {
    let base = u128::from_be_bytes(first.to_bytes());
    (0..count as u128).map(move |i| PieceSeed::from_u128(base.wrapping_add(i)))
}

/// Plays one game with the bot, letting the countdown expire whenever no
/// piece fits.
fn play_game(
    config: &EngineConfig,
    seed: PieceSeed,
    max_turns: usize,
) -> anyhow::Result<GameSummary> {
    let countdown = ManualCountdown::new();
    let mut engine = Engine::with_seed(config.clone(), seed, Box::new(countdown.clone()))?;
    engine.start()?;

    for turn in 0..max_turns {
        if engine.state().is_game_over() {
            break;
        }
        match bot::select_best_turn(&engine) {
            Some(plan) => {
                let outcome = plan.apply(&mut engine)?;
                if outcome.lines_cleared > 0 {
                    debug!(
                        "turn {turn}: cleared {} lines for {} points",
                        outcome.lines_cleared, outcome.points
                    );
                }
            }
            None => {
                let expired = countdown.expire().context("No countdown armed")?;
                engine.countdown_expired(expired)?;
            }
        }
        for event in engine.drain_events() {
            log::trace!("{event:?}");
        }
    }

    Ok(engine.summary())
}
