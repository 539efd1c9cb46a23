use clap::{Parser, Subcommand};

use self::{live::LiveArg, simulate::SimulateArg};

mod live;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play seeded games headlessly with the built-in bot and report the results
    Simulate(#[clap(flatten)] SimulateArg),
    /// Play one game in real time, streaming engine events as JSON lines
    Live(#[clap(flatten)] LiveArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Live(arg) => live::run(&arg)?,
    }
    Ok(())
}
