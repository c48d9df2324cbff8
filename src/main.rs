//! Nubi - headless character controller runner.
//!
//! Loads a scenario, runs it through the sandbox host and prints what the
//! character did. Set `RUST_LOG=info` for the state timeline or
//! `RUST_LOG=debug` for every physics tick.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nubi_sandbox::{RunSummary, Scenario};

#[derive(Debug, Parser)]
#[command(name = "nubi", version, about = "Run character controller scenarios headless")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario file, or the built-in demo without one.
    Run {
        scenario: Option<PathBuf>,

        /// Run this many physics ticks instead of the scenario's duration.
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Print the demo scenario as RON.
    PrintDefault,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { scenario, ticks } => {
            let scenario = match &scenario {
                Some(path) => Scenario::load(path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => Scenario::demo(),
            };
            run(&scenario, ticks)
        }
        Command::PrintDefault => {
            println!("{}", Scenario::demo().to_ron()?);
            Ok(())
        }
    }
}

fn run(scenario: &Scenario, ticks: Option<u64>) -> anyhow::Result<()> {
    let mut simulation = scenario
        .build()
        .with_context(|| format!("building scenario '{}'", scenario.name))?;

    let summary = match ticks {
        Some(ticks) => simulation.run_ticks(ticks),
        None => simulation.run_for(scenario.duration),
    };

    log::info!(
        "'{}' finished after {} frames ({} ticks)",
        scenario.name,
        summary.frames,
        summary.ticks
    );
    print_summary(&scenario.name, &summary);
    Ok(())
}

fn print_summary(name: &str, summary: &RunSummary) {
    println!("scenario:     {name}");
    println!("frames:       {}", summary.frames);
    println!("ticks:        {}", summary.ticks);
    match summary.final_state {
        Some(state) => println!("final state:  {state}"),
        None => println!("final state:  -"),
    }
    let p = summary.final_position;
    println!("position:     ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
    println!("max speed:    {:.2} m/s", summary.max_speed);
    println!("landings:     {}", summary.landings);
    println!("jumps:        {}", summary.jumps);
    println!("wall hits:    {}", summary.wall_hits);
    println!("ceiling hits: {}", summary.ceiling_hits);

    if !summary.timeline.is_empty() {
        println!("timeline:");
        for change in &summary.timeline {
            println!("  {:>7.3}s  {} -> {}", change.time, change.from, change.to);
        }
    }
}
