use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{generate::GenerateSubcommands, optimize::OptimizeArgs, simulate::SimulateArgs};

mod file_utils;
mod generate;
mod optimize;
mod parsers;
mod report;
mod simulate;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Searches departure offsets that minimize queueing
    Optimize {
        #[command(flatten)]
        args: OptimizeArgs,
    },
    /// Simulates the queues for one set of offsets
    Simulate {
        #[command(flatten)]
        args: SimulateArgs,
    },
    #[command(visible_alias = "g")]
    Generate {
        #[command(subcommand)]
        commands: GenerateSubcommands,
    },
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Optimize { args } => optimize::run(args)?,
        Commands::Simulate { args } => simulate::run(args)?,
        Commands::Generate { commands } => generate::run(commands)?,
    }

    Ok(())
}
