//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chuchu - agent orchestration engine
#[derive(Debug, Parser)]
#[command(name = "chuchu", version, about)]
pub struct Cli {
    /// Path to a setup file (default: .chuchu.yaml, then ~/.chuchu/setup.yaml)
    #[arg(long, global = true)]
    pub setup: Option<PathBuf>,

    /// Verbose logging (equivalent to RUST_LOG=chuchu=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute a task against a workspace
    Run {
        /// The task text
        task: String,

        /// Workspace directory (default: current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },
}
