//! chuchu binary - thin driver over the engine

mod cli;

use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use chuchu::agent::WebResearchProvider;
use chuchu::cancel::CancellationToken;
use chuchu::events::create_observer;
use chuchu::{EngineError, Setup, SymphonyExecutor, Task};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("chuchu=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chuchu=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let setup = Setup::load(cli.setup.as_ref())?;

    match cli.command {
        Command::Run { task, workspace } => {
            let workspace = match workspace {
                Some(ws) => ws,
                None => std::env::current_dir()?,
            };

            let observer = create_observer();
            let cancel = CancellationToken::new();

            let mut executor = SymphonyExecutor::new(setup.clone(), Arc::clone(&observer)).with_cancel(cancel.clone());

            // Research rides on the default backend when available
            let default_backend = setup.default_backend();
            if let Ok(client) = chuchu::llm::create_client(&default_backend) {
                let research = WebResearchProvider::new(client, default_backend.default_model.clone());
                executor = executor.with_research(Arc::new(research));
            }

            // Ctrl-C propagates through the engine's cancellation token
            let ctrlc_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\n{}", "Cancelling...".yellow());
                    ctrlc_cancel.cancel();
                }
            });

            let task = Task::new(task, workspace);
            let result = executor.execute(&task).await;

            let summary = observer.summary();
            match result {
                Ok(outcome) => {
                    println!("{}", outcome.summary);
                    println!();
                    println!("{} {}", "done:".green().bold(), summary);
                    Ok(())
                }
                Err(EngineError::ModelSwitch {
                    kind,
                    message,
                    recommendations,
                }) => {
                    eprintln!("{} {} ({})", "provider trouble:".red().bold(), message, kind);
                    if recommendations.is_empty() {
                        eprintln!("no model recommendations available; check backend configuration");
                    } else {
                        eprintln!("try again with one of:");
                        for rec in recommendations.iter().take(3) {
                            eprintln!("  {} / {} ({})", rec.backend, rec.model, rec.reason);
                        }
                    }
                    std::process::exit(1);
                }
                Err(EngineError::Cancelled) => {
                    eprintln!("{}", "cancelled".yellow());
                    std::process::exit(130);
                }
                Err(e) => {
                    eprintln!("{} {}", "failed:".red().bold(), e);
                    eprintln!("{}", summary);
                    std::process::exit(1);
                }
            }
        }
    }
}
