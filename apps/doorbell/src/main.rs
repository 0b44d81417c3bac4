use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use client_core::{
    gated_unlock, load_settings, ClientSettings, DoorbellApi, DoorbellService, GateOutcome,
    HistoryPager, UnavailableReason, UnlockGate,
};
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod console;
mod controller;

use controller::reducer::describe_visit;

#[derive(Parser, Debug)]
#[command(name = "doorbell", about = "Ring, unlock, and browse visits of a smart doorbell")]
struct Cli {
    /// Settings file; defaults to ./doorbell.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides base_url from the settings file and environment.
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ring the doorbell and show the visitor.
    Ring {
        #[arg(long)]
        save_photo: Option<PathBuf>,
    },
    /// Unlock the door.
    Unlock {
        /// Ask for confirmation on the terminal first.
        #[arg(long)]
        confirm: bool,
    },
    /// List recorded visits.
    History {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Keep fetching pages until the service runs out.
        #[arg(long)]
        all: bool,
    },
    /// Interactive session.
    Console {
        #[arg(long)]
        confirm_unlock: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(base_url) = cli.base_url.as_deref() {
        settings.base_url = ClientSettings::new(base_url, None)
            .context("invalid --base-url")?
            .base_url;
    }
    tracing::debug!(?settings, "settings loaded");

    match cli.command {
        Command::Console { confirm_unlock } => console::run(settings, confirm_unlock),
        command => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build runtime")?;
            runtime.block_on(run_once(settings, command))
        }
    }
}

async fn run_once(settings: ClientSettings, command: Command) -> Result<()> {
    let service = DoorbellService::connect(&settings)?;
    let result = match command {
        Command::Ring { save_photo } => ring(&service, save_photo).await,
        Command::Unlock { confirm } => unlock(&service, confirm).await,
        Command::History { limit, offset, all } => {
            let limit = limit.unwrap_or(settings.history_page_size);
            history(&service, limit, offset, all).await
        }
        Command::Console { .. } => Ok(()),
    };
    service.shutdown().await;
    result
}

async fn ring(service: &DoorbellService, save_photo: Option<PathBuf>) -> Result<()> {
    let visit = service.ring_doorbell().await.context("ring failed")?;
    println!("Someone is at the door: {}", describe_visit(&visit));

    if let Some(path) = save_photo {
        let bytes = service
            .download_photo(&visit)
            .await
            .context("photo download failed")?;
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        println!("Saved photo to {} ({} bytes)", path.display(), bytes.len());
    }
    Ok(())
}

async fn unlock(service: &DoorbellService, confirm: bool) -> Result<()> {
    let result = if confirm {
        gated_unlock(service, &TerminalGate).await
    } else {
        service.unlock_door().await
    };
    result.context("unlock failed")?;
    println!("Door unlocked!");
    Ok(())
}

async fn history(service: &DoorbellService, limit: u32, offset: u32, all: bool) -> Result<()> {
    let mut pager = HistoryPager::starting_at(limit, offset);
    loop {
        let printed = pager.visits().len();
        let received = pager
            .load_next(service)
            .await
            .context("history request failed")?;
        for visit in &pager.visits()[printed..] {
            println!("{}", describe_visit(visit));
        }
        if !all || received.is_none() {
            break;
        }
    }
    if pager.is_empty_history() {
        println!("No visits");
    }
    Ok(())
}

/// Asks for a y/N answer on the controlling terminal.
struct TerminalGate;

#[async_trait]
impl UnlockGate for TerminalGate {
    async fn verify(&self) -> GateOutcome {
        if !io::stdin().is_terminal() {
            return GateOutcome::Unavailable(UnavailableReason::NoHardware);
        }
        let answer = tokio::task::spawn_blocking(|| -> io::Result<String> {
            print!("Confirm it is you to open the door [y/N]: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) if matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes") => {
                GateOutcome::Verified
            }
            Ok(Ok(_)) => GateOutcome::Rejected("confirmation declined".to_string()),
            Ok(Err(err)) => GateOutcome::Rejected(format!("could not read confirmation: {err}")),
            Err(err) => GateOutcome::Rejected(format!("confirmation prompt failed: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_limit_must_be_positive() {
        assert!(Cli::try_parse_from(["doorbell", "history", "--limit", "0"]).is_err());

        let cli = Cli::try_parse_from(["doorbell", "history", "--limit", "5", "--offset", "10"])
            .expect("valid history args");
        assert!(matches!(
            cli.command,
            Command::History {
                limit: Some(5),
                offset: 10,
                all: false
            }
        ));
    }
}
