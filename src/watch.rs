//! Interactive dashboard session driven from stdin.
//!
//! Every period change or retry is spawned as its own cycle, so a slow cycle can still be
//! in flight when the next one starts. Cycles are begun on the input loop itself. The renderer only ever prints what the
//! orchestrator publishes.

use anyhow::Context;
use chrono::Utc;
use configuration::Config;
use core_types::Period;
use orchestrator::{CycleTicket, DashboardOrchestrator};
use report::ExportFormat;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

const HELP: &str = "Commands: week | month | quarter | all | retry | export csv|json | help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchCommand {
    SetPeriod(Period),
    Retry,
    Export(ExportFormat),
    Help,
    Quit,
}

impl FromStr for WatchCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();

        match (command.as_str(), argument) {
            ("retry", None) => Ok(WatchCommand::Retry),
            ("help", None) | ("?", None) => Ok(WatchCommand::Help),
            ("quit", None) | ("exit", None) => Ok(WatchCommand::Quit),
            ("export", Some(format)) => format
                .parse::<ExportFormat>()
                .map(WatchCommand::Export)
                .map_err(|e| e.to_string()),
            ("export", None) => Err("export needs a format: csv or json".to_string()),
            (other, None) => other
                .parse::<Period>()
                .map(WatchCommand::SetPeriod)
                .map_err(|_| format!("Unknown command '{}'. {}", s.trim(), HELP)),
            _ => Err(format!("Unknown command '{}'. {}", s.trim(), HELP)),
        }
    }
}

pub async fn run(orchestrator: Arc<DashboardOrchestrator>, config: &Config) -> anyhow::Result<()> {
    let mut rx = orchestrator.subscribe();
    let renderer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            tracing::debug!(state = state.label(), period = ?state.period(), "Dashboard state changed.");
            render::render_state(&state);
        }
    });

    if let Some(ticket) = orchestrator.begin_mount() {
        spawn_cycle(&orchestrator, ticket);
    }
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<WatchCommand>() {
            Ok(WatchCommand::SetPeriod(period)) => {
                let ticket = orchestrator.begin_cycle(Some(period));
                spawn_cycle(&orchestrator, ticket);
            }
            Ok(WatchCommand::Retry) => {
                let ticket = orchestrator.begin_cycle(None);
                spawn_cycle(&orchestrator, ticket);
            }
            Ok(WatchCommand::Export(format)) => {
                let snapshot = orchestrator.snapshot();
                match report::write_report(
                    &config.export.output_dir,
                    snapshot.as_deref(),
                    format,
                    Utc::now(),
                ) {
                    Ok(path) => println!("✅ Report written to {}", path.display()),
                    Err(e) => println!("❌ {}", e),
                }
            }
            Ok(WatchCommand::Help) => println!("{}", HELP),
            Ok(WatchCommand::Quit) => break,
            Err(message) => println!("{}", message),
        }
    }

    renderer.abort();
    Ok(())
}

/// The generation is issued before spawning, so cycles win in the order they were typed.
fn spawn_cycle(orchestrator: &Arc<DashboardOrchestrator>, ticket: CycleTicket) {
    let orchestrator = orchestrator.clone();
    tokio::spawn(async move { orchestrator.run_cycle(ticket).await });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_periods_and_actions() {
        assert_eq!("week".parse::<WatchCommand>(), Ok(WatchCommand::SetPeriod(Period::Week)));
        assert_eq!(" ALL ".parse::<WatchCommand>(), Ok(WatchCommand::SetPeriod(Period::All)));
        assert_eq!("retry".parse::<WatchCommand>(), Ok(WatchCommand::Retry));
        assert_eq!("export json".parse::<WatchCommand>(), Ok(WatchCommand::Export(ExportFormat::Json)));
        assert_eq!("quit".parse::<WatchCommand>(), Ok(WatchCommand::Quit));
    }

    #[test]
    fn test_rejects_unknown_input() {
        assert!("fortnight".parse::<WatchCommand>().is_err());
        assert!("export".parse::<WatchCommand>().is_err());
        assert!("export pdf".parse::<WatchCommand>().is_err());
        assert!("retry now".parse::<WatchCommand>().is_err());
    }
}
