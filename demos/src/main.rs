/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Prints the zero / odd / even interleaving.
//!
//! ```text
//! zero_odd_even [TARGET] [--config <PATH>] [--broadcast]
//! ```
//!
//! With no argument the target is 5 and the output is `0102030405`. Set
//! `RUST_LOG=debug` to follow every turn.

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use turn_sequencer::sequencer::interleave;
use turn_sequencer::sequencer::replay::ReplayEngine;
use turn_sequencer::{Sequencer, SequencerConfig, WakePolicy};

const DEFAULT_TARGET: u64 = 5;

#[derive(Parser, Debug)]
#[command(name = "zero_odd_even")]
#[command(about = "Print 0 before every number up to TARGET, odd and even numbers taking turns", long_about = None)]
struct Args {
    /// Last number to print
    #[arg(conflicts_with = "config")]
    target: Option<u64>,

    /// Read a JSON sequencer configuration instead of TARGET
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Wake every role after each turn instead of only the next one
    #[arg(long)]
    broadcast: bool,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Args {
    fn sequencer_config(&self) -> Result<SequencerConfig, Box<dyn Error>> {
        let config = match &self.config {
            Some(path) => SequencerConfig::from_json(&std::fs::read_to_string(path)?)?,
            None => interleave::config(self.target.unwrap_or(DEFAULT_TARGET)),
        };
        Ok(if self.broadcast {
            config.with_wake(WakePolicy::Broadcast)
        } else {
            config
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = args.sequencer_config()?;
    info!(config = %serde_json::to_string(&config)?, "configuring interleaving");

    let mut sequencer = Sequencer::configure(interleave::roles(), config)?;
    let turns = sequencer.turn_predicate().clone();
    sequencer.start()?;

    let report = sequencer
        .await_completion(Some(Duration::from_secs(args.timeout_secs)))
        .await?;
    let summary = ReplayEngine::verify(&report.journal, &turns);
    info!(
        run_id = %report.run_id,
        status = report.status.as_label(),
        turns = report.turns(),
        verified = summary.is_ok(),
        "run finished"
    );

    println!("{}", interleave::render(&report.into_output()?));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target() {
        let args = Args::try_parse_from(["zero_odd_even"]).unwrap();
        assert_eq!(args.sequencer_config().unwrap(), interleave::config(DEFAULT_TARGET));
    }

    #[test]
    fn test_positional_target_and_broadcast() {
        let args = Args::try_parse_from(["zero_odd_even", "12", "--broadcast"]).unwrap();
        let config = args.sequencer_config().unwrap();
        assert_eq!(config.target, 12);
        assert_eq!(config.wake, WakePolicy::Broadcast);
    }

    #[test]
    fn test_mistyped_target_is_a_usage_error() {
        let err = Args::try_parse_from(["zero_odd_even", "5x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_target_conflicts_with_config() {
        let err = Args::try_parse_from(["zero_odd_even", "5", "--config", "run.json"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let args =
            Args::try_parse_from(["zero_odd_even", "--config", "/nonexistent/run.json"]).unwrap();
        assert!(args.sequencer_config().is_err());
    }
}
