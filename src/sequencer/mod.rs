/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Sequencer module for deterministic multi-role turn taking.
//!
//! This module provides a Sequencer that drives several concurrent roles
//! against one shared counter and guarantees that their actions happen in
//! exactly the order dictated by a [`TurnPredicate`], whatever the runtime's
//! scheduling.
//!
//! # Architecture
//!
//! - Each role is described by a [`RoleSpec`]: identity, eligibility predicate
//!   and action
//! - One tokio task per role runs the same generic runner loop
//! - A single mutex guards the shared state; each role waits on its own notifier
//! - Every granted turn receives a monotonic sequence number and is journaled
//! - Cancellation is cooperative and acknowledged by every runner
//!
//! # Examples
//!
//! ```no_run
//! use turn_sequencer::sequencer::{RoleSpec, Sequencer, SequencerConfig, role};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let roles = vec![
//!     RoleSpec::new("zero", role::anchor_turn(), |_| Ok("0".to_string())),
//!     RoleSpec::new("odd", role::odd(), |n| Ok(n.to_string())),
//!     RoleSpec::new("even", role::even(), |n| Ok(n.to_string())),
//! ];
//! let config = SequencerConfig::new(5).with_anchor(0);
//!
//! let mut sequencer = Sequencer::configure(roles, config)?;
//! sequencer.add_listener(|event| {
//!     println!("turn {}: {} at {}", event.sequence_num, event.role, event.counter);
//! });
//! sequencer.start()?;
//!
//! let report = sequencer.await_completion(None).await?;
//! assert_eq!(report.output.concat(), "0102030405");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod event;
pub mod interleave;
pub mod journal;
pub mod replay;
pub mod report;
pub mod role;
mod runner;
mod state;
pub mod turn;

#[cfg(test)]
mod tests;

// Re-export main types
pub use config::{SequencerConfig, WakePolicy};
pub use self::core::{Canceller, Sequencer};
pub use error::{ActionFault, ConfigError, SequencerError};
pub use event::TurnEvent;
pub use report::{RunReport, RunStatus, RunnerExit};
pub use role::{ActionError, RoleId, RoleSpec, TurnState};
pub use turn::{Eligibility, TurnPredicate};
