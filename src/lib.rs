/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! # turn-sequencer
//!
//! Deterministic turn coordination for several concurrent roles that share a
//! single ordered output sequence.
//!
//! Every role runs on its own tokio task. Exactly one role is eligible at any
//! instant, and eligibility is a pure function of the shared counter, so the
//! output order never depends on how the runtime schedules the tasks.
//!
//! ```text
//!            ┌────────────────────────── Sequencer ──────────────────────────┐
//!            │  TurnPredicate ── Mutex<SharedState> ── Notify per role       │
//!            └──────┬─────────────────────┬─────────────────────┬────────────┘
//!                   ▼                     ▼                     ▼
//!            RoleRunner(zero)      RoleRunner(odd)       RoleRunner(even)
//!            wait → act → advance  wait → act → advance  wait → act → advance
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use turn_sequencer::sequencer::interleave;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sequencer = interleave::zero_odd_even(5)?;
//! sequencer.start()?;
//! let report = sequencer.await_completion(None).await?;
//! assert_eq!(interleave::render(&report.output), "0102030405");
//! # Ok(())
//! # }
//! ```

pub mod sequencer;

pub use sequencer::{
    ActionError, ActionFault, Canceller, ConfigError, RoleId, RoleSpec, RunReport, RunStatus,
    Sequencer, SequencerConfig, SequencerError, TurnEvent, TurnPredicate, TurnState, WakePolicy,
};
