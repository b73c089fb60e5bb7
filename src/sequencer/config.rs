/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Sequencer configuration.
//!
//! Role descriptors carry closures and are passed to
//! [`Sequencer::configure`](super::Sequencer::configure) directly; every
//! other option lives in [`SequencerConfig`], which can be loaded from JSON.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};

/// How runners are woken after a turn has been applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakePolicy {
    /// Wake only the role that is eligible in the new state.
    #[default]
    Targeted,

    /// Wake every role; each one re-checks its predicate.
    Broadcast,
}

/// Options for one sequencer run.
///
/// # Examples
///
/// ```
/// use turn_sequencer::sequencer::{SequencerConfig, WakePolicy};
///
/// let config = SequencerConfig::from_json(r#"{ "target": 5, "anchor_role": 0 }"#).unwrap();
/// assert_eq!(config.target, 5);
/// assert_eq!(config.start, 1);
/// assert_eq!(config.anchor_role, Some(0));
/// assert_eq!(config.wake, WakePolicy::Targeted);
/// assert!(!config.anchor_on_empty);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequencerConfig {
    /// Inclusive upper bound of counter values to produce.
    pub target: u64,

    /// First valid counter value.
    #[serde(default = "default_start")]
    pub start: u64,

    /// Index of the role that gates every worker turn, if any.
    #[serde(default)]
    pub anchor_role: Option<usize>,

    /// Behaviour when `target < start`: `false` produces an empty run,
    /// `true` lets the anchor fire exactly once.
    #[serde(default)]
    pub anchor_on_empty: bool,

    /// Wake strategy after each turn.
    #[serde(default)]
    pub wake: WakePolicy,

    /// Whether granted turns are recorded in the run journal.
    #[serde(default = "default_journal")]
    pub journal: bool,
}

fn default_start() -> u64 {
    1
}

fn default_journal() -> bool {
    true
}

impl SequencerConfig {
    /// Creates a configuration producing counters `1..=target` with no anchor.
    #[must_use]
    pub fn new(target: u64) -> Self {
        Self {
            target,
            start: default_start(),
            anchor_role: None,
            anchor_on_empty: false,
            wake: WakePolicy::default(),
            journal: default_journal(),
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, unknown fields, or a
    /// target that is not a non-negative integer.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Sets the gating role index.
    #[must_use]
    pub fn with_anchor(mut self, index: usize) -> Self {
        self.anchor_role = Some(index);
        self
    }

    /// Sets the first valid counter value.
    #[must_use]
    pub fn with_start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// Pins the empty-run behaviour.
    #[must_use]
    pub fn with_anchor_on_empty(mut self, anchor_on_empty: bool) -> Self {
        self.anchor_on_empty = anchor_on_empty;
        self
    }

    /// Sets the wake strategy.
    #[must_use]
    pub fn with_wake(mut self, wake: WakePolicy) -> Self {
        self.wake = wake;
        self
    }

    /// Enables or disables the turn journal.
    #[must_use]
    pub fn with_journal(mut self, journal: bool) -> Self {
        self.journal = journal;
        self
    }

    /// Returns `true` if no worker turn falls within `start..=target`.
    #[inline]
    #[must_use]
    pub fn is_empty_range(&self) -> bool {
        self.target < self.start
    }
}
