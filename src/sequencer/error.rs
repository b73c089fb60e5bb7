/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Error types for configuration, run control and role actions.

use super::role::{ActionError, RoleId};
use std::time::Duration;
use thiserror::Error;

/// Errors detected while configuring a sequencer. Never raised mid-run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No roles were supplied.
    #[error("at least one role is required")]
    NoRoles,

    /// Two roles share the same identity.
    #[error("duplicate role identity `{role}`")]
    DuplicateRole {
        /// The repeated identity.
        role: RoleId,
    },

    /// The anchor index does not point at a configured role.
    #[error("anchor role index {index} out of range for {roles} roles")]
    AnchorIndexOutOfRange {
        /// The configured anchor index.
        index: usize,
        /// Number of configured roles.
        roles: usize,
    },

    /// The target cannot be produced without overflowing the counter.
    #[error("invalid target {target}")]
    InvalidTarget {
        /// The configured target.
        target: u64,
    },

    /// No role is eligible in a reachable state.
    #[error("no role is eligible at counter {counter} (anchor_due={anchor_due})")]
    Gap {
        /// Counter value of the uncovered state.
        counter: u64,
        /// Anchor flag of the uncovered state.
        anchor_due: bool,
    },

    /// Several roles are eligible in a reachable state.
    #[error("roles {roles:?} are all eligible at counter {counter} (anchor_due={anchor_due})")]
    Overlap {
        /// Counter value of the ambiguous state.
        counter: u64,
        /// Anchor flag of the ambiguous state.
        anchor_due: bool,
        /// Every role claiming the turn.
        roles: Vec<RoleId>,
    },

    /// The anchor role claims a turn while it is not due.
    #[error("anchor role `{role}` is eligible at counter {counter} although it is not due")]
    AnchorOutOfTurn {
        /// The anchor role.
        role: RoleId,
        /// Counter value of the offending state.
        counter: u64,
    },

    /// A worker claims a turn while the anchor is due.
    #[error("worker `{role}` is eligible at counter {counter} while the anchor is due")]
    AnchorBypassed {
        /// The offending worker.
        role: RoleId,
        /// Counter value of the offending state.
        counter: u64,
    },

    /// The configuration could not be (de)serialized.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A role action failed while holding its turn.
#[derive(Debug, Error)]
#[error("role `{role}` faulted at counter {counter}: {source}")]
pub struct ActionFault {
    /// The role whose action failed.
    pub role: RoleId,

    /// Counter value passed to the failing action.
    pub counter: u64,

    /// The underlying error.
    #[source]
    pub source: ActionError,
}

/// Errors that can occur when controlling a Sequencer.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// `start` was called on a sequencer that has already started.
    #[error("sequencer has already been started")]
    AlreadyStarted,

    /// The run was awaited before `start`.
    #[error("sequencer has not been started")]
    NotStarted,

    /// `start` was called outside a tokio runtime.
    #[error("no tokio runtime available to spawn role runners")]
    NoRuntime,

    /// The run did not finish within the requested time. It keeps running.
    #[error("run did not complete within {timeout:?}")]
    Timeout {
        /// The elapsed wait bound.
        timeout: Duration,
    },

    /// The run report has already been returned to a caller.
    #[error("run report has already been taken")]
    ReportTaken,

    /// A runner task ended without going through its exit path.
    #[error("role runner lost: {reason}")]
    RunnerLost {
        /// Description of the join failure.
        reason: String,
    },
}

impl SequencerError {
    /// Returns `true` if waiting again may still succeed.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
