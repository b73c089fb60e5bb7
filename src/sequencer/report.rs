/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Run report types.
//!
//! This module defines what a caller receives once every role runner of a
//! Sequencer has exited.

use super::error::ActionFault;
use super::journal::InMemoryJournal;
use super::role::RoleId;
use uuid::Uuid;

/// How a run stopped.
#[derive(Debug)]
pub enum RunStatus {
    /// The counter moved past the target.
    Completed,

    /// The run was stopped early by a cancellation request.
    Cancelled,

    /// A role action failed; the run was stopped at that turn.
    Faulted(ActionFault),
}

impl RunStatus {
    /// Returns `true` if the run reached its target.
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` if the run was cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the fault that stopped the run, if any.
    #[inline]
    #[must_use]
    pub fn fault(&self) -> Option<&ActionFault> {
        match self {
            Self::Faulted(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns a short stable label for logs.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Faulted(_) => "faulted",
        }
    }
}

/// How one role runner left its loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerExit {
    /// The runner's role.
    pub role: RoleId,

    /// Turns the role was granted.
    pub turns: u64,

    /// Times the runner was woken while waiting.
    pub wakes: u64,
}

/// Result of a finished run.
///
/// On cancellation or fault, `output` and `journal` hold exactly the turns
/// taken before the run stopped.
#[derive(Debug)]
pub struct RunReport<V> {
    /// Identity of the run, as used in tracing spans.
    pub run_id: Uuid,

    /// Values returned by the role actions, in turn order.
    pub output: Vec<V>,

    /// How the run stopped.
    pub status: RunStatus,

    /// Counter value when the run stopped.
    pub final_counter: u64,

    /// Every granted turn, if journaling was enabled.
    pub journal: InMemoryJournal,

    /// Exit record of every runner, in the order they exited.
    pub runners: Vec<RunnerExit>,
}

impl<V> RunReport<V> {
    /// Returns the number of turns taken.
    #[inline]
    #[must_use]
    pub fn turns(&self) -> usize {
        self.output.len()
    }

    /// Returns `true` if the run reached its target.
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Returns the output, or the fault that stopped the run.
    ///
    /// A cancelled run yields its partial output.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionFault`] of a faulted run.
    pub fn into_output(self) -> Result<Vec<V>, ActionFault> {
        match self.status {
            RunStatus::Faulted(fault) => Err(fault),
            _ => Ok(self.output),
        }
    }
}
