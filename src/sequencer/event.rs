/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Sequencer event types.
//!
//! This module defines the event recorded after each granted turn.

use super::role::RoleId;
use serde::{Deserialize, Serialize};

/// Event recorded after a role has acted.
///
/// Contains the sequence number, timestamp, acting role and counter value.
/// Events are emitted in turn order and can be used for auditing, replay
/// verification, or real-time monitoring.
///
/// # Examples
///
/// ```
/// use turn_sequencer::sequencer::{RoleId, TurnEvent};
///
/// let event = TurnEvent::new(1, 1234567890, RoleId::from("zero"), 1);
/// assert_eq!(event.sequence_num, 1);
/// assert_eq!(event.counter, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEvent {
    /// Monotonically increasing turn number, starting at 1.
    pub sequence_num: u64,

    /// Nanosecond timestamp when the turn was taken.
    pub timestamp_ns: u64,

    /// The role that acted.
    pub role: RoleId,

    /// Counter value passed to the action.
    pub counter: u64,
}

impl TurnEvent {
    /// Creates a new turn event.
    #[must_use]
    pub fn new(sequence_num: u64, timestamp_ns: u64, role: RoleId, counter: u64) -> Self {
        Self {
            sequence_num,
            timestamp_ns,
            role,
            counter,
        }
    }
}

/// Returns the current time in nanoseconds since the Unix epoch.
#[inline]
pub(crate) fn nanos_since_epoch() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
