/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Deterministic replay engine for turn journals.
//!
//! [`ReplayEngine`] re-derives the schedule a [`TurnPredicate`] dictates and
//! walks a [`Journal`] alongside it, checking that every recorded turn was
//! taken by the right role at the right counter value. This enables audits of
//! past runs and determinism checks across runs.
//!
//! # Examples
//!
//! ```no_run
//! use turn_sequencer::sequencer::interleave;
//! use turn_sequencer::sequencer::replay::ReplayEngine;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sequencer = interleave::zero_odd_even(5)?;
//! sequencer.start()?;
//! let turns = sequencer.turn_predicate().clone();
//! let report = sequencer.await_completion(None).await?;
//!
//! let summary = ReplayEngine::verify(&report.journal, &turns)?;
//! assert!(summary.complete);
//! # Ok(())
//! # }
//! ```

use super::event::TurnEvent;
use super::journal::Journal;
use super::role::{RoleId, TurnState};
use super::turn::TurnPredicate;
use thiserror::Error;

/// Errors that can occur during journal replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The journal contains no events to replay.
    #[error("journal is empty")]
    EmptyJournal,

    /// The requested starting sequence number exceeds the journal's last entry.
    #[error("invalid from_sequence {from_sequence}: journal last sequence is {last_sequence}")]
    InvalidSequence {
        /// The sequence number requested.
        from_sequence: u64,
        /// The last sequence number in the journal.
        last_sequence: u64,
    },

    /// A gap was detected between expected and found sequence numbers.
    #[error("sequence gap detected: expected {expected}, found {found}")]
    SequenceGap {
        /// The expected next sequence number.
        expected: u64,
        /// The actual sequence number found.
        found: u64,
    },

    /// A turn was taken by a role other than the eligible one.
    #[error("turn {sequence_num} taken by `{found}`, expected `{expected}`")]
    RoleMismatch {
        /// The diverging turn.
        sequence_num: u64,
        /// The role the schedule grants the turn to.
        expected: RoleId,
        /// The role recorded in the journal.
        found: RoleId,
    },

    /// A turn was recorded with the wrong counter value.
    #[error("turn {sequence_num} recorded counter {found}, expected {expected}")]
    CounterMismatch {
        /// The diverging turn.
        sequence_num: u64,
        /// Counter value dictated by the schedule.
        expected: u64,
        /// Counter value recorded in the journal.
        found: u64,
    },

    /// The journal continues after the schedule has finished.
    #[error("turn {sequence_num} recorded after the run finished")]
    UnexpectedTurn {
        /// The extra turn.
        sequence_num: u64,
    },
}

/// Outcome of a successful journal verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Number of turns verified.
    pub turns: u64,

    /// Sequence number of the last verified event.
    pub last_sequence: u64,

    /// State after the last verified turn.
    pub final_state: TurnState,

    /// `true` if the journal covers the whole schedule, `false` for a
    /// prefix (cancelled or faulted runs).
    pub complete: bool,
}

/// Stateless engine that checks [`Journal`]s against a [`TurnPredicate`].
///
/// Holds no state; every method is an associated function.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Verifies that `journal` is a prefix of the schedule `turns` dictates.
    ///
    /// # Errors
    ///
    /// - [`ReplayError::EmptyJournal`] if the journal has no events
    /// - [`ReplayError::SequenceGap`] if sequence numbers are not `1, 2, 3, …`
    /// - [`ReplayError::RoleMismatch`] / [`ReplayError::CounterMismatch`] at
    ///   the first diverging turn
    /// - [`ReplayError::UnexpectedTurn`] if the journal outlives the schedule
    pub fn verify(
        journal: &impl Journal,
        turns: &TurnPredicate,
    ) -> Result<ReplaySummary, ReplayError> {
        Self::verify_with_progress(journal, turns, |_, _| {})
    }

    /// Verifies a journal with a progress callback invoked after each event.
    ///
    /// The callback receives `(events_verified: u64, current_sequence: u64)`.
    ///
    /// # Errors
    ///
    /// Same as [`verify`](Self::verify).
    pub fn verify_with_progress(
        journal: &impl Journal,
        turns: &TurnPredicate,
        progress: impl Fn(u64, u64),
    ) -> Result<ReplaySummary, ReplayError> {
        if journal.is_empty() {
            return Err(ReplayError::EmptyJournal);
        }

        let mut state = turns.initial_state();
        let mut expected_seq = 1u64;
        let mut count = 0u64;

        for event in journal.read_from(0) {
            Self::check_event(turns, state, expected_seq, event)?;
            if let Some(index) = turns.next(state) {
                state = turns.transition(state, index);
            }
            expected_seq = expected_seq.saturating_add(1);
            count = count.saturating_add(1);
            progress(count, event.sequence_num);
        }

        Ok(ReplaySummary {
            turns: count,
            last_sequence: journal.last_sequence().unwrap_or(0),
            final_state: state,
            complete: turns.is_finished(state),
        })
    }

    /// Returns the events with `from_sequence <= sequence_num <= to_sequence`.
    ///
    /// This is a pure slice of the journal; nothing is verified.
    ///
    /// # Errors
    ///
    /// - [`ReplayError::EmptyJournal`] if the journal has no events
    /// - [`ReplayError::InvalidSequence`] if `from_sequence` > last journal sequence
    #[must_use]
    pub fn replay_range(
        journal: &impl Journal,
        from_sequence: u64,
        to_sequence: u64,
    ) -> Result<Vec<&TurnEvent>, ReplayError> {
        if journal.is_empty() {
            return Err(ReplayError::EmptyJournal);
        }

        if journal
            .last_sequence()
            .is_some_and(|last| from_sequence > last)
        {
            return Err(ReplayError::InvalidSequence {
                from_sequence,
                last_sequence: journal.last_sequence().unwrap_or(0),
            });
        }

        Ok(journal.read_range(from_sequence, to_sequence).collect())
    }

    /// Checks one recorded event against the state the schedule is in.
    fn check_event(
        turns: &TurnPredicate,
        state: TurnState,
        expected_seq: u64,
        event: &TurnEvent,
    ) -> Result<(), ReplayError> {
        if event.sequence_num != expected_seq {
            return Err(ReplayError::SequenceGap {
                expected: expected_seq,
                found: event.sequence_num,
            });
        }

        let Some(expected_role) = turns.next(state).and_then(|i| turns.role_id(i)) else {
            return Err(ReplayError::UnexpectedTurn {
                sequence_num: event.sequence_num,
            });
        };

        if *expected_role != event.role {
            return Err(ReplayError::RoleMismatch {
                sequence_num: event.sequence_num,
                expected: expected_role.clone(),
                found: event.role.clone(),
            });
        }

        if event.counter != state.counter {
            return Err(ReplayError::CounterMismatch {
                sequence_num: event.sequence_num,
                expected: state.counter,
                found: event.counter,
            });
        }

        Ok(())
    }
}

/// Compares the turn order of two journals.
///
/// Two journals match when they hold the same number of events and each pair
/// agrees on sequence number, role and counter. Timestamps are excluded from
/// comparison because every run happens at a different wall-clock time.
///
/// # Examples
///
/// ```
/// use turn_sequencer::sequencer::journal::InMemoryJournal;
/// use turn_sequencer::sequencer::replay::schedules_match;
/// use turn_sequencer::sequencer::{RoleId, TurnEvent};
///
/// let a = InMemoryJournal::from_events(vec![TurnEvent::new(1, 0, RoleId::from("odd"), 1)]);
/// let b = InMemoryJournal::from_events(vec![TurnEvent::new(1, 999, RoleId::from("odd"), 1)]);
/// assert!(schedules_match(&a, &b));
/// ```
#[must_use]
pub fn schedules_match(actual: &impl Journal, expected: &impl Journal) -> bool {
    if actual.len() != expected.len() {
        return false;
    }

    actual
        .read_from(0)
        .zip(expected.read_from(0))
        .all(|(a, b)| {
            a.sequence_num == b.sequence_num && a.role == b.role && a.counter == b.counter
        })
}
