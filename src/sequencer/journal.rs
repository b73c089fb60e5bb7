/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Journal trait and in-memory implementation for turn event storage.
//!
//! A journal is an append-only log of [`TurnEvent`]s. It records the exact
//! order in which roles were granted their turns, so that a run can be
//! audited against its [`TurnPredicate`] and compared with other runs.
//!
//! [`TurnPredicate`]: super::TurnPredicate

use super::event::TurnEvent;
use super::replay::ReplayError;
use sha2::{Digest, Sha256};

/// Append-only event log for [`TurnEvent`]s.
///
/// Implementations must preserve insertion order and provide efficient
/// iteration from an arbitrary sequence number. The journal is the
/// source of truth for [`ReplayEngine`] operations.
///
/// [`ReplayEngine`]: super::replay::ReplayEngine
pub trait Journal {
    /// Appends a new event to the journal.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if the event cannot be stored (e.g. sequence
    /// number out of order or storage failure).
    fn append(&mut self, event: TurnEvent) -> Result<(), ReplayError>;

    /// Returns an iterator over all events with `sequence_num >= from_sequence`.
    ///
    /// Events are yielded in ascending sequence order.
    fn read_from(&self, from_sequence: u64) -> impl Iterator<Item = &TurnEvent> + '_;

    /// Returns an iterator over events with `from_sequence <= sequence_num <= to_sequence`.
    ///
    /// Events are yielded in ascending sequence order.
    fn read_range(
        &self,
        from_sequence: u64,
        to_sequence: u64,
    ) -> impl Iterator<Item = &TurnEvent> + '_;

    /// Returns the total number of events stored.
    #[must_use]
    fn len(&self) -> usize;

    /// Returns `true` if no events have been appended.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the sequence number of the last event, or `None` if empty.
    #[must_use]
    fn last_sequence(&self) -> Option<u64>;
}

/// In-memory implementation of [`Journal`].
///
/// Stores all events in a `Vec` in insertion order and rejects events whose
/// sequence number does not directly follow the last one.
///
/// # Examples
///
/// ```
/// use turn_sequencer::sequencer::journal::{Journal, InMemoryJournal};
/// use turn_sequencer::sequencer::{RoleId, TurnEvent};
///
/// let mut journal = InMemoryJournal::new();
/// assert!(journal.is_empty());
///
/// journal.append(TurnEvent::new(1, 0, RoleId::from("zero"), 1)).ok();
/// assert_eq!(journal.len(), 1);
/// assert!(journal.append(TurnEvent::new(3, 0, RoleId::from("odd"), 1)).is_err());
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InMemoryJournal {
    events: Vec<TurnEvent>,
}

impl InMemoryJournal {
    /// Creates a new empty in-memory journal.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Creates a new in-memory journal with pre-allocated capacity.
    ///
    /// Use this when the approximate number of turns is known in advance
    /// to avoid repeated reallocations.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Wraps events from an external log as-is, without ordering checks.
    ///
    /// Use [`ReplayEngine::verify`](super::replay::ReplayEngine::verify) to
    /// audit such a journal.
    #[must_use]
    pub fn from_events(events: Vec<TurnEvent>) -> Self {
        Self { events }
    }

    /// Returns a slice of all stored events.
    #[must_use]
    pub fn events(&self) -> &[TurnEvent] {
        &self.events
    }

    /// SHA-256 digest of the turn order.
    ///
    /// Covers sequence number, role and counter of every event. Timestamps
    /// are excluded, so two runs with the same schedule have equal digests.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for event in &self.events {
            hasher.update(event.sequence_num.to_le_bytes());
            hasher.update((event.role.as_str().len() as u64).to_le_bytes());
            hasher.update(event.role.as_str().as_bytes());
            hasher.update(event.counter.to_le_bytes());
        }
        hasher.finalize().into()
    }
}

impl Journal for InMemoryJournal {
    fn append(&mut self, event: TurnEvent) -> Result<(), ReplayError> {
        let expected = self.last_sequence().map_or(1, |last| last.saturating_add(1));
        if event.sequence_num != expected {
            return Err(ReplayError::SequenceGap {
                expected,
                found: event.sequence_num,
            });
        }
        self.events.push(event);
        Ok(())
    }

    fn read_from(&self, from_sequence: u64) -> impl Iterator<Item = &TurnEvent> + '_ {
        self.events
            .iter()
            .filter(move |e| e.sequence_num >= from_sequence)
    }

    fn read_range(
        &self,
        from_sequence: u64,
        to_sequence: u64,
    ) -> impl Iterator<Item = &TurnEvent> + '_ {
        self.events
            .iter()
            .filter(move |e| e.sequence_num >= from_sequence && e.sequence_num <= to_sequence)
    }

    #[inline]
    fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    fn last_sequence(&self) -> Option<u64> {
        self.events.last().map(|e| e.sequence_num)
    }
}
