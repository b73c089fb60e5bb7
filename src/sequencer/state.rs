/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Shared coordination state and the synchronization around it.

use super::config::WakePolicy;
use super::error::ActionFault;
use super::event::{TurnEvent, nanos_since_epoch};
use super::journal::{InMemoryJournal, Journal};
use super::replay::ReplayError;
use super::report::RunStatus;
use super::role::{RoleId, TurnState};
use super::turn::TurnPredicate;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, Notify};

/// Mutable state of one run. Only reachable through [`Shared::state`].
pub(crate) struct SharedState<V> {
    counter: u64,
    anchor_due: bool,
    done: bool,
    status: Option<RunStatus>,
    next_sequence: u64,
    output: Vec<V>,
    journal: Option<InMemoryJournal>,
}

impl<V> SharedState<V> {
    pub(crate) fn new(
        initial: TurnState,
        finished: bool,
        journal: Option<InMemoryJournal>,
    ) -> Self {
        Self {
            counter: initial.counter,
            anchor_due: initial.anchor_due,
            done: finished,
            status: finished.then_some(RunStatus::Completed),
            next_sequence: 1,
            output: Vec::new(),
            journal,
        }
    }

    #[inline]
    pub(crate) fn turn(&self) -> TurnState {
        TurnState::new(self.counter, self.anchor_due)
    }

    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    #[inline]
    pub(crate) fn counter(&self) -> u64 {
        self.counter
    }

    /// Appends a turn's value to the journal and output.
    ///
    /// Nothing is recorded if the journal rejects the event, so output and
    /// journal never disagree.
    pub(crate) fn record(
        &mut self,
        role: &RoleId,
        counter: u64,
        value: V,
    ) -> Result<TurnEvent, ReplayError> {
        let event = TurnEvent::new(self.next_sequence, nanos_since_epoch(), role.clone(), counter);
        if let Some(journal) = self.journal.as_mut() {
            journal.append(event.clone())?;
        }
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.output.push(value);
        Ok(event)
    }

    /// Moves to `next`; marks the run completed when nothing is left.
    ///
    /// Returns `true` if the run is now done.
    pub(crate) fn advance(&mut self, next: TurnState, turns: &TurnPredicate) -> bool {
        debug_assert!(next.counter >= self.counter, "counter must not decrease");
        self.counter = next.counter;
        self.anchor_due = next.anchor_due;
        if turns.is_finished(next) {
            self.stop(RunStatus::Completed);
        }
        self.done
    }

    /// Marks the run done. The first status wins; `done` never reverts.
    ///
    /// Returns `true` if this call stopped the run.
    pub(crate) fn stop(&mut self, status: RunStatus) -> bool {
        if self.done {
            return false;
        }
        self.done = true;
        self.status = Some(status);
        true
    }

    /// Records a fault as the run's status.
    pub(crate) fn fault(&mut self, fault: ActionFault) -> bool {
        self.stop(RunStatus::Faulted(fault))
    }

    /// Takes the final output, status and journal.
    ///
    /// Returns `None` if they were already taken.
    pub(crate) fn take_results(&mut self) -> Option<(Vec<V>, RunStatus, InMemoryJournal)> {
        let status = self.status.take()?;
        let journal = self.journal.take().unwrap_or_default();
        Some((std::mem::take(&mut self.output), status, journal))
    }
}

/// State, wakers and bookkeeping shared by a Sequencer and its runners.
pub(crate) struct Shared<V> {
    pub(crate) state: Mutex<SharedState<V>>,
    pub(crate) turns: TurnPredicate,
    wakers: Vec<Notify>,
    wake: WakePolicy,
    live: AtomicUsize,
    exited: Notify,
}

impl<V> Shared<V> {
    pub(crate) fn new(turns: TurnPredicate, wake: WakePolicy, journal: bool) -> Self {
        let initial = turns.initial_state();
        let finished = turns.is_finished(initial);
        let wakers = (0..turns.len()).map(|_| Notify::new()).collect();
        Self {
            state: Mutex::new(SharedState::new(
                initial,
                finished,
                journal.then(InMemoryJournal::new),
            )),
            turns,
            wakers,
            wake,
            live: AtomicUsize::new(0),
            exited: Notify::new(),
        }
    }

    /// Waits until role `index` is woken.
    ///
    /// A wake sent while the role is not waiting is kept as a permit, so the
    /// next call returns immediately.
    pub(crate) async fn wait_turn(&self, index: usize) {
        if let Some(waker) = self.wakers.get(index) {
            waker.notified().await;
        }
    }

    /// Wakes runners after a turn by `actor` moved the run to `next`.
    pub(crate) fn wake_after(&self, actor: usize, next: TurnState, done: bool) {
        if done {
            self.wake_all();
            return;
        }
        match self.wake {
            WakePolicy::Targeted => {
                if let Some(index) = self.turns.next(next).filter(|&i| i != actor) {
                    self.wakers[index].notify_one();
                }
            }
            WakePolicy::Broadcast => {
                for (index, waker) in self.wakers.iter().enumerate() {
                    if index != actor {
                        waker.notify_one();
                    }
                }
            }
        }
    }

    /// Wakes every runner.
    pub(crate) fn wake_all(&self) {
        for waker in &self.wakers {
            waker.notify_one();
        }
    }

    /// Registers `count` runners about to be spawned.
    pub(crate) fn enter(&self, count: usize) {
        self.live.fetch_add(count, Ordering::AcqRel);
    }

    /// Deregisters one runner and wakes anyone waiting for exits.
    pub(crate) fn leave(&self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        self.exited.notify_waiters();
    }

    /// Number of runners that have not exited yet.
    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Stops the run with `status`, wakes every runner and waits until all
    /// of them have exited.
    ///
    /// Returns `true` if this call stopped the run.
    pub(crate) async fn shutdown(&self, status: RunStatus) -> bool {
        let stopped = self.state.lock().await.stop(status);
        self.wake_all();

        loop {
            let exited = self.exited.notified();
            let mut exited = std::pin::pin!(exited);
            // register before checking so a concurrent exit is not missed
            exited.as_mut().enable();
            if self.live() == 0 {
                break;
            }
            exited.await;
        }
        stopped
    }
}
