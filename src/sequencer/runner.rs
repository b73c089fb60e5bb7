/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Per-role control loop.
//!
//! ```text
//! loop {
//!   ├─► lock state
//!   ├─► done?            ─► Terminated (exit)
//!   ├─► predicate false  ─► unlock, wait for wake (Waiting), continue
//!   └─► predicate true   ─► Acting: action(counter) once, under the lock
//!         ├─ Err / panic ─► stop run as Faulted, wake all, exit
//!         └─ Ok(value)   ─► Advancing: record, transition, unlock, wake next
//! }
//! ```
//!
//! State is always mutated before any wake is sent, and predicates are only
//! evaluated under the lock, so a wake can never be lost.

use super::error::ActionFault;
use super::event::TurnEvent;
use super::report::RunnerExit;
use super::role::{ActionError, Predicate, RoleAction, RoleId, RoleSpec, TurnState};
use super::state::{Shared, SharedState};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Listener invoked for every granted turn.
pub(crate) type TurnListener = Arc<dyn Fn(&TurnEvent) + Send + Sync>;

/// Deregisters a runner from the live count when dropped, including when
/// its task is aborted before it ever ran.
struct LiveGuard<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Drop for LiveGuard<V> {
    fn drop(&mut self) {
        self.shared.leave();
    }
}

/// Drives one role until the run is done.
pub(crate) struct RoleRunner<V> {
    index: usize,
    id: RoleId,
    predicate: Predicate,
    action: RoleAction<V>,
    listeners: Arc<[TurnListener]>,
    shared: Arc<Shared<V>>,
    _live: LiveGuard<V>,
}

impl<V: Send + 'static> RoleRunner<V> {
    /// Creates a runner for the role at `index`.
    ///
    /// The runner counts as live from this point on.
    pub(crate) fn new(
        index: usize,
        spec: RoleSpec<V>,
        listeners: Arc<[TurnListener]>,
        shared: Arc<Shared<V>>,
    ) -> Self {
        shared.enter(1);
        Self {
            index,
            id: spec.id,
            predicate: spec.predicate,
            action: spec.action,
            listeners,
            _live: LiveGuard {
                shared: shared.clone(),
            },
            shared,
        }
    }

    /// Runs the wait / act / advance loop until the run is done.
    pub(crate) async fn run(mut self) -> RunnerExit {
        let shared = self.shared.clone();
        let mut turns = 0u64;
        let mut wakes = 0u64;

        loop {
            {
                let mut state = shared.state.lock().await;
                if state.is_done() {
                    debug!(turns, wakes, "role terminated");
                    return self.exit(turns, wakes);
                }

                let current = state.turn();
                if (self.predicate)(current) {
                    match self.take_turn(&mut state, current) {
                        Ok((next, done)) => {
                            turns += 1;
                            drop(state);
                            shared.wake_after(self.index, next, done);
                            continue;
                        }
                        Err(fault) => {
                            warn!(counter = fault.counter, error = %fault.source, "role action faulted");
                            state.fault(fault);
                            drop(state);
                            shared.wake_all();
                            return self.exit(turns, wakes);
                        }
                    }
                }
            }

            shared.wait_turn(self.index).await;
            wakes += 1;
            trace!(wakes, "role woken");
        }
    }

    /// Acting and Advancing, with the state locked.
    ///
    /// Returns the new turn state and whether the run is done.
    fn take_turn(
        &mut self,
        state: &mut SharedState<V>,
        current: TurnState,
    ) -> Result<(TurnState, bool), ActionFault> {
        let counter = current.counter;
        debug!(counter, anchor_due = current.anchor_due, "turn granted");

        let value = self.invoke_action(counter)?;
        let event = state
            .record(&self.id, counter, value)
            .map_err(|err| self.fault_at(counter, Box::new(err)))?;
        self.notify_listeners(&event, counter)?;

        let next = self.shared.turns.transition(current, self.index);
        let done = state.advance(next, &self.shared.turns);
        Ok((next, done))
    }

    fn invoke_action(&mut self, counter: u64) -> Result<V, ActionFault> {
        let action = &mut self.action;
        panic::catch_unwind(AssertUnwindSafe(|| action(counter)))
            .unwrap_or_else(|payload| Err(panic_error("action", payload)))
            .map_err(|source| self.fault_at(counter, source))
    }

    fn notify_listeners(&self, event: &TurnEvent, counter: u64) -> Result<(), ActionFault> {
        for listener in self.listeners.iter() {
            panic::catch_unwind(AssertUnwindSafe(|| listener(event)))
                .map_err(|payload| self.fault_at(counter, panic_error("listener", payload)))?;
        }
        Ok(())
    }

    fn fault_at(&self, counter: u64, source: ActionError) -> ActionFault {
        ActionFault {
            role: self.id.clone(),
            counter,
            source,
        }
    }

    fn exit(&self, turns: u64, wakes: u64) -> RunnerExit {
        RunnerExit {
            role: self.id.clone(),
            turns,
            wakes,
        }
    }
}

/// Converts a panic payload into an action error.
fn panic_error(origin: &str, payload: Box<dyn Any + Send>) -> ActionError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    format!("{origin} panicked: {message}").into()
}
