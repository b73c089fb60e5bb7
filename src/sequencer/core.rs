/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Core Sequencer implementation.
//!
//! This module provides the main Sequencer struct that drives one runner per
//! role against a single shared state and guarantees that turns are taken in
//! the deterministic order dictated by its [`TurnPredicate`].

use super::config::SequencerConfig;
use super::error::{ConfigError, SequencerError};
use super::event::TurnEvent;
use super::report::{RunReport, RunStatus, RunnerExit};
use super::role::RoleSpec;
use super::runner::{RoleRunner, TurnListener};
use super::state::Shared;
use super::turn::TurnPredicate;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Coordinates several concurrent roles that take strictly ordered turns.
///
/// A Sequencer is configured once with its roles, started once, and then
/// awaited (or cancelled). A completed Sequencer is not restarted; build a
/// fresh one for a new run.
///
/// # Examples
///
/// ```no_run
/// use turn_sequencer::sequencer::{RoleSpec, Sequencer, SequencerConfig, role};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let roles: Vec<RoleSpec<u64>> = vec![
///     RoleSpec::new("odd", role::odd(), |n| Ok(n)),
///     RoleSpec::new("even", role::even(), |n| Ok(n)),
/// ];
/// let mut sequencer = Sequencer::configure(roles, SequencerConfig::new(4))?;
/// sequencer.start()?;
///
/// let report = sequencer.await_completion(None).await?;
/// assert_eq!(report.output, vec![1, 2, 3, 4]);
/// # Ok(())
/// # }
/// ```
pub struct Sequencer<V> {
    /// Identity of this run.
    run_id: Uuid,

    /// Options the Sequencer was configured with.
    config: SequencerConfig,

    /// Shared state, wakers and turn rule.
    shared: Arc<Shared<V>>,

    /// Roles waiting to be started (taken by `start`).
    roles: Option<Vec<RoleSpec<V>>>,

    /// Listeners called synchronously for each granted turn.
    listeners: Vec<TurnListener>,

    /// Spawned runner tasks.
    tasks: JoinSet<RunnerExit>,

    /// Exit records collected so far.
    exits: Vec<RunnerExit>,

    /// Whether `start` has been called.
    started: bool,
}

impl<V: Send + 'static> Sequencer<V> {
    /// Validates the roles and options and creates a Sequencer.
    ///
    /// # Arguments
    ///
    /// * `roles` - Role descriptors, in index order
    /// * `config` - Run options
    ///
    /// Validation walks every reachable state on the calling thread and
    /// evaluates every predicate in each one, so it costs
    /// `O(target × roles)` predicate calls and cannot be cancelled. A target
    /// in the billions blocks for a long time before the run can start.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an empty role set, a duplicate role
    /// identity, an out-of-range anchor index, an unusable target, or
    /// predicates that do not cover every reachable state exactly once.
    pub fn configure(roles: Vec<RoleSpec<V>>, config: SequencerConfig) -> Result<Self, ConfigError> {
        if roles.is_empty() {
            return Err(ConfigError::NoRoles);
        }

        let mut seen = HashSet::with_capacity(roles.len());
        for role in &roles {
            if !seen.insert(role.id()) {
                return Err(ConfigError::DuplicateRole {
                    role: role.id().clone(),
                });
            }
        }

        if let Some(index) = config.anchor_role.filter(|&i| i >= roles.len()) {
            return Err(ConfigError::AnchorIndexOutOfRange {
                index,
                roles: roles.len(),
            });
        }

        let turns = TurnPredicate::new(&roles, &config);
        turns.validate()?;

        Ok(Self {
            run_id: Uuid::new_v4(),
            shared: Arc::new(Shared::new(turns, config.wake, config.journal)),
            config,
            roles: Some(roles),
            listeners: Vec::new(),
            tasks: JoinSet::new(),
            exits: Vec::new(),
            started: false,
        })
    }

    /// Registers a turn listener.
    ///
    /// Listeners are called synchronously, inside the critical section, in
    /// turn order. They must be fast. Listeners registered after `start` are
    /// not called.
    ///
    /// # Arguments
    ///
    /// * `listener` - Function to call for each granted turn
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: Fn(&TurnEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Spawns one runner task per role.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::AlreadyStarted`] if called more than once
    /// - [`SequencerError::NoRuntime`] if no tokio runtime is available
    pub fn start(&mut self) -> Result<(), SequencerError> {
        if self.started {
            return Err(SequencerError::AlreadyStarted);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SequencerError::NoRuntime)?;
        let roles = self.roles.take().ok_or(SequencerError::AlreadyStarted)?;
        self.started = true;

        info!(
            run_id = %self.run_id,
            roles = roles.len(),
            start = self.config.start,
            target = self.config.target,
            anchor = ?self.config.anchor_role,
            wake = ?self.config.wake,
            "sequencer starting"
        );

        let listeners: Arc<[TurnListener]> = self.listeners.iter().cloned().collect();
        for (index, spec) in roles.into_iter().enumerate() {
            let span = info_span!("role_runner", run_id = %self.run_id, role = %spec.id());
            let runner = RoleRunner::new(index, spec, listeners.clone(), self.shared.clone());
            self.tasks
                .spawn_on(runner.run().instrument(span), &runtime);
        }
        Ok(())
    }

    /// Waits until every runner has exited and returns the run report.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Optional bound on how long to wait
    ///
    /// # Errors
    ///
    /// - [`SequencerError::NotStarted`] if `start` has not been called
    /// - [`SequencerError::Timeout`] if the run is still going after
    ///   `timeout`; the run keeps going and the call may be repeated
    /// - [`SequencerError::ReportTaken`] if the report was already returned
    /// - [`SequencerError::RunnerLost`] if a runner task ended abnormally;
    ///   the run is cancelled first
    pub async fn await_completion(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<RunReport<V>, SequencerError> {
        if !self.started {
            return Err(SequencerError::NotStarted);
        }

        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.join_runners())
                .await
                .map_err(|_| SequencerError::Timeout { timeout: limit })??,
            None => self.join_runners().await?,
        }

        let (output, status, journal, final_counter) = {
            let mut state = self.shared.state.lock().await;
            let final_counter = state.counter();
            let (output, status, journal) =
                state.take_results().ok_or(SequencerError::ReportTaken)?;
            (output, status, journal, final_counter)
        };

        match &status {
            RunStatus::Completed => {
                info!(run_id = %self.run_id, turns = output.len(), "sequencer completed");
            }
            RunStatus::Cancelled => {
                warn!(run_id = %self.run_id, turns = output.len(), "sequencer stopped early");
            }
            RunStatus::Faulted(fault) => {
                warn!(run_id = %self.run_id, turns = output.len(), %fault, "sequencer faulted");
            }
        }

        Ok(RunReport {
            run_id: self.run_id,
            output,
            status,
            final_counter,
            journal,
            runners: std::mem::take(&mut self.exits),
        })
    }

    /// Joins runner tasks, keeping exits already collected if interrupted.
    async fn join_runners(&mut self) -> Result<(), SequencerError> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(exit) => self.exits.push(exit),
                Err(join_error) => {
                    error!(run_id = %self.run_id, error = %join_error, "role runner lost");
                    self.shared.shutdown(RunStatus::Cancelled).await;
                    return Err(SequencerError::RunnerLost {
                        reason: join_error.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Requests cooperative shutdown and waits until every runner has exited.
    ///
    /// Runners still waiting for their turn exit without acting. Returns
    /// immediately if the run was never started; a later `start` then
    /// produces an empty, cancelled run. Has no effect on the status of a run
    /// that has already stopped.
    pub async fn cancel(&self) {
        self.canceller().cancel().await;
    }

    /// Returns a cloneable handle that can cancel this run from another task.
    #[must_use]
    pub fn canceller(&self) -> Canceller<V> {
        Canceller {
            run_id: self.run_id,
            shared: self.shared.clone(),
        }
    }

    /// Returns the identity of this run.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the options this Sequencer was configured with.
    #[must_use]
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Returns the turn rule, e.g. to verify a journal afterwards.
    #[must_use]
    pub fn turn_predicate(&self) -> &TurnPredicate {
        &self.shared.turns
    }

    /// Returns `true` once `start` has been called.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl<V> fmt::Debug for Sequencer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("started", &self.started)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Handle that cancels a run from any task.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use turn_sequencer::sequencer::interleave;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut sequencer = interleave::zero_odd_even(1_000_000)?;
/// let canceller = sequencer.canceller();
/// sequencer.start()?;
///
/// tokio::spawn(async move {
///     tokio::time::sleep(Duration::from_millis(10)).await;
///     canceller.cancel().await;
/// });
///
/// let report = sequencer.await_completion(None).await?;
/// assert!(report.status.is_cancelled());
/// # Ok(())
/// # }
/// ```
pub struct Canceller<V> {
    run_id: Uuid,
    shared: Arc<Shared<V>>,
}

impl<V> Canceller<V> {
    /// Requests cooperative shutdown and waits until every runner has exited.
    pub async fn cancel(&self) {
        if self.shared.shutdown(RunStatus::Cancelled).await {
            warn!(run_id = %self.run_id, "sequencer cancellation requested");
        }
    }
}

impl<V> Clone for Canceller<V> {
    fn clone(&self) -> Self {
        Self {
            run_id: self.run_id,
            shared: self.shared.clone(),
        }
    }
}

impl<V> fmt::Debug for Canceller<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceller")
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}
