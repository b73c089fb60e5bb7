/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Turn eligibility and state transitions.
//!
//! [`TurnPredicate`] is the single authority on which role acts next and on
//! how the shared state evolves after a turn. It holds no mutable state: the
//! same inputs always produce the same answer, which is what makes the output
//! order of a run independent of task scheduling.

use super::config::SequencerConfig;
use super::error::ConfigError;
use super::role::{Predicate, RoleId, TurnState};
use std::fmt;

/// Result of evaluating every role predicate against one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// Exactly one role may act.
    Role(usize),

    /// No role may act.
    None,

    /// Several roles claim the turn (configuration error).
    Ambiguous(Vec<usize>),
}

/// Composite eligibility rule over all configured roles.
///
/// # Examples
///
/// ```
/// use turn_sequencer::sequencer::{Eligibility, RoleSpec, SequencerConfig, TurnPredicate, TurnState, role};
///
/// let roles: Vec<RoleSpec<u64>> = vec![
///     RoleSpec::new("zero", role::anchor_turn(), |_| Ok(0)),
///     RoleSpec::new("odd", role::odd(), |n| Ok(n)),
///     RoleSpec::new("even", role::even(), |n| Ok(n)),
/// ];
/// let turns = TurnPredicate::new(&roles, &SequencerConfig::new(3).with_anchor(0));
///
/// assert_eq!(turns.eligible(TurnState::new(1, true)), Eligibility::Role(0));
/// assert_eq!(turns.eligible(TurnState::new(1, false)), Eligibility::Role(1));
/// assert_eq!(turns.eligible(TurnState::new(2, false)), Eligibility::Role(2));
/// ```
#[derive(Clone)]
pub struct TurnPredicate {
    roles: Vec<(RoleId, Predicate)>,
    anchor: Option<usize>,
    start: u64,
    target: u64,
    anchor_on_empty: bool,
}

impl TurnPredicate {
    /// Builds the composite predicate from role descriptors and run options.
    ///
    /// No validation happens here; see [`validate`](Self::validate).
    #[must_use]
    pub fn new<V>(roles: &[super::RoleSpec<V>], config: &SequencerConfig) -> Self {
        Self {
            roles: roles
                .iter()
                .map(|role| (role.id.clone(), role.predicate.clone()))
                .collect(),
            anchor: config.anchor_role,
            start: config.start,
            target: config.target,
            anchor_on_empty: config.anchor_on_empty,
        }
    }

    /// Returns the number of roles.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns `true` if no roles are configured.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Returns the identity of the role at `index`.
    #[must_use]
    pub fn role_id(&self, index: usize) -> Option<&RoleId> {
        self.roles.get(index).map(|(id, _)| id)
    }

    /// Returns `true` if `index` is the anchor role.
    #[inline]
    #[must_use]
    pub fn is_anchor(&self, index: usize) -> bool {
        self.anchor == Some(index)
    }

    /// Inclusive upper bound of the counter.
    #[inline]
    #[must_use]
    pub fn target(&self) -> u64 {
        self.target
    }

    /// State of a run before its first turn.
    #[must_use]
    pub fn initial_state(&self) -> TurnState {
        let in_range = self.start <= self.target;
        TurnState::new(
            self.start,
            self.anchor.is_some() && (in_range || self.anchor_on_empty),
        )
    }

    /// Returns `true` once no further turn can be granted.
    #[inline]
    #[must_use]
    pub fn is_finished(&self, state: TurnState) -> bool {
        state.counter > self.target && !state.anchor_due
    }

    /// Evaluates every role predicate against `state`.
    #[must_use]
    pub fn eligible(&self, state: TurnState) -> Eligibility {
        let mut matching = self
            .roles
            .iter()
            .enumerate()
            .filter(|(_, (_, predicate))| predicate(state))
            .map(|(index, _)| index);

        match (matching.next(), matching.next()) {
            (None, _) => Eligibility::None,
            (Some(index), None) => Eligibility::Role(index),
            (Some(first), Some(second)) => {
                let mut all = vec![first, second];
                all.extend(matching);
                Eligibility::Ambiguous(all)
            }
        }
    }

    /// Returns the role that acts next, or `None` once the run is finished
    /// or the state is not uniquely covered.
    #[must_use]
    pub fn next(&self, state: TurnState) -> Option<usize> {
        if self.is_finished(state) {
            return None;
        }
        match self.eligible(state) {
            Eligibility::Role(index) => Some(index),
            _ => None,
        }
    }

    /// Applies the turn of role `index` to `state`.
    ///
    /// The anchor clears `anchor_due` and leaves the counter alone. A worker
    /// advances the counter by one and re-arms the anchor if another worker
    /// turn remains.
    #[must_use]
    pub fn transition(&self, state: TurnState, index: usize) -> TurnState {
        if self.is_anchor(index) {
            return TurnState::new(state.counter, false);
        }
        let counter = state.counter.saturating_add(1);
        TurnState::new(counter, self.anchor.is_some() && counter <= self.target)
    }

    /// Walks every reachable state and checks that exactly one role is
    /// eligible in each, with the anchor gating every worker turn.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTarget`] if the counter could not move
    /// past the target, otherwise [`ConfigError::Gap`],
    /// [`ConfigError::Overlap`], [`ConfigError::AnchorOutOfTurn`] or
    /// [`ConfigError::AnchorBypassed`] for the first offending state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target == u64::MAX {
            return Err(ConfigError::InvalidTarget {
                target: self.target,
            });
        }

        let mut state = self.initial_state();
        while !self.is_finished(state) {
            let index = match self.eligible(state) {
                Eligibility::Role(index) => index,
                Eligibility::None => {
                    return Err(ConfigError::Gap {
                        counter: state.counter,
                        anchor_due: state.anchor_due,
                    });
                }
                Eligibility::Ambiguous(indices) => {
                    return Err(ConfigError::Overlap {
                        counter: state.counter,
                        anchor_due: state.anchor_due,
                        roles: indices
                            .into_iter()
                            .filter_map(|i| self.role_id(i).cloned())
                            .collect(),
                    });
                }
            };

            let role = || self.role_id(index).cloned().unwrap_or_else(|| RoleId::new("?"));
            if self.is_anchor(index) && !state.anchor_due {
                return Err(ConfigError::AnchorOutOfTurn {
                    role: role(),
                    counter: state.counter,
                });
            }
            if !self.is_anchor(index) && state.anchor_due {
                return Err(ConfigError::AnchorBypassed {
                    role: role(),
                    counter: state.counter,
                });
            }

            state = self.transition(state, index);
        }
        Ok(())
    }

    /// Returns the full schedule of `(role index, counter)` pairs a run
    /// produces, in order.
    ///
    /// Stops early at the first state that is not uniquely covered.
    #[must_use]
    pub fn schedule(&self) -> Vec<(usize, u64)> {
        let mut turns = Vec::new();
        let mut state = self.initial_state();
        while let Some(index) = self.next(state) {
            turns.push((index, state.counter));
            state = self.transition(state, index);
        }
        turns
    }
}

impl fmt::Debug for TurnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnPredicate")
            .field(
                "roles",
                &self.roles.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .field("anchor", &self.anchor)
            .field("start", &self.start)
            .field("target", &self.target)
            .field("anchor_on_empty", &self.anchor_on_empty)
            .finish()
    }
}
