/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Role descriptors and eligibility predicates.
//!
//! A role is a participant with exclusive responsibility for one class of
//! turns. It is described once, at configuration time, by a [`RoleSpec`]:
//! a unique [`RoleId`], a pure eligibility predicate over [`TurnState`], and
//! the action invoked once per granted turn.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Error type returned by a role action.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// Eligibility predicate shared between a runner and the [`TurnPredicate`].
///
/// [`TurnPredicate`]: super::TurnPredicate
pub type Predicate = Arc<dyn Fn(TurnState) -> bool + Send + Sync>;

/// Action executed by a role when it is granted a turn.
///
/// Receives the current counter value; the returned value is appended to the
/// run output. Owned exclusively by the role's runner.
pub type RoleAction<V> = Box<dyn FnMut(u64) -> Result<V, ActionError> + Send>;

/// The part of the shared state that eligibility depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnState {
    /// Current sequence position.
    pub counter: u64,

    /// `true` when the anchor role must act before any worker.
    pub anchor_due: bool,
}

impl TurnState {
    /// Creates a new turn state.
    #[must_use]
    pub fn new(counter: u64, anchor_due: bool) -> Self {
        Self {
            counter,
            anchor_due,
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "counter={} anchor_due={}", self.counter, self.anchor_due)
    }
}

/// Unique identity of a role.
///
/// # Examples
///
/// ```
/// use turn_sequencer::sequencer::RoleId;
///
/// let id = RoleId::from("odd");
/// assert_eq!(id.as_str(), "odd");
/// assert_eq!(id.to_string(), "odd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    /// Creates a role identity from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the role name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RoleId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Descriptor of one role: identity, eligibility predicate and action.
pub struct RoleSpec<V> {
    pub(crate) id: RoleId,
    pub(crate) predicate: Predicate,
    pub(crate) action: RoleAction<V>,
}

impl<V> RoleSpec<V> {
    /// Creates a new role descriptor.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique role name
    /// * `predicate` - Pure function deciding whether this role may act in a given state
    /// * `action` - Work performed once per granted turn, with the current counter
    ///
    /// The action runs while the sequencer's state is locked. It must be fast
    /// and must not wait on the same sequencer.
    ///
    /// # Examples
    ///
    /// ```
    /// use turn_sequencer::sequencer::{RoleSpec, role};
    ///
    /// let odd: RoleSpec<u64> = RoleSpec::new("odd", role::odd(), |n| Ok(n));
    /// assert_eq!(odd.id().as_str(), "odd");
    /// ```
    pub fn new<P, A>(id: impl Into<RoleId>, predicate: P, action: A) -> Self
    where
        P: Fn(TurnState) -> bool + Send + Sync + 'static,
        A: FnMut(u64) -> Result<V, ActionError> + Send + 'static,
    {
        Self {
            id: id.into(),
            predicate: Arc::new(predicate),
            action: Box::new(action),
        }
    }

    /// Returns the role identity.
    #[must_use]
    pub fn id(&self) -> &RoleId {
        &self.id
    }
}

impl<V> fmt::Debug for RoleSpec<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleSpec").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Predicate of the anchor role: eligible whenever the anchor is due.
#[must_use]
pub fn anchor_turn() -> impl Fn(TurnState) -> bool + Send + Sync + 'static {
    |state: TurnState| state.anchor_due
}

/// Predicate of a worker owning the counters with `counter % modulus == remainder`.
///
/// Never eligible while the anchor is due. A zero modulus matches nothing.
///
/// # Examples
///
/// ```
/// use turn_sequencer::sequencer::{TurnState, role};
///
/// let third = role::residue(3, 2);
/// assert!(third(TurnState::new(5, false)));
/// assert!(!third(TurnState::new(5, true)));
/// assert!(!third(TurnState::new(6, false)));
/// ```
#[must_use]
pub fn residue(modulus: u64, remainder: u64) -> impl Fn(TurnState) -> bool + Send + Sync + 'static {
    move |state: TurnState| {
        !state.anchor_due && state.counter.checked_rem(modulus) == Some(remainder)
    }
}

/// Predicate of the odd worker.
#[must_use]
pub fn odd() -> impl Fn(TurnState) -> bool + Send + Sync + 'static {
    residue(2, 1)
}

/// Predicate of the even worker.
#[must_use]
pub fn even() -> impl Fn(TurnState) -> bool + Send + Sync + 'static {
    residue(2, 0)
}
