/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! The zero / odd / even interleaving.
//!
//! Three roles print `0102030405…`: the `zero` anchor emits `0` before every
//! number, `odd` emits the odd numbers and `even` the even ones.

use super::config::SequencerConfig;
use super::core::Sequencer;
use super::error::ConfigError;
use super::role::{self, RoleSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role name of the anchor.
pub const ZERO: &str = "zero";
/// Role name of the odd worker.
pub const ODD: &str = "odd";
/// Role name of the even worker.
pub const EVEN: &str = "even";

/// One emitted element of the interleaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    /// Emitted by the anchor; rendered as `0`.
    Anchor,

    /// Emitted by a worker.
    Value(u64),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anchor => f.write_str("0"),
            Self::Value(n) => write!(f, "{n}"),
        }
    }
}

/// The three role descriptors, anchor first.
#[must_use]
pub fn roles() -> Vec<RoleSpec<Token>> {
    vec![
        RoleSpec::new(ZERO, role::anchor_turn(), |_| Ok(Token::Anchor)),
        RoleSpec::new(ODD, role::odd(), |n| Ok(Token::Value(n))),
        RoleSpec::new(EVEN, role::even(), |n| Ok(Token::Value(n))),
    ]
}

/// Default options for `target`: counters `1..=target`, role 0 as anchor.
#[must_use]
pub fn config(target: u64) -> SequencerConfig {
    SequencerConfig::new(target).with_anchor(0)
}

/// Builds a Sequencer printing the interleaving up to `target`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTarget`] for `target == u64::MAX`.
pub fn zero_odd_even(target: u64) -> Result<Sequencer<Token>, ConfigError> {
    Sequencer::configure(roles(), config(target))
}

/// The output a run with `config` must produce.
///
/// # Examples
///
/// ```
/// use turn_sequencer::sequencer::interleave::{self, Token};
///
/// let expected = interleave::expected(&interleave::config(2));
/// assert_eq!(expected, vec![Token::Anchor, Token::Value(1), Token::Anchor, Token::Value(2)]);
/// assert_eq!(interleave::render(&expected), "0102");
/// ```
#[must_use]
pub fn expected(config: &SequencerConfig) -> Vec<Token> {
    let anchored = config.anchor_role.is_some();
    if config.is_empty_range() {
        return if anchored && config.anchor_on_empty {
            vec![Token::Anchor]
        } else {
            Vec::new()
        };
    }

    (config.start..=config.target)
        .flat_map(|n| {
            anchored
                .then_some(Token::Anchor)
                .into_iter()
                .chain(std::iter::once(Token::Value(n)))
        })
        .collect()
}

/// Renders tokens as one string, e.g. `"0102030405"`.
#[must_use]
pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(Token::to_string).collect()
}
