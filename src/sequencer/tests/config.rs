/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Tests for configuration parsing and predicate validation.

#[cfg(test)]
mod tests {
    use crate::sequencer::interleave::{self, Token};
    use crate::sequencer::{
        ConfigError, RoleId, RoleSpec, Sequencer, SequencerConfig, TurnPredicate, TurnState,
        WakePolicy, role,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn anchor() -> RoleSpec<Token> {
        RoleSpec::new(interleave::ZERO, role::anchor_turn(), |_| Ok(Token::Anchor))
    }

    fn worker(
        name: &str,
        predicate: impl Fn(TurnState) -> bool + Send + Sync + 'static,
    ) -> RoleSpec<Token> {
        RoleSpec::new(name, predicate, |n| Ok(Token::Value(n)))
    }

    #[test]
    fn test_overlapping_workers_rejected() {
        let roles = vec![
            anchor(),
            worker("odd-a", role::odd()),
            worker("odd-b", role::odd()),
            worker(interleave::EVEN, role::even()),
        ];

        match Sequencer::configure(roles, interleave::config(5)) {
            Err(ConfigError::Overlap {
                counter,
                anchor_due,
                roles,
            }) => {
                assert_eq!(counter, 1);
                assert!(!anchor_due);
                assert_eq!(roles, vec![RoleId::from("odd-a"), RoleId::from("odd-b")]);
            }
            other => panic!("expected overlap, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_worker_is_a_gap() {
        let roles = vec![anchor(), worker(interleave::ODD, role::odd())];

        match Sequencer::configure(roles, interleave::config(5)) {
            Err(ConfigError::Gap {
                counter,
                anchor_due,
            }) => {
                assert_eq!(counter, 2);
                assert!(!anchor_due);
            }
            other => panic!("expected gap, got {other:?}"),
        }
    }

    #[test]
    fn test_gap_beyond_short_target_is_ignored() {
        // even never gets a turn when the run stops at 1
        let roles = vec![anchor(), worker(interleave::ODD, role::odd())];
        assert!(Sequencer::configure(roles, interleave::config(1)).is_ok());
    }

    #[test]
    fn test_anchor_out_of_turn_rejected() {
        let roles = vec![
            RoleSpec::new(
                interleave::ZERO,
                |s: TurnState| s.anchor_due || s.counter == 2,
                |_| Ok(Token::Anchor),
            ),
            worker(interleave::ODD, role::residue(2, 1)),
            worker(interleave::EVEN, |s| {
                !s.anchor_due && s.counter % 2 == 0 && s.counter != 2
            }),
        ];

        match Sequencer::configure(roles, interleave::config(5)) {
            Err(ConfigError::AnchorOutOfTurn { role, counter }) => {
                assert_eq!(role.as_str(), interleave::ZERO);
                assert_eq!(counter, 2);
            }
            other => panic!("expected anchor out of turn, got {other:?}"),
        }
    }

    #[test]
    fn test_worker_bypassing_anchor_rejected() {
        let roles = vec![
            RoleSpec::new(
                interleave::ZERO,
                |s: TurnState| s.anchor_due && s.counter != 1,
                |_| Ok(Token::Anchor),
            ),
            worker(interleave::ODD, |s| s.counter % 2 == 1),
            worker(interleave::EVEN, role::even()),
        ];

        match Sequencer::configure(roles, interleave::config(5)) {
            Err(ConfigError::AnchorBypassed { role, counter }) => {
                assert_eq!(role.as_str(), interleave::ODD);
                assert_eq!(counter, 1);
            }
            other => panic!("expected anchor bypass, got {other:?}"),
        }
    }

    #[test]
    fn test_no_roles_rejected() {
        let roles: Vec<RoleSpec<Token>> = Vec::new();
        assert!(matches!(
            Sequencer::configure(roles, SequencerConfig::new(3)),
            Err(ConfigError::NoRoles)
        ));
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let roles = vec![
            anchor(),
            worker(interleave::ODD, role::odd()),
            worker(interleave::ODD, role::even()),
        ];

        match Sequencer::configure(roles, interleave::config(3)) {
            Err(ConfigError::DuplicateRole { role }) => assert_eq!(role.as_str(), interleave::ODD),
            other => panic!("expected duplicate role, got {other:?}"),
        }
    }

    #[test]
    fn test_anchor_index_out_of_range() {
        let config = SequencerConfig::new(3).with_anchor(3);

        match Sequencer::configure(interleave::roles(), config) {
            Err(ConfigError::AnchorIndexOutOfRange { index, roles }) => {
                assert_eq!(index, 3);
                assert_eq!(roles, 3);
            }
            other => panic!("expected anchor index error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_evaluates_each_predicate_once_per_state() {
        let calls = Arc::new(AtomicU64::new(0));
        let counted = {
            let calls = calls.clone();
            let parity = role::odd();
            move |state: TurnState| {
                calls.fetch_add(1, Ordering::SeqCst);
                parity(state)
            }
        };
        let roles = vec![
            anchor(),
            worker(interleave::ODD, counted),
            worker(interleave::EVEN, role::even()),
        ];

        let target = 250u64;
        Sequencer::configure(roles, interleave::config(target)).unwrap();
        // one anchor state and one worker state per counter value
        assert_eq!(calls.load(Ordering::SeqCst), 2 * target);
    }

    #[test]
    fn test_max_target_rejected() {
        assert!(matches!(
            interleave::zero_odd_even(u64::MAX),
            Err(ConfigError::InvalidTarget { target: u64::MAX })
        ));
    }

    #[test]
    fn test_empty_range_is_valid() {
        assert!(interleave::zero_odd_even(0).is_ok());
        assert!(
            Sequencer::configure(
                interleave::roles(),
                interleave::config(0).with_anchor_on_empty(true)
            )
            .is_ok()
        );
    }

    #[test]
    fn test_schedule_of_interleaving() {
        let roles = interleave::roles();
        let turns = TurnPredicate::new(&roles, &interleave::config(3));
        assert!(turns.validate().is_ok());

        assert_eq!(
            turns.schedule(),
            vec![(0, 1), (1, 1), (0, 2), (2, 2), (0, 3), (1, 3)]
        );
        assert_eq!(turns.len(), 3);
        assert!(turns.is_anchor(0));
        assert!(!turns.is_anchor(1));
        assert_eq!(turns.target(), 3);
    }

    #[test]
    fn test_initial_state_with_empty_range() {
        let roles = interleave::roles();

        let quiet = TurnPredicate::new(&roles, &interleave::config(0));
        assert!(quiet.is_finished(quiet.initial_state()));
        assert!(quiet.schedule().is_empty());

        let once = TurnPredicate::new(&roles, &interleave::config(0).with_anchor_on_empty(true));
        assert!(!once.is_finished(once.initial_state()));
        assert_eq!(once.schedule(), vec![(0, 1)]);
    }

    #[test]
    fn test_config_from_json() {
        let config = SequencerConfig::from_json(
            r#"{ "target": 12, "start": 3, "anchor_role": 0, "anchor_on_empty": true, "wake": "broadcast", "journal": false }"#,
        )
        .unwrap();

        assert_eq!(config.target, 12);
        assert_eq!(config.start, 3);
        assert_eq!(config.anchor_role, Some(0));
        assert!(config.anchor_on_empty);
        assert_eq!(config.wake, WakePolicy::Broadcast);
        assert!(!config.journal);
    }

    #[test]
    fn test_config_json_defaults() {
        let config = SequencerConfig::from_json(r#"{ "target": 5 }"#).unwrap();
        assert_eq!(config, SequencerConfig::new(5));
        assert!(config.journal);
    }

    #[test]
    fn test_config_survives_json() {
        let config = interleave::config(9).with_wake(WakePolicy::Broadcast).with_start(2);
        let json = config.to_json().unwrap();
        assert_eq!(SequencerConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_negative_target_rejected() {
        let err = SequencerConfig::from_json(r#"{ "target": -1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SequencerConfig::from_json(r#"{ "target": 5, "threads": 3 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_target_rejected() {
        assert!(SequencerConfig::from_json("{}").is_err());
    }
}
