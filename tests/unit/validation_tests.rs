use turn_sequencer::sequencer::interleave::{self, Token};
use turn_sequencer::sequencer::role;
use turn_sequencer::{ConfigError, RoleSpec, Sequencer, SequencerConfig, TurnState};

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(
        name: &str,
        predicate: impl Fn(TurnState) -> bool + Send + Sync + 'static,
    ) -> RoleSpec<u64> {
        RoleSpec::new(name, predicate, |n| Ok(n))
    }

    // --- residue partitions ---

    #[test]
    fn test_full_residue_partition_is_valid() {
        for modulus in 1..=6u64 {
            let roles: Vec<RoleSpec<u64>> = (0..modulus)
                .map(|r| worker(&format!("r{r}"), role::residue(modulus, r)))
                .collect();
            assert!(
                Sequencer::configure(roles, SequencerConfig::new(50)).is_ok(),
                "modulus {modulus} should cover every counter"
            );
        }
    }

    #[test]
    fn test_partial_residue_partition_has_gap() {
        let roles = vec![
            worker("r0", role::residue(3, 0)),
            worker("r1", role::residue(3, 1)),
        ];

        let err = Sequencer::configure(roles, SequencerConfig::new(10)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Gap {
                counter: 2,
                anchor_due: false
            }
        ));
    }

    #[test]
    fn test_zero_modulus_matches_nothing() {
        let roles = vec![worker("never", role::residue(0, 0))];
        let err = Sequencer::configure(roles, SequencerConfig::new(1)).unwrap_err();
        assert!(matches!(err, ConfigError::Gap { counter: 1, .. }));
    }

    // --- anchored runs ---

    #[test]
    fn test_anchor_without_workers_has_gap() {
        let roles = vec![RoleSpec::new("zero", role::anchor_turn(), |_| Ok(0u64))];
        let err = Sequencer::configure(roles, SequencerConfig::new(3).with_anchor(0)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Gap {
                counter: 1,
                anchor_due: false
            }
        ));
    }

    #[test]
    fn test_anchor_predicate_without_anchor_index_is_inert() {
        // anchor_due is never set, so the "anchor" role is simply never eligible
        let roles = vec![
            RoleSpec::new("zero", role::anchor_turn(), |_| Ok(0u64)),
            worker("odd", role::odd()),
            worker("even", role::even()),
        ];
        assert!(Sequencer::configure(roles, SequencerConfig::new(4)).is_ok());
    }

    #[test]
    fn test_overlap_lists_every_claimant() {
        let roles = vec![
            worker("a", |_| true),
            worker("b", |_| true),
            worker("c", |_| true),
        ];

        match Sequencer::configure(roles, SequencerConfig::new(2)) {
            Err(ConfigError::Overlap { roles, .. }) => {
                let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                assert_eq!(names, vec!["a", "b", "c"]);
            }
            other => panic!("expected overlap, got {other:?}"),
        }
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let err = interleave::zero_odd_even(u64::MAX).unwrap_err();
        assert_eq!(err.to_string(), format!("invalid target {}", u64::MAX));

        let roles = vec![worker("a", |_| true), worker("a", |_| false)];
        let err = Sequencer::configure(roles, SequencerConfig::new(2)).unwrap_err();
        assert_eq!(err.to_string(), "duplicate role identity `a`");
    }

    // --- JSON configuration ---

    #[test]
    fn test_json_config_drives_interleaving() {
        let config = SequencerConfig::from_json(r#"{ "target": 3, "anchor_role": 0 }"#).unwrap();
        assert_eq!(config, interleave::config(3));
        assert_eq!(interleave::render(&interleave::expected(&config)), "010203");
    }

    #[test]
    fn test_json_wrong_wake_policy_rejected() {
        let err = SequencerConfig::from_json(r#"{ "target": 3, "wake": "everyone" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_expected_without_anchor() {
        let config = SequencerConfig::new(3);
        assert_eq!(
            interleave::expected(&config),
            vec![Token::Value(1), Token::Value(2), Token::Value(3)]
        );
    }
}
