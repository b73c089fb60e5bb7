use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use turn_sequencer::sequencer::interleave::{self, Token};
use turn_sequencer::sequencer::replay::ReplayEngine;
use turn_sequencer::sequencer::role;
use turn_sequencer::{RoleSpec, RunStatus, Sequencer, SequencerConfig, TurnEvent};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleave_preset_prints_expected_string() {
        let mut sequencer = interleave::zero_odd_even(5).unwrap();
        sequencer.start().unwrap();

        let report = sequencer
            .await_completion(Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(report.status.as_label(), "completed");
        assert_eq!(report.turns(), 10);
        assert_eq!(
            interleave::render(&report.into_output().unwrap()),
            "0102030405"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_json_config_run_verifies_against_its_journal() {
        let config = SequencerConfig::from_json(
            r#"{ "target": 30, "anchor_role": 0, "wake": "broadcast" }"#,
        )
        .unwrap();
        let mut sequencer = Sequencer::configure(interleave::roles(), config.clone()).unwrap();
        let turns = sequencer.turn_predicate().clone();
        sequencer.start().unwrap();
        let report = sequencer.await_completion(None).await.unwrap();

        assert_eq!(report.output, interleave::expected(&config));
        let summary = ReplayEngine::verify(&report.journal, &turns).unwrap();
        assert!(summary.complete);
        assert_eq!(summary.turns, 60);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_ids_are_unique() {
        let first = interleave::zero_odd_even(1).unwrap();
        let second = interleave::zero_odd_even(1).unwrap();
        assert_ne!(first.run_id(), second.run_id());

        let mut first = first;
        let run_id = first.run_id();
        first.start().unwrap();
        assert_eq!(first.await_completion(None).await.unwrap().run_id, run_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_listeners_observe_every_turn_in_order() {
        let seen = Arc::new(AtomicU64::new(0));
        let out_of_order = Arc::new(AtomicU64::new(0));

        let mut sequencer = interleave::zero_odd_even(40).unwrap();
        {
            let seen = seen.clone();
            let out_of_order = out_of_order.clone();
            sequencer.add_listener(move |event: &TurnEvent| {
                let previous = seen.fetch_add(1, Ordering::SeqCst);
                if event.sequence_num != previous + 1 {
                    out_of_order.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        sequencer.start().unwrap();
        sequencer.await_completion(None).await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 80);
        assert_eq!(out_of_order.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stateful_action_runs_on_its_own_turns() {
        let mut calls = 0u64;
        let roles = vec![
            RoleSpec::new("counter", role::residue(2, 1), move |n| {
                calls += 1;
                Ok((n, calls))
            }),
            RoleSpec::new("echo", role::residue(2, 0), |n| Ok((n, 0))),
        ];
        let mut sequencer = Sequencer::configure(roles, SequencerConfig::new(6)).unwrap();
        sequencer.start().unwrap();
        let report = sequencer.await_completion(None).await.unwrap();

        assert_eq!(
            report.output,
            vec![(1, 1), (2, 0), (3, 2), (4, 0), (5, 3), (6, 0)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_canceller_from_another_task() {
        let roles = vec![
            RoleSpec::new("zero", role::anchor_turn(), |_| {
                std::thread::sleep(Duration::from_millis(1));
                Ok(Token::Anchor)
            }),
            RoleSpec::new("odd", role::odd(), |n| Ok(Token::Value(n))),
            RoleSpec::new("even", role::even(), |n| Ok(Token::Value(n))),
        ];
        let mut sequencer = Sequencer::configure(roles, interleave::config(1_000_000)).unwrap();
        let canceller = sequencer.canceller();
        sequencer.start().unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel().await;
        });

        let report = sequencer
            .await_completion(Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert!(matches!(report.status, RunStatus::Cancelled));
        assert!(report.into_output().is_ok());
    }
}
