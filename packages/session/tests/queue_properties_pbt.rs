//! Property-Based Tests for the session queue
//!
//! Tests the following invariants:
//! - Only the active card accepts an outcome; rejected calls leave the queue untouched
//! - Completed set only grows and never contains a card still waiting
//! - A forgotten card comes back within the lookahead window
//! - Remembering every card finishes the session at 100% progress

use proptest::prelude::*;

use yishan_algo::{HalfLifeModel, InteractionObservation, MemoryState, SchedulerConfig};
use yishan_session::{Item, RequeuePolicy, ReviewCard, SessionError, SessionQueue};

const NOW: i64 = 1_700_000_000_000;

fn cards(n: usize) -> Vec<ReviewCard> {
    let config = SchedulerConfig::default();
    (0..n)
        .map(|i| {
            ReviewCard::new(
                Item::new(format!("w{i}"), format!("term {i}")),
                MemoryState::initial(&config, NOW),
            )
        })
        .collect()
}

fn observation(remembered: bool) -> InteractionObservation {
    if remembered {
        InteractionObservation::remembered(1500, 0)
    } else {
        InteractionObservation::forgot(8000, 1)
    }
}

fn arb_policy() -> impl Strategy<Value = RequeuePolicy> {
    prop_oneof![
        Just(RequeuePolicy::MoveToEnd),
        (1usize..6).prop_map(RequeuePolicy::Lookahead),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// PBT-1: queue invariants hold after every recorded outcome
    #[test]
    fn pbt_1_queue_invariants(
        n in 1usize..12,
        outcomes in prop::collection::vec(any::<bool>(), 0..60),
        policy in arb_policy(),
    ) {
        let model = HalfLifeModel::default();
        let mut queue = SessionQueue::start(cards(n), policy).unwrap();
        let mut now = NOW;

        for remembered in outcomes {
            let Some(active) = queue.active().map(|c| c.item.id.clone()) else {
                break;
            };
            let completed_before = queue.completed().len();
            now += 5_000;

            let record = queue
                .record_outcome(&model, &active, &observation(remembered), now)
                .unwrap();
            prop_assert_eq!(&record.item_id, &active);

            prop_assert!(queue.completed().len() >= completed_before);
            for card in queue.upcoming() {
                prop_assert!(!queue.completed().contains(card.id()));
            }

            if remembered {
                prop_assert!(queue.completed().contains(&active));
            } else {
                let position = queue.upcoming().position(|c| c.id() == active);
                prop_assert!(position.is_some());
                if let RequeuePolicy::Lookahead(k) = policy {
                    prop_assert!(position.unwrap_or(usize::MAX) <= k);
                }
            }
        }
    }

    /// PBT-2: outcomes aimed at a non-active card are rejected without side effects
    #[test]
    fn pbt_2_wrong_target_rejected(n in 2usize..10, pick in 1usize..10) {
        let model = HalfLifeModel::default();
        let mut queue = SessionQueue::start(cards(n), RequeuePolicy::default()).unwrap();
        let target = format!("w{}", pick % n);
        prop_assume!(target != "w0");

        let before: Vec<String> = queue.upcoming().map(|c| c.item.id.clone()).collect();
        let err = queue
            .record_outcome(&model, &target, &observation(true), NOW)
            .unwrap_err();
        let is_invalid_target = matches!(err, SessionError::InvalidTarget { .. });
        prop_assert!(is_invalid_target);

        let after: Vec<String> = queue.upcoming().map(|c| c.item.id.clone()).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(queue.summary().interactions, 0);
    }

    /// PBT-3: once every remaining card is remembered the session finishes
    #[test]
    fn pbt_3_recall_everything_finishes(
        n in 1usize..12,
        lapses in prop::collection::vec(any::<bool>(), 0..20),
        policy in arb_policy(),
    ) {
        let model = HalfLifeModel::default();
        let mut queue = SessionQueue::start(cards(n), policy).unwrap();
        let mut now = NOW;

        for remembered in lapses {
            let Some(active) = queue.active().map(|c| c.item.id.clone()) else {
                break;
            };
            now += 1_000;
            queue.record_outcome(&model, &active, &observation(remembered), now).unwrap();
        }

        let mut steps = 0;
        while let Some(active) = queue.active().map(|c| c.item.id.clone()) {
            now += 1_000;
            queue.record_outcome(&model, &active, &observation(true), now).unwrap();
            steps += 1;
            prop_assert!(steps <= n);
        }

        prop_assert!(queue.is_finished());
        prop_assert_eq!(queue.progress().percent, 100);
        prop_assert_eq!(queue.completed().len(), n);
        let summary = queue.summary();
        prop_assert_eq!(summary.interactions, summary.remembered + summary.forgot);
    }
}
