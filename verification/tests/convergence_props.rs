//! Property tests: any interleaving of completion signals settles at most once.

use ekyc_types::{SessionId, VerificationStatus, VerifiedIdentity};
use ekyc_verification::reconciler::{
    AttemptOutcome, Effect, ListenerAction, MessageKind, PollObservation, Reconciler, Signal,
};
use ekyc_verification::Notice;
use proptest::prelude::*;
use std::time::Duration;

const GENERATION: u64 = 7;

fn identity() -> VerifiedIdentity {
    VerifiedIdentity {
        full_name: "Tran Thi B".into(),
        id_number: "079123456789".into(),
        address: "5 Nguyen Hue, Ben Nghe, Ho Chi Minh City".into(),
    }
}

fn session() -> SessionId {
    SessionId::new("sess-prop").unwrap()
}

fn arb_signal() -> impl Strategy<Value = Signal> {
    let current = GENERATION;
    let stale = GENERATION - 1;
    prop_oneof![
        Just(Signal::Poll {
            generation: current,
            observation: PollObservation::Verified(identity()),
        }),
        Just(Signal::Poll {
            generation: current,
            observation: PollObservation::Failed("rejected".into()),
        }),
        Just(Signal::Poll {
            generation: current,
            observation: PollObservation::TimedOut {
                after: Duration::from_secs(300)
            },
        }),
        Just(Signal::Poll {
            generation: stale,
            observation: PollObservation::Verified(identity()),
        }),
        Just(Signal::PopupClosed { generation: current }),
        Just(Signal::PopupClosed { generation: stale }),
        Just(Signal::Message(ListenerAction {
            session_id: session(),
            kind: MessageKind::Verified,
        })),
        Just(Signal::Message(ListenerAction {
            session_id: session(),
            kind: MessageKind::CloseRequested,
        })),
        Just(Signal::Message(ListenerAction {
            session_id: SessionId::new("sess-other").unwrap(),
            kind: MessageKind::Verified,
        })),
    ]
}

/// Status and outcome the first settling signal should produce.
fn expected_settlement(signal: &Signal) -> Option<(VerificationStatus, AttemptOutcome)> {
    match signal {
        Signal::Poll {
            generation: GENERATION,
            observation,
        } => Some(match observation {
            PollObservation::Verified(identity) => (
                VerificationStatus::Verified,
                AttemptOutcome::Verified(identity.clone()),
            ),
            PollObservation::Failed(reason) => (
                VerificationStatus::Failed,
                AttemptOutcome::Failed(reason.clone()),
            ),
            PollObservation::TimedOut { after } => (
                VerificationStatus::Timeout,
                AttemptOutcome::TimedOut { after: *after },
            ),
        }),
        Signal::PopupClosed {
            generation: GENERATION,
        } => Some((VerificationStatus::Idle, AttemptOutcome::Cancelled)),
        _ => None,
    }
}

proptest! {
    #[test]
    fn at_most_one_notice_and_first_settler_wins(
        signals in prop::collection::vec(arb_signal(), 1..16)
    ) {
        let mut reconciler = Reconciler::new();
        reconciler.begin(GENERATION, session());

        let mut effects = Vec::new();
        for signal in signals.clone() {
            effects.extend(reconciler.apply(signal));
        }

        let notices: Vec<&Notice> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify(n) => Some(n),
                _ => None,
            })
            .collect();
        let identities = effects
            .iter()
            .filter(|e| matches!(e, Effect::ApplyIdentity(_)))
            .count();
        let stops = effects
            .iter()
            .filter(|e| matches!(e, Effect::StopPolling))
            .count();

        match signals.iter().find_map(expected_settlement) {
            Some((status, outcome)) => {
                prop_assert_eq!(notices.len(), 1);
                prop_assert_eq!(stops, 1);
                prop_assert_eq!(reconciler.status(), status);
                prop_assert_eq!(identities, usize::from(status == VerificationStatus::Verified));
                prop_assert_eq!(reconciler.outcome(), Some(&outcome));
            }
            None => {
                prop_assert!(notices.is_empty());
                prop_assert_eq!(identities, 0);
                prop_assert_eq!(reconciler.status(), VerificationStatus::Polling);
                prop_assert!(!reconciler.is_settled());
            }
        }
    }

    #[test]
    fn foreign_sessions_and_stale_generations_are_inert(
        signals in prop::collection::vec(arb_signal(), 0..16)
    ) {
        let mut reconciler = Reconciler::new();
        reconciler.begin(GENERATION, session());

        for signal in signals {
            let inert = match &signal {
                Signal::Poll { generation, .. } | Signal::PopupClosed { generation } => {
                    *generation != GENERATION
                }
                Signal::Message(action) => action.session_id != session(),
            };
            let effects = reconciler.apply(signal);
            if inert {
                prop_assert!(effects.is_empty());
            }
        }
    }
}
