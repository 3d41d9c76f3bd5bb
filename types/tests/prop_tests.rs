use proptest::prelude::*;

use ekyc_types::{Origin, SessionId, Timestamp, VerificationStatus};

fn status_strategy() -> impl Strategy<Value = VerificationStatus> {
    prop_oneof![
        Just(VerificationStatus::Idle),
        Just(VerificationStatus::Polling),
        Just(VerificationStatus::Verified),
        Just(VerificationStatus::Failed),
        Just(VerificationStatus::Timeout),
    ]
}

proptest! {
    /// Timestamp ordering: from_millis(a) <= from_millis(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
    }

    /// Any non-blank string is a valid session id and displays unchanged.
    #[test]
    fn session_id_preserves_content(raw in "[A-Za-z0-9_-]{1,64}") {
        let id = SessionId::new(raw.clone()).unwrap();
        prop_assert_eq!(id.to_string(), raw);
    }

    /// An origin always matches any URL path on the same origin.
    #[test]
    fn origin_ignores_path_and_query(path in "[a-z0-9/]{0,32}", query in "[a-z0-9=&]{0,16}") {
        let origin = Origin::parse("https://booking.example").unwrap();
        let url = format!("https://booking.example/{path}?{query}");
        prop_assert!(origin.matches(&url));
    }

    /// Status serializes to its lowercase name.
    #[test]
    fn status_serializes_to_name(status in status_strategy()) {
        let json = serde_json::to_string(&status).unwrap();
        prop_assert_eq!(json, format!("\"{}\"", status.as_str()));
    }
}
