//! Inspector vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use clawsec_core::{Inspect, InspectorConfig, PayloadInspector, Verdict};

use vector_loader::load;

#[test]
fn inspect_vectors() {
    let inspector = PayloadInspector::new(InspectorConfig::default()).unwrap();
    let files = [
        "inspect_clean_play.json",
        "inspect_catalog_play.json",
        "inspect_rm_rf.json",
        "inspect_applescript.json",
        "inspect_sql_comment.json",
        "inspect_eval.json",
        "inspect_not_utf8.json",
        "inspect_malformed.json",
        "inspect_missing_jsonrpc.json",
    ];

    for f in files {
        let v = load(f);
        let verdict = inspector.inspect(&v.frame.decode());

        if let Some(err) = v.expect_error {
            let Verdict::Rejected(reason) = verdict else {
                panic!("expected rejection, vector={}", v.description);
            };
            assert_eq!(reason.client_code().as_str(), err.code, "vector={}", v.description);
            if let Some(wire) = err.reason {
                assert_eq!(reason.to_string(), wire, "vector={}", v.description);
            }
            continue;
        }

        let ex = v.expect.expect("missing expect block");
        assert_eq!(ex["verdict"].as_str(), Some("ACCEPTED"), "vector={}", v.description);
        assert!(verdict.is_accepted(), "vector={} got {verdict:?}", v.description);
    }
}

#[test]
fn oversized_payload_wins_regardless_of_content() {
    let inspector = PayloadInspector::new(InspectorConfig {
        max_payload_bytes: 64,
        ..InspectorConfig::default()
    })
    .unwrap();

    let mut clean = br#"{"jsonrpc":"2.0","method":"ping","params":{"pad":""#.to_vec();
    clean.extend(std::iter::repeat(b'a').take(64));
    clean.extend_from_slice(br#""}}"#);

    let hostile = [b"\xff".repeat(65), b"rm -rf /".repeat(10), clean];
    for raw in hostile {
        assert!(raw.len() > 64);
        let verdict = inspector.inspect(&raw);
        let Verdict::Rejected(reason) = verdict else {
            panic!("oversized payload accepted");
        };
        assert_eq!(reason.client_code().as_str(), "PAYLOAD_TOO_LARGE");
    }
}
