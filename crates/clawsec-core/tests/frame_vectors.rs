//! Agent frame vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::Bytes;

use clawsec_core::protocol::frame::decode_frame;

use vector_loader::load;

#[test]
fn frame_vectors() {
    let files = [
        "frame_claimed.json",
        "frame_unclaimed.json",
        "frame_foreign_prefix.json",
        "frame_header_only.json",
    ];

    for f in files {
        let v = load(f);
        let frame = decode_frame(Bytes::from(v.frame.decode()));
        let ex = v.expect.expect("missing expect block");

        assert_eq!(frame.agent_id, ex["agent_id"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(frame.claimed, ex["claimed"].as_bool().unwrap(), "vector={}", v.description);
        assert_eq!(
            frame.payload.len() as u64,
            ex["payload_len"].as_u64().unwrap(),
            "vector={}",
            v.description
        );
    }
}
