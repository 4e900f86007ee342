use proptest::prelude::*;
use rrcache_core::{canonical, Fingerprint};
use serde_json::json;

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_:-]{1,24}"
}

proptest! {
    #[test]
    fn fingerprint_hex_round_trips(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
        let fp = Fingerprint::of_bytes(&payload);
        let parsed = Fingerprint::parse(&fp.to_hex()).expect("parse hex");
        prop_assert_eq!(parsed, fp);
    }

    #[test]
    fn stable_json_bytes_are_independent_of_object_key_order(
        a in identifier_strategy(),
        b in identifier_strategy(),
        av in any::<u32>(),
        bv in any::<u32>(),
    ) {
        prop_assume!(a != b);

        let left = json!({a.clone(): av, b.clone(): bv});
        let right = json!({b: bv, a: av});

        let left_bytes = canonical::stable_json_bytes(&left).expect("canonical left");
        let right_bytes = canonical::stable_json_bytes(&right).expect("canonical right");

        prop_assert_eq!(left_bytes, right_bytes);
    }

    #[test]
    fn finite_floats_survive_canonical_encoding(x in -1.0e6_f64..1.0e6_f64) {
        let bytes = canonical::stable_json_bytes(&json!({"coef": x})).expect("encode");
        let back: serde_json::Value = serde_json::from_slice(&bytes).expect("decode");
        let decoded = back["coef"].as_f64().expect("number");
        prop_assert_eq!(decoded, if x == 0.0 { 0.0 } else { x });
    }
}
