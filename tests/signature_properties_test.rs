//! Property tests for request signing.

use platron_merchant::payments::{ParameterSet, SignatureCodec, ScriptName};
use proptest::collection::btree_map;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn params_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    let key = "pg_[a-z]{1,10}".prop_filter("signature key", |k| k != "pg_sig");
    btree_map(key, "[A-Za-z0-9 .@:/-]{1,16}", 1..12)
}

fn script_strategy() -> impl Strategy<Value = ScriptName> {
    "[a-z_]{1,12}\\.php".prop_map(|name| ScriptName::parse(&name).unwrap())
}

proptest! {
    #[test]
    fn prepared_params_verify(params in params_strategy(), script in script_strategy(), secret in "[a-zA-Z0-9]{1,24}") {
        let codec = SignatureCodec::new(secret);
        let prepared = codec.prepare_for_transmission(&script, params.into_iter().collect());
        prop_assert!(codec.verify(&script, &prepared));
    }

    #[test]
    fn changed_value_breaks_signature(params in params_strategy(), index in any::<prop::sample::Index>()) {
        let codec = SignatureCodec::new("secret");
        let script = ScriptName::parse("init_payment.php").unwrap();
        let mut prepared = codec.prepare_for_transmission(&script, params.clone().into_iter().collect());

        let key = index.get(&params.keys().collect::<Vec<_>>()).to_string();
        let tampered = format!("{}x", params[&key]);
        prepared.insert(key, tampered);

        prop_assert!(!codec.verify(&script, &prepared));
    }

    #[test]
    fn signature_ignores_insertion_order(params in params_strategy()) {
        let codec = SignatureCodec::new("secret");
        let script = ScriptName::parse("ps_list.php").unwrap();

        let forward: ParameterSet = params.clone().into_iter().collect();
        let backward: ParameterSet = params.into_iter().rev().collect();

        prop_assert_eq!(codec.sign(&script, &forward), codec.sign(&script, &backward));
    }

    #[test]
    fn signature_depends_on_script(params in params_strategy()) {
        let codec = SignatureCodec::new("secret");
        let params: ParameterSet = params.into_iter().collect();

        let status = ScriptName::parse("get_status.php").unwrap();
        let revoke = ScriptName::parse("revoke.php").unwrap();
        prop_assert_ne!(codec.sign(&status, &params), codec.sign(&revoke, &params));
    }

    #[test]
    fn changed_script_fails_verification(
        params in params_strategy(),
        signed_for in script_strategy(),
        checked_for in script_strategy(),
    ) {
        prop_assume!(signed_for != checked_for);

        let codec = SignatureCodec::new("secret");
        let prepared = codec.prepare_for_transmission(&signed_for, params.into_iter().collect());

        prop_assert!(codec.verify(&signed_for, &prepared));
        prop_assert!(!codec.verify(&checked_for, &prepared));
    }

    #[test]
    fn prepared_params_carry_no_empty_values(
        params in params_strategy(),
        blanks in proptest::collection::vec("pg_blank_[a-z]{1,6}", 0..5),
        nulls in proptest::collection::vec("pg_null_[a-z]{1,6}", 0..5),
    ) {
        let codec = SignatureCodec::new("secret");
        let script = ScriptName::parse("init_payment.php").unwrap();

        let mut input: ParameterSet = params.into_iter().collect();
        for key in blanks {
            input.insert(key, "");
        }
        for key in nulls {
            input.insert_opt(key, None::<String>);
        }

        let prepared = codec.prepare_for_transmission(&script, input);
        for (key, value) in prepared.iter() {
            prop_assert!(value.is_some_and(|v| !v.is_empty()), "{} kept an empty value", key);
            prop_assert!(!key.starts_with("pg_blank_") && !key.starts_with("pg_null_"));
        }
        prop_assert!(prepared.contains_key("pg_sig"));
    }
}
