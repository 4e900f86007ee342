// SPDX-License-Identifier: Apache-2.0

//! Canonical JSON encoding.
//!
//! Objects are emitted with keys in byte order and no incidental whitespace,
//! so two encodings of equal values are byte-identical regardless of how the
//! value was assembled.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::fingerprint::Fingerprint;

#[derive(Debug, Clone)]
pub struct CanonicalJson(Value);

impl CanonicalJson {
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        let raw = serde_json::to_value(value)?;
        Ok(Self(normalize_json_value(raw)))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    pub fn fingerprint(&self) -> Result<Fingerprint> {
        let bytes = self.to_bytes()?;
        Ok(Fingerprint::of_bytes(&bytes))
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

pub fn stable_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    CanonicalJson::from_serialize(value)?.to_bytes()
}

pub fn stable_json_hash_hex<T: Serialize>(value: &T) -> Result<String> {
    Ok(CanonicalJson::from_serialize(value)?.fingerprint()?.to_hex())
}

fn normalize_json_value(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(normalize_json_number(n)),
        Value::Array(items) => items.into_iter().map(normalize_json_value).collect(),
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, inner)| (key, normalize_json_value(inner)))
                .collect();
            Value::Object(ordered.into_iter().collect::<Map<String, Value>>())
        }
        scalar => scalar,
    }
}

// -0.0 and 0.0 must encode identically.
fn normalize_json_number(number: serde_json::Number) -> serde_json::Number {
    if number.is_f64() {
        if let Some(value) = number.as_f64() {
            if value == 0.0 {
                return serde_json::Number::from(0);
            }
        }
    }
    number
}

#[cfg(test)]
mod tests {
    use super::{stable_json_bytes, stable_json_hash_hex};
    use serde_json::json;

    #[test]
    fn nested_compound_records_encode_with_sorted_keys() {
        let record = json!({
            "smiles": "O",
            "inchikey": "XLYOFNOQVPJJNP-UHFFFAOYSA-N",
            "xref": {"seed": ["cpd00001"], "chebi": ["15377"]},
            "stoichiometry": [{"MNXM2": 2, "MNXM1": -1}],
        });

        let text = String::from_utf8(stable_json_bytes(&record).expect("encode")).expect("utf8");
        assert_eq!(
            text,
            r#"{"inchikey":"XLYOFNOQVPJJNP-UHFFFAOYSA-N","smiles":"O","stoichiometry":[{"MNXM1":-1,"MNXM2":2}],"xref":{"chebi":["15377"],"seed":["cpd00001"]}}"#
        );
    }

    #[test]
    fn negative_zero_encodes_like_zero() {
        let a = stable_json_bytes(&json!({"coef": -0.0})).expect("neg zero");
        let b = stable_json_bytes(&json!({"coef": 0.0})).expect("zero");
        assert_eq!(a, b);
        assert_eq!(String::from_utf8(a).expect("utf8"), r#"{"coef":0}"#);
    }

    #[test]
    fn hash_ignores_insertion_order() {
        let forward = stable_json_hash_hex(&json!({"MNXR10": 1, "MNXR11": -1})).expect("forward");
        let reverse = stable_json_hash_hex(&json!({"MNXR11": -1, "MNXR10": 1})).expect("reverse");
        assert_eq!(forward, reverse);
        assert_eq!(forward.len(), 128);
    }
}
