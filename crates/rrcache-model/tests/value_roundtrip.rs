// SPDX-License-Identifier: Apache-2.0

use rrcache_core::canonical::stable_json_bytes;
use rrcache_model::{
    Attribute, AttributeValue, CompoundRecord, ReactionRecord, RuleReactionLink, XrefTable,
};
use std::collections::BTreeMap;

fn round_trip(attr: Attribute, value: AttributeValue) {
    let bytes = stable_json_bytes(&value).expect("encode");
    let decoded = AttributeValue::from_json_slice(attr, &bytes).expect("decode");
    assert_eq!(decoded, value, "round trip for {attr}");
    assert!(decoded.fits(attr));
}

#[test]
fn every_attribute_shape_round_trips() {
    let redirects = BTreeMap::from([("MNXM99".to_string(), "MNXM1".to_string())]);
    round_trip(
        Attribute::DeprecatedCompoundIds,
        AttributeValue::Redirects(redirects.clone()),
    );
    round_trip(
        Attribute::DeprecatedCompartmentIds,
        AttributeValue::ForeignIndex(redirects.clone()),
    );
    round_trip(
        Attribute::CompoundNames,
        AttributeValue::Names(BTreeMap::from([("MNXM1".to_string(), "H(+)".to_string())])),
    );

    let mut compounds = BTreeMap::new();
    compounds.insert(
        "MNXM1".to_string(),
        CompoundRecord {
            formula: Some("H".to_string()),
            smiles: Some("[H+]".to_string()),
            inchi: Some("InChI=1S/p+1".to_string()),
            inchikey: Some("GPRLSGONYQIRFK-UHFFFAOYSA-N".to_string()),
            name: None,
            xref: Some(BTreeMap::from([(
                "chebi".to_string(),
                vec!["15378".to_string(), "10744".to_string()],
            )])),
        },
    );
    compounds.insert("MNXM2".to_string(), CompoundRecord::default());
    round_trip(
        Attribute::CompoundStructures,
        AttributeValue::Compounds(compounds),
    );

    let mut xref = XrefTable::default();
    xref.forward.insert(
        "MNXM1".to_string(),
        BTreeMap::from([("chebi".to_string(), vec!["123".to_string()])]),
    );
    xref.reverse.insert(
        "chebi".to_string(),
        BTreeMap::from([("123".to_string(), "MNXM1".to_string())]),
    );
    round_trip(Attribute::CompoundXref, AttributeValue::Xref(xref));

    round_trip(
        Attribute::InchikeyCompounds,
        AttributeValue::InchikeyIndex(BTreeMap::from([(
            "NO_INCHIKEY".to_string(),
            vec!["MNXM2".to_string(), "MNXM3".to_string()],
        )])),
    );

    let link = RuleReactionLink {
        rule_id: "RR-02-a".to_string(),
        rule_score: 0.315_107_598_320_635_3,
        reac_id: "MNXR1".to_string(),
        subs_id: "MNXM4".to_string(),
        rel_direction: -1,
        left: BTreeMap::from([("MNXM4".to_string(), 1.0)]),
        right: BTreeMap::from([("MNXM20".to_string(), 2.0), ("MNXM5".to_string(), 0.5)]),
        left_excluded: Some(vec!["MNXM1".to_string()]),
        right_excluded: None,
        extra: BTreeMap::from([("ec_number".to_string(), "1.1.1.1".to_string())]),
    };
    round_trip(
        Attribute::RuleReactions,
        AttributeValue::RuleLinks(BTreeMap::from([(
            "RR-02-a".to_string(),
            BTreeMap::from([("MNXR1".to_string(), link)]),
        )])),
    );

    let reaction = ReactionRecord {
        left: BTreeMap::from([("MNXM4660".to_string(), 1.0)]),
        right: BTreeMap::from([("MNXM97172".to_string(), 0.0)]),
        direction: 0,
        main_left: vec!["MNXM4660".to_string()],
        main_right: vec!["MNXM97172".to_string()],
    };
    round_trip(
        Attribute::TemplateReactions,
        AttributeValue::Reactions(BTreeMap::from([("MNXR142257".to_string(), reaction)])),
    );
}

#[test]
fn empty_tables_round_trip() {
    for attr in Attribute::ALL {
        let empty = match attr {
            Attribute::CompoundXref => b"{\"forward\":{},\"reverse\":{}}".to_vec(),
            _ => b"{}".to_vec(),
        };
        let value = AttributeValue::from_json_slice(attr, &empty).expect("decode empty");
        assert!(value.is_empty(), "{attr}");
        round_trip(attr, value);
    }
}
