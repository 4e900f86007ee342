use proptest::prelude::*;
use proptest::test_runner::Config;
use rrcache_model::{redirect_lookup, RedirectTable};

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn redirect_lookup_is_table_value_or_identity(
        table in proptest::collection::btree_map("MNXM[0-9]{1,4}", "MNXM[0-9]{1,4}", 0..16),
        probe in "MNXM[0-9]{1,4}"
    ) {
        let table: RedirectTable = table;
        let resolved = redirect_lookup(&probe, &table);
        match table.get(&probe) {
            Some(target) => prop_assert_eq!(resolved, target.as_str()),
            None => prop_assert_eq!(resolved, probe.as_str()),
        }
    }

    #[test]
    fn empty_table_is_identity(probe in "[A-Za-z0-9:_-]{0,32}") {
        let table = RedirectTable::new();
        prop_assert_eq!(redirect_lookup(&probe, &table), probe.as_str());
    }
}
