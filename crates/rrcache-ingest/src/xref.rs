// SPDX-License-Identifier: Apache-2.0

use rrcache_model::{
    redirect_lookup, CompartmentXref, ForeignIndex, RedirectTable, XrefBundle, XrefTable,
};

use crate::diagnostics::{Diagnostics, Parsed, WarningKind};
use crate::tsv::TsvTable;

const DEPRECATED_NAMESPACE: &str = "deprecated";
const MNX_NAMESPACE: &str = "mnx";

/// `db:id` to `(db, id)`; bare ids and `deprecated:` fold into `mnx`.
fn split_reference(reference: &str) -> (&str, &str) {
    match reference.split_once(':') {
        None => (MNX_NAMESPACE, reference),
        Some((DEPRECATED_NAMESPACE, id)) => (MNX_NAMESPACE, id),
        Some((db, id)) => (db, id),
    }
}

fn push_unique(bundle: &mut XrefBundle, db: &str, id: &str) {
    let ids = bundle.entry(db.to_string()).or_default();
    if !ids.iter().any(|known| known == id) {
        ids.push(id.to_string());
    }
}

/// Old id to current id, from `deprecated:<old>` rows of an xref dump.
#[must_use]
pub fn parse_deprecated_ids(xref: &TsvTable) -> Parsed<RedirectTable> {
    let mut diag = Diagnostics::default();
    let mut out = RedirectTable::new();
    for row in xref.rows() {
        let Some((DEPRECATED_NAMESPACE, old)) = row.get(0).and_then(|r| r.split_once(':')) else {
            continue;
        };
        match row.get(1).filter(|v| !v.is_empty()) {
            Some(new) => {
                out.insert(old.to_string(), new.to_string());
            }
            None => diag.warn(
                row.line,
                WarningKind::MalformedRow,
                format!("deprecated id `{old}` has no replacement"),
            ),
        }
    }
    diag.finish(out)
}

/// Forward `{id -> {db -> [foreign]}}` and reverse `{db -> {foreign -> id}}`
/// cross-references; internal ids are redirected first.
#[must_use]
pub fn parse_xref(xref: &TsvTable, redirects: &RedirectTable) -> Parsed<XrefTable> {
    let mut diag = Diagnostics::default();
    let mut table = XrefTable::default();
    for row in xref.rows() {
        let (Some(reference), Some(internal)) = (row.get(0), row.get(1)) else {
            diag.warn(
                row.line,
                WarningKind::MalformedRow,
                "cross-reference row needs a reference and an internal id",
            );
            continue;
        };
        if reference.is_empty() || internal.is_empty() {
            diag.warn(row.line, WarningKind::MalformedRow, "empty cross-reference field");
            continue;
        }
        let internal = redirect_lookup(internal, redirects);
        let (db, foreign) = split_reference(reference);
        push_unique(
            table.forward.entry(internal.to_string()).or_default(),
            db,
            foreign,
        );
        table
            .reverse
            .entry(db.to_string())
            .or_default()
            .entry(foreign.to_string())
            .or_insert_with(|| internal.to_string());
    }
    diag.finish(table)
}

/// Compartment cross-references and the flat foreign-to-compartment index.
/// Namespaced foreign ids are lower-cased; the first compartment seen for a
/// foreign id wins.
#[must_use]
pub fn parse_compartment_xref(rows: &TsvTable) -> Parsed<(CompartmentXref, ForeignIndex)> {
    let mut diag = Diagnostics::default();
    let mut forward = CompartmentXref::new();
    let mut reverse = ForeignIndex::new();
    for row in rows.rows() {
        let (Some(reference), Some(compartment)) = (row.get(0), row.get(1)) else {
            diag.warn(
                row.line,
                WarningKind::MalformedRow,
                "compartment row needs a reference and a compartment id",
            );
            continue;
        };
        let foreign = match reference.split_once(':') {
            None => reference.to_string(),
            Some((_, id)) => id.to_lowercase(),
        };
        let (db, _) = split_reference(reference);
        push_unique(forward.entry(compartment.to_string()).or_default(), db, &foreign);
        reverse
            .entry(foreign)
            .or_insert_with(|| compartment.to_string());
    }
    diag.finish((forward, reverse))
}

/// `{foreign id -> internal id}` for one database, from the forward table.
#[must_use]
pub fn index_foreign(xref: &XrefTable, db: &str) -> ForeignIndex {
    let mut out = ForeignIndex::new();
    for (internal, bundle) in &xref.forward {
        for foreign in bundle.get(db).into_iter().flatten() {
            out.entry(foreign.clone())
                .or_insert_with(|| internal.clone());
        }
    }
    out
}
