// SPDX-License-Identifier: Apache-2.0

use rrcache_model::{
    redirect_lookup, CompoundRecord, CompoundTable, InchikeyIndex, NameTable, RedirectTable,
    XrefTable, NO_INCHIKEY,
};
use std::collections::BTreeMap;
use tracing::debug;

use crate::convert::{StructureConverter, StructureFormat};
use crate::diagnostics::{Diagnostics, Parsed, WarningKind};
use crate::tsv::{TsvRow, TsvTable};

const R_GROUP: &str = "R_group";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundTables {
    pub structures: CompoundTable,
    pub names: NameTable,
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "NA")
        .map(str::to_string)
}

fn is_false(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("false" | "0" | "no")
    )
}

struct Columns {
    id: Option<usize>,
    inchi: Option<usize>,
    smiles: Option<usize>,
    inchikey: Option<usize>,
    formula: Option<usize>,
    name: Option<usize>,
    valid: Option<usize>,
}

impl Columns {
    fn of(table: &TsvTable) -> Self {
        Self {
            id: table.column("id").or_else(|| table.column("cid")),
            inchi: table.column("inchi"),
            smiles: table.column("smiles"),
            inchikey: table.column("inchikey"),
            formula: table.column("formula"),
            name: table.column("name"),
            valid: table.column("valid"),
        }
    }

    fn record(&self, row: &TsvRow) -> CompoundRecord {
        CompoundRecord {
            formula: present(row.field(self.formula)),
            smiles: present(row.field(self.smiles)),
            inchi: present(row.field(self.inchi)),
            inchikey: present(row.field(self.inchikey)),
            name: present(row.field(self.name)),
            xref: None,
        }
    }
}

/// Fills the missing representations of `record` from its InChI, or its
/// SMILES when there is no InChI. A failed conversion leaves the field null.
fn derive_missing(
    cid: &str,
    line: usize,
    record: &mut CompoundRecord,
    converter: &dyn StructureConverter,
    diag: &mut Diagnostics,
) {
    let (source, from) = match (&record.inchi, &record.smiles) {
        (Some(inchi), _) => (inchi.clone(), StructureFormat::Inchi),
        (None, Some(smiles)) => (smiles.clone(), StructureFormat::Smiles),
        (None, None) => return,
    };
    let targets = [
        (StructureFormat::Inchi, record.inchi.is_none()),
        (StructureFormat::Smiles, record.smiles.is_none()),
        (StructureFormat::Inchikey, record.inchikey.is_none()),
    ];
    for (to, missing) in targets {
        if !missing || to == from {
            continue;
        }
        match converter.convert(&source, from, to) {
            Ok(value) => {
                let slot = match to {
                    StructureFormat::Inchi => &mut record.inchi,
                    StructureFormat::Smiles => &mut record.smiles,
                    StructureFormat::Inchikey => &mut record.inchikey,
                };
                *slot = Some(value);
            }
            Err(e) => {
                diag.warn(
                    line,
                    WarningKind::ConversionFailed,
                    format!("structure conversion failed for {cid}: {e}"),
                );
            }
        }
    }
}

fn fill_gap(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Builds the compound structure table and the compound name table.
///
/// The structure dump is read first; the property table then fills gaps and
/// adds compounds the dump lacks; finally cross-reference bundles are
/// attached. Compounds without any structure are kept with null fields.
#[must_use]
pub fn parse_compounds(
    compounds: &TsvTable,
    properties: Option<&TsvTable>,
    xref: Option<&XrefTable>,
    redirects: &RedirectTable,
    converter: &dyn StructureConverter,
) -> Parsed<CompoundTables> {
    let mut diag = Diagnostics::default();
    let mut structures = CompoundTable::new();
    let mut names = NameTable::new();
    let mut origin: BTreeMap<String, usize> = BTreeMap::new();

    let cols = Columns::of(compounds);
    if cols.id.is_none() {
        diag.warn(
            compounds.header_line(),
            WarningKind::MissingColumn,
            "compound table has no `id` or `cid` column",
        );
    } else {
        for row in compounds.rows() {
            if is_false(row.field(cols.valid)) {
                continue;
            }
            let Some(raw_id) = present(row.field(cols.id)) else {
                diag.warn(row.line, WarningKind::MalformedRow, "compound row without id");
                continue;
            };
            let cid = redirect_lookup(&raw_id, redirects).to_string();
            let mut record = cols.record(row);
            derive_missing(&cid, row.line, &mut record, converter, &mut diag);
            if let Some(name) = &record.name {
                names.entry(cid.clone()).or_insert_with(|| name.clone());
            }
            origin.insert(cid.clone(), row.line);
            structures.insert(cid, record);
        }
    }

    if let Some(props) = properties {
        let cols = Columns::of(props);
        let id_col = cols.id.or(Some(0));
        for row in props.rows() {
            let Some(raw_id) = present(row.field(id_col)) else {
                diag.warn(row.line, WarningKind::MalformedRow, "property row without id");
                continue;
            };
            let cid = redirect_lookup(&raw_id, redirects).to_string();
            let incoming = cols.record(row);
            if let Some(name) = &incoming.name {
                names.entry(cid.clone()).or_insert_with(|| name.clone());
            }
            match structures.get_mut(&cid) {
                Some(known) => {
                    fill_gap(&mut known.formula, incoming.formula);
                    fill_gap(&mut known.name, incoming.name);
                    fill_gap(&mut known.smiles, incoming.smiles);
                    fill_gap(&mut known.inchikey, incoming.inchikey);
                }
                None => {
                    let mut record = incoming;
                    derive_missing(&cid, row.line, &mut record, converter, &mut diag);
                    origin.insert(cid.clone(), row.line);
                    structures.insert(cid, record);
                }
            }
        }
    }

    if let Some(xref) = xref {
        for (cid, record) in &mut structures {
            record.xref = xref.forward.get(cid).cloned();
        }
    }

    for (cid, record) in &structures {
        if !record.has_structure() {
            diag.warn(
                origin.get(cid).copied().unwrap_or(0),
                WarningKind::MissingStructure,
                format!("no InChI or SMILES for {cid}"),
            );
        }
    }

    diag.finish(CompoundTables { structures, names })
}

/// Copies the record of `source` onto `target` for each `target source` row.
#[must_use]
pub fn apply_compound_replacements(
    mut table: CompoundTable,
    rows: &TsvTable,
) -> Parsed<CompoundTable> {
    let mut diag = Diagnostics::default();
    for row in rows.rows() {
        let (Some(target), Some(source)) = (row.get(0), row.get(1)) else {
            continue;
        };
        if source == R_GROUP {
            debug!(target, "generic R group replacement skipped");
            continue;
        }
        match table.get(source).cloned() {
            Some(record) => {
                table.insert(target.to_string(), record);
            }
            None => diag.warn(
                row.line,
                WarningKind::UnknownCompound,
                format!("replacement source {source} for {target} is not a known compound"),
            ),
        }
    }
    diag.finish(table)
}

/// `{inchikey -> [cid]}`; compounds without a key share the `NO_INCHIKEY` bucket.
#[must_use]
pub fn index_inchikey(structures: &CompoundTable) -> InchikeyIndex {
    let mut out = InchikeyIndex::new();
    for (cid, record) in structures {
        let key = record.inchikey.as_deref().unwrap_or(NO_INCHIKEY);
        out.entry(key.to_string()).or_default().push(cid.clone());
    }
    out
}
