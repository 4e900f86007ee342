// SPDX-License-Identifier: Apache-2.0

use rrcache_model::{
    ReactionRecord, ReactionTable, RedirectTable, RuleLinkTable, RuleReactionLink, SourceRole,
    SourceSchema, Stoichiometry, DIRECTION_BIDIRECTIONAL, DIRECTION_FORWARD, DIRECTION_REVERSE,
};
use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostics, Parsed, WarningKind};
use crate::stoichiometry::parse_equation;
use crate::tsv::{TsvRow, TsvTable};

/// Rule links and template reactions read from one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactionTables {
    pub rule_links: RuleLinkTable,
    pub templates: ReactionTable,
}

/// How a chemical space ships its reaction rules and template reactions.
pub trait ReactionSchema {
    fn schema(&self) -> SourceSchema;
    fn rule_links_role(&self) -> SourceRole;
    fn templates_role(&self) -> SourceRole;
    fn rule_links(&self, table: &TsvTable) -> Parsed<RuleLinkTable>;
    fn template_reactions(&self, table: &TsvTable) -> Parsed<ReactionTable>;
}

/// RetroRules flat rule file plus `rxn_recipes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacySchema;

/// One reaction metadata table feeding both attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataSchema;

impl ReactionSchema for LegacySchema {
    fn schema(&self) -> SourceSchema {
        SourceSchema::Legacy
    }

    fn rule_links_role(&self) -> SourceRole {
        SourceRole::RuleLinks
    }

    fn templates_role(&self) -> SourceRole {
        SourceRole::ReactionRecipes
    }

    fn rule_links(&self, table: &TsvTable) -> Parsed<RuleLinkTable> {
        parse_rule_links(table)
    }

    fn template_reactions(&self, table: &TsvTable) -> Parsed<ReactionTable> {
        parse_template_reactions(table)
    }
}

impl ReactionSchema for MetadataSchema {
    fn schema(&self) -> SourceSchema {
        SourceSchema::Metadata
    }

    fn rule_links_role(&self) -> SourceRole {
        SourceRole::ReactionMetadata
    }

    fn templates_role(&self) -> SourceRole {
        SourceRole::ReactionMetadata
    }

    fn rule_links(&self, table: &TsvTable) -> Parsed<RuleLinkTable> {
        parse_reaction_metadata(table).map(|t| t.rule_links)
    }

    fn template_reactions(&self, table: &TsvTable) -> Parsed<ReactionTable> {
        parse_reaction_metadata(table).map(|t| t.templates)
    }
}

#[must_use]
pub fn reaction_schema(schema: SourceSchema) -> &'static dyn ReactionSchema {
    match schema {
        SourceSchema::Metadata => &MetadataSchema,
        _ => &LegacySchema,
    }
}

fn require_columns<const N: usize>(
    table: &TsvTable,
    names: [&str; N],
    diag: &mut Diagnostics,
) -> Option<[usize; N]> {
    let mut out = [0usize; N];
    for (slot, name) in out.iter_mut().zip(names) {
        match table.column(name) {
            Some(i) => *slot = i,
            None => {
                diag.warn(
                    table.header_line(),
                    WarningKind::MissingColumn,
                    format!("required column `{name}` is missing"),
                );
                return None;
            }
        }
    }
    Some(out)
}

fn dotted_counts(list: &str) -> (Stoichiometry, Vec<String>) {
    let mut counts = Stoichiometry::new();
    let mut order = Vec::new();
    for id in list.split('.').map(str::trim).filter(|p| !p.is_empty()) {
        let slot = counts.entry(id.to_string()).or_insert_with(|| {
            order.push(id.to_string());
            0.0
        });
        *slot += 1.0;
    }
    (counts, order)
}

fn dotted_ids(list: &str) -> Vec<String> {
    dotted_counts(list).1
}

fn comma_ids(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inserts a link, reconciling a conflicting direction for the same
/// (rule, reaction) pair to bidirectional.
fn insert_link(
    table: &mut RuleLinkTable,
    mut link: RuleReactionLink,
    line: usize,
    diag: &mut Diagnostics,
) {
    let reactions = table.entry(link.rule_id.clone()).or_default();
    if let Some(previous) = reactions.get(&link.reac_id) {
        if previous.rel_direction != link.rel_direction {
            diag.warn(
                line,
                WarningKind::DirectionConflict,
                format!(
                    "rule {} lists reaction {} with directions {} and {}",
                    link.rule_id, link.reac_id, previous.rel_direction, link.rel_direction
                ),
            );
            link.rel_direction = DIRECTION_BIDIRECTIONAL;
        }
    }
    reactions.insert(link.reac_id.clone(), link);
}

fn insert_template(
    table: &mut ReactionTable,
    id: &str,
    mut record: ReactionRecord,
    line: usize,
    diag: &mut Diagnostics,
) {
    if let Some(previous) = table.get(id) {
        if previous.direction != record.direction {
            diag.warn(
                line,
                WarningKind::DirectionConflict,
                format!(
                    "reaction {id} listed with directions {} and {}",
                    previous.direction, record.direction
                ),
            );
            record.direction = DIRECTION_BIDIRECTIONAL;
        }
    }
    table.insert(id.to_string(), record);
}

/// Rule-to-reaction links from the RetroRules flat rule file.
#[must_use]
pub fn parse_rule_links(table: &TsvTable) -> Parsed<RuleLinkTable> {
    let mut diag = Diagnostics::default();
    let mut out = RuleLinkTable::new();
    let Some([rule, reaction, substrate, products, score, direction]) = require_columns(
        table,
        [
            "rule_id",
            "reaction_id",
            "substrate_id",
            "product_ids",
            "score_normalized",
            "rule_relative_direction",
        ],
        &mut diag,
    ) else {
        return diag.finish(out);
    };

    for row in table.rows() {
        let field = move |i: usize| row.get(i).map(str::trim).unwrap_or_default();
        let (rule_id, reac_id, subs_id) = (field(rule), field(reaction), field(substrate));
        if rule_id.is_empty() || reac_id.is_empty() || subs_id.is_empty() {
            diag.warn(row.line, WarningKind::MalformedRow, "rule row without rule, reaction or substrate id");
            continue;
        }
        let Some(rule_score) = field(score).parse::<f64>().ok().filter(|s| s.is_finite()) else {
            diag.warn(
                row.line,
                WarningKind::BadScore,
                format!("cannot convert rule_score `{}` of {rule_id}", field(score)),
            );
            continue;
        };
        let Some(rel_direction) = rule_direction(field(direction)) else {
            diag.warn(
                row.line,
                WarningKind::BadDirection,
                format!("cannot convert rel_direction `{}` of {rule_id}", field(direction)),
            );
            continue;
        };
        let link = RuleReactionLink {
            rule_id: rule_id.to_string(),
            rule_score,
            reac_id: reac_id.to_string(),
            subs_id: subs_id.to_string(),
            rel_direction,
            left: Stoichiometry::from([(subs_id.to_string(), 1.0)]),
            right: dotted_counts(field(products)).0,
            left_excluded: None,
            right_excluded: None,
            extra: BTreeMap::new(),
        };
        insert_link(&mut out, link, row.line, &mut diag);
    }
    diag.finish(out)
}

/// Template reactions from `rxn_recipes`; a reaction whose equation or
/// direction cannot be read is skipped.
#[must_use]
pub fn parse_template_reactions(table: &TsvTable) -> Parsed<ReactionTable> {
    let mut diag = Diagnostics::default();
    let mut out = ReactionTable::new();
    let Some([id_col, equation_col, direction_col, main_left_col, main_right_col]) =
        require_columns(
            table,
            ["reaction_id", "equation", "direction", "main_left", "main_right"],
            &mut diag,
        )
    else {
        return diag.finish(out);
    };

    for row in table.rows() {
        let field = move |i: usize| row.get(i).map(str::trim).unwrap_or_default();
        let id = field(id_col);
        if id.is_empty() {
            diag.warn(row.line, WarningKind::MalformedRow, "reaction row without id");
            continue;
        }
        let (left, right) = match parse_equation(field(equation_col)) {
            Ok(sides) => sides,
            Err(e) => {
                diag.warn(row.line, WarningKind::BadEquation, format!("ignoring {id}: {e}"));
                continue;
            }
        };
        let Ok(direction) = field(direction_col).parse::<i8>() else {
            diag.warn(
                row.line,
                WarningKind::BadDirection,
                format!("cannot convert direction `{}` of {id}", field(direction_col)),
            );
            continue;
        };
        let record = ReactionRecord {
            left,
            right,
            direction,
            main_left: comma_ids(field(main_left_col)),
            main_right: comma_ids(field(main_right_col)),
        };
        insert_template(&mut out, id, record, row.line, &mut diag);
    }
    diag.finish(out)
}

fn named_direction(raw: &str) -> Option<i8> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "L2R" | "LEFT_TO_RIGHT" | "FORWARD" => Some(DIRECTION_FORWARD),
        "R2L" | "RIGHT_TO_LEFT" | "REVERSE" => Some(DIRECTION_REVERSE),
        _ => None,
    }
}

fn metadata_direction(raw: &str) -> i8 {
    named_direction(raw).unwrap_or(DIRECTION_BIDIRECTIONAL)
}

/// Rule directions come as integers or as `L2R`/`R2L`.
fn rule_direction(raw: &str) -> Option<i8> {
    raw.trim().parse::<i8>().ok().or_else(|| named_direction(raw))
}

/// Columns mapped onto typed fields; every other column lands in `extra`.
const METADATA_MAPPED: &[&str] = &[
    "reaction_id",
    "template_id",
    "score",
    "left_ids",
    "right_ids",
    "direction",
    "left_excluded_ids",
    "right_excluded_ids",
];

const LINK_FIELDS: &[&str] = &[
    "rule_id",
    "rule_score",
    "reac_id",
    "subs_id",
    "rel_direction",
    "left",
    "right",
    "left_excluded",
    "right_excluded",
];

fn metadata_extra(table: &TsvTable, row: &TsvRow) -> BTreeMap<String, String> {
    let mut extra = BTreeMap::new();
    for (i, name) in table.header().iter().enumerate() {
        let key = name.to_ascii_lowercase();
        if METADATA_MAPPED.contains(&key.as_str()) || LINK_FIELDS.contains(&key.as_str()) {
            continue;
        }
        extra.insert(key, row.get(i).unwrap_or_default().to_string());
    }
    extra
}

/// Rule links and template reactions from a reaction metadata table.
#[must_use]
pub fn parse_reaction_metadata(table: &TsvTable) -> Parsed<ReactionTables> {
    let mut diag = Diagnostics::default();
    let mut out = ReactionTables::default();
    let Some([reaction, template, score, left_ids, right_ids, direction]) = require_columns(
        table,
        ["reaction_id", "template_id", "score", "left_ids", "right_ids", "direction"],
        &mut diag,
    ) else {
        return diag.finish(out);
    };
    let left_excluded = table.column("left_excluded_ids");
    let right_excluded = table.column("right_excluded_ids");
    let legacy = table.column("legacy_id");
    let valid = table.column("valid");

    for row in table.rows() {
        let field = move |i: usize| row.get(i).map(str::trim).unwrap_or_default();
        if row
            .field(valid)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("false"))
        {
            continue;
        }
        let reac_id = field(reaction);
        if reac_id.is_empty() {
            diag.warn(row.line, WarningKind::MalformedRow, "metadata row without REACTION_ID");
            continue;
        }
        let (left, left_order) = dotted_counts(field(left_ids));
        let (right, right_order) = dotted_counts(field(right_ids));
        let left_excl = row.field(left_excluded).map(dotted_ids);
        let right_excl = row.field(right_excluded).map(dotted_ids);
        let main = |order: Vec<String>, excluded: &Option<Vec<String>>| -> Vec<String> {
            order
                .into_iter()
                .filter(|id| !excluded.as_ref().is_some_and(|ex| ex.contains(id)))
                .collect()
        };
        let reaction_direction = metadata_direction(field(direction));

        let record = ReactionRecord {
            left: left.clone(),
            right: right.clone(),
            direction: reaction_direction,
            main_left: main(left_order.clone(), &left_excl),
            main_right: main(right_order, &right_excl),
        };
        insert_template(&mut out.templates, reac_id, record, row.line, &mut diag);

        let rule_id = field(template);
        if rule_id.is_empty() {
            diag.warn(
                row.line,
                WarningKind::MalformedRow,
                format!("reaction {reac_id} has no TEMPLATE_ID"),
            );
            continue;
        }
        let Some(rule_score) = field(score).parse::<f64>().ok().filter(|s| s.is_finite()) else {
            diag.warn(
                row.line,
                WarningKind::BadScore,
                format!("cannot convert SCORE `{}` of {rule_id}", field(score)),
            );
            continue;
        };
        let subs_id = row
            .field(legacy)
            .and_then(|l| l.rsplit_once('_'))
            .map(|(_, s)| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| left_order.first().cloned())
            .unwrap_or_default();
        let link = RuleReactionLink {
            rule_id: rule_id.to_string(),
            rule_score,
            reac_id: reac_id.to_string(),
            subs_id,
            rel_direction: if reaction_direction >= 0 {
                DIRECTION_FORWARD
            } else {
                DIRECTION_REVERSE
            },
            left,
            right,
            left_excluded: left_excl,
            right_excluded: right_excl,
            extra: metadata_extra(table, row),
        };
        insert_link(&mut out.rule_links, link, row.line, &mut diag);
    }
    diag.finish(out)
}

/// Adds an entry for each deprecated reaction id pointing at a copy of its
/// current reaction's record.
#[must_use]
pub fn alias_deprecated_reactions(
    mut templates: ReactionTable,
    redirects: &RedirectTable,
) -> Parsed<ReactionTable> {
    let mut diag = Diagnostics::default();
    for (deprecated, current) in redirects {
        match templates.get(current).cloned() {
            Some(record) => {
                templates.insert(deprecated.clone(), record);
            }
            None => diag.warn(
                0,
                WarningKind::UnknownReaction,
                format!("reaction {current} (current id of {deprecated}) has no template"),
            ),
        }
    }
    diag.finish(templates)
}
