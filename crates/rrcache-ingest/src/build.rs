// SPDX-License-Identifier: Apache-2.0

use rrcache_core::{ErrorCode, Fingerprint};
use rrcache_model::{
    Attribute, AttributeSpec, AttributeValue, ChemicalSpace, DependencyGraph, RedirectTable,
    SourceRole,
};
use rrcache_store::{ArtifactStore, CacheLayout, Downloader, FileStatus, InputFetcher};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::compounds::{apply_compound_replacements, index_inchikey, parse_compounds};
use crate::convert::StructureConverter;
use crate::diagnostics::{Diagnostics, Parsed, RowWarning};
use crate::logging::{BuildEvent, BuildLog, BuildStage};
use crate::reactions::{alias_deprecated_reactions, reaction_schema};
use crate::tsv::{Delimiter, HeaderMode, TsvTable};
use crate::xref::{index_foreign, parse_compartment_xref, parse_deprecated_ids, parse_xref};
use crate::IngestError;

const CHEBI_DB: &str = "chebi";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Attributes whose artifacts were written, in write order.
    pub built: Vec<Attribute>,
    /// Attributes whose existing artifacts verified and were kept.
    pub reused: Vec<Attribute>,
    pub fingerprints: BTreeMap<Attribute, Fingerprint>,
    /// Written artifacts that do not match their registered fingerprint.
    pub fingerprint_drift: Vec<Attribute>,
    pub warnings: Vec<RowWarning>,
    pub events: Vec<BuildEvent>,
}

type Produced = Vec<(Attribute, AttributeValue)>;

/// Regenerates the artifacts of one chemical space in dependency order.
pub struct CacheBuilder<'a> {
    space: &'a ChemicalSpace,
    graph: DependencyGraph,
    artifacts: ArtifactStore,
    fetcher: InputFetcher<'a>,
    converter: &'a dyn StructureConverter,
}

impl<'a> CacheBuilder<'a> {
    pub fn new(
        space: &'a ChemicalSpace,
        root: &Path,
        downloader: &'a dyn Downloader,
        converter: &'a dyn StructureConverter,
    ) -> Result<Self, IngestError> {
        let graph = DependencyGraph::new(space)?;
        let layout = CacheLayout::new(root, space.name.clone());
        Ok(Self {
            space,
            graph,
            fetcher: InputFetcher::new(layout.input_dir(), downloader),
            artifacts: ArtifactStore::new(layout),
            converter,
        })
    }

    #[must_use]
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn build(&self, requested: &BTreeSet<Attribute>) -> Result<BuildReport, IngestError> {
        self.build_collecting(requested).map(|(report, _)| report)
    }

    /// Builds `requested` and returns every value produced or loaded on the way.
    #[instrument(skip(self, requested), fields(space = %self.space.name))]
    pub fn build_collecting(
        &self,
        requested: &BTreeSet<Attribute>,
    ) -> Result<(BuildReport, BTreeMap<Attribute, AttributeValue>), IngestError> {
        let mut log = BuildLog::default();
        let mut diag = Diagnostics::default();
        let mut report = BuildReport::default();
        let mut memory: BTreeMap<Attribute, AttributeValue> = BTreeMap::new();

        let order = self.graph.topological_order(requested)?;
        log.emit(
            BuildStage::Plan,
            "build.plan",
            [(
                "order",
                order.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(","),
            )],
        );

        for attr in order {
            if memory.contains_key(&attr) {
                if !report.built.contains(&attr) {
                    report.reused.push(attr);
                }
                continue;
            }
            let spec = self.spec(attr)?;
            let status = self.artifacts.status(&spec.artifact);
            if status.is_valid() {
                log.emit(BuildStage::Verify, "artifact.reused", [("attribute", attr.to_string())]);
                report.reused.push(attr);
                continue;
            }
            log.emit(
                BuildStage::Verify,
                "artifact.stale",
                [
                    ("attribute", attr.to_string()),
                    ("status", status_label(&status).to_string()),
                ],
            );

            for dep in &spec.attr_deps {
                self.ensure_loaded(*dep, &mut memory)?;
            }
            let produced = self.produce(attr, spec, &memory, &mut log, &mut diag)?;
            for (produced_attr, value) in produced {
                let Some(produced_spec) = self.space.attribute(produced_attr) else {
                    continue;
                };
                if produced_attr == attr || !self.artifacts.status(&produced_spec.artifact).is_valid() {
                    let written = self.artifacts.persist(&produced_spec.artifact, &value)?;
                    log.emit(
                        BuildStage::Persist,
                        "artifact.written",
                        [
                            ("attribute", produced_attr.to_string()),
                            ("fingerprint", written.to_hex()),
                        ],
                    );
                    if let Some(declared) = &produced_spec.artifact.fingerprint {
                        if *declared != written {
                            warn!(
                                attribute = %produced_attr,
                                declared = %declared,
                                written = %written,
                                "written artifact differs from its registered fingerprint"
                            );
                            report.fingerprint_drift.push(produced_attr);
                        }
                    }
                    report.built.push(produced_attr);
                    report.fingerprints.insert(produced_attr, written);
                }
                memory.insert(produced_attr, value);
            }
        }

        log.emit(
            BuildStage::Finalize,
            "build.complete",
            [
                ("built", report.built.len().to_string()),
                ("reused", report.reused.len().to_string()),
            ],
        );
        info!(
            built = report.built.len(),
            reused = report.reused.len(),
            "cache build complete"
        );
        report.warnings = diag.finish(()).warnings;
        report.events = log.into_events();
        Ok((report, memory))
    }

    fn spec(&self, attr: Attribute) -> Result<&'a AttributeSpec, IngestError> {
        self.space.attribute(attr).ok_or_else(|| {
            IngestError::new(
                ErrorCode::ConfigInvalid,
                format!("attribute `{attr}` is not declared in space `{}`", self.space.name),
            )
        })
    }

    fn ensure_loaded(
        &self,
        attr: Attribute,
        memory: &mut BTreeMap<Attribute, AttributeValue>,
    ) -> Result<(), IngestError> {
        if memory.contains_key(&attr) {
            return Ok(());
        }
        let spec = self.spec(attr)?;
        let value = self.artifacts.load(attr, &spec.artifact)?;
        memory.insert(attr, value);
        Ok(())
    }

    fn input(
        &self,
        spec: &AttributeSpec,
        role: SourceRole,
        log: &mut BuildLog,
    ) -> Result<Option<PathBuf>, IngestError> {
        let Some(file) = spec.file_for(role) else {
            return Ok(None);
        };
        let (source, declared) = self.space.input_file(file).ok_or_else(|| {
            IngestError::new(
                ErrorCode::ConfigInvalid,
                format!("file `{file}` is not declared by any source"),
            )
        })?;
        let path = self
            .fetcher
            .ensure(file, &source.url, declared.fingerprint.as_ref())?;
        log.emit(
            BuildStage::Fetch,
            "input.ready",
            [("file", file.to_string()), ("role", role.to_string())],
        );
        Ok(Some(path))
    }

    fn table(
        &self,
        spec: &AttributeSpec,
        role: SourceRole,
        header: HeaderMode,
        delimiter: Delimiter,
        log: &mut BuildLog,
    ) -> Result<Option<TsvTable>, IngestError> {
        match self.input(spec, role, log)? {
            Some(path) => TsvTable::read_with(&path, header, delimiter).map(Some),
            None => Ok(None),
        }
    }

    fn required_table(
        &self,
        spec: &AttributeSpec,
        role: SourceRole,
        header: HeaderMode,
        log: &mut BuildLog,
    ) -> Result<TsvTable, IngestError> {
        self.table(spec, role, header, Delimiter::Tab, log)?
            .ok_or_else(|| {
                IngestError::new(
                    ErrorCode::ConfigInvalid,
                    format!("attribute `{}` has no `{role}` file dependency", spec.name),
                )
            })
    }

    fn produce(
        &self,
        attr: Attribute,
        spec: &AttributeSpec,
        memory: &BTreeMap<Attribute, AttributeValue>,
        log: &mut BuildLog,
        diag: &mut Diagnostics,
    ) -> Result<Produced, IngestError> {
        let no_redirects = RedirectTable::new();
        let dependency = |dep: Attribute| {
            if spec.depends_on(dep) {
                memory.get(&dep)
            } else {
                None
            }
        };
        let redirects = |dep: Attribute| {
            dependency(dep)
                .and_then(AttributeValue::as_redirects)
                .unwrap_or(&no_redirects)
        };
        let mut parsed = |warnings: Vec<RowWarning>, log: &mut BuildLog| {
            log.emit(
                BuildStage::Parse,
                "attribute.parsed",
                [
                    ("attribute", attr.to_string()),
                    ("warnings", warnings.len().to_string()),
                ],
            );
            diag.absorb(warnings);
        };

        let produced = match attr {
            Attribute::DeprecatedCompoundIds | Attribute::DeprecatedReactionIds => {
                let role = if attr == Attribute::DeprecatedCompoundIds {
                    SourceRole::ChemXref
                } else {
                    SourceRole::ReacXref
                };
                let table = self.required_table(spec, role, HeaderMode::None, log)?;
                let Parsed { mut value, warnings } = parse_deprecated_ids(&table);
                if attr == Attribute::DeprecatedCompoundIds {
                    value.extend(self.space.compound_redirect_overrides.clone());
                }
                parsed(warnings, log);
                vec![(attr, AttributeValue::Redirects(value))]
            }
            Attribute::CompoundXref => {
                let table = self.required_table(spec, SourceRole::ChemXref, HeaderMode::None, log)?;
                let Parsed { value, warnings } =
                    parse_xref(&table, redirects(Attribute::DeprecatedCompoundIds));
                parsed(warnings, log);
                vec![(attr, AttributeValue::Xref(value))]
            }
            Attribute::CompartmentXref | Attribute::DeprecatedCompartmentIds => {
                let table = self.required_table(spec, SourceRole::CompXref, HeaderMode::None, log)?;
                let Parsed {
                    value: (forward, reverse),
                    warnings,
                } = parse_compartment_xref(&table);
                parsed(warnings, log);
                vec![
                    (Attribute::CompartmentXref, AttributeValue::CompartmentXref(forward)),
                    (Attribute::DeprecatedCompartmentIds, AttributeValue::ForeignIndex(reverse)),
                ]
            }
            Attribute::CompoundStructures | Attribute::CompoundNames => {
                let compounds =
                    self.required_table(spec, SourceRole::Compounds, HeaderMode::FirstLine, log)?;
                let properties = self.table(
                    spec,
                    SourceRole::ChemProp,
                    HeaderMode::LastComment,
                    Delimiter::Tab,
                    log,
                )?;
                let replacements = self.table(
                    spec,
                    SourceRole::CompoundReplacements,
                    HeaderMode::None,
                    Delimiter::Whitespace,
                    log,
                )?;
                let xref = dependency(Attribute::CompoundXref).and_then(AttributeValue::as_xref);
                let Parsed { value, warnings } = parse_compounds(
                    &compounds,
                    properties.as_ref(),
                    xref,
                    redirects(Attribute::DeprecatedCompoundIds),
                    self.converter,
                );
                parsed(warnings, log);
                let mut structures = value.structures;
                if let Some(rows) = &replacements {
                    let replaced = apply_compound_replacements(structures, rows);
                    structures = replaced.value;
                    parsed(replaced.warnings, log);
                }
                vec![
                    (Attribute::CompoundStructures, AttributeValue::Compounds(structures)),
                    (Attribute::CompoundNames, AttributeValue::Names(value.names)),
                ]
            }
            Attribute::ChebiCompounds => {
                let xref = memory
                    .get(&Attribute::CompoundXref)
                    .and_then(AttributeValue::as_xref)
                    .ok_or_else(|| missing_dependency(attr, Attribute::CompoundXref))?;
                vec![(attr, AttributeValue::ForeignIndex(index_foreign(xref, CHEBI_DB)))]
            }
            Attribute::InchikeyCompounds => {
                let compounds = memory
                    .get(&Attribute::CompoundStructures)
                    .and_then(AttributeValue::as_compounds)
                    .ok_or_else(|| missing_dependency(attr, Attribute::CompoundStructures))?;
                vec![(attr, AttributeValue::InchikeyIndex(index_inchikey(compounds)))]
            }
            Attribute::RuleReactions => {
                let schema = reaction_schema(self.space.schema);
                let table =
                    self.required_table(spec, schema.rule_links_role(), HeaderMode::FirstLine, log)?;
                let Parsed { value, warnings } = schema.rule_links(&table);
                parsed(warnings, log);
                vec![(attr, AttributeValue::RuleLinks(value))]
            }
            Attribute::TemplateReactions => {
                let schema = reaction_schema(self.space.schema);
                let table =
                    self.required_table(spec, schema.templates_role(), HeaderMode::FirstLine, log)?;
                let Parsed { mut value, warnings } = schema.template_reactions(&table);
                parsed(warnings, log);
                if spec.depends_on(Attribute::DeprecatedReactionIds) {
                    let aliased =
                        alias_deprecated_reactions(value, redirects(Attribute::DeprecatedReactionIds));
                    value = aliased.value;
                    parsed(aliased.warnings, log);
                }
                vec![(attr, AttributeValue::Reactions(value))]
            }
        };
        Ok(produced)
    }
}

fn missing_dependency(attr: Attribute, dep: Attribute) -> IngestError {
    IngestError::new(
        ErrorCode::Internal,
        format!("`{attr}` was produced before its dependency `{dep}` was available"),
    )
}

fn status_label(status: &FileStatus) -> &'static str {
    match status {
        FileStatus::Valid => "valid",
        FileStatus::Missing => "missing",
        FileStatus::Corrupt { .. } => "corrupt",
    }
}
