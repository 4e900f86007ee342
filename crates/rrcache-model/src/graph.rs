// SPDX-License-Identifier: Apache-2.0

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use crate::attribute::Attribute;
use crate::config::{ChemicalSpace, ConfigError};

/// Validated attribute dependency graph of one chemical space.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    declared: Vec<Attribute>,
    index: BTreeMap<Attribute, usize>,
    deps: BTreeMap<Attribute, Vec<Attribute>>,
}

impl DependencyGraph {
    pub fn new(space: &ChemicalSpace) -> Result<Self, ConfigError> {
        let mut declared = Vec::with_capacity(space.attributes.len());
        let mut index = BTreeMap::new();
        for (i, spec) in space.attributes.iter().enumerate() {
            if index.insert(spec.name, i).is_some() {
                return Err(ConfigError(format!(
                    "attribute `{}` declared twice in space `{}`",
                    spec.name, space.name
                )));
            }
            declared.push(spec.name);
        }

        let mut deps = BTreeMap::new();
        for spec in &space.attributes {
            for dep in &spec.attr_deps {
                if !index.contains_key(dep) {
                    return Err(ConfigError(format!(
                        "attribute `{}` depends on undeclared attribute `{dep}`",
                        spec.name
                    )));
                }
            }
            for required in spec.name.required_attr_deps() {
                if !spec.depends_on(*required) {
                    return Err(ConfigError(format!(
                        "attribute `{}` must depend on `{required}`",
                        spec.name
                    )));
                }
            }
            for file_dep in &spec.file_deps {
                if space.input_file(&file_dep.file).is_none() {
                    return Err(ConfigError(format!(
                        "attribute `{}` depends on file `{}` which no source declares",
                        spec.name, file_dep.file
                    )));
                }
            }
            for role in spec.name.required_roles(space.schema) {
                if spec.file_for(*role).is_none() {
                    return Err(ConfigError(format!(
                        "attribute `{}` has no `{role}` file dependency",
                        spec.name
                    )));
                }
            }
            deps.insert(spec.name, spec.attr_deps.clone());
        }

        let graph = Self {
            declared,
            index,
            deps,
        };
        let all: BTreeSet<Attribute> = graph.declared.iter().copied().collect();
        let ordered = graph.kahn(&all);
        if ordered.len() != all.len() {
            let placed: BTreeSet<Attribute> = ordered.into_iter().collect();
            let stuck: Vec<&str> = graph
                .declared
                .iter()
                .filter(|a| !placed.contains(a))
                .map(|a| a.as_str())
                .collect();
            return Err(ConfigError(format!(
                "dependency cycle in space `{}` among: {}",
                space.name,
                stuck.join(", ")
            )));
        }
        Ok(graph)
    }

    #[must_use]
    pub fn declared(&self) -> &[Attribute] {
        &self.declared
    }

    #[must_use]
    pub fn dependencies(&self, attr: Attribute) -> &[Attribute] {
        self.deps.get(&attr).map_or(&[], Vec::as_slice)
    }

    /// Requested attributes and their transitive dependencies, every
    /// dependency ahead of its dependents, ties broken by declaration order.
    pub fn topological_order(
        &self,
        requested: &BTreeSet<Attribute>,
    ) -> Result<Vec<Attribute>, ConfigError> {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<Attribute> = Vec::new();
        for attr in requested {
            if !self.index.contains_key(attr) {
                return Err(ConfigError(format!("attribute `{attr}` is not declared")));
            }
            stack.push(*attr);
        }
        while let Some(attr) = stack.pop() {
            if closure.insert(attr) {
                stack.extend(self.dependencies(attr).iter().copied());
            }
        }
        Ok(self.kahn(&closure))
    }

    fn kahn(&self, nodes: &BTreeSet<Attribute>) -> Vec<Attribute> {
        let mut indegree: BTreeMap<Attribute, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<Attribute, Vec<Attribute>> = BTreeMap::new();
        for node in nodes {
            let within: Vec<Attribute> = self
                .dependencies(*node)
                .iter()
                .copied()
                .filter(|d| nodes.contains(d))
                .collect();
            indegree.insert(*node, within.len());
            for dep in within {
                dependents.entry(dep).or_default().push(*node);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = indegree
            .iter()
            .filter(|(_, d)| **d == 0)
            .filter_map(|(a, _)| self.index.get(a).copied().map(Reverse))
            .collect();
        let mut out = Vec::with_capacity(nodes.len());
        while let Some(Reverse(i)) = ready.pop() {
            let attr = self.declared[i];
            out.push(attr);
            for next in dependents.get(&attr).into_iter().flatten() {
                if let Some(d) = indegree.get_mut(next) {
                    *d -= 1;
                    if *d == 0 {
                        if let Some(j) = self.index.get(next) {
                            ready.push(Reverse(*j));
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::DependencyGraph;
    use crate::attribute::{Attribute, SourceRole};
    use crate::config::{
        ArtifactSpec, AttributeSpec, ChemicalSpace, FileDep, InputFile, InputSource, SourceSchema,
    };
    use std::collections::BTreeSet;

    fn spec(name: Attribute, deps: &[Attribute], files: &[(SourceRole, &str)]) -> AttributeSpec {
        AttributeSpec {
            name,
            attr_deps: deps.to_vec(),
            file_deps: files
                .iter()
                .map(|(role, file)| FileDep {
                    role: *role,
                    file: (*file).to_string(),
                })
                .collect(),
            artifact: ArtifactSpec {
                file: format!("{name}.json.gz"),
                fingerprint: None,
            },
        }
    }

    fn space(attributes: Vec<AttributeSpec>) -> ChemicalSpace {
        ChemicalSpace {
            name: "test".to_string(),
            schema: SourceSchema::Legacy,
            mirror_url: None,
            sources: vec![InputSource {
                url: "https://example.org/".to_string(),
                files: ["chem_xref.tsv", "compounds.tsv", "reac_xref.tsv"]
                    .into_iter()
                    .map(|n| InputFile {
                        name: n.to_string(),
                        fingerprint: None,
                    })
                    .collect(),
            }],
            compound_redirect_overrides: Default::default(),
            attributes,
        }
    }

    #[test]
    fn transitive_dependencies_precede_dependents() {
        let graph = DependencyGraph::new(&space(vec![
            spec(
                Attribute::InchikeyCompounds,
                &[Attribute::CompoundStructures],
                &[],
            ),
            spec(
                Attribute::CompoundStructures,
                &[Attribute::DeprecatedCompoundIds],
                &[(SourceRole::Compounds, "compounds.tsv")],
            ),
            spec(
                Attribute::DeprecatedCompoundIds,
                &[],
                &[(SourceRole::ChemXref, "chem_xref.tsv")],
            ),
        ]))
        .expect("graph");
        let order = graph
            .topological_order(&BTreeSet::from([Attribute::InchikeyCompounds]))
            .expect("order");
        assert_eq!(
            order,
            vec![
                Attribute::DeprecatedCompoundIds,
                Attribute::CompoundStructures,
                Attribute::InchikeyCompounds,
            ]
        );
    }

    #[test]
    fn independent_attributes_follow_declaration_order() {
        let graph = DependencyGraph::new(&space(vec![
            spec(
                Attribute::DeprecatedReactionIds,
                &[],
                &[(SourceRole::ReacXref, "reac_xref.tsv")],
            ),
            spec(
                Attribute::DeprecatedCompoundIds,
                &[],
                &[(SourceRole::ChemXref, "chem_xref.tsv")],
            ),
        ]))
        .expect("graph");
        let order = graph
            .topological_order(&BTreeSet::from([
                Attribute::DeprecatedCompoundIds,
                Attribute::DeprecatedReactionIds,
            ]))
            .expect("order");
        assert_eq!(
            order,
            vec![
                Attribute::DeprecatedReactionIds,
                Attribute::DeprecatedCompoundIds
            ]
        );
    }

    #[test]
    fn cycles_are_config_errors() {
        let err = DependencyGraph::new(&space(vec![
            spec(
                Attribute::CompoundXref,
                &[Attribute::DeprecatedCompoundIds],
                &[(SourceRole::ChemXref, "chem_xref.tsv")],
            ),
            spec(
                Attribute::DeprecatedCompoundIds,
                &[Attribute::CompoundXref],
                &[(SourceRole::ChemXref, "chem_xref.tsv")],
            ),
        ]))
        .expect_err("cycle");
        assert!(err.0.contains("dependency cycle"), "{err}");
        assert!(err.0.contains("cid_xref"), "{err}");
    }

    #[test]
    fn undeclared_files_and_attributes_are_rejected() {
        let err = DependencyGraph::new(&space(vec![spec(
            Attribute::DeprecatedCompoundIds,
            &[],
            &[(SourceRole::ChemXref, "missing.tsv")],
        )]))
        .expect_err("undeclared file");
        assert!(err.0.contains("missing.tsv"));

        let err = DependencyGraph::new(&space(vec![spec(
            Attribute::ChebiCompounds,
            &[Attribute::CompoundXref],
            &[],
        )]))
        .expect_err("undeclared attribute");
        assert!(err.0.contains("undeclared attribute `cid_xref`"));
    }

    #[test]
    fn producers_require_their_source_roles() {
        let err = DependencyGraph::new(&space(vec![spec(
            Attribute::DeprecatedCompoundIds,
            &[],
            &[],
        )]))
        .expect_err("missing role");
        assert!(err.0.contains("chem_xref"));
    }

    #[test]
    fn requesting_undeclared_attribute_fails() {
        let graph = DependencyGraph::new(&space(vec![spec(
            Attribute::DeprecatedCompoundIds,
            &[],
            &[(SourceRole::ChemXref, "chem_xref.tsv")],
        )]))
        .expect("graph");
        assert!(graph
            .topological_order(&BTreeSet::from([Attribute::TemplateReactions]))
            .is_err());
    }
}
