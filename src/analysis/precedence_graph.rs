//! Directed graph with a node per declared relation; edge rel(body) →
//! rel(head) for every positive body atom. Negation and aggregation do not
//! create edges.

use crate::ast::QualifiedName;
use crate::translation_unit::{Analysis, TranslationUnit};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct PrecedenceGraph {
    edges: BTreeMap<QualifiedName, BTreeSet<QualifiedName>>,
    relations: BTreeSet<QualifiedName>,
}

impl PrecedenceGraph {
    #[must_use]
    pub fn relations(&self) -> impl Iterator<Item = &QualifiedName> {
        self.relations.iter()
    }

    #[must_use]
    pub fn successors(&self, rel: &QualifiedName) -> BTreeSet<QualifiedName> {
        self.edges.get(rel).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn predecessors(&self, rel: &QualifiedName) -> BTreeSet<QualifiedName> {
        self.edges
            .iter()
            .filter(|(_, succs)| succs.contains(rel))
            .map(|(from, _)| from.clone())
            .collect()
    }

    #[must_use]
    pub fn all_edges(&self) -> Vec<(QualifiedName, QualifiedName)> {
        self.edges
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from.clone(), to.clone())))
            .collect()
    }
}

impl Analysis for PrecedenceGraph {
    fn name() -> &'static str {
        "precedence-graph"
    }

    fn compute(tu: &TranslationUnit) -> Self {
        let mut graph = PrecedenceGraph::default();
        for relation in &tu.program().relations {
            graph.relations.insert(relation.name.clone());
            graph.edges.entry(relation.name.clone()).or_default();
        }
        for clause in &tu.program().clauses {
            let head = clause.head.name.clone();
            for atom in clause.positive_body_atoms() {
                graph.edges.entry(atom.name.clone()).or_default().insert(head.clone());
            }
        }
        graph
    }
}
