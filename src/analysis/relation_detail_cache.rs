//! Flat `QualifiedName -> Relation` and `QualifiedName -> clauses` indices,
//! computed once instead of re-scanning `Program::relations`/`clauses`
//! linearly from every transformer that needs them.

use crate::ast::{Clause, QualifiedName, Relation};
use crate::translation_unit::{Analysis, TranslationUnit};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct RelationDetailCache {
    relations: BTreeMap<QualifiedName, Relation>,
    clauses: BTreeMap<QualifiedName, Vec<Clause>>,
}

impl RelationDetailCache {
    #[must_use]
    pub fn relation(&self, name: &QualifiedName) -> Option<&Relation> {
        self.relations.get(name)
    }

    #[must_use]
    pub fn clauses(&self, name: &QualifiedName) -> &[Clause] {
        self.clauses.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn relation_names(&self) -> impl Iterator<Item = &QualifiedName> {
        self.relations.keys()
    }

    #[must_use]
    pub fn arity_of(&self, name: &QualifiedName) -> Option<usize> {
        self.relations.get(name).map(Relation::arity)
    }
}

impl Analysis for RelationDetailCache {
    fn name() -> &'static str {
        "relation-detail-cache"
    }

    fn compute(tu: &TranslationUnit) -> Self {
        let mut cache = RelationDetailCache::default();
        for relation in &tu.program().relations {
            cache.relations.insert(relation.name.clone(), relation.clone());
        }
        for clause in &tu.program().clauses {
            cache.clauses.entry(clause.head.name.clone()).or_default().push(clause.clone());
        }
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::Program;

    #[test]
    fn clauses_are_grouped_by_head_relation() {
        let mut program = Program::new();
        program.clauses.push(RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x"]).build());
        program.clauses.push(RuleBuilder::new("r").head_vars(["x"]).body_atom("t", ["x"]).build());
        let tu = TranslationUnit::new(program);
        let cache = RelationDetailCache::compute(&tu);
        assert_eq!(cache.clauses(&QualifiedName::from("r")).len(), 2);
        assert!(cache.clauses(&QualifiedName::from("missing")).is_empty());
    }
}
