//! Deletes relations with no defining clauses that are not declared input
//! (an input relation is populated from outside the program, so having no
//! clauses is normal for it), along with every literal and directive that
//! references them.

use crate::ast::QualifiedName;
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashSet;

fn empty_relations(program: &crate::ast::Program) -> HashSet<QualifiedName> {
    program
        .relations
        .iter()
        .filter(|r| !r.is_input() && program.clauses_for(&r.name).is_empty())
        .map(|r| r.name.clone())
        .collect()
}

fn references_any(atom: &crate::ast::Atom, dead: &HashSet<QualifiedName>) -> bool {
    dead.contains(&atom.name)
}

#[derive(Clone)]
pub struct RemoveEmptyRelations;

impl Transformer for RemoveEmptyRelations {
    fn name(&self) -> &str {
        "RemoveEmptyRelations"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let dead = empty_relations(tu.program());
        if dead.is_empty() {
            return false;
        }
        let program = tu.program_mut();
        program.clauses.retain(|c| {
            !dead.contains(&c.head.name)
                && !c.body.iter().any(|lit| match lit {
                    crate::ast::Literal::Atom(a) | crate::ast::Literal::Negation(a) => references_any(a, &dead),
                    _ => false,
                })
        });
        program.relations.retain(|r| !dead.contains(&r.name));
        program.directives.retain(|d| !dead.contains(&d.relation));
        tu.invalidate();
        true
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::{Attribute, Program, Relation};

    #[test]
    fn relation_with_no_clauses_is_removed() {
        let mut program = Program::new();
        program.relations.push(Relation::new(
            QualifiedName::from("dead"),
            vec![Attribute { name: "x".into(), type_name: "number".into() }],
        ));
        program.clauses.push(RuleBuilder::new("t").head_vars(["x"]).body_atom("dead", ["x"]).build());
        let mut tu = TranslationUnit::new(program);
        assert!(RemoveEmptyRelations.apply(&mut tu));
        assert!(tu.program().relation(&QualifiedName::from("dead")).is_none());
        assert!(tu.program().clauses.is_empty());
    }
}
