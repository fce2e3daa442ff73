//! Relations used only as `A(_,...,_)` — every occurrence's arguments are
//! all unnamed variables — carry no information beyond "some tuple exists",
//! so they are collapsed to nullary relations; every call site drops its
//! arguments and every defining clause's head arguments are replaced the
//! same way.

use crate::ast::{Argument, Literal, QualifiedName};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashSet;

fn is_all_unnamed(args: &[Argument]) -> bool {
    !args.is_empty() && args.iter().all(|a| matches!(a, Argument::UnnamedVariable))
}

fn collapsible_relations(program: &crate::ast::Program) -> HashSet<QualifiedName> {
    let mut candidates: HashSet<QualifiedName> = program
        .relations
        .iter()
        .filter(|r| r.arity() > 0 && !r.is_input() && !r.is_output())
        .map(|r| r.name.clone())
        .collect();

    for clause in &program.clauses {
        for atom in clause.all_body_atoms() {
            if candidates.contains(&atom.name) && !is_all_unnamed(&atom.args) {
                candidates.remove(&atom.name);
            }
        }
    }
    candidates
}

#[derive(Clone)]
pub struct ReduceExistentials;

impl Transformer for ReduceExistentials {
    fn name(&self) -> &str {
        "ReduceExistentials"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let targets = collapsible_relations(tu.program());
        if targets.is_empty() {
            return false;
        }
        let program = tu.program_mut();
        for relation in &mut program.relations {
            if targets.contains(&relation.name) {
                relation.attributes.clear();
            }
        }
        for clause in &mut program.clauses {
            if targets.contains(&clause.head.name) {
                clause.head.args.clear();
            }
            for lit in &mut clause.body {
                if let Literal::Atom(atom) | Literal::Negation(atom) = lit {
                    if targets.contains(&atom.name) {
                        atom.args.clear();
                    }
                }
            }
        }
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
    fn existential_only_relation_is_collapsed_to_nullary() {
        let mut program = Program::new();
        program.relations.push(Relation::new(
            QualifiedName::from("exists_edge"),
            vec![Attribute { name: "a".into(), type_name: "number".into() }],
        ));
        program
            .clauses
            .push(RuleBuilder::new("exists_edge").head_vars(Vec::<String>::new()).build());
        program.clauses[0].head.args.push(Argument::UnnamedVariable);
        program.clauses.push(
            RuleBuilder::new("derived").head_vars(["_"]).body_atom("exists_edge", Vec::<String>::new()).build(),
        );
        program.clauses[1].body[0] = Literal::Atom(crate::ast::Atom::new(
            QualifiedName::from("exists_edge"),
            vec![Argument::UnnamedVariable],
        ));
        let mut tu = TranslationUnit::new(program);
        assert!(ReduceExistentials.apply(&mut tu));
        assert!(tu.program().relations[0].attributes.is_empty());
    }
}
