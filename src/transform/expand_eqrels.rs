//! Relations marked EQREL denote an equivalence relation; this rewrites
//! them into plain BTREE relations augmented with the reflexivity,
//! symmetry, and transitivity clauses that make the equivalence closure
//! explicit to the rest of the pipeline.

use crate::ast::{Argument, Atom, Clause, Literal, QualifiedName, Relation, Representation};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;

fn closure_clauses(relation: &Relation) -> Vec<Clause> {
    let name = relation.name.clone();
    let atom = |args: Vec<&str>| Atom::new(name.clone(), args.into_iter().map(Argument::var).collect());

    let reflexive_from_left = Clause::new(atom(vec!["x", "x"]), vec![Literal::Atom(atom(vec!["x", "_y"]))]);
    let reflexive_from_right = Clause::new(atom(vec!["y", "y"]), vec![Literal::Atom(atom(vec!["_x", "y"]))]);
    let symmetric = Clause::new(atom(vec!["y", "x"]), vec![Literal::Atom(atom(vec!["x", "y"]))]);
    let transitive = Clause::new(
        atom(vec!["x", "z"]),
        vec![Literal::Atom(atom(vec!["x", "y"])), Literal::Atom(atom(vec!["y", "z"]))],
    );
    vec![reflexive_from_left, reflexive_from_right, symmetric, transitive]
}

#[derive(Clone)]
pub struct ExpandEqrels;

impl Transformer for ExpandEqrels {
    fn name(&self) -> &str {
        "ExpandEqrels"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let eqrel_names: Vec<QualifiedName> = tu
            .program()
            .relations
            .iter()
            .filter(|r| r.representation == Representation::Eqrel)
            .map(|r| r.name.clone())
            .collect();
        if eqrel_names.is_empty() {
            return false;
        }
        let program = tu.program_mut();
        for relation in &mut program.relations {
            if relation.representation == Representation::Eqrel {
                relation.representation = Representation::Btree;
            }
        }
        for name in &eqrel_names {
            let relation = program.relation(name).expect("eqrel name came from this program's relations").clone();
            program.clauses.extend(closure_clauses(&relation));
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
    use crate::ast::{Attribute, Program};

    #[test]
    fn eqrel_relation_gains_closure_clauses_and_becomes_btree() {
        let mut program = Program::new();
        let mut relation = Relation::new(
            QualifiedName::from("same"),
            vec![
                Attribute { name: "a".into(), type_name: "number".into() },
                Attribute { name: "b".into(), type_name: "number".into() },
            ],
        );
        relation.representation = Representation::Eqrel;
        program.relations.push(relation);
        let mut tu = TranslationUnit::new(program);
        assert!(ExpandEqrels.apply(&mut tu));
        assert_eq!(tu.program().relations[0].representation, Representation::Btree);
        assert_eq!(tu.program().clauses.len(), 4);
    }
}
