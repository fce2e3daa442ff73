//! When a selection aggregator (`min`/`max`) is assigned to an outer
//! variable (`x = min v : { A(v,w) }`) and the aggregator body also binds a
//! *witness* variable `w` that the rest of the clause references, the
//! witness is otherwise ungrounded outside the aggregator's scope. This
//! inserts a grounding atom (`A(x,w)`) into the clause body so `w` becomes
//! usable wherever `x` is.

use crate::ast::{AggregateOp, Argument, Atom, BinaryConstraintOp, Literal};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashSet;

fn outer_variables(clause: &crate::ast::Clause, skip_literal: usize) -> HashSet<String> {
    let mut vars = Vec::new();
    clause.head.args.iter().for_each(|a| a.collect_variables(&mut vars));
    for (i, lit) in clause.body.iter().enumerate() {
        if i != skip_literal {
            lit.collect_variables(&mut vars);
        }
    }
    vars.into_iter().collect()
}

/// Finds, inside one aggregator's body, an atom binding both the aggregate
/// target variable and some other variable that the outer clause also
/// references — the grounding atom to hoist.
fn find_witness_atom(target: &str, body: &[Literal], outer: &HashSet<String>) -> Option<Atom> {
    for lit in body {
        let Literal::Atom(atom) = lit else { continue };
        let binds_target = atom.args.iter().any(|a| matches!(a, Argument::Variable(v) if v == target));
        if !binds_target {
            continue;
        }
        let has_witness = atom.args.iter().any(|a| match a {
            Argument::Variable(v) => v != target && outer.contains(v),
            _ => false,
        });
        if has_witness {
            return Some(atom.clone());
        }
    }
    None
}

#[derive(Clone)]
pub struct GroundWitnesses;

impl Transformer for GroundWitnesses {
    fn name(&self) -> &str {
        "GroundWitnesses"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        for clause in &mut tu.program_mut().clauses {
            let mut index = 0;
            while index < clause.body.len() {
                let grounding = if let Literal::BinaryConstraint(BinaryConstraintOp::Equal, lhs, rhs) =
                    &clause.body[index]
                {
                    let (result_var, aggregator) = match (lhs, rhs) {
                        (Argument::Variable(v), Argument::Aggregator(op, Some(target), body)) => (v, (*op, target, body)),
                        (Argument::Aggregator(op, Some(target), body), Argument::Variable(v)) => (v, (*op, target, body)),
                        _ => {
                            index += 1;
                            continue;
                        }
                    };
                    let (op, target, body) = aggregator;
                    if !matches!(op, AggregateOp::Min | AggregateOp::Max) {
                        index += 1;
                        continue;
                    }
                    let Argument::Variable(target_var) = target.as_ref() else {
                        index += 1;
                        continue;
                    };
                    let outer = outer_variables(clause, index);
                    find_witness_atom(target_var, body, &outer).map(|atom| {
                        let grounded_args = atom
                            .args
                            .iter()
                            .map(|a| match a {
                                Argument::Variable(v) if v == target_var => Argument::var(result_var.clone()),
                                other => other.clone(),
                            })
                            .collect();
                        Atom::new(atom.name.clone(), grounded_args)
                    })
                } else {
                    None
                };
                if let Some(atom) = grounding {
                    if !clause.body.iter().any(|l| matches!(l, Literal::Atom(a) if a == &atom)) {
                        clause.body.push(Literal::Atom(atom));
                        changed = true;
                    }
                }
                index += 1;
            }
        }
        if changed {
            tu.invalidate();
        }
        changed
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;

    #[test]
    fn witness_variable_is_grounded_outside_aggregator() {
        let aggregator = Argument::Aggregator(
            AggregateOp::Min,
            Some(Box::new(Argument::var("v"))),
            vec![Literal::Atom(Atom::new("edge".into(), vec![Argument::var("v"), Argument::var("w")]))],
        );
        let clause = RuleBuilder::new("best")
            .head_vars(["x", "w"])
            .constraint(Argument::var("x"), BinaryConstraintOp::Equal, aggregator)
            .build();
        let mut program = crate::ast::Program::new();
        program.clauses.push(clause);
        let mut tu = TranslationUnit::new(program);
        assert!(GroundWitnesses.apply(&mut tu));
        assert!(tu.program().clauses[0]
            .body
            .iter()
            .any(|l| matches!(l, Literal::Atom(a) if a.name == "edge".into() && a.args[0] == Argument::var("x"))));
    }
}
