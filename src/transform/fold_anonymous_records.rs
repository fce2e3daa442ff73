//! Folds component-wise record (in)equalities: `[x,y]=[a,b]` becomes
//! `x=a,y=b`; `[x,y]!=[a,b]` becomes a disjunction, realised as one cloned
//! clause per disjunct (`x!=a` alone, or `x=a,y!=b`). Empty-record
//! equalities reduce to the literal boolean they trivially are.

use crate::ast::{Argument, BinaryConstraintOp, Clause, Literal};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;

fn record_pair(literal: &Literal) -> Option<(BinaryConstraintOp, &[Argument], &[Argument])> {
    match literal {
        Literal::BinaryConstraint(op @ (BinaryConstraintOp::Equal | BinaryConstraintOp::NotEqual), lhs, rhs) => {
            match (lhs, rhs) {
                (Argument::RecordInit(a), Argument::RecordInit(b)) => Some((*op, a, b)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Rewrites one clause if it contains a record (in)equality, returning the
/// replacement clause set (more than one only for `!=`), or `None` if the
/// clause needs no folding.
fn fold_clause(clause: &Clause) -> Option<Vec<Clause>> {
    let index = clause.body.iter().position(|lit| record_pair(lit).is_some())?;
    let (op, lhs, rhs) = record_pair(&clause.body[index]).unwrap();

    if lhs.is_empty() {
        let mut next = clause.clone();
        next.body[index] = Literal::BooleanConstraint(matches!(op, BinaryConstraintOp::Equal));
        return Some(vec![next]);
    }

    match op {
        BinaryConstraintOp::Equal => {
            let mut next = clause.clone();
            next.body.remove(index);
            for (a, b) in lhs.iter().zip(rhs.iter()) {
                next.body.push(Literal::BinaryConstraint(BinaryConstraintOp::Equal, a.clone(), b.clone()));
            }
            Some(vec![next])
        }
        BinaryConstraintOp::NotEqual => {
            // x[0..i] = y[0..i], x[i] != y[i], for each i in 0..n: De Morgan's
            // expansion of `some field differs` as one clause per field.
            let mut clauses = Vec::new();
            for i in 0..lhs.len() {
                let mut next = clause.clone();
                next.body.remove(index);
                for j in 0..i {
                    next.body.push(Literal::BinaryConstraint(
                        BinaryConstraintOp::Equal,
                        lhs[j].clone(),
                        rhs[j].clone(),
                    ));
                }
                next.body.push(Literal::BinaryConstraint(
                    BinaryConstraintOp::NotEqual,
                    lhs[i].clone(),
                    rhs[i].clone(),
                ));
                clauses.push(next);
            }
            Some(clauses)
        }
        _ => None,
    }
}

#[derive(Clone)]
pub struct FoldAnonymousRecords;

impl Transformer for FoldAnonymousRecords {
    fn name(&self) -> &str {
        "FoldAnonymousRecords"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        let clauses = std::mem::take(&mut tu.program_mut().clauses);
        let mut rewritten = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let mut pending = vec![clause];
            loop {
                let Some(pos) = pending.iter().position(|c| fold_clause(c).is_some()) else { break };
                let folded = fold_clause(&pending[pos]).unwrap();
                pending.splice(pos..=pos, folded);
                changed = true;
            }
            rewritten.extend(pending);
        }
        tu.program_mut().clauses = rewritten;
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
    use crate::ast::BinaryConstraintOp as Op;

    #[test]
    fn equality_folds_component_wise() {
        let clause = RuleBuilder::new("r")
            .head_vars(["x", "y"])
            .body_atom("s", ["a", "b"])
            .constraint(
                Argument::RecordInit(vec![Argument::var("x"), Argument::var("y")]),
                Op::Equal,
                Argument::RecordInit(vec![Argument::var("a"), Argument::var("b")]),
            )
            .build();
        let folded = fold_clause(&clause).unwrap();
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].body.len(), 3);
    }

    #[test]
    fn inequality_expands_into_one_clause_per_disjunct() {
        let clause = RuleBuilder::new("r")
            .head_vars(["x", "y"])
            .body_atom("s", ["a", "b"])
            .constraint(
                Argument::RecordInit(vec![Argument::var("x"), Argument::var("y")]),
                Op::NotEqual,
                Argument::RecordInit(vec![Argument::var("a"), Argument::var("b")]),
            )
            .build();
        let folded = fold_clause(&clause).unwrap();
        assert_eq!(folded.len(), 2);
    }

    #[test]
    fn empty_record_equality_becomes_boolean_true() {
        let clause = RuleBuilder::new("r")
            .head_vars(["x"])
            .body_atom("s", ["x"])
            .constraint(Argument::RecordInit(vec![]), Op::Equal, Argument::RecordInit(vec![]))
            .build();
        let folded = fold_clause(&clause).unwrap();
        assert_eq!(folded[0].body[1], Literal::BooleanConstraint(true));
    }
}
