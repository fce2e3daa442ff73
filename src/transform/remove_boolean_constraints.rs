//! Prunes literal `true` from clause bodies, drops clauses containing
//! literal `false`, and applies the same simplification inside aggregator
//! bodies (substituting `1=1`/`0=1` for an aggregator body that becomes
//! empty).

use crate::ast::{Argument, BinaryConstraintOp, Clause, Literal};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;

fn simplify_body(body: Vec<Literal>) -> Option<Vec<Literal>> {
    if body.iter().any(|lit| matches!(lit, Literal::BooleanConstraint(false))) {
        return None;
    }
    let mut simplified: Vec<Literal> = body
        .into_iter()
        .filter(|lit| !matches!(lit, Literal::BooleanConstraint(true)))
        .map(simplify_literal_arguments)
        .collect();
    if simplified.is_empty() {
        let one = Argument::NumericConstant("1".to_string(), None);
        simplified.push(Literal::BinaryConstraint(BinaryConstraintOp::Equal, one.clone(), one));
    }
    Some(simplified)
}

fn simplify_literal_arguments(literal: Literal) -> Literal {
    match literal {
        Literal::Atom(mut atom) => {
            for arg in &mut atom.args {
                simplify_argument_aggregators(arg);
            }
            Literal::Atom(atom)
        }
        Literal::Negation(mut atom) => {
            for arg in &mut atom.args {
                simplify_argument_aggregators(arg);
            }
            Literal::Negation(atom)
        }
        Literal::BinaryConstraint(op, mut lhs, mut rhs) => {
            simplify_argument_aggregators(&mut lhs);
            simplify_argument_aggregators(&mut rhs);
            Literal::BinaryConstraint(op, lhs, rhs)
        }
        Literal::BooleanConstraint(b) => Literal::BooleanConstraint(b),
    }
}

fn simplify_argument_aggregators(arg: &mut Argument) {
    if let Argument::Aggregator(_, _, body) = arg {
        if let Some(simplified) = simplify_body(std::mem::take(body)) {
            *body = simplified;
        }
    }
    arg.map_children(&mut |mut child| {
        simplify_argument_aggregators(&mut child);
        child
    });
}

#[derive(Clone)]
pub struct RemoveBooleanConstraints;

impl Transformer for RemoveBooleanConstraints {
    fn name(&self) -> &str {
        "RemoveBooleanConstraints"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let clauses = std::mem::take(&mut tu.program_mut().clauses);
        let before = clauses.len();
        let mut changed = false;
        let mut rewritten = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let original_len = clause.body.len();
            match simplify_body(clause.body) {
                Some(body) => {
                    if body.len() != original_len {
                        changed = true;
                    }
                    rewritten.push(Clause { head: clause.head, body, plan: clause.plan, position: clause.position });
                }
                None => changed = true,
            }
        }
        changed = changed || rewritten.len() != before;
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

    #[test]
    fn literal_true_is_pruned() {
        let mut clause = RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x"]).build();
        clause.body.push(Literal::BooleanConstraint(true));
        let simplified = simplify_body(clause.body).unwrap();
        assert_eq!(simplified.len(), 1);
    }

    #[test]
    fn literal_false_drops_clause() {
        let mut clause = RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x"]).build();
        clause.body.push(Literal::BooleanConstraint(false));
        assert!(simplify_body(clause.body).is_none());
    }
}
