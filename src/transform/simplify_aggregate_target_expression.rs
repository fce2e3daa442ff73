//! Rewrites an aggregator whose target expression is not a bare variable
//! (`sum x+1 : { foo(x) }`) into `sum @target0 : { foo(x), @target0 = x+1 }`,
//! renaming any outer-scope variable the fresh target name would otherwise
//! shadow inside the aggregator body.

use crate::ast::{Argument, AggregateOp, BinaryConstraintOp, Literal};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;

fn rename_variable_in_body(body: &mut [Literal], from: &str, to: &str) {
    for lit in body.iter_mut() {
        lit.map_arguments(&mut |arg| rename_variable(arg, from, to));
    }
}

fn rename_variable(arg: Argument, from: &str, to: &str) -> Argument {
    match arg {
        Argument::Variable(v) if v == from => Argument::Variable(to.to_string()),
        mut other => {
            other.map_children(&mut |child| rename_variable(child, from, to));
            other
        }
    }
}

fn simplify_argument(arg: &mut Argument, counter: &mut u32) -> bool {
    let mut changed = false;
    if let Argument::Aggregator(_, Some(target), body) = arg {
        if !matches!(target.as_ref(), Argument::Variable(_)) {
            *counter += 1;
            let fresh = format!("@target{counter}");
            if let Argument::Variable(shadowed) = target.as_ref() {
                rename_variable_in_body(body, shadowed, &fresh);
            }
            let expr = std::mem::replace(target.as_mut(), Argument::var(fresh.clone()));
            body.push(Literal::BinaryConstraint(BinaryConstraintOp::Equal, Argument::var(fresh), expr));
            changed = true;
        }
    }
    arg.map_children(&mut |mut child| {
        changed |= simplify_argument(&mut child, counter);
        child
    });
    changed
}

#[derive(Clone)]
pub struct SimplifyAggregateTargetExpression;

impl Transformer for SimplifyAggregateTargetExpression {
    fn name(&self) -> &str {
        "SimplifyAggregateTargetExpression"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        let mut counter = 0;
        for clause in &mut tu.program_mut().clauses {
            for lit in &mut clause.body {
                lit.map_arguments(&mut |mut arg| {
                    changed |= simplify_argument(&mut arg, &mut counter);
                    arg
                });
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
    use crate::ast::Atom;

    #[test]
    fn non_variable_target_is_lifted_to_fresh_variable() {
        let expr = Argument::IntrinsicFunctor(
            crate::ast::IntrinsicOp::Add,
            vec![Argument::var("x"), Argument::NumericConstant("1".into(), None)],
        );
        let aggregator = Argument::Aggregator(
            AggregateOp::Sum,
            Some(Box::new(expr)),
            vec![Literal::Atom(Atom::new("foo".into(), vec![Argument::var("x")]))],
        );
        let mut counter = 0;
        let mut arg = aggregator;
        assert!(simplify_argument(&mut arg, &mut counter));
        if let Argument::Aggregator(_, Some(target), body) = &arg {
            assert!(matches!(target.as_ref(), Argument::Variable(_)));
            assert_eq!(body.len(), 2);
        } else {
            panic!("expected aggregator");
        }
    }
}
