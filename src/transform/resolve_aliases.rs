//! Non-disableable: collapses trivial equalities and lifts complex terms out
//! of atom argument positions so every atom argument is a variable or a
//! primitive constant. Grounded on Soufflé's `ResolveAliasesTransformer`.

use crate::ast::{Argument, BinaryConstraintOp, Clause, Literal};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;

fn substitute_variable(arg: &Argument, name: &str, replacement: &Argument) -> Argument {
    match arg {
        Argument::Variable(v) if v == name => replacement.clone(),
        Argument::Variable(_)
        | Argument::UnnamedVariable
        | Argument::NumericConstant(..)
        | Argument::StringConstant(_)
        | Argument::NilConstant
        | Argument::Counter => arg.clone(),
        Argument::RecordInit(args) => {
            Argument::RecordInit(args.iter().map(|a| substitute_variable(a, name, replacement)).collect())
        }
        Argument::BranchInit(ctor, args) => Argument::BranchInit(
            ctor.clone(),
            args.iter().map(|a| substitute_variable(a, name, replacement)).collect(),
        ),
        Argument::IntrinsicFunctor(op, args) => {
            Argument::IntrinsicFunctor(*op, args.iter().map(|a| substitute_variable(a, name, replacement)).collect())
        }
        Argument::UserDefinedFunctor(fname, args) => Argument::UserDefinedFunctor(
            fname.clone(),
            args.iter().map(|a| substitute_variable(a, name, replacement)).collect(),
        ),
        Argument::TypeCast(inner, ty) => {
            Argument::TypeCast(Box::new(substitute_variable(inner, name, replacement)), ty.clone())
        }
        Argument::Aggregator(op, target, body) => Argument::Aggregator(
            *op,
            target.as_ref().map(|t| Box::new(substitute_variable(t, name, replacement))),
            body.iter().map(|lit| substitute_variable_in_literal(lit, name, replacement)).collect(),
        ),
    }
}

fn substitute_variable_in_literal(literal: &Literal, name: &str, replacement: &Argument) -> Literal {
    match literal {
        Literal::Atom(atom) => Literal::Atom(crate::ast::Atom::new(
            atom.name.clone(),
            atom.args.iter().map(|a| substitute_variable(a, name, replacement)).collect(),
        )),
        Literal::Negation(atom) => Literal::Negation(crate::ast::Atom::new(
            atom.name.clone(),
            atom.args.iter().map(|a| substitute_variable(a, name, replacement)).collect(),
        )),
        Literal::BinaryConstraint(op, lhs, rhs) => Literal::BinaryConstraint(
            *op,
            substitute_variable(lhs, name, replacement),
            substitute_variable(rhs, name, replacement),
        ),
        Literal::BooleanConstraint(b) => Literal::BooleanConstraint(*b),
    }
}

/// Exposed for `ResolveAnonymousRecordAliases`, which needs the plain
/// substitution step without the rest of `resolve_aliases`'s fixpoint.
#[must_use]
pub fn resolve_aliases_substitute_only(clause: &Clause, name: &str, replacement: &Argument) -> Clause {
    substitute_in_clause(clause, name, replacement)
}

fn substitute_in_clause(clause: &Clause, name: &str, replacement: &Argument) -> Clause {
    let head = crate::ast::Atom::new(
        clause.head.name.clone(),
        clause.head.args.iter().map(|a| substitute_variable(a, name, replacement)).collect(),
    );
    let body = clause.body.iter().map(|lit| substitute_variable_in_literal(lit, name, replacement)).collect();
    Clause { head, body, plan: clause.plan.clone(), position: clause.position }
}

fn is_ground(arg: &Argument) -> bool {
    match arg {
        Argument::Variable(_) | Argument::UnnamedVariable | Argument::Aggregator(..) => false,
        Argument::NumericConstant(..) | Argument::StringConstant(_) | Argument::NilConstant | Argument::Counter => {
            true
        }
        _ => arg.child_arguments().into_iter().all(is_ground),
    }
}

fn is_complex_term(arg: &Argument) -> bool {
    matches!(
        arg,
        Argument::RecordInit(_)
            | Argument::BranchInit(..)
            | Argument::IntrinsicFunctor(..)
            | Argument::UserDefinedFunctor(..)
            | Argument::TypeCast(..)
            | Argument::Aggregator(..)
    )
}

/// `removeTrivialEquality(clause)`: drops `x = x` equalities between
/// identical variables.
#[must_use]
pub fn remove_trivial_equality(clause: &Clause) -> Clause {
    let body = clause
        .body
        .iter()
        .filter(|lit| {
            !matches!(
                lit,
                Literal::BinaryConstraint(BinaryConstraintOp::Equal, Argument::Variable(a), Argument::Variable(b))
                    if a == b
            )
        })
        .cloned()
        .collect();
    Clause { head: clause.head.clone(), body, plan: clause.plan.clone(), position: clause.position }
}

/// One fixpoint pass of alias/ground-equality elimination plus complex-term
/// lifting; exposed standalone so other transformers that synthesise a
/// clause outside the main rewrite pipeline can re-normalise it directly
/// (e.g. `resolve_aliases_substitute_only` below, used by
/// `ResolveAnonymousRecordAliases`).
#[must_use]
pub fn resolve_aliases(clause: &Clause) -> Clause {
    let mut current = clause.clone();
    loop {
        let mut changed = false;

        // (i)/(ii): alias and ground-equality elimination.
        if let Some(index) = current.body.iter().position(|lit| is_alias_equality(lit)) {
            let (name, replacement) = match &current.body[index] {
                Literal::BinaryConstraint(BinaryConstraintOp::Equal, Argument::Variable(v), rhs)
                    if !matches!(rhs, Argument::Variable(_)) || is_ground(rhs) =>
                {
                    (v.clone(), rhs.clone())
                }
                Literal::BinaryConstraint(BinaryConstraintOp::Equal, lhs, Argument::Variable(v)) => {
                    (v.clone(), lhs.clone())
                }
                _ => unreachable!("is_alias_equality guarantees one of the above shapes"),
            };
            let mut next = substitute_in_clause(&current, &name, &replacement);
            next.body.remove(index);
            current = next;
            changed = true;
        }

        current = remove_trivial_equality(&current);

        // (iv): lift complex terms out of atom argument positions.
        if let Some((literal_index, arg_index, term)) = find_complex_atom_argument(&current) {
            let fresh = format!("@alias{literal_index}_{arg_index}");
            let equality = Literal::BinaryConstraint(BinaryConstraintOp::Equal, Argument::var(fresh.clone()), term);
            replace_atom_argument(&mut current, literal_index, arg_index, Argument::var(fresh));
            current.body.push(equality);
            changed = true;
        }

        if !changed {
            break;
        }
    }
    current
}

fn is_alias_equality(literal: &Literal) -> bool {
    matches!(
        literal,
        Literal::BinaryConstraint(BinaryConstraintOp::Equal, Argument::Variable(_), _)
            | Literal::BinaryConstraint(BinaryConstraintOp::Equal, _, Argument::Variable(_))
    )
}

/// First complex-term atom argument found, scanning the head (index `usize::MAX`)
/// then each body literal in order.
fn find_complex_atom_argument(clause: &Clause) -> Option<(usize, usize, Argument)> {
    for (i, arg) in clause.head.args.iter().enumerate() {
        if is_complex_term(arg) {
            return Some((usize::MAX, i, arg.clone()));
        }
    }
    for (literal_index, literal) in clause.body.iter().enumerate() {
        if let Literal::Atom(atom) | Literal::Negation(atom) = literal {
            for (arg_index, arg) in atom.args.iter().enumerate() {
                if is_complex_term(arg) {
                    return Some((literal_index, arg_index, arg.clone()));
                }
            }
        }
    }
    None
}

fn replace_atom_argument(clause: &mut Clause, literal_index: usize, arg_index: usize, replacement: Argument) {
    if literal_index == usize::MAX {
        clause.head.args[arg_index] = replacement;
        return;
    }
    if let Literal::Atom(atom) | Literal::Negation(atom) = &mut clause.body[literal_index] {
        atom.args[arg_index] = replacement;
    }
}

#[derive(Clone)]
pub struct ResolveAliasesTransformer;

impl Transformer for ResolveAliasesTransformer {
    fn name(&self) -> &str {
        "ResolveAliasesTransformer"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        let clauses = std::mem::take(&mut tu.program_mut().clauses);
        let rewritten: Vec<Clause> = clauses
            .into_iter()
            .map(|clause| {
                let next = resolve_aliases(&clause);
                if next != clause {
                    changed = true;
                }
                next
            })
            .collect();
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
    fn alias_substitution_eliminates_equality() {
        let clause = RuleBuilder::new("r")
            .head_vars(["y"])
            .body_atom("s", ["x"])
            .constraint(Argument::var("y"), Op::Equal, Argument::var("x"))
            .build();
        let resolved = resolve_aliases(&clause);
        assert_eq!(resolved.head.args, vec![Argument::var("x")]);
        assert!(!resolved.body.iter().any(|l| matches!(l, Literal::BinaryConstraint(Op::Equal, ..))));
    }

    #[test]
    fn trivial_equality_is_removed() {
        let clause = RuleBuilder::new("r")
            .head_vars(["x"])
            .body_atom("s", ["x"])
            .constraint(Argument::var("x"), Op::Equal, Argument::var("x"))
            .build();
        let resolved = resolve_aliases(&clause);
        assert_eq!(resolved.body.len(), 1);
    }

    #[test]
    fn complex_head_term_is_lifted_to_fresh_variable() {
        let clause = RuleBuilder::new("r").body_atom("s", ["x"]).build();
        let mut clause = clause;
        clause.head.args.push(Argument::RecordInit(vec![Argument::var("x")]));
        let resolved = resolve_aliases(&clause);
        assert!(matches!(resolved.head.args[0], Argument::Variable(_)));
        assert!(resolved
            .body
            .iter()
            .any(|l| matches!(l, Literal::BinaryConstraint(Op::Equal, _, Argument::RecordInit(_)))));
    }
}
