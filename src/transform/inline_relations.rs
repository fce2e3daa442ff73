//! Expands calls to relations qualified `inline` by substituting the
//! call-site arguments for the defining clause's head arguments and
//! splicing its body literals into the caller. Runs one call-site per
//! `apply()`, so the surrounding `Fixpoint` drives repeated nested
//! expansion.

use crate::ast::{Argument, Atom, Clause, Literal, Program, QualifiedName, Relation};
use crate::error::DiagnosticKind;
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashMap;

fn is_inline(program: &Program, name: &QualifiedName) -> bool {
    program.relation(name).is_some_and(Relation::is_inline)
}

/// First literal position in `clause.body` naming an inline relation, if any.
fn find_inline_call(program: &Program, clause: &Clause) -> Option<usize> {
    clause.body.iter().position(|lit| match lit {
        Literal::Atom(atom) | Literal::Negation(atom) => is_inline(program, &atom.name),
        _ => false,
    })
}

fn substitute(arg: Argument, bindings: &HashMap<String, Argument>) -> Argument {
    match arg {
        Argument::Variable(ref name) => bindings.get(name).cloned().unwrap_or(arg),
        mut other => {
            other.map_children(&mut |child| substitute(child, bindings));
            other
        }
    }
}

fn substitute_in_literal(mut lit: Literal, bindings: &HashMap<String, Argument>) -> Literal {
    lit.map_arguments(&mut |arg| substitute(arg, bindings));
    lit
}

/// Renames every variable in `clause` by appending `suffix`, so a clause
/// inlined twice into the same caller clause never collides with itself or
/// with the caller's own variables.
fn freshen(clause: &Clause, suffix: &str) -> Clause {
    let mut renamed = clause.clone();
    let rename = |arg: Argument| match arg {
        Argument::Variable(name) => Argument::Variable(format!("{name}{suffix}")),
        other => other,
    };
    for arg in &mut renamed.head.args {
        let taken = std::mem::replace(arg, Argument::NilConstant);
        *arg = substitute_var(taken, &rename);
    }
    for lit in &mut renamed.body {
        lit.map_arguments(&mut |arg| substitute_var(arg, &rename));
    }
    renamed
}

fn substitute_var(arg: Argument, rename: &impl Fn(Argument) -> Argument) -> Argument {
    match arg {
        Argument::Variable(name) => rename(Argument::Variable(name)),
        mut other => {
            other.map_children(&mut |child| substitute_var(child, rename));
            other
        }
    }
}

/// Builds the positional binding from a defining clause's head arguments to
/// the call-site's actual arguments; non-variable call arguments become
/// equality constraints appended to the expansion instead of a binding.
fn bind_head_to_call(head_args: &[Argument], call_args: &[Argument]) -> (HashMap<String, Argument>, Vec<Literal>) {
    let mut bindings = HashMap::new();
    let mut extra = Vec::new();
    for (head_arg, call_arg) in head_args.iter().zip(call_args.iter()) {
        if let Argument::Variable(name) = head_arg {
            bindings.insert(name.clone(), call_arg.clone());
        } else {
            extra.push(Literal::BinaryConstraint(
                crate::ast::BinaryConstraintOp::Equal,
                head_arg.clone(),
                call_arg.clone(),
            ));
        }
    }
    (bindings, extra)
}

/// Expands one positive inlined call: for each of the relation's defining
/// clauses, produces a variant of `clause` with the call literal replaced by
/// that clause's (freshened, substituted) body.
fn expand_positive(program: &Program, clause: &Clause, call_index: usize, atom: &Atom, tag: &mut u32) -> Vec<Clause> {
    let mut expansions = Vec::new();
    for definition in program.clauses_for(&atom.name) {
        *tag += 1;
        let fresh = freshen(definition, &format!("@inline{tag}"));
        let (bindings, mut extra) = bind_head_to_call(&fresh.head.args, &atom.args);
        let mut substituted_body: Vec<Literal> =
            fresh.body.into_iter().map(|lit| substitute_in_literal(lit, &bindings)).collect();
        substituted_body.append(&mut extra);

        let mut next = clause.clone();
        next.body.splice(call_index..=call_index, substituted_body);
        expansions.push(next);
    }
    expansions
}

/// Expands one negated inlined call via De Morgan across *every* defining
/// clause of `R`, not just a single one: `R(args)` holds iff some defining
/// clause's body holds, so `!R(args)` is the conjunction, over all defining
/// clauses, of "that clause's body doesn't hold" — and each of those in turn
/// is a disjunction over the clause's own negated literals. Distributing that
/// conjunction-of-disjunctions into disjunctive form means taking the
/// Cartesian product across clauses (one disjunct chosen per defining
/// clause); each element of the product becomes one output clause whose body
/// is the conjunction of the chosen negated literals.
fn expand_negative(
    program: &Program,
    clause: &Clause,
    call_index: usize,
    atom: &Atom,
    tag: &mut u32,
    errors: &mut crate::error::ErrorReport,
) -> Vec<Clause> {
    let definitions = program.clauses_for(&atom.name);
    if definitions.is_empty() {
        errors.error(
            DiagnosticKind::SemanticError(format!(
                "negated call to inlined relation '{}' has no defining clauses",
                atom.name
            )),
            clause.head.position.clone(),
        );
        return vec![clause.clone()];
    }

    let mut per_clause_disjuncts: Vec<Vec<Literal>> = Vec::with_capacity(definitions.len());
    for definition in definitions {
        *tag += 1;
        let fresh = freshen(definition, &format!("@inline{tag}"));
        let (bindings, extra) = bind_head_to_call(&fresh.head.args, &atom.args);
        if !extra.is_empty() {
            // Non-variable head arguments under negation would need existential
            // grounding beyond simple De Morgan splitting; out of scope here.
            errors.error(
                DiagnosticKind::SemanticError(format!(
                    "negated call to inlined relation '{}' with non-variable arguments is not supported",
                    atom.name
                )),
                clause.head.position.clone(),
            );
            return vec![clause.clone()];
        }
        let body: Vec<Literal> = fresh.body.into_iter().map(|lit| substitute_in_literal(lit, &bindings)).collect();
        per_clause_disjuncts.push(body.into_iter().map(negate).collect());
    }

    let mut combinations: Vec<Vec<Literal>> = vec![Vec::new()];
    for disjuncts in &per_clause_disjuncts {
        let mut next_combinations = Vec::with_capacity(combinations.len() * disjuncts.len());
        for combo in &combinations {
            for lit in disjuncts {
                let mut next = combo.clone();
                next.push(lit.clone());
                next_combinations.push(next);
            }
        }
        combinations = next_combinations;
    }

    combinations
        .into_iter()
        .map(|combo| {
            let mut next = clause.clone();
            next.body.splice(call_index..=call_index, combo);
            next
        })
        .collect()
}

fn negate(lit: Literal) -> Literal {
    match lit {
        Literal::Atom(atom) => Literal::Negation(atom),
        Literal::Negation(atom) => Literal::Atom(atom),
        Literal::BinaryConstraint(op, lhs, rhs) => Literal::BinaryConstraint(negate_op(op), lhs, rhs),
        Literal::BooleanConstraint(b) => Literal::BooleanConstraint(!b),
    }
}

fn negate_op(op: crate::ast::BinaryConstraintOp) -> crate::ast::BinaryConstraintOp {
    use crate::ast::BinaryConstraintOp as Op;
    match op {
        Op::Equal => Op::NotEqual,
        Op::NotEqual => Op::Equal,
        Op::LessThan => Op::GreaterOrEqual,
        Op::LessOrEqual => Op::GreaterThan,
        Op::GreaterThan => Op::LessOrEqual,
        Op::GreaterOrEqual => Op::LessThan,
        Op::Match => Op::NotMatch,
        Op::NotMatch => Op::Match,
        Op::Contains => Op::NotContains,
        Op::NotContains => Op::Contains,
    }
}

#[derive(Clone)]
pub struct InlineRelations;

impl Transformer for InlineRelations {
    fn name(&self) -> &str {
        "InlineRelations"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let program = tu.program().clone();
        let mut target = None;
        for (index, clause) in program.clauses.iter().enumerate() {
            if let Some(call_index) = find_inline_call(&program, clause) {
                target = Some((index, call_index));
                break;
            }
        }
        let Some((clause_index, call_index)) = target else {
            return false;
        };

        let clause = &program.clauses[clause_index];
        let mut tag = 0;
        let expansions = match &clause.body[call_index] {
            Literal::Atom(atom) => expand_positive(&program, clause, call_index, atom, &mut tag),
            Literal::Negation(atom) => expand_negative(&program, clause, call_index, atom, &mut tag, &mut tu.errors),
            _ => unreachable!("find_inline_call only selects Atom/Negation literals"),
        };

        let program = tu.program_mut();
        program.clauses.splice(clause_index..=clause_index, expansions);
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
    use crate::ast::{Attribute, Relation, RelationQualifier};

    fn inline_relation(name: &str) -> Relation {
        let mut r = Relation::new(QualifiedName::from(name), vec![Attribute { name: "x".into(), type_name: "number".into() }]);
        r.qualifiers.insert(RelationQualifier::Inline);
        r
    }

    #[test]
    fn positive_call_is_spliced_into_caller() {
        let mut program = Program::new();
        program.relations.push(inline_relation("small"));
        program.clauses.push(RuleBuilder::new("small").head_vars(["x"]).constraint(
            Argument::var("x"),
            crate::ast::BinaryConstraintOp::LessThan,
            Argument::NumericConstant("10".into(), None),
        ).build());
        program.clauses.push(RuleBuilder::new("result").head_vars(["y"]).body_atom("small", ["y"]).build());

        let mut tu = TranslationUnit::new(program);
        assert!(InlineRelations.apply(&mut tu));
        let result_clause = tu.program().clauses.iter().find(|c| c.head.name == QualifiedName::from("result")).unwrap();
        assert!(result_clause.body.iter().any(|l| matches!(l, Literal::BinaryConstraint(..))));
        assert!(!result_clause.body.iter().any(|l| matches!(l, Literal::Atom(a) if a.name == QualifiedName::from("small"))));
    }

    #[test]
    fn negated_call_expands_via_de_morgan() {
        let mut program = Program::new();
        program.relations.push(inline_relation("ok"));
        program
            .clauses
            .push(RuleBuilder::new("ok").head_vars(["x"]).body_atom("a", ["x"]).body_atom("b", ["x"]).build());
        program.clauses.push(RuleBuilder::new("result").head_vars(["y"]).negated_atom("ok", ["y"]).build());

        let mut tu = TranslationUnit::new(program);
        assert!(InlineRelations.apply(&mut tu));
        assert_eq!(tu.program().clauses.iter().filter(|c| c.head.name == QualifiedName::from("result")).count(), 2);
    }

    #[test]
    fn negated_call_with_two_defining_clauses_produces_their_cartesian_product() {
        let mut program = Program::new();
        program.relations.push(inline_relation("ok"));
        // ok(x) :- a(x),b(x).    ok(x) :- c(x),d(x).
        program
            .clauses
            .push(RuleBuilder::new("ok").head_vars(["x"]).body_atom("a", ["x"]).body_atom("b", ["x"]).build());
        program
            .clauses
            .push(RuleBuilder::new("ok").head_vars(["x"]).body_atom("c", ["x"]).body_atom("d", ["x"]).build());
        program.clauses.push(RuleBuilder::new("result").head_vars(["y"]).negated_atom("ok", ["y"]).build());

        let mut tu = TranslationUnit::new(program);
        assert!(InlineRelations.apply(&mut tu));
        let result_clauses: Vec<_> =
            tu.program().clauses.iter().filter(|c| c.head.name == QualifiedName::from("result")).collect();
        // 2 disjuncts per clause, 2 defining clauses -> 2*2 = 4 combinations,
        // each conjoining one negated literal from each defining clause.
        assert_eq!(result_clauses.len(), 4);
        for clause in &result_clauses {
            assert_eq!(clause.body.len(), 2);
            assert!(clause.body.iter().all(|l| matches!(l, Literal::Negation(_))));
        }
    }
}
