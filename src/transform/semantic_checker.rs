//! Omnibus static checks run once the program has been fully normalised:
//! type-correctness, variable groundedness, aggregator witness validity,
//! directive parameter validity, and declaration redefinition. Never
//! mutates the `Program` — only ever pushes into the `ErrorReport`.

use crate::analysis::binding_store::compute_clause_bindings;
use crate::analysis::type_analysis::{report_ill_typed_functors, TypeAnalysis};
use crate::ast::{AggregateOp, Argument, Clause, DirectiveKind, Literal, Program};
use crate::error::{DiagnosticKind, ErrorReport};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashSet;

fn check_redefinitions(program: &Program, errors: &mut ErrorReport) {
    let mut seen_relations = HashSet::new();
    for relation in &program.relations {
        if !seen_relations.insert(relation.name.to_dotted_string()) {
            errors.error(
                DiagnosticKind::SemanticError(format!("relation '{}' is declared more than once", relation.name)),
                relation.position.clone(),
            );
        }
    }

    let mut seen_functors = HashSet::new();
    for functor in &program.functor_declarations {
        if !seen_functors.insert(functor.name.clone()) {
            errors.error(
                DiagnosticKind::SemanticError(format!("functor '{}' is declared more than once", functor.name)),
                functor.position.clone(),
            );
        }
    }
}

fn check_clause_arity(program: &Program, clause: &Clause, errors: &mut ErrorReport) {
    for atom in clause.all_body_atoms().chain(std::iter::once(&clause.head)) {
        if let Some(relation) = program.relation(&atom.name) {
            if atom.args.len() != relation.arity() {
                errors.error(
                    DiagnosticKind::TypeError(format!(
                        "'{}' expects {} argument(s), found {}",
                        atom.name,
                        relation.arity(),
                        atom.args.len()
                    )),
                    clause.head.position.clone(),
                );
            }
        }
    }
}

/// A clause's head variables, and every variable fed to a non-aggregate
/// position, must be bound by the time the clause finishes evaluating.
fn check_groundedness(clause: &Clause, errors: &mut ErrorReport) {
    let bindings = compute_clause_bindings(clause);
    for arg in &clause.head.args {
        if let Argument::Variable(name) = arg {
            if !bindings.is_variable_bound(name) {
                errors.error(
                    DiagnosticKind::SemanticError(format!(
                        "variable '{name}' in the head of '{}' is never bound by the body",
                        clause.head.name
                    )),
                    clause.head.position.clone(),
                );
            }
        }
    }
}

fn check_aggregate_witnesses(arg: &Argument, clause: &Clause, errors: &mut ErrorReport) {
    if let Argument::Aggregator(op, target, body) = arg {
        if body.is_empty() {
            errors.error(
                DiagnosticKind::SemanticError(format!(
                    "aggregate in clause deriving '{}' has an empty body",
                    clause.head.name
                )),
                clause.head.position.clone(),
            );
        }
        if *op != AggregateOp::Count && target.is_none() {
            errors.error(
                DiagnosticKind::SemanticError(format!(
                    "aggregate in clause deriving '{}' is missing a target expression",
                    clause.head.name
                )),
                clause.head.position.clone(),
            );
        }
    }
    for child in arg.child_arguments() {
        check_aggregate_witnesses(child, clause, errors);
    }
}

fn check_directive_parameters(program: &Program, errors: &mut ErrorReport) {
    for directive in &program.directives {
        if program.relation(&directive.relation).is_none() {
            errors.error(
                DiagnosticKind::SemanticError(format!(
                    "directive refers to undeclared relation '{}'",
                    directive.relation
                )),
                directive.position.clone(),
            );
            continue;
        }
        if directive.kind == DirectiveKind::Limitsize {
            match directive.get("n") {
                None => errors.error(
                    DiagnosticKind::SemanticError(format!(
                        "'.limitsize {}' is missing its required 'n' parameter",
                        directive.relation
                    )),
                    directive.position.clone(),
                ),
                Some(value) if value.parse::<i64>().is_err() => errors.error(
                    DiagnosticKind::SemanticError(format!(
                        "'.limitsize {}' parameter 'n' must be an integer, found '{value}'",
                        directive.relation
                    )),
                    directive.position.clone(),
                ),
                _ => {}
            }
        }
    }
}

fn check_clause(program: &Program, clause: &Clause, errors: &mut ErrorReport) {
    check_clause_arity(program, clause, errors);
    check_groundedness(clause, errors);
    for lit in &clause.body {
        match lit {
            Literal::Atom(atom) | Literal::Negation(atom) => {
                for arg in &atom.args {
                    check_aggregate_witnesses(arg, clause, errors);
                }
            }
            Literal::BinaryConstraint(_, lhs, rhs) => {
                check_aggregate_witnesses(lhs, clause, errors);
                check_aggregate_witnesses(rhs, clause, errors);
            }
            Literal::BooleanConstraint(_) => {}
        }
    }
    for arg in &clause.head.args {
        check_aggregate_witnesses(arg, clause, errors);
    }
}

fn check_program(tu: &TranslationUnit, errors: &mut ErrorReport) {
    let program = tu.program();
    check_redefinitions(program, errors);
    check_directive_parameters(program, errors);
    for clause in &program.clauses {
        check_clause(program, clause, errors);
    }

    let type_analysis = TypeAnalysis::compute(tu);
    report_ill_typed_functors(&type_analysis, errors);
}

#[derive(Clone)]
pub struct SemanticChecker;

impl Transformer for SemanticChecker {
    fn name(&self) -> &str {
        "SemanticChecker"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut errors = ErrorReport::new();
        check_program(tu, &mut errors);
        for diagnostic in errors.diagnostics() {
            tu.errors.push(diagnostic.clone());
        }
        false
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::{Attribute, Directive, QualifiedName, Relation};

    #[test]
    fn duplicate_relation_declaration_is_an_error() {
        let mut program = Program::new();
        program.relations.push(Relation::new(QualifiedName::from("r"), vec![Attribute { name: "x".into(), type_name: "number".into() }]));
        program.relations.push(Relation::new(QualifiedName::from("r"), vec![Attribute { name: "x".into(), type_name: "number".into() }]));

        let mut tu = TranslationUnit::new(program);
        SemanticChecker.apply(&mut tu);
        assert_eq!(tu.errors.num_errors(), 1);
    }

    #[test]
    fn ungrounded_head_variable_is_an_error() {
        let mut program = Program::new();
        program.clauses.push(Clause::new(
            crate::ast::Atom::new(QualifiedName::from("r"), vec![Argument::var("x"), Argument::var("y")]),
            vec![Literal::Atom(crate::ast::Atom::new(QualifiedName::from("s"), vec![Argument::var("x")]))],
        ));

        let mut tu = TranslationUnit::new(program);
        SemanticChecker.apply(&mut tu);
        assert!(tu.errors.num_errors() >= 1);
    }

    #[test]
    fn directive_on_undeclared_relation_is_an_error() {
        let mut program = Program::new();
        program.directives.push(Directive::new(DirectiveKind::Input, QualifiedName::from("missing")));

        let mut tu = TranslationUnit::new(program);
        SemanticChecker.apply(&mut tu);
        assert_eq!(tu.errors.num_errors(), 1);
    }

    #[test]
    fn well_formed_program_has_no_errors() {
        let mut program = Program::new();
        program.relations.push(Relation::new(QualifiedName::from("s"), vec![Attribute { name: "x".into(), type_name: "number".into() }]));
        program.clauses.push(RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x"]).build());

        let mut tu = TranslationUnit::new(program);
        SemanticChecker.apply(&mut tu);
        assert_eq!(tu.errors.num_errors(), 0);
    }
}
