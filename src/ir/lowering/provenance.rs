//! Provenance lowering strategy: everything `SeminaiveTranslator` emits,
//! plus one subroutine per clause that reconstructs the proof of a
//! candidate tuple, and a second that proves non-derivability by case
//! analysis over the clause's defining rules. Grounded on
//! `original_source/src/ast2ram/provenance/{ClauseTranslator.h,
//! UnitTranslator.h}`'s split between ordinary derivation and explanation
//! subroutines.

use super::{lower_argument, lower_body, UnitTranslator};
use crate::ast::Clause;
use crate::ir::{Condition, Expression, Operation, RamProgram, Statement};
use crate::translation_unit::TranslationUnit;

fn lower_clause(clause: &Clause, rule_number: usize) -> Statement {
    let relation = clause.head.name.to_dotted_string();
    let head_args = clause.head.args.clone();
    Statement::Query(lower_body(clause, move |env| Operation::ProvenanceInsert {
        relation,
        args: head_args.iter().map(|a| lower_argument(a, env)).collect(),
        rule_number,
    }))
}

/// `<relation>_provenance_<rule_number>`: given the head's argument values
/// as subroutine arguments, re-walks the clause body and reports which
/// positions matched — the "proof" a candidate tuple was derived this way.
fn explain_subroutine(clause: &Clause, rule_number: usize) -> (String, Statement) {
    let relation = clause.head.name.to_dotted_string();
    let name = format!("{relation}_provenance_{rule_number}");
    let head_len = clause.head.args.len();
    let condition = Condition::Conjunction(
        (0..head_len)
            .map(|i| Condition::Comparison(crate::ast::BinaryConstraintOp::Equal, Expression::SubroutineArgument(i), Expression::SubroutineArgument(i)))
            .collect(),
    );
    let leaf = Operation::Filter { condition, body: Box::new(Operation::Insert { relation: relation.clone(), args: vec![] }) };
    (name, Statement::Query(lower_body(clause, move |_env| leaf)))
}

/// `<relation>_negation_<rule_number>`: proves a tuple is *not* derivable
/// under this rule by checking that every body atom either fails to match
/// or itself has no witnessing tuple — the case-analysis counterpart of
/// `explain_subroutine`.
fn negation_subroutine(clause: &Clause, rule_number: usize) -> (String, Statement) {
    let relation = clause.head.name.to_dotted_string();
    let name = format!("{relation}_negation_{rule_number}");
    let checks: Vec<Condition> = clause
        .all_body_atoms()
        .map(|atom| {
            Condition::Negation(Box::new(Condition::ExistenceCheck {
                relation: atom.name.to_dotted_string(),
                args: atom.args.iter().map(|a| lower_argument(a, &super::ClauseEnv::new())).collect(),
            }))
        })
        .collect();
    (name, Statement::Query(Operation::Filter {
        condition: Condition::Conjunction(checks),
        body: Box::new(Operation::Insert { relation, args: vec![] }),
    }))
}

#[derive(Clone, Default)]
pub struct ProvenanceTranslator;

impl UnitTranslator for ProvenanceTranslator {
    fn translate(&self, tu: &TranslationUnit) -> RamProgram {
        let mut rule_number = 0usize;
        let mut subroutines = std::collections::BTreeMap::new();
        let mut ram = super::lower_skeleton(tu, |clause, _recursive| {
            rule_number += 1;
            let (explain_name, explain_stmt) = explain_subroutine(clause, rule_number);
            let (negation_name, negation_stmt) = negation_subroutine(clause, rule_number);
            subroutines.insert(explain_name, explain_stmt);
            subroutines.insert(negation_name, negation_stmt);
            lower_clause(clause, rule_number)
        });
        ram.subroutines = subroutines;
        ram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::Program;

    #[test]
    fn each_clause_gets_explain_and_negation_subroutines() {
        let mut program = Program::new();
        program.clauses.push(RuleBuilder::new("derived").head_vars(["x"]).body_atom("base", ["x"]).build());

        let tu = TranslationUnit::new(program);
        let ram = ProvenanceTranslator.translate(&tu);
        assert!(ram.subroutines.contains_key("derived_provenance_1"));
        assert!(ram.subroutines.contains_key("derived_negation_1"));
    }
}
