//! Resolves `v = [a,b,c]` equalities by substituting the record literal for
//! `v` everywhere in the clause, leaving `FoldAnonymousRecords` to handle the
//! remaining component-wise equalities/inequalities between two records.

use crate::ast::{Argument, BinaryConstraintOp, Clause, Literal};
use crate::transform::resolve_aliases::remove_trivial_equality;
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;

fn substitute_record_alias(clause: &Clause) -> Option<Clause> {
    for (index, literal) in clause.body.iter().enumerate() {
        let (var_name, record) = match literal {
            Literal::BinaryConstraint(BinaryConstraintOp::Equal, Argument::Variable(v), rec @ Argument::RecordInit(_)) => {
                (v.clone(), rec.clone())
            }
            Literal::BinaryConstraint(BinaryConstraintOp::Equal, rec @ Argument::RecordInit(_), Argument::Variable(v)) => {
                (v.clone(), rec.clone())
            }
            _ => continue,
        };
        let mut next = super::resolve_aliases::resolve_aliases_substitute_only(clause, &var_name, &record);
        next.body.remove(index);
        return Some(remove_trivial_equality(&next));
    }
    None
}

#[derive(Clone)]
pub struct ResolveAnonymousRecordAliases;

impl Transformer for ResolveAnonymousRecordAliases {
    fn name(&self) -> &str {
        "ResolveAnonymousRecordAliases"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        let clauses = std::mem::take(&mut tu.program_mut().clauses);
        let rewritten = clauses
            .into_iter()
            .map(|mut clause| {
                while let Some(next) = substitute_record_alias(&clause) {
                    clause = next;
                    changed = true;
                }
                clause
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
    fn record_alias_is_substituted_throughout_clause() {
        let clause = RuleBuilder::new("r")
            .head_vars(["rec"])
            .body_atom("s", ["a", "b"])
            .constraint(
                Argument::var("rec"),
                Op::Equal,
                Argument::RecordInit(vec![Argument::var("a"), Argument::var("b")]),
            )
            .build();
        let mut tu = crate::translation_unit::TranslationUnit::new({
            let mut p = crate::ast::Program::new();
            p.clauses.push(clause);
            p
        });
        let changed = ResolveAnonymousRecordAliases.apply(&mut tu);
        assert!(changed);
        assert!(matches!(tu.program().clauses[0].head.args[0], Argument::RecordInit(_)));
    }
}
