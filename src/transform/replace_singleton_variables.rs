//! Variables that occur exactly once in a clause, and not inside a record,
//! ADT, or constraint, become unnamed variables — they carry no binding
//! information so giving them a name only costs readability downstream.

use crate::ast::{Argument, Clause, Literal};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashMap;

fn count_occurrences(clause: &Clause) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    let mut vars = Vec::new();
    clause.head.args.iter().for_each(|a| a.collect_variables(&mut vars));
    for lit in &clause.body {
        lit.collect_variables(&mut vars);
    }
    for v in vars {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
}

/// Only direct (top-level, non-nested) atom-argument occurrences of a
/// singleton variable are eligible; one nested inside a record/ADT/functor
/// or a binary constraint keeps its name since renaming there would lose
/// the variable's only use site for the equality it anchors.
fn replace_in_atom_args(args: &mut [Argument], singleton: &str) {
    for arg in args.iter_mut() {
        if matches!(arg, Argument::Variable(name) if name == singleton) {
            *arg = Argument::UnnamedVariable;
        }
    }
}

#[derive(Clone)]
pub struct ReplaceSingletonVariables;

impl Transformer for ReplaceSingletonVariables {
    fn name(&self) -> &str {
        "ReplaceSingletonVariables"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        let mut clauses = std::mem::take(&mut tu.program_mut().clauses);
        for clause in &mut clauses {
            let counts = count_occurrences(clause);
            let singletons: Vec<String> =
                counts.into_iter().filter(|(_, n)| *n == 1).map(|(v, _)| v).collect();
            for singleton in singletons {
                replace_in_atom_args(&mut clause.head.args, &singleton);
                for lit in &mut clause.body {
                    if let Literal::Atom(atom) | Literal::Negation(atom) = lit {
                        let before = atom.args.clone();
                        replace_in_atom_args(&mut atom.args, &singleton);
                        if atom.args != before {
                            changed = true;
                        }
                    }
                }
            }
        }
        tu.program_mut().clauses = clauses;
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
    fn singleton_becomes_unnamed() {
        let clause = RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x", "y"]).build();
        let mut program = crate::ast::Program::new();
        program.clauses.push(clause);
        let mut tu = TranslationUnit::new(program);
        assert!(ReplaceSingletonVariables.apply(&mut tu));
        let rewritten = &tu.program().clauses[0];
        assert!(matches!(rewritten.body[0], Literal::Atom(ref a) if a.args[1] == Argument::UnnamedVariable));
        assert_eq!(rewritten.head.args[0], Argument::var("x"));
    }

    #[test]
    fn repeated_variable_is_untouched() {
        let clause = RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x", "x"]).build();
        let mut program = crate::ast::Program::new();
        program.clauses.push(clause);
        let mut tu = TranslationUnit::new(program);
        assert!(!ReplaceSingletonVariables.apply(&mut tu));
    }
}
