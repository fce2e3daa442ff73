//! Normalised representation of every clause: a stable, alpha-renaming-
//! tolerant fingerprint used by `MinimiseProgram`'s bijective-equivalence
//! pass and by the magic-set adornment stage's ground/non-ground checks.

use crate::ast::{Argument, BinaryConstraintOp, Clause, Literal};
use crate::translation_unit::{Analysis, TranslationUnit};
use std::collections::BTreeSet;

/// One emitted element of a normalised clause: a qualifier tag (`"@h"`,
/// `"@n"`, a relation name, or a constraint operator spelling) plus the
/// stable string form of each argument in that position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NormalisedElement {
    pub qualifier: String,
    pub params: Vec<String>,
    pub scope: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalisedClause {
    pub fully_normalised: bool,
    pub variables: BTreeSet<String>,
    pub constants: BTreeSet<String>,
    pub aggregate_scopes: u32,
    pub elements: Vec<NormalisedElement>,
}

struct Normaliser {
    clause: NormalisedClause,
    fresh_counter: u32,
}

impl Normaliser {
    fn fresh_variable(&mut self) -> String {
        self.fresh_counter += 1;
        self.clause.fully_normalised = false;
        format!("@anon{}", self.fresh_counter)
    }

    /// Stable string form of one argument; records variables/constants into
    /// the clause-wide sets as a side effect.
    fn normalise_argument(&mut self, arg: &Argument) -> String {
        match arg {
            Argument::Variable(name) => {
                self.clause.variables.insert(name.clone());
                name.clone()
            }
            Argument::UnnamedVariable => self.fresh_variable(),
            Argument::NumericConstant(text, _) => {
                self.clause.constants.insert(text.clone());
                text.clone()
            }
            Argument::StringConstant(text) => {
                let quoted = format!("\"{text}\"");
                self.clause.constants.insert(quoted.clone());
                quoted
            }
            Argument::NilConstant => {
                self.clause.constants.insert("nil".to_string());
                "nil".to_string()
            }
            Argument::Counter => {
                self.clause.constants.insert("$".to_string());
                "$".to_string()
            }
            Argument::RecordInit(_)
            | Argument::BranchInit(..)
            | Argument::IntrinsicFunctor(..)
            | Argument::UserDefinedFunctor(..)
            | Argument::TypeCast(..)
            | Argument::Aggregator(..) => self.fresh_variable(),
        }
    }

    fn push_element(&mut self, qualifier: String, args: &[Argument], scope: u32) {
        let params = args.iter().map(|a| self.normalise_argument(a)).collect();
        self.clause.elements.push(NormalisedElement { qualifier, params, scope });
    }

    fn normalise_literal(&mut self, literal: &Literal, scope: u32) {
        match literal {
            Literal::Atom(atom) => self.push_element(atom.name.to_dotted_string(), &atom.args, scope),
            Literal::Negation(atom) => {
                let params = atom.args.iter().map(|a| self.normalise_argument(a)).collect();
                self.clause.elements.push(NormalisedElement {
                    qualifier: format!("@n.{}", atom.name),
                    params,
                    scope,
                });
            }
            Literal::BinaryConstraint(op, lhs, rhs) => {
                let a = self.normalise_argument(lhs);
                let b = self.normalise_argument(rhs);
                self.clause.elements.push(NormalisedElement {
                    qualifier: constraint_qualifier(*op),
                    params: vec![a, b],
                    scope,
                });
            }
            Literal::BooleanConstraint(value) => {
                self.clause.elements.push(NormalisedElement {
                    qualifier: "@b".to_string(),
                    params: vec![value.to_string()],
                    scope,
                });
            }
        }
    }
}

fn constraint_qualifier(op: BinaryConstraintOp) -> String {
    let symbol = match op {
        BinaryConstraintOp::Equal => "=",
        BinaryConstraintOp::NotEqual => "!=",
        BinaryConstraintOp::LessThan => "<",
        BinaryConstraintOp::LessOrEqual => "<=",
        BinaryConstraintOp::GreaterThan => ">",
        BinaryConstraintOp::GreaterOrEqual => ">=",
        BinaryConstraintOp::Match => "match",
        BinaryConstraintOp::NotMatch => "!match",
        BinaryConstraintOp::Contains => "contains",
        BinaryConstraintOp::NotContains => "!contains",
    };
    format!("@c.{symbol}")
}

/// Normalises a single clause in isolation; exposed standalone since
/// `MinimiseProgram` normalises candidate clause pairs outside the cached
/// whole-program analysis when probing permutations.
#[must_use]
pub fn normalise_clause(clause: &Clause) -> NormalisedClause {
    let mut normaliser =
        Normaliser { clause: NormalisedClause { fully_normalised: true, ..NormalisedClause::default() }, fresh_counter: 0 };
    normaliser.push_element("@h".to_string(), &clause.head.args, 0);
    for literal in &clause.body {
        normalise_body_literal(&mut normaliser, literal, 0);
    }
    normaliser.clause
}

fn normalise_body_literal(normaliser: &mut Normaliser, literal: &Literal, scope: u32) {
    normaliser.normalise_literal(literal, scope);
    // Aggregators nested inside this literal's arguments open their own
    // scope and recursively emit their body under it.
    for arg in literal_arguments(literal) {
        emit_aggregator_scopes(normaliser, arg, scope);
    }
}

fn literal_arguments(literal: &Literal) -> Vec<&Argument> {
    match literal {
        Literal::Atom(atom) | Literal::Negation(atom) => atom.args.iter().collect(),
        Literal::BinaryConstraint(_, lhs, rhs) => vec![lhs, rhs],
        Literal::BooleanConstraint(_) => Vec::new(),
    }
}

fn emit_aggregator_scopes(normaliser: &mut Normaliser, arg: &Argument, _outer_scope: u32) {
    if let Argument::Aggregator(_, _, body) = arg {
        normaliser.clause.aggregate_scopes += 1;
        let scope = normaliser.clause.aggregate_scopes;
        for lit in body {
            normalise_body_literal(normaliser, lit, scope);
        }
    }
    for child in arg.child_arguments() {
        emit_aggregator_scopes(normaliser, child, _outer_scope);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClauseNormalisation {
    per_clause: Vec<NormalisedClause>,
}

impl ClauseNormalisation {
    #[must_use]
    pub fn of(&self, clause_index: usize) -> Option<&NormalisedClause> {
        self.per_clause.get(clause_index)
    }
}

impl Analysis for ClauseNormalisation {
    fn name() -> &'static str {
        "clause-normalisation"
    }

    fn compute(tu: &TranslationUnit) -> Self {
        ClauseNormalisation {
            per_clause: tu.program().clauses.iter().map(normalise_clause).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::BinaryConstraintOp as Op;

    #[test]
    fn atomic_only_clause_is_fully_normalised() {
        let clause = RuleBuilder::new("r").head_vars(["x", "y"]).body_atom("s", ["x", "y"]).build();
        let normalised = normalise_clause(&clause);
        assert!(normalised.fully_normalised);
        assert!(normalised.variables.contains("x"));
        assert!(normalised.variables.contains("y"));
        assert_eq!(normalised.elements.len(), 2);
        assert_eq!(normalised.elements[0].qualifier, "@h");
    }

    #[test]
    fn complex_term_forces_not_fully_normalised() {
        let clause = RuleBuilder::new("r")
            .head_vars(["x"])
            .body_atom("s", ["x"])
            .constraint(Argument::var("x"), Op::Equal, Argument::RecordInit(vec![Argument::var("x")]))
            .build();
        let normalised = normalise_clause(&clause);
        assert!(!normalised.fully_normalised);
    }
}
