//! Per-clause variable boundedness, grounded directly on Soufflé's
//! `BindingStore::generateBindingDependencies`/`reduceDependencies` fixpoint:
//! positive body atoms bind their variables outright, then equality
//! constraints propagate boundedness until nothing more can be derived.

use crate::ast::{Argument, BinaryConstraintOp, Clause, Literal};
use crate::translation_unit::{Analysis, TranslationUnit};
use std::collections::HashSet;

/// A derived binding rule: once every variable in `requires` is bound,
/// every variable in `grants` becomes bound too.
struct Dependency {
    requires: Vec<String>,
    grants: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClauseBindingInfo {
    bound: HashSet<String>,
}

impl ClauseBindingInfo {
    #[must_use]
    pub fn is_variable_bound(&self, name: &str) -> bool {
        self.bound.contains(name)
    }

    /// `isBound(Argument)`: true iff a bound variable, a constant, or a term
    /// whose every sub-argument is (recursively) bound.
    #[must_use]
    pub fn is_bound(&self, arg: &Argument) -> bool {
        match arg {
            Argument::Variable(name) => self.bound.contains(name),
            Argument::UnnamedVariable => false,
            Argument::NumericConstant(..)
            | Argument::StringConstant(_)
            | Argument::NilConstant
            | Argument::Counter => true,
            _ => arg.child_arguments().into_iter().all(|child| self.is_bound(child)),
        }
    }

    #[must_use]
    pub fn num_bound_arguments(&self, args: &[Argument]) -> usize {
        args.iter().filter(|a| self.is_bound(a)).count()
    }
}

fn collect_dependencies_from_equality(lhs: &Argument, rhs: &Argument, out: &mut Vec<Dependency>) {
    let mut lhs_vars = Vec::new();
    lhs.collect_variables(&mut lhs_vars);
    let mut rhs_vars = Vec::new();
    rhs.collect_variables(&mut rhs_vars);

    if let Argument::Variable(v) = lhs {
        out.push(Dependency { requires: rhs_vars.clone(), grants: vec![v.clone()] });
        if let Argument::RecordInit(fields) = rhs {
            let field_vars: Vec<String> = fields.iter().filter_map(|f| f.as_variable().map(str::to_string)).collect();
            out.push(Dependency { requires: vec![v.clone()], grants: field_vars });
        }
    }
    if let Argument::Variable(v) = rhs {
        out.push(Dependency { requires: lhs_vars, grants: vec![v.clone()] });
        if let Argument::RecordInit(fields) = lhs {
            let field_vars: Vec<String> = fields.iter().filter_map(|f| f.as_variable().map(str::to_string)).collect();
            out.push(Dependency { requires: vec![v.clone()], grants: field_vars });
        }
    }
}

/// Computes boundedness for one clause; also the entry point used to probe
/// freshly synthesised clauses that are not (yet) part of the `Program`
/// `MagicSetTransformer`'s adornment stage builds.
#[must_use]
pub fn compute_clause_bindings(clause: &Clause) -> ClauseBindingInfo {
    let mut info = ClauseBindingInfo::default();

    for atom in clause.positive_body_atoms() {
        for arg in &atom.args {
            if let Argument::Variable(name) = arg {
                info.bound.insert(name.clone());
            }
        }
    }

    let mut dependencies = Vec::new();
    for literal in &clause.body {
        if let Literal::BinaryConstraint(BinaryConstraintOp::Equal, lhs, rhs) = literal {
            collect_dependencies_from_equality(lhs, rhs, &mut dependencies);
        }
    }

    loop {
        let mut changed = false;
        for dep in &dependencies {
            if dep.requires.iter().all(|v| info.bound.contains(v)) {
                for grant in &dep.grants {
                    if info.bound.insert(grant.clone()) {
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    info
}

#[derive(Debug, Clone, Default)]
pub struct BindingStore {
    per_clause: Vec<ClauseBindingInfo>,
}

impl BindingStore {
    #[must_use]
    pub fn of(&self, clause_index: usize) -> Option<&ClauseBindingInfo> {
        self.per_clause.get(clause_index)
    }
}

impl Analysis for BindingStore {
    fn name() -> &'static str {
        "binding-store"
    }

    fn compute(tu: &TranslationUnit) -> Self {
        BindingStore { per_clause: tu.program().clauses.iter().map(compute_clause_bindings).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::BinaryConstraintOp as Op;

    #[test]
    fn positive_body_atom_binds_its_variables() {
        let clause = RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x"]).build();
        let info = compute_clause_bindings(&clause);
        assert!(info.is_variable_bound("x"));
    }

    #[test]
    fn equality_propagates_boundedness() {
        let clause = RuleBuilder::new("r")
            .head_vars(["y"])
            .body_atom("s", ["x"])
            .constraint(Argument::var("y"), Op::Equal, Argument::var("x"))
            .build();
        let info = compute_clause_bindings(&clause);
        assert!(info.is_variable_bound("y"));
    }

    #[test]
    fn record_destructuring_binds_fields_once_whole_is_bound() {
        let clause = RuleBuilder::new("r")
            .head_vars(["a"])
            .body_atom("s", ["rec"])
            .constraint(
                Argument::var("rec"),
                Op::Equal,
                Argument::RecordInit(vec![Argument::var("a"), Argument::var("b")]),
            )
            .build();
        let info = compute_clause_bindings(&clause);
        assert!(info.is_variable_bound("rec"));
        assert!(info.is_variable_bound("a"));
        assert!(info.is_variable_bound("b"));
    }
}
