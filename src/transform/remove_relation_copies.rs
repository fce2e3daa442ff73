//! Relations defined by exactly one clause of the shape `R(X,...) :- S(X,...)`
//! — same arity, argument order preserved, no other body literals — are
//! pure copies of `S` and not used for I/O; every reference to `R` is
//! rewritten to `S` and `R` is deleted.

use crate::ast::{Argument, Literal, QualifiedName, Relation};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashMap;

/// If `relation` is defined by exactly one copying clause, returns the
/// source relation name it copies.
fn copy_source(relation: &Relation, clauses: &[crate::ast::Clause]) -> Option<QualifiedName> {
    if relation.is_input() || relation.is_output() {
        return None;
    }
    let defining: Vec<&crate::ast::Clause> = clauses.iter().filter(|c| c.head.name == relation.name).collect();
    if defining.len() != 1 {
        return None;
    }
    let clause = defining[0];
    if clause.body.len() != 1 {
        return None;
    }
    let Literal::Atom(atom) = &clause.body[0] else { return None };
    if atom.name == relation.name {
        return None;
    }
    let args_match = clause.head.args.len() == atom.args.len()
        && clause
            .head
            .args
            .iter()
            .zip(atom.args.iter())
            .all(|(h, b)| matches!((h, b), (Argument::Variable(x), Argument::Variable(y)) if x == y));
    if args_match {
        Some(atom.name.clone())
    } else {
        None
    }
}

/// Follows `rewrites` to its fixpoint for every entry so a chain of copies
/// (`c` copies `b`, `b` copies `a`) collapses to a single rewrite straight to
/// the final, non-copy target (`c -> a`). Without this, rewriting a
/// multi-level chain one hop at a time depends on the order the chain's
/// links happen to be visited in — and a plain `HashMap` iterates in an
/// unspecified, randomised order — so a reference could be left pointing at
/// an intermediate relation that itself just got deleted.
fn resolve_transitively(rewrites: HashMap<QualifiedName, QualifiedName>) -> HashMap<QualifiedName, QualifiedName> {
    rewrites
        .keys()
        .map(|from| {
            let mut target = rewrites.get(from).expect("key drawn from the map itself").clone();
            let mut seen = std::collections::HashSet::new();
            seen.insert(from.clone());
            while seen.insert(target.clone()) {
                match rewrites.get(&target) {
                    Some(next) => target = next.clone(),
                    None => break,
                }
            }
            (from.clone(), target)
        })
        .collect()
}

fn rename_relation_in_clause(clause: &mut crate::ast::Clause, from: &QualifiedName, to: &QualifiedName) {
    if &clause.head.name == from {
        clause.head.name = to.clone();
    }
    for lit in &mut clause.body {
        match lit {
            Literal::Atom(atom) | Literal::Negation(atom) if &atom.name == from => {
                atom.name = to.clone();
            }
            _ => {}
        }
    }
}

#[derive(Clone)]
pub struct RemoveRelationCopies;

impl Transformer for RemoveRelationCopies {
    fn name(&self) -> &str {
        "RemoveRelationCopies"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let program = tu.program();
        let mut rewrites: HashMap<QualifiedName, QualifiedName> = HashMap::new();
        for relation in &program.relations {
            if let Some(source) = copy_source(relation, &program.clauses) {
                rewrites.insert(relation.name.clone(), source);
            }
        }
        if rewrites.is_empty() {
            return false;
        }
        let rewrites = resolve_transitively(rewrites);

        let program = tu.program_mut();
        // The copying clause itself (`R(x) :- S(x)`) becomes dead once every
        // reference to R is gone; drop it before renaming anything else.
        program.clauses.retain(|c| !rewrites.contains_key(&c.head.name));
        for clause in &mut program.clauses {
            for (from, to) in &rewrites {
                rename_relation_in_clause(clause, from, to);
            }
        }
        for directive in &mut program.directives {
            if let Some(to) = rewrites.get(&directive.relation) {
                directive.relation = to.clone();
            }
        }
        program.relations.retain(|r| !rewrites.contains_key(&r.name));
        tu.invalidate();
        true
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}
