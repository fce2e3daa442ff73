//! Four sub-passes that shrink the program without changing its meaning,
//! from simple literal deduplication up to merging bijectively-equivalent
//! relations. Each sub-pass invalidates analyses only when it actually
//! changes something.

use crate::analysis::{normalise_clause, ClauseNormalisation, NormalisedClause, NormalisedElement};
use crate::ast::{Clause, Literal, QualifiedName, Relation};
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashMap;

/// Deduplicates identical body literals within each clause.
fn reduce_clause_bodies(tu: &mut TranslationUnit) -> bool {
    let mut changed = false;
    for clause in &mut tu.program_mut().clauses {
        let mut seen: Vec<Literal> = Vec::new();
        let before = clause.body.len();
        let mut deduped = Vec::new();
        for lit in clause.body.drain(..) {
            if !seen.contains(&lit) {
                seen.push(lit.clone());
                deduped.push(lit);
            }
        }
        clause.body = deduped;
        if clause.body.len() != before {
            changed = true;
        }
    }
    changed
}

/// Drops clauses whose head literally appears verbatim in their own body —
/// always true given their own derivation, so redundant.
fn remove_redundant_clauses(tu: &mut TranslationUnit) -> bool {
    let program = tu.program_mut();
    let before = program.clauses.len();
    program.clauses.retain(|clause| {
        !clause.body.iter().any(|lit| matches!(lit, Literal::Atom(a) if a == &clause.head))
    });
    program.clauses.len() != before
}

/// Whether `left`/`right` are the same clause up to body-literal
/// permutation and a consistent variable renaming (`spec.md`'s bijective
/// equivalence on normalised clauses).
#[must_use]
pub fn bijective_equivalent(left: &NormalisedClause, right: &NormalisedClause) -> bool {
    if !left.fully_normalised || !right.fully_normalised {
        return false;
    }
    if left.elements.len() != right.elements.len() {
        return false;
    }
    if left.elements[0].params.len() != right.elements[0].params.len() {
        return false;
    }
    if left.variables.len() != right.variables.len() {
        return false;
    }
    if left.constants != right.constants {
        return false;
    }

    let mut used = vec![false; right.elements.len()];
    let mut sigma: HashMap<String, String> = HashMap::new();
    let mut sigma_inv: HashMap<String, String> = HashMap::new();
    search(&left.elements, &right.elements, 0, &mut used, &mut sigma, &mut sigma_inv)
}

fn search(
    left: &[NormalisedElement],
    right: &[NormalisedElement],
    index: usize,
    used: &mut [bool],
    sigma: &mut HashMap<String, String>,
    sigma_inv: &mut HashMap<String, String>,
) -> bool {
    if index == left.len() {
        return true;
    }
    for (j, candidate) in right.iter().enumerate() {
        if used[j] || candidate.qualifier != left[index].qualifier || candidate.params.len() != left[index].params.len()
        {
            continue;
        }
        let mut inserted = Vec::new();
        if try_bind(&left[index].params, &candidate.params, sigma, sigma_inv, &mut inserted) {
            used[j] = true;
            if search(left, right, index + 1, used, sigma, sigma_inv) {
                return true;
            }
            used[j] = false;
        }
        for key in inserted {
            if let Some(val) = sigma.remove(&key) {
                sigma_inv.remove(&val);
            }
        }
    }
    false
}

/// Extends `sigma`/`sigma_inv` to map `left_params[i] -> right_params[i]`
/// for every variable position, checking consistency with any existing
/// binding; constants must match literally. Records newly-inserted keys in
/// `inserted` so the caller can undo on backtrack.
fn try_bind(
    left_params: &[String],
    right_params: &[String],
    sigma: &mut HashMap<String, String>,
    sigma_inv: &mut HashMap<String, String>,
    inserted: &mut Vec<String>,
) -> bool {
    for (l, r) in left_params.iter().zip(right_params.iter()) {
        let is_variable = l.starts_with("@anon") || !l.chars().next().is_some_and(char::is_numeric) && !l.starts_with('"') && l != "nil" && l != "$";
        if !is_variable {
            if l != r {
                return false;
            }
            continue;
        }
        match (sigma.get(l), sigma_inv.get(r)) {
            (Some(mapped), _) if mapped != r => return false,
            (_, Some(mapped)) if mapped != l => return false,
            (Some(_), Some(_)) => {}
            _ => {
                sigma.insert(l.clone(), r.clone());
                sigma_inv.insert(r.clone(), l.clone());
                inserted.push(l.clone());
            }
        }
    }
    true
}

/// Keeps one representative clause per equivalence class within each
/// relation.
fn reduce_locally_equivalent_clauses(tu: &mut TranslationUnit) -> bool {
    let normalisation = tu.get::<ClauseNormalisation>();
    let program = tu.program_mut();
    let mut kept: Vec<Clause> = Vec::new();
    let mut representatives: HashMap<QualifiedName, Vec<NormalisedClause>> = HashMap::new();
    let mut changed = false;

    for (index, clause) in program.clauses.iter().enumerate() {
        let normalised = normalisation.of(index).cloned().unwrap_or_else(|| normalise_clause(clause));
        let bucket = representatives.entry(clause.head.name.clone()).or_default();
        if bucket.iter().any(|existing| bijective_equivalent(existing, &normalised)) {
            changed = true;
            continue;
        }
        bucket.push(normalised);
        kept.push(clause.clone());
    }
    program.clauses = kept;
    changed
}

/// Relations with exactly one non-I/O clause that are bijectively
/// equivalent to another such relation, and share qualifiers, representation,
/// and attribute types, are merged into a single canonical relation.
fn reduce_singleton_relations(tu: &mut TranslationUnit) -> bool {
    let program = tu.program();
    let singleton_clause_index: HashMap<QualifiedName, usize> = program
        .clauses
        .iter()
        .enumerate()
        .fold(HashMap::new(), |mut acc, (i, c)| {
            acc.entry(c.head.name.clone()).or_insert(i);
            acc
        });

    let eligible: Vec<&Relation> = program
        .relations
        .iter()
        .filter(|r| {
            !r.is_input()
                && !r.is_output()
                && program.clauses_for(&r.name).len() == 1
        })
        .collect();

    let mut merges: HashMap<QualifiedName, QualifiedName> = HashMap::new();
    for i in 0..eligible.len() {
        let a = eligible[i];
        if merges.contains_key(&a.name) {
            continue;
        }
        for b in &eligible[i + 1..] {
            if merges.contains_key(&b.name) || b.name == a.name {
                continue;
            }
            if a.attributes != b.attributes || a.qualifiers != b.qualifiers || a.representation != b.representation {
                continue;
            }
            let (Some(&ia), Some(&ib)) = (singleton_clause_index.get(&a.name), singleton_clause_index.get(&b.name))
            else {
                continue;
            };
            let na = normalise_clause(&program.clauses[ia]);
            let nb = normalise_clause(&program.clauses[ib]);
            if bijective_equivalent(&na, &nb) {
                merges.insert(b.name.clone(), a.name.clone());
            }
        }
    }

    if merges.is_empty() {
        return false;
    }

    let program = tu.program_mut();
    for clause in &mut program.clauses {
        if let Some(canonical) = merges.get(&clause.head.name) {
            clause.head.name = canonical.clone();
        }
        for lit in &mut clause.body {
            if let Literal::Atom(atom) | Literal::Negation(atom) = lit {
                if let Some(canonical) = merges.get(&atom.name) {
                    atom.name = canonical.clone();
                }
            }
        }
    }
    program.relations.retain(|r| !merges.contains_key(&r.name));
    program.clauses.retain(|c| {
        !merges.values().any(|canonical| {
            c.head.name == *canonical && c.body.iter().any(|lit| matches!(lit, Literal::Atom(a) if &a.name == canonical))
        })
    });
    true
}

#[derive(Clone)]
pub struct MinimiseProgram;

impl Transformer for MinimiseProgram {
    fn name(&self) -> &str {
        "MinimiseProgram"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        if reduce_clause_bodies(tu) {
            changed = true;
            tu.invalidate();
        }
        if remove_redundant_clauses(tu) {
            changed = true;
            tu.invalidate();
        }
        if reduce_locally_equivalent_clauses(tu) {
            changed = true;
            tu.invalidate();
        }
        if reduce_singleton_relations(tu) {
            changed = true;
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
    use crate::ast::{Argument, BinaryConstraintOp as Op, Program};

    #[test]
    fn duplicate_body_literals_are_deduplicated() {
        let mut clause = RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x"]).build();
        clause.body.push(clause.body[0].clone());
        let mut program = Program::new();
        program.clauses.push(clause);
        let mut tu = TranslationUnit::new(program);
        assert!(reduce_clause_bodies(&mut tu));
        assert_eq!(tu.program().clauses[0].body.len(), 1);
    }

    #[test]
    fn self_derivation_clause_is_dropped() {
        let clause = RuleBuilder::new("r").head_vars(["x"]).body_atom("r", ["x"]).build();
        let mut program = Program::new();
        program.clauses.push(clause);
        let mut tu = TranslationUnit::new(program);
        assert!(remove_redundant_clauses(&mut tu));
        assert!(tu.program().clauses.is_empty());
    }

    #[test]
    fn renamed_variable_clauses_are_bijectively_equivalent() {
        let a = RuleBuilder::new("r").head_vars(["x", "y"]).body_atom("s", ["x", "y"]).build();
        let b = RuleBuilder::new("r").head_vars(["p", "q"]).body_atom("s", ["p", "q"]).build();
        assert!(bijective_equivalent(&normalise_clause(&a), &normalise_clause(&b)));
    }

    #[test]
    fn different_constant_clauses_are_not_equivalent() {
        let mut a = RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x"]).build();
        a.body.push(Literal::BinaryConstraint(Op::Equal, Argument::var("x"), Argument::NumericConstant("1".into(), None)));
        let mut b = RuleBuilder::new("r").head_vars(["x"]).body_atom("s", ["x"]).build();
        b.body.push(Literal::BinaryConstraint(Op::Equal, Argument::var("x"), Argument::NumericConstant("2".into(), None)));
        assert!(!bijective_equivalent(&normalise_clause(&a), &normalise_clause(&b)));
    }

    #[test]
    fn reordered_body_literals_still_match() {
        let a = RuleBuilder::new("r").head_vars(["x", "y"]).body_atom("s", ["x"]).body_atom("t", ["y"]).build();
        let b = RuleBuilder::new("r").head_vars(["x", "y"]).body_atom("t", ["y"]).body_atom("s", ["x"]).build();
        assert!(bijective_equivalent(&normalise_clause(&a), &normalise_clause(&b)));
    }
}
