//! Stage 2: negative labelling duplicates the stratum a negated (or
//! aggregated-over) relation belongs to, so evaluating the negation never
//! has to wait on the relation's own later strata; positive labelling then
//! makes each negatively-labelled stratum self-contained by cloning
//! everything it positively depends on.

use crate::analysis::SccGraph;
use crate::ast::{Literal, Program, QualifiedName};
use std::collections::{HashMap, HashSet};

fn rename_clause_heads_and_refs(
    program: &mut Program,
    members: &HashSet<QualifiedName>,
    prefix: &str,
) -> HashMap<QualifiedName, QualifiedName> {
    let renames: HashMap<QualifiedName, QualifiedName> =
        members.iter().map(|m| (m.clone(), m.prepend(prefix))).collect();

    let cloned_relations: Vec<_> = program
        .relations
        .iter()
        .filter(|r| members.contains(&r.name))
        .map(|r| {
            let mut clone = r.clone();
            clone.name = renames[&r.name].clone();
            clone
        })
        .collect();
    program.relations.extend(cloned_relations);

    let cloned_clauses: Vec<_> = program
        .clauses
        .iter()
        .filter(|c| members.contains(&c.head.name))
        .map(|c| {
            let mut clone = c.clone();
            clone.head.name = renames[&c.head.name].clone();
            for lit in &mut clone.body {
                if let Literal::Atom(atom) | Literal::Negation(atom) = lit {
                    if let Some(renamed) = renames.get(&atom.name) {
                        atom.name = renamed.clone();
                    }
                }
            }
            clone
        })
        .collect();
    program.clauses.extend(cloned_clauses);

    renames
}

/// Relations appearing negated, or inside an aggregator body, anywhere in
/// the program and not in `relations_to_not_label`.
fn negatively_referenced(program: &Program, relations_to_not_label: &HashSet<QualifiedName>) -> HashSet<QualifiedName> {
    let mut found = HashSet::new();
    for clause in &program.clauses {
        for atom in clause.negated_body_atoms() {
            if !relations_to_not_label.contains(&atom.name) {
                found.insert(atom.name.clone());
            }
        }
        for lit in &clause.body {
            collect_aggregator_atoms(lit, relations_to_not_label, &mut found);
        }
    }
    found
}

fn collect_aggregator_atoms(lit: &Literal, ignore: &HashSet<QualifiedName>, out: &mut HashSet<QualifiedName>) {
    use crate::ast::Argument;
    fn walk(arg: &Argument, ignore: &HashSet<QualifiedName>, out: &mut HashSet<QualifiedName>) {
        if let Argument::Aggregator(_, _, body) = arg {
            for lit in body {
                if let Literal::Atom(atom) | Literal::Negation(atom) = lit {
                    if !ignore.contains(&atom.name) {
                        out.insert(atom.name.clone());
                    }
                }
            }
        }
        for child in arg.child_arguments() {
            walk(child, ignore, out);
        }
    }
    match lit {
        Literal::Atom(atom) | Literal::Negation(atom) => {
            for arg in &atom.args {
                walk(arg, ignore, out);
            }
        }
        Literal::BinaryConstraint(_, lhs, rhs) => {
            walk(lhs, ignore, out);
            walk(rhs, ignore, out);
        }
        Literal::BooleanConstraint(_) => {}
    }
}

/// Negative labelling: duplicates the SCC of every negatively-referenced
/// relation as `@neglabel.R`, then rewrites the original negated/aggregated
/// occurrence to point at the copy.
fn negative_labelling(program: &mut Program, relations_to_not_label: &HashSet<QualifiedName>) -> HashSet<QualifiedName> {
    let scc = SccGraph::compute(&crate::translation_unit::TranslationUnit::new(program.clone()));
    let targets = negatively_referenced(program, relations_to_not_label);
    let mut labelled = HashSet::new();
    let mut scc_renames: HashMap<usize, HashMap<QualifiedName, QualifiedName>> = HashMap::new();

    for target in &targets {
        let Some(scc_index) = scc.get_scc(target) else { continue };
        scc_renames.entry(scc_index).or_insert_with(|| {
            let members: HashSet<QualifiedName> = scc.get_internal_relations(scc_index).iter().cloned().collect();
            let renames = rename_clause_heads_and_refs(program, &members, "@neglabel");
            labelled.extend(renames.values().cloned());
            renames
        });
    }

    for target in &targets {
        let Some(scc_index) = scc.get_scc(target) else { continue };
        let renamed_target = scc_renames[&scc_index][target].clone();
        for clause in &mut program.clauses {
            for lit in &mut clause.body {
                if let Literal::Negation(atom) = lit {
                    if atom.name == *target {
                        atom.name = renamed_target.clone();
                    }
                }
                rewrite_aggregator_refs(lit, target, &renamed_target);
            }
        }
    }
    labelled
}

fn rewrite_aggregator_refs(lit: &mut Literal, from: &QualifiedName, to: &QualifiedName) {
    use crate::ast::Argument;
    fn walk(arg: &mut Argument, from: &QualifiedName, to: &QualifiedName) {
        if let Argument::Aggregator(_, _, body) = arg {
            for lit in body.iter_mut() {
                if let Literal::Atom(atom) | Literal::Negation(atom) = lit {
                    if &atom.name == from {
                        atom.name = to.clone();
                    }
                }
            }
        }
        arg.map_children(&mut |mut child| {
            walk(&mut child, from, to);
            child
        });
    }
    match lit {
        Literal::Atom(atom) | Literal::Negation(atom) => {
            for arg in &mut atom.args {
                walk(arg, from, to);
            }
        }
        Literal::BinaryConstraint(_, lhs, rhs) => {
            walk(lhs, from, to);
            walk(rhs, from, to);
        }
        Literal::BooleanConstraint(_) => {}
    }
}

/// Positive labelling: every negatively-labelled stratum must not reach back
/// into an unlabelled, unignored relation through a positive atom, so each
/// such reference (and everything it transitively depends on) is cloned
/// under a fresh `@poscopy_k` prefix.
fn positive_labelling(program: &mut Program, neglabelled: &HashSet<QualifiedName>, ignored: &HashSet<QualifiedName>) {
    let mut copy_counter = 0u32;
    let neglabel_heads: Vec<QualifiedName> = neglabelled.iter().cloned().collect();

    for stratum_head in neglabel_heads {
        let scc = SccGraph::compute(&crate::translation_unit::TranslationUnit::new(program.clone()));
        let Some(scc_index) = scc.get_scc(&stratum_head) else { continue };
        let own_members: HashSet<QualifiedName> = scc.get_internal_relations(scc_index).iter().cloned().collect();

        let referenced: HashSet<QualifiedName> = program
            .clauses
            .iter()
            .filter(|c| own_members.contains(&c.head.name))
            .flat_map(|c| c.positive_body_atoms().map(|a| a.name.clone()))
            .filter(|name| !own_members.contains(name))
            .filter(|name| !ignored.contains(name))
            .filter(|name| !name.to_dotted_string().starts_with("@neglabel.") && !name.to_dotted_string().starts_with("@poscopy_"))
            .collect();

        for referenced_relation in referenced {
            copy_counter += 1;
            let Some(dep_scc) = scc.get_scc(&referenced_relation) else { continue };
            let mut to_clone: HashSet<QualifiedName> = scc.get_internal_relations(dep_scc).iter().cloned().collect();
            for deeper in scc.topological_order().iter().take(dep_scc) {
                to_clone.extend(deeper.iter().cloned());
            }
            let prefix = format!("@poscopy_{copy_counter}");
            let renames = rename_clause_heads_and_refs(program, &to_clone, &prefix);

            for clause in &mut program.clauses {
                if own_members.contains(&clause.head.name) {
                    for lit in &mut clause.body {
                        if let Literal::Atom(atom) = lit {
                            if atom.name == referenced_relation {
                                atom.name = renames[&referenced_relation].clone();
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn run(program: &mut Program, relations_to_not_label: &HashSet<QualifiedName>, ignored: &HashSet<QualifiedName>) {
    let labelled = negative_labelling(program, relations_to_not_label);
    positive_labelling(program, &labelled, ignored);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;

    #[test]
    fn negated_reference_is_labelled_and_stratum_duplicated() {
        let mut program = Program::new();
        program.clauses.push(RuleBuilder::new("base").head_vars(["x"]).body_atom("fact", ["x"]).build());
        program.clauses.push(RuleBuilder::new("derived").head_vars(["x"]).negated_atom("base", ["x"]).build());

        run(&mut program, &HashSet::new(), &HashSet::new());

        let derived = program.clauses.iter().find(|c| c.head.name == QualifiedName::from("derived")).unwrap();
        assert!(derived.negated_body_atoms().any(|a| a.name == QualifiedName::from("@neglabel.base")));
        assert_eq!(program.clauses_for(&QualifiedName::from("@neglabel.base")).len(), 1);
    }
}
