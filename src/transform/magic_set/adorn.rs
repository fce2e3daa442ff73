//! Stage 3: starting from each output relation with an all-free marker,
//! walks every reachable rule left to right, tracking which variables are
//! bound so far, and emits adorned copies `R.{bf...}` whose name records the
//! binding pattern at each call site.

use crate::ast::{Argument, Atom, BinaryConstraintOp, Clause, Literal, Program, QualifiedName, Relation};
use std::collections::{HashSet, VecDeque};

#[must_use]
pub fn adorned_name(name: &QualifiedName, marker: &str) -> QualifiedName {
    name.append(format!("{{{marker}}}"))
}

fn is_bound(arg: &Argument, bound: &HashSet<String>) -> bool {
    match arg {
        Argument::Variable(name) => bound.contains(name),
        Argument::UnnamedVariable => false,
        Argument::NumericConstant(..) | Argument::StringConstant(_) | Argument::NilConstant | Argument::Counter => true,
        _ => arg.child_arguments().into_iter().all(|child| is_bound(child, bound)),
    }
}

fn bind_from_equality(lhs: &Argument, rhs: &Argument, bound: &mut HashSet<String>) {
    if let Argument::Variable(v) = lhs {
        if is_bound(rhs, bound) {
            bound.insert(v.clone());
        }
    }
    if let Argument::Variable(v) = rhs {
        if is_bound(lhs, bound) {
            bound.insert(v.clone());
        }
    }
}

fn marker_for(args: &[Argument], bound: &HashSet<String>) -> String {
    args.iter().map(|a| if is_bound(a, bound) { 'b' } else { 'f' }).collect()
}

fn bind_atom_args(atom: &Atom, bound: &mut HashSet<String>) {
    for arg in &atom.args {
        if let Argument::Variable(v) = arg {
            bound.insert(v.clone());
        }
    }
}

/// Adorns the rules defining `rel` under `marker`, queueing every
/// non-ignored body atom it calls for its own adornment.
fn adorn_clauses_for(
    program: &Program,
    rel: &QualifiedName,
    marker: &str,
    weakly_ignored: &HashSet<QualifiedName>,
    queue: &mut VecDeque<(QualifiedName, String)>,
) -> Vec<Clause> {
    let adorned = adorned_name(rel, marker);
    let mut output = Vec::new();

    for clause in program.clauses_for(rel) {
        let mut bound: HashSet<String> = HashSet::new();
        for (arg, m) in clause.head.args.iter().zip(marker.chars()) {
            if m == 'b' {
                if let Argument::Variable(v) = arg {
                    bound.insert(v.clone());
                }
            }
        }

        let mut new_body = Vec::with_capacity(clause.body.len());
        for lit in &clause.body {
            match lit {
                Literal::Atom(atom) if !weakly_ignored.contains(&atom.name) => {
                    let atom_marker = marker_for(&atom.args, &bound);
                    queue.push_back((atom.name.clone(), atom_marker.clone()));
                    new_body.push(Literal::Atom(Atom::new(adorned_name(&atom.name, &atom_marker), atom.args.clone())));
                    bind_atom_args(atom, &mut bound);
                }
                Literal::Negation(atom) if !weakly_ignored.contains(&atom.name) => {
                    let atom_marker = marker_for(&atom.args, &bound);
                    queue.push_back((atom.name.clone(), atom_marker.clone()));
                    new_body.push(Literal::Negation(Atom::new(adorned_name(&atom.name, &atom_marker), atom.args.clone())));
                }
                Literal::BinaryConstraint(op, lhs, rhs) => {
                    if *op == BinaryConstraintOp::Equal {
                        bind_from_equality(lhs, rhs, &mut bound);
                    }
                    new_body.push(lit.clone());
                }
                other => new_body.push(other.clone()),
            }
        }

        output.push(Clause::new(Atom::new(adorned.clone(), clause.head.args.clone()), new_body));
    }

    output
}

pub fn run(program: &mut Program, weakly_ignored: &HashSet<QualifiedName>) {
    let mut queue: VecDeque<(QualifiedName, String)> = VecDeque::new();
    let mut visited: HashSet<(QualifiedName, String)> = HashSet::new();

    for relation in &program.relations {
        if relation.is_output() && !weakly_ignored.contains(&relation.name) {
            queue.push_back((relation.name.clone(), "f".repeat(relation.arity())));
        }
    }

    let mut new_relations = Vec::new();
    let mut new_clauses = Vec::new();

    while let Some((rel, marker)) = queue.pop_front() {
        if weakly_ignored.contains(&rel) || !visited.insert((rel.clone(), marker.clone())) {
            continue;
        }
        if let Some(original) = program.relation(&rel) {
            let mut clone = original.clone();
            clone.name = adorned_name(&rel, &marker);
            new_relations.push(clone);
        } else {
            continue;
        }
        new_clauses.extend(adorn_clauses_for(program, &rel, &marker, weakly_ignored, &mut queue));
    }

    program.relations.extend(new_relations);
    program.clauses.extend(new_clauses);
}

#[must_use]
pub fn count_bound(marker: &str) -> usize {
    marker.chars().filter(|&c| c == 'b').count()
}

#[must_use]
pub fn adorned_attribute_indices(marker: &str) -> Vec<usize> {
    marker.char_indices().filter(|(_, c)| *c == 'b').map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::{Attribute, RelationQualifier};

    #[test]
    fn output_relation_seeds_all_free_adornment() {
        let mut program = Program::new();
        let mut out = Relation::new(QualifiedName::from("Query"), vec![Attribute { name: "x".into(), type_name: "number".into() }]);
        out.qualifiers.insert(RelationQualifier::Output);
        program.relations.push(out);
        program.clauses.push(RuleBuilder::new("Query").head_vars(["x"]).body_atom("base", ["x"]).build());

        run(&mut program, &HashSet::new());

        assert!(program.relation(&QualifiedName::from("Query.{f}")).is_some());
        assert!(program.relation(&QualifiedName::from("base.{f}")).is_some());
    }

    #[test]
    fn bound_head_argument_propagates_to_body_call() {
        let mut program = Program::new();
        let mut out =
            Relation::new(QualifiedName::from("Query"), vec![Attribute { name: "x".into(), type_name: "number".into() }]);
        out.qualifiers.insert(RelationQualifier::Output);
        program.relations.push(out);
        program
            .clauses
            .push(RuleBuilder::new("Query").head_vars(["x"]).body_atom("edge", ["x", "y"]).build());

        let adorned = adorn_clauses_for(&program, &QualifiedName::from("Query"), "b", &HashSet::new(), &mut VecDeque::new());
        let body_atom = adorned[0].body[0].atom().unwrap();
        assert_eq!(body_atom.name, QualifiedName::from("edge.{bf}"));
    }
}
