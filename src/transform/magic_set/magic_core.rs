//! Stage 4: for every adorned clause `P.α(...) :- L1,...,Ln`, prepends a
//! `@magic.P.α` atom carrying `P`'s bound arguments, and for each adorned
//! call `Q.β` inside the body emits a magic rule deriving `@magic.Q.β` from
//! `@magic.P.α` plus whichever preceding literals are relevant to `Q`'s
//! bound arguments.

use super::adorn::adorned_attribute_indices;
use crate::ast::{Argument, Atom, Clause, Literal, Program, QualifiedName, Relation};
use std::collections::{HashMap, HashSet};

fn is_adorned(name: &QualifiedName) -> bool {
    name.segments().last().is_some_and(|s| s.starts_with('{') && s.ends_with('}'))
}

fn marker_of(name: &QualifiedName) -> &str {
    let last = name.segments().last().expect("adorned name has at least one segment");
    &last[1..last.len() - 1]
}

fn magic_name(name: &QualifiedName) -> QualifiedName {
    name.prepend("@magic")
}

fn bound_positions(args: &[Argument], marker: &str) -> Vec<Argument> {
    adorned_attribute_indices(marker).into_iter().filter_map(|i| args.get(i).cloned()).collect()
}

/// Variables transitively relevant to `seed`: scans `literals` (body
/// positions strictly before the call site, in original order) and grows
/// the relevant set until a full pass finds nothing new, then returns the
/// indices of relevant literals in original order.
fn relevant_prefix(seed: &HashSet<String>, literals: &[&Literal]) -> Vec<usize> {
    let mut relevant_vars = seed.clone();
    let mut included: HashSet<usize> = HashSet::new();
    loop {
        let mut changed = false;
        for (idx, lit) in literals.iter().enumerate() {
            if included.contains(&idx) {
                continue;
            }
            let mut vars = Vec::new();
            lit.collect_variables(&mut vars);
            if vars.iter().any(|v| relevant_vars.contains(v)) {
                included.insert(idx);
                relevant_vars.extend(vars);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    let mut indices: Vec<usize> = included.into_iter().collect();
    indices.sort_unstable();
    indices
}

fn register_magic_relation(
    magic_relations: &mut HashMap<QualifiedName, Relation>,
    program: &Program,
    adorned: &QualifiedName,
    magic: &QualifiedName,
    marker: &str,
) {
    if magic_relations.contains_key(magic) || program.relation(magic).is_some() {
        return;
    }
    let Some(original) = program.relation(adorned) else { return };
    let attributes: Vec<_> = original
        .attributes
        .iter()
        .zip(marker.chars())
        .filter(|(_, m)| *m == 'b')
        .map(|(a, _)| a.clone())
        .collect();
    magic_relations.insert(magic.clone(), Relation::new(magic.clone(), attributes));
}

pub fn run(program: &mut Program) {
    let adorned_clause_indices: Vec<usize> = program
        .clauses
        .iter()
        .enumerate()
        .filter(|(_, c)| is_adorned(&c.head.name))
        .map(|(i, _)| i)
        .collect();

    let mut magic_relations: HashMap<QualifiedName, Relation> = HashMap::new();
    let mut generated_rules = Vec::new();

    for index in adorned_clause_indices {
        let clause = program.clauses[index].clone();
        let head_marker = marker_of(&clause.head.name).to_string();
        let head_magic = magic_name(&clause.head.name);
        let head_bound_args = bound_positions(&clause.head.args, &head_marker);

        register_magic_relation(&mut magic_relations, program, &clause.head.name, &head_magic, &head_marker);

        let magic_head_atom = Literal::Atom(Atom::new(head_magic, head_bound_args));
        let mut refined_body = Vec::with_capacity(clause.body.len() + 1);
        refined_body.push(magic_head_atom.clone());
        refined_body.extend(clause.body.iter().cloned());
        program.clauses[index] = Clause::new(clause.head.clone(), refined_body);

        for (position, lit) in clause.body.iter().enumerate() {
            let Some(atom) = lit.atom() else { continue };
            if !is_adorned(&atom.name) {
                continue;
            }
            let callee_marker = marker_of(&atom.name).to_string();
            let callee_magic = magic_name(&atom.name);
            register_magic_relation(&mut magic_relations, program, &atom.name, &callee_magic, &callee_marker);

            let callee_bound_args = bound_positions(&atom.args, &callee_marker);
            let mut seed_vars = Vec::new();
            for arg in &callee_bound_args {
                arg.collect_variables(&mut seed_vars);
            }
            let seed: HashSet<String> = seed_vars.into_iter().collect();

            let preceding: Vec<&Literal> = clause.body[..position].iter().collect();
            let relevant_indices = relevant_prefix(&seed, &preceding);

            let mut magic_body = Vec::with_capacity(relevant_indices.len() + 1);
            magic_body.push(magic_head_atom.clone());
            magic_body.extend(relevant_indices.into_iter().map(|i| preceding[i].clone()));

            generated_rules.push(Clause::new(Atom::new(callee_magic, callee_bound_args), magic_body));
        }
    }

    program.relations.extend(magic_relations.into_values());
    program.clauses.extend(generated_rules);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Attribute, QualifiedName};

    #[test]
    fn adorned_clause_gets_magic_atom_prepended_and_magic_rule_emitted() {
        let mut program = Program::new();
        program.relations.push(Relation::new(
            QualifiedName::from("Query.{b}"),
            vec![Attribute { name: "x".into(), type_name: "number".into() }],
        ));
        program.relations.push(Relation::new(
            QualifiedName::from("edge.{bf}"),
            vec![
                Attribute { name: "x".into(), type_name: "number".into() },
                Attribute { name: "y".into(), type_name: "number".into() },
            ],
        ));
        program.clauses.push(Clause::new(
            Atom::new(QualifiedName::from("Query.{b}"), vec![Argument::var("x")]),
            vec![Literal::Atom(Atom::new(QualifiedName::from("edge.{bf}"), vec![Argument::var("x"), Argument::var("y")]))],
        ));

        run(&mut program);

        let refined = program.clauses.iter().find(|c| c.head.name == QualifiedName::from("Query.{b}")).unwrap();
        assert!(refined.body[0].atom().unwrap().name == QualifiedName::from("@magic.Query.{b}"));

        assert!(program.relation(&QualifiedName::from("@magic.Query.{b}")).is_some());
        assert!(program.relation(&QualifiedName::from("@magic.edge.{bf}")).is_some());
        assert!(program
            .clauses
            .iter()
            .any(|c| c.head.name == QualifiedName::from("@magic.edge.{bf}")));
    }
}
