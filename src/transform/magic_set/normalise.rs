//! Stage 1 of the magic-set pipeline: separates EDB from IDB for relations
//! that mix both, and lifts every non-variable argument to a fresh
//! equality-constrained variable so later stages only ever see atoms whose
//! arguments are bare variables.

use crate::ast::{Argument, Atom, BinaryConstraintOp, Clause, Literal, Program, QualifiedName, RelationQualifier};

fn synthetic(prefix: &str, relation: &QualifiedName) -> QualifiedName {
    QualifiedName::from(format!("{prefix}.{}", relation.to_dotted_string()))
}

fn rename_atom_in_clause(clause: &mut Clause, from: &QualifiedName, to: &QualifiedName) {
    for lit in &mut clause.body {
        if let Literal::Atom(atom) | Literal::Negation(atom) = lit {
            if &atom.name == from {
                atom.name = to.clone();
            }
        }
    }
}

/// `R` is both `.input` and `.output`: split the input facts into
/// `@split_in.R` and bridge them back with `R(x̄) :- @split_in.R(x̄)`.
fn split_input_output(program: &mut Program) {
    let mixed: Vec<QualifiedName> = program
        .relations
        .iter()
        .filter(|r| r.is_input() && r.is_output())
        .map(|r| r.name.clone())
        .collect();

    for name in mixed {
        let split_name = synthetic("@split_in", &name);
        let Some(relation) = program.relation(&name) else { continue };
        let mut split = relation.clone();
        split.name = split_name.clone();
        split.qualifiers.clear();
        split.qualifiers.insert(RelationQualifier::Input);

        let args: Vec<Argument> = relation.attributes.iter().map(|a| Argument::var(a.name.clone())).collect();
        let bridge = Clause::new(Atom::new(name.clone(), args.clone()), vec![Literal::Atom(Atom::new(split_name.clone(), args))]);

        if let Some(relation) = program.relation_mut(&name) {
            relation.qualifiers.remove(&RelationQualifier::Input);
        }
        for directive in &mut program.directives {
            if directive.kind == crate::ast::DirectiveKind::Input && directive.relation == name {
                directive.relation = split_name.clone();
            }
        }
        program.relations.push(split);
        program.clauses.push(bridge);
    }
}

/// `R` is `.input` but also has derivation rules: move the rules to
/// `@interm_in.R`, bridge the raw facts in, and redirect every *other*
/// clause's reference to `R` to the combined relation.
fn extract_idb_from_input(program: &mut Program) {
    let candidates: Vec<QualifiedName> = program
        .relations
        .iter()
        .filter(|r| r.is_input())
        .map(|r| r.name.clone())
        .filter(|name| program.clauses_for(name).iter().any(|c| !c.body.is_empty()))
        .collect();

    for name in candidates {
        let interm_name = synthetic("@interm_in", &name);
        let Some(relation) = program.relation(&name) else { continue };
        let mut interm = relation.clone();
        interm.name = interm_name.clone();
        interm.qualifiers.clear();
        program.relations.push(interm);

        for clause in &mut program.clauses {
            if clause.head.name == name && !clause.body.is_empty() {
                clause.head.name = interm_name.clone();
            } else if clause.head.name != name {
                rename_atom_in_clause(clause, &name, &interm_name);
            }
        }

        let args: Vec<Argument> = relation.attributes.iter().map(|a| Argument::var(a.name.clone())).collect();
        program.clauses.push(Clause::new(
            Atom::new(interm_name, args.clone()),
            vec![Literal::Atom(Atom::new(name, args))],
        ));
    }
}

/// `R` is `.output` but also has derivation rules consumed elsewhere: move
/// the rules to `@interm_out.R` and project the final answer back into `R`.
fn extract_idb_from_output(program: &mut Program) {
    let candidates: Vec<QualifiedName> = program
        .relations
        .iter()
        .filter(|r| r.is_output())
        .map(|r| r.name.clone())
        .filter(|name| program.clauses_for(name).iter().any(|c| !c.body.is_empty()))
        .collect();

    for name in candidates {
        let interm_name = synthetic("@interm_out", &name);
        let Some(relation) = program.relation(&name) else { continue };
        let mut interm = relation.clone();
        interm.name = interm_name.clone();
        interm.qualifiers.clear();
        program.relations.push(interm);

        for clause in &mut program.clauses {
            if clause.head.name == name && !clause.body.is_empty() {
                clause.head.name = interm_name.clone();
            } else if clause.head.name != name {
                rename_atom_in_clause(clause, &name, &interm_name);
            }
        }

        let args: Vec<Argument> = relation.attributes.iter().map(|a| Argument::var(a.name.clone())).collect();
        program.clauses.push(Clause::new(
            Atom::new(name, args.clone()),
            vec![Literal::Atom(Atom::new(interm_name, args))],
        ));
    }
}

/// Lifts every non-variable atom argument (head or body, excluding the
/// right-hand side of a direct variable-equality constraint, which is
/// already in the shape this pass produces) to a fresh `@abdulN` variable.
fn lift_non_variable_arguments(program: &mut Program) {
    let mut counter = 0u32;
    for clause in &mut program.clauses {
        let mut extra = Vec::new();
        lift_atom_args(&mut clause.head.args, &mut counter, &mut extra);
        for lit in &mut clause.body {
            if let Literal::Atom(atom) | Literal::Negation(atom) = lit {
                lift_atom_args(&mut atom.args, &mut counter, &mut extra);
            }
        }
        clause.body.extend(extra);
    }
}

fn lift_atom_args(args: &mut [Argument], counter: &mut u32, extra: &mut Vec<Literal>) {
    for arg in args.iter_mut() {
        if matches!(arg, Argument::Variable(_) | Argument::UnnamedVariable) {
            continue;
        }
        *counter += 1;
        let fresh = format!("@abdul{counter}");
        let original = std::mem::replace(arg, Argument::var(fresh.clone()));
        extra.push(Literal::BinaryConstraint(BinaryConstraintOp::Equal, Argument::var(fresh), original));
    }
}

pub fn run(program: &mut Program) {
    split_input_output(program);
    extract_idb_from_input(program);
    extract_idb_from_output(program);
    lift_non_variable_arguments(program);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::{Attribute, Relation};

    #[test]
    fn mixed_input_output_relation_is_split() {
        let mut program = Program::new();
        let mut r = Relation::new(QualifiedName::from("R"), vec![Attribute { name: "x".into(), type_name: "number".into() }]);
        r.qualifiers.insert(RelationQualifier::Input);
        r.qualifiers.insert(RelationQualifier::Output);
        program.relations.push(r);

        run(&mut program);

        assert!(program.relation(&QualifiedName::from("@split_in.R")).is_some());
        assert!(program.relation(&QualifiedName::from("R")).unwrap().is_output());
        assert!(!program.relation(&QualifiedName::from("R")).unwrap().is_input());
        assert_eq!(program.clauses_for(&QualifiedName::from("R")).len(), 1);
    }

    #[test]
    fn input_relation_with_rules_is_split_into_interm_in() {
        let mut program = Program::new();
        let mut r = Relation::new(QualifiedName::from("R"), vec![Attribute { name: "x".into(), type_name: "number".into() }]);
        r.qualifiers.insert(RelationQualifier::Input);
        program.relations.push(r);
        program.clauses.push(RuleBuilder::new("R").head_vars(["x"]).body_atom("s", ["x"]).build());

        run(&mut program);

        assert!(program.relation(&QualifiedName::from("@interm_in.R")).is_some());
        assert_eq!(program.clauses_for(&QualifiedName::from("@interm_in.R")).len(), 2);
    }

    #[test]
    fn non_variable_head_argument_is_lifted() {
        let mut program = Program::new();
        let clause = Clause::new(
            Atom::new(QualifiedName::from("r"), vec![Argument::NumericConstant("1".into(), None)]),
            vec![Literal::Atom(Atom::new(QualifiedName::from("s"), vec![Argument::var("x")]))],
        );
        program.clauses.push(clause);

        run(&mut program);

        let clause = &program.clauses[0];
        assert!(matches!(clause.head.args[0], Argument::Variable(_)));
        assert!(clause.body.iter().any(|l| matches!(l, Literal::BinaryConstraint(BinaryConstraintOp::Equal, ..))));
    }
}
