//! Generic, read-only depth-first traversal. Visitors never mutate;
//! rewriting goes through `Node::apply` and a `NodeMapper` instead.

use crate::ast::argument::Argument;
use crate::ast::clause::Clause;
use crate::ast::literal::{Atom, Literal};

/// Default action is "recurse into children"; override only the variants a
/// given pass cares about. Dispatched by variant tag, pre-order (the
/// visitor fires before recursing into children).
pub trait Visitor {
    fn visit_argument(&mut self, arg: &Argument) {
        walk_argument(self, arg);
    }

    fn visit_literal(&mut self, lit: &Literal) {
        walk_literal(self, lit);
    }

    fn visit_atom(&mut self, atom: &Atom) {
        walk_atom(self, atom);
    }
}

pub fn walk_argument<V: Visitor + ?Sized>(visitor: &mut V, arg: &Argument) {
    for child in arg.child_arguments() {
        visitor.visit_argument(child);
    }
}

pub fn walk_atom<V: Visitor + ?Sized>(visitor: &mut V, atom: &Atom) {
    for arg in &atom.args {
        visitor.visit_argument(arg);
    }
}

pub fn walk_literal<V: Visitor + ?Sized>(visitor: &mut V, lit: &Literal) {
    match lit {
        Literal::Atom(a) | Literal::Negation(a) => visitor.visit_atom(a),
        Literal::BinaryConstraint(_, lhs, rhs) => {
            visitor.visit_argument(lhs);
            visitor.visit_argument(rhs);
        }
        Literal::BooleanConstraint(_) => {}
    }
}

pub fn walk_clause<V: Visitor + ?Sized>(visitor: &mut V, clause: &Clause) {
    visitor.visit_atom(&clause.head);
    for lit in &clause.body {
        visitor.visit_literal(lit);
    }
}

/// Collects every nested `Argument` matching a predicate, the "visit all
/// nested of type T" traversal mode `spec.md` §4.2 requires alongside
/// pre-order `walk`.
pub fn visit_all_arguments<'a>(
    clause: &'a Clause,
    predicate: &mut dyn FnMut(&Argument) -> bool,
) -> Vec<&'a Argument> {
    fn collect<'a>(arg: &'a Argument, predicate: &mut dyn FnMut(&Argument) -> bool, found: &mut Vec<&'a Argument>) {
        if predicate(arg) {
            found.push(arg);
        }
        for child in arg.child_arguments() {
            collect(child, predicate, found);
        }
    }

    let mut found = Vec::new();
    for arg in &clause.head.args {
        collect(arg, predicate, &mut found);
    }
    for lit in &clause.body {
        match lit {
            Literal::Atom(a) | Literal::Negation(a) => {
                for arg in &a.args {
                    collect(arg, predicate, &mut found);
                }
            }
            Literal::BinaryConstraint(_, lhs, rhs) => {
                collect(lhs, predicate, &mut found);
                collect(rhs, predicate, &mut found);
            }
            Literal::BooleanConstraint(_) => {}
        }
    }
    found
}
