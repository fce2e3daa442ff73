//! Clauses: a head atom plus an ordered conjunction of body literals.

use crate::ast::literal::{Atom, Literal};
use crate::ast::position::Position;

/// Execution-plan annotations are carried through unchanged by every
/// transformer in this core (`spec.md` does not specify their shape beyond
/// "optional execution plan"); they are opaque ordering hints consumed only
/// by the downstream RAM interpreter, out of scope here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub orderings: Vec<(u32, Vec<u32>)>,
}

#[derive(Debug, Clone)]
pub struct Clause {
    pub head: Atom,
    pub body: Vec<Literal>,
    pub plan: Option<ExecutionPlan>,
    pub position: Option<Position>,
}

impl Clause {
    #[must_use]
    pub fn new(head: Atom, body: Vec<Literal>) -> Self {
        Clause { head, body, plan: None, position: None }
    }

    #[must_use]
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }

    #[must_use]
    pub fn positive_body_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.body.iter().filter_map(|lit| match lit {
            Literal::Atom(a) => Some(a),
            _ => None,
        })
    }

    #[must_use]
    pub fn negated_body_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.body.iter().filter_map(|lit| match lit {
            Literal::Negation(a) => Some(a),
            _ => None,
        })
    }

    #[must_use]
    pub fn all_body_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.body.iter().filter_map(Literal::atom)
    }
}

impl PartialEq for Clause {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head && self.body == other.body && self.plan == other.plan
    }
}
