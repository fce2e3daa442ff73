//! The `Node` contract: uniform child enumeration and in-place child
//! substitution, shared by every AST category that owns sub-arguments or
//! sub-literals.
//!
//! A node exclusively owns its children (no shared ownership, no parent
//! pointers); duplication goes through `Clone`, never a shallow copy;
//! equality is the type's own structural `PartialEq` (already excludes
//! positions at every level, see `ast::literal`/`ast::component`).

use crate::ast::argument::Argument;
use crate::ast::literal::{Atom, Literal};

/// A read-only reference into the tree, used by the visitor. Only the
/// variants actually dispatched on by a registered analysis are listed;
/// adding a new one is additive.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Argument(&'a Argument),
    Literal(&'a Literal),
    Atom(&'a Atom),
}

/// Any `FnMut` closure taking an owned `Argument` and returning an owned
/// `Argument` is a valid mapper. `apply` threads it through every owned
/// argument slot exactly once and never re-enters a replaced child — the
/// mapper itself decides whether to recurse by calling itself or a helper.
pub trait NodeMapper: FnMut(Argument) -> Argument {}
impl<F: FnMut(Argument) -> Argument> NodeMapper for F {}

/// Implemented by every AST category that owns nested `Argument`s.
pub trait Node {
    /// Embedded argument children, in declared order.
    fn children(&self) -> Vec<&Argument>;

    /// Replace each owned argument slot with `mapper(child)`, preserving
    /// slot order and multiplicity.
    fn apply(&mut self, mapper: &mut dyn NodeMapper);
}

impl Node for Argument {
    fn children(&self) -> Vec<&Argument> {
        self.child_arguments()
    }

    fn apply(&mut self, mapper: &mut dyn NodeMapper) {
        self.map_children(mapper);
    }
}

impl Node for Atom {
    fn children(&self) -> Vec<&Argument> {
        self.args.iter().collect()
    }

    fn apply(&mut self, mapper: &mut dyn NodeMapper) {
        for arg in self.args.iter_mut() {
            let taken = std::mem::replace(arg, Argument::NilConstant);
            *arg = mapper(taken);
        }
    }
}

impl Node for Literal {
    fn children(&self) -> Vec<&Argument> {
        match self {
            Literal::Atom(a) | Literal::Negation(a) => a.children(),
            Literal::BinaryConstraint(_, lhs, rhs) => vec![lhs, rhs],
            Literal::BooleanConstraint(_) => Vec::new(),
        }
    }

    fn apply(&mut self, mapper: &mut dyn NodeMapper) {
        self.map_arguments(&mut |a| mapper(a));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::qualified_name::QualifiedName;

    #[test]
    fn identity_mapper_leaves_node_unchanged() {
        let mut atom =
            Atom::new(QualifiedName::from("edge"), vec![Argument::var("x"), Argument::var("y")]);
        let before = atom.clone();
        atom.apply(&mut |a| a);
        assert_eq!(atom, before);
    }

    #[test]
    fn mapper_rewrites_every_slot_once() {
        let mut atom = Atom::new(
            QualifiedName::from("edge"),
            vec![Argument::var("x"), Argument::var("x"), Argument::var("y")],
        );
        atom.apply(&mut |a| match a {
            Argument::Variable(ref n) if n == "x" => Argument::var("x2"),
            other => other,
        });
        assert_eq!(
            atom.args,
            vec![Argument::var("x2"), Argument::var("x2"), Argument::var("y")]
        );
    }
}
