//! Fluent builders for constructing AST fragments in tests.

use crate::ast::argument::Argument;
use crate::ast::clause::Clause;
use crate::ast::literal::{Atom, BinaryConstraintOp, Literal};
use crate::ast::qualified_name::QualifiedName;

#[derive(Debug, Clone)]
pub struct AtomBuilder {
    name: QualifiedName,
    args: Vec<Argument>,
}

impl AtomBuilder {
    #[must_use]
    pub fn new(name: impl Into<QualifiedName>) -> Self {
        AtomBuilder { name: name.into(), args: Vec::new() }
    }

    #[must_use]
    pub fn var(mut self, name: impl Into<String>) -> Self {
        self.args.push(Argument::var(name));
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: Argument) -> Self {
        self.args.push(arg);
        self
    }

    #[must_use]
    pub fn build(self) -> Atom {
        Atom::new(self.name, self.args)
    }
}

#[derive(Debug, Clone)]
pub struct RuleBuilder {
    head_name: QualifiedName,
    head_args: Vec<Argument>,
    body: Vec<Literal>,
}

impl RuleBuilder {
    #[must_use]
    pub fn new(head_name: impl Into<QualifiedName>) -> Self {
        RuleBuilder { head_name: head_name.into(), head_args: Vec::new(), body: Vec::new() }
    }

    #[must_use]
    pub fn head_vars<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.head_args = vars.into_iter().map(|v| Argument::var(v.into())).collect();
        self
    }

    #[must_use]
    pub fn body_atom<I, S>(mut self, name: impl Into<QualifiedName>, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let atom =
            Atom::new(name.into(), vars.into_iter().map(|v| Argument::var(v.into())).collect());
        self.body.push(Literal::Atom(atom));
        self
    }

    #[must_use]
    pub fn negated_atom<I, S>(mut self, name: impl Into<QualifiedName>, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let atom =
            Atom::new(name.into(), vars.into_iter().map(|v| Argument::var(v.into())).collect());
        self.body.push(Literal::Negation(atom));
        self
    }

    #[must_use]
    pub fn constraint(mut self, lhs: Argument, op: BinaryConstraintOp, rhs: Argument) -> Self {
        self.body.push(Literal::BinaryConstraint(op, lhs, rhs));
        self
    }

    #[must_use]
    pub fn build(self) -> Clause {
        Clause::new(Atom::new(self.head_name, self.head_args), self.body)
    }
}
