//! The top-level Program: flat lists of every declaration kind.

use crate::ast::clause::Clause;
use crate::ast::component::{Component, ComponentInit};
use crate::ast::directive::Directive;
use crate::ast::functor_declaration::FunctorDeclaration;
use crate::ast::qualified_name::QualifiedName;
use crate::ast::relation::Relation;
use crate::ast::type_decl::TypeDecl;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pragma {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub types: Vec<TypeDecl>,
    pub relations: Vec<Relation>,
    pub functor_declarations: Vec<FunctorDeclaration>,
    pub clauses: Vec<Clause>,
    pub directives: Vec<Directive>,
    pub components: Vec<Component>,
    pub instantiations: Vec<ComponentInit>,
    pub pragmas: Vec<Pragma>,
}

impl Program {
    #[must_use]
    pub fn new() -> Self {
        Program::default()
    }

    #[must_use]
    pub fn relation(&self, name: &QualifiedName) -> Option<&Relation> {
        self.relations.iter().find(|r| &r.name == name)
    }

    #[must_use]
    pub fn relation_mut(&mut self, name: &QualifiedName) -> Option<&mut Relation> {
        self.relations.iter_mut().find(|r| &r.name == name)
    }

    #[must_use]
    pub fn clauses_for(&self, name: &QualifiedName) -> Vec<&Clause> {
        self.clauses.iter().filter(|c| &c.head.name == name).collect()
    }

    /// Invariant after `ComponentInstantiationTransformer`: both lists empty.
    #[must_use]
    pub fn is_component_free(&self) -> bool {
        self.components.is_empty() && self.instantiations.is_empty()
    }

    #[must_use]
    pub fn relations_by_name(&self) -> BTreeMap<String, &Relation> {
        self.relations.iter().map(|r| (r.name.to_dotted_string(), r)).collect()
    }
}
