//! I/O directives: `.input`, `.output`, `.printsize`, `.limitsize`.

use crate::ast::position::Position;
use crate::ast::qualified_name::QualifiedName;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Input,
    Output,
    Printsize,
    Limitsize,
}

#[derive(Debug, Clone)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub relation: QualifiedName,
    pub parameters: BTreeMap<String, String>,
    pub position: Option<Position>,
}

impl PartialEq for Directive {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.relation == other.relation
            && self.parameters == other.parameters
    }
}
impl Eq for Directive {}

impl Directive {
    #[must_use]
    pub fn new(kind: DirectiveKind, relation: QualifiedName) -> Self {
        Directive { kind, relation, parameters: BTreeMap::new(), position: None }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }
}
