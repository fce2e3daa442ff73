//! Type declarations: union, record, subset, and algebraic data types.

use crate::ast::position::Position;
use crate::ast::qualified_name::QualifiedName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub name: String,
    pub type_name: QualifiedName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdtBranch {
    pub constructor: QualifiedName,
    pub fields: Vec<RecordField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDeclKind {
    /// `.type T = A | B | C`
    Union(Vec<QualifiedName>),
    /// `.type T = [a: A, b: B]`
    Record(Vec<RecordField>),
    /// `.type T <: Base`
    Subset(QualifiedName),
    /// `.type T = A {x:int} | B {y:float}`
    Adt(Vec<AdtBranch>),
    /// Built-in primitive alias (`symbol`, `number`, `float`, `unsigned`).
    Primitive,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: QualifiedName,
    pub kind: TypeDeclKind,
    pub position: Option<Position>,
}

impl PartialEq for TypeDecl {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}
