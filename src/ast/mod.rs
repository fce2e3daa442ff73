//! # AST Node Model
//!
//! Recursive sum-of-syntactic-categories representation of a Datalog
//! program: every node carries a source [`position::Position`], exposes its
//! children uniformly, and is rewritten only through [`node::NodeMapper`].

pub mod argument;
pub mod builders;
pub mod clause;
pub mod component;
pub mod directive;
pub mod functor_declaration;
pub mod literal;
pub mod node;
pub mod position;
pub mod program;
pub mod qualified_name;
pub mod relation;
pub mod type_decl;
pub mod visitor;

pub use argument::{AggregateOp, Argument, IntrinsicOp, NumericType};
pub use clause::{Clause, ExecutionPlan};
pub use component::{Component, ComponentInit, ComponentType, TypeBinding};
pub use directive::{Directive, DirectiveKind};
pub use functor_declaration::{FunctorDeclaration, ParamAttribute};
pub use literal::{Atom, BinaryConstraintOp, Literal};
pub use node::{Node, NodeMapper, NodeRef};
pub use position::Position;
pub use program::{Pragma, Program};
pub use qualified_name::QualifiedName;
pub use relation::{Attribute, FunctionalDependency, Relation, RelationQualifier, Representation};
pub use type_decl::{AdtBranch, RecordField, TypeDecl, TypeDeclKind};
pub use visitor::Visitor;
