//! The relational-algebra IR a transformed AST lowers to: relation
//! declarations, a main statement tree, and a set of named subroutines.
//! Mirrors Soufflé's RAM layer closely enough to reuse its node vocabulary
//! (`Scan`, `Filter`, `Aggregate`, `PackRecord`, `AutoIncrement`, ...) while
//! staying a plain in-memory tree with no downstream execution engine.

pub mod dump;
pub mod lowering;

use crate::ast::{AggregateOp, BinaryConstraintOp, IntrinsicOp, NumericType};
use std::collections::BTreeMap;

/// A relation as the IR sees it: just a name, arity, and storage strategy —
/// the AST's richer `Relation` (qualifiers, functional dependencies) has
/// already done its job by the time lowering runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDecl {
    pub name: String,
    pub arity: usize,
    pub attribute_types: Vec<String>,
    pub representation: crate::ast::Representation,
}

impl RelationDecl {
    #[must_use]
    pub fn new(name: impl Into<String>, attribute_types: Vec<String>) -> Self {
        let attribute_types_len = attribute_types.len();
        RelationDecl {
            name: name.into(),
            arity: attribute_types_len,
            attribute_types,
            representation: crate::ast::Representation::Default,
        }
    }
}

/// A value-producing IR node; the expression-level counterpart of an AST
/// `Argument` once variables have been resolved to tuple positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// The value at `element` of the tuple bound by the `identifier`-th
    /// enclosing `Scan`/`IndexScan` (or Δ-relation scan in a recursive loop).
    TupleElement { identifier: usize, element: usize },
    SignedConstant(i64),
    UnsignedConstant(u64),
    FloatConstant(f64),
    StringConstant(String),
    Nil,
    /// A relation's current cardinality, read by `RelationSize`-driven plans
    /// (e.g. choosing a join order, or emitting `.printsize`).
    RelationSize(String),
    /// Monotonically increasing counter, lowered from `Argument::Counter`.
    AutoIncrement,
    IntrinsicOperator(IntrinsicOp, Vec<Expression>),
    UserDefinedOperator { name: String, stateful: bool, args: Vec<Expression> },
    PackRecord(Vec<Expression>),
    /// A tagged ADT branch: `[branch_id, payload_record]`.
    PackBranch { branch_id: u32, payload: Box<Expression> },
    /// Reads field `index` out of a packed record bound to `record`.
    UnpackRecordField { record: Box<Expression>, index: usize },
    /// An argument passed into a subroutine (provenance queries, mainly).
    SubroutineArgument(usize),
}

/// A boolean-valued condition guarding an `Operation` or `Statement`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison(BinaryConstraintOp, Expression, Expression),
    Negation(Box<Condition>),
    Conjunction(Vec<Condition>),
    /// True iff the named relation currently holds no tuples.
    EmptinessCheck(String),
    /// True iff the current tuple for `identifier` already exists in
    /// `relation` — the duplicate-suppression check semi-naive evaluation
    /// inserts before materialising a derived tuple.
    ExistenceCheck { relation: String, args: Vec<Expression> },
    /// Provenance-mode: true once enough body atoms have been matched to
    /// explain the given tuple, used by the proof-search subroutines.
    ProvenanceCondition(Box<Expression>),
}

/// A nested relational-algebra operator: the body of a `Query` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Iterates every tuple of `relation`, binding it to `identifier`.
    Scan { relation: String, identifier: usize, body: Box<Operation> },
    /// Iterates only the tuples of `relation` matching `pattern` on an
    /// index — the optimised form of `Scan` once bound positions are known.
    IndexScan { relation: String, identifier: usize, pattern: Vec<Option<Expression>>, body: Box<Operation> },
    /// Reads `identifier`'s `index`-th field as a fresh record scope bound
    /// to `record_identifier`, for `RecordInit`/`BranchInit` destructuring.
    UnpackRecord { identifier: usize, index: usize, record_identifier: usize, arity: usize, body: Box<Operation> },
    Filter { condition: Condition, body: Box<Operation> },
    /// Binds `target_identifier` to the aggregate of `target` over every
    /// tuple satisfying `body`, then continues into `then`.
    Aggregate {
        target_identifier: usize,
        op: AggregateOp,
        target: Option<Expression>,
        body: Box<Operation>,
        then: Box<Operation>,
    },
    /// Leaf: materialises one tuple of `relation`.
    Insert { relation: String, args: Vec<Expression> },
    /// Provenance leaf: records a proof step (the relation, its arguments,
    /// and the subroutine-call chain that derived it) instead of inserting.
    ProvenanceInsert { relation: String, args: Vec<Expression>, rule_number: usize },
}

/// A top-level action in the main program or a subroutine body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Sequence(Vec<Statement>),
    /// One semi-naive iteration: runs `body`, swaps Δ/new-Δ relations, and
    /// repeats until every Δ relation in the stratum is empty.
    Loop(Box<Statement>),
    /// Exits the enclosing `Loop` once `condition` holds.
    Exit(Condition),
    /// A single query plan rooted at `root`.
    Query(Operation),
    /// Bulk-copies every tuple of `from` into `to` (used to seed a
    /// recursive stratum's Δ relation from its non-recursive part).
    Merge { from: String, to: String },
    Clear(String),
    Swap(String, String),
    /// Parallel-loop marker the lowering stage may attach to a stratum;
    /// carried through unexecuted — no downstream engine in this crate.
    Parallel(Vec<Statement>),
    /// Persists or loads a relation via the directive's IO parameters.
    IO { relation: String, directive: crate::ast::DirectiveKind, parameters: BTreeMap<String, String> },
    /// Invokes a named subroutine (provenance proof search).
    Call(String),
    LogSize { relation: String, label: String },
}

/// The lowered form of an entire transformed program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RamProgram {
    pub relations: Vec<RelationDecl>,
    pub main: Option<Statement>,
    pub subroutines: BTreeMap<String, Statement>,
}

impl RamProgram {
    #[must_use]
    pub fn new() -> Self {
        RamProgram::default()
    }

    pub fn declare(&mut self, decl: RelationDecl) {
        if !self.relations.iter().any(|r| r.name == decl.name) {
            self.relations.push(decl);
        }
    }
}

#[must_use]
pub fn numeric_type_name(t: NumericType) -> &'static str {
    match t {
        NumericType::Int => "number",
        NumericType::Uint => "unsigned",
        NumericType::Float => "float",
    }
}
