//! Argument variants: the value-producing positions of atoms, constraints,
//! and aggregators.

use crate::ast::literal::Literal;
use crate::ast::qualified_name::QualifiedName;

/// A fixed numeric type a parser may attach to a `NumericConstant`; absent
/// values are resolved later by `type-analysis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    Int,
    Uint,
    Float,
}

/// Intrinsic (built-in) functor operators. Grouped by arity the way
/// `type-analysis` resolves them against operand types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    Negate,
    BitAnd,
    BitOr,
    BitXor,
    BitNegate,
    LogicalAnd,
    LogicalOr,
    LogicalNegate,
    ShiftLeft,
    ShiftRight,
    Max,
    Min,
    Cat,
    Ord,
    StrLen,
    Substr,
    ToNumber,
    ToString,
}

/// Aggregate operators usable in `Argument::Aggregator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Count,
    Sum,
    Min,
    Max,
    Mean,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Variable(String),
    UnnamedVariable,
    NumericConstant(String, Option<NumericType>),
    StringConstant(String),
    NilConstant,
    Counter,
    RecordInit(Vec<Argument>),
    BranchInit(QualifiedName, Vec<Argument>),
    IntrinsicFunctor(IntrinsicOp, Vec<Argument>),
    UserDefinedFunctor(QualifiedName, Vec<Argument>),
    TypeCast(Box<Argument>, QualifiedName),
    Aggregator(AggregateOp, Option<Box<Argument>>, Vec<Literal>),
}

impl Argument {
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Argument::Variable(name.into())
    }

    #[must_use]
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Argument::Variable(name) => Some(name.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Argument::NumericConstant(..) | Argument::StringConstant(_) | Argument::NilConstant
        )
    }

    /// All variables transitively referenced, in declared order, duplicates included.
    #[must_use]
    pub fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Argument::Variable(name) => out.push(name.clone()),
            Argument::UnnamedVariable
            | Argument::NumericConstant(..)
            | Argument::StringConstant(_)
            | Argument::NilConstant
            | Argument::Counter => {}
            Argument::RecordInit(args) | Argument::IntrinsicFunctor(_, args) => {
                for a in args {
                    a.collect_variables(out);
                }
            }
            Argument::BranchInit(_, args) | Argument::UserDefinedFunctor(_, args) => {
                for a in args {
                    a.collect_variables(out);
                }
            }
            Argument::TypeCast(inner, _) => inner.collect_variables(out),
            Argument::Aggregator(_, target, body) => {
                if let Some(t) = target {
                    t.collect_variables(out);
                }
                for lit in body {
                    lit.collect_variables(out);
                }
            }
        }
    }

    /// Children in the declared order required by the node-model contract.
    #[must_use]
    pub fn child_arguments(&self) -> Vec<&Argument> {
        match self {
            Argument::Variable(_)
            | Argument::UnnamedVariable
            | Argument::NumericConstant(..)
            | Argument::StringConstant(_)
            | Argument::NilConstant
            | Argument::Counter => Vec::new(),
            Argument::RecordInit(args)
            | Argument::BranchInit(_, args)
            | Argument::IntrinsicFunctor(_, args)
            | Argument::UserDefinedFunctor(_, args) => args.iter().collect(),
            Argument::TypeCast(inner, _) => vec![inner.as_ref()],
            Argument::Aggregator(_, target, _) => target.iter().map(Box::as_ref).collect(),
        }
    }

    pub fn map_children(&mut self, mapper: &mut dyn FnMut(Argument) -> Argument) {
        match self {
            Argument::Variable(_)
            | Argument::UnnamedVariable
            | Argument::NumericConstant(..)
            | Argument::StringConstant(_)
            | Argument::NilConstant
            | Argument::Counter => {}
            Argument::RecordInit(args)
            | Argument::BranchInit(_, args)
            | Argument::IntrinsicFunctor(_, args)
            | Argument::UserDefinedFunctor(_, args) => {
                for a in args.iter_mut() {
                    let taken = std::mem::replace(a, Argument::NilConstant);
                    *a = mapper(taken);
                }
            }
            Argument::TypeCast(inner, _) => {
                let taken = std::mem::replace(inner.as_mut(), Argument::NilConstant);
                **inner = mapper(taken);
            }
            Argument::Aggregator(_, target, body) => {
                if let Some(t) = target {
                    let taken = std::mem::replace(t.as_mut(), Argument::NilConstant);
                    **t = mapper(taken);
                }
                for lit in body.iter_mut() {
                    lit.map_arguments(mapper);
                }
            }
        }
    }
}
