//! Strategy-selected AST → RAM lowering, grounded on
//! `original_source/src/ast2ram/{TranslationStrategy.h,UnitTranslator.h}`: a
//! `TranslationStrategy` trait object picks between the seminaive and
//! provenance translators, both implementing the shared `UnitTranslator`
//! contract below.

pub mod provenance;
pub mod seminaive;

use crate::analysis::{PrecedenceGraph, SccGraph};
use crate::ast::{
    AggregateOp, Argument, BinaryConstraintOp, Clause, Literal, Program, QualifiedName,
};
use crate::ir::{Condition, Expression, Operation, RamProgram, RelationDecl};
use crate::translation_unit::TranslationUnit;
use std::collections::HashMap;

/// The environment an `UnitTranslator` builds up while lowering one clause:
/// which tuple identifier each bound variable currently lives in, and the
/// next free identifier to hand out.
pub struct ClauseEnv {
    pub bindings: HashMap<String, Expression>,
    pub next_identifier: usize,
}

impl ClauseEnv {
    #[must_use]
    pub fn new() -> Self {
        ClauseEnv { bindings: HashMap::new(), next_identifier: 0 }
    }

    pub fn fresh_identifier(&mut self) -> usize {
        let id = self.next_identifier;
        self.next_identifier += 1;
        id
    }
}

impl Default for ClauseEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowers an AST argument into a RAM expression, resolving every bound
/// variable through `env` and failing closed (returning `Expression::Nil`)
/// on constructs that should have been removed by earlier transformers
/// (e.g. a non-variable atom argument, which `normalise::lift_non_variable_arguments`
/// or `resolve_aliases` is responsible for eliminating before lowering).
#[must_use]
pub fn lower_argument(arg: &Argument, env: &ClauseEnv) -> Expression {
    match arg {
        Argument::Variable(name) => env.bindings.get(name).cloned().unwrap_or(Expression::Nil),
        Argument::UnnamedVariable => Expression::Nil,
        Argument::NumericConstant(text, ty) => lower_numeric_constant(text, *ty),
        Argument::StringConstant(s) => Expression::StringConstant(s.clone()),
        Argument::NilConstant => Expression::Nil,
        Argument::Counter => Expression::AutoIncrement,
        Argument::RecordInit(fields) => {
            Expression::PackRecord(fields.iter().map(|f| lower_argument(f, env)).collect())
        }
        Argument::BranchInit(name, fields) => Expression::PackBranch {
            branch_id: branch_tag(name),
            payload: Box::new(Expression::PackRecord(fields.iter().map(|f| lower_argument(f, env)).collect())),
        },
        Argument::IntrinsicFunctor(op, args) => {
            Expression::IntrinsicOperator(*op, args.iter().map(|a| lower_argument(a, env)).collect())
        }
        Argument::UserDefinedFunctor(name, args) => Expression::UserDefinedOperator {
            name: name.to_dotted_string(),
            stateful: false,
            args: args.iter().map(|a| lower_argument(a, env)).collect(),
        },
        Argument::TypeCast(inner, _) => lower_argument(inner, env),
        Argument::Aggregator(..) => Expression::Nil,
    }
}

fn lower_numeric_constant(text: &str, ty: Option<crate::ast::NumericType>) -> Expression {
    use crate::ast::NumericType;
    match ty {
        Some(NumericType::Uint) => Expression::UnsignedConstant(text.parse().unwrap_or(0)),
        Some(NumericType::Float) => Expression::FloatConstant(text.parse().unwrap_or(0.0)),
        _ => match text.parse::<i64>() {
            Ok(v) => Expression::SignedConstant(v),
            Err(_) => text.parse::<f64>().map(Expression::FloatConstant).unwrap_or(Expression::SignedConstant(0)),
        },
    }
}

/// Stable branch tag for an ADT constructor: the FNV-1a hash of its dotted
/// name, truncated to 32 bits. Good enough to disambiguate branches within
/// one type without needing the parser to thread through declaration order.
fn branch_tag(name: &QualifiedName) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.to_dotted_string().bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[must_use]
pub fn lower_constraint_op(op: BinaryConstraintOp, lhs: &Argument, rhs: &Argument, env: &ClauseEnv) -> Condition {
    Condition::Comparison(op, lower_argument(lhs, env), lower_argument(rhs, env))
}

/// Lowers one clause's body into a nested `Operation` tree, binding each
/// positive atom's variables as it descends and wrapping negated atoms /
/// constraints around the remainder; `build_leaf` is invoked once the full
/// body has been walked, with every binding the clause head needs already
/// present in `env`.
pub fn lower_body(clause: &Clause, build_leaf: impl FnOnce(&ClauseEnv) -> Operation) -> Operation {
    let mut env = ClauseEnv::new();
    lower_literals(&clause.body, 0, &mut env, build_leaf)
}

fn lower_literals(body: &[Literal], index: usize, env: &mut ClauseEnv, build_leaf: impl FnOnce(&ClauseEnv) -> Operation) -> Operation {
    let Some(lit) = body.get(index) else { return build_leaf(env) };

    match lit {
        Literal::Atom(atom) => {
            let identifier = env.fresh_identifier();
            for (position, arg) in atom.args.iter().enumerate() {
                if let Argument::Variable(name) = arg {
                    env.bindings.entry(name.clone()).or_insert(Expression::TupleElement { identifier, element: position });
                }
            }
            let body_op = lower_literals(body, index + 1, env, build_leaf);
            Operation::Scan { relation: atom.name.to_dotted_string(), identifier, body: Box::new(body_op) }
        }
        Literal::Negation(atom) => {
            let args: Vec<Expression> = atom.args.iter().map(|a| lower_argument(a, env)).collect();
            let condition = Condition::Negation(Box::new(Condition::ExistenceCheck {
                relation: atom.name.to_dotted_string(),
                args,
            }));
            let body_op = lower_literals(body, index + 1, env, build_leaf);
            Operation::Filter { condition, body: Box::new(body_op) }
        }
        Literal::BinaryConstraint(op, lhs, rhs) => {
            if *op == BinaryConstraintOp::Equal {
                if let Argument::Variable(name) = lhs {
                    if !env.bindings.contains_key(name) {
                        let value = lower_argument(rhs, env);
                        env.bindings.insert(name.clone(), value);
                        return lower_literals(body, index + 1, env, build_leaf);
                    }
                }
            }
            let condition = lower_constraint_op(*op, lhs, rhs, env);
            let body_op = lower_literals(body, index + 1, env, build_leaf);
            Operation::Filter { condition, body: Box::new(body_op) }
        }
        Literal::BooleanConstraint(true) => lower_literals(body, index + 1, env, build_leaf),
        Literal::BooleanConstraint(false) => Operation::Filter {
            condition: Condition::Comparison(BinaryConstraintOp::Equal, Expression::SignedConstant(0), Expression::SignedConstant(1)),
            body: Box::new(build_leaf(env)),
        },
    }
}

/// Implemented once per lowering strategy (seminaive, provenance); the
/// driver selects between them based on `GlobalConfig::provenance`.
pub trait UnitTranslator {
    fn translate(&self, tu: &TranslationUnit) -> RamProgram;
}

fn relation_decl(relation: &crate::ast::Relation) -> RelationDecl {
    let mut decl = RelationDecl::new(
        relation.name.to_dotted_string(),
        relation.attributes.iter().map(|a| a.type_name.to_dotted_string()).collect(),
    );
    decl.representation = relation.representation;
    decl
}

/// Shared scaffolding both strategies start from: declare every relation,
/// then fold the program's strata (in dependency order) into statements via
/// `per_clause`/`per_stratum` callbacks supplied by the concrete strategy.
pub fn lower_skeleton(
    tu: &TranslationUnit,
    mut per_clause: impl FnMut(&Clause, bool) -> crate::ir::Statement,
) -> RamProgram {
    let program: &Program = tu.program();
    let mut ram = RamProgram::new();
    for relation in &program.relations {
        ram.declare(relation_decl(relation));
    }

    let scc = SccGraph::compute(tu);
    let _precedence = PrecedenceGraph::compute(tu);
    let mut strata_statements = Vec::new();

    for (scc_index, stratum) in scc.topological_order().iter().enumerate() {
        let recursive = scc.is_recursive(scc_index);
        let clauses: Vec<&Clause> = stratum.iter().flat_map(|r| program.clauses_for(r)).collect();
        if clauses.is_empty() {
            continue;
        }
        let statements: Vec<crate::ir::Statement> = clauses.iter().map(|c| per_clause(c, recursive)).collect();
        let body = crate::ir::Statement::Sequence(statements);
        strata_statements.push(if recursive { crate::ir::Statement::Loop(Box::new(body)) } else { body });
    }

    for directive in &program.directives {
        strata_statements.push(crate::ir::Statement::IO {
            relation: directive.relation.to_dotted_string(),
            directive: directive.kind,
            parameters: directive.parameters.clone(),
        });
    }

    ram.main = Some(crate::ir::Statement::Sequence(strata_statements));
    ram
}

#[must_use]
pub fn aggregate_default_op(op: AggregateOp) -> AggregateOp {
    op
}
