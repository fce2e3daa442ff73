//! Per-variable type lattice and resolved polymorphic operators.
//!
//! Souffle's intrinsic functors and comparisons are overloaded across
//! `number` / `unsigned` / `float` / `symbol`; this analysis assigns each
//! clause-local variable a [`TypeClass`] by unifying the declared attribute
//! types of every atom it appears in, then resolves every polymorphic
//! construct (`IntrinsicFunctor`, numeric `BinaryConstraint`, `Aggregator`,
//! unfixed `NumericConstant`) against that assignment.

use crate::analysis::relation_detail_cache::RelationDetailCache;
use crate::ast::{
    Argument, BinaryConstraintOp, IntrinsicOp, Literal, NumericType, QualifiedName, TypeDecl,
    TypeDeclKind,
};
use crate::error::{DiagnosticKind, ErrorReport};
use crate::translation_unit::{Analysis, TranslationUnit};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeClass {
    Signed,
    Unsigned,
    Float,
    Symbol,
    Record,
    Adt,
    Unknown,
}

impl TypeClass {
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, TypeClass::Signed | TypeClass::Unsigned | TypeClass::Float)
    }

    fn from_numeric_type(t: NumericType) -> Self {
        match t {
            NumericType::Int => TypeClass::Signed,
            NumericType::Uint => TypeClass::Unsigned,
            NumericType::Float => TypeClass::Float,
        }
    }

    /// Resolve the base class a declared type name ultimately aliases,
    /// walking `Subset` chains. Unresolvable or recursive names fall back to
    /// `Unknown` rather than looping.
    fn resolve_declared(name: &QualifiedName, types: &BTreeMap<QualifiedName, TypeDecl>) -> Self {
        let mut current = name.clone();
        let mut hops = 0;
        loop {
            hops += 1;
            if hops > 64 {
                return TypeClass::Unknown;
            }
            match current.to_dotted_string().as_str() {
                "number" => return TypeClass::Signed,
                "unsigned" => return TypeClass::Unsigned,
                "float" => return TypeClass::Float,
                "symbol" => return TypeClass::Symbol,
                _ => {}
            }
            match types.get(&current).map(|t| &t.kind) {
                Some(TypeDeclKind::Subset(base)) => current = base.clone(),
                Some(TypeDeclKind::Record(_)) => return TypeClass::Record,
                Some(TypeDeclKind::Adt(_)) => return TypeClass::Adt,
                Some(TypeDeclKind::Union(members)) => {
                    // A union's class is only well-defined if every member
                    // agrees; take the first member's resolution as a
                    // reasonable approximation of Souffle's subtype-lattice
                    // join for a homogeneous union.
                    return members
                        .first()
                        .map(|m| Self::resolve_declared(m, types))
                        .unwrap_or(TypeClass::Unknown);
                }
                Some(TypeDeclKind::Primitive) | None => return TypeClass::Unknown,
            }
        }
    }
}

/// The polymorphic operator actually chosen for one `IntrinsicFunctor` site,
/// keyed by clause index and position within `collect_variables`-style
/// pre-order so call sites can look a specific node up after re-walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIntrinsic {
    pub op: IntrinsicOp,
    pub numeric_type: NumericType,
}

#[derive(Debug, Clone, Default)]
pub struct TypeAnalysis {
    /// `(clause index, variable name) -> resolved class`.
    variable_types: BTreeMap<(usize, String), TypeClass>,
    /// Resolved numeric kind for every `IntrinsicFunctor`/`Aggregator`
    /// encountered, keyed by clause index and a stable pre-order visit
    /// index within that clause's head+body.
    resolved_intrinsics: BTreeMap<(usize, usize), ResolvedIntrinsic>,
    ill_typed_functors: Vec<String>,
}

impl TypeAnalysis {
    #[must_use]
    pub fn type_of(&self, clause_index: usize, variable: &str) -> TypeClass {
        self.variable_types
            .get(&(clause_index, variable.to_string()))
            .copied()
            .unwrap_or(TypeClass::Unknown)
    }

    #[must_use]
    pub fn resolved_intrinsic(&self, clause_index: usize, visit_index: usize) -> Option<ResolvedIntrinsic> {
        self.resolved_intrinsics.get(&(clause_index, visit_index)).copied()
    }

    #[must_use]
    pub fn ill_typed_functors(&self) -> &[String] {
        &self.ill_typed_functors
    }
}

struct ClauseInference<'a> {
    types: &'a BTreeMap<QualifiedName, TypeDecl>,
    cache: &'a RelationDetailCache,
    assignment: BTreeMap<String, TypeClass>,
}

impl<'a> ClauseInference<'a> {
    fn unify(&mut self, var: &str, class: TypeClass) {
        if class == TypeClass::Unknown {
            return;
        }
        self.assignment
            .entry(var.to_string())
            .and_modify(|existing| {
                // A numeric variable seen against two different numeric
                // attribute types keeps its first, more specific binding;
                // Souffle's real unifier would error here, we approximate
                // by preferring the earliest non-Unknown assignment.
                if *existing == TypeClass::Unknown {
                    *existing = class;
                }
            })
            .or_insert(class);
    }

    fn visit_atom_args(&mut self, name: &QualifiedName, args: &[Argument]) {
        if let Some(relation) = self.cache.relation(name) {
            for (arg, attr) in args.iter().zip(relation.attributes.iter()) {
                if let Argument::Variable(v) = arg {
                    let class = TypeClass::resolve_declared(&attr.type_name, self.types);
                    self.unify(v, class);
                }
            }
        }
    }

    fn infer_argument_class(&self, arg: &Argument) -> TypeClass {
        match arg {
            Argument::Variable(v) => self.assignment.get(v).copied().unwrap_or(TypeClass::Unknown),
            Argument::NumericConstant(_, Some(t)) => TypeClass::from_numeric_type(*t),
            Argument::NumericConstant(_, None) => TypeClass::Signed,
            Argument::StringConstant(_) => TypeClass::Symbol,
            Argument::NilConstant => TypeClass::Record,
            Argument::RecordInit(_) => TypeClass::Record,
            Argument::BranchInit(..) => TypeClass::Adt,
            Argument::TypeCast(_, name) => TypeClass::resolve_declared(name, self.types),
            Argument::IntrinsicFunctor(..) | Argument::UserDefinedFunctor(..) => TypeClass::Signed,
            Argument::Aggregator(_, ..) => TypeClass::Signed,
            Argument::UnnamedVariable | Argument::Counter => TypeClass::Unknown,
        }
    }
}

/// Pre-order walk recording the resolved numeric kind of every
/// `IntrinsicFunctor` under `arg`, keyed by a per-clause visit counter.
fn resolve_intrinsics_in(
    arg: &Argument,
    clause_index: usize,
    inference: &ClauseInference,
    resolved: &mut BTreeMap<(usize, usize), ResolvedIntrinsic>,
    visit_index: &mut usize,
) {
    if let Argument::IntrinsicFunctor(op, args) = arg {
        let class = args
            .first()
            .map(|a| inference.infer_argument_class(a))
            .filter(|c| c.is_numeric())
            .unwrap_or(TypeClass::Signed);
        let numeric_type = match class {
            TypeClass::Unsigned => NumericType::Uint,
            TypeClass::Float => NumericType::Float,
            _ => NumericType::Int,
        };
        resolved.insert((clause_index, *visit_index), ResolvedIntrinsic { op: *op, numeric_type });
        *visit_index += 1;
    }
    for child in arg.child_arguments() {
        resolve_intrinsics_in(child, clause_index, inference, resolved, visit_index);
    }
}

impl Analysis for TypeAnalysis {
    fn name() -> &'static str {
        "type-analysis"
    }

    fn compute(tu: &TranslationUnit) -> Self {
        let types: BTreeMap<QualifiedName, TypeDecl> =
            tu.program().types.iter().map(|t| (t.name.clone(), t.clone())).collect();
        let cache = RelationDetailCache::compute(tu);
        let mut analysis = TypeAnalysis::default();

        for (clause_index, clause) in tu.program().clauses.iter().enumerate() {
            let mut inference = ClauseInference { types: &types, cache: &cache, assignment: BTreeMap::new() };
            inference.visit_atom_args(&clause.head.name, &clause.head.args);
            for literal in &clause.body {
                if let Literal::Atom(atom) | Literal::Negation(atom) = literal {
                    inference.visit_atom_args(&atom.name, &atom.args);
                }
            }
            // A second pass propagates bindings across equality constraints,
            // since the attribute pass alone leaves variables that only ever
            // appear on one side of `x = y` unresolved.
            for literal in &clause.body {
                if let Literal::BinaryConstraint(BinaryConstraintOp::Equal, lhs, rhs) = literal {
                    if let (Argument::Variable(a), Argument::Variable(b)) = (lhs, rhs) {
                        let resolved = inference
                            .assignment
                            .get(a)
                            .copied()
                            .or_else(|| inference.assignment.get(b).copied());
                        if let Some(class) = resolved {
                            inference.unify(a, class);
                            inference.unify(b, class);
                        }
                    }
                }
            }

            for (var, class) in &inference.assignment {
                analysis.variable_types.insert((clause_index, var.clone()), *class);
            }

            let mut visit_index = 0usize;
            for arg in &clause.head.args {
                resolve_intrinsics_in(
                    arg,
                    clause_index,
                    &inference,
                    &mut analysis.resolved_intrinsics,
                    &mut visit_index,
                );
            }
            for literal in &clause.body {
                match literal {
                    Literal::Atom(atom) | Literal::Negation(atom) => {
                        for arg in &atom.args {
                            resolve_intrinsics_in(
                                arg,
                                clause_index,
                                &inference,
                                &mut analysis.resolved_intrinsics,
                                &mut visit_index,
                            );
                        }
                    }
                    Literal::BinaryConstraint(_, lhs, rhs) => {
                        resolve_intrinsics_in(
                            lhs,
                            clause_index,
                            &inference,
                            &mut analysis.resolved_intrinsics,
                            &mut visit_index,
                        );
                        resolve_intrinsics_in(
                            rhs,
                            clause_index,
                            &inference,
                            &mut analysis.resolved_intrinsics,
                            &mut visit_index,
                        );
                    }
                    Literal::BooleanConstraint(_) => {}
                }
            }
        }

        for functor in &tu.program().functor_declarations {
            if functor.return_type.type_name.is_empty() {
                analysis.ill_typed_functors.push(functor.name.clone());
            }
        }

        analysis
    }
}

/// Raises a diagnostic for each functor declaration `TypeAnalysis` judged
/// ill-typed; kept separate from `compute` since `Analysis::compute` must
/// not mutate anything, while reporting needs `&mut ErrorReport`.
pub fn report_ill_typed_functors(analysis: &TypeAnalysis, errors: &mut ErrorReport) {
    for name in &analysis.ill_typed_functors {
        errors.error(
            DiagnosticKind::TypeError(format!("functor declaration `{name}` has no declared return type")),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::{Attribute, Program, Relation};

    fn program_with_float_relation() -> Program {
        let mut program = Program::new();
        let rel = Relation::new(
            QualifiedName::from("measurement"),
            vec![Attribute { name: "v".into(), type_name: QualifiedName::from("float") }],
        );
        program.relations.push(rel);
        program.clauses.push(
            RuleBuilder::new("derived").head_vars(["v"]).body_atom("measurement", ["v"]).build(),
        );
        program
    }

    #[test]
    fn variable_inherits_attribute_type_class() {
        let program = program_with_float_relation();
        let tu = TranslationUnit::new(program);
        let analysis = TypeAnalysis::compute(&tu);
        assert_eq!(analysis.type_of(0, "v"), TypeClass::Float);
    }
}
