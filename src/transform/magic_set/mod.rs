//! Magic-Set transformation: rewrites a program so that evaluating an
//! output relation under a particular binding pattern only ever derives
//! facts relevant to that query, instead of materialising full relations.
//!
//! Runs as five inner passes: normalise the EDB/IDB boundary, label strata
//! that need to be decoupled from later strata (negation, aggregation),
//! drop relations the labelling pass stranded, adorn every reachable rule
//! with its binding pattern, drop relations stranded by adornment, then
//! generate the magic predicates and rules themselves.

pub mod adorn;
pub mod label;
pub mod magic_core;
pub mod normalise;

use crate::analysis::SccGraph;
use crate::ast::{BinaryConstraintOp, NumericType, Program, QualifiedName, Representation};
use crate::config::GlobalConfig;
use crate::transform::remove_redundant_relations::RemoveRedundantRelations;
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashSet;

/// Relations a clause containing a counter argument touches: the clause's
/// own head plus every atom in its body, positive or negated.
fn counter_clause_relations(program: &Program) -> HashSet<QualifiedName> {
    let mut out = HashSet::new();
    for clause in &program.clauses {
        let mut has_counter = clause.head.args.iter().any(contains_counter);
        has_counter |= clause.body.iter().any(|lit| match lit {
            crate::ast::Literal::Atom(a) | crate::ast::Literal::Negation(a) => a.args.iter().any(contains_counter),
            _ => false,
        });
        if has_counter {
            out.insert(clause.head.name.clone());
            for atom in clause.all_body_atoms() {
                out.insert(atom.name.clone());
            }
        }
    }
    out
}

fn contains_counter(arg: &crate::ast::Argument) -> bool {
    use crate::ast::Argument;
    match arg {
        Argument::Counter => true,
        other => other.child_arguments().into_iter().any(contains_counter),
    }
}

/// Relations that are either pure EDB (input, no derivation rules) or have
/// no rule clauses at all: nothing a magic-set rewrite could usefully
/// specialise.
fn trivially_ignored(program: &Program) -> HashSet<QualifiedName> {
    program
        .relations
        .iter()
        .filter(|r| r.is_input() || program.clauses_for(&r.name).iter().all(|c| c.body.is_empty()))
        .map(|r| r.name.clone())
        .collect()
}

/// Fixpoint closure over "any clause containing a counter": the clause's own
/// relations, plus every relation in a stratum that depends on one of them.
fn strongly_ignored(program: &Program, scc: &SccGraph) -> HashSet<QualifiedName> {
    let mut seeds = counter_clause_relations(program);
    loop {
        let mut grown = seeds.clone();
        for clause in &program.clauses {
            if clause.all_body_atoms().any(|atom| seeds.contains(&atom.name)) {
                grown.insert(clause.head.name.clone());
            }
        }
        // extend through whole strata: anything sharing an SCC with a seed
        for name in seeds.clone() {
            if let Some(scc_index) = scc.get_scc(&name) {
                grown.extend(scc.get_internal_relations(scc_index).iter().cloned());
            }
        }
        if grown.len() == seeds.len() {
            return grown;
        }
        seeds = grown;
    }
}

fn has_float_comparison(program: &Program, name: &QualifiedName) -> bool {
    program.clauses_for(name).iter().any(|clause| {
        clause.body.iter().any(|lit| {
            matches!(
                lit,
                crate::ast::Literal::BinaryConstraint(op, lhs, rhs)
                    if op.is_order_dependent() && (is_float(lhs) || is_float(rhs))
            )
        })
    })
}

fn is_float(arg: &crate::ast::Argument) -> bool {
    matches!(arg, crate::ast::Argument::NumericConstant(_, Some(NumericType::Float)))
}

/// Relations reachable, left to right within a clause body, from a position
/// that is itself already ignored. Deliberately a literal scan of the body
/// as written, not a variable-binding analysis: an already-ignored atom
/// taints everything textually after it in the same clause.
fn reachable_right_of_ignored(program: &Program, ignored: &HashSet<QualifiedName>) -> HashSet<QualifiedName> {
    let mut extra = HashSet::new();
    for clause in &program.clauses {
        let mut tainted = false;
        for lit in &clause.body {
            let name = match lit {
                crate::ast::Literal::Atom(a) | crate::ast::Literal::Negation(a) => Some(&a.name),
                _ => None,
            };
            if let Some(name) = name {
                if tainted {
                    extra.insert(name.clone());
                }
                if ignored.contains(name) {
                    tainted = true;
                }
            }
        }
    }
    extra
}

/// Union of strongly- and trivially-ignored relations with everything else
/// the magic-set rewrite cannot soundly specialise: eqrel relations, order-
/// dependent comparisons over floats, relations with functional
/// dependencies, relations defined with an explicit evaluation plan, and
/// anything reachable to the right of an already-ignored atom.
fn weakly_ignored(program: &Program, scc: &SccGraph) -> HashSet<QualifiedName> {
    let mut ignored = strongly_ignored(program, scc);
    ignored.extend(trivially_ignored(program));

    for relation in &program.relations {
        if relation.representation == Representation::Eqrel {
            ignored.insert(relation.name.clone());
        }
        if !relation.functional_dependencies.is_empty() {
            ignored.insert(relation.name.clone());
        }
        if has_float_comparison(program, &relation.name) {
            ignored.insert(relation.name.clone());
        }
    }
    for clause in &program.clauses {
        if clause.plan.is_some() {
            ignored.insert(clause.head.name.clone());
        }
    }

    loop {
        let extra = reachable_right_of_ignored(program, &ignored);
        let before = ignored.len();
        ignored.extend(extra);
        if ignored.len() == before {
            break;
        }
    }
    ignored
}

fn any_magic_qualified(program: &Program) -> bool {
    program.relations.iter().any(|r| r.is_magic())
}

/// Runs the magic-set pipeline when the configuration names at least one
/// target relation (or `*`) and that relation isn't excluded, or when any
/// relation in the program carries an explicit `.magic` qualifier.
#[derive(Clone)]
pub struct MagicSetTransformer {
    config: GlobalConfig,
}

impl MagicSetTransformer {
    #[must_use]
    pub fn new(config: GlobalConfig) -> Self {
        MagicSetTransformer { config }
    }

    fn should_run(&self, program: &Program) -> bool {
        any_magic_qualified(program)
            || program.relations.iter().any(|r| self.config.should_magic_transform(&r.name.to_dotted_string()))
    }
}

impl Transformer for MagicSetTransformer {
    fn name(&self) -> &str {
        "MagicSetTransformer"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        if !self.should_run(tu.program()) {
            return false;
        }

        let relations_to_not_label: HashSet<QualifiedName> =
            self.config.magic_transform_excluded().into_iter().map(QualifiedName::from).collect();

        normalise::run(tu.program_mut());
        tu.invalidate();

        let scc = tu.get::<SccGraph>();
        let ignored = weakly_ignored(tu.program(), &scc);

        label::run(tu.program_mut(), &relations_to_not_label, &ignored);
        tu.invalidate();

        RemoveRedundantRelations.apply(tu);

        let scc = tu.get::<SccGraph>();
        let ignored = weakly_ignored(tu.program(), &scc);
        adorn::run(tu.program_mut(), &ignored);
        tu.invalidate();

        RemoveRedundantRelations.apply(tu);

        magic_core::run(tu.program_mut());
        tu.invalidate();

        true
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::{Attribute, Relation, RelationQualifier};

    #[test]
    fn trivially_ignored_relations_are_input_or_ruleless() {
        let mut program = Program::new();
        let mut input = Relation::new(QualifiedName::from("edb"), vec![Attribute { name: "x".into(), type_name: "number".into() }]);
        input.qualifiers.insert(RelationQualifier::Input);
        program.relations.push(input);

        let ignored = trivially_ignored(&program);
        assert!(ignored.contains(&QualifiedName::from("edb")));
    }

    #[test]
    fn transformer_runs_when_target_configured() {
        let mut program = Program::new();
        let mut out = Relation::new(QualifiedName::from("Query"), vec![Attribute { name: "x".into(), type_name: "number".into() }]);
        out.qualifiers.insert(RelationQualifier::Output);
        program.relations.push(out);
        program.clauses.push(RuleBuilder::new("Query").head_vars(["x"]).body_atom("base", ["x"]).build());

        let mut config = GlobalConfig::default();
        config.magic_transform = "*".into();
        let mut tu = TranslationUnit::new(program);
        assert!(MagicSetTransformer::new(config).apply(&mut tu));
        assert!(tu.program().relation(&QualifiedName::from("@magic.Query.{f}")).is_some());
    }

    #[test]
    fn transformer_is_noop_without_configured_target() {
        let mut program = Program::new();
        let mut out = Relation::new(QualifiedName::from("Query"), vec![Attribute { name: "x".into(), type_name: "number".into() }]);
        out.qualifiers.insert(RelationQualifier::Output);
        program.relations.push(out);

        let mut tu = TranslationUnit::new(program);
        assert!(!MagicSetTransformer::new(GlobalConfig::default()).apply(&mut tu));
    }
}
