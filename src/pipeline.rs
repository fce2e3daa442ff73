//! Assembles the standard transformer pipeline and drives a source string
//! through parse → check → rewrite → check → lower, short-circuiting
//! before lowering whenever a checker recorded an error. Mirrors
//! `original_source/src/ast2ram/UnitTranslator.h`'s `translateUnit` driver
//! loop, minus its exception-based abort — diagnostics accumulate in
//! `ErrorReport` instead, per §7.

use crate::config::{GlobalConfig, ProvenanceMode};
use crate::error::{DiagnosticKind, ErrorReport};
use crate::ir::lowering::provenance::ProvenanceTranslator;
use crate::ir::lowering::seminaive::SeminaiveTranslator;
use crate::ir::lowering::UnitTranslator;
use crate::ir::RamProgram;
use crate::parser::parse_program;
use crate::transform::component_checker::ComponentChecker;
use crate::transform::component_instantiation::ComponentInstantiationTransformer;
use crate::transform::expand_eqrels::ExpandEqrels;
use crate::transform::fold_anonymous_records::FoldAnonymousRecords;
use crate::transform::ground_witnesses::GroundWitnesses;
use crate::transform::inline_relations::InlineRelations;
use crate::transform::io_defaults::IODefaults;
use crate::transform::magic_set::MagicSetTransformer;
use crate::transform::minimise_program::MinimiseProgram;
use crate::transform::pragma_checker::PragmaChecker;
use crate::transform::reduce_existentials::ReduceExistentials;
use crate::transform::remove_boolean_constraints::RemoveBooleanConstraints;
use crate::transform::remove_empty_relations::RemoveEmptyRelations;
use crate::transform::remove_redundant_relations::RemoveRedundantRelations;
use crate::transform::remove_relation_copies::RemoveRelationCopies;
use crate::transform::replace_singleton_variables::ReplaceSingletonVariables;
use crate::transform::resolve_aliases::ResolveAliasesTransformer;
use crate::transform::resolve_anonymous_record_aliases::ResolveAnonymousRecordAliases;
use crate::transform::semantic_checker::SemanticChecker;
use crate::transform::simplify_aggregate_target_expression::SimplifyAggregateTargetExpression;
use crate::transform::{disable_by_name, DebugReporter, Fixpoint, Sequence, Transformer};
use crate::translation_unit::{DebugReport, TranslationUnit};

/// Everything a single compile-and-lower run produces.
pub struct CompileOutcome {
    pub errors: ErrorReport,
    pub debug_report: DebugReport,
    pub ram: Option<RamProgram>,
}

impl CompileOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.ram.is_some()
    }
}

fn disable(config: &GlobalConfig, transformer: Box<dyn Transformer>) -> Box<dyn Transformer> {
    disable_by_name(transformer, &config.disabled_transformers())
}

/// Runs before any rewrite: component well-formedness, then pragma
/// absorption into `config` (pragmas may in turn gate later stages, so
/// this has to land before the rewrite pipeline is even assembled).
fn validate_components_and_pragmas(tu: &mut TranslationUnit, config: &mut GlobalConfig) {
    ComponentChecker.apply(tu);
    let pragma_checker = PragmaChecker::new(Vec::new());
    pragma_checker.apply(tu);
    for (key, value) in pragma_checker.applied_pragmas() {
        apply_pragma_to_config(config, &key, &value);
    }
}

fn apply_pragma_to_config(config: &mut GlobalConfig, key: &str, value: &str) {
    match key {
        "magic-transform" => config.magic_transform = value.to_string(),
        "magic-transform-exclude" => config.magic_transform_exclude = value.to_string(),
        "inline-exclude" => config.inline_exclude = value.to_string(),
        "disable-transformers" => config.disable_transformers = value.to_string(),
        "provenance" => {
            config.provenance = match value {
                "explain" => Some(ProvenanceMode::Explain),
                "explore" => Some(ProvenanceMode::Explore),
                _ => config.provenance,
            }
        }
        _ => {}
    }
}

/// The rewrite pipeline proper: component expansion, alias/normalisation
/// passes, the optimisation family, magic-set specialisation, then I/O
/// default filling. Each disableable leaf is wrapped with
/// `disable_by_name` so `config.disable_transformers` can silence it;
/// `ResolveAliasesTransformer` is never wrapped, matching its
/// non-disableable contract. It also runs more than once, interleaved with
/// the record-alias/fold and boolean-constraint/inlining passes, mirroring
/// `original_source/src/main.cpp`'s own main pipeline: each of those passes
/// synthesises fresh variable-to-variable aliases (record folding turns a
/// record equality into per-field variable equalities; inlining lifts a
/// defining clause's body wholesale into the caller) that only
/// `ResolveAliasesTransformer` itself knows how to substitute away.
fn rewrite_pipeline(config: &GlobalConfig) -> Box<dyn Transformer> {
    Box::new(Sequence::new(
        "RewritePipeline",
        vec![
            disable(config, Box::new(ComponentInstantiationTransformer)),
            disable(config, Box::new(ResolveAnonymousRecordAliases)),
            disable(config, Box::new(FoldAnonymousRecords)),
            Box::new(ResolveAliasesTransformer),
            disable(config, Box::new(RemoveBooleanConstraints)),
            Box::new(ResolveAliasesTransformer),
            disable(config, Box::new(ReplaceSingletonVariables)),
            disable(config, Box::new(RemoveRelationCopies)),
            disable(config, Box::new(RemoveEmptyRelations)),
            disable(config, Box::new(RemoveRedundantRelations)),
            disable(config, Box::new(ExpandEqrels)),
            disable(config, Box::new(ReduceExistentials)),
            disable(config, Box::new(SimplifyAggregateTargetExpression)),
            disable(config, Box::new(GroundWitnesses)),
            disable(config, Box::new(MinimiseProgram)),
            disable(config, Box::new(Fixpoint::new(Box::new(InlineRelations)))),
            Box::new(ResolveAliasesTransformer),
            disable(config, Box::new(MinimiseProgram)),
            disable(config, Box::new(MagicSetTransformer::new(config.clone()))),
            disable(config, Box::new(IODefaults::new(config.clone()))),
        ],
    ))
}

fn select_translator(config: &GlobalConfig) -> Box<dyn UnitTranslator> {
    match config.provenance {
        Some(ProvenanceMode::Explain) | Some(ProvenanceMode::Explore) => Box::new(ProvenanceTranslator),
        None => Box::new(SeminaiveTranslator),
    }
}

/// Parses `source`, runs it through the full checker/rewrite/lowering
/// pipeline, and returns everything the driver needs to report. Lowering
/// is skipped (`ram` is `None`) whenever the checkers recorded an error —
/// running a lowering pass over an ill-formed program would just produce
/// diagnostics-shaped garbage.
#[must_use]
pub fn compile(source: &str, config: &GlobalConfig) -> CompileOutcome {
    let program = match parse_program(source) {
        Ok(program) => program,
        Err(err) => {
            let mut errors = ErrorReport::new();
            errors.error(DiagnosticKind::ParseError(err.to_string()), None);
            return CompileOutcome { errors, debug_report: DebugReport::default(), ram: None };
        }
    };

    let mut tu = TranslationUnit::new(program);
    let mut config = config.clone();
    validate_components_and_pragmas(&mut tu, &mut config);

    if tu.errors.num_errors() > 0 {
        return CompileOutcome { errors: tu.errors, debug_report: tu.debug_report, ram: None };
    }

    let rewrite = rewrite_pipeline(&config);
    if config.debug_report.is_some() {
        DebugReporter::new(rewrite).apply(&mut tu);
    } else {
        rewrite.apply(&mut tu);
    }

    SemanticChecker.apply(&mut tu);

    if tu.errors.num_errors() > 0 {
        return CompileOutcome { errors: tu.errors, debug_report: tu.debug_report, ram: None };
    }

    let ram = select_translator(&config).translate(&tu);
    CompileOutcome { errors: tu.errors, debug_report: tu.debug_report, ram: Some(ram) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_non_recursive_program_to_ram() {
        let source = ".decl edge(x:number,y:number)\n.decl reach(x:number,y:number) output\nreach(x,y) :- edge(x,y).";
        let outcome = compile(source, &GlobalConfig::default());
        assert!(outcome.succeeded(), "errors: {:?}", outcome.errors.diagnostics());
        let ram = outcome.ram.unwrap();
        assert!(ram.relations.iter().any(|r| r.name == "reach"));
    }

    #[test]
    fn directive_on_undeclared_relation_short_circuits_before_lowering() {
        let source = ".output missing.";
        let outcome = compile(source, &GlobalConfig::default());
        assert!(!outcome.succeeded());
        assert!(outcome.errors.num_errors() > 0);
    }

    #[test]
    fn parse_error_is_reported_without_a_translation_unit() {
        let outcome = compile(".decl R(x:number\nR(1).", &GlobalConfig::default());
        assert!(!outcome.succeeded());
        assert_eq!(outcome.errors.num_errors(), 1);
    }

    #[test]
    fn magic_transform_pragma_enables_the_magic_set_stage() {
        let source = ".pragma magic-transform \"*\"\n.decl base(x:number)\n.decl Query(x:number) output\nQuery(x) :- base(x).";
        let outcome = compile(source, &GlobalConfig::default());
        assert!(outcome.succeeded(), "errors: {:?}", outcome.errors.diagnostics());
        let ram = outcome.ram.unwrap();
        assert!(ram.relations.iter().any(|r| r.name.starts_with("@magic.")));
    }
}
