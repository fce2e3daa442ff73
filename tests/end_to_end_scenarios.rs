//! Source-to-RAM scenarios driven entirely through the public `compile`
//! entry point, exercising the parser, the rewrite pipeline, the semantic
//! checker, and IR lowering together rather than any one stage in isolation.

use flowlog_core::config::GlobalConfig;
use flowlog_core::ir::dump;
use flowlog_core::pipeline::compile;

#[test]
fn transitive_closure_lowers_to_a_recursive_ram_program() {
    let source = "
        .decl edge(x:number, y:number)
        .decl reach(x:number, y:number) output
        reach(x,y) :- edge(x,y).
        reach(x,z) :- edge(x,y), reach(y,z).
    ";
    let outcome = compile(source, &GlobalConfig::default());
    assert!(outcome.succeeded(), "{:?}", outcome.errors.diagnostics());
    let ram = outcome.ram.unwrap();
    assert!(ram.relations.iter().any(|r| r.name == "reach"));
    assert!(ram.relations.iter().any(|r| r.name == "edge"));
    let dumped = dump::dump(&ram);
    assert!(dumped.contains("reach"));
}

#[test]
fn negation_and_constraint_survive_the_full_pipeline() {
    let source = "
        .decl node(x:number)
        .decl excluded(x:number)
        .decl kept(x:number) output
        kept(x) :- node(x), !excluded(x), x != 0.
    ";
    let outcome = compile(source, &GlobalConfig::default());
    assert!(outcome.succeeded(), "{:?}", outcome.errors.diagnostics());
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
    let source = ".decl R(x:number)\nR(x) :- ,.";
    let outcome = compile(source, &GlobalConfig::default());
    assert!(!outcome.succeeded());
    assert!(outcome.errors.num_errors() > 0);
}

#[test]
fn inline_relation_is_expanded_away_before_lowering() {
    let source = "
        .decl small(x:number) inline
        .decl result(x:number) output
        small(1).
        small(2).
        result(y) :- small(y).
    ";
    let outcome = compile(source, &GlobalConfig::default());
    assert!(outcome.succeeded(), "{:?}", outcome.errors.diagnostics());
}

#[test]
fn magic_transform_pragma_drives_a_specialised_program_through_lowering() {
    let source = "
        .pragma magic-transform \"*\"
        .decl base(x:number, y:number)
        .decl path(x:number, y:number) output
        path(x,y) :- base(x,y).
        path(x,z) :- base(x,y), path(y,z).
    ";
    let outcome = compile(source, &GlobalConfig::default());
    assert!(outcome.succeeded(), "{:?}", outcome.errors.diagnostics());
    let ram = outcome.ram.unwrap();
    assert!(ram.relations.iter().any(|r| r.name.contains("magic")));
}

#[test]
fn provenance_pragma_selects_the_provenance_translator() {
    let source = "
        .pragma provenance \"explain\"
        .decl edge(x:number, y:number)
        .decl reach(x:number, y:number) output
        reach(x,y) :- edge(x,y).
        reach(x,z) :- edge(x,y), reach(y,z).
    ";
    let outcome = compile(source, &GlobalConfig::default());
    assert!(outcome.succeeded(), "{:?}", outcome.errors.diagnostics());
    let ram = outcome.ram.unwrap();
    assert!(!ram.subroutines.is_empty(), "provenance lowering should emit explain subroutines");
}

#[test]
fn component_instantiation_is_resolved_before_checking() {
    let source = "
        .comp Graph<T> = {
            .decl edge(x:T, y:T)
            .decl reach(x:T, y:T) output
            reach(x,y) :- edge(x,y).
            reach(x,z) :- edge(x,y), reach(y,z).
        }
        .init g = Graph<number>.
    ";
    let outcome = compile(source, &GlobalConfig::default());
    assert!(outcome.succeeded(), "{:?}", outcome.errors.diagnostics());
}
