//! Lowering-stage checks driven directly off a `TranslationUnit`, rather
//! than through the parser or the full `compile` driver, so a single
//! relation/clause shape can be checked against both translation
//! strategies side by side.

use flowlog_core::ast::builders::RuleBuilder;
use flowlog_core::ast::{Attribute, Program, QualifiedName, Relation, RelationQualifier, Representation};
use flowlog_core::ir::dump;
use flowlog_core::ir::lowering::provenance::ProvenanceTranslator;
use flowlog_core::ir::lowering::seminaive::SeminaiveTranslator;
use flowlog_core::ir::lowering::UnitTranslator;
use flowlog_core::ir::Statement;
use flowlog_core::TranslationUnit;

fn attr(name: &str) -> Attribute {
    Attribute { name: name.to_string(), type_name: QualifiedName::from("number") }
}

fn sample_program() -> Program {
    let mut program = Program::new();
    let mut edge = Relation::new(QualifiedName::from("edge"), vec![attr("x"), attr("y")]);
    edge.qualifiers.insert(RelationQualifier::Input);
    program.relations.push(edge);

    let mut reach = Relation::new(QualifiedName::from("reach"), vec![attr("x"), attr("y")]);
    reach.qualifiers.insert(RelationQualifier::Output);
    reach.representation = Representation::Btree;
    program.relations.push(reach);

    program.clauses.push(RuleBuilder::new("reach").head_vars(["x", "y"]).body_atom("edge", ["x", "y"]).build());
    program.clauses.push(
        RuleBuilder::new("reach")
            .head_vars(["x", "z"])
            .body_atom("edge", ["x", "y"])
            .body_atom("reach", ["y", "z"])
            .build(),
    );
    program
}

#[test]
fn relation_declarations_carry_representation_into_the_ram_program() {
    let tu = TranslationUnit::new(sample_program());
    let ram = SeminaiveTranslator.translate(&tu);
    let reach = ram.relations.iter().find(|r| r.name == "reach").expect("reach relation lowered");
    assert_eq!(reach.representation, Representation::Btree);
    assert_eq!(reach.arity, 2);
}

#[test]
fn seminaive_and_provenance_agree_on_which_relations_are_declared() {
    let tu = TranslationUnit::new(sample_program());
    let seminaive = SeminaiveTranslator.translate(&tu);
    let provenance = ProvenanceTranslator.translate(&tu);

    let mut seminaive_names: Vec<_> = seminaive.relations.iter().map(|r| r.name.clone()).collect();
    let mut provenance_names: Vec<_> = provenance.relations.iter().map(|r| r.name.clone()).collect();
    seminaive_names.sort();
    provenance_names.sort();
    assert_eq!(seminaive_names, provenance_names);

    // Only the provenance strategy emits explain/negation subroutines.
    assert!(seminaive.subroutines.is_empty());
    assert!(!provenance.subroutines.is_empty());
}

#[test]
fn dump_emits_a_loop_for_the_recursive_stratum() {
    let tu = TranslationUnit::new(sample_program());
    let ram = SeminaiveTranslator.translate(&tu);
    let Some(Statement::Sequence(stages)) = &ram.main else { panic!("expected top-level sequence") };
    assert!(stages.iter().any(|s| matches!(s, Statement::Loop(_))));

    let text = dump::dump(&ram);
    assert!(text.contains("Loop"));
    assert!(text.contains("reach"));
}

#[test]
fn empty_program_lowers_to_an_empty_ram_program() {
    let tu = TranslationUnit::new(Program::new());
    let ram = SeminaiveTranslator.translate(&tu);
    assert!(ram.relations.is_empty());
}
