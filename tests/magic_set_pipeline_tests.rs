//! Exercises `MagicSetTransformer` as a whole (normalise -> label -> adorn ->
//! magic-core) against hand-built programs, checking the synthetic names
//! each stage mints rather than re-testing any one stage's internals (those
//! already have their own unit tests alongside the stage).

use flowlog_core::ast::builders::RuleBuilder;
use flowlog_core::ast::{Argument, Attribute, Literal, Program, QualifiedName, Relation, RelationQualifier};
use flowlog_core::config::GlobalConfig;
use flowlog_core::transform::magic_set::MagicSetTransformer;
use flowlog_core::transform::Transformer;
use flowlog_core::TranslationUnit;

fn attr(name: &str) -> Attribute {
    Attribute { name: name.to_string(), type_name: QualifiedName::from("number") }
}

#[test]
fn linear_recursion_under_a_bound_query_specialises_through_every_stage() {
    // base(x,y). path(x,y) :- base(x,y). path(x,z) :- base(x,y), path(y,z).
    // Queried under a fully-bound pattern (simulated here as an output
    // relation with a wildcard magic-transform target), so the adornment
    // seed is all-free per the adorn stage's own contract, and every
    // reachable relation ends up adorned and magic-qualified.
    let mut program = Program::new();

    let mut base = Relation::new(QualifiedName::from("base"), vec![attr("x"), attr("y")]);
    base.qualifiers.insert(RelationQualifier::Input);
    program.relations.push(base);

    let mut path = Relation::new(QualifiedName::from("path"), vec![attr("x"), attr("y")]);
    path.qualifiers.insert(RelationQualifier::Output);
    program.relations.push(path);

    program.clauses.push(RuleBuilder::new("path").head_vars(["x", "y"]).body_atom("base", ["x", "y"]).build());
    program.clauses.push(
        RuleBuilder::new("path")
            .head_vars(["x", "z"])
            .body_atom("base", ["x", "y"])
            .body_atom("path", ["y", "z"])
            .build(),
    );

    let mut config = GlobalConfig::default();
    config.magic_transform = "*".to_string();
    let mut tu = TranslationUnit::new(program);

    assert!(MagicSetTransformer::new(config).apply(&mut tu));

    let program = tu.program();
    // Adornment seeds `path` all-free, since it's the only output relation.
    assert!(program.relation(&QualifiedName::from("path.{ff}")).is_some());
    // The magic relation for the all-free adornment is also all-free.
    assert!(program.relation(&QualifiedName::from("@magic.path.{ff}")).is_some());
    // A magic rule exists deriving the magic relation for the recursive call.
    assert!(program
        .clauses
        .iter()
        .any(|c| c.head.name == QualifiedName::from("@magic.path.{ff}")));
    // Every refined `path.{ff}` clause now starts with its magic atom.
    for clause in program.clauses_for(&QualifiedName::from("path.{ff}")) {
        assert!(matches!(
            &clause.body[0],
            Literal::Atom(atom) if atom.name == QualifiedName::from("@magic.path.{ff}")
        ));
    }
}

#[test]
fn negated_dependency_is_negatively_labelled_before_adornment() {
    // excluded(x) :- fact(x). kept(x) :- base(x), !excluded(x).
    let mut program = Program::new();
    let mut kept = Relation::new(QualifiedName::from("kept"), vec![attr("x")]);
    kept.qualifiers.insert(RelationQualifier::Output);
    program.relations.push(kept);

    program.clauses.push(RuleBuilder::new("excluded").head_vars(["x"]).body_atom("fact", ["x"]).build());
    program.clauses.push(
        RuleBuilder::new("kept").head_vars(["x"]).body_atom("base", ["x"]).negated_atom("excluded", ["x"]).build(),
    );

    let mut config = GlobalConfig::default();
    config.magic_transform = "kept".to_string();
    let mut tu = TranslationUnit::new(program);

    assert!(MagicSetTransformer::new(config).apply(&mut tu));

    let program = tu.program();
    assert!(program
        .clauses
        .iter()
        .flat_map(|c| c.negated_body_atoms())
        .any(|atom| atom.name.to_dotted_string().starts_with("@neglabel.excluded")));
}

#[test]
fn relation_explicitly_excluded_from_magic_transform_is_untouched() {
    let mut program = Program::new();
    let mut query = Relation::new(QualifiedName::from("query"), vec![attr("x")]);
    query.qualifiers.insert(RelationQualifier::Output);
    program.relations.push(query);
    program.clauses.push(RuleBuilder::new("query").head_vars(["x"]).body_atom("base", ["x"]).build());

    let mut config = GlobalConfig::default();
    config.magic_transform = "*".to_string();
    config.magic_transform_exclude = "query".to_string();
    let mut tu = TranslationUnit::new(program);

    // No relation is magic-qualified and `query` itself is excluded, so the
    // transformer has nothing to seed adornment from and is a no-op.
    assert!(!MagicSetTransformer::new(config).apply(&mut tu));
}

#[test]
fn counter_argument_marks_its_whole_clause_weakly_ignored() {
    use flowlog_core::ast::{Atom, Clause};

    // A clause using `Argument::Counter` in a head position must never be
    // adorned, since re-evaluating it under a magic-restricted binding
    // pattern would change how many fresh counter values it produces.
    let mut program = Program::new();
    let mut out = Relation::new(QualifiedName::from("numbered"), vec![attr("x"), attr("n")]);
    out.qualifiers.insert(RelationQualifier::Output);
    program.relations.push(out);
    program.clauses.push(Clause::new(
        Atom::new(QualifiedName::from("numbered"), vec![Argument::var("x"), Argument::Counter]),
        vec![Literal::Atom(Atom::new(QualifiedName::from("base"), vec![Argument::var("x")]))],
    ));

    let mut config = GlobalConfig::default();
    config.magic_transform = "*".to_string();
    let mut tu = TranslationUnit::new(program);
    MagicSetTransformer::new(config).apply(&mut tu);

    assert!(tu.program().relation(&QualifiedName::from("numbered.{ff}")).is_none());
}
