//! Transformer throughput benchmarks: clause minimisation and the magic-set
//! rewrite over synthetic linear-recursion programs of increasing size.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use flowlog_core::ast::builders::RuleBuilder;
use flowlog_core::ast::{Attribute, Program, QualifiedName, Relation, RelationQualifier};
use flowlog_core::config::GlobalConfig;
use flowlog_core::transform::magic_set::MagicSetTransformer;
use flowlog_core::transform::minimise_program::MinimiseProgram;
use flowlog_core::transform::Transformer;
use flowlog_core::TranslationUnit;
use std::time::Duration;

fn attr(name: &str) -> Attribute {
    Attribute { name: name.to_string(), type_name: QualifiedName::from("number") }
}

/// A chain of `size` mutually-duplicate relations, each with a base clause
/// and a recursive clause identical up to variable naming, so
/// `MinimiseProgram`'s bijective-equivalence pass has real merging work to
/// do, and a single output relation at the end of the chain for the
/// magic-set rewrite to specialise against.
fn linear_chain_program(size: u32) -> Program {
    let mut program = Program::new();

    let mut base = Relation::new(QualifiedName::from("base"), vec![attr("x"), attr("y")]);
    base.qualifiers.insert(RelationQualifier::Input);
    program.relations.push(base);

    for i in 0..size {
        let name = format!("path{i}");
        let mut relation = Relation::new(QualifiedName::from(name.as_str()), vec![attr("x"), attr("y")]);
        if i == size - 1 {
            relation.qualifiers.insert(RelationQualifier::Output);
        }
        program.relations.push(relation);

        program.clauses.push(RuleBuilder::new(name.as_str()).head_vars(["x", "y"]).body_atom("base", ["x", "y"]).build());
        program.clauses.push(
            RuleBuilder::new(name.as_str())
                .head_vars(["p", "q"])
                .body_atom("base", ["p", "r"])
                .body_atom(name.as_str(), ["r", "q"])
                .build(),
        );
        // A second, bijectively-equivalent copy under a renamed variable
        // scheme, so `MinimiseProgram` has a relation to fold away.
        program.clauses.push(
            RuleBuilder::new(name.as_str())
                .head_vars(["a", "b"])
                .body_atom("base", ["a", "c"])
                .body_atom(name.as_str(), ["c", "b"])
                .build(),
        );
    }
    program
}

fn bench_minimise_program(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimise_program");
    for size in [10u32, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || TranslationUnit::new(linear_chain_program(size)),
                |mut tu| MinimiseProgram.apply(&mut tu),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_magic_set_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("magic_set_transform");
    let mut config = GlobalConfig::default();
    config.magic_transform = "*".to_string();

    for size in [10u32, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || TranslationUnit::new(linear_chain_program(size)),
                |mut tu| MagicSetTransformer::new(config.clone()).apply(&mut tu),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_minimise_program, bench_magic_set_transform
}
criterion_main!(benches);
