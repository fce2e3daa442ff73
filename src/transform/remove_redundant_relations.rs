//! Deletes relations not reachable, in the precedence graph, from any
//! output or printsize relation — they can never influence an observable
//! result.

use crate::analysis::PrecedenceGraph;
use crate::ast::QualifiedName;
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::{HashSet, VecDeque};

fn reachable_from_outputs(program: &crate::ast::Program, graph: &PrecedenceGraph) -> HashSet<QualifiedName> {
    let mut seen: HashSet<QualifiedName> = HashSet::new();
    let mut queue: VecDeque<QualifiedName> =
        program.relations.iter().filter(|r| r.is_output()).map(|r| r.name.clone()).collect();
    for start in &queue {
        seen.insert(start.clone());
    }
    while let Some(current) = queue.pop_front() {
        for dependency in graph.predecessors(&current) {
            if seen.insert(dependency.clone()) {
                queue.push_back(dependency);
            }
        }
    }
    seen
}

#[derive(Clone)]
pub struct RemoveRedundantRelations;

impl Transformer for RemoveRedundantRelations {
    fn name(&self) -> &str {
        "RemoveRedundantRelations"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let graph = tu.get::<PrecedenceGraph>();
        let live = reachable_from_outputs(tu.program(), &graph);
        let dead: HashSet<QualifiedName> = tu
            .program()
            .relations
            .iter()
            .filter(|r| !live.contains(&r.name) && !r.is_input())
            .map(|r| r.name.clone())
            .collect();
        if dead.is_empty() {
            return false;
        }
        let program = tu.program_mut();
        program.relations.retain(|r| !dead.contains(&r.name));
        program.clauses.retain(|c| !dead.contains(&c.head.name));
        program.directives.retain(|d| !dead.contains(&d.relation));
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
    use crate::ast::{Attribute, Program, Relation, RelationQualifier};

    #[test]
    fn relation_unreachable_from_output_is_removed() {
        let mut program = Program::new();
        let mut output = Relation::new(
            QualifiedName::from("out"),
            vec![Attribute { name: "x".into(), type_name: "number".into() }],
        );
        output.qualifiers.insert(RelationQualifier::Output);
        program.relations.push(output);
        program.relations.push(Relation::new(
            QualifiedName::from("unused"),
            vec![Attribute { name: "x".into(), type_name: "number".into() }],
        ));
        program.clauses.push(RuleBuilder::new("out").head_vars(["x"]).body_atom("base", ["x"]).build());
        let mut tu = TranslationUnit::new(program);
        assert!(RemoveRedundantRelations.apply(&mut tu));
        assert!(tu.program().relation(&QualifiedName::from("unused")).is_none());
    }
}
