//! Partitions relations into input / output / printsize / limitsize sets by
//! scanning directive nodes, mirroring how `relation.rs`'s qualifiers are
//! themselves just cached directive information.

use crate::ast::{DirectiveKind, QualifiedName};
use crate::translation_unit::{Analysis, TranslationUnit};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct IoType {
    inputs: BTreeSet<QualifiedName>,
    outputs: BTreeSet<QualifiedName>,
    printsizes: BTreeSet<QualifiedName>,
    limitsizes: BTreeMap<QualifiedName, i64>,
}

impl IoType {
    #[must_use]
    pub fn is_input(&self, rel: &QualifiedName) -> bool {
        self.inputs.contains(rel)
    }

    #[must_use]
    pub fn is_output(&self, rel: &QualifiedName) -> bool {
        self.outputs.contains(rel)
    }

    #[must_use]
    pub fn is_printsize(&self, rel: &QualifiedName) -> bool {
        self.printsizes.contains(rel)
    }

    #[must_use]
    pub fn limitsize(&self, rel: &QualifiedName) -> Option<i64> {
        self.limitsizes.get(rel).copied()
    }

    #[must_use]
    pub fn inputs(&self) -> &BTreeSet<QualifiedName> {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &BTreeSet<QualifiedName> {
        &self.outputs
    }
}

impl Analysis for IoType {
    fn name() -> &'static str {
        "io-type"
    }

    fn compute(tu: &TranslationUnit) -> Self {
        let mut io = IoType::default();
        for directive in &tu.program().directives {
            match directive.kind {
                DirectiveKind::Input => {
                    io.inputs.insert(directive.relation.clone());
                }
                DirectiveKind::Output => {
                    io.outputs.insert(directive.relation.clone());
                }
                DirectiveKind::Printsize => {
                    io.printsizes.insert(directive.relation.clone());
                }
                DirectiveKind::Limitsize => {
                    if let Some(n) = directive.get("n").and_then(|v| v.parse::<i64>().ok()) {
                        io.limitsizes.insert(directive.relation.clone(), n);
                    }
                }
            }
        }
        // `.decl` qualifiers are an alternate surface for the same
        // input/output/printsize facts; fold them in so IoType is complete
        // even before `IoDefaultsTransformer` has materialised directives.
        for relation in &tu.program().relations {
            if relation.is_input() {
                io.inputs.insert(relation.name.clone());
            }
            if relation.has_qualifier(crate::ast::RelationQualifier::Output) {
                io.outputs.insert(relation.name.clone());
            }
            if relation.has_qualifier(crate::ast::RelationQualifier::Printsize) {
                io.printsizes.insert(relation.name.clone());
            }
        }
        io
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Directive, Program};

    #[test]
    fn limitsize_parameter_is_captured_as_integer() {
        let mut program = Program::new();
        let mut directive = Directive::new(DirectiveKind::Limitsize, QualifiedName::from("r"));
        directive.set("n", "42");
        program.directives.push(directive);
        let tu = TranslationUnit::new(program);
        let io = IoType::compute(&tu);
        assert_eq!(io.limitsize(&QualifiedName::from("r")), Some(42));
    }

    #[test]
    fn printsize_counts_as_output() {
        let mut program = Program::new();
        program.directives.push(Directive::new(DirectiveKind::Printsize, QualifiedName::from("r")));
        let tu = TranslationUnit::new(program);
        let io = IoType::compute(&tu);
        assert!(io.is_printsize(&QualifiedName::from("r")));
    }
}
