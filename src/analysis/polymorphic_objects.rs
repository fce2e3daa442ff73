//! Thin facade over `type-analysis` exposing just the resolved-operator
//! queries that downstream transformers and the IR lowering stage need,
//! without exposing the full per-variable type lattice.

use crate::analysis::type_analysis::{ResolvedIntrinsic, TypeAnalysis, TypeClass};
use crate::translation_unit::{Analysis, TranslationUnit};

#[derive(Debug, Clone, Default)]
pub struct PolymorphicObjects {
    inner: TypeAnalysis,
}

impl PolymorphicObjects {
    #[must_use]
    pub fn resolved_operator(&self, clause_index: usize, visit_index: usize) -> Option<ResolvedIntrinsic> {
        self.inner.resolved_intrinsic(clause_index, visit_index)
    }

    #[must_use]
    pub fn variable_class(&self, clause_index: usize, variable: &str) -> TypeClass {
        self.inner.type_of(clause_index, variable)
    }

    #[must_use]
    pub fn ill_typed_functors(&self) -> &[String] {
        self.inner.ill_typed_functors()
    }
}

impl Analysis for PolymorphicObjects {
    fn name() -> &'static str {
        "polymorphic-objects"
    }

    fn compute(tu: &TranslationUnit) -> Self {
        PolymorphicObjects { inner: TypeAnalysis::compute(tu) }
    }
}
