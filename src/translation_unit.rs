//! Owns the `Program`, the diagnostic sink, and a lazily-populated,
//! typed-key analysis cache.

use crate::ast::Program;
use crate::error::ErrorReport;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Before/after program snapshots recorded by `DebugReporter`; out of scope
/// for HTML rendering (an external collaborator per `spec.md` §1) but kept
/// as plain text so tests can assert a transformer actually ran.
#[derive(Debug, Clone, Default)]
pub struct DebugReport {
    sections: Vec<(String, String)>,
}

impl DebugReport {
    pub fn push_section(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.sections.push((title.into(), body.into()));
    }

    #[must_use]
    pub fn sections(&self) -> &[(String, String)] {
        &self.sections
    }
}

/// Analyses are pure functions of the current `Program`: `compute` must not
/// observe anything besides the `TranslationUnit` it is given, and must not
/// mutate the `Program`.
pub trait Analysis: Any {
    fn name() -> &'static str
    where
        Self: Sized;

    fn compute(tu: &TranslationUnit) -> Self
    where
        Self: Sized;
}

#[derive(Default)]
struct AnalysisCache {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnalysisCache {{ {} cached }}", self.entries.len())
    }
}

pub struct TranslationUnit {
    program: Program,
    pub errors: ErrorReport,
    pub debug_report: DebugReport,
    cache: AnalysisCache,
}

impl TranslationUnit {
    #[must_use]
    pub fn new(program: Program) -> Self {
        TranslationUnit {
            program,
            errors: ErrorReport::new(),
            debug_report: DebugReport::default(),
            cache: AnalysisCache::default(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// Creation is deterministic and side-effect-free: the first `get::<A>()`
    /// runs `A::compute` and caches the result; subsequent calls return the
    /// cached value without recomputing.
    pub fn get<A: Analysis + Clone + 'static>(&mut self) -> A {
        let type_id = TypeId::of::<A>();
        if !self.cache.entries.contains_key(&type_id) {
            tracing::debug!(analysis = A::name(), "computing analysis");
            let computed = A::compute(self);
            self.cache.entries.insert(type_id, Box::new(computed));
        }
        self.cache
            .entries
            .get(&type_id)
            .and_then(|boxed| boxed.downcast_ref::<A>())
            .cloned()
            .expect("analysis cache entry has the wrong type for its TypeId")
    }

    /// Drops every cached analysis. Called whenever a transformer reports a
    /// structural change that could affect them.
    pub fn invalidate(&mut self) {
        tracing::trace!("invalidating analysis cache");
        self.cache.entries.clear();
    }
}

impl fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("program", &self.program)
            .field("errors", &self.errors.num_errors())
            .field("cache", &self.cache)
            .finish()
    }
}
