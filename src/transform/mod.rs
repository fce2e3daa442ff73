//! The transformer framework: a `Transformer` is a named, cloneable
//! rewrite step over a [`TranslationUnit`] that reports whether it changed
//! the `Program`. Meta-transformers compose concrete transformers into the
//! standard pipeline without any of them needing to know about scheduling.

pub mod component_checker;
pub mod component_instantiation;
pub mod expand_eqrels;
pub mod fold_anonymous_records;
pub mod ground_witnesses;
pub mod inline_relations;
pub mod io_defaults;
pub mod magic_set;
pub mod minimise_program;
pub mod pragma_checker;
pub mod reduce_existentials;
pub mod remove_boolean_constraints;
pub mod remove_empty_relations;
pub mod remove_redundant_relations;
pub mod remove_relation_copies;
pub mod replace_singleton_variables;
pub mod resolve_aliases;
pub mod resolve_anonymous_record_aliases;
pub mod semantic_checker;
pub mod simplify_aggregate_target_expression;

use crate::translation_unit::TranslationUnit;

/// Every concrete and meta transformer implements this. `apply` returns
/// whether the `Program` changed; callers use that to decide whether to
/// invalidate the analysis cache and whether to keep iterating.
pub trait Transformer {
    fn name(&self) -> &str;
    fn apply(&self, tu: &mut TranslationUnit) -> bool;
    fn clone_box(&self) -> Box<dyn Transformer>;
}

impl Clone for Box<dyn Transformer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Runs each child in turn; the result is the *last* child's flag, not an
/// aggregate — later transformers in a sequence are authoritative about
/// whether the pipeline needs another round.
pub struct Sequence {
    name: String,
    children: Vec<Box<dyn Transformer>>,
}

impl Sequence {
    #[must_use]
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Transformer>>) -> Self {
        Sequence { name: name.into(), children }
    }
}

impl Transformer for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        for child in &self.children {
            changed = child.apply(tu);
        }
        changed
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(Sequence { name: self.name.clone(), children: self.children.iter().map(|c| c.clone_box()).collect() })
    }
}

/// Runs each child in turn; the result is the logical OR of every flag.
pub struct Pipeline {
    name: String,
    children: Vec<Box<dyn Transformer>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Transformer>>) -> Self {
        Pipeline { name: name.into(), children }
    }
}

impl Transformer for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        for child in &self.children {
            changed |= child.apply(tu);
        }
        changed
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(Pipeline { name: self.name.clone(), children: self.children.iter().map(|c| c.clone_box()).collect() })
    }
}

/// Repeats its child until it returns false. Result is true iff the child
/// ran productively at least once.
pub struct Fixpoint {
    inner: Box<dyn Transformer>,
}

impl Fixpoint {
    #[must_use]
    pub fn new(inner: Box<dyn Transformer>) -> Self {
        Fixpoint { inner }
    }
}

impl Transformer for Fixpoint {
    fn name(&self) -> &str {
        "Fixpoint"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut ever_changed = false;
        while self.inner.apply(tu) {
            ever_changed = true;
        }
        ever_changed
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(Fixpoint { inner: self.inner.clone_box() })
    }
}

/// Same semantics as `Fixpoint`, plus an iteration counter a driver can
/// surface for diagnostics.
pub struct Loop {
    inner: Box<dyn Transformer>,
    iterations: std::cell::Cell<u32>,
}

impl Loop {
    #[must_use]
    pub fn new(inner: Box<dyn Transformer>) -> Self {
        Loop { inner, iterations: std::cell::Cell::new(0) }
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }
}

impl Transformer for Loop {
    fn name(&self) -> &str {
        "Loop"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut ever_changed = false;
        let mut count = 0;
        while self.inner.apply(tu) {
            ever_changed = true;
            count += 1;
        }
        self.iterations.set(count);
        ever_changed
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(Loop { inner: self.inner.clone_box(), iterations: std::cell::Cell::new(0) })
    }
}

/// Runs its child iff `pred(tu)` holds at apply-time.
pub struct Conditional {
    pred: fn(&TranslationUnit) -> bool,
    inner: Box<dyn Transformer>,
}

impl Conditional {
    #[must_use]
    pub fn new(pred: fn(&TranslationUnit) -> bool, inner: Box<dyn Transformer>) -> Self {
        Conditional { pred, inner }
    }
}

impl Transformer for Conditional {
    fn name(&self) -> &str {
        "Conditional"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        if (self.pred)(tu) {
            self.inner.apply(tu)
        } else {
            false
        }
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(Conditional { pred: self.pred, inner: self.inner.clone_box() })
    }
}

/// Repeats its child while `pred(tu)` holds, re-checking before every run.
pub struct While {
    pred: fn(&TranslationUnit) -> bool,
    inner: Box<dyn Transformer>,
}

impl While {
    #[must_use]
    pub fn new(pred: fn(&TranslationUnit) -> bool, inner: Box<dyn Transformer>) -> Self {
        While { pred, inner }
    }
}

impl Transformer for While {
    fn name(&self) -> &str {
        "While"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let mut changed = false;
        while (self.pred)(tu) {
            changed |= self.inner.apply(tu);
        }
        changed
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(While { pred: self.pred, inner: self.inner.clone_box() })
    }
}

/// Always reports no change; the substitute `disableTransformers` installs
/// in place of a disabled transformer.
#[derive(Clone)]
pub struct Null;

impl Transformer for Null {
    fn name(&self) -> &str {
        "Null"
    }

    fn apply(&self, _tu: &mut TranslationUnit) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(Null)
    }
}

/// Wraps a child transformer with a before/after program snapshot recorded
/// into the `TranslationUnit`'s `DebugReport`.
pub struct DebugReporter {
    inner: Box<dyn Transformer>,
}

impl DebugReporter {
    #[must_use]
    pub fn new(inner: Box<dyn Transformer>) -> Self {
        DebugReporter { inner }
    }
}

impl Transformer for DebugReporter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let before = format!("{:#?}", tu.program());
        let start = std::time::Instant::now();
        let changed = self.inner.apply(tu);
        let elapsed = start.elapsed();
        let after = format!("{:#?}", tu.program());
        let body = if changed {
            format!("changed=true elapsed={elapsed:?}\n--- before ---\n{before}\n--- after ---\n{after}")
        } else {
            format!("changed=false elapsed={elapsed:?}")
        };
        tu.debug_report.push_section(self.inner.name().to_string(), body);
        changed
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(DebugReporter { inner: self.inner.clone_box() })
    }
}

/// Recursively replaces any transformer whose name is in `names` with
/// [`Null`]. Transformers that opt out of disabling (`ResolveAliasesTransformer`)
/// must check this themselves before being wrapped — there is no way to
/// special-case a name from the outside once it has already been boxed, so
/// the driver is expected to never pass non-disableable names into `names`.
#[must_use]
pub fn disable_by_name(transformer: Box<dyn Transformer>, names: &[&str]) -> Box<dyn Transformer> {
    if names.iter().any(|n| *n == transformer.name()) {
        Box::new(Null)
    } else {
        transformer
    }
}
