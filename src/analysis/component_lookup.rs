//! Scoped component name resolution: for a lookup made from inside some
//! nested `.comp`, resolves a referenced component name under the current
//! [`TypeBinding`], walking outward through enclosing component scopes and
//! falling back to the global (file-level) scope.

use crate::ast::{Component, QualifiedName, TypeBinding};
use crate::translation_unit::{Analysis, TranslationUnit};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct ComponentLookup {
    /// Scope path (dot-joined enclosing component names, empty = global) ->
    /// simple component name -> its declaration.
    by_scope: BTreeMap<QualifiedName, BTreeMap<String, Component>>,
    parent_scope: BTreeMap<QualifiedName, QualifiedName>,
}

impl ComponentLookup {
    /// Resolves `name` (rewritten through `binding` first) starting at
    /// `scope`, then each enclosing scope in turn, then the global scope.
    #[must_use]
    pub fn resolve(&self, scope: &QualifiedName, name: &QualifiedName, binding: &TypeBinding) -> Option<&Component> {
        let resolved_name = binding.resolve(name);
        let key = resolved_name.to_dotted_string();
        let mut current = scope.clone();
        loop {
            if let Some(found) = self.by_scope.get(&current).and_then(|m| m.get(&key)) {
                return Some(found);
            }
            if current.is_empty() {
                return None;
            }
            current = self.parent_scope.get(&current).cloned().unwrap_or_else(QualifiedName::empty);
        }
    }

    #[must_use]
    pub fn components_in_scope(&self, scope: &QualifiedName) -> impl Iterator<Item = &Component> {
        self.by_scope.get(scope).into_iter().flat_map(|m| m.values())
    }

    fn insert(&mut self, scope: &QualifiedName, component: &Component) {
        self.by_scope
            .entry(scope.clone())
            .or_default()
            .insert(component.name.to_dotted_string(), component.clone());
        let nested_scope = scope.append(component.name.to_dotted_string());
        self.parent_scope.insert(nested_scope.clone(), scope.clone());
        for inner in &component.components {
            self.insert(&nested_scope, inner);
        }
    }
}

impl Analysis for ComponentLookup {
    fn name() -> &'static str {
        "component-lookup"
    }

    fn compute(tu: &TranslationUnit) -> Self {
        let mut lookup = ComponentLookup::default();
        let global = QualifiedName::empty();
        for component in &tu.program().components {
            lookup.insert(&global, component);
        }
        lookup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;

    #[test]
    fn nested_component_resolves_outward_to_global() {
        let mut outer = Component::new(QualifiedName::from("Outer"));
        let inner = Component::new(QualifiedName::from("Inner"));
        outer.components.push(inner);
        let sibling = Component::new(QualifiedName::from("Sibling"));

        let mut program = Program::new();
        program.components.push(outer);
        program.components.push(sibling);
        let tu = TranslationUnit::new(program);

        let lookup = ComponentLookup::compute(&tu);
        let binding = TypeBinding::new();
        let outer_scope = QualifiedName::from("Outer");

        assert!(lookup.resolve(&outer_scope, &QualifiedName::from("Inner"), &binding).is_some());
        assert!(lookup.resolve(&outer_scope, &QualifiedName::from("Sibling"), &binding).is_some());
        assert!(lookup.resolve(&outer_scope, &QualifiedName::from("Nonexistent"), &binding).is_none());
    }
}
