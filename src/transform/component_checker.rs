//! Static validation of component declarations before instantiation:
//! referenced base/nested components exist, type-parameter arity matches,
//! the base-component graph is acyclic, overrides only name a relation an
//! ancestor actually declares, and component names don't collide with type
//! or relation names. Never mutates the `Program`.

use crate::ast::{Component, Program, QualifiedName};
use crate::error::DiagnosticKind;
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashSet;

fn check_component(component: &Component, scope: &[Component], errors: &mut crate::error::ErrorReport) {
    for base in &component.base_components {
        match scope.iter().find(|c| c.name == base.name) {
            None => errors.error(
                DiagnosticKind::ComponentError(format!("unknown base component '{}'", base.name)),
                component.position.clone(),
            ),
            Some(base_component) => {
                if base_component.formal_type_params.len() != base.type_params.len() {
                    errors.error(
                        DiagnosticKind::ComponentError(format!(
                            "component '{}' expects {} type parameters, got {}",
                            base.name,
                            base_component.formal_type_params.len(),
                            base.type_params.len()
                        )),
                        component.position.clone(),
                    );
                }
            }
        }
    }

    for override_name in &component.overrides {
        if !ancestor_declares(component, scope, override_name) {
            errors.error(
                DiagnosticKind::ComponentError(format!(
                    "override '{override_name}' does not name a relation declared by an ancestor of '{}'",
                    component.name
                )),
                component.position.clone(),
            );
        }
    }

    let local_names: HashSet<String> = component
        .types
        .iter()
        .map(|t| t.name.to_dotted_string())
        .chain(component.relations.iter().map(|r| r.name.to_dotted_string()))
        .collect();
    for nested in &component.components {
        if local_names.contains(&nested.name.to_dotted_string()) {
            errors.error(
                DiagnosticKind::ComponentError(format!(
                    "component name '{}' collides with a type or relation of the same name",
                    nested.name
                )),
                nested.position.clone(),
            );
        }
        check_component(nested, &component.components, errors);
    }
}

fn ancestor_declares(component: &Component, scope: &[Component], relation: &str) -> bool {
    component.base_components.iter().any(|base| {
        scope.iter().find(|c| c.name == base.name).is_some_and(|base_component| {
            base_component.relations.iter().any(|r| r.name.to_dotted_string() == relation)
                || ancestor_declares(base_component, scope, relation)
        })
    })
}

fn detect_cycle(component: &Component, scope: &[Component], visiting: &mut HashSet<QualifiedName>) -> bool {
    if !visiting.insert(component.name.clone()) {
        return true;
    }
    let cyclic = component.base_components.iter().any(|base| {
        scope
            .iter()
            .find(|c| c.name == base.name)
            .is_some_and(|base_component| detect_cycle(base_component, scope, visiting))
    });
    visiting.remove(&component.name);
    cyclic
}

fn check_cycles(components: &[Component], errors: &mut crate::error::ErrorReport) {
    for component in components {
        let mut visiting = HashSet::new();
        if detect_cycle(component, components, &mut visiting) {
            errors.error(
                DiagnosticKind::ComponentError(format!(
                    "component inheritance cycle involving '{}'",
                    component.name
                )),
                component.position.clone(),
            );
        }
        check_cycles(&component.components, errors);
    }
}

fn check_program(program: &Program, errors: &mut crate::error::ErrorReport) {
    check_cycles(&program.components, errors);
    for component in &program.components {
        check_component(component, &program.components, errors);
    }
}

#[derive(Clone)]
pub struct ComponentChecker;

impl Transformer for ComponentChecker {
    fn name(&self) -> &str {
        "ComponentChecker"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let program = tu.program().clone();
        check_program(&program, &mut tu.errors);
        false
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ComponentType;

    #[test]
    fn unknown_base_component_is_reported() {
        let mut component = Component::new(QualifiedName::from("C"));
        component.base_components.push(ComponentType { name: QualifiedName::from("Missing"), type_params: Vec::new() });
        let mut program = Program::new();
        program.components.push(component);
        let mut tu = TranslationUnit::new(program);
        ComponentChecker.apply(&mut tu);
        assert_eq!(tu.errors.num_errors(), 1);
    }

    #[test]
    fn direct_self_inheritance_is_a_cycle() {
        let mut component = Component::new(QualifiedName::from("C"));
        component.base_components.push(ComponentType { name: QualifiedName::from("C"), type_params: Vec::new() });
        let mut program = Program::new();
        program.components.push(component);
        let mut tu = TranslationUnit::new(program);
        ComponentChecker.apply(&mut tu);
        assert!(tu.errors.num_errors() >= 1);
    }

    #[test]
    fn well_formed_component_reports_nothing() {
        let component = Component::new(QualifiedName::from("C"));
        let mut program = Program::new();
        program.components.push(component);
        let mut tu = TranslationUnit::new(program);
        ComponentChecker.apply(&mut tu);
        assert_eq!(tu.errors.num_errors(), 0);
    }
}
