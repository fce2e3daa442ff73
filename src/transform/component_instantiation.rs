//! Expands every top-level `ComponentInit` by deep-cloning its component's
//! body, substituting formal type parameters for the actual type names
//! supplied at the instantiation site, and prefixing every locally declared
//! type and relation with the instance name so sibling instantiations of
//! the same component don't collide.

use crate::ast::{Clause, Component, ComponentInit, Literal, Program, QualifiedName, Relation, TypeBinding, TypeDecl};
use crate::error::DiagnosticKind;
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::collections::HashSet;
use std::rc::Rc;

const MAX_INSTANTIATION_DEPTH: u32 = 1000;

fn rename_type(name: &QualifiedName, prefix: &str, locals: &HashSet<String>, binding: &TypeBinding) -> QualifiedName {
    let resolved = binding.resolve(name);
    if locals.contains(&resolved.to_dotted_string()) {
        resolved.prepend(prefix)
    } else {
        resolved
    }
}

fn prefix_relation_name(name: &QualifiedName, prefix: &str, locals: &HashSet<String>) -> QualifiedName {
    if locals.contains(&name.to_dotted_string()) {
        name.prepend(prefix)
    } else {
        name.clone()
    }
}

struct Instantiator<'a> {
    errors: &'a mut crate::error::ErrorReport,
}

impl<'a> Instantiator<'a> {
    /// Recursively expands `component` under `instance_name`, `binding`, and
    /// the overridden-relation set inherited from an enclosing instance,
    /// appending the resulting flat declarations into `out`.
    fn instantiate(
        &mut self,
        component: &Component,
        instance_name: &str,
        binding: &TypeBinding,
        inherited_overrides: &HashSet<String>,
        depth: u32,
        out: &mut Program,
    ) {
        if depth > MAX_INSTANTIATION_DEPTH {
            self.errors.error(
                DiagnosticKind::InstantiationError(format!(
                    "instantiation depth exceeded expanding component '{}'",
                    component.name
                )),
                component.position.clone(),
            );
            return;
        }

        let locals: HashSet<String> = component
            .types
            .iter()
            .map(|t| t.name.to_dotted_string())
            .chain(component.relations.iter().map(|r| r.name.to_dotted_string()))
            .collect();

        // `component.overrides` only suppresses clauses when recursing into a
        // *base* component below (passed down as `overridden`); it must never
        // suppress the declaring component's own clauses, since `.override`
        // exists precisely so a component can supply its own replacement for
        // a clause it inherited from further up the chain.
        let mut overridden = inherited_overrides.clone();
        overridden.extend(component.overrides.iter().cloned());

        for type_decl in &component.types {
            out.types.push(TypeDecl {
                name: prefix_relation_name(&type_decl.name, instance_name, &locals),
                kind: rename_type_decl_kind(&type_decl.kind, instance_name, &locals, binding),
                position: type_decl.position.clone(),
            });
        }

        for relation in &component.relations {
            let mut renamed = relation.clone();
            renamed.name = prefix_relation_name(&relation.name, instance_name, &locals);
            for attribute in &mut renamed.attributes {
                attribute.type_name = rename_type(&attribute.type_name, instance_name, &locals, binding);
            }
            out.relations.push(renamed);
        }

        for clause in &component.clauses {
            let head_name = clause.head.name.to_dotted_string();
            if inherited_overrides.contains(&head_name) {
                continue;
            }
            out.clauses.push(rename_clause(clause, instance_name, &locals));
        }

        for directive in &component.directives {
            let mut renamed = directive.clone();
            renamed.relation = prefix_relation_name(&directive.relation, instance_name, &locals);
            out.directives.push(renamed);
        }

        for nested in &component.instantiations {
            let Some(nested_component) = find_component(&component.components, &nested.component_type.name) else {
                self.errors.error(
                    DiagnosticKind::InstantiationError(format!(
                        "no component named '{}' visible from instance '{instance_name}'",
                        nested.component_type.name
                    )),
                    nested.position.clone(),
                );
                continue;
            };
            let nested_binding =
                binding.extend(&nested_component.formal_type_params, &nested.component_type.type_params);
            let nested_instance = format!("{instance_name}.{}", nested.instance_name);
            self.instantiate(
                nested_component,
                &nested_instance,
                &nested_binding,
                &overridden,
                depth + 1,
                out,
            );
        }

        for base in &component.base_components {
            let Some(base_component) = find_component(&component.components, &base.name) else {
                self.errors.error(
                    DiagnosticKind::InstantiationError(format!("no base component named '{}'", base.name)),
                    component.position.clone(),
                );
                continue;
            };
            let base_binding = binding.extend(&base_component.formal_type_params, &base.type_params);
            self.instantiate(base_component, instance_name, &base_binding, &overridden, depth + 1, out);
        }
    }
}

fn find_component<'a>(scope: &'a [Component], name: &QualifiedName) -> Option<&'a Component> {
    scope.iter().find(|c| c.name == *name)
}

fn rename_type_decl_kind(
    kind: &crate::ast::TypeDeclKind,
    prefix: &str,
    locals: &HashSet<String>,
    binding: &TypeBinding,
) -> crate::ast::TypeDeclKind {
    use crate::ast::TypeDeclKind as K;
    match kind {
        K::Union(members) => K::Union(members.iter().map(|m| rename_type(m, prefix, locals, binding)).collect()),
        K::Record(fields) => K::Record(
            fields
                .iter()
                .map(|f| crate::ast::RecordField {
                    name: f.name.clone(),
                    type_name: rename_type(&f.type_name, prefix, locals, binding),
                })
                .collect(),
        ),
        K::Subset(base) => K::Subset(rename_type(base, prefix, locals, binding)),
        K::Adt(branches) => K::Adt(
            branches
                .iter()
                .map(|b| crate::ast::AdtBranch {
                    constructor: b.constructor.clone(),
                    fields: b
                        .fields
                        .iter()
                        .map(|f| crate::ast::RecordField {
                            name: f.name.clone(),
                            type_name: rename_type(&f.type_name, prefix, locals, binding),
                        })
                        .collect(),
                })
                .collect(),
        ),
        K::Primitive => K::Primitive,
    }
}

fn rename_clause(clause: &Clause, prefix: &str, locals: &HashSet<String>) -> Clause {
    let mut next = clause.clone();
    next.head.name = prefix_relation_name(&clause.head.name, prefix, locals);
    for lit in &mut next.body {
        if let Literal::Atom(atom) | Literal::Negation(atom) = lit {
            atom.name = prefix_relation_name(&atom.name, prefix, locals);
        }
    }
    next
}

#[derive(Clone)]
pub struct ComponentInstantiationTransformer;

impl Transformer for ComponentInstantiationTransformer {
    fn name(&self) -> &str {
        "ComponentInstantiationTransformer"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        if tu.program().components.is_empty() && tu.program().instantiations.is_empty() {
            return false;
        }

        let program = tu.program().clone();
        let mut expanded = Program {
            types: program.types.clone(),
            relations: program.relations.clone(),
            functor_declarations: program.functor_declarations.clone(),
            clauses: program.clauses.clone(),
            directives: program.directives.clone(),
            components: Vec::new(),
            instantiations: Vec::new(),
            pragmas: program.pragmas.clone(),
        };

        let mut instantiator = Instantiator { errors: &mut tu.errors };
        for init in &program.instantiations {
            let Some(component) = find_component(&program.components, &init.component_type.name) else {
                instantiator.errors.error(
                    DiagnosticKind::InstantiationError(format!(
                        "no component named '{}' at global scope",
                        init.component_type.name
                    )),
                    init.position.clone(),
                );
                continue;
            };
            let binding =
                TypeBinding::new().extend(&component.formal_type_params, &init.component_type.type_params);
            let marked = Component {
                instantiated_from: Some(Rc::new(init.component_type.clone())),
                ..component.clone()
            };
            instantiator.instantiate(&marked, &init.instance_name, &binding, &HashSet::new(), 0, &mut expanded);
        }

        *tu.program_mut() = expanded;
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
    use crate::ast::{Attribute, ComponentType};

    #[test]
    fn instantiation_expands_and_prefixes_local_relation() {
        let mut base = Component::new(QualifiedName::from("Counter"));
        base.relations.push(Relation::new(
            QualifiedName::from("count"),
            vec![Attribute { name: "n".into(), type_name: "number".into() }],
        ));
        base.clauses.push(RuleBuilder::new("count").head_vars(["n"]).body_atom("seed", ["n"]).build());

        let mut program = Program::new();
        program.components.push(base);
        program.instantiations.push(ComponentInit {
            instance_name: "c1".to_string(),
            component_type: ComponentType { name: QualifiedName::from("Counter"), type_params: Vec::new() },
            position: None,
        });

        let mut tu = TranslationUnit::new(program);
        assert!(ComponentInstantiationTransformer.apply(&mut tu));
        assert!(tu.program().is_component_free());
        assert!(tu.program().relation(&QualifiedName::from("c1.count")).is_some());
    }

    #[test]
    fn override_on_a_component_s_own_clause_keeps_that_clause() {
        // A component that declares `.override foo` and then supplies its
        // own replacement clause for `foo` must keep that clause — the
        // override only suppresses `foo` clauses inherited from a base
        // component, never the declaring component's own.
        let mut base = Component::new(QualifiedName::from("Base"));
        base.relations.push(Relation::new(
            QualifiedName::from("foo"),
            vec![Attribute { name: "n".into(), type_name: "number".into() }],
        ));
        base.clauses.push(RuleBuilder::new("foo").head_vars(["n"]).body_atom("old_seed", ["n"]).build());

        let mut derived = Component::new(QualifiedName::from("Derived"));
        derived.components.push(base);
        derived.base_components.push(crate::ast::ComponentType {
            name: QualifiedName::from("Base"),
            type_params: Vec::new(),
        });
        derived.overrides.insert("foo".to_string());
        derived.clauses.push(RuleBuilder::new("foo").head_vars(["n"]).body_atom("new_seed", ["n"]).build());

        let mut program = Program::new();
        program.components.push(derived);
        program.instantiations.push(ComponentInit {
            instance_name: "d1".to_string(),
            component_type: ComponentType { name: QualifiedName::from("Derived"), type_params: Vec::new() },
            position: None,
        });

        let mut tu = TranslationUnit::new(program);
        assert!(ComponentInstantiationTransformer.apply(&mut tu));
        let foo_clauses: Vec<_> =
            tu.program().clauses.iter().filter(|c| c.head.name == QualifiedName::from("d1.foo")).collect();
        assert_eq!(foo_clauses.len(), 1, "override must not drop the component's own replacement clause");
        assert!(foo_clauses[0].body.iter().any(|l| matches!(l,
            Literal::Atom(a) if a.name == QualifiedName::from("d1.new_seed"))));
    }
}
