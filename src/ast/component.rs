//! Components: parameterised, instantiable bundles of type/relation/clause
//! declarations, and their instantiations.

use crate::ast::clause::Clause;
use crate::ast::directive::Directive;
use crate::ast::position::Position;
use crate::ast::qualified_name::QualifiedName;
use crate::ast::relation::Relation;
use crate::ast::type_decl::TypeDecl;
use std::collections::HashSet;
use std::rc::Rc;

/// A reference to a component under a list of actual type arguments:
/// `Base<T1, T2>`.
#[derive(Debug, Clone)]
pub struct ComponentType {
    pub name: QualifiedName,
    pub type_params: Vec<QualifiedName>,
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.type_params == other.type_params
    }
}

/// Maps a component's formal type parameters to the actual `QualifiedName`s
/// supplied at an instantiation site; `extend` layers a nested scope's
/// bindings over an outer one, falling back to the outer binding for any
/// parameter the nested scope does not shadow.
#[derive(Debug, Clone, Default)]
pub struct TypeBinding {
    bindings: std::collections::HashMap<String, QualifiedName>,
}

impl TypeBinding {
    #[must_use]
    pub fn new() -> Self {
        TypeBinding::default()
    }

    #[must_use]
    pub fn extend(&self, formals: &[QualifiedName], actuals: &[QualifiedName]) -> Self {
        let mut bindings = self.bindings.clone();
        for (formal, actual) in formals.iter().zip(actuals.iter()) {
            bindings.insert(formal.to_dotted_string(), actual.clone());
        }
        TypeBinding { bindings }
    }

    #[must_use]
    pub fn resolve(&self, name: &QualifiedName) -> QualifiedName {
        self.bindings.get(&name.to_dotted_string()).cloned().unwrap_or_else(|| name.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Component {
    pub name: QualifiedName,
    pub formal_type_params: Vec<QualifiedName>,
    pub base_components: Vec<ComponentType>,
    pub types: Vec<TypeDecl>,
    pub relations: Vec<Relation>,
    pub clauses: Vec<Clause>,
    pub directives: Vec<Directive>,
    pub components: Vec<Component>,
    pub instantiations: Vec<ComponentInit>,
    pub overrides: HashSet<String>,
    /// Present only on components produced by instantiation, where the
    /// quirky pointer-identity short-circuit in `equal` is observable;
    /// `None` for a freshly-parsed component declaration.
    pub instantiated_from: Option<Rc<ComponentType>>,
    pub position: Option<Position>,
}

impl Component {
    #[must_use]
    pub fn new(name: QualifiedName) -> Self {
        Component {
            name,
            formal_type_params: Vec::new(),
            base_components: Vec::new(),
            types: Vec::new(),
            relations: Vec::new(),
            clauses: Vec::new(),
            directives: Vec::new(),
            components: Vec::new(),
            instantiations: Vec::new(),
            overrides: HashSet::new(),
            instantiated_from: None,
            position: None,
        }
    }
}

/// `Component::equal` diverges from `Program::equal`: it short-circuits to
/// `true` whenever both components' `instantiated_from` componentType
/// pointers are identical, skipping the structural comparison below. The
/// original carries a FIXME about this; preserved here rather than invented
/// around.
impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (&self.instantiated_from, &other.instantiated_from) {
            if Rc::ptr_eq(a, b) {
                return true;
            }
        }
        self.name == other.name
            && self.formal_type_params == other.formal_type_params
            && self.base_components == other.base_components
            && self.types == other.types
            && self.relations == other.relations
            && self.clauses == other.clauses
            && self.directives == other.directives
            && self.components == other.components
            && self.instantiations == other.instantiations
            && self.overrides == other.overrides
    }
}

#[derive(Debug, Clone)]
pub struct ComponentInit {
    pub instance_name: String,
    pub component_type: ComponentType,
    pub position: Option<Position>,
}

impl PartialEq for ComponentInit {
    fn eq(&self, other: &Self) -> bool {
        self.instance_name == other.instance_name && self.component_type == other.component_type
    }
}
