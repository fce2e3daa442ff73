//! SCCs of the precedence graph and their topological order. Grounded on
//! `recursion.rs`'s Tarjan's-algorithm dependency analysis in the teacher
//! repo, generalised from "recursive or not" to the full stratified
//! SCC/topological-order contract `spec.md` §4.3 requires.

use crate::analysis::precedence_graph::PrecedenceGraph;
use crate::ast::QualifiedName;
use crate::translation_unit::{Analysis, TranslationUnit};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct SccGraph {
    /// SCCs in topological order: if `order[i]` depends on `order[j]`, then
    /// `i >= j` (dependencies come first).
    order: Vec<Vec<QualifiedName>>,
    scc_of: HashMap<QualifiedName, usize>,
    self_loops: HashSet<QualifiedName>,
}

impl SccGraph {
    #[must_use]
    pub fn get_scc(&self, rel: &QualifiedName) -> Option<usize> {
        self.scc_of.get(rel).copied()
    }

    #[must_use]
    pub fn get_internal_relations(&self, scc: usize) -> &[QualifiedName] {
        self.order.get(scc).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn get_number_of_sccs(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn topological_order(&self) -> &[Vec<QualifiedName>] {
        &self.order
    }

    /// A relation participates in recursion if its SCC has more than one
    /// member, or it is a singleton SCC with a direct self-edge.
    #[must_use]
    pub fn is_recursive(&self, scc: usize) -> bool {
        match self.order.get(scc) {
            Some(members) if members.len() > 1 => true,
            Some(members) if members.len() == 1 => self.self_loops.contains(&members[0]),
            _ => false,
        }
    }
}

// Tarjan's strongly-connected-components algorithm.
struct Tarjan<'a> {
    graph: &'a PrecedenceGraph,
    index_counter: usize,
    index: HashMap<QualifiedName, usize>,
    lowlink: HashMap<QualifiedName, usize>,
    on_stack: HashMap<QualifiedName, bool>,
    stack: Vec<QualifiedName>,
    sccs: Vec<Vec<QualifiedName>>,
}

impl<'a> Tarjan<'a> {
    fn new(graph: &'a PrecedenceGraph) -> Self {
        Tarjan {
            graph,
            index_counter: 0,
            index: HashMap::new(),
            lowlink: HashMap::new(),
            on_stack: HashMap::new(),
            stack: Vec::new(),
            sccs: Vec::new(),
        }
    }

    fn run(&mut self) {
        let relations: Vec<QualifiedName> = self.graph.relations().cloned().collect();
        for rel in relations {
            if !self.index.contains_key(&rel) {
                self.strong_connect(rel);
            }
        }
    }

    fn strong_connect(&mut self, v: QualifiedName) {
        self.index.insert(v.clone(), self.index_counter);
        self.lowlink.insert(v.clone(), self.index_counter);
        self.index_counter += 1;
        self.stack.push(v.clone());
        self.on_stack.insert(v.clone(), true);

        for w in self.graph.successors(&v) {
            if !self.index.contains_key(&w) {
                self.strong_connect(w.clone());
                let w_low = self.lowlink[&w];
                let v_low = self.lowlink[&v];
                self.lowlink.insert(v.clone(), v_low.min(w_low));
            } else if *self.on_stack.get(&w).unwrap_or(&false) {
                let w_idx = self.index[&w];
                let v_low = self.lowlink[&v];
                self.lowlink.insert(v.clone(), v_low.min(w_idx));
            }
        }

        if self.lowlink[&v] == self.index[&v] {
            let mut component = Vec::new();
            loop {
                let w = self.stack.pop().expect("component stack must not be empty");
                self.on_stack.insert(w.clone(), false);
                let is_v = w == v;
                component.push(w);
                if is_v {
                    break;
                }
            }
            component.sort();
            self.sccs.push(component);
        }
    }
}

impl Analysis for SccGraph {
    fn name() -> &'static str {
        "scc-graph"
    }

    fn compute(tu: &TranslationUnit) -> Self {
        let graph = PrecedenceGraph::compute(tu);
        let mut tarjan = Tarjan::new(&graph);
        tarjan.run();

        // Tarjan as implemented above emits SCCs in reverse topological
        // order (a component is finalised only after all its successors
        // have been); reverse to get dependency-first ordering.
        let mut sccs = tarjan.sccs;
        sccs.reverse();

        let mut scc_of = HashMap::new();
        for (idx, members) in sccs.iter().enumerate() {
            for rel in members {
                scc_of.insert(rel.clone(), idx);
            }
        }

        let self_loops = graph
            .relations()
            .filter(|r| graph.successors(r).contains(*r))
            .cloned()
            .collect();

        SccGraph { order: sccs, scc_of, self_loops }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::RuleBuilder;
    use crate::ast::Program;

    fn tu_with(clauses: Vec<crate::ast::Clause>) -> TranslationUnit {
        let mut program = Program::new();
        program.clauses = clauses;
        TranslationUnit::new(program)
    }

    #[test]
    fn non_recursive_relations_get_singleton_sccs() {
        let tu = tu_with(vec![RuleBuilder::new("b")
            .head_vars(["x"])
            .body_atom("a", ["x"])
            .build()]);
        let scc = SccGraph::compute(&tu);
        assert_eq!(scc.get_number_of_sccs(), 2);
    }

    #[test]
    fn mutually_recursive_relations_share_an_scc() {
        let tu = tu_with(vec![
            RuleBuilder::new("even").head_vars(["x"]).body_atom("odd", ["x"]).build(),
            RuleBuilder::new("odd").head_vars(["x"]).body_atom("even", ["x"]).build(),
        ]);
        let scc = SccGraph::compute(&tu);
        assert_eq!(scc.get_number_of_sccs(), 1);
        let scc_idx = scc.get_scc(&QualifiedName::from("even")).unwrap();
        assert_eq!(scc_idx, scc.get_scc(&QualifiedName::from("odd")).unwrap());
        assert!(scc.is_recursive(scc_idx));
    }

    #[test]
    fn direct_self_loop_counts_as_recursive() {
        let tu = tu_with(vec![RuleBuilder::new("path")
            .head_vars(["x", "y"])
            .body_atom("path", ["x", "y"])
            .build()]);
        let scc = SccGraph::compute(&tu);
        let idx = scc.get_scc(&QualifiedName::from("path")).unwrap();
        assert!(scc.is_recursive(idx));
    }
}
