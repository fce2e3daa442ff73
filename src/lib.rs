//! # flowlog-core
//!
//! AST-to-RAM transformation core for a Datalog compiler: the node model,
//! a fixed set of derived analyses, a pluggable transformer framework
//! (including the magic-set rewrite family), and a strategy-selected
//! lowering stage into a relational-algebra-machine intermediate
//! representation.
//!
//! ## Pipeline
//!
//! ```text
//! Datalog source text
//!     |
//! [parser]                  -> ast::Program
//!     |
//! [checkers: ComponentChecker, PragmaChecker]
//!     |
//! [rewrite pipeline: component instantiation, alias/normalisation passes,
//!  minimisation, inlining, magic-set specialisation, IO defaults]
//!     |
//! [SemanticChecker]          -> ErrorReport, short-circuits on error
//!     |
//! [ir::lowering]             -> ir::RamProgram
//!     |
//! [ir::dump]                 -> canonical text dump
//! ```
//!
//! `pipeline::compile` drives the whole thing end to end; the stages are
//! also exposed individually for callers that want to stop partway (a
//! linter that only needs diagnostics, say).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flowlog_core::config::GlobalConfig;
//! use flowlog_core::pipeline::compile;
//!
//! let source = ".decl edge(x:number,y:number)\n\
//!               .decl reach(x:number,y:number) output\n\
//!               reach(x,y) :- edge(x,y).\n\
//!               reach(x,z) :- edge(x,y), reach(y,z).";
//!
//! let outcome = compile(source, &GlobalConfig::default());
//! if let Some(ram) = outcome.ram {
//!     println!("{}", flowlog_core::ir::dump::dump(&ram));
//! }
//! ```

pub mod analysis;
pub mod ast;
pub mod config;
pub mod error;
pub mod ir;
pub mod parser;
pub mod pipeline;
pub mod transform;
pub mod translation_unit;

pub use config::GlobalConfig;
pub use error::{Diagnostic, DiagnosticKind, ErrorReport, Severity};
pub use ir::RamProgram;
pub use parser::parse_program;
pub use pipeline::{compile, CompileOutcome};
pub use translation_unit::TranslationUnit;
