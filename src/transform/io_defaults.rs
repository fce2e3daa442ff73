//! Fills in directive parameters the author left implicit: the `IO` method
//! defaults to `"file"`, `name` defaults to the relation's dotted qualified
//! name, `fact-dir`/`output-dir` are propagated from global configuration,
//! and `stdout` output is special-cased to request headers.

use crate::ast::{DirectiveKind, Program};
use crate::config::GlobalConfig;
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;

fn apply_defaults(program: &mut Program, config: &GlobalConfig) -> bool {
    let mut changed = false;
    for directive in &mut program.directives {
        if directive.get("IO").is_none() {
            directive.set("IO", "file");
            changed = true;
        }
        if directive.get("name").is_none() {
            directive.set("name", directive.relation.to_dotted_string());
            changed = true;
        }
        if directive.get("IO") == Some("file") {
            match directive.kind {
                DirectiveKind::Input => {
                    if directive.get("fact-dir").is_none() {
                        if let Some(dir) = &config.fact_dir {
                            directive.set("fact-dir", dir.clone());
                            changed = true;
                        }
                    }
                }
                DirectiveKind::Output | DirectiveKind::Printsize => {
                    if directive.get("output-dir").is_none() {
                        if let Some(dir) = &config.output_dir {
                            directive.set("output-dir", dir.clone());
                            changed = true;
                        }
                    }
                }
                DirectiveKind::Limitsize => {}
            }
        }
        if directive.get("IO") == Some("stdout")
            && matches!(directive.kind, DirectiveKind::Output | DirectiveKind::Printsize)
            && directive.get("headers").is_none()
        {
            directive.set("headers", "true");
            changed = true;
        }
    }
    changed
}

#[derive(Clone)]
pub struct IODefaults {
    config: GlobalConfig,
}

impl IODefaults {
    #[must_use]
    pub fn new(config: GlobalConfig) -> Self {
        IODefaults { config }
    }
}

impl Transformer for IODefaults {
    fn name(&self) -> &str {
        "IODefaults"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let changed = apply_defaults(tu.program_mut(), &self.config);
        if changed {
            tu.invalidate();
        }
        changed
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Directive, QualifiedName};

    #[test]
    fn missing_io_and_name_default() {
        let mut program = Program::new();
        program.directives.push(Directive::new(DirectiveKind::Input, QualifiedName::from("edge")));

        let mut tu = TranslationUnit::new(program);
        assert!(IODefaults::new(GlobalConfig::default()).apply(&mut tu));
        let directive = &tu.program().directives[0];
        assert_eq!(directive.get("IO"), Some("file"));
        assert_eq!(directive.get("name"), Some("edge"));
    }

    #[test]
    fn fact_dir_propagated_for_input() {
        let mut program = Program::new();
        program.directives.push(Directive::new(DirectiveKind::Input, QualifiedName::from("edge")));

        let mut config = GlobalConfig::default();
        config.fact_dir = Some("./facts".into());
        let mut tu = TranslationUnit::new(program);
        IODefaults::new(config).apply(&mut tu);
        assert_eq!(tu.program().directives[0].get("fact-dir"), Some("./facts"));
    }

    #[test]
    fn stdout_output_gets_headers() {
        let mut program = Program::new();
        let mut directive = Directive::new(DirectiveKind::Output, QualifiedName::from("result"));
        directive.set("IO", "stdout");
        program.directives.push(directive);

        let mut tu = TranslationUnit::new(program);
        IODefaults::new(GlobalConfig::default()).apply(&mut tu);
        assert_eq!(tu.program().directives[0].get("headers"), Some("true"));
    }

    #[test]
    fn already_complete_directive_is_noop() {
        let mut program = Program::new();
        let mut directive = Directive::new(DirectiveKind::Input, QualifiedName::from("edge"));
        directive.set("IO", "file");
        directive.set("name", "edge");
        program.directives.push(directive);

        let mut tu = TranslationUnit::new(program);
        assert!(!IODefaults::new(GlobalConfig::default()).apply(&mut tu));
    }
}
