//! Copies each program-level `.pragma` into the global configuration,
//! unless the key was already set from the command line.

use crate::config::GlobalConfig;
use crate::transform::Transformer;
use crate::translation_unit::TranslationUnit;
use std::cell::RefCell;

#[derive(Clone)]
pub struct PragmaChecker {
    /// Keys the driver has already set from outside the program; a pragma
    /// for one of these is recorded as a no-op rather than overwritten.
    preset_keys: Vec<String>,
    applied: std::rc::Rc<RefCell<Vec<(String, String)>>>,
}

impl PragmaChecker {
    #[must_use]
    pub fn new(preset_keys: Vec<String>) -> Self {
        PragmaChecker { preset_keys, applied: std::rc::Rc::new(RefCell::new(Vec::new())) }
    }

    #[must_use]
    pub fn applied_pragmas(&self) -> Vec<(String, String)> {
        self.applied.borrow().clone()
    }
}

fn apply_pragma(config: &mut GlobalConfig, key: &str, value: &str) -> bool {
    match key {
        "magic-transform" => {
            config.magic_transform = value.to_string();
            true
        }
        "magic-transform-exclude" => {
            config.magic_transform_exclude = value.to_string();
            true
        }
        "inline-exclude" => {
            config.inline_exclude = value.to_string();
            true
        }
        "provenance" => {
            config.provenance = match value {
                "explain" => Some(crate::config::ProvenanceMode::Explain),
                "explore" => Some(crate::config::ProvenanceMode::Explore),
                _ => None,
            };
            true
        }
        "disable-transformers" => {
            config.disable_transformers = value.to_string();
            true
        }
        "debug-report" => {
            config.debug_report = Some(value.to_string());
            true
        }
        "legacy" => {
            config.legacy = value == "true" || value == "1";
            true
        }
        _ => false,
    }
}

impl Transformer for PragmaChecker {
    fn name(&self) -> &str {
        "PragmaChecker"
    }

    fn apply(&self, tu: &mut TranslationUnit) -> bool {
        let pragmas = tu.program().pragmas.clone();
        let mut config = GlobalConfig::default();
        let mut changed = false;
        for pragma in &pragmas {
            if self.preset_keys.iter().any(|k| k == &pragma.key) {
                continue;
            }
            if apply_pragma(&mut config, &pragma.key, &pragma.value) {
                self.applied.borrow_mut().push((pragma.key.clone(), pragma.value.clone()));
                changed = true;
            }
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
    use crate::ast::{Pragma, Program};

    #[test]
    fn pragma_is_applied_when_not_preset() {
        let mut program = Program::new();
        program.pragmas.push(Pragma { key: "legacy".to_string(), value: "true".to_string() });
        let mut tu = TranslationUnit::new(program);
        let checker = PragmaChecker::new(Vec::new());
        assert!(checker.apply(&mut tu));
        assert_eq!(checker.applied_pragmas(), vec![("legacy".to_string(), "true".to_string())]);
    }

    #[test]
    fn preset_key_is_skipped() {
        let mut program = Program::new();
        program.pragmas.push(Pragma { key: "legacy".to_string(), value: "true".to_string() });
        let mut tu = TranslationUnit::new(program);
        let checker = PragmaChecker::new(vec!["legacy".to_string()]);
        assert!(!checker.apply(&mut tu));
        assert!(checker.applied_pragmas().is_empty());
    }
}
