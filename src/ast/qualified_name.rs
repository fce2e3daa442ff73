//! Ordered, dot-joined identifier sequences used for relation, type, and
//! component names, plus the synthetic names the magic-set transformer mints
//! (`@magic.R.{b}`, `@neglabel.R`, ...).

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        QualifiedName { segments }
    }

    /// The sentinel empty qualifier used only by `TypeBinding` for an
    /// unresolved formal type parameter.
    #[must_use]
    pub fn empty() -> Self {
        QualifiedName { segments: Vec::new() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        QualifiedName { segments }
    }

    #[must_use]
    pub fn prepend(&self, segment: impl Into<String>) -> Self {
        let mut segments = vec![segment.into()];
        segments.extend(self.segments.iter().cloned());
        QualifiedName { segments }
    }

    #[must_use]
    pub fn to_dotted_string(&self) -> String {
        self.segments.join(".")
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_dotted_string())
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        QualifiedName { segments: s.split('.').map(str::to_string).collect() }
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        QualifiedName::from(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_display() {
        let q = QualifiedName::from("R").append("bf");
        assert_eq!(q.to_dotted_string(), "R.bf");
    }

    #[test]
    fn empty_is_sentinel() {
        assert!(QualifiedName::empty().is_empty());
        assert!(!QualifiedName::from("x").is_empty());
    }

    #[test]
    fn prepend_builds_magic_names() {
        let magic = QualifiedName::from("R.{b}").prepend("magic");
        assert_eq!(magic.to_dotted_string(), "magic.R.{b}");
    }
}
