//! Source positions. Attached to every syntactic node for diagnostics only —
//! never compared as part of structural equality.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub file: String,
    pub begin_line: u32,
    pub begin_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Position {
    #[must_use]
    pub fn new(file: impl Into<String>, begin_line: u32, begin_column: u32) -> Self {
        Position {
            file: file.into(),
            begin_line,
            begin_column,
            end_line: begin_line,
            end_column: begin_column,
        }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Position::new("<unknown>", 0, 0)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.begin_line, self.begin_column)
    }
}
