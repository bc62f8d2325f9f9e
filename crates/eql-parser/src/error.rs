use std::fmt;

/// An error produced by the lexer or the parser.
///
/// Errors carry the name of the query they were found in, a stable message,
/// the offending lexeme (possibly empty) and the 1-based line and character
/// position of the token that triggered them. The rendered form is asserted
/// textually by callers, so both the message catalogue and the layout are
/// part of the public contract:
///
/// ```rust
/// let err = eql_parser::parse_query("test", "get Author where").unwrap_err();
///
/// assert_eq!(
///     err.to_string(),
///     "Parse error in test: Unexpected end (Line:1 Pos:17)"
/// );
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub(crate) name: String,
    pub(crate) message: String,
    pub(crate) data: String,
    pub(crate) line: u32,
    pub(crate) pos: u32,
}

impl SyntaxError {
    pub(crate) fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        data: impl Into<String>,
        line: u32,
        pos: u32,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            data: data.into(),
            line,
            pos,
        }
    }

    /// Name of the query this error was found in.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// The error message, without the offending lexeme.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    /// The lexeme that triggered the error. Empty when the input simply ended.
    pub fn data(&self) -> &str {
        self.data.as_ref()
    }

    /// 1-based line of the offending token.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based character position of the offending token within its line.
    pub fn pos(&self) -> u32 {
        self.pos
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error in {}: {}", self.name, self.message)?;
        if !self.data.is_empty() {
            write!(f, " ({})", self.data)?;
        }
        write!(f, " (Line:{} Pos:{})", self.line, self.pos)
    }
}

impl fmt::Debug for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for SyntaxError {}
