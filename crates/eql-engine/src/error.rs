use crate::graph::GraphError;
use eql_parser::SyntaxError;
use eql_parser::Token;
use std::fmt;

/// Everything that can go wrong between query text and search result.
///
/// Runtime errors render as
/// `EQL error in <name>: <kind> (<detail>) (Line:<l> Pos:<p>)` and their
/// strings are stable; callers assert on them textually.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A lexical or syntactic failure, reported by the parser.
    #[error(transparent)]
    Parse(#[from] SyntaxError),

    /// A resolver or runtime failure tied to a source position.
    #[error("EQL error in {name}: {kind} ({detail}) (Line:{line} Pos:{pos})")]
    Runtime {
        name: String,
        kind: RuntimeErrorKind,
        detail: String,
        line: u32,
        pos: u32,
    },

    /// A storage error, propagated from the graph store verbatim.
    #[error("{0}")]
    Graph(String),

    /// Signalling condition: a traversal produced no pairs and nil rows are
    /// not allowed. Callers outside the driver never observe this.
    #[error("Empty traversal")]
    EmptyTraversal,
}

impl Error {
    pub(crate) fn runtime(
        name: &str,
        kind: RuntimeErrorKind,
        detail: impl Into<String>,
        loc: Location,
    ) -> Self {
        Error::Runtime {
            name: name.to_string(),
            kind,
            detail: detail.into(),
            line: loc.line,
            pos: loc.pos,
        }
    }
}

impl From<GraphError> for Error {
    fn from(err: GraphError) -> Self {
        Error::Graph(err.to_string())
    }
}

/// The category of a runtime [`Error`]; determines the stable message
/// prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    InvalidConstruct,
    InvalidTraversalSpec,
    UnknownNodeKind,
    InvalidColumnData,
    NotANumber,
    NotAList,
    NotARegex,
    InvalidWhereClause,
    ResultError,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RuntimeErrorKind::InvalidConstruct => "Invalid construct",
            RuntimeErrorKind::InvalidTraversalSpec => "Invalid traversal spec",
            RuntimeErrorKind::UnknownNodeKind => "Unknown node kind",
            RuntimeErrorKind::InvalidColumnData => "Invalid column data spec",
            RuntimeErrorKind::NotANumber => "Value of operand is not a number",
            RuntimeErrorKind::NotAList => "Value of operand is not a list",
            RuntimeErrorKind::NotARegex => "Value of operand is not a valid regex",
            RuntimeErrorKind::InvalidWhereClause => "Invalid where clause",
            RuntimeErrorKind::ResultError => "Result error",
        };
        f.write_str(text)
    }
}

/// Source position carried through resolve into runtime errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Location {
    pub line: u32,
    pub pos: u32,
}

impl From<&Token> for Location {
    fn from(token: &Token) -> Self {
        Location {
            line: token.line(),
            pos: token.pos(),
        }
    }
}
