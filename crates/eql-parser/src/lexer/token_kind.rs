/// The lexical category of a [`Token`][crate::Token].
///
/// Keywords are recognized case-insensitively; the canonical (lowercase,
/// long-form) lexeme is stored in the token value. Colons never form a
/// token of their own, they only occur inside `Value` lexemes such as
/// traversal specs (`:::Song`) or column references (`1:n:key`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Clause keywords
    Get,
    Lookup,
    From,
    Group,
    Primary,
    Where,
    Traverse,
    End,
    Show,
    As,
    Format,
    With,
    List,
    NullTraversal,
    Filtering,
    Ordering,
    Unique,
    UniqueCount,
    IsNull,
    IsNotNull,
    Ascending,
    Descending,

    // Operator keywords
    And,
    Or,
    Not,
    Like,
    In,
    NotIn,
    Contains,
    BeginsWith,
    EndsWith,
    ContainsNot,

    // Literal keywords
    True,
    False,
    Null,

    // Symbols
    Eq,         // =
    Neq,        // !=
    Gt,         // >
    Gte,        // >=
    Lt,         // <
    Lte,        // <=
    LParen,     // (
    RParen,     // )
    LBracket,   // [
    RBracket,   // ]
    Comma,      // ,
    At,         // @
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    SlashSlash, // //
    Percent,    // %

    /// A bare value: identifier, number, dotted path, traversal spec or
    /// column reference.
    Value,
    /// A single-, double-quoted or raw string.
    QuotedValue,

    Eof,
}

impl TokenKind {
    /// Look up the keyword kind for an already lowercased identifier.
    pub(crate) fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "get" => TokenKind::Get,
            "lookup" => TokenKind::Lookup,
            "from" => TokenKind::From,
            "group" => TokenKind::Group,
            "primary" => TokenKind::Primary,
            "where" => TokenKind::Where,
            "traverse" => TokenKind::Traverse,
            "end" => TokenKind::End,
            "show" => TokenKind::Show,
            "as" => TokenKind::As,
            "format" => TokenKind::Format,
            "with" => TokenKind::With,
            "list" => TokenKind::List,
            "nulltraversal" => TokenKind::NullTraversal,
            "filtering" => TokenKind::Filtering,
            "ordering" => TokenKind::Ordering,
            "unique" => TokenKind::Unique,
            "uniquecount" => TokenKind::UniqueCount,
            "isnull" => TokenKind::IsNull,
            "isnotnull" => TokenKind::IsNotNull,
            "ascending" | "asc" => TokenKind::Ascending,
            "descending" | "desc" => TokenKind::Descending,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "like" => TokenKind::Like,
            "in" => TokenKind::In,
            "notin" => TokenKind::NotIn,
            "contains" => TokenKind::Contains,
            "beginswith" => TokenKind::BeginsWith,
            "endswith" => TokenKind::EndsWith,
            "containsnot" => TokenKind::ContainsNot,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => return None,
        };
        Some(kind)
    }

    /// The canonical lexeme stored for a keyword kind.
    pub(crate) fn canonical(self) -> Option<&'static str> {
        let lexeme = match self {
            TokenKind::Get => "get",
            TokenKind::Lookup => "lookup",
            TokenKind::From => "from",
            TokenKind::Group => "group",
            TokenKind::Primary => "primary",
            TokenKind::Where => "where",
            TokenKind::Traverse => "traverse",
            TokenKind::End => "end",
            TokenKind::Show => "show",
            TokenKind::As => "as",
            TokenKind::Format => "format",
            TokenKind::With => "with",
            TokenKind::List => "list",
            TokenKind::NullTraversal => "nulltraversal",
            TokenKind::Filtering => "filtering",
            TokenKind::Ordering => "ordering",
            TokenKind::Unique => "unique",
            TokenKind::UniqueCount => "uniquecount",
            TokenKind::IsNull => "isnull",
            TokenKind::IsNotNull => "isnotnull",
            TokenKind::Ascending => "ascending",
            TokenKind::Descending => "descending",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Like => "like",
            TokenKind::In => "in",
            TokenKind::NotIn => "notin",
            TokenKind::Contains => "contains",
            TokenKind::BeginsWith => "beginswith",
            TokenKind::EndsWith => "endswith",
            TokenKind::ContainsNot => "containsnot",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            _ => return None,
        };
        Some(lexeme)
    }

    /// Whether this kind is a keyword (clause, operator or literal).
    pub fn is_keyword(self) -> bool {
        self.canonical().is_some()
    }
}
