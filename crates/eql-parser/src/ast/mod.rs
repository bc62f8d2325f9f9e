mod plain;
mod print;

use crate::Token;
use std::fmt;
use std::ops::Deref;

pub use plain::PlainAst;

/// The closed set of AST node names.
///
/// `name()` returns the textual name used by the plain-data form; operator
/// kinds use their query lexeme (`"="`, `"//"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Get,
    Lookup,
    From,
    Group,
    Primary,
    Where,
    Traverse,
    Show,
    ShowTerm,
    As,
    Format,
    With,
    Ordering,
    Filtering,
    NullTraversal,
    Ascending,
    Descending,
    Unique,
    UniqueCount,
    IsNull,
    IsNotNull,

    And,
    Or,
    Not,

    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,

    Like,
    In,
    NotIn,
    Contains,
    BeginsWith,
    EndsWith,
    ContainsNot,

    Add,
    Sub,
    Mul,
    Div,
    DivInt,
    Mod,

    Func,
    Value,
    List,
}

impl NodeKind {
    /// Textual node name, as used in the plain-data AST form.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Get => "get",
            NodeKind::Lookup => "lookup",
            NodeKind::From => "from",
            NodeKind::Group => "group",
            NodeKind::Primary => "primary",
            NodeKind::Where => "where",
            NodeKind::Traverse => "traverse",
            NodeKind::Show => "show",
            NodeKind::ShowTerm => "showterm",
            NodeKind::As => "as",
            NodeKind::Format => "format",
            NodeKind::With => "with",
            NodeKind::Ordering => "ordering",
            NodeKind::Filtering => "filtering",
            NodeKind::NullTraversal => "nulltraversal",
            NodeKind::Ascending => "ascending",
            NodeKind::Descending => "descending",
            NodeKind::Unique => "unique",
            NodeKind::UniqueCount => "uniquecount",
            NodeKind::IsNull => "isnull",
            NodeKind::IsNotNull => "isnotnull",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Not => "not",
            NodeKind::Eq => "=",
            NodeKind::Neq => "!=",
            NodeKind::Gt => ">",
            NodeKind::Gte => ">=",
            NodeKind::Lt => "<",
            NodeKind::Lte => "<=",
            NodeKind::Like => "like",
            NodeKind::In => "in",
            NodeKind::NotIn => "notin",
            NodeKind::Contains => "contains",
            NodeKind::BeginsWith => "beginswith",
            NodeKind::EndsWith => "endswith",
            NodeKind::ContainsNot => "containsnot",
            NodeKind::Add => "+",
            NodeKind::Sub => "-",
            NodeKind::Mul => "*",
            NodeKind::Div => "/",
            NodeKind::DivInt => "//",
            NodeKind::Mod => "%",
            NodeKind::Func => "func",
            NodeKind::Value => "value",
            NodeKind::List => "list",
        }
    }

    /// Inverse of [`NodeKind::name`].
    pub fn from_name(name: &str) -> Option<NodeKind> {
        const ALL: &[NodeKind] = &[
            NodeKind::Get,
            NodeKind::Lookup,
            NodeKind::From,
            NodeKind::Group,
            NodeKind::Primary,
            NodeKind::Where,
            NodeKind::Traverse,
            NodeKind::Show,
            NodeKind::ShowTerm,
            NodeKind::As,
            NodeKind::Format,
            NodeKind::With,
            NodeKind::Ordering,
            NodeKind::Filtering,
            NodeKind::NullTraversal,
            NodeKind::Ascending,
            NodeKind::Descending,
            NodeKind::Unique,
            NodeKind::UniqueCount,
            NodeKind::IsNull,
            NodeKind::IsNotNull,
            NodeKind::And,
            NodeKind::Or,
            NodeKind::Not,
            NodeKind::Eq,
            NodeKind::Neq,
            NodeKind::Gt,
            NodeKind::Gte,
            NodeKind::Lt,
            NodeKind::Lte,
            NodeKind::Like,
            NodeKind::In,
            NodeKind::NotIn,
            NodeKind::Contains,
            NodeKind::BeginsWith,
            NodeKind::EndsWith,
            NodeKind::ContainsNot,
            NodeKind::Add,
            NodeKind::Sub,
            NodeKind::Mul,
            NodeKind::Div,
            NodeKind::DivInt,
            NodeKind::Mod,
            NodeKind::Func,
            NodeKind::Value,
            NodeKind::List,
        ];
        ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Binding power, used by the printer to decide parenthesization.
    /// Clause kinds have no binding power; atoms bind tightest.
    pub fn binding_power(self) -> u8 {
        match self {
            NodeKind::Or => 30,
            NodeKind::And | NodeKind::Not => 40,
            NodeKind::Eq
            | NodeKind::Neq
            | NodeKind::Gt
            | NodeKind::Gte
            | NodeKind::Lt
            | NodeKind::Lte
            | NodeKind::Like
            | NodeKind::In
            | NodeKind::NotIn
            | NodeKind::Contains
            | NodeKind::BeginsWith
            | NodeKind::EndsWith
            | NodeKind::ContainsNot => 60,
            NodeKind::Add | NodeKind::Sub => 110,
            NodeKind::Mul | NodeKind::Div | NodeKind::DivInt | NodeKind::Mod => 120,
            NodeKind::Func | NodeKind::Value | NodeKind::List => 150,
            _ => 0,
        }
    }
}

/// A single AST node: its kind, the originating token and ordered children.
///
/// Nodes are immutable after parse. For `Value` nodes the token carries the
/// payload (and whether it was quoted); for `Func` nodes it carries the
/// function name.
#[derive(Clone)]
pub struct AstNode {
    pub(crate) kind: NodeKind,
    pub(crate) token: Token,
    pub(crate) children: Vec<Ast>,
}

/// Shared handle to an [`AstNode`].
///
/// Thread-safe and reference-counted so that downstream consumers (the
/// resolver, compiled conditions) can hold on to subtrees without copying.
#[derive(Clone)]
pub struct Ast(triomphe::Arc<AstNode>);

impl Ast {
    pub fn new(kind: NodeKind, token: Token, children: Vec<Ast>) -> Self {
        Self(triomphe::Arc::new(AstNode {
            kind,
            token,
            children,
        }))
    }

    /// Returns whether two handles point to the same memory allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        triomphe::Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Ast {
    type Target = AstNode;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AstNode {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Shorthand for the token's value.
    pub fn value(&self) -> &str {
        self.token.value()
    }

    pub fn children(&self) -> &[Ast] {
        &self.children
    }

    /// The first child with the given kind, if any.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<&Ast> {
        self.children.iter().find(|c| c.kind == kind)
    }
}

/// Structural equality: kind, token value and children. Positions and the
/// quoting style of string values are ignored.
impl PartialEq for AstNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.token.value() == other.token.value()
            && self.children == other.children
    }
}

impl Eq for AstNode {}

impl PartialEq for Ast {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl Eq for Ast {}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(f: &mut fmt::Formatter<'_>, node: &AstNode, depth: usize) -> fmt::Result {
            let indent = "  ".repeat(depth);
            let name = node.kind.name();
            if matches!(node.kind, NodeKind::Value | NodeKind::Func) {
                writeln!(f, "{indent}{name} {:?}", node.token.value())?;
            } else {
                writeln!(f, "{indent}{name}")?;
            }
            for child in &node.children {
                write_node(f, child, depth + 1)?;
            }
            Ok(())
        }
        write_node(f, self, 0)
    }
}
