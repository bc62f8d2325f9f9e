//! Canonical textual form of an AST.
//!
//! The printed text re-parses to a structurally identical tree: keywords are
//! lowercase, clauses are separated by single spaces, list items by `, `,
//! and subexpressions are parenthesized only where a child's binding power
//! falls below its parent's.

use crate::ast::Ast;
use crate::ast::AstNode;
use crate::ast::NodeKind;
use crate::TokenKind;
use std::fmt;
use std::fmt::Write;

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self)
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &AstNode) -> fmt::Result {
    match node.kind() {
        NodeKind::Get => {
            write!(f, "get {}", node.children()[0].value())?;
            for child in &node.children()[1..] {
                write!(f, " ")?;
                write_node(f, child)?;
            }
            Ok(())
        }
        NodeKind::Lookup => {
            write!(f, "lookup {}", node.children()[0].value())?;
            let mut rest = node.children()[1..].iter().peekable();
            let mut first = true;
            while let Some(child) = rest.peek() {
                if child.kind() != NodeKind::Value {
                    break;
                }
                if first {
                    write!(f, " ")?;
                    first = false;
                } else {
                    write!(f, ", ")?;
                }
                write_node(f, rest.next().unwrap())?;
            }
            for child in rest {
                write!(f, " ")?;
                write_node(f, child)?;
            }
            Ok(())
        }
        NodeKind::From => {
            write!(f, "from ")?;
            write_node(f, &node.children()[0])
        }
        NodeKind::Group => {
            write!(f, "group {}", node.children()[0].value())
        }
        NodeKind::Primary => {
            write!(f, "primary {}", node.children()[0].value())
        }
        NodeKind::Where => {
            write!(f, "where ")?;
            write_node(f, &node.children()[0])
        }
        NodeKind::Traverse => {
            write!(f, "traverse {}", node.children()[0].value())?;
            for child in &node.children()[1..] {
                write!(f, " ")?;
                write_node(f, child)?;
            }
            write!(f, " end")
        }
        NodeKind::Show | NodeKind::With => {
            write!(f, "{} ", node.kind().name())?;
            write_list(f, node.children())
        }
        NodeKind::ShowTerm => {
            for (i, child) in node.children().iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write_node(f, child)?;
            }
            Ok(())
        }
        NodeKind::As | NodeKind::Format => {
            write!(f, "{} {}", node.kind().name(), node.children()[0].value())
        }
        NodeKind::Ordering | NodeKind::Filtering | NodeKind::NullTraversal => {
            write!(f, "{}(", node.kind().name())?;
            write_list(f, node.children())?;
            write!(f, ")")
        }
        NodeKind::Ascending
        | NodeKind::Descending
        | NodeKind::Unique
        | NodeKind::UniqueCount
        | NodeKind::IsNull
        | NodeKind::IsNotNull => {
            write!(f, "{} {}", node.kind().name(), node.children()[0].value())
        }
        NodeKind::Not => {
            write!(f, "not ")?;
            write_operand(f, &node.children()[0], node.kind().binding_power())
        }
        NodeKind::Add | NodeKind::Sub if node.children().len() == 1 => {
            write!(f, "{}", node.kind().name())?;
            // Unary operators bind tighter than any binary operator.
            write_operand(f, &node.children()[0], 130)
        }
        NodeKind::And
        | NodeKind::Or
        | NodeKind::Eq
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
        | NodeKind::ContainsNot
        | NodeKind::Add
        | NodeKind::Sub
        | NodeKind::Mul
        | NodeKind::Div
        | NodeKind::DivInt
        | NodeKind::Mod => {
            let bp = node.kind().binding_power();
            write_left_operand(f, &node.children()[0], bp)?;
            write!(f, " {} ", node.kind().name())?;
            write_operand(f, &node.children()[1], bp)
        }
        NodeKind::Func => {
            write!(f, "@{}(", node.value())?;
            write_list(f, node.children())?;
            write!(f, ")")
        }
        NodeKind::List => {
            write!(f, "[")?;
            write_list(f, node.children())?;
            write!(f, "]")
        }
        NodeKind::Value => write_value(f, node),
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Ast]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_node(f, item)?;
    }
    Ok(())
}

/// A left operand only needs parentheses when it binds looser than its
/// parent; an equal power re-parses identically because operators are
/// left-associative.
fn write_left_operand(f: &mut fmt::Formatter<'_>, child: &Ast, parent_bp: u8) -> fmt::Result {
    if child.kind().binding_power() < parent_bp {
        write!(f, "(")?;
        write_node(f, child)?;
        write!(f, ")")
    } else {
        write_node(f, child)
    }
}

/// Right (and unary) operands additionally need parentheses at equal power.
fn write_operand(f: &mut fmt::Formatter<'_>, child: &Ast, parent_bp: u8) -> fmt::Result {
    let child_bp = child.kind().binding_power();
    if child_bp < parent_bp || (child_bp == parent_bp && child.children().len() > 1) {
        write!(f, "(")?;
        write_node(f, child)?;
        write!(f, ")")
    } else {
        write_node(f, child)
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, node: &AstNode) -> fmt::Result {
    if node.token().kind() == TokenKind::QuotedValue {
        f.write_char('\'')?;
        for c in node.value().chars() {
            write_character(c, f)?;
        }
        f.write_char('\'')
    } else {
        write!(f, "{}", node.value())
    }
}

/// Write and optionally escape a character inside a quoted string value.
fn write_character(c: char, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match c {
        '\'' => f.write_str(r"\'"),
        '\u{0008}' => f.write_str(r"\b"),
        '\u{000c}' => f.write_str(r"\f"),
        '\n' => f.write_str(r"\n"),
        '\r' => f.write_str(r"\r"),
        '\t' => f.write_str(r"\t"),
        '\\' => f.write_str(r"\\"),
        c if c.is_control() => write!(f, "\\u{:04x}", c as u32),
        c => f.write_char(c),
    }
}
