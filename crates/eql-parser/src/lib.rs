#![doc = include_str!("../README.md")]

mod ast;
mod error;
mod lexer;
mod limit;
mod parser;

pub use crate::ast::Ast;
pub use crate::ast::AstNode;
pub use crate::ast::NodeKind;
pub use crate::ast::PlainAst;
pub use crate::error::SyntaxError;
pub use crate::lexer::Lexer;
pub use crate::lexer::Token;
pub use crate::lexer::TokenKind;
pub use crate::limit::LimitTracker;
pub use crate::parser::Parser;

/// Parse a single EQL query into its AST.
///
/// `name` identifies the query in error messages.
///
/// ```rust
/// let ast = eql_parser::parse_query("test", "get Author where name = 'Mike'").unwrap();
///
/// assert_eq!(ast.to_string(), "get Author where name = 'Mike'");
/// ```
pub fn parse_query(name: &str, input: &str) -> Result<Ast, SyntaxError> {
    Parser::new(name, input).parse()
}
