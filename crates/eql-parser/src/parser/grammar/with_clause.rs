use crate::ast::Ast;
use crate::ast::NodeKind;
use crate::lexer::TokenKind;
use crate::Parser;
use crate::SyntaxError;

/// WithClause
///     **with** WithTerm (**,** WithTerm)*
///
/// WithTerm
///     **ordering(** OrderingArg (**,** OrderingArg)* **)**
///     **filtering(** FilteringArg (**,** FilteringArg)* **)**
///     **nulltraversal(** **true** | **false** **)**
pub(crate) fn with_clause(p: &mut Parser) -> Result<Ast, SyntaxError> {
    let with = p.expect(TokenKind::With)?;

    let mut terms = vec![with_term(p)?];
    while p.at(TokenKind::Comma)? {
        p.pop()?;
        terms.push(with_term(p)?);
    }

    Ok(Ast::new(NodeKind::With, with, terms))
}

fn with_term(p: &mut Parser) -> Result<Ast, SyntaxError> {
    let term = p.pop()?;
    let kind = match term.kind() {
        TokenKind::Ordering => NodeKind::Ordering,
        TokenKind::Filtering => NodeKind::Filtering,
        TokenKind::NullTraversal => NodeKind::NullTraversal,
        _ => return Err(p.err_unexpected(&term)),
    };

    p.expect(TokenKind::LParen)?;
    let mut args = Vec::new();
    loop {
        args.push(with_arg(p, kind)?);
        if p.at(TokenKind::Comma)? {
            p.pop()?;
        } else {
            break;
        }
    }
    p.expect(TokenKind::RParen)?;

    Ok(Ast::new(kind, term, args))
}

fn with_arg(p: &mut Parser, term_kind: NodeKind) -> Result<Ast, SyntaxError> {
    let arg = p.pop()?;
    let kind = match (term_kind, arg.kind()) {
        (NodeKind::Ordering, TokenKind::Ascending) => NodeKind::Ascending,
        (NodeKind::Ordering, TokenKind::Descending) => NodeKind::Descending,
        (NodeKind::Filtering, TokenKind::Unique) => NodeKind::Unique,
        (NodeKind::Filtering, TokenKind::UniqueCount) => NodeKind::UniqueCount,
        (NodeKind::Filtering, TokenKind::IsNull) => NodeKind::IsNull,
        (NodeKind::Filtering, TokenKind::IsNotNull) => NodeKind::IsNotNull,
        (NodeKind::NullTraversal, TokenKind::True | TokenKind::False) => {
            return Ok(Ast::new(NodeKind::Value, arg, Vec::new()));
        }
        _ => return Err(p.err_unexpected(&arg)),
    };

    let column = p.expect_value()?;
    Ok(Ast::new(
        kind,
        arg,
        vec![Ast::new(NodeKind::Value, column, Vec::new())],
    ))
}
