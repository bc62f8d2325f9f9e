use crate::ast::Ast;
use crate::ast::NodeKind;
use crate::lexer::TokenKind;
use crate::parser::grammar::condition;
use crate::Parser;
use crate::SyntaxError;

/// ShowClause
///     **show** ShowTerm (**,** ShowTerm)*
pub(crate) fn show_clause(p: &mut Parser) -> Result<Ast, SyntaxError> {
    let show = p.expect(TokenKind::Show)?;

    let mut terms = vec![show_term(p)?];
    while p.at(TokenKind::Comma)? {
        p.pop()?;
        terms.push(show_term(p)?);
    }

    Ok(Ast::new(NodeKind::Show, show, terms))
}

/// ShowTerm
///     (Value | **@**FunctionCall) (**as** Value)? (**format** Value)?
fn show_term(p: &mut Parser) -> Result<Ast, SyntaxError> {
    let expr = if p.at(TokenKind::At)? {
        let at = p.pop()?;
        condition::function(p, &at)?
    } else {
        let value = p.expect_value()?;
        Ast::new(NodeKind::Value, value, Vec::new())
    };

    let term_token = expr.token().clone();
    let mut children = vec![expr];

    if p.at(TokenKind::As)? {
        let as_token = p.pop()?;
        let alias = p.expect_value()?;
        children.push(Ast::new(
            NodeKind::As,
            as_token,
            vec![Ast::new(NodeKind::Value, alias, Vec::new())],
        ));
    }

    if p.at(TokenKind::Format)? {
        let format_token = p.pop()?;
        let format = p.expect_value()?;
        children.push(Ast::new(
            NodeKind::Format,
            format_token,
            vec![Ast::new(NodeKind::Value, format, Vec::new())],
        ));
    }

    Ok(Ast::new(NodeKind::ShowTerm, term_token, children))
}
