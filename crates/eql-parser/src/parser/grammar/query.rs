use crate::ast::Ast;
use crate::ast::NodeKind;
use crate::lexer::TokenKind;
use crate::parser::grammar::condition;
use crate::parser::grammar::show;
use crate::parser::grammar::traversal;
use crate::parser::grammar::with_clause;
use crate::Parser;
use crate::SyntaxError;

/// Query
///     GetQuery | LookupQuery
///
/// GetQuery
///     **get** NodeKind Clauses
///
/// LookupQuery
///     **lookup** NodeKind Value (**,** Value)* Clauses
pub(crate) fn query(p: &mut Parser) -> Result<Ast, SyntaxError> {
    let token = p.pop()?;
    match token.kind() {
        TokenKind::Get => {
            let kind = p.expect_node_kind()?;
            let mut children = vec![Ast::new(NodeKind::Value, kind, Vec::new())];
            clauses(p, &mut children)?;
            Ok(Ast::new(NodeKind::Get, token, children))
        }
        TokenKind::Lookup => {
            let kind = p.expect_node_kind()?;
            let mut children = vec![Ast::new(NodeKind::Value, kind, Vec::new())];
            loop {
                let key = p.expect_value()?;
                children.push(Ast::new(NodeKind::Value, key, Vec::new()));
                if p.at(TokenKind::Comma)? {
                    p.pop()?;
                } else {
                    break;
                }
            }
            clauses(p, &mut children)?;
            Ok(Ast::new(NodeKind::Lookup, token, children))
        }
        _ => Err(p.err_unexpected(&token)),
    }
}

/// Clauses, in the only order the language accepts them:
///
///     (**from** **group** Value)? (**primary** NodeKind)? (**where** Condition)?
///     TraversalBlock* ShowClause? WithClause?
fn clauses(p: &mut Parser, children: &mut Vec<Ast>) -> Result<(), SyntaxError> {
    if p.at(TokenKind::From)? {
        let from = p.pop()?;
        let group = p.expect(TokenKind::Group)?;
        let name = p.expect_value()?;
        let group_node = Ast::new(
            NodeKind::Group,
            group,
            vec![Ast::new(NodeKind::Value, name, Vec::new())],
        );
        children.push(Ast::new(NodeKind::From, from, vec![group_node]));
    }

    if p.at(TokenKind::Primary)? {
        let primary = p.pop()?;
        let kind = p.expect_node_kind()?;
        children.push(Ast::new(
            NodeKind::Primary,
            primary,
            vec![Ast::new(NodeKind::Value, kind, Vec::new())],
        ));
    }

    if p.at(TokenKind::Where)? {
        let where_token = p.pop()?;
        let cond = condition::expression(p, 0)?;
        children.push(Ast::new(NodeKind::Where, where_token, vec![cond]));
    }

    while p.at(TokenKind::Traverse)? {
        children.push(traversal::traversal(p)?);
    }

    if p.at(TokenKind::Show)? {
        children.push(show::show_clause(p)?);
    }

    if p.at(TokenKind::With)? {
        children.push(with_clause::with_clause(p)?);
    }

    Ok(())
}
