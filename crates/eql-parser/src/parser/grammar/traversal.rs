use crate::ast::Ast;
use crate::ast::NodeKind;
use crate::lexer::TokenKind;
use crate::parser::grammar::condition;
use crate::Parser;
use crate::SyntaxError;

/// TraversalBlock
///     **traverse** Spec (**where** Condition)? TraversalBlock* **end**
///
/// The spec is a single value token of the form
/// `<edgeRole>:<edgeKind>:<endRole>:<endKind>`; its colon count is checked
/// by the resolver, not here, so that the error carries runtime context.
pub(crate) fn traversal(p: &mut Parser) -> Result<Ast, SyntaxError> {
    let traverse = p.expect(TokenKind::Traverse)?;

    let spec = p.expect_value()?;
    let mut children = vec![Ast::new(NodeKind::Value, spec, Vec::new())];

    if p.at(TokenKind::Where)? {
        let where_token = p.pop()?;
        let cond = condition::expression(p, 0)?;
        children.push(Ast::new(NodeKind::Where, where_token, vec![cond]));
    }

    while p.at(TokenKind::Traverse)? {
        children.push(traversal(p)?);
    }

    p.expect(TokenKind::End)?;
    Ok(Ast::new(NodeKind::Traverse, traverse, children))
}
