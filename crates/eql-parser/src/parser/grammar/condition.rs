//! Pratt/TDOP expression parsing for where-clause conditions.
//!
//! Every token kind carries a binding power plus a null denotation (how it
//! starts an expression) and, for operators, a left denotation (how it
//! combines with a left operand). [`expression`] consumes a null denotation
//! and then folds left denotations while the lookahead binds tighter than
//! the caller's right binding power.

use crate::ast::Ast;
use crate::ast::NodeKind;
use crate::lexer::Token;
use crate::lexer::TokenKind;
use crate::Parser;
use crate::SyntaxError;

pub(crate) fn expression(p: &mut Parser, rbp: u8) -> Result<Ast, SyntaxError> {
    let token = p.pop()?;
    p.enter_expression(&token)?;

    let result = expression_from(p, token, rbp);

    p.exit_expression();
    result
}

fn expression_from(p: &mut Parser, token: Token, rbp: u8) -> Result<Ast, SyntaxError> {
    let mut left = null_denotation(p, token)?;

    while left_binding_power(p.peek()?.kind()) > rbp {
        let token = p.pop()?;
        left = left_denotation(p, token, left)?;
    }

    Ok(left)
}

/// Binding power of a token when it appears after a complete operand.
fn left_binding_power(kind: TokenKind) -> u8 {
    match kind {
        TokenKind::Or => 30,
        TokenKind::And | TokenKind::Not => 40,
        TokenKind::Eq
        | TokenKind::Neq
        | TokenKind::Gt
        | TokenKind::Gte
        | TokenKind::Lt
        | TokenKind::Lte
        | TokenKind::Like
        | TokenKind::In
        | TokenKind::NotIn
        | TokenKind::Contains
        | TokenKind::BeginsWith
        | TokenKind::EndsWith
        | TokenKind::ContainsNot => 60,
        TokenKind::Plus | TokenKind::Minus => 110,
        TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash | TokenKind::Percent => 120,
        TokenKind::At => 150,
        _ => 0,
    }
}

fn null_denotation(p: &mut Parser, token: Token) -> Result<Ast, SyntaxError> {
    match token.kind() {
        TokenKind::Value
        | TokenKind::QuotedValue
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Null => Ok(Ast::new(NodeKind::Value, token, Vec::new())),

        // Unary operators bind tighter than any binary operator; `not` sits
        // with `and` so that comparisons group under it.
        TokenKind::Minus => {
            let operand = expression(p, 130)?;
            Ok(Ast::new(NodeKind::Sub, token, vec![operand]))
        }
        TokenKind::Plus => {
            let operand = expression(p, 130)?;
            Ok(Ast::new(NodeKind::Add, token, vec![operand]))
        }
        TokenKind::Not => {
            let operand = expression(p, 40)?;
            Ok(Ast::new(NodeKind::Not, token, vec![operand]))
        }

        TokenKind::LParen => {
            let inner = expression(p, 0)?;
            p.expect(TokenKind::RParen)?;
            Ok(inner)
        }

        TokenKind::LBracket => {
            let mut items = Vec::new();
            if !p.at(TokenKind::RBracket)? {
                loop {
                    items.push(expression(p, 0)?);
                    if p.at(TokenKind::Comma)? {
                        p.pop()?;
                    } else {
                        break;
                    }
                }
            }
            p.expect(TokenKind::RBracket)?;
            Ok(Ast::new(NodeKind::List, token, items))
        }

        TokenKind::At => function(p, &token),

        TokenKind::Eof => Err(p.err_unexpected(&token)),
        kind if kind.is_keyword() => Err(p.err_unexpected(&token)),
        _ => Err(p.err_at(&token, "Term cannot start an expression", token.value())),
    }
}

fn left_denotation(p: &mut Parser, token: Token, left: Ast) -> Result<Ast, SyntaxError> {
    let kind = match token.kind() {
        TokenKind::Or => NodeKind::Or,
        TokenKind::And => NodeKind::And,
        TokenKind::Eq => NodeKind::Eq,
        TokenKind::Neq => NodeKind::Neq,
        TokenKind::Gt => NodeKind::Gt,
        TokenKind::Gte => NodeKind::Gte,
        TokenKind::Lt => NodeKind::Lt,
        TokenKind::Lte => NodeKind::Lte,
        TokenKind::Like => NodeKind::Like,
        TokenKind::In => NodeKind::In,
        TokenKind::NotIn => NodeKind::NotIn,
        TokenKind::Contains => NodeKind::Contains,
        TokenKind::BeginsWith => NodeKind::BeginsWith,
        TokenKind::EndsWith => NodeKind::EndsWith,
        TokenKind::ContainsNot => NodeKind::ContainsNot,
        TokenKind::Plus => NodeKind::Add,
        TokenKind::Minus => NodeKind::Sub,
        TokenKind::Star => NodeKind::Mul,
        TokenKind::Slash => NodeKind::Div,
        TokenKind::SlashSlash => NodeKind::DivInt,
        TokenKind::Percent => NodeKind::Mod,
        _ => {
            return Err(p.err_at(
                &token,
                "Term can only start an expression",
                token.value(),
            ))
        }
    };

    let right = expression(p, kind.binding_power())?;
    Ok(Ast::new(kind, token, vec![left, right]))
}

/// FunctionCall
///     Name **(** (Expression (**,** Expression)*)? **)**
///
/// The `@` token has already been consumed by the caller.
pub(crate) fn function(p: &mut Parser, _at: &Token) -> Result<Ast, SyntaxError> {
    let name = p.expect_value()?;
    p.expect(TokenKind::LParen)?;

    let mut args = Vec::new();
    if !p.at(TokenKind::RParen)? {
        loop {
            args.push(expression(p, 0)?);
            if p.at(TokenKind::Comma)? {
                p.pop()?;
            } else {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen)?;

    Ok(Ast::new(NodeKind::Func, name, args))
}
