use crate::ast::Ast;
use crate::ast::NodeKind;
use crate::lexer::Token;
use crate::lexer::TokenKind;
use crate::SyntaxError;
use serde::Deserialize;
use serde::Serialize;

/// Plain-data form of an AST node, for serialization and interchange.
///
/// The conversion is lossless for accepted queries:
///
/// ```rust
/// use eql_parser::PlainAst;
///
/// let ast = eql_parser::parse_query("test", "get Author where name = 'Mike'").unwrap();
/// let plain = PlainAst::from(&ast);
/// let back = plain.to_ast().unwrap();
///
/// assert_eq!(ast, back);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainAst {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlainAst>,
}

impl From<&Ast> for PlainAst {
    fn from(ast: &Ast) -> Self {
        PlainAst {
            name: ast.kind().name().to_string(),
            value: ast.value().to_string(),
            children: ast.children().iter().map(PlainAst::from).collect(),
        }
    }
}

impl PlainAst {
    /// Rebuild an [`Ast`] from its plain form.
    ///
    /// Positions are lost in the plain form, so reconstructed tokens report
    /// line 0 / position 0. String values that cannot be re-lexed as a bare
    /// value (or that would collide with a keyword) come back quoted.
    pub fn to_ast(&self) -> Result<Ast, SyntaxError> {
        let kind = NodeKind::from_name(&self.name).ok_or_else(|| {
            SyntaxError::new("plain AST", "Unknown term", self.name.clone(), 0, 0)
        })?;

        let token_kind = match kind {
            NodeKind::Value if !is_bare_value(&self.value) => TokenKind::QuotedValue,
            NodeKind::Value => TokenKind::Value,
            NodeKind::Func => TokenKind::Value,
            _ => TokenKind::Value,
        };
        let token = Token::new(token_kind, self.value.clone(), 0, 0);

        let children = self
            .children
            .iter()
            .map(PlainAst::to_ast)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Ast::new(kind, token, children))
    }
}

/// Whether a value round-trips through the lexer as a single bare token.
fn is_bare_value(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.'))
    {
        return false;
    }
    // A purely alphabetic value would be re-lexed as a keyword.
    !(value.chars().all(|c| c.is_ascii_alphabetic())
        && TokenKind::keyword(&value.to_ascii_lowercase()).is_some())
}
