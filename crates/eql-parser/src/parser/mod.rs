mod grammar;

use crate::ast::Ast;
use crate::lexer::Lexer;
use crate::lexer::Token;
use crate::lexer::TokenKind;
use crate::LimitTracker;
use crate::SyntaxError;

/// Parse EQL queries into a typed AST.
///
/// ## Example
///
/// ```rust
/// use eql_parser::Parser;
///
/// let query = "get Author where name = 'Mike' traverse :::Song end show Song:name";
/// let ast = Parser::new("test", query).parse().unwrap();
///
/// assert_eq!(ast.to_string(), query);
/// ```
#[derive(Debug)]
pub struct Parser<'input> {
    name: String,
    lexer: Lexer<'input>,
    /// Store one lookahead token so we don't need to re-lex things.
    current_token: Option<Token>,
    /// The limit to apply to expression recursion.
    recursion_limit: LimitTracker,
}

/// Expressions recurse once per nesting level; queries are flat otherwise.
/// This couldn't be set much higher before deeply nested inputs hit the
/// call-stack limit in unoptimized builds, so keep a comfortable margin.
const DEFAULT_RECURSION_LIMIT: usize = 500;

impl<'input> Parser<'input> {
    /// Create a new instance of a parser given a query name and input string.
    pub fn new(name: &str, input: &'input str) -> Self {
        Self {
            name: name.to_string(),
            lexer: Lexer::new("", input),
            current_token: None,
            recursion_limit: LimitTracker::new(DEFAULT_RECURSION_LIMIT),
        }
    }

    /// Configure the recursion limit to use while parsing.
    pub fn recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_limit = LimitTracker::new(recursion_limit);
        self
    }

    /// Configure the limit on the number of tokens to parse. If an input
    /// query is too big, parsing is aborted.
    ///
    /// By default, there is no limit.
    pub fn token_limit(mut self, token_limit: usize) -> Self {
        self.lexer = self.lexer.clone().with_limit(token_limit);
        self
    }

    /// Parse the query and return its AST.
    pub fn parse(mut self) -> Result<Ast, SyntaxError> {
        let ast = grammar::query::query(&mut self)?;

        let trailing = self.pop()?;
        if trailing.kind() != TokenKind::Eof {
            return Err(self.err_unexpected(&trailing));
        }
        Ok(ast)
    }

    /// Peek the next token without consuming it.
    pub(crate) fn peek(&mut self) -> Result<&Token, SyntaxError> {
        if self.current_token.is_none() {
            self.current_token = Some(self.next_token()?);
        }
        Ok(self.current_token.as_ref().expect("lookahead was just set"))
    }

    /// Check whether the next token is of the given kind.
    pub(crate) fn at(&mut self, kind: TokenKind) -> Result<bool, SyntaxError> {
        Ok(self.peek()?.kind() == kind)
    }

    /// Consume and return the next token.
    pub(crate) fn pop(&mut self) -> Result<Token, SyntaxError> {
        if let Some(token) = self.current_token.take() {
            return Ok(token);
        }
        self.next_token()
    }

    /// Consume the next token if it is of the given kind, error otherwise.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        let token = self.pop()?;
        if token.kind() != kind {
            return Err(self.err_unexpected(&token));
        }
        Ok(token)
    }

    /// Consume the next token, which must be a bare or quoted value.
    pub(crate) fn expect_value(&mut self) -> Result<Token, SyntaxError> {
        let token = self.pop()?;
        match token.kind() {
            TokenKind::Value | TokenKind::QuotedValue => Ok(token),
            _ => Err(self.err_unexpected(&token)),
        }
    }

    /// Consume the next token, which must be a bare value shaped like a node
    /// kind: colon-joined parts, each `[a-zA-Z][a-zA-Z0-9_]*`.
    pub(crate) fn expect_node_kind(&mut self) -> Result<Token, SyntaxError> {
        let token = self.pop()?;
        if token.kind() != TokenKind::Value {
            return Err(self.err_unexpected(&token));
        }
        let valid = token.value().split(':').all(|part| {
            let mut chars = part.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid {
            return Err(self.err_at(&token, "Invalid node kind", token.value()));
        }
        Ok(token)
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        let mut result = self
            .lexer
            .next()
            .expect("the lexer never runs out before Eof");
        if let Err(err) = &mut result {
            err.name = self.name.clone();
        }
        result
    }

    /// `Unexpected end` at Eof, `Unexpected term (<lexeme>)` otherwise.
    pub(crate) fn err_unexpected(&self, token: &Token) -> SyntaxError {
        if token.kind() == TokenKind::Eof {
            self.err_at(token, "Unexpected end", "")
        } else {
            self.err_at(token, "Unexpected term", token.value())
        }
    }

    pub(crate) fn err_at(
        &self,
        token: &Token,
        message: &str,
        data: impl Into<String>,
    ) -> SyntaxError {
        SyntaxError::new(self.name.clone(), message, data, token.line(), token.pos())
    }

    /// Guard one level of expression recursion. Callers must pair this with
    /// [`Parser::exit_expression`].
    pub(crate) fn enter_expression(&mut self, at: &Token) -> Result<(), SyntaxError> {
        self.recursion_limit.consume();
        if self.recursion_limit.limited() {
            return Err(self.err_at(at, "Parser recursion limit reached", ""));
        }
        Ok(())
    }

    pub(crate) fn exit_expression(&mut self) {
        self.recursion_limit.release();
    }
}

#[cfg(test)]
mod tests {
    use crate::parse_query;
    use crate::Parser;
    use expect_test::expect;
    use pretty_assertions::assert_eq;

    /// Every accepted query re-parses from its canonical printed form to a
    /// structurally identical AST, and the printed form is a fixpoint.
    #[test]
    fn parse_print_parse_fidelity() {
        let queries = [
            "get Author",
            "lookup Author '123', '456'",
            "lookup Author '123' from group Best",
            "get Author from group Best primary Song where name = 'Mike' \
             traverse :::Song where ranking > 2 end \
             show Author:name, Song:name as Title format text \
             with ordering(ascending Author:name), nulltraversal(true)",
            "get datetest where @parseDate(RFC3339_value) = unix",
            "get Author where (name beginswith 'M') or name beginswith 'L'",
            "get mynode where ranking >= 2.1 and ranking < 3",
            "get x where a + b * c = 7 and not d or e in [1, 2, [3]]",
            "get x where -(a + b) = -c",
            "get x where not (a or b)",
            "get x where a - (b - c) = a - b - c",
            "get x where name like r'^[A-Z].*'",
            "get Author traverse :::Song traverse Song:Wrote:Author:Author end end",
            "get Author show name, @count(1, :::Song) as mycount format xxx",
            "get Author with filtering(uniquecount Author:name), \
             ordering(descending key, ascending name)",
        ];

        for query in queries {
            let ast = parse_query("test", query).unwrap();
            let printed = ast.to_string();
            let reparsed = parse_query("test", &printed)
                .unwrap_or_else(|err| panic!("{printed}: {err}"));
            assert_eq!(ast, reparsed, "{query}");
            assert_eq!(printed, reparsed.to_string(), "{query}");
        }
    }

    #[test]
    fn canonical_print_is_pinned() {
        let cases = [
            ("GET Author WHERE name='x'", "get Author where name = 'x'"),
            (
                "get Author where (name beginswith 'M') or name beginswith 'L'",
                "get Author where name beginswith 'M' or name beginswith 'L'",
            ),
            (
                "get  datetest  where  @parseDate( RFC3339_value ) = unix",
                "get datetest where @parseDate(RFC3339_value) = unix",
            ),
            (
                "lookup Author \"123\",\"456\" primary Song",
                "lookup Author '123', '456' primary Song",
            ),
            (
                "get x with ordering(asc a, desc b)",
                "get x with ordering(ascending a, descending b)",
            ),
        ];
        for (input, expected) in cases {
            let ast = parse_query("test", input).unwrap();
            assert_eq!(ast.to_string(), expected);
        }
    }

    #[test]
    fn precedence_shapes_the_tree() {
        let ast = parse_query("test", "get x where a + b * c = 7 and not d or e").unwrap();
        let expected = expect![[r#"
            get
              value "x"
              where
                or
                  and
                    =
                      +
                        value "a"
                        *
                          value "b"
                          value "c"
                      value "7"
                    not
                      value "d"
                  value "e"
        "#]];
        expected.assert_debug_eq(&ast);
    }

    #[test]
    fn traversals_nest() {
        let ast = parse_query(
            "test",
            "get Author traverse :::Song where ranking > 2 traverse :::Producer end end",
        )
        .unwrap();
        let expected = expect![[r#"
            get
              value "Author"
              traverse
                value ":::Song"
                where
                  >
                    value "ranking"
                    value "2"
                traverse
                  value ":::Producer"
        "#]];
        expected.assert_debug_eq(&ast);
    }

    #[test]
    fn show_terms_carry_alias_and_format() {
        let ast = parse_query(
            "test",
            "get Author show name as Name format text, @count(1, :::Song) as mycount",
        )
        .unwrap();
        let expected = expect![[r#"
            get
              value "Author"
              show
                showterm
                  value "name"
                  as
                    value "Name"
                  format
                    value "text"
                showterm
                  func "count"
                    value "1"
                    value ":::Song"
                  as
                    value "mycount"
        "#]];
        expected.assert_debug_eq(&ast);
    }

    #[test]
    fn errors_are_textually_stable() {
        let cases = [
            (
                "get Author where",
                "Parse error in test: Unexpected end (Line:1 Pos:17)",
            ),
            (
                "get Author show name where a = 1",
                "Parse error in test: Unexpected term (where) (Line:1 Pos:22)",
            ),
            (
                "get 1Author",
                "Parse error in test: Invalid node kind (1Author) (Line:1 Pos:5)",
            ),
            (
                "get Author where = 5",
                "Parse error in test: Term cannot start an expression (=) (Line:1 Pos:18)",
            ),
            (
                "get Author where a not b",
                "Parse error in test: Term can only start an expression (not) (Line:1 Pos:20)",
            ),
            (
                "get Author where show",
                "Parse error in test: Unexpected term (show) (Line:1 Pos:18)",
            ),
            (
                "get Author traverse :::Song",
                "Parse error in test: Unexpected end (Line:1 Pos:28)",
            ),
            (
                "select Author",
                "Parse error in test: Unexpected term (select) (Line:1 Pos:1)",
            ),
        ];
        for (query, expected) in cases {
            let err = parse_query("test", query).unwrap_err();
            assert_eq!(err.to_string(), expected, "{query}");
        }
    }

    #[test]
    fn only_one_root_where_is_accepted() {
        let err = parse_query("test", "get Author where a = 1 where b = 2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error in test: Unexpected term (where) (Line:1 Pos:24)"
        );
    }

    #[test]
    fn recursion_limit_guards_nested_expressions() {
        let mut query = String::from("get x where ");
        query.push_str(&"(".repeat(100));
        query.push('a');
        query.push_str(&")".repeat(100));

        let err = Parser::new("test", &query)
            .recursion_limit(10)
            .parse()
            .unwrap_err();
        assert_eq!(err.message(), "Parser recursion limit reached");

        assert!(Parser::new("test", &query).parse().is_ok());
    }

    #[test]
    fn token_limit_aborts_parsing() {
        let err = Parser::new("test", "get Author where name = 'Mike'")
            .token_limit(3)
            .parse()
            .unwrap_err();
        assert_eq!(err.message(), "Token limit reached, aborting lexing");
    }
}
