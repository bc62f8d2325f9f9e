mod token;
mod token_kind;

use crate::LimitTracker;
use crate::SyntaxError;

pub use token::Token;
pub use token_kind::TokenKind;

/// Parses EQL query text into tokens.
///
/// The lexer is lazy: tokens are produced on demand through the `Iterator`
/// implementation, each either a [`Token`] or a [`SyntaxError`]. The stream
/// ends with a single `Eof` token.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    name: &'a str,
    input: &'a str,
    offset: usize,
    line: u32,
    pos: u32,
    finished: bool,
    pub(crate) limit_tracker: LimitTracker,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for `input`; `name` identifies the query in errors.
    pub fn new(name: &'a str, input: &'a str) -> Self {
        Self {
            name,
            input,
            offset: 0,
            line: 1,
            pos: 1,
            finished: false,
            limit_tracker: LimitTracker::new(usize::MAX),
        }
    }

    /// Abort lexing after `limit` tokens.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit_tracker = LimitTracker::new(limit);
        self
    }

    fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.pos = 1;
        } else {
            self.pos += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            return true;
        }
        false
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn err(&self, message: &str, data: impl Into<String>, line: u32, pos: u32) -> SyntaxError {
        SyntaxError::new(self.name, message, data, line, pos)
    }

    fn advance(&mut self) -> Result<Token, SyntaxError> {
        let (line, pos) = (self.line, self.pos);
        let c = self.peek().expect("advance is only called with input left");

        // Raw strings take no escapes.
        if c == 'r' && matches!(self.peek_second(), Some('\'') | Some('"')) {
            self.bump();
            return self.raw_string(line, pos);
        }

        if is_value_char(c) {
            return Ok(self.value(line, pos));
        }
        if c == '\'' || c == '"' {
            return self.quoted_string(c, line, pos);
        }

        self.bump();
        let kind = match c {
            '=' => TokenKind::Eq,
            '>' => {
                if self.eat('=') {
                    TokenKind::Gte
                } else {
                    TokenKind::Gt
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::Lte
                } else {
                    TokenKind::Lt
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::Neq
                } else {
                    return Err(self.err("Unexpected character", "!", line, pos));
                }
            }
            '/' => {
                if self.eat('/') {
                    TokenKind::SlashSlash
                } else {
                    TokenKind::Slash
                }
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '@' => TokenKind::At,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '%' => TokenKind::Percent,
            c => return Err(self.err("Unexpected character", c.to_string(), line, pos)),
        };

        let value = &self.input[self.offset - kind_len(kind)..self.offset];
        Ok(Token::new(kind, value, line, pos))
    }

    fn value(&mut self, line: u32, pos: u32) -> Token {
        let start = self.offset;
        while let Some(c) = self.peek() {
            if !is_value_char(c) {
                break;
            }
            self.bump();
        }
        let lexeme = &self.input[start..self.offset];

        if lexeme.chars().all(|c| c.is_ascii_alphabetic()) {
            if let Some(kind) = TokenKind::keyword(&lexeme.to_ascii_lowercase()) {
                let canonical = kind.canonical().expect("keyword kinds have a lexeme");
                return Token::new(kind, canonical, line, pos);
            }
        }

        Token::new(TokenKind::Value, lexeme, line, pos)
    }

    fn quoted_string(
        &mut self,
        quote: char,
        line: u32,
        pos: u32,
    ) -> Result<Token, SyntaxError> {
        self.bump();
        let mut value = String::new();

        loop {
            let Some(c) = self.bump() else {
                return Err(self.err("Unterminated string", "", line, pos));
            };
            if c == quote {
                break;
            }
            if c != '\\' {
                value.push(c);
                continue;
            }

            let Some(esc) = self.bump() else {
                return Err(self.err("Unterminated string", "", line, pos));
            };
            match esc {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                'b' => value.push('\u{0008}'),
                'f' => value.push('\u{000c}'),
                '0' => value.push('\0'),
                '\\' | '\'' | '"' => value.push(esc),
                'u' => {
                    let mut code = 0u32;
                    for _ in 0..4 {
                        let Some(d) = self.bump().and_then(|c| c.to_digit(16)) else {
                            return Err(self.err(
                                "Invalid escape sequence",
                                "\\u",
                                line,
                                pos,
                            ));
                        };
                        code = code * 16 + d;
                    }
                    match char::from_u32(code) {
                        Some(c) => value.push(c),
                        None => {
                            return Err(self.err(
                                "Invalid escape sequence",
                                "\\u",
                                line,
                                pos,
                            ))
                        }
                    }
                }
                c => {
                    return Err(self.err(
                        "Invalid escape sequence",
                        format!("\\{c}"),
                        line,
                        pos,
                    ))
                }
            }
        }

        Ok(Token::new(TokenKind::QuotedValue, value, line, pos))
    }

    fn raw_string(&mut self, line: u32, pos: u32) -> Result<Token, SyntaxError> {
        let quote = self.bump().expect("raw string starts with a quote");
        let start = self.offset;
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    let value = &self.input[start..self.offset];
                    self.bump();
                    return Ok(Token::new(TokenKind::QuotedValue, value, line, pos));
                }
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.err("Unterminated string", "", line, pos)),
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        self.limit_tracker.consume();
        if self.limit_tracker.limited() {
            self.finished = true;
            return Some(Err(self.err(
                "Token limit reached, aborting lexing",
                "",
                self.line,
                self.pos,
            )));
        }

        self.skip_whitespace();
        if self.peek().is_none() {
            self.finished = true;
            return Some(Ok(Token::new(TokenKind::Eof, "", self.line, self.pos)));
        }

        Some(self.advance())
    }
}

fn is_value_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.')
}

fn kind_len(kind: TokenKind) -> usize {
    match kind {
        TokenKind::Gte | TokenKind::Lte | TokenKind::Neq | TokenKind::SlashSlash => 2,
        _ => 1,
    }
}
