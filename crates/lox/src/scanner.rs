//! Converts raw source text into a flat token stream. One pass, no
//! lookahead beyond a single character of peek.

use crate::diagnostics::DiagnosticSink;
use crate::token::{Token, TokenKind, KEYWORDS};

pub struct Scanner<'a> {
    source: &'a [u8],
    start: usize,
    current: usize,
    line: usize,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), start: 0, current: 0, line: 1, tokens: Vec::new() }
    }

    pub fn scan_tokens(mut self, sink: &mut dyn DiagnosticSink) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(sink);
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", self.line));
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current] as char;
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current] as char
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1] as char
        }
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> &str {
        std::str::from_utf8(&self.source[self.start..self.current]).expect("scanner: non-UTF-8 slice boundary")
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = self.lexeme().to_string();
        self.tokens.push(Token::new(kind, lexeme, self.line));
    }

    fn scan_token(&mut self, sink: &mut dyn DiagnosticSink) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),
            '!' => {
                let kind = if self.matches('=') { TokenKind::BangEqual } else { TokenKind::Bang };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.matches('=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.matches('=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.matches('=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.add_token(kind);
            }
            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(sink),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            _ => sink.syntax_line(self.line, &format!("Unexpected character '{c}'.")),
        }
    }

    fn string(&mut self, sink: &mut dyn DiagnosticSink) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }
        if self.is_at_end() {
            sink.syntax_line(self.line, "Unterminated string.");
            return;
        }
        self.advance();
        self.add_token(TokenKind::String);
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        self.add_token(TokenKind::Number);
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }
        let text = self.lexeme();
        let kind = KEYWORDS.iter().find(|(kw, _)| *kw == text).map(|(_, kind)| *kind).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }
}
