//! Recursive-descent parser. Builds the [`crate::ast`] tree from a token
//! stream, reporting syntax errors through a [`DiagnosticSink`] and
//! resynchronizing at statement boundaries instead of aborting on the
//! first error.

use std::cell::Cell;
use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::diagnostics::DiagnosticSink;
use crate::token::{Token, TokenKind};

const MAX_ARGS: usize = 255;

/// Unwinds parsing of the current statement back to [`Parser::synchronize`].
/// Not reported itself — the diagnostic was already sent to the sink at the
/// point of failure.
struct ParseError;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self { tokens, current: 0, sink }
    }

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(ParseError) => self.synchronize(),
            }
        }
        statements
    }

    // --- token cursor helpers ---

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(&self.peek().clone(), message))
        }
    }

    fn error(&mut self, token: &Token, message: &str) -> ParseError {
        self.sink.syntax_token(token, message);
        ParseError
    }

    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // --- declarations ---

    fn declaration(&mut self) -> Result<Stmt, ParseError> {
        if self.matches(&[TokenKind::Class]) {
            self.class_declaration()
        } else if self.matches(&[TokenKind::Fun]) {
            Ok(Stmt::Fun(Rc::new(self.function("function")?)))
        } else if self.matches(&[TokenKind::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Expect class name.")?;

        let superclass = if self.matches(&[TokenKind::Less]) {
            let super_name = self.consume(TokenKind::Identifier, "Expect superclass name.")?;
            Some(Expr::Variable { name: super_name, depth: Cell::new(crate::ast::UNRESOLVED) })
        } else {
            None
        };

        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.")?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(Rc::new(self.function("method")?));
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class { name, superclass, methods })
    }

    fn function(&mut self, kind: &str) -> Result<FunctionDecl, ParseError> {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {kind} name."))?;
        self.consume(TokenKind::LeftParen, &format!("Expect '(' after {kind} name."))?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    let peek = self.peek().clone();
                    self.sink.syntax_token(&peek, "Can't have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;
        Ok(FunctionDecl { name, params, body })
    }

    fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let init = if self.matches(&[TokenKind::Equal]) { Some(self.expression()?) } else { None };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, init })
    }

    // --- statements ---

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.matches(&[TokenKind::For]) {
            self.for_statement()
        } else if self.matches(&[TokenKind::If]) {
            self.if_statement()
        } else if self.matches(&[TokenKind::Return]) {
            self.return_statement()
        } else if self.matches(&[TokenKind::While]) {
            self.while_statement()
        } else if self.matches(&[TokenKind::Break]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.")?;
            Ok(Stmt::Break(keyword))
        } else if self.matches(&[TokenKind::Continue]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Semicolon, "Expect ';' after 'continue'.")?;
            Ok(Stmt::Continue(keyword))
        } else if self.matches(&[TokenKind::LeftBrace]) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let init = if self.matches(&[TokenKind::Semicolon]) {
            None
        } else if self.matches(&[TokenKind::Var]) {
            Some(Box::new(self.var_declaration()?))
        } else {
            Some(Box::new(self.expression_statement()?))
        };

        let cond = if !self.check(TokenKind::Semicolon) { Some(self.expression()?) } else { None };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let incr = if !self.check(TokenKind::RightParen) { Some(self.expression()?) } else { None };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::For { init, cond, incr, body })
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For { init: None, cond: Some(cond), incr: None, body })
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch =
            if self.matches(&[TokenKind::Else]) { Some(Box::new(self.statement()?)) } else { None };
        Ok(Stmt::If { cond, then_branch, else_branch })
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenKind::Semicolon) { Some(self.expression()?) } else { None };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // --- expressions ---

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.or()?;

        if self.matches(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = Box::new(self.assignment()?);
            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign { name, value, depth: Cell::new(crate::ast::UNRESOLVED) }),
                Expr::Get { object, name } => Ok(Expr::Set { object, name, value }),
                _ => Err(self.error(&equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and()?;
        while self.matches(&[TokenKind::Or]) {
            let op = self.previous().clone();
            let right = Box::new(self.and()?);
            expr = Expr::Logical { op, left: Box::new(expr), right };
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;
        while self.matches(&[TokenKind::And]) {
            let op = self.previous().clone();
            let right = Box::new(self.equality()?);
            expr = Expr::Logical { op, left: Box::new(expr), right };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;
        while self.matches(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let op = self.previous().clone();
            let right = Box::new(self.comparison()?);
            expr = Expr::Binary { op, left: Box::new(expr), right };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        while self.matches(&[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual]) {
            let op = self.previous().clone();
            let right = Box::new(self.term()?);
            expr = Expr::Binary { op, left: Box::new(expr), right };
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        while self.matches(&[TokenKind::Minus, TokenKind::Plus]) {
            let op = self.previous().clone();
            let right = Box::new(self.factor()?);
            expr = Expr::Binary { op, left: Box::new(expr), right };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        while self.matches(&[TokenKind::Slash, TokenKind::Star]) {
            let op = self.previous().clone();
            let right = Box::new(self.unary()?);
            expr = Expr::Binary { op, left: Box::new(expr), right };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { op, right });
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.matches(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.matches(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get { object: Box::new(expr), name };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    let peek = self.peek().clone();
                    self.sink.syntax_token(&peek, "Can't have more than 255 arguments.");
                }
                args.push(self.expression()?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call { callee: Box::new(callee), paren, args })
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        if self.matches(&[
            TokenKind::False,
            TokenKind::True,
            TokenKind::Nil,
            TokenKind::Number,
            TokenKind::String,
        ]) {
            return Ok(Expr::Literal(self.previous().clone()));
        }

        if self.matches(&[TokenKind::Super]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(TokenKind::Identifier, "Expect superclass method name.")?;
            return Ok(Expr::Super { keyword, method, depth: Cell::new(crate::ast::UNRESOLVED) });
        }

        if self.matches(&[TokenKind::This]) {
            return Ok(Expr::This { keyword: self.previous().clone(), depth: Cell::new(crate::ast::UNRESOLVED) });
        }

        if self.matches(&[TokenKind::Identifier]) {
            return Ok(Expr::Variable { name: self.previous().clone(), depth: Cell::new(crate::ast::UNRESOLVED) });
        }

        if self.matches(&[TokenKind::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(self.error(&self.peek().clone(), "Expect expression."))
    }
}
