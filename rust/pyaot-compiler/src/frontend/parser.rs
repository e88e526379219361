//! Recursive descent parser producing the generic syntax tree.

use crate::frontend::tokens::{Token, TokenKind};
use pyaot_core::syntax::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected token {found} at line {line}, col {col}; expected {expected}")]
    Unexpected { found: String, expected: String, line: usize, col: usize },
    #[error("unexpected end of input")]
    UnexpectedEof,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map(|t| t.span).unwrap_or_else(Span::dummy);
        Self { tokens, pos: 0, eof: Token::new(TokenKind::Eof, end) }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_ahead(&self, n: usize) -> &TokenKind {
        &self.tokens.get(self.pos + n).unwrap_or(&self.eof).kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Span of the most recently consumed token.
    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or(self.eof.span)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.current();
        if tok.kind == TokenKind::Eof {
            return ParseError::UnexpectedEof;
        }
        ParseError::Unexpected {
            found: tok.kind.to_string(),
            expected: expected.to_string(),
            line: tok.span.line,
            col: tok.span.col,
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                let tok = self.advance();
                Ok((name, tok.span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// A simple statement ends at a newline; the end of a block also ends it.
    fn expect_line_end(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof | TokenKind::Dedent => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    // ── Statements ──

    pub fn parse_module(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.current().span;
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.at_end() {
            body.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(SyntaxNode::new(Node::Module { body }, start.merge(self.prev_span())))
    }

    fn parse_statement(&mut self) -> Result<SyntaxNode, ParseError> {
        match self.peek_kind() {
            TokenKind::At => self.parse_decorated(),
            TokenKind::Def => self.parse_def(Vec::new()),
            TokenKind::Class => self.parse_class(Vec::new()),
            _ => self.parse_simple_statement(),
        }
    }

    fn parse_simple_statement(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.current().span;
        let node = match self.peek_kind() {
            TokenKind::Return => {
                self.advance();
                let value = match self.peek_kind() {
                    TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent => None,
                    _ => Some(Box::new(self.parse_expr()?)),
                };
                Node::Return { value }
            }
            TokenKind::Pass => {
                self.advance();
                Node::Pass
            }
            _ => {
                let first = self.parse_expr()?;
                if matches!(self.peek_kind(), TokenKind::Assign) {
                    let mut targets = vec![first];
                    let mut value;
                    loop {
                        self.advance();
                        value = self.parse_expr()?;
                        if !matches!(self.peek_kind(), TokenKind::Assign) {
                            break;
                        }
                        targets.push(value);
                    }
                    Node::Assign { targets, value: Box::new(value) }
                } else {
                    Node::Expr { value: Box::new(first) }
                }
            }
        };
        let span = start.merge(self.prev_span());
        self.expect_line_end()?;
        Ok(SyntaxNode::new(node, span))
    }

    fn parse_decorated(&mut self) -> Result<SyntaxNode, ParseError> {
        let mut decorators = Vec::new();
        while matches!(self.peek_kind(), TokenKind::At) {
            self.advance();
            decorators.push(self.parse_expr()?);
            self.expect(&TokenKind::Newline)?;
            self.skip_newlines();
        }
        match self.peek_kind() {
            TokenKind::Def => self.parse_def(decorators),
            TokenKind::Class => self.parse_class(decorators),
            _ => Err(self.unexpected("def or class after decorator")),
        }
    }

    fn parse_def(&mut self, decorators: Vec<SyntaxNode>) -> Result<SyntaxNode, ParseError> {
        let start = decorators.first().map(|d| d.span).unwrap_or(self.current().span);
        self.expect(&TokenKind::Def)?;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen) {
            let (arg_name, arg_span) = self.expect_ident()?;
            let annotation = if matches!(self.peek_kind(), TokenKind::Colon) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            args.push(Arg { name: arg_name, annotation, span: arg_span.merge(self.prev_span()) });
            if !matches!(self.peek_kind(), TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RParen)?;
        let returns = if matches!(self.peek_kind(), TokenKind::Arrow) {
            self.advance();
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect(&TokenKind::Colon)?;
        let span = start.merge(self.prev_span());
        let body = self.parse_suite()?;
        Ok(SyntaxNode::new(Node::FunctionDef { name, args, body, returns, decorators }, span))
    }

    fn parse_class(&mut self, decorators: Vec<SyntaxNode>) -> Result<SyntaxNode, ParseError> {
        let start = decorators.first().map(|d| d.span).unwrap_or(self.current().span);
        self.expect(&TokenKind::Class)?;
        let (name, _) = self.expect_ident()?;
        let mut bases = Vec::new();
        if matches!(self.peek_kind(), TokenKind::LParen) {
            self.advance();
            while !matches!(self.peek_kind(), TokenKind::RParen) {
                bases.push(self.parse_expr()?);
                if !matches!(self.peek_kind(), TokenKind::RParen) {
                    self.expect(&TokenKind::Comma)?;
                }
            }
            self.expect(&TokenKind::RParen)?;
        }
        self.expect(&TokenKind::Colon)?;
        let span = start.merge(self.prev_span());
        let body = self.parse_suite()?;
        Ok(SyntaxNode::new(Node::ClassDef { name, bases, body, decorators }, span))
    }

    /// Body after a `:`, either an indented block or one simple statement on the same line.
    fn parse_suite(&mut self) -> Result<Vec<SyntaxNode>, ParseError> {
        if !matches!(self.peek_kind(), TokenKind::Newline) {
            return Ok(vec![self.parse_simple_statement()?]);
        }
        self.skip_newlines();
        self.expect(&TokenKind::Indent)?;
        let mut body = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::Dedent | TokenKind::Eof) {
            body.push(self.parse_statement()?);
            self.skip_newlines();
        }
        self.expect(&TokenKind::Dedent)?;
        Ok(body)
    }

    // ── Expressions ──

    pub fn parse_expr(&mut self) -> Result<SyntaxNode, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOperator::Add,
                TokenKind::Minus => BinOperator::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = binop(left, op, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<SyntaxNode, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOperator::Mult,
                TokenKind::Slash => BinOperator::Div,
                TokenKind::DoubleSlash => BinOperator::FloorDiv,
                TokenKind::Percent => BinOperator::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binop(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<SyntaxNode, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOperator::USub,
            TokenKind::Plus => UnaryOperator::UAdd,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Ok(SyntaxNode::new(Node::UnaryOp { op, operand: Box::new(operand) }, span))
    }

    fn parse_postfix(&mut self) -> Result<SyntaxNode, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let (args, keywords) = self.parse_call_args()?;
                    self.expect(&TokenKind::RParen)?;
                    let span = expr.span.merge(self.prev_span());
                    expr = SyntaxNode::new(
                        Node::Call { func: Box::new(expr), args, keywords },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let (attr, attr_span) = self.expect_ident()?;
                    let span = expr.span.merge(attr_span);
                    expr = SyntaxNode::new(Node::Attribute { value: Box::new(expr), attr }, span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<(Vec<SyntaxNode>, Vec<Keyword>), ParseError> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen) {
            let keyword = match (self.peek_kind(), self.peek_ahead(1)) {
                (TokenKind::Ident(name), TokenKind::Assign) => Some(name.clone()),
                _ => None,
            };
            if let Some(name) = keyword {
                let start = self.advance().span;
                self.advance();
                let value = self.parse_expr()?;
                let span = start.merge(value.span);
                keywords.push(Keyword { arg: name, value, span });
            } else if !keywords.is_empty() {
                return Err(self.unexpected("keyword argument"));
            } else {
                args.push(self.parse_expr()?);
            }
            if !matches!(self.peek_kind(), TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        Ok((args, keywords))
    }

    fn parse_atom(&mut self) -> Result<SyntaxNode, ParseError> {
        let tok = self.current().clone();
        let node = match tok.kind {
            TokenKind::IntLit(n) => Node::Constant { value: ConstantValue::Int(n) },
            TokenKind::StringLit(s) => Node::Constant { value: ConstantValue::Str(s) },
            TokenKind::True => Node::Constant { value: ConstantValue::Bool(true) },
            TokenKind::False => Node::Constant { value: ConstantValue::Bool(false) },
            TokenKind::None => Node::Constant { value: ConstantValue::None },
            TokenKind::Ident(id) => Node::Name { id },
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(SyntaxNode::new(node, tok.span))
    }
}

fn binop(left: SyntaxNode, op: BinOperator, right: SyntaxNode) -> SyntaxNode {
    let span = left.span.merge(right.span);
    SyntaxNode::new(Node::BinOp { left: Box::new(left), op, right: Box::new(right) }, span)
}
