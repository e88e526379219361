//! Indentation-aware lexer for the Python subset.

use crate::frontend::tokens::{Token, TokenKind};
use pyaot_core::syntax::Span;
use thiserror::Error;

const TAB_WIDTH: usize = 8;

#[derive(Debug, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at line {line}, col {col}")]
    UnexpectedChar { ch: char, line: usize, col: usize },
    #[error("unterminated string at line {line}, col {col}")]
    UnterminatedString { line: usize, col: usize },
    #[error("inconsistent indentation at line {line}")]
    InconsistentIndent { line: usize },
    #[error("invalid number at line {line}, col {col}")]
    InvalidNumber { line: usize, col: usize },
    #[error("unbalanced ')' at line {line}, col {col}")]
    UnbalancedParen { line: usize, col: usize },
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    byte_offset: usize,
    indent_stack: Vec<usize>,
    pending: Vec<Token>,
    at_line_start: bool,
    paren_depth: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            byte_offset: 0,
            indent_stack: vec![0],
            pending: Vec::new(),
            at_line_start: true,
            paren_depth: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        self.byte_offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
            self.at_line_start = self.paren_depth == 0;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn span_here(&self) -> Span {
        Span::new(self.byte_offset, self.byte_offset, self.line, self.col)
    }

    fn span_from(&self, so: usize, sl: usize, sc: usize) -> Span {
        Span::new(so, self.byte_offset, sl, sc)
    }

    fn handle_indentation(&mut self) -> Result<(), LexError> {
        let mut indent = 0;
        while let Some(ch) = self.current() {
            match ch {
                ' ' => {
                    indent += 1;
                    self.advance();
                }
                '\t' => {
                    indent = (indent / TAB_WIDTH + 1) * TAB_WIDTH;
                    self.advance();
                }
                '\x0c' => {
                    self.advance();
                }
                _ => break,
            }
        }
        // Blank and comment-only lines do not affect indentation.
        if matches!(self.current(), None | Some('\n') | Some('\r') | Some('#')) {
            return Ok(());
        }
        let cur = self.indent_stack.last().copied().unwrap_or(0);
        if indent > cur {
            self.indent_stack.push(indent);
            self.pending.push(Token::new(TokenKind::Indent, self.span_here()));
        } else if indent < cur {
            while let Some(&top) = self.indent_stack.last() {
                if top > indent {
                    self.indent_stack.pop();
                    self.pending.push(Token::new(TokenKind::Dedent, self.span_here()));
                } else {
                    break;
                }
            }
            if self.indent_stack.last().copied().unwrap_or(0) != indent {
                return Err(LexError::InconsistentIndent { line: self.line });
            }
        }
        Ok(())
    }

    fn read_string(&mut self, quote: char) -> Result<Token, LexError> {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.current() {
                None | Some('\n') => {
                    return Err(LexError::UnterminatedString { line: sl, col: sc })
                }
                Some('\\') => {
                    self.advance();
                    match self.current() {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some('r') => s.push('\r'),
                        Some('0') => s.push('\0'),
                        Some('\\') => s.push('\\'),
                        Some('\'') => s.push('\''),
                        Some('"') => s.push('"'),
                        Some(c) => {
                            s.push('\\');
                            s.push(c);
                        }
                        None => return Err(LexError::UnterminatedString { line: sl, col: sc }),
                    }
                    self.advance();
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
        Ok(Token::new(TokenKind::StringLit(s), self.span_from(so, sl, sc)))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        let invalid = LexError::InvalidNumber { line: sl, col: sc };

        let radix = match (self.current(), self.peek()) {
            (Some('0'), Some('x' | 'X')) => 16,
            (Some('0'), Some('o' | 'O')) => 8,
            (Some('0'), Some('b' | 'B')) => 2,
            _ => 10,
        };
        if radix != 10 {
            self.advance();
            self.advance();
        }

        let mut digits = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() {
                digits.push(ch);
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        // Floats are outside the subset.
        if self.current() == Some('.') && matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
            return Err(invalid);
        }
        if digits.is_empty() {
            return Err(invalid);
        }
        let span = self.span_from(so, sl, sc);
        // Literals above i64::MAX keep their 64-bit pattern, e.g. high-half addresses.
        u64::from_str_radix(&digits, radix)
            .map(|n| Token::new(TokenKind::IntLit(n as i64), span))
            .map_err(|_| invalid)
    }

    fn read_ident(&mut self) -> Token {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        let mut id = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' {
                id.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        let span = self.span_from(so, sl, sc);
        let kind = match id.as_str() {
            "def" => TokenKind::Def,
            "class" => TokenKind::Class,
            "return" => TokenKind::Return,
            "pass" => TokenKind::Pass,
            "None" => TokenKind::None,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            _ => TokenKind::Ident(id),
        };
        Token::new(kind, span)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let span = self.span_here();
        self.advance();
        Token::new(kind, span)
    }

    fn two_char(&mut self, second: char, matched: TokenKind, single: TokenKind) -> Token {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        self.advance();
        if self.current() == Some(second) {
            self.advance();
            Token::new(matched, self.span_from(so, sl, sc))
        } else {
            Token::new(single, self.span_from(so, sl, sc))
        }
    }

    fn push_newline(tokens: &mut Vec<Token>, span: Span) {
        if !matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Newline) | Some(TokenKind::Indent) | Some(TokenKind::Dedent) | None
        ) {
            tokens.push(Token::new(TokenKind::Newline, span));
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while self.pos < self.source.len() {
            if self.at_line_start {
                self.at_line_start = false;
                self.handle_indentation()?;
                tokens.append(&mut self.pending);
            }
            let ch = match self.current() {
                Some(c) => c,
                None => break,
            };
            match ch {
                '\n' => {
                    let span = self.span_here();
                    self.advance();
                    if self.paren_depth == 0 {
                        Self::push_newline(&mut tokens, span);
                    }
                }
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.advance();
                }
                '\\' if self.peek() == Some('\n') => {
                    // Explicit line continuation.
                    self.advance();
                    self.pos += 1;
                    self.byte_offset += 1;
                    self.line += 1;
                    self.col = 1;
                }
                '#' => {
                    while matches!(self.current(), Some(c) if c != '\n') {
                        self.advance();
                    }
                }
                '"' | '\'' => tokens.push(self.read_string(ch)?),
                '0'..='9' => tokens.push(self.read_number()?),
                c if c.is_alphabetic() || c == '_' => tokens.push(self.read_ident()),
                '+' => tokens.push(self.single(TokenKind::Plus)),
                '-' => tokens.push(self.two_char('>', TokenKind::Arrow, TokenKind::Minus)),
                '*' => tokens.push(self.single(TokenKind::Star)),
                '/' => tokens.push(self.two_char('/', TokenKind::DoubleSlash, TokenKind::Slash)),
                '%' => tokens.push(self.single(TokenKind::Percent)),
                '=' => tokens.push(self.single(TokenKind::Assign)),
                '.' => tokens.push(self.single(TokenKind::Dot)),
                ',' => tokens.push(self.single(TokenKind::Comma)),
                ':' => tokens.push(self.single(TokenKind::Colon)),
                '@' => tokens.push(self.single(TokenKind::At)),
                '(' => {
                    self.paren_depth += 1;
                    tokens.push(self.single(TokenKind::LParen));
                }
                ')' => {
                    if self.paren_depth == 0 {
                        return Err(LexError::UnbalancedParen { line: self.line, col: self.col });
                    }
                    self.paren_depth -= 1;
                    tokens.push(self.single(TokenKind::RParen));
                }
                _ => {
                    return Err(LexError::UnexpectedChar { ch, line: self.line, col: self.col })
                }
            }
        }
        let end = self.span_here();
        Self::push_newline(&mut tokens, end);
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::new(TokenKind::Dedent, end));
        }
        tokens.push(Token::new(TokenKind::Eof, end));
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_def() {
        let tokens = kinds("def f(a: int64) -> None:\n    pass\n");
        assert_eq!(tokens[0], TokenKind::Def);
        assert!(matches!(&tokens[1], TokenKind::Ident(s) if s == "f"));
        assert!(tokens.contains(&TokenKind::Arrow));
        assert!(tokens.contains(&TokenKind::Indent));
        assert!(tokens.contains(&TokenKind::Dedent));
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_lex_radix_literals() {
        let tokens = kinds("0x10 0o17 0b101 1_000");
        assert_eq!(
            &tokens[..4],
            &[
                TokenKind::IntLit(16),
                TokenKind::IntLit(15),
                TokenKind::IntLit(5),
                TokenKind::IntLit(1000)
            ]
        );
    }

    #[test]
    fn test_lex_full_width_literals() {
        let tokens = kinds("0xffff800000000000 0xffffffffffffffff");
        assert_eq!(tokens[0], TokenKind::IntLit(0xffff_8000_0000_0000_u64 as i64));
        assert_eq!(tokens[1], TokenKind::IntLit(-1));
        assert!(matches!(
            Lexer::new("0x1_0000_0000_0000_0000").tokenize(),
            Err(LexError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_lex_strings() {
        let tokens = kinds(r#"'a' "\n""#);
        assert_eq!(tokens[0], TokenKind::StringLit("a".into()));
        assert_eq!(tokens[1], TokenKind::StringLit("\n".into()));
    }

    #[test]
    fn test_newlines_inside_parens_are_ignored() {
        let tokens = kinds("f(1,\n  2)\n");
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
        assert!(!tokens.contains(&TokenKind::Indent));
    }

    #[test]
    fn test_comment_lines_do_not_indent() {
        let tokens = kinds("def f() -> None:\n    # note\n    pass\n");
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
    }

    #[test]
    fn test_inconsistent_dedent() {
        let err = Lexer::new("def f() -> None:\n    pass\n  pass\n").tokenize().unwrap_err();
        assert!(matches!(err, LexError::InconsistentIndent { line: 3 }));
    }

    #[test]
    fn test_float_rejected() {
        assert!(matches!(
            Lexer::new("1.5").tokenize(),
            Err(LexError::InvalidNumber { .. })
        ));
    }
}
