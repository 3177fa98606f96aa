//! Lexer for Rovar
//!
//! Converts source code into a stream of tokens, one per call. The lexer
//! keeps no token buffer and looks ahead at most one character (needed only
//! for the two-character operators).
#![allow(dead_code)]

use crate::frontend::token::{self, Token, TokenKind};

/// The lexer state
pub struct Lexer {
    /// Source code, never mutated after construction
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// 1-based line of the next unconsumed character
    line: u32,
    /// 1-based column of the next unconsumed character
    column: u32,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Consume one character, keeping line/column in step
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
            self.advance();
        }
    }

    /// Get the next token. Once the input is exhausted, every further call
    /// returns another `Eof` token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        // Position of the token's first character, before consumption.
        let line = self.line;
        let column = self.column;

        let c = match self.peek() {
            Some(c) => c,
            None => return Token::eof(line, column),
        };

        if c.is_alphabetic() || c == '_' {
            return self.read_identifier(line, column);
        }

        if c.is_ascii_digit() {
            return self.read_number(line, column);
        }

        if c == '"' {
            return self.read_string(line, column);
        }

        let punctuation = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            ';' => Some(TokenKind::Semicolon),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = punctuation {
            self.advance();
            return Token::new(kind, c, line, column);
        }

        if "=+-*/<>!&|".contains(c) {
            self.advance();
            let mut text = String::from(c);
            // ==, !=, <=, >= are single two-character lexemes. && and ||
            // are not defined; & and | each stand alone.
            if "=<>!".contains(c) && self.peek() == Some('=') {
                self.advance();
                text.push('=');
            }
            return Token::new(TokenKind::Op, text, line, column);
        }

        // No rule matches. Consume the character so the scan always makes
        // progress and let the parser report the error.
        self.advance();
        Token::new(TokenKind::Unknown, c, line, column)
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self, line: u32, column: u32) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let text: String = self.source[start..self.pos].iter().collect();
        let kind = if token::is_keyword(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };
        Token::new(kind, text, line, column)
    }

    /// Read an integer literal. Fractional and exponent forms are a grammar
    /// extension point, not lexed here.
    fn read_number(&mut self, line: u32, column: u32) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        let text: String = self.source[start..self.pos].iter().collect();
        Token::new(TokenKind::Int, text, line, column)
    }

    /// Read a string literal. The lexeme keeps its quotes and escape
    /// sequences stay unprocessed, so concatenated token texts re-lex to the
    /// same stream. A string left open at a newline or end of input degrades
    /// to an `Unknown` token holding whatever was consumed.
    fn read_string(&mut self, line: u32, column: u32) -> Token {
        let start = self.pos;
        self.advance(); // opening quote

        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            if c == '\\' {
                self.advance();
                self.advance();
                continue;
            }
            self.advance();
            if c == '"' {
                let text: String = self.source[start..self.pos].iter().collect();
                return Token::new(TokenKind::Str, text, line, column);
            }
        }

        let text: String = self.source[start..self.pos].iter().collect();
        Token::new(TokenKind::Unknown, text, line, column)
    }

    /// Tokenize the entire source and return all tokens, ending with `Eof`
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
