//! Parser for Rovar
//!
//! Recursive descent over the lexer's token stream with a single token of
//! lookahead. Each grammar production is one method. A production that has
//! not consumed anything may fail and let its caller try an alternative;
//! once it commits past its first token there is no backtracking, and
//! failure surfaces as a positioned diagnostic.

use log::debug;

use crate::frontend::ast::{Node, NodeKind};
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Diagnostic, Result};

/// The parser
pub struct Parser {
    lexer: Lexer,
    /// The single lookahead token
    current: Token,
}

impl Parser {
    /// Create a parser over the given source, priming one lookahead token.
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self { lexer, current }
    }

    // ==================== Helper Methods ====================

    /// Discard the lookahead and pull the next token from the lexer,
    /// returning the discarded one.
    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn is_op(&self, symbol: &str) -> bool {
        self.current.kind == TokenKind::Op && self.current.text == symbol
    }

    /// Consume the lookahead when it is one of the given operators.
    fn match_op(&mut self, symbols: &[&str]) -> Option<Token> {
        if self.current.kind == TokenKind::Op && symbols.contains(&self.current.text.as_str()) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(format!("expected {expected}, got {}", describe(&self.current))))
        }
    }

    fn error_at_current(&self, message: String) -> Diagnostic {
        Diagnostic::syntax(message, self.current.line, self.current.column)
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program.
    ///
    /// A program that is one bare expression parses to that expression node
    /// itself; otherwise the root is a `Program` node owning a
    /// right-threaded chain of `Statement` nodes.
    pub fn parse_program(&mut self) -> Result<Node> {
        if self.is_at_end() {
            return Err(self.error_at_current("unexpected end of input, expected a program".into()));
        }

        let mut stmts = Vec::new();

        // With one token of lookahead, `main` (a whole program) and
        // `main;` (the first of several statements) are only told apart
        // after the expression has been parsed.
        if !self.starts_statement() {
            let expr = self.parse_expression()?;
            if self.is_at_end() {
                debug!("parsed single-expression program");
                return Ok(expr);
            }
            self.expect(TokenKind::Semicolon, "';'")?;
            stmts.push(wrap_statement(expr));
        }

        while !self.is_at_end() {
            stmts.push(self.parse_statement()?);
        }

        debug!("parsed program with {} statement(s)", stmts.len());
        Ok(Node::new(NodeKind::Program, None, Node::chain(stmts), None))
    }

    /// Check whether the lookahead can only start a statement, never an
    /// expression.
    fn starts_statement(&self) -> bool {
        self.check(TokenKind::LBrace) || self.is_decl_keyword()
    }

    fn is_decl_keyword(&self) -> bool {
        self.current.kind == TokenKind::Keyword
            && matches!(self.current.text.as_str(), "var" | "let" | "const")
    }

    /// statement := var_decl | block | expr_stmt
    fn parse_statement(&mut self) -> Result<Node> {
        let content = if self.is_decl_keyword() {
            self.parse_var_decl()?
        } else if self.check(TokenKind::LBrace) {
            self.parse_block()?
        } else {
            let expr = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "';'")?;
            expr
        };
        Ok(wrap_statement(content))
    }

    /// var_decl := ("var" | "let" | "const") IDENT ("=" expression)? ";"
    fn parse_var_decl(&mut self) -> Result<Node> {
        self.advance(); // declaration keyword
        let name = self.expect(TokenKind::Ident, "variable name")?;

        let init = if self.is_op("=") {
            self.advance();
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "';'")?;

        Ok(Node::new(NodeKind::VarDecl, Some(name.text), init, None))
    }

    /// block := "{" statement* "}"
    fn parse_block(&mut self) -> Result<Node> {
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_statement()?);
        }

        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Node::new(NodeKind::Block, None, Node::chain(stmts), None))
    }

    /// expression := assignment
    fn parse_expression(&mut self) -> Result<Node> {
        self.parse_assignment()
    }

    /// assignment := IDENT "=" assignment | equality
    ///
    /// Right-associative; the target must be a plain identifier.
    fn parse_assignment(&mut self) -> Result<Node> {
        let left = self.parse_equality()?;

        if self.is_op("=") {
            if left.kind != NodeKind::Identifier {
                return Err(self.error_at_current("invalid assignment target".into()));
            }
            self.advance();
            let value = self.parse_assignment()?;
            return Ok(Node::binary("=", left, value));
        }

        Ok(left)
    }

    /// equality := comparison (("==" | "!=") comparison)*
    fn parse_equality(&mut self) -> Result<Node> {
        let mut node = self.parse_comparison()?;
        while let Some(op) = self.match_op(&["==", "!="]) {
            let right = self.parse_comparison()?;
            node = Node::binary(op.text, node, right);
        }
        Ok(node)
    }

    /// comparison := additive (("<" | "<=" | ">" | ">=") additive)*
    fn parse_comparison(&mut self) -> Result<Node> {
        let mut node = self.parse_additive()?;
        while let Some(op) = self.match_op(&["<", "<=", ">", ">="]) {
            let right = self.parse_additive()?;
            node = Node::binary(op.text, node, right);
        }
        Ok(node)
    }

    /// additive := term (("+" | "-") term)*
    fn parse_additive(&mut self) -> Result<Node> {
        let mut node = self.parse_term()?;
        while let Some(op) = self.match_op(&["+", "-"]) {
            let right = self.parse_term()?;
            node = Node::binary(op.text, node, right);
        }
        Ok(node)
    }

    /// term := primary (("*" | "/") primary)*
    fn parse_term(&mut self) -> Result<Node> {
        let mut node = self.parse_primary()?;
        while let Some(op) = self.match_op(&["*", "/"]) {
            let right = self.parse_primary()?;
            node = Node::binary(op.text, node, right);
        }
        Ok(node)
    }

    /// primary := INT | STRING | IDENT | "(" expression ")"
    fn parse_primary(&mut self) -> Result<Node> {
        match self.current.kind {
            TokenKind::Int => {
                let token = self.advance();
                Ok(Node::leaf(NodeKind::Number, token.text))
            }
            TokenKind::Str => {
                let token = self.advance();
                Ok(Node::leaf(NodeKind::Str, string_value(&token.text)))
            }
            TokenKind::Ident => {
                let token = self.advance();
                Ok(Node::leaf(NodeKind::Identifier, token.text))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Node::new(
                    NodeKind::Expression,
                    None,
                    Some(Box::new(inner)),
                    None,
                ))
            }
            _ => Err(self.error_at_current(format!(
                "expected expression, got {}",
                describe(&self.current)
            ))),
        }
    }
}

fn wrap_statement(content: Node) -> Node {
    Node::new(NodeKind::Statement, None, Some(Box::new(content)), None)
}

/// The string literal's value: the lexeme without its enclosing quotes.
fn string_value(lexeme: &str) -> String {
    lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme)
        .to_string()
}

/// Describe a token for error messages.
fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        _ => format!("'{}'", token.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::DiagnosticKind;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Node> {
        Parser::new(source).parse_program()
    }

    #[test]
    fn test_bare_identifier_program() {
        let root = parse("main").expect("parse");
        assert_eq!(root.kind, NodeKind::Identifier);
        assert_eq!(root.text.as_deref(), Some("main"));
        assert!(root.left.is_none() && root.right.is_none());
    }

    #[test]
    fn test_bare_number_program() {
        let root = parse("42").expect("parse");
        assert_eq!(root.kind, NodeKind::Number);
        assert_eq!(root.text.as_deref(), Some("42"));
        assert!(root.left.is_none() && root.right.is_none());
    }

    #[test]
    fn test_empty_input_is_an_error() {
        for source in ["", "   ", " \n\t "] {
            let err = parse(source).expect_err("empty program");
            assert_eq!(err.kind, DiagnosticKind::SyntaxError);
            assert!(err.message.contains("end of input"), "{}", err.message);
        }
    }

    #[test]
    fn test_bare_comparison_program() {
        let root = parse("x == 10").expect("parse");
        assert_eq!(root.kind, NodeKind::BinaryOp);
        assert_eq!(root.text.as_deref(), Some("=="));
        assert_eq!(root.left.as_ref().unwrap().kind, NodeKind::Identifier);
        assert_eq!(root.right.as_ref().unwrap().kind, NodeKind::Number);
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let root = parse("1 + 2 * 3").expect("parse");
        assert_eq!(root.text.as_deref(), Some("+"));
        let right = root.right.as_ref().unwrap();
        assert_eq!(right.text.as_deref(), Some("*"));

        // (1 + 2) * 3 keeps the grouping node
        let root = parse("(1 + 2) * 3").expect("parse");
        assert_eq!(root.text.as_deref(), Some("*"));
        let left = root.left.as_ref().unwrap();
        assert_eq!(left.kind, NodeKind::Expression);
        assert_eq!(left.left.as_ref().unwrap().text.as_deref(), Some("+"));
    }

    #[test]
    fn test_var_declaration_program() {
        let root = parse("var x = 42;").expect("parse");
        assert_eq!(root.kind, NodeKind::Program);

        let stmt = root.left.as_ref().expect("statement");
        assert_eq!(stmt.kind, NodeKind::Statement);
        assert!(stmt.right.is_none());

        let decl = stmt.left.as_ref().expect("declaration");
        assert_eq!(decl.kind, NodeKind::VarDecl);
        assert_eq!(decl.text.as_deref(), Some("x"));
        assert_eq!(decl.left.as_ref().unwrap().kind, NodeKind::Number);
    }

    #[test]
    fn test_declaration_without_initializer() {
        let root = parse("let ready;").expect("parse");
        let decl = root.left.as_ref().unwrap().left.as_ref().unwrap();
        assert_eq!(decl.kind, NodeKind::VarDecl);
        assert!(decl.left.is_none());
    }

    #[test]
    fn test_statement_chain_order() {
        let root = parse("var x = 1; var y = 2; x + y;").expect("parse");

        let mut names = Vec::new();
        let mut stmt = root.left.as_deref();
        while let Some(node) = stmt {
            let content = node.left.as_ref().unwrap();
            names.push((content.kind, content.text.clone()));
            stmt = node.right.as_deref();
        }

        assert_eq!(
            names,
            vec![
                (NodeKind::VarDecl, Some("x".to_string())),
                (NodeKind::VarDecl, Some("y".to_string())),
                (NodeKind::BinaryOp, Some("+".to_string())),
            ]
        );
    }

    #[test]
    fn test_block_statement() {
        let root = parse("{ var x = 1; x; }").expect("parse");
        let block = root.left.as_ref().unwrap().left.as_ref().unwrap();
        assert_eq!(block.kind, NodeKind::Block);

        let first = block.left.as_ref().expect("block body");
        assert_eq!(first.left.as_ref().unwrap().kind, NodeKind::VarDecl);
        assert!(first.right.is_some());

        let empty = parse("{}").expect("parse");
        let block = empty.left.as_ref().unwrap().left.as_ref().unwrap();
        assert!(block.left.is_none());
    }

    #[test]
    fn test_string_literal_expression() {
        let root = parse("var s = \"hi\";").expect("parse");
        let decl = root.left.as_ref().unwrap().left.as_ref().unwrap();
        let init = decl.left.as_ref().unwrap();
        assert_eq!(init.kind, NodeKind::Str);
        assert_eq!(init.text.as_deref(), Some("hi"));
    }

    #[test]
    fn test_assignment_expression() {
        let root = parse("var x = 1; x = 2;").expect("parse");
        let second = root.left.as_ref().unwrap().right.as_ref().unwrap();
        let assign = second.left.as_ref().unwrap();
        assert_eq!(assign.kind, NodeKind::BinaryOp);
        assert_eq!(assign.text.as_deref(), Some("="));

        let err = parse("1 = 2;").expect_err("literal target");
        assert!(err.message.contains("assignment target"), "{}", err.message);
    }

    #[test]
    fn test_missing_semicolon_has_position() {
        let err = parse("var x = 1\nvar y = 2;").expect_err("missing semicolon");
        assert_eq!(err.kind, DiagnosticKind::SyntaxError);
        assert_eq!((err.line, err.column), (2, 1));
        assert!(err.message.contains("';'"), "{}", err.message);
    }

    #[test]
    fn test_unrecognized_character_is_reported() {
        // The lexer hands '$' through as a token; the parser positions the
        // error where it stands.
        let err = parse("var x = $;").expect_err("bad character");
        assert_eq!(err.kind, DiagnosticKind::SyntaxError);
        assert_eq!((err.line, err.column), (1, 9));
        assert!(err.message.contains('$'), "{}", err.message);
    }

    #[test]
    fn test_reserved_keyword_is_not_an_expression() {
        let err = parse("return;").expect_err("reserved keyword");
        assert_eq!(err.kind, DiagnosticKind::SyntaxError);
        assert!(err.message.contains("'return'"), "{}", err.message);
    }
}
