use crate::ast::*;
use crate::error::CompileError;
use crate::lexer::{Tok, Token};

/// Recursive-descent parser for the generated statement language.
///
/// Parses the concatenated token stream of all body lines. Control-flow
/// fragments emitted by separate statement directives (`if (x) {`, `} else {`,
/// `}`) only become a single structure here; unbalanced fragments surface as
/// syntax errors pointing at the line that broke.
pub struct Parser<'a> {
    tokens: &'a [Token],
    lines: &'a [String],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], lines: &'a [String]) -> Self {
        Self {
            tokens,
            lines,
            pos: 0,
        }
    }

    fn peek(&self, n: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + n).map(|t| &t.tok)
    }

    fn consume(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|t| t.tok.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Tok) -> Result<(), CompileError> {
        match self.consume() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(self.error(format!("expected {expected:?}, got {t:?}"))),
            None => Err(self.error(format!("expected {expected:?}, got end of body"))),
        }
    }

    fn expect_ident(&mut self) -> Result<String, CompileError> {
        match self.consume() {
            Some(Tok::Ident(name)) => Ok(name),
            Some(t) => Err(self.error(format!("expected an identifier, got {t:?}"))),
            None => Err(self.error("expected an identifier, got end of body".to_string())),
        }
    }

    /// Build a syntax error located at the current token (or, at end of
    /// input, the last token seen).
    fn error(&self, message: String) -> CompileError {
        let line = self
            .tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|t| t.line)
            .unwrap_or(1);
        let source = self
            .lines
            .get(line.saturating_sub(1))
            .cloned()
            .unwrap_or_default();
        CompileError::Syntax {
            line,
            source_line: source,
            message,
        }
    }

    pub fn parse(&mut self) -> Result<Program, CompileError> {
        let program = self.parse_stmts()?;
        match self.peek(0) {
            None => Ok(program),
            // A leftover `}` means some directive closed a block that was
            // never opened.
            Some(t) => Err(self.error(format!("unexpected {t:?} outside any block"))),
        }
    }

    /// Parse statements until a closing `}` or the end of the body. The
    /// caller owns the brace.
    fn parse_stmts(&mut self) -> Result<Vec<Stmt>, CompileError> {
        let mut stmts = Vec::new();
        loop {
            match self.peek(0) {
                None | Some(Tok::RBrace) => break,
                _ => stmts.push(self.parse_stmt()?),
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, CompileError> {
        match self.peek(0) {
            Some(Tok::If) => self.parse_if(),
            Some(Tok::For) => self.parse_for(),
            Some(Tok::Let) => self.parse_let(),
            Some(Tok::Ident(_)) => self.parse_append(),
            Some(t) => Err(self.error(format!("expected a statement, got {t:?}"))),
            None => Err(self.error("expected a statement, got end of body".to_string())),
        }
    }

    fn parse_append(&mut self) -> Result<Stmt, CompileError> {
        let target = self.expect_ident()?;
        self.expect(Tok::PlusAssign)?;
        let value = self.parse_expr()?;
        self.expect(Tok::Semi)?;
        Ok(Stmt::Append { target, value })
    }

    fn parse_let(&mut self) -> Result<Stmt, CompileError> {
        self.expect(Tok::Let)?;
        let name = self.expect_ident()?;
        self.expect(Tok::Assign)?;
        let value = self.parse_expr()?;
        self.expect(Tok::Semi)?;
        Ok(Stmt::Let { name, value })
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        self.expect(Tok::If)?;
        let condition = self.parse_cond()?;
        let body = self.parse_block()?;
        let mut cases = vec![(condition, body)];
        let mut else_body = None;

        while let Some(Tok::Else) = self.peek(0) {
            self.consume(); // else
            if let Some(Tok::If) = self.peek(0) {
                self.consume(); // if
                let condition = self.parse_cond()?;
                let body = self.parse_block()?;
                cases.push((condition, body));
            } else {
                else_body = Some(self.parse_block()?);
                break;
            }
        }

        Ok(Stmt::If { cases, else_body })
    }

    fn parse_for(&mut self) -> Result<Stmt, CompileError> {
        self.expect(Tok::For)?;
        self.expect(Tok::LParen)?;
        let target = self.expect_ident()?;
        self.expect(Tok::In)?;
        let iterable = self.parse_expr()?;
        self.expect(Tok::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            target,
            iterable,
            body,
        })
    }

    fn parse_cond(&mut self) -> Result<Expr, CompileError> {
        self.expect(Tok::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(Tok::RParen)?;
        Ok(condition)
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, CompileError> {
        self.expect(Tok::LBrace)?;
        let stmts = self.parse_stmts()?;
        self.expect(Tok::RBrace)?;
        Ok(stmts)
    }

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_and()?;
        while let Some(Tok::Or | Tok::OrOr) = self.peek(0) {
            self.consume();
            let rhs = self.parse_and()?;
            lhs = Expr::BinOp(Box::new(lhs), BinOp::Or, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_cmp()?;
        while let Some(Tok::And | Tok::AndAnd) = self.peek(0) {
            self.consume();
            let rhs = self.parse_cmp()?;
            lhs = Expr::BinOp(Box::new(lhs), BinOp::And, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_sum()?;
        loop {
            let op = match self.peek(0) {
                Some(Tok::EqEq) => BinOp::Eq,
                Some(Tok::NotEq) => BinOp::Ne,
                Some(Tok::Lt) => BinOp::Lt,
                Some(Tok::Le) => BinOp::Le,
                Some(Tok::Gt) => BinOp::Gt,
                Some(Tok::Ge) => BinOp::Ge,
                _ => break,
            };
            self.consume();
            let rhs = self.parse_sum()?;
            lhs = Expr::BinOp(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_sum(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek(0) {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => break,
            };
            self.consume();
            let rhs = self.parse_unary()?;
            lhs = Expr::BinOp(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        match self.peek(0) {
            Some(Tok::Not) => {
                self.consume();
                Ok(Expr::Unary(UnOp::Not, Box::new(self.parse_unary()?)))
            }
            Some(Tok::Minus) => {
                self.consume();
                Ok(Expr::Unary(UnOp::Neg, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek(0) {
                Some(Tok::Dot) => {
                    self.consume();
                    let attr = self.expect_ident()?;
                    expr = Expr::Attribute(Box::new(expr), attr);
                }
                Some(Tok::LBracket) => {
                    self.consume();
                    let idx = self.parse_expr()?;
                    self.expect(Tok::RBracket)?;
                    expr = Expr::Index(Box::new(expr), Box::new(idx));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        match self.consume() {
            Some(Tok::StringLit(s)) => Ok(Expr::StringLit(s)),
            Some(Tok::IntLit(n)) => Ok(Expr::IntLit(n)),
            Some(Tok::FloatLit(n)) => Ok(Expr::FloatLit(n)),
            Some(Tok::True) => Ok(Expr::BoolLit(true)),
            Some(Tok::False) => Ok(Expr::BoolLit(false)),
            Some(Tok::Null) => Ok(Expr::NullLit),
            Some(Tok::Ident(name)) => Ok(Expr::Var(name)),
            Some(Tok::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(Tok::RParen)?;
                Ok(expr)
            }
            Some(t) => Err(self.error(format!("expected an expression, got {t:?}"))),
            None => Err(self.error("expected an expression, got end of body".to_string())),
        }
    }
}
