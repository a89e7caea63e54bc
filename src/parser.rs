use anyhow::Result;

use crate::ast::{BinaryOperator, BlockStatement, Expression, Program, Statement, UnaryOperator};
use crate::token::{Span, Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    current: Token<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::EOF, Span::default()));
        }
        let current = tokens[0].clone();
        Self {
            tokens,
            pos: 0,
            current,
        }
    }

    pub fn parse_program(mut self) -> Result<Program> {
        let mut statements = Vec::new();
        while !matches!(self.current.kind, TokenKind::EOF) {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        if matches!(self.current.kind, TokenKind::Return) {
            return self.parse_return();
        }
        let expr = self.parse_expression()?;
        self.consume_semicolon();
        Ok(Statement::Expr(expr))
    }

    fn parse_return(&mut self) -> Result<Statement> {
        self.advance();
        let value = self.parse_expression()?;
        self.consume_semicolon();
        Ok(Statement::Return(value))
    }

    fn parse_block(&mut self) -> Result<BlockStatement> {
        self.expect_lbrace()?;
        let mut statements = Vec::new();
        while !matches!(self.current.kind, TokenKind::RBrace | TokenKind::EOF) {
            statements.push(self.parse_statement()?);
        }
        self.expect_rbrace()?;
        Ok(BlockStatement { statements })
    }

    // One method per precedence tier, loosest binding first.
    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut expr = self.parse_comparison()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Eq => BinaryOperator::Equal,
                TokenKind::NotEq => BinaryOperator::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            expr = Expression::BinaryOp {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Less => BinaryOperator::LessThan,
                TokenKind::Greater => BinaryOperator::GreaterThan,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            expr = Expression::BinaryOp {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = Expression::BinaryOp {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Asterisk => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = Expression::BinaryOp {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.current.kind {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Neg,
            _ => return self.parse_primary(),
        };
        self.advance();
        let right = self.parse_unary()?;
        Ok(Expression::UnaryOp {
            op,
            right: Box::new(right),
        })
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        match &self.current.kind {
            TokenKind::Integer(value) => {
                let value = *value;
                self.advance();
                Ok(Expression::Integer(value))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::Boolean(false))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            TokenKind::If => self.parse_if(),
            _ => Err(self.error("expression")),
        }
    }

    fn parse_if(&mut self) -> Result<Expression> {
        self.advance();
        self.expect_lparen()?;
        let condition = self.parse_expression()?;
        self.expect_rparen()?;
        let consequence = self.parse_block()?;

        let alternative = if matches!(self.current.kind, TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn consume_semicolon(&mut self) {
        if matches!(self.current.kind, TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn expect_lparen(&mut self) -> Result<()> {
        if matches!(self.current.kind, TokenKind::LParen) {
            self.advance();
            Ok(())
        } else {
            Err(self.error("("))
        }
    }

    fn expect_rparen(&mut self) -> Result<()> {
        if matches!(self.current.kind, TokenKind::RParen) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(")"))
        }
    }

    fn expect_lbrace(&mut self) -> Result<()> {
        if matches!(self.current.kind, TokenKind::LBrace) {
            self.advance();
            Ok(())
        } else {
            Err(self.error("{"))
        }
    }

    fn expect_rbrace(&mut self) -> Result<()> {
        if matches!(self.current.kind, TokenKind::RBrace) {
            self.advance();
            Ok(())
        } else {
            Err(self.error("}"))
        }
    }

    fn advance(&mut self) -> Token<'a> {
        let next = self
            .tokens
            .get(self.pos + 1)
            .cloned()
            .unwrap_or(Token::new(TokenKind::EOF, Span::default()));
        self.pos = self.pos.saturating_add(1);
        std::mem::replace(&mut self.current, next)
    }

    fn error(&self, expected: &str) -> anyhow::Error {
        let span = self.current.span();
        anyhow::anyhow!(
            "Expected {expected}, got {:?} at position {}",
            self.current.kind(),
            span.start
        )
    }
}

pub fn parse_tokens<'a>(tokens: Vec<Token<'a>>) -> Result<Program> {
    Parser::new(tokens).parse_program()
}
