use crate::ast::{BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp};
use crate::diagnostics::Diagnostics;
use crate::error::{ErrorLocation, LoxError, Span};
use crate::lexer::{Literal, Token, TokenType};
use crate::value::Value;
use log::{debug, trace};

/// Deepest nesting of statements, groupings, unary operators and operator
/// chains accepted before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Recursive-descent parser. Grammar rules return `Err` on the first
/// violation; `declaration` records the error and synchronizes so one pass
/// can report several independent syntax errors.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<LoxError>,
    lenient_last_semicolon: bool,
    depth: usize,
    aborted: bool,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.token_type) != Some(TokenType::Eof) {
            let (end, line) = tokens
                .last()
                .map(|t| (t.span.end, t.line))
                .unwrap_or((0, 1));
            tokens.push(Token::new(
                TokenType::Eof,
                String::new(),
                None,
                Span::new(end, end, line),
            ));
        }

        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            lenient_last_semicolon: false,
            depth: 0,
            aborted: false,
        }
    }

    /// Parser for interactive input, where the last expression statement
    /// may omit its ';'.
    pub fn for_repl(tokens: Vec<Token>) -> Self {
        Self {
            lenient_last_semicolon: true,
            ..Self::new(tokens)
        }
    }

    pub fn parse(&mut self, diagnostics: &mut Diagnostics) -> Program {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                trace!("parsed statement {:?}", stmt);
                statements.push(stmt);
            }
        }

        debug!(
            "parsed {} statements ({} syntax errors)",
            statements.len(),
            self.errors.len()
        );
        diagnostics.extend(self.errors.drain(..));
        Program { statements }
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let depth = self.depth;
        let result = if self.match_types(&[TokenType::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        self.depth = depth;

        match result {
            Ok(stmt) => Some(stmt),
            // The nesting error was already recorded and the input skipped
            Err(_) if self.aborted => None,
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt, LoxError> {
        let start_span = self.previous().span;
        let name = self
            .consume_with_help(
                TokenType::Identifier,
                "Expected variable name",
                "Variable declarations look like: var name = value;",
            )?
            .lexeme
            .clone();

        let initializer = if self.match_types(&[TokenType::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        let end_span = self
            .consume(
                TokenType::Semicolon,
                "Expected ';' after variable declaration",
            )?
            .span;

        Ok(Stmt::Var {
            name,
            initializer,
            span: start_span.to(&end_span),
        })
    }

    fn statement(&mut self) -> Result<Stmt, LoxError> {
        self.nested(Self::statement_body)
    }

    fn statement_body(&mut self) -> Result<Stmt, LoxError> {
        if self.match_types(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_types(&[TokenType::LeftBrace]) {
            let start_span = self.previous().span;
            let statements = self.block()?;
            Ok(Stmt::Block {
                statements,
                span: start_span.to(&self.previous().span),
            })
        } else if self.match_types(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_types(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_types(&[TokenType::For]) {
            self.for_statement()
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> Result<Stmt, LoxError> {
        let start_span = self.previous().span;
        let expr = self.expression()?;
        let end_span = self.consume(TokenType::Semicolon, "Expected ';' after value")?.span;

        Ok(Stmt::Print {
            expr,
            span: start_span.to(&end_span),
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, LoxError> {
        let mut statements = Vec::new();

        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after block",
            "Block statements must be closed with '}' after the opening '{'.",
        )?;
        Ok(statements)
    }

    fn if_statement(&mut self) -> Result<Stmt, LoxError> {
        let start_span = self.previous().span;

        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after 'if'",
            "If statements require parentheses around the condition: if (condition) { ... }",
        )?;
        let condition = self.expression()?;
        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after if condition",
            "If conditions must be enclosed in parentheses: if (condition) { ... }",
        )?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_types(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        let end_span = match else_branch {
            Some(ref else_stmt) => *else_stmt.span(),
            None => *then_branch.span(),
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: start_span.to(&end_span),
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, LoxError> {
        let start_span = self.previous().span;

        self.consume(TokenType::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after while condition")?;

        let body = Box::new(self.statement()?);
        let span = start_span.to(body.span());

        Ok(Stmt::While {
            condition,
            body,
            span,
        })
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> Result<Stmt, LoxError> {
        let start_span = self.previous().span;

        self.consume(TokenType::LeftParen, "Expected '(' after 'for'")?;

        let initializer = if self.match_types(&[TokenType::Semicolon]) {
            None
        } else if self.match_types(&[TokenType::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(&TokenType::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        let semicolon_span = self
            .consume(TokenType::Semicolon, "Expected ';' after loop condition")?
            .span;

        let increment = if !self.check(&TokenType::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RightParen, "Expected ')' after for clauses")?;

        let mut body = self.statement()?;
        let span = start_span.to(body.span());

        if let Some(increment) = increment {
            let increment_span = *increment.span();
            body = Stmt::Block {
                statements: vec![
                    body,
                    Stmt::Expression {
                        expr: increment,
                        span: increment_span,
                    },
                ],
                span,
            };
        }

        let condition = condition.unwrap_or(Expr::Literal {
            value: Value::Bool(true),
            span: semicolon_span,
        });
        let mut desugared = Stmt::While {
            condition,
            body: Box::new(body),
            span,
        };

        if let Some(initializer) = initializer {
            desugared = Stmt::Block {
                statements: vec![initializer, desugared],
                span,
            };
        }

        Ok(desugared)
    }

    fn expression_statement(&mut self) -> Result<Stmt, LoxError> {
        let start_span = self.peek().span;
        let expr = self.expression()?;

        if self.lenient_last_semicolon && self.is_at_end() {
            let end_span = self.previous().span;
            return Ok(Stmt::Expression {
                expr,
                span: start_span.to(&end_span),
            });
        }

        let end_span = self
            .consume(TokenType::Semicolon, "Expected ';' after expression")?
            .span;

        Ok(Stmt::Expression {
            expr,
            span: start_span.to(&end_span),
        })
    }

    fn expression(&mut self) -> Result<Expr, LoxError> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Result<Expr, LoxError> {
        let expr = self.or()?;

        if self.match_types(&[TokenType::Equal]) {
            let equals = self.previous().clone();
            let value = self.nested(Self::assignment)?;

            return match expr {
                Expr::Variable { name, span } => {
                    let span = span.to(value.span());
                    Ok(Expr::Assign {
                        name,
                        value: Box::new(value),
                        span,
                    })
                }
                // Reported but not thrown: the parser is not confused here.
                other => {
                    let error = self
                        .error_at(&equals, "Invalid assignment target")
                        .with_help("Only variables can be assigned to. Example: x = 10");
                    self.errors.push(error);
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, LoxError> {
        let depth = self.depth;
        let mut expr = self.and()?;

        while self.match_types(&[TokenType::Or]) {
            self.deepen()?;
            let right = self.and()?;
            let span = expr.span().to(right.span());

            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::Or,
                right: Box::new(right),
                span,
            };
        }

        self.depth = depth;
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, LoxError> {
        let depth = self.depth;
        let mut expr = self.equality()?;

        while self.match_types(&[TokenType::And]) {
            self.deepen()?;
            let right = self.equality()?;
            let span = expr.span().to(right.span());

            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::And,
                right: Box::new(right),
                span,
            };
        }

        self.depth = depth;
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, LoxError> {
        let depth = self.depth;
        let mut expr = self.comparison()?;

        while self.match_types(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            self.deepen()?;
            let operator = match self.previous().token_type {
                TokenType::BangEqual => BinaryOp::NotEqual,
                TokenType::EqualEqual => BinaryOp::Equal,
                _ => unreachable!(),
            };

            let right = self.comparison()?;
            expr = binary(expr, operator, right);
        }

        self.depth = depth;
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, LoxError> {
        let depth = self.depth;
        let mut expr = self.term()?;

        while self.match_types(&[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            self.deepen()?;
            let operator = match self.previous().token_type {
                TokenType::Greater => BinaryOp::Greater,
                TokenType::GreaterEqual => BinaryOp::GreaterEqual,
                TokenType::Less => BinaryOp::Less,
                TokenType::LessEqual => BinaryOp::LessEqual,
                _ => unreachable!(),
            };

            let right = self.term()?;
            expr = binary(expr, operator, right);
        }

        self.depth = depth;
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, LoxError> {
        let depth = self.depth;
        let mut expr = self.factor()?;

        while self.match_types(&[TokenType::Minus, TokenType::Plus]) {
            self.deepen()?;
            let operator = match self.previous().token_type {
                TokenType::Minus => BinaryOp::Subtract,
                TokenType::Plus => BinaryOp::Add,
                _ => unreachable!(),
            };

            let right = self.factor()?;
            expr = binary(expr, operator, right);
        }

        self.depth = depth;
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, LoxError> {
        let depth = self.depth;
        let mut expr = self.unary()?;

        while self.match_types(&[TokenType::Slash, TokenType::Star]) {
            self.deepen()?;
            let operator = match self.previous().token_type {
                TokenType::Slash => BinaryOp::Divide,
                TokenType::Star => BinaryOp::Multiply,
                _ => unreachable!(),
            };

            let right = self.unary()?;
            expr = binary(expr, operator, right);
        }

        self.depth = depth;
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, LoxError> {
        if self.match_types(&[TokenType::Bang, TokenType::Minus]) {
            let operator = match self.previous().token_type {
                TokenType::Bang => UnaryOp::Not,
                TokenType::Minus => UnaryOp::Negate,
                _ => unreachable!(),
            };

            let start = self.previous().span;
            let operand = self.nested(Self::unary)?;
            let span = start.to(operand.span());

            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
                span,
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, LoxError> {
        let token = self.peek().clone();

        let expr = match token.token_type {
            TokenType::False => Expr::Literal {
                value: Value::Bool(false),
                span: token.span,
            },
            TokenType::True => Expr::Literal {
                value: Value::Bool(true),
                span: token.span,
            },
            TokenType::Nil => Expr::Literal {
                value: Value::Nil,
                span: token.span,
            },
            TokenType::Number => match &token.literal {
                Some(Literal::Number(n)) => Expr::Literal {
                    value: Value::Number(*n),
                    span: token.span,
                },
                _ => return Err(self.error_at(&token, "Invalid number literal")),
            },
            TokenType::String => match &token.literal {
                Some(Literal::String(s)) => Expr::Literal {
                    value: Value::String(s.clone()),
                    span: token.span,
                },
                _ => return Err(self.error_at(&token, "Invalid string literal")),
            },
            TokenType::Identifier => Expr::Variable {
                name: token.lexeme.clone(),
                span: token.span,
            },
            TokenType::LeftParen => {
                self.advance();

                if self.check(&TokenType::RightParen) {
                    let close = self.peek().clone();
                    return Err(self.error_at(&close, "Expected expression").with_help(
                        "Parentheses must contain an expression. Use 'nil' for a null value: (nil)",
                    ));
                }

                let inner = self.expression()?;
                let end_span = self
                    .consume_with_help(
                        TokenType::RightParen,
                        "Expected ')' after expression",
                        "Every opening parenthesis '(' must have a matching closing parenthesis ')'.",
                    )?
                    .span;
                return Ok(Expr::Grouping {
                    expr: Box::new(inner),
                    span: token.span.to(&end_span),
                });
            }
            _ => {
                let help_msg = match token.token_type {
                    TokenType::RightParen => {
                        "Found ')' without matching '('. Check for unbalanced parentheses."
                    }
                    TokenType::RightBrace => {
                        "Found '}' without matching '{'. Check for unbalanced braces."
                    }
                    TokenType::Eof => "Reached end of input while expecting an expression.",
                    TokenType::Class
                    | TokenType::Fun
                    | TokenType::Return
                    | TokenType::Super
                    | TokenType::This => "This keyword is reserved and cannot be used here.",
                    _ => "Expected a literal value, variable, or parenthesized expression here.",
                };

                return Err(self.error_at(&token, "Expected expression").with_help(help_msg));
            }
        };

        self.advance();
        Ok(expr)
    }

    /// Runs `rule` one nesting level deeper and restores the level afterwards.
    fn nested<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<T, LoxError>,
    ) -> Result<T, LoxError> {
        let depth = self.depth;
        let result = self.deepen().and_then(|()| rule(self));
        self.depth = depth;
        result
    }

    /// Enters one more nesting level. Past the limit the error is recorded
    /// once and the rest of the input is skipped.
    fn deepen(&mut self) -> Result<(), LoxError> {
        self.depth += 1;
        if self.depth <= MAX_NESTING_DEPTH {
            return Ok(());
        }

        let token = self.peek().clone();
        let error = self.error_at(&token, "Nesting is too deep").with_help(format!(
            "Statements and expressions may nest at most {} levels.",
            MAX_NESTING_DEPTH
        ));
        self.errors.push(error.clone());
        self.aborted = true;
        self.current = self.tokens.len() - 1;
        Err(error)
    }

    /// Discards tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }

            self.advance();
        }
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().token_type == token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn error_at(&self, token: &Token, message: &str) -> LoxError {
        let location = if token.token_type == TokenType::Eof {
            ErrorLocation::AtEnd
        } else {
            ErrorLocation::AtLexeme(token.lexeme.clone())
        };
        LoxError::parse_error(token.span, location, message.to_string())
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, LoxError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_at(self.peek(), message))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: &str,
    ) -> Result<&Token, LoxError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_at(self.peek(), message).with_help(help))
        }
    }
}

fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
    let span = left.span().to(right.span());
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        span,
    }
}
