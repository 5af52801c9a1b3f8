/*!
Expression parsing for formula text.

Implements the operator precedence pyramid with recursive descent; each
level calls the next higher level:

```text
Level 1 (lowest):  Ternary conditional        (parse_expression)
Level 2:           or / nor                   (parse_or)
Level 3:           xor                        (parse_xor)
Level 4:           and / nand                 (parse_and)
Level 5:           == / !=                    (parse_equality)
Level 6:           < / <= / > / >=            (parse_comparison)
Level 7:           + / -                      (parse_additive)
Level 8:           * / / / %                  (parse_multiplicative)
Level 9:           ^ (right-associative)      (parse_power)
Level 10:          unary + / -                (parse_unary)
Level 11 (highest): primary expressions       (parse_primary)
```

Primary expressions cover literals, column references, variable reads and
indexed array reads, function calls, parenthesized expressions, and the
`if (cond) a; else b;` conditional form.
*/

use super::lexer::TokenType;
use super::TokenParser;
use crate::gridexpr::formula::ast::{BinaryOperator, Expr, LiteralValue, UnaryOperator};
use crate::gridexpr::formula::error::FormulaResult;

impl TokenParser {
    /// Entry point for expression parsing.
    pub(super) fn parse_expression(&mut self) -> FormulaResult<Expr> {
        let condition = self.parse_or()?;

        if self.current_token().token_type == TokenType::Question {
            self.advance(); // consume ?
            let then_branch = self.parse_expression()?;
            self.expect(TokenType::Colon, "':' in conditional expression")?;
            let else_branch = self.parse_expression()?;
            return Ok(Expr::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(condition)
    }

    /// Parse `or` / `nor` connectives (lowest binary precedence).
    fn parse_or(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_xor()?;

        loop {
            let op = match self.current_token().token_type {
                TokenType::Or => BinaryOperator::Or,
                TokenType::Nor => BinaryOperator::Nor,
                _ => break,
            };
            self.advance();
            let right = self.parse_xor()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse `xor` connectives.
    fn parse_xor(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_and()?;

        while self.current_token().token_type == TokenType::Xor {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Xor,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse `and` / `nand` connectives.
    fn parse_and(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_equality()?;

        loop {
            let op = match self.current_token().token_type {
                TokenType::And => BinaryOperator::And,
                TokenType::Nand => BinaryOperator::Nand,
                _ => break,
            };
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse `==` / `!=`.
    fn parse_equality(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.current_token().token_type {
                TokenType::Equal => BinaryOperator::Equal,
                TokenType::NotEqual => BinaryOperator::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse `<` / `<=` / `>` / `>=`.
    fn parse_comparison(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token().token_type {
                TokenType::LessThan => BinaryOperator::LessThan,
                TokenType::LessThanOrEqual => BinaryOperator::LessThanOrEqual,
                TokenType::GreaterThan => BinaryOperator::GreaterThan,
                TokenType::GreaterThanOrEqual => BinaryOperator::GreaterThanOrEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse `+` / `-`.
    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token().token_type {
                TokenType::Plus => BinaryOperator::Add,
                TokenType::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse `*` / `/` / `%`.
    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_power()?;

        loop {
            let op = match self.current_token().token_type {
                TokenType::Star => BinaryOperator::Multiply,
                TokenType::Slash => BinaryOperator::Divide,
                TokenType::Percent => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse `^`, right-associative: `2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`.
    fn parse_power(&mut self) -> FormulaResult<Expr> {
        let base = self.parse_unary()?;

        if self.current_token().token_type == TokenType::Caret {
            self.advance();
            let exponent = self.parse_power()?;
            return Ok(Expr::BinaryOp {
                left: Box::new(base),
                op: BinaryOperator::Power,
                right: Box::new(exponent),
            });
        }

        Ok(base)
    }

    /// Parse unary `+` / `-`.
    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        let op = match self.current_token().token_type {
            TokenType::Plus => Some(UnaryOperator::Plus),
            TokenType::Minus => Some(UnaryOperator::Minus),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(Expr::UnaryOp {
                op,
                expr: Box::new(expr),
            });
        }
        self.parse_primary()
    }

    /// Parse primary expressions: literals, column references, variable
    /// and array reads, function calls, grouping, and `if`/`else`.
    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        let token = self.current_token().clone();
        match token.token_type {
            TokenType::Integer => {
                self.advance();
                let value: i64 = token
                    .text
                    .parse()
                    .map_err(|_| self.error_at(&token, "integer literal out of range"))?;
                Ok(Expr::Literal(LiteralValue::Integer(value)))
            }
            TokenType::Float => {
                self.advance();
                let value: f64 = token
                    .text
                    .parse()
                    .map_err(|_| self.error_at(&token, "malformed float literal"))?;
                Ok(Expr::Literal(LiteralValue::Float(value)))
            }
            TokenType::String => {
                self.advance();
                Ok(Expr::Literal(LiteralValue::String(token.text)))
            }
            TokenType::True => {
                self.advance();
                Ok(Expr::Literal(LiteralValue::Boolean(true)))
            }
            TokenType::False => {
                self.advance();
                Ok(Expr::Literal(LiteralValue::Boolean(false)))
            }
            TokenType::Null => {
                self.advance();
                Ok(Expr::Literal(LiteralValue::Null))
            }
            TokenType::ColumnRef => {
                self.advance();
                Ok(Expr::Column(token.text))
            }
            TokenType::Identifier => {
                self.advance();
                match self.current_token().token_type {
                    TokenType::LeftParen => self.parse_call(token.text),
                    TokenType::LeftBracket => {
                        self.advance();
                        let index_token = self.expect(TokenType::Integer, "an array index")?;
                        let index: usize = index_token.text.parse().map_err(|_| {
                            self.error_at(&index_token, "expected a non-negative array index")
                        })?;
                        self.expect(TokenType::RightBracket, "']' after the array index")?;
                        Ok(Expr::Index {
                            name: token.text,
                            index,
                        })
                    }
                    _ => Ok(Expr::VarRef(token.text)),
                }
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenType::RightParen, "')' to close the group")?;
                Ok(expr)
            }
            TokenType::If => self.parse_if(),
            _ => Err(self.error_at(&token, "expected an expression")),
        }
    }

    /// Parse a function call's argument list (the name is already consumed).
    fn parse_call(&mut self, name: String) -> FormulaResult<Expr> {
        self.expect(TokenType::LeftParen, "'(' after the function name")?;
        let mut args = Vec::new();

        if self.current_token().token_type != TokenType::RightParen {
            loop {
                args.push(self.parse_expression()?);
                if self.current_token().token_type == TokenType::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.expect(TokenType::RightParen, "')' to close the argument list")?;
        Ok(Expr::Function { name, args })
    }

    /// Parse `if (cond) a; else b` - the trailing `;` belongs to the
    /// surrounding statement.
    fn parse_if(&mut self) -> FormulaResult<Expr> {
        self.advance(); // consume if
        self.expect(TokenType::LeftParen, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenType::RightParen, "')' after the condition")?;
        let then_branch = self.parse_expression()?;
        self.expect(TokenType::Semicolon, "';' after the if-branch")?;
        self.expect(TokenType::Else, "'else' after the if-branch")?;
        let else_branch = self.parse_expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::gridexpr::formula::ast::{BinaryOperator, Expr, LiteralValue};

    #[test]
    fn test_function_call_with_mixed_args() {
        let parsed = parse("min(\"a\", -10, -10.001)").unwrap();
        match parsed.body {
            Expr::Function { name, args } => {
                assert_eq!(name, "min");
                assert_eq!(args.len(), 3);
                assert_eq!(args[0], Expr::Column("a".to_string()));
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn test_ternary_conditional() {
        let parsed = parse("find(\"a\", '.*', x) ? x[0] : null").unwrap();
        match parsed.body {
            Expr::Conditional {
                then_branch,
                else_branch,
                ..
            } => {
                assert_eq!(
                    *then_branch,
                    Expr::Index {
                        name: "x".to_string(),
                        index: 0
                    }
                );
                assert_eq!(*else_branch, Expr::Literal(LiteralValue::Null));
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_connective_precedence_below_comparison() {
        // "a" > 0.5 or "d" < 0.5 must group the comparisons first
        let parsed = parse("\"a\" > 0.5 or \"d\" < 0.5").unwrap();
        match parsed.body {
            Expr::BinaryOp { op, left, right } => {
                assert_eq!(op, BinaryOperator::Or);
                assert!(matches!(
                    *left,
                    Expr::BinaryOp {
                        op: BinaryOperator::GreaterThan,
                        ..
                    }
                ));
                assert!(matches!(
                    *right,
                    Expr::BinaryOp {
                        op: BinaryOperator::LessThan,
                        ..
                    }
                ));
            }
            other => panic!("expected or at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_power_base() {
        let parsed = parse("-2 ^ 2").unwrap();
        // parsed as (-2) ^ 2 because unary sits above power's base
        match parsed.body {
            Expr::BinaryOp { op, left, .. } => {
                assert_eq!(op, BinaryOperator::Power);
                assert!(matches!(*left, Expr::UnaryOp { .. }));
            }
            other => panic!("expected power at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_calls() {
        let parsed =
            parse("order(lower(concat(\"a\", ', ', \"b\")), 'x, y')").unwrap();
        match parsed.body {
            Expr::Function { name, args } => {
                assert_eq!(name, "order");
                assert!(matches!(&args[0], Expr::Function { name, .. } if name == "lower"));
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }
}
