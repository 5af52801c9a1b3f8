/*!
# Formula Parser

Recursive-descent parser for formula text. Parsing is pure: it touches no
column data and produces either a [`ParsedFormula`] or a parse error
carrying the 0-based line of the offending token.

Grammar outline:

```text
formula    := directive? statement (';' statement)* ';'?
directive  := '//' name '\n'            (leading line only; becomes the alias)
statement  := 'var' IDENT ('[' INT ']' | ':=' expression)?
            | expression
expression := ternary over the operator precedence pyramid
            | 'if' '(' expression ')' expression ';' 'else' expression
```

Statements are separated by `;`; the final statement's value is the
formula's output. `var x[n];` declares a fixed-size array used to receive
multi-value results (e.g. the start/end offsets written by `find`).
*/

pub mod expressions;
pub mod lexer;

use self::lexer::{tokenize, Token, TokenType};
use super::ast::{Expr, ParsedFormula};
use super::error::{FormulaError, FormulaResult};

/// Parse formula text into a [`ParsedFormula`].
pub fn parse(text: &str) -> FormulaResult<ParsedFormula> {
    let tokens = tokenize(text)?;
    let mut parser = TokenParser::new(tokens);
    parser.parse_formula()
}

/// Token-stream parser with single-token lookahead.
pub struct TokenParser {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenParser {
    fn new(tokens: Vec<Token>) -> Self {
        TokenParser {
            tokens,
            position: 0,
        }
    }

    /// Current token; the stream always ends with `Eof`.
    pub(super) fn current_token(&self) -> &Token {
        self.tokens
            .get(self.position)
            .unwrap_or_else(|| self.tokens.last().expect("token stream ends with Eof"))
    }

    /// Advance past the current token, skipping interior comments.
    pub(super) fn advance(&mut self) {
        self.position += 1;
        while self.current_token().token_type == TokenType::Comment {
            self.position += 1;
        }
    }

    /// Consume a token of the expected type or fail with a parse error.
    pub(super) fn expect(&mut self, expected: TokenType, what: &str) -> FormulaResult<Token> {
        let token = self.current_token().clone();
        if token.token_type == expected {
            self.advance();
            Ok(token)
        } else {
            Err(self.error_at(&token, format!("expected {}", what)))
        }
    }

    /// Build a parse error at a token's line.
    pub(super) fn error_at(&self, token: &Token, message: impl Into<String>) -> FormulaError {
        let message = message.into();
        let shown = if token.token_type == TokenType::Eof {
            format!("{}, found end of expression", message)
        } else {
            format!("{}, found '{}'", message, token.text)
        };
        FormulaError::parse_error(shown, token.line)
    }

    /// Parse the whole formula: optional directive, then `;`-separated
    /// statements.
    fn parse_formula(&mut self) -> FormulaResult<ParsedFormula> {
        let alias = self.take_directive();

        let mut statements = Vec::new();
        loop {
            if self.current_token().token_type == TokenType::Eof {
                break;
            }
            statements.push(self.parse_statement()?);
            if self.current_token().token_type == TokenType::Semicolon {
                self.advance();
            } else {
                break;
            }
        }

        let token = self.current_token().clone();
        if token.token_type != TokenType::Eof {
            return Err(self.error_at(&token, "expected ';' or end of expression"));
        }
        if statements.is_empty() {
            return Err(FormulaError::parse_error("empty expression", 0));
        }

        let body = if statements.len() == 1 {
            statements.into_iter().next().expect("one statement")
        } else {
            Expr::Block(statements)
        };
        Ok(ParsedFormula { alias, body })
    }

    /// Lift a leading `//name` comment into the output alias.
    ///
    /// Only a comment before the first statement names the output; any
    /// later comment is skipped by `advance`.
    fn take_directive(&mut self) -> Option<String> {
        let token = self.current_token();
        if token.token_type == TokenType::Comment {
            let alias = token.text.clone();
            self.advance();
            if alias.is_empty() {
                None
            } else {
                Some(alias)
            }
        } else {
            None
        }
    }

    /// Parse one statement: a variable declaration or an expression.
    fn parse_statement(&mut self) -> FormulaResult<Expr> {
        if self.current_token().token_type == TokenType::Var {
            self.parse_var_decl()
        } else {
            self.parse_expression()
        }
    }

    /// Parse `var name;`, `var name[n];`, or `var name := expr;`.
    fn parse_var_decl(&mut self) -> FormulaResult<Expr> {
        self.advance(); // consume var
        let name_token = self.expect(TokenType::Identifier, "a variable name after 'var'")?;
        let name = name_token.text;

        match self.current_token().token_type {
            TokenType::LeftBracket => {
                self.advance();
                let size_token = self.expect(TokenType::Integer, "an array size")?;
                let size: usize = size_token.text.parse().map_err(|_| {
                    self.error_at(&size_token, "expected a non-negative array size")
                })?;
                self.expect(TokenType::RightBracket, "']' after the array size")?;
                if size == 0 {
                    return Err(FormulaError::parse_error(
                        "array size must be at least 1",
                        size_token.line,
                    ));
                }
                Ok(Expr::VarDecl {
                    name,
                    size: Some(size),
                    init: None,
                })
            }
            TokenType::Assign => {
                self.advance();
                let init = self.parse_expression()?;
                Ok(Expr::VarDecl {
                    name,
                    size: None,
                    init: Some(Box::new(init)),
                })
            }
            _ => Ok(Expr::VarDecl {
                name,
                size: None,
                init: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gridexpr::formula::ast::{BinaryOperator, LiteralValue};

    #[test]
    fn test_directive_becomes_alias() {
        let parsed = parse("//total\n\"a\" + \"b\"").unwrap();
        assert_eq!(parsed.alias.as_deref(), Some("total"));
    }

    #[test]
    fn test_no_directive_means_no_alias() {
        let parsed = parse("\"a\" + \"b\"").unwrap();
        assert_eq!(parsed.alias, None);
    }

    #[test]
    fn test_multi_statement_block() {
        let parsed = parse("var x[2]; find(\"a\", 'b', x); x[0]").unwrap();
        match parsed.body {
            Expr::Block(statements) => assert_eq!(statements.len(), 3),
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_var_decl_with_initializer() {
        let parsed = parse("var x := 1 + 2; x").unwrap();
        match parsed.body {
            Expr::Block(statements) => match &statements[0] {
                Expr::VarDecl { name, size, init } => {
                    assert_eq!(name, "x");
                    assert!(size.is_none());
                    assert!(init.is_some());
                }
                other => panic!("expected var decl, got {:?}", other),
            },
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_semicolon_allowed() {
        let parsed = parse("if(is_null(\"a\")) 100; else 0;").unwrap();
        match parsed.body {
            Expr::Conditional { .. } => {}
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_add_over_multiply() {
        let parsed = parse("1 + 2 * 3").unwrap();
        match parsed.body {
            Expr::BinaryOp { op, right, .. } => {
                assert_eq!(op, BinaryOperator::Add);
                match *right {
                    Expr::BinaryOp { op, .. } => assert_eq!(op, BinaryOperator::Multiply),
                    other => panic!("expected multiply on the right, got {:?}", other),
                }
            }
            other => panic!("expected add at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let parsed = parse("2 ^ 3 ^ 2").unwrap();
        match parsed.body {
            Expr::BinaryOp { op, left, right } => {
                assert_eq!(op, BinaryOperator::Power);
                assert_eq!(*left, Expr::Literal(LiteralValue::Integer(2)));
                match *right {
                    Expr::BinaryOp { op, .. } => assert_eq!(op, BinaryOperator::Power),
                    other => panic!("expected nested power, got {:?}", other),
                }
            }
            other => panic!("expected power at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_reports_parse_error() {
        assert!(parse("\"a\" + + ").is_err());
        assert!(parse("").is_err());
        assert!(parse("min(1, ").is_err());
    }
}
