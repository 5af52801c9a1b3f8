/*!
Tokenization and lexical analysis for formula text.

Converts an expression string into tokens: quoted column references,
string/numeric/boolean literals, the `null` keyword, word operators,
punctuation, and comments. Comments are preserved as tokens so the parser
can lift a leading `//name` line into the formula's output alias.

Every token records the 0-based line it starts on (derived from newline
counts) so diagnostics can address the failing token inside a multi-line
expression.
*/

use crate::gridexpr::formula::error::{FormulaError, FormulaResult};

/// Token types recognized by the formula lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Keywords
    Var,  // var
    If,   // if
    Else, // else
    True, // True
    False, // False
    Null, // null

    // Word operators
    And,  // and
    Or,   // or
    Xor,  // xor
    Nand, // nand
    Nor,  // nor

    // Literals and identifiers
    Identifier, // function and variable names
    ColumnRef,  // "column name"
    String,     // 'string literal'
    Integer,    // 42
    Float,      // 3.14

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Semicolon,    // ;
    Question,     // ?
    Colon,        // :
    Assign,       // :=

    // Arithmetic operators
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    Caret,   // ^

    // Comparison operators
    Equal,              // ==
    NotEqual,           // !=
    LessThan,           // <
    LessThanOrEqual,    // <=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=

    // Comments (preserved for the output-name directive)
    Comment, // // text to end of line

    // End of input marker
    Eof,
}

/// A single token with its source text and 0-based line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub text: String,
    pub line: usize,
}

impl Token {
    fn new(token_type: TokenType, text: impl Into<String>, line: usize) -> Self {
        Token {
            token_type,
            text: text.into(),
            line,
        }
    }
}

/// Map a bare word to its keyword/operator token type, if it is one.
fn keyword_type(word: &str) -> Option<TokenType> {
    match word {
        "var" => Some(TokenType::Var),
        "if" => Some(TokenType::If),
        "else" => Some(TokenType::Else),
        "True" => Some(TokenType::True),
        "False" => Some(TokenType::False),
        "null" => Some(TokenType::Null),
        "and" => Some(TokenType::And),
        "or" => Some(TokenType::Or),
        "xor" => Some(TokenType::Xor),
        "nand" => Some(TokenType::Nand),
        "nor" => Some(TokenType::Nor),
        _ => None,
    }
}

/// Tokenize formula text into a vector of tokens ending with `Eof`.
///
/// Lexical errors (unterminated quotes, stray characters) report the
/// 0-based line on which they occur.
pub fn tokenize(text: &str) -> FormulaResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut pos = 0;
    let mut line = 0;

    while pos < chars.len() {
        let c = chars[pos];

        match c {
            '\n' => {
                line += 1;
                pos += 1;
            }
            c if c.is_whitespace() => {
                pos += 1;
            }
            '"' => {
                let start_line = line;
                let mut name = String::new();
                pos += 1;
                loop {
                    match chars.get(pos) {
                        Some('"') => {
                            pos += 1;
                            break;
                        }
                        Some('\n') | None => {
                            return Err(FormulaError::parse_error(
                                "unterminated column reference",
                                start_line,
                            ));
                        }
                        Some(&ch) => {
                            name.push(ch);
                            pos += 1;
                        }
                    }
                }
                tokens.push(Token::new(TokenType::ColumnRef, name, start_line));
            }
            '\'' => {
                let start_line = line;
                let mut value = String::new();
                pos += 1;
                loop {
                    match chars.get(pos) {
                        Some('\'') => {
                            pos += 1;
                            break;
                        }
                        None => {
                            return Err(FormulaError::parse_error(
                                "unterminated string literal",
                                start_line,
                            ));
                        }
                        Some(&ch) => {
                            if ch == '\n' {
                                line += 1;
                            }
                            value.push(ch);
                            pos += 1;
                        }
                    }
                }
                tokens.push(Token::new(TokenType::String, value, start_line));
            }
            c if c.is_ascii_digit() => {
                let start = pos;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                let mut is_float = false;
                if pos < chars.len()
                    && chars[pos] == '.'
                    && chars.get(pos + 1).is_some_and(|d| d.is_ascii_digit())
                {
                    is_float = true;
                    pos += 1;
                    while pos < chars.len() && chars[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
                let text: String = chars[start..pos].iter().collect();
                let token_type = if is_float {
                    TokenType::Float
                } else {
                    TokenType::Integer
                };
                tokens.push(Token::new(token_type, text, line));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len()
                    && (chars[pos].is_alphanumeric() || chars[pos] == '_')
                {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                let token_type = keyword_type(&word).unwrap_or(TokenType::Identifier);
                tokens.push(Token::new(token_type, word, line));
            }
            '/' if chars.get(pos + 1) == Some(&'/') => {
                let start = pos;
                while pos < chars.len() && chars[pos] != '\n' {
                    pos += 1;
                }
                let text: String = chars[start + 2..pos].iter().collect();
                tokens.push(Token::new(TokenType::Comment, text.trim(), line));
            }
            '(' => {
                tokens.push(Token::new(TokenType::LeftParen, "(", line));
                pos += 1;
            }
            ')' => {
                tokens.push(Token::new(TokenType::RightParen, ")", line));
                pos += 1;
            }
            '[' => {
                tokens.push(Token::new(TokenType::LeftBracket, "[", line));
                pos += 1;
            }
            ']' => {
                tokens.push(Token::new(TokenType::RightBracket, "]", line));
                pos += 1;
            }
            ',' => {
                tokens.push(Token::new(TokenType::Comma, ",", line));
                pos += 1;
            }
            ';' => {
                tokens.push(Token::new(TokenType::Semicolon, ";", line));
                pos += 1;
            }
            '?' => {
                tokens.push(Token::new(TokenType::Question, "?", line));
                pos += 1;
            }
            ':' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::new(TokenType::Assign, ":=", line));
                    pos += 2;
                } else {
                    tokens.push(Token::new(TokenType::Colon, ":", line));
                    pos += 1;
                }
            }
            '+' => {
                tokens.push(Token::new(TokenType::Plus, "+", line));
                pos += 1;
            }
            '-' => {
                tokens.push(Token::new(TokenType::Minus, "-", line));
                pos += 1;
            }
            '*' => {
                tokens.push(Token::new(TokenType::Star, "*", line));
                pos += 1;
            }
            '/' => {
                tokens.push(Token::new(TokenType::Slash, "/", line));
                pos += 1;
            }
            '%' => {
                tokens.push(Token::new(TokenType::Percent, "%", line));
                pos += 1;
            }
            '^' => {
                tokens.push(Token::new(TokenType::Caret, "^", line));
                pos += 1;
            }
            '=' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::new(TokenType::Equal, "==", line));
                    pos += 2;
                } else {
                    return Err(FormulaError::parse_error(
                        "unexpected '='; did you mean '=='?",
                        line,
                    ));
                }
            }
            '!' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::new(TokenType::NotEqual, "!=", line));
                    pos += 2;
                } else {
                    return Err(FormulaError::parse_error("unexpected '!'", line));
                }
            }
            '<' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::new(TokenType::LessThanOrEqual, "<=", line));
                    pos += 2;
                } else {
                    tokens.push(Token::new(TokenType::LessThan, "<", line));
                    pos += 1;
                }
            }
            '>' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::new(TokenType::GreaterThanOrEqual, ">=", line));
                    pos += 2;
                } else {
                    tokens.push(Token::new(TokenType::GreaterThan, ">", line));
                    pos += 1;
                }
            }
            other => {
                return Err(FormulaError::parse_error(
                    format!("unexpected character '{}'", other),
                    line,
                ));
            }
        }
    }

    tokens.push(Token::new(TokenType::Eof, "", line));
    Ok(tokens)
}
