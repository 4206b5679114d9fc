//! Integer formula evaluator for grid layout region specifications.
//!
//! Layout regions are written as small expressions over the device size
//! (`W`, `H`) and the block size (`w`, `h`), e.g. `W - 1` or `max(2, W / 4)`.
//! Supported: integer literals, `+ - * / %`, unary minus, parentheses,
//! and the two-argument functions `min` and `max`.

use crate::error::FormulaError;
use std::collections::BTreeMap;

/// Variable bindings for formula evaluation.
#[derive(Clone, Debug, Default)]
pub struct FormulaVars {
    values: BTreeMap<String, i64>,
}

impl FormulaVars {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings for a region of a `device_width` x `device_height` grid holding
    /// `block_width` x `block_height` blocks.
    pub fn for_block(
        device_width: usize,
        device_height: usize,
        block_width: usize,
        block_height: usize,
    ) -> Self {
        let mut vars = Self::new();
        vars.set("W", device_width as i64);
        vars.set("H", device_height as i64);
        vars.set("w", block_width as i64);
        vars.set("h", block_height as i64);
        vars
    }

    /// Binds `name` to `value`.
    pub fn set(&mut self, name: &str, value: i64) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks up a binding.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(i64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '0'..='9' => {
                let mut value: i64 = 0;
                while let Some(&d) = chars.peek() {
                    let Some(digit) = d.to_digit(10) else { break };
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(i64::from(digit)))
                        .ok_or_else(|| "integer literal overflows".to_string())?;
                    chars.next();
                }
                tokens.push(Token::Num(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            '+' | '-' | '*' | '/' | '%' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            ',' => {
                tokens.push(Token::Comma);
                chars.next();
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

fn overflow() -> String {
    "arithmetic overflow".to_string()
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    vars: &'a FormulaVars,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, want: Token) -> Result<(), String> {
        match self.next() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => Err(format!("expected {want:?}, found {tok:?}")),
            None => Err(format!("expected {want:?}, found end of expression")),
        }
    }

    fn expr(&mut self) -> Result<i64, String> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            let sum = if op == '+' { lhs.checked_add(rhs) } else { lhs.checked_sub(rhs) };
            lhs = sum.ok_or_else(overflow)?;
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<i64, String> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.unary()?;
            let value = match op {
                '*' => lhs.checked_mul(rhs),
                _ if rhs == 0 => return Err("division by zero".to_string()),
                '/' => lhs.checked_div(rhs),
                _ => lhs.checked_rem(rhs),
            };
            lhs = value.ok_or_else(overflow)?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<i64, String> {
        if self.peek() == Some(&Token::Op('-')) {
            self.pos += 1;
            return self.unary()?.checked_neg().ok_or_else(overflow);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<i64, String> {
        match self.next() {
            Some(Token::Num(v)) => Ok(v),
            Some(Token::LParen) => {
                let v = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(v)
            }
            Some(Token::Ident(name)) if self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                let a = self.expr()?;
                self.expect(Token::Comma)?;
                let b = self.expr()?;
                self.expect(Token::RParen)?;
                match name.as_str() {
                    "min" => Ok(a.min(b)),
                    "max" => Ok(a.max(b)),
                    _ => Err(format!("unknown function '{name}'")),
                }
            }
            Some(Token::Ident(name)) => self
                .vars
                .get(&name)
                .ok_or_else(|| format!("unknown variable '{name}'")),
            Some(tok) => Err(format!("unexpected token {tok:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

/// Evaluates `expr` with the given variable bindings.
pub fn evaluate(expr: &str, vars: &FormulaVars) -> Result<i64, FormulaError> {
    let err = |reason: String| FormulaError {
        expr: expr.to_string(),
        reason,
    };
    let tokens = tokenize(expr).map_err(err)?;
    if tokens.is_empty() {
        return Err(err("empty expression".to_string()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        vars,
    };
    let value = parser.expr().map_err(err)?;
    if let Some(tok) = parser.peek() {
        return Err(err(format!("trailing input at {tok:?}")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> FormulaVars {
        FormulaVars::for_block(10, 8, 2, 3)
    }

    #[test]
    fn literals_and_variables() {
        assert_eq!(evaluate("0", &vars()).unwrap(), 0);
        assert_eq!(evaluate("W", &vars()).unwrap(), 10);
        assert_eq!(evaluate("H - 1", &vars()).unwrap(), 7);
        assert_eq!(evaluate("w*h", &vars()).unwrap(), 6);
    }

    #[test]
    fn precedence_and_parens() {
        assert_eq!(evaluate("2 + 3 * 4", &vars()).unwrap(), 14);
        assert_eq!(evaluate("(2 + 3) * 4", &vars()).unwrap(), 20);
        assert_eq!(evaluate("W / 4 + W % 4", &vars()).unwrap(), 4);
        assert_eq!(evaluate("-w + W", &vars()).unwrap(), 8);
    }

    #[test]
    fn min_max() {
        assert_eq!(evaluate("max(W, H)", &vars()).unwrap(), 10);
        assert_eq!(evaluate("min(W - 2, 3 * h)", &vars()).unwrap(), 8);
    }

    #[test]
    fn errors_name_the_expression() {
        let err = evaluate("W +", &vars()).unwrap_err();
        assert_eq!(err.expr, "W +");
        assert!(evaluate("Q", &vars()).unwrap_err().reason.contains("unknown variable"));
        assert!(evaluate("W / 0", &vars()).unwrap_err().reason.contains("division"));
        assert!(evaluate("sqrt(1, 2)", &vars()).is_err());
        assert!(evaluate("", &vars()).is_err());
        assert!(evaluate("1 2", &vars()).is_err());
        assert!(evaluate("W # 2", &vars()).is_err());
    }

    #[test]
    fn overflow_is_an_error() {
        let max = i64::MAX.to_string();
        for expr in [
            format!("{max} + 1"),
            format!("-{max} - 2"),
            format!("{max} * 2"),
            format!("(-{max} - 1) / -1"),
            format!("(-{max} - 1) % -1"),
        ] {
            let err = evaluate(&expr, &vars()).unwrap_err();
            assert!(err.reason.contains("overflow"), "{expr}: {err}");
        }
        assert_eq!(evaluate(&format!("-{max} - 1"), &vars()).unwrap(), i64::MIN);
    }
}
