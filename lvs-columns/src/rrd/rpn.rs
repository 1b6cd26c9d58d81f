//! Reverse polish notation metric expressions.
//!
//! Expressions are comma separated, e.g. `fs_used,1024,/` or
//! `if_in_octets.max,8,*`. Every token which is not a number or an operator
//! names a metric, optionally suffixed with the consolidation function to
//! read it with.

use std::fmt::{Display, Formatter};

use crate::monitoring::ConsolidationFunction;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RpnError {
    #[error("empty expression")]
    Empty,
    #[error("empty token at position {0}")]
    EmptyToken(usize),
    #[error("not enough operands for '{0}'")]
    StackUnderflow(String),
    #[error("expression leaves {0} values on the stack")]
    UnbalancedStack(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A metric read by an expression.
pub struct Variable {
    pub name: String,
    pub consolidation: ConsolidationFunction,
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.name, self.consolidation.as_str().to_lowercase())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Min,
    Max,
}

impl BinaryOp {
    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        let value = match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div if rhs == 0.0 => return None,
            Self::Div => lhs / rhs,
            Self::Rem if rhs == 0.0 => return None,
            Self::Rem => lhs % rhs,
            Self::Min => lhs.min(rhs),
            Self::Max => lhs.max(rhs),
        };
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Variable(usize),
    Binary(BinaryOp),
    Abs,
}

#[derive(Debug, Clone, PartialEq)]
/// A validated expression, ready to be evaluated once per time step.
pub struct RpnExpression {
    source: String,
    tokens: Vec<Token>,
    variables: Vec<Variable>,
}

impl Display for RpnExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl RpnExpression {
    pub fn parse(source: &str) -> Result<Self, RpnError> {
        if source.trim().is_empty() {
            return Err(RpnError::Empty);
        }

        let mut tokens = Vec::new();
        let mut variables: Vec<Variable> = Vec::new();
        let mut depth = 0usize;

        for (position, raw) in source.split(',').enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(RpnError::EmptyToken(position));
            }

            let token = match raw {
                "+" => Token::Binary(BinaryOp::Add),
                "-" => Token::Binary(BinaryOp::Sub),
                "*" => Token::Binary(BinaryOp::Mul),
                "/" => Token::Binary(BinaryOp::Div),
                "%" => Token::Binary(BinaryOp::Rem),
                "MIN" => Token::Binary(BinaryOp::Min),
                "MAX" => Token::Binary(BinaryOp::Max),
                "ABS" => Token::Abs,
                _ => match parse_number(raw) {
                    Some(value) => Token::Number(value),
                    None => {
                        let variable = parse_variable(raw);
                        let index = match variables.iter().position(|v| *v == variable) {
                            Some(index) => index,
                            None => {
                                variables.push(variable);
                                variables.len() - 1
                            },
                        };
                        Token::Variable(index)
                    },
                },
            };

            depth = match token {
                Token::Number(_) | Token::Variable(_) => depth + 1,
                Token::Abs if depth >= 1 => depth,
                Token::Binary(_) if depth >= 2 => depth - 1,
                _ => return Err(RpnError::StackUnderflow(raw.to_string())),
            };
            tokens.push(token);
        }

        if depth != 1 {
            return Err(RpnError::UnbalancedStack(depth));
        }

        Ok(Self {
            source: source.to_string(),
            tokens,
            variables,
        })
    }

    /// The distinct metrics the expression reads, in order of first use.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Evaluates the expression with `lookup` returning the value of the
    /// variable at the given index.
    ///
    /// Unknown inputs and division by zero make the result unknown.
    pub fn evaluate<F>(&self, lookup: F) -> Option<f64>
    where
        F: Fn(usize) -> Option<f64>,
    {
        let mut stack: Vec<Option<f64>> = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            match token {
                Token::Number(value) => stack.push(Some(*value)),
                Token::Variable(index) => stack.push(lookup(*index)),
                Token::Abs => {
                    let value = stack.pop()?;
                    stack.push(value.map(f64::abs));
                },
                Token::Binary(op) => {
                    let rhs = stack.pop()?;
                    let lhs = stack.pop()?;
                    stack.push(lhs.zip(rhs).and_then(|(l, r)| op.apply(l, r)));
                },
            }
        }
        stack.pop().flatten().filter(|v| v.is_finite())
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let first = raw.chars().next()?;
    if first.is_ascii_digit() || ((first == '-' || first == '.') && raw.len() > 1) {
        raw.parse().ok()
    } else {
        None
    }
}

fn parse_variable(raw: &str) -> Variable {
    if let Some((name, suffix)) = raw.rsplit_once('.') {
        let consolidation = match suffix {
            "max" => Some(ConsolidationFunction::Max),
            "min" => Some(ConsolidationFunction::Min),
            "average" | "avg" => Some(ConsolidationFunction::Average),
            "last" => Some(ConsolidationFunction::Last),
            _ => None,
        };
        if let Some(consolidation) = consolidation.filter(|_| !name.is_empty()) {
            return Variable {
                name: name.to_string(),
                consolidation,
            };
        }
    }

    Variable {
        name: raw.to_string(),
        consolidation: ConsolidationFunction::Average,
    }
}
