//! Token classification.
//!
//! Turns lexemes into typed tokens, resolving every word against the keywords,
//! the argument syntax (`Xn` and `Xn{}`), numeric literals and the
//! [`Registry`]. Literal constants and constant vectors are collected into
//! deduplicated pools here, so later stages only deal with pool indices.

use crate::errors::CompileError;
use crate::lexer::Lexeme;
use crate::registry::{is_argument_name, ConstantValue, Entry, Registry};

/// Kind of a classified token, with its pool or registry index where relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Eq,
    Ne,
    Lt,
    Le,
    Ge,
    Gt,
    And,
    Or,
    Not,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    If,
    ScalarArg(u32),
    /// Index into the literal constant pool
    Constant(u32),
    Function(u32),
    VectorFunction(u32),
    VectorArg(u32),
    /// Index into the vector constant pool; `braced` when written as `{...}`
    VectorConstant { index: u32, braced: bool },
}

/// A classified token with the source text it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub position: usize,
}

/// Which kinds of entities a formula references, and how many arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Highest scalar argument index plus one
    pub scalar_arguments: usize,
    /// Highest vector argument index plus one
    pub vector_arguments: usize,
    pub literal_constants: bool,
    pub vector_constants: bool,
    pub functions: bool,
    pub vector_functions: bool,
}

/// Output of the classifier.
#[derive(Debug, Clone)]
pub struct Classified<'a> {
    pub tokens: Vec<Token<'a>>,
    pub constants: Vec<f64>,
    pub vector_constants: Vec<Vec<f64>>,
    pub usage: Usage,
}

/// Adds `value` to `pool` unless a bitwise-identical value is present.
pub(crate) fn intern(pool: &mut Vec<f64>, value: f64) -> u32 {
    let position = pool.iter().position(|v| v.to_bits() == value.to_bits());
    position.unwrap_or_else(|| {
        pool.push(value);
        pool.len() - 1
    }) as u32
}

fn intern_vector(pool: &mut Vec<Vec<f64>>, values: Vec<f64>) -> u32 {
    let same = |v: &Vec<f64>| {
        v.len() == values.len() && v.iter().zip(&values).all(|(a, b)| a.to_bits() == b.to_bits())
    };
    match pool.iter().position(same) {
        Some(index) => index as u32,
        None => {
            pool.push(values);
            (pool.len() - 1) as u32
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    if text.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        text.parse().ok()
    } else {
        None
    }
}

/// Value of a number or a registered scalar constant.
fn scalar_value(text: &str, registry: &Registry) -> Option<f64> {
    parse_number(text).or_else(|| match registry.lookup(text)? {
        Entry::Constant(c) => match registry.constant(c).value() {
            ConstantValue::Scalar(v) => Some(*v),
            ConstantValue::Vector(_) => None,
        },
        _ => None,
    })
}

/// Recognizes `{ [+|-]value (, [+|-]value)* }` at the start of `rest`.
///
/// Returns the element values and the number of lexemes consumed.
fn constant_vector(rest: &[Lexeme<'_>], registry: &Registry) -> Option<(Vec<f64>, usize)> {
    let mut values = Vec::new();
    let mut i = 1;
    loop {
        let sign = match rest.get(i)?.text {
            "-" => -1.0,
            "+" => 1.0,
            _ => 0.0,
        };
        if sign != 0.0 {
            i += 1;
        }
        let value = scalar_value(rest.get(i)?.text, registry)?;
        values.push(if sign < 0.0 { -value } else { value });
        i += 1;
        match rest.get(i)?.text {
            "," => i += 1,
            "}" => return Some((values, i + 1)),
            _ => return None,
        }
    }
}

/// Classifies the lexemes of `source`.
///
/// # Errors
/// Returns `CompileError::UnknownToken` for words that are neither keywords,
/// arguments, numbers nor registered names.
pub fn classify<'a>(
    source: &'a str,
    lexemes: &[Lexeme<'a>],
    registry: &Registry,
) -> Result<Classified<'a>, CompileError> {
    let mut out = Classified {
        tokens: Vec::with_capacity(lexemes.len()),
        constants: Vec::new(),
        vector_constants: Vec::new(),
        usage: Usage::default(),
    };

    let mut i = 0;
    while i < lexemes.len() {
        let lexeme = lexemes[i];
        let mut consumed = 1;
        let kind = match lexeme.text {
            "+" => TokenKind::Plus,
            "-" => TokenKind::Minus,
            "*" => TokenKind::Star,
            "/" => TokenKind::Slash,
            "^" => TokenKind::Caret,
            "=" => TokenKind::Eq,
            "<>" => TokenKind::Ne,
            "<" => TokenKind::Lt,
            "<=" => TokenKind::Le,
            ">=" => TokenKind::Ge,
            ">" => TokenKind::Gt,
            "(" => TokenKind::LParen,
            ")" => TokenKind::RParen,
            "}" => TokenKind::RBrace,
            "," => TokenKind::Comma,
            "{" => match constant_vector(&lexemes[i..], registry) {
                Some((values, n)) => {
                    consumed = n;
                    out.usage.vector_constants = true;
                    TokenKind::VectorConstant {
                        index: intern_vector(&mut out.vector_constants, values),
                        braced: true,
                    }
                }
                None => TokenKind::LBrace,
            },
            word => {
                let upper = word.to_uppercase();
                let unknown = || CompileError::UnknownToken {
                    token: word.to_string(),
                    index: out.tokens.len(),
                };
                match upper.as_str() {
                    "AND" => TokenKind::And,
                    "OR" => TokenKind::Or,
                    "NOT" => TokenKind::Not,
                    "IF" => TokenKind::If,
                    _ if word.starts_with(|c: char| c.is_ascii_digit() || c == '.') => {
                        let value = parse_number(word).ok_or_else(unknown)?;
                        out.usage.literal_constants = true;
                        TokenKind::Constant(intern(&mut out.constants, value))
                    }
                    _ if is_argument_name(&upper) => {
                        let index: u32 = upper[1..].parse().map_err(|_| unknown())?;
                        let braces = lexemes.get(i + 1).map(|l| l.text) == Some("{")
                            && lexemes.get(i + 2).map(|l| l.text) == Some("}");
                        if braces {
                            consumed = 3;
                            out.usage.vector_arguments =
                                out.usage.vector_arguments.max(index as usize + 1);
                            TokenKind::VectorArg(index)
                        } else {
                            out.usage.scalar_arguments =
                                out.usage.scalar_arguments.max(index as usize + 1);
                            TokenKind::ScalarArg(index)
                        }
                    }
                    _ => match registry.lookup(&upper).ok_or_else(unknown)? {
                        Entry::Function(f) => {
                            out.usage.functions = true;
                            TokenKind::Function(f)
                        }
                        Entry::VectorFunction(f) => {
                            out.usage.vector_functions = true;
                            TokenKind::VectorFunction(f)
                        }
                        Entry::Constant(c) => match registry.constant(c).value() {
                            ConstantValue::Scalar(v) => {
                                out.usage.literal_constants = true;
                                TokenKind::Constant(intern(&mut out.constants, *v))
                            }
                            ConstantValue::Vector(values) => {
                                out.usage.vector_constants = true;
                                TokenKind::VectorConstant {
                                    index: intern_vector(&mut out.vector_constants, values.clone()),
                                    braced: false,
                                }
                            }
                        },
                    },
                }
            }
        };

        let last = lexemes[i + consumed - 1];
        out.tokens.push(Token {
            kind,
            text: &source[lexeme.position..last.position + last.text.len()],
            position: lexeme.position,
        });
        i += consumed;
    }

    Ok(out)
}
