//! Splits formula text into lexemes.
//!
//! A lexeme is either an operator, a bracket, a comma, or a word (a run of
//! ASCII letters, digits and `.`). Multi-character operators (`<=`, `>=`,
//! `<>`) are kept together, and a number written in scientific notation keeps
//! its exponent sign (`1E-5` is one lexeme, not `1E`, `-`, `5`).

use crate::errors::CompileError;

/// A slice of the source text with its byte position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub text: &'a str,
    pub position: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.'
}

/// True when `word` reads as a mantissa followed by an exponent marker, e.g.
/// `1E`, `2.5e`, `.5E`.
fn is_open_exponent(word: &str) -> bool {
    let Some(mantissa) = word.strip_suffix(|c: char| c == 'e' || c == 'E') else {
        return false;
    };
    !mantissa.is_empty()
        && mantissa.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && mantissa.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Splits `source` into lexemes.
///
/// # Errors
/// Returns `CompileError::ForbiddenCharacter` for any character outside the
/// formula alphabet and `CompileError::EmptyFormula` when nothing but
/// whitespace is present.
pub fn tokenize(source: &str) -> Result<Vec<Lexeme<'_>>, CompileError> {
    let mut lexemes = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let end = match c {
            _ if c.is_whitespace() => continue,
            '<' => match chars.peek() {
                Some(&(i, '=' | '>')) => {
                    chars.next();
                    i + 1
                }
                _ => start + 1,
            },
            '>' => match chars.peek() {
                Some(&(i, '=')) => {
                    chars.next();
                    i + 1
                }
                _ => start + 1,
            },
            '(' | ')' | '{' | '}' | '+' | '-' | '*' | '/' | '^' | ',' | '=' => start + 1,
            _ if is_word_char(c) => {
                let mut end = start + c.len_utf8();
                loop {
                    match chars.peek() {
                        Some(&(i, next)) if is_word_char(next) => {
                            chars.next();
                            end = i + next.len_utf8();
                        }
                        Some(&(i, sign @ ('+' | '-'))) if is_open_exponent(&source[start..end]) => {
                            // only a digit after the sign makes it an exponent
                            let digit_follows = source[i + 1..]
                                .chars()
                                .next()
                                .is_some_and(|d| d.is_ascii_digit());
                            if !digit_follows {
                                break;
                            }
                            chars.next();
                            end = i + sign.len_utf8();
                        }
                        _ => break,
                    }
                }
                end
            }
            _ => {
                return Err(CompileError::ForbiddenCharacter {
                    ch: c,
                    position: start,
                })
            }
        };
        lexemes.push(Lexeme {
            text: &source[start..end],
            position: start,
        });
    }

    if lexemes.is_empty() {
        return Err(CompileError::EmptyFormula);
    }
    Ok(lexemes)
}
