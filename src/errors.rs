//! Error types for the formula-vm crate.
//!
//! This module defines the failure modes of the three stages a caller can hit:
//!
//! - `CompileError`: Errors while turning formula text into a program (lexing,
//!   classification, grammar, stack analysis)
//! - `EvalError`: Precondition violations when evaluating a compiled program
//! - `RegistryError`: Errors when registering functions and constants
//!
//! Every `CompileError` also exposes a stable [`ErrorCode`] so callers can react
//! to a failure without matching on the message text.

use thiserror::Error;

use crate::registry::ArgKind;

/// Stable numeric identifier of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    EmptyFormula = 1,
    ForbiddenCharacter = 2,
    UnknownToken = 3,
    InvalidFirstToken = 4,
    InvalidLastToken = 5,
    InvalidTokenPair = 6,
    WrongArity = 7,
    MissingClosingBracket = 8,
    MissingFunctionBracket = 9,
    MissingIfBracket = 10,
    UnbalancedParentheses = 11,
    UnbalancedBraces = 12,
    VectorOutsideContext = 13,
    VectorArgumentMismatch = 14,
    MalformedIf = 15,
    NestedVectorLiteral = 16,
    CommaOutsideArguments = 17,
    UnexpectedToken = 18,
    StackImbalance = 19,
}

/// Errors that can occur while compiling a formula.
///
/// Token indices count lexemes from zero after `Xn{}` has been merged into a
/// single token; character positions count bytes of the source text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The formula contains no tokens at all
    #[error("formula is empty")]
    EmptyFormula,
    /// A character outside the formula alphabet was found
    #[error("forbidden character '{ch}' at position {position}")]
    ForbiddenCharacter { ch: char, position: usize },
    /// A word is neither a keyword, argument, registered name nor number
    #[error("unknown token '{token}' at index {index}")]
    UnknownToken { token: String, index: usize },
    /// The formula cannot start with this token
    #[error("formula cannot start with '{token}'")]
    InvalidFirstToken { token: String },
    /// The formula cannot end with this token
    #[error("formula cannot end with '{token}'")]
    InvalidLastToken { token: String },
    /// Two tokens that may never be adjacent
    #[error("'{second}' cannot follow '{first}' at index {index}")]
    InvalidTokenPair {
        first: String,
        second: String,
        index: usize,
    },
    /// A function was called with the wrong number of arguments
    #[error("function {function} expects {expected} argument(s), got {found}")]
    WrongArity {
        function: String,
        expected: usize,
        found: usize,
    },
    /// A parenthesis or brace opened at `index` is never closed
    #[error("missing closing bracket for '{token}' opened at index {index}")]
    MissingClosingBracket { token: String, index: usize },
    /// The argument list of a function call is never closed
    #[error("missing closing bracket for function {function} at index {index}")]
    MissingFunctionBracket { function: String, index: usize },
    /// The argument list of an `IF` is never closed
    #[error("missing closing bracket for IF at index {index}")]
    MissingIfBracket { index: usize },
    /// Opening and closing parentheses do not pair up
    #[error("unbalanced parentheses: {open} opening, {close} closing")]
    UnbalancedParentheses { open: usize, close: usize },
    /// Opening and closing braces do not pair up
    #[error("unbalanced braces: {open} opening, {close} closing")]
    UnbalancedBraces { open: usize, close: usize },
    /// A vector-valued expression where only a scalar is legal
    #[error("vector expression '{token}' at index {index} is only allowed as a vector function argument or vector element")]
    VectorOutsideContext { token: String, index: usize },
    /// A vector function argument of the wrong kind
    #[error("argument {position} of {function} must be a {expected}")]
    VectorArgumentMismatch {
        function: String,
        position: usize,
        expected: ArgKind,
    },
    /// `IF` without exactly three comma-separated arguments
    #[error("IF at index {index} requires exactly three arguments")]
    MalformedIf { index: usize },
    /// A `{...}` literal written directly inside another one
    #[error("illegal nested vector at index {index}")]
    NestedVectorLiteral { index: usize },
    /// A comma that does not separate function or vector arguments
    #[error("comma at index {index} is outside an argument list")]
    CommaOutsideArguments { index: usize },
    /// A token that the grammar does not accept at this position
    #[error("unexpected '{token}' at index {index}")]
    UnexpectedToken { token: String, index: usize },
    /// The generated code would underflow or leave values on a stack
    #[error("{stack} stack imbalance at instruction {index}")]
    StackImbalance { stack: &'static str, index: usize },
}

impl CompileError {
    /// Returns the stable numeric code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CompileError::EmptyFormula => ErrorCode::EmptyFormula,
            CompileError::ForbiddenCharacter { .. } => ErrorCode::ForbiddenCharacter,
            CompileError::UnknownToken { .. } => ErrorCode::UnknownToken,
            CompileError::InvalidFirstToken { .. } => ErrorCode::InvalidFirstToken,
            CompileError::InvalidLastToken { .. } => ErrorCode::InvalidLastToken,
            CompileError::InvalidTokenPair { .. } => ErrorCode::InvalidTokenPair,
            CompileError::WrongArity { .. } => ErrorCode::WrongArity,
            CompileError::MissingClosingBracket { .. } => ErrorCode::MissingClosingBracket,
            CompileError::MissingFunctionBracket { .. } => ErrorCode::MissingFunctionBracket,
            CompileError::MissingIfBracket { .. } => ErrorCode::MissingIfBracket,
            CompileError::UnbalancedParentheses { .. } => ErrorCode::UnbalancedParentheses,
            CompileError::UnbalancedBraces { .. } => ErrorCode::UnbalancedBraces,
            CompileError::VectorOutsideContext { .. } => ErrorCode::VectorOutsideContext,
            CompileError::VectorArgumentMismatch { .. } => ErrorCode::VectorArgumentMismatch,
            CompileError::MalformedIf { .. } => ErrorCode::MalformedIf,
            CompileError::NestedVectorLiteral { .. } => ErrorCode::NestedVectorLiteral,
            CompileError::CommaOutsideArguments { .. } => ErrorCode::CommaOutsideArguments,
            CompileError::UnexpectedToken { .. } => ErrorCode::UnexpectedToken,
            CompileError::StackImbalance { .. } => ErrorCode::StackImbalance,
        }
    }
}

/// Errors that can occur when evaluating a compiled formula.
///
/// These are programming errors on the caller side; a formula that compiled
/// never fails at evaluation time otherwise.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Evaluation was requested before a formula compiled successfully
    #[error("no formula has been compiled")]
    NotCompiled,
    /// Fewer scalar arguments than the formula references
    #[error("formula needs {expected} scalar argument(s), got {got}")]
    MissingScalarArguments { expected: usize, got: usize },
    /// Fewer vector arguments than the formula references
    #[error("formula needs {expected} vector argument(s), got {got}")]
    MissingVectorArguments { expected: usize, got: usize },
}

/// Errors that can occur while filling a [`Registry`](crate::registry::Registry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The name is already taken by another function or constant
    #[error("name already registered: {0}")]
    DuplicateName(String),
    /// The name collides with a keyword or the argument syntax
    #[error("reserved name: {0}")]
    ReservedName(String),
    /// The name is not a letter followed by letters and digits
    #[error("invalid name: {0}")]
    InvalidName(String),
    /// Functions need at least one argument
    #[error("function {0} must take at least one argument")]
    ZeroArity(String),
}
