//! Recursive-descent compiler from tokens to instructions.
//!
//! There is no intermediate tree: every grammar rule emits its instructions as
//! soon as it has parsed its operands, using the code shapes documented in
//! [`crate::op`]. Binary levels are parsed by one precedence-climbing routine,
//! so every level (including `^`) is left-associative.
//!
//! Before parsing, the token sequence is checked for stray or crossed closing
//! brackets, a legal first and last token, and legal adjacent pairs. Brackets
//! left open are reported by the parser against the construct that opened them.

use crate::errors::CompileError;
use crate::op::{BinOp, Instr, JumpTarget, Op, PRECEDENCE_LEVELS};
use crate::registry::{ArgKind, Registry};
use crate::token::{Token, TokenKind};

/// Initial instruction sequence plus what the formula turned out to contain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generated {
    pub code: Vec<Instr>,
    pub has_jump: bool,
    pub has_vector: bool,
    pub has_nested_vector: bool,
}

/// Coarse token classes used by the adjacency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Operand,
    Callable,
    Open,
    Close,
    Comma,
    Sign,
    Not,
    Binary,
}

fn class(kind: TokenKind) -> Class {
    use TokenKind::*;
    match kind {
        ScalarArg(_) | Constant(_) | VectorArg(_) | VectorConstant { .. } => Class::Operand,
        Function(_) | VectorFunction(_) | If => Class::Callable,
        LParen | LBrace => Class::Open,
        RParen | RBrace => Class::Close,
        Comma => Class::Comma,
        Plus | Minus => Class::Sign,
        TokenKind::Not => Class::Not,
        Star | Slash | Caret | Eq | Ne | Lt | Le | Ge | Gt | And | Or => Class::Binary,
    }
}

/// Classes that may start an operand.
fn starts_operand(class: Class) -> bool {
    matches!(
        class,
        Class::Operand | Class::Callable | Class::Open | Class::Sign | Class::Not
    )
}

fn may_follow(first: Token<'_>, second: Token<'_>) -> bool {
    let next = class(second.kind);
    match class(first.kind) {
        Class::Operand | Class::Close => matches!(
            next,
            Class::Binary | Class::Sign | Class::Close | Class::Comma
        ),
        Class::Callable => second.kind == TokenKind::LParen,
        Class::Open | Class::Comma | Class::Sign | Class::Not | Class::Binary => {
            starts_operand(next)
        }
    }
}

/// Every closing bracket must match the innermost open one.
///
/// Brackets still open at the end are left to the parser, which knows whether
/// the opener belongs to a function call, an `IF` or a plain group.
fn check_balance(tokens: &[Token<'_>]) -> Result<(), CompileError> {
    let count = |kind: TokenKind| tokens.iter().filter(|t| t.kind == kind).count();
    let unbalanced = |kind: TokenKind| match kind {
        TokenKind::LParen | TokenKind::RParen => CompileError::UnbalancedParentheses {
            open: count(TokenKind::LParen),
            close: count(TokenKind::RParen),
        },
        _ => CompileError::UnbalancedBraces {
            open: count(TokenKind::LBrace),
            close: count(TokenKind::RBrace),
        },
    };

    let mut open = Vec::new();
    for token in tokens {
        let opener = match token.kind {
            TokenKind::LParen | TokenKind::LBrace => {
                open.push(token.kind);
                continue;
            }
            TokenKind::RParen => TokenKind::LParen,
            TokenKind::RBrace => TokenKind::LBrace,
            _ => continue,
        };
        match open.pop() {
            Some(kind) if kind == opener => {}
            // crossed: the bracket left open is the one at fault
            Some(kind) => return Err(unbalanced(kind)),
            None => return Err(unbalanced(token.kind)),
        }
    }
    Ok(())
}

/// Checks closing brackets, first and last token, and every adjacent pair.
pub(crate) fn validate(tokens: &[Token<'_>]) -> Result<(), CompileError> {
    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return Err(CompileError::EmptyFormula);
    };
    check_balance(tokens)?;

    if !starts_operand(class(first.kind)) {
        return Err(CompileError::InvalidFirstToken {
            token: first.text.to_string(),
        });
    }
    if !matches!(class(last.kind), Class::Operand | Class::Close) {
        return Err(CompileError::InvalidLastToken {
            token: last.text.to_string(),
        });
    }
    for (index, pair) in tokens.windows(2).enumerate() {
        if !may_follow(pair[0], pair[1]) {
            return Err(CompileError::InvalidTokenPair {
                first: pair[0].text.to_string(),
                second: pair[1].text.to_string(),
                index: index + 1,
            });
        }
    }
    Ok(())
}

/// Kind of value an expression leaves behind: the accumulator, or the top of
/// the vector stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Scalar,
    Vector,
}

/// Innermost construct that accepts vector-valued expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Call,
    Literal,
}

struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    registry: &'t Registry,
    pos: usize,
    code: Vec<Instr>,
    next_label: u32,
    scopes: Vec<Scope>,
    literal_depth: usize,
    has_jump: bool,
    has_vector: bool,
    has_nested_vector: bool,
}

fn binary_op(kind: TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::Or => BinOp::Or,
        TokenKind::And => BinOp::And,
        TokenKind::Eq => BinOp::Eq,
        TokenKind::Ne => BinOp::Ne,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Le => BinOp::Le,
        TokenKind::Ge => BinOp::Ge,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::Caret => BinOp::Pow,
        _ => return None,
    })
}

impl<'t, 'a> Parser<'t, 'a> {
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn text(&self, index: usize) -> String {
        self.tokens
            .get(index)
            .map_or_else(String::new, |t| t.text.to_string())
    }

    fn emit(&mut self, op: Op) {
        self.code.push(Instr::new(op));
    }

    fn label(&mut self) -> u32 {
        self.next_label += 1;
        self.next_label - 1
    }

    fn unexpected(&self, index: usize) -> CompileError {
        match self.tokens.get(index).map(|t| t.kind) {
            Some(TokenKind::Comma) => CompileError::CommaOutsideArguments { index },
            _ => CompileError::UnexpectedToken {
                token: self.text(index),
                index,
            },
        }
    }

    fn require_scalar(&self, kind: Kind, at: usize) -> Result<(), CompileError> {
        match kind {
            Kind::Scalar => Ok(()),
            Kind::Vector => Err(CompileError::VectorOutsideContext {
                token: self.text(at),
                index: at,
            }),
        }
    }

    /// Consumes the `(` that must follow a function name or `IF`.
    fn open_call(&mut self) -> Result<(), CompileError> {
        if self.peek() == Some(TokenKind::LParen) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(self.pos))
        }
    }

    fn expression(&mut self) -> Result<Kind, CompileError> {
        self.binary(0)
    }

    fn binary(&mut self, level: usize) -> Result<Kind, CompileError> {
        if level == PRECEDENCE_LEVELS {
            return self.unary();
        }
        let lhs_at = self.pos;
        let mut kind = self.binary(level + 1)?;
        while let Some(op) = self
            .peek()
            .and_then(binary_op)
            .filter(|op| op.precedence() == level)
        {
            self.require_scalar(kind, lhs_at)?;
            self.pos += 1;
            self.emit(Op::Push);
            let rhs_at = self.pos;
            let rhs = self.binary(level + 1)?;
            self.require_scalar(rhs, rhs_at)?;
            self.emit(Op::Binary(op));
            kind = Kind::Scalar;
        }
        Ok(kind)
    }

    fn unary(&mut self) -> Result<Kind, CompileError> {
        let op = match self.peek() {
            Some(TokenKind::Minus) => Some(Op::Neg),
            Some(TokenKind::Not) => Some(Op::Not),
            Some(TokenKind::Plus) => None,
            _ => return self.primary(),
        };
        self.pos += 1;
        if matches!(
            self.peek(),
            Some(TokenKind::Minus | TokenKind::Plus | TokenKind::Not)
        ) {
            return Err(self.unexpected(self.pos));
        }
        let operand_at = self.pos;
        let kind = self.primary()?;
        self.require_scalar(kind, operand_at)?;
        if let Some(op) = op {
            self.emit(op);
        }
        Ok(Kind::Scalar)
    }

    fn primary(&mut self) -> Result<Kind, CompileError> {
        let at = self.pos;
        let Some(token) = self.tokens.get(at).copied() else {
            return Err(CompileError::InvalidLastToken {
                token: self.text(at.saturating_sub(1)),
            });
        };
        self.pos += 1;
        match token.kind {
            TokenKind::ScalarArg(i) => {
                self.emit(Op::Arg(i));
                Ok(Kind::Scalar)
            }
            TokenKind::Constant(i) => {
                self.emit(Op::Const(i));
                Ok(Kind::Scalar)
            }
            TokenKind::VectorArg(i) => {
                self.has_vector = true;
                self.emit(Op::VecArg(i));
                Ok(Kind::Vector)
            }
            TokenKind::VectorConstant { index, braced } => {
                if braced && self.scopes.last() == Some(&Scope::Literal) {
                    return Err(CompileError::NestedVectorLiteral { index: at });
                }
                self.has_vector = true;
                self.emit(Op::VecConst(index));
                Ok(Kind::Vector)
            }
            TokenKind::LParen => {
                let kind = self.expression()?;
                match self.peek() {
                    Some(TokenKind::RParen) => {
                        self.pos += 1;
                        Ok(kind)
                    }
                    Some(TokenKind::Comma) => Err(CompileError::CommaOutsideArguments {
                        index: self.pos,
                    }),
                    _ => Err(CompileError::MissingClosingBracket {
                        token: token.text.to_string(),
                        index: at,
                    }),
                }
            }
            TokenKind::LBrace => self.vector_literal(at),
            TokenKind::Function(f) => self.call(f, at),
            TokenKind::VectorFunction(f) => self.call_vector(f, at),
            TokenKind::If => self.conditional(at),
            _ => Err(self.unexpected(at)),
        }
    }

    fn call(&mut self, f: u32, at: usize) -> Result<Kind, CompileError> {
        let registry = self.registry;
        let function = registry.function(f);
        self.open_call()?;
        self.scopes.push(Scope::Call);
        let mut count = 0;
        loop {
            let arg_at = self.pos;
            let kind = self.expression()?;
            self.require_scalar(kind, arg_at)?;
            self.emit(Op::Push);
            count += 1;
            match self.peek() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    return Err(CompileError::MissingFunctionBracket {
                        function: function.name().to_string(),
                        index: at,
                    })
                }
            }
        }
        self.scopes.pop();
        if count != function.arity() {
            return Err(CompileError::WrongArity {
                function: function.name().to_string(),
                expected: function.arity(),
                found: count,
            });
        }
        self.emit(Op::Call(f));
        Ok(Kind::Scalar)
    }

    fn call_vector(&mut self, f: u32, at: usize) -> Result<Kind, CompileError> {
        let registry = self.registry;
        let function = registry.vector_function(f);
        self.has_vector = true;
        self.open_call()?;
        self.scopes.push(Scope::Call);
        let mut count = 0;
        loop {
            let kind = self.expression()?;
            if let Some(&expected) = function.args().get(count) {
                let found = match kind {
                    Kind::Scalar => ArgKind::Scalar,
                    Kind::Vector => ArgKind::Vector,
                };
                if found != expected {
                    return Err(CompileError::VectorArgumentMismatch {
                        function: function.name().to_string(),
                        position: count + 1,
                        expected,
                    });
                }
            }
            if kind == Kind::Scalar {
                self.emit(Op::Push);
            }
            count += 1;
            match self.peek() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    return Err(CompileError::MissingFunctionBracket {
                        function: function.name().to_string(),
                        index: at,
                    })
                }
            }
        }
        self.scopes.pop();
        if count != function.arity() {
            return Err(CompileError::WrongArity {
                function: function.name().to_string(),
                expected: function.arity(),
                found: count,
            });
        }
        self.emit(Op::CallVector(f));
        Ok(match function.output() {
            ArgKind::Scalar => Kind::Scalar,
            ArgKind::Vector => Kind::Vector,
        })
    }

    /// Expects the comma between two `IF` arguments.
    fn if_separator(&mut self, at: usize) -> Result<(), CompileError> {
        match self.peek() {
            Some(TokenKind::Comma) => {
                self.pos += 1;
                Ok(())
            }
            Some(TokenKind::RParen) => Err(CompileError::MalformedIf { index: at }),
            _ => Err(CompileError::MissingIfBracket { index: at }),
        }
    }

    fn conditional(&mut self, at: usize) -> Result<Kind, CompileError> {
        self.open_call()?;
        self.has_jump = true;
        let skip = self.label();
        let done = self.label();

        let cond_at = self.pos;
        let cond = self.expression()?;
        self.require_scalar(cond, cond_at)?;
        self.if_separator(at)?;
        self.emit(Op::JumpIfFalse(JumpTarget::Label(skip)));

        let then_at = self.pos;
        let then = self.expression()?;
        self.require_scalar(then, then_at)?;
        self.if_separator(at)?;
        self.emit(Op::Jump(JumpTarget::Label(done)));
        self.emit(Op::Label(skip));

        let else_at = self.pos;
        let otherwise = self.expression()?;
        self.require_scalar(otherwise, else_at)?;
        match self.peek() {
            Some(TokenKind::RParen) => self.pos += 1,
            Some(TokenKind::Comma) => return Err(CompileError::MalformedIf { index: at }),
            _ => return Err(CompileError::MissingIfBracket { index: at }),
        }
        self.emit(Op::Label(done));
        Ok(Kind::Scalar)
    }

    fn vector_literal(&mut self, at: usize) -> Result<Kind, CompileError> {
        if self.scopes.last() == Some(&Scope::Literal) {
            return Err(CompileError::NestedVectorLiteral { index: at });
        }
        self.has_vector = true;
        if self.literal_depth > 0 {
            self.has_nested_vector = true;
        }
        self.literal_depth += 1;
        self.scopes.push(Scope::Literal);
        self.emit(Op::VecBegin);
        loop {
            let kind = self.expression()?;
            self.emit(match kind {
                Kind::Scalar => Op::Append,
                Kind::Vector => Op::Spread,
            });
            match self.peek() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RBrace) => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    return Err(CompileError::MissingClosingBracket {
                        token: self.text(at),
                        index: at,
                    })
                }
            }
        }
        self.scopes.pop();
        self.literal_depth -= 1;
        self.emit(Op::VecEnd);
        Ok(Kind::Vector)
    }
}

/// Compiles validated tokens into the initial instruction sequence.
///
/// # Errors
/// Returns the first grammar error encountered; see [`CompileError`].
pub fn generate(tokens: &[Token<'_>], registry: &Registry) -> Result<Generated, CompileError> {
    validate(tokens)?;

    let mut parser = Parser {
        tokens,
        registry,
        pos: 0,
        code: Vec::with_capacity(tokens.len() * 2),
        next_label: 0,
        scopes: Vec::new(),
        literal_depth: 0,
        has_jump: false,
        has_vector: false,
        has_nested_vector: false,
    };

    let kind = parser.expression()?;
    if parser.pos < tokens.len() {
        return Err(parser.unexpected(parser.pos));
    }
    parser.require_scalar(kind, 0)?;

    Ok(Generated {
        code: parser.code,
        has_jump: parser.has_jump,
        has_vector: parser.has_vector,
        has_nested_vector: parser.has_nested_vector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::op::Op::*;
    use crate::registry::Registry;
    use crate::token::classify;

    fn registry() -> Registry {
        let mut registry = Registry::standard();
        registry
            .register_vector_function(
                "pick",
                "element of a vector",
                &[ArgKind::Vector, ArgKind::Scalar],
                |s, v| v[0][s[0] as usize],
            )
            .unwrap();
        registry
    }

    fn compile(source: &str) -> Result<Generated, CompileError> {
        let registry = registry();
        let lexemes = tokenize(source)?;
        let classified = classify(source, &lexemes, &registry)?;
        generate(&classified.tokens, &registry)
    }

    fn ops(source: &str) -> Vec<Op> {
        compile(source).unwrap().code.iter().map(|i| i.op).collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            ops("1+2*3"),
            vec![
                Const(0),
                Push,
                Const(1),
                Push,
                Const(2),
                Binary(BinOp::Mul),
                Binary(BinOp::Add)
            ]
        );
        assert_eq!(
            ops("(1+2)*3"),
            vec![
                Const(0),
                Push,
                Const(1),
                Binary(BinOp::Add),
                Push,
                Const(2),
                Binary(BinOp::Mul)
            ]
        );
    }

    #[test]
    fn test_power_is_left_associative() {
        // 2^3^2 = (2^3)^2
        assert_eq!(
            ops("2^3^2"),
            vec![
                Const(0),
                Push,
                Const(1),
                Binary(BinOp::Pow),
                Push,
                Const(2),
                Binary(BinOp::Pow)
            ]
        );
    }

    #[test]
    fn test_unary_binds_tighter_than_power() {
        assert_eq!(
            ops("-X0^2"),
            vec![Arg(0), Neg, Push, Const(0), Binary(BinOp::Pow)]
        );
        assert_eq!(ops("+X0"), vec![Arg(0)]);
        assert_eq!(
            ops("X0 - -1"),
            vec![Arg(0), Push, Const(0), Neg, Binary(BinOp::Sub)]
        );
    }

    #[test]
    fn test_function_call() {
        assert_eq!(
            ops("MAX(X0, 2)"),
            vec![Arg(0), Push, Const(0), Push, Call(20)]
        );
    }

    #[test]
    fn test_conditional_shape() {
        let generated = compile("IF(X0>0,1,-1)").unwrap();
        assert!(generated.has_jump);
        assert_eq!(
            generated.code.iter().map(|i| i.op).collect::<Vec<_>>(),
            vec![
                Arg(0),
                Push,
                Const(0),
                Binary(BinOp::Gt),
                JumpIfFalse(JumpTarget::Label(0)),
                Const(1),
                Jump(JumpTarget::Label(1)),
                Label(0),
                Const(1),
                Neg,
                Label(1),
            ]
        );
    }

    #[test]
    fn test_vector_literal_with_spread() {
        let generated = compile("VSUM({X0, X1{}, VSCALE(X2{}, 2)})").unwrap();
        assert!(generated.has_vector);
        assert!(!generated.has_nested_vector);
        assert_eq!(
            generated.code.iter().map(|i| i.op).collect::<Vec<_>>(),
            vec![
                VecBegin,
                Arg(0),
                Append,
                VecArg(1),
                Spread,
                VecArg(2),
                Const(0),
                Push,
                CallVector(8),
                Spread,
                VecEnd,
                CallVector(0),
            ]
        );
    }

    #[test]
    fn test_nested_vector_through_function() {
        let generated = compile("VSUM({1, VSCALE({X0, 2}, 3)})").unwrap();
        assert!(generated.has_nested_vector);
    }

    #[test]
    fn test_vector_function_argument_kinds() {
        assert_eq!(
            ops("PICK(X0{}, 1)"),
            vec![VecArg(0), Const(0), Push, CallVector(10)]
        );
        assert_eq!(
            compile("PICK(1, X0{})").unwrap_err(),
            CompileError::VectorArgumentMismatch {
                function: "PICK".to_string(),
                position: 1,
                expected: ArgKind::Vector,
            }
        );
    }

    #[test]
    fn test_grammar_errors() {
        assert_eq!(
            compile("MAX(1)").unwrap_err(),
            CompileError::WrongArity {
                function: "MAX".to_string(),
                expected: 2,
                found: 1
            }
        );
        assert_eq!(
            compile("VSUM({{1,2}, 3})").unwrap_err().code(),
            crate::errors::ErrorCode::NestedVectorLiteral
        );
        assert_eq!(
            compile("VSUM({{X0}, 3})").unwrap_err().code(),
            crate::errors::ErrorCode::NestedVectorLiteral
        );
        assert_eq!(
            compile("VSUM({({X0}), 3})").unwrap_err().code(),
            crate::errors::ErrorCode::NestedVectorLiteral
        );
        assert_eq!(
            compile("X0{} + 1").unwrap_err(),
            CompileError::VectorOutsideContext {
                token: "X0{}".to_string(),
                index: 0
            }
        );
        assert_eq!(
            compile("SQRT(X0{})").unwrap_err().code(),
            crate::errors::ErrorCode::VectorOutsideContext
        );
        assert_eq!(
            compile("{1, 2}").unwrap_err().code(),
            crate::errors::ErrorCode::VectorOutsideContext
        );
        assert_eq!(
            compile("IF(1, 2)").unwrap_err(),
            CompileError::MalformedIf { index: 0 }
        );
        assert_eq!(
            compile("IF(1, 2, 3, 4)").unwrap_err(),
            CompileError::MalformedIf { index: 0 }
        );
        assert_eq!(
            compile("1, 2").unwrap_err(),
            CompileError::CommaOutsideArguments { index: 1 }
        );
        assert_eq!(
            compile("(1, 2)").unwrap_err(),
            CompileError::CommaOutsideArguments { index: 2 }
        );
        assert_eq!(
            compile("--1").unwrap_err().code(),
            crate::errors::ErrorCode::UnexpectedToken
        );
    }

    #[test]
    fn test_sequence_errors() {
        assert_eq!(
            compile(")1(").unwrap_err().code(),
            crate::errors::ErrorCode::UnbalancedParentheses
        );
        assert_eq!(
            compile("VSUM({1,X0)}").unwrap_err(),
            CompileError::UnbalancedBraces { open: 1, close: 1 }
        );
        assert_eq!(
            compile("VSUM({X0, 1)").unwrap_err(),
            CompileError::UnbalancedBraces { open: 1, close: 0 }
        );
        assert_eq!(
            compile("IF(X0, 1, 2}").unwrap_err(),
            CompileError::UnbalancedParentheses { open: 1, close: 0 }
        );
        assert_eq!(
            compile("VSUM({1,X0})}").unwrap_err(),
            CompileError::UnbalancedBraces { open: 1, close: 2 }
        );
        assert_eq!(
            compile("*2").unwrap_err(),
            CompileError::InvalidFirstToken {
                token: "*".to_string()
            }
        );
        assert_eq!(
            compile("2+").unwrap_err(),
            CompileError::InvalidLastToken {
                token: "+".to_string()
            }
        );
        assert_eq!(
            compile("2 X0").unwrap_err(),
            CompileError::InvalidTokenPair {
                first: "2".to_string(),
                second: "X0".to_string(),
                index: 1
            }
        );
        assert_eq!(
            compile("SIN 2").unwrap_err().code(),
            crate::errors::ErrorCode::InvalidTokenPair
        );
        assert_eq!(
            compile("()").unwrap_err().code(),
            crate::errors::ErrorCode::InvalidTokenPair
        );
    }

    #[test]
    fn test_unclosed_brackets_name_their_construct() {
        assert_eq!(
            compile("(X0 + 1").unwrap_err(),
            CompileError::MissingClosingBracket {
                token: "(".to_string(),
                index: 0
            }
        );
        assert_eq!(
            compile("1 + (2 * (X0 - 1)").unwrap_err(),
            CompileError::MissingClosingBracket {
                token: "(".to_string(),
                index: 2
            }
        );
        assert_eq!(
            compile("VSUM({1, X0").unwrap_err(),
            CompileError::MissingClosingBracket {
                token: "{".to_string(),
                index: 2
            }
        );
        assert_eq!(
            compile("SIN(X0").unwrap_err(),
            CompileError::MissingFunctionBracket {
                function: "SIN".to_string(),
                index: 0
            }
        );
        assert_eq!(
            compile("MAX(X0, 1").unwrap_err(),
            CompileError::MissingFunctionBracket {
                function: "MAX".to_string(),
                index: 0
            }
        );
        assert_eq!(
            compile("VSUM({1, X0}").unwrap_err(),
            CompileError::MissingFunctionBracket {
                function: "VSUM".to_string(),
                index: 0
            }
        );
        assert_eq!(
            compile("IF(X0, 1, 2").unwrap_err(),
            CompileError::MissingIfBracket { index: 0 }
        );
        assert_eq!(
            compile("2 * IF(X0, 1").unwrap_err(),
            CompileError::MissingIfBracket { index: 2 }
        );
    }
}
