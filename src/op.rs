//! Instruction set of the formula virtual machine.
//!
//! The machine has an accumulator register plus three stacks (scalars, vectors
//! and vector-staging lists). Every instruction either writes the accumulator,
//! moves values between the accumulator and the stacks, or changes control flow.
//! Any instruction may carry a push flag, meaning "after executing, push the
//! accumulator onto the scalar stack".
//!
//! # Opcode bands
//!
//! The variants of [`Op`] are declared in band order: control and operator
//! instructions first, then scalar arguments, literal constants, scalar
//! functions, subterm reads, subterm writes, calculated constants, vector
//! functions, vector arguments, vector constants, vector subterm reads and
//! vector subterm writes. Each member carries the index of its pool entry, so
//! the derived ordering sorts by band first and by index second.
//!
//! # Code shapes
//!
//! - leaf: `Arg(i)` writes the accumulator
//! - binary: `lhs, Push, rhs, Binary(op)`; the operator pops the left operand
//!   and uses the accumulator as the right one
//! - call: `arg, Push, ..., arg, Push, Call(f)`
//! - conditional: `cond, JumpIfFalse(a), then, Jump(b), Label(a), else, Label(b)`
//! - vector literal: `VecBegin, (elem, Append | Spread)*, VecEnd`

use std::fmt;

/// Binary operators, in ascending precedence groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Ge,
    Gt,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Number of binary precedence levels (`OR` is level 0, `^` is the last).
pub const PRECEDENCE_LEVELS: usize = 7;

/// Converts a boolean into the machine's 1.0 / 0.0 representation.
#[inline]
pub fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Equality where NaN equals NaN.
#[inline]
pub fn nan_eq(l: f64, r: f64) -> bool {
    l == r || (l.is_nan() && r.is_nan())
}

impl BinOp {
    /// Precedence level; higher binds tighter.
    pub fn precedence(self) -> usize {
        match self {
            BinOp::Or => 0,
            BinOp::And => 1,
            BinOp::Eq | BinOp::Ne => 2,
            BinOp::Lt | BinOp::Le | BinOp::Ge | BinOp::Gt => 3,
            BinOp::Add | BinOp::Sub => 4,
            BinOp::Mul | BinOp::Div => 5,
            BinOp::Pow => 6,
        }
    }

    /// Operators whose operands may be swapped without changing the result.
    pub fn is_symmetric(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Mul | BinOp::Eq | BinOp::Ne)
    }

    /// Applies the operator. Comparisons and logic return 1.0 or 0.0; `=`,
    /// `<>`, `<=` and `>=` treat NaN as equal to NaN.
    #[inline]
    pub fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            BinOp::Add => l + r,
            BinOp::Sub => l - r,
            BinOp::Mul => l * r,
            BinOp::Div => l / r,
            BinOp::Pow => l.powf(r),
            BinOp::Eq => truth(nan_eq(l, r)),
            BinOp::Ne => truth(!nan_eq(l, r)),
            BinOp::Lt => truth(l < r),
            BinOp::Le => truth(l <= r || (l.is_nan() && r.is_nan())),
            BinOp::Ge => truth(l >= r || (l.is_nan() && r.is_nan())),
            BinOp::Gt => truth(l > r),
            BinOp::And => truth(l != 0.0 && r != 0.0),
            BinOp::Or => truth(l != 0.0 || r != 0.0),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "OR",
            BinOp::And => "AND",
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Gt => ">",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }
}

/// Destination of a jump: a symbolic label until the jump resolver replaces it
/// with the number of instructions to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JumpTarget {
    Label(u32),
    Offset(u32),
}

/// A single opcode with its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    /// Push the accumulator onto the scalar stack
    Push,
    /// Negate the accumulator
    Neg,
    /// Logical negation of the accumulator
    Not,
    /// Pop the left operand, combine with the accumulator
    Binary(BinOp),
    /// Skip ahead when the accumulator is 0.0
    JumpIfFalse(JumpTarget),
    /// Skip ahead unconditionally
    Jump(JumpTarget),
    /// Jump destination marker, removed by the jump resolver
    Label(u32),
    /// Open a new vector staging list
    VecBegin,
    /// Append the accumulator to the innermost staging list
    Append,
    /// Pop a vector and append all of its elements to the innermost staging list
    Spread,
    /// Move the innermost staging list onto the vector stack
    VecEnd,
    Arg(u32),
    Const(u32),
    Call(u32),
    /// Read a subterm slot into the accumulator
    Subterm(u32),
    /// Store the accumulator into a subterm slot
    StoreSubterm(u32),
    Calculated(u32),
    CallVector(u32),
    VecArg(u32),
    VecConst(u32),
    /// Push a copy of a vector subterm slot onto the vector stack
    VecSubterm(u32),
    /// Copy the top of the vector stack into a vector subterm slot
    StoreVecSubterm(u32),
}

impl Op {
    /// Leaves that produce a value without reading the accumulator or any stack.
    pub fn is_value_producer(self) -> bool {
        matches!(
            self,
            Op::Arg(_)
                | Op::Const(_)
                | Op::Calculated(_)
                | Op::Subterm(_)
                | Op::VecArg(_)
                | Op::VecConst(_)
                | Op::VecSubterm(_)
        )
    }

    /// Scalar leaves: a single instruction that fully determines the accumulator.
    pub fn is_scalar_leaf(self) -> bool {
        matches!(
            self,
            Op::Arg(_) | Op::Const(_) | Op::Calculated(_) | Op::Subterm(_)
        )
    }

    pub fn is_control(self) -> bool {
        matches!(self, Op::JumpIfFalse(_) | Op::Jump(_) | Op::Label(_))
    }

    /// Instructions that write a new value into the accumulator.
    ///
    /// `CallVector` is included; callers that care about vector-valued
    /// functions must check the function's output kind.
    pub fn writes_accumulator(self) -> bool {
        matches!(
            self,
            Op::Neg
                | Op::Not
                | Op::Binary(_)
                | Op::Arg(_)
                | Op::Const(_)
                | Op::Call(_)
                | Op::Subterm(_)
                | Op::Calculated(_)
                | Op::CallVector(_)
        )
    }
}

/// One instruction: an opcode plus the push flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instr {
    pub op: Op,
    pub push: bool,
}

impl Instr {
    pub fn new(op: Op) -> Self {
        Self { op, push: false }
    }

    pub fn pushed(op: Op) -> Self {
        Self { op, push: true }
    }
}

impl From<Op> for Instr {
    fn from(op: Op) -> Self {
        Instr::new(op)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Push => write!(f, "PUSH"),
            Op::Neg => write!(f, "NEG"),
            Op::Not => write!(f, "NOT"),
            Op::Binary(op) => write!(f, "OP {}", op.symbol()),
            Op::JumpIfFalse(JumpTarget::Label(l)) => write!(f, "JMPF L{l}"),
            Op::JumpIfFalse(JumpTarget::Offset(n)) => write!(f, "JMPF +{n}"),
            Op::Jump(JumpTarget::Label(l)) => write!(f, "JMP L{l}"),
            Op::Jump(JumpTarget::Offset(n)) => write!(f, "JMP +{n}"),
            Op::Label(l) => write!(f, "L{l}:"),
            Op::VecBegin => write!(f, "VBEGIN"),
            Op::Append => write!(f, "VAPPEND"),
            Op::Spread => write!(f, "VSPREAD"),
            Op::VecEnd => write!(f, "VEND"),
            Op::Arg(i) => write!(f, "ARG X{i}"),
            Op::Const(i) => write!(f, "CONST #{i}"),
            Op::Call(i) => write!(f, "CALL F{i}"),
            Op::Subterm(i) => write!(f, "LOAD S{i}"),
            Op::StoreSubterm(i) => write!(f, "STORE S{i}"),
            Op::Calculated(i) => write!(f, "CALC #{i}"),
            Op::CallVector(i) => write!(f, "VCALL V{i}"),
            Op::VecArg(i) => write!(f, "VARG X{i}{{}}"),
            Op::VecConst(i) => write!(f, "VCONST #{i}"),
            Op::VecSubterm(i) => write!(f, "VLOAD VS{i}"),
            Op::StoreVecSubterm(i) => write!(f, "VSTORE VS{i}"),
        }
    }
}
