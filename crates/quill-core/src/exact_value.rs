//! Compile-time constant values.
//!
//! [`ExactValue`] is an immutable tagged value; every operation returns a new
//! value. `Invalid` is absorbing: any operation involving it yields `Invalid`
//! without further complaint, so a poisoned constant never cascades errors.
//!
//! Mixed integer/float operands are promoted to float before an operation.
//! `/` on integers produces a float; truncating division is the separate
//! [`BinaryValueOp::IntQuo`], which the checker selects for integer types.

use std::fmt;

use ordered_float::OrderedFloat;

use crate::ids::NodeId;

/// Binary operators understood by the constant evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryValueOp {
    Add,
    Sub,
    Mul,
    Quo,
    IntQuo,
    Mod,
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,
    CmpAnd,
    CmpOr,
}

/// Unary operators understood by the constant evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryValueOp {
    Plus,
    Minus,
    /// Bitwise complement.
    BitNot,
    /// Logical not.
    Not,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareValueOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// A compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ExactValue {
    #[default]
    Invalid,
    Bool(bool),
    String(String),
    Integer(i64),
    Float(OrderedFloat<f64>),
    Pointer(i64),
    /// A constant compound literal, identified by its node.
    Compound(NodeId),
}

impl ExactValue {
    #[inline]
    pub fn float(f: f64) -> Self {
        ExactValue::Float(OrderedFloat(f))
    }

    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        ExactValue::String(s.into())
    }

    /// Parse an integer literal.
    ///
    /// Accepts `0b`, `0o`, `0d` and `0x` prefixes and `_` separators. Digits
    /// past the last valid one are ignored and overflow wraps, matching the
    /// lexer's acceptance rules rather than re-validating them.
    pub fn integer_from_str(text: &str) -> Self {
        let (radix, digits) = match text.as_bytes() {
            [b'0', b'b', rest @ ..] if !rest.is_empty() => (2, &text[2..]),
            [b'0', b'o', rest @ ..] if !rest.is_empty() => (8, &text[2..]),
            [b'0', b'd', rest @ ..] if !rest.is_empty() => (10, &text[2..]),
            [b'0', b'x', rest @ ..] if !rest.is_empty() => (16, &text[2..]),
            _ => (10, text),
        };
        let mut result: i64 = 0;
        for ch in digits.chars() {
            if ch == '_' {
                continue;
            }
            let Some(digit) = ch.to_digit(16) else { break };
            if digit >= radix {
                break;
            }
            result = result.wrapping_mul(radix as i64).wrapping_add(digit as i64);
        }
        ExactValue::Integer(result)
    }

    /// Parse a float literal, ignoring `_` separators.
    pub fn float_from_str(text: &str) -> Self {
        let cleaned: String = text.chars().filter(|c| *c != '_').collect();
        match cleaned.parse::<f64>() {
            Ok(f) => ExactValue::float(f),
            Err(_) => ExactValue::Invalid,
        }
    }

    /// The code point of the first character of a rune literal body.
    pub fn rune_from_str(text: &str) -> Self {
        match text.chars().next() {
            Some(ch) => ExactValue::Integer(ch as i64),
            None => ExactValue::Invalid,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ExactValue::Invalid)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ExactValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ExactValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ExactValue::Float(f) => Some(f.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExactValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is a numeric zero.
    pub fn is_zero(&self) -> bool {
        match self {
            ExactValue::Integer(i) => *i == 0,
            ExactValue::Float(f) => f.0 == 0.0,
            _ => false,
        }
    }

    /// Convert to an integer; floats convert only when exact.
    pub fn to_integer(&self) -> Self {
        match self {
            ExactValue::Integer(_) => self.clone(),
            ExactValue::Float(f) => {
                let i = f.0 as i64;
                if i as f64 == f.0 {
                    ExactValue::Integer(i)
                } else {
                    ExactValue::Invalid
                }
            }
            ExactValue::Pointer(p) => ExactValue::Integer(*p),
            _ => ExactValue::Invalid,
        }
    }

    pub fn to_float(&self) -> Self {
        match self {
            ExactValue::Integer(i) => ExactValue::float(*i as f64),
            ExactValue::Float(_) => self.clone(),
            _ => ExactValue::Invalid,
        }
    }

    /// Apply a unary operator.
    ///
    /// `precision` is the bit width of the destination type; bitwise
    /// complement masks the result to it when it is between 1 and 63 so that
    /// unsigned values wrap correctly.
    pub fn unary(&self, op: UnaryValueOp, precision: u32) -> Self {
        match (op, self) {
            (_, ExactValue::Invalid) => ExactValue::Invalid,
            (UnaryValueOp::Plus, ExactValue::Integer(_) | ExactValue::Float(_)) => self.clone(),
            (UnaryValueOp::Minus, ExactValue::Integer(i)) => ExactValue::Integer(i.wrapping_neg()),
            (UnaryValueOp::Minus, ExactValue::Float(f)) => ExactValue::float(-f.0),
            (UnaryValueOp::BitNot, ExactValue::Integer(i)) => {
                let mut v = !*i;
                if 0 < precision && precision < 64 {
                    v &= !((!0i64) << precision);
                }
                ExactValue::Integer(v)
            }
            (UnaryValueOp::Not, ExactValue::Bool(b)) => ExactValue::Bool(!b),
            _ => ExactValue::Invalid,
        }
    }

    /// Ordering rank used when matching operand kinds.
    fn order(&self) -> u8 {
        match self {
            ExactValue::Invalid => 0,
            ExactValue::Bool(_) | ExactValue::String(_) => 1,
            ExactValue::Integer(_) => 2,
            ExactValue::Float(_) => 3,
            ExactValue::Pointer(_) => 4,
            ExactValue::Compound(_) => 5,
        }
    }

    /// Bring two values to a common kind, promoting integers to floats.
    ///
    /// Returns `None` when the kinds cannot be matched.
    pub fn matched(x: &ExactValue, y: &ExactValue) -> Option<(ExactValue, ExactValue)> {
        if y.order() < x.order() {
            return Self::matched(y, x).map(|(b, a)| (a, b));
        }
        match (x, y) {
            (ExactValue::Invalid, _) => Some((ExactValue::Invalid, ExactValue::Invalid)),
            (ExactValue::Bool(_), ExactValue::Bool(_))
            | (ExactValue::String(_), ExactValue::String(_))
            | (ExactValue::Integer(_), ExactValue::Integer(_))
            | (ExactValue::Float(_), ExactValue::Float(_))
            | (ExactValue::Pointer(_), ExactValue::Pointer(_)) => Some((x.clone(), y.clone())),
            (ExactValue::Integer(i), ExactValue::Float(_)) => {
                Some((ExactValue::float(*i as f64), y.clone()))
            }
            _ => None,
        }
    }

    /// Apply a binary operator. Unsupported combinations yield `Invalid`.
    pub fn binary(&self, op: BinaryValueOp, other: &ExactValue) -> Self {
        let Some((x, y)) = Self::matched(self, other) else {
            return ExactValue::Invalid;
        };
        match (x, y) {
            (ExactValue::Bool(a), ExactValue::Bool(b)) => match op {
                BinaryValueOp::CmpAnd => ExactValue::Bool(a && b),
                BinaryValueOp::CmpOr => ExactValue::Bool(a || b),
                BinaryValueOp::And => ExactValue::Bool(a & b),
                BinaryValueOp::Or => ExactValue::Bool(a | b),
                _ => ExactValue::Invalid,
            },
            (ExactValue::Integer(a), ExactValue::Integer(b)) => integer_binary(op, a, b),
            (ExactValue::Float(a), ExactValue::Float(b)) => {
                let (a, b) = (a.0, b.0);
                match op {
                    BinaryValueOp::Add => ExactValue::float(a + b),
                    BinaryValueOp::Sub => ExactValue::float(a - b),
                    BinaryValueOp::Mul => ExactValue::float(a * b),
                    BinaryValueOp::Quo => ExactValue::float(a / b),
                    _ => ExactValue::Invalid,
                }
            }
            _ => ExactValue::Invalid,
        }
    }

    /// Compare two values. Invalid or mismatched kinds compare false.
    pub fn compare(&self, op: CompareValueOp, other: &ExactValue) -> bool {
        let Some((x, y)) = Self::matched(self, other) else {
            return false;
        };
        match (x, y) {
            (ExactValue::Bool(a), ExactValue::Bool(b)) => match op {
                CompareValueOp::Eq => a == b,
                CompareValueOp::NotEq => a != b,
                _ => false,
            },
            (ExactValue::Integer(a), ExactValue::Integer(b)) => compare_ord(op, &a, &b),
            (ExactValue::Float(a), ExactValue::Float(b)) => compare_partial(op, a.0, b.0),
            (ExactValue::String(a), ExactValue::String(b)) => compare_ord(op, &a, &b),
            (ExactValue::Pointer(a), ExactValue::Pointer(b)) => compare_ord(op, &a, &b),
            _ => false,
        }
    }
}

fn integer_binary(op: BinaryValueOp, a: i64, b: i64) -> ExactValue {
    let c = match op {
        BinaryValueOp::Add => a.wrapping_add(b),
        BinaryValueOp::Sub => a.wrapping_sub(b),
        BinaryValueOp::Mul => a.wrapping_mul(b),
        BinaryValueOp::Quo => return ExactValue::float(a as f64 / b as f64),
        BinaryValueOp::IntQuo => match a.checked_div(b) {
            Some(c) => c,
            None => return ExactValue::Invalid,
        },
        BinaryValueOp::Mod => match a.checked_rem(b) {
            Some(c) => c,
            None => return ExactValue::Invalid,
        },
        BinaryValueOp::And => a & b,
        BinaryValueOp::Or => a | b,
        BinaryValueOp::Xor => a ^ b,
        BinaryValueOp::AndNot => a & !b,
        BinaryValueOp::Shl => {
            if b < 0 {
                return ExactValue::Invalid;
            }
            if b >= 64 { 0 } else { a.wrapping_shl(b as u32) }
        }
        BinaryValueOp::Shr => {
            if b < 0 {
                return ExactValue::Invalid;
            }
            if b >= 64 {
                if a < 0 { -1 } else { 0 }
            } else {
                a >> b
            }
        }
        BinaryValueOp::CmpAnd | BinaryValueOp::CmpOr => return ExactValue::Invalid,
    };
    ExactValue::Integer(c)
}

fn compare_ord<T: Ord>(op: CompareValueOp, a: &T, b: &T) -> bool {
    match op {
        CompareValueOp::Eq => a == b,
        CompareValueOp::NotEq => a != b,
        CompareValueOp::Lt => a < b,
        CompareValueOp::LtEq => a <= b,
        CompareValueOp::Gt => a > b,
        CompareValueOp::GtEq => a >= b,
    }
}

fn compare_partial(op: CompareValueOp, a: f64, b: f64) -> bool {
    match op {
        CompareValueOp::Eq => a == b,
        CompareValueOp::NotEq => a != b,
        CompareValueOp::Lt => a < b,
        CompareValueOp::LtEq => a <= b,
        CompareValueOp::Gt => a > b,
        CompareValueOp::GtEq => a >= b,
    }
}

impl fmt::Display for ExactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExactValue::Invalid => f.write_str("invalid"),
            ExactValue::Bool(b) => write!(f, "{b}"),
            ExactValue::String(s) => write!(f, "{s:?}"),
            ExactValue::Integer(i) => write!(f, "{i}"),
            ExactValue::Float(x) => write!(f, "{}", x.0),
            ExactValue::Pointer(p) => write!(f, "{p:#x}"),
            ExactValue::Compound(_) => f.write_str("compound literal"),
        }
    }
}
