//! Per-expression inference results.
//!
//! An [`Operand`] is what checking one expression produces: how the value can
//! be used (its [`AddressingMode`]), its type, and its compile-time value when
//! it is a constant. Operands are short-lived; the durable result of a node is
//! the `(mode, type, value)` triple recorded in the checker's info tables.

use quill_ast::Expr;
use quill_core::ExactValue;
use quill_registry::{BuiltinProc, EntityId, TypeId};

/// What kind of thing an expression evaluates to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AddressingMode {
    /// Checking failed; the error was already reported.
    #[default]
    Invalid,
    /// A call to a procedure without results.
    NoValue,
    /// A computed value that cannot be assigned to.
    Value,
    /// A named value that cannot be assigned to or have its address taken.
    Immutable,
    /// An addressable value.
    Variable,
    /// A compile-time constant; the operand carries its value.
    Constant,
    /// The expression denotes a type.
    Type,
    /// A builtin procedure, only usable as a callee.
    Builtin(BuiltinProc),
    /// An overloaded procedure name not yet resolved to one candidate.
    Overload(Vec<EntityId>),
    /// `m[k]`: usable as a variable, or with a comma-ok second value.
    MapIndex,
    /// A value that carries an extra `ok` boolean.
    OptionalOk,
}

impl AddressingMode {
    /// Modes that refer to a storage location.
    pub fn is_addressable(&self) -> bool {
        matches!(self, AddressingMode::Variable | AddressingMode::MapIndex)
    }

    /// Modes that denote a value usable in an expression.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            AddressingMode::Value
                | AddressingMode::Immutable
                | AddressingMode::Variable
                | AddressingMode::Constant
                | AddressingMode::MapIndex
                | AddressingMode::OptionalOk
        )
    }
}

/// The result of checking one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand<'ast> {
    pub mode: AddressingMode,
    pub ty: TypeId,
    /// Set when `mode` is [`AddressingMode::Constant`]
    pub value: ExactValue,
    pub expr: Option<Expr<'ast>>,
}

impl<'ast> Operand<'ast> {
    /// An invalid operand for `expr`.
    pub fn invalid(expr: Option<Expr<'ast>>) -> Self {
        Self {
            mode: AddressingMode::Invalid,
            ty: TypeId::INVALID,
            value: ExactValue::Invalid,
            expr,
        }
    }

    pub fn new(mode: AddressingMode, ty: TypeId, expr: Expr<'ast>) -> Self {
        Self {
            mode,
            ty,
            value: ExactValue::Invalid,
            expr: Some(expr),
        }
    }

    pub fn constant(ty: TypeId, value: ExactValue, expr: Expr<'ast>) -> Self {
        Self {
            mode: AddressingMode::Constant,
            ty,
            value,
            expr: Some(expr),
        }
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.mode == AddressingMode::Invalid
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.mode == AddressingMode::Constant
    }

    #[inline]
    pub fn is_type(&self) -> bool {
        self.mode == AddressingMode::Type
    }

    /// Poison the operand after an error.
    pub fn set_invalid(&mut self) {
        self.mode = AddressingMode::Invalid;
    }

    /// Source text of the expression for diagnostics.
    pub fn expr_string(&self) -> String {
        self.expr.map(|e| e.to_string()).unwrap_or_default()
    }
}
