//! Binary operators: arithmetic, bitwise, logical, shifts, comparisons and
//! pointer arithmetic.
//!
//! Both operands are converted towards each other first, so an untyped
//! operand takes the type of a typed one. The converted types must then be
//! identical. Constant operands fold to a constant result.

use quill_ast::{BinaryExpr, BinaryOp, Expr};
use quill_core::{BinaryValueOp, CompareValueOp, ErrorKind, ExactValue};
use quill_registry::{TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

/// Largest constant shift amount.
const MAX_SHIFT: i64 = 64;

impl<'ast> Checker<'ast> {
    pub(super) fn check_binary_expr(&mut self, be: &'ast BinaryExpr<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        let op = be.op;
        if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
            return self.check_equality(be, e);
        }

        let x = self.check_expr(be.left);
        let y = self.check_expr(be.right);
        if x.is_invalid() || y.is_invalid() {
            return Operand::invalid(Some(e));
        }

        if op.is_shift() {
            return self.check_shift(x, y, be, e);
        }

        if matches!(op, BinaryOp::Add | BinaryOp::Sub) {
            if let Some(result) = self.check_pointer_arithmetic(&x, &y, be, e) {
                return result;
            }
        }

        self.check_binary_operands(x, y, be, e)
    }

    /// `==` and `!=` also compare types.
    fn check_equality(&mut self, be: &'ast BinaryExpr<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        let x = self.check_expr_or_type(be.left);
        let y = self.check_expr_or_type(be.right);
        if x.is_invalid() || y.is_invalid() {
            return Operand::invalid(Some(e));
        }
        match (x.is_type(), y.is_type()) {
            (true, true) => {
                let equal = self.registry.are_types_identical(x.ty, y.ty);
                let value = if be.op == BinaryOp::Eq { equal } else { !equal };
                Operand::constant(TypeId::UNTYPED_BOOL, ExactValue::Bool(value), e)
            }
            (true, false) | (false, true) => {
                let which = if x.is_type() { be.left } else { be.right };
                self.error(ErrorKind::TypeMismatch, which.span(), format!("`{which}` is not an expression"));
                Operand::invalid(Some(e))
            }
            (false, false) => self.check_binary_operands(x, y, be, e),
        }
    }

    fn check_binary_operands(
        &mut self,
        mut x: Operand<'ast>,
        mut y: Operand<'ast>,
        be: &'ast BinaryExpr<'ast>,
        e: Expr<'ast>,
    ) -> Operand<'ast> {
        let op = be.op;
        self.convert_to_typed(&mut x, y.ty);
        if x.is_invalid() {
            return Operand::invalid(Some(e));
        }
        self.convert_to_typed(&mut y, x.ty);
        if y.is_invalid() {
            return Operand::invalid(Some(e));
        }

        if op.is_comparison() {
            return self.check_comparison(x, y, op, e);
        }

        if !self.registry.are_types_identical(x.ty, y.ty) {
            if x.ty != TypeId::INVALID && y.ty != TypeId::INVALID {
                let (xs, ys) = (self.type_str(x.ty), self.type_str(y.ty));
                self.error(
                    ErrorKind::TypeMismatch,
                    be.span,
                    format!("Mismatched types in binary expression `{e}` : `{xs}` vs `{ys}`"),
                );
            }
            return Operand::invalid(Some(e));
        }

        let Some(result_ty) = self.check_binary_op(&x, op, be) else {
            return Operand::invalid(Some(e));
        };

        if matches!(op, BinaryOp::Div | BinaryOp::Mod) && y.is_constant() && y.value.is_zero() {
            self.error(ErrorKind::Constant, be.right.span(), "Division by zero not allowed");
            return Operand::invalid(Some(e));
        }

        if x.is_constant() && y.is_constant() {
            let ty = x.ty;
            if !self.registry.is_type_constant_type(ty) {
                let s = self.type_str(ty);
                self.error(
                    ErrorKind::Constant,
                    be.span,
                    format!("Invalid type, `{s}`, for constant binary expression `{e}`"),
                );
                return Operand::invalid(Some(e));
            }
            let integer = self.registry.is_type_integer(ty);
            let value = x.value.binary(value_op(op, integer), &y.value);
            if value.is_invalid() {
                self.error(ErrorKind::Constant, be.span, format!("Invalid constant expression `{e}`"));
                return Operand::invalid(Some(e));
            }
            let mut result = Operand::constant(ty, value, e);
            if self.registry.is_type_typed(ty) {
                let base = self.registry.base_type(ty);
                self.check_is_expressible(&mut result, base);
            }
            return result;
        }

        Operand::new(AddressingMode::Value, result_ty, e)
    }

    /// Check that `op` is defined for the operand type.
    ///
    /// # Returns
    ///
    /// The result type, which is `int` for the difference of two pointers.
    fn check_binary_op(&mut self, x: &Operand<'ast>, op: BinaryOp, be: &'ast BinaryExpr<'ast>) -> Option<TypeId> {
        let ty = self.registry.base_type(self.base_vector_type(x.ty));
        let sym = op.symbol();
        let message = match op {
            BinaryOp::Sub => {
                if self.registry.is_type_rawptr(ty) {
                    let s = self.type_str(x.ty);
                    Some(format!("Invalid pointer type for pointer arithmetic: `{s}`"))
                } else if self.registry.is_type_pointer(ty) {
                    return Some(TypeId::INT);
                } else if !self.registry.is_type_numeric(ty) {
                    Some(format!("Operator `{sym}` is only allowed with numeric or pointer expressions"))
                } else {
                    None
                }
            }
            BinaryOp::Add | BinaryOp::Mul | BinaryOp::Div if !self.registry.is_type_numeric(ty) => {
                Some(format!("Operator `{sym}` is only allowed with numeric expressions"))
            }
            BinaryOp::And | BinaryOp::Or
                if !self.registry.is_type_integer(ty) && !self.registry.is_type_boolean(ty) =>
            {
                Some(format!("Operator `{sym}` is only allowed with integers or booleans"))
            }
            BinaryOp::Mod | BinaryOp::Xor | BinaryOp::AndNot if !self.registry.is_type_integer(ty) => {
                Some(format!("Operator `{sym}` is only allowed with integers"))
            }
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr if !self.registry.is_type_boolean(ty) => {
                Some(format!("Operator `{sym}` is only allowed on boolean expressions"))
            }
            _ => None,
        };
        match message {
            Some(message) => {
                self.error(ErrorKind::TypeMismatch, be.span, message);
                None
            }
            None => Some(x.ty),
        }
    }

    // ========================================================================
    // Comparisons
    // ========================================================================

    fn check_comparison(&mut self, x: Operand<'ast>, y: Operand<'ast>, op: BinaryOp, e: Expr<'ast>) -> Operand<'ast> {
        let sym = op.symbol();
        let problem = if self.is_assignable_to(&x, y.ty) || self.is_assignable_to(&y, x.ty) {
            let x_any = self.registry.is_type_any(x.ty);
            let y_any = self.registry.is_type_any(y.ty);
            let (defined, err_ty) = if x_any != y_any {
                (false, if x_any { x.ty } else { y.ty })
            } else if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
                (self.registry.is_type_comparable(x.ty), x.ty)
            } else {
                (self.registry.is_type_ordered(x.ty), x.ty)
            };
            (!defined).then(|| {
                let s = self.type_str(err_ty);
                format!("operator `{sym}` not defined for type `{s}`")
            })
        } else {
            let (xs, ys) = (self.type_str(x.ty), self.type_str(y.ty));
            Some(format!("mismatched types `{xs}` and `{ys}`"))
        };
        if let Some(problem) = problem {
            self.error(ErrorKind::TypeMismatch, e.span(), format!("Cannot compare expression, {problem}"));
            return Operand::invalid(Some(e));
        }

        let ty = match self.registry.ty(self.registry.base_type(y.ty)).kind {
            TypeKind::Vector { count, .. } => self.registry.make_vector(TypeId::BOOL, count),
            _ => TypeId::UNTYPED_BOOL,
        };

        if x.is_constant() && y.is_constant() {
            let value = x.value.compare(compare_op(op), &y.value);
            return Operand::constant(ty, ExactValue::Bool(value), e);
        }

        if let Some(xe) = x.expr {
            let default = self.registry.default_type(x.ty);
            self.update_expr_type(xe, default, true);
        }
        if let Some(ye) = y.expr {
            let default = self.registry.default_type(y.ty);
            self.update_expr_type(ye, default, true);
        }
        Operand::new(AddressingMode::Value, ty, e)
    }

    // ========================================================================
    // Shifts
    // ========================================================================

    fn check_shift(
        &mut self,
        x: Operand<'ast>,
        mut y: Operand<'ast>,
        be: &'ast BinaryExpr<'ast>,
        e: Expr<'ast>,
    ) -> Operand<'ast> {
        let x_val = if x.is_constant() { x.value.to_integer() } else { ExactValue::Invalid };
        let x_untyped = self.registry.is_type_untyped(x.ty);
        let x_is_integer = self.registry.is_type_integer(x.ty);
        if !(x_is_integer || (x_untyped && matches!(x_val, ExactValue::Integer(_)))) {
            self.error(
                ErrorKind::TypeMismatch,
                be.left.span(),
                format!("Shifted operand `{}` must be an integer", be.left),
            );
            return Operand::invalid(Some(e));
        }

        if self.registry.is_type_untyped(y.ty) {
            self.convert_to_typed(&mut y, TypeId::UNTYPED_INTEGER);
            if y.is_invalid() {
                return Operand::invalid(Some(e));
            }
        } else if !self.registry.is_type_unsigned(y.ty) {
            self.error(
                ErrorKind::TypeMismatch,
                be.right.span(),
                format!("Shift amount `{}` must be an unsigned integer", be.right),
            );
            return Operand::invalid(Some(e));
        }

        let amount = if y.is_constant() { y.value.to_integer().as_integer() } else { None };
        if let Some(amount) = amount {
            if amount < 0 {
                self.error(
                    ErrorKind::Constant,
                    be.right.span(),
                    format!("Shift amount cannot be negative: `{}`", be.right),
                );
                return Operand::invalid(Some(e));
            }
        }

        if x.is_constant() {
            if y.is_constant() {
                let Some(amount) = amount else {
                    self.error(
                        ErrorKind::TypeMismatch,
                        be.right.span(),
                        format!("Shift amount `{}` must be an unsigned integer", be.right),
                    );
                    return Operand::invalid(Some(e));
                };
                if amount > MAX_SHIFT {
                    self.error(
                        ErrorKind::Constant,
                        be.right.span(),
                        format!("Shift amount too large: `{}`", be.right),
                    );
                    return Operand::invalid(Some(e));
                }
                // An untyped float with an integral value shifts as an integer
                let ty = if x_is_integer { x.ty } else { TypeId::UNTYPED_INTEGER };
                let op = if be.op == BinaryOp::Shl { BinaryValueOp::Shl } else { BinaryValueOp::Shr };
                let mut result = Operand::constant(ty, x_val.binary(op, &ExactValue::Integer(amount)), e);
                if self.registry.is_type_typed(ty) {
                    let base = self.registry.base_type(ty);
                    self.check_is_expressible(&mut result, base);
                }
                return result;
            }

            if x_untyped {
                // The operand takes its type from wherever the shift ends up
                if let Some(info) = self.info.untyped.get_mut(&be.left.id()) {
                    info.is_lhs = true;
                }
                return Operand::new(AddressingMode::Value, x.ty, e);
            }
        }

        Operand::new(AddressingMode::Value, x.ty, e)
    }

    // ========================================================================
    // Pointer arithmetic
    // ========================================================================

    /// `ptr + int`, `int + ptr` and `ptr - int`.
    ///
    /// # Returns
    ///
    /// `None` when neither operand combination applies.
    fn check_pointer_arithmetic(
        &mut self,
        x: &Operand<'ast>,
        y: &Operand<'ast>,
        be: &'ast BinaryExpr<'ast>,
        e: Expr<'ast>,
    ) -> Option<Operand<'ast>> {
        let x_ptr = self.registry.is_type_pointer(x.ty);
        let y_ptr = self.registry.is_type_pointer(y.ty);
        let x_int = self.registry.is_type_integer(x.ty);
        let y_int = self.registry.is_type_integer(y.ty);

        if x_ptr && y_int {
            return Some(self.check_ptr_addition(be.op, x.clone(), y.clone(), e));
        }
        if x_int && y_ptr {
            if be.op == BinaryOp::Sub {
                self.error(
                    ErrorKind::TypeMismatch,
                    be.span,
                    format!(
                        "Invalid pointer arithmetic, did you mean `{} {} {}`?",
                        be.right,
                        be.op.symbol(),
                        be.left
                    ),
                );
                return Some(Operand::invalid(Some(e)));
            }
            return Some(self.check_ptr_addition(be.op, y.clone(), x.clone(), e));
        }
        None
    }

    fn check_ptr_addition(
        &mut self,
        op: BinaryOp,
        ptr: Operand<'ast>,
        mut offset: Operand<'ast>,
        e: Expr<'ast>,
    ) -> Operand<'ast> {
        let elem = match self.registry.ty(self.registry.base_type(ptr.ty)).kind {
            TypeKind::Pointer(elem) => elem,
            _ => {
                let s = self.type_str(ptr.ty);
                self.error(
                    ErrorKind::TypeMismatch,
                    e.span(),
                    format!("Invalid pointer type for pointer arithmetic: `{s}`"),
                );
                return Operand::invalid(Some(e));
            }
        };
        let elem_size = self.size_of(elem);
        if elem_size <= 0 {
            let s = self.type_str(elem);
            self.error(
                ErrorKind::TypeMismatch,
                e.span(),
                format!("Size of pointer's element type `{s}` is zero and cannot be used for pointer arithmetic"),
            );
            return Operand::invalid(Some(e));
        }
        self.convert_to_typed(&mut offset, TypeId::INT);
        if offset.is_invalid() {
            return Operand::invalid(Some(e));
        }

        if ptr.is_constant() && offset.is_constant() {
            let (ExactValue::Pointer(base), Some(n)) = (ptr.value.clone(), offset.value.to_integer().as_integer())
            else {
                return Operand::new(AddressingMode::Value, ptr.ty, e);
            };
            let delta = elem_size.wrapping_mul(n);
            let value = if op == BinaryOp::Add {
                base.wrapping_add(delta)
            } else {
                base.wrapping_sub(delta)
            };
            return Operand::constant(ptr.ty, ExactValue::Pointer(value), e);
        }
        Operand::new(AddressingMode::Value, ptr.ty, e)
    }
}

fn value_op(op: BinaryOp, integer: bool) -> BinaryValueOp {
    match op {
        BinaryOp::Add => BinaryValueOp::Add,
        BinaryOp::Sub => BinaryValueOp::Sub,
        BinaryOp::Mul => BinaryValueOp::Mul,
        BinaryOp::Div if integer => BinaryValueOp::IntQuo,
        BinaryOp::Div => BinaryValueOp::Quo,
        BinaryOp::Mod => BinaryValueOp::Mod,
        BinaryOp::And => BinaryValueOp::And,
        BinaryOp::Or => BinaryValueOp::Or,
        BinaryOp::Xor => BinaryValueOp::Xor,
        BinaryOp::AndNot => BinaryValueOp::AndNot,
        BinaryOp::Shl => BinaryValueOp::Shl,
        BinaryOp::Shr => BinaryValueOp::Shr,
        BinaryOp::LogicalAnd => BinaryValueOp::CmpAnd,
        BinaryOp::LogicalOr => BinaryValueOp::CmpOr,
        // Comparisons fold through `compare_op`
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            BinaryValueOp::CmpAnd
        }
    }
}

fn compare_op(op: BinaryOp) -> CompareValueOp {
    match op {
        BinaryOp::NotEq => CompareValueOp::NotEq,
        BinaryOp::Lt => CompareValueOp::Lt,
        BinaryOp::LtEq => CompareValueOp::LtEq,
        BinaryOp::Gt => CompareValueOp::Gt,
        BinaryOp::GtEq => CompareValueOp::GtEq,
        _ => CompareValueOp::Eq,
    }
}
