//! `cast`, `transmute`, `down_cast` and `union_cast`.

use quill_ast::{CastExpr, CastKind, Expr};
use quill_core::ErrorKind;
use quill_registry::{EntityFlags, TypeId};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    pub(super) fn check_cast_expr(&mut self, ce: &'ast CastExpr<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        let target = self.check_type(ce.ty);
        let mut o = self.check_expr(ce.expr);
        if o.is_invalid() || target == TypeId::INVALID {
            return Operand::invalid(Some(e));
        }
        o.expr = Some(e);

        match ce.kind {
            CastKind::Cast => {
                self.check_conversion(&mut o, target);
                o
            }
            CastKind::Transmute => self.check_transmute(o, target, ce.span),
            CastKind::DownCast => self.check_down_cast(o, target, ce),
            CastKind::UnionCast => self.check_union_cast(o, target, ce),
        }
    }

    /// Reinterpret the bits of a value as another type of the same size.
    pub(crate) fn check_transmute(
        &mut self,
        o: Operand<'ast>,
        target: TypeId,
        span: quill_core::Span,
    ) -> Operand<'ast> {
        let e = o.expr_string();
        if o.is_constant() {
            self.error(ErrorKind::Constant, span, format!("Cannot transmute constant expression: `{e}`"));
            return Operand::invalid(o.expr);
        }
        if self.registry.is_type_untyped(o.ty) {
            self.error(ErrorKind::TypeMismatch, span, format!("Cannot transmute untyped expression: `{e}`"));
            return Operand::invalid(o.expr);
        }
        let src_size = self.size_of(o.ty);
        let dst_size = self.size_of(target);
        if src_size != dst_size {
            let t = self.type_str(target);
            self.error(
                ErrorKind::TypeMismatch,
                span,
                format!("Cannot transmute `{e}` to `{t}`, {src_size} vs {dst_size} bytes"),
            );
            return Operand::invalid(o.expr);
        }
        Operand {
            mode: AddressingMode::Value,
            ty: target,
            ..o
        }
    }

    /// `down_cast(^Outer) p` where `Outer` embeds `p`'s pointee with `using`.
    fn check_down_cast(&mut self, o: Operand<'ast>, target: TypeId, ce: &'ast CastExpr<'ast>) -> Operand<'ast> {
        let what = ce.kind.keyword();
        let e = ce.expr;
        let message = if o.is_constant() {
            Some(format!("Cannot `{what}` a constant expression: `{e}`"))
        } else if self.registry.is_type_untyped(o.ty) {
            Some(format!("Cannot `{what}` an untyped expression: `{e}`"))
        } else if !self.registry.is_type_pointer(o.ty) || !self.registry.is_type_pointer(target) {
            Some(format!("Can only `{what}` pointers: `{e}`"))
        } else {
            let src = self.registry.base_type(self.registry.type_deref(o.ty));
            let dst = self.registry.base_type(self.registry.type_deref(target));
            if !self.registry.is_type_struct(src) && !self.registry.is_type_raw_union(src) {
                Some(format!("Can only `{what}` pointer from structs or unions: `{e}`"))
            } else if !self.registry.is_type_struct(dst) && !self.registry.is_type_raw_union(dst) {
                Some(format!("Can only `{what}` pointer to structs or unions: `{e}`"))
            } else if !self.embeds_by_using(dst, self.registry.type_deref(o.ty), 0) {
                Some(format!("Illegal `{what}`: `{e}`"))
            } else {
                None
            }
        };
        if let Some(message) = message {
            self.error(ErrorKind::TypeMismatch, ce.span, message);
            return Operand::invalid(o.expr);
        }
        Operand {
            mode: AddressingMode::Value,
            ty: target,
            ..o
        }
    }

    /// Whether the record `outer` has an anonymous field of type `inner`,
    /// directly or nested.
    fn embeds_by_using(&self, outer: TypeId, inner: TypeId, depth: usize) -> bool {
        if depth > 32 {
            return false;
        }
        let Some(record) = self.registry.record(outer) else {
            return false;
        };
        record.fields.iter().any(|&f| {
            if !self.registry.entity(f).flags.contains(EntityFlags::ANONYMOUS) {
                return false;
            }
            let ft = self.registry.entity_type(f);
            if self.registry.are_types_identical(ft, inner) {
                return true;
            }
            let nested = self.registry.base_type(self.registry.type_deref(ft));
            self.embeds_by_using(nested, inner, depth + 1)
        })
    }

    /// `union_cast(T) u` yields the variant and whether `u` held it.
    fn check_union_cast(&mut self, o: Operand<'ast>, target: TypeId, ce: &'ast CastExpr<'ast>) -> Operand<'ast> {
        let what = ce.kind.keyword();
        let e = ce.expr;
        if o.is_constant() {
            self.error(ErrorKind::Constant, ce.span, format!("Cannot `{what}` a constant expression: `{e}`"));
            return Operand::invalid(o.expr);
        }
        if self.registry.is_type_untyped(o.ty) {
            self.error(ErrorKind::TypeMismatch, ce.span, format!("Cannot `{what}` an untyped expression: `{e}`"));
            return Operand::invalid(o.expr);
        }

        let src_is_ptr = self.registry.is_type_pointer(o.ty);
        let dst_is_ptr = self.registry.is_type_pointer(target);
        if src_is_ptr != dst_is_ptr {
            let (s, t) = (self.type_str(o.ty), self.type_str(target));
            self.error(
                ErrorKind::TypeMismatch,
                ce.span,
                format!("Invalid `{what}` types: `{s}` and `{t}`"),
            );
            return Operand::invalid(o.expr);
        }

        let src = self.registry.base_type(self.registry.type_deref(o.ty));
        if !self.registry.is_type_union(src) {
            self.error(ErrorKind::TypeMismatch, ce.span, format!("`{what}` can only operate on unions"));
            return Operand::invalid(o.expr);
        }

        let dst = self.registry.type_deref(target);
        let variants: Vec<_> = self
            .registry
            .record(src)
            .map(|r| r.fields.iter().skip(1).copied().collect())
            .unwrap_or_default();
        let found = variants
            .iter()
            .any(|&v| self.registry.are_types_identical(self.registry.entity_type(v), dst));
        if !found {
            let t = self.type_str(target);
            self.error(
                ErrorKind::TypeMismatch,
                ce.span,
                format!("Cannot `{what}` `{e}` to `{t}`"),
            );
            return Operand::invalid(o.expr);
        }

        let tuple = self.registry.make_tuple_of(&[target, TypeId::BOOL]);
        Operand {
            mode: AddressingMode::Value,
            ty: tuple,
            ..o
        }
    }
}
