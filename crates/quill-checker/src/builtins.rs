//! Calls to builtin procedures.
//!
//! Builtins are not ordinary procedures: several take a type as their first
//! argument, many fold to constants, and each has its own argument rules.
//! [`Checker::check_builtin_procedure`] checks the argument count from
//! [`BuiltinProc::info`] and then dispatches per builtin.

use log::trace;
use quill_ast::{CallExpr, Expr};
use quill_core::{CompareValueOp, ErrorKind, ExactValue, Span};
use quill_registry::{BuiltinProc, TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    /// Check `ce`, a call whose callee denotes the builtin `id`.
    pub(crate) fn check_builtin_procedure(
        &mut self,
        ce: &'ast CallExpr<'ast>,
        e: Expr<'ast>,
        id: BuiltinProc,
    ) -> Operand<'ast> {
        let info = id.info();
        let name = info.name;
        let got = ce.args.len();

        if ce.ellipsis.is_some() {
            self.error(
                ErrorKind::Arity,
                ce.close,
                format!("Invalid use of `..` with built-in procedure `{name}`"),
            );
            return Operand::invalid(Some(e));
        }
        let count_error = if got < info.arg_count {
            Some("Too few")
        } else if got > info.arg_count && !info.variadic {
            Some("Too many")
        } else {
            None
        };
        if let Some(what) = count_error {
            self.error(
                ErrorKind::Arity,
                ce.close,
                format!("{what} arguments for `{name}`, expected {}, got {got}", info.arg_count),
            );
            for &arg in ce.args {
                self.check_expr_base(arg, None);
            }
            return Operand::invalid(Some(e));
        }
        trace!("checking builtin `{name}` with {got} arguments");

        // The first argument of most builtins is an ordinary value
        let first = if id.takes_type_first() || id == BuiltinProc::OffsetOfVal {
            None
        } else {
            match ce.args.first() {
                Some(&arg) => {
                    let o = self.check_expr(arg);
                    if o.is_invalid() {
                        for &rest in &ce.args[1..] {
                            self.check_expr_base(rest, None);
                        }
                        return Operand::invalid(Some(e));
                    }
                    Some(o)
                }
                None => None,
            }
        };

        let result = match (id, first) {
            (BuiltinProc::New, _) => self.builtin_new(ce),
            (BuiltinProc::Make, _) => self.builtin_make(ce),
            (BuiltinProc::SizeOf | BuiltinProc::AlignOf, _) => self.builtin_size_of(ce, id),
            (BuiltinProc::OffsetOf, _) => self.builtin_offset_of(ce),
            (BuiltinProc::OffsetOfVal, _) => self.builtin_offset_of_val(ce),
            (BuiltinProc::TypeInfo, _) => self.builtin_type_info(ce),
            (BuiltinProc::Transmute, _) => self.builtin_transmute(ce),
            (_, Some(o)) => self.builtin_with_value(ce, id, o),
            (_, None) => None,
        };
        match result {
            Some(mut o) => {
                o.expr = Some(e);
                o
            }
            None => Operand::invalid(Some(e)),
        }
    }

    /// Builtins whose first argument was already evaluated as a value.
    fn builtin_with_value(
        &mut self,
        ce: &'ast CallExpr<'ast>,
        id: BuiltinProc,
        first: Operand<'ast>,
    ) -> Option<Operand<'ast>> {
        match id {
            BuiltinProc::Len | BuiltinProc::Cap => self.builtin_len(ce, id, first),
            BuiltinProc::Free => self.builtin_free(ce, first),
            BuiltinProc::Reserve => self.builtin_reserve(ce, first),
            BuiltinProc::Clear => self.builtin_clear(ce, first),
            BuiltinProc::Append => self.builtin_append(ce, first),
            BuiltinProc::Delete => self.builtin_delete(ce, first),
            BuiltinProc::SizeOfVal | BuiltinProc::AlignOfVal => self.builtin_size_of_val(id, first),
            BuiltinProc::TypeOfVal => self.builtin_type_of_val(ce, first),
            BuiltinProc::TypeInfoOfVal => self.builtin_type_info_of_val(ce, first),
            BuiltinProc::CompileAssert => self.builtin_compile_assert(ce, first),
            BuiltinProc::Assert => self.builtin_assert(ce, first),
            BuiltinProc::Panic => self.builtin_panic(ce, first),
            BuiltinProc::Copy => self.builtin_copy(ce, first),
            BuiltinProc::Swizzle => self.builtin_swizzle(ce, first),
            BuiltinProc::Min | BuiltinProc::Max => self.builtin_min_max(ce, id, first),
            BuiltinProc::Abs => self.builtin_abs(ce, first),
            BuiltinProc::Clamp => self.builtin_clamp(ce, first),
            BuiltinProc::New
            | BuiltinProc::Make
            | BuiltinProc::SizeOf
            | BuiltinProc::AlignOf
            | BuiltinProc::OffsetOf
            | BuiltinProc::OffsetOfVal
            | BuiltinProc::TypeInfo
            | BuiltinProc::Transmute => None,
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Evaluate `arg` as a type argument of builtin `name`.
    fn builtin_type_arg(&mut self, arg: Expr<'ast>, name: &str) -> Option<TypeId> {
        let o = self.check_expr_or_type(arg);
        if o.is_invalid() {
            return None;
        }
        if !o.is_type() || o.ty == TypeId::INVALID {
            self.error(ErrorKind::TypeMismatch, arg.span(), format!("Expected a type for `{name}`"));
            return None;
        }
        Some(o.ty)
    }

    /// Evaluate the remaining arguments purely for their side tables.
    fn check_rest(&mut self, ce: &'ast CallExpr<'ast>, from: usize) {
        for &arg in ce.args.iter().skip(from) {
            self.check_expr_base(arg, None);
        }
    }

    fn arg(&self, ce: &'ast CallExpr<'ast>, index: usize) -> Expr<'ast> {
        ce.args[index]
    }

    fn builtin_value(ty: TypeId) -> Operand<'ast> {
        Operand {
            mode: AddressingMode::Value,
            ty,
            value: ExactValue::Invalid,
            expr: None,
        }
    }

    fn builtin_no_value() -> Operand<'ast> {
        Operand {
            mode: AddressingMode::NoValue,
            ty: TypeId::INVALID,
            value: ExactValue::Invalid,
            expr: None,
        }
    }

    fn builtin_constant(ty: TypeId, value: ExactValue) -> Operand<'ast> {
        Operand {
            mode: AddressingMode::Constant,
            ty,
            value,
            expr: None,
        }
    }

    /// Pointer to a dynamic array, as `append` and `reserve` require.
    fn expect_dynamic_array_ptr(&mut self, o: &Operand<'ast>, span: Span) -> Option<TypeId> {
        if self.registry.is_type_pointer(o.ty) {
            let elem = self.registry.base_type(self.registry.type_deref(o.ty));
            if let TypeKind::DynamicArray(elem) = self.registry.ty(elem).kind {
                return Some(elem);
            }
        }
        let t = self.type_str(o.ty);
        self.error(
            ErrorKind::TypeMismatch,
            span,
            format!("Expected a pointer to a dynamic array, got `{t}`"),
        );
        None
    }

    fn slice_elem(&self, ty: TypeId) -> Option<TypeId> {
        match self.registry.ty(self.registry.base_type(ty)).kind {
            TypeKind::Slice(elem) => Some(elem),
            _ => None,
        }
    }

    /// Check an integer size argument such as a length or capacity.
    fn check_size_arg(&mut self, arg: Expr<'ast>, what: &str) -> Option<Operand<'ast>> {
        let mut o = self.check_expr(arg);
        if o.is_invalid() {
            return None;
        }
        self.convert_to_typed(&mut o, TypeId::INT);
        if o.is_invalid() {
            return None;
        }
        if !self.registry.is_type_integer(self.registry.base_enum_type(o.ty)) {
            self.error(ErrorKind::TypeMismatch, arg.span(), format!("{what} must be an integer"));
            return None;
        }
        Some(o)
    }

    // ========================================================================
    // Type-first builtins
    // ========================================================================

    fn builtin_new(&mut self, ce: &'ast CallExpr<'ast>) -> Option<Operand<'ast>> {
        let ty = self.builtin_type_arg(self.arg(ce, 0), "new")?;
        let ptr = self.registry.make_pointer(ty);
        Some(Self::builtin_value(ptr))
    }

    /// `make([]T, len, cap)`, `make([dynamic]T, len, cap)`, `make(map[K]V, cap)`
    fn builtin_make(&mut self, ce: &'ast CallExpr<'ast>) -> Option<Operand<'ast>> {
        let Some(ty) = self.builtin_type_arg(self.arg(ce, 0), "make") else {
            self.check_rest(ce, 1);
            return None;
        };
        let base = self.registry.base_type(ty);
        let (min, max) = if self.registry.is_type_slice(base) {
            (2, 3)
        } else if self.registry.is_type_dynamic_array(base) {
            (1, 3)
        } else if self.registry.is_type_map(base) {
            (1, 2)
        } else {
            let t = self.type_str(ty);
            self.error(
                ErrorKind::TypeMismatch,
                self.arg(ce, 0).span(),
                format!("Expected a slice, dynamic array or map for `make`, got `{t}`"),
            );
            self.check_rest(ce, 1);
            return None;
        };

        let got = ce.args.len();
        if got < min || got > max {
            self.error(
                ErrorKind::Arity,
                ce.close,
                format!("`make` expects between {min} and {max} arguments, got {got}"),
            );
            self.check_rest(ce, 1);
            return None;
        }

        let mut sizes = Vec::new();
        for &arg in &ce.args[1..] {
            let o = self.check_size_arg(arg, "`make` sizes")?;
            sizes.push(o);
        }
        if let [count, capacity] = sizes.as_slice() {
            if count.is_constant() && capacity.is_constant() {
                let (c, cap) = (
                    count.value.to_integer().as_integer().unwrap_or(0),
                    capacity.value.to_integer().as_integer().unwrap_or(0),
                );
                if c > cap {
                    self.error(ErrorKind::Constant, ce.span, "`make` count and capacity are swapped");
                    return None;
                }
            }
        }
        Some(Self::builtin_value(ty))
    }

    fn builtin_size_of(&mut self, ce: &'ast CallExpr<'ast>, id: BuiltinProc) -> Option<Operand<'ast>> {
        let ty = self.builtin_type_arg(self.arg(ce, 0), id.name())?;
        let n = if id == BuiltinProc::SizeOf {
            self.size_of(ty)
        } else {
            self.align_of(ty)
        };
        Some(Self::builtin_constant(TypeId::UNTYPED_INTEGER, ExactValue::Integer(n)))
    }

    /// `offset_of(T, field)`
    fn builtin_offset_of(&mut self, ce: &'ast CallExpr<'ast>) -> Option<Operand<'ast>> {
        let ty = self.builtin_type_arg(self.arg(ce, 0), "offset_of")?;
        let field_arg = self.arg(ce, 1);
        let Some(field) = field_arg.unparen().as_ident() else {
            self.error(
                ErrorKind::SyntaxShape,
                field_arg.span(),
                "Expected an identifier for field argument",
            );
            return None;
        };
        let offset = self.field_offset(ty, field.name, field_arg.span(), "offset_of")?;
        Some(Self::builtin_constant(TypeId::UNTYPED_INTEGER, ExactValue::Integer(offset)))
    }

    /// `offset_of_val(x.field)`
    fn builtin_offset_of_val(&mut self, ce: &'ast CallExpr<'ast>) -> Option<Operand<'ast>> {
        let arg = self.arg(ce, 0);
        let Expr::Selector(s) = arg.unparen() else {
            self.error(
                ErrorKind::SyntaxShape,
                arg.span(),
                format!("`{arg}` is not a selector expression"),
            );
            return None;
        };
        let base = self.check_expr(s.base);
        if base.is_invalid() {
            return None;
        }
        let ty = self.registry.type_deref(base.ty);
        let offset = self.field_offset(ty, s.field.name, arg.span(), "offset_of_val")?;
        Some(Self::builtin_constant(TypeId::UNTYPED_INTEGER, ExactValue::Integer(offset)))
    }

    /// Byte offset of `field` in the struct `ty`.
    fn field_offset(&mut self, ty: TypeId, field: &str, span: Span, name: &str) -> Option<i64> {
        let base = self.registry.base_type(ty);
        if self.registry.is_type_array(base) || self.registry.is_type_vector(base) {
            self.error(ErrorKind::TypeMismatch, span, format!("Invalid type for `{name}`"));
            return None;
        }
        let selection = self.registry.lookup_field(ty, field, false);
        if !selection.found() {
            let t = self.type_str(ty);
            self.error(ErrorKind::Name, span, format!("`{t}` has no field named `{field}`"));
            return None;
        }
        if selection.indirect {
            let t = self.type_str(ty);
            self.error(
                ErrorKind::TypeMismatch,
                span,
                format!("Field `{field}` is embedded via a pointer in `{t}`"),
            );
            return None;
        }
        match self.registry.offset_of_selection(ty, &selection) {
            Ok(offset) => Some(offset),
            Err(err) => {
                self.report(err);
                None
            }
        }
    }

    fn builtin_type_info(&mut self, ce: &'ast CallExpr<'ast>) -> Option<Operand<'ast>> {
        let arg = self.arg(ce, 0);
        let o = self.check_expr_or_type(arg);
        if o.is_invalid() {
            return None;
        }
        if !o.is_type() {
            self.error(ErrorKind::TypeMismatch, arg.span(), "Invalid argument to `type_info`");
            return None;
        }
        self.add_type_info(o.ty);
        Some(Self::builtin_value(self.registry.type_info_ptr_type()))
    }

    /// `transmute(T, x)`
    fn builtin_transmute(&mut self, ce: &'ast CallExpr<'ast>) -> Option<Operand<'ast>> {
        let Some(ty) = self.builtin_type_arg(self.arg(ce, 0), "transmute") else {
            self.check_rest(ce, 1);
            return None;
        };
        let o = self.check_expr(self.arg(ce, 1));
        if o.is_invalid() {
            return None;
        }
        let o = self.check_transmute(o, ty, ce.span);
        (!o.is_invalid()).then_some(o)
    }

    // ========================================================================
    // Containers
    // ========================================================================

    fn builtin_len(&mut self, ce: &'ast CallExpr<'ast>, id: BuiltinProc, o: Operand<'ast>) -> Option<Operand<'ast>> {
        let mut ty = self.registry.base_type(o.ty);
        if self.registry.is_type_pointer(ty) {
            let elem = self.registry.base_type(self.registry.type_deref(ty));
            if self.registry.is_type_array(elem) {
                ty = elem;
            }
        }

        let kind = self.registry.ty(ty).kind.clone();
        let result = match kind {
            _ if self.registry.is_type_string(ty) && id == BuiltinProc::Len => {
                match o.value.as_str() {
                    Some(s) if o.is_constant() => {
                        Self::builtin_constant(TypeId::UNTYPED_INTEGER, ExactValue::Integer(s.len() as i64))
                    }
                    _ => Self::builtin_value(TypeId::INT),
                }
            }
            TypeKind::Array { count, .. } | TypeKind::Vector { count, .. } => {
                Self::builtin_constant(TypeId::UNTYPED_INTEGER, ExactValue::Integer(count))
            }
            TypeKind::Slice(_) | TypeKind::DynamicArray(_) | TypeKind::Map { .. } => {
                Self::builtin_value(TypeId::INT)
            }
            _ => {
                let t = self.type_str(o.ty);
                self.error(
                    ErrorKind::TypeMismatch,
                    self.arg(ce, 0).span(),
                    format!("`{}` is not supported for `{t}`", id.name()),
                );
                return None;
            }
        };
        Some(result)
    }

    fn builtin_free(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        let ty = o.ty;
        let ok = self.registry.is_type_pointer(ty)
            || self.registry.is_type_slice(ty)
            || self.registry.is_type_string(ty)
            || self.registry.is_type_dynamic_array(ty)
            || self.registry.is_type_map(ty);
        if !ok {
            let t = self.type_str(ty);
            self.error(
                ErrorKind::TypeMismatch,
                self.arg(ce, 0).span(),
                format!("Invalid type for `free`, got `{t}`"),
            );
            return None;
        }
        Some(Self::builtin_no_value())
    }

    /// `reserve(&array, capacity)`
    fn builtin_reserve(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        if self.expect_dynamic_array_ptr(&o, self.arg(ce, 0).span()).is_none() {
            self.check_rest(ce, 1);
            return None;
        }
        self.check_size_arg(self.arg(ce, 1), "`reserve` capacities")?;
        Some(Self::builtin_no_value())
    }

    fn builtin_clear(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        let target = if self.registry.is_type_pointer(o.ty) {
            self.registry.type_deref(o.ty)
        } else {
            TypeId::INVALID
        };
        let ok = self.registry.is_type_dynamic_array(target) || self.registry.is_type_map(target);
        if !ok {
            let t = self.type_str(o.ty);
            self.error(
                ErrorKind::TypeMismatch,
                self.arg(ce, 0).span(),
                format!("Invalid type for `clear`, got `{t}`"),
            );
            return None;
        }
        Some(Self::builtin_no_value())
    }

    /// `append(&array, values..)` gives the new length.
    fn builtin_append(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        let Some(elem) = self.expect_dynamic_array_ptr(&o, self.arg(ce, 0).span()) else {
            self.check_rest(ce, 1);
            return None;
        };
        let mut ok = true;
        for &arg in &ce.args[1..] {
            let mut v = self.check_expr_with_type_hint(arg, Some(elem));
            self.check_assignment(&mut v, Some(elem), "argument of `append`");
            ok &= !v.is_invalid();
        }
        ok.then(|| Self::builtin_value(TypeId::INT))
    }

    /// `delete(map, key)`
    fn builtin_delete(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        let map = if self.registry.is_type_pointer(o.ty) {
            self.registry.type_deref(o.ty)
        } else {
            o.ty
        };
        let kind = self.registry.ty(self.registry.base_type(map)).kind.clone();
        let key = match kind {
            TypeKind::Map { key, .. } => key,
            _ => {
                let t = self.type_str(o.ty);
                self.error(
                    ErrorKind::TypeMismatch,
                    self.arg(ce, 0).span(),
                    format!("Expected a map, got `{t}`"),
                );
                self.check_rest(ce, 1);
                return None;
            }
        };
        let mut k = self.check_expr_with_type_hint(self.arg(ce, 1), Some(key));
        self.check_assignment(&mut k, Some(key), "argument of `delete`");
        (!k.is_invalid()).then(Self::builtin_no_value)
    }

    /// `copy(dst, src)` gives the number of elements copied.
    fn builtin_copy(&mut self, ce: &'ast CallExpr<'ast>, dst: Operand<'ast>) -> Option<Operand<'ast>> {
        let src = self.check_expr(self.arg(ce, 1));
        if src.is_invalid() {
            return None;
        }
        let (Some(d), Some(s)) = (self.slice_elem(dst.ty), self.slice_elem(src.ty)) else {
            self.error(ErrorKind::TypeMismatch, ce.span, "`copy` only expects slices as arguments");
            return None;
        };
        if !self.registry.are_types_identical(d, s) {
            let (a, b) = (self.arg(ce, 0), self.arg(ce, 1));
            let (ds, ss) = (self.type_str(d), self.type_str(s));
            self.error(
                ErrorKind::TypeMismatch,
                ce.span,
                format!("Arguments to `copy`, {a}, {b}, have different elem types: {ds} vs {ss}"),
            );
            return None;
        }
        Some(Self::builtin_value(TypeId::INT))
    }

    // ========================================================================
    // Reflection
    // ========================================================================

    fn builtin_size_of_val(&mut self, id: BuiltinProc, mut o: Operand<'ast>) -> Option<Operand<'ast>> {
        let context = format!("argument of `{}`", id.name());
        self.check_assignment(&mut o, None, &context);
        if o.is_invalid() {
            return None;
        }
        let n = if id == BuiltinProc::SizeOfVal {
            self.size_of(o.ty)
        } else {
            self.align_of(o.ty)
        };
        Some(Self::builtin_constant(TypeId::UNTYPED_INTEGER, ExactValue::Integer(n)))
    }

    fn builtin_type_of_val(&mut self, ce: &'ast CallExpr<'ast>, mut o: Operand<'ast>) -> Option<Operand<'ast>> {
        self.check_assignment(&mut o, None, "argument of `type_of_val`");
        if o.is_invalid() || o.ty == TypeId::INVALID {
            self.error(
                ErrorKind::TypeMismatch,
                self.arg(ce, 0).span(),
                "Invalid argument to `type_of_val`",
            );
            return None;
        }
        Some(Operand {
            mode: AddressingMode::Type,
            ty: o.ty,
            value: ExactValue::Invalid,
            expr: None,
        })
    }

    fn builtin_type_info_of_val(&mut self, ce: &'ast CallExpr<'ast>, mut o: Operand<'ast>) -> Option<Operand<'ast>> {
        self.check_assignment(&mut o, None, "argument of `type_info_of_val`");
        if o.is_invalid() || o.ty == TypeId::INVALID {
            self.error(
                ErrorKind::TypeMismatch,
                self.arg(ce, 0).span(),
                "Invalid argument to `type_info_of_val`",
            );
            return None;
        }
        self.add_type_info(o.ty);
        Some(Self::builtin_value(self.registry.type_info_ptr_type()))
    }

    // ========================================================================
    // Assertions
    // ========================================================================

    fn builtin_compile_assert(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        let arg = self.arg(ce, 0);
        if !o.is_constant() || !self.registry.is_type_boolean(o.ty) {
            self.error(ErrorKind::Constant, arg.span(), format!("`{arg}` is not a constant boolean"));
            return None;
        }
        if o.value.as_bool() == Some(false) {
            self.error(ErrorKind::Constant, ce.span, format!("Compile time assertion: `{arg}`"));
        }
        Some(Self::builtin_constant(o.ty, o.value))
    }

    fn builtin_assert(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        if !self.registry.is_type_boolean(o.ty) {
            let arg = self.arg(ce, 0);
            self.error(ErrorKind::TypeMismatch, arg.span(), format!("`{arg}` is not a boolean"));
            return None;
        }
        Some(Self::builtin_no_value())
    }

    fn builtin_panic(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        if !self.registry.is_type_string(o.ty) {
            let arg = self.arg(ce, 0);
            self.error(ErrorKind::TypeMismatch, arg.span(), format!("`{arg}` is not a string"));
            return None;
        }
        Some(Self::builtin_no_value())
    }

    // ========================================================================
    // Vectors and arithmetic
    // ========================================================================

    /// `swizzle(v, 0, 2, ..)` builds a vector from selected lanes.
    fn builtin_swizzle(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        let kind = self.registry.ty(self.registry.base_type(o.ty)).kind.clone();
        let (elem, max) = match kind {
            TypeKind::Vector { elem, count } => (elem, count),
            _ => {
                let t = self.type_str(o.ty);
                self.error(
                    ErrorKind::TypeMismatch,
                    ce.span,
                    format!("You can only `swizzle` a vector, got `{t}`"),
                );
                self.check_rest(ce, 1);
                return None;
            }
        };

        let indices = &ce.args[1..];
        for &arg in indices {
            let mut op = self.check_expr(arg);
            if op.is_invalid() {
                return None;
            }
            self.convert_to_typed(&mut op, TypeId::INT);
            let is_int = self.registry.is_type_integer(op.ty);
            if op.is_invalid() || !is_int || !op.is_constant() {
                self.error(
                    ErrorKind::Constant,
                    arg.span(),
                    "Indices to `swizzle` must be constant integers",
                );
                return None;
            }
            let index = op.value.to_integer().as_integer().unwrap_or(0);
            if index < 0 {
                self.error(ErrorKind::Constant, arg.span(), "Negative `swizzle` index");
                return None;
            }
            if index >= max {
                self.error(ErrorKind::Constant, arg.span(), "`swizzle` index exceeds vector length");
                return None;
            }
        }

        let count = indices.len() as i64;
        if count > max {
            self.error(
                ErrorKind::Arity,
                ce.span,
                format!("Too many `swizzle` indices, {count} > {max}"),
            );
            return None;
        }
        let ty = self.registry.make_vector(elem, count);
        Some(Self::builtin_value(ty))
    }

    /// Whether `ty` is an ordered number or string, as `min` and friends need.
    fn is_min_max_operand(&self, ty: TypeId) -> bool {
        let base = self.registry.base_type(ty);
        self.registry.is_type_comparable(base)
            && (self.registry.is_type_numeric(base) || self.registry.is_type_string(base))
    }

    fn builtin_min_max(
        &mut self,
        ce: &'ast CallExpr<'ast>,
        id: BuiltinProc,
        mut a: Operand<'ast>,
    ) -> Option<Operand<'ast>> {
        let name = id.name();
        if !self.is_min_max_operand(a.ty) {
            let t = self.type_str(a.ty);
            self.error(
                ErrorKind::TypeMismatch,
                self.arg(ce, 0).span(),
                format!("Expected a comparable numeric or string type to `{name}`, got `{t}`"),
            );
            self.check_rest(ce, 1);
            return None;
        }
        let mut b = self.check_expr(self.arg(ce, 1));
        if b.is_invalid() {
            return None;
        }
        if !self.is_min_max_operand(b.ty) {
            let t = self.type_str(b.ty);
            self.error(
                ErrorKind::TypeMismatch,
                self.arg(ce, 1).span(),
                format!("Expected a comparable numeric or string type to `{name}`, got `{t}`"),
            );
            return None;
        }

        self.convert_to_typed(&mut a, b.ty);
        if a.is_invalid() {
            return None;
        }
        self.convert_to_typed(&mut b, a.ty);
        if b.is_invalid() {
            return None;
        }
        if !self.registry.are_types_identical(a.ty, b.ty) {
            let (x, y) = (self.type_str(a.ty), self.type_str(b.ty));
            self.error(
                ErrorKind::TypeMismatch,
                ce.span,
                format!("Mismatched types to `{name}`, `{x}` vs `{y}`"),
            );
            return None;
        }

        if a.is_constant() && b.is_constant() {
            let op = if id == BuiltinProc::Min { CompareValueOp::Lt } else { CompareValueOp::Gt };
            let value = if a.value.compare(op, &b.value) { a.value } else { b.value };
            return Some(Self::builtin_constant(a.ty, value));
        }
        Some(Self::builtin_value(a.ty))
    }

    fn builtin_abs(&mut self, ce: &'ast CallExpr<'ast>, o: Operand<'ast>) -> Option<Operand<'ast>> {
        if !self.registry.is_type_numeric(self.registry.base_type(o.ty)) {
            let t = self.type_str(o.ty);
            self.error(
                ErrorKind::TypeMismatch,
                self.arg(ce, 0).span(),
                format!("Expected a numeric type to `abs`, got `{t}`"),
            );
            return None;
        }
        if o.is_constant() {
            let value = match o.value {
                ExactValue::Integer(i) => i.checked_abs().map_or(ExactValue::Invalid, ExactValue::Integer),
                ExactValue::Float(f) => ExactValue::float(f.0.abs()),
                other => other,
            };
            return Some(Self::builtin_constant(o.ty, value));
        }
        Some(Self::builtin_value(o.ty))
    }

    /// `clamp(x, lo, hi)`
    fn builtin_clamp(&mut self, ce: &'ast CallExpr<'ast>, mut x: Operand<'ast>) -> Option<Operand<'ast>> {
        if !self.is_min_max_operand(x.ty) {
            let t = self.type_str(x.ty);
            self.error(
                ErrorKind::TypeMismatch,
                self.arg(ce, 0).span(),
                format!("Expected a comparable numeric or string type to `clamp`, got `{t}`"),
            );
            self.check_rest(ce, 1);
            return None;
        }
        let mut lo = self.check_expr(self.arg(ce, 1));
        let mut hi = self.check_expr(self.arg(ce, 2));
        if lo.is_invalid() || hi.is_invalid() {
            return None;
        }

        // Settle on the first typed operand, if any
        let target = [x.ty, lo.ty, hi.ty]
            .into_iter()
            .find(|&t| self.registry.is_type_typed(t))
            .unwrap_or(x.ty);
        for o in [&mut x, &mut lo, &mut hi] {
            self.convert_to_typed(o, target);
            if o.is_invalid() {
                return None;
            }
        }
        let same = self.registry.are_types_identical(x.ty, lo.ty) && self.registry.are_types_identical(x.ty, hi.ty);
        if !same {
            let (a, b, c) = (self.type_str(x.ty), self.type_str(lo.ty), self.type_str(hi.ty));
            self.error(
                ErrorKind::TypeMismatch,
                ce.span,
                format!("Mismatched types to `clamp`, `{a}`, `{b}`, `{c}`"),
            );
            return None;
        }

        if x.is_constant() && lo.is_constant() && hi.is_constant() {
            let value = if x.value.compare(CompareValueOp::Lt, &lo.value) {
                lo.value
            } else if x.value.compare(CompareValueOp::Gt, &hi.value) {
                hi.value
            } else {
                x.value
            };
            return Some(Self::builtin_constant(x.ty, value));
        }
        Some(Self::builtin_value(x.ty))
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;
    use quill_registry::Entity;

    use super::*;
    use crate::config::CheckerConfig;

    fn declare(c: &mut Checker<'_>, name: &str, ty: TypeId) {
        if c.current_scope() == c.registry().universal() {
            let parent = c.current_scope();
            let scope = c.registry_mut().new_scope(Some(parent));
            c.set_scope(scope);
        }
        let scope = c.current_scope();
        let v = c.registry_mut().add_entity(Entity::variable(name, Default::default(), Some(ty)));
        c.add_entity(scope, None, v);
    }

    fn call<'a>(c: &mut Checker<'a>, b: &AstBuilder<'a>, name: &str, args: &[Expr<'a>]) -> Operand<'a> {
        c.check_expr_base(b.call(b.ident(name), args), None)
    }

    #[test]
    fn argument_counts_are_checked() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let o = call(&mut c, &b, "size_of", &[]);
        assert!(o.is_invalid());
        assert!(c.diagnostics().contains("Too few arguments for `size_of`, expected 1, got 0"));
        call(&mut c, &b, "len", &[b.str("a"), b.str("b")]);
        assert!(c.diagnostics().contains("Too many arguments for `len`, expected 1, got 2"));
    }

    #[test]
    fn sizes_fold_to_untyped_constants() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let o = call(&mut c, &b, "size_of", &[b.ident("i64")]);
        assert_eq!(o.mode, AddressingMode::Constant);
        assert_eq!(o.ty, TypeId::UNTYPED_INTEGER);
        assert_eq!(o.value, ExactValue::Integer(8));

        let o = call(&mut c, &b, "align_of", &[b.ident("i16")]);
        assert_eq!(o.value, ExactValue::Integer(2));

        call(&mut c, &b, "size_of", &[b.int("3")]);
        assert!(c.diagnostics().contains("Expected a type for `size_of`"));
    }

    #[test]
    fn len_of_constants_and_containers() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let o = call(&mut c, &b, "len", &[b.str("hello")]);
        assert_eq!(o.value, ExactValue::Integer(5));

        let arr = c.check_type(b.array_type(b.int("4"), b.ident("f32")));
        declare(&mut c, "a", arr);
        let o = call(&mut c, &b, "len", &[b.ident("a")]);
        assert!(o.is_constant());
        assert_eq!(o.value, ExactValue::Integer(4));

        let dynamic = c.check_type(b.dynamic_array_type(b.ident("int")));
        declare(&mut c, "d", dynamic);
        let o = call(&mut c, &b, "cap", &[b.ident("d")]);
        assert_eq!((o.mode, o.ty), (AddressingMode::Value, TypeId::INT));

        call(&mut c, &b, "len", &[b.ident("true")]);
        assert!(c.diagnostics().contains("`len` is not supported for `bool`"));
    }

    #[test]
    fn new_and_make() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let o = call(&mut c, &b, "new", &[b.ident("int")]);
        assert_eq!(c.type_str(o.ty), "^int");

        let o = call(&mut c, &b, "make", &[b.slice_type(b.ident("u8")), b.int("16")]);
        assert_eq!(c.type_str(o.ty), "[]u8");

        call(&mut c, &b, "make", &[b.dynamic_array_type(b.ident("u8")), b.int("8"), b.int("4")]);
        assert!(c.diagnostics().contains("`make` count and capacity are swapped"));

        call(&mut c, &b, "make", &[b.ident("int"), b.int("1")]);
        assert!(c.diagnostics().contains("Expected a slice, dynamic array or map for `make`, got `int`"));
    }

    #[test]
    fn append_needs_a_dynamic_array_pointer() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let dynamic = c.check_type(b.dynamic_array_type(b.ident("f32")));
        declare(&mut c, "xs", dynamic);
        let addr = b.unary(quill_ast::UnaryOp::AddressOf, b.ident("xs"));
        let o = call(&mut c, &b, "append", &[addr, b.int("1"), b.float("2.5")]);
        assert_eq!(o.ty, TypeId::INT, "{}", c.diagnostics());

        call(&mut c, &b, "append", &[b.ident("xs"), b.int("1")]);
        assert!(c.diagnostics().contains("Expected a pointer to a dynamic array, got `[dynamic]f32`"));
    }

    #[test]
    fn offset_of_fields() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let s = c.check_type(b.struct_type(&[b.field(&["a"], b.ident("u8")), b.field(&["b"], b.ident("i64"))]));
        declare(&mut c, "s", s);
        let scope = c.current_scope();
        let named = c.registry_mut().make_named("S", s, None);
        let t = c.registry_mut().add_entity(Entity::type_name("S", Default::default(), Some(named)));
        c.add_entity(scope, None, t);

        // `b` is laid out first, being the most aligned
        let o = call(&mut c, &b, "offset_of", &[b.ident("S"), b.ident("a")]);
        assert_eq!(o.value, ExactValue::Integer(8));
        let o = call(&mut c, &b, "offset_of_val", &[b.selector(b.ident("s"), "b")]);
        assert_eq!(o.value, ExactValue::Integer(0));

        call(&mut c, &b, "offset_of", &[b.ident("S"), b.ident("zz")]);
        assert!(c.diagnostics().contains("`S` has no field named `zz`"));
        call(&mut c, &b, "offset_of_val", &[b.ident("s")]);
        assert!(c.diagnostics().contains("`s` is not a selector expression"));
    }

    #[test]
    fn compile_assert_folds() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        call(&mut c, &b, "compile_assert", &[b.ident("true")]);
        assert!(!c.diagnostics().has_errors());
        let cond = b.binary(b.int("1"), quill_ast::BinaryOp::Eq, b.int("2"));
        call(&mut c, &b, "compile_assert", &[cond]);
        assert!(c.diagnostics().contains("Compile time assertion: `1 == 2`"));

        declare(&mut c, "flag", TypeId::BOOL);
        call(&mut c, &b, "compile_assert", &[b.ident("flag")]);
        assert!(c.diagnostics().contains("`flag` is not a constant boolean"));
    }

    #[test]
    fn min_max_abs_clamp_fold_constants() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let o = call(&mut c, &b, "min", &[b.int("3"), b.int("7")]);
        assert_eq!(o.value, ExactValue::Integer(3));
        let o = call(&mut c, &b, "max", &[b.int("3"), b.float("7.5")]);
        assert_eq!(o.value, ExactValue::float(7.5));
        let o = call(&mut c, &b, "abs", &[b.unary(quill_ast::UnaryOp::Minus, b.int("4"))]);
        assert_eq!(o.value, ExactValue::Integer(4));
        let o = call(&mut c, &b, "clamp", &[b.int("12"), b.int("0"), b.int("10")]);
        assert_eq!(o.value, ExactValue::Integer(10));

        declare(&mut c, "x", TypeId::I32);
        declare(&mut c, "y", TypeId::F32);
        call(&mut c, &b, "min", &[b.ident("x"), b.ident("y")]);
        assert!(c.diagnostics().contains("Mismatched types to `min`, `i32` vs `f32`"));
        call(&mut c, &b, "abs", &[b.ident("true")]);
        assert!(c.diagnostics().contains("Expected a numeric type to `abs`, got `bool`"));
    }

    #[test]
    fn swizzle_builds_vectors() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let v = c.check_type(b.vector_type(b.int("4"), b.ident("f32")));
        declare(&mut c, "v", v);
        let o = call(&mut c, &b, "swizzle", &[b.ident("v"), b.int("0"), b.int("2")]);
        assert_eq!(c.type_str(o.ty), "[vector 2]f32");

        call(&mut c, &b, "swizzle", &[b.ident("v"), b.int("4")]);
        assert!(c.diagnostics().contains("`swizzle` index exceeds vector length"));
        declare(&mut c, "n", TypeId::INT);
        call(&mut c, &b, "swizzle", &[b.ident("n"), b.int("0")]);
        assert!(c.diagnostics().contains("You can only `swizzle` a vector, got `int`"));
    }

    #[test]
    fn statement_builtins_produce_no_value() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let o = call(&mut c, &b, "assert", &[b.ident("true")]);
        assert_eq!(o.mode, AddressingMode::NoValue);
        call(&mut c, &b, "panic", &[b.int("1")]);
        assert!(c.diagnostics().contains("`1` is not a string"));
    }
}
