//! Type expressions.
//!
//! [`Checker::check_type`] turns an expression in type position into a
//! [`TypeId`]. Names and selectors resolve through the ordinary expression
//! checker and must denote a type; structural forms build new types in the
//! registry. Records, enums and procedure signatures have their own modules.

mod enums;
mod procs;
mod record;

use quill_ast::{ArrayCount, Expr, TypeExpr, TypeExprKind, UnaryOp};
use quill_core::{ErrorKind, ExactValue};
use quill_registry::{Record, RecordKind, TypeId};

use crate::checker::Checker;
use crate::operand::AddressingMode;

impl<'ast> Checker<'ast> {
    /// Resolve a type expression.
    ///
    /// Errors are reported and yield [`TypeId::INVALID`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_type(&mut self, e: Expr<'ast>) -> TypeId {
        self.check_type_named(e, None)
    }

    /// Resolve a type expression that defines the named type `named`.
    ///
    /// Records set the base of `named` before checking their fields so that
    /// fields may refer to the type being declared through a pointer.
    pub(crate) fn check_type_named(&mut self, e: Expr<'ast>, named: Option<TypeId>) -> TypeId {
        let ty = self.check_type_internal(e, named);
        if ty != TypeId::INVALID {
            self.info
                .add_type_and_value(e.id(), AddressingMode::Type, Some(ty), ExactValue::Invalid);
        }
        ty
    }

    fn check_type_internal(&mut self, e: Expr<'ast>, named: Option<TypeId>) -> TypeId {
        match e {
            Expr::Ident(_) | Expr::Selector(_) | Expr::Call(_) => {
                let o = self.check_expr_or_type(e);
                match o.mode {
                    AddressingMode::Invalid => TypeId::INVALID,
                    AddressingMode::Type => o.ty,
                    AddressingMode::NoValue => {
                        self.error(ErrorKind::TypeMismatch, e.span(), format!("`{e}` used as a type"));
                        TypeId::INVALID
                    }
                    _ => {
                        self.error(
                            ErrorKind::TypeMismatch,
                            e.span(),
                            format!("`{e}` used as a type when not a type"),
                        );
                        TypeId::INVALID
                    }
                }
            }
            Expr::Paren(p) => self.check_type_named(p.expr, named),
            Expr::Unary(u) if u.op == UnaryOp::AddressOf => {
                let elem = self.check_type(u.operand);
                self.registry.make_pointer(elem)
            }
            Expr::Type(t) => self.check_type_expr(t, named),
            _ => {
                self.error(ErrorKind::TypeMismatch, e.span(), format!("`{e}` is not a type"));
                TypeId::INVALID
            }
        }
    }

    pub(crate) fn check_type_expr(&mut self, t: &'ast TypeExpr<'ast>, named: Option<TypeId>) -> TypeId {
        match t.kind {
            TypeExprKind::Pointer(elem) => {
                let elem = self.check_type(elem);
                self.registry.make_pointer(elem)
            }
            TypeExprKind::Array(at) => {
                let elem = self.check_type(at.elem);
                match at.count {
                    ArrayCount::Expr(count) => match self.check_array_count(count) {
                        Some(count) => self.registry.make_array(elem, count),
                        None => TypeId::INVALID,
                    },
                    ArrayCount::Infer => {
                        self.error(
                            ErrorKind::SyntaxShape,
                            t.span,
                            "`..` can only be used in conjunction with compound literals",
                        );
                        TypeId::INVALID
                    }
                }
            }
            TypeExprKind::DynamicArray(elem) => {
                let elem = self.check_type(elem);
                self.registry.make_dynamic_array(elem)
            }
            TypeExprKind::Slice(elem) => {
                let elem = self.check_type(elem);
                self.registry.make_slice(elem)
            }
            TypeExprKind::Vector(vt) => {
                let elem = self.check_type(vt.elem);
                let Some(count) = self.check_array_count(vt.count) else {
                    return TypeId::INVALID;
                };
                let be = self.registry.base_type(elem);
                if elem != TypeId::INVALID
                    && (self.registry.is_type_vector(be)
                        || (!self.registry.is_type_boolean(be) && !self.registry.is_type_numeric(be)))
                {
                    let s = self.type_str(elem);
                    self.error(
                        ErrorKind::TypeMismatch,
                        vt.elem.span(),
                        format!("Vector element type must be numerical or a boolean, got `{s}`"),
                    );
                    return TypeId::INVALID;
                }
                self.registry.make_vector(elem, count)
            }
            TypeExprKind::Map(mt) => {
                let count = match mt.count {
                    Some(count) => self.check_map_count(count),
                    None => 0,
                };
                let key = self.check_type(mt.key);
                let value = self.check_type(mt.value);
                if key != TypeId::INVALID && !self.registry.is_type_valid_map_key(key) {
                    let message = if self.registry.is_type_boolean(key) {
                        "A boolean cannot be used as a key for a map".to_string()
                    } else {
                        format!("Invalid map key type `{}`", self.type_str(key))
                    };
                    self.error(ErrorKind::TypeMismatch, mt.key.span(), message);
                    return TypeId::INVALID;
                }
                let map = self.registry.make_map(key, value, count);
                self.add_type_info(map);
                map
            }
            TypeExprKind::Struct(rt) => self.check_record_type(t, RecordKind::Struct, named, |c, ty| {
                c.check_struct_type(ty, &rt)
            }),
            TypeExprKind::RawUnion(rt) => self.check_record_type(t, RecordKind::RawUnion, named, |c, ty| {
                c.check_raw_union_type(ty, &rt)
            }),
            TypeExprKind::Union(rt) => self.check_record_type(t, RecordKind::Union, named, |c, ty| {
                c.check_union_type(ty, t, &rt)
            }),
            TypeExprKind::Enum(et) => self.check_record_type(t, RecordKind::Enum, named, |c, ty| {
                c.check_enum_type(ty, t, &et, named)
            }),
            TypeExprKind::Proc(pt) => self.check_procedure_type(t, &pt),
        }
    }

    /// Create the record, bind it to `named`, and check its body in a scope
    /// of its own.
    fn check_record_type(
        &mut self,
        t: &'ast TypeExpr<'ast>,
        kind: RecordKind,
        named: Option<TypeId>,
        body: impl FnOnce(&mut Self, TypeId),
    ) -> TypeId {
        let mut record = Record::new(kind);
        record.node = Some(t.id);
        let ty = self.registry.make_record(record);
        if let Some(named) = named {
            self.registry.set_named_base(named, ty);
        }
        let saved = self.context.scope;
        let scope = self.open_scope(t.id);
        if let Some(record) = self.registry.record_mut(ty) {
            record.scope = Some(scope);
        }
        body(self, ty);
        self.context.scope = saved;
        ty
    }

    /// Evaluate the count of an array or vector type.
    ///
    /// # Returns
    ///
    /// `None` after reporting an error.
    fn check_array_count(&mut self, e: Expr<'ast>) -> Option<i64> {
        let mut o = self.check_expr(e);
        if o.is_invalid() {
            return None;
        }
        if !o.is_constant() {
            self.error(ErrorKind::Constant, e.span(), "Array count must be a constant");
            return None;
        }
        let bt = self.registry.base_type(o.ty);
        if self.registry.is_type_untyped(bt) || self.registry.is_type_integer(bt) {
            if let ExactValue::Integer(count) = o.value.to_integer() {
                if count < 0 {
                    self.error(ErrorKind::Constant, e.span(), "Invalid array count");
                    return None;
                }
                self.convert_to_typed(&mut o, TypeId::INT);
                return Some(count);
            }
        }
        self.error(ErrorKind::Constant, e.span(), "Array count must be an integer");
        None
    }

    fn check_map_count(&mut self, e: Expr<'ast>) -> i64 {
        let mut o = self.check_expr(e);
        if o.is_invalid() {
            return 0;
        }
        if !o.is_constant() {
            self.error(ErrorKind::Constant, e.span(), "Fixed map count must be a constant");
            return 0;
        }
        match o.value.to_integer() {
            ExactValue::Integer(count) if count > 0 => {
                self.convert_to_typed(&mut o, TypeId::INT);
                count
            }
            ExactValue::Integer(_) => {
                self.error(ErrorKind::Constant, e.span(), "Invalid fixed map count");
                0
            }
            _ => {
                self.error(ErrorKind::Constant, e.span(), "Fixed map count must be an integer");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;

    use super::*;
    use crate::config::CheckerConfig;

    #[test]
    fn structural_types_are_interned() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let a = c.check_type(b.array_type(b.int("4"), b.ident("int")));
        let again = c.check_type(b.array_type(b.int("4"), b.ident("int")));
        assert_eq!(a, again);
        assert_eq!(c.type_str(a), "[4]int");
        let p = c.check_type(b.unary(UnaryOp::AddressOf, b.ident("f32")));
        assert_eq!(c.type_str(p), "^f32");
    }

    #[test]
    fn array_count_errors() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let neg = b.unary(UnaryOp::Minus, b.int("1"));
        assert_eq!(c.check_type(b.array_type(neg, b.ident("int"))), TypeId::INVALID);
        assert!(c.diagnostics().contains("Invalid array count"));
        assert_eq!(c.check_type(b.array_type(b.float("1.5"), b.ident("int"))), TypeId::INVALID);
        assert!(c.diagnostics().contains("Array count must be an integer"));
        assert_eq!(c.check_type(b.inferred_array_type(b.ident("int"))), TypeId::INVALID);
    }

    #[test]
    fn values_are_not_types() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        assert_eq!(c.check_type(b.ident("true")), TypeId::INVALID);
        assert!(c.diagnostics().contains("`true` used as a type when not a type"));
        assert_eq!(c.check_type(b.int("3")), TypeId::INVALID);
        assert!(c.diagnostics().contains("`3` is not a type"));
    }

    #[test]
    fn vector_and_map_element_rules() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let v = c.check_type(b.vector_type(b.int("4"), b.ident("f32")));
        assert_eq!(c.type_str(v), "[vector 4]f32");
        c.check_type(b.vector_type(b.int("2"), b.ident("string")));
        assert!(c.diagnostics().contains("Vector element type must be numerical or a boolean, got `string`"));
        c.check_type(b.map_type(b.ident("bool"), b.ident("int")));
        assert!(c.diagnostics().contains("A boolean cannot be used as a key for a map"));
        let m = c.check_type(b.map_type(b.ident("string"), b.ident("int")));
        assert_eq!(c.type_str(m), "map[string]int");
    }
}
