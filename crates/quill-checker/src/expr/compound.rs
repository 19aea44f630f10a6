//! Compound literals: `T{a, b}` and `T{x = a, y = b}`.

use quill_ast::{ArrayCount, CompoundLit, Expr, TypeExprKind};
use quill_core::{ErrorKind, ExactValue};
use quill_registry::{TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

/// Fields a record-like literal may name, in positional order.
struct LiteralFields {
    types: Vec<TypeId>,
    /// Never a constant, whatever the elements are
    force_value: bool,
}

impl<'ast> Checker<'ast> {
    pub(super) fn check_compound_literal(
        &mut self,
        cl: &'ast CompoundLit<'ast>,
        e: Expr<'ast>,
        hint: Option<TypeId>,
    ) -> Operand<'ast> {
        let mut inferred_elem = None;
        let ty = match cl.ty {
            Some(Expr::Type(t)) if matches!(t.kind, TypeExprKind::Array(at) if at.count == ArrayCount::Infer) => {
                let TypeExprKind::Array(at) = t.kind else {
                    return Operand::invalid(Some(e));
                };
                let elem = self.check_type(at.elem);
                inferred_elem = Some(elem);
                Some(self.registry.make_array(elem, 0))
            }
            Some(ty) => Some(self.check_type(ty)),
            None => hint,
        };
        let Some(ty) = ty else {
            self.error(ErrorKind::TypeMismatch, cl.span, "Missing type in compound literal");
            return Operand::invalid(Some(e));
        };
        if ty == TypeId::INVALID {
            return Operand::invalid(Some(e));
        }

        let t = self.registry.base_type(ty);
        let kind = self.registry.ty(t).kind.clone();
        let is_constant = match kind {
            TypeKind::Record(_) if self.registry.is_type_struct(t) => {
                let fields = self.struct_literal_fields(t);
                self.check_record_literal(cl, ty, &fields, "structure literal")
            }
            TypeKind::Record(_) => {
                if !cl.elems.is_empty() {
                    self.error(ErrorKind::TypeMismatch, cl.span, "Illegal compound literal");
                }
                true
            }
            TypeKind::Basic(_) if self.registry.is_type_any(t) => {
                let fields = LiteralFields {
                    types: vec![self.registry.type_info_ptr_type(), TypeId::RAWPTR],
                    force_value: true,
                };
                self.check_record_literal(cl, ty, &fields, "`any` literal")
            }
            TypeKind::Basic(_) => {
                if !cl.elems.is_empty() {
                    self.error(ErrorKind::TypeMismatch, cl.span, "Illegal compound literal");
                }
                true
            }
            TypeKind::Array { elem, count } => {
                let max = if inferred_elem.is_some() { -1 } else { count };
                let (constant, n) = self.check_array_literal(cl, elem, max, "array literal");
                if let Some(elem) = inferred_elem {
                    let array = self.registry.make_array(elem, n);
                    if let Some(ty_expr) = cl.ty {
                        self.info
                            .add_type_and_value(ty_expr.id(), AddressingMode::Type, Some(array), ExactValue::Invalid);
                    }
                    return self.finish_compound(cl, e, array, constant);
                }
                constant
            }
            TypeKind::Vector { elem, count } => {
                let (constant, n) = self.check_array_literal(cl, elem, count, "vector literal");
                if count > 1 && (2..count).contains(&n) {
                    let span = cl.elems.first().map_or(cl.span, |x| x.span());
                    self.error(
                        ErrorKind::Arity,
                        span,
                        format!("Expected either 1 (broadcast) or {count} elements in vector literal, got {n}"),
                    );
                }
                constant
            }
            TypeKind::Slice(elem) => self.check_array_literal(cl, elem, -1, "slice literal").0,
            TypeKind::DynamicArray(elem) => self.check_array_literal(cl, elem, -1, "dynamic array literal").0,
            _ => {
                let s = self.type_str(ty);
                self.error(ErrorKind::TypeMismatch, cl.span, format!("Invalid compound literal type `{s}`"));
                return Operand::invalid(Some(e));
            }
        };

        self.finish_compound(cl, e, ty, is_constant)
    }

    fn finish_compound(&mut self, cl: &CompoundLit<'ast>, e: Expr<'ast>, ty: TypeId, is_constant: bool) -> Operand<'ast> {
        if is_constant {
            Operand::constant(ty, ExactValue::Compound(cl.id), e)
        } else {
            Operand::new(AddressingMode::Value, ty, e)
        }
    }

    fn struct_literal_fields(&self, t: TypeId) -> LiteralFields {
        let types = self
            .registry
            .record(t)
            .map(|r| {
                let order = if r.fields_in_src_order.is_empty() { &r.fields } else { &r.fields_in_src_order };
                order.iter().map(|&f| self.registry.entity_type(f)).collect()
            })
            .unwrap_or_default();
        LiteralFields {
            types,
            force_value: false,
        }
    }

    /// Elements of a struct or `any` literal, either all named or all
    /// positional.
    ///
    /// # Returns
    ///
    /// Whether every element is a constant.
    fn check_record_literal(
        &mut self,
        cl: &'ast CompoundLit<'ast>,
        ty: TypeId,
        fields: &LiteralFields,
        what: &str,
    ) -> bool {
        let Some(first) = cl.elems.first() else {
            return !fields.force_value;
        };
        let field_count = fields.types.len();
        let mut is_constant = !fields.force_value;

        if matches!(first, Expr::FieldValue(_)) {
            let mut visited = vec![false; field_count];
            for &elem in cl.elems {
                let Expr::FieldValue(fv) = elem else {
                    self.error(
                        ErrorKind::SyntaxShape,
                        elem.span(),
                        format!("Mixture of `field = value` and value elements in a {what} is not allowed"),
                    );
                    continue;
                };
                let Some(name) = fv.field.as_ident() else {
                    self.error(
                        ErrorKind::SyntaxShape,
                        elem.span(),
                        format!("Invalid field name `{}` in {what}", fv.field),
                    );
                    continue;
                };

                let sel = self.registry.lookup_field(ty, name.name, false);
                let Some(entity) = sel.entity else {
                    self.error(ErrorKind::Name, elem.span(), format!("Unknown field `{}` in {what}", name.name));
                    continue;
                };
                if sel.index.len() > 1 {
                    self.error(
                        ErrorKind::TypeMismatch,
                        elem.span(),
                        format!("Cannot assign to an anonymous field `{}` in a {what}", name.name),
                    );
                    continue;
                }
                let Some(&index) = sel.index.first() else {
                    continue;
                };
                self.add_entity_use(Some(name.id), entity);
                if visited.get(index).copied().unwrap_or(false) {
                    self.error(
                        ErrorKind::Redeclaration,
                        elem.span(),
                        format!("Duplicate field `{}` in {what}", name.name),
                    );
                    continue;
                }
                if let Some(slot) = visited.get_mut(index) {
                    *slot = true;
                }

                let field_ty = self.registry.entity_type(entity);
                let field_ty = if fields.force_value {
                    fields.types.get(index).copied().unwrap_or(field_ty)
                } else {
                    field_ty
                };
                is_constant &= self.check_literal_element(fv.value, field_ty, what);
            }
        } else {
            for (index, &elem) in cl.elems.iter().enumerate() {
                if matches!(elem, Expr::FieldValue(_)) {
                    self.error(
                        ErrorKind::SyntaxShape,
                        elem.span(),
                        format!("Mixture of `field = value` and value elements in a {what} is not allowed"),
                    );
                    continue;
                }
                let Some(&field_ty) = fields.types.get(index) else {
                    self.check_expr(elem);
                    self.error(
                        ErrorKind::Arity,
                        elem.span(),
                        format!("Too many values in {what}, expected {field_count}"),
                    );
                    break;
                };
                is_constant &= self.check_literal_element(elem, field_ty, what);
            }
            if cl.elems.len() < field_count {
                self.error(
                    ErrorKind::Arity,
                    cl.close,
                    format!(
                        "Too few values in {what}, expected {field_count}, got {}",
                        cl.elems.len()
                    ),
                );
            }
        }
        is_constant
    }

    /// One element stored into a slot of `slot_ty`; `true` when constant.
    fn check_literal_element(&mut self, value: Expr<'ast>, slot_ty: TypeId, what: &str) -> bool {
        let mut o = self.check_expr_with_type_hint(value, Some(slot_ty));
        let constant = o.is_constant() && !self.registry.is_type_any(self.registry.base_type(slot_ty));
        self.check_assignment(&mut o, Some(slot_ty), what);
        constant && !o.is_invalid()
    }

    /// Elements of an array-like literal.
    ///
    /// # Returns
    ///
    /// Whether every element is a constant, and the element count.
    fn check_array_literal(
        &mut self,
        cl: &'ast CompoundLit<'ast>,
        elem_ty: TypeId,
        max: i64,
        what: &str,
    ) -> (bool, i64) {
        let mut is_constant = !self.registry.is_type_any(self.registry.base_type(elem_ty));
        for (index, &elem) in cl.elems.iter().enumerate() {
            if matches!(elem, Expr::FieldValue(_)) {
                self.error(
                    ErrorKind::SyntaxShape,
                    elem.span(),
                    "`field = value` is only allowed in structure literals",
                );
                is_constant = false;
                continue;
            }
            let index = index as i64;
            if max >= 0 && index >= max {
                self.error(
                    ErrorKind::Constant,
                    elem.span(),
                    format!("Index {index} is out of bounds (>= {max}) for {what}"),
                );
            }
            is_constant &= self.check_literal_element(elem, elem_ty, what);
        }
        (is_constant, cl.elems.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;
    use quill_registry::Entity;

    use super::*;
    use crate::config::CheckerConfig;

    fn point<'a>(c: &mut Checker<'a>, b: &AstBuilder<'a>) -> TypeId {
        let parent = c.current_scope();
        let scope = c.registry_mut().new_scope(Some(parent));
        c.set_scope(scope);
        let st = c.check_type(b.struct_type(&[b.field(&["x", "y"], b.ident("f32"))]));
        let named = c.registry_mut().make_named("Point", st, None);
        let t = c.registry_mut().add_entity(Entity::type_name("Point", Default::default(), Some(named)));
        c.add_entity(scope, None, t);
        named
    }

    #[test]
    fn struct_literals() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let p = point(&mut c, &b);
        let o = c.check_expr(b.compound(Some(b.ident("Point")), &[b.int("1"), b.float("2.5")]));
        assert!(o.is_constant());
        assert_eq!(o.ty, p);

        let o = c.check_expr(b.compound(Some(b.ident("Point")), &[b.field_value("y", b.int("1"))]));
        assert!(!o.is_invalid());
        assert!(!c.diagnostics().has_errors(), "{}", c.diagnostics());
    }

    #[test]
    fn struct_literal_errors() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        point(&mut c, &b);
        c.check_expr(b.compound(Some(b.ident("Point")), &[b.int("1")]));
        assert!(c.diagnostics().contains("Too few values in structure literal, expected 2, got 1"));
        c.check_expr(b.compound(Some(b.ident("Point")), &[b.int("1"), b.int("2"), b.int("3")]));
        assert!(c.diagnostics().contains("Too many values in structure literal, expected 2"));
        c.check_expr(b.compound(
            Some(b.ident("Point")),
            &[b.field_value("x", b.int("1")), b.field_value("x", b.int("2"))],
        ));
        assert!(c.diagnostics().contains("Duplicate field `x` in structure literal"));
        c.check_expr(b.compound(Some(b.ident("Point")), &[b.field_value("z", b.int("1"))]));
        assert!(c.diagnostics().contains("Unknown field `z` in structure literal"));
        c.check_expr(b.compound(Some(b.ident("Point")), &[b.field_value("x", b.int("1")), b.int("2")]));
        assert!(c.diagnostics().contains("Mixture of `field = value` and value elements"));
    }

    #[test]
    fn inferred_array_length() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let lit = b.compound(Some(b.inferred_array_type(b.ident("int"))), &[b.int("1"), b.int("2"), b.int("3")]);
        let o = c.check_expr(lit);
        assert_eq!(c.type_str(o.ty), "[3]int");
    }

    #[test]
    fn array_bounds_and_vector_broadcast() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        c.check_expr(b.compound(Some(b.array_type(b.int("1"), b.ident("int"))), &[b.int("1"), b.int("2")]));
        assert!(c.diagnostics().contains("Index 1 is out of bounds (>= 1) for array literal"));

        let v4 = b.vector_type(b.int("4"), b.ident("f32"));
        let o = c.check_expr(b.compound(Some(v4), &[b.int("1")]));
        assert!(o.is_constant());
        c.check_expr(b.compound(Some(v4), &[b.int("1"), b.int("2")]));
        assert!(c.diagnostics().contains("Expected either 1 (broadcast) or 4 elements in vector literal, got 2"));
    }

    #[test]
    fn type_comes_from_context() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        c.check_expr(b.compound(None, &[b.int("1")]));
        assert!(c.diagnostics().contains("Missing type in compound literal"));
        let slice = c.registry_mut().make_slice(TypeId::INT);
        let o = c.check_expr_with_type_hint(b.compound(None, &[b.int("1")]), Some(slice));
        assert_eq!(o.ty, slice);
        c.check_expr(b.compound(Some(b.ident("int")), &[b.int("1")]));
        assert!(c.diagnostics().contains("Illegal compound literal"));
    }
}
