//! Struct, raw_union and union bodies.

use log::trace;
use quill_ast::{Expr, FieldDecl, RecordType, TypeExpr};
use quill_core::{ErrorKind, ExactValue};
use quill_registry::{Entity, EntityFlags, EntityId, EntityKind, TypeId, TypeKind};
use rustc_hash::FxHashMap;

use crate::checker::Checker;

/// Sort key of a field for the default struct layout.
#[derive(Debug, Clone, Copy)]
struct FieldLayoutKey {
    align: i64,
    size: i64,
    src_index: usize,
}

impl<'ast> Checker<'ast> {
    pub(super) fn check_struct_type(&mut self, ty: TypeId, rt: &RecordType<'ast>) {
        let fields = self.check_fields(rt.fields);
        if let Some(record) = self.registry.record_mut(ty) {
            record.is_packed = rt.is_packed;
            record.is_ordered = rt.is_ordered;
            record.fields = fields.clone();
            record.fields_in_src_order = fields.clone();
        }

        if !rt.is_packed && !rt.is_ordered {
            self.reorder_struct_fields(ty, fields);
        }

        if let Some(align) = rt.align {
            if rt.is_packed {
                self.error(ErrorKind::SyntaxShape, align.span(), "`#align` cannot be applied with `#packed`");
                return;
            }
            if let Some(custom_align) = self.check_custom_align(align) {
                if let Some(record) = self.registry.record_mut(ty) {
                    record.custom_align = custom_align;
                }
            }
        }
    }

    /// Order fields by alignment, then size, both descending, keeping
    /// declaration order among equals. Field indices follow the new order.
    fn reorder_struct_fields(&mut self, ty: TypeId, fields: Vec<EntityId>) {
        let mut keyed = Vec::with_capacity(fields.len());
        for (src_index, &f) in fields.iter().enumerate() {
            let field_ty = self.registry.entity_type(f);
            let align = self.registry.align_of(field_ty);
            let size = self.registry.size_of(field_ty);
            let (align, size) = match (align, size) {
                (Ok(align), Ok(size)) => (align, size),
                (Err(err), _) | (_, Err(err)) => {
                    self.report(err);
                    (0, 0)
                }
            };
            keyed.push((FieldLayoutKey { align, size, src_index }, f));
        }
        keyed.sort_by(|(x, _), (y, _)| {
            y.align
                .cmp(&x.align)
                .then(y.size.cmp(&x.size))
                .then(x.src_index.cmp(&y.src_index))
        });

        let reordered: Vec<EntityId> = keyed.into_iter().map(|(_, f)| f).collect();
        for (i, &f) in reordered.iter().enumerate() {
            if let EntityKind::Variable { field_index, .. } = &mut self.registry.entity_mut(f).kind {
                *field_index = i;
            }
        }
        trace!("struct {ty:?} reordered to {reordered:?}");
        if let Some(record) = self.registry.record_mut(ty) {
            record.fields = reordered;
            record.offsets = None;
        }
    }

    fn check_custom_align(&mut self, e: Expr<'ast>) -> Option<i64> {
        let o = self.check_expr(e);
        if o.is_invalid() {
            return None;
        }
        if !o.is_constant() {
            self.error(ErrorKind::Constant, e.span(), "#align must be a constant");
            return None;
        }
        let bt = self.registry.base_type(o.ty);
        if self.registry.is_type_untyped(bt) || self.registry.is_type_integer(bt) {
            if let ExactValue::Integer(align) = o.value {
                if align < 1 || (align & (align - 1)) != 0 {
                    self.error(
                        ErrorKind::Constant,
                        e.span(),
                        format!("#align must be a power of 2, got {align}"),
                    );
                    return None;
                }
                let max_align = self.config.max_align;
                let custom_align = align.clamp(1, max_align);
                if custom_align < align {
                    self.diagnostics.warning(
                        e.span(),
                        format!("Custom alignment has been clamped to {custom_align} from {align}"),
                    );
                }
                return Some(custom_align);
            }
        }
        self.error(ErrorKind::Constant, e.span(), "#align must be an integer");
        None
    }

    pub(super) fn check_raw_union_type(&mut self, ty: TypeId, rt: &RecordType<'ast>) {
        let fields = self.check_fields(rt.fields);
        if let Some(record) = self.registry.record_mut(ty) {
            record.fields = fields.clone();
            record.fields_in_src_order = fields;
        }
    }

    /// Check the field list of a struct or raw_union into the current scope.
    ///
    /// # Returns
    ///
    /// The field entities in declaration order, blank fields included.
    fn check_fields(&mut self, decls: &'ast [FieldDecl<'ast>]) -> Vec<EntityId> {
        let mut fields = Vec::new();
        let mut entity_map: FxHashMap<String, EntityId> = FxHashMap::default();
        let mut using_index_field: Option<EntityId> = None;

        for decl in decls {
            let ty = self.check_type(decl.ty);
            if decl.is_using && decl.names.len() > 1 {
                self.error(
                    ErrorKind::TypeMismatch,
                    decl.names[0].span,
                    "Cannot apply `using` to more than one of the same type",
                );
            }

            for &name in decl.names {
                let entity = self
                    .registry
                    .add_entity(Entity::field(name.name, name.span, ty, decl.is_using, fields.len()));
                if name.is_blank() {
                    self.add_entity_definition(name, Some(entity));
                    fields.push(entity);
                    continue;
                }
                if let Some(&prev) = entity_map.get(name.name) {
                    let at = self.diagnostics.location(self.registry.entity(prev).span);
                    self.error(
                        ErrorKind::Redeclaration,
                        name.span,
                        format!("`{}` is already declared in this type\n\tat {at}", name.name),
                    );
                } else {
                    entity_map.insert(name.name.to_string(), entity);
                    let scope = self.context.scope;
                    self.add_entity(scope, Some(name), entity);
                }
                fields.push(entity);
            }

            if !decl.is_using || decl.names.is_empty() {
                continue;
            }
            let first = decl.names[0];
            let target = self.registry.base_type(self.registry.type_deref(ty));
            if !self.registry.is_type_struct(target) && !self.registry.is_type_raw_union(target) {
                if self.registry.is_type_indexable(target) {
                    let field = fields[fields.len() - 1];
                    match using_index_field {
                        Some(_) => {
                            self.registry.entity_mut(field).flags.remove(EntityFlags::ANONYMOUS);
                            self.error(
                                ErrorKind::TypeMismatch,
                                first.span,
                                format!("Previous `using` for an index expression `{}`", first.name),
                            );
                        }
                        None => using_index_field = Some(field),
                    }
                } else if ty != TypeId::INVALID {
                    self.error(
                        ErrorKind::TypeMismatch,
                        first.span,
                        format!("`using` on a field `{}` must be a `struct` or `raw_union`", first.name),
                    );
                }
                continue;
            }
            self.populate_using_fields(ty, ty, &mut entity_map, 0);
        }
        fields
    }

    /// Add the fields promoted through a `using` field to `entity_map`,
    /// reporting names that are already taken.
    fn populate_using_fields(
        &mut self,
        using_ty: TypeId,
        ty: TypeId,
        entity_map: &mut FxHashMap<String, EntityId>,
        depth: usize,
    ) {
        if depth > 32 {
            return;
        }
        let base = self.registry.base_type(self.registry.type_deref(ty));
        let Some(record) = self.registry.record(base) else {
            return;
        };
        let promoted = record.fields.clone();
        for f in promoted {
            let e = self.registry.entity(f);
            let name = e.name.clone();
            if name == "_" {
                continue;
            }
            if let Some(&prev) = entity_map.get(&name) {
                let in_type = self.type_str(using_ty);
                let span = self.registry.entity(prev).span;
                self.error(
                    ErrorKind::Redeclaration,
                    span,
                    format!("`{name}` is already declared in `{in_type}`"),
                );
                continue;
            }
            entity_map.insert(name, f);
            if self.registry.entity(f).flags.contains(EntityFlags::ANONYMOUS) {
                let field_ty = self.registry.entity_type(f);
                self.populate_using_fields(using_ty, field_ty, entity_map, depth + 1);
            }
        }
    }

    /// A tagged union. Variant 0 is the implicit "no value" variant; every
    /// declared variant becomes a distinct named type.
    pub(super) fn check_union_type(&mut self, ty: TypeId, t: &'ast TypeExpr<'ast>, rt: &RecordType<'ast>) {
        let empty = self.registry.add_entity(Entity::type_name("", t.span, None));
        let mut variants = vec![empty];
        let mut entity_map: FxHashMap<&'ast str, EntityId> = FxHashMap::default();

        for decl in rt.fields {
            let body = self.check_type(decl.ty);
            for &name in decl.names {
                if name.is_blank() {
                    self.error(ErrorKind::Name, name.span, "`_` cannot be used a union subtype");
                    continue;
                }
                let base = self.registry.base_type(body);
                let variant_ty = self.registry.make_named(name.name, base, None);
                let entity = self
                    .registry
                    .add_entity(Entity::type_name(name.name, name.span, Some(variant_ty)));
                if let TypeKind::Named { type_name, .. } = &mut self.registry.ty_mut(variant_ty).kind {
                    *type_name = Some(entity);
                }
                if entity_map.contains_key(name.name) {
                    self.error(
                        ErrorKind::Redeclaration,
                        name.span,
                        format!("`{}` is already declared in this union", name.name),
                    );
                    continue;
                }
                entity_map.insert(name.name, entity);
                let scope = self.context.scope;
                self.add_entity(scope, Some(name), entity);
                self.add_entity_use(Some(name.id), entity);
                variants.push(entity);
            }
        }

        if let Some(record) = self.registry.record_mut(ty) {
            record.fields = variants.clone();
            record.fields_in_src_order = variants;
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;
    use quill_registry::RecordKind;

    use super::*;
    use crate::config::CheckerConfig;

    fn offsets(c: &mut Checker<'_>, ty: TypeId) -> Vec<(String, i64)> {
        let fields = c.registry().record(ty).unwrap().fields_in_src_order.clone();
        fields
            .into_iter()
            .map(|f| {
                let name = c.registry().entity(f).name.clone();
                let idx = c.registry().entity(f).field_index().unwrap();
                (name, c.registry_mut().offset_of(ty, idx).unwrap())
            })
            .collect()
    }

    #[test]
    fn default_layout_minimises_padding() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let st = b.struct_type(&[
            b.field(&["a"], b.ident("i64")),
            b.field(&["b"], b.ident("i8")),
            b.field(&["c"], b.ident("i64")),
        ]);
        let ty = c.check_type(st);
        let order: Vec<String> = c.registry().record(ty).unwrap().fields.iter().map(|&f| c.registry().entity(f).name.clone()).collect();
        assert_eq!(order, ["a", "c", "b"]);
        assert_eq!(
            offsets(&mut c, ty),
            [("a".to_string(), 0), ("b".to_string(), 16), ("c".to_string(), 8)]
        );
        assert_eq!(c.registry_mut().size_of(ty).unwrap(), 24);
    }

    #[test]
    fn packed_keeps_declaration_order() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let st = b.struct_type_with(
            &[b.field(&["a"], b.ident("i8")), b.field(&["b"], b.ident("i64"))],
            true,
            false,
            None,
        );
        let ty = c.check_type(st);
        let offs: Vec<i64> = offsets(&mut c, ty).into_iter().map(|(_, o)| o).collect();
        assert!(offs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn duplicate_and_using_errors() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        c.check_type(b.struct_type(&[b.field(&["x"], b.ident("int")), b.field(&["x"], b.ident("f32"))]));
        assert!(c.diagnostics().contains("`x` is already declared in this type"));
        c.check_type(b.struct_type(&[b.using_field("n", b.ident("int"))]));
        assert!(c.diagnostics().contains("`using` on a field `n` must be a `struct` or `raw_union`"));
    }

    #[test]
    fn custom_alignment() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let st = b.struct_type_with(&[b.field(&["a"], b.ident("i8"))], false, false, Some(b.int("3")));
        c.check_type(st);
        assert!(c.diagnostics().contains("#align must be a power of 2, got 3"));
        let st = b.struct_type_with(&[b.field(&["a"], b.ident("i8"))], false, false, Some(b.int("8")));
        let ty = c.check_type(st);
        assert_eq!(c.registry_mut().align_of(ty).unwrap(), 8);
    }

    #[test]
    fn union_variants_are_named() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let u = b.union_type(&[
            b.field(&["Circle"], b.struct_type(&[b.field(&["r"], b.ident("f32"))])),
            b.field(&["Square"], b.struct_type(&[b.field(&["side"], b.ident("f32"))])),
        ]);
        let ty = c.check_type(u);
        let record = c.registry().record(ty).unwrap();
        assert_eq!(record.kind, RecordKind::Union);
        assert_eq!(record.fields.len(), 3);
        let circle = record.fields[1];
        let circle_ty = c.registry().entity_type(circle);
        assert!(c.registry().is_type_named(circle_ty));
        assert_eq!(c.type_str(circle_ty), "Circle");
    }
}
