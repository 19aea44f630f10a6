use quill_ast::{EnumType, TypeExpr};
use quill_core::{BinaryValueOp, CompareValueOp, ErrorKind, ExactValue};
use quill_registry::{Entity, EntityFlags, TypeId};
use rustc_hash::FxHashMap;

use crate::checker::Checker;

/// Constants every enumeration provides; fields may not use these names.
const RESERVED: [&str; 3] = ["count", "min_value", "max_value"];

impl<'ast> Checker<'ast> {
    /// Check an enumeration body.
    ///
    /// Each field takes the value of the previous field plus one, starting at
    /// zero, unless it has an explicit constant initializer. The constants
    /// have the named enum type when the enum is declared with a name.
    pub(super) fn check_enum_type(
        &mut self,
        ty: TypeId,
        t: &'ast TypeExpr<'ast>,
        et: &EnumType<'ast>,
        named: Option<TypeId>,
    ) {
        let base = match et.base {
            Some(base) => self.check_type(base),
            None => TypeId::INT,
        };
        if base == TypeId::INVALID || !(self.registry.is_type_integer(base) || self.registry.is_type_float(base)) {
            let span = et.base.map(|b| b.span()).unwrap_or(t.span);
            self.error(ErrorKind::TypeMismatch, span, "Base type for enumeration must be numeric");
            return;
        }
        if let Some(record) = self.registry.record_mut(ty) {
            record.enum_base = Some(base);
        }

        let constant_type = named.unwrap_or(ty);
        let mut entity_map: FxHashMap<&'ast str, ()> = FxHashMap::default();
        let mut fields = Vec::with_capacity(et.fields.len());
        let mut iota = ExactValue::Integer(-1);
        let mut min_value = ExactValue::Integer(0);
        let mut max_value = ExactValue::Integer(0);
        let scope = self.context.scope;

        for field in et.fields {
            let mut explicit = None;
            if let Some(init) = field.value {
                let mut o = self.check_expr(init);
                if !o.is_invalid() && !o.is_constant() {
                    self.error(ErrorKind::Constant, init.span(), "Enumeration value must be a constant");
                    o.set_invalid();
                }
                if !o.is_invalid() {
                    self.check_assignment(&mut o, Some(constant_type), "enumeration");
                }
                if !o.is_invalid() {
                    explicit = Some(o.value);
                }
            }
            iota = explicit.unwrap_or_else(|| iota.binary(BinaryValueOp::Add, &ExactValue::Integer(1)));

            let name = field.name;
            if name.is_blank() {
                continue;
            }
            if RESERVED.contains(&name.name) {
                self.error(
                    ErrorKind::Name,
                    name.span,
                    format!("`{}` is a reserved identifier for enumerations", name.name),
                );
                continue;
            }

            if min_value.compare(CompareValueOp::Gt, &iota) {
                min_value = iota.clone();
            }
            if max_value.compare(CompareValueOp::Lt, &iota) {
                max_value = iota.clone();
            }

            let mut entity = Entity::constant(name.name, name.span, Some(constant_type), iota.clone());
            entity.flags |= EntityFlags::VISITED;
            let entity = self.registry.add_entity(entity);
            if entity_map.insert(name.name, ()).is_some() {
                self.error(
                    ErrorKind::Redeclaration,
                    name.span,
                    format!("`{}` is already declared in this enumeration", name.name),
                );
                continue;
            }
            self.add_entity(scope, Some(name), entity);
            self.add_entity_use(Some(field.id), entity);
            fields.push(entity);
        }

        let count = ExactValue::Integer(fields.len() as i64);
        let count = self
            .registry
            .add_entity(Entity::constant("count", t.span, Some(TypeId::INT), count));
        let min_value = self
            .registry
            .add_entity(Entity::constant("min_value", t.span, Some(constant_type), min_value));
        let max_value = self
            .registry
            .add_entity(Entity::constant("max_value", t.span, Some(constant_type), max_value));
        if let Some(record) = self.registry.record_mut(ty) {
            record.fields = fields.clone();
            record.fields_in_src_order = fields;
            record.enum_count = Some(count);
            record.enum_min_value = Some(min_value);
            record.enum_max_value = Some(max_value);
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;

    use super::*;
    use crate::config::CheckerConfig;

    fn values(c: &Checker<'_>, ty: TypeId) -> Vec<(String, ExactValue)> {
        let record = c.registry().record(ty).unwrap();
        record
            .fields
            .iter()
            .map(|&f| {
                let e = c.registry().entity(f);
                (e.name.clone(), e.constant_value().cloned().unwrap())
            })
            .collect()
    }

    #[test]
    fn implicit_values_count_up() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let et = b.enum_type(
            None,
            &[b.enum_field("Red", None), b.enum_field("Green", None), b.enum_field("Blue", None)],
        );
        let ty = c.check_type(et);
        let vals: Vec<i64> = values(&c, ty).into_iter().map(|(_, v)| v.as_integer().unwrap()).collect();
        assert_eq!(vals, [0, 1, 2]);
        let count = c.registry().record(ty).unwrap().enum_count.unwrap();
        assert_eq!(c.registry().entity(count).constant_value(), Some(&ExactValue::Integer(3)));
    }

    #[test]
    fn explicit_values_restart_the_sequence() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let et = b.enum_type(
            Some(b.ident("u8")),
            &[b.enum_field("A", Some(b.int("10"))), b.enum_field("B", None)],
        );
        let ty = c.check_type(et);
        let vals: Vec<i64> = values(&c, ty).into_iter().map(|(_, v)| v.as_integer().unwrap()).collect();
        assert_eq!(vals, [10, 11]);
        let max = c.registry().record(ty).unwrap().enum_max_value.unwrap();
        assert_eq!(c.registry().entity(max).constant_value(), Some(&ExactValue::Integer(11)));
    }

    #[test]
    fn enum_errors() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        c.check_type(b.enum_type(Some(b.ident("string")), &[b.enum_field("A", None)]));
        assert!(c.diagnostics().contains("Base type for enumeration must be numeric"));
        c.check_type(b.enum_type(None, &[b.enum_field("count", None)]));
        assert!(c.diagnostics().contains("`count` is a reserved identifier for enumerations"));
        c.check_type(b.enum_type(None, &[b.enum_field("A", None), b.enum_field("A", None)]));
        assert!(c.diagnostics().contains("`A` is already declared in this enumeration"));
    }
}
