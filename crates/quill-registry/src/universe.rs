//! The predeclared universe scope.

use log::debug;
use quill_core::{BasicKind, ExactValue, Span};

use crate::builtins::BuiltinProc;
use crate::entity::{Entity, EntityKind};
use crate::ids::{EntityId, TypeId};
use crate::registry::Registry;
use crate::types::{Record, RecordKind, TypeKind};

impl Registry {
    pub(crate) fn populate_universe(&mut self) {
        let universal = self.new_scope(None);
        self.universal = universal;
        self.scope_mut(universal).is_global = true;

        for kind in BasicKind::ALL {
            if kind == BasicKind::Invalid || kind.is_untyped() {
                continue;
            }
            self.add_universal(Entity::type_name(kind.name(), Span::default(), Some(TypeId::basic(kind))));
        }
        self.add_universal(Entity::type_name("byte", Span::default(), Some(TypeId::BYTE)));
        self.add_universal(Entity::type_name("rune", Span::default(), Some(TypeId::RUNE)));

        for (name, value) in [("true", true), ("false", false)] {
            self.add_universal(Entity::constant(
                name,
                Span::default(),
                Some(TypeId::UNTYPED_BOOL),
                ExactValue::Bool(value),
            ));
        }
        self.add_universal(Entity::new(
            EntityKind::Nil,
            "nil",
            Span::default(),
            Some(TypeId::UNTYPED_NIL),
        ));

        for &builtin in BuiltinProc::ALL {
            self.add_universal(Entity::new(
                EntityKind::Builtin(builtin),
                builtin.name(),
                Span::default(),
                Some(TypeId::INVALID),
            ));
        }

        self.type_info = self.add_universal_record(
            "Type_Info",
            &[("size", TypeId::INT), ("align", TypeId::INT)],
        );
        self.type_info_ptr = self.make_pointer(self.type_info);
        self.allocator = self.add_universal_record(
            "Allocator",
            &[("procedure", TypeId::RAWPTR), ("data", TypeId::RAWPTR)],
        );

        debug!(
            "universe populated with {} entities",
            self.scope(universal).len()
        );
    }

    fn add_universal(&mut self, entity: Entity) -> EntityId {
        let universal = self.universal;
        let id = self.add_entity(entity);
        // Universe names are unique
        let _ = self.insert_entity(universal, id);
        id
    }

    fn add_universal_record(&mut self, name: &str, fields: &[(&str, TypeId)]) -> TypeId {
        let mut record = Record::new(RecordKind::Struct);
        for (i, &(field_name, ty)) in fields.iter().enumerate() {
            let field = self.add_entity(Entity::field(field_name, Span::default(), ty, false, i));
            record.fields.push(field);
            record.fields_in_src_order.push(field);
        }
        let base = self.make_record(record);
        let named = self.make_named(name, base, None);
        let entity = self.add_universal(Entity::type_name(name, Span::default(), Some(named)));
        if let TypeKind::Named { type_name, .. } = &mut self.ty_mut(named).kind {
            *type_name = Some(entity);
        }
        named
    }

    /// Declare an untyped string constant in the universe, e.g. the target
    /// OS and architecture.
    pub fn add_global_string_constant(&mut self, name: &str, value: &str) -> EntityId {
        self.add_universal(Entity::constant(
            name,
            Span::default(),
            Some(TypeId::UNTYPED_STRING),
            ExactValue::string(value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TypeSizes;

    #[test]
    fn predeclared_names() {
        let reg = Registry::new(TypeSizes::default());
        let u = reg.universal();
        let int = reg.lookup(u, "int").unwrap();
        assert!(reg.entity(int).is_type_name());
        assert_eq!(reg.entity_type(int), TypeId::INT);

        let byte = reg.lookup(u, "byte").unwrap();
        assert_eq!(reg.entity_type(byte), TypeId::U8);
        assert!(reg.lookup(u, "untyped integer").is_none());

        let t = reg.lookup(u, "true").unwrap();
        assert_eq!(reg.entity(t).constant_value(), Some(&ExactValue::Bool(true)));

        let len = reg.lookup(u, "len").unwrap();
        assert_eq!(reg.entity(len).kind, EntityKind::Builtin(BuiltinProc::Len));
    }

    #[test]
    fn runtime_records() {
        let mut reg = Registry::new(TypeSizes::default());
        assert_eq!(reg.type_to_string(reg.type_info_type()), "Type_Info");
        assert_eq!(reg.type_to_string(reg.type_info_ptr_type()), "^Type_Info");
        let allocator = reg.allocator_type();
        assert_eq!(reg.size_of(allocator).unwrap(), 16);
    }

    #[test]
    fn global_string_constants() {
        let mut reg = Registry::new(TypeSizes::default());
        reg.add_global_string_constant("QUILL_OS", "linux");
        let os = reg.lookup(reg.universal(), "QUILL_OS").unwrap();
        assert_eq!(reg.entity(os).constant_value().and_then(|v| v.as_str()), Some("linux"));
    }
}
