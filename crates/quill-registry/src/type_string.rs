//! Rendering types the way they are written in source.

use std::fmt::Write;

use crate::entity::EntityFlags;
use crate::ids::TypeId;
use crate::registry::Registry;
use crate::types::{RecordKind, TypeKind};

impl Registry {
    /// Source-like rendering of `ty`, used in diagnostics.
    pub fn type_to_string(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    /// Like [`Registry::type_to_string`], with `<no type>` for `None`.
    pub fn opt_type_to_string(&self, ty: Option<TypeId>) -> String {
        match ty {
            Some(ty) => self.type_to_string(ty),
            None => "<no type>".to_string(),
        }
    }

    fn write_type(&self, out: &mut String, ty: TypeId) {
        match &self.ty(ty).kind {
            TypeKind::Basic(kind) => out.push_str(kind.name()),
            TypeKind::Pointer(elem) => {
                out.push('^');
                self.write_type(out, *elem);
            }
            TypeKind::Array { elem, count } => {
                let _ = write!(out, "[{count}]");
                self.write_type(out, *elem);
            }
            TypeKind::Vector { elem, count } => {
                let _ = write!(out, "[vector {count}]");
                self.write_type(out, *elem);
            }
            TypeKind::Slice(elem) => {
                out.push_str("[]");
                self.write_type(out, *elem);
            }
            TypeKind::DynamicArray(elem) => {
                out.push_str("[dynamic]");
                self.write_type(out, *elem);
            }
            TypeKind::Map { key, value, count } => {
                out.push_str("map[");
                if *count > 0 {
                    let _ = write!(out, "{count}, ");
                }
                self.write_type(out, *key);
                out.push(']');
                self.write_type(out, *value);
            }
            TypeKind::Record(record) => match record.kind {
                RecordKind::Struct => {
                    out.push_str("struct");
                    if record.is_packed {
                        out.push_str(" #packed");
                    }
                    if record.is_ordered {
                        out.push_str(" #ordered");
                    }
                    out.push_str(" {");
                    for (i, &field) in record.fields.iter().enumerate() {
                        if i > 0 {
                            out.push_str("; ");
                        }
                        let f = self.entity(field);
                        out.push_str(&f.name);
                        out.push_str(": ");
                        self.write_type(out, self.entity_type(field));
                    }
                    out.push('}');
                }
                RecordKind::Union => {
                    out.push_str("union{");
                    for (i, &variant) in record.fields.iter().skip(1).enumerate() {
                        if i > 0 {
                            out.push_str("; ");
                        }
                        out.push_str(&self.entity(variant).name);
                        out.push_str(": ");
                        let base = self.base_type(self.entity_type(variant));
                        self.write_type(out, base);
                    }
                    out.push('}');
                }
                RecordKind::RawUnion => {
                    out.push_str("raw_union{");
                    for (i, &field) in record.fields.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&self.entity(field).name);
                        out.push_str(": ");
                        self.write_type(out, self.entity_type(field));
                    }
                    out.push('}');
                }
                RecordKind::Enum => {
                    out.push_str("enum ");
                    self.write_type(out, record.enum_base.unwrap_or(TypeId::INT));
                }
            },
            TypeKind::Named { name, .. } => out.push_str(name),
            TypeKind::Tuple(vars) => {
                for (i, &var) in vars.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let var_ty = self.entity_type(var);
                    if self.entity(var).flags.contains(EntityFlags::ELLIPSIS) {
                        out.push_str("..");
                        match self.ty(self.base_type(var_ty)).kind {
                            TypeKind::Slice(elem) => self.write_type(out, elem),
                            _ => self.write_type(out, var_ty),
                        }
                    } else {
                        self.write_type(out, var_ty);
                    }
                }
            }
            TypeKind::Proc(sig) => {
                out.push_str("proc(");
                if let Some(params) = sig.params {
                    self.write_type(out, params);
                }
                out.push(')');
                if let Some(results) = sig.results {
                    out.push_str(" -> ");
                    self.write_type(out, results);
                }
                let tag = sig.convention.tag();
                if !tag.is_empty() {
                    out.push(' ');
                    out.push_str(tag);
                }
            }
        }
    }
}
