//! Type identity and default types.

use quill_core::BasicKind;

use crate::ids::TypeId;
use crate::registry::Registry;
use crate::types::{ProcOverloadKind, RecordKind, TypeKind};

impl Registry {
    /// Whether `x` and `y` denote the same type.
    ///
    /// Named types and enums are identical only to themselves. Everything else
    /// is compared structurally: records by kind, packing, ordering and field
    /// names and types; procedures by convention, variadicity, parameters and
    /// results.
    pub fn are_types_identical(&self, x: TypeId, y: TypeId) -> bool {
        if x == y {
            return true;
        }
        match (&self.ty(x).kind, &self.ty(y).kind) {
            (TypeKind::Basic(a), TypeKind::Basic(b)) => a == b,
            (TypeKind::Pointer(a), TypeKind::Pointer(b))
            | (TypeKind::Slice(a), TypeKind::Slice(b))
            | (TypeKind::DynamicArray(a), TypeKind::DynamicArray(b)) => {
                self.are_types_identical(*a, *b)
            }
            (
                TypeKind::Array { elem: a, count: n },
                TypeKind::Array { elem: b, count: m },
            )
            | (
                TypeKind::Vector { elem: a, count: n },
                TypeKind::Vector { elem: b, count: m },
            ) => n == m && self.are_types_identical(*a, *b),
            (TypeKind::Record(a), TypeKind::Record(b)) => {
                if a.kind != b.kind || a.kind == RecordKind::Enum {
                    return false;
                }
                if a.fields.len() != b.fields.len()
                    || a.is_packed != b.is_packed
                    || a.is_ordered != b.is_ordered
                {
                    return false;
                }
                a.fields.iter().zip(&b.fields).all(|(&fa, &fb)| {
                    let fa = self.entity(fa);
                    let fb = self.entity(fb);
                    fa.name == fb.name
                        && self.are_types_identical(
                            fa.ty.unwrap_or(TypeId::INVALID),
                            fb.ty.unwrap_or(TypeId::INVALID),
                        )
                })
            }
            (TypeKind::Tuple(a), TypeKind::Tuple(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(&va, &vb)| {
                        self.are_types_identical(self.entity_type(va), self.entity_type(vb))
                    })
            }
            (TypeKind::Proc(a), TypeKind::Proc(b)) => {
                a.convention == b.convention
                    && a.variadic == b.variadic
                    && self.are_optional_identical(a.params, b.params)
                    && self.are_optional_identical(a.results, b.results)
            }
            (
                TypeKind::Map {
                    key: ka,
                    value: va,
                    count: ca,
                },
                TypeKind::Map {
                    key: kb,
                    value: vb,
                    count: cb,
                },
            ) => ca == cb && self.are_types_identical(*ka, *kb) && self.are_types_identical(*va, *vb),
            _ => false,
        }
    }

    fn are_optional_identical(&self, x: Option<TypeId>, y: Option<TypeId>) -> bool {
        match (x, y) {
            (None, None) => true,
            (Some(a), Some(b)) => self.are_types_identical(a, b),
            (Some(t), None) | (None, Some(t)) => self.tuple_vars(t).is_empty(),
        }
    }

    /// Concrete type an untyped value defaults to when nothing else decides.
    pub fn default_type(&self, ty: TypeId) -> TypeId {
        match self.ty(ty).kind {
            TypeKind::Basic(BasicKind::UntypedBool) => TypeId::BOOL,
            TypeKind::Basic(BasicKind::UntypedInteger) => TypeId::INT,
            TypeKind::Basic(BasicKind::UntypedFloat) => TypeId::F64,
            TypeKind::Basic(BasicKind::UntypedString) => TypeId::STRING,
            TypeKind::Basic(BasicKind::UntypedRune) => TypeId::RUNE,
            _ => ty,
        }
    }

    /// Classify how two procedure types differ, for overload validation.
    ///
    /// Checks are ordered: the first difference found is reported.
    pub fn are_proc_types_overload_safe(&self, x: TypeId, y: TypeId) -> ProcOverloadKind {
        let (Some(px), Some(py)) = (
            self.proc_sig(self.base_type(x)),
            self.proc_sig(self.base_type(y)),
        ) else {
            return ProcOverloadKind::NotProcedure;
        };

        if px.convention != py.convention {
            return ProcOverloadKind::CallingConvention;
        }
        if px.param_count != py.param_count {
            return ProcOverloadKind::ParamCount;
        }
        let params_x = px.params.map(|t| self.tuple_vars(t)).unwrap_or(&[]);
        let params_y = py.params.map(|t| self.tuple_vars(t)).unwrap_or(&[]);
        for (&a, &b) in params_x.iter().zip(params_y) {
            if !self.are_types_identical(self.entity_type(a), self.entity_type(b)) {
                return ProcOverloadKind::ParamTypes;
            }
        }
        if px.variadic != py.variadic {
            return ProcOverloadKind::ParamVariadic;
        }

        if px.result_count != py.result_count {
            return ProcOverloadKind::ResultCount;
        }
        let results_x = px.results.map(|t| self.tuple_vars(t)).unwrap_or(&[]);
        let results_y = py.results.map(|t| self.tuple_vars(t)).unwrap_or(&[]);
        for (&a, &b) in results_x.iter().zip(results_y) {
            if !self.are_types_identical(self.entity_type(a), self.entity_type(b)) {
                return ProcOverloadKind::ResultTypes;
            }
        }

        ProcOverloadKind::Identical
    }
}

#[cfg(test)]
mod tests {
    use quill_core::{CallingConvention, Span};

    use super::*;
    use crate::entity::Entity;
    use crate::layout::TypeSizes;
    use crate::types::{ProcSig, Record};

    fn registry() -> Registry {
        Registry::new(TypeSizes::default())
    }

    fn proc_type(reg: &mut Registry, params: &[TypeId], results: &[TypeId]) -> TypeId {
        let mut sig = ProcSig::new(CallingConvention::Quill);
        if !params.is_empty() {
            sig.params = Some(reg.make_tuple_of(params));
        }
        if !results.is_empty() {
            sig.results = Some(reg.make_tuple_of(results));
        }
        sig.param_count = params.len();
        sig.result_count = results.len();
        reg.make_proc(sig)
    }

    fn record(reg: &mut Registry, kind: RecordKind, fields: &[(&str, TypeId)]) -> TypeId {
        let mut record = Record::new(kind);
        for (i, (name, ty)) in fields.iter().enumerate() {
            let field = reg.add_entity(Entity::field(*name, Span::default(), *ty, false, i));
            record.fields.push(field);
            record.fields_in_src_order.push(field);
        }
        reg.make_record(record)
    }

    #[test]
    fn named_types_are_nominal() {
        let mut reg = registry();
        let a = reg.make_named("A", TypeId::INT, None);
        let b = reg.make_named("B", TypeId::INT, None);
        assert!(reg.are_types_identical(a, a));
        assert!(!reg.are_types_identical(a, b));
        assert!(!reg.are_types_identical(a, TypeId::INT));
    }

    #[test]
    fn anonymous_structs_compare_structurally() {
        let mut reg = registry();
        let a = record(&mut reg, RecordKind::Struct, &[("x", TypeId::INT), ("y", TypeId::F32)]);
        let b = record(&mut reg, RecordKind::Struct, &[("x", TypeId::INT), ("y", TypeId::F32)]);
        let c = record(&mut reg, RecordKind::Struct, &[("x", TypeId::INT), ("z", TypeId::F32)]);
        let d = record(&mut reg, RecordKind::RawUnion, &[("x", TypeId::INT), ("y", TypeId::F32)]);
        assert!(reg.are_types_identical(a, b));
        assert!(!reg.are_types_identical(a, c));
        assert!(!reg.are_types_identical(a, d));
    }

    #[test]
    fn procedures_compare_by_signature() {
        let mut reg = registry();
        let a = proc_type(&mut reg, &[TypeId::INT], &[TypeId::BOOL]);
        let b = proc_type(&mut reg, &[TypeId::INT], &[TypeId::BOOL]);
        let c = proc_type(&mut reg, &[TypeId::INT], &[]);
        assert!(reg.are_types_identical(a, b));
        assert!(!reg.are_types_identical(a, c));
    }

    #[test]
    fn overload_safety_reports_first_difference() {
        let mut reg = registry();
        let base = proc_type(&mut reg, &[TypeId::INT], &[TypeId::BOOL]);
        let same = proc_type(&mut reg, &[TypeId::INT], &[TypeId::BOOL]);
        let other_result = proc_type(&mut reg, &[TypeId::INT], &[TypeId::INT]);
        let other_param = proc_type(&mut reg, &[TypeId::F32], &[TypeId::BOOL]);
        let more_params = proc_type(&mut reg, &[TypeId::INT, TypeId::INT], &[]);

        use ProcOverloadKind::*;
        assert_eq!(reg.are_proc_types_overload_safe(base, same), Identical);
        assert_eq!(reg.are_proc_types_overload_safe(base, other_result), ResultTypes);
        assert_eq!(reg.are_proc_types_overload_safe(base, other_param), ParamTypes);
        assert_eq!(reg.are_proc_types_overload_safe(base, more_params), ParamCount);
        assert_eq!(reg.are_proc_types_overload_safe(base, TypeId::INT), NotProcedure);
    }

    #[test]
    fn untyped_defaults() {
        let reg = registry();
        assert_eq!(reg.default_type(TypeId::UNTYPED_INTEGER), TypeId::INT);
        assert_eq!(reg.default_type(TypeId::UNTYPED_FLOAT), TypeId::F64);
        assert_eq!(reg.default_type(TypeId::UNTYPED_RUNE), TypeId::I32);
        assert_eq!(reg.default_type(TypeId::UNTYPED_NIL), TypeId::UNTYPED_NIL);
        assert_eq!(reg.default_type(TypeId::U8), TypeId::U8);
    }
}
