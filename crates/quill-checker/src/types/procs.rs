//! Procedure signatures.

use quill_ast::{FieldDecl, ProcType, TypeExpr};
use quill_core::ErrorKind;
use quill_registry::{Entity, EntityFlags, EntityId, EntityKind, ProcSig, TypeId};

use crate::checker::Checker;

impl<'ast> Checker<'ast> {
    /// Check a procedure type. Parameters and named results are declared in
    /// a new procedure scope, which later holds the body as well.
    pub(super) fn check_procedure_type(&mut self, t: &'ast TypeExpr<'ast>, pt: &ProcType<'ast>) -> TypeId {
        let saved = self.context.scope;
        let scope = self.open_scope(t.id);
        self.registry.scope_mut(scope).is_proc = true;

        let (params, variadic) = self.check_params(pt.params);
        let results = self.check_results(pt.results);
        self.context.scope = saved;

        let param_count = params.len();
        let result_count = results.len();
        let mut sig = ProcSig::new(pt.convention);
        sig.scope = Some(scope);
        sig.params = (!params.is_empty()).then(|| self.registry.make_tuple(params));
        sig.results = (!results.is_empty()).then(|| self.registry.make_tuple(results));
        sig.param_count = param_count;
        sig.result_count = result_count;
        sig.variadic = variadic;
        self.registry.make_proc(sig)
    }

    /// # Returns
    ///
    /// The parameter entities and whether the last one is variadic.
    fn check_params(&mut self, fields: &'ast [FieldDecl<'ast>]) -> (Vec<EntityId>, bool) {
        let mut params = Vec::new();
        let mut variadic = false;
        let scope = self.context.scope;

        for (i, field) in fields.iter().enumerate() {
            let mut ty = self.check_type(field.ty);
            if field.is_variadic {
                if i + 1 == fields.len() {
                    variadic = true;
                    ty = self.registry.make_slice(ty);
                } else {
                    self.error(ErrorKind::SyntaxShape, field.span, "Invalid variadic parameter");
                    ty = TypeId::INVALID;
                }
            }
            if field.is_using && !ty.is_invalid() {
                let target = self.registry.base_type(self.registry.type_deref(ty));
                if !self.registry.is_type_struct(target) && !self.registry.is_type_raw_union(target) {
                    let s = self.type_str(ty);
                    self.error(
                        ErrorKind::TypeMismatch,
                        field.span,
                        format!("`using` cannot be applied to a parameter of type `{s}`"),
                    );
                }
            }

            for &name in field.names {
                let mut param = Entity::param(name.name, name.span, ty, field.is_using, field.is_immutable);
                set_position(&mut param, params.len());
                if field.is_variadic && variadic {
                    param.flags |= EntityFlags::ELLIPSIS;
                }
                let param = self.registry.add_entity(param);
                self.add_entity(scope, Some(name), param);
                params.push(param);
            }
        }
        (params, variadic)
    }

    fn check_results(&mut self, fields: &'ast [FieldDecl<'ast>]) -> Vec<EntityId> {
        let mut results = Vec::new();
        let scope = self.context.scope;
        for field in fields {
            let ty = self.check_type(field.ty);
            if field.is_variadic {
                self.error(ErrorKind::SyntaxShape, field.span, "Invalid variadic result");
            }
            if field.names.is_empty() {
                let mut result = Entity::param("", field.span, ty, false, false);
                set_position(&mut result, results.len());
                results.push(self.registry.add_entity(result));
                continue;
            }
            for &name in field.names {
                let mut result = Entity::param(name.name, name.span, ty, false, false);
                set_position(&mut result, results.len());
                let result = self.registry.add_entity(result);
                self.add_entity(scope, Some(name), result);
                results.push(result);
            }
        }
        results
    }
}

fn set_position(entity: &mut Entity, index: usize) {
    if let EntityKind::Variable {
        field_index,
        field_src_index,
        ..
    } = &mut entity.kind
    {
        *field_index = index;
        *field_src_index = index;
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;

    use super::*;
    use crate::config::CheckerConfig;

    #[test]
    fn signature_shape() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let pt = b.proc_type(
            &[b.field(&["a", "b"], b.ident("int")), b.variadic_param("rest", b.ident("f32"))],
            &[b.result(b.ident("bool"))],
        );
        let ty = c.check_type(pt);
        let sig = c.registry().proc_sig(ty).unwrap();
        assert_eq!(sig.param_count, 3);
        assert_eq!(sig.result_count, 1);
        assert!(sig.variadic);
        let scope = sig.scope.unwrap();
        assert!(c.registry().scope(scope).is_proc);
        assert!(c.registry().lookup_current(scope, "rest").is_some());
        assert_eq!(c.type_str(ty), "proc(int, int, ..f32) -> bool");
    }

    #[test]
    fn variadic_must_be_last() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let pt = b.proc_type(
            &[b.variadic_param("rest", b.ident("int")), b.field(&["x"], b.ident("int"))],
            &[],
        );
        c.check_type(pt);
        assert!(c.diagnostics().contains("Invalid variadic parameter"));
    }
}
