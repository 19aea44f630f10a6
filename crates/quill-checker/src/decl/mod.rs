//! Declarations.
//!
//! Global and local constant, type, variable and procedure declarations are
//! first collected into entities with a [`DeclInfo`](crate::info::DeclInfo)
//! each, then checked on demand. Any use of a name checks its declaration
//! first, so declarations may appear in any order; a per-entity state
//! machine (`Unchecked -> InProgress -> Done | Failed`) turns a declaration
//! that depends on itself into an "Illegal declaration cycle" error instead
//! of endless recursion.

mod collect;
mod procedure;
mod variable;

use log::debug;
use quill_ast::Expr;
use quill_core::{ErrorKind, ExactValue};
use quill_registry::{EntityId, EntityKind, TypeId};

use crate::checker::{Checker, DeclState};
use crate::info::DeclId;
use crate::operand::Operand;

impl<'ast> Checker<'ast> {
    /// Check the declaration of `e` unless it already has been.
    ///
    /// Entities without a recorded declaration (universe names, fields,
    /// parameters, local variables) are left alone.
    pub(crate) fn check_entity_decl(&mut self, e: EntityId) {
        let Some(&decl) = self.info.entities.get(&e) else {
            return;
        };
        match self.decl_state(e) {
            DeclState::Done | DeclState::Failed => return,
            DeclState::InProgress => {
                // A named type is usable while its definition is checked
                if self.registry.entity(e).ty.is_some() {
                    return;
                }
                let ent = self.registry.entity(e);
                let (name, span) = (ent.name.clone(), ent.span);
                self.error(
                    ErrorKind::CyclicType,
                    span,
                    format!("Illegal declaration cycle of `{name}`"),
                );
                self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
                self.set_decl_state(e, DeclState::Failed);
                return;
            }
            DeclState::Unchecked => {}
        }

        self.set_decl_state(e, DeclState::InProgress);
        debug!("checking declaration of `{}`", self.registry.entity(e).name);

        let d = self.info.decl(decl);
        let (scope, type_expr, init_expr) = (d.scope, d.type_expr, d.init_expr);
        let global = self.registry.scope(scope).is_file;

        let saved = self.context.clone();
        let saved_procs = if global { std::mem::take(&mut self.proc_stack) } else { Vec::new() };
        self.context.scope = scope;
        self.context.decl = Some(decl);
        if let Some(file) = self.registry.scope(scope).file {
            self.context.file = Some(file);
        }
        if global {
            self.context.proc_name = None;
            self.context.in_defer = false;
        }

        let kind = self.registry.entity(e).kind.clone();
        match kind {
            EntityKind::Constant { .. } => self.check_const_decl(e, type_expr, init_expr),
            EntityKind::TypeName => self.check_type_decl(e, init_expr),
            EntityKind::Variable { .. } => self.check_var_decl(decl),
            EntityKind::Procedure { .. } => self.check_proc_decl(e, decl),
            _ => {}
        }

        self.context = saved;
        if global {
            self.proc_stack = saved_procs;
        }

        let group = self.info.decl(decl).entities.clone();
        let members = if group.contains(&e) { group } else { vec![e] };
        for member in members {
            let state = match self.registry.entity(member).ty {
                Some(TypeId::INVALID) | None => DeclState::Failed,
                Some(_) => DeclState::Done,
            };
            self.set_decl_state(member, state);
        }
        debug!("finished declaration of `{}`", self.registry.entity(e).name);
    }

    /// `X :: value` or `X : T : value`.
    ///
    /// A value that turns out to be a type makes `X` a type name instead.
    fn check_const_decl(&mut self, e: EntityId, type_expr: Option<Expr<'ast>>, init: Option<Expr<'ast>>) {
        let Some(init) = init else {
            self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
            return;
        };

        let declared = match type_expr {
            Some(te) => {
                let t = self.check_type(te);
                if t == TypeId::INVALID {
                    self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
                    self.check_expr_or_type(init);
                    return;
                }
                if !self.registry.is_type_constant_type(self.registry.base_type(t)) {
                    let s = self.type_str(t);
                    self.error(ErrorKind::Constant, te.span(), format!("Invalid constant type `{s}`"));
                    self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
                    return;
                }
                Some(t)
            }
            None => None,
        };

        let mut o = self.check_expr_or_type(init);
        if o.is_type() && declared.is_none() {
            self.registry.entity_mut(e).kind = EntityKind::TypeName;
            self.define_named_type(e, o.ty, init);
            return;
        }
        self.check_init_constant(e, &mut o, declared);
    }

    /// Finish a constant entity from its evaluated initializer.
    pub(crate) fn check_init_constant(&mut self, e: EntityId, o: &mut Operand<'ast>, declared: Option<TypeId>) {
        if o.is_invalid() {
            self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
            return;
        }
        if !o.is_constant() {
            let s = o.expr_string();
            let span = o.expr.map(|x| x.span()).unwrap_or(self.registry.entity(e).span);
            self.error(ErrorKind::Constant, span, format!("`{s}` is not a constant"));
            self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
            return;
        }
        if !self.registry.is_type_constant_type(self.registry.base_type(o.ty)) {
            let s = self.type_str(o.ty);
            let span = o.expr.map(|x| x.span()).unwrap_or(self.registry.entity(e).span);
            self.error(ErrorKind::Constant, span, format!("Invalid constant type `{s}`"));
            self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
            return;
        }

        if let Some(t) = declared {
            self.check_assignment(o, Some(t), "constant declaration");
            if o.is_invalid() {
                self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
                return;
            }
        }

        // Without a declared type the constant stays untyped
        let ent = self.registry.entity_mut(e);
        ent.ty = Some(declared.unwrap_or(o.ty));
        ent.kind = EntityKind::Constant { value: o.value.clone() };
    }

    /// `T :: type_expression`
    fn check_type_decl(&mut self, e: EntityId, init: Option<Expr<'ast>>) {
        let Some(init) = init else {
            self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
            return;
        };
        let name = self.registry.entity(e).name.clone();
        let named = self.registry.make_named(name, TypeId::INVALID, Some(e));
        self.registry.entity_mut(e).ty = Some(named);
        let base = self.check_type_named(init, Some(named));
        self.finish_named_type(e, named, base, init);
    }

    /// Bind `e` to a new named type over the already resolved `base`.
    fn define_named_type(&mut self, e: EntityId, base: TypeId, init: Expr<'ast>) {
        let name = self.registry.entity(e).name.clone();
        let named = self.registry.make_named(name, TypeId::INVALID, Some(e));
        self.registry.entity_mut(e).ty = Some(named);
        self.finish_named_type(e, named, base, init);
    }

    fn finish_named_type(&mut self, e: EntityId, named: TypeId, base: TypeId, init: Expr<'ast>) {
        let resolved = self.registry.base_type(base);
        if base == TypeId::INVALID {
            self.registry.set_named_base(named, TypeId::INVALID);
            return;
        }
        if resolved == TypeId::INVALID {
            let name = self.registry.entity(e).name.clone();
            self.error(
                ErrorKind::CyclicType,
                init.span(),
                format!("Illegal declaration cycle of `{name}`"),
            );
            self.registry.set_named_base(named, TypeId::INVALID);
            return;
        }
        self.registry.set_named_base(named, resolved);
    }

    /// Value of a checked constant, for diagnostics and tests.
    pub fn constant_value_of(&self, e: EntityId) -> Option<&ExactValue> {
        self.registry.entity(e).constant_value()
    }

    pub(crate) fn decl_of(&self, e: EntityId) -> Option<DeclId> {
        self.info.entities.get(&e).copied()
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::{AstBuilder, BinaryOp};

    use super::*;
    use crate::config::CheckerConfig;

    fn check<'a>(c: &mut Checker<'a>, b: &AstBuilder<'a>, decls: &[quill_ast::Stmt<'a>]) {
        let file = c.add_file("decl.ql");
        let pkg = b.package("main", &[b.source_file(file, "decl.ql", decls)]);
        c.check_packages(&[pkg]);
    }

    fn global(c: &Checker<'_>, name: &str) -> EntityId {
        let scope = c.package_scope("main").unwrap();
        c.registry().lookup_in_package(scope, name).unwrap()
    }

    #[test]
    fn constants_may_be_declared_out_of_order() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let a = b.const_decl(&["A"], None, &[b.binary(b.ident("B"), BinaryOp::Mul, b.int("2"))]);
        let bb = b.const_decl(&["B"], None, &[b.int("21")]);
        check(&mut c, &b, &[a, bb]);
        assert!(!c.diagnostics().has_errors(), "{}", c.diagnostics());
        let a = global(&c, "A");
        assert_eq!(c.constant_value_of(a), Some(&ExactValue::Integer(42)));
        assert_eq!(c.registry().entity(a).ty, Some(TypeId::UNTYPED_INTEGER));
    }

    #[test]
    fn typed_constants_convert() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let x = b.const_decl(&["X"], Some(b.ident("u8")), &[b.int("300")]);
        let y = b.const_decl(&["Y"], Some(b.ident("f32")), &[b.int("1")]);
        check(&mut c, &b, &[x, y]);
        assert!(c.diagnostics().contains("`300 = 300` overflows `u8`"));
        assert_eq!(c.registry().entity(global(&c, "Y")).ty, Some(TypeId::F32));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let a = b.const_decl(&["A"], None, &[b.binary(b.ident("A"), BinaryOp::Add, b.int("1"))]);
        check(&mut c, &b, &[a]);
        assert!(c.diagnostics().contains("Illegal declaration cycle of `A`"));
    }

    #[test]
    fn variables_are_not_constants() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let v = b.var_decl(&["v"], Some(b.ident("int")), &[b.int("1")]);
        let k = b.const_decl(&["K"], None, &[b.ident("v")]);
        check(&mut c, &b, &[v, k]);
        assert!(c.diagnostics().contains("`v` is not a constant"));
    }

    #[test]
    fn type_aliases_and_recursive_types() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let my_int = b.type_decl("My_Int", b.ident("int"));
        let node = b.type_decl(
            "Node",
            b.struct_type(&[b.field(&["value"], b.ident("My_Int")), b.field(&["next"], b.pointer_type(b.ident("Node")))]),
        );
        check(&mut c, &b, &[my_int, node]);
        assert!(!c.diagnostics().has_errors(), "{}", c.diagnostics());

        let my_int = c.registry().entity(global(&c, "My_Int")).ty.unwrap();
        assert!(c.registry().is_type_named(my_int));
        assert_eq!(c.registry().base_type(my_int), TypeId::INT);
        assert!(!c.registry().are_types_identical(my_int, TypeId::INT));
        let node = c.registry().entity(global(&c, "Node")).ty.unwrap();
        assert!(c.registry().is_type_struct(c.registry().base_type(node)));
    }

    #[test]
    fn mutually_defined_types_are_cycles() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let a = b.type_decl("A", b.ident("B"));
        let bb = b.type_decl("B", b.ident("A"));
        check(&mut c, &b, &[a, bb]);
        assert!(c.diagnostics().contains("Illegal declaration cycle of"));
    }
}
