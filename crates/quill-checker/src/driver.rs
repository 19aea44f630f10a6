//! Checking whole packages.
//!
//! A session runs in phases:
//!
//! 1. Open a scope per package and a file scope per source file
//! 2. Collect the global entities of every file
//! 3. Check every global declaration, in collection order
//! 4. Validate overload sets and the entry point
//! 5. Check queued procedure bodies until none are left
//! 6. Give leftover untyped expressions their default type

use log::{debug, info, warn};
use quill_ast::{Package, SourceFile};
use quill_core::{ErrorKind, NodeId, Span};
use quill_registry::ScopeId;

use crate::checker::Checker;
use crate::info::ExprInfo;

impl<'ast> Checker<'ast> {
    /// Check a set of packages. The first one is the initial package.
    ///
    /// Imports are resolved by package name, so the order of the remaining
    /// packages does not matter.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_packages(&mut self, packages: &[Package<'ast>]) {
        let saved_scope = self.context.scope;
        let saved_file = self.context.file;

        let mut files: Vec<(ScopeId, &'ast SourceFile<'ast>)> = Vec::new();
        let mut init_package = None;
        for (i, pkg) in packages.iter().enumerate() {
            let package = self.open_package(pkg.name);
            if i == 0 {
                init_package = Some(package);
            }
            for file in pkg.files {
                let scope = self.open_file_scope(package, file, i == 0);
                files.push((scope, file));
            }
        }

        for &(scope, file) in &files {
            self.context.scope = scope;
            self.context.file = Some(file.file);
            self.collect_file_entities(file);
        }

        let order = self.info.entity_order.clone();
        debug!("checking {} global entities", order.len());
        for e in order {
            self.check_entity_decl(e);
        }
        for &(scope, _) in &files {
            self.validate_overloads(scope);
        }

        if self.config.require_main {
            if let Some(package) = init_package {
                let file = files.first().map(|(_, f)| f.file);
                self.require_main(package, file);
            }
        }

        self.check_queued_procs();
        self.finalize_untyped();

        self.context.scope = saved_scope;
        self.context.file = saved_file;
        info!(
            "checked {} package(s): {} error(s)",
            packages.len(),
            self.diagnostics.error_count()
        );
    }

    /// Check a single package as the initial package.
    pub fn check_package(&mut self, package: &Package<'ast>) {
        self.check_packages(std::slice::from_ref(package));
    }

    fn open_package(&mut self, name: &str) -> ScopeId {
        let universal = self.registry.universal();
        let scope = self.registry.new_scope(Some(universal));
        self.registry.scope_mut(scope).is_global = true;
        if self.packages.insert(name.to_string(), scope).is_some() {
            warn!("package `{name}` checked more than once; imports see the latest");
        }
        scope
    }

    fn open_file_scope(&mut self, package: ScopeId, file: &SourceFile<'ast>, is_init: bool) -> ScopeId {
        let scope = self.registry.new_scope(Some(package));
        let s = self.registry.scope_mut(scope);
        s.is_file = true;
        s.is_global = true;
        s.is_init = is_init;
        s.file = Some(file.file);
        self.registry.scope_mut(package).shared.push(scope);
        debug!("file scope {scope:?} for `{}`", file.name);
        scope
    }

    fn require_main(&mut self, package: ScopeId, file: Option<quill_core::FileId>) {
        let found = self
            .registry
            .lookup_in_package(package, "main")
            .is_some_and(|e| self.registry.entity(e).is_procedure());
        if !found {
            let span = file.map(|f| Span::default().in_file(f)).unwrap_or_default();
            self.error(ErrorKind::Name, span, "Undefined entry point procedure `main`");
        }
    }

    /// Check procedure bodies, including the literals found along the way.
    fn check_queued_procs(&mut self) {
        while let Some(pb) = self.info.procs.pop_front() {
            self.check_proc_body(&pb);
            debug!("checked body of `{}`", pb.name);
            self.info.checked_procs.push(pb);
        }
    }

    /// Untyped expressions no context has claimed take their default type.
    fn finalize_untyped(&mut self) {
        let mut leftovers: Vec<(NodeId, ExprInfo)> = self.info.untyped.drain().collect();
        leftovers.sort_by_key(|(id, _)| *id);
        for (id, expr) in leftovers {
            let ty = if self.registry.is_type_untyped_nil(expr.ty) {
                expr.ty
            } else {
                self.registry.default_type(expr.ty)
            };
            self.info.add_type_and_value(id, expr.mode, Some(ty), expr.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;
    use quill_registry::TypeId;

    use crate::checker::Checker;
    use crate::config::CheckerConfig;

    #[test]
    fn entry_point_is_required_when_configured() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default().with_require_main(true));
        let file = c.add_file("app.ql");
        let pkg = b.package("app", &[b.source_file(file, "app.ql", &[b.var_decl(&["x"], None, &[b.int("1")])])]);
        c.check_package(&pkg);
        assert!(c.diagnostics().contains("Undefined entry point procedure `main`"));

        let mut c = Checker::new(&arena, CheckerConfig::default().with_require_main(true));
        let file = c.add_file("app.ql");
        let pkg = b.package("app", &[b.source_file(file, "app.ql", &[b.proc_decl("main", &[], &[], &[])])]);
        c.check_package(&pkg);
        assert!(!c.diagnostics().has_errors(), "{}", c.diagnostics());
    }

    #[test]
    fn globals_are_visible_across_files_of_a_package() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let a = c.add_file("a.ql");
        let z = c.add_file("z.ql");
        let pkg = b.package(
            "app",
            &[
                b.source_file(a, "a.ql", &[b.var_decl(&["total"], Some(b.ident("int")), &[b.ident("BASE")])]),
                b.source_file(z, "z.ql", &[b.const_decl(&["BASE"], None, &[b.int("10")])]),
            ],
        );
        c.check_package(&pkg);
        assert!(!c.diagnostics().has_errors(), "{}", c.diagnostics());
        let scope = c.package_scope("app").unwrap();
        let base = c.registry().lookup_in_package(scope, "BASE").unwrap();
        assert_eq!(c.registry().entity_type(base), TypeId::UNTYPED_INTEGER);
    }

    #[test]
    fn every_queued_body_is_checked_once() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let file = c.add_file("bodies.ql");
        let inner = b.proc_decl("helper", &[], &[], &[]);
        let outer = b.proc_decl("outer", &[], &[], &[inner]);
        let other = b.proc_decl("other", &[], &[], &[]);
        let pkg = b.package("app", &[b.source_file(file, "bodies.ql", &[outer, other])]);
        c.check_package(&pkg);
        assert!(c.info().procs.is_empty());
        let names: Vec<&str> = c.info().checked_procs.iter().map(|pb| pb.name.as_str()).collect();
        assert_eq!(names, ["outer", "other", "helper"]);
    }

    #[test]
    fn leftover_untyped_expressions_get_default_types() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let file = c.add_file("untyped.ql");
        let body = [b.var_decl(&["x"], None, &[b.float("2.5")])];
        let pkg = b.package("app", &[b.source_file(file, "untyped.ql", &[b.proc_decl("f", &[], &[], &body)])]);
        c.check_package(&pkg);
        assert!(c.info().untyped.is_empty());
        let literal = c
            .info()
            .types
            .values()
            .find(|tv| tv.value == quill_core::ExactValue::float(2.5))
            .unwrap();
        assert_eq!(literal.ty, Some(TypeId::F64));
    }
}
