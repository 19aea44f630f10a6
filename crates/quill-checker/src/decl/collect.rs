//! Entity collection.
//!
//! The first pass over a scope declares every name it introduces without
//! looking at any initializer, so later checks may refer to declarations in
//! any order.

use log::{debug, trace};
use quill_ast::{Decl, Expr, Ident, ImportDecl, SourceFile, Stmt, ValueDecl};
use quill_core::{CheckError, ErrorKind, ExactValue};
use quill_registry::{Entity, EntityId, EntityKind, ScopeId};

use crate::checker::Checker;
use crate::info::DeclInfo;

impl<'ast> Checker<'ast> {
    /// Declare every global entity of `file` in the current (file) scope.
    pub(crate) fn collect_file_entities(&mut self, file: &SourceFile<'ast>) {
        debug!("collecting entities of `{}`", file.name);
        for &stmt in file.decls {
            match stmt {
                Stmt::Empty(_) => {}
                Stmt::Decl(Decl::Value(vd)) => {
                    self.collect_value_decl(vd, true);
                }
                Stmt::Decl(Decl::Import(id)) => self.collect_import(id),
                Stmt::When(w) => {
                    self.error(
                        ErrorKind::SyntaxShape,
                        w.span,
                        "`when` statements are not allowed at file scope",
                    );
                }
                other => {
                    self.error(
                        ErrorKind::SyntaxShape,
                        other.span(),
                        "Only declarations are allowed at file scope",
                    );
                }
            }
        }
    }

    /// Declare the constants, types and procedures of a statement list.
    ///
    /// Local variables are declared by their statement instead, in order.
    pub(crate) fn collect_local_entities(&mut self, stmts: &'ast [Stmt<'ast>]) -> Vec<EntityId> {
        let mut collected = Vec::new();
        for stmt in stmts {
            if let Stmt::Decl(Decl::Value(vd)) = stmt {
                if !vd.is_var {
                    collected.extend(self.collect_value_decl(vd, false));
                }
            }
        }
        collected
    }

    /// Declare the names of one value declaration, recording an unchecked
    /// declaration for each.
    pub(crate) fn collect_value_decl(&mut self, vd: &'ast ValueDecl<'ast>, is_global: bool) -> Vec<EntityId> {
        let scope = self.context.scope;
        let parent = if is_global { None } else { self.context.decl };
        let mut collected = Vec::with_capacity(vd.names.len());

        if vd.is_var {
            if is_global && vd.is_using {
                self.error(ErrorKind::SyntaxShape, vd.span, "`using` is not allowed at file scope");
            }
            self.check_arity_match(vd);
            let mut decl = DeclInfo::new(scope, parent);
            decl.type_expr = vd.ty;
            decl.init_exprs = vd.values;
            decl.init_expr = vd.values.first().copied();
            for &name in vd.names {
                let entity = self.registry.add_entity(Entity::variable(name.name, name.span, None));
                decl.entities.push(entity);
                collected.push(entity);
            }
            let decl = self.info.add_decl(decl);
            for (&name, &entity) in vd.names.iter().zip(&collected) {
                if is_global && !name.is_blank() && !self.check_package_redeclaration(scope, name) {
                    continue;
                }
                self.add_entity(scope, Some(name), entity);
                self.register_decl(entity, decl, is_global);
            }
            return collected;
        }

        self.check_arity_match(vd);
        for (i, &name) in vd.names.iter().enumerate() {
            let init = vd.values.get(i).copied();
            let mut decl = DeclInfo::new(scope, parent);
            decl.type_expr = vd.ty;
            decl.init_expr = init;

            let entity = match init.map(|e| e.unparen()) {
                Some(Expr::ProcLit(pl)) => {
                    decl.proc_lit = Some(pl);
                    Entity::procedure(name.name, name.span, None)
                }
                Some(Expr::Type(_)) if vd.ty.is_none() => Entity::type_name(name.name, name.span, None),
                _ => Entity::constant(name.name, name.span, None, ExactValue::Invalid),
            };
            let entity = self.registry.add_entity(entity);
            let decl = self.info.add_decl({
                decl.entities.push(entity);
                decl
            });
            trace!("collected `{}`", name.name);
            if is_global && !name.is_blank() && !self.check_package_redeclaration(scope, name) {
                continue;
            }
            self.add_entity(scope, Some(name), entity);
            self.register_decl(entity, decl, is_global);
            collected.push(entity);
        }
        collected
    }

    /// Global names are unique across the files of a package.
    fn check_package_redeclaration(&mut self, scope: ScopeId, name: Ident<'ast>) -> bool {
        let Some(package) = self.registry.scope(scope).parent else {
            return true;
        };
        let prev = self.registry.scope(package).shared.iter().find_map(|&sibling| {
            if sibling == scope {
                return None;
            }
            self.registry
                .scope(sibling)
                .get(name.name)
                .filter(|&e| self.registry.entity(e).scope == Some(sibling))
        });
        let Some(prev) = prev else {
            return true;
        };
        let at = self.diagnostics.location(self.registry.entity(prev).span);
        self.error(
            ErrorKind::Redeclaration,
            name.span,
            format!("Redeclaration of `{}` in this scope\n\tat {at}", name.name),
        );
        false
    }

    fn register_decl(&mut self, entity: EntityId, decl: crate::info::DeclId, is_global: bool) {
        self.info.entities.insert(entity, decl);
        if is_global {
            self.info.entity_order.push(entity);
        }
    }

    /// Compare the names of a declaration against its initializers.
    pub(crate) fn check_arity_match(&mut self, vd: &ValueDecl<'ast>) {
        let lhs = vd.names.len();
        let rhs = vd.values.len();
        if rhs == 0 {
            if vd.ty.is_none() {
                self.error(ErrorKind::SyntaxShape, vd.span, "Missing type or initial expression");
            } else if !vd.is_var {
                self.error(ErrorKind::SyntaxShape, vd.span, "Missing constant value");
            }
            return;
        }
        if lhs < rhs {
            let extra = vd.values[lhs];
            self.error(ErrorKind::Arity, extra.span(), format!("Extra initial expression `{extra}`"));
        } else if lhs > rhs && (rhs != 1 || !vd.is_var) {
            let missing = vd.names[rhs];
            self.error(
                ErrorKind::Arity,
                missing.span,
                format!("Missing expression for `{}`", missing.name),
            );
        }
    }

    fn collect_import(&mut self, import: &'ast ImportDecl<'ast>) {
        let package = match self.resolve_import(import) {
            Ok(package) => package,
            Err(err) => {
                self.report(err);
                return;
            }
        };
        let file_scope = self.context.scope;
        let name = import.name();
        let span = import.alias.map(|a| a.span).unwrap_or(import.span);
        let entity = self.registry.add_entity(Entity::new(
            EntityKind::ImportName {
                path: import.path.to_string(),
                scope: package,
                used: false,
            },
            name,
            span,
            None,
        ));
        self.add_entity(file_scope, import.alias, entity);
        let imported = &mut self.registry.scope_mut(file_scope).imported;
        if !imported.contains(&package) {
            imported.push(package);
        }
    }

    /// Find the package scope an import refers to, by path then by name.
    fn resolve_import(&self, import: &ImportDecl<'ast>) -> crate::Result<ScopeId> {
        self.packages
            .get(import.path)
            .or_else(|| self.packages.get(import.name()))
            .copied()
            .ok_or_else(|| {
                CheckError::new(
                    ErrorKind::Name,
                    import.span,
                    format!("Unknown package `{}`", import.path),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;

    use crate::checker::Checker;
    use crate::config::CheckerConfig;

    #[test]
    fn statements_are_rejected_at_file_scope() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let file = c.add_file("top.ql");
        let stray = b.expr_stmt(b.int("1"));
        let when = b.when_stmt(b.ident("true"), b.block(&[]), None);
        let pkg = b.package("main", &[b.source_file(file, "top.ql", &[stray, when])]);
        c.check_packages(&[pkg]);
        assert!(c.diagnostics().contains("Only declarations are allowed at file scope"));
        assert!(c.diagnostics().contains("`when` statements are not allowed at file scope"));
    }

    #[test]
    fn declaration_arity() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let file = c.add_file("arity.ql");
        let extra = b.var_decl(&["a"], None, &[b.int("1"), b.int("2")]);
        let missing = b.const_decl(&["X", "Y"], None, &[b.int("1")]);
        let nothing = b.var_decl(&["z"], None, &[]);
        let pkg = b.package("main", &[b.source_file(file, "arity.ql", &[extra, missing, nothing])]);
        c.check_packages(&[pkg]);
        assert!(c.diagnostics().contains("Extra initial expression `2`"));
        assert!(c.diagnostics().contains("Missing expression for `Y`"));
        assert!(c.diagnostics().contains("Missing type or initial expression"));
    }

    #[test]
    fn duplicate_globals_are_redeclarations() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let file = c.add_file("dup.ql");
        let first = b.var_decl(&["x"], Some(b.ident("int")), &[]);
        let second = b.const_decl(&["x"], None, &[b.int("1")]);
        let pkg = b.package("main", &[b.source_file(file, "dup.ql", &[first, second])]);
        c.check_packages(&[pkg]);
        assert!(c.diagnostics().contains("Redeclaration of `x` in this scope"));
    }

    #[test]
    fn imports_resolve_against_checked_packages() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let lib_file = c.add_file("lib.ql");
        let main_file = c.add_file("main.ql");
        let lib = b.package(
            "lib",
            &[b.source_file(lib_file, "lib.ql", &[b.const_decl(&["ANSWER"], None, &[b.int("42")])])],
        );
        let use_it = b.var_decl(&["x"], Some(b.ident("int")), &[b.selector(b.ident("lib"), "ANSWER")]);
        let main = b.package(
            "main",
            &[b.source_file(main_file, "main.ql", &[b.import("lib", None), use_it])],
        );
        c.check_packages(&[lib, main]);
        assert!(!c.diagnostics().has_errors(), "{}", c.diagnostics());

        let mut c = Checker::new(&arena, CheckerConfig::default());
        let file = c.add_file("bad.ql");
        let pkg = b.package("main", &[b.source_file(file, "bad.ql", &[b.import("core/missing", None)])]);
        c.check_packages(&[pkg]);
        assert!(c.diagnostics().contains("Unknown package `core/missing`"));
    }
}
