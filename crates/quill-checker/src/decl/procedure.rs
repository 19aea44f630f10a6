//! Procedure declarations and bodies.

use log::debug;
use quill_core::ErrorKind;
use quill_registry::{EntityFlags, EntityId, EntityKind, OverloadKind, ProcOverloadKind, ScopeId, TypeId};

use crate::checker::Checker;
use crate::info::{DeclId, ProcBody};

impl<'ast> Checker<'ast> {
    /// `name :: proc(...) { ... }`
    ///
    /// The signature is checked now; the body is queued and checked once
    /// every global signature is known.
    pub(crate) fn check_proc_decl(&mut self, e: EntityId, decl: DeclId) {
        let Some(pl) = self.info.decl(decl).proc_lit else {
            self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
            return;
        };
        let ty = self.check_type(pl.ty);
        if ty == TypeId::INVALID {
            self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
            return;
        }
        if !self.registry.is_type_proc(ty) {
            let s = self.type_str(ty);
            self.error(
                ErrorKind::TypeMismatch,
                pl.ty.span(),
                format!("Expected a procedure type, got `{s}`"),
            );
            self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
            return;
        }
        self.registry.entity_mut(e).ty = Some(ty);

        let name = self.registry.entity(e).name.clone();
        let scope = self.info.decl(decl).scope;
        if name == "main" && self.registry.scope(scope).is_init {
            let sig = self.registry.proc_sig(ty);
            if sig.is_some_and(|sig| sig.param_count != 0 || sig.result_count != 0) {
                let s = self.type_str(ty);
                self.error(
                    ErrorKind::TypeMismatch,
                    pl.ty.span(),
                    format!("Procedure type of `main` was expected to be `proc()`, got `{s}`"),
                );
            }
        }

        if let Some(body) = pl.body {
            self.info.procs.push_back(ProcBody {
                name,
                entity: Some(e),
                decl: Some(decl),
                ty,
                body,
                span: pl.span,
            });
        }
    }

    /// Check the procedures sharing a name in `scope` against each other.
    ///
    /// Candidates must differ in their parameters; a later duplicate is
    /// reported and made unusable.
    pub(crate) fn validate_overloads(&mut self, scope: ScopeId) {
        let mut names: Vec<String> = self
            .registry
            .scope(scope)
            .elements
            .iter()
            .filter(|(_, entities)| entities.len() > 1)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();

        for name in names {
            let procs = self.registry.scope(scope).get_all(&name).to_vec();
            for &p in &procs {
                self.check_entity_decl(p);
            }
            for (i, &p) in procs.iter().enumerate() {
                for &q in &procs[i + 1..] {
                    let (pt, qt) = (self.registry.entity_type(p), self.registry.entity_type(q));
                    if pt == TypeId::INVALID || qt == TypeId::INVALID {
                        continue;
                    }
                    let message = match self.registry.are_proc_types_overload_safe(pt, qt) {
                        ProcOverloadKind::Identical | ProcOverloadKind::ParamVariadic => {
                            "as the same type as another procedure in this scope"
                        }
                        ProcOverloadKind::ResultCount | ProcOverloadKind::ResultTypes => {
                            "as the same parameters but different results in this scope"
                        }
                        _ => continue,
                    };
                    let span = self.registry.entity(q).span;
                    self.error(ErrorKind::Overload, span, format!("Overloaded procedure `{name}` {message}"));
                    self.registry.entity_mut(q).ty = Some(TypeId::INVALID);
                }
            }
            let overload = if procs.len() > 1 { OverloadKind::Yes } else { OverloadKind::No };
            for p in procs {
                if let EntityKind::Procedure { overload: o } = &mut self.registry.entity_mut(p).kind {
                    *o = overload;
                }
            }
        }
    }

    /// Check the body of a declared procedure or procedure literal.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn check_proc_body(&mut self, pb: &ProcBody<'ast>) {
        if pb.entity.is_some_and(|e| self.registry.entity_type(e) == TypeId::INVALID) {
            return;
        }
        let Some(sig) = self.registry.proc_sig(pb.ty) else {
            return;
        };
        let Some(scope) = sig.scope else {
            return;
        };
        let result_count = sig.result_count;
        let label = if pb.name.is_empty() { "procedure literal" } else { pb.name.as_str() };
        debug!("checking body of `{label}`");

        let saved = self.context.clone();
        self.context.scope = scope;
        self.context.proc_name = Some(pb.name.clone());
        self.context.in_defer = false;
        if pb.decl.is_some() {
            self.context.decl = pb.decl;
        }
        if let Some(file) = self.registry.scope(scope).file {
            self.context.file = Some(file);
        }
        self.apply_stmt_state(pb.body.state);
        self.info.scopes.insert(pb.body.id, scope);
        self.proc_stack.push(pb.ty);

        let params: Vec<EntityId> = self.registry.scope(scope).order.clone();
        for param in params {
            let ent = self.registry.entity(param);
            if ent.flags.contains(EntityFlags::PARAM | EntityFlags::ANONYMOUS) {
                let span = ent.span;
                self.promote_using_entity(param, scope, span);
            }
        }

        self.check_stmt_list(pb.body.stmts);

        if result_count > 0 && !self.is_terminating_list(pb.body.stmts) {
            self.error(
                ErrorKind::SyntaxShape,
                pb.body.close,
                format!("Missing return statement at the end of the procedure `{label}`"),
            );
        }

        self.proc_stack.pop();
        self.context = saved;
    }
}
