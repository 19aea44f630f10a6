//! Statement checking.
//!
//! This module contains the `visit_*` methods for statements. Each one
//! checks its expressions, opens the scopes the statement introduces and
//! recurses into nested statements with the [`StmtFlags`] that say which
//! branch statements are legal at that point.

mod assign;
mod control;
mod matching;
mod using;

use bitflags::bitflags;
use quill_ast::{Block, BranchKind, Decl, Expr, ExprStmt, Stmt, StmtStateFlags};
use quill_core::ErrorKind;
use quill_registry::{BuiltinKind, BuiltinProc};

use crate::checker::Checker;
use crate::operand::AddressingMode;

bitflags! {
    /// What the statement being checked may do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StmtFlags: u32 {
        const BREAK_ALLOWED       = 1 << 0;
        const CONTINUE_ALLOWED    = 1 << 1;
        const FALLTHROUGH_ALLOWED = 1 << 2;
        /// Collect local constant, type and procedure declarations first
        const CHECK_SCOPE_DECLS   = 1 << 3;
    }
}

impl<'ast> Checker<'ast> {
    /// Check the statements of a procedure body, already in its scope.
    pub(crate) fn check_stmt_list(&mut self, stmts: &'ast [Stmt<'ast>]) {
        self.visit_stmt_list(stmts, StmtFlags::CHECK_SCOPE_DECLS);
    }

    pub(crate) fn visit_stmt_list(&mut self, stmts: &'ast [Stmt<'ast>], flags: StmtFlags) {
        if flags.contains(StmtFlags::CHECK_SCOPE_DECLS) {
            let collected = self.collect_local_entities(stmts);
            for e in collected {
                self.check_entity_decl(e);
            }
            let scope = self.context.scope;
            self.validate_overloads(scope);
        }

        let inner = flags.difference(StmtFlags::FALLTHROUGH_ALLOWED) | StmtFlags::CHECK_SCOPE_DECLS;
        let last = stmts.iter().rposition(|s| !s.is_empty());
        let mut reported_unreachable = false;
        for (i, &stmt) in stmts.iter().enumerate() {
            let stmt_flags = if Some(i) == last && flags.contains(StmtFlags::FALLTHROUGH_ALLOWED) {
                inner | StmtFlags::FALLTHROUGH_ALLOWED
            } else {
                inner
            };

            if let Stmt::Return(ret) = stmt {
                let rest_has_code = stmts[i + 1..].iter().any(|s| !s.is_empty());
                if rest_has_code && !reported_unreachable {
                    self.error(
                        ErrorKind::SyntaxShape,
                        ret.span,
                        "Statements after this `return` are never executed",
                    );
                    reported_unreachable = true;
                }
            }
            self.visit_stmt(stmt, stmt_flags);
        }
    }

    pub(crate) fn visit_stmt(&mut self, stmt: Stmt<'ast>, flags: StmtFlags) {
        match stmt {
            Stmt::Empty(_) => {}
            Stmt::Expr(es) => self.visit_expr_stmt(es),
            Stmt::Assign(a) => self.visit_assign(a),
            Stmt::Block(b) => self.visit_block(b, flags),
            Stmt::If(s) => self.visit_if(s, flags),
            Stmt::When(s) => self.visit_when(s, flags),
            Stmt::Return(r) => self.visit_return(r),
            Stmt::For(s) => self.visit_for(s, flags),
            Stmt::Range(s) => self.visit_range(s, flags),
            Stmt::Match(s) => self.visit_match(s, flags),
            Stmt::TypeMatch(s) => self.visit_type_match(s, flags),
            Stmt::Defer(d) => self.visit_defer(d, flags),
            Stmt::Branch(br) => self.visit_branch(br, flags),
            Stmt::Using(u) => self.visit_using(u),
            Stmt::Decl(Decl::Value(vd)) if vd.is_var => self.visit_local_var_decl(vd),
            Stmt::Decl(Decl::Value(vd)) => {
                // Declarations outside a statement list, such as an `if`
                // initializer, have not been collected yet
                let collected = vd
                    .names
                    .first()
                    .is_some_and(|n| n.is_blank() || self.info.definitions.contains_key(&n.id));
                if !collected {
                    for e in self.collect_value_decl(vd, false) {
                        self.check_entity_decl(e);
                    }
                }
            }
            Stmt::Decl(Decl::Import(id)) => {
                self.error(
                    ErrorKind::SyntaxShape,
                    id.span,
                    "Imports are only allowed at file scope",
                );
            }
        }
    }

    /// A nested block with its own scope.
    pub(crate) fn visit_block(&mut self, block: &'ast Block<'ast>, flags: StmtFlags) {
        let saved_state = self.context.stmt_state;
        self.apply_stmt_state(block.state);
        self.open_scope(block.id);
        self.visit_stmt_list(block.stmts, flags);
        self.close_scope();
        self.context.stmt_state = saved_state;
    }

    /// Apply the `#bounds_check` / `#no_bounds_check` state of a block.
    pub(crate) fn apply_stmt_state(&mut self, state: StmtStateFlags) {
        if state.contains(StmtStateFlags::BOUNDS_CHECK) {
            self.context.stmt_state.insert(StmtStateFlags::BOUNDS_CHECK);
            self.context.stmt_state.remove(StmtStateFlags::NO_BOUNDS_CHECK);
        } else if state.contains(StmtStateFlags::NO_BOUNDS_CHECK) {
            self.context.stmt_state.insert(StmtStateFlags::NO_BOUNDS_CHECK);
            self.context.stmt_state.remove(StmtStateFlags::BOUNDS_CHECK);
        }
    }

    fn visit_expr_stmt(&mut self, es: &'ast ExprStmt<'ast>) {
        let e = es.expr;
        let o = self.check_expr_base(e, None);
        match o.mode {
            AddressingMode::Invalid | AddressingMode::NoValue => {}
            AddressingMode::Type => {
                self.error(ErrorKind::TypeMismatch, e.span(), format!("`{e}` is not an expression"));
            }
            _ => {
                if let Expr::Call(call) = e.unparen() {
                    let callee = self.called_builtin(call.callee);
                    if callee.is_none_or(|b| b.info().kind == BuiltinKind::Stmt) {
                        return;
                    }
                }
                self.error(
                    ErrorKind::TypeMismatch,
                    e.span(),
                    format!("Expression is not used: `{e}`"),
                );
            }
        }
    }

    /// The builtin a checked callee expression named, if any.
    fn called_builtin(&self, callee: Expr<'ast>) -> Option<BuiltinProc> {
        match self.info.types.get(&callee.id()).map(|tv| &tv.mode) {
            Some(AddressingMode::Builtin(b)) => Some(*b),
            _ => None,
        }
    }

    // ========================================================================
    // Termination
    // ========================================================================

    /// Whether control never falls off the end of `stmts`.
    pub(crate) fn is_terminating_list(&self, stmts: &[Stmt<'ast>]) -> bool {
        stmts
            .iter()
            .rev()
            .find(|s| !s.is_empty())
            .is_some_and(|&s| self.is_terminating(s))
    }

    pub(crate) fn is_terminating(&self, stmt: Stmt<'ast>) -> bool {
        match stmt {
            Stmt::Return(_) => true,
            Stmt::Block(b) => self.is_terminating_list(b.stmts),
            Stmt::Expr(es) => match es.expr.unparen() {
                Expr::Call(call) => self.called_builtin(call.callee) == Some(BuiltinProc::Panic),
                _ => false,
            },
            Stmt::If(s) => {
                let Some(else_stmt) = s.else_stmt else {
                    return false;
                };
                self.is_terminating_list(s.body.stmts) && self.is_terminating(else_stmt)
            }
            Stmt::When(s) => {
                let Some(else_stmt) = s.else_stmt else {
                    return false;
                };
                self.is_terminating_list(s.body.stmts) && self.is_terminating(else_stmt)
            }
            Stmt::For(s) => s.cond.is_none() && !has_break_list(s.body.stmts),
            Stmt::Match(s) => {
                s.clauses.iter().any(|c| c.is_default())
                    && s.clauses
                        .iter()
                        .all(|c| self.is_terminating_list(c.stmts) && !has_break_list(c.stmts))
            }
            Stmt::TypeMatch(s) => {
                s.clauses.iter().any(|c| c.is_default())
                    && s.clauses
                        .iter()
                        .all(|c| self.is_terminating_list(c.stmts) && !has_break_list(c.stmts))
            }
            _ => false,
        }
    }
}

/// Whether a `break` in `stmts` leaves the enclosing loop or match.
fn has_break_list(stmts: &[Stmt<'_>]) -> bool {
    stmts.iter().any(|&s| has_break(s))
}

fn has_break(stmt: Stmt<'_>) -> bool {
    match stmt {
        Stmt::Branch(b) => b.kind == BranchKind::Break,
        Stmt::Block(b) => has_break_list(b.stmts),
        Stmt::If(s) => has_break_list(s.body.stmts) || s.else_stmt.is_some_and(has_break),
        Stmt::When(s) => has_break_list(s.body.stmts) || s.else_stmt.is_some_and(has_break),
        // Nested loops and matches own their `break`s
        _ => false,
    }
}
