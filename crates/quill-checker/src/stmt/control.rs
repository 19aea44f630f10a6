//! Control flow statements.

use quill_ast::{
    BranchKind, BranchStmt, DeferStmt, Expr, ForStmt, Ident, IfStmt, IntervalExpr, RangeStmt, ReturnStmt, Stmt,
    WhenStmt,
};
use quill_core::{BasicKind, ErrorKind};
use quill_registry::{Entity, TypeId, TypeKind};

use super::StmtFlags;
use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    /// Check a condition; untyped booleans become `bool`.
    fn check_condition(&mut self, cond: Expr<'ast>, stmt: &str) {
        let mut o = self.check_expr(cond);
        if o.is_invalid() {
            return;
        }
        if !self.registry.is_type_boolean(o.ty) {
            self.error(
                ErrorKind::TypeMismatch,
                cond.span(),
                format!("Non-boolean condition in `{stmt}` statement"),
            );
            return;
        }
        if self.registry.is_type_untyped(o.ty) {
            self.convert_to_typed(&mut o, TypeId::BOOL);
        }
    }

    pub(super) fn visit_if(&mut self, s: &'ast IfStmt<'ast>, flags: StmtFlags) {
        let inner = flags.difference(StmtFlags::FALLTHROUGH_ALLOWED);
        self.open_scope(s.id);
        if let Some(init) = s.init {
            self.visit_stmt(init, inner);
        }
        self.check_condition(s.cond, "if");
        self.visit_block(s.body, inner);
        if let Some(else_stmt) = s.else_stmt {
            match else_stmt {
                Stmt::If(_) | Stmt::Block(_) => self.visit_stmt(else_stmt, inner),
                other => {
                    self.error(
                        ErrorKind::SyntaxShape,
                        other.span(),
                        "Invalid `else` statement in `if` statement",
                    );
                }
            }
        }
        self.close_scope();
    }

    /// `when` is resolved at compile time; only the taken branch is checked.
    pub(super) fn visit_when(&mut self, s: &'ast WhenStmt<'ast>, flags: StmtFlags) {
        let o = self.check_expr(s.cond);
        if o.is_invalid() {
            return;
        }
        if !o.is_constant() || !self.registry.is_type_boolean(o.ty) {
            self.error(
                ErrorKind::Constant,
                s.cond.span(),
                "Non-constant boolean `when` condition",
            );
            return;
        }
        if o.value.as_bool() == Some(true) {
            self.visit_block(s.body, flags);
            return;
        }
        if let Some(else_stmt) = s.else_stmt {
            match else_stmt {
                Stmt::When(_) | Stmt::Block(_) => self.visit_stmt(else_stmt, flags),
                other => {
                    self.error(
                        ErrorKind::SyntaxShape,
                        other.span(),
                        "Invalid `else` statement in `when` statement",
                    );
                }
            }
        }
    }

    pub(super) fn visit_for(&mut self, s: &'ast ForStmt<'ast>, flags: StmtFlags) {
        let inner = flags.difference(StmtFlags::FALLTHROUGH_ALLOWED);
        self.open_scope(s.id);
        if let Some(init) = s.init {
            self.visit_stmt(init, inner);
        }
        if let Some(cond) = s.cond {
            self.check_condition(cond, "for");
        }
        if let Some(post) = s.post {
            if let Stmt::Decl(_) = post {
                self.error(
                    ErrorKind::SyntaxShape,
                    post.span(),
                    "Cannot declare in the post statement of a `for` loop",
                );
            } else {
                self.visit_stmt(post, inner);
            }
        }
        self.visit_block(s.body, inner | StmtFlags::BREAK_ALLOWED | StmtFlags::CONTINUE_ALLOWED);
        self.close_scope();
    }

    /// `for value, index in expr`
    pub(super) fn visit_range(&mut self, s: &'ast RangeStmt<'ast>, flags: StmtFlags) {
        self.open_scope(s.id);
        let types = match s.expr.unparen() {
            Expr::Interval(iv) => self.check_range_interval(iv),
            e => {
                let mut o = self.check_expr(e);
                self.range_types(&mut o)
            }
        };
        let (value_ty, index_ty) = types.unwrap_or((TypeId::INVALID, TypeId::INVALID));
        self.declare_range_var(s.value, value_ty);
        self.declare_range_var(s.index, index_ty);

        let inner = flags.difference(StmtFlags::FALLTHROUGH_ALLOWED);
        self.visit_block(s.body, inner | StmtFlags::BREAK_ALLOWED | StmtFlags::CONTINUE_ALLOWED);
        self.close_scope();
    }

    /// `low ..< high`: both ends share one numeric or pointer type.
    fn check_range_interval(&mut self, iv: &'ast IntervalExpr<'ast>) -> Option<(TypeId, TypeId)> {
        let mut low = self.check_expr(iv.low);
        let mut high = self.check_expr(iv.high);
        if low.is_invalid() || high.is_invalid() {
            return None;
        }
        self.unify_interval_ends(&mut low, &mut high);
        if low.is_invalid() || high.is_invalid() {
            return None;
        }

        let ty = low.ty;
        let valid = self.registry.are_types_identical(ty, high.ty)
            && (self.registry.is_type_numeric(ty) || self.registry.is_type_pointer(ty));
        if !valid {
            let (l, h) = (self.type_str(low.ty), self.type_str(high.ty));
            self.error(
                ErrorKind::TypeMismatch,
                iv.span,
                format!("Invalid interval range `{l}` ..< `{h}`"),
            );
            return None;
        }
        self.info
            .add_type_and_value(iv.id, AddressingMode::Value, Some(ty), Default::default());
        Some((ty, TypeId::INT))
    }

    fn unify_interval_ends(&mut self, low: &mut Operand<'ast>, high: &mut Operand<'ast>) {
        let low_untyped = self.registry.is_type_untyped(low.ty);
        let high_untyped = self.registry.is_type_untyped(high.ty);
        match (low_untyped, high_untyped) {
            (true, false) => self.convert_to_typed(low, high.ty),
            (false, true) => self.convert_to_typed(high, low.ty),
            (true, true) => {
                let either_float = self.registry.basic_kind(low.ty) == Some(BasicKind::UntypedFloat)
                    || self.registry.basic_kind(high.ty) == Some(BasicKind::UntypedFloat);
                let target = if either_float {
                    TypeId::F64
                } else {
                    self.registry.default_type(low.ty)
                };
                self.convert_to_typed(low, target);
                self.convert_to_typed(high, target);
            }
            (false, false) => {}
        }
    }

    /// Value and index types of iterating over `o`.
    fn range_types(&mut self, o: &mut Operand<'ast>) -> Option<(TypeId, TypeId)> {
        if o.is_invalid() {
            return None;
        }
        if self.registry.is_type_untyped(o.ty) {
            self.check_assignment(o, None, "range statement");
            if o.is_invalid() {
                return None;
            }
        }
        let bt = self.registry.base_type(o.ty);
        let types = match self.registry.ty(bt).kind {
            TypeKind::Basic(BasicKind::String) => Some((TypeId::RUNE, TypeId::INT)),
            TypeKind::Array { elem, .. }
            | TypeKind::Vector { elem, .. }
            | TypeKind::Slice(elem)
            | TypeKind::DynamicArray(elem) => Some((elem, TypeId::INT)),
            TypeKind::Map { key, value, .. } => Some((value, key)),
            _ => None,
        };
        if types.is_none() {
            let (e, t) = (o.expr_string(), self.type_str(o.ty));
            let span = o.expr.map(|x| x.span()).unwrap_or_default();
            self.error(
                ErrorKind::TypeMismatch,
                span,
                format!("Cannot iterate over `{e}` of type `{t}`"),
            );
        }
        types
    }

    fn declare_range_var(&mut self, ident: Option<Ident<'ast>>, ty: TypeId) {
        let Some(ident) = ident else {
            return;
        };
        if ident.is_blank() {
            self.add_entity_definition(ident, None);
            return;
        }
        let e = self.registry.add_entity(Entity::variable(ident.name, ident.span, Some(ty)));
        let scope = self.context.scope;
        self.add_entity(scope, Some(ident), e);
    }

    pub(super) fn visit_defer(&mut self, d: &'ast DeferStmt<'ast>, flags: StmtFlags) {
        if let Stmt::Decl(_) = d.stmt {
            self.error(ErrorKind::SyntaxShape, d.span, "You cannot defer a declaration");
            return;
        }
        let saved = self.context.in_defer;
        self.context.in_defer = true;
        let inner = flags
            .difference(StmtFlags::BREAK_ALLOWED | StmtFlags::CONTINUE_ALLOWED | StmtFlags::FALLTHROUGH_ALLOWED);
        self.visit_stmt(d.stmt, inner);
        self.context.in_defer = saved;
    }

    pub(super) fn visit_branch(&mut self, br: &'ast BranchStmt, flags: StmtFlags) {
        let message = match br.kind {
            BranchKind::Break if !flags.contains(StmtFlags::BREAK_ALLOWED) => {
                "`break` only allowed in `for` or `match` statements"
            }
            BranchKind::Continue if !flags.contains(StmtFlags::CONTINUE_ALLOWED) => {
                "`continue` only allowed in `for` statements"
            }
            BranchKind::Fallthrough if !flags.contains(StmtFlags::FALLTHROUGH_ALLOWED) => {
                "`fallthrough` statement in illegal position"
            }
            _ => return,
        };
        self.error(ErrorKind::SyntaxShape, br.span, message);
    }

    pub(super) fn visit_return(&mut self, r: &'ast ReturnStmt<'ast>) {
        if self.context.in_defer {
            self.error(
                ErrorKind::SyntaxShape,
                r.span,
                "You cannot `return` within a defer statement",
            );
            return;
        }
        let Some(&proc_ty) = self.proc_stack.last() else {
            self.error(ErrorKind::SyntaxShape, r.span, "`return` outside of a procedure");
            return;
        };
        let results: Vec<TypeId> = self
            .registry
            .proc_sig(self.registry.base_type(proc_ty))
            .and_then(|sig| sig.results)
            .map(|t| {
                self.registry
                    .tuple_vars(t)
                    .iter()
                    .map(|&v| self.registry.entity_type(v))
                    .collect()
            })
            .unwrap_or_default();

        if results.is_empty() {
            if let Some(first) = r.results.first() {
                for &e in r.results {
                    self.check_expr_base(e, None);
                }
                self.error(ErrorKind::Arity, first.span(), "No return values expected");
            }
            return;
        }

        let hints: Vec<Option<TypeId>> = results.iter().copied().map(Some).collect();
        let values = self.check_unpacked_exprs(r.results, &hints);
        if values.len() != results.len() {
            if values.iter().all(|o| !o.is_invalid()) {
                self.error(
                    ErrorKind::Arity,
                    r.span,
                    format!("Expected {} return values, got {}", results.len(), values.len()),
                );
            }
            return;
        }
        for (mut value, ty) in values.into_iter().zip(results) {
            self.check_assignment(&mut value, Some(ty), "return statement");
        }
    }
}
