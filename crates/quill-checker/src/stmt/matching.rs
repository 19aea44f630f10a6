//! `match` and `match type` statements.

use quill_ast::{CaseClause, Expr, MatchStmt, TypeMatchStmt};
use quill_core::{ErrorKind, ExactValue, Span};
use quill_registry::{Entity, TypeId};

use super::StmtFlags;
use crate::checker::Checker;

impl<'ast> Checker<'ast> {
    pub(super) fn visit_match(&mut self, s: &'ast MatchStmt<'ast>, flags: StmtFlags) {
        self.open_scope(s.id);
        let inner = flags.difference(StmtFlags::FALLTHROUGH_ALLOWED);
        if let Some(init) = s.init {
            self.visit_stmt(init, inner);
        }

        let tag_ty = match s.tag {
            Some(tag) => {
                let mut o = self.check_expr(tag);
                self.check_assignment(&mut o, None, "match expression");
                if o.is_invalid() { TypeId::INVALID } else { o.ty }
            }
            None => TypeId::BOOL,
        };
        self.check_single_default(s.clauses);

        let mut seen: Vec<(ExactValue, Span)> = Vec::new();
        for (i, clause) in s.clauses.iter().enumerate() {
            if tag_ty != TypeId::INVALID {
                for &e in clause.list {
                    self.check_match_case(e, tag_ty, &mut seen);
                }
            }

            let mut clause_flags = inner | StmtFlags::BREAK_ALLOWED | StmtFlags::CHECK_SCOPE_DECLS;
            if i + 1 < s.clauses.len() {
                clause_flags |= StmtFlags::FALLTHROUGH_ALLOWED;
            }
            self.open_scope(clause.id);
            self.visit_stmt_list(clause.stmts, clause_flags);
            self.close_scope();
        }
        self.close_scope();
    }

    fn check_single_default(&mut self, clauses: &[CaseClause<'ast>]) {
        if let Some(second) = clauses.iter().filter(|c| c.is_default()).nth(1) {
            self.error(
                ErrorKind::SyntaxShape,
                second.span,
                "Multiple `default` clauses in `match` statement",
            );
        }
    }

    /// One case expression against the tag. Constant cases must be unique.
    fn check_match_case(&mut self, e: Expr<'ast>, tag_ty: TypeId, seen: &mut Vec<(ExactValue, Span)>) {
        if let Expr::Interval(iv) = e.unparen() {
            for end in [iv.low, iv.high] {
                let mut o = self.check_expr_with_type_hint(end, Some(tag_ty));
                self.check_assignment(&mut o, Some(tag_ty), "match case");
            }
            if !self.registry.is_type_ordered(tag_ty) {
                let t = self.type_str(tag_ty);
                self.error(
                    ErrorKind::TypeMismatch,
                    iv.span,
                    format!("Interval cases require an ordered tag type, got `{t}`"),
                );
            }
            return;
        }

        let mut o = self.check_expr_with_type_hint(e, Some(tag_ty));
        self.check_assignment(&mut o, Some(tag_ty), "match case");
        if !o.is_constant() || o.value.is_invalid() {
            return;
        }
        if let Some((_, prev)) = seen.iter().find(|(v, _)| *v == o.value) {
            let at = self.diagnostics.location(*prev);
            self.error(
                ErrorKind::Redeclaration,
                e.span(),
                format!("Duplicate case `{}`\n\tprevious case at {at}", o.value),
            );
            return;
        }
        seen.push((o.value, e.span()));
    }

    /// `match type v in tag`: the tag is a pointer to a union or an `any`.
    pub(super) fn visit_type_match(&mut self, s: &'ast TypeMatchStmt<'ast>, flags: StmtFlags) {
        let tag = self.check_expr(s.tag);
        if tag.is_invalid() {
            return;
        }
        let is_pointer = self.registry.is_type_pointer(tag.ty);
        let union_ty = if is_pointer {
            let pointee = self.registry.type_deref(tag.ty);
            Some(pointee).filter(|&t| self.registry.is_type_union(t))
        } else {
            None
        };
        if union_ty.is_none() && !self.registry.is_type_any(tag.ty) {
            let t = self.type_str(tag.ty);
            self.error(ErrorKind::TypeMismatch, s.tag.span(), format!("Unknown tag type, got `{t}`"));
            return;
        }
        self.add_entity_definition(s.var, None);
        self.check_single_default(s.clauses);

        let inner = flags.difference(StmtFlags::FALLTHROUGH_ALLOWED | StmtFlags::CONTINUE_ALLOWED);
        let mut seen: Vec<TypeId> = Vec::new();
        for clause in s.clauses {
            let mut case_ty = None;
            for &e in clause.list {
                let t = self.check_type(e);
                if t == TypeId::INVALID {
                    continue;
                }
                if let Some(u) = union_ty {
                    if !self.is_union_variant(u, t) {
                        let (ts, us) = (self.type_str(t), self.type_str(u));
                        self.error(
                            ErrorKind::TypeMismatch,
                            e.span(),
                            format!("`{ts}` is not a variant of `{us}`"),
                        );
                        continue;
                    }
                }
                if seen.iter().any(|&prev| self.registry.are_types_identical(prev, t)) {
                    let ts = self.type_str(t);
                    self.error(ErrorKind::Redeclaration, e.span(), format!("Duplicate type case `{ts}`"));
                    continue;
                }
                seen.push(t);
                case_ty = Some(t);
            }

            let bound = match case_ty {
                Some(t) if clause.list.len() == 1 && is_pointer => self.registry.make_pointer(t),
                Some(t) if clause.list.len() == 1 => t,
                _ => tag.ty,
            };

            let scope = self.open_scope(clause.id);
            if !s.var.is_blank() {
                let e = self
                    .registry
                    .add_entity(Entity::variable(s.var.name, s.var.span, Some(bound)));
                self.add_entity(scope, None, e);
                self.info.implicits.insert(clause.id, e);
            }
            self.visit_stmt_list(
                clause.stmts,
                inner | StmtFlags::BREAK_ALLOWED | StmtFlags::CHECK_SCOPE_DECLS,
            );
            self.close_scope();
        }
    }

    fn is_union_variant(&self, union_ty: TypeId, t: TypeId) -> bool {
        let base = self.registry.base_type(union_ty);
        let Some(record) = self.registry.record(base) else {
            return false;
        };
        record
            .fields
            .iter()
            .skip(1)
            .any(|&v| self.registry.are_types_identical(self.registry.entity_type(v), t))
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::{AstBuilder, BranchKind, Stmt};

    use crate::checker::Checker;
    use crate::config::CheckerConfig;

    fn check<'a>(c: &mut Checker<'a>, b: &AstBuilder<'a>, globals: &[Stmt<'a>], body: &[Stmt<'a>]) {
        let file = c.add_file("match.ql");
        let mut decls = globals.to_vec();
        decls.push(b.proc_decl("f", &[], &[], body));
        let pkg = b.package("main", &[b.source_file(file, "match.ql", &decls)]);
        c.check_packages(&[pkg]);
    }

    #[test]
    fn value_match_cases() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let n = b.var_decl(&["n"], Some(b.ident("int")), &[]);
        let m = b.match_stmt(
            None,
            Some(b.ident("n")),
            &[
                b.case(&[b.int("1"), b.int("2")], &[b.branch(BranchKind::Fallthrough)]),
                b.case(&[b.interval(b.int("3"), b.int("9"))], &[b.branch(BranchKind::Break)]),
                b.case(&[b.int("2")], &[]),
                b.case(&[b.str("x")], &[]),
                b.case(&[], &[b.branch(BranchKind::Fallthrough)]),
            ],
        );
        check(&mut c, &b, &[], &[n, m]);
        assert!(c.diagnostics().contains("Duplicate case `2`\n\tprevious case at"));
        assert!(c.diagnostics().contains("to `int`"));
        assert!(c.diagnostics().contains("`fallthrough` statement in illegal position"));
        assert_eq!(c.diagnostics().error_count(), 3, "{}", c.diagnostics());
    }

    #[test]
    fn tagless_match_and_defaults() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let n = b.var_decl(&["n"], None, &[b.int("4")]);
        let m = b.match_stmt(
            None,
            None,
            &[
                b.case(&[b.binary(b.ident("n"), quill_ast::BinaryOp::Lt, b.int("0"))], &[]),
                b.case(&[], &[]),
                b.case(&[], &[]),
            ],
        );
        check(&mut c, &b, &[], &[n, m]);
        assert!(c.diagnostics().contains("Multiple `default` clauses in `match` statement"));
        assert_eq!(c.diagnostics().error_count(), 1, "{}", c.diagnostics());
    }

    #[test]
    fn type_match_over_union_pointer() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let shape = b.type_decl(
            "Shape",
            b.union_type(&[
                b.field(&["Circle"], b.struct_type(&[b.field(&["r"], b.ident("f32"))])),
                b.field(&["Square"], b.struct_type(&[b.field(&["side"], b.ident("f32"))])),
            ]),
        );
        let s = b.var_decl(&["s"], Some(b.pointer_type(b.ident("Shape"))), &[]);
        let circle = b.case(&[b.selector(b.ident("Shape"), "Circle")], &[]);
        let m = b.type_match(
            "v",
            b.ident("s"),
            &[
                circle,
                b.case(&[b.selector(b.ident("Shape"), "Circle")], &[]),
                b.case(&[b.ident("int")], &[]),
                b.case(&[], &[]),
            ],
        );
        check(&mut c, &b, &[shape], &[s, m]);
        assert!(c.diagnostics().contains("Duplicate type case `Circle`"));
        assert!(c.diagnostics().contains("`int` is not a variant of `Shape`"));
        assert_eq!(c.diagnostics().error_count(), 2, "{}", c.diagnostics());

        let bound = c.info().implicits[&circle.id];
        let ty = c.registry().entity_type(bound);
        assert_eq!(c.type_str(ty), "^Circle");
    }

    #[test]
    fn type_match_requires_a_union_pointer_or_any() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let n = b.var_decl(&["n"], Some(b.ident("int")), &[]);
        let bad = b.type_match("v", b.ident("n"), &[b.case(&[], &[])]);
        let a = b.var_decl(&["a"], Some(b.ident("any")), &[]);
        let ok = b.type_match("v", b.ident("a"), &[b.case(&[b.ident("int")], &[]), b.case(&[b.ident("string")], &[])]);
        check(&mut c, &b, &[], &[n, bad, a, ok]);
        assert!(c.diagnostics().contains("Unknown tag type, got `int`"));
        assert_eq!(c.diagnostics().error_count(), 1, "{}", c.diagnostics());
    }
}
