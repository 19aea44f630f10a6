//! Programmatic construction of syntax trees.
//!
//! [`AstBuilder`] allocates nodes into a [`Bump`] arena and hands out fresh
//! [`NodeId`]s. It stands in for the parser wherever trees are built by hand.
//! Spans are synthetic: every node is placed on the current line at the next
//! column, and [`AstBuilder::line`] moves to a new line.
//!
//! ```
//! use bumpalo::Bump;
//! use quill_ast::{AstBuilder, BinaryOp};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let sum = b.binary(b.ident("a"), BinaryOp::Add, b.int("1"));
//! assert_eq!(sum.to_string(), "a + 1");
//! ```

use std::cell::Cell;

use bumpalo::Bump;
use quill_core::{CallingConvention, FileId, NodeId, Span};

use crate::decl::{Decl, ImportDecl, ValueDecl};
use crate::expr::{
    BinaryExpr, CallExpr, CastExpr, CompoundLit, DerefExpr, Directive, DirectiveKind, Expr,
    FieldValue, IndexExpr, IntervalExpr, Literal, LiteralKind, ParenExpr, ProcLit, SelectorExpr,
    SliceExpr, TernaryExpr, UnaryExpr,
};
use crate::file::{Package, SourceFile};
use crate::ops::{AssignOp, BinaryOp, BranchKind, CastKind, UnaryOp};
use crate::stmt::{
    AssignStmt, Block, BranchStmt, CaseClause, DeferStmt, EmptyStmt, ExprStmt, ForStmt, IfStmt,
    MatchStmt, RangeStmt, ReturnStmt, Stmt, StmtStateFlags, TypeMatchStmt, UsingStmt, WhenStmt,
};
use crate::types::{
    ArrayCount, ArrayType, EnumField, EnumType, FieldDecl, MapType, ProcType, RecordType,
    TypeExpr, TypeExprKind, VectorType,
};
use crate::Ident;

/// Builds arena-allocated AST nodes with unique ids.
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    next_id: Cell<u32>,
    file: Cell<FileId>,
    line: Cell<u32>,
    col: Cell<u32>,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            next_id: Cell::new(0),
            file: Cell::new(FileId::default()),
            line: Cell::new(1),
            col: Cell::new(1),
        }
    }

    pub fn arena(&self) -> &'ast Bump {
        self.arena
    }

    /// Attribute subsequently built nodes to `file`, starting at line 1.
    pub fn in_file(&self, file: FileId) -> &Self {
        self.file.set(file);
        self.line(1)
    }

    /// Place subsequently built nodes on `line`, starting at column 1.
    pub fn line(&self, line: u32) -> &Self {
        self.line.set(line);
        self.col.set(1);
        self
    }

    /// Number of node ids handed out so far.
    pub fn node_count(&self) -> u32 {
        self.next_id.get()
    }

    fn next(&self) -> (NodeId, Span) {
        let id = NodeId::new(self.next_id.get());
        self.next_id.set(id.index() + 1);
        let col = self.col.get();
        self.col.set(col + 1);
        (id, Span::new(self.line.get(), col, 1).in_file(self.file.get()))
    }

    fn slice<T: Copy>(&self, items: &[T]) -> &'ast [T] {
        self.arena.alloc_slice_copy(items)
    }

    fn idents(&self, names: &[&str]) -> &'ast [Ident<'ast>] {
        self.arena
            .alloc_slice_fill_iter(names.iter().map(|name| self.name(name)))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// An identifier node.
    pub fn name(&self, name: &str) -> Ident<'ast> {
        let (id, span) = self.next();
        Ident::new(self.arena.alloc_str(name), id, span)
    }

    pub fn ident(&self, name: &str) -> Expr<'ast> {
        Expr::Ident(self.name(name))
    }

    pub fn literal(&self, kind: LiteralKind, text: &str) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Literal(self.arena.alloc(Literal {
            kind,
            text: self.arena.alloc_str(text),
            id,
            span,
        }))
    }

    pub fn int(&self, text: &str) -> Expr<'ast> {
        self.literal(LiteralKind::Integer, text)
    }

    pub fn float(&self, text: &str) -> Expr<'ast> {
        self.literal(LiteralKind::Float, text)
    }

    pub fn str(&self, text: &str) -> Expr<'ast> {
        self.literal(LiteralKind::String, text)
    }

    pub fn rune(&self, text: &str) -> Expr<'ast> {
        self.literal(LiteralKind::Rune, text)
    }

    pub fn directive(&self, kind: DirectiveKind) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Directive(self.arena.alloc(Directive { kind, id, span }))
    }

    pub fn paren(&self, expr: Expr<'ast>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Paren(self.arena.alloc(ParenExpr { expr, id, span }))
    }

    pub fn unary(&self, op: UnaryOp, operand: Expr<'ast>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Unary(self.arena.alloc(UnaryExpr {
            op,
            operand,
            id,
            span,
        }))
    }

    pub fn binary(&self, left: Expr<'ast>, op: BinaryOp, right: Expr<'ast>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Binary(self.arena.alloc(BinaryExpr {
            left,
            op,
            right,
            id,
            span,
        }))
    }

    pub fn ternary(&self, cond: Expr<'ast>, then_expr: Expr<'ast>, else_expr: Expr<'ast>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Ternary(self.arena.alloc(TernaryExpr {
            cond,
            then_expr,
            else_expr,
            id,
            span,
        }))
    }

    pub fn selector(&self, base: Expr<'ast>, field: &str) -> Expr<'ast> {
        let field = self.name(field);
        let (id, span) = self.next();
        Expr::Selector(self.arena.alloc(SelectorExpr {
            base,
            field,
            id,
            span,
        }))
    }

    pub fn index(&self, base: Expr<'ast>, index: Expr<'ast>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Index(self.arena.alloc(IndexExpr {
            base,
            index: Some(index),
            id,
            span,
        }))
    }

    pub fn slice_expr(&self, base: Expr<'ast>, low: Option<Expr<'ast>>, high: Option<Expr<'ast>>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Slice(self.arena.alloc(SliceExpr {
            base,
            low,
            high,
            id,
            span,
        }))
    }

    pub fn deref(&self, base: Expr<'ast>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Deref(self.arena.alloc(DerefExpr { base, id, span }))
    }

    pub fn call(&self, callee: Expr<'ast>, args: &[Expr<'ast>]) -> Expr<'ast> {
        self.make_call(callee, args, false)
    }

    /// A call whose last argument is spread with `..`.
    pub fn call_spread(&self, callee: Expr<'ast>, args: &[Expr<'ast>]) -> Expr<'ast> {
        self.make_call(callee, args, true)
    }

    fn make_call(&self, callee: Expr<'ast>, args: &[Expr<'ast>], spread: bool) -> Expr<'ast> {
        let args = self.slice(args);
        let (id, span) = self.next();
        let ellipsis = spread.then(|| self.next().1);
        let close = self.next().1;
        Expr::Call(self.arena.alloc(CallExpr {
            callee,
            args,
            ellipsis,
            id,
            span,
            close,
        }))
    }

    pub fn cast(&self, kind: CastKind, ty: Expr<'ast>, expr: Expr<'ast>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Cast(self.arena.alloc(CastExpr {
            kind,
            ty,
            expr,
            id,
            span,
        }))
    }

    pub fn interval(&self, low: Expr<'ast>, high: Expr<'ast>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Interval(self.arena.alloc(IntervalExpr { low, high, id, span }))
    }

    pub fn compound(&self, ty: Option<Expr<'ast>>, elems: &[Expr<'ast>]) -> Expr<'ast> {
        let elems = self.slice(elems);
        let (id, span) = self.next();
        let close = self.next().1;
        Expr::CompoundLit(self.arena.alloc(CompoundLit {
            ty,
            elems,
            id,
            span,
            close,
        }))
    }

    /// `name = value` inside a compound literal.
    pub fn field_value(&self, name: &str, value: Expr<'ast>) -> Expr<'ast> {
        let field = self.ident(name);
        let (id, span) = self.next();
        Expr::FieldValue(self.arena.alloc(FieldValue {
            field,
            value,
            id,
            span,
        }))
    }

    pub fn proc_lit(&self, ty: Expr<'ast>, body: Option<&'ast Block<'ast>>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::ProcLit(self.arena.alloc(ProcLit { ty, body, id, span }))
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn type_expr(&self, kind: TypeExprKind<'ast>) -> Expr<'ast> {
        let (id, span) = self.next();
        Expr::Type(self.arena.alloc(TypeExpr { kind, id, span }))
    }

    pub fn pointer_type(&self, elem: Expr<'ast>) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Pointer(elem))
    }

    pub fn array_type(&self, count: Expr<'ast>, elem: Expr<'ast>) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Array(ArrayType {
            count: ArrayCount::Expr(count),
            elem,
        }))
    }

    /// `[..]T`
    pub fn inferred_array_type(&self, elem: Expr<'ast>) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Array(ArrayType {
            count: ArrayCount::Infer,
            elem,
        }))
    }

    pub fn dynamic_array_type(&self, elem: Expr<'ast>) -> Expr<'ast> {
        self.type_expr(TypeExprKind::DynamicArray(elem))
    }

    pub fn slice_type(&self, elem: Expr<'ast>) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Slice(elem))
    }

    pub fn vector_type(&self, count: Expr<'ast>, elem: Expr<'ast>) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Vector(VectorType { count, elem }))
    }

    pub fn map_type(&self, key: Expr<'ast>, value: Expr<'ast>) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Map(MapType {
            count: None,
            key,
            value,
        }))
    }

    pub fn struct_type(&self, fields: &[FieldDecl<'ast>]) -> Expr<'ast> {
        self.struct_type_with(fields, false, false, None)
    }

    pub fn struct_type_with(
        &self,
        fields: &[FieldDecl<'ast>],
        is_packed: bool,
        is_ordered: bool,
        align: Option<Expr<'ast>>,
    ) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Struct(RecordType {
            fields: self.slice(fields),
            is_packed,
            is_ordered,
            align,
        }))
    }

    pub fn union_type(&self, variants: &[FieldDecl<'ast>]) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Union(self.record(variants)))
    }

    pub fn raw_union_type(&self, fields: &[FieldDecl<'ast>]) -> Expr<'ast> {
        self.type_expr(TypeExprKind::RawUnion(self.record(fields)))
    }

    fn record(&self, fields: &[FieldDecl<'ast>]) -> RecordType<'ast> {
        RecordType {
            fields: self.slice(fields),
            is_packed: false,
            is_ordered: false,
            align: None,
        }
    }

    pub fn enum_type(&self, base: Option<Expr<'ast>>, fields: &[EnumField<'ast>]) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Enum(EnumType {
            base,
            fields: self.slice(fields),
        }))
    }

    pub fn enum_field(&self, name: &str, value: Option<Expr<'ast>>) -> EnumField<'ast> {
        let name = self.name(name);
        let (id, span) = self.next();
        EnumField {
            name,
            value,
            id,
            span,
        }
    }

    pub fn proc_type(&self, params: &[FieldDecl<'ast>], results: &[FieldDecl<'ast>]) -> Expr<'ast> {
        self.proc_type_with(params, results, CallingConvention::Quill)
    }

    pub fn proc_type_with(
        &self,
        params: &[FieldDecl<'ast>],
        results: &[FieldDecl<'ast>],
        convention: CallingConvention,
    ) -> Expr<'ast> {
        self.type_expr(TypeExprKind::Proc(ProcType {
            params: self.slice(params),
            results: self.slice(results),
            convention,
        }))
    }

    /// `a, b: T`
    pub fn field(&self, names: &[&str], ty: Expr<'ast>) -> FieldDecl<'ast> {
        self.make_field(names, ty, false, false)
    }

    /// `using name: T`
    pub fn using_field(&self, name: &str, ty: Expr<'ast>) -> FieldDecl<'ast> {
        self.make_field(&[name], ty, true, false)
    }

    /// `name: ..T`
    pub fn variadic_param(&self, name: &str, ty: Expr<'ast>) -> FieldDecl<'ast> {
        self.make_field(&[name], ty, false, true)
    }

    /// An unnamed result.
    pub fn result(&self, ty: Expr<'ast>) -> FieldDecl<'ast> {
        self.make_field(&[], ty, false, false)
    }

    fn make_field(&self, names: &[&str], ty: Expr<'ast>, is_using: bool, is_variadic: bool) -> FieldDecl<'ast> {
        let names = self.idents(names);
        let (id, span) = self.next();
        FieldDecl {
            names,
            ty,
            is_using,
            is_variadic,
            is_immutable: false,
            id,
            span,
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn empty(&self) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::Empty(EmptyStmt { id, span })
    }

    pub fn expr_stmt(&self, expr: Expr<'ast>) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::Expr(self.arena.alloc(ExprStmt { expr, id, span }))
    }

    pub fn assign(&self, lhs: &[Expr<'ast>], rhs: &[Expr<'ast>]) -> Stmt<'ast> {
        self.op_assign(AssignOp::Assign, lhs, rhs)
    }

    pub fn op_assign(&self, op: AssignOp, lhs: &[Expr<'ast>], rhs: &[Expr<'ast>]) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::Assign(self.arena.alloc(AssignStmt {
            op,
            lhs: self.slice(lhs),
            rhs: self.slice(rhs),
            id,
            span,
        }))
    }

    pub fn block(&self, stmts: &[Stmt<'ast>]) -> &'ast Block<'ast> {
        self.block_with(stmts, StmtStateFlags::empty())
    }

    pub fn block_with(&self, stmts: &[Stmt<'ast>], state: StmtStateFlags) -> &'ast Block<'ast> {
        let stmts = self.slice(stmts);
        let (id, span) = self.next();
        let close = self.next().1;
        self.arena.alloc(Block {
            stmts,
            state,
            id,
            span,
            close,
        })
    }

    pub fn block_stmt(&self, stmts: &[Stmt<'ast>]) -> Stmt<'ast> {
        Stmt::Block(self.block(stmts))
    }

    pub fn if_stmt(
        &self,
        init: Option<Stmt<'ast>>,
        cond: Expr<'ast>,
        body: &'ast Block<'ast>,
        else_stmt: Option<Stmt<'ast>>,
    ) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::If(self.arena.alloc(IfStmt {
            init,
            cond,
            body,
            else_stmt,
            id,
            span,
        }))
    }

    pub fn when_stmt(&self, cond: Expr<'ast>, body: &'ast Block<'ast>, else_stmt: Option<Stmt<'ast>>) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::When(self.arena.alloc(WhenStmt {
            cond,
            body,
            else_stmt,
            id,
            span,
        }))
    }

    pub fn ret(&self, results: &[Expr<'ast>]) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::Return(self.arena.alloc(ReturnStmt {
            results: self.slice(results),
            id,
            span,
        }))
    }

    pub fn for_stmt(
        &self,
        init: Option<Stmt<'ast>>,
        cond: Option<Expr<'ast>>,
        post: Option<Stmt<'ast>>,
        body: &'ast Block<'ast>,
    ) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::For(self.arena.alloc(ForStmt {
            init,
            cond,
            post,
            body,
            id,
            span,
        }))
    }

    pub fn range(
        &self,
        value: Option<&str>,
        index: Option<&str>,
        expr: Expr<'ast>,
        body: &'ast Block<'ast>,
    ) -> Stmt<'ast> {
        let value = value.map(|name| self.name(name));
        let index = index.map(|name| self.name(name));
        let (id, span) = self.next();
        Stmt::Range(self.arena.alloc(RangeStmt {
            value,
            index,
            expr,
            body,
            id,
            span,
        }))
    }

    /// `case list: stmts`; pass an empty list for `default`.
    pub fn case(&self, list: &[Expr<'ast>], stmts: &[Stmt<'ast>]) -> CaseClause<'ast> {
        let (id, span) = self.next();
        CaseClause {
            list: self.slice(list),
            stmts: self.slice(stmts),
            id,
            span,
        }
    }

    pub fn match_stmt(
        &self,
        init: Option<Stmt<'ast>>,
        tag: Option<Expr<'ast>>,
        clauses: &[CaseClause<'ast>],
    ) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::Match(self.arena.alloc(MatchStmt {
            init,
            tag,
            clauses: self.slice(clauses),
            id,
            span,
        }))
    }

    pub fn type_match(&self, var: &str, tag: Expr<'ast>, clauses: &[CaseClause<'ast>]) -> Stmt<'ast> {
        let var = self.name(var);
        let (id, span) = self.next();
        Stmt::TypeMatch(self.arena.alloc(TypeMatchStmt {
            var,
            tag,
            clauses: self.slice(clauses),
            id,
            span,
        }))
    }

    pub fn defer(&self, stmt: Stmt<'ast>) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::Defer(self.arena.alloc(DeferStmt { stmt, id, span }))
    }

    pub fn branch(&self, kind: BranchKind) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::Branch(self.arena.alloc(BranchStmt { kind, id, span }))
    }

    pub fn using(&self, exprs: &[Expr<'ast>]) -> Stmt<'ast> {
        let (id, span) = self.next();
        Stmt::Using(self.arena.alloc(UsingStmt {
            exprs: self.slice(exprs),
            id,
            span,
        }))
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn value_decl(
        &self,
        is_var: bool,
        is_using: bool,
        names: &[&str],
        ty: Option<Expr<'ast>>,
        values: &[Expr<'ast>],
    ) -> Stmt<'ast> {
        let names = self.idents(names);
        let (id, span) = self.next();
        Stmt::Decl(Decl::Value(self.arena.alloc(ValueDecl {
            is_var,
            is_using,
            names,
            ty,
            values: self.slice(values),
            id,
            span,
        })))
    }

    /// `names: ty = values`, or `names := values` without a type.
    pub fn var_decl(&self, names: &[&str], ty: Option<Expr<'ast>>, values: &[Expr<'ast>]) -> Stmt<'ast> {
        self.value_decl(true, false, names, ty, values)
    }

    /// `using name: ty = values`
    pub fn using_var_decl(&self, name: &str, ty: Option<Expr<'ast>>, values: &[Expr<'ast>]) -> Stmt<'ast> {
        self.value_decl(true, true, &[name], ty, values)
    }

    /// `names :: values`
    pub fn const_decl(&self, names: &[&str], ty: Option<Expr<'ast>>, values: &[Expr<'ast>]) -> Stmt<'ast> {
        self.value_decl(false, false, names, ty, values)
    }

    /// `name :: ty`
    pub fn type_decl(&self, name: &str, ty: Expr<'ast>) -> Stmt<'ast> {
        self.const_decl(&[name], None, &[ty])
    }

    /// `name :: proc(params) -> results { body }`
    pub fn proc_decl(
        &self,
        name: &str,
        params: &[FieldDecl<'ast>],
        results: &[FieldDecl<'ast>],
        body: &[Stmt<'ast>],
    ) -> Stmt<'ast> {
        let ty = self.proc_type(params, results);
        let body = self.block(body);
        let lit = self.proc_lit(ty, Some(body));
        self.const_decl(&[name], None, &[lit])
    }

    pub fn import(&self, path: &str, alias: Option<&str>) -> Stmt<'ast> {
        let alias = alias.map(|name| self.name(name));
        let (id, span) = self.next();
        Stmt::Decl(Decl::Import(self.arena.alloc(ImportDecl {
            path: self.arena.alloc_str(path),
            alias,
            id,
            span,
        })))
    }

    // ========================================================================
    // Files
    // ========================================================================

    pub fn source_file(&self, file: FileId, name: &str, decls: &[Stmt<'ast>]) -> SourceFile<'ast> {
        SourceFile {
            file,
            name: self.arena.alloc_str(name),
            decls: self.slice(decls),
        }
    }

    pub fn package(&self, name: &str, files: &[SourceFile<'ast>]) -> Package<'ast> {
        Package {
            name: self.arena.alloc_str(name),
            files: self.slice(files),
        }
    }
}
