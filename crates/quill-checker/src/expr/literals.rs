//! Literals, directives and procedure literals.

use quill_ast::{Directive, DirectiveKind, Expr, Literal, LiteralKind, ProcLit};
use quill_core::{ErrorKind, ExactValue};
use quill_registry::TypeId;

use crate::checker::Checker;
use crate::info::ProcBody;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    /// Literals are untyped constants until context gives them a type.
    pub(super) fn check_basic_literal(&mut self, lit: &Literal<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        let (ty, value, what) = match lit.kind {
            LiteralKind::Integer => (TypeId::UNTYPED_INTEGER, ExactValue::integer_from_str(lit.text), "integer"),
            LiteralKind::Float => (TypeId::UNTYPED_FLOAT, ExactValue::float_from_str(lit.text), "float"),
            LiteralKind::String => (TypeId::UNTYPED_STRING, ExactValue::string(lit.text), "string"),
            LiteralKind::Rune => (TypeId::UNTYPED_RUNE, ExactValue::rune_from_str(lit.text), "rune"),
        };
        if value.is_invalid() {
            self.error(
                ErrorKind::Constant,
                lit.span,
                format!("Invalid {what} literal `{}`", lit.text),
            );
            return Operand::invalid(Some(e));
        }
        Operand::constant(ty, value, e)
    }

    pub(super) fn check_directive(&mut self, d: &Directive, e: Expr<'ast>) -> Operand<'ast> {
        match d.kind {
            DirectiveKind::File => {
                let name = self.diagnostics.file_name(d.span.file).to_string();
                Operand::constant(TypeId::UNTYPED_STRING, ExactValue::string(name), e)
            }
            DirectiveKind::Line => Operand::constant(
                TypeId::UNTYPED_INTEGER,
                ExactValue::Integer(i64::from(d.span.line)),
                e,
            ),
            DirectiveKind::Procedure => {
                if self.proc_stack.is_empty() {
                    self.error(
                        ErrorKind::SyntaxShape,
                        d.span,
                        "#procedure may only be used within procedures",
                    );
                    return Operand::invalid(Some(e));
                }
                let name = self.context.proc_name.clone().unwrap_or_default();
                Operand::constant(TypeId::UNTYPED_STRING, ExactValue::string(name), e)
            }
        }
    }

    /// An anonymous procedure. Its body is queued and checked after the
    /// enclosing declaration, like every other procedure body.
    pub(super) fn check_proc_lit(&mut self, pl: &'ast ProcLit<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        let ty = self.check_type(pl.ty);
        if ty == TypeId::INVALID {
            return Operand::invalid(Some(e));
        }
        if !self.registry.is_type_proc(ty) {
            self.error(ErrorKind::TypeMismatch, pl.span, format!("Invalid procedure literal `{e}`"));
            return Operand::invalid(Some(e));
        }
        if let Some(body) = pl.body {
            self.info.procs.push_back(ProcBody {
                name: String::new(),
                entity: None,
                decl: self.context.decl,
                ty,
                body,
                span: pl.span,
            });
        }
        Operand::new(AddressingMode::Value, ty, e)
    }
}
