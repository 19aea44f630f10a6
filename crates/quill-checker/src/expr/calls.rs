//! Procedure calls.

use log::trace;
use quill_ast::{CallExpr, Expr};
use quill_core::ErrorKind;
use quill_registry::{TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

/// Why a call's arguments do not fit a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallArgumentError {
    None,
    WrongTypes,
    NonVariadicExpand,
    MultipleVariadicExpand,
    TooFewArguments,
    TooManyArguments,
}

impl<'ast> Checker<'ast> {
    pub(super) fn check_call_expr(&mut self, ce: &'ast CallExpr<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        let callee = self.check_expr_or_type(ce.callee);

        if callee.is_invalid() {
            for &arg in ce.args {
                self.check_expr_base(arg, None);
            }
            return Operand::invalid(Some(e));
        }

        match callee.mode {
            AddressingMode::Type => {
                let s = self.type_str(callee.ty);
                self.error(
                    ErrorKind::TypeMismatch,
                    ce.span,
                    format!("Expected a procedure, got a type `{s}`"),
                );
                return Operand::invalid(Some(e));
            }
            AddressingMode::Builtin(id) => return self.check_builtin_procedure(ce, e, id),
            AddressingMode::Overload(_) => {}
            AddressingMode::Value | AddressingMode::Variable
                if self.registry.is_type_proc(self.registry.base_type(callee.ty)) => {}
            _ => {
                self.error(
                    ErrorKind::TypeMismatch,
                    ce.callee.span(),
                    format!("Cannot call a non-procedure: `{}`", ce.callee),
                );
                return Operand::invalid(Some(e));
            }
        }

        let args = self.check_call_operands(ce);
        let proc_ty = match &callee.mode {
            AddressingMode::Overload(procs) => {
                let procs = procs.clone();
                self.resolve_overload(ce, &procs, &args)
            }
            _ => {
                self.check_call_arguments(ce, callee.ty, &args, true);
                callee.ty
            }
        };

        let Some(sig) = self.registry.proc_sig(self.registry.base_type(proc_ty)).cloned() else {
            return Operand::invalid(Some(e));
        };
        match (sig.result_count, sig.results) {
            (0, _) | (_, None) => Operand::new(AddressingMode::NoValue, TypeId::INVALID, e),
            (1, Some(results)) => {
                let ty = self
                    .registry
                    .tuple_vars(results)
                    .first()
                    .map_or(TypeId::INVALID, |&r| self.registry.entity_type(r));
                Operand::new(AddressingMode::Value, ty, e)
            }
            (_, Some(results)) => Operand::new(AddressingMode::Value, results, e),
        }
    }

    /// Evaluate every argument once. A multi-valued argument contributes one
    /// operand per value.
    fn check_call_operands(&mut self, ce: &'ast CallExpr<'ast>) -> Vec<Operand<'ast>> {
        let mut operands = Vec::with_capacity(ce.args.len());
        for &arg in ce.args {
            let o = self.check_multi_expr(arg);
            if !o.is_invalid() && self.registry.is_type_tuple(o.ty) {
                for &var in self.registry.tuple_vars(o.ty) {
                    operands.push(Operand {
                        mode: AddressingMode::Value,
                        ty: self.registry.entity_type(var),
                        ..o.clone()
                    });
                }
            } else {
                operands.push(o);
            }
        }
        operands
    }

    /// Match `operands` against the parameters of `proc_ty`.
    ///
    /// # Arguments
    ///
    /// * `show_error` - When unset nothing is reported or recorded; the
    ///   result and score are all that is computed. When set every argument
    ///   is finalized against its parameter and failures are reported.
    ///
    /// # Returns
    ///
    /// The first problem found, and the summed argument scores.
    pub(crate) fn check_call_arguments(
        &mut self,
        ce: &'ast CallExpr<'ast>,
        proc_ty: TypeId,
        operands: &[Operand<'ast>],
        show_error: bool,
    ) -> (CallArgumentError, i64) {
        let Some(sig) = self.registry.proc_sig(self.registry.base_type(proc_ty)).cloned() else {
            return (CallArgumentError::WrongTypes, 0);
        };
        let params: Vec<TypeId> = sig
            .params
            .map(|p| {
                self.registry
                    .tuple_vars(p)
                    .iter()
                    .map(|&v| self.registry.entity_type(v))
                    .collect()
            })
            .unwrap_or_default();
        let variadic = sig.variadic;
        let param_count = if variadic { params.len().saturating_sub(1) } else { params.len() };
        let mut score = 0i64;

        if let Some(ellipsis) = ce.ellipsis {
            if !variadic {
                if show_error {
                    self.error(
                        ErrorKind::Arity,
                        ellipsis,
                        format!("Cannot use `..` in call to a non-variadic procedure: `{}`", ce.callee),
                    );
                }
                return (CallArgumentError::NonVariadicExpand, score);
            }
        }

        if operands.is_empty() && param_count == 0 {
            return (CallArgumentError::None, score);
        }

        let count_error = if operands.len() < param_count {
            Some((CallArgumentError::TooFewArguments, "Too few"))
        } else if !variadic && operands.len() > param_count {
            Some((CallArgumentError::TooManyArguments, "Too many"))
        } else {
            None
        };
        if let Some((err, what)) = count_error {
            if show_error {
                self.error(
                    ErrorKind::Arity,
                    ce.span,
                    format!("{what} arguments for `{}`, expected {param_count} arguments", ce.callee),
                );
            }
            return (err, score);
        }

        let mut err = CallArgumentError::None;
        for (o, &param) in operands.iter().zip(&params[..param_count]) {
            if !self.check_argument(o, param, show_error, &mut score) {
                err = CallArgumentError::WrongTypes;
            }
        }

        if variadic {
            let slice = params[param_count];
            let elem = match self.registry.ty(self.registry.base_type(slice)).kind {
                TypeKind::Slice(elem) => elem,
                _ => TypeId::INVALID,
            };
            for (index, o) in operands.iter().enumerate().skip(param_count) {
                let target = if ce.ellipsis.is_some() {
                    if index != param_count {
                        if show_error {
                            let span = o.expr.map(|x| x.span()).unwrap_or(ce.span);
                            self.error(
                                ErrorKind::Arity,
                                span,
                                "`..` in a variadic procedure can only have one variadic argument at the end",
                            );
                        }
                        return (CallArgumentError::MultipleVariadicExpand, score);
                    }
                    slice
                } else {
                    elem
                };
                if !self.check_argument(o, target, show_error, &mut score) {
                    err = CallArgumentError::WrongTypes;
                }
            }
        }

        trace!("arguments of `{}` scored {score}", ce.callee);
        (err, score)
    }

    fn check_argument(&mut self, o: &Operand<'ast>, param: TypeId, show_error: bool, score: &mut i64) -> bool {
        let fits = match self.assignment_score(o, param) {
            Some(s) => {
                *score = score.saturating_add(s);
                true
            }
            None => false,
        };
        if show_error {
            let mut o = o.clone();
            self.check_assignment(&mut o, Some(param), "argument");
        }
        fits
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;
    use quill_registry::Entity;

    use super::*;
    use crate::config::CheckerConfig;

    fn declare_proc<'a>(c: &mut Checker<'a>, name: &str, ty: Expr<'a>) {
        if c.current_scope() == c.registry().universal() {
            let parent = c.current_scope();
            let scope = c.registry_mut().new_scope(Some(parent));
            c.set_scope(scope);
        }
        let ty = c.check_type(ty);
        let scope = c.current_scope();
        let p = c.registry_mut().add_entity(Entity::procedure(name, Default::default(), Some(ty)));
        c.add_entity(scope, None, p);
    }

    /// A call in statement position, where no value is required.
    fn call_stmt<'a>(c: &mut Checker<'a>, e: Expr<'a>) -> Operand<'a> {
        c.check_expr_base(e, None)
    }

    #[test]
    fn results_decide_the_mode() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        declare_proc(&mut c, "none", b.proc_type(&[], &[]));
        declare_proc(&mut c, "one", b.proc_type(&[], &[b.result(b.ident("int"))]));
        declare_proc(
            &mut c,
            "two",
            b.proc_type(&[], &[b.result(b.ident("int")), b.result(b.ident("bool"))]),
        );
        assert_eq!(call_stmt(&mut c, b.call(b.ident("none"), &[])).mode, AddressingMode::NoValue);
        assert_eq!(c.check_expr(b.call(b.ident("one"), &[])).ty, TypeId::INT);
        let pair = c.check_multi_expr(b.call(b.ident("two"), &[]));
        assert_eq!(c.registry().tuple_vars(pair.ty).len(), 2);
    }

    #[test]
    fn argument_count_and_types() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        declare_proc(&mut c, "f", b.proc_type(&[b.field(&["a", "b"], b.ident("int"))], &[]));
        call_stmt(&mut c, b.call(b.ident("f"), &[b.int("1")]));
        assert!(c.diagnostics().contains("Too few arguments for `f`, expected 2 arguments"));
        call_stmt(&mut c, b.call(b.ident("f"), &[b.int("1"), b.int("2"), b.int("3")]));
        assert!(c.diagnostics().contains("Too many arguments for `f`, expected 2 arguments"));
        call_stmt(&mut c, b.call(b.ident("f"), &[b.int("1"), b.str("x")]));
        assert!(c.diagnostics().contains("in argument"));
    }

    #[test]
    fn untyped_arguments_take_the_parameter_type() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        declare_proc(&mut c, "f", b.proc_type(&[b.field(&["x"], b.ident("f32"))], &[]));
        let arg = b.int("1");
        call_stmt(&mut c, b.call(b.ident("f"), &[arg]));
        assert_eq!(c.info().types[&arg.id()].ty, Some(TypeId::F32));
    }

    #[test]
    fn variadic_calls() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        declare_proc(&mut c, "sum", b.proc_type(&[b.variadic_param("xs", b.ident("int"))], &[]));
        declare_proc(&mut c, "g", b.proc_type(&[b.field(&["x"], b.ident("int"))], &[]));
        call_stmt(&mut c, b.call(b.ident("sum"), &[b.int("1"), b.int("2"), b.int("3")]));
        call_stmt(&mut c, b.call(b.ident("sum"), &[]));
        assert!(!c.diagnostics().has_errors(), "{}", c.diagnostics());

        call_stmt(&mut c, b.call_spread(b.ident("g"), &[b.int("1")]));
        assert!(c.diagnostics().contains("Cannot use `..` in call to a non-variadic procedure: `g`"));
    }

    #[test]
    fn calling_non_procedures() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        c.check_multi_expr(b.call(b.ident("int"), &[]));
        assert!(c.diagnostics().contains("Expected a procedure, got a type `int`"));
        c.check_multi_expr(b.call(b.int("1"), &[]));
        assert!(c.diagnostics().contains("Cannot call a non-procedure: `1`"));
    }

    #[test]
    fn overloads_pick_the_closest_signature() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        declare_proc(
            &mut c,
            "p",
            b.proc_type(&[b.field(&["x"], b.ident("int"))], &[b.result(b.ident("int"))]),
        );
        declare_proc(
            &mut c,
            "p",
            b.proc_type(&[b.field(&["x"], b.ident("f32"))], &[b.result(b.ident("f32"))]),
        );
        let scope = c.current_scope();
        let v = c.registry_mut().add_entity(Entity::variable("v", Default::default(), Some(TypeId::F32)));
        c.add_entity(scope, None, v);
        let o = c.check_expr(b.call(b.ident("p"), &[b.ident("v")]));
        assert_eq!(o.ty, TypeId::F32);

        c.check_expr(b.call(b.ident("p"), &[b.str("s")]));
        assert!(c.diagnostics().contains("No overloads for `p` that match with the given arguments"));
    }

    #[test]
    fn equal_scores_are_ambiguous() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        declare_proc(&mut c, "q", b.proc_type(&[b.field(&["x"], b.ident("i32"))], &[]));
        declare_proc(&mut c, "q", b.proc_type(&[b.field(&["x"], b.ident("i64"))], &[]));
        call_stmt(&mut c, b.call(b.ident("q"), &[b.int("1")]));
        assert!(c.diagnostics().contains("Ambiguous procedure call `q`, could be:\n\tq :: proc(i32)"));
    }

    #[test]
    fn invalid_argument_skips_overload_resolution() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        declare_proc(&mut c, "f", b.proc_type(&[b.field(&["x"], b.ident("int"))], &[b.result(b.ident("int"))]));
        declare_proc(&mut c, "f", b.proc_type(&[b.field(&["x"], b.ident("f64"))], &[b.result(b.ident("f64"))]));
        let o = c.check_expr(b.call(b.ident("f"), &[b.ident("nope")]));
        assert!(o.is_invalid());
        assert!(c.diagnostics().contains("Undeclared name: nope"));
        assert!(!c.diagnostics().contains("Ambiguous"));
        assert_eq!(c.diagnostics().error_count(), 1, "{}", c.diagnostics());
    }
}
