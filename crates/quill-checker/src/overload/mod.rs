//! Overload resolution for calls through an overloaded procedure name.
//!
//! ## Algorithm
//!
//! 1. Check the declaration of every candidate so its signature is known
//! 2. Evaluate the call's arguments against each candidate silently,
//!    keeping the candidates that accept them with their summed scores
//! 3. Rank the valid candidates and keep those tied for the best score
//! 4. Report no match or an ambiguity, or bind the callee to the winner and
//!    re-run the argument check with errors enabled

mod ranking;

pub use ranking::{ValidCandidate, best_candidates};

use log::debug;
use quill_ast::{CallExpr, Expr};
use quill_core::ErrorKind;
use quill_registry::{EntityId, TypeId};

use crate::checker::Checker;
use crate::expr::CallArgumentError;
use crate::operand::Operand;

impl<'ast> Checker<'ast> {
    /// Pick the candidate of `procs` a call resolves to.
    ///
    /// # Returns
    ///
    /// The chosen procedure type, or [`TypeId::INVALID`] after reporting
    /// that no candidate or more than one matched. An invalid argument
    /// yields [`TypeId::INVALID`] without a further report.
    pub(crate) fn resolve_overload(
        &mut self,
        ce: &'ast CallExpr<'ast>,
        procs: &[EntityId],
        args: &[Operand<'ast>],
    ) -> TypeId {
        for &p in procs {
            self.check_entity_decl(p);
        }
        // A poisoned argument has been reported already and fits every candidate
        if args.iter().any(Operand::is_invalid) {
            return TypeId::INVALID;
        }
        let name = procs
            .first()
            .map(|&p| self.registry.entity(p).name.clone())
            .unwrap_or_default();

        let mut valid = Vec::new();
        for (index, &p) in procs.iter().enumerate() {
            let ty = self.registry.entity_type(p);
            if !self.registry.is_type_proc(ty) {
                continue;
            }
            let (err, score) = self.check_call_arguments(ce, ty, args, false);
            if err == CallArgumentError::None {
                valid.push(ValidCandidate { index, score });
            }
        }
        let best = best_candidates(valid);

        match best.as_slice() {
            [] => {
                self.error(
                    ErrorKind::Overload,
                    ce.callee.span(),
                    format!("No overloads for `{name}` that match with the given arguments"),
                );
                TypeId::INVALID
            }
            [winner] => {
                let entity = procs[winner.index];
                debug!("call to `{name}` resolved to {entity:?} with score {}", winner.score);
                if let Some(node) = callee_ident(ce.callee) {
                    self.add_entity_use(Some(node), entity);
                }
                let ty = self.registry.entity_type(entity);
                self.check_call_arguments(ce, ty, args, true);
                ty
            }
            tied => {
                let mut message = format!("Ambiguous procedure call `{name}`, could be:");
                for c in tied {
                    let p = self.registry.entity(procs[c.index]);
                    let (ty, span) = (p.ty.unwrap_or(TypeId::INVALID), p.span);
                    let t = self.type_str(ty);
                    let at = self.diagnostics.location(span);
                    message.push_str(&format!("\n\t{name} :: {t} at {at}"));
                }
                self.error(ErrorKind::Overload, ce.callee.span(), message);
                TypeId::INVALID
            }
        }
    }
}

/// Identifier node naming the callee, through selectors and parentheses.
fn callee_ident(e: Expr<'_>) -> Option<quill_core::NodeId> {
    match e.unparen() {
        Expr::Ident(ident) => Some(ident.id),
        Expr::Selector(s) => Some(s.field.id),
        _ => None,
    }
}
