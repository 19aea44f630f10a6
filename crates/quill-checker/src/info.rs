//! Side tables produced by checking.
//!
//! The AST is immutable, so every result is stored here keyed by [`NodeId`]:
//!
//! - `types`: final `(mode, type, value)` of each checked expression
//! - `definitions` / `uses`: identifier nodes to the entities they declare or
//!   refer to
//! - `scopes`: scope-introducing nodes to their scope
//! - `untyped`: expressions whose type is still untyped and may be finalized
//!   by later context
//! - `entities` / `decls`: the unchecked declaration of each global entity
//! - `type_info_types`: types that need a runtime type descriptor
//! - `procs`: procedure bodies waiting to be checked

use std::collections::VecDeque;

use quill_ast::{Block, Expr, ProcLit};
use quill_core::{ExactValue, NodeId, Span};
use quill_registry::{EntityId, ScopeId, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::operand::AddressingMode;

/// Recorded result of an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAndValue {
    pub mode: AddressingMode,
    /// `None` for expressions without a value, such as calls to procedures
    /// with no results
    pub ty: Option<TypeId>,
    pub value: ExactValue,
}

/// An expression whose type is still untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprInfo {
    /// Left operand of a shift whose type comes from context
    pub is_lhs: bool,
    pub mode: AddressingMode,
    pub ty: TypeId,
    pub value: ExactValue,
}

/// Handle of a [`DeclInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(u32);

impl DeclId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The unchecked declaration behind one or more entities.
#[derive(Debug, Clone)]
pub struct DeclInfo<'ast> {
    /// Scope the declaration is checked in
    pub scope: ScopeId,
    /// Enclosing declaration, for local declarations
    pub parent: Option<DeclId>,
    /// Entities sharing a multi-valued initializer, e.g. `a, b := f()`
    pub entities: Vec<EntityId>,
    pub type_expr: Option<Expr<'ast>>,
    pub init_expr: Option<Expr<'ast>>,
    /// Every initializer of a multi-valued declaration
    pub init_exprs: &'ast [Expr<'ast>],
    pub proc_lit: Option<&'ast ProcLit<'ast>>,
    /// Entities referenced while checking this declaration
    pub deps: FxHashSet<EntityId>,
}

impl<'ast> DeclInfo<'ast> {
    pub fn new(scope: ScopeId, parent: Option<DeclId>) -> Self {
        Self {
            scope,
            parent,
            entities: Vec::new(),
            type_expr: None,
            init_expr: None,
            init_exprs: &[],
            proc_lit: None,
            deps: FxHashSet::default(),
        }
    }
}

/// A procedure body queued for checking once all signatures are known.
#[derive(Debug, Clone)]
pub struct ProcBody<'ast> {
    pub name: String,
    pub entity: Option<EntityId>,
    pub decl: Option<DeclId>,
    pub ty: TypeId,
    pub body: &'ast Block<'ast>,
    pub span: Span,
}

/// Everything checking records for later stages.
#[derive(Debug, Default)]
pub struct CheckerInfo<'ast> {
    pub types: FxHashMap<NodeId, TypeAndValue>,
    pub definitions: FxHashMap<NodeId, Option<EntityId>>,
    pub uses: FxHashMap<NodeId, EntityId>,
    pub scopes: FxHashMap<NodeId, ScopeId>,
    pub untyped: FxHashMap<NodeId, ExprInfo>,
    pub entities: FxHashMap<EntityId, DeclId>,
    /// Global entities in collection order
    pub entity_order: Vec<EntityId>,
    pub decls: Vec<DeclInfo<'ast>>,
    /// Entities introduced without an identifier, e.g. type match variables
    pub implicits: FxHashMap<NodeId, EntityId>,
    pub type_info_types: Vec<TypeId>,
    pub type_info_map: FxHashMap<TypeId, usize>,
    /// Procedure bodies still to be checked
    pub procs: VecDeque<ProcBody<'ast>>,
    /// Procedure bodies already checked, in checking order
    pub checked_procs: Vec<ProcBody<'ast>>,
}

impl<'ast> CheckerInfo<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded result of an expression.
    pub fn type_and_value_of(&self, expr: Expr<'_>) -> Option<&TypeAndValue> {
        self.types.get(&expr.id())
    }

    /// Type of an expression, looking at untyped expressions as well.
    pub fn type_of(&self, expr: Expr<'_>) -> Option<TypeId> {
        let id = expr.id();
        if let Some(tv) = self.types.get(&id) {
            return tv.ty;
        }
        self.untyped.get(&id).map(|info| info.ty)
    }

    /// Entity an identifier node declares or refers to.
    pub fn entity_of_ident(&self, id: NodeId) -> Option<EntityId> {
        if let Some(&Some(e)) = self.definitions.get(&id) {
            return Some(e);
        }
        self.uses.get(&id).copied()
    }

    /// Scope introduced by a node.
    pub fn scope_of(&self, id: NodeId) -> Option<ScopeId> {
        self.scopes.get(&id).copied()
    }

    pub fn decl(&self, id: DeclId) -> &DeclInfo<'ast> {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut DeclInfo<'ast> {
        &mut self.decls[id.index()]
    }

    pub fn add_decl(&mut self, decl: DeclInfo<'ast>) -> DeclId {
        let id = DeclId::new(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    /// Record the result of an expression.
    pub fn add_type_and_value(&mut self, id: NodeId, mode: AddressingMode, ty: Option<TypeId>, value: ExactValue) {
        if mode == AddressingMode::Invalid {
            return;
        }
        self.types.insert(id, TypeAndValue { mode, ty, value });
    }

    pub fn add_untyped(&mut self, id: NodeId, is_lhs: bool, mode: AddressingMode, ty: TypeId, value: ExactValue) {
        self.untyped.insert(
            id,
            ExprInfo {
                is_lhs,
                mode,
                ty,
                value,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_results_are_not_recorded() {
        let mut info = CheckerInfo::new();
        info.add_type_and_value(NodeId::new(1), AddressingMode::Invalid, Some(TypeId::INT), ExactValue::Invalid);
        assert!(info.types.is_empty());
        info.add_type_and_value(NodeId::new(1), AddressingMode::Value, Some(TypeId::INT), ExactValue::Invalid);
        assert_eq!(info.types[&NodeId::new(1)].ty, Some(TypeId::INT));
    }

    #[test]
    fn definitions_win_over_uses() {
        let mut info = CheckerInfo::new();
        let id = NodeId::new(4);
        info.uses.insert(id, EntityId::new(2));
        assert_eq!(info.entity_of_ident(id), Some(EntityId::new(2)));
        info.definitions.insert(id, Some(EntityId::new(9)));
        assert_eq!(info.entity_of_ident(id), Some(EntityId::new(9)));
    }
}
