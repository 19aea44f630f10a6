//! Named program entities.

use bitflags::bitflags;
use quill_core::{ExactValue, NodeId, Span};

use crate::builtins::BuiltinProc;
use crate::ids::{EntityId, ScopeId, TypeId};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u32 {
        /// Referenced at least once
        const USED        = 1 << 0;
        /// Fully checked; also marks enum constants as finished
        const VISITED     = 1 << 1;
        /// Embedded with `using`
        const ANONYMOUS   = 1 << 2;
        /// A struct or raw_union field
        const FIELD       = 1 << 3;
        /// A procedure parameter
        const PARAM       = 1 << 4;
        /// The `..T` parameter of a variadic procedure
        const ELLIPSIS    = 1 << 5;
        /// A vector component selected with `x`, `y`, `z` or `w`
        const VECTOR_ELEM = 1 << 6;
        /// `no_alias` parameter
        const NO_ALIAS    = 1 << 7;
    }
}

/// Whether a procedure entity belongs to an overload set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverloadKind {
    #[default]
    Unknown,
    No,
    Yes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Constant {
        value: ExactValue,
    },
    Variable {
        /// Index in the owning record's layout order, or parameter position
        field_index: usize,
        /// Index in declaration order
        field_src_index: usize,
        is_immutable: bool,
    },
    TypeName,
    Procedure {
        overload: OverloadKind,
    },
    Builtin(BuiltinProc),
    ImportName {
        path: String,
        /// Package scope of the imported package
        scope: ScopeId,
        used: bool,
    },
    LibraryName {
        path: String,
    },
    Nil,
    ImplicitValue,
    Label,
}

/// A declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    pub span: Span,
    /// Declaring scope; a non-owning back-reference
    pub scope: Option<ScopeId>,
    /// Resolved type, `None` until checked
    pub ty: Option<TypeId>,
    pub flags: EntityFlags,
    /// Identifier node that introduced the entity
    pub identifier: Option<NodeId>,
    /// Variable this one was promoted from by `using`
    pub using_parent: Option<EntityId>,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>, span: Span, ty: Option<TypeId>) -> Self {
        Self {
            kind,
            name: name.into(),
            span,
            scope: None,
            ty,
            flags: EntityFlags::empty(),
            identifier: None,
            using_parent: None,
        }
    }

    pub fn constant(name: impl Into<String>, span: Span, ty: Option<TypeId>, value: ExactValue) -> Self {
        Self::new(EntityKind::Constant { value }, name, span, ty)
    }

    pub fn variable(name: impl Into<String>, span: Span, ty: Option<TypeId>) -> Self {
        Self::new(
            EntityKind::Variable {
                field_index: 0,
                field_src_index: 0,
                is_immutable: false,
            },
            name,
            span,
            ty,
        )
    }

    /// A struct or raw_union field.
    pub fn field(name: impl Into<String>, span: Span, ty: TypeId, is_using: bool, field_index: usize) -> Self {
        let mut entity = Self::new(
            EntityKind::Variable {
                field_index,
                field_src_index: field_index,
                is_immutable: false,
            },
            name,
            span,
            Some(ty),
        );
        entity.flags |= EntityFlags::FIELD;
        if is_using {
            entity.flags |= EntityFlags::ANONYMOUS;
        }
        entity
    }

    /// A procedure parameter or result.
    pub fn param(name: impl Into<String>, span: Span, ty: TypeId, is_using: bool, is_immutable: bool) -> Self {
        let mut entity = Self::new(
            EntityKind::Variable {
                field_index: 0,
                field_src_index: 0,
                is_immutable,
            },
            name,
            span,
            Some(ty),
        );
        entity.flags |= EntityFlags::PARAM | EntityFlags::USED;
        if is_using {
            entity.flags |= EntityFlags::ANONYMOUS;
        }
        entity
    }

    pub fn type_name(name: impl Into<String>, span: Span, ty: Option<TypeId>) -> Self {
        Self::new(EntityKind::TypeName, name, span, ty)
    }

    pub fn procedure(name: impl Into<String>, span: Span, ty: Option<TypeId>) -> Self {
        Self::new(
            EntityKind::Procedure {
                overload: OverloadKind::Unknown,
            },
            name,
            span,
            ty,
        )
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, EntityKind::Variable { .. })
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self.kind, EntityKind::Procedure { .. })
    }

    pub fn is_type_name(&self) -> bool {
        matches!(self.kind, EntityKind::TypeName)
    }

    pub fn is_immutable(&self) -> bool {
        matches!(self.kind, EntityKind::Variable { is_immutable: true, .. })
    }

    pub fn constant_value(&self) -> Option<&ExactValue> {
        match &self.kind {
            EntityKind::Constant { value } => Some(value),
            _ => None,
        }
    }

    pub fn field_index(&self) -> Option<usize> {
        match self.kind {
            EntityKind::Variable { field_index, .. } => Some(field_index),
            _ => None,
        }
    }

    /// Kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EntityKind::Constant { .. } => "constant",
            EntityKind::Variable { .. } => "variable",
            EntityKind::TypeName => "type name",
            EntityKind::Procedure { .. } => "procedure",
            EntityKind::Builtin(_) => "builtin",
            EntityKind::ImportName { .. } => "import name",
            EntityKind::LibraryName { .. } => "library name",
            EntityKind::Nil => "nil",
            EntityKind::ImplicitValue => "implicit value",
            EntityKind::Label => "label",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_sets_flags() {
        let e = Entity::field("a", Span::default(), TypeId::INT, true, 2);
        assert!(e.flags.contains(EntityFlags::FIELD | EntityFlags::ANONYMOUS));
        assert_eq!(e.field_index(), Some(2));
    }

    #[test]
    fn param_is_used_and_may_be_immutable() {
        let e = Entity::param("x", Span::default(), TypeId::INT, false, true);
        assert!(e.flags.contains(EntityFlags::PARAM | EntityFlags::USED));
        assert!(e.is_immutable());
        assert!(e.is_variable());
    }

    #[test]
    fn blank_names() {
        assert!(Entity::variable("_", Span::default(), None).is_blank());
        assert!(!Entity::variable("x", Span::default(), None).is_blank());
    }
}
