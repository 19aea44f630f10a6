//! Arena handles.
//!
//! Types, entities and scopes live in `Vec`-backed arenas inside the
//! [`Registry`](crate::Registry) and refer to each other through these
//! handles. Back-references (entity to scope, scope to parent) are plain
//! handles and never own anything.

use std::fmt;

use quill_core::BasicKind;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Handle to a [`Type`](crate::Type).
    TypeId,
    "t"
);
arena_id!(
    /// Handle to an [`Entity`](crate::Entity).
    EntityId,
    "e"
);
arena_id!(
    /// Handle to a [`Scope`](crate::Scope).
    ScopeId,
    "s"
);

/// Basic types occupy the first arena slots, in [`BasicKind`] order.
impl TypeId {
    pub const fn basic(kind: BasicKind) -> Self {
        Self(kind as u32)
    }

    pub const INVALID: TypeId = TypeId::basic(BasicKind::Invalid);
    pub const BOOL: TypeId = TypeId::basic(BasicKind::Bool);
    pub const I8: TypeId = TypeId::basic(BasicKind::I8);
    pub const U8: TypeId = TypeId::basic(BasicKind::U8);
    pub const I16: TypeId = TypeId::basic(BasicKind::I16);
    pub const U16: TypeId = TypeId::basic(BasicKind::U16);
    pub const I32: TypeId = TypeId::basic(BasicKind::I32);
    pub const U32: TypeId = TypeId::basic(BasicKind::U32);
    pub const I64: TypeId = TypeId::basic(BasicKind::I64);
    pub const U64: TypeId = TypeId::basic(BasicKind::U64);
    pub const F32: TypeId = TypeId::basic(BasicKind::F32);
    pub const F64: TypeId = TypeId::basic(BasicKind::F64);
    pub const INT: TypeId = TypeId::basic(BasicKind::Int);
    pub const UINT: TypeId = TypeId::basic(BasicKind::Uint);
    pub const RAWPTR: TypeId = TypeId::basic(BasicKind::Rawptr);
    pub const STRING: TypeId = TypeId::basic(BasicKind::String);
    pub const ANY: TypeId = TypeId::basic(BasicKind::Any);
    pub const UNTYPED_BOOL: TypeId = TypeId::basic(BasicKind::UntypedBool);
    pub const UNTYPED_INTEGER: TypeId = TypeId::basic(BasicKind::UntypedInteger);
    pub const UNTYPED_FLOAT: TypeId = TypeId::basic(BasicKind::UntypedFloat);
    pub const UNTYPED_STRING: TypeId = TypeId::basic(BasicKind::UntypedString);
    pub const UNTYPED_RUNE: TypeId = TypeId::basic(BasicKind::UntypedRune);
    pub const UNTYPED_NIL: TypeId = TypeId::basic(BasicKind::UntypedNil);

    /// `byte` is an alias of `u8`.
    pub const BYTE: TypeId = TypeId::U8;
    /// `rune` is an alias of `i32`.
    pub const RUNE: TypeId = TypeId::I32;

    pub fn is_invalid(self) -> bool {
        self == TypeId::INVALID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_ids_follow_kind_order() {
        for (i, kind) in BasicKind::ALL.iter().enumerate() {
            assert_eq!(TypeId::basic(*kind).index(), i);
        }
    }

    #[test]
    fn debug_uses_prefix() {
        assert_eq!(format!("{:?}", TypeId::new(3)), "t3");
        assert_eq!(format!("{:?}", EntityId::new(7)), "e7");
        assert_eq!(format!("{:?}", ScopeId::new(0)), "s0");
    }
}
