//! Basic (built-in scalar) type kinds.
//!
//! The kind table mirrors the language's primitive types plus the six untyped
//! kinds that constants carry until they are finalized.

use bitflags::bitflags;

bitflags! {
    /// Properties of a basic kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BasicFlags: u32 {
        const BOOLEAN  = 1 << 0;
        const INTEGER  = 1 << 1;
        const UNSIGNED = 1 << 2;
        const FLOAT    = 1 << 3;
        const POINTER  = 1 << 4;
        const STRING   = 1 << 5;
        const RUNE     = 1 << 6;
        const UNTYPED  = 1 << 7;

        const NUMERIC       = Self::INTEGER.bits() | Self::FLOAT.bits();
        const ORDERED       = Self::NUMERIC.bits() | Self::STRING.bits() | Self::POINTER.bits();
        const CONSTANT_TYPE = Self::BOOLEAN.bits()
            | Self::NUMERIC.bits()
            | Self::POINTER.bits()
            | Self::STRING.bits()
            | Self::RUNE.bits();
    }
}

/// Kind of a basic type. The declaration order is significant: the untyped
/// numeric kinds are ordered so that promotion only ever moves upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicKind {
    Invalid,
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Int,
    Uint,
    Rawptr,
    String,
    Any,
    UntypedBool,
    UntypedInteger,
    UntypedFloat,
    UntypedString,
    UntypedRune,
    UntypedNil,
}

impl BasicKind {
    /// All kinds, in declaration order.
    pub const ALL: [BasicKind; 23] = [
        BasicKind::Invalid,
        BasicKind::Bool,
        BasicKind::I8,
        BasicKind::U8,
        BasicKind::I16,
        BasicKind::U16,
        BasicKind::I32,
        BasicKind::U32,
        BasicKind::I64,
        BasicKind::U64,
        BasicKind::F32,
        BasicKind::F64,
        BasicKind::Int,
        BasicKind::Uint,
        BasicKind::Rawptr,
        BasicKind::String,
        BasicKind::Any,
        BasicKind::UntypedBool,
        BasicKind::UntypedInteger,
        BasicKind::UntypedFloat,
        BasicKind::UntypedString,
        BasicKind::UntypedRune,
        BasicKind::UntypedNil,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Source-level name.
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::I8 => "i8",
            BasicKind::U8 => "u8",
            BasicKind::I16 => "i16",
            BasicKind::U16 => "u16",
            BasicKind::I32 => "i32",
            BasicKind::U32 => "u32",
            BasicKind::I64 => "i64",
            BasicKind::U64 => "u64",
            BasicKind::F32 => "f32",
            BasicKind::F64 => "f64",
            BasicKind::Int => "int",
            BasicKind::Uint => "uint",
            BasicKind::Rawptr => "rawptr",
            BasicKind::String => "string",
            BasicKind::Any => "any",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInteger => "untyped integer",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn flags(self) -> BasicFlags {
        match self {
            BasicKind::Invalid | BasicKind::Any => BasicFlags::empty(),
            BasicKind::Bool => BasicFlags::BOOLEAN,
            BasicKind::I8 | BasicKind::I16 | BasicKind::I32 | BasicKind::I64 | BasicKind::Int => {
                BasicFlags::INTEGER
            }
            BasicKind::U8
            | BasicKind::U16
            | BasicKind::U32
            | BasicKind::U64
            | BasicKind::Uint => BasicFlags::INTEGER | BasicFlags::UNSIGNED,
            BasicKind::F32 | BasicKind::F64 => BasicFlags::FLOAT,
            BasicKind::Rawptr => BasicFlags::POINTER,
            BasicKind::String => BasicFlags::STRING,
            BasicKind::UntypedBool => BasicFlags::BOOLEAN | BasicFlags::UNTYPED,
            BasicKind::UntypedInteger => BasicFlags::INTEGER | BasicFlags::UNTYPED,
            BasicKind::UntypedFloat => BasicFlags::FLOAT | BasicFlags::UNTYPED,
            BasicKind::UntypedString => BasicFlags::STRING | BasicFlags::UNTYPED,
            BasicKind::UntypedRune => BasicFlags::INTEGER | BasicFlags::UNTYPED,
            BasicKind::UntypedNil => BasicFlags::UNTYPED,
        }
    }

    /// Fixed size in bytes, or `None` when the size depends on the word size.
    ///
    /// Untyped kinds have no storage and report zero.
    pub fn fixed_size(self) -> Option<i64> {
        match self {
            BasicKind::Bool | BasicKind::I8 | BasicKind::U8 => Some(1),
            BasicKind::I16 | BasicKind::U16 => Some(2),
            BasicKind::I32 | BasicKind::U32 | BasicKind::F32 => Some(4),
            BasicKind::I64 | BasicKind::U64 | BasicKind::F64 => Some(8),
            BasicKind::Int | BasicKind::Uint | BasicKind::Rawptr => None,
            BasicKind::String | BasicKind::Any => None,
            _ => Some(0),
        }
    }

    /// Size in bytes for a target with the given word size.
    pub fn size(self, word_size: i64) -> i64 {
        match self {
            BasicKind::Int | BasicKind::Uint | BasicKind::Rawptr => word_size,
            BasicKind::String | BasicKind::Any => 2 * word_size,
            other => other.fixed_size().unwrap_or(0),
        }
    }

    pub fn is_untyped(self) -> bool {
        self.flags().contains(BasicFlags::UNTYPED)
    }
}
