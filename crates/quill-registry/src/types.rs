//! The type model.
//!
//! Types are stored in the registry arena and referenced by [`TypeId`].
//! Structural kinds (pointers, slices, arrays, ...) are interned so that the
//! same shape always yields the same handle; records, named types, tuples and
//! procedures are always fresh.

use quill_core::{BasicKind, CallingConvention, NodeId};

use crate::ids::{EntityId, ScopeId, TypeId};

/// Which flavour of record a [`Record`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Struct,
    /// Tagged union; field 0 is the implicit "no value" variant
    Union,
    RawUnion,
    Enum,
}

/// A struct, union, raw_union or enum.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    /// Fields in layout order. For unions these are the variant type names,
    /// for enums the constants.
    pub fields: Vec<EntityId>,
    /// Fields in declaration order.
    pub fields_in_src_order: Vec<EntityId>,
    pub is_packed: bool,
    pub is_ordered: bool,
    /// `#align N`, zero when absent
    pub custom_align: i64,
    /// Scope holding the field names
    pub scope: Option<ScopeId>,
    /// Declaring node
    pub node: Option<NodeId>,
    pub enum_base: Option<TypeId>,
    pub enum_count: Option<EntityId>,
    pub enum_min_value: Option<EntityId>,
    pub enum_max_value: Option<EntityId>,
    /// Cached field offsets, in layout order
    pub offsets: Option<Vec<i64>>,
}

impl Record {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
            fields_in_src_order: Vec::new(),
            is_packed: false,
            is_ordered: false,
            custom_align: 0,
            scope: None,
            node: None,
            enum_base: None,
            enum_count: None,
            enum_min_value: None,
            enum_max_value: None,
            offsets: None,
        }
    }
}

/// A procedure signature.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcSig {
    /// Scope the parameters are declared in
    pub scope: Option<ScopeId>,
    /// Tuple of parameters, `None` when there are none
    pub params: Option<TypeId>,
    /// Tuple of results, `None` when there are none
    pub results: Option<TypeId>,
    pub param_count: usize,
    pub result_count: usize,
    /// The last parameter is a `..T` slice
    pub variadic: bool,
    pub convention: CallingConvention,
}

impl ProcSig {
    pub fn new(convention: CallingConvention) -> Self {
        Self {
            scope: None,
            params: None,
            results: None,
            param_count: 0,
            result_count: 0,
            variadic: false,
            convention,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Basic(BasicKind),
    Pointer(TypeId),
    Array {
        elem: TypeId,
        count: i64,
    },
    DynamicArray(TypeId),
    Vector {
        elem: TypeId,
        count: i64,
    },
    Slice(TypeId),
    Record(Record),
    /// A declared type name wrapping its base type
    Named {
        name: String,
        base: TypeId,
        type_name: Option<EntityId>,
    },
    /// Ordered list of variables, used for parameters, results and
    /// multi-valued expressions
    Tuple(Vec<EntityId>),
    Proc(ProcSig),
    Map {
        key: TypeId,
        value: TypeId,
        count: i64,
    },
}

/// A type in the registry arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    /// Set when sizing the type hit a declaration cycle; size and alignment
    /// are reported as zero from then on.
    pub failed: bool,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            failed: false,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match &self.kind {
            TypeKind::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_proc(&self) -> Option<&ProcSig> {
        match &self.kind {
            TypeKind::Proc(sig) => Some(sig),
            _ => None,
        }
    }
}

/// Key for interning structural types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CompositeKey {
    Pointer(TypeId),
    Array(TypeId, i64),
    DynamicArray(TypeId),
    Vector(TypeId, i64),
    Slice(TypeId),
    Map(TypeId, TypeId, i64),
}

/// Result of comparing two procedure types for overloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcOverloadKind {
    Identical,
    CallingConvention,
    ParamCount,
    ParamVariadic,
    ParamTypes,
    ResultCount,
    ResultTypes,
    NotProcedure,
}
