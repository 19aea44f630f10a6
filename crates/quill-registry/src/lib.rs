//! Type, entity and scope storage for the Quill checker.
//!
//! This crate owns the data model the checker operates on:
//!
//! - [`Type`] and [`TypeKind`]: basic types, pointers, arrays, vectors, slices,
//!   dynamic arrays, maps, records, named types, tuples and procedures
//! - [`Entity`]: every declared name (constants, variables, type names,
//!   procedures, builtins, imports)
//! - [`Scope`]: lexical scopes with the lookup rules of the language
//!
//! All three live in the [`Registry`] arenas and are addressed by handles.
//! The registry also answers the type-level queries the checker needs:
//! classification predicates, identity, rendering, member lookup and layout.

mod builtins;
mod entity;
mod identity;
mod ids;
mod layout;
mod predicates;
mod registry;
mod scope;
mod selection;
mod type_string;
mod types;
mod universe;

pub use builtins::{BuiltinInfo, BuiltinKind, BuiltinProc};
pub use entity::{Entity, EntityFlags, EntityKind, OverloadKind};
pub use ids::{EntityId, ScopeId, TypeId};
pub use layout::{align_formula, TypeSizes};
pub use registry::Registry;
pub use scope::Scope;
pub use selection::Selection;
pub use types::{ProcOverloadKind, ProcSig, Record, RecordKind, Type, TypeKind};
