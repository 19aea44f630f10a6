//! Procedure calling conventions.

use std::fmt;

/// How a procedure expects to be called.
///
/// Part of a procedure type's identity: two procedure types that differ only
/// in convention are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallingConvention {
    #[default]
    Quill,
    C,
    Std,
    Fast,
}

impl CallingConvention {
    /// The `#cc_*` tag spelling, empty for the native convention.
    pub fn tag(self) -> &'static str {
        match self {
            CallingConvention::Quill => "",
            CallingConvention::C => "#cc_c",
            CallingConvention::Std => "#cc_std",
            CallingConvention::Fast => "#cc_fast",
        }
    }
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::Quill => f.write_str("quill"),
            other => f.write_str(other.tag()),
        }
    }
}
