//! Source files and packages, the unit the driver checks.

use quill_core::FileId;

use crate::stmt::Stmt;

/// One parsed source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceFile<'ast> {
    pub file: FileId,
    pub name: &'ast str,
    /// Top-level statements; anything but declarations is rejected
    pub decls: &'ast [Stmt<'ast>],
}

/// A package: files sharing one package scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Package<'ast> {
    pub name: &'ast str,
    pub files: &'ast [SourceFile<'ast>],
}
