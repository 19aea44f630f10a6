//! Declaration nodes.

use quill_core::{NodeId, Span};

use crate::expr::Expr;
use crate::Ident;

/// A declaration, usable at file scope or as a statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decl<'ast> {
    /// `a, b: T = x, y` (variables) or `A :: x` (constants, types, procedures)
    Value(&'ast ValueDecl<'ast>),
    /// `import "path"`
    Import(&'ast ImportDecl<'ast>),
}

impl<'ast> Decl<'ast> {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Value(d) => d.id,
            Self::Import(d) => d.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Value(d) => d.span,
            Self::Import(d) => d.span,
        }
    }
}

/// A value declaration.
///
/// `is_var` distinguishes `x: T = v` / `x := v` from `X :: v`. A constant
/// declaration whose value is a type expression declares a type name; one
/// whose value is a procedure literal declares a procedure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueDecl<'ast> {
    pub is_var: bool,
    /// `using x: T`
    pub is_using: bool,
    pub names: &'ast [Ident<'ast>],
    pub ty: Option<Expr<'ast>>,
    pub values: &'ast [Expr<'ast>],
    pub id: NodeId,
    pub span: Span,
}

/// An import of another package.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportDecl<'ast> {
    pub path: &'ast str,
    /// `import name "path"`
    pub alias: Option<Ident<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

impl<'ast> ImportDecl<'ast> {
    /// Name the import is bound to: the alias, or the last path component.
    pub fn name(&self) -> &'ast str {
        match self.alias {
            Some(alias) => alias.name,
            None => self.path.rsplit('/').next().unwrap_or(self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_name_uses_last_component() {
        let decl = ImportDecl {
            path: "core/fmt",
            alias: None,
            id: NodeId::new(0),
            span: Span::default(),
        };
        assert_eq!(decl.name(), "fmt");
    }

    #[test]
    fn import_alias_wins() {
        let decl = ImportDecl {
            path: "core/fmt",
            alias: Some(Ident::new("f", NodeId::new(1), Span::default())),
            id: NodeId::new(0),
            span: Span::default(),
        };
        assert_eq!(decl.name(), "f");
    }
}
