//! Source-like rendering of expressions for diagnostics.

use std::fmt::{self, Display, Formatter, Write};

use quill_core::CallingConvention;

use crate::expr::{DirectiveKind, Expr, LiteralKind};
use crate::types::{ArrayCount, FieldDecl, TypeExpr, TypeExprKind};

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for Expr<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(ident) => f.write_str(ident.name),
            Expr::Literal(lit) => match lit.kind {
                LiteralKind::String => write!(f, "\"{}\"", lit.text),
                LiteralKind::Rune => write!(f, "'{}'", lit.text),
                LiteralKind::Integer | LiteralKind::Float => f.write_str(lit.text),
            },
            Expr::Directive(d) => f.write_str(match d.kind {
                DirectiveKind::File => "#file",
                DirectiveKind::Line => "#line",
                DirectiveKind::Procedure => "#procedure",
            }),
            Expr::ProcLit(pl) => write!(f, "{}", pl.ty),
            Expr::CompoundLit(cl) => {
                if let Some(ty) = cl.ty {
                    write!(f, "{ty}")?;
                }
                f.write_char('{')?;
                write_list(f, cl.elems)?;
                f.write_char('}')
            }
            Expr::FieldValue(fv) => write!(f, "{} = {}", fv.field, fv.value),
            Expr::Paren(p) => write!(f, "({})", p.expr),
            Expr::Unary(u) => write!(f, "{}{}", u.op, u.operand),
            Expr::Binary(b) => write!(f, "{} {} {}", b.left, b.op, b.right),
            Expr::Ternary(t) => {
                write!(f, "if {} then {} else {}", t.cond, t.then_expr, t.else_expr)
            }
            Expr::Selector(s) => write!(f, "{}.{}", s.base, s.field.name),
            Expr::Index(ix) => match ix.index {
                Some(index) => write!(f, "{}[{}]", ix.base, index),
                None => write!(f, "{}[]", ix.base),
            },
            Expr::Slice(s) => {
                write!(f, "{}[", s.base)?;
                if let Some(low) = s.low {
                    write!(f, "{low}")?;
                }
                f.write_char(':')?;
                if let Some(high) = s.high {
                    write!(f, "{high}")?;
                }
                f.write_char(']')
            }
            Expr::Deref(d) => write!(f, "{}^", d.base),
            Expr::Call(c) => {
                write!(f, "{}(", c.callee)?;
                write_list(f, c.args)?;
                if c.ellipsis.is_some() {
                    f.write_str("..")?;
                }
                f.write_char(')')
            }
            Expr::Cast(c) => write!(f, "{}({}){}", c.kind.keyword(), c.ty, c.expr),
            Expr::Interval(i) => write!(f, "{} ..< {}", i.low, i.high),
            Expr::Type(t) => write!(f, "{t}"),
        }
    }
}

impl Display for FieldDecl<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_using {
            f.write_str("using ")?;
        }
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name.name)?;
        }
        if !self.names.is_empty() {
            f.write_str(": ")?;
        }
        if self.is_variadic {
            f.write_str("..")?;
        }
        write!(f, "{}", self.ty)
    }
}

impl Display for TypeExpr<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeExprKind::Pointer(elem) => write!(f, "^{elem}"),
            TypeExprKind::Array(at) => match at.count {
                ArrayCount::Expr(count) => write!(f, "[{count}]{}", at.elem),
                ArrayCount::Infer => write!(f, "[..]{}", at.elem),
            },
            TypeExprKind::DynamicArray(elem) => write!(f, "[dynamic]{elem}"),
            TypeExprKind::Slice(elem) => write!(f, "[]{elem}"),
            TypeExprKind::Vector(vt) => write!(f, "[vector {}]{}", vt.count, vt.elem),
            TypeExprKind::Map(mt) => match mt.count {
                Some(count) => write!(f, "map[{count}, {}]{}", mt.key, mt.value),
                None => write!(f, "map[{}]{}", mt.key, mt.value),
            },
            TypeExprKind::Struct(rt) => {
                f.write_str("struct ")?;
                if rt.is_packed {
                    f.write_str("#packed ")?;
                }
                if rt.is_ordered {
                    f.write_str("#ordered ")?;
                }
                if let Some(align) = rt.align {
                    write!(f, "#align {align} ")?;
                }
                f.write_char('{')?;
                write_list(f, rt.fields)?;
                f.write_char('}')
            }
            TypeExprKind::Union(rt) => {
                f.write_str("union {")?;
                write_list(f, rt.fields)?;
                f.write_char('}')
            }
            TypeExprKind::RawUnion(rt) => {
                f.write_str("raw_union {")?;
                write_list(f, rt.fields)?;
                f.write_char('}')
            }
            TypeExprKind::Enum(et) => {
                f.write_str("enum ")?;
                if let Some(base) = et.base {
                    write!(f, "{base} ")?;
                }
                f.write_char('{')?;
                for (i, field) in et.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(field.name.name)?;
                    if let Some(value) = field.value {
                        write!(f, " = {value}")?;
                    }
                }
                f.write_char('}')
            }
            TypeExprKind::Proc(pt) => {
                f.write_str("proc(")?;
                write_list(f, pt.params)?;
                f.write_char(')')?;
                match pt.results {
                    [] => {}
                    [single] if single.names.is_empty() => write!(f, " -> {single}")?,
                    results => {
                        f.write_str(" -> (")?;
                        write_list(f, results)?;
                        f.write_char(')')?;
                    }
                }
                if pt.convention != CallingConvention::Quill {
                    write!(f, " {}", pt.convention.tag())?;
                }
                Ok(())
            }
        }
    }
}
