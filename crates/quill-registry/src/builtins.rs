//! Builtin procedure descriptors.

/// Whether a builtin call may stand alone as a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Expr,
    Stmt,
}

/// Static description of a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinInfo {
    pub name: &'static str,
    /// Required argument count; the minimum when `variadic`
    pub arg_count: usize,
    pub variadic: bool,
    pub kind: BuiltinKind,
}

macro_rules! builtins {
    ($($variant:ident => $name:literal, $count:literal, $variadic:literal, $kind:ident;)*) => {
        /// Builtin procedures, in universe declaration order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum BuiltinProc {
            $($variant,)*
        }

        impl BuiltinProc {
            pub const ALL: &'static [BuiltinProc] = &[$(BuiltinProc::$variant,)*];

            pub fn info(self) -> BuiltinInfo {
                match self {
                    $(BuiltinProc::$variant => BuiltinInfo {
                        name: $name,
                        arg_count: $count,
                        variadic: $variadic,
                        kind: BuiltinKind::$kind,
                    },)*
                }
            }
        }
    };
}

builtins! {
    Len           => "len",              1, false, Expr;
    Cap           => "cap",              1, false, Expr;
    New           => "new",              1, false, Expr;
    Make          => "make",             1, true,  Expr;
    Free          => "free",             1, false, Stmt;
    Reserve       => "reserve",          2, false, Stmt;
    Clear         => "clear",            1, false, Stmt;
    Append        => "append",           1, true,  Expr;
    Delete        => "delete",           2, false, Stmt;
    SizeOf        => "size_of",          1, false, Expr;
    SizeOfVal     => "size_of_val",      1, false, Expr;
    AlignOf       => "align_of",         1, false, Expr;
    AlignOfVal    => "align_of_val",     1, false, Expr;
    OffsetOf      => "offset_of",        2, false, Expr;
    OffsetOfVal   => "offset_of_val",    1, false, Expr;
    TypeOfVal     => "type_of_val",      1, false, Expr;
    TypeInfo      => "type_info",        1, false, Expr;
    TypeInfoOfVal => "type_info_of_val", 1, false, Expr;
    CompileAssert => "compile_assert",   1, false, Expr;
    Assert        => "assert",           1, false, Expr;
    Panic         => "panic",            1, false, Stmt;
    Copy          => "copy",             2, false, Expr;
    Swizzle       => "swizzle",          1, true,  Expr;
    Min           => "min",              2, false, Expr;
    Max           => "max",              2, false, Expr;
    Abs           => "abs",              1, false, Expr;
    Clamp         => "clamp",            3, false, Expr;
    Transmute     => "transmute",        2, false, Expr;
}

impl BuiltinProc {
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Builtins whose first argument is a type rather than a value.
    pub fn takes_type_first(self) -> bool {
        matches!(
            self,
            BuiltinProc::New
                | BuiltinProc::Make
                | BuiltinProc::SizeOf
                | BuiltinProc::AlignOf
                | BuiltinProc::OffsetOf
                | BuiltinProc::TypeInfo
                | BuiltinProc::Transmute
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_consistent() {
        assert_eq!(BuiltinProc::ALL.len(), 28);
        assert_eq!(BuiltinProc::Clamp.info().arg_count, 3);
        assert!(BuiltinProc::Append.info().variadic);
        assert_eq!(BuiltinProc::Panic.info().kind, BuiltinKind::Stmt);
        assert_eq!(BuiltinProc::TypeInfoOfVal.name(), "type_info_of_val");
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = BuiltinProc::ALL.iter().map(|b| b.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BuiltinProc::ALL.len());
    }
}
