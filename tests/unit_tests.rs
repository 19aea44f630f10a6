//! End-to-end checks of whole packages, plus property tests for the
//! representability, identity and layout rules.

use bumpalo::Bump;
use proptest::prelude::*;
use quill::ast::{AstBuilder, CastKind, Expr, Stmt};
use quill::checker::{ValidCandidate, best_candidates, distance_score};
use quill::{AddressingMode, Checker, CheckerConfig, EntityId, ExactValue, Operand, TypeId, Unit};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Check `decls` as the single file of package `main`.
fn check_decls<'a>(arena: &'a Bump, b: &AstBuilder<'a>, decls: &[Stmt<'a>]) -> Unit<'a> {
    init_logging();
    let mut unit = Unit::new(arena, CheckerConfig::default());
    let file = unit.add_file("main.ql");
    unit.add_package(b.package("main", &[b.source_file(file, "main.ql", decls)]))
        .unwrap();
    let _ = unit.check();
    unit
}

fn global(unit: &Unit<'_>, name: &str) -> EntityId {
    let checker = unit.checker();
    let scope = checker.package_scope("main").unwrap();
    checker
        .registry()
        .lookup_in_package(scope, name)
        .unwrap_or_else(|| panic!("`{name}` is not declared"))
}

fn global_type(unit: &Unit<'_>, name: &str) -> TypeId {
    unit.checker().registry().entity_type(global(unit, name))
}

fn type_name(unit: &Unit<'_>, ty: TypeId) -> String {
    unit.checker().registry().type_to_string(ty)
}

/// Offsets of a struct's fields, in declaration order.
fn src_offsets(checker: &mut Checker<'_>, ty: TypeId) -> Vec<(String, i64)> {
    let base = checker.registry().base_type(ty);
    let fields = checker.registry().record(base).unwrap().fields_in_src_order.clone();
    fields
        .into_iter()
        .map(|f| {
            let field = checker.registry().entity(f);
            let (name, index) = (field.name.clone(), field.field_index().unwrap());
            (name, checker.registry_mut().offset_of(base, index).unwrap())
        })
        .collect()
}

// =============================================================================
// Untyped constants
// =============================================================================

#[test]
fn literal_stays_untyped_until_assigned() {
    init_logging();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let mut c = Checker::new(&arena, CheckerConfig::default());

    let five = b.int("5");
    let mut o = c.check_expr(five);
    assert_eq!(o.ty, TypeId::UNTYPED_INTEGER);
    assert_eq!(o.value, ExactValue::Integer(5));
    assert_eq!(c.info().type_of(five), Some(TypeId::UNTYPED_INTEGER));
    assert!(c.info().untyped.contains_key(&five.id()));

    c.check_assignment(&mut o, Some(TypeId::INT), "variable declaration");
    assert_eq!(o.ty, TypeId::INT);
    assert!(!c.info().untyped.contains_key(&five.id()));
    assert_eq!(c.info().type_of(five), Some(TypeId::INT));
}

#[test]
fn typed_declaration_finalizes_its_literal() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let five = b.int("5");
    let unit = check_decls(&arena, &b, &[b.var_decl(&["x"], Some(b.ident("int")), &[five])]);

    assert!(!unit.diagnostics().has_errors(), "{}", unit.diagnostics());
    assert_eq!(global_type(&unit, "x"), TypeId::INT);
    let info = unit.checker().info();
    assert_eq!(info.type_of(five), Some(TypeId::INT));
    assert_eq!(info.type_and_value_of(five).unwrap().value, ExactValue::Integer(5));
    assert!(info.untyped.is_empty());
}

#[test]
fn out_of_range_literal_is_rejected() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = check_decls(&arena, &b, &[b.var_decl(&["x"], Some(b.ident("u8")), &[b.int("256")])]);
    assert!(unit.diagnostics().contains("`256 = 256` overflows `u8`"), "{}", unit.diagnostics());
}

// =============================================================================
// Layout
// =============================================================================

#[test]
fn struct_layout_reorders_for_padding() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let rec = b.type_decl(
        "Rec",
        b.struct_type(&[
            b.field(&["a"], b.ident("i64")),
            b.field(&["b"], b.ident("i8")),
            b.field(&["c"], b.ident("i64")),
        ]),
    );
    let mut unit = check_decls(&arena, &b, &[rec]);
    assert!(!unit.diagnostics().has_errors(), "{}", unit.diagnostics());

    let ty = global_type(&unit, "Rec");
    let checker = unit.checker_mut();
    let base = checker.registry().base_type(ty);
    let order: Vec<String> = checker
        .registry()
        .record(base)
        .unwrap()
        .fields
        .iter()
        .map(|&f| checker.registry().entity(f).name.clone())
        .collect();
    assert_eq!(order, ["a", "c", "b"]);

    let offsets = src_offsets(checker, ty);
    assert_eq!(
        offsets,
        [("a".to_string(), 0), ("b".to_string(), 16), ("c".to_string(), 8)]
    );
    assert_eq!(checker.registry_mut().size_of(ty).unwrap(), 24);
    assert_eq!(checker.registry_mut().align_of(ty).unwrap(), 8);
}

#[test]
fn struct_containing_itself_is_cyclic() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let node = b.type_decl("Loop", b.struct_type(&[b.field(&["next"], b.ident("Loop"))]));
    let mut unit = check_decls(&arena, &b, &[node]);
    assert!(unit.diagnostics().contains("Illegal declaration cycle of `Loop`"));
    assert_eq!(unit.diagnostics().error_count(), 1);

    // The failed type is sized as zero rather than reported again
    let ty = global_type(&unit, "Loop");
    assert_eq!(unit.checker_mut().registry_mut().size_of(ty), Ok(0));
}

// =============================================================================
// Calls and overloads
// =============================================================================

fn overloaded_f<'a>(b: &AstBuilder<'a>, param: &str) -> Stmt<'a> {
    b.proc_decl(
        "f",
        &[b.field(&["x"], b.ident(param))],
        &[b.result(b.ident(param))],
        &[b.ret(&[b.ident("x")])],
    )
}

/// `main :: proc() { body }`. Overloads can only be declared in a local scope.
fn in_main<'a>(b: &AstBuilder<'a>, body: &[Stmt<'a>]) -> Stmt<'a> {
    b.proc_decl("main", &[], &[], body)
}

#[test]
fn untyped_integer_picks_the_integer_overload() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let call = b.call(b.ident("f"), &[b.int("3")]);
    let body = [
        overloaded_f(&b, "int"),
        overloaded_f(&b, "f64"),
        b.var_decl(&["r"], None, &[call]),
    ];
    let unit = check_decls(&arena, &b, &[in_main(&b, &body)]);

    assert!(!unit.diagnostics().has_errors(), "{}", unit.diagnostics());
    assert_eq!(unit.checker().info().type_of(call), Some(TypeId::INT));
}

#[test]
fn untyped_float_picks_the_float_overload() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let call = b.call(b.ident("f"), &[b.float("0.5")]);
    let body = [
        overloaded_f(&b, "int"),
        overloaded_f(&b, "f64"),
        b.var_decl(&["r"], None, &[call]),
    ];
    let unit = check_decls(&arena, &b, &[in_main(&b, &body)]);
    assert!(!unit.diagnostics().has_errors(), "{}", unit.diagnostics());
    assert_eq!(unit.checker().info().type_of(call), Some(TypeId::F64));
}

#[test]
fn equally_close_overloads_are_ambiguous() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = [
        overloaded_f(&b, "i32"),
        overloaded_f(&b, "i64"),
        b.var_decl(&["r"], None, &[b.call(b.ident("f"), &[b.int("1")])]),
    ];
    let unit = check_decls(&arena, &b, &[in_main(&b, &body)]);
    assert!(unit.diagnostics().contains("Ambiguous procedure call `f`, could be:"));
    assert!(unit.diagnostics().contains("f :: proc(i32)"));
    assert!(unit.diagnostics().contains("f :: proc(i64)"));
}

#[test]
fn global_procedures_cannot_overload() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let decls = [overloaded_f(&b, "int"), overloaded_f(&b, "f64")];
    let unit = check_decls(&arena, &b, &decls);
    assert!(unit.diagnostics().contains("Redeclaration of `f` in this scope"));
}

#[test]
fn invalid_argument_to_an_overloaded_call_is_reported_once() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let body = [
        overloaded_f(&b, "int"),
        overloaded_f(&b, "f64"),
        b.var_decl(&["r"], None, &[b.call(b.ident("f"), &[b.ident("nope")])]),
    ];
    let unit = check_decls(&arena, &b, &[in_main(&b, &body)]);
    assert!(unit.diagnostics().contains("Undeclared name: nope"));
    assert!(!unit.diagnostics().contains("Ambiguous"));
    assert_eq!(unit.diagnostics().error_count(), 1, "{}", unit.diagnostics());
}

#[test]
fn tied_top_scores_are_both_reported() {
    let valid = vec![
        ValidCandidate { index: 0, score: 900_000 },
        ValidCandidate { index: 1, score: 900_000 },
        ValidCandidate { index: 2, score: 500_000 },
    ];
    let best = best_candidates(valid);
    let indices: Vec<usize> = best.iter().map(|c| c.index).collect();
    assert_eq!(indices, [0, 1]);
}

#[test]
fn score_saturates_for_large_distances() {
    assert_eq!(distance_score(0), 1_000_000);
    assert_eq!(distance_score(1), 999_999);
    assert_eq!(distance_score(1000), 0);
    assert_eq!(distance_score(5000), distance_score(2000));
}

#[test]
fn multi_valued_call_splices_into_declarations() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let pair = b.proc_decl(
        "pair",
        &[],
        &[b.result(b.ident("int")), b.result(b.ident("int"))],
        &[b.ret(&[b.int("1"), b.int("2")])],
    );
    let both = b.var_decl(&["a", "b"], None, &[b.call(b.ident("pair"), &[])]);
    let single = b.var_decl(&["c"], None, &[b.call(b.ident("pair"), &[])]);
    let unit = check_decls(&arena, &b, &[pair, both, single]);

    assert_eq!(global_type(&unit, "a"), TypeId::INT);
    assert_eq!(global_type(&unit, "b"), TypeId::INT);
    assert!(unit.diagnostics().contains("Assignment count mismatch `c` = `pair()`"));
    assert_eq!(unit.diagnostics().error_count(), 1, "{}", unit.diagnostics());
}

// =============================================================================
// Enums, unions and subtyping
// =============================================================================

#[test]
fn enum_values_count_from_zero() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let color = b.type_decl(
        "Color",
        b.enum_type(
            None,
            &[b.enum_field("Red", None), b.enum_field("Green", None), b.enum_field("Blue", None)],
        ),
    );
    let n = b.const_decl(&["N"], None, &[b.selector(b.ident("Color"), "count")]);
    let g = b.const_decl(&["G"], None, &[b.selector(b.ident("Color"), "Green")]);
    let unit = check_decls(&arena, &b, &[color, n, g]);
    assert!(!unit.diagnostics().has_errors(), "{}", unit.diagnostics());

    let checker = unit.checker();
    let ty = global_type(&unit, "Color");
    let base = checker.registry().base_type(ty);
    let values: Vec<(String, i64)> = checker
        .registry()
        .record(base)
        .unwrap()
        .fields
        .iter()
        .map(|&f| {
            let e = checker.registry().entity(f);
            (e.name.clone(), e.constant_value().and_then(ExactValue::as_integer).unwrap())
        })
        .collect();
    assert_eq!(
        values,
        [("Red".to_string(), 0), ("Green".to_string(), 1), ("Blue".to_string(), 2)]
    );
    assert_eq!(checker.constant_value_of(global(&unit, "N")), Some(&ExactValue::Integer(3)));
    assert_eq!(checker.constant_value_of(global(&unit, "G")), Some(&ExactValue::Integer(1)));
    assert_eq!(type_name(&unit, global_type(&unit, "G")), "Color");
}

#[test]
fn union_cast_requires_a_variant() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let value = b.type_decl(
        "Value",
        b.union_type(&[b.field(&["I"], b.ident("int")), b.field(&["F"], b.ident("f32"))]),
    );
    let v = b.var_decl(&["v"], Some(b.ident("Value")), &[]);
    let good = b.var_decl(
        &["i", "ok"],
        None,
        &[b.cast(CastKind::UnionCast, b.selector(b.ident("Value"), "I"), b.ident("v"))],
    );
    let bad = b.var_decl(
        &["n", "ok2"],
        None,
        &[b.cast(CastKind::UnionCast, b.ident("int"), b.ident("v"))],
    );
    let body = b.proc_decl("use_value", &[], &[], &[good, bad]);
    let unit = check_decls(&arena, &b, &[value, v, body]);

    assert!(unit.diagnostics().contains("Cannot `union_cast` `v` to `int`"), "{}", unit.diagnostics());
    assert_eq!(unit.diagnostics().error_count(), 1, "{}", unit.diagnostics());
}

#[test]
fn embedded_struct_is_a_subtype() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let entity = b.type_decl("Entity", b.struct_type(&[b.field(&["id"], b.ident("int"))]));
    let frog = b.type_decl(
        "Frog",
        b.struct_type(&[b.using_field("entity", b.ident("Entity")), b.field(&["jump"], b.ident("f32"))]),
    );
    let toad = b.type_decl(
        "Toad",
        b.struct_type(&[b.field(&["entity"], b.ident("Entity")), b.field(&["jump"], b.ident("f32"))]),
    );
    let mut unit = check_decls(&arena, &b, &[entity, frog, toad]);
    assert!(!unit.diagnostics().has_errors(), "{}", unit.diagnostics());

    let (entity, frog, toad) = (
        global_type(&unit, "Entity"),
        global_type(&unit, "Frog"),
        global_type(&unit, "Toad"),
    );
    let checker = unit.checker_mut();
    let frog_value = Operand::new(AddressingMode::Variable, frog, b.ident("frog"));
    assert_eq!(checker.distance_between(&frog_value, entity), 4);
    assert!(checker.is_assignable_to(&frog_value, entity));

    let toad_value = Operand::new(AddressingMode::Variable, toad, b.ident("toad"));
    assert_eq!(checker.distance_between(&toad_value, entity), -1);
    assert!(!checker.is_assignable_to(&toad_value, entity));
}

#[test]
fn using_pointer_to_own_type_still_reports_missing_fields() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let node = b.type_decl(
        "Node",
        b.struct_type(&[
            b.using_field("next", b.pointer_type(b.ident("Node"))),
            b.field(&["x"], b.ident("int")),
        ]),
    );
    let found = b.selector(b.ident("n"), "x");
    let body = [
        b.var_decl(&["n"], Some(b.ident("Node")), &[]),
        b.var_decl(&["y"], None, &[b.selector(b.ident("n"), "nope")]),
        b.var_decl(&["z"], None, &[found]),
    ];
    let unit = check_decls(&arena, &b, &[node, in_main(&b, &body)]);

    assert!(unit.diagnostics().contains("has no field `nope`"), "{}", unit.diagnostics());
    assert_eq!(unit.diagnostics().error_count(), 1, "{}", unit.diagnostics());
    assert_eq!(unit.checker().info().type_of(found), Some(TypeId::INT));
}

#[test]
fn map_index_unpacks_into_value_and_ok() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let m = b.var_decl(&["m"], Some(b.map_type(b.ident("string"), b.ident("int"))), &[]);
    let lookup = b.index(b.ident("m"), b.str("a"));
    let declared = b.var_decl(&["v", "ok"], None, &[lookup]);

    let again = b.index(b.ident("m"), b.str("b"));
    let body = [
        b.var_decl(&["w"], Some(b.ident("int")), &[]),
        b.var_decl(&["present"], Some(b.ident("bool")), &[]),
        b.assign(&[b.ident("w"), b.ident("present")], &[again]),
        b.var_decl(&["u"], None, &[b.index(b.ident("m"), b.str("c"))]),
    ];
    let unit = check_decls(&arena, &b, &[m, declared, in_main(&b, &body)]);

    assert!(!unit.diagnostics().has_errors(), "{}", unit.diagnostics());
    assert_eq!(global_type(&unit, "v"), TypeId::INT);
    assert_eq!(global_type(&unit, "ok"), TypeId::BOOL);
    let info = unit.checker().info();
    assert_eq!(info.types[&lookup.id()].mode, AddressingMode::OptionalOk);
    assert_eq!(info.types[&again.id()].mode, AddressingMode::OptionalOk);
}

#[test]
fn map_index_into_three_names_is_a_count_mismatch() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let m = b.var_decl(&["m"], Some(b.map_type(b.ident("string"), b.ident("int"))), &[]);
    let declared = b.var_decl(&["a", "b", "c"], None, &[b.index(b.ident("m"), b.str("k"))]);
    let unit = check_decls(&arena, &b, &[m, declared]);
    assert!(unit.diagnostics().contains("Assignment count mismatch `a, b, c` = `m[\"k\"]`"), "{}", unit.diagnostics());
}

#[test]
fn named_types_with_equal_structure_differ() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let a = b.type_decl("A", b.struct_type(&[b.field(&["x"], b.ident("int"))]));
    let bb = b.type_decl("B", b.struct_type(&[b.field(&["x"], b.ident("int"))]));
    let unit = check_decls(&arena, &b, &[a, bb]);

    let (a, bb) = (global_type(&unit, "A"), global_type(&unit, "B"));
    let reg = unit.checker().registry();
    assert!(!reg.are_types_identical(a, bb));
    assert!(reg.are_types_identical(reg.base_type(a), reg.base_type(bb)));
}

// =============================================================================
// Whole programs
// =============================================================================

#[test]
fn imported_package_is_reachable_through_its_name() {
    init_logging();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let mut unit = Unit::new(&arena, CheckerConfig::default().with_require_main(true));
    let app = unit.add_file("app.ql");
    let lib = unit.add_file("math.ql");

    let square = b.proc_decl(
        "square",
        &[b.field(&["x"], b.ident("int"))],
        &[b.result(b.ident("int"))],
        &[b.ret(&[b.binary(b.ident("x"), quill::ast::BinaryOp::Mul, b.ident("x"))])],
    );
    let body = [b.var_decl(&["y"], None, &[b.call(b.selector(b.ident("math"), "square"), &[b.int("4")])])];
    let app_decls = [b.import("math", None), b.proc_decl("main", &[], &[], &body)];

    unit.add_package(b.package("app", &[b.source_file(app, "app.ql", &app_decls)]))
        .unwrap();
    unit.add_package(b.package("math", &[b.source_file(lib, "math.ql", &[square])]))
        .unwrap();
    assert_eq!(unit.check(), Ok(()), "{}", unit.diagnostics());

    let output = unit.finish();
    let bodies: Vec<&str> = output.info.checked_procs.iter().map(|pb| pb.name.as_str()).collect();
    assert!(bodies.contains(&"main"));
    assert!(bodies.contains(&"square"));
}

#[test]
fn missing_return_is_reported() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let f = b.proc_decl("f", &[], &[b.result(b.ident("int"))], &[b.var_decl(&["x"], None, &[b.int("1")])]);
    let unit = check_decls(&arena, &b, &[f]);
    assert!(unit.diagnostics().contains("Missing return statement at the end of the procedure `f`"));
}

// =============================================================================
// Properties
// =============================================================================

/// Every sized integer type with its inclusive range.
const SIZED_INTEGERS: [(TypeId, i64, i64); 8] = [
    (TypeId::I8, i8::MIN as i64, i8::MAX as i64),
    (TypeId::U8, 0, u8::MAX as i64),
    (TypeId::I16, i16::MIN as i64, i16::MAX as i64),
    (TypeId::U16, 0, u16::MAX as i64),
    (TypeId::I32, i32::MIN as i64, i32::MAX as i64),
    (TypeId::U32, 0, u32::MAX as i64),
    (TypeId::I64, i64::MIN, i64::MAX),
    (TypeId::U64, 0, i64::MAX),
];

#[test]
fn integer_range_boundaries() {
    let arena = Bump::new();
    let c = Checker::new(&arena, CheckerConfig::default());
    for (ty, lo, hi) in SIZED_INTEGERS {
        for v in [lo, hi] {
            assert_eq!(
                c.representable_as_constant(&ExactValue::Integer(v), ty),
                Some(ExactValue::Integer(v)),
                "{v} in {ty:?}"
            );
        }
        if let Some(above) = hi.checked_add(1) {
            assert_eq!(c.representable_as_constant(&ExactValue::Integer(above), ty), None);
        }
        if let Some(below) = lo.checked_sub(1) {
            assert_eq!(c.representable_as_constant(&ExactValue::Integer(below), ty), None);
        }
    }
}

const BASICS: &[&str] = &["bool", "i8", "u16", "i32", "int", "f32", "f64", "string"];

const FIELD_TYPES: &[&str] = &["bool", "i8", "i16", "i32", "i64", "f32", "f64", "int", "string", "rawptr"];

/// A type expression shape, rendered into the AST by [`build`].
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Basic(&'static str),
    Pointer(Box<Shape>),
    Array(u8, Box<Shape>),
    Slice(Box<Shape>),
    Struct(Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop::sample::select(BASICS).prop_map(Shape::Basic);
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Pointer(Box::new(s))),
            (1u8..4, inner.clone()).prop_map(|(n, s)| Shape::Array(n, Box::new(s))),
            inner.clone().prop_map(|s| Shape::Slice(Box::new(s))),
            prop::collection::vec(inner, 1..4).prop_map(Shape::Struct),
        ]
    })
}

fn build<'a>(b: &AstBuilder<'a>, shape: &Shape) -> Expr<'a> {
    match shape {
        Shape::Basic(name) => b.ident(name),
        Shape::Pointer(elem) => b.pointer_type(build(b, elem)),
        Shape::Array(n, elem) => b.array_type(b.int(&n.to_string()), build(b, elem)),
        Shape::Slice(elem) => b.slice_type(build(b, elem)),
        Shape::Struct(fields) => {
            let fields: Vec<_> = fields
                .iter()
                .enumerate()
                .map(|(i, f)| b.field(&[format!("f{i}").as_str()], build(b, f)))
                .collect();
            b.struct_type(&fields)
        }
    }
}

proptest! {
    #[test]
    fn representable_iff_in_range(which in 0..SIZED_INTEGERS.len(), v in any::<i64>()) {
        let arena = Bump::new();
        let c = Checker::new(&arena, CheckerConfig::default());
        let (ty, lo, hi) = SIZED_INTEGERS[which];
        let converted = c.representable_as_constant(&ExactValue::Integer(v), ty);
        if (lo..=hi).contains(&v) {
            prop_assert_eq!(converted, Some(ExactValue::Integer(v)));
        } else {
            prop_assert_eq!(converted, None);
        }
    }

    #[test]
    fn identity_is_reflexive_and_symmetric(x in shape(), y in shape()) {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let x1 = c.check_type(build(&b, &x));
        let x2 = c.check_type(build(&b, &x));
        let y1 = c.check_type(build(&b, &y));
        prop_assert!(!c.diagnostics().has_errors(), "{}", c.diagnostics());

        let reg = c.registry();
        prop_assert!(reg.are_types_identical(x1, x1));
        prop_assert!(reg.are_types_identical(x1, x2));
        prop_assert!(reg.are_types_identical(x2, x1));
        prop_assert_eq!(reg.are_types_identical(x1, y1), reg.are_types_identical(y1, x1));
        prop_assert_eq!(reg.are_types_identical(x1, y1), x == y);
    }

    #[test]
    fn layout_is_idempotent(
        fields in prop::collection::vec(prop::sample::select(FIELD_TYPES), 1..8),
        packed in any::<bool>(),
    ) {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let decl = || {
            let fields: Vec<_> = fields
                .iter()
                .enumerate()
                .map(|(i, ty)| b.field(&[format!("f{i}").as_str()], b.ident(ty)))
                .collect();
            b.struct_type_with(&fields, packed, false, None)
        };
        let first = c.check_type(decl());
        let second = c.check_type(decl());

        let first_offsets = src_offsets(&mut c, first);
        let again = src_offsets(&mut c, first);
        prop_assert_eq!(&first_offsets, &again);
        prop_assert_eq!(&first_offsets, &src_offsets(&mut c, second));
        prop_assert_eq!(
            c.registry_mut().size_of(first).unwrap(),
            c.registry_mut().size_of(second).unwrap()
        );
        if packed {
            prop_assert!(first_offsets.windows(2).all(|w| w[0].1 <= w[1].1));
        }
    }
}
