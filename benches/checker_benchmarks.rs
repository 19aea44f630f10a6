//! Performance benchmarks for checking whole packages.
//!
//! Every workload is a synthetic package built with the AST builder, so the
//! numbers cover checking alone:
//! - Overloads: many calls through a small overload set
//! - Layout: many struct declarations whose sizes are queried
//! - Mixed: both, spread over four files
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to record the checker entry
//! points as puffin scopes, one frame per iteration:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- "overloads"
//! ```

use bumpalo::Bump;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quill::ast::{AstBuilder, BinaryOp, Stmt};
use quill::{CheckerConfig, FileId, Package, TypeId, Unit};
use std::hint::black_box;

const SIZES: [usize; 3] = [10, 100, 1000];

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// `add` overloaded on `int`, `f64` and `string`. Overloads live in a
/// procedure scope.
fn overload_set<'a>(b: &AstBuilder<'a>) -> Vec<Stmt<'a>> {
    let sum = |ty: &str| {
        b.proc_decl(
            "add",
            &[b.field(&["x", "y"], b.ident(ty))],
            &[b.result(b.ident(ty))],
            &[b.ret(&[b.binary(b.ident("x"), BinaryOp::Add, b.ident("y"))])],
        )
    };
    let string_add = b.proc_decl(
        "add",
        &[b.field(&["x", "y"], b.ident("string"))],
        &[b.result(b.ident("string"))],
        &[b.ret(&[b.ident("x")])],
    );
    vec![sum("int"), sum("f64"), string_add]
}

/// A procedure declaring the overload set and making `calls` calls to each
/// overload.
fn overload_calls<'a>(b: &AstBuilder<'a>, name: &str, calls: usize) -> Stmt<'a> {
    let mut body = overload_set(b);
    body.reserve(calls * 3);
    for i in 0..calls {
        let n = i.to_string();
        let int_call = b.call(b.ident("add"), &[b.int(&n), b.int("1")]);
        let float_call = b.call(b.ident("add"), &[b.float("1.5"), b.float("0.25")]);
        let string_call = b.call(b.ident("add"), &[b.str("a"), b.str("b")]);
        body.push(b.var_decl(&[format!("i{i}").as_str()], None, &[int_call]));
        body.push(b.var_decl(&[format!("f{i}").as_str()], None, &[float_call]));
        body.push(b.var_decl(&[format!("s{i}").as_str()], None, &[string_call]));
    }
    b.proc_decl(name, &[], &[], &body)
}

/// `count` struct declarations. All but the first embed the first one.
fn struct_decls<'a>(b: &AstBuilder<'a>, count: usize) -> Vec<Stmt<'a>> {
    (0..count)
        .map(|i| {
            let name = format!("Node{i}");
            let mut fields = vec![
                b.field(&[format!("id{i}").as_str()], b.ident("i64")),
                b.field(&[format!("flag{i}").as_str()], b.ident("bool")),
                b.field(&[format!("weight{i}").as_str()], b.ident("f32")),
                b.field(&[format!("name{i}").as_str()], b.ident("string")),
                b.field(&[format!("next{i}").as_str()], b.pointer_type(b.ident(&name))),
                b.field(&[format!("small{i}").as_str()], b.ident("i8")),
            ];
            if i > 0 {
                fields.push(b.using_field("root", b.ident("Node0")));
            }
            b.type_decl(&name, b.struct_type(&fields))
        })
        .collect()
}

fn package<'a>(b: &AstBuilder<'a>, file: FileId, decls: &[Stmt<'a>]) -> Package<'a> {
    b.package("bench", &[b.source_file(file, "bench.ql", decls)])
}

fn overload_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("checker/overloads");
    for calls in SIZES {
        group.throughput(Throughput::Elements((calls * 3) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(calls), &calls, |bench, &calls| {
            bench.iter(|| {
                let arena = Bump::new();
                let b = AstBuilder::new(&arena);
                let mut unit = Unit::new(&arena, CheckerConfig::default());
                let file = unit.add_file("bench.ql");
                let decls = [overload_calls(&b, "run", black_box(calls))];
                unit.add_package(package(&b, file, &decls)).unwrap();
                unit.check().unwrap();
                end_profiling_frame();
                black_box(unit.checker().info().types.len())
            });
        });
    }
    group.finish();
}

fn layout_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("checker/layout");
    for count in SIZES {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bench, &count| {
            bench.iter(|| {
                let arena = Bump::new();
                let b = AstBuilder::new(&arena);
                let mut unit = Unit::new(&arena, CheckerConfig::default());
                let file = unit.add_file("bench.ql");
                let decls = struct_decls(&b, black_box(count));
                unit.add_package(package(&b, file, &decls)).unwrap();
                unit.check().unwrap();

                let checker = unit.checker_mut();
                let scope = checker.package_scope("bench").unwrap();
                let last = format!("Node{}", count - 1);
                let entity = checker.registry().lookup_in_package(scope, &last).unwrap();
                let ty: TypeId = checker.registry().entity_type(entity);
                let size = checker.registry_mut().size_of(ty).unwrap();
                end_profiling_frame();
                black_box(size)
            });
        });
    }
    group.finish();
}

fn mixed_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("checker/mixed");
    group.bench_function("four_files", |bench| {
        bench.iter(|| {
            let arena = Bump::new();
            let b = AstBuilder::new(&arena);
            let mut unit = Unit::new(&arena, CheckerConfig::default());
            let files: Vec<FileId> = (0..4).map(|i| unit.add_file(format!("part{i}.ql"))).collect();

            let structs = struct_decls(&b, 50);
            let run_a = [overload_calls(&b, "run_a", 50)];
            let run_b = [overload_calls(&b, "run_b", 50)];
            let run_c = [overload_calls(&b, "run_c", 50)];
            let sources = [
                b.source_file(files[0], "part0.ql", &structs),
                b.source_file(files[1], "part1.ql", &run_a),
                b.source_file(files[2], "part2.ql", &run_b),
                b.source_file(files[3], "part3.ql", &run_c),
            ];
            unit.add_package(b.package("bench", &sources)).unwrap();
            unit.check().unwrap();
            end_profiling_frame();
            black_box(unit.checker().info().checked_procs.len())
        });
    });
    group.finish();
}

criterion_group!(benches, overload_benchmarks, layout_benchmarks, mixed_benchmarks);
criterion_main!(benches);
