//! Bounds algebra benchmarks.

use compreq_core::{ceil, floor, get_bounds, parse_version, SpecifierSet, MINOR, REL_MAJOR};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_bounds(c: &mut Criterion) {
    let specifiers: SpecifierSet = ">=1.2.0,<3,!=1.5.1,!=2.0.0,>1.0,~=1.4,<=2.9,!=0.9"
        .parse()
        .expect("parse");

    c.bench_function("get_bounds", |b| {
        b.iter(|| get_bounds(black_box(&specifiers)));
    });

    let bounds = get_bounds(&specifiers).expect("bounds");
    c.bench_function("minimal_specifier_set", |b| {
        b.iter(|| black_box(&bounds).minimal_specifier_set(true));
    });
}

fn bench_rounding(c: &mut Criterion) {
    let version = parse_version("0.14.3rc2.dev1").expect("version");

    c.bench_function("ceil_rel_major", |b| {
        b.iter(|| ceil(REL_MAJOR, black_box(&version), false));
    });

    c.bench_function("floor_minor", |b| {
        b.iter(|| floor(MINOR, black_box(&version), true));
    });
}

criterion_group!(benches, bench_bounds, bench_rounding);
criterion_main!(benches);
