use criterion::{black_box, criterion_group, criterion_main, Criterion};

use archscout::{search, Archive, ArchiveBuilder, PatternInfo, SearchContext};

fn create_test_archive(file_count: usize, lines_per_file: usize) -> Archive {
    let mut b = ArchiveBuilder::new();
    for i in 0..file_count {
        let mut contents = String::new();
        for j in 0..lines_per_file {
            contents.push_str(&format!(
                "line {j} of file {i}: TODO fix handler {j} before release\n"
            ));
        }
        b.add(format!("src/file_{i}.rs"), contents.as_bytes());
    }
    b.build()
}

fn bench_literal_search(c: &mut Criterion) {
    let archive = create_test_archive(100, 200);
    let p = PatternInfo {
        pattern: "TODO".to_string(),
        is_case_sensitive: true,
        ..Default::default()
    };

    c.bench_function("literal_search", |b| {
        b.iter(|| black_box(search(&SearchContext::new(), &archive, &p).unwrap()));
    });
}

fn bench_case_insensitive_search(c: &mut Criterion) {
    let archive = create_test_archive(100, 200);
    let p = PatternInfo {
        pattern: "Todo".to_string(),
        is_case_sensitive: false,
        ..Default::default()
    };

    c.bench_function("case_insensitive_search", |b| {
        b.iter(|| black_box(search(&SearchContext::new(), &archive, &p).unwrap()));
    });
}

fn bench_regex_search(c: &mut Criterion) {
    let archive = create_test_archive(100, 200);
    let p = PatternInfo {
        pattern: r"handler \d+".to_string(),
        is_reg_exp: true,
        is_case_sensitive: true,
        ..Default::default()
    };

    c.bench_function("regex_search", |b| {
        b.iter(|| black_box(search(&SearchContext::new(), &archive, &p).unwrap()));
    });
}

fn bench_non_matching_search(c: &mut Criterion) {
    // Exercises the literal prefilter: no file contains the needle, so the
    // scan rejects every file with a substring probe.
    let archive = create_test_archive(100, 200);
    let p = PatternInfo {
        pattern: ".*zzqqxx.*".to_string(),
        is_reg_exp: true,
        is_case_sensitive: true,
        ..Default::default()
    };

    c.bench_function("non_matching_search", |b| {
        b.iter(|| black_box(search(&SearchContext::new(), &archive, &p).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_literal_search,
    bench_case_insensitive_search,
    bench_regex_search,
    bench_non_matching_search
);
criterion_main!(benches);
