//! Benchmarks for navigation building and per-page views.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ssg_site::{NavOptions, Navigation};
use ssg_storage::{ContentFile, Meta};

/// Create page files for a tree with the given depth and breadth.
fn create_pages(depth: usize, breadth: usize) -> Vec<ContentFile> {
    fn create_level(
        prefix: &str,
        depth: usize,
        max_depth: usize,
        breadth: usize,
        out: &mut Vec<ContentFile>,
    ) {
        let mut meta = Meta::new();
        meta.insert("title".to_owned(), format!("Level {depth}").into());
        let path = format!("{prefix}index.html");
        out.push(ContentFile::new(path.clone(), format!("/src/{path}"), "").with_meta(meta));

        if depth == max_depth {
            return;
        }
        for i in 0..breadth {
            create_level(&format!("{prefix}section-{i}/"), depth + 1, max_depth, breadth, out);
        }
    }

    let mut pages = Vec::new();
    create_level("", 0, depth, breadth, &mut pages);
    pages
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation_build");

    for (depth, breadth) in [(2, 5), (3, 5), (4, 4)] {
        let pages = create_pages(depth, breadth);
        group.bench_with_input(
            BenchmarkId::from_parameter(pages.len()),
            &pages,
            |b, pages| b.iter(|| Navigation::build(pages, NavOptions::default())),
        );
    }

    group.finish();
}

fn bench_for_url(c: &mut Criterion) {
    let pages = create_pages(3, 5);
    let navigation = Navigation::build(&pages, NavOptions::default());

    let mut group = c.benchmark_group("navigation_view");

    group.bench_function("for_url_deep", |b| {
        b.iter(|| navigation.for_url("section-4/section-4/section-4/index.html"));
    });

    group.bench_function("for_url_miss", |b| {
        b.iter(|| navigation.for_url("missing/page.html"));
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_for_url);
criterion_main!(benches);
