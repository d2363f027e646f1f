use criterion::{Criterion, black_box, criterion_group, criterion_main};
use crossref_fs::io::{self, RobustnessConfig};
use crossref_fs::{NormalizedPath, WorkspaceLayout, compute_checksum};
use std::fs;
use tempfile::tempdir;

fn checksum_benchmark(c: &mut Criterion) {
    let content = vec![b'x'; 64 * 1024];
    c.bench_function("checksum::compute_checksum (64 KiB)", |b| {
        b.iter(|| compute_checksum(black_box(&content)))
    });
}

fn write_atomic_benchmark(c: &mut Criterion) {
    c.bench_function("io::write_atomic", |b| {
        let dir = tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("test_file.txt"));
        let content = "hello world".as_bytes();
        let config = RobustnessConfig::default();

        b.iter(|| {
            io::write_atomic(black_box(&path), black_box(content), config).unwrap();
        })
    });
}

fn layout_detect_benchmark(c: &mut Criterion) {
    c.bench_function("layout::WorkspaceLayout::detect", |b| {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        let start_path = dir.path().join("some/nested/dir");
        fs::create_dir_all(&start_path).unwrap();

        b.iter(|| WorkspaceLayout::detect(black_box(&start_path)).unwrap())
    });
}

criterion_group!(
    benches,
    checksum_benchmark,
    write_atomic_benchmark,
    layout_detect_benchmark
);
criterion_main!(benches);
