use criterion::{criterion_group, criterion_main, Criterion};
use hdr_bracket::align::{find_offset, select_block};
use hdr_bracket::{Exposure, HdrConfig, HdrMerger, Image};

fn synthetic_exposure(width: usize, height: usize, dy: i64, dx: i64) -> Image {
    Image::from_fn(width, height, |x, y| {
        let (x, y) = (x as i64 - dx, y as i64 - dy);
        let v = ((x * 7 + y * 13) ^ (x * y)) as u8;
        [v, v / 2, 255 - v, 255]
    })
    .unwrap()
}

fn bench_align(c: &mut Criterion) {
    let config = HdrConfig::default();
    let low = synthetic_exposure(1024, 768, 0, 0);
    let mid = synthetic_exposure(1024, 768, 12, -9);

    let mut group = c.benchmark_group("align_1024x768");
    group.sample_size(10);
    group.bench_function("select_block", |b| {
        b.iter(|| select_block(&config, &low));
    });

    let patch = select_block(&config, &low);
    group.bench_function("find_offset", |b| {
        b.iter(|| find_offset(&config, &low, &mid, Exposure::Mid, patch).unwrap());
    });
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let merger = HdrMerger::cpu(HdrConfig::default()).unwrap();
    let low = synthetic_exposure(2048, 1536, 0, 0);
    let mid = synthetic_exposure(2048, 1536, 3, 4);
    let hi = synthetic_exposure(2048, 1536, -5, 2);
    let mut output = low.copy_zeroed();

    let mut group = c.benchmark_group("merge_2048x1536");
    group.sample_size(10);
    group.bench_function("cpu", |b| {
        b.iter(|| {
            merger
                .compute_into(Some(&low), Some(&mid), Some(&hi), Some(&mut output))
                .unwrap()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_align, bench_merge);
criterion_main!(benches);
