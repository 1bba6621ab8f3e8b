use std::{hint::black_box, io::Read};

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

/// A baseline frame with a 3-chunk ICC profile, followed by some scan data.
fn test_jpeg() -> Vec<u8> {
    fn segment(out: &mut Vec<u8>, marker: u8, data: &[u8]) {
        out.extend_from_slice(&[0xFF, marker]);
        out.extend_from_slice(&(data.len() as u16 + 2).to_be_bytes());
        out.extend_from_slice(data);
    }

    let mut profile = vec![0u8; 132];
    profile[0..4].copy_from_slice(&132u32.to_be_bytes());
    profile[36..40].copy_from_slice(b"acsp");
    profile.resize(150_000, 0);

    let mut out = vec![0xFF, 0xD8];
    let chunks: Vec<&[u8]> = profile.chunks(60_000).collect();
    for (i, chunk) in chunks.iter().enumerate() {
        let mut payload = jpegmeta::ICC_PROFILE_IDENTIFIER.to_vec();
        payload.extend_from_slice(&[i as u8 + 1, chunks.len() as u8]);
        payload.extend_from_slice(chunk);
        segment(&mut out, 0xE2, &payload);
    }
    segment(&mut out, 0xC0, &[8, 0x04, 0x38, 0x07, 0x80, 1, 1, 0x11, 0]);
    segment(&mut out, 0xDA, &[1, 1, 0x00, 0, 63, 0]);
    out.extend((0..1_000_000u32).map(|i| (i % 255) as u8));
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn load(c: &mut Criterion) {
    let jpeg = test_jpeg();

    let mut group = c.benchmark_group("load");
    group.throughput(Throughput::Bytes(jpeg.len() as u64));
    group.bench_function("metadata", |b| {
        b.iter(|| jpegmeta::load(black_box(&jpeg[..])).0.unwrap())
    });
    group.bench_function("metadata+replay", |b| {
        b.iter(|| {
            let (metadata, mut replay) = jpegmeta::load(black_box(&jpeg[..]));
            let mut out = Vec::with_capacity(jpeg.len());
            replay.read_to_end(&mut out).unwrap();
            (metadata.unwrap(), out)
        })
    });
    group.finish();
}

criterion_group!(benches, load);
criterion_main!(benches);
