//! Performance benchmarks for capture and polling.
//!
//! Capture runs in interrupt context and poll runs once per host loop
//! iteration, so both sit on hot paths. These benchmarks measure a single
//! pulse, an idle poll pass, and a full frame from first pulse to decode.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench poll_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hidprox_core::{CardFormat, FrameBits, LineId, PlatformClass};
use hidprox_reader::decoder::decode_bits;
use hidprox_reader::{DecodedFrame, FrameBuffer, ReaderRegistry, RegistryConfig};
use std::hint::black_box;

const WAIT_TICKS: u16 = 16;

fn create_registry(readers: usize) -> ReaderRegistry {
    let mut registry = ReaderRegistry::new(RegistryConfig {
        platform: PlatformClass::AnyPinInterrupt,
        wait_ticks: WAIT_TICKS,
    })
    .unwrap();
    for n in 0..readers as u16 {
        registry
            .register(LineId::new(n * 2), LineId::new(n * 2 + 1), |frame: &DecodedFrame| {
                black_box(frame.card_code);
            })
            .unwrap();
    }
    registry
}

/// Benchmark capturing a single pulse.
fn bench_capture(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture");
    group.throughput(Throughput::Elements(1));

    let buffer = FrameBuffer::new(WAIT_TICKS).unwrap();
    group.bench_function("capture_pulse", |b| {
        b.iter(|| {
            buffer.capture(black_box(true));
            if buffer.bit_count() >= 64 {
                buffer.reset();
            }
        });
    });

    group.finish();
}

/// Benchmark a poll pass with no frame in progress.
fn bench_poll_idle(c: &mut Criterion) {
    let mut group = c.benchmark_group("poll_idle");

    for readers in [1, 3, 16] {
        let mut registry = create_registry(readers);
        group.throughput(Throughput::Elements(readers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(readers), &readers, |b, _| {
            b.iter(|| black_box(registry.poll()));
        });
    }

    group.finish();
}

/// Benchmark a complete frame: pulses, inactivity window, decode, callback.
fn bench_full_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_frame");
    group.throughput(Throughput::Elements(1));

    for format in CardFormat::ALL {
        let bits = FrameBits::encode(format, 1, 1).unwrap();
        let mut registry = create_registry(1);
        let reader = registry.handles().next().unwrap();
        let capture = registry.capture_handle(reader).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(format.name()), &bits, |b, bits| {
            b.iter(|| {
                for bit in bits.iter() {
                    capture.push_bit(bit);
                }
                let mut decoded = 0;
                for _ in 0..WAIT_TICKS {
                    decoded += registry.poll();
                }
                black_box(decoded)
            });
        });
    }

    group.finish();
}

/// Benchmark field extraction on an already captured frame.
fn bench_decode_bits(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_bits");
    group.throughput(Throughput::Elements(1));

    let bits = FrameBits::encode(CardFormat::Corporate1000, 4095, 1_048_575).unwrap();
    group.bench_function("corporate_1000", |b| {
        b.iter(|| black_box(decode_bits(black_box(&bits))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_capture,
    bench_poll_idle,
    bench_full_frame,
    bench_decode_bits,
);

criterion_main!(benches);
