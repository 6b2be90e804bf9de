//! Benchmark suite for encode/decode throughput
//!
//! Measures:
//! - Encode throughput over records of varying field counts
//! - Decode throughput, with and without schema evolution
//! - Dotted-path lookup over nested records
//!
//! # Configuration
//!
//! Benchmark behavior can be configured via environment variables:
//!
//! - `BENCH_SAMPLE_SIZE`: Number of samples to collect (default: 100)
//! - `BENCH_MEASUREMENT_TIME`: Measurement time in seconds (default: 5)
//!
//! # Examples
//!
//! ```bash
//! # Quick run with fewer samples
//! BENCH_SAMPLE_SIZE=50 BENCH_MEASUREMENT_TIME=3 cargo bench
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

use avrolite::{
    decode, decode_with_reader, encode, parse_schema, select_field, Record, Schema, Value,
};

/// Configure Criterion based on environment variables
fn configure_criterion() -> Criterion {
    let mut criterion = Criterion::default();

    if let Ok(sample_size) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(size) = sample_size.parse::<usize>() {
            criterion = criterion.sample_size(size);
        } else {
            eprintln!("Warning: Invalid BENCH_SAMPLE_SIZE value: {}", sample_size);
        }
    }

    if let Ok(measurement_time) = std::env::var("BENCH_MEASUREMENT_TIME") {
        if let Ok(secs) = measurement_time.parse::<u64>() {
            criterion = criterion.measurement_time(Duration::from_secs(secs));
        } else {
            eprintln!(
                "Warning: Invalid BENCH_MEASUREMENT_TIME value: {}",
                measurement_time
            );
        }
    }

    criterion
}

/// A record schema with the given number of mixed-type fields.
fn schema_with_fields(count: usize) -> Schema {
    let fields: Vec<String> = (0..count)
        .map(|i| match i % 4 {
            0 => format!(r#"{{"name": "f{}", "type": "long"}}"#, i),
            1 => format!(r#"{{"name": "f{}", "type": "string"}}"#, i),
            2 => format!(r#"{{"name": "f{}", "type": "double"}}"#, i),
            _ => format!(r#"{{"name": "f{}", "type": ["null", "string"]}}"#, i),
        })
        .collect();
    let json = format!(
        r#"{{"type": "record", "name": "Bench", "fields": [{}]}}"#,
        fields.join(",")
    );
    parse_schema(&json).expect("valid bench schema")
}

/// A record filled with values for `schema_with_fields(count)`.
fn record_with_fields(count: usize) -> Record {
    let mut record = Record::with_name("Bench");
    for i in 0..count {
        let value = match i % 4 {
            0 => Value::Long(i as i64 * 1_000_003),
            1 => Value::String(format!("value-{}", i)),
            2 => Value::Double(i as f64 * 0.125),
            _ => Value::Union(1, Box::new(Value::String(format!("opt-{}", i)))),
        };
        record.set(format!("f{}", i), value);
    }
    record
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for field_count in [4usize, 16, 64] {
        let schema = schema_with_fields(field_count);
        let record = record_with_fields(field_count);
        let encoded_size = encode(&schema, Some(&record)).expect("encodes").len();

        group.throughput(Throughput::Bytes(encoded_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(field_count),
            &field_count,
            |b, _| {
                b.iter(|| encode(black_box(&schema), black_box(Some(&record))).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for field_count in [4usize, 16, 64] {
        let schema = schema_with_fields(field_count);
        let record = record_with_fields(field_count);
        let bytes = encode(&schema, Some(&record)).expect("encodes");

        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(field_count),
            &field_count,
            |b, _| {
                b.iter(|| decode(black_box(&schema), black_box(&bytes)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_decode_with_evolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_evolved");

    // Reader keeps half the fields and adds one defaulted field
    let writer = schema_with_fields(16);
    let reader = parse_schema(
        r#"{"type": "record", "name": "Bench", "fields": [
            {"name": "f0", "type": "long"},
            {"name": "f1", "type": "string"},
            {"name": "f2", "type": "double"},
            {"name": "f4", "type": "long"},
            {"name": "f5", "type": "string"},
            {"name": "f6", "type": "double"},
            {"name": "f8", "type": "long"},
            {"name": "f9", "type": "string"},
            {"name": "added", "type": "string", "default": "none"}
        ]}"#,
    )
    .expect("valid reader schema");

    let record = record_with_fields(16);
    let bytes = encode(&writer, Some(&record)).expect("encodes");

    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("half_projected", |b| {
        b.iter(|| {
            decode_with_reader(black_box(&writer), black_box(&reader), black_box(&bytes)).unwrap()
        });
    });

    group.finish();
}

fn bench_select_field(c: &mut Criterion) {
    let mut inner = Record::with_name("Inner");
    inner.set("value", Value::Long(42));
    let mut mid = Record::with_name("Mid");
    mid.set("inner", Value::Record(inner));
    let mut root = Record::with_name("Root");
    root.set("mid", Value::Record(mid));

    c.bench_function("select_field/3_levels", |b| {
        b.iter(|| select_field(black_box(&root), black_box("mid.inner.value")).unwrap());
    });
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_encode, bench_decode, bench_decode_with_evolution, bench_select_field
}
criterion_main!(benches);
