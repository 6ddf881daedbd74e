//! Framing Benchmark for FeatherHTTP
//!
//! This benchmark measures the hot paths of the request pipeline:
//! chunk reassembly, request parsing, and response serialization.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use featherhttp::aggregator::Assembly;
use featherhttp::protocol::types::{FramedMessage, Response};
use featherhttp::protocol::{content_length, parse_request};

fn request_wire(body_len: usize) -> Vec<u8> {
    let body = "x".repeat(body_len);
    format!(
        "POST /files/bench.bin HTTP/1.1\r\nHost: localhost:4221\r\nUser-Agent: bench/1.0\r\nContent-Length: {}\r\n\r\n{}",
        body_len, body
    )
    .into_bytes()
}

/// Benchmark chunk reassembly
fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");

    for (name, body_len) in [("small_body", 16usize), ("large_body", 64 * 1024)] {
        let wire = request_wire(body_len);
        group.throughput(Throughput::Bytes(wire.len() as u64));

        group.bench_function(format!("{}_burst", name), |b| {
            b.iter(|| {
                let mut assembly = Assembly::new();
                black_box(assembly.push(&wire).unwrap())
            });
        });

        group.bench_function(format!("{}_4k_chunks", name), |b| {
            b.iter(|| {
                let mut assembly = Assembly::new();
                let mut framed = None;
                for chunk in wire.chunks(4096) {
                    if let Some(message) = assembly.push(chunk).unwrap() {
                        framed = Some(message);
                    }
                }
                black_box(framed)
            });
        });
    }

    group.finish();
}

/// Benchmark the pure request parser
fn bench_parse(c: &mut Criterion) {
    let header = Bytes::from_static(
        b"GET /echo/benchmark HTTP/1.1\r\nHost: localhost:4221\r\nUser-Agent: bench/1.0\r\nAccept: */*\r\n\r\n",
    );

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_request", |b| {
        b.iter(|| {
            let message = FramedMessage {
                header: header.clone(),
                body: Bytes::new(),
            };
            black_box(parse_request(message).unwrap())
        });
    });

    group.bench_function("content_length_scan", |b| {
        let block = request_wire(0);
        b.iter(|| black_box(content_length(&block).unwrap()));
    });

    group.finish();
}

/// Benchmark response serialization
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    group.throughput(Throughput::Elements(1));

    group.bench_function("bare_status", |b| {
        b.iter(|| black_box(Response::not_found().serialize()));
    });

    group.bench_function("text_body", |b| {
        b.iter(|| black_box(Response::text("benchmark").serialize()));
    });

    group.finish();
}

criterion_group!(benches, bench_assembly, bench_parse, bench_serialize);
criterion_main!(benches);
