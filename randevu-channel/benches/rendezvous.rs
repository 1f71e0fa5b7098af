//! Rendezvous latency and select throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use randevu_channel::{recv_from, select, Channel};
use std::thread;

fn bench_ping_pong(c: &mut Criterion) {
    let mut group = c.benchmark_group("ping_pong");

    group.bench_function("rendezvous_round_trip", |b| {
        let ping = Channel::new();
        let pong = Channel::new();
        let ping_rx = ping.clone();
        let pong_tx = pong.clone();
        thread::spawn(move || loop {
            let v: usize = ping_rx.recv();
            pong_tx.send(v);
        });

        b.iter(|| {
            ping.send(1);
            black_box(pong.recv())
        });
    });

    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");

    group.bench_function("two_ready_channels", |b| {
        let chans: Vec<Channel<usize>> = (0..2).map(|_| Channel::new()).collect();
        for (i, ch) in chans.iter().enumerate() {
            let tx = ch.clone();
            thread::spawn(move || loop {
                tx.send(i);
            });
        }

        b.iter(|| {
            select(vec![
                recv_from(&chans[0], |v| {
                    black_box(v);
                }),
                recv_from(&chans[1], |v| {
                    black_box(v);
                }),
            ]);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_ping_pong, bench_select);
criterion_main!(benches);
