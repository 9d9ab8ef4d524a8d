use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use webstats_logs::{UapClassifier, UserAgentCache, parse_entry};

fn criterion_benchmark(c: &mut Criterion) {
    let log = include_str!("../test_data/basic.log");

    c.bench_function("parse_entry", |b| {
        let classifier = UapClassifier::bundled().unwrap();
        let mut user_agents = UserAgentCache::new(classifier);
        b.iter(|| {
            for line in black_box(log).lines() {
                let entry = parse_entry(line, &mut user_agents);
                black_box(entry.is_ok());
            }
        });
    });

    c.bench_function("decode_path", |b| {
        let path = "/v1/search?q=caf%C3%A9+au+lait";
        b.iter(|| webstats_logs::normalize::decode_path(black_box(path)));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
