//! Parsing and resolution benchmarks
//!
//! ```bash
//! cargo bench --bench benchmark
//! ```

use calskill::parser::{normalize, parse_utterance};
use calskill::resolver::{ReferenceInstant, SameWeekdayPolicy, TemporalResolver};
use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const UTTERANCES: &[&str] = &[
    "do i have appointments in two days",
    "are there appointments on 1st of december",
    "do i have an event on friday",
    "anything the day after tomorrow",
    "what's on in twenty one days",
    "do I have anything at all",
];

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize", |b| {
        b.iter(|| normalize(black_box("Are there appointments on the 1st of December, 2025?")))
    });
}

fn bench_parse_and_resolve(c: &mut Criterion) {
    let resolver = TemporalResolver::new(SameWeekdayPolicy::NextWeek);
    let reference = ReferenceInstant::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default());

    let mut group = c.benchmark_group("parse_and_resolve");
    for utterance in UTTERANCES {
        group.bench_with_input(BenchmarkId::from_parameter(utterance), utterance, |b, utterance| {
            b.iter(|| {
                let parsed = parse_utterance(black_box(utterance));
                parsed.temporal.ok().map(|m| resolver.resolve(&m.expression, &reference))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_parse_and_resolve);
criterion_main!(benches);
