use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizvault_core::codec::{from_payload, to_payload, Envelope};
use quizvault_core::model::{Answer, Question, Test};
use quizvault_core::records::{deserialize_tests, serialize_tests};

fn make_bank(tests: usize, questions: usize) -> Vec<Test> {
    (0..tests)
        .map(|t| {
            let questions = (0..questions)
                .map(|q| {
                    Question::new(
                        format!("Question {q} of test {t}: ¿qué es esto?"),
                        None,
                        vec![
                            Answer::correct("Café"),
                            Answer::wrong("Crème brûlée"),
                            Answer::wrong("Naïve"),
                        ],
                    )
                    .unwrap()
                })
                .collect();
            Test::new(t as u32 + 1, format!("Test {t}"), "", 600, questions, 100.0).unwrap()
        })
        .collect()
}

fn bench_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload");
    let bank = make_bank(10, 20);
    let payload = serialize_tests(&bank).unwrap();

    group.bench_function("serialize_bank", |b| {
        b.iter(|| to_payload(black_box(&bank)).unwrap())
    });

    group.bench_function("deserialize_bank", |b| {
        b.iter(|| deserialize_tests(black_box(&payload)).unwrap())
    });

    group.bench_function("deserialize_empty", |b| {
        b.iter(|| from_payload::<Test>(black_box("")).unwrap())
    });

    group.finish();
}

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    group.sample_size(10);

    let envelope = Envelope::legacy();
    let payload = serialize_tests(&make_bank(2, 5)).unwrap();
    let sealed = envelope.encrypt(&payload).unwrap();

    group.bench_function("encrypt", |b| {
        b.iter(|| envelope.encrypt(black_box(&payload)).unwrap())
    });

    group.bench_function("decrypt", |b| {
        b.iter(|| envelope.decrypt(black_box(&sealed)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_payload, bench_envelope);
criterion_main!(benches);
