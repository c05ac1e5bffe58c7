use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kbcore::index::WeightMatrix;
use kbcore::normalize::{prepare_text, NormalizeOptions};
use kbcore::tfidf::{TfidfModel, TfidfParams};

const QUESTION: &str = "What's the GiG policy on KPIs when a player can't withdraw their bonus winnings?";

fn corpus() -> Vec<String> {
    (0..500)
        .map(|i| format!("document {i} covers deposit limits, bonus wagering and withdrawal rule {}", i % 17))
        .collect()
}

fn bench_prepare(c: &mut Criterion) {
    let opts = NormalizeOptions::default();
    c.bench_function("prepare_question", |b| b.iter(|| prepare_text(black_box(QUESTION), &opts)));
}

fn bench_score(c: &mut Criterion) {
    let (model, matrix): (TfidfModel, WeightMatrix) = TfidfModel::fit_transform(&corpus(), TfidfParams::default());
    let query = model.transform("bonus withdrawal rule 3");
    c.bench_function("score_500_docs", |b| b.iter(|| matrix.score(black_box(&query))));
}

criterion_group!(benches, bench_prepare, bench_score);
criterion_main!(benches);
