use criterion::{criterion_group, criterion_main, Criterion, BenchmarkId};
use vocab_crossword::{diagnostics::NullSink, generator::{GeneratorSettings, PuzzleGenerator}, word::Word, worker::GenerationTask};

const SMALL: [&str; 12] = ["time", "team", "mate", "metal", "late", "tale", "ale", "eat", "tea", "meat", "steam", "master"];

const LARGE: [&str; 45] = [
    "planet", "garden", "trainer", "reader", "station", "orange", "silver", "winter", "summer", "lantern",
    "doctor", "animal", "island", "monster", "painter", "sister", "letter", "number", "pencil", "rabbit",
    "desert", "basket", "candle", "dinner", "mirror", "parent", "rocket", "singer", "tunnel", "window",
    "anchor", "butter", "carpet", "sailor", "farmer", "hunter", "ladder", "marble", "nature", "ginger",
    "salmon", "master", "violin", "wander", "yellow",
];

fn words(terms: &[&str]) -> Vec<Word<usize>>
{
    terms.iter().enumerate().map(|(i, t)| Word::new(i, t, "")).collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("crossword");
    let settings = GeneratorSettings::default();

    let small = words(&SMALL);
    group.bench_function(BenchmarkId::new("Single puzzle", SMALL.len()),
        |b| b.iter(|| PuzzleGenerator::new(&settings).with_sink(&NullSink).generate_puzzle(&small)));

    let large = words(&LARGE);
    group.bench_function(BenchmarkId::new("Multi puzzle", LARGE.len()),
        |b| b.iter(|| PuzzleGenerator::new(&settings).with_sink(&NullSink).generate_puzzles(&large)));

    group.bench_function(BenchmarkId::new("Task", LARGE.len()),
        |b| b.iter(||
        {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async { GenerationTask::spawn(large.clone(), settings.clone()).join().await })
        }));

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
