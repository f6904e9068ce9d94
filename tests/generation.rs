use std::collections::BTreeSet;

use vocab_crossword::{
    cluster::{cluster_words, ClusterConfig},
    connectivity::check_words,
    diagnostics::{MemorySink, NullSink},
    generator::{GeneratorConfig, GeneratorSettings, PuzzleGenerator, StopReason},
    puzzle::Puzzle,
    word::{Direction, Position, Word},
};

const SMALL: [&str; 12] = ["TIME", "TEAM", "MATE", "METAL", "LATE", "TALE", "ALE", "EAT", "TEA", "MEAT", "STEAM", "MASTER"];

const LARGE: [&str; 45] = [
    "planet", "garden", "trainer", "reader", "station", "orange", "silver", "winter", "summer", "lantern",
    "doctor", "animal", "island", "monster", "painter", "sister", "letter", "number", "pencil", "rabbit",
    "desert", "basket", "candle", "dinner", "mirror", "parent", "rocket", "singer", "tunnel", "window",
    "anchor", "butter", "carpet", "sailor", "farmer", "hunter", "ladder", "marble", "nature", "ginger",
    "salmon", "master", "violin", "wander", "yellow",
];

fn words(terms: &[&str]) -> Vec<Word<String>>
{
    terms.iter().enumerate().map(|(i, t)| Word::new(format!("w{i}"), t, format!("clue for {t}"))).collect()
}

fn fixed_grid(size: usize) -> GeneratorSettings
{
    GeneratorSettings { generator: GeneratorConfig { min_grid_size: size, max_grid_size: size, ..Default::default() }, ..Default::default() }
}

/// Every cell a word covers holds that word's letter
fn assert_cells_agree(puzzle: &Puzzle<String>)
{
    for word in puzzle.placed_words()
    {
        for (pos, &letter) in word.cells().zip(word.letters())
        {
            assert_eq!(puzzle.grid()[pos.y as usize][pos.x as usize], Some(letter as char), "{} at ({}, {})", word.term, pos.x, pos.y);
        }
    }
}

fn assert_crossings_hold(puzzle: &Puzzle<String>)
{
    for word in puzzle.placed_words().iter().skip(1)
    {
        assert!(!word.crossings.is_empty(), "{} has no crossing", word.term);
        for crossing in word.crossings.iter()
        {
            let other = puzzle.word_by_number(crossing.other_number).unwrap();
            assert_eq!(other.id, crossing.other_id);
            assert_eq!(other.letters()[crossing.other_position], word.letters()[crossing.position]);
            assert_ne!(other.direction, word.direction);
        }
    }
}

#[test]
fn test_small_word_set_on_fixed_grid()
{
    let settings = fixed_grid(20);
    let input = words(&SMALL);
    let outcome = PuzzleGenerator::new(&settings).with_sink(&NullSink).generate_puzzle(&input).unwrap();
    let puzzle = &outcome.puzzle;

    assert_eq!(puzzle.grid_size(), 20);
    assert!(puzzle.placed_words().len() >= 10);
    assert_eq!(puzzle.placed_words().len() + outcome.unplaced.len(), SMALL.len());
    assert_eq!(outcome.stop_reason, StopReason::Completed);

    // the longest word goes first, centered across
    let seed = &puzzle.placed_words()[0];
    assert_eq!((seed.term.as_str(), seed.number), ("MASTER", 1));
    assert_eq!((seed.position, seed.direction), (Position::new(7, 10), Direction::Horizontal));
    assert!(seed.crossings.is_empty());

    assert_crossings_hold(puzzle);
    assert_cells_agree(puzzle);
    assert!(outcome.connected);
    assert!(check_words(puzzle.placed_words()).connected);
}

#[test]
fn test_generation_is_deterministic()
{
    let settings = GeneratorSettings::default();
    let input = words(&SMALL);
    let generator = PuzzleGenerator::new(&settings).with_sink(&NullSink);

    let first = generator.generate_puzzle(&input).unwrap();
    let second = generator.generate_puzzle(&input).unwrap();
    assert_eq!(first.puzzle, second.puzzle);
    assert_eq!(first.puzzle.render(), second.puzzle.render());

    // only the word set decides the layout, not the order it came in
    let mut reversed = input.clone();
    reversed.reverse();
    let from_reversed = generator.generate_puzzle(&reversed).unwrap();
    assert_eq!(from_reversed.puzzle, first.puzzle);
    assert_eq!(from_reversed.unplaced, first.unplaced);

    let large = words(&LARGE);
    let mut large_reversed = large.clone();
    large_reversed.reverse();
    assert_eq!(generator.generate_puzzles(&large_reversed).unwrap(), generator.generate_puzzles(&large).unwrap());
}

#[test]
fn test_single_word()
{
    let settings = GeneratorSettings::default();
    let sink = MemorySink::new();
    let outcome = PuzzleGenerator::new(&settings).with_sink(&sink).generate_puzzle(&words(&["butterfly"])).unwrap();

    assert_eq!(outcome.puzzle.placed_words().len(), 1);
    assert_eq!(outcome.puzzle.crossing_count(), 0);
    assert!(outcome.connected);
    assert!(sink.messages(log::Level::Warn).is_empty());
}

#[test]
fn test_grid_size_bounds()
{
    let settings = GeneratorSettings::default();
    let generator = PuzzleGenerator::new(&settings).with_sink(&NullSink);

    for terms in [&["ox", "on"][..], &["vocabulary", "library", "boy"][..], &["internationalization", "nation", "ratio"][..]]
    {
        let input = words(terms);
        let Ok(outcome) = generator.generate_puzzle(&input) else { continue };
        let size = outcome.puzzle.grid_size();

        assert!((10..=16).contains(&size), "{size}");
        assert_eq!(outcome.puzzle.grid().len(), size);
        assert!(outcome.puzzle.placed_words().len() <= input.len());
        assert_cells_agree(&outcome.puzzle);
    }

    // a 20 letter word never fits on a 16x16 board
    let outcome = generator.generate_puzzle(&words(&["internationalization", "nation", "ratio"])).unwrap();
    assert!(outcome.unplaced.contains(&"w0".to_owned()));
    assert_eq!(outcome.puzzle.placed_words()[0].term, "NATION");
}

#[test]
fn test_clusters_cover_large_word_set()
{
    let input = words(&LARGE);
    let config = ClusterConfig { target_cluster_size: 12, ..Default::default() };
    let clusters = cluster_words(&input, &config).unwrap();

    for cluster in clusters.iter()
    {
        assert!((config.min_cluster_size..=config.max_cluster_size).contains(&cluster.len()), "{}", cluster.len());
    }

    let ids = clusters.iter().flat_map(|c| c.word_ids()).collect::<BTreeSet<_>>();
    assert_eq!(ids, input.iter().map(|w| w.id.clone()).collect());
}

#[test]
fn test_large_word_set_coverage()
{
    let settings = GeneratorSettings { clustering: ClusterConfig { target_cluster_size: 12, ..Default::default() }, ..Default::default() };
    let input = words(&LARGE);
    let outcome = PuzzleGenerator::new(&settings).with_sink(&NullSink).generate_puzzles(&input).unwrap();

    assert!(outcome.puzzles.len() > 1);
    assert_eq!(outcome.total_words, LARGE.len());
    assert_eq!(outcome.placed_words + outcome.unplaced.len(), LARGE.len());
    assert!(outcome.coverage >= 90.0, "coverage {}", outcome.coverage);

    let mut seen = BTreeSet::new();
    for puzzle in outcome.puzzles.iter()
    {
        assert_crossings_hold(puzzle);
        assert_cells_agree(puzzle);
        for word in puzzle.placed_words()
        {
            assert!(seen.insert(word.id.clone()), "{} placed twice", word.term);
        }
    }
    assert_eq!(seen.len(), outcome.placed_words);
}
