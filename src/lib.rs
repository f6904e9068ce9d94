//! Deterministic crossword layout for vocabulary practice.
//!
//! Feed a list of [words](word::Word) (a term and a clue each) to a [PuzzleGenerator](generator::PuzzleGenerator)
//! and get back one [puzzle](puzzle::Puzzle), or several when the list is too long to fit in one grid.
//! Every placed word after the first crosses a word that is already on the grid, and the same input always
//! gives the same output.
//!
//! ```
//! use vocab_crossword::generator::{GeneratorSettings, PuzzleGenerator};
//! use vocab_crossword::word::Word;
//!
//! let words = vec![
//!     Word::new("w1", "planet", "Earth is one"),
//!     Word::new("w2", "plant", "It grows in a pot"),
//!     Word::new("w3", "lane", "Narrow road"),
//! ];
//!
//! let settings = GeneratorSettings::default();
//! let outcome = PuzzleGenerator::new(&settings).generate_puzzle(&words).unwrap();
//! println!("{}", outcome.puzzle.render());
//! ```

pub mod traits;
pub mod word;
pub mod placed_word;
pub mod error;
pub mod diagnostics;
pub mod grid;
pub mod puzzle;
pub mod placement;
pub mod scoring;
pub mod connectivity;
pub mod cluster;
pub mod generator;
pub mod worker;
