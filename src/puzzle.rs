use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::{placed_word::PlacedWord, traits::WordKey};

/// Immutable result of one generation attempt.
///
/// `grid` is row major (`grid[y][x]`), None marks an empty cell. Words are listed in placement order,
/// which is also the order of their numbers.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Puzzle<Id: WordKey>
{
    id: String,
    grid_size: usize,
    grid: Vec<Vec<Option<char>>>,
    placed_words: Vec<PlacedWord<Id>>,
}

impl<Id: WordKey> Puzzle<Id>
{
    pub(crate) fn new(id: String, grid_size: usize, grid: Vec<Vec<Option<char>>>, placed_words: Vec<PlacedWord<Id>>) -> Puzzle<Id>
    {
        Puzzle { id, grid_size, grid, placed_words }
    }

    pub fn id(&self) -> &str
    {
        &self.id
    }

    pub fn grid_size(&self) -> usize
    {
        self.grid_size
    }

    pub fn grid(&self) -> &[Vec<Option<char>>]
    {
        &self.grid
    }

    pub fn placed_words(&self) -> &[PlacedWord<Id>]
    {
        &self.placed_words
    }

    pub fn word_ids(&self) -> BTreeSet<Id>
    {
        self.placed_words.iter().map(|w| w.id.clone()).collect()
    }

    /// Number of cells shared by two words
    pub fn crossing_count(&self) -> usize
    {
        self.placed_words.iter().map(|w| w.crossings.len()).sum()
    }

    /// Finds a placed word by its number
    pub fn word_by_number(&self, number: u32) -> Option<&PlacedWord<Id>>
    {
        self.placed_words.iter().find(|w| w.number == number)
    }

    /// Renders the letters, one row per line, `.` for empty cells
    ///
    /// ```
    /// # use vocab_crossword::grid::Grid;
    /// # use vocab_crossword::word::{Direction, Position, Word};
    /// let mut grid = Grid::new(4);
    /// grid.place(&Word::new(1, "tea", ""), Position::new(0, 1), Direction::Horizontal).unwrap();
    /// let puzzle = grid.into_puzzle("xw".to_owned());
    ///
    /// assert_eq!(puzzle.render(), "....\nTEA.\n....\n....");
    /// ```
    pub fn render(&self) -> String
    {
        self.grid.iter()
            .map(|row| row.iter().map(|c| c.unwrap_or('.')).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
