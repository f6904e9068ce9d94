use std::collections::BTreeSet;
use itertools::Itertools;
use crate::{grid::Grid, placed_word::Crossing, traits::WordKey, word::{Direction, Position, Word}};

/// Represents one legal way to put a [word](Word) on a [grid](Grid), lives only while the word is being placed
#[derive(Clone, PartialEq, Debug)]
pub struct PlacementOption<'w, Id: WordKey>
{
    pub word: &'w Word<Id>,
    pub position: Position,
    pub direction: Direction,
    pub crossings: Vec<Crossing<Id>>,
    pub score: f64,
}

/// Result of looking for placements of one word
#[derive(Clone, Debug)]
pub struct PlacementSearch<'w, Id: WordKey>
{
    pub options: Vec<PlacementOption<'w, Id>>,
    /// Candidate positions that [Grid::can_place] turned down
    pub rejected: usize,
}

/// Returns the two centered placements of the first word (those that fit)
pub fn seed_placements<'w, Id: WordKey>(grid: &Grid<Id>, word: &'w Word<Id>) -> PlacementSearch<'w, Id>
{
    let size = grid.size() as i32;
    let len = word.len() as i32;
    let candidates = [
        (Position::new((size - len) / 2, size / 2), Direction::Horizontal),
        (Position::new(size / 2, (size - len) / 2), Direction::Vertical),
    ];

    collect_options(grid, word, candidates.into_iter())
}

/// Returns every legal placement of `word` that crosses at least one placed word.
///
/// Each pair of equal letters between `word` and a placed word gives one candidate, perpendicular to the placed word.
/// Candidates are produced in placement order of the crossed word, then by letter index, which keeps the
/// result deterministic.
///
/// ```
/// # use vocab_crossword::grid::Grid;
/// # use vocab_crossword::placement::find_placements;
/// # use vocab_crossword::word::{Direction, Position, Word};
/// let mut grid = Grid::new(10);
/// grid.place(&Word::new(1, "meat", ""), Position::new(3, 5), Direction::Horizontal).unwrap();
///
/// let tea = Word::new(2, "tea", "");
/// let search = find_placements(&grid, &tea);
///
/// // crossing on the E, the A and the T of MEAT
/// assert_eq!(search.options.iter().map(|o| (o.position, o.direction)).collect::<Vec<_>>(), vec![
///     (Position::new(4, 4), Direction::Vertical),
///     (Position::new(5, 3), Direction::Vertical),
///     (Position::new(6, 5), Direction::Vertical),
/// ]);
/// ```
pub fn find_placements<'w, Id: WordKey>(grid: &Grid<Id>, word: &'w Word<Id>) -> PlacementSearch<'w, Id>
{
    if grid.is_empty()
    {
        return seed_placements(grid, word);
    }

    let mut seen = BTreeSet::new();
    let candidates = grid.words().iter()
        .flat_map(|placed|
        {
            let dir = placed.direction.opposite();
            placed.letters().iter().enumerate()
                .cartesian_product(word.letters().iter().enumerate())
                .filter(|((_, a), (_, b))| a == b)
                .map(move |((placed_ind, _), (word_ind, _))| (placed.cell(placed_ind).step(dir, -(word_ind as i32)), dir))
        })
        .filter(|candidate| seen.insert(*candidate))
        .collect::<Vec<_>>();

    collect_options(grid, word, candidates.into_iter())
}

fn collect_options<'w, Id: WordKey>(grid: &Grid<Id>, word: &'w Word<Id>, candidates: impl Iterator<Item = (Position, Direction)>) -> PlacementSearch<'w, Id>
{
    let mut search = PlacementSearch { options: Vec::new(), rejected: 0 };

    for (position, direction) in candidates
    {
        match grid.crossings_for(word.letters(), position, direction)
        {
            Some(crossings) => search.options.push(PlacementOption { word, position, direction, crossings, score: 0.0 }),
            None => search.rejected += 1,
        }
    }

    search
}
