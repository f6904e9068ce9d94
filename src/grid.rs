use crate::{error::GridError, placed_word::{BoundingBox, Crossing, PlacedWord}, puzzle::Puzzle, traits::WordKey, word::{Direction, Position, Word}};

#[derive(Clone, Default, Debug)]
struct Cell
{
    letter: Option<u8>,
    /// Indices into [Grid::words] of the words covering the cell
    occupants: Vec<usize>,
}

/// # Represents the board of one generation attempt
///
/// The board is a square of fixed side, words are only ever added, never moved or removed.
/// Legality is a pure predicate ([Grid::can_place]) evaluated before anything is written.
///
/// A placement is legal when
/// - the whole run is inside the board,
/// - every letter lands on an empty cell or on the same letter of a perpendicular word,
/// - the cells right before and right after the run are empty,
/// - the two perpendicular neighbours of every cell that is not a crossing are empty.
///
/// ```text
///  . . . . . .
///  . T . . . .
///  M A T E . .   <- "MATE" crossing "TAME" on the A
///  . M . . . .
///  . E . . . .
/// ```
///
/// # Example
///
/// ```
/// # use vocab_crossword::grid::Grid;
/// # use vocab_crossword::word::{Direction, Position, Word};
/// let mut grid = Grid::new(10);
/// grid.place(&Word::new(1, "tame", ""), Position::new(1, 1), Direction::Vertical).unwrap();
///
/// assert!(grid.can_place(b"MATE", Position::new(0, 2), Direction::Horizontal));
/// // side by side with TAME
/// assert!(!grid.can_place(b"MATE", Position::new(2, 1), Direction::Vertical));
/// ```
#[derive(Clone, Debug)]
pub struct Grid<Id: WordKey>
{
    size: usize,
    cells: Vec<Cell>,
    words: Vec<PlacedWord<Id>>,
}

impl<Id: WordKey> Grid<Id>
{
    /// Creates an empty board of `size` x `size` cells
    pub fn new(size: usize) -> Grid<Id>
    {
        Grid { size, cells: vec![Cell::default(); size * size], words: Vec::new() }
    }

    pub fn size(&self) -> usize
    {
        self.size
    }

    /// Placed words in placement order
    pub fn words(&self) -> &[PlacedWord<Id>]
    {
        &self.words
    }

    pub fn is_empty(&self) -> bool
    {
        self.words.is_empty()
    }

    pub fn in_bounds(&self, pos: Position) -> bool
    {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.size && (pos.y as usize) < self.size
    }

    fn cell(&self, pos: Position) -> Option<&Cell>
    {
        self.in_bounds(pos).then(|| &self.cells[pos.y as usize * self.size + pos.x as usize])
    }

    /// Cells outside the board count as blank
    fn is_blank(&self, pos: Position) -> bool
    {
        self.cell(pos).map_or(true, |c| c.letter.is_none())
    }

    pub fn letter_at(&self, pos: Position) -> Option<u8>
    {
        self.cell(pos).and_then(|c| c.letter)
    }

    /// Placed words covering the cell at `pos`
    pub fn occupants_at(&self, pos: Position) -> impl Iterator<Item = &PlacedWord<Id>> + '_
    {
        self.cell(pos).into_iter().flat_map(|c| c.occupants.iter().map(|&i| &self.words[i]))
    }

    /// Checks if `term` can be written starting at `start` going `dir`
    pub fn can_place(&self, term: &[u8], start: Position, dir: Direction) -> bool
    {
        self.crossings_for(term, start, dir).is_some()
    }

    /// Returns the crossings a placement would create, or None if the placement is illegal
    pub fn crossings_for(&self, term: &[u8], start: Position, dir: Direction) -> Option<Vec<Crossing<Id>>>
    {
        if term.is_empty() { return None; }

        let end = start.step(dir, term.len() as i32 - 1);
        if !self.in_bounds(start) || !self.in_bounds(end) { return None; }
        if !self.is_blank(start.step(dir, -1)) || !self.is_blank(end.step(dir, 1)) { return None; }

        let across = dir.opposite();
        let mut crossings = Vec::new();

        for (index, &letter) in term.iter().enumerate()
        {
            let pos = start.step(dir, index as i32);
            let cell = self.cell(pos)?;

            match cell.letter
            {
                Some(existing) =>
                {
                    if existing != letter { return None; }

                    // only a single perpendicular word may already run through a crossing cell
                    let mut other = None;
                    for &occupant in cell.occupants.iter()
                    {
                        if self.words[occupant].direction == dir { return None; }
                        other = Some(&self.words[occupant]);
                    }
                    let other = other?;

                    crossings.push(Crossing
                    {
                        position: index,
                        other_id: other.id.clone(),
                        other_number: other.number,
                        other_position: other.index_of(pos)?,
                    });
                }
                None =>
                {
                    if !self.is_blank(pos.step(across, -1)) || !self.is_blank(pos.step(across, 1)) { return None; }
                }
            }
        }

        Some(crossings)
    }

    /// Places the [word](Word) on the board and returns it with its sequence number and crossings.
    ///
    /// # Errors
    ///
    /// [GridError::CannotPlace] - the placement fails [Grid::can_place]
    /// [GridError::MissingCrossing] - the board already holds words and this one would not cross any of them
    pub fn place(&mut self, word: &Word<Id>, start: Position, dir: Direction) -> Result<&PlacedWord<Id>, GridError>
    {
        let crossings = self.crossings_for(word.letters(), start, dir)
            .ok_or_else(|| GridError::CannotPlace { term: word.term.clone(), x: start.x, y: start.y, direction: dir })?;

        if !self.words.is_empty() && crossings.is_empty()
        {
            return Err(GridError::MissingCrossing { term: word.term.clone() });
        }

        let index = self.words.len();
        for (offset, &letter) in word.letters().iter().enumerate()
        {
            let pos = start.step(dir, offset as i32);
            let cell = &mut self.cells[pos.y as usize * self.size + pos.x as usize];
            cell.letter = Some(letter);
            cell.occupants.push(index);
        }

        self.words.push(PlacedWord
        {
            id: word.id.clone(),
            term: word.term.clone(),
            clue: word.clue.clone(),
            position: start,
            direction: dir,
            number: index as u32 + 1,
            crossings,
        });

        Ok(&self.words[index])
    }

    /// Positions of all cells holding a letter, row by row
    pub fn filled_cells(&self) -> impl Iterator<Item = Position> + '_
    {
        self.cells.iter().enumerate()
            .filter(|(_, c)| c.letter.is_some())
            .map(|(i, _)| Position::new((i % self.size) as i32, (i / self.size) as i32))
    }

    /// Smallest rectangle containing every placed word, None for an empty board
    pub fn bounding_box(&self) -> Option<BoundingBox>
    {
        self.words.iter().map(|w| w.bounding_box()).reduce(|a, b| a.union(&b))
    }

    /// Returns a matrix of the letters on the board, None for empty cells
    pub fn letter_table(&self) -> Vec<Vec<Option<char>>>
    {
        self.cells.chunks(self.size.max(1))
            .take(self.size)
            .map(|row| row.iter().map(|c| c.letter.map(char::from)).collect())
            .collect()
    }

    /// Freezes the board into an immutable [puzzle](Puzzle), the grid is gone afterwards
    pub fn into_puzzle(self, id: String) -> Puzzle<Id>
    {
        let grid = self.letter_table();
        Puzzle::new(id, self.size, grid, self.words)
    }
}
