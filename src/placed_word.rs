use serde::{Deserialize, Serialize};
use crate::{traits::WordKey, word::{Direction, Position}};

/// Axis aligned rectangle of cells, bounds are inclusive
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Default, Debug, Serialize, Deserialize)]
pub struct BoundingBox
{
    pub min: Position,
    pub max: Position,
}

impl BoundingBox
{
    pub fn width(&self) -> i32
    {
        self.max.x - self.min.x + 1
    }

    pub fn height(&self) -> i32
    {
        self.max.y - self.min.y + 1
    }

    pub fn area(&self) -> i32
    {
        self.width() * self.height()
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox
    {
        BoundingBox
        {
            min: Position { x: self.min.x.min(other.min.x), y: self.min.y.min(other.min.y) },
            max: Position { x: self.max.x.max(other.max.x), y: self.max.y.max(other.max.y) },
        }
    }
}

/// Returns the box covered by a run of `len` cells starting at `start`
pub fn run_bounding_box(start: Position, dir: Direction, len: usize) -> BoundingBox
{
    BoundingBox { min: start, max: start.step(dir, len as i32 - 1) }
}

/// Represents a cell shared with another, previously placed word.
///
/// `other_number` is the sequence number of the other word; unlike the id it is unique inside a puzzle,
/// so it still points at the right word when two entries share the same id or term.
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Crossing<Id: WordKey>
{
    /// Index of the shared letter in this word
    pub position: usize,
    pub other_id: Id,
    pub other_number: u32,
    /// Index of the shared letter in the other word
    pub other_position: usize,
}

/// Represents a word committed to a [grid](crate::grid::Grid).
///
/// `number` is assigned in placement order, the seed word gets 1.
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct PlacedWord<Id: WordKey>
{
    pub id: Id,
    pub term: String,
    pub clue: String,
    pub position: Position,
    pub direction: Direction,
    pub number: u32,
    pub crossings: Vec<Crossing<Id>>,
}

impl<Id: WordKey> PlacedWord<Id>
{
    pub fn len(&self) -> usize
    {
        self.term.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.term.is_empty()
    }

    pub fn letters(&self) -> &[u8]
    {
        self.term.as_bytes()
    }

    /// Position of the `index`-th letter
    pub fn cell(&self, index: usize) -> Position
    {
        self.position.step(self.direction, index as i32)
    }

    /// Positions of all letters, first to last
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_
    {
        (0..self.len()).map(move |i| self.cell(i))
    }

    /// Returns the index of the letter at `pos` if the word covers that cell
    ///
    /// ```
    /// # use vocab_crossword::placed_word::PlacedWord;
    /// # use vocab_crossword::word::{Direction, Position};
    /// let w = PlacedWord { id: 1, term: "TEA".to_owned(), clue: String::new(), position: Position::new(2, 5),
    ///                      direction: Direction::Vertical, number: 1, crossings: vec![] };
    /// assert_eq!(w.index_of(Position::new(2, 7)), Some(2));
    /// assert_eq!(w.index_of(Position::new(3, 7)), None);
    /// ```
    pub fn index_of(&self, pos: Position) -> Option<usize>
    {
        let (along, across, start_along, start_across) = match self.direction
        {
            Direction::Horizontal => (pos.x, pos.y, self.position.x, self.position.y),
            Direction::Vertical => (pos.y, pos.x, self.position.y, self.position.x),
        };

        if across != start_across || along < start_along { return None; }
        let index = (along - start_along) as usize;
        (index < self.len()).then_some(index)
    }

    pub fn bounding_box(&self) -> BoundingBox
    {
        run_bounding_box(self.position, self.direction, self.len())
    }

    /// Cell coordinate of the middle of the word, used for balance heuristics
    pub fn midpoint(&self) -> (f64, f64)
    {
        run_midpoint(self.position, self.direction, self.len())
    }
}

/// Center of a run of `len` cells starting at `start`
pub fn run_midpoint(start: Position, dir: Direction, len: usize) -> (f64, f64)
{
    let half = (len as f64 - 1.0) / 2.0;
    match dir
    {
        Direction::Horizontal => (start.x as f64 + half, start.y as f64),
        Direction::Vertical => (start.x as f64, start.y as f64 + half),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn placed(term: &str, x: i32, y: i32, direction: Direction) -> PlacedWord<u32>
    {
        PlacedWord { id: 0, term: term.to_owned(), clue: String::new(), position: Position::new(x, y), direction, number: 1, crossings: vec![] }
    }

    #[test]
    fn test_placed_word_cells()
    {
        let w = placed("METAL", 1, 2, Direction::Horizontal);
        assert_eq!(w.cells().collect::<Vec<_>>(), (1..=5).map(|x| Position::new(x, 2)).collect::<Vec<_>>());
        assert_eq!(w.index_of(Position::new(5, 2)), Some(4));
        assert_eq!(w.index_of(Position::new(6, 2)), None);
        assert_eq!(w.index_of(Position::new(0, 2)), None);
    }

    #[test]
    fn test_bounding_box_union()
    {
        let a = placed("METAL", 1, 2, Direction::Horizontal).bounding_box();
        let b = placed("TEA", 3, 0, Direction::Vertical).bounding_box();
        let u = a.union(&b);
        assert_eq!(u, BoundingBox { min: Position::new(1, 0), max: Position::new(5, 2) });
        assert_eq!(u.area(), 15);
    }

    #[test]
    fn test_midpoint()
    {
        assert_eq!(placed("TEAM", 0, 0, Direction::Horizontal).midpoint(), (1.5, 0.0));
        assert_eq!(placed("ALE", 4, 2, Direction::Vertical).midpoint(), (4.0, 3.0));
    }
}
