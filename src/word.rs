use serde::{Deserialize, Serialize};
use crate::traits::WordKey;

/// Represents a cell coordinate on a [grid](crate::grid::Grid), `x` is the column and `y` is the row.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize)]
pub struct Position
{
    pub x: i32,
    pub y: i32,
}

impl Position
{
    pub fn new(x: i32, y: i32) -> Position
    {
        Position { x, y }
    }

    /// Returns the position `offset` cells further along `dir`
    pub fn step(&self, dir: Direction, offset: i32) -> Position
    {
        let (dx, dy) = dir.delta();
        Position { x: self.x + dx * offset, y: self.y + dy * offset }
    }
}

/// Represents the direction of a [word](crate::placed_word::PlacedWord) placed in a [grid](crate::grid::Grid)
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction
{
    #[default]
    Horizontal,
    Vertical,
}

impl Direction
{
    pub fn opposite(&self) -> Direction
    {
        match *self
        {
            Direction::Horizontal => Direction::Vertical,
            Direction::Vertical => Direction::Horizontal,
        }
    }

    /// Unit step `(dx, dy)` along the direction
    pub fn delta(&self) -> (i32, i32)
    {
        match *self
        {
            Direction::Horizontal => (1, 0),
            Direction::Vertical => (0, 1),
        }
    }
}

/// Represents a vocabulary word handed to the engine, not yet placed anywhere.
///
/// The term is normalized on construction and on deserialization: everything that is not an ASCII letter is dropped
/// and the rest is upper-cased, so `"ice-cream"` becomes `"ICECREAM"`.
///
/// ```
/// # use vocab_crossword::word::Word;
/// let w = Word::new(7u32, "Ice-cream", "a frozen dessert");
/// assert_eq!(w.term, "ICECREAM");
/// assert_eq!(w.len(), 8);
/// ```
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize)]
#[serde(from = "WordRecord<Id>")]
pub struct Word<Id: WordKey>
{
    pub id: Id,
    pub term: String,
    pub clue: String,
}

/// A word as it arrives over the wire, the clue may be left out
#[derive(Deserialize)]
struct WordRecord<Id>
{
    id: Id,
    term: String,
    #[serde(default)]
    clue: String,
}

impl<Id: WordKey> From<WordRecord<Id>> for Word<Id>
{
    fn from(record: WordRecord<Id>) -> Self
    {
        Word::new(record.id, record.term, record.clue)
    }
}

impl<Id: WordKey> Word<Id>
{
    pub fn new(id: Id, term: impl AsRef<str>, clue: impl Into<String>) -> Word<Id>
    {
        Word { id, term: normalize_term(term.as_ref()), clue: clue.into() }
    }

    /// Letters of the term as `A..=Z` bytes
    pub fn letters(&self) -> &[u8]
    {
        self.term.as_bytes()
    }

    pub fn len(&self) -> usize
    {
        self.term.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.term.is_empty()
    }
}

/// Keeps the ASCII letters of `raw`, upper-cased
pub fn normalize_term(raw: &str) -> String
{
    raw.chars().filter(char::is_ascii_alphabetic).map(|c| c.to_ascii_uppercase()).collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_normalize_term()
    {
        assert_eq!(normalize_term("état d'esprit"), "TATDESPRIT");
        assert_eq!(normalize_term("  Tea "), "TEA");
        assert_eq!(normalize_term("123"), "");
    }

    #[test]
    fn test_position_step()
    {
        let p = Position::new(3, 4);
        assert_eq!(p.step(Direction::Horizontal, 2), Position::new(5, 4));
        assert_eq!(p.step(Direction::Vertical, -1), Position::new(3, 3));
    }

    #[test]
    fn test_deserialized_word_keeps_fields()
    {
        let w: Word<String> = serde_json::from_str(r#"{"id":"w1","term":"TEA","clue":"a drink"}"#).unwrap();
        assert_eq!(w, Word::new("w1".to_owned(), "tea", "a drink"));
    }

    #[test]
    fn test_deserialized_word_is_normalized()
    {
        let w: Word<u32> = serde_json::from_str(r#"{"id":3,"term":"Ice-cream"}"#).unwrap();
        assert_eq!(w.term, "ICECREAM");
        assert_eq!(w.clue, "");
    }
}
