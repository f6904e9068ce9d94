use serde::{Deserialize, Serialize};
use crate::{grid::Grid, placed_word::{run_bounding_box, run_midpoint, BoundingBox}, placement::PlacementOption, traits::WordKey, word::Position};

/// Weights of the terms of a placement score
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights
{
    pub crossings: f64,
    pub density: f64,
    pub rarity: f64,
    pub center: f64,
    pub bounding_box_penalty: f64,
}

impl Default for ScoringWeights
{
    fn default() -> Self
    {
        ScoringWeights
        {
            crossings: 100.0,
            density: 50.0,
            rarity: 10.0,
            center: 25.0,
            bounding_box_penalty: 15.0,
        }
    }
}

/// How hard a letter is to cross, 1 for the most common English letters up to 5 for J, Q, X and Z
pub fn letter_rarity(letter: u8) -> f64
{
    match letter.to_ascii_uppercase()
    {
        b'E' | b'A' | b'I' | b'O' | b'N' | b'R' | b'T' | b'L' | b'S' | b'U' => 1.0,
        b'D' | b'G' => 2.0,
        b'B' | b'C' | b'M' | b'P' => 3.0,
        b'F' | b'H' | b'V' | b'W' | b'Y' | b'K' => 4.0,
        b'J' | b'X' | b'Q' | b'Z' => 5.0,
        _ => 1.0,
    }
}

/// Letters worth 4 or more in [letter_rarity]
pub fn is_rare_letter(letter: u8) -> bool
{
    letter_rarity(letter) >= 4.0
}

/// Unweighted terms of a placement score
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct ScoreBreakdown
{
    pub crossings: f64,
    /// 1 / (1 + mean distance to filled cells / grid size), 0 on an empty grid
    pub density: f64,
    /// Mean [letter_rarity] of the crossed letters
    pub rarity: f64,
    /// 1 at the center of the grid, 0 in a corner
    pub center: f64,
    /// Relative growth of the area of the bounding box of all placed words
    pub bounding_box_growth: f64,
}

/// Ranks [placement options](PlacementOption) against the current state of one [grid](Grid).
///
/// The scorer takes a snapshot of the filled cells when created, create a new one after every placement.
pub struct Scorer<'g, Id: WordKey>
{
    grid: &'g Grid<Id>,
    weights: &'g ScoringWeights,
    filled: Vec<Position>,
    bounding_box: Option<BoundingBox>,
}

impl<'g, Id: WordKey> Scorer<'g, Id>
{
    pub fn new(grid: &'g Grid<Id>, weights: &'g ScoringWeights) -> Scorer<'g, Id>
    {
        Scorer { grid, weights, filled: grid.filled_cells().collect(), bounding_box: grid.bounding_box() }
    }

    pub fn breakdown(&self, option: &PlacementOption<Id>) -> ScoreBreakdown
    {
        let len = option.word.len();
        let size = self.grid.size() as f64;
        let cells = (0..len).map(|i| option.position.step(option.direction, i as i32)).collect::<Vec<_>>();

        let density = if self.filled.is_empty() { 0.0 } else
        {
            let total: i64 = cells.iter()
                .flat_map(|c| self.filled.iter().map(move |f| ((c.x - f.x).abs() + (c.y - f.y).abs()) as i64))
                .sum();
            let mean = total as f64 / (cells.len() * self.filled.len()) as f64;
            1.0 / (1.0 + mean / size)
        };

        let letters = option.word.letters();
        let rarity = if option.crossings.is_empty() { 0.0 } else
        {
            option.crossings.iter().map(|c| letter_rarity(letters[c.position])).sum::<f64>() / option.crossings.len() as f64
        };

        let (mx, my) = run_midpoint(option.position, option.direction, len);
        let middle = (size - 1.0) / 2.0;
        let max_distance = middle * std::f64::consts::SQRT_2;
        let distance = ((mx - middle).powi(2) + (my - middle).powi(2)).sqrt();
        let center = if max_distance > 0.0 { (1.0 - distance / max_distance).max(0.0) } else { 1.0 };

        let bounding_box_growth = match &self.bounding_box
        {
            None => 0.0,
            Some(current) =>
            {
                let grown = current.union(&run_bounding_box(option.position, option.direction, len));
                (grown.area() - current.area()) as f64 / current.area() as f64
            }
        };

        ScoreBreakdown { crossings: option.crossings.len() as f64, density, rarity, center, bounding_box_growth }
    }

    pub fn score(&self, option: &PlacementOption<Id>) -> f64
    {
        let b = self.breakdown(option);
        let w = self.weights;

        w.crossings * b.crossings
            + w.density * b.density
            + w.rarity * b.rarity
            + w.center * b.center
            - w.bounding_box_penalty * b.bounding_box_growth
    }

    /// Scores every option and sorts them best first, equal scores keep their original order
    pub fn rank<'w>(&self, mut options: Vec<PlacementOption<'w, Id>>) -> Vec<PlacementOption<'w, Id>>
    {
        for option in options.iter_mut()
        {
            option.score = self.score(option);
        }
        options.sort_by(|a, b| b.score.total_cmp(&a.score));
        options
    }
}
