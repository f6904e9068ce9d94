use std::collections::{BTreeMap, BTreeSet, VecDeque};
use crate::{grid::Grid, placed_word::PlacedWord, traits::WordKey};

/// Result of checking that every placed word can be reached from the seed word through crossings
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ConnectivityReport
{
    pub connected: bool,
    /// Number of connected groups of words, 0 when nothing is placed
    pub components: usize,
    /// Numbers of the words the seed word can't reach
    pub unreachable: Vec<u32>,
}

pub fn check_grid<Id: WordKey>(grid: &Grid<Id>) -> ConnectivityReport
{
    check_words(grid.words())
}

/// Checks a set of placed words, crossings are followed in both directions
pub fn check_words<Id: WordKey>(words: &[PlacedWord<Id>]) -> ConnectivityReport
{
    let mut edges: BTreeMap<u32, BTreeSet<u32>> = words.iter().map(|w| (w.number, BTreeSet::new())).collect();
    for word in words.iter()
    {
        for crossing in word.crossings.iter()
        {
            if !edges.contains_key(&crossing.other_number) { continue; }
            edges.entry(word.number).or_default().insert(crossing.other_number);
            edges.entry(crossing.other_number).or_default().insert(word.number);
        }
    }

    let mut seen = BTreeSet::new();
    let mut components = 0;
    let mut unreachable = Vec::new();

    for &start in edges.keys()
    {
        if seen.contains(&start) { continue; }
        components += 1;

        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some(current) = queue.pop_front()
        {
            if components > 1 { unreachable.push(current); }
            for &next in edges[&current].iter()
            {
                if seen.insert(next) { queue.push_back(next); }
            }
        }
    }

    unreachable.sort_unstable();
    ConnectivityReport { connected: components <= 1, components, unreachable }
}
