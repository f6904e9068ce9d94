//! Splits a large word set into groups that each become one puzzle.
//!
//! Words are grouped by how well they can cross each other, see [compatibility]. Every input word ends up
//! in exactly one cluster; [cluster_words] reports a [GenerationError::ClusteringIncomplete] instead of
//! dropping words.

use std::collections::BTreeSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::{error::GenerationError, scoring::is_rare_letter, traits::WordKey, word::Word};

/// Represents all settings for [cluster_words]
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig
{
    pub min_cluster_size: usize,
    pub max_cluster_size: usize,
    pub target_cluster_size: usize,
    /// Distinct shared letters needed before a word counts as a candidate for a cluster
    pub min_overlap: usize,
}

impl Default for ClusterConfig
{
    fn default() -> Self
    {
        ClusterConfig
        {
            min_cluster_size: 6,
            max_cluster_size: 15,
            target_cluster_size: 12,
            min_overlap: 1,
        }
    }
}

impl ClusterConfig
{
    /// Smaller groups used when retrying the words that failed the first pass
    pub fn retry() -> Self
    {
        ClusterConfig
        {
            min_cluster_size: 3,
            max_cluster_size: 8,
            target_cluster_size: 6,
            min_overlap: 1,
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError>
    {
        if self.target_cluster_size == 0 || self.max_cluster_size == 0
        {
            return Err(GenerationError::InvalidConfig("cluster sizes must be positive".to_owned()));
        }
        if self.min_cluster_size > self.max_cluster_size
        {
            return Err(GenerationError::InvalidConfig(format!("min cluster size {} is above max cluster size {}", self.min_cluster_size, self.max_cluster_size)));
        }
        if self.target_cluster_size > self.max_cluster_size
        {
            return Err(GenerationError::InvalidConfig(format!("target cluster size {} is above max cluster size {}", self.target_cluster_size, self.max_cluster_size)));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty
{
    #[default]
    Easy,
    Medium,
    Hard,
}

/// Represents a group of words meant to share one puzzle
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct WordCluster<Id: WordKey>
{
    pub words: Vec<Word<Id>>,
    /// Mean [compatibility] over all pairs of words
    pub compatibility_score: f64,
    /// Mean number of distinct letters shared by a pair of words
    pub average_overlap: f64,
    pub difficulty: Difficulty,
}

impl<Id: WordKey> WordCluster<Id>
{
    pub fn new(words: Vec<Word<Id>>) -> WordCluster<Id>
    {
        let mut cluster = WordCluster { words, compatibility_score: 0.0, average_overlap: 0.0, difficulty: Difficulty::Easy };
        cluster.refresh_stats();
        cluster
    }

    pub fn len(&self) -> usize
    {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.words.is_empty()
    }

    pub fn word_ids(&self) -> BTreeSet<Id>
    {
        self.words.iter().map(|w| w.id.clone()).collect()
    }

    /// Recomputes score, overlap and difficulty after the word list changed
    pub fn refresh_stats(&mut self)
    {
        let pairs = self.words.iter().tuple_combinations::<(_, _)>().collect::<Vec<_>>();
        if pairs.is_empty()
        {
            self.compatibility_score = 0.0;
            self.average_overlap = 0.0;
        }
        else
        {
            self.compatibility_score = pairs.iter().map(|(a, b)| compatibility(*a, *b) as f64).sum::<f64>() / pairs.len() as f64;
            self.average_overlap = pairs.iter().map(|(a, b)| shared_letter_count(a.letters(), b.letters()) as f64).sum::<f64>() / pairs.len() as f64;
        }
        self.difficulty = classify_difficulty(&self.words);
    }

    /// Mean compatibility of `word` with the members of the cluster
    pub fn affinity(&self, word: &Word<Id>) -> f64
    {
        if self.words.is_empty() { return 0.0; }
        self.words.iter().map(|w| compatibility(w, word) as f64).sum::<f64>() / self.words.len() as f64
    }
}

/// Number of distinct letters found in both words
pub fn shared_letter_count(a: &[u8], b: &[u8]) -> usize
{
    let a: BTreeSet<u8> = a.iter().copied().collect();
    let b: BTreeSet<u8> = b.iter().copied().collect();
    a.intersection(&b).count()
}

/// Number of `(i, j)` with `a[i] == b[j]`, each one is a way the two words could cross
pub fn crossing_potential(a: &[u8], b: &[u8]) -> usize
{
    a.iter().cartesian_product(b.iter()).filter(|(x, y)| x == y).count()
}

/// Pairwise score: 10 per shared letter, 5 per possible crossing, 10 more when the lengths differ by at most 2
///
/// ```
/// # use vocab_crossword::cluster::compatibility;
/// # use vocab_crossword::word::Word;
/// let team = Word::new(1, "team", "");
/// let mate = Word::new(2, "mate", "");
/// assert_eq!(compatibility(&team, &mate), 4 * 10 + 4 * 5 + 10);
/// ```
pub fn compatibility<Id: WordKey>(a: &Word<Id>, b: &Word<Id>) -> u32
{
    let shared = shared_letter_count(a.letters(), b.letters()) as u32;
    let potential = crossing_potential(a.letters(), b.letters()) as u32;
    let similar_length = if a.len().abs_diff(b.len()) <= 2 { 10 } else { 0 };

    shared * 10 + potential * 5 + similar_length
}

/// Hard if more than 30% of the letters are rare or words average above 9 letters, medium above 10% or 7 letters
pub fn classify_difficulty<Id: WordKey>(words: &[Word<Id>]) -> Difficulty
{
    let letters: usize = words.iter().map(|w| w.len()).sum();
    if letters == 0 { return Difficulty::Easy; }

    let rare = words.iter().flat_map(|w| w.letters().iter()).filter(|&&l| is_rare_letter(l)).count();
    let rare_ratio = rare as f64 / letters as f64;
    let average_length = letters as f64 / words.len() as f64;

    if rare_ratio > 0.3 || average_length > 9.0 { Difficulty::Hard }
    else if rare_ratio > 0.1 || average_length > 7.0 { Difficulty::Medium }
    else { Difficulty::Easy }
}

/// Number of clusters for `count` words, starting from `ceil(count / target)`
fn cluster_count(count: usize, config: &ClusterConfig) -> usize
{
    let mut clusters = count.div_ceil(config.target_cluster_size).max(1);
    while clusters > 1 && count / clusters < config.min_cluster_size
    {
        clusters -= 1;
    }
    clusters.max(count.div_ceil(config.max_cluster_size))
}

/// Partitions `words` into near equal clusters of words that cross each other well.
///
/// Clusters are seeded with the longest words, then filled round robin: each turn the current cluster takes
/// the unassigned word with the best mean [compatibility] with its members. A word only competes for a
/// cluster if it shares at least `min_overlap` letters with one of the members; when nobody qualifies the
/// cluster takes the next unassigned word anyway.
///
/// # Errors
///
/// [GenerationError::InvalidConfig] - the config fails [ClusterConfig::validate]
/// [GenerationError::ClusteringIncomplete] - some word ended up in no cluster
pub fn cluster_words<Id: WordKey>(words: &[Word<Id>], config: &ClusterConfig) -> Result<Vec<WordCluster<Id>>, GenerationError>
{
    config.validate()?;
    if words.is_empty() { return Ok(Vec::new()); }

    let count = words.len();
    let scores = (0..count).map(|i| (0..count).map(|j| compatibility(&words[i], &words[j])).collect::<Vec<_>>()).collect::<Vec<_>>();
    let overlaps = (0..count).map(|i| (0..count).map(|j| shared_letter_count(words[i].letters(), words[j].letters())).collect::<Vec<_>>()).collect::<Vec<_>>();

    let order = (0..count).sorted_by(|&a, &b| words[b].len().cmp(&words[a].len())).collect::<Vec<_>>();
    let mut assigned = vec![false; count];
    let mut members: Vec<Vec<usize>> = Vec::new();

    for &index in order.iter().take(cluster_count(count, config))
    {
        assigned[index] = true;
        members.push(vec![index]);
    }

    let mut remaining = count - members.len();
    let mut turn = 0;
    while remaining > 0 && members.iter().any(|m| m.len() < config.max_cluster_size)
    {
        let current = turn % members.len();
        turn += 1;
        if members[current].len() >= config.max_cluster_size { continue; }

        let mut best: Option<(usize, f64)> = None;
        for &candidate in order.iter().filter(|&&i| !assigned[i])
        {
            if !members[current].iter().any(|&m| overlaps[candidate][m] >= config.min_overlap) { continue; }

            let affinity = members[current].iter().map(|&m| scores[candidate][m] as f64).sum::<f64>() / members[current].len() as f64;
            if best.map_or(true, |(_, score)| affinity > score)
            {
                best = Some((candidate, affinity));
            }
        }

        let pick = match best
        {
            Some((index, _)) => index,
            None => match order.iter().find(|&&i| !assigned[i])
            {
                Some(&index) => index,
                None => break,
            },
        };

        assigned[pick] = true;
        members[current].push(pick);
        remaining -= 1;
    }

    let clusters = members.into_iter()
        .map(|m| WordCluster::new(m.into_iter().map(|i| words[i].clone()).collect()))
        .collect::<Vec<_>>();

    verify_coverage(words, &clusters)?;
    Ok(clusters)
}

/// Checks that every input word id is in some cluster
pub fn verify_coverage<Id: WordKey>(words: &[Word<Id>], clusters: &[WordCluster<Id>]) -> Result<(), GenerationError>
{
    let covered: BTreeSet<&Id> = clusters.iter().flat_map(|c| c.words.iter().map(|w| &w.id)).collect();
    let missing = words.iter().map(|w| &w.id).collect::<BTreeSet<_>>().difference(&covered).count();

    if missing > 0 { Err(GenerationError::ClusteringIncomplete { missing }) } else { Ok(()) }
}

/// Moves words that could not be placed in their cluster to the *other* cluster they fit best.
///
/// `failed` pairs each word with the index of the cluster it failed in. Clusters below `max_cluster_size`
/// are preferred. Stats of every touched cluster are recomputed. Returns the indices of the clusters that
/// received words; a word stays where it is when there is no other cluster.
pub fn redistribute_failed_words<Id: WordKey>(clusters: &mut [WordCluster<Id>], failed: &[(Word<Id>, usize)], config: &ClusterConfig) -> BTreeSet<usize>
{
    let mut receivers = BTreeSet::new();
    let mut touched = BTreeSet::new();

    for (word, origin) in failed.iter()
    {
        let mut best: Option<(usize, bool, f64)> = None;
        for (index, cluster) in clusters.iter().enumerate()
        {
            if index == *origin { continue; }

            let has_room = cluster.len() < config.max_cluster_size;
            let affinity = cluster.affinity(word);
            let better = match best
            {
                None => true,
                Some((_, best_room, best_affinity)) => (has_room && !best_room) || (has_room == best_room && affinity > best_affinity),
            };
            if better { best = Some((index, has_room, affinity)); }
        }

        let Some((target, _, _)) = best else { continue };

        if let Some(origin_cluster) = clusters.get_mut(*origin)
        {
            if let Some(pos) = origin_cluster.words.iter().position(|w| w == word)
            {
                origin_cluster.words.remove(pos);
                touched.insert(*origin);
            }
        }
        clusters[target].words.push(word.clone());
        receivers.insert(target);
        touched.insert(target);
    }

    for index in touched
    {
        clusters[index].refresh_stats();
    }

    receivers
}
