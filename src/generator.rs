use std::{collections::BTreeSet, hash::{Hash, Hasher}, sync::atomic::{AtomicBool, Ordering}, time::{Duration, Instant}};

use serde::{Deserialize, Serialize};

use crate::{cluster::{cluster_words, redistribute_failed_words, ClusterConfig, Difficulty, WordCluster}, connectivity, diagnostics::{DiagnosticsSink, LogSink}, error::GenerationError, grid::Grid, placement::find_placements, puzzle::Puzzle, scoring::{Scorer, ScoringWeights}, traits::{ProgressFn, WordKey}, word::{normalize_term, Word}};

/// What to do with a puzzle whose words don't all hang together
#[derive(Clone, Copy, Eq, PartialEq, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityMode
{
    /// Keep the puzzle and log a warning
    #[default]
    Lenient,
    /// Fail with [GenerationError::Disconnected]
    Strict,
}

/// Represents all settings for laying out a single puzzle
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig
{
    pub max_grid_size: usize,
    pub min_grid_size: usize,
    /// Wall clock budget for one call, shared by every puzzle of a multi puzzle call
    pub timeout_ms: u64,
    /// Crossings a word needs to be placed, the seed word is exempt
    pub min_crossings_per_word: usize,
    pub max_attempts_per_word: usize,
    pub connectivity: ConnectivityMode,
    pub weights: ScoringWeights,
}

impl Default for GeneratorConfig
{
    fn default() -> Self
    {
        GeneratorConfig
        {
            max_grid_size: 16,
            min_grid_size: 10,
            timeout_ms: 10_000,
            min_crossings_per_word: 1,
            max_attempts_per_word: 100,
            connectivity: ConnectivityMode::Lenient,
            weights: ScoringWeights::default(),
        }
    }
}

impl GeneratorConfig
{
    pub fn validate(&self) -> Result<(), GenerationError>
    {
        if self.min_grid_size == 0
        {
            return Err(GenerationError::InvalidConfig("grid size must be positive".to_owned()));
        }
        if self.min_grid_size > self.max_grid_size
        {
            return Err(GenerationError::InvalidConfig(format!("min grid size {} is above max grid size {}", self.min_grid_size, self.max_grid_size)));
        }
        Ok(())
    }

    /// Side of the board for a word list whose longest word has `longest` letters
    ///
    /// ```
    /// # use vocab_crossword::generator::GeneratorConfig;
    /// let config = GeneratorConfig::default();
    /// assert_eq!(config.grid_size_for(3), 10);
    /// assert_eq!(config.grid_size_for(6), 12);
    /// assert_eq!(config.grid_size_for(11), 16);
    /// ```
    pub fn grid_size_for(&self, longest: usize) -> usize
    {
        (longest * 2).clamp(self.min_grid_size, self.max_grid_size)
    }

    pub fn timeout(&self) -> Duration
    {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Represents all settings for a [generator](PuzzleGenerator), serialized as one flat object.
#[derive(Clone, PartialEq, Default, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings
{
    #[serde(flatten)]
    pub generator: GeneratorConfig,
    #[serde(flatten)]
    pub clustering: ClusterConfig,
}

impl GeneratorSettings
{
    pub fn validate(&self) -> Result<(), GenerationError>
    {
        self.generator.validate()?;
        self.clustering.validate()
    }
}

/// Why the placement loop stopped
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason
{
    /// Every word was tried
    #[default]
    Completed,
    /// Failed attempts went past `max_attempts_per_word` times the word count
    AttemptBudgetExhausted,
    /// `timeout_ms` ran out, the puzzle holds what was placed so far
    TimedOut,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage
{
    Clustering,
    Placing,
    Retrying,
    Redistributing,
    Done,
}

/// Progress notification, `percent` goes from 0 to 100 over a whole call
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Progress
{
    pub stage: Stage,
    pub percent: u8,
}

/// Result of laying out one puzzle
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PuzzleOutcome<Id: WordKey>
{
    pub puzzle: Puzzle<Id>,
    /// Input words that are not in the puzzle
    pub unplaced: Vec<Id>,
    pub stop_reason: StopReason,
    pub failed_attempts: usize,
    pub connected: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ClusterSummary
{
    pub size: usize,
    pub compatibility_score: f64,
    pub average_overlap: f64,
    pub difficulty: Difficulty,
}

/// Result of covering a word set with several puzzles
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MultiPuzzleOutcome<Id: WordKey>
{
    pub puzzles: Vec<Puzzle<Id>>,
    pub clusters: Vec<ClusterSummary>,
    pub total_words: usize,
    pub placed_words: usize,
    /// Placed words over input words, in percent
    pub coverage: f64,
    pub unplaced: Vec<Id>,
    pub stop_reason: StopReason,
}

/// FNV-1a, stable across runs and platforms of the same pointer width
struct Fnv1a(u64);

impl Hasher for Fnv1a
{
    fn finish(&self) -> u64
    {
        self.0
    }

    fn write(&mut self, bytes: &[u8])
    {
        for &byte in bytes
        {
            self.0 ^= byte as u64;
            self.0 = self.0.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }
}

/// Seed of a word set, derived from the sorted word ids so input order doesn't matter
///
/// ```
/// # use vocab_crossword::generator::generation_seed;
/// # use vocab_crossword::word::Word;
/// let a = [Word::new("w1", "tea", ""), Word::new("w2", "eat", "")];
/// let b = [Word::new("w2", "eat", ""), Word::new("w1", "tea", "")];
/// assert_eq!(generation_seed(&a), generation_seed(&b));
/// ```
pub fn generation_seed<Id: WordKey>(words: &[Word<Id>]) -> u64
{
    let mut ids = words.iter().map(|w| &w.id).collect::<Vec<_>>();
    ids.sort();

    let mut hasher = Fnv1a(0xcbf2_9ce4_8422_2325);
    for id in ids
    {
        id.hash(&mut hasher);
    }
    hasher.finish()
}

/// Deadline for a call, None when the timeout doesn't fit in an Instant
fn deadline_after(timeout: Duration) -> Option<Instant>
{
    Instant::now().checked_add(timeout)
}

fn past(deadline: Option<Instant>) -> bool
{
    deadline.map_or(false, |d| Instant::now() >= d)
}

/// Normalized copies of `words`, ordered by id so that only the id set decides the layout
fn canonical_words<Id: WordKey>(words: &[Word<Id>]) -> Vec<Word<Id>>
{
    let mut canonical = words.iter()
        .map(|w| Word { id: w.id.clone(), term: normalize_term(&w.term), clue: w.clue.clone() })
        .collect::<Vec<_>>();
    canonical.sort_by(|a, b| a.id.cmp(&b.id));
    canonical
}

/// Words of `cluster` missing from `puzzle`
fn dropped_words<Id: WordKey>(cluster: &WordCluster<Id>, puzzle: Option<&Puzzle<Id>>) -> Vec<Word<Id>>
{
    let placed = puzzle.map(|p| p.word_ids()).unwrap_or_default();
    cluster.words.iter().filter(|w| !placed.contains(&w.id)).cloned().collect()
}

/// Lays out word lists into crossword [puzzles](Puzzle).
///
/// The layout is greedy: words go in longest first, each one at the best scoring legal spot, and nothing is ever
/// moved once placed. Everything is deterministic, the same words and settings always give the same puzzles.
///
/// # Example
/// ```
/// use vocab_crossword::generator::{GeneratorSettings, PuzzleGenerator};
/// use vocab_crossword::word::Word;
///
/// let words = ["master", "steam", "meat", "tea"].iter().enumerate()
///     .map(|(i, t)| Word::new(i, t, ""))
///     .collect::<Vec<_>>();
///
/// let settings = GeneratorSettings::default();
/// let outcome = PuzzleGenerator::new(&settings).generate_puzzle(&words).unwrap();
///
/// let first = &outcome.puzzle.placed_words()[0];
/// assert_eq!((first.term.as_str(), first.number), ("MASTER", 1));
/// assert!(outcome.puzzle.placed_words()[1..].iter().all(|w| !w.crossings.is_empty()));
/// ```
pub struct PuzzleGenerator<'a>
{
    settings: &'a GeneratorSettings,
    sink: &'a dyn DiagnosticsSink,
    cancel: Option<&'a AtomicBool>,
    progress: Option<&'a (dyn Fn(Progress) + Send + Sync)>,
}

impl<'a> PuzzleGenerator<'a>
{
    pub fn new(settings: &'a GeneratorSettings) -> PuzzleGenerator<'a>
    {
        PuzzleGenerator { settings, sink: &LogSink, cancel: None, progress: None }
    }

    pub fn with_sink(mut self, sink: &'a dyn DiagnosticsSink) -> Self
    {
        self.sink = sink;
        self
    }

    /// Generation stops with [GenerationError::Cancelled] once the flag is set, checked before every word
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self
    {
        self.cancel = Some(flag);
        self
    }

    pub fn with_progress<F: ProgressFn>(mut self, progress: &'a F) -> Self
    {
        self.progress = Some(progress as &(dyn Fn(Progress) + Send + Sync));
        self
    }

    fn report(&self, stage: Stage, percent: usize)
    {
        if let Some(progress) = self.progress
        {
            progress(Progress { stage, percent: percent.min(100) as u8 });
        }
    }

    fn check_cancelled(&self) -> Result<(), GenerationError>
    {
        match self.cancel
        {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(GenerationError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Normalized words, longest first, ties ordered by id
    fn prepare_words<Id: WordKey>(&self, words: &[Word<Id>]) -> Vec<Word<Id>>
    {
        let mut prepared = Vec::with_capacity(words.len());
        for word in words.iter()
        {
            let term = normalize_term(&word.term);
            if term.is_empty()
            {
                self.sink.warn(&format!("skipping word {:?}, no letters in {:?}", word.id, word.term));
                continue;
            }
            prepared.push(Word { id: word.id.clone(), term, clue: word.clue.clone() });
        }
        prepared.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.id.cmp(&b.id)));
        prepared
    }

    /// Lays out one puzzle.
    ///
    /// # Errors
    ///
    /// [GenerationError::GenerationFailed] - not a single word could be placed
    /// [GenerationError::Disconnected] - the words don't form one group and connectivity is [strict](ConnectivityMode::Strict)
    /// [GenerationError::Cancelled] - the cancel flag was set
    /// [GenerationError::InvalidConfig] - the settings don't validate
    pub fn generate_puzzle<Id: WordKey>(&self, words: &[Word<Id>]) -> Result<PuzzleOutcome<Id>, GenerationError>
    {
        self.settings.generator.validate()?;
        let deadline = deadline_after(self.settings.generator.timeout());

        let outcome = self.place_words(words, deadline, (0, 100))?;
        self.report(Stage::Done, 100);
        Ok(outcome)
    }

    fn place_words<Id: WordKey>(&self, words: &[Word<Id>], deadline: Option<Instant>, span: (usize, usize)) -> Result<PuzzleOutcome<Id>, GenerationError>
    {
        let config = &self.settings.generator;
        let prepared = self.prepare_words(words);
        let Some(longest) = prepared.first().map(|w| w.len()) else
        {
            return Err(GenerationError::GenerationFailed { words: words.len() });
        };

        let size = config.grid_size_for(longest);
        let mut grid = Grid::new(size);
        let budget = config.max_attempts_per_word.saturating_mul(prepared.len());
        let mut failed_attempts = 0;
        let mut stop_reason = StopReason::Completed;
        let mut unplaced: Vec<Id> = words.iter().filter(|w| normalize_term(&w.term).is_empty()).map(|w| w.id.clone()).collect();

        for (index, word) in prepared.iter().enumerate()
        {
            self.check_cancelled()?;
            // the seed word is always tried so that a timed out puzzle still holds something
            if !grid.is_empty() && past(deadline)
            {
                stop_reason = StopReason::TimedOut;
            }
            else if failed_attempts > budget
            {
                stop_reason = StopReason::AttemptBudgetExhausted;
            }
            if stop_reason != StopReason::Completed
            {
                self.sink.warn(&format!("stopping after {index} of {} words: {stop_reason:?}", prepared.len()));
                unplaced.extend(prepared[index..].iter().map(|w| w.id.clone()));
                break;
            }

            let search = find_placements(&grid, word);
            failed_attempts += search.rejected;

            let min_crossings = if grid.is_empty() { 0 } else { config.min_crossings_per_word.max(1) };
            let best = Scorer::new(&grid, &config.weights)
                .rank(search.options)
                .into_iter()
                .find(|o| o.crossings.len() >= min_crossings);

            match best
            {
                None =>
                {
                    failed_attempts += 1;
                    unplaced.push(word.id.clone());
                    self.sink.debug(&format!("no placement for {}", word.term));
                }
                Some(option) =>
                {
                    let (position, direction, score) = (option.position, option.direction, option.score);
                    match grid.place(word, position, direction)
                    {
                        Ok(placed) => self.sink.debug(&format!("placed {} #{} at ({}, {}) {:?}, score {score:.2}",
                                                               placed.term, placed.number, position.x, position.y, direction)),
                        Err(e) =>
                        {
                            failed_attempts += 1;
                            unplaced.push(word.id.clone());
                            self.sink.warn(&e.to_string());
                        }
                    }
                }
            }

            self.report(Stage::Placing, span.0 + (span.1 - span.0) * (index + 1) / prepared.len());
        }

        if grid.is_empty()
        {
            return Err(GenerationError::GenerationFailed { words: words.len() });
        }

        let report = connectivity::check_grid(&grid);
        if !report.connected
        {
            match config.connectivity
            {
                ConnectivityMode::Lenient => self.sink.warn(&format!("puzzle is split into {} groups, words {:?} are not reachable from the first word",
                                                                     report.components, report.unreachable)),
                ConnectivityMode::Strict => return Err(GenerationError::Disconnected { components: report.components }),
            }
        }

        self.sink.info(&format!("placed {} of {} words on a {size}x{size} grid", grid.words().len(), words.len()));

        let id = format!("xw-{:016x}", generation_seed(words));
        Ok(PuzzleOutcome { puzzle: grid.into_puzzle(id), unplaced, stop_reason, failed_attempts, connected: report.connected })
    }

    /// Places one cluster, a failed layout becomes None
    fn place_cluster<Id: WordKey>(&self, cluster: &WordCluster<Id>, deadline: Option<Instant>, span: (usize, usize), stop_reason: &mut StopReason) -> Result<Option<PuzzleOutcome<Id>>, GenerationError>
    {
        match self.place_words(&cluster.words, deadline, span)
        {
            Ok(outcome) =>
            {
                *stop_reason = (*stop_reason).max(outcome.stop_reason);
                Ok(Some(outcome))
            }
            Err(e @ (GenerationError::GenerationFailed { .. } | GenerationError::Disconnected { .. })) =>
            {
                self.sink.warn(&format!("cluster of {} words produced no puzzle: {e}", cluster.len()));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Covers `words` with as many puzzles as needed.
    ///
    /// Small lists (up to `max_cluster_size` words) give a single puzzle. Larger ones are split with
    /// [cluster_words], one puzzle per cluster. Words dropped by a puzzle are re-clustered into smaller groups
    /// ([ClusterConfig::retry]) and tried once more; whatever still fails is offered to the other clusters
    /// with [redistribute_failed_words]. Coverage is best effort.
    ///
    /// # Errors
    ///
    /// [GenerationError::GenerationFailed] - no puzzle at all could be made
    /// [GenerationError::Cancelled] - the cancel flag was set
    /// [GenerationError::InvalidConfig] - the settings don't validate
    pub fn generate_puzzles<Id: WordKey>(&self, words: &[Word<Id>]) -> Result<MultiPuzzleOutcome<Id>, GenerationError>
    {
        self.settings.validate()?;
        let deadline = deadline_after(self.settings.generator.timeout());
        let clustering = &self.settings.clustering;
        let words = canonical_words(words);
        let words = words.as_slice();

        self.report(Stage::Clustering, 0);
        let clusters = if words.len() <= clustering.max_cluster_size
        {
            vec![WordCluster::new(words.to_vec())]
        }
        else
        {
            match cluster_words(words, clustering)
            {
                Ok(clusters) => clusters,
                Err(e @ GenerationError::ClusteringIncomplete { .. }) =>
                {
                    self.sink.warn(&format!("{e} Falling back to a single cluster."));
                    vec![WordCluster::new(words.to_vec())]
                }
                Err(e) => return Err(e),
            }
        };
        self.sink.info(&format!("{} words split into {} clusters", words.len(), clusters.len()));
        self.report(Stage::Clustering, 10);

        let mut stop_reason = StopReason::Completed;
        let mut runs: Vec<(WordCluster<Id>, Option<PuzzleOutcome<Id>>)> = Vec::with_capacity(clusters.len());
        let count = clusters.len();
        for (index, cluster) in clusters.into_iter().enumerate()
        {
            let span = (10 + 70 * index / count, 10 + 70 * (index + 1) / count);
            let outcome = self.place_cluster(&cluster, deadline, span, &mut stop_reason)?;
            runs.push((cluster, outcome));
        }

        // words dropped in the first pass leave their cluster and get a second chance in smaller groups
        let mut failed = Vec::new();
        for (cluster, outcome) in runs.iter_mut()
        {
            let dropped = dropped_words(cluster, outcome.as_ref().map(|o| &o.puzzle));
            if dropped.is_empty() { continue; }
            cluster.words.retain(|w| !dropped.contains(w));
            cluster.refresh_stats();
            failed.extend(dropped);
        }

        if !failed.is_empty() && !past(deadline)
        {
            self.report(Stage::Retrying, 80);
            self.sink.info(&format!("retrying {} words", failed.len()));
            let retry_clusters = cluster_words(&failed, &ClusterConfig::retry()).unwrap_or_else(|e|
            {
                self.sink.warn(&format!("{e} Retrying the failed words as a single cluster."));
                vec![WordCluster::new(failed.clone())]
            });

            for cluster in retry_clusters
            {
                let outcome = self.place_cluster(&cluster, deadline, (80, 90), &mut stop_reason)?;
                runs.push((cluster, outcome));
            }
        }

        let still_failed = runs.iter().enumerate()
            .flat_map(|(index, (cluster, outcome))| dropped_words(cluster, outcome.as_ref().map(|o| &o.puzzle)).into_iter().map(move |w| (w, index)))
            .collect::<Vec<_>>();

        if !still_failed.is_empty() && runs.len() > 1 && !past(deadline)
        {
            self.report(Stage::Redistributing, 90);
            let mut clusters = runs.iter().map(|(c, _)| c.clone()).collect::<Vec<_>>();
            let receivers = redistribute_failed_words(&mut clusters, &still_failed, clustering);

            for (index, cluster) in clusters.into_iter().enumerate()
            {
                runs[index].0 = cluster;
            }

            for index in receivers
            {
                self.check_cancelled()?;
                let before = runs[index].1.as_ref().map_or(0, |o| o.puzzle.placed_words().len());
                let mut attempt_stop = StopReason::Completed;
                if let Some(outcome) = self.place_cluster(&runs[index].0, deadline, (90, 99), &mut attempt_stop)?
                {
                    if outcome.puzzle.placed_words().len() > before
                    {
                        stop_reason = stop_reason.max(attempt_stop);
                        runs[index].1 = Some(outcome);
                    }
                }
            }
        }

        let placed_words = runs.iter().filter_map(|(_, o)| o.as_ref()).map(|o| o.puzzle.placed_words().len()).sum::<usize>();
        if placed_words == 0
        {
            return Err(GenerationError::GenerationFailed { words: words.len() });
        }

        let mut unplaced = BTreeSet::new();
        for (cluster, outcome) in runs.iter()
        {
            unplaced.extend(dropped_words(cluster, outcome.as_ref().map(|o| &o.puzzle)).into_iter().map(|w| w.id));
        }

        let coverage = placed_words as f64 * 100.0 / words.len() as f64;
        self.sink.info(&format!("placed {placed_words} of {} words in total ({coverage:.1}%)", words.len()));
        self.report(Stage::Done, 100);

        let (clusters, puzzles): (Vec<_>, Vec<_>) = runs.into_iter()
            .filter(|(cluster, _)| !cluster.is_empty())
            .map(|(cluster, outcome)|
            {
                let summary = ClusterSummary
                {
                    size: cluster.len(),
                    compatibility_score: cluster.compatibility_score,
                    average_overlap: cluster.average_overlap,
                    difficulty: cluster.difficulty,
                };
                (summary, outcome.map(|o| o.puzzle))
            })
            .unzip();

        Ok(MultiPuzzleOutcome
        {
            puzzles: puzzles.into_iter().flatten().collect(),
            clusters,
            total_words: words.len(),
            placed_words,
            coverage,
            unplaced: unplaced.into_iter().collect(),
            stop_reason,
        })
    }
}
