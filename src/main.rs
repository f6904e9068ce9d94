use std::{error::Error, fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::LevelFilter;
use serde::Serialize;

use vocab_crossword::{generator::{ConnectivityMode, GeneratorSettings, PuzzleGenerator}, puzzle::Puzzle, word::Word};

/// Lays out a word list as one or more crossword puzzles
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli
{
    /// JSON file with an array of {"id", "term", "clue"} objects
    #[arg(short, long, conflicts_with = "words")]
    input: Option<PathBuf>,

    /// Comma separated terms, numbered from 1 and without clues
    #[arg(short, long, value_delimiter = ',')]
    words: Vec<String>,

    /// JSON file with generator and clustering settings in one flat object, missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_grid: Option<usize>,

    #[arg(long)]
    max_grid: Option<usize>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Fail on puzzles whose words are not all connected
    #[arg(long)]
    strict: bool,

    /// Put everything in a single puzzle instead of splitting into clusters
    #[arg(long)]
    single: bool,

    #[arg(long)]
    debug: bool,

    #[arg(long)]
    pretty: bool,
}

fn init_logger(debug: bool)
{
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Warn };

    let mut builder = env_logger::Builder::new();
    builder.filter(None, level).format_timestamp(None);
    if let Ok(filters) = std::env::var("RUST_LOG")
    {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn load_words(cli: &Cli) -> Result<Vec<Word<String>>, Box<dyn Error>>
{
    match &cli.input
    {
        Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        None if !cli.words.is_empty() => Ok(cli.words.iter().enumerate().map(|(i, t)| Word::new((i + 1).to_string(), t, "")).collect()),
        None => Err("no words given, use --input or --words".into()),
    }
}

fn load_settings(cli: &Cli) -> Result<GeneratorSettings, Box<dyn Error>>
{
    let mut settings = match &cli.config
    {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => GeneratorSettings::default(),
    };

    if let Some(size) = cli.min_grid { settings.generator.min_grid_size = size; }
    if let Some(size) = cli.max_grid { settings.generator.max_grid_size = size; }
    if let Some(timeout) = cli.timeout_ms { settings.generator.timeout_ms = timeout; }
    if cli.strict { settings.generator.connectivity = ConnectivityMode::Strict; }

    Ok(settings)
}

fn print_json(value: &impl Serialize, pretty: bool) -> Result<(), Box<dyn Error>>
{
    let json = if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{json}");
    Ok(())
}

fn print_grid(puzzle: &Puzzle<String>)
{
    eprintln!("{} ({}x{}, {} words)", puzzle.id(), puzzle.grid_size(), puzzle.grid_size(), puzzle.placed_words().len());
    eprintln!("{}", puzzle.render());
}

fn try_main() -> Result<(), Box<dyn Error>>
{
    let cli = Cli::parse();
    init_logger(cli.debug);

    let words = load_words(&cli)?;
    let settings = load_settings(&cli)?;
    let generator = PuzzleGenerator::new(&settings);

    if cli.single
    {
        let outcome = generator.generate_puzzle(&words)?;
        print_grid(&outcome.puzzle);
        print_json(&outcome, cli.pretty)
    }
    else
    {
        let outcome = generator.generate_puzzles(&words)?;
        for puzzle in outcome.puzzles.iter()
        {
            print_grid(puzzle);
        }
        eprintln!("placed {} of {} words ({:.1}%)", outcome.placed_words, outcome.total_words, outcome.coverage);
        print_json(&outcome, cli.pretty)
    }
}

fn main() -> ExitCode
{
    match try_main()
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) =>
        {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
