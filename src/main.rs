use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::warn;

use xwordgen::{ClueEntry, ClueText, Generator, GeneratorConfig, Puzzle, RunPolicy, Tier, UsedWordSet, WordEntry, WordIndex};

#[derive(Parser, Debug)]
#[command(name = "xwordgen", about = "Generate clued crossword puzzles from block templates")]
struct Args {
    /// Word pool, one `WORD;clue[;translated clue][;level]` per line
    words: PathBuf,

    /// Block templates separated by blank lines; `#` is a block, anything else is open
    templates: PathBuf,

    /// Grid size of the generated puzzles
    #[arg(short, long, default_value_t = 5)]
    size: usize,

    /// Number of puzzles to generate
    #[arg(short, long, default_value_t = 1)]
    count: usize,

    /// Generate the default easy/medium/hard batch instead of `--count` puzzles of `--size`
    #[arg(long)]
    batch: bool,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Never reuse a word across the generated puzzles
    #[arg(long)]
    session_dedup: bool,

    /// Keep a cell open when either of its runs is long enough, instead of both
    #[arg(long)]
    lenient_runs: bool,

    /// Templates to try per puzzle before giving up
    #[arg(long)]
    max_attempts: Option<usize>,
}

fn parse_word_line(line: &str) -> Option<WordEntry> {
    let mut parts = line.split(';').map(str::trim);
    let word = parts.next().filter(|word| !word.is_empty())?;
    let mut clue = ClueText::new(parts.next().unwrap_or(""));
    if let Some(zh) = parts.next().filter(|zh| !zh.is_empty()) {
        clue = clue.with_translation(zh);
    }

    let entry = WordEntry::new(word, clue);
    match parts.next().map(str::parse::<u8>) {
        Some(Ok(level)) => Some(entry.with_level(level)),
        Some(Err(_)) => {
            warn!("ignoring non-numeric level for {}", entry.word);
            Some(entry)
        }
        None => Some(entry),
    }
}

fn load_word_pool(path: &Path) -> Result<WordIndex> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading word pool {}", path.display()))?;
    let entries = contents
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with("//"))
        .filter_map(parse_word_line);

    let index = WordIndex::build(entries);
    if index.is_empty() {
        bail!("word pool {} has no usable words", path.display());
    }
    Ok(index)
}

fn parse_templates(contents: &str) -> Vec<Vec<String>> {
    let mut templates = vec![];
    let mut current: Vec<String> = vec![];

    for line in contents.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                templates.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim().to_string());
        }
    }
    if !current.is_empty() {
        templates.push(current);
    }

    templates
}

fn load_templates(path: &Path) -> Result<Vec<Vec<String>>> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading templates {}", path.display()))?;
    Ok(parse_templates(&contents))
}

fn render_clues(heading: &str, clues: &[ClueEntry]) -> String {
    let mut out = format!("{}\n", heading);
    for entry in clues {
        out.push_str(&format!("{:>3}. {} ({})", entry.number, entry.clue.text(), entry.answer));
        if entry.clue.translated() != entry.clue.text() {
            out.push_str(&format!(" / {}", entry.clue.translated()));
        }
        out.push('\n');
    }
    out
}

fn render_puzzle(puzzle: &Puzzle) -> String {
    let mut out = format!("{} [{}]", puzzle.title, puzzle.id);
    if let Some(difficulty) = &puzzle.difficulty {
        out.push_str(&format!(" ({})", difficulty));
    }
    out.push('\n');

    for row in &puzzle.solution {
        let line: String = row.iter().map(|cell| cell.unwrap_or('#')).collect();
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&render_clues("Across", &puzzle.clues.across));
    out.push_str(&render_clues("Down", &puzzle.clues.down));
    out
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let index = load_word_pool(&args.words)?;
    let templates = load_templates(&args.templates)?;

    let mut config = GeneratorConfig::default();
    if args.lenient_runs {
        config.run_policy = RunPolicy::Either;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.max_attempts = max_attempts;
    }

    let tiers = if args.batch {
        Tier::defaults()
    } else {
        vec![Tier::new(args.size, "custom", args.count, &format!("{}x{}", args.size, args.size))]
    };

    let templates_for = |size: usize| -> Vec<Vec<String>> {
        templates.iter().filter(|template| template.len() == size).cloned().collect()
    };
    if tiers.iter().all(|tier| templates_for(tier.size).is_empty()) {
        bail!("{} has no templates for the requested sizes", args.templates.display());
    }

    let mut session = UsedWordSet::new();
    let session = if args.session_dedup { Some(&mut session) } else { None };

    let mut generator = Generator::new(&index, config, args.seed);
    let puzzles = generator.generate_batch(&tiers, templates_for, session).context("generating puzzles")?;

    for puzzle in &puzzles {
        println!("{}", render_puzzle(puzzle));
    }

    Ok(())
}
