use std::collections::HashMap;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::fill::{find_fill, FillOptions, Statistics};
use crate::grid::{GridShape, RunPolicy};
use crate::puzzle::{assemble, AssembleError, Puzzle};
use crate::slots::{count_by_direction, extract_slots, Slot};
use crate::used_words::UsedWordSet;
use crate::word_index::WordIndex;
use crate::{DEFAULT_CANDIDATE_CAP, DEFAULT_MAX_ATTEMPTS, LARGE_GRID_NODE_BUDGET, SMALL_GRID_MAX_SIZE, SMALL_GRID_NODE_BUDGET};

/// Size-specific quality gates and solver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeProfile {
    /// Minimum fraction of cells that must be white after sanitization.
    pub min_white_ratio: f64,
    pub min_across: usize,
    pub min_down: usize,
    pub allow_reuse: bool,
    pub node_budget: usize,
}

impl SizeProfile {
    pub fn for_size(size: usize) -> SizeProfile {
        let small = size <= SMALL_GRID_MAX_SIZE;
        let (min_white_ratio, min_across, min_down) = match size {
            5 => (0.68, 2, 2),
            7 => (0.60, 3, 3),
            9 => (0.55, 4, 4),
            _ => (0.0, 0, 0),
        };

        SizeProfile {
            min_white_ratio,
            min_across,
            min_down,
            allow_reuse: small,
            node_budget: if small { SMALL_GRID_NODE_BUDGET } else { LARGE_GRID_NODE_BUDGET },
        }
    }
}

/// Configuration for puzzle generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Templates to try per puzzle before giving up
    pub max_attempts: usize,
    pub candidate_cap: usize,
    pub run_policy: RunPolicy,
    /// Per-size overrides of `SizeProfile::for_size`
    pub profiles: HashMap<usize, SizeProfile>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            run_policy: RunPolicy::default(),
            profiles: HashMap::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn profile_for(&self, size: usize) -> SizeProfile {
        self.profiles.get(&size).cloned().unwrap_or_else(|| SizeProfile::for_size(size))
    }

    fn fill_options(&self, size: usize) -> FillOptions {
        let profile = self.profile_for(size);
        FillOptions {
            allow_reuse: profile.allow_reuse,
            node_budget: profile.node_budget,
            candidate_cap: self.candidate_cap,
        }
    }
}

/// Why a template didn't produce a usable shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeRejected {
    #[error("no white cells survive sanitization")]
    Empty,
    #[error("white cells are not connected")]
    Disconnected,
    #[error("no words of length {0} in the pool")]
    MissingLength(usize),
    #[error("white ratio {ratio:.2} is below {min:.2}")]
    WhiteRatio { ratio: f64, min: f64 },
    #[error("{across} across / {down} down slots is too few")]
    TooFewSlots { across: usize, down: usize },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no templates for size {size}")]
    NoTemplates { size: usize },
    #[error("failed to generate a {size}x{size} grid in {attempts} attempts")]
    GenerationExhausted { size: usize, attempts: usize },
    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// A filled grid accepted by the generator.
#[derive(Debug, Clone)]
pub struct GeneratedGrid {
    pub grid: GridShape,
    pub slots: Vec<Slot>,
    /// The distinct words placed in the grid.
    pub words: Vec<String>,
    /// How many templates were tried, including the one that succeeded.
    pub attempts: usize,
    pub statistics: Statistics,
}

/// A batch tier: `count` puzzles of one size and difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub size: usize,
    pub difficulty: String,
    pub count: usize,
    pub label: String,
}

impl Tier {
    pub fn new(size: usize, difficulty: &str, count: usize, label: &str) -> Tier {
        Tier { size, difficulty: difficulty.to_string(), count, label: label.to_string() }
    }

    /// Ten each of easy 5x5, medium 7x7 and hard 9x9 puzzles.
    pub fn defaults() -> Vec<Tier> {
        vec![
            Tier::new(5, "easy", 10, "Easy"),
            Tier::new(7, "medium", 10, "Medium"),
            Tier::new(9, "hard", 10, "Hard"),
        ]
    }
}

pub struct Generator<'a> {
    index: &'a WordIndex,
    config: GeneratorConfig,
    rng: StdRng,
}

impl<'a> Generator<'a> {
    /// A generator over `index`. With a seed, every run is reproducible.
    pub fn new(index: &'a WordIndex, config: GeneratorConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { index, config, rng }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Pad and sanitize a template, then check it can be handed to the solver.
    pub fn prepare_shape<S: AsRef<str>>(&self, template: &[S], size: usize) -> Result<(GridShape, Vec<Slot>), ShapeRejected> {
        let mut grid = GridShape::from_template(template, Some(size));
        grid.sanitize(self.config.run_policy);

        if grid.white_count() == 0 {
            return Err(ShapeRejected::Empty);
        }
        if !grid.is_connected() {
            return Err(ShapeRejected::Disconnected);
        }

        let slots = extract_slots(&grid);
        if let Some(slot) = slots.iter().find(|slot| !self.index.has_length(slot.len())) {
            return Err(ShapeRejected::MissingLength(slot.len()));
        }

        let profile = self.config.profile_for(size);
        let ratio = grid.white_ratio();
        if ratio < profile.min_white_ratio {
            return Err(ShapeRejected::WhiteRatio { ratio, min: profile.min_white_ratio });
        }

        let (across, down) = count_by_direction(&slots);
        if across < profile.min_across || down < profile.min_down {
            return Err(ShapeRejected::TooFewSlots { across, down });
        }

        Ok((grid, slots))
    }

    /// Generate one filled grid of `size`, trying random templates until one both shapes and
    /// fills. Words in `session` are never used, and the accepted grid's words are added to it.
    pub fn generate_grid<S: AsRef<str>>(
        &mut self,
        size: usize,
        templates: &[Vec<S>],
        mut session: Option<&mut UsedWordSet>,
    ) -> Result<GeneratedGrid, GenerateError> {
        if templates.is_empty() {
            return Err(GenerateError::NoTemplates { size });
        }

        let options = self.config.fill_options(size);
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            let Some(template) = templates.choose(&mut self.rng) else {
                break;
            };

            let (mut grid, slots) = match self.prepare_shape(template, size) {
                Ok(shape) => shape,
                Err(rejection) => {
                    debug!("attempt {}: rejected shape: {}", attempt, rejection);
                    continue;
                }
            };

            let success = match find_fill(&mut grid, &slots, self.index, session.as_deref(), &options, &mut self.rng) {
                Ok(success) => success,
                Err(failure) => {
                    debug!("attempt {}: fill failed: {:?}", attempt, failure);
                    continue;
                }
            };

            if !grid.is_complete() || !grid.satisfies_min_runs(self.config.run_policy) {
                warn!("attempt {}: filled grid violates the run-length policy, discarding", attempt);
                continue;
            }

            let mut words: Vec<String> = slots.iter().filter_map(|slot| grid.read(&slot.cells)).collect();
            words.sort();
            words.dedup();

            if let Some(session) = session.as_deref_mut() {
                if session.collides_with(&words) {
                    debug!("attempt {}: fill reuses session words, discarding", attempt);
                    continue;
                }
                session.extend(words.iter().cloned());
            }

            info!(
                "generated {}x{} grid with {} words after {} attempt(s) ({} states)",
                size,
                size,
                words.len(),
                attempt,
                success.statistics.states,
            );

            return Ok(GeneratedGrid {
                grid,
                slots,
                words,
                attempts: attempt,
                statistics: success.statistics,
            });
        }

        Err(GenerateError::GenerationExhausted { size, attempts: max_attempts })
    }

    /// Generate a grid and assemble it into a clued puzzle. If assembly fails, the grid's words are
    /// taken back out of `session`.
    pub fn generate_puzzle<S: AsRef<str>>(
        &mut self,
        size: usize,
        templates: &[Vec<S>],
        mut session: Option<&mut UsedWordSet>,
        id: &str,
        title: &str,
    ) -> Result<Puzzle, GenerateError> {
        let generated = self.generate_grid(size, templates, session.as_deref_mut())?;

        match assemble(&generated.grid, self.index, id, title, &mut self.rng) {
            Ok(puzzle) => Ok(puzzle),
            Err(error) => {
                // An accepted grid never collides with the session, so all of its words are ours.
                if let Some(session) = session {
                    for word in &generated.words {
                        session.remove(word);
                    }
                }
                Err(error.into())
            }
        }
    }

    /// Generate every tier's puzzles in order, numbering them across the whole batch. A tier with
    /// no templates is skipped; any other failure aborts the batch.
    pub fn generate_batch<S, F>(
        &mut self,
        tiers: &[Tier],
        templates_for: F,
        mut session: Option<&mut UsedWordSet>,
    ) -> Result<Vec<Puzzle>, GenerateError>
        where
            S: AsRef<str>,
            F: Fn(usize) -> Vec<Vec<S>>,
    {
        let mut puzzles = vec![];

        for tier in tiers {
            let templates = templates_for(tier.size);
            if templates.is_empty() {
                warn!("no templates for size {}, skipping {} tier", tier.size, tier.difficulty);
                continue;
            }

            for n in 1..=tier.count {
                let id = format!("puzzle_{:03}", puzzles.len() + 1);
                let title = format!("{} #{}", tier.label, n);

                let mut puzzle = self.generate_puzzle(tier.size, &templates, session.as_deref_mut(), &id, &title)?;
                puzzle.difficulty = Some(tier.difficulty.clone());
                info!("[{}] {} ({}x{})", tier.difficulty, puzzle.id, tier.size, tier.size);
                puzzles.push(puzzle);
            }
        }

        Ok(puzzles)
    }
}
