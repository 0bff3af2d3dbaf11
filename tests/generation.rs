use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use xwordgen::{
    assemble, extract_slots, AssembleError, ClueText, GenerateError, Generator, GeneratorConfig, GridShape,
    RunPolicy, UsedWordSet, WordEntry, WordIndex,
};

fn build_index(words: &[&str]) -> WordIndex {
    WordIndex::build(words.iter().map(|word| WordEntry::new(word, ClueText::new(format!("Clue for {}", word)))))
}

fn small_pool() -> WordIndex {
    build_index(&[
        "CAT", "CAR", "ART", "TAR", "ARE", "TEA", "ATE", "EAT", "ERA", "ACE", "TEN", "NET", "RAT", "ONE",
        "TOE", "EON", "NOR", "ORE", "ROE", "AND", "DEN", "END", "NOD", "DOE", "ODE", "TOT", "OAT",
    ])
}

/// On a 4x4 canvas only the first template survives: the second needs a 4-letter word and the
/// third sanitizes away entirely.
fn three_by_three_templates() -> Vec<Vec<&'static str>> {
    vec![
        vec!["...", "...", "..."],
        vec!["...#", "...#", "...."],
        vec!["..", ".."],
    ]
}

#[test]
fn test_generated_grids_satisfy_shape_invariants() {
    let index = small_pool();
    let config = GeneratorConfig { max_attempts: 50, ..GeneratorConfig::default() };
    let mut generator = Generator::new(&index, config, Some(2024));

    for _ in 0..5 {
        let generated = generator.generate_grid(4, &three_by_three_templates(), None).expect("Failed to generate");

        assert!(generated.grid.is_connected());
        assert!(generated.grid.is_complete());
        assert!(generated.grid.satisfies_min_runs(RunPolicy::Both));
        for slot in &generated.slots {
            let word = generated.grid.read(&slot.cells).expect("slot should be filled");
            assert!(index.contains(&word));
        }
    }
}

#[test]
fn test_same_seed_same_puzzle() {
    let index = small_pool();
    let templates = three_by_three_templates();

    let first = Generator::new(&index, GeneratorConfig::default(), Some(77))
        .generate_puzzle(4, &templates, None, "puzzle_001", "Easy #1")
        .expect("Failed to generate");
    let second = Generator::new(&index, GeneratorConfig::default(), Some(77))
        .generate_puzzle(4, &templates, None, "puzzle_001", "Easy #1")
        .expect("Failed to generate");

    assert_eq!(first, second);
}

#[test]
fn test_session_dedup_across_batch() {
    let index = small_pool();
    let mut generator = Generator::new(&index, GeneratorConfig::default(), Some(5));
    let mut session = UsedWordSet::new();
    let templates = vec![vec!["...", "...", "..."]];

    let first = generator.generate_grid(3, &templates, Some(&mut session)).expect("Failed to generate");
    let second = generator.generate_grid(3, &templates, Some(&mut session));

    match second {
        Ok(second) => assert!(second.words.iter().all(|word| !first.words.contains(word))),
        Err(error) => assert!(matches!(error, GenerateError::GenerationExhausted { .. })),
    }
    assert!(first.words.iter().all(|word| session.contains(word)));
}

/// The pool holds exactly one 3x3 word square, so a second puzzle can't avoid repeating it.
#[test]
fn test_pool_for_one_grid_exhausts_on_second_generation() {
    let index = build_index(&["CAT", "ARE", "TEA"]);
    let mut generator = Generator::new(&index, GeneratorConfig { max_attempts: 20, ..GeneratorConfig::default() }, Some(1));
    let mut session = UsedWordSet::new();
    let templates = vec![vec!["...", "...", "..."]];

    let puzzle = generator
        .generate_puzzle(3, &templates, Some(&mut session), "puzzle_001", "Tiny #1")
        .expect("Failed to generate");
    assert_eq!(puzzle.word_count(), 6);

    let error = generator
        .generate_puzzle(3, &templates, Some(&mut session), "puzzle_002", "Tiny #2")
        .expect_err("second puzzle should be impossible");
    assert!(matches!(error, GenerateError::GenerationExhausted { size: 3, attempts: 20 }));
    assert_eq!(error.to_string(), "failed to generate a 3x3 grid in 20 attempts");
}

#[test]
fn test_missing_clue_surfaces_from_generation() {
    let index = WordIndex::build(vec![
        WordEntry::new("CAT", ClueText::new("Purring pet")),
        WordEntry::new("ARE", ClueText::new("Exist")),
        WordEntry::new("TEA", ClueText::new("")),
    ]);
    let mut generator = Generator::new(&index, GeneratorConfig::default(), Some(1));

    let result = generator.generate_puzzle(3, &[vec!["...", "...", "..."]], None, "p", "t");

    assert!(matches!(result, Err(GenerateError::Assemble(AssembleError::MissingClue(ref word))) if word == "TEA"));
}

#[test]
fn test_assembler_rejects_word_without_metadata() {
    let grid = GridShape::parse("CAT\nARE\nTEA", None);
    let index = build_index(&["CAT", "ARE"]);

    let result = assemble(&grid, &index, "p", "t", &mut StdRng::seed_from_u64(1));

    assert_eq!(result, Err(AssembleError::MissingClue("TEA".to_string())));
}

#[test]
fn test_resanitizing_a_generated_grid_changes_nothing() {
    let index = small_pool();
    let mut generator = Generator::new(&index, GeneratorConfig::default(), Some(8));

    let generated = generator.generate_grid(4, &three_by_three_templates(), None).expect("Failed to generate");
    let mut again = generated.grid.clone();

    assert_eq!(again.sanitize(RunPolicy::Both), 0);
    assert_eq!(again, generated.grid);
    assert_eq!(extract_slots(&again), generated.slots);
}
