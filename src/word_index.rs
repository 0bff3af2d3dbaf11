use std::collections::HashMap;

use log::{debug, warn};
use smallvec::SmallVec;

use crate::{MAX_WORD_LENGTH, MIN_WORD_LENGTH};

/// A slot pattern: `Some(letter)` for a fixed cell, `None` for a wildcard.
pub type Pattern = [Option<char>];

const ALPHABET_SIZE: usize = 26;

/// Index of a node in a `Trie`'s arena.
type NodeId = u32;

/// The clue for a word, in the primary language and optionally translated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClueText {
    pub en: String,
    pub zh: Option<String>,
}

impl ClueText {
    pub fn new(en: impl Into<String>) -> ClueText {
        ClueText { en: en.into(), zh: None }
    }

    pub fn with_translation(mut self, zh: impl Into<String>) -> ClueText {
        self.zh = Some(zh.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.en
    }

    /// The translated clue, falling back to the primary text when no translation exists.
    pub fn translated(&self) -> &str {
        self.zh.as_deref().unwrap_or(&self.en)
    }

    pub fn is_empty(&self) -> bool {
        self.en.trim().is_empty()
    }
}

/// A word from the pool together with its clue metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WordEntry {
    pub word: String,
    pub clue: ClueText,
    pub level: Option<u8>,
}

impl WordEntry {
    pub fn new(word: &str, clue: ClueText) -> WordEntry {
        WordEntry { word: word.trim().to_uppercase(), clue, level: None }
    }

    pub fn with_level(mut self, level: u8) -> WordEntry {
        self.level = Some(level);
        self
    }

    /// Can this word be placed in a grid at all?
    fn is_placeable(&self) -> bool {
        let len = self.word.len();
        (MIN_WORD_LENGTH..=MAX_WORD_LENGTH).contains(&len)
            && self.word.bytes().all(|b| b.is_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: [Option<NodeId>; ALPHABET_SIZE],
    terminal: bool,
}

fn letter_slot(letter: char) -> Option<usize> {
    if letter.is_ascii_uppercase() {
        Some(letter as usize - 'A' as usize)
    } else {
        None
    }
}

/// A prefix tree over words of a single length. Nodes live in one arena and index their children
/// by letter, so a lookup walks at most `word_length` levels.
#[derive(Debug, Clone)]
pub struct Trie {
    word_length: usize,
    nodes: Vec<TrieNode>,
    word_count: usize,
}

impl Trie {
    pub fn new(word_length: usize) -> Trie {
        Trie { word_length, nodes: vec![TrieNode::default()], word_count: 0 }
    }

    pub fn word_length(&self) -> usize {
        self.word_length
    }

    /// How many distinct words have been inserted.
    pub fn len(&self) -> usize {
        self.word_count
    }

    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }

    /// Insert an uppercase word of this trie's length. Returns false if the word doesn't fit the
    /// trie or was already present.
    pub fn insert(&mut self, word: &str) -> bool {
        if word.len() != self.word_length {
            return false;
        }

        let Some(letters) = word.chars().map(letter_slot).collect::<Option<SmallVec<[usize; MAX_WORD_LENGTH]>>>() else {
            return false;
        };

        let mut node: usize = 0;
        for slot in letters {
            node = match self.nodes[node].children[slot] {
                Some(child) => child as usize,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children[slot] = Some(child as NodeId);
                    child
                }
            };
        }

        if self.nodes[node].terminal {
            return false;
        }
        self.nodes[node].terminal = true;
        self.word_count += 1;
        true
    }

    /// Return every word matching `pattern`, in alphabetical order. Patterns of the wrong length
    /// match nothing.
    pub fn matches(&self, pattern: &Pattern) -> Vec<String> {
        let mut results = vec![];
        if pattern.len() != self.word_length {
            return results;
        }

        let mut buffer = String::with_capacity(self.word_length);
        self.collect_matches(0, pattern, &mut buffer, &mut results);
        results
    }

    fn collect_matches(&self, node: usize, pattern: &Pattern, buffer: &mut String, results: &mut Vec<String>) {
        let depth = buffer.len();
        if depth == pattern.len() {
            if self.nodes[node].terminal {
                results.push(buffer.clone());
            }
            return;
        }

        match pattern[depth] {
            Some(letter) => {
                let child = letter_slot(letter).and_then(|slot| self.nodes[node].children[slot]);
                if let Some(child) = child {
                    buffer.push(letter);
                    self.collect_matches(child as usize, pattern, buffer, results);
                    buffer.pop();
                }
            }
            None => {
                for (slot, child) in self.nodes[node].children.iter().enumerate() {
                    if let Some(child) = child {
                        buffer.push((b'A' + slot as u8) as char);
                        self.collect_matches(*child as usize, pattern, buffer, results);
                        buffer.pop();
                    }
                }
            }
        }
    }
}

/// The read-only word pool: one trie per word length plus the clue metadata for every word.
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    tries: HashMap<usize, Trie>,
    entries: HashMap<String, WordEntry>,
}

impl WordIndex {
    /// Group the pool's words by length and index them. Words that can never be placed (wrong
    /// length, non-alphabetic) are skipped.
    pub fn build<I>(entries: I) -> WordIndex
        where
            I: IntoIterator<Item=WordEntry>
    {
        let mut index = WordIndex::default();
        let mut skipped = 0;

        for entry in entries {
            if !entry.is_placeable() {
                warn!("skipping unplaceable word {:?}", entry.word);
                skipped += 1;
                continue;
            }

            let len = entry.word.len();
            index.tries.entry(len).or_insert_with(|| Trie::new(len)).insert(&entry.word);
            index.entries.insert(entry.word.clone(), entry);
        }

        debug!(
            "indexed {} words across {} lengths ({} skipped)",
            index.entries.len(),
            index.tries.len(),
            skipped,
        );

        index
    }

    /// All words matching the pattern. An absent length yields an empty result.
    pub fn matches(&self, pattern: &Pattern) -> Vec<String> {
        self.tries.get(&pattern.len()).map(|trie| trie.matches(pattern)).unwrap_or_default()
    }

    pub fn trie(&self, length: usize) -> Option<&Trie> {
        self.tries.get(&length)
    }

    pub fn has_length(&self, length: usize) -> bool {
        self.tries.get(&length).map(|trie| !trie.is_empty()).unwrap_or(false)
    }

    /// The word lengths present in the pool, ascending.
    pub fn lengths(&self) -> Vec<usize> {
        let mut lengths: Vec<usize> = self.tries.keys().cloned().collect();
        lengths.sort_unstable();
        lengths
    }

    pub fn entry(&self, word: &str) -> Option<&WordEntry> {
        self.entries.get(word)
    }

    /// The clue for a word, if it has a non-empty one.
    pub fn clue(&self, word: &str) -> Option<&ClueText> {
        self.entries.get(word).map(|entry| &entry.clue).filter(|clue| !clue.is_empty())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
