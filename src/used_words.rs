use std::collections::HashSet;

/// A set of words that may not be placed again, either within one grid or across a whole batch
/// of puzzles. Callers own it and pass it explicitly; nothing here is shared or synchronized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedWordSet {
    words: HashSet<String>,
}

impl UsedWordSet {
    pub fn new() -> UsedWordSet {
        UsedWordSet::default()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Returns false if the word was already present.
    pub fn insert(&mut self, word: impl Into<String>) -> bool {
        self.words.insert(word.into())
    }

    pub fn remove(&mut self, word: &str) -> bool {
        self.words.remove(word)
    }

    /// Is any of the given words already in the set?
    pub fn collides_with<'a, I>(&self, words: I) -> bool
        where
            I: IntoIterator<Item=&'a String>
    {
        words.into_iter().any(|word| self.contains(word))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=&String> {
        self.words.iter()
    }
}

impl Extend<String> for UsedWordSet {
    fn extend<T: IntoIterator<Item=String>>(&mut self, iter: T) {
        self.words.extend(iter);
    }
}

impl FromIterator<String> for UsedWordSet {
    fn from_iter<T: IntoIterator<Item=String>>(iter: T) -> UsedWordSet {
        UsedWordSet { words: iter.into_iter().collect() }
    }
}
